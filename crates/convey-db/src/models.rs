//! Rows as SQLite stores them. Integers are signed here; `store` converts
//! them to the unsigned record types in convey-types.

pub struct ConversationRow {
    pub hash: Vec<u8>,
    pub topic: String,
    pub author: String,
    pub timestamp: i64,
    pub cost: i64,
}

pub struct MessageRow {
    pub hash: Vec<u8>,
    pub conversation: Vec<u8>,
    pub previous: Option<Vec<u8>>,
    pub author: String,
    pub timestamp: i64,
    pub cost: i64,
    pub media_type: String,
    pub content: Vec<u8>,
}

pub struct LedgerRow {
    pub alias: String,
    pub minted: i64,
    pub burned: i64,
    pub bought: i64,
    pub sold: i64,
    pub earned: i64,
    pub spent: i64,
}
