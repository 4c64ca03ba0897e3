use crate::models::{ConversationRow, LedgerRow, MessageRow};
use crate::Database;
use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension};

use convey_types::models::{ConversationRecord, LedgerCounters, MessageRecord};

impl Database {
    // -- Conversations --

    /// Store a new conversation together with its root message.
    pub fn insert_conversation(
        &self,
        conversation: &ConversationRecord,
        root: &MessageRecord,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            insert_conversation_rows(&tx, conversation, root)?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_conversation_row(&self, hash: &[u8]) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| query_conversation(conn, hash))
    }

    pub fn get_conversations_since(&self, since: i64) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            query_conversations(
                conn,
                "SELECT hash, topic, author, timestamp, cost FROM conversations
                 WHERE timestamp >= ?1",
                since,
            )
        })
    }

    pub fn get_recent_conversation_rows(&self, limit: i64) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            query_conversations(
                conn,
                "SELECT hash, topic, author, timestamp, cost FROM conversations
                 ORDER BY timestamp DESC, hash ASC
                 LIMIT ?1",
                limit,
            )
        })
    }

    // -- Messages --

    pub fn insert_message(&self, conversation: &[u8], message: &MessageRecord) -> Result<()> {
        self.with_conn_mut(|conn| insert_message_row(conn, conversation, message))
    }

    /// All messages of a conversation, in storage order.
    pub fn get_message_rows(&self, conversation: &[u8]) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT hash, conversation, previous, author, timestamp, cost, media_type, content
                 FROM messages
                 WHERE conversation = ?1",
            )?;
            let rows = stmt
                .query_map([conversation], map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_message_row(&self, conversation: &[u8], hash: &[u8]) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT hash, conversation, previous, author, timestamp, cost, media_type, content
                     FROM messages
                     WHERE conversation = ?1 AND hash = ?2",
                    rusqlite::params![conversation, hash],
                    map_message_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    // -- Ledger --

    /// Replace the counters held for `alias`.
    pub fn upsert_ledger(&self, alias: &str, counters: &LedgerCounters) -> Result<()> {
        self.with_conn_mut(|conn| upsert_ledger_row(conn, alias, counters))
    }

    pub fn get_ledger_rows(&self) -> Result<Vec<LedgerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT alias, minted, burned, bought, sold, earned, spent FROM ledger",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(LedgerRow {
                        alias: row.get(0)?,
                        minted: row.get(1)?,
                        burned: row.get(2)?,
                        bought: row.get(3)?,
                        sold: row.get(4)?,
                        earned: row.get(5)?,
                        spent: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Conversation row plus its root message row. Callers supply the
/// transaction so a failed root insert never leaves a rootless conversation.
pub(crate) fn insert_conversation_rows(
    conn: &Connection,
    conversation: &ConversationRecord,
    root: &MessageRecord,
) -> Result<()> {
    if !root.is_root() {
        bail!("message {} is a reply, not a root", root.hash);
    }
    conn.execute(
        "INSERT INTO conversations (hash, topic, author, timestamp, cost) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            conversation.hash.as_bytes(),
            conversation.topic,
            conversation.author,
            to_sql_int(conversation.timestamp, "timestamp")?,
            to_sql_int(conversation.cost, "cost")?,
        ],
    )
    .with_context(|| format!("inserting conversation {}", conversation.hash))?;
    insert_message_row(conn, conversation.hash.as_bytes(), root)
}

pub(crate) fn insert_message_row(
    conn: &Connection,
    conversation: &[u8],
    message: &MessageRecord,
) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (hash, conversation, previous, author, timestamp, cost, media_type, content)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            message.hash.as_bytes(),
            conversation,
            message.previous.as_ref().map(|p| p.as_bytes()),
            message.author,
            to_sql_int(message.timestamp, "timestamp")?,
            to_sql_int(message.cost, "cost")?,
            message.media_type.as_str(),
            message.content,
        ],
    )
    .with_context(|| format!("inserting message {}", message.hash))?;
    Ok(())
}

pub(crate) fn upsert_ledger_row(conn: &Connection, alias: &str, counters: &LedgerCounters) -> Result<()> {
    conn.execute(
        "INSERT INTO ledger (alias, minted, burned, bought, sold, earned, spent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(alias) DO UPDATE SET
            minted = excluded.minted,
            burned = excluded.burned,
            bought = excluded.bought,
            sold = excluded.sold,
            earned = excluded.earned,
            spent = excluded.spent",
        rusqlite::params![
            alias,
            to_sql_int(counters.minted, "minted")?,
            to_sql_int(counters.burned, "burned")?,
            to_sql_int(counters.bought, "bought")?,
            to_sql_int(counters.sold, "sold")?,
            to_sql_int(counters.earned, "earned")?,
            to_sql_int(counters.spent, "spent")?,
        ],
    )
    .with_context(|| format!("updating ledger for {}", alias))?;
    Ok(())
}

fn query_conversation(conn: &Connection, hash: &[u8]) -> Result<Option<ConversationRow>> {
    let row = conn
        .query_row(
            "SELECT hash, topic, author, timestamp, cost FROM conversations WHERE hash = ?1",
            [hash],
            map_conversation_row,
        )
        .optional()?;
    Ok(row)
}

fn query_conversations(conn: &Connection, sql: &str, param: i64) -> Result<Vec<ConversationRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([param], map_conversation_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_conversation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        hash: row.get(0)?,
        topic: row.get(1)?,
        author: row.get(2)?,
        timestamp: row.get(3)?,
        cost: row.get(4)?,
    })
}

fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        hash: row.get(0)?,
        conversation: row.get(1)?,
        previous: row.get(2)?,
        author: row.get(3)?,
        timestamp: row.get(4)?,
        cost: row.get(5)?,
        media_type: row.get(6)?,
        content: row.get(7)?,
    })
}

/// SQLite integers are signed; reject values that would wrap.
pub fn to_sql_int(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("{} {} does not fit in SQLite", field, value))
}

/// Inverse of [`to_sql_int`] for values read back from a row.
pub fn from_sql_int(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("negative {} in database: {}", field, value))
}
