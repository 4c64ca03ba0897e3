use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hash::RecordHash;

/// Media type of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "text/plain")]
    TextPlain,
    #[serde(rename = "text/markdown")]
    TextMarkdown,
    #[serde(rename = "image/jpeg")]
    ImageJpeg,
    #[serde(rename = "image/png")]
    ImagePng,
    #[serde(rename = "image/gif")]
    ImageGif,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::TextPlain => "text/plain",
            MediaType::TextMarkdown => "text/markdown",
            MediaType::ImageJpeg => "image/jpeg",
            MediaType::ImagePng => "image/png",
            MediaType::ImageGif => "image/gif",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown media type: {0}")]
pub struct UnknownMediaType(pub String);

impl FromStr for MediaType {
    type Err = UnknownMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text/plain" => Ok(MediaType::TextPlain),
            "text/markdown" => Ok(MediaType::TextMarkdown),
            "image/jpeg" => Ok(MediaType::ImageJpeg),
            "image/png" => Ok(MediaType::ImagePng),
            "image/gif" => Ok(MediaType::ImageGif),
            other => Err(UnknownMediaType(other.to_string())),
        }
    }
}

/// A message as it comes out of the record store. Immutable once created.
///
/// `previous` is `None` only for the root message of a conversation.
/// `timestamp` is nanoseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub hash: RecordHash,
    #[serde(default)]
    pub previous: Option<RecordHash>,
    pub author: String,
    pub timestamp: u64,
    pub cost: u64,
    pub media_type: MediaType,
    #[serde(with = "content_text")]
    pub content: Vec<u8>,
}

impl MessageRecord {
    pub fn is_root(&self) -> bool {
        self.previous.is_none()
    }
}

/// A conversation record, also used as the summary returned by listing queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub hash: RecordHash,
    pub topic: String,
    pub author: String,
    pub timestamp: u64,
    pub cost: u64,
}

/// A reply in a rendered conversation tree.
///
/// Replies live in [`ConversationView::nodes`] and point at their children by
/// index, so arbitrarily deep threads never nest Rust values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyNode {
    pub message_hash: RecordHash,
    pub previous_hash: RecordHash,
    pub author: String,
    pub timestamp: u64,
    pub cost: u64,
    pub reward: u64,
    #[serde(rename = "yield")]
    pub net_yield: i64,
    pub content: String,
    /// Distance from the root message; top-level replies are at depth 1.
    pub depth: usize,
    /// Ranked children, as indices into [`ConversationView::nodes`].
    pub replies: Vec<usize>,
}

/// A conversation with its root message folded in and its replies ranked.
///
/// `nodes` holds every reply in ranked depth-first order, which is also the
/// order a threaded page displays them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationView {
    pub conversation_hash: RecordHash,
    pub message_hash: RecordHash,
    pub topic: String,
    pub author: String,
    pub timestamp: u64,
    /// Conversation record cost plus root message cost.
    pub cost: u64,
    /// Reward credited to the root message.
    pub reward: u64,
    #[serde(rename = "yield")]
    pub net_yield: i64,
    pub content: String,
    /// Ranked replies to the root message, as indices into `nodes`.
    pub replies: Vec<usize>,
    pub nodes: Vec<ReplyNode>,
}

impl ConversationView {
    /// Direct replies to the root message, best first.
    pub fn top_replies(&self) -> impl Iterator<Item = &ReplyNode> + '_ {
        self.replies.iter().filter_map(|&i| self.nodes.get(i))
    }

    /// Direct replies to `node`, best first.
    pub fn children<'v>(&'v self, node: &'v ReplyNode) -> impl Iterator<Item = &'v ReplyNode> + 'v {
        node.replies.iter().filter_map(|&i| self.nodes.get(i))
    }

    pub fn find(&self, hash: &RecordHash) -> Option<&ReplyNode> {
        self.nodes.iter().find(|n| &n.message_hash == hash)
    }
}

/// One row of a best/recent listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationListing {
    pub hash: RecordHash,
    pub topic: String,
    pub author: String,
    pub timestamp: u64,
    pub cost: u64,
    pub reward: u64,
    #[serde(rename = "yield")]
    pub net_yield: i64,
}

/// Externally maintained token counters for one alias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCounters {
    /// Miner in periodic validation
    #[serde(default)]
    pub minted: u64,
    /// Conversation author, or first message in a message chain
    #[serde(default)]
    pub burned: u64,
    /// Recipient in a transaction
    #[serde(default)]
    pub bought: u64,
    /// Sender in a transaction
    #[serde(default)]
    pub sold: u64,
    /// Got replied to
    #[serde(default)]
    pub earned: u64,
    /// Creator of a conversation or message
    #[serde(default)]
    pub spent: u64,
}

impl LedgerCounters {
    /// minted + bought + earned − burned − sold − spent, saturating at the
    /// bounds of `i64`.
    pub fn balance(&self) -> i64 {
        let credit = self.minted as i128 + self.bought as i128 + self.earned as i128;
        let debit = self.burned as i128 + self.sold as i128 + self.spent as i128;
        let balance = credit - debit;
        i64::try_from(balance).unwrap_or(if balance > 0 { i64::MAX } else { i64::MIN })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub alias: String,
    pub minted: u64,
    pub burned: u64,
    pub bought: u64,
    pub sold: u64,
    pub earned: u64,
    pub spent: u64,
    pub balance: i64,
}

impl LedgerEntry {
    pub fn new(alias: impl Into<String>, counters: &LedgerCounters) -> Self {
        Self {
            alias: alias.into(),
            minted: counters.minted,
            burned: counters.burned,
            bought: counters.bought,
            sold: counters.sold,
            earned: counters.earned,
            spent: counters.spent,
            balance: counters.balance(),
        }
    }
}

/// Message bodies travel as UTF-8 text in JSON fixtures.
mod content_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(String::deserialize(deserializer)?.into_bytes())
    }
}
