//! Token-economy core of the Convey discussion service.
//!
//! Every message costs tokens. Half of a reply's cost is credited to its
//! parent, half of what remains to the grandparent, and so on up to the
//! conversation root; whatever integer division drops is burned. The
//! resulting reward minus cost ("yield") ranks replies and conversations.
//!
//! All computation here is synchronous and request scoped. Trees and
//! listings are rebuilt from the store on every read.

pub mod content;
pub mod conversation;
pub mod error;
pub mod graph;
pub mod ledger;
pub mod listing;
pub mod memory;
pub mod rank;
pub mod reward;
pub mod store;

pub use content::{ContentFormatter, PlainTextFormatter};
pub use conversation::{build_conversation, conversation_yield};
pub use error::{Error, Result};
pub use graph::{GraphStats, MessageGraph, MessageGraphBuilder, ReplyTree};
pub use ledger::LedgerAggregator;
pub use listing::ConversationRanker;
pub use memory::MemoryStore;
pub use rank::YieldRanker;
pub use reward::{PropagationSummary, RewardPropagator};
pub use store::{LedgerSource, MessageStore};
