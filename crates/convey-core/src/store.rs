use std::collections::BTreeMap;

use convey_types::RecordHash;
use convey_types::models::{ConversationRecord, LedgerCounters, MessageRecord};

use crate::error::Result;

/// Callback handed to [`MessageStore::get_message`]. Returning an error
/// aborts the walk; the store must pass that error back unchanged.
pub type Visitor<'a> = dyn FnMut(&MessageRecord) -> Result<()> + 'a;

/// Read-only accessors over the conversation and message record store.
pub trait MessageStore {
    /// Fails with [`crate::Error::NotFound`] if no such conversation exists.
    fn get_conversation(&self, hash: &RecordHash) -> Result<ConversationRecord>;

    /// Visit every message of a conversation in unspecified order, or only
    /// the message `start` when given.
    fn get_message(
        &self,
        conversation: &RecordHash,
        start: Option<&RecordHash>,
        visit: &mut Visitor<'_>,
    ) -> Result<()>;

    /// Conversations created at or after `since`, in no particular order.
    fn get_all_conversations(&self, since: u64) -> Result<Vec<ConversationRecord>>;

    /// The `limit` most recent conversations, most recent first.
    fn get_recent_conversations(&self, limit: usize) -> Result<Vec<ConversationRecord>>;

    /// `(root message cost, total reward credited anywhere in the tree)`.
    ///
    /// Stores that keep these totals can override this; the default rebuilds
    /// the tree and propagates rewards over it.
    fn get_yield(&self, conversation: &RecordHash) -> Result<(u64, u64)> {
        crate::conversation::conversation_yield(self, conversation)
    }
}

/// Read-only access to the per-alias token counters.
pub trait LedgerSource {
    fn ledger_counters(&self) -> Result<BTreeMap<String, LedgerCounters>>;
}
