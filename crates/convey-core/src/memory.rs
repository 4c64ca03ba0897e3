use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;

use convey_types::RecordHash;
use convey_types::models::{ConversationRecord, LedgerCounters, MessageRecord};

use crate::error::{Error, Result};
use crate::store::{LedgerSource, MessageStore, Visitor};

/// Record store held entirely in memory.
///
/// Messages are visited in insertion order, which need not be parent before
/// child. Nothing checks that a reply's previous hash exists.
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: HashMap<RecordHash, ConversationRecord>,
    messages: HashMap<RecordHash, Vec<MessageRecord>>,
    ledger: BTreeMap<String, LedgerCounters>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with its root message.
    pub fn new_conversation(
        &mut self,
        conversation: ConversationRecord,
        root: MessageRecord,
    ) -> Result<()> {
        if !root.is_root() {
            return Err(anyhow!("message {} is a reply, not a root", root.hash).into());
        }
        if self.conversations.contains_key(&conversation.hash) {
            return Err(anyhow!("conversation {} already exists", conversation.hash).into());
        }
        self.messages.insert(conversation.hash.clone(), vec![root]);
        self.conversations
            .insert(conversation.hash.clone(), conversation);
        Ok(())
    }

    pub fn add_message(&mut self, conversation: &RecordHash, message: MessageRecord) -> Result<()> {
        let messages = self
            .messages
            .get_mut(conversation)
            .ok_or_else(|| Error::not_found(format!("conversation {}", conversation)))?;
        messages.push(message);
        Ok(())
    }

    pub fn set_counters(&mut self, alias: impl Into<String>, counters: LedgerCounters) {
        self.ledger.insert(alias.into(), counters);
    }
}

impl MessageStore for MemoryStore {
    fn get_conversation(&self, hash: &RecordHash) -> Result<ConversationRecord> {
        self.conversations
            .get(hash)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("conversation {}", hash)))
    }

    fn get_message(
        &self,
        conversation: &RecordHash,
        start: Option<&RecordHash>,
        visit: &mut Visitor<'_>,
    ) -> Result<()> {
        let messages = self
            .messages
            .get(conversation)
            .ok_or_else(|| Error::not_found(format!("conversation {}", conversation)))?;

        match start {
            Some(hash) => {
                let message = messages
                    .iter()
                    .find(|m| &m.hash == hash)
                    .ok_or_else(|| Error::not_found(format!("message {}", hash)))?;
                visit(message)
            }
            None => messages.iter().try_for_each(|m| visit(m)),
        }
    }

    fn get_all_conversations(&self, since: u64) -> Result<Vec<ConversationRecord>> {
        Ok(self
            .conversations
            .values()
            .filter(|c| c.timestamp >= since)
            .cloned()
            .collect())
    }

    fn get_recent_conversations(&self, limit: usize) -> Result<Vec<ConversationRecord>> {
        let mut conversations: Vec<&ConversationRecord> = self.conversations.values().collect();
        conversations.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.hash.cmp(&b.hash))
        });
        Ok(conversations.into_iter().take(limit).cloned().collect())
    }
}

impl LedgerSource for MemoryStore {
    fn ledger_counters(&self) -> Result<BTreeMap<String, LedgerCounters>> {
        Ok(self.ledger.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convey_types::models::MediaType;

    fn hash(id: u8) -> RecordHash {
        RecordHash::new(vec![id])
    }

    fn conversation(id: u8, timestamp: u64) -> ConversationRecord {
        ConversationRecord {
            hash: hash(id),
            topic: "topic".into(),
            author: "Alice".into(),
            timestamp,
            cost: 0,
        }
    }

    fn message(id: u8, previous: Option<u8>) -> MessageRecord {
        MessageRecord {
            hash: hash(id),
            previous: previous.map(hash),
            author: "Alice".into(),
            timestamp: 0,
            cost: 0,
            media_type: MediaType::TextPlain,
            content: Vec::new(),
        }
    }

    #[test]
    fn rejects_reply_as_root() {
        let mut store = MemoryStore::new();
        assert!(store
            .new_conversation(conversation(1, 0), message(2, Some(3)))
            .is_err());
    }

    #[test]
    fn rejects_duplicate_conversation() {
        let mut store = MemoryStore::new();
        store
            .new_conversation(conversation(1, 0), message(2, None))
            .unwrap();
        assert!(store
            .new_conversation(conversation(1, 0), message(3, None))
            .is_err());
    }

    #[test]
    fn add_message_needs_a_conversation() {
        let mut store = MemoryStore::new();
        let err = store.add_message(&hash(1), message(2, None)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn visits_everything_or_just_the_start() {
        let mut store = MemoryStore::new();
        store
            .new_conversation(conversation(1, 0), message(10, None))
            .unwrap();
        store.add_message(&hash(1), message(11, Some(10))).unwrap();
        store.add_message(&hash(1), message(12, Some(11))).unwrap();

        let mut seen = Vec::new();
        store
            .get_message(&hash(1), None, &mut |m: &MessageRecord| {
                seen.push(m.hash.clone());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![hash(10), hash(11), hash(12)]);

        seen.clear();
        store
            .get_message(&hash(1), Some(&hash(11)), &mut |m: &MessageRecord| {
                seen.push(m.hash.clone());
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![hash(11)]);

        let err = store
            .get_message(&hash(1), Some(&hash(99)), &mut |_: &MessageRecord| Ok(()))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn visitor_error_stops_the_walk() {
        let mut store = MemoryStore::new();
        store
            .new_conversation(conversation(1, 0), message(10, None))
            .unwrap();
        store.add_message(&hash(1), message(11, Some(10))).unwrap();

        let mut visits = 0;
        let err = store
            .get_message(&hash(1), None, &mut |_: &MessageRecord| {
                visits += 1;
                Err(Error::MalformedContent("stop".into()))
            })
            .unwrap_err();
        assert_eq!(visits, 1);
        assert!(matches!(err, Error::MalformedContent(_)));
    }

    #[test]
    fn recent_is_newest_first() {
        let mut store = MemoryStore::new();
        for (id, ts) in [(1, 30), (2, 10), (3, 20)] {
            store
                .new_conversation(conversation(id, ts), message(id + 10, None))
                .unwrap();
        }
        let recent = store.get_recent_conversations(2).unwrap();
        let hashes: Vec<_> = recent.into_iter().map(|c| c.hash).collect();
        assert_eq!(hashes, vec![hash(1), hash(3)]);

        assert_eq!(store.get_all_conversations(20).unwrap().len(), 2);
    }
}
