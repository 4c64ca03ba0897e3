use chrono::{DateTime, Utc};
use tracing::debug;

use convey_types::api::{BestPage, BestQuery, Period, RecentPage, RecentQuery};
use convey_types::models::{ConversationListing, ConversationRecord};

use crate::error::Result;
use crate::reward::net_yield;
use crate::store::MessageStore;

/// Produces the "best" and "recent" conversation listings.
pub struct ConversationRanker<'s, S: MessageStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: MessageStore + ?Sized> ConversationRanker<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Conversations created inside `period` (relative to `now`), highest
    /// yield first, at most `limit` of them.
    pub fn best(
        &self,
        period: Period,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ConversationListing>> {
        let since = period.since(now);
        let conversations = self.store.get_all_conversations(since)?;
        debug!(
            "Ranking {} conversations since {} ({})",
            conversations.len(),
            since,
            period
        );

        let mut listings = conversations
            .into_iter()
            .map(|c| self.listing(c))
            .collect::<Result<Vec<_>>>()?;

        listings.sort_by(|a, b| {
            b.net_yield
                .cmp(&a.net_yield)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
                .then_with(|| a.hash.cmp(&b.hash))
        });
        listings.truncate(limit);
        Ok(listings)
    }

    /// The `limit` most recent conversations, in the store's recency order.
    pub fn recent(&self, limit: usize) -> Result<Vec<ConversationListing>> {
        self.store
            .get_recent_conversations(limit)?
            .into_iter()
            .map(|c| self.listing(c))
            .collect()
    }

    pub fn best_page(&self, query: &BestQuery, now: DateTime<Utc>) -> Result<BestPage> {
        Ok(BestPage {
            listings: self.best(query.period, query.limit, now)?,
            period: query.period,
            more_limit: query.limit.saturating_mul(2),
        })
    }

    pub fn recent_page(&self, query: &RecentQuery) -> Result<RecentPage> {
        Ok(RecentPage {
            listings: self.recent(query.limit)?,
            more_limit: query.limit.saturating_mul(2),
        })
    }

    fn listing(&self, conversation: ConversationRecord) -> Result<ConversationListing> {
        let (message_cost, reward) = self.store.get_yield(&conversation.hash)?;
        let cost = conversation.cost.saturating_add(message_cost);
        Ok(ConversationListing {
            hash: conversation.hash,
            topic: conversation.topic,
            author: conversation.author,
            timestamp: conversation.timestamp,
            cost,
            reward,
            net_yield: net_yield(reward, cost),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::TimeZone;
    use convey_types::RecordHash;
    use convey_types::models::{MediaType, MessageRecord};

    const NANOS_PER_HOUR: u64 = 3_600_000_000_000;

    fn hash(id: u8) -> RecordHash {
        RecordHash::new(vec![id])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap()
    }

    fn midnight() -> u64 {
        Period::Day.since(now())
    }

    /// Conversation `id` with root message `id + 100`, plus one reply of
    /// `reply_cost` under the root.
    fn seed(store: &mut MemoryStore, id: u8, timestamp: u64, cost: u64, reply_cost: u64) {
        store
            .new_conversation(
                ConversationRecord {
                    hash: hash(id),
                    topic: format!("topic {}", id),
                    author: "Alice".into(),
                    timestamp,
                    cost,
                },
                MessageRecord {
                    hash: hash(id + 100),
                    previous: None,
                    author: "Alice".into(),
                    timestamp,
                    cost: 0,
                    media_type: MediaType::TextPlain,
                    content: b"root".to_vec(),
                },
            )
            .unwrap();
        store
            .add_message(
                &hash(id),
                MessageRecord {
                    hash: hash(id + 50),
                    previous: Some(hash(id + 100)),
                    author: "Bob".into(),
                    timestamp: timestamp + 1,
                    cost: reply_cost,
                    media_type: MediaType::TextPlain,
                    content: b"reply".to_vec(),
                },
            )
            .unwrap();
    }

    fn hashes(listings: &[ConversationListing]) -> Vec<RecordHash> {
        listings.iter().map(|l| l.hash.clone()).collect()
    }

    #[test]
    fn best_sorts_by_yield() {
        let mut store = MemoryStore::new();
        let t = midnight() + NANOS_PER_HOUR;
        seed(&mut store, 1, t, 2, 0);
        seed(&mut store, 2, t + 1, 2, 20);
        seed(&mut store, 3, t + 2, 2, 8);

        let listings = ConversationRanker::new(&store)
            .best(Period::Day, 8, now())
            .unwrap();
        assert_eq!(hashes(&listings), vec![hash(2), hash(3), hash(1)]);
        assert_eq!(listings[0].cost, 2);
        assert_eq!(listings[0].reward, 10);
        assert_eq!(listings[0].net_yield, 8);
    }

    #[test]
    fn best_truncates_to_limit() {
        let mut store = MemoryStore::new();
        let t = midnight();
        for id in 1..=10 {
            seed(&mut store, id, t + id as u64, 0, id as u64 * 2);
        }
        let listings = ConversationRanker::new(&store)
            .best(Period::Day, 3, now())
            .unwrap();
        assert_eq!(hashes(&listings), vec![hash(10), hash(9), hash(8)]);
    }

    #[test]
    fn day_window_includes_its_boundary() {
        let mut store = MemoryStore::new();
        seed(&mut store, 1, midnight(), 0, 0);
        seed(&mut store, 2, midnight() - 1, 0, 0);

        let ranker = ConversationRanker::new(&store);
        let day = ranker.best(Period::Day, 8, now()).unwrap();
        assert_eq!(hashes(&day), vec![hash(1)]);

        let all = ranker.best(Period::All, 8, now()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn equal_yields_prefer_recent() {
        let mut store = MemoryStore::new();
        let t = midnight();
        seed(&mut store, 1, t + 5, 1, 0);
        seed(&mut store, 2, t + 9, 1, 0);
        let listings = ConversationRanker::new(&store)
            .best(Period::Day, 8, now())
            .unwrap();
        assert_eq!(hashes(&listings), vec![hash(2), hash(1)]);
    }

    #[test]
    fn recent_keeps_store_order() {
        let mut store = MemoryStore::new();
        seed(&mut store, 1, 100, 0, 40);
        seed(&mut store, 2, 200, 0, 0);
        seed(&mut store, 3, 300, 0, 10);

        let listings = ConversationRanker::new(&store).recent(2).unwrap();
        assert_eq!(hashes(&listings), vec![hash(3), hash(2)]);
        assert_eq!(listings[0].reward, 5);
    }

    #[test]
    fn pages_offer_a_longer_next_page() {
        let mut store = MemoryStore::new();
        seed(&mut store, 1, midnight(), 0, 0);
        let ranker = ConversationRanker::new(&store);

        let page = ranker.best_page(&BestQuery::default(), now()).unwrap();
        assert_eq!(page.period, Period::Day);
        assert_eq!(page.more_limit, 16);
        assert_eq!(page.listings.len(), 1);

        let page = ranker.recent_page(&RecentQuery { limit: 5 }).unwrap();
        assert_eq!(page.more_limit, 10);
    }
}
