//! End-to-end checks over the in-memory store: build a conversation the way
//! a page render does and verify the token accounting on the result.

use convey_core::{
    ConversationRanker, MemoryStore, MessageStore, PlainTextFormatter, build_conversation,
};
use convey_types::RecordHash;
use convey_types::api::Period;
use convey_types::models::{ConversationRecord, ConversationView, MediaType, MessageRecord};

fn hash(id: u16) -> RecordHash {
    RecordHash::new(id.to_be_bytes().to_vec())
}

fn message(id: u16, previous: Option<u16>, timestamp: u64, cost: u64) -> MessageRecord {
    MessageRecord {
        hash: hash(id),
        previous: previous.map(hash),
        author: format!("user{}", id % 5),
        timestamp,
        cost,
        media_type: MediaType::TextPlain,
        content: format!("message {}", id).into_bytes(),
    }
}

/// A busy thread: 60 replies with mixed depth and cost, plus two orphans.
fn thread_messages() -> Vec<MessageRecord> {
    let mut messages = Vec::new();
    for id in 1..=60u16 {
        let parent = if id < 4 { 0 } else { id / 3 };
        let cost = (id as u64 * 13) % 29;
        messages.push(message(id, Some(parent), 1_000 + (id as u64 % 7), cost));
    }
    messages.push(message(500, Some(400), 2_000, 100));
    messages.push(message(501, Some(500), 2_001, 100));
    messages
}

fn store_with(replies: &[MessageRecord]) -> MemoryStore {
    let mut store = MemoryStore::new();
    store
        .new_conversation(
            ConversationRecord {
                hash: hash(9999),
                topic: "Token economics".into(),
                author: "user0".into(),
                timestamp: 1_000,
                cost: 11,
            },
            message(0, None, 1_000, 17),
        )
        .unwrap();
    for reply in replies {
        store.add_message(&hash(9999), reply.clone()).unwrap();
    }
    store
}

fn render(store: &MemoryStore) -> ConversationView {
    build_conversation(store, &PlainTextFormatter, &hash(9999)).unwrap()
}

#[test]
fn total_reward_never_exceeds_reply_cost() {
    let store = store_with(&thread_messages());
    let view = render(&store);

    let nodes: Vec<_> = view.nodes.iter().collect();
    let reply_cost: u64 = nodes.iter().map(|n| n.cost).sum();
    let reward: u64 = view.reward + nodes.iter().map(|n| n.reward).sum::<u64>();
    assert!(reward <= reply_cost);

    let (root_cost, total_reward) = store.get_yield(&hash(9999)).unwrap();
    assert_eq!(root_cost, 17);
    assert_eq!(total_reward, reward);
}

#[test]
fn orphans_are_left_out() {
    let view = render(&store_with(&thread_messages()));
    let nodes: Vec<_> = view.nodes.iter().collect();
    assert_eq!(nodes.len(), 60);
    assert!(nodes.iter().all(|n| n.message_hash != hash(500)));
    assert!(nodes.iter().all(|n| n.message_hash != hash(501)));
}

#[test]
fn rebuilding_is_idempotent_whatever_the_arrival_order() {
    let forward = thread_messages();
    let mut backward = forward.clone();
    backward.reverse();
    let mut interleaved: Vec<MessageRecord> = forward.iter().step_by(2).cloned().collect();
    interleaved.extend(forward.iter().skip(1).step_by(2).cloned());

    let a = render(&store_with(&forward));
    let b = render(&store_with(&forward));
    let c = render(&store_with(&backward));
    let d = render(&store_with(&interleaved));
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(a, d);
}

#[test]
fn every_level_is_ranked() {
    let view = render(&store_with(&thread_messages()));
    let mut levels = vec![&view.replies];
    levels.extend(view.nodes.iter().map(|n| &n.replies));
    for level in levels {
        for pair in level.windows(2) {
            let (a, b) = (&view.nodes[pair[0]], &view.nodes[pair[1]]);
            assert!(
                a.net_yield > b.net_yield
                    || (a.net_yield == b.net_yield && a.timestamp >= b.timestamp),
                "{:?} ranked above {:?}",
                a.message_hash,
                b.message_hash
            );
        }
    }
}

#[test]
fn depth_follows_the_reply_chain() {
    let view = render(&store_with(&thread_messages()));
    for top in view.top_replies() {
        assert_eq!(top.depth, 1);
    }
    for node in &view.nodes {
        for child in view.children(node) {
            assert_eq!(child.depth, node.depth + 1);
            assert_eq!(child.previous_hash, node.message_hash);
        }
    }
}

#[test]
fn yields_are_reward_minus_cost() {
    let view = render(&store_with(&thread_messages()));
    assert_eq!(view.cost, 11 + 17);
    assert_eq!(view.net_yield, view.reward as i64 - view.cost as i64);
    for node in view.nodes.iter() {
        assert_eq!(node.net_yield, node.reward as i64 - node.cost as i64);
    }
}

#[test]
fn listing_totals_match_the_rendered_tree() {
    let store = store_with(&thread_messages());
    let view = render(&store);
    let tree_reward: u64 =
        view.reward + view.nodes.iter().map(|n| n.reward).sum::<u64>();

    let listings = ConversationRanker::new(&store).recent(8).unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].cost, view.cost);
    assert_eq!(listings[0].reward, tree_reward);

    let best = ConversationRanker::new(&store)
        .best(Period::All, 8, chrono::Utc::now())
        .unwrap();
    assert_eq!(best, listings);
}
