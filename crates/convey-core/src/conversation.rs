use tracing::debug;

use convey_types::RecordHash;
use convey_types::models::{ConversationView, MessageRecord};

use crate::content::ContentFormatter;
use crate::error::Result;
use crate::graph::{MessageGraph, MessageGraphBuilder};
use crate::rank::YieldRanker;
use crate::reward::{RewardPropagator, net_yield};
use crate::store::MessageStore;

/// Rebuild a conversation from the store: link its messages, propagate
/// rewards, rank replies and render every body.
///
/// Any failure, including one body the formatter rejects, aborts the whole
/// build.
pub fn build_conversation<S: MessageStore + ?Sized>(
    store: &S,
    formatter: &dyn ContentFormatter,
    hash: &RecordHash,
) -> Result<ConversationView> {
    let conversation = store.get_conversation(hash)?;

    let mut graph = load_graph(store, hash, MessageGraphBuilder::with_formatter(formatter))?;
    let summary = RewardPropagator::propagate(&mut graph);
    YieldRanker::rank(&mut graph);

    let stats = graph.stats();
    debug!(
        "Built conversation {}: {} replies, {} orphans, {} unreachable, {} credited, {} burned",
        hash, stats.replies, stats.orphans, stats.unreachable, summary.credited, summary.burned
    );

    let (root, tree) = graph.into_tree();
    let cost = conversation.cost.saturating_add(root.cost);

    Ok(ConversationView {
        conversation_hash: conversation.hash,
        message_hash: root.hash,
        topic: conversation.topic,
        author: conversation.author,
        timestamp: conversation.timestamp,
        cost,
        reward: root.reward,
        net_yield: net_yield(root.reward, cost),
        content: root.content,
        replies: tree.replies,
        nodes: tree.nodes,
    })
}

/// `(root message cost, total reward credited anywhere in the tree)` for one
/// conversation. Bodies are not rendered.
pub fn conversation_yield<S: MessageStore + ?Sized>(
    store: &S,
    hash: &RecordHash,
) -> Result<(u64, u64)> {
    let mut graph = load_graph(store, hash, MessageGraphBuilder::new())?;
    let summary = RewardPropagator::propagate(&mut graph);
    Ok((graph.root().cost, summary.credited))
}

fn load_graph<S: MessageStore + ?Sized>(
    store: &S,
    hash: &RecordHash,
    mut builder: MessageGraphBuilder<'_>,
) -> Result<MessageGraph> {
    store.get_message(hash, None, &mut |message: &MessageRecord| {
        builder.visit(message)
    })?;
    builder.finish()
}
