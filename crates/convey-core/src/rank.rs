use std::cmp::Ordering;

use crate::graph::{GraphNode, MessageGraph};

/// Orders the replies under every node: highest yield first, the most
/// recent reply first among equal yields.
pub struct YieldRanker;

impl YieldRanker {
    /// Sort every node's children in place. Run after
    /// [`crate::RewardPropagator::propagate`] so yields are final.
    pub fn rank(graph: &mut MessageGraph) {
        for index in 0..graph.nodes.len() {
            let mut children = std::mem::take(&mut graph.nodes[index].children);
            children.sort_by(|&a, &b| Self::compare(&graph.nodes[a], &graph.nodes[b]));
            graph.nodes[index].children = children;
        }
    }

    /// Hash is the last resort so equal rankings never depend on the order
    /// the store delivered messages in.
    pub fn compare(a: &GraphNode, b: &GraphNode) -> Ordering {
        b.net_yield
            .cmp(&a.net_yield)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
            .then_with(|| a.hash.cmp(&b.hash))
    }
}
