use crate::graph::{MessageGraph, ROOT};

/// Token flow for one conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationSummary {
    /// Sum of every reward credited anywhere in the tree.
    pub credited: u64,
    /// Reply cost that reached no one. `credited + burned` equals the total
    /// cost of all replies.
    pub burned: u64,
}

/// Pushes each reply's cost up its chain of ancestors.
///
/// The parent receives half of the cost (rounded down); the remainder moves
/// up a level and is halved again, until a share lands on the root. What
/// is left at the root, and every odd unit dropped on the way, is burned.
pub struct RewardPropagator;

impl RewardPropagator {
    /// Credit all rewards, then derive every node's yield.
    ///
    /// Yields are only computed once every reply has been propagated, since a
    /// node can be credited by any of its descendants.
    pub fn propagate(graph: &mut MessageGraph) -> PropagationSummary {
        let summary = Self::credit(graph);
        Self::derive_yields(graph);
        summary
    }

    fn credit(graph: &mut MessageGraph) -> PropagationSummary {
        let mut summary = PropagationSummary::default();

        for index in ROOT + 1..graph.nodes.len() {
            let cost = graph.nodes[index].cost;
            let mut remaining = cost;
            let mut current = index;
            let mut credited = 0u64;

            while let Some(parent) = graph.nodes[current].parent {
                let half = remaining / 2;
                if half == 0 {
                    // Nothing left to split; every level above would get 0.
                    break;
                }
                let node = &mut graph.nodes[parent];
                node.reward = node.reward.saturating_add(half);
                credited += half;
                if parent == ROOT {
                    break;
                }
                remaining -= half;
                current = parent;
            }

            summary.credited = summary.credited.saturating_add(credited);
            summary.burned = summary.burned.saturating_add(cost - credited);
        }

        summary
    }

    fn derive_yields(graph: &mut MessageGraph) {
        for node in &mut graph.nodes {
            node.net_yield = net_yield(node.reward, node.cost);
        }
    }
}

/// reward − cost, saturating at the bounds of `i64`.
pub fn net_yield(reward: u64, cost: u64) -> i64 {
    let value = reward as i128 - cost as i128;
    i64::try_from(value).unwrap_or(if value > 0 { i64::MAX } else { i64::MIN })
}
