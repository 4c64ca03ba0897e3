use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use convey_types::RecordHash;
use convey_types::models::{MessageRecord, ReplyNode};

use crate::content::ContentFormatter;
use crate::error::{Error, Result};

/// Index of the root message in [`MessageGraph::nodes`].
pub const ROOT: usize = 0;

/// One message in a reconstructed conversation.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub hash: RecordHash,
    pub previous: Option<RecordHash>,
    pub author: String,
    pub timestamp: u64,
    pub cost: u64,
    pub reward: u64,
    pub net_yield: i64,
    pub content: String,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

impl GraphNode {
    fn new(message: &MessageRecord, content: String) -> Self {
        Self {
            hash: message.hash.clone(),
            previous: message.previous.clone(),
            author: message.author.clone(),
            timestamp: message.timestamp,
            cost: message.cost,
            reward: 0,
            net_yield: -(message.cost.min(i64::MAX as u64) as i64),
            content,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// What the builder kept and what it left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Replies attached below the root.
    pub replies: usize,
    /// Replies whose previous hash matched no message.
    pub orphans: usize,
    /// Replies whose parent exists but never reaches the root.
    pub unreachable: usize,
    /// Messages seen again under a hash already visited.
    pub duplicates: usize,
    /// Root messages beyond the one kept.
    pub extra_roots: usize,
}

/// A conversation's messages linked into a rooted tree.
///
/// Nodes are stored breadth first from the root, so every parent comes
/// before its children. Only nodes reachable from the root are kept.
#[derive(Debug, Clone)]
pub struct MessageGraph {
    pub(crate) nodes: Vec<GraphNode>,
    stats: GraphStats,
}

impl MessageGraph {
    pub fn root(&self) -> &GraphNode {
        &self.nodes[ROOT]
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(|n| n.parent)
    }

    pub fn children(&self, index: usize) -> &[usize] {
        self.nodes
            .get(index)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn find(&self, hash: &RecordHash) -> Option<usize> {
        self.nodes.iter().position(|n| &n.hash == hash)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    /// Split into the root node and its replies, flattened in depth-first
    /// order with the current child order at every level.
    pub fn into_tree(self) -> (GraphNode, ReplyTree) {
        let len = self.nodes.len();

        // Parents precede children, so one forward pass settles every depth.
        let mut depths = vec![0usize; len];
        for index in ROOT + 1..len {
            if let Some(parent) = self.nodes[index].parent {
                depths[index] = depths[parent] + 1;
            }
        }

        let mut order = Vec::with_capacity(len.saturating_sub(1));
        let mut stack: Vec<usize> = self.nodes[ROOT].children.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.nodes[index].children.iter().rev().copied());
        }

        let mut remap = vec![usize::MAX; len];
        for (new, &old) in order.iter().enumerate() {
            remap[old] = new;
        }

        let mut slots: Vec<Option<GraphNode>> = self.nodes.into_iter().map(Some).collect();
        let mut root = match slots[ROOT].take() {
            Some(root) => root,
            None => unreachable!("message graph always has a root"),
        };

        let mut nodes = Vec::with_capacity(order.len());
        for &old in &order {
            let Some(node) = slots[old].take() else {
                continue;
            };
            // Only the root lacks a previous hash.
            let Some(previous_hash) = node.previous else {
                continue;
            };
            nodes.push(ReplyNode {
                message_hash: node.hash,
                previous_hash,
                author: node.author,
                timestamp: node.timestamp,
                cost: node.cost,
                reward: node.reward,
                net_yield: node.net_yield,
                content: node.content,
                depth: depths[old],
                replies: node.children.iter().map(|&child| remap[child]).collect(),
            });
        }

        let replies = root.children.iter().map(|&child| remap[child]).collect();
        root.children.clear();
        (root, ReplyTree { replies, nodes })
    }
}

/// Replies of one conversation in ranked depth-first order, linked by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyTree {
    /// Indices into `nodes` of the replies to the root.
    pub replies: Vec<usize>,
    pub nodes: Vec<ReplyNode>,
}

/// Collects the messages of one conversation, in whatever order the store
/// delivers them, and links them into a [`MessageGraph`].
///
/// Parents are resolved only once every message has been seen, so replies
/// may arrive before or after the message they answer.
pub struct MessageGraphBuilder<'f> {
    formatter: Option<&'f dyn ContentFormatter>,
    roots: Vec<GraphNode>,
    replies: Vec<GraphNode>,
    seen: HashSet<RecordHash>,
    stats: GraphStats,
}

impl Default for MessageGraphBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f> MessageGraphBuilder<'f> {
    /// A builder that leaves content unrendered. Enough for reward totals.
    pub fn new() -> Self {
        Self {
            formatter: None,
            roots: Vec::new(),
            replies: Vec::new(),
            seen: HashSet::new(),
            stats: GraphStats::default(),
        }
    }

    /// A builder that renders every message body, failing on the first body
    /// the formatter rejects.
    pub fn with_formatter(formatter: &'f dyn ContentFormatter) -> Self {
        Self {
            formatter: Some(formatter),
            ..Self::new()
        }
    }

    /// Accept one message from the store.
    pub fn visit(&mut self, message: &MessageRecord) -> Result<()> {
        if !self.seen.insert(message.hash.clone()) {
            debug!("Skipping duplicate message {}", message.hash);
            self.stats.duplicates += 1;
            return Ok(());
        }

        let content = match self.formatter {
            Some(formatter) => formatter.format(message)?,
            None => String::new(),
        };

        let node = GraphNode::new(message, content);
        if message.is_root() {
            self.roots.push(node);
        } else {
            self.replies.push(node);
        }
        Ok(())
    }

    /// Link everything seen so far into a tree.
    ///
    /// Fails with [`Error::NotFound`] if no root message was visited.
    pub fn finish(self) -> Result<MessageGraph> {
        let MessageGraphBuilder {
            mut roots,
            replies,
            mut stats,
            ..
        } = self;

        // Earliest root wins; ties keep arrival order.
        let Some(root_pos) = roots
            .iter()
            .enumerate()
            .min_by_key(|(_, node)| node.timestamp)
            .map(|(pos, _)| pos)
        else {
            return Err(Error::not_found("root message"));
        };
        let root = roots.swap_remove(root_pos);
        for extra in &roots {
            debug!("Ignoring extra root message {}", extra.hash);
        }
        stats.extra_roots = roots.len();

        let mut nodes = Vec::with_capacity(replies.len() + 1);
        nodes.push(root);
        nodes.extend(replies);

        let index: HashMap<RecordHash, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.hash.clone(), i))
            .collect();

        for i in ROOT + 1..nodes.len() {
            let parent = nodes[i]
                .previous
                .as_ref()
                .and_then(|previous| index.get(previous))
                .copied()
                .filter(|&p| p != i);
            match parent {
                Some(p) => {
                    nodes[i].parent = Some(p);
                    nodes[p].children.push(i);
                }
                None => {
                    debug!(
                        "Dropping orphan reply {} (previous {:?})",
                        nodes[i].hash, nodes[i].previous
                    );
                    stats.orphans += 1;
                }
            }
        }
        drop(index);

        // Breadth-first from the root; anything not reached hangs off an
        // orphan or a cycle.
        let mut order = Vec::with_capacity(nodes.len());
        let mut queue = VecDeque::from([ROOT]);
        while let Some(i) = queue.pop_front() {
            order.push(i);
            queue.extend(nodes[i].children.iter().copied());
        }

        let resolved = nodes.len() - 1 - stats.orphans;
        stats.replies = order.len() - 1;
        stats.unreachable = resolved - stats.replies;
        if stats.unreachable > 0 {
            debug!("Dropping {} replies unreachable from the root", stats.unreachable);
        }

        let mut remap = vec![usize::MAX; nodes.len()];
        for (new, &old) in order.iter().enumerate() {
            remap[old] = new;
        }

        let mut slots: Vec<Option<GraphNode>> = nodes.into_iter().map(Some).collect();
        let mut linked = Vec::with_capacity(order.len());
        for &old in &order {
            let Some(mut node) = slots[old].take() else {
                continue;
            };
            node.parent = node.parent.map(|p| remap[p]);
            for child in &mut node.children {
                *child = remap[*child];
            }
            linked.push(node);
        }

        Ok(MessageGraph {
            nodes: linked,
            stats,
        })
    }
}
