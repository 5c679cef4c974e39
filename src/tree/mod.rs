//! Adaptive Huffman tree (FGK)
//!
//! The tree is rebuilt incrementally after every symbol so that encoder and
//! decoder, fed the same symbols, always hold identical trees without ever
//! exchanging a frequency table.
//!
//! Every node carries a *number*. Ordered by number:
//! - weights are non-decreasing,
//! - every node is numbered below its parent,
//! - the escape leaf (NYT) holds number 0 and weight 0.
//!
//! `observe` restores this ordering after each weight increment by swapping
//! the node with the highest-numbered node of equal weight before bumping it.
//! Finding that peer is a linear scan, so an update costs
//! O(depth × node count); node count is bounded by `2 × 256 + 1`.

mod invariants;
mod node;
mod render;

pub use invariants::SiblingPropertyViolation;
pub use node::{LeafValue, Node, NodeId};

use std::collections::HashMap;

use tracing::{debug, trace};

/// One row of [`AdaptiveTree::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct NodeSnapshot {
    /// Sibling-property number.
    pub number: usize,
    /// Node weight.
    pub weight: u64,
    /// Leaf value, `None` for root/internal nodes.
    pub value: Option<LeafValue>,
    /// Number of the parent, `None` for the root.
    pub parent: Option<usize>,
    /// Numbers of `[child0, child1]`, if any.
    pub children: Option<[usize; 2]>,
}

/// Adaptive Huffman tree backed by a node arena.
#[derive(Debug, Clone)]
pub struct AdaptiveTree {
    /// Arena; a slot is only ever rewritten when the NYT leaf splits.
    nodes: Vec<Node>,

    /// Handles ordered by number; `by_number[n]` has number `n`.
    by_number: Vec<NodeId>,

    root: NodeId,

    /// Current escape node (the childless root before the first symbol).
    nyt: NodeId,

    /// Leaf handle of every symbol seen so far.
    leaves: HashMap<u8, NodeId>,
}

impl AdaptiveTree {
    /// Tree with a single childless root: every symbol is still unseen.
    pub fn new() -> Self {
        let root = NodeId(0);
        Self {
            nodes: vec![Node::empty_root()],
            by_number: vec![root],
            root,
            nyt: root,
            leaves: HashMap::new(),
        }
    }

    /// Handle of the root, the starting point of every traversal.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Handle of the escape node.
    #[inline]
    pub fn nyt(&self) -> NodeId {
        self.nyt
    }

    /// Look up a node by handle.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes currently in the tree, including the escape node.
    /// A fresh tree holds one node.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True before the first observation, even though the tree already
    /// holds its root.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Total number of observations.
    pub fn total_weight(&self) -> u64 {
        self.node(self.root).weight()
    }

    /// Number of distinct symbols observed.
    pub fn symbol_count(&self) -> usize {
        self.leaves.len()
    }

    /// Leaf holding `symbol`, if it has been observed.
    pub fn leaf(&self, symbol: u8) -> Option<NodeId> {
        self.leaves.get(&symbol).copied()
    }

    /// Handles in ascending number order.
    pub fn nodes_by_number(&self) -> &[NodeId] {
        &self.by_number
    }

    /// Account for one occurrence of `symbol`.
    pub fn observe(&mut self, symbol: u8) {
        let start = match self.leaf(symbol) {
            Some(leaf) => Some(leaf),
            // The split node already carries its own increment.
            None => {
                let split = self.split_nyt(symbol);
                self.node(split).parent()
            }
        };

        let mut cursor = start;
        while let Some(current) = cursor {
            if let Some(peer) = self.highest_peer(current) {
                if self.node(peer).number() != self.node(current).number() {
                    self.swap_nodes(current, peer);
                }
            }
            self.nodes[current.0].increment();
            cursor = self.node(current).parent();
        }

        self.sort_by_number();
    }

    /// Root-to-leaf path of `symbol` (`false` = child0), if it is known.
    pub fn code_for(&self, symbol: u8) -> Option<Vec<bool>> {
        self.leaf(symbol).map(|leaf| self.path_to(leaf))
    }

    /// Root-to-leaf path of the escape node; empty before the first symbol.
    pub fn nyt_code(&self) -> Vec<bool> {
        self.path_to(self.nyt)
    }

    /// Every node in number order, with links expressed as numbers.
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.by_number
            .iter()
            .map(|&id| {
                let node = self.node(id);
                NodeSnapshot {
                    number: node.number(),
                    weight: node.weight(),
                    value: node.value(),
                    parent: node.parent().map(|p| self.node(p).number()),
                    children: node
                        .children()
                        .map(|[c0, c1]| [self.node(c0).number(), self.node(c1).number()]),
                }
            })
            .collect()
    }

    /// Hash of the tree shape, numbering, weights and values.
    ///
    /// Two trees that went through the same observations produce the same
    /// fingerprint regardless of arena layout.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for row in self.snapshot() {
            hasher.update(&(row.number as u64).to_le_bytes());
            hasher.update(&row.weight.to_le_bytes());
            let value_tag: [u8; 2] = match row.value {
                None => [0, 0],
                Some(LeafValue::Nyt) => [1, 0],
                Some(LeafValue::Symbol(s)) => [2, s],
            };
            hasher.update(&value_tag);
            let parent = row.parent.map_or(u64::MAX, |p| p as u64);
            hasher.update(&parent.to_le_bytes());
            let [c0, c1] = row
                .children
                .map_or([u64::MAX; 2], |[a, b]| [a as u64, b as u64]);
            hasher.update(&c0.to_le_bytes());
            hasher.update(&c1.to_le_bytes());
        }
        hasher.finalize()
    }

    /// Replace the escape node with an inner node whose children are a new
    /// leaf for `symbol` (child0) and a fresh escape leaf (child1).
    ///
    /// Returns the handle of the new inner node, which reuses the old escape
    /// node's slot so its parent link stays valid.
    fn split_nyt(&mut self, symbol: u8) -> NodeId {
        let old = self.nyt;
        let old_number = self.node(old).number();
        debug_assert_eq!(old_number, 0, "escape node must hold the lowest number");

        for &id in &self.by_number[1..] {
            let number = self.nodes[id.0].number();
            self.nodes[id.0].set_number(number + 2);
        }

        let symbol_leaf = self.push(Node::Leaf {
            parent: old,
            value: LeafValue::Symbol(symbol),
            weight: 1,
            number: old_number + 1,
        });
        let nyt_leaf = self.push(Node::Leaf {
            parent: old,
            value: LeafValue::Nyt,
            weight: 0,
            number: old_number,
        });

        let children = [symbol_leaf, nyt_leaf];
        self.nodes[old.0] = match self.node(old).parent() {
            Some(parent) => Node::Internal {
                parent,
                children,
                weight: 1,
                number: old_number + 2,
            },
            None => Node::Root {
                weight: 1,
                number: old_number + 2,
                children: Some(children),
            },
        };

        let mut by_number = Vec::with_capacity(self.by_number.len() + 2);
        by_number.extend([nyt_leaf, symbol_leaf, old]);
        by_number.extend_from_slice(&self.by_number[1..]);
        self.by_number = by_number;

        self.nyt = nyt_leaf;
        self.leaves.insert(symbol, symbol_leaf);
        debug!(symbol, nodes = self.nodes.len(), "split escape node");

        old
    }

    /// Highest-numbered node with the same weight as `id`, skipping the
    /// root and `id`'s own parent. May return `id` itself.
    fn highest_peer(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        if node.is_root() {
            return None;
        }
        let weight = node.weight();
        let parent = node.parent();
        self.by_number.iter().rev().copied().find(|&candidate| {
            let other = self.node(candidate);
            other.weight() == weight && !other.is_root() && Some(candidate) != parent
        })
    }

    /// Exchange the tree positions of `a` and `b`.
    ///
    /// Numbers and parent links move; weights and values stay with the
    /// nodes. Neither node may be the root, and neither may be an ancestor
    /// of the other.
    fn swap_nodes(&mut self, a: NodeId, b: NodeId) {
        let (parent_a, parent_b) = match (self.node(a).parent(), self.node(b).parent()) {
            (Some(pa), Some(pb)) => (pa, pb),
            _ => {
                debug_assert!(false, "root cannot take part in a swap");
                return;
            }
        };
        let number_a = self.node(a).number();
        let number_b = self.node(b).number();
        trace!(number_a, number_b, "swap");

        if parent_a == parent_b {
            if let Some(children) = self.node(parent_a).children() {
                let swapped = children.map(|c| if c == a { b } else if c == b { a } else { c });
                self.set_children(parent_a, swapped);
            }
        } else {
            self.nodes[parent_a.0].replace_child(a, b);
            self.nodes[parent_b.0].replace_child(b, a);
        }
        self.nodes[a.0].set_parent(parent_b);
        self.nodes[b.0].set_parent(parent_a);

        self.nodes[a.0].set_number(number_b);
        self.nodes[b.0].set_number(number_a);
        self.by_number.swap(number_a, number_b);
    }

    fn set_children(&mut self, id: NodeId, value: [NodeId; 2]) {
        match &mut self.nodes[id.0] {
            Node::Root { children, .. } => *children = Some(value),
            Node::Internal { children, .. } => *children = value,
            Node::Leaf { .. } => debug_assert!(false, "leaf has no children"),
        }
    }

    /// Re-establish `by_number` order. A no-op unless the order drifted.
    fn sort_by_number(&mut self) {
        let nodes = &self.nodes;
        self.by_number.sort_by_key(|id| nodes[id.0].number());
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn path_to(&self, id: NodeId) -> Vec<bool> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent() {
            let bit = matches!(self.node(parent).children(), Some([_, c1]) if c1 == current);
            path.push(bit);
            current = parent;
        }
        path.reverse();
        path
    }
}

impl Default for AdaptiveTree {
    fn default() -> Self {
        Self::new()
    }
}
