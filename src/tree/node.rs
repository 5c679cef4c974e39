//! Node model for the adaptive tree
//!
//! Nodes live in an arena owned by [`super::AdaptiveTree`]; links between
//! them are [`NodeId`] handles rather than references, so parent and child
//! pointers never form ownership cycles.

use std::fmt;

/// Stable handle of a node inside the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct NodeId(pub(super) usize);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Value stored in a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub enum LeafValue {
    /// Escape marker: the next bits carry a literal for an unseen symbol.
    Nyt,
    /// A symbol that has been observed at least once.
    Symbol(u8),
}

/// Tree node, one variant per structural role.
///
/// `child0` is reached on a `0` bit and `child1` on a `1` bit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub enum Node {
    /// Entry point of the tree. Childless until the first observation,
    /// during which time it stands in for the escape leaf.
    Root {
        /// Total number of observations so far.
        weight: u64,
        /// Sibling-property number (always the highest).
        number: usize,
        /// `[child0, child1]`, or `None` before the first observation.
        children: Option<[NodeId; 2]>,
    },
    /// Inner node with exactly two children.
    Internal {
        /// Parent handle.
        parent: NodeId,
        /// `[child0, child1]`.
        children: [NodeId; 2],
        /// Sum of the leaf weights below this node.
        weight: u64,
        /// Sibling-property number.
        number: usize,
    },
    /// Symbol or escape leaf.
    Leaf {
        /// Parent handle.
        parent: NodeId,
        /// Symbol carried by the leaf.
        value: LeafValue,
        /// Occurrence count (0 for the escape leaf).
        weight: u64,
        /// Sibling-property number.
        number: usize,
    },
}

impl Node {
    pub(super) fn empty_root() -> Self {
        Node::Root {
            weight: 0,
            number: 0,
            children: None,
        }
    }

    /// True for `Leaf` nodes only; a childless root is not a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// True for the root node.
    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self, Node::Root { .. })
    }

    /// True when reaching this node means a literal follows: the NYT leaf,
    /// or the root before anything has been observed.
    pub fn is_escape(&self) -> bool {
        match self {
            Node::Root { children, .. } => children.is_none(),
            Node::Internal { .. } => false,
            Node::Leaf { value, .. } => *value == LeafValue::Nyt,
        }
    }

    /// Occurrence count of the subtree.
    #[inline]
    pub fn weight(&self) -> u64 {
        match self {
            Node::Root { weight, .. } | Node::Internal { weight, .. } | Node::Leaf { weight, .. } => {
                *weight
            }
        }
    }

    /// Sibling-property number.
    #[inline]
    pub fn number(&self) -> usize {
        match self {
            Node::Root { number, .. } | Node::Internal { number, .. } | Node::Leaf { number, .. } => {
                *number
            }
        }
    }

    /// Parent handle; `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        match self {
            Node::Root { .. } => None,
            Node::Internal { parent, .. } | Node::Leaf { parent, .. } => Some(*parent),
        }
    }

    /// `[child0, child1]` for nodes that have children.
    #[inline]
    pub fn children(&self) -> Option<[NodeId; 2]> {
        match self {
            Node::Root { children, .. } => *children,
            Node::Internal { children, .. } => Some(*children),
            Node::Leaf { .. } => None,
        }
    }

    /// Value of a leaf; `None` for root and internal nodes.
    pub fn value(&self) -> Option<LeafValue> {
        match self {
            Node::Leaf { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub(super) fn increment(&mut self) {
        match self {
            Node::Root { weight, .. } | Node::Internal { weight, .. } | Node::Leaf { weight, .. } => {
                *weight += 1
            }
        }
    }

    pub(super) fn set_number(&mut self, value: usize) {
        match self {
            Node::Root { number, .. } | Node::Internal { number, .. } | Node::Leaf { number, .. } => {
                *number = value
            }
        }
    }

    pub(super) fn set_parent(&mut self, value: NodeId) {
        match self {
            Node::Root { .. } => debug_assert!(false, "root has no parent slot"),
            Node::Internal { parent, .. } | Node::Leaf { parent, .. } => *parent = value,
        }
    }

    /// Re-point whichever child slot holds `old` to `new`.
    pub(super) fn replace_child(&mut self, old: NodeId, new: NodeId) {
        let slots = match self {
            Node::Root {
                children: Some(children),
                ..
            }
            | Node::Internal { children, .. } => children,
            _ => return,
        };
        if let Some(slot) = slots.iter_mut().find(|slot| **slot == old) {
            *slot = new;
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Root { weight, .. } => write!(f, "Root {}", weight),
            Node::Internal { weight, .. } => write!(f, "N {}", weight),
            Node::Leaf {
                value: LeafValue::Nyt,
                ..
            } => write!(f, "NYT"),
            Node::Leaf {
                value: LeafValue::Symbol(symbol),
                weight,
                ..
            } => write!(f, "{} {}", display_symbol(*symbol), weight),
        }
    }
}

/// Printable ASCII is shown as a character, everything else as hex.
pub(crate) fn display_symbol(symbol: u8) -> String {
    if symbol.is_ascii_graphic() {
        (symbol as char).to_string()
    } else {
        format!("0x{:02X}", symbol)
    }
}
