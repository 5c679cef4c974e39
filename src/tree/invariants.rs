//! Structural checks for the sibling property
//!
//! Used by tests and debug tooling; `observe` itself never calls these.

use thiserror::Error;

use super::{AdaptiveTree, LeafValue, NodeId};

/// A broken tree invariant, reported with the node numbers involved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SiblingPropertyViolation {
    /// Node numbers are not exactly `0..len`.
    #[error("node numbers are not a permutation of 0..{len}")]
    NumberingNotPermutation {
        /// Node count.
        len: usize,
    },

    /// Weight decreases between two consecutive numbers.
    #[error("weight drops from {weight} at number {number} to {next_weight} at the next number")]
    WeightOrder {
        /// Lower of the two numbers.
        number: usize,
        /// Its weight.
        weight: u64,
        /// Weight at `number + 1`.
        next_weight: u64,
    },

    /// A child is numbered above its parent.
    #[error("node {child} is numbered above its parent {parent}")]
    ChildAboveParent {
        /// Child number.
        child: usize,
        /// Parent number.
        parent: usize,
    },

    /// Parent and child handles disagree.
    #[error("node {child} does not point back to parent {parent}")]
    BrokenLink {
        /// Child number.
        child: usize,
        /// Parent number.
        parent: usize,
    },

    /// An inner node's weight is not the sum of its children.
    #[error("node {number} has weight {weight} but its children sum to {sum}")]
    WeightSum {
        /// Inner node number.
        number: usize,
        /// Stored weight.
        weight: u64,
        /// Sum of the children.
        sum: u64,
    },

    /// The escape leaf is missing, duplicated, or misplaced.
    #[error("escape leaf invariant broken: {0}")]
    Escape(&'static str),
}

impl AdaptiveTree {
    /// Verify numbering, ordering, links, weight sums and escape placement.
    pub fn check_invariants(&self) -> Result<(), SiblingPropertyViolation> {
        let len = self.nodes.len();
        let mut seen = vec![false; len];
        for node in &self.nodes {
            let number = node.number();
            if number >= len || std::mem::replace(&mut seen[number], true) {
                return Err(SiblingPropertyViolation::NumberingNotPermutation { len });
            }
        }

        let ordered: Vec<NodeId> = {
            let mut ids: Vec<NodeId> = (0..len).map(NodeId).collect();
            ids.sort_by_key(|id| self.node(*id).number());
            ids
        };
        if ordered != self.by_number {
            return Err(SiblingPropertyViolation::NumberingNotPermutation { len });
        }

        for pair in ordered.windows(2) {
            let (lower, upper) = (self.node(pair[0]), self.node(pair[1]));
            if lower.weight() > upper.weight() {
                return Err(SiblingPropertyViolation::WeightOrder {
                    number: lower.number(),
                    weight: lower.weight(),
                    next_weight: upper.weight(),
                });
            }
        }

        for &id in &ordered {
            let node = self.node(id);
            if let Some(children) = node.children() {
                let mut sum = 0;
                for child in children {
                    let child_node = self.node(child);
                    if child_node.parent() != Some(id) {
                        return Err(SiblingPropertyViolation::BrokenLink {
                            child: child_node.number(),
                            parent: node.number(),
                        });
                    }
                    if child_node.number() >= node.number() {
                        return Err(SiblingPropertyViolation::ChildAboveParent {
                            child: child_node.number(),
                            parent: node.number(),
                        });
                    }
                    sum += child_node.weight();
                }
                if sum != node.weight() {
                    return Err(SiblingPropertyViolation::WeightSum {
                        number: node.number(),
                        weight: node.weight(),
                        sum,
                    });
                }
            }
        }

        self.check_escape(&ordered)
    }

    fn check_escape(&self, ordered: &[NodeId]) -> Result<(), SiblingPropertyViolation> {
        if self.leaves.is_empty() {
            return if self.nodes.len() == 1 && self.node(self.root).is_escape() {
                Ok(())
            } else {
                Err(SiblingPropertyViolation::Escape("empty tree must be a lone root"))
            };
        }

        let escapes = self
            .nodes
            .iter()
            .filter(|node| node.value() == Some(LeafValue::Nyt))
            .count();
        if escapes != 1 {
            return Err(SiblingPropertyViolation::Escape("expected exactly one escape leaf"));
        }
        let nyt = self.node(self.nyt);
        if nyt.value() != Some(LeafValue::Nyt) || ordered[0] != self.nyt {
            return Err(SiblingPropertyViolation::Escape("escape leaf must hold number 0"));
        }
        if nyt.weight() != 0 {
            return Err(SiblingPropertyViolation::Escape("escape leaf must have weight 0"));
        }
        if self.root != *ordered.last().unwrap_or(&self.root) {
            return Err(SiblingPropertyViolation::Escape("root must hold the highest number"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    #[test]
    fn test_fresh_tree_passes() {
        assert_eq!(AdaptiveTree::new().check_invariants(), Ok(()));
    }

    #[test]
    fn test_detects_weight_order_violation() {
        let mut tree = AdaptiveTree::new();
        tree.observe(b'A');
        tree.observe(b'B');
        // Inflate the A leaf without walking up the tree.
        let leaf = tree.leaf(b'A').expect("A observed");
        if let Node::Leaf { weight, .. } = &mut tree.nodes[leaf.index()] {
            *weight = 10;
        }
        assert!(matches!(
            tree.check_invariants(),
            Err(SiblingPropertyViolation::WeightOrder { .. })
        ));
    }

    #[test]
    fn test_detects_broken_link() {
        let mut tree = AdaptiveTree::new();
        tree.observe(b'A');
        tree.observe(b'B');
        let a = tree.leaf(b'A').expect("A observed");
        let b = tree.leaf(b'B').expect("B observed");
        tree.nodes[a.index()].set_parent(b);
        assert!(matches!(
            tree.check_invariants(),
            Err(SiblingPropertyViolation::BrokenLink { .. })
        ));
    }
}
