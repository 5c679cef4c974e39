//! Text rendering of the tree
//!
//! ```text
//! Root 2:
//! ├─> A 1
//! └─> N 1:
//!     ├─> B 1
//!     └─> NYT
//! ```

use std::fmt;

use super::{AdaptiveTree, NodeId};

impl AdaptiveTree {
    fn render_subtree(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        indent: &mut String,
    ) -> fmt::Result {
        let node = self.node(id);
        write!(f, "{}", node)?;
        let Some(children) = node.children() else {
            return Ok(());
        };
        write!(f, ":")?;
        for (slot, child) in children.into_iter().enumerate() {
            let last = slot == children.len() - 1;
            write!(f, "\n{}{}", indent, if last { "└─> " } else { "├─> " })?;
            let mark = indent.len();
            indent.push_str(if last { "    " } else { "│   " });
            self.render_subtree(f, child, indent)?;
            indent.truncate(mark);
        }
        Ok(())
    }
}

impl fmt::Display for AdaptiveTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut indent = String::new();
        self.render_subtree(f, self.root(), &mut indent)
    }
}
