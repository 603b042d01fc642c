//! Constituency parse trees
//!
//! Trees are stored as an arena of nodes addressed by [`NodeId`]. Children
//! are owned through the arena, parents are plain back-references, so the
//! structure has no reference cycles and is immutable once built.

mod arena;
mod bracket;


pub use arena::{Node, NodeId, NodeKind, ParseTree, TreeBuilder};
pub use bracket::{parse_bracketed, parse_forest, TreeError, DEFAULT_MARGIN};
