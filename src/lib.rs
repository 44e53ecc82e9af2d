//! Pathtree: hierarchical named-node tree collection
//!
//! A tree of scope nodes (containers) and value nodes (payload holders)
//! addressed by slash-delimited paths, with pre-order and scoped cursors,
//! serial-number based cursor invalidation, and a framed binary format for
//! flattening and rebuilding whole trees.

pub mod codec;
pub mod collection;
pub mod config;
pub mod error;
pub mod logging;
pub mod tooling;
pub mod tree;
pub mod types;

pub use collection::Collection;
pub use error::{Result, StreamError, TreeError};
pub use tree::{FlatCursor, PathTree, ScopedCursor, TreeCursor};
pub use types::{NodeCounts, NodeId, NodeKind, TreePolicy, ROOT_PATH, SEPARATOR};
