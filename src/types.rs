//! Core types shared by the tree, its cursors and the stream format.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Path component separator
pub const SEPARATOR: char = '/';

/// Path that addresses the root scope directly
pub const ROOT_PATH: &str = "/";

/// Reserved name carried by the synthetic root scope
pub const ROOT_NAME: &str = "<root>";

/// Node kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Leaf node owning one payload
    Value,
    /// Container node owning zero or more children
    Scope,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Value => write!(f, "value"),
            NodeKind::Scope => write!(f, "scope"),
        }
    }
}

/// Opaque handle to a node stored in a tree
///
/// Handles stay valid until the node is removed. A handle to a removed node
/// never resolves to a different node of the same tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Tree-wide naming and ordering policy, fixed for the tree's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePolicy {
    /// Compare names case-sensitively during lookup and duplicate detection
    pub case_sensitive_paths: bool,
    /// Keep siblings in ascending name order; otherwise insert at the head
    pub sorted: bool,
}

impl Default for TreePolicy {
    fn default() -> Self {
        Self {
            case_sensitive_paths: true,
            sorted: true,
        }
    }
}

impl TreePolicy {
    pub fn new(case_sensitive_paths: bool, sorted: bool) -> Self {
        Self {
            case_sensitive_paths,
            sorted,
        }
    }

    /// Compare two names under this policy
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        if self.case_sensitive_paths {
            a.cmp(b)
        } else {
            a.chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase))
        }
    }

    /// True when the two names address the same sibling
    pub fn matches(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// Number of scope and value nodes held by a tree or subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCounts {
    pub scopes: usize,
    pub values: usize,
}

impl NodeCounts {
    pub fn total(&self) -> usize {
        self.scopes + self.values
    }
}
