//! Node representation: shared identity plus a kind-specific body

use crate::types::{NodeId, NodeKind};

/// Scope body: head of the child chain and the scope-local serial number
#[derive(Debug, Clone)]
pub struct ScopeBody {
    pub first_child: Option<NodeId>,
    pub serial: u64,
}

impl ScopeBody {
    pub fn new() -> Self {
        Self {
            first_child: None,
            serial: 1,
        }
    }
}

impl Default for ScopeBody {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind-specific part of a node
#[derive(Debug, Clone)]
pub enum NodeBody<T> {
    Value(T),
    Scope(ScopeBody),
}

/// A node stored in the tree arena
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub name: String,
    pub description: Option<String>,
    /// None only for the root scope
    pub parent: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub body: NodeBody<T>,
}

impl<T> Node<T> {
    pub fn value(name: String, description: Option<String>, value: T) -> Self {
        Self {
            name,
            description,
            parent: None,
            next_sibling: None,
            body: NodeBody::Value(value),
        }
    }

    pub fn scope(name: String, description: Option<String>) -> Self {
        Self {
            name,
            description,
            parent: None,
            next_sibling: None,
            body: NodeBody::Scope(ScopeBody::new()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Value(_) => NodeKind::Value,
            NodeBody::Scope(_) => NodeKind::Scope,
        }
    }

    pub fn as_scope(&self) -> Option<&ScopeBody> {
        match &self.body {
            NodeBody::Scope(scope) => Some(scope),
            NodeBody::Value(_) => None,
        }
    }

    pub fn as_scope_mut(&mut self) -> Option<&mut ScopeBody> {
        match &mut self.body {
            NodeBody::Scope(scope) => Some(scope),
            NodeBody::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&T> {
        match &self.body {
            NodeBody::Value(value) => Some(value),
            NodeBody::Scope(_) => None,
        }
    }

    pub fn as_value_mut(&mut self) -> Option<&mut T> {
        match &mut self.body {
            NodeBody::Value(value) => Some(value),
            NodeBody::Scope(_) => None,
        }
    }
}
