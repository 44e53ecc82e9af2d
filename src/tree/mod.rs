//! Path-addressed tree collection
//!
//! [`PathTree`] owns one root scope and every node beneath it. Scope nodes
//! hold children, value nodes hold one payload. Every public method takes the
//! tree lock for the duration of that call only.

pub mod arena;
pub mod cursor;
pub mod node;
pub mod path;

use crate::collection::Collection;
use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::types::{NodeCounts, NodeId, NodeKind, TreePolicy};
use arena::TreeArena;
use parking_lot::{Mutex, MutexGuard};

pub use cursor::{FlatCursor, ScopedCursor, TreeCursor};

/// Hierarchical collection of named scope and value nodes
#[derive(Debug)]
pub struct PathTree<T> {
    inner: Mutex<TreeArena<T>>,
}

impl<T> Default for PathTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PathTree<T> {
    /// Create an empty tree with the default policy (case-sensitive, sorted)
    pub fn new() -> Self {
        Self::with_policy(TreePolicy::default())
    }

    pub fn with_policy(policy: TreePolicy) -> Self {
        Self::from_arena(TreeArena::new(policy))
    }

    pub fn from_config(config: &TreeConfig) -> Self {
        Self::with_policy(config.policy())
    }

    pub(crate) fn from_arena(arena: TreeArena<T>) -> Self {
        Self {
            inner: Mutex::new(arena),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, TreeArena<T>> {
        self.inner.lock()
    }

    /// Swap in a fully built arena; the serial keeps increasing and handles
    /// into the old contents go stale
    pub(crate) fn replace_arena(&self, mut arena: TreeArena<T>) {
        let mut guard = self.lock();
        arena.retire_handles(&*guard);
        arena.set_serial(guard.serial() + 1);
        *guard = arena;
    }

    pub fn policy(&self) -> TreePolicy {
        self.lock().policy()
    }

    /// Handle of the root scope
    pub fn root(&self) -> NodeId {
        self.lock().root()
    }

    /// Number of nodes, root excluded
    pub fn len(&self) -> usize {
        self.lock().counts().total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> NodeCounts {
        self.lock().counts()
    }

    pub fn value_count(&self) -> usize {
        self.lock().counts().values
    }

    pub fn scope_count(&self) -> usize {
        self.lock().counts().scopes
    }

    /// Global serial number, bumped on every structural change
    pub fn serial_number(&self) -> u64 {
        self.lock().serial()
    }

    /// Serial number local to one scope, bumped when its direct children change
    pub fn scope_serial_number(&self, path: &str) -> Result<u64> {
        let arena = self.lock();
        let id = arena.resolve_scope(path)?;
        let scope = arena.get(id)?;
        Ok(scope.as_scope().map(|body| body.serial).unwrap_or_default())
    }

    /// Resolve a path, failing with Not-found when nothing is there
    pub fn resolve(&self, path: &str) -> Result<NodeId> {
        self.lock().resolve(path).map(|(id, _)| id)
    }

    /// Resolve a path and report how many levels were descended
    pub fn resolve_with_depth(&self, path: &str) -> Result<(NodeId, usize)> {
        self.lock().resolve(path)
    }

    /// Resolve a path, returning `None` when nothing is there
    ///
    /// Syntax and wrong-kind errors are still reported.
    pub fn find(&self, path: &str) -> Result<Option<NodeId>> {
        Ok(self.lock().lookup(path)?.map(|(id, _)| id))
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.find(path)?.is_some())
    }

    pub fn kind(&self, path: &str) -> Result<NodeKind> {
        let arena = self.lock();
        let (id, _) = arena.resolve(path)?;
        Ok(arena.get(id)?.kind())
    }

    pub fn kind_of(&self, id: NodeId) -> Result<NodeKind> {
        Ok(self.lock().get(id)?.kind())
    }

    pub fn name_of(&self, id: NodeId) -> Result<String> {
        Ok(self.lock().get(id)?.name.clone())
    }

    /// Absolute path of a node
    pub fn full_path(&self, id: NodeId) -> Result<String> {
        let arena = self.lock();
        arena.get(id)?;
        Ok(arena.full_path(id))
    }

    /// True when `id` is `ancestor` or one of its descendants
    pub fn is_within(&self, ancestor: NodeId, id: NodeId) -> Result<bool> {
        let arena = self.lock();
        arena.get(ancestor)?;
        arena.get(id)?;
        Ok(arena.contains(ancestor, id))
    }

    /// Names of a scope's direct children in sibling order
    pub fn children(&self, path: &str) -> Result<Vec<String>> {
        let arena = self.lock();
        let scope = arena.resolve_scope(path)?;
        arena
            .children(scope)
            .map(|child| arena.get(child).map(|node| node.name.clone()))
            .collect()
    }

    /// Number of scope and value nodes at and beneath `path`
    pub fn subtree_counts(&self, path: &str) -> Result<NodeCounts> {
        let arena = self.lock();
        let (id, _) = arena.resolve(path)?;
        Ok(arena.subtree_counts(id))
    }

    pub fn description(&self, path: &str) -> Result<Option<String>> {
        let arena = self.lock();
        let (id, _) = arena.resolve(path)?;
        Ok(arena.get(id)?.description.clone())
    }

    /// Set or clear a node's description; not a structural change
    pub fn set_description(&self, path: &str, description: Option<&str>) -> Result<()> {
        let mut arena = self.lock();
        let (id, _) = arena.resolve(path)?;
        arena.get_mut(id)?.description = description.map(str::to_string);
        Ok(())
    }

    /// Add a value node under the scope at `parent`
    pub fn add_value(
        &self,
        parent: &str,
        name: &str,
        value: T,
        description: Option<&str>,
    ) -> Result<NodeId> {
        let mut arena = self.lock();
        let scope = arena.resolve_scope(parent)?;
        arena.add_value(scope, name, value, description)
    }

    /// Add a value node under a scope handle
    pub fn add_value_at(
        &self,
        parent: NodeId,
        name: &str,
        value: T,
        description: Option<&str>,
    ) -> Result<NodeId> {
        self.lock().add_value(parent, name, value, description)
    }

    /// Add a scope node under the scope at `parent`
    pub fn add_scope(&self, parent: &str, name: &str, description: Option<&str>) -> Result<NodeId> {
        let mut arena = self.lock();
        let scope = arena.resolve_scope(parent)?;
        arena.add_scope(scope, name, description)
    }

    pub fn add_scope_at(&self, parent: NodeId, name: &str, description: Option<&str>) -> Result<NodeId> {
        self.lock().add_scope(parent, name, description)
    }

    /// Create every missing scope along `path` and return the deepest one
    ///
    /// Only the last scope created receives `description`.
    pub fn create_scope_path(&self, path: &str, description: Option<&str>) -> Result<NodeId> {
        self.lock().create_scope_path(path, description)
    }

    /// Create scopes from `(name, description)` pairs, one level per pair
    ///
    /// Unlike [`create_scope_path`](Self::create_scope_path), every scope
    /// created takes the description from its own pair.
    pub fn create_scope_path_from_pairs<K, V>(&self, pairs: &[(K, V)]) -> Result<NodeId>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.lock().create_scope_path_from_pairs(pairs)
    }

    /// Replace the payload of the value node at `path`
    ///
    /// The description is replaced only when one is supplied.
    pub fn refresh_value(&self, path: &str, value: T, description: Option<&str>) -> Result<()> {
        let mut arena = self.lock();
        let id = arena.resolve_value(path)?;
        arena.refresh_value(id, value, description)
    }

    /// Read the payload at `path` in place
    pub fn with_value<R>(&self, path: &str, f: impl FnOnce(&T) -> R) -> Result<R> {
        let arena = self.lock();
        let id = arena.resolve_value(path)?;
        arena
            .get(id)?
            .as_value()
            .map(f)
            .ok_or_else(|| TreeError::NotFound(path.to_string()))
    }

    /// Modify the payload at `path` in place; not a structural change
    pub fn with_value_mut<R>(&self, path: &str, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let mut arena = self.lock();
        let id = arena.resolve_value(path)?;
        arena
            .get_mut(id)?
            .as_value_mut()
            .map(f)
            .ok_or_else(|| TreeError::NotFound(path.to_string()))
    }

    /// Remove the node at `path` together with its subtree
    pub fn remove_node(&self, path: &str) -> Result<NodeCounts> {
        let mut arena = self.lock();
        let (id, _) = arena.resolve(path)?;
        arena.remove(id)
    }

    /// Remove `child`, which must be a direct child of the scope `parent`
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<NodeCounts> {
        self.lock().remove_child(parent, child)
    }

    /// Remove every descendant of the scope at `path`, keeping the scope
    pub fn clear_scope(&self, path: &str) -> Result<NodeCounts> {
        let mut arena = self.lock();
        let scope = arena.resolve_scope(path)?;
        arena.clear_scope(scope)
    }

    /// Remove every node; does nothing on an empty tree
    pub fn remove_all(&self) {
        self.lock().remove_all();
    }

    /// Drop every node and switch to `policy`
    ///
    /// Unlike [`PathTree::remove_all`] this always invalidates cursors, even
    /// on an empty tree.
    pub fn reset(&self, policy: TreePolicy) {
        self.lock().reset(policy);
    }

    /// Pre-order cursor positioned on the first node
    pub fn cursor(&self) -> FlatCursor<'_, T> {
        FlatCursor::new(self)
    }

    /// Cursor over the direct children of the scope at `path`
    pub fn scoped_cursor(&self, path: &str) -> Result<ScopedCursor<'_, T>> {
        ScopedCursor::new(self, path)
    }
}

/// Deep copy taken under the source's lock
impl<T: Clone> Clone for PathTree<T> {
    fn clone(&self) -> Self {
        Self::from_arena(self.lock().clone())
    }
}

impl<T: Clone> PathTree<T> {
    /// Copy of the payload at `path`
    pub fn get(&self, path: &str) -> Result<T> {
        self.with_value(path, T::clone)
    }

    pub fn get_by_id(&self, id: NodeId) -> Result<T> {
        let arena = self.lock();
        arena.expect_value(id)?;
        arena
            .get(id)?
            .as_value()
            .cloned()
            .ok_or_else(|| TreeError::NotFound(arena.full_path(id)))
    }
}

impl<T> Collection for PathTree<T> {
    type Item = T;

    fn len(&self) -> usize {
        PathTree::len(self)
    }

    fn add(&self, _item: T) -> Result<()> {
        Err(TreeError::Unsupported(
            "adding a value without a path; use add_value",
        ))
    }

    fn remove_all(&self) {
        PathTree::remove_all(self)
    }

    fn serial_number(&self) -> u64 {
        PathTree::serial_number(self)
    }
}
