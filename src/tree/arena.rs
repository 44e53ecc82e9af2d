//! Node arena and the unlocked tree engine
//!
//! `TreeArena` owns every node of one tree, the incremental node counts, the
//! global serial number and the naming policy. Sibling chains and parent links
//! are stored as [`NodeId`] handles into the arena. Callers must hold the
//! tree lock; nothing in here locks.

use crate::error::{Result, TreeError};
use crate::tree::node::{Node, NodeBody};
use crate::tree::path::{validate_name, TreePath};
use crate::types::{NodeCounts, NodeId, NodeKind, TreePolicy, ROOT_NAME, ROOT_PATH, SEPARATOR};
use tracing::debug;

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    node: Option<Node<T>>,
}

/// Arena-backed tree of scope and value nodes
#[derive(Debug, Clone)]
pub struct TreeArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    root: NodeId,
    counts: NodeCounts,
    serial: u64,
    policy: TreePolicy,
}

impl<T> TreeArena<T> {
    /// Create an empty tree holding only the root scope
    pub fn new(policy: TreePolicy) -> Self {
        Self::with_serial(policy, 1)
    }

    /// Create an empty tree whose global serial starts at `serial`
    pub fn with_serial(policy: TreePolicy, serial: u64) -> Self {
        let root = NodeId {
            index: 0,
            generation: 0,
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::scope(ROOT_NAME.to_string(), None)),
            }],
            free: Vec::new(),
            root,
            counts: NodeCounts::default(),
            serial,
            policy,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn policy(&self) -> TreePolicy {
        self.policy
    }

    pub fn counts(&self) -> NodeCounts {
        self.counts
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn set_serial(&mut self, serial: u64) {
        self.serial = serial;
    }

    fn bump(&mut self, scope: NodeId) {
        self.serial += 1;
        if let Some(body) = self.node_mut(scope).and_then(Node::as_scope_mut) {
            body.serial += 1;
        }
    }

    /// Node behind a handle, if it is still live
    pub fn node(&self, id: NodeId) -> Option<&Node<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Node behind a handle or a Not-found error
    pub fn get(&self, id: NodeId) -> Result<&Node<T>> {
        self.node(id)
            .ok_or_else(|| TreeError::NotFound(format!("node handle {}", id)))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node<T>> {
        self.node_mut(id)
            .ok_or_else(|| TreeError::NotFound(format!("node handle {}", id)))
    }

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Node<T>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take();
        if node.is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
        node
    }

    /// Make every handle issued by `previous` stale in this arena
    ///
    /// Slot generations are raised past the ones `previous` handed out, and
    /// slots only `previous` used are kept as free slots. The root keeps its
    /// handle.
    pub(crate) fn retire_handles(&mut self, previous: &TreeArena<T>) {
        for (index, old) in previous.slots.iter().enumerate().skip(1) {
            let generation = old.generation.wrapping_add(1);
            match self.slots.get_mut(index) {
                Some(slot) => slot.generation = slot.generation.max(generation),
                None => {
                    self.slots.push(Slot {
                        generation,
                        node: None,
                    });
                    self.free.push(index as u32);
                }
            }
        }

        let generations: Vec<u32> = self.slots.iter().map(|slot| slot.generation).collect();
        let fix = |id: NodeId| NodeId {
            index: id.index,
            generation: generations
                .get(id.index as usize)
                .copied()
                .unwrap_or(id.generation),
        };
        for node in self.slots.iter_mut().filter_map(|slot| slot.node.as_mut()) {
            node.parent = node.parent.map(fix);
            node.next_sibling = node.next_sibling.map(fix);
            if let Some(body) = node.as_scope_mut() {
                body.first_child = body.first_child.map(fix);
            }
        }
    }

    /// Direct children of a scope in sibling order
    pub fn children(&self, scope: NodeId) -> Children<'_, T> {
        let next = self
            .node(scope)
            .and_then(Node::as_scope)
            .and_then(|body| body.first_child);
        Children { arena: self, next }
    }

    /// Require `id` to be a live scope
    pub fn expect_scope(&self, id: NodeId) -> Result<()> {
        let node = self.get(id)?;
        if node.kind() != NodeKind::Scope {
            return Err(TreeError::WrongKind {
                path: self.full_path(id),
                expected: NodeKind::Scope,
                found: node.kind(),
            });
        }
        Ok(())
    }

    /// Require `id` to be a live value node
    pub fn expect_value(&self, id: NodeId) -> Result<()> {
        let node = self.get(id)?;
        if node.kind() != NodeKind::Value {
            return Err(TreeError::WrongKind {
                path: self.full_path(id),
                expected: NodeKind::Value,
                found: node.kind(),
            });
        }
        Ok(())
    }

    /// Rebuild the absolute path of a node
    pub fn full_path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                break;
            }
            match self.node(current) {
                Some(node) => {
                    names.push(node.name.as_str());
                    cursor = node.parent;
                }
                None => break,
            }
        }
        if names.is_empty() {
            return ROOT_PATH.to_string();
        }
        let mut path = String::new();
        for name in names.iter().rev() {
            path.push(SEPARATOR);
            path.push_str(name);
        }
        path
    }

    /// Linear scan of a scope's children for a name
    pub fn find_child(&self, scope: NodeId, name: &str) -> Option<NodeId> {
        self.children(scope).find(|child| {
            self.node(*child)
                .map(|node| self.policy.matches(&node.name, name))
                .unwrap_or(false)
        })
    }

    /// Resolve a path to a node and the number of levels descended
    ///
    /// Returns `Ok(None)` when some component does not exist. Walking through
    /// a value node is a Wrong-kind error.
    pub fn lookup(&self, path: &str) -> Result<Option<(NodeId, usize)>> {
        if path == ROOT_PATH {
            return Ok(Some((self.root, 0)));
        }
        if self.counts.total() == 0 {
            return Ok(None);
        }
        let parsed = TreePath::parse(path)?;
        self.lookup_parsed(&parsed)
    }

    fn lookup_parsed(&self, parsed: &TreePath<'_>) -> Result<Option<(NodeId, usize)>> {
        let mut scope = self.root;
        let mut depth = 0;
        let mut tokens = parsed.tokens();
        while let Some(token) = tokens.next() {
            let Some(child) = self.find_child(scope, token) else {
                return Ok(None);
            };
            depth += 1;
            if !tokens.has_more() {
                return Ok(Some((child, depth)));
            }
            self.expect_scope(child)?;
            scope = child;
        }
        Ok(Some((scope, depth)))
    }

    /// Resolve a path or fail with Not-found
    pub fn resolve(&self, path: &str) -> Result<(NodeId, usize)> {
        self.lookup(path)?
            .ok_or_else(|| TreeError::NotFound(path.to_string()))
    }

    /// Resolve a path that must name a scope
    pub fn resolve_scope(&self, path: &str) -> Result<NodeId> {
        let (id, _) = self.resolve(path)?;
        self.expect_scope(id)?;
        Ok(id)
    }

    /// Resolve a path that must name a value node
    pub fn resolve_value(&self, path: &str) -> Result<NodeId> {
        let (id, _) = self.resolve(path)?;
        self.expect_value(id)?;
        Ok(id)
    }

    /// Find where `name` goes among `scope`'s children
    ///
    /// Returns the sibling to insert after (`None` = at the head), or a
    /// Duplicate error. Nothing is modified.
    fn insertion_point(&self, scope: NodeId, name: &str) -> Result<Option<NodeId>> {
        let mut prev = None;
        let mut placed = false;
        for child in self.children(scope) {
            let child_name = &self.get(child)?.name;
            let ordering = self.policy.compare(child_name, name);
            if ordering.is_eq() {
                return Err(TreeError::Duplicate {
                    scope: self.full_path(scope),
                    name: name.to_string(),
                });
            }
            if self.policy.sorted && !placed {
                if ordering.is_lt() {
                    prev = Some(child);
                } else {
                    placed = true;
                }
            }
        }
        Ok(prev)
    }

    /// Link an allocated node after `prev` (or at the head) of `scope`
    fn link(&mut self, scope: NodeId, prev: Option<NodeId>, id: NodeId) -> Result<()> {
        let next = match prev {
            Some(prev) => self.get(prev)?.next_sibling,
            None => self.get(scope)?.as_scope().and_then(|body| body.first_child),
        };
        {
            let node = self.get_mut(id)?;
            node.parent = Some(scope);
            node.next_sibling = next;
        }
        match prev {
            Some(prev) => self.get_mut(prev)?.next_sibling = Some(id),
            None => {
                if let Some(body) = self.get_mut(scope)?.as_scope_mut() {
                    body.first_child = Some(id);
                }
            }
        }
        Ok(())
    }

    /// Insert a new node under `scope` according to the sort policy
    pub fn insert(&mut self, scope: NodeId, node: Node<T>) -> Result<NodeId> {
        validate_name(&node.name)?;
        self.expect_scope(scope)?;
        let prev = self.insertion_point(scope, &node.name)?;
        self.attach(scope, prev, node)
    }

    /// Insert a node read from a stream
    ///
    /// Sorted trees place it by name; unsorted trees keep stream order by
    /// linking it after `tail`. Duplicates are rejected either way.
    pub(crate) fn insert_loaded(
        &mut self,
        scope: NodeId,
        tail: Option<NodeId>,
        node: Node<T>,
    ) -> Result<NodeId> {
        let by_name = self.insertion_point(scope, &node.name)?;
        let prev = if self.policy.sorted { by_name } else { tail };
        self.attach(scope, prev, node)
    }

    fn attach(&mut self, scope: NodeId, prev: Option<NodeId>, node: Node<T>) -> Result<NodeId> {
        let kind = node.kind();
        let id = self.alloc(node);
        self.link(scope, prev, id)?;
        match kind {
            NodeKind::Scope => self.counts.scopes += 1,
            NodeKind::Value => self.counts.values += 1,
        }
        self.bump(scope);
        Ok(id)
    }

    pub fn add_value(
        &mut self,
        scope: NodeId,
        name: &str,
        value: T,
        description: Option<&str>,
    ) -> Result<NodeId> {
        let id = self.insert(
            scope,
            Node::value(name.to_string(), description.map(str::to_string), value),
        )?;
        debug!(parent = %self.full_path(scope), name, "Value node added");
        Ok(id)
    }

    pub fn add_scope(&mut self, scope: NodeId, name: &str, description: Option<&str>) -> Result<NodeId> {
        let id = self.insert(
            scope,
            Node::scope(name.to_string(), description.map(str::to_string)),
        )?;
        debug!(parent = %self.full_path(scope), name, "Scope node added");
        Ok(id)
    }

    /// Walk existing scopes along `path`, then create every missing component
    ///
    /// Only the last scope created receives `description`.
    pub fn create_scope_path(&mut self, path: &str, description: Option<&str>) -> Result<NodeId> {
        let parsed = TreePath::parse(path)?;
        let components = parsed.components();
        let (mut scope, existing) = self.descend_existing(components)?;

        let missing = &components[existing..];
        for (i, name) in missing.iter().enumerate() {
            let desc = if i + 1 == missing.len() { description } else { None };
            scope = self.insert(scope, Node::scope(name.to_string(), desc.map(str::to_string)))?;
        }
        if !missing.is_empty() {
            debug!(path, created = missing.len(), "Scope path created");
        }
        Ok(scope)
    }

    /// Pair-sequence form of [`create_scope_path`](Self::create_scope_path)
    ///
    /// Each key is one path component. Every scope created takes its own
    /// pair's value as description; an empty value leaves it unset.
    pub fn create_scope_path_from_pairs<K, V>(&mut self, pairs: &[(K, V)]) -> Result<NodeId>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, _) in pairs {
            validate_name(key.as_ref())?;
        }
        let keys: Vec<&str> = pairs.iter().map(|(key, _)| key.as_ref()).collect();
        let (mut scope, existing) = self.descend_existing(&keys)?;

        for (key, value) in &pairs[existing..] {
            let value = value.as_ref();
            let desc = (!value.is_empty()).then(|| value.to_string());
            scope = self.insert(scope, Node::scope(key.as_ref().to_string(), desc))?;
        }
        if existing < pairs.len() {
            debug!(
                path = %self.full_path(scope),
                created = pairs.len() - existing,
                "Scope path created from pairs"
            );
        }
        Ok(scope)
    }

    /// Follow existing scopes; returns the deepest one and how many matched
    fn descend_existing(&self, components: &[&str]) -> Result<(NodeId, usize)> {
        let mut scope = self.root;
        for (i, name) in components.iter().enumerate() {
            match self.find_child(scope, name) {
                Some(child) => {
                    self.expect_scope(child)?;
                    scope = child;
                }
                None => return Ok((scope, i)),
            }
        }
        Ok((scope, components.len()))
    }

    /// Handles of `id` and all of its descendants, pre-order
    fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children: Vec<NodeId> = self.children(current).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Scope and value nodes in the subtree rooted at `id`, inclusive
    pub fn subtree_counts(&self, id: NodeId) -> NodeCounts {
        let mut counts = NodeCounts::default();
        for node in self.subtree_ids(id).into_iter().filter_map(|n| self.node(n)) {
            match node.kind() {
                NodeKind::Scope => counts.scopes += 1,
                NodeKind::Value => counts.values += 1,
            }
        }
        counts
    }

    /// True when `id` is `ancestor` or lies beneath it
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).and_then(|node| node.parent);
        }
        false
    }

    fn unlink(&mut self, scope: NodeId, id: NodeId) -> Result<()> {
        let next = self.get(id)?.next_sibling;
        let mut prev = None;
        for child in self.children(scope) {
            if child == id {
                break;
            }
            prev = Some(child);
        }
        match prev {
            Some(prev) => self.get_mut(prev)?.next_sibling = next,
            None => {
                if let Some(body) = self.get_mut(scope)?.as_scope_mut() {
                    body.first_child = next;
                }
            }
        }
        Ok(())
    }

    fn free_subtree(&mut self, id: NodeId) -> NodeCounts {
        let counts = self.subtree_counts(id);
        for node in self.subtree_ids(id) {
            self.release(node);
        }
        counts
    }

    /// Remove a node and its whole subtree
    pub fn remove(&mut self, id: NodeId) -> Result<NodeCounts> {
        if id == self.root {
            return Err(TreeError::Unsupported("removing the root scope"));
        }
        let parent = self
            .get(id)?
            .parent
            .ok_or_else(|| TreeError::NotFound(format!("parent of {}", id)))?;
        self.remove_child(parent, id)
    }

    /// Remove `child` from `scope`; it must be a direct child
    pub fn remove_child(&mut self, scope: NodeId, child: NodeId) -> Result<NodeCounts> {
        if child == self.root {
            return Err(TreeError::Unsupported("removing the root scope"));
        }
        self.expect_scope(scope)?;
        let node = self.get(child)?;
        if node.parent != Some(scope) {
            return Err(TreeError::NotAMember {
                scope: self.full_path(scope),
                child: node.name.clone(),
            });
        }
        let path = self.full_path(child);
        self.unlink(scope, child)?;
        let removed = self.free_subtree(child);
        self.counts.scopes -= removed.scopes;
        self.counts.values -= removed.values;
        self.bump(scope);
        debug!(path = %path, scopes = removed.scopes, values = removed.values, "Subtree removed");
        Ok(removed)
    }

    /// Remove every descendant of `scope`, keeping the scope itself
    pub fn clear_scope(&mut self, scope: NodeId) -> Result<NodeCounts> {
        self.expect_scope(scope)?;
        Ok(self.flush(scope))
    }

    /// Release every child of a known-live scope
    fn flush(&mut self, scope: NodeId) -> NodeCounts {
        let children: Vec<NodeId> = self.children(scope).collect();
        if children.is_empty() {
            return NodeCounts::default();
        }
        let mut removed = NodeCounts::default();
        for child in children {
            let counts = self.free_subtree(child);
            removed.scopes += counts.scopes;
            removed.values += counts.values;
        }
        if let Some(body) = self.node_mut(scope).and_then(Node::as_scope_mut) {
            body.first_child = None;
        }
        self.counts.scopes -= removed.scopes;
        self.counts.values -= removed.values;
        self.bump(scope);
        removed
    }

    /// Flush the whole tree; a no-op on an empty tree
    pub fn remove_all(&mut self) {
        if self.counts.total() == 0 {
            return;
        }
        let root = self.root;
        self.flush(root);
        self.counts = NodeCounts::default();
    }

    /// Empty the tree and adopt a new naming policy
    ///
    /// Always bumps the serial, so cursors opened under the old policy fail.
    pub fn reset(&mut self, policy: TreePolicy) {
        let root = self.root;
        self.flush(root);
        self.counts = NodeCounts::default();
        self.policy = policy;
        self.serial += 1;
        debug!(
            case_sensitive = policy.case_sensitive_paths,
            sorted = policy.sorted,
            "Tree reset"
        );
    }

    /// Replace a value node's payload, and its description when one is given
    pub fn refresh_value(&mut self, id: NodeId, value: T, description: Option<&str>) -> Result<()> {
        self.expect_value(id)?;
        let node = self.get_mut(id)?;
        if let NodeBody::Value(slot) = &mut node.body {
            *slot = value;
        }
        if let Some(description) = description {
            node.description = Some(description.to_string());
        }
        Ok(())
    }
}

/// Iterator over a scope's direct children
pub struct Children<'a, T> {
    arena: &'a TreeArena<T>,
    next: Option<NodeId>,
}

impl<'a, T> Iterator for Children<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.arena.node(current).and_then(|node| node.next_sibling);
        Some(current)
    }
}
