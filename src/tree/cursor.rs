//! Cursors over a [`PathTree`]
//!
//! A [`FlatCursor`] walks every node in pre-order; a [`ScopedCursor`] walks
//! the direct children of one scope. Both capture the tree's global serial
//! number and fail with `InvalidatedCursor` once any structural change has
//! happened since. Each accessor takes the tree lock for the duration of the
//! check and read only.

use crate::error::{Result, TreeError};
use crate::tree::arena::TreeArena;
use crate::tree::node::Node;
use crate::tree::PathTree;
use crate::types::{NodeId, NodeKind};

fn check_serial<T>(arena: &TreeArena<T>, captured: u64) -> Result<()> {
    if arena.serial() != captured {
        return Err(TreeError::InvalidatedCursor {
            captured,
            current: arena.serial(),
        });
    }
    Ok(())
}

fn checked<T>(arena: &TreeArena<T>, captured: u64, current: Option<NodeId>) -> Result<(NodeId, &Node<T>)> {
    check_serial(arena, captured)?;
    let id = current.ok_or(TreeError::CursorExhausted)?;
    Ok((id, arena.get(id)?))
}

/// Accessors shared by both cursor kinds
pub trait TreeCursor<T> {
    fn tree(&self) -> &PathTree<T>;

    /// Serial number captured at the last reset
    fn snapshot(&self) -> u64;

    fn position(&self) -> Option<NodeId>;

    /// Move to the next node; `Ok(false)` once iteration is complete
    fn advance(&mut self) -> Result<bool>;

    /// Resynchronise with the tree and return to the first node
    fn reset(&mut self) -> Result<()>;

    /// True when the snapshot is current and the cursor is on a node
    fn is_valid(&self) -> bool {
        let arena = self.tree().lock();
        arena.serial() == self.snapshot()
            && self.position().map(|id| arena.node(id).is_some()).unwrap_or(false)
    }

    fn id(&self) -> Result<NodeId> {
        let arena = self.tree().lock();
        checked(&*arena, self.snapshot(), self.position()).map(|(id, _)| id)
    }

    fn name(&self) -> Result<String> {
        let arena = self.tree().lock();
        let (_, node) = checked(&*arena, self.snapshot(), self.position())?;
        Ok(node.name.clone())
    }

    fn kind(&self) -> Result<NodeKind> {
        let arena = self.tree().lock();
        let (_, node) = checked(&*arena, self.snapshot(), self.position())?;
        Ok(node.kind())
    }

    fn description(&self) -> Result<Option<String>> {
        let arena = self.tree().lock();
        let (_, node) = checked(&*arena, self.snapshot(), self.position())?;
        Ok(node.description.clone())
    }

    /// Absolute path of the current node
    fn path(&self) -> Result<String> {
        let arena = self.tree().lock();
        let (id, _) = checked(&*arena, self.snapshot(), self.position())?;
        Ok(arena.full_path(id))
    }

    /// Read the current value node's payload
    fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        let arena = self.tree().lock();
        let (id, _) = checked(&*arena, self.snapshot(), self.position())?;
        arena.expect_value(id)?;
        let node = arena.get(id)?;
        node.as_value()
            .map(f)
            .ok_or_else(|| TreeError::NotFound(arena.full_path(id)))
    }

    /// Modify the current value node's payload in place
    fn with_value_mut<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let mut arena = self.tree().lock();
        let (id, _) = checked(&*arena, self.snapshot(), self.position())?;
        arena.expect_value(id)?;
        let path = arena.full_path(id);
        arena
            .get_mut(id)?
            .as_value_mut()
            .map(f)
            .ok_or(TreeError::NotFound(path))
    }

    /// Copy of the current value node's payload
    fn value(&self) -> Result<T>
    where
        T: Clone,
    {
        self.with_value(T::clone)
    }
}

/// Pre-order depth-first cursor over every node except the root
pub struct FlatCursor<'a, T> {
    tree: &'a PathTree<T>,
    serial: u64,
    current: Option<NodeId>,
    depth: usize,
}

impl<'a, T> FlatCursor<'a, T> {
    pub(crate) fn new(tree: &'a PathTree<T>) -> Self {
        let mut cursor = Self {
            tree,
            serial: 0,
            current: None,
            depth: 0,
        };
        cursor.sync();
        cursor
    }

    fn sync(&mut self) {
        let arena = self.tree.lock();
        self.serial = arena.serial();
        self.current = arena.children(arena.root()).next();
        self.depth = 0;
    }

    /// Nesting level of the current node; children of the root are at 0
    pub fn depth(&self) -> Result<usize> {
        let arena = self.tree.lock();
        checked(&*arena, self.serial, self.current)?;
        Ok(self.depth)
    }
}

impl<'a, T> TreeCursor<T> for FlatCursor<'a, T> {
    fn tree(&self) -> &PathTree<T> {
        self.tree
    }

    fn snapshot(&self) -> u64 {
        self.serial
    }

    fn position(&self) -> Option<NodeId> {
        self.current
    }

    fn advance(&mut self) -> Result<bool> {
        let arena = self.tree.lock();
        let (_, node) = checked(&*arena, self.serial, self.current)?;

        if let Some(first) = node.as_scope().and_then(|scope| scope.first_child) {
            self.current = Some(first);
            self.depth += 1;
            return Ok(true);
        }
        if let Some(next) = node.next_sibling {
            self.current = Some(next);
            return Ok(true);
        }

        let root = arena.root();
        let mut parent = node.parent;
        while let Some(scope) = parent {
            if scope == root {
                break;
            }
            let scope_node = arena.get(scope)?;
            self.depth = self.depth.saturating_sub(1);
            if let Some(next) = scope_node.next_sibling {
                self.current = Some(next);
                return Ok(true);
            }
            parent = scope_node.parent;
        }
        self.current = None;
        self.depth = 0;
        Ok(false)
    }

    fn reset(&mut self) -> Result<()> {
        self.sync();
        Ok(())
    }
}

/// Cursor over the direct children of one scope
pub struct ScopedCursor<'a, T> {
    tree: &'a PathTree<T>,
    scope: NodeId,
    scope_depth: usize,
    serial: u64,
    current: Option<NodeId>,
}

impl<'a, T> ScopedCursor<'a, T> {
    pub(crate) fn new(tree: &'a PathTree<T>, path: &str) -> Result<Self> {
        let arena = tree.lock();
        let (scope, scope_depth) = arena.resolve(path)?;
        arena.expect_scope(scope)?;
        let current = arena.children(scope).next();
        let serial = arena.serial();
        drop(arena);
        Ok(Self {
            tree,
            scope,
            scope_depth,
            serial,
            current,
        })
    }

    /// Handle of the anchor scope
    pub fn scope(&self) -> NodeId {
        self.scope
    }

    /// Depth at which the anchor scope was found; the root is at 0
    pub fn scope_depth(&self) -> usize {
        self.scope_depth
    }
}

impl<'a, T> TreeCursor<T> for ScopedCursor<'a, T> {
    fn tree(&self) -> &PathTree<T> {
        self.tree
    }

    fn snapshot(&self) -> u64 {
        self.serial
    }

    fn position(&self) -> Option<NodeId> {
        self.current
    }

    fn advance(&mut self) -> Result<bool> {
        let arena = self.tree.lock();
        let (_, node) = checked(&*arena, self.serial, self.current)?;
        self.current = node.next_sibling;
        Ok(self.current.is_some())
    }

    /// Re-anchor on the scope's current first child
    fn reset(&mut self) -> Result<()> {
        let arena = self.tree.lock();
        arena.expect_scope(self.scope)?;
        self.serial = arena.serial();
        self.current = arena.children(self.scope).next();
        Ok(())
    }
}
