//! Path syntax: validation and tokenization of slash-delimited paths
//!
//! A path is a sequence of node names separated by [`SEPARATOR`]. The leading
//! separator is optional, a single trailing separator is tolerated, and the
//! exact string [`ROOT_PATH`] addresses the root scope.

use crate::error::{Result, TreeError};
use crate::types::{ROOT_PATH, SEPARATOR};
use std::iter::Peekable;
use std::slice::Iter;

/// A syntactically valid path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreePath<'a> {
    Root,
    Components(Vec<&'a str>),
}

impl<'a> TreePath<'a> {
    /// Validate and split a path string
    pub fn parse(path: &'a str) -> Result<Self> {
        if path.is_empty() {
            return Err(TreeError::syntax(path, "path is empty"));
        }
        if path == ROOT_PATH {
            return Ok(TreePath::Root);
        }

        let body = path.strip_prefix(SEPARATOR).unwrap_or(path);
        let body = body.strip_suffix(SEPARATOR).unwrap_or(body);
        if body.is_empty() {
            return Err(TreeError::syntax(path, "empty path component"));
        }

        let mut components = Vec::new();
        for component in body.split(SEPARATOR) {
            if component.is_empty() {
                return Err(TreeError::syntax(path, "empty path component"));
            }
            check_name_chars(path, component)?;
            components.push(component);
        }
        Ok(TreePath::Components(components))
    }

    pub fn is_root(&self) -> bool {
        matches!(self, TreePath::Root)
    }

    /// Components in order; empty for the root
    pub fn components(&self) -> &[&'a str] {
        match self {
            TreePath::Root => &[],
            TreePath::Components(components) => components,
        }
    }

    /// Token stream supporting peek-then-consume walking
    pub fn tokens(&self) -> Tokens<'_, 'a> {
        Tokens {
            inner: self.components().iter().peekable(),
        }
    }
}

/// Token walker over path components
pub struct Tokens<'p, 'a> {
    inner: Peekable<Iter<'p, &'a str>>,
}

impl<'p, 'a> Tokens<'p, 'a> {
    /// Next component without consuming it
    pub fn peek(&mut self) -> Option<&'a str> {
        self.inner.peek().map(|s| **s)
    }

    pub fn has_more(&mut self) -> bool {
        self.inner.peek().is_some()
    }
}

impl<'p, 'a> Iterator for Tokens<'p, 'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().copied()
    }
}

/// Validate a single node name
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TreeError::syntax(name, "node name is empty"));
    }
    if name.contains(SEPARATOR) {
        return Err(TreeError::syntax(
            name,
            format!("node name contains separator '{}'", SEPARATOR),
        ));
    }
    check_name_chars(name, name)
}

fn check_name_chars(path: &str, name: &str) -> Result<()> {
    if let Some(c) = name.chars().find(|c| c.is_ascii_control()) {
        return Err(TreeError::syntax(
            path,
            format!("illegal character {:?} in '{}'", c, name),
        ));
    }
    Ok(())
}
