//! Flattening a tree to a framed byte stream and rebuilding it
//!
//! Layout:
//!
//! ```text
//! StartOfObject  case_sensitive:bool  sorted:bool  scopes:u32  values:u32  Frame
//! <scope block for the root>
//! EndOfObject
//!
//! scope block:
//! Frame  count:u32  count^0xFFFFFFFF:u32
//! per child: kind:u8  name:str  has_desc:u8  [desc:str]  (<scope block> | payload)  Frame
//! ```
//!
//! The reader checks every child count against its XOR companion and, once
//! the whole stream is read, the rebuilt node counts against the header.

use crate::codec::{
    to_u32, Marker, StreamReader, StreamWriter, COUNT_MASK, DESCRIPTION_ABSENT, DESCRIPTION_PRESENT,
    KIND_SCOPE, KIND_VALUE,
};
use crate::error::{Result, StreamError, TreeError};
use crate::tree::arena::TreeArena;
use crate::tree::node::{Node, NodeBody};
use crate::tree::path::validate_name;
use crate::tree::PathTree;
use crate::types::{NodeId, TreePolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Write the whole arena to `writer`
///
/// The walk keeps its own stack of open scopes, so tree depth is bounded
/// only by memory.
pub fn write_tree<T: Serialize, W: Write>(arena: &TreeArena<T>, writer: W) -> Result<()> {
    let mut out = StreamWriter::new(writer);
    let policy = arena.policy();
    let counts = arena.counts();

    out.write_marker(Marker::StartOfObject)?;
    out.write_bool(policy.case_sensitive_paths)?;
    out.write_bool(policy.sorted)?;
    out.write_count(counts.scopes)?;
    out.write_count(counts.values)?;
    out.write_marker(Marker::Frame)?;

    let root = arena.root();
    write_block_header(arena, root, &mut out)?;
    // Next child to write for every open scope, root at the bottom
    let mut stack = vec![arena.children(root).next()];
    while let Some(next) = stack.last().copied() {
        let Some(child) = next else {
            stack.pop();
            if !stack.is_empty() {
                // Closes the scope child whose block just ended
                out.write_marker(Marker::Frame)?;
            }
            continue;
        };
        let node = arena.get(child)?;
        if let Some(top) = stack.last_mut() {
            *top = node.next_sibling;
        }

        match node.body {
            NodeBody::Scope(_) => out.write_u8(KIND_SCOPE)?,
            NodeBody::Value(_) => out.write_u8(KIND_VALUE)?,
        }
        out.write_str(&node.name)?;
        match &node.description {
            Some(description) => {
                out.write_u8(DESCRIPTION_PRESENT)?;
                out.write_str(description)?;
            }
            None => out.write_u8(DESCRIPTION_ABSENT)?,
        }
        match &node.body {
            NodeBody::Scope(body) => {
                write_block_header(arena, child, &mut out)?;
                stack.push(body.first_child);
            }
            NodeBody::Value(value) => {
                out.write_payload(value)?;
                out.write_marker(Marker::Frame)?;
            }
        }
    }

    out.write_marker(Marker::EndOfObject)?;
    out.flush()
}

fn write_block_header<T, W: Write>(
    arena: &TreeArena<T>,
    scope: NodeId,
    out: &mut StreamWriter<W>,
) -> Result<()> {
    let count = to_u32(arena.children(scope).count())?;
    out.write_marker(Marker::Frame)?;
    out.write_u32(count)?;
    out.write_u32(count ^ COUNT_MASK)
}

/// A scope whose block is still being read
struct OpenScope {
    id: NodeId,
    remaining: u32,
    tail: Option<NodeId>,
}

/// Rebuild an arena from `reader`
///
/// Nothing outside the returned arena is touched, so a failure leaves any
/// existing tree intact. Children are placed through the tree's own
/// insertion rules: sorted trees are re-sorted and duplicate names under
/// the stored case policy are rejected.
pub fn read_tree<T: DeserializeOwned, R: Read>(reader: R) -> Result<TreeArena<T>> {
    let mut input = StreamReader::new(reader);

    input.expect_marker(Marker::StartOfObject)?;
    let case_sensitive_paths = input.read_bool()?;
    let sorted = input.read_bool()?;
    let claimed_scopes = input.read_u32()?;
    let claimed_values = input.read_u32()?;
    input.expect_marker(Marker::Frame)?;

    let mut arena = TreeArena::new(TreePolicy::new(case_sensitive_paths, sorted));
    let root = arena.root();
    let mut stack = vec![OpenScope {
        id: root,
        remaining: read_block_header(&mut input)?,
        tail: None,
    }];

    while let Some(top) = stack.last_mut() {
        if top.remaining == 0 {
            stack.pop();
            if !stack.is_empty() {
                input.expect_marker(Marker::Frame)?;
            }
            continue;
        }
        top.remaining -= 1;
        let (scope, tail) = (top.id, top.tail);

        let kind = input.read_u8()?;
        if kind != KIND_SCOPE && kind != KIND_VALUE {
            return Err(StreamError::BadNodeType(kind).into());
        }
        let name = input.read_string()?;
        if validate_name(&name).is_err() {
            return Err(StreamError::BadName(name).into());
        }
        let description = match input.read_u8()? {
            DESCRIPTION_PRESENT => Some(input.read_string()?),
            DESCRIPTION_ABSENT => None,
            other => return Err(StreamError::BadDescriptionFlag(other).into()),
        };

        if kind == KIND_SCOPE {
            let child = place(&mut arena, scope, tail, Node::scope(name, description))?;
            if let Some(top) = stack.last_mut() {
                top.tail = Some(child);
            }
            stack.push(OpenScope {
                id: child,
                remaining: read_block_header(&mut input)?,
                tail: None,
            });
        } else {
            let value = input.read_payload()?;
            let child = place(&mut arena, scope, tail, Node::value(name, description, value))?;
            if let Some(top) = stack.last_mut() {
                top.tail = Some(child);
            }
            input.expect_marker(Marker::Frame)?;
        }
    }
    input.expect_marker(Marker::EndOfObject)?;

    let found = arena.counts();
    let found_scopes = to_u32(found.scopes)?;
    let found_values = to_u32(found.values)?;
    if found_scopes != claimed_scopes || found_values != claimed_values {
        return Err(StreamError::CountMismatch {
            claimed_scopes,
            claimed_values,
            found_scopes,
            found_values,
        }
        .into());
    }
    Ok(arena)
}

/// Read a block's frame marker and its XOR-checked child count
fn read_block_header<R: Read>(input: &mut StreamReader<R>) -> Result<u32> {
    input.expect_marker(Marker::Frame)?;
    let count = input.read_u32()?;
    let check = input.read_u32()?;
    if count ^ COUNT_MASK != check {
        return Err(StreamError::BadCount { count, check }.into());
    }
    Ok(count)
}

fn place<T>(
    arena: &mut TreeArena<T>,
    scope: NodeId,
    tail: Option<NodeId>,
    node: Node<T>,
) -> Result<NodeId> {
    arena.insert_loaded(scope, tail, node).map_err(|err| match err {
        TreeError::Duplicate { name, .. } => StreamError::DuplicateName(name).into(),
        other => other,
    })
}

fn report<T>(result: Result<T>) -> Result<T> {
    if let Err(TreeError::Corrupted(err)) = &result {
        warn!(error = %err, "Rejected corrupted tree stream");
    }
    result
}

impl<T: Serialize> PathTree<T> {
    /// Write the whole tree to `writer`
    pub fn flatten<W: Write>(&self, writer: W) -> Result<()> {
        let arena = self.lock();
        write_tree(&*arena, writer)?;
        debug!(
            scopes = arena.counts().scopes,
            values = arena.counts().values,
            "Tree flattened"
        );
        Ok(())
    }

    /// Flatten into a new byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.flatten(&mut bytes)?;
        Ok(bytes)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.flatten(BufWriter::new(file))
    }
}

impl<T: DeserializeOwned> PathTree<T> {
    /// Build a new tree from a flattened stream
    pub fn unflatten<R: Read>(reader: R) -> Result<Self> {
        let arena = report(read_tree(reader))?;
        Ok(Self::from_arena(arena))
    }

    /// Replace this tree's contents and policy with a flattened stream
    ///
    /// The stream is read and validated before the lock is taken; on any
    /// error the current contents stay as they were.
    pub fn load_from<R: Read>(&self, reader: R) -> Result<()> {
        let arena = report(read_tree(reader))?;
        let counts = arena.counts();
        self.replace_arena(arena);
        debug!(
            scopes = counts.scopes,
            values = counts.values,
            "Tree contents replaced from stream"
        );
        Ok(())
    }

    pub fn load_from_file(&self, path: &Path) -> Result<()> {
        let file = File::open(path)?;
        self.load_from(BufReader::new(file))
    }

    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::unflatten(BufReader::new(file))
    }
}
