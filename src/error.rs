//! Error types for the tree collection, its cursors and the stream format.

use crate::types::NodeKind;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors raised by tree operations
#[derive(Debug, Error)]
pub enum TreeError {
    /// Malformed path string or node name
    #[error("Invalid path '{path}': {reason}")]
    Syntax { path: String, reason: String },

    /// Path or handle resolves to nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// A Scope was expected but a Value was found, or the reverse
    #[error("Wrong node kind at '{path}': expected {expected}, found {found}")]
    WrongKind {
        path: String,
        expected: NodeKind,
        found: NodeKind,
    },

    /// Insertion collides with an existing sibling name
    #[error("Duplicate name '{name}' in scope '{scope}'")]
    Duplicate { scope: String, name: String },

    /// A handle-addressed node is not a direct child of the given scope
    #[error("Node '{child}' is not a member of scope '{scope}'")]
    NotAMember { scope: String, child: String },

    /// The tree changed since the cursor last synchronised
    #[error("Cursor invalidated: captured serial {captured}, tree is at {current}")]
    InvalidatedCursor { captured: u64, current: u64 },

    /// Positional access on a cursor that is past the end
    #[error("Cursor is not positioned on a node")]
    CursorExhausted,

    /// Entry point the tree collection cannot support
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Deserialized stream failed structural validation
    #[error("Corrupted stream: {0}")]
    Corrupted(#[from] StreamError),

    /// Underlying reader or writer failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be encoded or decoded
    #[error("Payload encoding error: {0}")]
    Payload(#[from] bincode::Error),

    /// Structured output could not be rendered
    #[error("Output rendering error: {0}")]
    Render(#[from] serde_json::Error),

    /// Configuration could not be loaded or applied
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TreeError {
    pub(crate) fn syntax(path: &str, reason: impl Into<String>) -> Self {
        TreeError::Syntax {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// True for failures that leave the tree untouched and can be retried
    /// with different arguments.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            TreeError::Io(_) | TreeError::Render(_) | TreeError::Config(_)
        )
    }
}

impl From<config::ConfigError> for TreeError {
    fn from(err: config::ConfigError) -> Self {
        TreeError::Config(err.to_string())
    }
}

/// Structural failures found while reading a flattened tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("expected marker {expected:#04x}, found {found:#04x}")]
    UnexpectedMarker { expected: u8, found: u8 },

    #[error("bad stored count {count} (check value {check:#010x})")]
    BadCount { count: u32, check: u32 },

    #[error("bad stored node type {0:#04x}")]
    BadNodeType(u8),

    #[error("bad description flag {0:#04x}")]
    BadDescriptionFlag(u8),

    #[error("bad boolean byte {0:#04x}")]
    BadBool(u8),

    #[error("string is not valid UTF-8")]
    BadString,

    #[error("invalid stored name '{0}'")]
    BadName(String),

    #[error("duplicate stored name '{0}'")]
    DuplicateName(String),

    #[error(
        "stored counts disagree: header claims {claimed_scopes} scopes / {claimed_values} values, \
         stream holds {found_scopes} scopes / {found_values} values"
    )]
    CountMismatch {
        claimed_scopes: u32,
        claimed_values: u32,
        found_scopes: u32,
        found_values: u32,
    },

    #[error("count {0} does not fit the stream format")]
    CountOverflow(usize),
}
