//! Error types for reading, writing and mapping tab trees.
//!
//! ## Error Categories
//!
//! - **Parse errors**: illegal indentation, indentation jumps, depth limit,
//!   control characters in values, an indented root line
//! - **Navigation errors**: unresolved attribute paths, writes to an empty path
//! - **Mapping errors**: scalar conversion failures, stale node handles
//! - **I/O errors**: propagated unchanged from the underlying stream
//!
//! ## Examples
//!
//! ```rust
//! use serde_tabtree::{Error, Tree};
//!
//! let result = Tree::parse("root\n\t\tchild");
//! assert!(matches!(result, Err(Error::IndentJump { .. })));
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

/// Represents all possible errors of the tab tree engine.
///
/// Parse errors carry the 1-based line (and column where it helps).
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading, writing or (de)compressing
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A line was not valid UTF-8
    #[error("Invalid UTF-8 at line {line}")]
    Encoding { line: usize },

    /// The first line starts with whitespace or a control character
    #[error("Malformed leading line: the root line must not be indented (found {found:?})")]
    IndentedRoot { found: char },

    /// Something other than a tab appeared in the indentation
    #[error("Illegal indent character {found:?} at line {line}, column {col}")]
    IllegalIndent { line: usize, col: usize, found: char },

    /// Indentation grew by more than one level
    #[error("Indent jump at line {line}: previous depth was {previous}, found {found}")]
    IndentJump {
        line: usize,
        previous: usize,
        found: usize,
    },

    /// Indentation reached the depth limit
    #[error("Indent exceeds limit at line {line}: depth {depth} (limit {limit})")]
    IndentLimit {
        line: usize,
        depth: usize,
        limit: usize,
    },

    /// A value starts with a control character
    #[error("Illegal control character {found:?} at line {line}, column {col}")]
    IllegalControl { line: usize, col: usize, found: char },

    /// An attribute path did not resolve
    #[error("No such key: {0}")]
    NoSuchKey(String),

    /// An attribute write addressed the node itself
    #[error("Empty key not allowed")]
    EmptyKey,

    /// A node handle does not belong to a live node of the tree
    #[error("Invalid node handle (nil pointer)")]
    InvalidNode,

    /// A node value could not be converted to the requested scalar type
    #[error("Cannot convert {value:?} to {expected}: {msg}")]
    Scalar {
        value: String,
        expected: &'static str,
        msg: String,
    },

    /// Unsupported type for mapping
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error raised by a `Serialize`/`Deserialize` implementation
    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn encoding(line: usize) -> Self {
        Error::Encoding { line }
    }

    pub fn indented_root(found: char) -> Self {
        Error::IndentedRoot { found }
    }

    /// Creates an illegal indent error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tabtree::Error;
    ///
    /// let err = Error::illegal_indent(3, 2, ' ');
    /// assert!(err.to_string().contains("line 3"));
    /// ```
    pub fn illegal_indent(line: usize, col: usize, found: char) -> Self {
        Error::IllegalIndent { line, col, found }
    }

    pub fn indent_jump(line: usize, previous: usize, found: usize) -> Self {
        Error::IndentJump {
            line,
            previous,
            found,
        }
    }

    pub fn indent_limit(line: usize, depth: usize) -> Self {
        Error::IndentLimit {
            line,
            depth,
            limit: crate::read::MAX_DEPTH,
        }
    }

    pub fn illegal_control(line: usize, col: usize, found: char) -> Self {
        Error::IllegalControl { line, col, found }
    }

    pub fn no_such_key(path: &str) -> Self {
        Error::NoSuchKey(path.to_string())
    }

    /// Creates a scalar conversion error, keeping the converter's message verbatim.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tabtree::Error;
    ///
    /// let err = Error::scalar("abc", "i32", "invalid digit found in string");
    /// assert!(err.to_string().contains("invalid digit"));
    /// ```
    pub fn scalar<M: fmt::Display>(value: &str, expected: &'static str, msg: M) -> Self {
        Error::Scalar {
            value: value.to_string(),
            expected,
            msg: msg.to_string(),
        }
    }

    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
