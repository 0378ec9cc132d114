//! # serde_tabtree
//!
//! A tab-indented hierarchical document format with a mutable node tree and
//! Serde mapping.
//!
//! ## What is a tab tree?
//!
//! A document is a tree of nodes. Every node has a key (possibly empty), a
//! scalar value (possibly empty) and ordered children. The text form has one
//! line per node, indented with one tab per level:
//!
//! ```text
//! server =
//! 	host = example.org
//! 	port = 8080
//! 	paths =
//! 		= /api
//! 		= /static
//! ```
//!
//! ## Key Features
//!
//! - **Mutable tree**: add, re-key, detach and copy nodes; look children up by key
//! - **Paths**: address nodes with `/`-separated key paths and read or write
//!   typed attributes at those paths
//! - **Serde compatible**: map any `#[derive(Serialize, Deserialize)]` type onto
//!   a node and back
//! - **Gzip**: compressed input is detected on read; output can be compressed
//! - **Custom scalars**: types implementing [`Persist`] are stored as a single
//!   value
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_tabtree::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! let user = User {
//!     name: "joe".to_string(),
//!     tags: vec!["x".to_string(), "y".to_string()],
//! };
//!
//! let text = to_string(&user).unwrap();
//! assert_eq!(text, "=\n\tname = joe\n\ttags =\n\t\t= x\n\t\t= y\n");
//!
//! let user_back: User = from_str(&text).unwrap();
//! assert_eq!(user, user_back);
//! ```
//!
//! ### Working with the tree
//!
//! ```rust
//! use serde_tabtree::Tree;
//!
//! let mut tree: Tree = "config\n\tdebug = true\n".parse().unwrap();
//! let root = tree.root();
//! tree.write_attr(root, "server/port", &8080u16).unwrap();
//!
//! let debug: bool = tree.read_attr(root, "debug").unwrap();
//! assert!(debug);
//! assert_eq!(
//!     tree.to_string(),
//!     "config =\n\tdebug = true\n\tserver =\n\t\tport = 8080\n"
//! );
//! ```
//!
//! ## Logging
//!
//! The reader and writer emit `tracing` debug events. Per-line events are only
//! emitted when [`Options::debug`] is set.

pub mod de;
pub mod error;
mod map;
pub mod node;
pub mod options;
mod path;
pub mod persist;
pub mod read;
pub mod ser;
mod write;

pub use de::{from_node, unmarshal, Deserializer};
pub use error::{Error, Result};
pub use node::{NodeId, Tree};
pub use options::Options;
pub use persist::{Persist, Persisted};
pub use ser::{marshal, Serializer};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Serialize any `T: Serialize` into a new tree.
///
/// # Examples
///
/// ```rust
/// use serde_tabtree::to_tree;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let tree = to_tree(&Point { x: 1, y: 2 }).unwrap();
/// let x = tree.child_by_key(tree.root(), "x").unwrap();
/// assert_eq!(tree.value(x), "1");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized (e.g., compound map keys).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_tree<T>(value: &T) -> Result<Tree>
where
    T: ?Sized + Serialize,
{
    let mut tree = Tree::new();
    let root = tree.root();
    marshal(&mut tree, root, value)?;
    Ok(tree)
}

/// Deserialize an instance of type `T` from the root of `tree`.
///
/// # Errors
///
/// Returns an error if the tree cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_tree<'de, T>(tree: &'de Tree) -> Result<T>
where
    T: Deserialize<'de>,
{
    from_node(tree, tree.root())
}

/// Serialize any `T: Serialize` to tab tree text.
///
/// # Examples
///
/// ```rust
/// use serde_tabtree::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let text = to_string(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(text, "=\n\tx = 1\n\ty = 2\n");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    Ok(to_tree(value)?.to_string())
}

/// Serialize any `T: Serialize` to a writer as plain text.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, &Options::default())
}

/// Serialize any `T: Serialize` to a writer, gzip-compressed if the options say so.
///
/// # Examples
///
/// ```rust
/// use serde_tabtree::{from_slice, to_writer_with_options, Options};
///
/// let mut buffer = Vec::new();
/// to_writer_with_options(&mut buffer, &vec![1, 2, 3], &Options::compressed()).unwrap();
/// assert_eq!(&buffer[..2], &[0x1f, 0x8b]);
///
/// let back: Vec<i32> = from_slice(&buffer).unwrap();
/// assert_eq!(back, vec![1, 2, 3]);
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(writer: W, value: &T, options: &Options) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_tree(value)?.write_to(writer, options)
}

/// Serialize any `T: Serialize` to the file at `path`.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_path<P, T>(path: P, value: &T, options: &Options) -> Result<()>
where
    P: AsRef<Path>,
    T: ?Sized + Serialize,
{
    to_tree(value)?.save(path, options)
}

/// Deserialize an instance of type `T` from tab tree text.
///
/// # Examples
///
/// ```rust
/// use serde_tabtree::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("point\n\tx = 1\n\ty = 2\n").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the text is malformed or cannot be deserialized to type `T`.
/// Parse errors include line information.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_tree(&Tree::parse(s)?)
}

/// Deserialize an instance of type `T` from bytes, plain or gzip-compressed.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid document or cannot be
/// deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_reader(v)
}

/// Deserialize an instance of type `T` from an I/O stream, plain or gzip-compressed.
///
/// # Examples
///
/// ```rust
/// use serde_tabtree::from_reader;
/// use std::collections::BTreeMap;
/// use std::io::Cursor;
///
/// let cursor = Cursor::new(b"=\n\ta = 1\n\tb = 2\n");
/// let map: BTreeMap<String, u8> = from_reader(cursor).unwrap();
/// assert_eq!(map["b"], 2);
/// ```
///
/// # Errors
///
/// Returns an error if reading from the reader fails, the input is malformed,
/// or the data cannot be deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    from_tree(&Tree::from_reader(reader)?)
}

/// Deserialize an instance of type `T` from the file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is malformed, or cannot be
/// deserialized to type `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_path<P, T>(path: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    from_tree(&Tree::from_path(path)?)
}
