//! Writing tab trees as text.
//!
//! Each node becomes one line: the escaped key followed by a space (if the key
//! is not empty), `=`, then a space and the raw value (if the value is not
//! empty). The node being written gets no indentation, its children one tab,
//! and so on, whatever its position in the tree.

use crate::node::{NodeId, Tree};
use crate::{Options, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

fn escape_key(key: &str, out: &mut String) {
    for c in key.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' ' => out.push_str("\\s"),
            '=' => out.push_str("\\="),
            c => out.push(c),
        }
    }
}

impl Tree {
    /// Renders the subtree rooted at `id` as text, `id` being the first line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tabtree::Tree;
    ///
    /// let mut tree = Tree::with_root("root", "5");
    /// let root = tree.root();
    /// let child = tree.push_child(root, "child", "");
    /// tree.push_child(child, "", "6");
    ///
    /// assert_eq!(tree.to_text(root), "root = 5\n\tchild =\n\t\t= 6\n");
    /// assert_eq!(tree.to_text(child), "child =\n\t= 6\n");
    /// ```
    pub fn to_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render(id, 0, &mut out);
        out
    }

    fn render(&self, id: NodeId, depth: usize, out: &mut String) {
        let key = self.key(id);
        let value = self.value(id);
        out.extend(std::iter::repeat('\t').take(depth));
        if !key.is_empty() {
            escape_key(key, out);
            out.push(' ');
        }
        out.push('=');
        if !value.is_empty() {
            out.push(' ');
            out.push_str(value);
        }
        out.push('\n');
        for &child in self.children(id) {
            self.render(child, depth + 1, out);
        }
    }

    /// Writes the subtree rooted at `id`, gzip-compressed if `options.gzip` is set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if writing or compression fails.
    pub fn write_node<W: Write>(&self, id: NodeId, mut writer: W, options: &Options) -> Result<()> {
        let text = self.to_text(id);
        if options.gzip {
            let mut encoder = GzEncoder::new(writer, Compression::new(options.level));
            encoder.write_all(text.as_bytes())?;
            encoder.finish()?;
        } else {
            writer.write_all(text.as_bytes())?;
        }
        debug!(bytes = text.len(), gzip = options.gzip, "wrote tree");
        Ok(())
    }

    /// Writes the whole document.
    ///
    /// # Errors
    ///
    /// Same as [`Tree::write_node`].
    pub fn write_to<W: Write>(&self, writer: W, options: &Options) -> Result<()> {
        self.write_node(self.root(), writer, options)
    }

    /// Writes the whole document to the file at `path`, replacing it.
    ///
    /// # Errors
    ///
    /// Same as [`Tree::write_node`], plus any error creating the file.
    pub fn save<P: AsRef<Path>>(&self, path: P, options: &Options) -> Result<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "saving tree");
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer, options)?;
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(self.root()))
    }
}
