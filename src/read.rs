//! Reading tab trees from text.
//!
//! One line per node. The first line is the root and must not be indented;
//! every other line starts with one tab per level below the root's children.
//!
//! ```text
//! key = value
//! \tchild1 = v1
//! \tchild2 =
//! \t\tgrandchild = v2
//! ```
//!
//! Streams starting with the gzip magic bytes are decompressed on the fly.
//! A blank line ends the document.

use crate::node::{NodeId, Tree};
use crate::{Error, Options, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Maximum indentation depth. A line with this many tabs is rejected.
pub const MAX_DEPTH: usize = 128;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

impl Tree {
    /// Parses a tree from a string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tabtree::Tree;
    ///
    /// let tree = Tree::parse("root = 5\n\tchild = 6\n").unwrap();
    /// let child = tree.child_by_key(tree.root(), "child").unwrap();
    /// assert_eq!(tree.value(tree.root()), "5");
    /// assert_eq!(tree.value(child), "6");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a parse error on malformed indentation or values.
    pub fn parse(text: &str) -> Result<Tree> {
        Parser::new(&Options::default()).parse(text.as_bytes())
    }

    /// Parses a tree from a reader, decompressing gzip input.
    ///
    /// # Errors
    ///
    /// Returns a parse error, or [`Error::Io`] if reading or decompression fails.
    pub fn from_reader<R: Read>(reader: R) -> Result<Tree> {
        Tree::from_reader_with_options(reader, &Options::default())
    }

    /// Parses at most `max_lines` lines (the root line included, `0` for no limit).
    ///
    /// # Errors
    ///
    /// Same as [`Tree::from_reader`].
    pub fn from_reader_with_limit<R: Read>(reader: R, max_lines: usize) -> Result<Tree> {
        Tree::from_reader_with_options(reader, &Options::new().with_max_lines(max_lines))
    }

    /// Parses a tree from a reader with custom options.
    ///
    /// # Errors
    ///
    /// Same as [`Tree::from_reader`].
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: &Options) -> Result<Tree> {
        let mut magic = [0u8; GZIP_MAGIC.len()];
        let len = read_prefix(&mut reader, &mut magic)?;
        let stream = (&magic[..len]).chain(reader);
        if magic[..len] == GZIP_MAGIC {
            debug!("gzip header detected, decompressing");
            Parser::new(options).parse(BufReader::new(GzDecoder::new(stream)))
        } else {
            Parser::new(options).parse(BufReader::new(stream))
        }
    }

    /// Parses the file at `path`, plain or gzip-compressed.
    ///
    /// # Errors
    ///
    /// Same as [`Tree::from_reader`], plus any error opening the file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Tree> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading tree");
        Tree::from_reader(File::open(path)?)
    }
}

/// Fills `buf` from `reader` across short reads. Returns fewer bytes only at end of stream.
fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

impl FromStr for Tree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Tree::parse(s)
    }
}

/// Line-by-line parser state.
struct Parser<'a> {
    options: &'a Options,
    line: usize,
    previous: usize,
    /// `parents[d]` is the parent of the next line indented by `d` tabs.
    parents: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn new(options: &'a Options) -> Self {
        Parser {
            options,
            line: 0,
            previous: 0,
            parents: Vec::with_capacity(8),
        }
    }

    fn parse<R: BufRead>(mut self, mut reader: R) -> Result<Tree> {
        let mut tree = Tree::new();
        let mut buf = Vec::new();

        loop {
            if self.options.max_lines > 0 && self.line >= self.options.max_lines {
                debug!(lines = self.line, "line limit reached");
                break;
            }
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            self.line += 1;

            if self.line == 1 {
                if buf[0] <= b' ' {
                    return Err(Error::indented_root(char::from(buf[0])));
                }
                let text = self.decode(&buf)?;
                let (key, value) = self.parse_pair(text, 0)?;
                tree = Tree::with_root(key, value);
                let root = tree.root();
                self.parents.extend([root, root]);
                continue;
            }

            let text = self.decode(&buf)?;
            let depth = text.bytes().take_while(|&b| b == b'\t').count();
            let rest = &text[depth..];
            match rest.chars().next() {
                None => break,
                Some(c) if c <= ' ' => return Err(Error::illegal_indent(self.line, depth + 1, c)),
                Some(_) => {}
            }
            if depth >= MAX_DEPTH {
                return Err(Error::indent_limit(self.line, depth));
            }
            if depth > self.previous + 1 {
                return Err(Error::indent_jump(self.line, self.previous, depth));
            }

            let (key, value) = self.parse_pair(rest, depth)?;
            if self.options.debug {
                debug!(line = self.line, depth, key = %key, value = %value, "parsed line");
            }
            let node = tree.push_child(self.parents[depth], key, value);
            self.parents.truncate(depth + 1);
            self.parents.push(node);
            self.previous = depth;
        }

        debug!(lines = self.line, "parsed tree");
        Ok(tree)
    }

    /// Strips the line terminator and checks the encoding.
    fn decode<'b>(&self, buf: &'b [u8]) -> Result<&'b str> {
        let line = buf.strip_suffix(b"\n").unwrap_or(buf);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        std::str::from_utf8(line).map_err(|_| Error::encoding(self.line))
    }

    /// Splits `key = value`, decoding key escapes. `offset` is the number of
    /// indentation bytes in front of `text`, used for error columns.
    fn parse_pair(&self, text: &str, offset: usize) -> Result<(String, String)> {
        let mut key = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some(&(_, c)) = chars.peek() {
            if c == '=' || c <= ' ' {
                break;
            }
            chars.next();
            if c != '\\' {
                key.push(c);
                continue;
            }
            match chars.next() {
                Some((_, 'n')) => key.push('\n'),
                Some((_, 'r')) => key.push('\r'),
                Some((_, escaped)) => key.push(escaped),
                None => key.push('\\'),
            }
        }

        let rest = match chars.peek() {
            Some(&(pos, _)) => &text[pos..],
            None => "",
        };
        let rest = rest.trim_start_matches([' ', '\t']);
        let Some(after) = rest.strip_prefix('=') else {
            return Ok((key, String::new()));
        };
        let value = after.trim_start_matches([' ', '\t']);
        if let Some(c) = value.chars().next() {
            if (c as u32) < 32 {
                let col = offset + (text.len() - value.len()) + 1;
                return Err(Error::illegal_control(self.line, col, c));
            }
        }
        Ok((key, value.to_string()))
    }
}
