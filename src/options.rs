//! Configuration options for reading and writing tab trees.
//!
//! The text layout itself (tab indentation, `key = value` lines) is fixed.
//! What can be configured is the boundary around it:
//!
//! - a line limit for partial reads
//! - gzip compression on write (reading detects gzip on its own)
//! - per-line debug events
//!
//! ## Examples
//!
//! ```rust
//! use serde_tabtree::Options;
//!
//! let options = Options::new().with_max_lines(10).with_debug(true);
//! assert_eq!(options.max_lines, 10);
//!
//! let options = Options::compressed().with_level(9);
//! assert!(options.gzip);
//! ```

/// Default gzip level, the same as `flate2::Compression::default()`.
pub const DEFAULT_LEVEL: u32 = 6;

/// Configuration options for the reader and the writer.
#[derive(Clone, Debug)]
pub struct Options {
    /// Maximum number of lines to read, the root line included. `0` means unlimited.
    pub max_lines: usize,
    /// Compress output with gzip.
    pub gzip: bool,
    /// Gzip level (0-9), only used when `gzip` is set.
    pub level: u32,
    /// Emit a `tracing` debug event for every parsed line.
    pub debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_lines: 0,
            gzip: false,
            level: DEFAULT_LEVEL,
            debug: false,
        }
    }
}

impl Options {
    /// Creates default options (unlimited, plain text, no debug output).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tabtree::Options;
    ///
    /// let options = Options::new();
    /// assert_eq!(options.max_lines, 0);
    /// assert!(!options.gzip);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for gzip-compressed output at the default level.
    #[must_use]
    pub fn compressed() -> Self {
        Options {
            gzip: true,
            ..Default::default()
        }
    }

    /// Stops reading after `max_lines` lines. `0` removes the limit.
    #[must_use]
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    #[must_use]
    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    /// Sets the gzip level, clamped to 9.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
