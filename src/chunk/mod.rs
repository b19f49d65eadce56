//! Partitioning a parsed diff into bounded-size review chunks.
//!
//! Chunking runs in two phases:
//!
//! 1. [`index`] sizes every file and splits its hunks into [`HunkGroup`]s that
//!    fit the line budget without ever splitting a hunk.
//! 2. [`assemble`] walks the files largest first. Each group of a large file
//!    becomes its own [`Chunk`]; groups of small files are packed together
//!    until the packed total passes the flush threshold.
//!
//! Everything borrows from the [`Diff`](crate::diff::Diff) being chunked.

use crate::diff::{FileDiff, FileIdentity, Hunk};
use std::fmt;

pub mod assemble;
pub mod index;

pub use assemble::{Chunks, chunks};
pub use index::{IndexedFile, index_diff, index_file};

/// Default line budget for one chunk
pub const DEFAULT_MAX_CHUNK_LINES: usize = 100;

/// Chunking configuration.
///
/// Only the line budget is configurable; the small-file cutoff and the
/// flush threshold are always derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Budget for a group of hunks, measured in review lines
    pub max_chunk_lines: usize,
    /// Emit a trailing empty chunk when nothing is left in the combine buffer
    pub emit_empty_tail: bool,
}

impl ChunkConfig {
    pub fn new(max_chunk_lines: usize) -> Self {
        Self {
            max_chunk_lines,
            ..Self::default()
        }
    }

    /// Files whose total size reaches this are chunked on their own
    pub fn small_cutoff(&self) -> usize {
        self.max_chunk_lines / 4
    }

    /// Packed small files are flushed once their total exceeds this
    pub fn flush_threshold(&self) -> usize {
        self.max_chunk_lines + self.max_chunk_lines / 4
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_lines: DEFAULT_MAX_CHUNK_LINES,
            emit_empty_tail: false,
        }
    }
}

/// A contiguous run of one file's hunks and their combined size.
///
/// A file without hunks (pure rename, mode change, binary) is represented by
/// a single group with no hunks and size 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkGroup<'a> {
    pub hunks: &'a [Hunk],
    pub size: usize,
}

/// One group of hunks together with the file it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileChunk<'a> {
    pub file: &'a FileDiff,
    pub group: HunkGroup<'a>,
}

impl FileChunk<'_> {
    pub fn identity(&self) -> &FileIdentity {
        &self.file.identity
    }
}

impl fmt::Display for FileChunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.file.write_header(f)?;
        for hunk in self.group.hunks {
            write!(f, "{}", hunk)?;
        }
        Ok(())
    }
}

/// One unit of review output.
///
/// A chunk holds either a single group of a large file or the groups of
/// several small files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk<'a> {
    pub files: Vec<FileChunk<'a>>,
}

impl Chunk<'_> {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Combined size of every group in the chunk
    pub fn size(&self) -> usize {
        self.files.iter().map(|file| file.group.size).sum()
    }

    pub fn hunk_count(&self) -> usize {
        self.files.iter().map(|file| file.group.hunks.len()).sum()
    }
}

impl fmt::Display for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            write!(f, "{}", file)?;
        }
        Ok(())
    }
}
