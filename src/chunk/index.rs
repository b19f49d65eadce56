//! Per-file sizing and hunk grouping.

use super::HunkGroup;
use crate::diff::{Diff, FileDiff};
use tracing::debug;

/// A file together with its hunk groups and total size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile<'a> {
    pub file: &'a FileDiff,
    /// Sum of the group sizes
    pub total: usize,
    pub groups: Vec<HunkGroup<'a>>,
}

/// Split a file's hunks into groups of at most `max_chunk_lines`.
///
/// Hunks are taken in order and never split. A hunk closes the running group
/// when adding it would push a non-empty group over the budget, so a hunk that
/// is larger than the budget on its own ends up alone in an oversized group.
pub fn index_file(file: &FileDiff, max_chunk_lines: usize) -> IndexedFile<'_> {
    let hunks = file.hunks.as_slice();
    let mut groups = Vec::new();
    let mut start = 0;
    let mut size = 0;

    for (i, hunk) in hunks.iter().enumerate() {
        let hunk_size = hunk.size();
        if i > start && size + hunk_size > max_chunk_lines {
            groups.push(HunkGroup {
                hunks: &hunks[start..i],
                size,
            });
            start = i;
            size = 0;
        }
        size += hunk_size;
    }

    if start < hunks.len() || hunks.is_empty() {
        groups.push(HunkGroup {
            hunks: &hunks[start..],
            size,
        });
    }

    let total = groups.iter().map(|group| group.size).sum();
    debug!(
        file = %file.identity,
        total,
        groups = groups.len(),
        "indexed file"
    );

    IndexedFile {
        file,
        total,
        groups,
    }
}

/// Index every file of the diff, in diff order
pub fn index_diff(diff: &Diff, max_chunk_lines: usize) -> Vec<IndexedFile<'_>> {
    diff.files
        .iter()
        .map(|file| index_file(file, max_chunk_lines))
        .collect()
}
