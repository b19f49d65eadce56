//! Cross-file ordering and packing of hunk groups into chunks.

use super::index::{IndexedFile, index_diff};
use super::{Chunk, ChunkConfig, FileChunk};
use crate::diff::Diff;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use tracing::debug;

/// Chunk a diff.
///
/// Files are visited by total size, largest first. Files with equal totals
/// keep their diff order. The returned iterator is lazy and yields each chunk
/// as soon as it is complete.
///
/// # Examples
/// ```
/// # use diffalump::chunk::{ChunkConfig, chunks};
/// # use diffalump::diff::Diff;
/// let diff = Diff::parse(
///     "diff --git a/a.txt b/a.txt\n--- a/a.txt\n+++ b/a.txt\n@@ -1 +1 @@\n-old\n+new\n",
/// )
/// .unwrap();
/// let chunks: Vec<_> = chunks(&diff, ChunkConfig::default()).collect();
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].hunk_count(), 1);
/// ```
pub fn chunks(diff: &Diff, config: ChunkConfig) -> Chunks<'_> {
    let mut files = index_diff(diff, config.max_chunk_lines);
    files.sort_by(|a, b| b.total.cmp(&a.total));

    Chunks {
        files: files.into_iter(),
        ready: VecDeque::new(),
        buffer: Vec::new(),
        buffered: 0,
        config,
        finished: false,
    }
}

/// Lazy sequence of chunks produced by [`chunks`].
///
/// Small files accumulate in a combine buffer; the buffer is released as one
/// chunk whenever its running total exceeds the flush threshold, and once
/// more after the last file.
pub struct Chunks<'a> {
    files: std::vec::IntoIter<IndexedFile<'a>>,
    ready: VecDeque<Chunk<'a>>,
    buffer: Vec<FileChunk<'a>>,
    buffered: usize,
    config: ChunkConfig,
    finished: bool,
}

impl<'a> Chunks<'a> {
    fn place(&mut self, indexed: IndexedFile<'a>) {
        let file = indexed.file;
        debug_assert_eq!(
            indexed.groups.iter().map(|g| g.hunks.len()).sum::<usize>(),
            file.hunks.len(),
            "hunk groups must cover every hunk of {}",
            file.identity
        );

        if indexed.total >= self.config.small_cutoff() {
            debug!(
                file = %file.identity,
                total = indexed.total,
                chunks = indexed.groups.len(),
                "chunking large file on its own"
            );
            self.ready
                .extend(indexed.groups.into_iter().map(|group| Chunk {
                    files: vec![FileChunk { file, group }],
                }));
            return;
        }

        self.buffer.extend(
            indexed
                .groups
                .into_iter()
                .map(|group| FileChunk { file, group }),
        );
        self.buffered += indexed.total;

        if self.buffered > self.config.flush_threshold() {
            debug!(
                files = self.buffer.len(),
                total = self.buffered,
                "flushing combined small files"
            );
            let chunk = self.flush();
            self.ready.push_back(chunk);
        }
    }

    fn flush(&mut self) -> Chunk<'a> {
        self.buffered = 0;
        Chunk {
            files: std::mem::take(&mut self.buffer),
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = self.ready.pop_front() {
                return Some(chunk);
            }

            match self.files.next() {
                Some(indexed) => self.place(indexed),
                None if self.finished => return None,
                None => {
                    self.finished = true;
                    let tail = self.flush();
                    return (!tail.is_empty() || self.config.emit_empty_tail).then_some(tail);
                }
            }
        }
    }
}

impl FusedIterator for Chunks<'_> {}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use super::*;
    use crate::chunk::index::index_file;
    use crate::chunk::index::tests::{file, hunk};
    use crate::diff::Hunk;
    use proptest::prelude::*;

    /// Hunk with at least one changed line
    fn arb_hunk() -> impl Strategy<Value = Hunk> {
        (0usize..60, 0usize..60).prop_map(|(removed, added)| {
            hunk(removed, if removed == 0 { added.max(1) } else { added })
        })
    }

    /// Diff of up to 12 files with up to 6 hunks each, some without hunks
    fn arb_diff() -> impl Strategy<Value = Diff> {
        prop::collection::vec(prop::collection::vec(arb_hunk(), 0..6), 0..12).prop_map(
            |files| Diff {
                files: files
                    .into_iter()
                    .enumerate()
                    .map(|(i, hunks)| file(&format!("f{i}.rs"), hunks))
                    .collect(),
            },
        )
    }

    proptest! {
        /// Every hunk lands in exactly one chunk, in original order per file,
        /// and every file shows up even without hunks
        #[test]
        fn chunks_cover_every_hunk_once(diff in arb_diff(), max in 4usize..150) {
            let chunks: Vec<_> = chunks(&diff, ChunkConfig::new(max)).collect();

            for file in &diff.files {
                let pieces: Vec<_> = chunks
                    .iter()
                    .flat_map(|c| &c.files)
                    .filter(|fc| fc.identity() == &file.identity)
                    .collect();
                let groups = index_file(file, max).groups.len();
                prop_assert_eq!(pieces.len(), groups, "{} placed wrongly", file.identity);

                let rebuilt: Vec<&Hunk> = pieces.iter().flat_map(|fc| fc.group.hunks).collect();
                let original: Vec<&Hunk> = file.hunks.iter().collect();
                prop_assert_eq!(rebuilt, original);
            }
        }

        /// Groups stay within budget unless they hold a single oversized hunk
        #[test]
        fn groups_respect_budget(diff in arb_diff(), max in 4usize..150) {
            for chunk in chunks(&diff, ChunkConfig::new(max)) {
                for fc in &chunk.files {
                    let size: usize = fc.group.hunks.iter().map(Hunk::size).sum();
                    prop_assert_eq!(size, fc.group.size);
                    if fc.group.size > max {
                        prop_assert_eq!(fc.group.hunks.len(), 1);
                    }
                }
            }
        }

        /// Large files never share a chunk
        #[test]
        fn large_files_are_isolated(diff in arb_diff(), max in 4usize..150) {
            let config = ChunkConfig::new(max);
            for chunk in chunks(&diff, config) {
                if chunk.files.iter().any(|fc| fc.file.size() >= config.small_cutoff()) {
                    prop_assert_eq!(chunk.files.len(), 1);
                }
            }
        }

        /// Small files are packed largest first and a combined chunk is
        /// released as soon as its total passes the flush threshold
        #[test]
        fn small_files_flush_past_threshold(diff in arb_diff(), max in 4usize..150) {
            let config = ChunkConfig::new(max);
            let combined: Vec<Vec<usize>> = chunks(&diff, config)
                .filter(|c| c.files.iter().all(|fc| fc.file.size() < config.small_cutoff()))
                .map(|c| c.files.iter().map(|fc| fc.group.size).collect())
                .collect();

            let sizes: Vec<usize> = combined.iter().flatten().copied().collect();
            prop_assert!(sizes.windows(2).all(|w| w[0] >= w[1]));

            for (i, chunk) in combined.iter().enumerate() {
                let total: usize = chunk.iter().sum();
                let before_last = total - chunk.last().copied().unwrap_or(0);
                prop_assert!(before_last <= config.flush_threshold());
                // the last one may be the leftover buffer
                if i + 1 < combined.len() {
                    prop_assert!(total > config.flush_threshold());
                }
            }
        }

        /// Only the optional tail may be empty
        #[test]
        fn chunks_are_non_empty(diff in arb_diff(), max in 4usize..150) {
            for chunk in chunks(&diff, ChunkConfig::new(max)) {
                prop_assert!(!chunk.is_empty());
            }
        }

        /// Same input, same chunk sequence
        #[test]
        fn chunking_is_deterministic(diff in arb_diff(), max in 4usize..150) {
            let config = ChunkConfig::new(max);
            let first: Vec<String> = chunks(&diff, config).map(|c| c.to_string()).collect();
            let second: Vec<String> = chunks(&diff, config).map(|c| c.to_string()).collect();
            prop_assert_eq!(first, second);
        }
    }
}
