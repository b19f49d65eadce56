//! Structured model of `git diff` output.
//!
//! [`Diff`] owns every [`FileDiff`], each of which owns its [`Hunk`]s. The
//! model keeps enough of the original text (header lines, section headings,
//! no-newline markers) to render every hunk back exactly as git printed it.

use error_set::error_set;

pub mod file;
pub mod full;
pub mod hunk;

pub use file::{FileDiff, FileIdentity};
pub use full::Diff;
pub use hunk::{Hunk, HunkRange, Line, LineKind};

/// Split on `\n` only, so a `\r` before it stays part of the line
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive('\n')
        .map(|line| line.strip_suffix('\n').unwrap_or(line))
}

error_set! {
    /// Errors from parsing unified diff text
    ParseError := {
        /// A line starting with `@@` is not a valid hunk header
        #[display("Invalid hunk header '{line}'")]
        InvalidHunkHeader { line: String },
        /// Hunk body does not match the line counts in its header
        #[display("Hunk '{header}' does not match its line counts")]
        HunkLengthMismatch { header: String },
        /// Line inside a hunk has an unknown prefix
        #[display("Unexpected line in hunk: '{line}'")]
        UnexpectedLine { line: String },
        /// File section does not start with `diff --git`
        #[display("Expected 'diff --git' header, got '{line}'")]
        MissingFileHeader { line: String },
        /// Same (source, target) pair appears twice
        #[display("File {file} appears more than once in the diff")]
        DuplicateFile { file: String },
    }
}
