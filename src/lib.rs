//! Split the diff between two git revisions into bounded-size chunks for
//! sequential review.
//!
//! Large files are split across chunks at hunk boundaries, while many small
//! changes are packed together. See [`chunk`] for the algorithm.
//!
//! ```no_run
//! # use diffalump::{Diffalump, chunk::{ChunkConfig, chunks}, write::write_stream};
//! let diff = Diffalump::new(".").diff("main", "feature").unwrap();
//! write_stream(&mut std::io::stdout(), chunks(&diff, ChunkConfig::default())).unwrap();
//! ```

use error_set::error_set;
use std::process::Command;
use tracing::{debug, info};

pub mod chunk;
pub mod diff;
pub mod write;

pub use chunk::{Chunk, ChunkConfig, Chunks, FileChunk, HunkGroup, chunks};
pub use diff::{Diff, FileDiff, FileIdentity, Hunk, ParseError};
pub use write::WriteError;

/// Context lines requested from `git diff` by default
pub const DEFAULT_CONTEXT_LINES: u32 = 5;

error_set! {
    /// Top-level error for diffalump operations
    DiffalumpError := {
        ParseError(ParseError),
        WriteError(WriteError),
    } || GitCommandError

    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run git diff: {message}")]
        DiffFailed { message: String },
        #[display("git diff failed: {stderr}")]
        DiffExitError { stderr: String },
        #[display("Invalid UTF-8 in git diff output: {message}")]
        InvalidUtf8 { message: String },
    }
}

/// Runs `git diff` for a repository and parses the result
pub struct Diffalump<'a> {
    repo_path: &'a str,
    context_lines: u32,
    exclude: &'a [String],
}

impl<'a> Diffalump<'a> {
    /// Create a new Diffalump for the given repository path
    pub fn new(repo_path: &'a str) -> Self {
        Self {
            repo_path,
            context_lines: DEFAULT_CONTEXT_LINES,
            exclude: &[],
        }
    }

    /// Number of context lines around each change
    pub fn context_lines(mut self, lines: u32) -> Self {
        self.context_lines = lines;
        self
    }

    /// Paths left out of the diff, as git pathspecs
    pub fn exclude(mut self, paths: &'a [String]) -> Self {
        self.exclude = paths;
        self
    }

    /// Diff `base..target` and parse it
    ///
    /// # Examples
    /// ```no_run
    /// # use diffalump::Diffalump;
    /// let excluded = vec!["Cargo.lock".to_string()];
    /// let diff = Diffalump::new(".")
    ///     .exclude(&excluded)
    ///     .diff("main", "HEAD")
    ///     .unwrap();
    /// println!("{} files changed", diff.files.len());
    /// ```
    pub fn diff(&self, base: &str, target: &str) -> Result<Diff, DiffalumpError> {
        let diff = Diff::parse(&self.raw_diff(base, target)?)?;
        info!(
            files = diff.files.len(),
            hunks = diff.hunk_count(),
            "parsed diff {base}..{target}"
        );
        Ok(diff)
    }

    /// Get raw `git diff` output for `base..target`
    pub fn raw_diff(&self, base: &str, target: &str) -> Result<String, GitCommandError> {
        let args = self.diff_args(base, target);
        debug!(?args, "running git");

        let output = Command::new("git")
            .args(&args)
            .output()
            .map_err(|e| GitCommandError::DiffFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitCommandError::DiffExitError {
                stderr: stderr.into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            message: e.to_string(),
        })
    }

    fn diff_args(&self, base: &str, target: &str) -> Vec<String> {
        let mut args: Vec<String> = [
            "-C",
            self.repo_path,
            "diff",
            "--no-ext-diff",
            "--no-color",
            "--histogram",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.push(format!("--unified={}", self.context_lines));
        args.push(format!("{base}..{target}"));

        if !self.exclude.is_empty() {
            args.push("--".to_string());
            args.extend(self.exclude.iter().map(|path| format!(":(exclude){path}")));
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn diff_args_defaults() {
        let args = Diffalump::new("/repo").diff_args("main", "feature");
        assert_eq!(
            args,
            vec![
                "-C",
                "/repo",
                "diff",
                "--no-ext-diff",
                "--no-color",
                "--histogram",
                "--unified=5",
                "main..feature"
            ]
        );
    }

    #[test]
    fn diff_args_with_excludes_and_context() {
        let excluded = vec!["Cargo.lock".to_string(), "docs/".to_string()];
        let args = Diffalump::new(".")
            .context_lines(0)
            .exclude(&excluded)
            .diff_args("v1", "v2");
        assert_eq!(
            &args[6..],
            &[
                "--unified=0",
                "v1..v2",
                "--",
                ":(exclude)Cargo.lock",
                ":(exclude)docs/"
            ]
        );
    }
}
