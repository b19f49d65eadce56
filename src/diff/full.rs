use super::{ParseError, split_lines};
use super::file::FileDiff;
use std::collections::HashSet;

/// A complete git diff containing changes for multiple files
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diff {
    pub files: Vec<FileDiff>,
}

impl Diff {
    /// Parse a complete git diff output into file diffs.
    ///
    /// Text before the first `diff --git` line is ignored. File order is kept
    /// exactly as git printed it.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut files = Vec::new();
        let mut current_file_text = String::new();

        for line in split_lines(text) {
            if line.starts_with("diff --git ") {
                // Start of new file diff - save previous if exists
                if !current_file_text.is_empty() {
                    files.push(FileDiff::parse(&current_file_text)?);
                }
                current_file_text = line.to_string();
                current_file_text.push('\n');
            } else if !current_file_text.is_empty() {
                current_file_text.push_str(line);
                current_file_text.push('\n');
            }
        }

        if !current_file_text.is_empty() {
            files.push(FileDiff::parse(&current_file_text)?);
        }

        let mut seen = HashSet::new();
        for file in &files {
            if !seen.insert(&file.identity) {
                return Err(ParseError::DuplicateFile {
                    file: file.identity.to_string(),
                });
            }
        }

        Ok(Diff { files })
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of hunks across all files
    pub fn hunk_count(&self) -> usize {
        self.files.iter().map(|file| file.hunks.len()).sum()
    }
}

impl std::fmt::Display for Diff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for file_diff in &self.files {
            write!(f, "{}", file_diff)?;
        }
        Ok(())
    }
}
