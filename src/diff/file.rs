use super::ParseError;
use super::hunk::Hunk;
use std::fmt;

/// Identity of one file's change within a diff: the (source, target) pair.
///
/// Both paths are kept exactly as git prints them, prefix included
/// (`a/src/lib.rs`, `b/src/lib.rs`, or `/dev/null`), since renames change one
/// or both sides.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileIdentity {
    pub source: String,
    pub target: String,
}

impl FileIdentity {
    /// The path a reviewer would recognise, without the diff prefix.
    ///
    /// This is the target path, or the source path for deleted files.
    #[must_use]
    pub fn path(&self) -> &str {
        if self.target == DEV_NULL {
            strip_diff_prefix(&self.source)
        } else {
            strip_diff_prefix(&self.target)
        }
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = strip_diff_prefix(&self.source);
        let target = strip_diff_prefix(&self.target);
        if source == target || self.source == DEV_NULL || self.target == DEV_NULL {
            write!(f, "{}", self.path())
        } else {
            write!(f, "{} -> {}", source, target)
        }
    }
}

const DEV_NULL: &str = "/dev/null";

/// A complete diff for a single file.
///
/// Holds the raw header lines (everything between `diff --git` and the first
/// hunk) alongside every hunk in original order. Pure renames, mode changes,
/// and binary files have no hunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub identity: FileIdentity,
    /// Header lines as git printed them, without trailing newlines
    pub header: Vec<String>,
    pub hunks: Vec<Hunk>,
    pub is_new: bool,
    pub is_deleted: bool,
    pub is_rename: bool,
    pub is_binary: bool,
    pub mode_changed: bool,
}

impl FileDiff {
    /// Parse a single-file diff from git diff output.
    ///
    /// Expects input starting with a `diff --git` line.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let first_hunk_pos = if text.starts_with("@@ ") {
            Some(0)
        } else {
            text.find("\n@@ ").map(|i| i + 1)
        };
        let (head, body) = text.split_at(first_hunk_pos.unwrap_or(text.len()));

        let header: Vec<String> = head.lines().map(str::to_string).collect();
        let paths = header
            .first()
            .and_then(|line| line.strip_prefix("diff --git "))
            .ok_or_else(|| ParseError::MissingFileHeader {
                line: header.first().cloned().unwrap_or_default(),
            })?;

        let (mut source, mut target) = split_git_paths(paths);
        let mut file = FileDiff {
            identity: FileIdentity {
                source: String::new(),
                target: String::new(),
            },
            header: Vec::new(),
            hunks: Vec::new(),
            is_new: false,
            is_deleted: false,
            is_rename: false,
            is_binary: false,
            mode_changed: false,
        };

        for line in &header[1..] {
            if let Some(path) = line.strip_prefix("rename from ") {
                file.is_rename = true;
                source = format!("{}{}", diff_prefix(&source), path);
            } else if let Some(path) = line.strip_prefix("rename to ") {
                file.is_rename = true;
                target = format!("{}{}", diff_prefix(&target), path);
            } else if let Some(path) = line.strip_prefix("--- ") {
                source = without_timestamp(path).to_string();
            } else if let Some(path) = line.strip_prefix("+++ ") {
                target = without_timestamp(path).to_string();
            } else if line.starts_with("new file mode ") {
                file.is_new = true;
            } else if line.starts_with("deleted file mode ") {
                file.is_deleted = true;
            } else if line.starts_with("old mode ") || line.starts_with("new mode ") {
                file.mode_changed = true;
            } else if line.starts_with("Binary files ") || line == "GIT binary patch" {
                file.is_binary = true;
            }
        }

        // Each hunk runs up to the next hunk header
        let mut indices = Vec::new();
        if !body.is_empty() {
            indices.push(0);
            let mut search_start = 1;
            while let Some(pos) = body[search_start..].find("\n@@ ") {
                let abs_pos = search_start + pos + 1;
                indices.push(abs_pos);
                search_start = abs_pos + 1;
            }
        }

        file.hunks = indices
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = indices.get(i + 1).copied().unwrap_or(body.len());
                Hunk::parse(&body[start..end])
            })
            .collect::<Result<_, _>>()?;

        file.identity = FileIdentity { source, target };
        file.header = header;
        Ok(file)
    }

    /// Total review size: the sum of every hunk's size
    #[must_use]
    pub fn size(&self) -> usize {
        self.hunks.iter().map(Hunk::size).sum()
    }

    /// Write the header lines, each terminated by a newline
    pub fn write_header(&self, f: &mut impl fmt::Write) -> fmt::Result {
        for line in &self.header {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;
        for hunk in &self.hunks {
            write!(f, "{}", hunk)?;
        }
        Ok(())
    }
}

/// Split the `a/x b/y` part of a `diff --git` line.
///
/// Paths may contain spaces, so when both sides name the same file the split
/// is taken at the middle space.
fn split_git_paths(paths: &str) -> (String, String) {
    let mid = paths.len() / 2;
    if paths.len() % 2 == 1 && paths.as_bytes().get(mid) == Some(&b' ') {
        let (source, target) = (&paths[..mid], &paths[mid + 1..]);
        if strip_diff_prefix(source) == strip_diff_prefix(target) {
            return (source.to_string(), target.to_string());
        }
    }

    // Otherwise split before the first space that starts a prefixed path
    let split = paths
        .match_indices(' ')
        .map(|(i, _)| i)
        .find(|&i| !diff_prefix(&paths[i + 1..]).is_empty());

    match split {
        Some(i) => (paths[..i].to_string(), paths[i + 1..].to_string()),
        None => match paths.split_once(' ') {
            Some((source, target)) => (source.to_string(), target.to_string()),
            None => (paths.to_string(), paths.to_string()),
        },
    }
}

/// The `a/`-style prefix of a diff path, or `""` when there is none
fn diff_prefix(path: &str) -> &str {
    match path.as_bytes() {
        [first, b'/', ..] if first.is_ascii_alphabetic() => &path[..2],
        _ => "",
    }
}

fn strip_diff_prefix(path: &str) -> &str {
    &path[diff_prefix(path).len()..]
}

/// Plain `diff -u` appends a tab and a timestamp to `---`/`+++` paths
fn without_timestamp(path: &str) -> &str {
    path.split('\t').next().unwrap_or(path)
}
