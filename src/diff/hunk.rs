use super::{ParseError, split_lines};
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::u32 as number,
    combinator::opt,
    sequence::preceded,
};
use std::fmt;

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Which side of the diff a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Added,
    Removed,
    Context,
}

impl LineKind {
    fn prefix(self) -> char {
        match self {
            LineKind::Added => '+',
            LineKind::Removed => '-',
            LineKind::Context => ' ',
        }
    }
}

/// A single line inside a hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub content: String,
    /// Followed by `\ No newline at end of file`
    pub missing_final_newline: bool,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{}", self.kind.prefix(), self.content)?;
        if self.missing_final_newline {
            writeln!(f, "{NO_NEWLINE_MARKER}")?;
        }
        Ok(())
    }
}

/// Line range from one side of a hunk header (`-start,len` or `+start,len`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: u32,
    pub len: u32,
}

impl fmt::Display for HunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // git leaves out the length when it is 1
        match self.len {
            1 => write!(f, "{}", self.start),
            n => write!(f, "{},{}", self.start, n),
        }
    }
}

/// One contiguous change region of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub source: HunkRange,
    pub target: HunkRange,
    /// Function or section heading git prints after the closing `@@`
    pub section: String,
    pub lines: Vec<Line>,
}

impl Hunk {
    /// Parse a hunk from diff text (header + content lines).
    ///
    /// The body must contain exactly the number of old and new lines the
    /// header announces. Blank lines after the body are tolerated.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut lines = split_lines(text);

        let header = lines.next().unwrap_or_default();
        let (source, target, section) = parse_header(header)?;

        let mut old_left = source.len;
        let mut new_left = target.len;
        let mut body: Vec<Line> = Vec::new();

        for line in lines {
            if line.starts_with(NO_NEWLINE_MARKER) {
                if let Some(last) = body.last_mut() {
                    last.missing_final_newline = true;
                }
                continue;
            }

            if old_left == 0 && new_left == 0 {
                if line.trim().is_empty() {
                    continue;
                }
                // A diff line past the announced counts means the header is short
                if matches!(line.as_bytes().first(), Some(b'+' | b'-' | b' ')) {
                    return Err(ParseError::HunkLengthMismatch {
                        header: header.to_string(),
                    });
                }
                return Err(ParseError::UnexpectedLine {
                    line: line.to_string(),
                });
            }

            let kind = match line.as_bytes().first() {
                Some(b'+') => LineKind::Added,
                Some(b'-') => LineKind::Removed,
                // Some tools strip the leading space of empty context lines
                Some(b' ') | None => LineKind::Context,
                Some(_) => {
                    return Err(ParseError::UnexpectedLine {
                        line: line.to_string(),
                    });
                }
            };

            let consumed = match kind {
                LineKind::Added => consume(&mut new_left),
                LineKind::Removed => consume(&mut old_left),
                LineKind::Context => consume(&mut old_left) && consume(&mut new_left),
            };
            if !consumed {
                return Err(ParseError::HunkLengthMismatch {
                    header: header.to_string(),
                });
            }

            body.push(Line {
                kind,
                content: line.get(1..).unwrap_or_default().to_string(),
                missing_final_newline: false,
            });
        }

        if old_left != 0 || new_left != 0 {
            return Err(ParseError::HunkLengthMismatch {
                header: header.to_string(),
            });
        }

        Ok(Hunk {
            source,
            target,
            section,
            lines: body,
        })
    }

    /// Number of added lines
    #[must_use]
    pub fn added(&self) -> usize {
        self.count(LineKind::Added)
    }

    /// Number of removed lines
    #[must_use]
    pub fn removed(&self) -> usize {
        self.count(LineKind::Removed)
    }

    /// Review size of the hunk: the larger of its added and removed line counts.
    ///
    /// Replacing N lines with N lines counts as N, not 2N.
    #[must_use]
    pub fn size(&self) -> usize {
        self.added().max(self.removed())
    }

    fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|line| line.kind == kind).count()
    }
}

fn consume(left: &mut u32) -> bool {
    match left.checked_sub(1) {
        Some(n) => {
            *left = n;
            true
        }
        None => false,
    }
}

/// `start` or `start,len`
fn range(input: &str) -> IResult<&str, HunkRange> {
    let (input, start) = number(input)?;
    let (input, len) = opt(preceded(tag(","), number)).parse(input)?;
    Ok((
        input,
        HunkRange {
            start,
            len: len.unwrap_or(1),
        },
    ))
}

/// `@@ -start[,len] +start[,len] @@`
fn ranges(input: &str) -> IResult<&str, (HunkRange, HunkRange)> {
    let (input, _) = tag("@@ -").parse(input)?;
    let (input, source) = range(input)?;
    let (input, _) = tag(" +").parse(input)?;
    let (input, target) = range(input)?;
    let (input, _) = tag(" @@").parse(input)?;
    Ok((input, (source, target)))
}

/// Parse a hunk header into its two ranges and the trailing section heading
fn parse_header(header: &str) -> Result<(HunkRange, HunkRange, String), ParseError> {
    let (rest, (source, target)) = ranges(header).map_err(|_| ParseError::InvalidHunkHeader {
        line: header.to_string(),
    })?;
    let section = rest.strip_prefix(' ').unwrap_or(rest).to_string();
    Ok((source, target, section))
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@@ -{} +{} @@", self.source, self.target)?;
        if self.section.is_empty() {
            writeln!(f)?;
        } else {
            writeln!(f, " {}", self.section)?;
        }

        for line in &self.lines {
            write!(f, "{}", line)?;
        }

        Ok(())
    }
}
