//! Writing chunks to a stream or to one file per chunk.
//!
//! Stream output wraps every chunk in a start and an end banner carrying its
//! 1-based index, so a reader can tell where one chunk stops:
//!
//! ```text
//! <<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<< START CHUNK: [001]
//! diff --git a/src/lib.rs b/src/lib.rs
//! ...
//! >>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>> END CHUNK: [001]
//! ```
//!
//! Split output writes each chunk without banners to `<prefix>_<NNN>.diff`.

use crate::chunk::Chunk;
use error_set::error_set;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Width of the `<` and `>` runs in chunk banners
pub const BANNER_WIDTH: usize = 50;

error_set! {
    /// Errors from writing chunk output
    WriteError := {
        #[display("Failed to write chunk output: {message}")]
        StreamFailed { message: String },
        #[display("Failed to create output directory {path}: {message}")]
        CreateDirFailed { path: String, message: String },
        #[display("Failed to write {path}: {message}")]
        WriteFileFailed { path: String, message: String },
        #[display("Failed to create temporary directory: {message}")]
        TempDirFailed { message: String },
    }
}

/// Write every chunk to `out` between numbered banners.
///
/// Returns the number of chunks written.
pub fn write_stream<'a, W: Write>(
    out: &mut W,
    chunks: impl IntoIterator<Item = Chunk<'a>>,
) -> Result<usize, WriteError> {
    let mut written = 0;
    for (i, chunk) in chunks.into_iter().enumerate() {
        let index = i + 1;
        write_banner(out, '<', "START", index)?;
        write!(out, "{}", chunk).map_err(stream_error)?;
        write_banner(out, '>', "END", index)?;
        written = index;
    }
    out.flush().map_err(stream_error)?;
    Ok(written)
}

fn write_banner<W: Write>(
    out: &mut W,
    mark: char,
    label: &str,
    index: usize,
) -> Result<(), WriteError> {
    let run: String = std::iter::repeat_n(mark, BANNER_WIDTH).collect();
    writeln!(out, "{run} {label} CHUNK: [{index:03}]").map_err(stream_error)
}

fn stream_error(e: std::io::Error) -> WriteError {
    WriteError::StreamFailed {
        message: e.to_string(),
    }
}

/// File name for the chunk at 1-based `index`
pub fn chunk_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}_{index:03}.diff")
}

/// Write each chunk to its own file in `dir`, creating `dir` if needed.
///
/// Returns the written paths in chunk order.
pub fn write_split<'a>(
    dir: &Path,
    prefix: &str,
    chunks: impl IntoIterator<Item = Chunk<'a>>,
) -> Result<Vec<PathBuf>, WriteError> {
    fs::create_dir_all(dir).map_err(|e| WriteError::CreateDirFailed {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for (i, chunk) in chunks.into_iter().enumerate() {
        let path = dir.join(chunk_file_name(prefix, i + 1));
        fs::write(&path, chunk.to_string()).map_err(|e| WriteError::WriteFileFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), files = chunk.files.len(), "wrote chunk");
        paths.push(path);
    }

    Ok(paths)
}

/// Create a fresh `diffalump-*` directory under the system temp dir.
///
/// The directory is kept after the process exits so the chunks can be read.
pub fn temp_output_dir() -> Result<PathBuf, WriteError> {
    tempfile::Builder::new()
        .prefix("diffalump-")
        .tempdir()
        .map(tempfile::TempDir::keep)
        .map_err(|e| WriteError::TempDirFailed {
            message: e.to_string(),
        })
}
