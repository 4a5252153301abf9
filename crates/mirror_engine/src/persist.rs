use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use url::Url;

/// File name a URL path ending in `/` is mirrored to.
pub const DIRECTORY_INDEX: &str = "index.html";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Maps a URL onto the local output root, segment by segment.
///
/// A path ending in `/` (or an empty path) lands on `index.html` inside the
/// corresponding directory. A query string is folded into the file name as a
/// short hash so distinct variants of one path get distinct files.
pub fn local_path_for(root: &Path, url: &Url) -> PathBuf {
    let mut target = root.to_path_buf();
    let mut filename = DIRECTORY_INDEX.to_string();

    if let Some(segments) = url.path_segments() {
        let segments: Vec<&str> = segments.collect();
        if let Some((last, dirs)) = segments.split_last() {
            for dir in dirs {
                if !dir.is_empty() {
                    target.push(dir);
                }
            }
            if !last.is_empty() {
                filename = (*last).to_string();
            }
        }
    }

    if let Some(query) = url.query() {
        filename = query_variant(&filename, query);
    }
    target.push(filename);
    target
}

/// Atomically mirrors raw response bytes under a fixed output root.
#[derive(Debug, Clone)]
pub struct MirrorWriter {
    root: PathBuf,
}

impl MirrorWriter {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` to the mirrored path for `url`, creating intermediate
    /// directories. Writes a temp file then renames, so readers never observe
    /// a partial file.
    pub fn write(&self, url: &Url, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let target = local_path_for(&self.root, url);
        let parent = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Replace existing file if present to keep determinism.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

fn query_variant(filename: &str, query: &str) -> String {
    let hash = short_hash(query);
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}--{hash}.{ext}"),
        _ => format!("{filename}--{hash}"),
    }
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
