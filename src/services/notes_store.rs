// src/services/notes_store.rs

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Reduces a client supplied filename to a safe single path component.
///
/// Keeps only the last path segment, turns whitespace into `_`, drops every
/// character outside `[A-Za-z0-9._-]` and strips leading/trailing dots and
/// underscores. Returns `None` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let spaced = WHITESPACE.replace_all(last.trim(), "_");
    let kept = DISALLOWED.replace_all(&spaced, "");
    let cleaned = kept.trim_matches(|c| c == '.' || c == '_');

    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Uploaded note files on the local filesystem.
#[derive(Debug, Clone)]
pub struct NoteStore {
    root: PathBuf,
}

impl NoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Writes the file, replacing any file of the same name.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        self.ensure_dir().await?;
        let path = self.root.join(filename);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Resolves a requested filename to an existing stored file.
    ///
    /// Names that are not already in sanitized form never resolve, so a
    /// request cannot climb out of the upload directory.
    pub async fn locate(&self, filename: &str) -> Option<PathBuf> {
        if sanitize_filename(filename).as_deref() != Some(filename) {
            return None;
        }
        let path = self.root.join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }

    /// Deletes a stored file. A file that is already gone is not an error.
    /// Returns whether a file was actually removed.
    pub async fn remove(&self, filename: &str) -> std::io::Result<bool> {
        let Some(safe) = sanitize_filename(filename) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(self.root.join(safe)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
