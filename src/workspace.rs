//! Temporary file management
//!
//! Inputs are staged in the upload directory only for the duration of a single
//! conversion; the [`StagedInput`] guard removes the file on every exit path.
//! Generated workbooks are kept in the output directory until
//! [`Workspace::cleanup_outputs`] is called.

use crate::config::StorageConfig;
use crate::error::Result;
use crate::types::FileFormat;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stem used when a filename has nothing usable left after sanitizing
const FALLBACK_STEM: &str = "data";

/// Upload and output directories used by the converter
#[derive(Clone, Debug)]
pub struct Workspace {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl Workspace {
    /// Create a workspace over the given directories (they are not created yet)
    pub fn new(upload_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Workspace for the configured storage locations
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.upload_dir, &config.output_dir)
    }

    /// Directory where inputs are staged
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Directory where workbooks are written
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create both directories if they don't exist
    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    /// Write `content` to a uniquely named input file
    ///
    /// The file is deleted when the returned guard is dropped.
    pub async fn stage_input(&self, content: Vec<u8>, format: FileFormat) -> Result<StagedInput> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let path = self
            .upload_dir
            .join(format!("input_{}.{}", random_token(), format.as_str()));

        let staged = StagedInput { path };
        tokio::fs::write(&staged.path, content).await?;
        tracing::debug!(path = %staged.path.display(), "input staged");
        Ok(staged)
    }

    /// Write a workbook as `<stem>_<token>.xlsx` in the output directory
    pub async fn store_output(&self, stem: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self
            .output_dir
            .join(format!("{}_{}.xlsx", sanitize_stem(stem), random_token()));

        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "output stored");
        Ok(path)
    }

    /// Delete every `.xlsx` file in the output directory
    ///
    /// Returns how many files this call removed. Files removed concurrently by
    /// someone else and a missing directory are not errors.
    pub async fn cleanup_outputs(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut deleted = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_workbook = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
            if !is_workbook {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to delete output file");
                }
            }
        }

        tracing::info!(files_deleted = deleted, "output directory cleaned");
        Ok(deleted)
    }
}

/// An input file that is removed when dropped
#[derive(Debug)]
pub struct StagedInput {
    path: PathBuf,
}

impl StagedInput {
    /// Location of the staged file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedInput {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "staged input removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove staged input")
            }
        }
    }
}

/// Reduce a client-supplied filename to a safe file stem
///
/// Directory components and the extension are dropped; characters other than
/// letters, digits, `-`, `_`, `.` and spaces become `_`.
///
/// ```
/// use konversi_data::workspace::sanitize_stem;
///
/// assert_eq!(sanitize_stem("../../etc/laporan 2024.csv"), "laporan 2024");
/// assert_eq!(sanitize_stem("C:\\data\\penjualan.json"), "penjualan");
/// ```
pub fn sanitize_stem(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.');

    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}

/// 128 random bits as lowercase hex
pub fn random_token() -> String {
    format!("{:032x}", rand::random::<u128>())
}
