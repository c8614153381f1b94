//! Format classification for fetched content
//!
//! Remote content is often mislabeled, so the format is decided by three tiers
//! tried strictly in order, each less reliable than the one before:
//!
//! 1. the `.json` / `.csv` suffix of the URL path (query string ignored)
//! 2. the declared `Content-Type` header
//! 3. sniffing the first bytes of the body
//!
//! The first tier that produces an answer wins.

use crate::error::{Error, Result};
use crate::types::{ClassificationTier, FileFormat};

/// Number of leading bytes inspected when sniffing content
pub const SNIFF_SAMPLE_BYTES: usize = 1000;

/// Outcome of classifying a piece of content
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    /// Detected format
    pub format: FileFormat,
    /// Tier that made the decision
    pub tier: ClassificationTier,
}

/// Classify `content` fetched from `url`
///
/// Returns [`Error::UnknownFormat`] if no tier produces an answer.
pub fn classify(url: &str, content_type: Option<&str>, content: &[u8]) -> Result<Classification> {
    if let Some(format) = from_url(url) {
        tracing::info!(format = %format, "detected format from URL extension");
        return Ok(Classification {
            format,
            tier: ClassificationTier::UrlSuffix,
        });
    }

    if let Some(format) = content_type.and_then(from_content_type) {
        tracing::info!(format = %format, content_type = ?content_type, "detected format from Content-Type");
        return Ok(Classification {
            format,
            tier: ClassificationTier::ContentType,
        });
    }

    if let Some(format) = from_content(content) {
        tracing::info!(format = %format, "detected format from content analysis");
        return Ok(Classification {
            format,
            tier: ClassificationTier::ContentSniffing,
        });
    }

    tracing::warn!(url, content_type = ?content_type, "unable to detect file format");
    Err(Error::UnknownFormat {
        url: url.to_string(),
    })
}

/// Tier 1: case-insensitive `.json` / `.csv` suffix, ignoring query and fragment
pub fn from_url(url: &str) -> Option<FileFormat> {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();

    if path.ends_with(".json") {
        Some(FileFormat::Json)
    } else if path.ends_with(".csv") {
        Some(FileFormat::Csv)
    } else {
        None
    }
}

/// Tier 2: case-insensitive substring match on the declared content type
pub fn from_content_type(content_type: &str) -> Option<FileFormat> {
    let ct = content_type.to_ascii_lowercase();

    if ct.contains("json") {
        Some(FileFormat::Json)
    } else if ct.contains("csv") {
        Some(FileFormat::Csv)
    } else {
        None
    }
}

/// Tier 3: inspect the leading bytes of the content
///
/// Content opening with `{` or `[` is JSON only if the complete content parses
/// (as one document or as JSON lines). Otherwise a comma in the sample means CSV.
pub fn from_content(content: &[u8]) -> Option<FileFormat> {
    let sample_len = content.len().min(SNIFF_SAMPLE_BYTES);
    let sample = String::from_utf8_lossy(&content[..sample_len]);
    let sample = sample.trim_start_matches('\u{feff}').trim();

    let opens_json = sample.starts_with('{') || sample.starts_with('[');
    if opens_json {
        if parses_as_json(content) {
            return Some(FileFormat::Json);
        }
        tracing::debug!("content looks like JSON but does not parse");
        return None;
    }

    if sample.contains(',') {
        return Some(FileFormat::Csv);
    }

    None
}

fn parses_as_json(content: &[u8]) -> bool {
    let content = content.strip_prefix(b"\xef\xbb\xbf").unwrap_or(content);

    if serde_json::from_slice::<serde::de::IgnoredAny>(content).is_ok() {
        return true;
    }

    // JSON lines: every non-blank line must be a document of its own
    let mut lines = content
        .split(|b| *b == b'\n')
        .map(|line| line.trim_ascii())
        .filter(|line| !line.is_empty())
        .peekable();
    lines.peek().is_some()
        && lines.all(|line| serde_json::from_slice::<serde::de::IgnoredAny>(line).is_ok())
}
