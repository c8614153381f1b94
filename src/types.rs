//! Core types for konversi-data

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Tabular input format accepted by the converter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// JSON array of objects, single object, or newline-delimited JSON
    Json,
    /// Delimiter-separated values with a header row
    Csv,
}

impl FileFormat {
    /// Lowercase name, also used as the file extension and the stored format label
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Csv => "csv",
        }
    }

    /// Parse a file extension (case-insensitive, without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("json") {
            Some(FileFormat::Json)
        } else if ext.eq_ignore_ascii_case("csv") {
            Some(FileFormat::Csv)
        } else {
            None
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the input reached the service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConversionType {
    /// Multipart file upload (`POST /convert`)
    FileUpload,
    /// Remote URL fetch (`POST /convert-url`)
    UrlConversion,
}

impl ConversionType {
    /// Label stored in the conversion log
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionType::FileUpload => "file_upload",
            ConversionType::UrlConversion => "url_conversion",
        }
    }
}

/// Which classification tier decided the format of fetched content
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationTier {
    /// `.json` / `.csv` suffix on the URL path
    UrlSuffix,
    /// Declared `Content-Type` response header
    ContentType,
    /// Heuristic inspection of the body
    ContentSniffing,
}

/// A single conversion outcome handed to the stats store
#[derive(Clone, Debug)]
pub struct ConversionEvent {
    /// Upload or URL conversion
    pub conversion_type: ConversionType,
    /// Input format
    pub file_format: FileFormat,
    /// Whether the conversion succeeded
    pub success: bool,
    /// When the conversion finished
    pub timestamp: DateTime<Local>,
}

impl ConversionEvent {
    /// A successful conversion that finished now
    pub fn success(conversion_type: ConversionType, file_format: FileFormat) -> Self {
        Self {
            conversion_type,
            file_format,
            success: true,
            timestamp: Local::now(),
        }
    }
}

/// Conversion counts by how the input arrived
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConversionTypeStats {
    /// Successful file uploads
    pub file_upload: i64,
    /// Successful URL conversions
    pub url_conversion: i64,
}

/// Conversion counts by input format
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FormatStats {
    /// Successful JSON conversions
    pub json: i64,
    /// Successful CSV conversions
    pub csv: i64,
}

/// Counters for a single calendar day
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyStats {
    /// Local date (`YYYY-MM-DD`)
    pub date: String,
    /// All conversions that day
    pub total: i64,
    /// File uploads that day
    pub file_upload: i64,
    /// URL conversions that day
    pub url_conversion: i64,
}

/// Today's counters (the date is implied)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TodayStats {
    /// All conversions today
    pub total: i64,
    /// File uploads today
    pub file_upload: i64,
    /// URL conversions today
    pub url_conversion: i64,
}

/// Aggregated usage statistics returned by `GET /stats`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatsSnapshot {
    /// All successful conversions ever recorded
    pub total_conversions: i64,
    /// Breakdown by conversion type
    pub by_type: ConversionTypeStats,
    /// Breakdown by input format
    pub by_format: FormatStats,
    /// Counters for the current local date
    pub today: TodayStats,
    /// Up to seven most recent daily rows, newest first
    pub last_7_days: Vec<DailyStats>,
}

/// A finished conversion ready to be sent back to the caller
#[derive(Clone, Debug)]
pub struct ConvertedFile {
    /// Filename suggested to the client in `Content-Disposition`
    pub download_name: String,
    /// Where the workbook was written inside the output directory
    pub path: PathBuf,
    /// Input format
    pub format: FileFormat,
    /// Number of data rows written
    pub rows: usize,
    /// Number of columns written
    pub columns: usize,
    /// The encoded workbook
    pub bytes: Vec<u8>,
}
