//! Database layer for konversi-data
//!
//! Handles SQLite persistence for conversion statistics.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`stats`] - Conversion log and daily counters

use sqlx::{FromRow, sqlite::SqlitePool};
use tokio::sync::Mutex;

mod migrations;
mod stats;

/// Daily counter row from database
#[derive(Debug, Clone, FromRow)]
pub struct DailyStatsRow {
    /// Local date (`YYYY-MM-DD`)
    pub date: String,
    /// All successful conversions that day
    pub total_conversions: i64,
    /// Successful file uploads that day
    pub file_upload_count: i64,
    /// Successful URL conversions that day
    pub url_conversion_count: i64,
}

impl From<DailyStatsRow> for crate::types::DailyStats {
    fn from(row: DailyStatsRow) -> Self {
        crate::types::DailyStats {
            date: row.date,
            total: row.total_conversions,
            file_upload: row.file_upload_count,
            url_conversion: row.url_conversion_count,
        }
    }
}

/// Database handle for konversi-data
pub struct Database {
    pool: SqlitePool,
    /// Serializes writers so concurrent conversions never race on the daily upsert
    write_lock: Mutex<()>,
}
