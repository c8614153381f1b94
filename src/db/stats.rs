//! Conversion log and daily counter operations.

use crate::types::{
    ConversionEvent, ConversionType, ConversionTypeStats, DailyStats, FormatStats, StatsSnapshot,
    TodayStats,
};
use crate::{Error, Result};
use chrono::{Local, NaiveDate};

use super::{Database, DailyStatsRow};

/// Number of daily rows returned in a snapshot
const RECENT_DAYS: i64 = 7;

impl Database {
    /// Append a conversion to the log and bump the counters for its day
    ///
    /// Both writes happen in one transaction. Failed conversions are logged but
    /// leave the daily counters untouched.
    pub async fn record_conversion(&self, event: &ConversionEvent) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(Error::Sqlx)?;

        sqlx::query(
            r#"
            INSERT INTO conversion_stats (conversion_type, file_format, timestamp, success)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(event.conversion_type.as_str())
        .bind(event.file_format.as_str())
        .bind(event.timestamp.to_rfc3339())
        .bind(event.success)
        .execute(&mut *tx)
        .await
        .map_err(Error::Sqlx)?;

        if event.success {
            let (uploads, urls) = match event.conversion_type {
                ConversionType::FileUpload => (1, 0),
                ConversionType::UrlConversion => (0, 1),
            };

            sqlx::query(
                r#"
                INSERT INTO daily_stats (date, total_conversions, file_upload_count, url_conversion_count)
                VALUES (?, 1, ?, ?)
                ON CONFLICT(date) DO UPDATE SET
                    total_conversions = total_conversions + 1,
                    file_upload_count = file_upload_count + excluded.file_upload_count,
                    url_conversion_count = url_conversion_count + excluded.url_conversion_count
                "#,
            )
            .bind(day_key(event.timestamp.date_naive()))
            .bind(uploads)
            .bind(urls)
            .execute(&mut *tx)
            .await
            .map_err(Error::Sqlx)?;
        }

        tx.commit().await.map_err(Error::Sqlx)?;

        tracing::debug!(
            conversion_type = event.conversion_type.as_str(),
            file_format = event.file_format.as_str(),
            success = event.success,
            "conversion recorded"
        );
        Ok(())
    }

    /// Aggregate statistics with "today" taken from the local clock
    pub async fn query_stats(&self) -> Result<StatsSnapshot> {
        self.query_stats_on(Local::now().date_naive()).await
    }

    /// Aggregate statistics with `today` as the current date
    pub async fn query_stats_on(&self, today: NaiveDate) -> Result<StatsSnapshot> {
        let total_conversions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM conversion_stats WHERE success = 1")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Sqlx)?;

        let mut by_type = ConversionTypeStats::default();
        let type_counts: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT conversion_type, COUNT(*) FROM conversion_stats
            WHERE success = 1
            GROUP BY conversion_type
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;
        for (label, count) in type_counts {
            match label.as_str() {
                "file_upload" => by_type.file_upload = count,
                "url_conversion" => by_type.url_conversion = count,
                other => tracing::warn!(conversion_type = other, "unknown conversion type in stats"),
            }
        }

        let mut by_format = FormatStats::default();
        let format_counts: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT file_format, COUNT(*) FROM conversion_stats
            WHERE success = 1
            GROUP BY file_format
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?;
        for (label, count) in format_counts {
            match label.as_str() {
                "json" => by_format.json = count,
                "csv" => by_format.csv = count,
                other => tracing::warn!(file_format = other, "unknown file format in stats"),
            }
        }

        let today = sqlx::query_as::<_, DailyStatsRow>(
            r#"
            SELECT date, total_conversions, file_upload_count, url_conversion_count
            FROM daily_stats
            WHERE date = ?
            "#,
        )
        .bind(day_key(today))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)?
        .map(|row| TodayStats {
            total: row.total_conversions,
            file_upload: row.file_upload_count,
            url_conversion: row.url_conversion_count,
        })
        .unwrap_or_default();

        let last_7_days = sqlx::query_as::<_, DailyStatsRow>(
            r#"
            SELECT date, total_conversions, file_upload_count, url_conversion_count
            FROM daily_stats
            ORDER BY date DESC
            LIMIT ?
            "#,
        )
        .bind(RECENT_DAYS)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)?
        .into_iter()
        .map(DailyStats::from)
        .collect();

        Ok(StatsSnapshot {
            total_conversions,
            by_type,
            by_format,
            today,
            last_7_days,
        })
    }

    /// Version string of the SQLite library in use
    pub async fn sqlite_version(&self) -> Result<String> {
        sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)
    }
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
