//! Usage statistics recording
//!
//! The conversion pipeline only talks to the [`StatsStore`] trait, so the HTTP
//! layer can be exercised against any backend. [`Database`] is the SQLite
//! implementation used in production.

use crate::db::Database;
use crate::error::Result;
use crate::types::{ConversionEvent, StatsSnapshot};
use async_trait::async_trait;

/// Persistent store for conversion counters
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Record one finished conversion
    async fn record(&self, event: &ConversionEvent) -> Result<()>;

    /// Aggregated counters for `GET /stats`
    async fn query(&self) -> Result<StatsSnapshot>;

    /// Version of the storage backend, reported by `GET /health`
    async fn backend_version(&self) -> Result<String>;
}

#[async_trait]
impl StatsStore for Database {
    async fn record(&self, event: &ConversionEvent) -> Result<()> {
        self.record_conversion(event).await
    }

    async fn query(&self) -> Result<StatsSnapshot> {
        self.query_stats().await
    }

    async fn backend_version(&self) -> Result<String> {
        self.sqlite_version().await
    }
}
