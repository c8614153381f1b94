//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`convert`] - File upload and URL conversion
//! - [`stats`] - Usage statistics
//! - [`system`] - Service index, health, OpenAPI, cleanup

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod convert;
mod stats;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use convert::*;
pub use stats::*;
pub use system::*;

// ============================================================================
// Query/Request/Response Types (shared across handlers)
// ============================================================================

/// Query parameters for POST /convert
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConvertQuery {
    /// Sheet name for the generated workbook (default: "Data")
    pub sheet_name: Option<String>,
}

/// Request body for POST /convert-url
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ConvertUrlRequest {
    /// http(s) URL of a JSON or CSV file
    pub url: String,
    /// Sheet name for the generated workbook (default: "Data")
    #[serde(default)]
    pub sheet_name: Option<String>,
}

/// Response for GET /
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ServiceIndex {
    /// Service name
    pub message: String,
    /// Service version
    pub version: String,
    /// Endpoint name to usage summary
    pub endpoints: BTreeMap<String, String>,
}

/// Versions of the components the service depends on
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DependencyVersions {
    /// SQLite library version, or "unavailable" if the stats database cannot be queried
    pub sqlite: String,
    /// Spreadsheet writer library and version
    pub spreadsheet_writer: String,
}

/// Response for GET /health
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// "healthy", or "degraded" when the stats database is unreachable
    pub status: String,
    /// Service version
    pub version: String,
    /// Dependency versions
    pub dependencies: DependencyVersions,
}

/// Response for POST /cleanup
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CleanupResponse {
    /// Always "success"
    pub status: String,
    /// Number of workbooks removed by this call
    pub files_deleted: usize,
}
