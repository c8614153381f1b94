//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the konversi-data REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the konversi-data REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (when enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Konversi Data API",
        version = "1.0.0",
        description = "Converts JSON and CSV files, uploaded or fetched from a URL, into Excel workbooks",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Conversion
        crate::api::routes::convert_file,
        crate::api::routes::convert_url,

        // Statistics
        crate::api::routes::get_stats,

        // System
        crate::api::routes::root,
        crate::api::routes::health_check,
        crate::api::routes::cleanup,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Statistics types from types.rs
        crate::types::StatsSnapshot,
        crate::types::ConversionTypeStats,
        crate::types::FormatStats,
        crate::types::TodayStats,
        crate::types::DailyStats,

        // API request/response types from routes
        crate::api::routes::ConvertQuery,
        crate::api::routes::ConvertUrlRequest,
        crate::api::routes::ServiceIndex,
        crate::api::routes::HealthResponse,
        crate::api::routes::DependencyVersions,
        crate::api::routes::CleanupResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "convert", description = "Conversion - Turn uploaded or remote JSON/CSV files into xlsx workbooks"),
        (name = "stats", description = "Statistics - Conversion counters by type, format and day"),
        (name = "system", description = "System endpoints - Service index, health check, output cleanup, OpenAPI spec"),
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_has_paths() {
        let spec = ApiDoc::openapi();

        for path in ["/", "/convert", "/convert-url", "/stats", "/health", "/cleanup"] {
            assert!(
                spec.paths.paths.contains_key(path),
                "OpenAPI spec should document {}",
                path
            );
        }
    }

    #[test]
    fn test_openapi_spec_has_components() {
        let spec = ApiDoc::openapi();

        let components = spec.components.expect("components should be defined");
        assert!(components.schemas.contains_key("StatsSnapshot"));
        assert!(components.schemas.contains_key("ConvertUrlRequest"));
        assert!(components.schemas.contains_key("ApiError"));
    }

    #[test]
    fn test_openapi_spec_has_tags() {
        let spec = ApiDoc::openapi();

        let tags = spec.tags.expect("tags should be defined");
        let tag_names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, vec!["convert", "stats", "system"]);
    }

    #[test]
    fn test_openapi_spec_info() {
        let spec = ApiDoc::openapi();

        assert_eq!(spec.info.title, "Konversi Data API");
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert!(spec.info.description.is_some());
    }

    #[test]
    fn test_openapi_spec_version() {
        let spec = ApiDoc::openapi();

        let json = serde_json::to_value(&spec).expect("Should serialize to JSON");
        let version = json.get("openapi").and_then(|v| v.as_str());
        assert!(
            version.unwrap().starts_with("3."),
            "Should use OpenAPI 3.x version"
        );
    }
}
