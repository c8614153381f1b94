//! System handlers: service index, health, cleanup, OpenAPI.

use super::{CleanupResponse, DependencyVersions, HealthResponse, ServiceIndex};
use crate::api::AppState;
use crate::api::error_response::localized;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;

/// Name reported by the service index
pub const SERVICE_NAME: &str = "Konversi Data API";

/// GET / - Service name, version and endpoint summary
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service index", body = ServiceIndex)
    )
)]
pub async fn root() -> Json<ServiceIndex> {
    let endpoints = [
        ("convert", "POST /convert - Upload file JSON/CSV untuk dikonversi ke Excel"),
        ("convert-url", "POST /convert-url - Konversi file JSON/CSV dari URL ke Excel"),
        ("stats", "GET /stats - Statistik konversi"),
        ("health", "GET /health - Status layanan"),
        ("cleanup", "POST /cleanup - Hapus file hasil konversi"),
    ]
    .into_iter()
    .map(|(name, usage)| (name.to_string(), usage.to_string()))
    .collect::<BTreeMap<_, _>>();

    Json(ServiceIndex {
        message: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service status and dependency versions", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, sqlite) = match state.stats.backend_version().await {
        Ok(version) => ("healthy", version),
        Err(e) => {
            tracing::warn!(error = %e, "stats database unavailable during health check");
            ("degraded", "unavailable".to_string())
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dependencies: DependencyVersions {
            sqlite,
            spreadsheet_writer: crate::spreadsheet::WRITER_VERSION.to_string(),
        },
    })
}

/// POST /cleanup - Delete generated workbooks
#[utoipa::path(
    post,
    path = "/cleanup",
    tag = "system",
    responses(
        (status = 200, description = "Number of workbooks deleted by this call", body = CleanupResponse),
        (status = 500, description = "Output directory could not be read", body = crate::error::ApiError)
    )
)]
pub async fn cleanup(State(state): State<AppState>) -> Response {
    match state.converter.workspace().cleanup_outputs().await {
        Ok(files_deleted) => Json(CleanupResponse {
            status: "success".to_string(),
            files_deleted,
        })
        .into_response(),
        Err(e) => localized(e, state.config.locale),
    }
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}
