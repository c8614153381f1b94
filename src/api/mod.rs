//! REST API server module
//!
//! Provides an OpenAPI 3.1 compliant REST API for converting JSON and CSV
//! files to xlsx workbooks and reading conversion statistics.

use crate::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod body_limit;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Conversion
/// - `POST /convert` - Convert an uploaded JSON/CSV file (multipart `file`, optional `sheet_name`)
/// - `POST /convert-url` - Download a JSON/CSV file and convert it
///
/// ## Statistics
/// - `GET /stats` - Conversion counters
///
/// ## System
/// - `GET /` - Service index
/// - `GET /health` - Health check
/// - `POST /cleanup` - Delete generated workbooks
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Conversion
        .route("/convert", post(routes::convert_file))
        .route("/convert-url", post(routes::convert_url))
        // Statistics
        .route("/stats", get(routes::get_stats))
        // System
        .route("/", get(routes::root))
        .route("/health", get(routes::health_check))
        .route("/cleanup", post(routes::cleanup))
        .route("/openapi.json", get(routes::openapi_spec));

    // Merge Swagger UI routes if enabled in config (before applying state).
    // The UI serves its own copy of the document so it cannot clash with /openapi.json.
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    // Middleware layer ordering: the LAST layer applied is the OUTERMOST.
    //   Request → CORS → Trace → Size guard → Body limit → Handler
    let max_bytes = config.api.max_upload_bytes;
    let router = router
        .layer(DefaultBodyLimit::max(
            usize::try_from(max_bytes).unwrap_or(usize::MAX),
        ))
        .layer(middleware::from_fn_with_state(
            body_limit::BodyLimit {
                max_bytes,
                locale: config.locale,
            },
            body_limit::reject_oversized_body,
        ))
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// # Arguments
///
/// * `origins` - List of allowed origins (supports "*" for any origin)
///
/// # Returns
///
/// A configured CorsLayer that allows the specified origins, all methods,
/// and all headers for cross-origin requests.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until SIGTERM/SIGINT (Ctrl+C on other platforms), then lets in-flight
/// requests finish before returning.
///
/// # Example
///
/// ```no_run
/// use konversi_data::{AppState, Config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let state = AppState::from_config(Config::default()).await?;
///
/// // Start API server (blocks until shutdown)
/// konversi_data::api::start_api_server(state).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(state: AppState) -> Result<()> {
    serve(state, crate::wait_for_signal()).await
}

/// Serve the API until `shutdown` resolves
pub async fn serve(
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let bind_address = state.config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(state);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    let local_address = listener.local_addr().map_err(crate::error::Error::Io)?;
    tracing::info!(
        address = %local_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
