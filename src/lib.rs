//! # konversi-data
//!
//! HTTP service that turns JSON and CSV data into Excel (xlsx) workbooks.
//!
//! Input arrives either as a multipart upload or as a URL the service downloads
//! itself. Downloaded content is classified by URL suffix, then `Content-Type`,
//! then by sniffing the body. Every input is loaded into a typed [`table::Table`]
//! before it is written out as a single-sheet workbook. Successful conversions
//! are counted in a SQLite database and exposed through `GET /stats`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use konversi_data::{AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::from_config(Config::default()).await?;
//!
//!     // Serve until SIGTERM/SIGINT
//!     konversi_data::api::start_api_server(state).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! The pipeline can also be driven without HTTP:
//!
//! ```no_run
//! use konversi_data::{table, spreadsheet, FileFormat};
//!
//! # fn main() -> konversi_data::Result<()> {
//! let table = table::load(b"kota,populasi\nBandung,2500000\n", FileFormat::Csv)?;
//! let xlsx = spreadsheet::encode(&table, "Data")?;
//! assert_eq!(&xlsx[..2], b"PK");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Input format classification
pub mod classify;
/// Configuration types
pub mod config;
/// Conversion pipeline
pub mod convert;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Remote file fetching
pub mod fetch;
/// Spreadsheet encoding
pub mod spreadsheet;
/// Usage statistics seam
pub mod stats;
/// Tabular loading and type inference
pub mod table;
/// Core types
pub mod types;
/// Temporary file management
pub mod workspace;

// Re-export commonly used types
pub use api::AppState;
pub use config::{Config, Locale};
pub use convert::Converter;
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, FetchError, Result, ToHttpStatus};
pub use fetch::RemoteFetcher;
pub use stats::StatsStore;
pub use types::{ConversionType, ConvertedFile, FileFormat, StatsSnapshot};
pub use workspace::Workspace;

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub(crate) async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
