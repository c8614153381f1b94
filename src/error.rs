//! Error types for konversi-data
//!
//! This module provides error handling for the conversion pipeline, including:
//! - Stage-specific error types (fetch, parse, database)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//! - Locale-aware user-facing messages

use crate::config::Locale;
use crate::types::FileFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for konversi-data operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for konversi-data
///
/// Each stage of a conversion (fetch, classify, load, encode) fails with its own
/// variant so the API layer can translate it into the right status code and message.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "bind_address")
        key: Option<String>,
    },

    /// Invalid request input (missing file, bad filename, unsupported extension)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The upload has no usable filename
    #[error("missing or invalid filename")]
    InvalidFilename,

    /// The uploaded file's extension is not `.json` or `.csv`
    #[error("unsupported file type: {filename}")]
    UnsupportedExtension {
        /// The rejected filename
        filename: String,
    },

    /// The uploaded or downloaded content was empty
    #[error("empty content: {0}")]
    EmptyContent(String),

    /// Request body exceeds the configured size limit
    #[error("payload too large: body exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Declared size of the request body, if the client sent one
        size: Option<u64>,
        /// Configured maximum
        limit: u64,
    },

    /// Fetching the remote file failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// None of the classification tiers could determine the file format
    #[error("unable to detect file format for {url}")]
    UnknownFormat {
        /// The URL whose content could not be classified
        url: String,
    },

    /// The content could not be parsed as the classified format
    #[error("failed to parse {format} content: {message}")]
    Parse {
        /// Format the content was parsed as
        format: FileFormat,
        /// Parser-specific detail
        message: String,
    },

    /// The parsed table contains no data rows
    #[error("{format} content contains no data rows")]
    EmptyTable {
        /// Format of the empty input
        format: FileFormat,
    },

    /// The requested sheet name is not valid for a spreadsheet
    #[error("invalid sheet name '{name}': {reason}")]
    InvalidSheetName {
        /// The rejected sheet name
        name: String,
        /// Why the name was rejected
        reason: String,
    },

    /// Writing the spreadsheet failed
    #[error("spreadsheet encoding failed: {0}")]
    Encode(String),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors raised while fetching a remote file
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote server answered 403 Forbidden
    #[error("access denied (HTTP 403) for {url}")]
    AccessDenied {
        /// The requested URL
        url: String,
    },

    /// The remote server answered 404 Not Found
    #[error("not found (HTTP 404) for {url}")]
    NotFound {
        /// The requested URL
        url: String,
    },

    /// Any other non-success HTTP status
    #[error("HTTP {status} for {url}")]
    Status {
        /// The requested URL
        url: String,
        /// HTTP status code returned by the server
        status: u16,
    },

    /// DNS, TLS, connection, timeout or body read failure
    #[error("request to {url} failed: {reason}")]
    Network {
        /// The requested URL
        url: String,
        /// Underlying client error
        reason: String,
    },

    /// The response body exceeds the configured maximum
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge {
        /// The requested URL
        url: String,
        /// Configured maximum body size
        limit: u64,
    },
}

impl FetchError {
    /// HTTP status returned by the remote server, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::AccessDenied { .. } => Some(403),
            FetchError::NotFound { .. } => Some(404),
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Network { .. } | FetchError::TooLarge { .. } => None,
        }
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "access_denied",
///     "message": "Access denied (403 Forbidden). The server blocked the request.",
///     "details": {
///       "status": 403
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "parse_error", "access_denied")
    pub code: String,

    /// Human-readable error message in the configured locale
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Build the API error for `error`, with the message rendered in `locale`
    pub fn from_error(error: &Error, locale: Locale) -> Self {
        let details = match error {
            Error::Fetch(e) => e.status().map(|status| serde_json::json!({ "status": status })),
            Error::Parse { format, .. } | Error::EmptyTable { format } => {
                Some(serde_json::json!({ "format": format.as_str() }))
            }
            Error::InvalidSheetName { name, .. } => Some(serde_json::json!({ "sheet_name": name })),
            Error::UnsupportedExtension { filename } => {
                Some(serde_json::json!({ "filename": filename }))
            }
            Error::PayloadTooLarge { size, limit } => Some(serde_json::json!({
                "size_bytes": size,
                "limit_bytes": limit,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code: error.error_code().to_string(),
                message: error.user_message(locale),
                details,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - anything caused by the caller's input or remote URL
            Error::InvalidInput(_) => 400,
            Error::InvalidFilename => 400,
            Error::UnsupportedExtension { .. } => 400,
            Error::EmptyContent(_) => 400,
            Error::Fetch(_) => 400,
            Error::UnknownFormat { .. } => 400,
            Error::Parse { .. } => 400,
            Error::EmptyTable { .. } => 400,
            Error::InvalidSheetName { .. } => 400,

            // 413 Payload Too Large
            Error::PayloadTooLarge { .. } => 413,

            // 500 Internal Server Error - Server-side issues
            Error::Config { .. } => 500,
            Error::Encode(_) => 500,
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidInput(_) | Error::InvalidFilename => "invalid_input",
            Error::UnsupportedExtension { .. } => "invalid_input",
            Error::EmptyContent(_) => "empty_content",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::Fetch(e) => match e {
                FetchError::AccessDenied { .. } => "access_denied",
                FetchError::NotFound { .. } => "url_not_found",
                FetchError::Status { .. } | FetchError::Network { .. } => "fetch_failed",
                FetchError::TooLarge { .. } => "fetch_failed",
            },
            Error::UnknownFormat { .. } => "unknown_format",
            Error::Parse { .. } => "parse_error",
            Error::EmptyTable { .. } => "empty_table",
            Error::InvalidSheetName { .. } => "invalid_sheet_name",
            Error::Encode(_) => "encode_error",
            Error::Database(_) => "database_error",
            Error::Sqlx(_) => "database_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl Error {
    /// User-facing message for this error in the given locale
    ///
    /// Fetch failures get distinct wording for 403 and 404 so the caller can tell
    /// a blocked URL from a wrong one.
    pub fn user_message(&self, locale: Locale) -> String {
        match locale {
            Locale::English => self.message_en(),
            Locale::Indonesian => self.message_id(),
        }
    }

    fn message_en(&self) -> String {
        match self {
            Error::InvalidInput(detail) => detail.clone(),
            Error::InvalidFilename => "Invalid filename".to_string(),
            Error::UnsupportedExtension { .. } => {
                "Unsupported file format. Please use a JSON or CSV file".to_string()
            }
            Error::EmptyContent(_) => "The file is empty".to_string(),
            Error::PayloadTooLarge { limit, .. } => {
                format!("File is too large. Maximum size is {} MB", limit / (1024 * 1024))
            }
            Error::Fetch(FetchError::AccessDenied { .. }) => {
                "Access denied (403 Forbidden). The server blocked the request. \
                 Make sure the URL is publicly accessible."
                    .to_string()
            }
            Error::Fetch(FetchError::NotFound { .. }) => {
                "URL not found (404 Not Found). Please check the URL you entered.".to_string()
            }
            Error::Fetch(FetchError::Status { status, .. }) => {
                format!("Failed to download file from URL: HTTP {}", status)
            }
            Error::Fetch(FetchError::Network { reason, .. }) => {
                format!("Failed to download file from URL: {}", reason)
            }
            Error::Fetch(FetchError::TooLarge { limit, .. }) => format!(
                "File at URL is too large. Maximum size is {} MB",
                limit / (1024 * 1024)
            ),
            Error::UnknownFormat { .. } => "Unable to detect the file format. Make sure the URL \
                 points to a valid .json or .csv file"
                .to_string(),
            Error::Parse { format, message } => {
                format!("Error processing {} file: {}", format.as_str().to_uppercase(), message)
            }
            Error::EmptyTable { .. } => "The file does not contain any data".to_string(),
            Error::InvalidSheetName { name, reason } => {
                format!("Invalid sheet name '{}': {}", name, reason)
            }
            other => format!("Error: {}", other),
        }
    }

    fn message_id(&self) -> String {
        match self {
            Error::InvalidInput(detail) => detail.clone(),
            Error::InvalidFilename => "Nama file tidak valid".to_string(),
            Error::UnsupportedExtension { .. } => {
                "Format file tidak didukung. Gunakan file JSON atau CSV".to_string()
            }
            Error::EmptyContent(_) => "File kosong".to_string(),
            Error::PayloadTooLarge { limit, .. } => format!(
                "Ukuran file terlalu besar. Maksimal {} MB",
                limit / (1024 * 1024)
            ),
            Error::Fetch(FetchError::AccessDenied { .. }) => {
                "Akses ditolak (403 Forbidden). Server memblokir request. \
                 Pastikan URL dapat diakses secara publik."
                    .to_string()
            }
            Error::Fetch(FetchError::NotFound { .. }) => {
                "URL tidak ditemukan (404 Not Found). Periksa kembali URL yang dimasukkan."
                    .to_string()
            }
            Error::Fetch(FetchError::Status { status, .. }) => {
                format!("Gagal mengunduh file dari URL: HTTP {}", status)
            }
            Error::Fetch(FetchError::Network { reason, .. }) => {
                format!("Gagal mengunduh file dari URL: {}", reason)
            }
            Error::Fetch(FetchError::TooLarge { limit, .. }) => format!(
                "File dari URL terlalu besar. Maksimal {} MB",
                limit / (1024 * 1024)
            ),
            Error::UnknownFormat { .. } => "Tidak dapat mendeteksi format file. Pastikan URL \
                 mengarah ke file .json atau .csv yang valid"
                .to_string(),
            Error::Parse { format, message } => format!(
                "Error memproses file {}: {}",
                format.as_str().to_uppercase(),
                message
            ),
            Error::EmptyTable { .. } => "File tidak mengandung data".to_string(),
            Error::InvalidSheetName { name, reason } => {
                format!("Nama sheet '{}' tidak valid: {}", name, reason)
            }
            other => format!("Error: {}", other),
        }
    }
}
