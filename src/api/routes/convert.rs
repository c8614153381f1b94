//! Conversion handlers: multipart upload and remote URL.

use super::{ConvertQuery, ConvertUrlRequest};
use crate::api::AppState;
use crate::api::error_response::localized;
use crate::error::Error;
use crate::types::ConvertedFile;
use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// MIME type of the generated workbooks
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// POST /convert - Convert an uploaded JSON or CSV file
#[utoipa::path(
    post,
    path = "/convert",
    tag = "convert",
    params(ConvertQuery),
    request_body(content = Vec<u8>, description = "Multipart form with a `file` field (.json or .csv) and an optional `sheet_name` field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Invalid filename, unsupported extension, empty file or unparseable content", body = crate::error::ApiError),
        (status = 413, description = "Upload exceeds the size limit", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn convert_file(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
    mut multipart: Multipart,
) -> Response {
    let locale = state.config.locale;
    let limit = state.config.api.max_upload_bytes;

    let mut filename: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut sheet_name = query.sheet_name;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return localized(multipart_error(e, limit), locale),
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => content = Some(bytes.to_vec()),
                    Err(e) => return localized(multipart_error(e, limit), locale),
                }
            }
            "sheet_name" => match field.text().await {
                Ok(text) => sheet_name = Some(text),
                Err(e) => return localized(multipart_error(e, limit), locale),
            },
            _ => {}
        }
    }

    let Some(content) = content else {
        return localized(Error::InvalidFilename, locale);
    };

    match state
        .converter
        .convert_upload(filename.as_deref(), content, sheet_name.as_deref())
        .await
    {
        Ok(file) => workbook_response(file),
        Err(e) => localized(e, locale),
    }
}

/// POST /convert-url - Download a JSON or CSV file and convert it
#[utoipa::path(
    post,
    path = "/convert-url",
    tag = "convert",
    request_body = ConvertUrlRequest,
    responses(
        (status = 200, description = "Converted workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Invalid URL, fetch failure, unknown format or unparseable content", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn convert_url(
    State(state): State<AppState>,
    payload: Result<Json<ConvertUrlRequest>, JsonRejection>,
) -> Response {
    let locale = state.config.locale;

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return localized(Error::InvalidInput(rejection.body_text()), locale),
    };

    let url = request.url.trim();
    if url.is_empty() {
        return localized(Error::InvalidInput("url must not be empty".to_string()), locale);
    }

    match state
        .converter
        .convert_url(url, request.sheet_name.as_deref())
        .await
    {
        Ok(file) => workbook_response(file),
        Err(e) => localized(e, locale),
    }
}

/// Body-limit rejections become 413, everything else is a malformed form
fn multipart_error(error: MultipartError, limit: u64) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { size: None, limit }
    } else {
        Error::InvalidInput(format!("malformed multipart body: {}", error.body_text()))
    }
}

fn workbook_response(file: ConvertedFile) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file.download_name)),
        ],
        file.bytes,
    )
        .into_response()
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
pub(crate) fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(filename)
        )
    }
}
