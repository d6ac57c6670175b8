//! Text extraction endpoint
//!
//! `POST /extract-text` takes a multipart form:
//!
//! | field            | required | default |
//! |------------------|----------|---------|
//! | `file`           | yes      |         |
//! | `lang`           | no       | configured default (`eng`) |
//! | `min_confidence` | no       | none (integer 0-100) |
//! | `debug`          | no       | `true`  |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::pipeline::ExtractRequest;
use crate::state::AppState;

/// Create the extract router
pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/extract-text", post(extract_text))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Extraction response
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub filename: String,
    pub pages: usize,
    pub lang: String,
    pub text_preview: String,
    pub text: ExtractedText,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractedText {
    pub raw: String,
    pub normalized: String,
}

/// Upload a PDF or image and extract its text
async fn extract_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractResponse>> {
    let request = read_form(&mut multipart).await?;

    let span = tracing::info_span!(
        "extract",
        request_id = %Uuid::new_v4(),
        filename = %request.filename
    );

    let response = run_extraction(state, request).instrument(span).await?;
    Ok(Json(response))
}

async fn run_extraction(state: AppState, request: ExtractRequest) -> Result<ExtractResponse> {
    tracing::info!(
        bytes = request.data.len(),
        mime = ?mime_guess::from_path(&request.filename).first(),
        "Received file"
    );

    let result = state.pipeline().run_blocking(request).await?;

    tracing::info!(pages = result.pages, "Extraction complete");

    Ok(ExtractResponse {
        filename: result.filename,
        pages: result.pages,
        lang: result.lang,
        text_preview: result.preview,
        text: ExtractedText {
            raw: result.raw_text,
            normalized: result.normalized_text,
        },
    })
}

/// Collect the form fields into an extraction request
async fn read_form(multipart: &mut Multipart) -> Result<ExtractRequest> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut language = None;
    let mut min_confidence = None;
    let mut debug = true;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let data = field.bytes().await?;
                tracing::debug!("Read {} bytes of file data", data.len());
                file = Some((filename, data.to_vec()));
            }
            "lang" => {
                let value = field.text().await?;
                let value = value.trim();
                if !value.is_empty() {
                    language = Some(value.to_string());
                }
            }
            "min_confidence" => {
                min_confidence = parse_min_confidence(&field.text().await?)?;
            }
            "debug" => {
                debug = parse_bool("debug", &field.text().await?)?;
            }
            other => {
                tracing::debug!("Ignoring form field {:?}", other);
            }
        }
    }

    let (filename, data) = file.ok_or(AppError::MissingField("file"))?;

    Ok(ExtractRequest {
        filename,
        data,
        language,
        min_confidence,
        debug,
    })
}

fn parse_min_confidence(value: &str) -> Result<Option<u8>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    match value.parse::<i64>() {
        Ok(n) if (0..=100).contains(&n) => Ok(Some(n as u8)),
        _ => Err(AppError::InvalidField {
            field: "min_confidence",
            value: value.to_string(),
        }),
    }
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::InvalidField {
            field,
            value: value.to_string(),
        }),
    }
}
