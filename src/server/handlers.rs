//! Request handlers

use super::AppState;
use crate::error::{Error, Result};
use crate::metrics::{self, Outcome};
use crate::pipeline::{GeneratedImage, GenerationRequest};
use crate::watermark::{Position, WatermarkParams};
use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::time::Instant;
use tracing::{Instrument, info, warn};
use uuid::Uuid;

const REQUEST_ID: &str = "x-request-id";
const PROCESS_TIME: &str = "x-process-time";
const SCANNABLE: &str = "x-qr-scannable";

/// Raw multipart fields, before validation
#[derive(Debug, Default)]
struct GenerateForm {
    data: Option<String>,
    watermark: Option<Bytes>,
    position: Option<String>,
    transparency: Option<String>,
    scale: Option<String>,
}

impl GenerateForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "watermark" => {
                    // Browsers send an empty, unnamed part when no file was picked
                    let has_filename = field.file_name().is_some_and(|n| !n.is_empty());
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| Error::BadRequest(e.body_text()))?;
                    if has_filename && !data.is_empty() {
                        form.watermark = Some(data);
                    }
                }
                "data" | "position" | "transparency" | "scale" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| Error::BadRequest(e.body_text()))?;
                    match name.as_str() {
                        "data" => form.data = Some(value),
                        "position" => form.position = Some(value),
                        "transparency" => form.transparency = Some(value),
                        _ => form.scale = Some(value),
                    }
                }
                other => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Anchor the request would use, once a watermark has been uploaded.
    fn watermark_position(&self, defaults: &WatermarkParams) -> Option<Position> {
        self.watermark.as_ref().map(|_| {
            self.position
                .as_deref()
                .map(Position::parse)
                .unwrap_or(defaults.position)
        })
    }

    /// Validate into a pipeline request. Watermark fields are only parsed
    /// when a watermark was uploaded.
    fn into_request(self, defaults: &WatermarkParams) -> Result<GenerationRequest> {
        let data = self.data.filter(|d| !d.is_empty()).ok_or(Error::MissingData)?;

        match self.watermark {
            Some(image) => {
                let params = WatermarkParams::from_fields(
                    self.position.as_deref(),
                    self.transparency.as_deref(),
                    self.scale.as_deref(),
                    defaults,
                )?;
                Ok(GenerationRequest::watermarked(data, image, params))
            }
            None => Ok(GenerationRequest::plain(data)),
        }
    }
}

pub(crate) async fn generate(State(state): State<AppState>, multipart: Multipart) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("generate", %request_id);
    let started = Instant::now();

    let (position, result) = run_generate(&state, multipart).instrument(span.clone()).await;
    let elapsed = started.elapsed();

    let mut response = match result {
        Ok(generated) => {
            metrics::record(elapsed, Outcome::Success, position);
            span.in_scope(|| {
                info!(
                    width = generated.width,
                    height = generated.height,
                    watermarked = generated.watermarked,
                    bytes = generated.png.len(),
                    elapsed_ms = elapsed.as_secs_f64() * 1_000.0,
                    "Generated QR code"
                )
            });
            png_response(generated, elapsed.as_secs_f64())
        }
        Err(err) => {
            metrics::record(elapsed, Outcome::Failure(err.kind()), position);
            span.in_scope(|| warn!(kind = err.kind(), error = %err, "Generation failed"));
            err.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(HeaderName::from_static(REQUEST_ID), value);
    }
    response
}

/// Position is reported alongside failures too, as long as the form parsed.
async fn run_generate(
    state: &AppState,
    multipart: Multipart,
) -> (Option<Position>, Result<GeneratedImage>) {
    let form = match GenerateForm::read(multipart).await {
        Ok(form) => form,
        Err(err) => return (None, Err(err)),
    };
    let position = form.watermark_position(&state.defaults);

    let result = match form.into_request(&state.defaults) {
        Ok(request) => {
            let generator = state.generator.clone();
            tokio::task::spawn_blocking(move || generator.generate(&request))
                .await
                .map_err(|e| Error::Other(format!("Generation task failed: {e}")))
                .and_then(|generated| generated)
        }
        Err(err) => Err(err),
    };

    (position, result)
}

fn png_response(generated: GeneratedImage, process_secs: f64) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Ok(value) = HeaderValue::from_str(&format!("{process_secs:.5}")) {
        headers.insert(HeaderName::from_static(PROCESS_TIME), value);
    }
    if let Some(scannable) = generated.scannable {
        headers.insert(
            HeaderName::from_static(SCANNABLE),
            HeaderValue::from_static(if scannable { "true" } else { "false" }),
        );
    }

    (StatusCode::OK, headers, Body::from(generated.png)).into_response()
}

pub(crate) async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics_format.and_then(metrics::render) {
        Some((content_type, body)) => (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, "no-store"),
            ],
            body,
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
