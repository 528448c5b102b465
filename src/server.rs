//! HTTP API.
//!
//! | Route | Input | Output |
//! |-------|-------|--------|
//! | `POST /api/generate` | multipart `file` (PDF) / `text` / `title` | [`AnalysisResult`] |
//! | `GET /api/fetch-pmc` | `?pmcid=PMC…` | [`AnalysisResult`] |
//! | `GET /api/search-pmc` | `?sdg=N&keywords=…` | `{ "papers": [PmcSummary…] }` |
//!
//! Every failure is `{ "error": "<message>" }` with the status from
//! [`AnalysisError::status_code`]. Input is validated before the model
//! configuration is consulted, so a malformed request gets a 400 even on a
//! server without credentials. Search never needs a model.

use crate::analyze::{search_papers, Analyzer};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::output::AnalysisResult;
use crate::pipeline::acquire::{AnalysisRequest, PdfUpload, MAX_PDF_BYTES};
use crate::pipeline::fetch::{EutilsClient, RecordSource};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Room for the form fields around a maximum-size PDF.
const BODY_LIMIT: usize = MAX_PDF_BYTES + 1024 * 1024;

/// Shared application state accessible from all handlers.
pub struct AppState {
    /// None when no extraction provider could be configured.
    analyzer: Option<Analyzer>,
    records: Arc<dyn RecordSource>,
    search_max_results: usize,
}

impl AppState {
    /// State with a working analyzer.
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            records: analyzer.records(),
            search_max_results: analyzer.config().search_max_results,
            analyzer: Some(analyzer),
        }
    }

    /// State that can only search; analysis routes answer 500.
    pub fn search_only(records: Arc<dyn RecordSource>, config: &AnalysisConfig) -> Self {
        Self {
            analyzer: None,
            records,
            search_max_results: config.search_max_results,
        }
    }

    /// Build production state. A missing model credential is not fatal:
    /// the server starts and reports the misconfiguration per request.
    pub fn from_config(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        match Analyzer::from_config(config.clone()) {
            Ok(analyzer) => Ok(Self::new(analyzer)),
            Err(AnalysisError::ServerMisconfiguration { hint }) => {
                warn!("Analysis disabled: {}", hint);
                let records = Arc::new(EutilsClient::from_config(&config)?);
                Ok(Self::search_only(records, &config))
            }
            Err(e) => Err(e),
        }
    }

    fn analyzer(&self) -> Result<&Analyzer, AnalysisError> {
        self.analyzer
            .as_ref()
            .ok_or_else(|| AnalysisError::ServerMisconfiguration {
                hint: "missing GEMINI_API_KEY".into(),
            })
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/fetch-pmc", get(fetch_pmc))
        .route("/api/search-pmc", get(search_pmc))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve the API until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn generate(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, AnalysisError> {
    let multipart = multipart.map_err(|e| AnalysisError::invalid_input(e.body_text()))?;
    let form = parse_form(multipart).await?;
    let request = AnalysisRequest::from_form(form.file, form.text, form.title)?;
    request.source.validate()?;

    let result = state.analyzer()?.analyze(request).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct FetchParams {
    pmcid: Option<String>,
}

async fn fetch_pmc(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FetchParams>,
) -> Result<Json<AnalysisResult>, AnalysisError> {
    let request = AnalysisRequest::remote(params.pmcid.unwrap_or_default());
    request.source.validate()?;

    let result = state.analyzer()?.analyze(request).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    sdg: Option<String>,
    keywords: Option<String>,
}

async fn search_pmc(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, AnalysisError> {
    // Unparseable numbers fall through to the range check.
    let sdg = params
        .sdg
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(0);

    let papers = search_papers(
        state.records.as_ref(),
        sdg,
        params.keywords.as_deref(),
        state.search_max_results,
    )
    .await?;
    Ok(Json(serde_json::json!({ "papers": papers })))
}

// ── Multipart form ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct GenerateForm {
    file: Option<PdfUpload>,
    text: Option<String>,
    title: Option<String>,
}

async fn parse_form(mut multipart: Multipart) -> Result<GenerateForm, AnalysisError> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalysisError::invalid_input(format!("Failed to read form field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AnalysisError::invalid_input(format!("Failed to read file data: {e}"))
                    })?
                    .to_vec();

                // Browsers send an empty part when no file was chosen.
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                form.file = Some(PdfUpload {
                    filename,
                    content_type,
                    data,
                });
            }
            "text" | "title" => {
                let val = field.text().await.map_err(|e| {
                    AnalysisError::invalid_input(format!("Failed to read {name}: {e}"))
                })?;
                if name == "text" {
                    form.text = Some(val);
                } else {
                    form.title = Some(val);
                }
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }
    Ok(form)
}
