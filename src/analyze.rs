//! Analysis entry points.
//!
//! [`Analyzer`] runs one request through the pipeline:
//!
//! ```text
//! Validate → Acquire → Build prompt → Extract → Decode
//! ```
//!
//! The first failing step ends the request; there are no partial results
//! and nothing is retried. An `Analyzer` holds only shared, stateless
//! collaborators, so one instance can serve any number of concurrent
//! requests.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::output::{AnalysisResult, PmcSummary};
use crate::pipeline::acquire::AnalysisRequest;
use crate::pipeline::decode::decode_response;
use crate::pipeline::fetch::{EutilsClient, RecordSource};
use crate::pipeline::llm::{CompletionService, ExtractionRequest, LlmCompletionService};
use crate::progress::Stage;
use crate::prompts::build_prompt;
use crate::sdg;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const INVALID_SDG: &str = "Provide a valid SDG number (1–17).";

/// Runs analysis requests and PMC searches.
#[derive(Clone)]
pub struct Analyzer {
    completion: Arc<dyn CompletionService>,
    records: Arc<dyn RecordSource>,
    config: AnalysisConfig,
}

impl Analyzer {
    /// Assemble an analyzer from explicit collaborators.
    pub fn new(
        completion: Arc<dyn CompletionService>,
        records: Arc<dyn RecordSource>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            completion,
            records,
            config,
        }
    }

    /// Build the production analyzer: an `edgequake-llm` provider for
    /// extraction and the E-utilities client for PMC records.
    pub fn from_config(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let provider = resolve_provider(&config)?;
        let completion = Arc::new(LlmCompletionService::new(provider, &config));
        let records = Arc::new(EutilsClient::from_config(&config)?);
        Ok(Self::new(completion, records, config))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse one paper.
    ///
    /// # Errors
    /// * [`AnalysisError::InvalidInput`] — no content, bad identifier, wrong
    ///   file type or oversize file; nothing external is called
    /// * [`AnalysisError::UpstreamUnavailable`] / [`AnalysisError::InsufficientContent`]
    ///   — the PMC record could not be used
    /// * [`AnalysisError::ExtractionFailed`] — the model call failed or timed out
    /// * [`AnalysisError::MalformedModelOutput`] — the reply did not match the schema
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        info!("Starting analysis: {}", describe(&request));

        let outcome = self.run(request).await;

        match &outcome {
            Ok(result) => {
                info!(
                    "Analysis complete in {:?}: SDG {} (+{} secondary), {} challenges",
                    start.elapsed(),
                    result.sdg_primary,
                    result.sdg_secondary.len(),
                    result.challenges.len()
                );
                if let Some(cb) = &self.config.progress_callback {
                    cb.on_analysis_complete(result);
                }
            }
            Err(e) => {
                warn!("Analysis failed after {:?}: {}", start.elapsed(), e);
                if let Some(cb) = &self.config.progress_callback {
                    cb.on_analysis_error(e);
                }
            }
        }
        outcome
    }

    async fn run(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        // ── Step 1: Validate ─────────────────────────────────────────────────
        self.stage(Stage::Validate);
        request.source.validate()?;

        // ── Step 2: Acquire ──────────────────────────────────────────────────
        self.stage(Stage::Acquire);
        let payload = request.source.acquire(self.records.as_ref()).await?;

        // ── Step 3: Build prompt ─────────────────────────────────────────────
        self.stage(Stage::BuildPrompt);
        let prompt = build_prompt(payload.modality(), request.title.as_deref());
        let extraction = ExtractionRequest::from_payload(prompt, payload);
        debug!(
            "Prompt: {} chars, attachment: {} bytes",
            extraction.prompt.chars().count(),
            extraction.attachment.as_ref().map_or(0, |a| a.data.len())
        );

        // ── Step 4: Extract ──────────────────────────────────────────────────
        self.stage(Stage::Extract);
        let raw = self.extract(&extraction).await?;
        debug!("Model replied with {} chars", raw.chars().count());

        // ── Step 5: Decode ───────────────────────────────────────────────────
        self.stage(Stage::Decode);
        decode_response(&raw)
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<String, AnalysisError> {
        let secs = self.config.api_timeout_secs;
        let call = self.completion.complete(request);
        if secs == 0 {
            return call.await;
        }
        tokio::time::timeout(Duration::from_secs(secs), call)
            .await
            .map_err(|_| AnalysisError::ExtractionFailed {
                message: format!("model call timed out after {secs}s"),
            })?
    }

    /// Search open-access PMC papers for one SDG, newest first.
    ///
    /// `keywords` narrows the goal's base query; blank keywords are ignored.
    pub async fn search(
        &self,
        sdg: i64,
        keywords: Option<&str>,
    ) -> Result<Vec<PmcSummary>, AnalysisError> {
        search_papers(
            self.records.as_ref(),
            sdg,
            keywords,
            self.config.search_max_results,
        )
        .await
    }

    /// The record source used for PMC fetches and searches.
    pub fn records(&self) -> Arc<dyn RecordSource> {
        Arc::clone(&self.records)
    }

    fn stage(&self, stage: Stage) {
        debug!("Stage: {}", stage);
        if let Some(cb) = &self.config.progress_callback {
            cb.on_stage_start(stage);
        }
    }
}

/// Search PMC through any [`RecordSource`].
///
/// Does not need a model; the HTTP server uses it directly when no
/// extraction provider is configured.
pub async fn search_papers(
    records: &dyn RecordSource,
    sdg: i64,
    keywords: Option<&str>,
    max_results: usize,
) -> Result<Vec<PmcSummary>, AnalysisError> {
    let term = build_search_term(sdg, keywords)?;
    debug!("PMC search term: {}", term);
    let papers = records.search(&term, max_results).await?;
    info!("PMC search for SDG {} returned {} papers", sdg, papers.len());
    Ok(papers)
}

/// Compose the esearch term for an SDG and optional keywords.
pub fn build_search_term(sdg: i64, keywords: Option<&str>) -> Result<String, AnalysisError> {
    let base = u8::try_from(sdg)
        .ok()
        .and_then(sdg::search_query)
        .ok_or_else(|| AnalysisError::invalid_input(INVALID_SDG))?;

    let mut term = base.to_string();
    if let Some(kw) = keywords.map(str::trim).filter(|k| !k.is_empty()) {
        term.push_str(&format!(" AND ({kw})"));
    }
    term.push_str(" AND open access[filter]");
    Ok(term)
}

/// Analyse one paper with a freshly resolved provider.
///
/// Convenience for one-shot callers; long-running callers should build an
/// [`Analyzer`] once and reuse it.
pub async fn analyze(
    request: AnalysisRequest,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    Analyzer::from_config(config.clone())?
        .analyze(request)
        .await
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    request: AnalysisRequest,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnalysisError::ServerMisconfiguration {
            hint: format!("failed to create tokio runtime: {e}"),
        })?
        .block_on(analyze(request, config))
}

fn describe(request: &AnalysisRequest) -> String {
    use crate::pipeline::acquire::PaperSource;
    match &request.source {
        PaperSource::Pdf(upload) => format!("PDF '{}' ({} bytes)", upload.filename, upload.data.len()),
        PaperSource::PastedText(text) => format!("pasted text ({} chars)", text.chars().count()),
        PaperSource::RemoteRecord(id) => format!("PMC record '{id}'"),
    }
}

/// Resolve the LLM provider.
///
/// Resolution order:
///
/// 1. **Explicit provider** in the config.
/// 2. **Provider name** + model (default [`crate::config::DEFAULT_MODEL`]).
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, both non-empty.
/// 4. **`GEMINI_API_KEY`** present → Gemini with the configured model.
///
/// Anything else is a [`AnalysisError::ServerMisconfiguration`]; the hint
/// names the missing variable, never a key value.
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, AnalysisError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.is_empty() => create_provider("gemini", config.model_or_default()),
        _ => Err(AnalysisError::ServerMisconfiguration {
            hint: "missing GEMINI_API_KEY".into(),
        }),
    }
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, AnalysisError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        AnalysisError::ServerMisconfiguration {
            hint: format!("provider '{name}' could not be created: {e}"),
        }
    })
}
