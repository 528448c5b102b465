//! Configuration for paper analysis.
//!
//! Everything the pipeline can be tuned with lives in [`AnalysisConfig`],
//! built through [`AnalysisConfigBuilder`]. The config is cheap to clone and
//! is shared read-only by every request an [`crate::Analyzer`] serves.

use crate::error::AnalysisError;
use crate::pipeline::fetch::EUTILS_BASE;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for analysing papers.
///
/// # Example
/// ```rust
/// use sdg_insights::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("gemini-2.0-flash")
///     .temperature(0.2)
///     .search_max_results(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.search_max_results, 5);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Model identifier. If None, [`DEFAULT_MODEL`] is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai").
    /// If None along with `provider`, the environment decides.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Range: 0.0–2.0. Default: 0.2.
    ///
    /// Kept low so the model stays close to the paper's own claims.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// The answer is a single JSON object, but three challenge descriptions
    /// plus the lesson can run long for dense papers.
    pub max_tokens: usize,

    /// Base URL of the NCBI E-utilities service.
    pub eutils_base_url: String,

    /// Timeout for each E-utilities request in seconds. Default: 30. `0`
    /// disables it.
    pub fetch_timeout_secs: u64,

    /// Timeout for the model call in seconds. Default: 120. `0` disables it.
    pub api_timeout_secs: u64,

    /// Maximum rows returned by a PMC search. Default: 10.
    pub search_max_results: usize,

    /// Optional observer for pipeline stages.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 8192,
            eutils_base_url: EUTILS_BASE.to_string(),
            fetch_timeout_secs: 30,
            api_timeout_secs: 120,
            search_max_results: 10,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("eutils_base_url", &self.eutils_base_url)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("search_max_results", &self.search_max_results)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured model, or [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn eutils_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.eutils_base_url = url.into();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn search_max_results(mut self, n: usize) -> Self {
        self.config.search_max_results = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalysisError> {
        let c = &self.config;
        let url = c.eutils_base_url.trim();
        if url.is_empty() {
            return Err(AnalysisError::ServerMisconfiguration {
                hint: "E-utilities base URL is empty".into(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AnalysisError::ServerMisconfiguration {
                hint: format!("E-utilities base URL must be http(s), got '{url}'"),
            });
        }
        if c.search_max_results == 0 {
            return Err(AnalysisError::ServerMisconfiguration {
                hint: "search_max_results must be ≥ 1".into(),
            });
        }
        Ok(self.config)
    }
}
