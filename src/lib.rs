//! # sdg-insights
//!
//! Turn a research paper into a structured, SDG-tagged insight summary using
//! a large language model.
//!
//! A paper arrives as an uploaded PDF, as pasted text, or as a PubMed Central
//! identifier. It is normalised into one payload, sent to the model together
//! with a prompt that embeds the expected JSON shape, and the reply is
//! validated into an [`AnalysisResult`]: the paper's primary and secondary UN
//! Sustainable Development Goals, a plain-language lesson and exactly three
//! concrete follow-up challenges.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request
//!  │
//!  ├─ 1. Validate  cheap checks, no I/O (type, size, identifier syntax)
//!  ├─ 2. Acquire   PDF bytes │ trimmed text │ PMC XML → plain text
//!  ├─ 3. Prompt    task + schema rendered from one table
//!  ├─ 4. Extract   one model call, no retries
//!  └─ 5. Decode    strip fences → JSON → schema check → AnalysisResult
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sdg_insights::{AnalysisConfig, AnalysisRequest, Analyzer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider resolved from GEMINI_API_KEY unless configured otherwise
//!     let analyzer = Analyzer::from_config(AnalysisConfig::default())?;
//!     let result = analyzer.analyze(AnalysisRequest::remote("PMC7654321")).await?;
//!     println!("{}", result.render_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `sdg-insights` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `server` | on      | Enables [`server`], the axum HTTP API |
//!
//! Disable both when using only the library:
//! ```toml
//! sdg-insights = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod schema;
pub mod sdg;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_sync, build_search_term, search_papers, Analyzer};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::{AnalysisError, ErrorKind};
pub use output::{AnalysisResult, Challenge, Lesson, PmcSummary};
pub use pipeline::acquire::{AnalysisRequest, NormalizedPayload, PaperSource, PdfUpload};
pub use pipeline::fetch::{EutilsClient, PmcId, RecordSource};
pub use pipeline::llm::{CompletionService, ExtractionRequest, LlmCompletionService};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
