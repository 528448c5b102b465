//! In-process fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use sdg_insights::{
    AnalysisConfig, AnalysisError, Analyzer, CompletionService, ExtractionRequest, PmcId,
    PmcSummary, RecordSource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Route library logs to the test harness; `RUST_LOG` controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A well-formed model reply.
pub const VALID_REPLY: &str = r#"{
  "authors": "A. Rivera, K. Osei",
  "date_published": "2021-03",
  "journal": null,
  "location_constraint": "No location constraint",
  "sdg_primary": 6,
  "sdg_secondary": [3, 11],
  "summary": "Low-cost sand filters cut diarrhoeal disease in peri-urban households.",
  "lesson": {
    "title": "Cheap filters, big gains",
    "main_summary": "Household sand filters removed most pathogens.",
    "why_it_matters": "Safe water reduces child mortality."
  },
  "challenges": [
    {"title": "Map filter coverage", "description": "Survey households.", "location": "Anywhere"},
    {"title": "Train maintainers", "description": "Teach cleaning cycles.", "location": "Anywhere"},
    {"title": "Test the river", "description": "Sample the Ganges near Varanasi.", "location": "Varanasi, India"}
  ]
}"#;

/// Paper body long enough to pass the minimum-length check.
pub fn jats_article(body_text: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><article><front><article-title>Ignored</article-title></front>\
         <body><sec><title>Introduction</title><p>{body_text}</p></sec></body>\
         <back><ref-list>refs</ref-list></back></article>"
    )
}

pub const LONG_BODY: &str = "Household sand filters were installed in 120 homes &amp; monitored \
for twelve months. Pathogen counts fell sharply while reported diarrhoeal episodes in children \
under five halved compared with control households.";

// ── Model fake ───────────────────────────────────────────────────────────

pub struct ScriptedModel {
    reply: Result<String, String>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<ExtractionRequest>>,
}

impl ScriptedModel {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn failing(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.into()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn slow(reply: impl Into<String>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> ExtractionRequest {
        self.last_request
            .lock()
            .unwrap()
            .clone()
            .expect("model was called")
    }
}

#[async_trait]
impl CompletionService for ScriptedModel {
    async fn complete(&self, request: &ExtractionRequest) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.reply
            .clone()
            .map_err(|message| AnalysisError::ExtractionFailed { message })
    }
}

// ── Record source fake ───────────────────────────────────────────────────

pub struct FakeRecords {
    xml: Option<String>,
    papers: Vec<PmcSummary>,
    pub fetches: AtomicUsize,
    pub searches: AtomicUsize,
    pub last_fetch: Mutex<Option<String>>,
    pub last_search: Mutex<Option<(String, usize)>>,
}

impl FakeRecords {
    pub fn with_xml(xml: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::build(Some(xml.into()), Vec::new()))
    }

    /// Every fetch fails as if the service were down.
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self::build(None, Vec::new()))
    }

    pub fn with_papers(papers: Vec<PmcSummary>) -> Arc<Self> {
        Arc::new(Self::build(None, papers))
    }

    fn build(xml: Option<String>, papers: Vec<PmcSummary>) -> Self {
        Self {
            xml,
            papers,
            fetches: AtomicUsize::new(0),
            searches: AtomicUsize::new(0),
            last_fetch: Mutex::new(None),
            last_search: Mutex::new(None),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for FakeRecords {
    async fn fetch_full_text(&self, id: &PmcId) -> Result<String, AnalysisError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_fetch.lock().unwrap() = Some(id.numeric().to_string());
        self.xml
            .clone()
            .ok_or_else(|| AnalysisError::UpstreamUnavailable {
                context: "efetch failed: HTTP 503".into(),
            })
    }

    async fn search(
        &self,
        term: &str,
        max_results: usize,
    ) -> Result<Vec<PmcSummary>, AnalysisError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        *self.last_search.lock().unwrap() = Some((term.to_string(), max_results));
        Ok(self.papers.iter().take(max_results).cloned().collect())
    }
}

pub fn analyzer(model: Arc<ScriptedModel>, records: Arc<FakeRecords>) -> Analyzer {
    analyzer_with(model, records, AnalysisConfig::default())
}

pub fn analyzer_with(
    model: Arc<ScriptedModel>,
    records: Arc<FakeRecords>,
    config: AnalysisConfig,
) -> Analyzer {
    Analyzer::new(model, records, config)
}

pub fn summary(pmcid: &str) -> PmcSummary {
    PmcSummary {
        pmcid: pmcid.to_string(),
        title: format!("Paper {pmcid}"),
        authors: "Doe J".into(),
        journal: "Water Res".into(),
        date: "2024 Jan".into(),
    }
}
