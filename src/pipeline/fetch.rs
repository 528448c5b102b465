//! Remote record transport: PubMed Central via NCBI E-utilities.
//!
//! The pipeline talks to PMC through the [`RecordSource`] trait so that the
//! acquisition logic (validation, normalisation, length bounds) can be
//! exercised without network access. [`EutilsClient`] is the production
//! implementation.
//!
//! ## Endpoints
//!
//! ```text
//! efetch.fcgi?db=pmc&id=<numeric>&rettype=xml         full-text JATS XML
//! esearch.fcgi?db=pmc&term=…&retmode=json&sort=date    matching ids
//! esummary.fcgi?db=pmc&id=<a,b,c>&retmode=json         per-id metadata
//! ```

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::output::PmcSummary;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

static RE_PMCID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^PMC[0-9]+$").unwrap());

/// A validated PubMed Central identifier such as `PMC7654321`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PmcId(String);

impl PmcId {
    /// Parse `PMC` followed by one or more ASCII digits, nothing else.
    pub fn parse(input: &str) -> Result<Self, AnalysisError> {
        if RE_PMCID.is_match(input) {
            Ok(PmcId(input.to_string()))
        } else {
            Err(AnalysisError::invalid_input(
                "Provide a valid PMCID (e.g. PMC1234567).",
            ))
        }
    }

    /// The digits after the `PMC` prefix, as used by E-utilities.
    pub fn numeric(&self) -> &str {
        &self.0[3..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PmcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of full-text records and search results.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the full-text markup for `id`.
    ///
    /// Transport failures and non-success statuses map to
    /// [`AnalysisError::UpstreamUnavailable`].
    async fn fetch_full_text(&self, id: &PmcId) -> Result<String, AnalysisError>;

    /// Run a PMC search and summarise up to `max_results` hits, newest first.
    async fn search(&self, term: &str, max_results: usize)
        -> Result<Vec<PmcSummary>, AnalysisError>;
}

/// Default E-utilities base URL.
pub const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// [`RecordSource`] backed by the NCBI E-utilities HTTP API.
#[derive(Debug, Clone)]
pub struct EutilsClient {
    client: reqwest::Client,
    base_url: String,
}

impl EutilsClient {
    /// Build a client with the given base URL and request timeout.
    /// A `timeout_secs` of `0` leaves requests without a timeout.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, AnalysisError> {
        let base_url: String = base_url.into();
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("sdg-insights/", env!("CARGO_PKG_VERSION")));
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| AnalysisError::ServerMisconfiguration {
                hint: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        Self::new(&config.eutils_base_url, config.fetch_timeout_secs)
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    async fn get_text(
        &self,
        what: &str,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<String, AnalysisError> {
        let url = self.endpoint(endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| upstream(what, transport_reason(&e)))?;

        if !response.status().is_success() {
            return Err(upstream(what, format!("HTTP {}", response.status())));
        }

        response
            .text()
            .await
            .map_err(|e| upstream(what, e.to_string()))
    }
}

#[async_trait]
impl RecordSource for EutilsClient {
    async fn fetch_full_text(&self, id: &PmcId) -> Result<String, AnalysisError> {
        info!("Fetching full text for {}", id);
        let body = self
            .get_text(
                "PMC full-text fetch",
                "efetch.fcgi",
                &[("db", "pmc"), ("id", id.numeric()), ("rettype", "xml")],
            )
            .await?;
        debug!("{}: received {} bytes of markup", id, body.len());
        Ok(body)
    }

    async fn search(
        &self,
        term: &str,
        max_results: usize,
    ) -> Result<Vec<PmcSummary>, AnalysisError> {
        let retmax = max_results.to_string();
        let body = self
            .get_text(
                "PMC search",
                "esearch.fcgi",
                &[
                    ("db", "pmc"),
                    ("term", term),
                    ("retmax", &retmax),
                    ("retmode", "json"),
                    ("sort", "date"),
                ],
            )
            .await?;
        let ids = parse_search_ids(&body)?;
        debug!("PMC search returned {} ids", ids.len());
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let body = self
            .get_text(
                "PMC summary",
                "esummary.fcgi",
                &[("db", "pmc"), ("id", &joined), ("retmode", "json")],
            )
            .await?;
        parse_summaries(&ids, &body)
    }
}

fn upstream(what: &str, reason: impl fmt::Display) -> AnalysisError {
    AnalysisError::UpstreamUnavailable {
        context: format!("{what} failed: {reason}"),
    }
}

fn transport_reason(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    }
}

// ── Response parsing ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Deserialize)]
struct ESummaryResponse {
    #[serde(default)]
    result: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize, Default)]
struct ESummaryRecord {
    #[serde(default)]
    title: String,
    #[serde(default)]
    sortfirstauthor: String,
    #[serde(default)]
    authors: Vec<ESummaryAuthor>,
    #[serde(default)]
    fulljournalname: String,
    #[serde(default)]
    pubdate: String,
}

#[derive(Deserialize)]
struct ESummaryAuthor {
    #[serde(default)]
    name: String,
}

fn parse_search_ids(body: &str) -> Result<Vec<String>, AnalysisError> {
    let parsed: ESearchResponse =
        serde_json::from_str(body).map_err(|e| upstream("PMC search", e))?;
    Ok(parsed.esearchresult.idlist)
}

/// Build one [`PmcSummary`] per id, in search order, skipping ids the
/// summary response does not describe.
fn parse_summaries(ids: &[String], body: &str) -> Result<Vec<PmcSummary>, AnalysisError> {
    let parsed: ESummaryResponse =
        serde_json::from_str(body).map_err(|e| upstream("PMC summary", e))?;

    let papers = ids
        .iter()
        .filter_map(|id| {
            let value = parsed.result.get(id)?;
            let record: ESummaryRecord = serde_json::from_value(value.clone()).ok()?;
            Some(to_summary(id, record))
        })
        .collect();
    Ok(papers)
}

fn to_summary(id: &str, record: ESummaryRecord) -> PmcSummary {
    let joined = record
        .authors
        .iter()
        .map(|a| a.name.as_str())
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let authors = [joined, record.sortfirstauthor]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    PmcSummary {
        pmcid: format!("PMC{id}"),
        title: record.title,
        authors,
        journal: or_unknown(record.fulljournalname),
        date: or_unknown(record.pubdate),
    }
}

fn or_unknown(s: String) -> String {
    if s.is_empty() {
        "Unknown".to_string()
    } else {
        s
    }
}
