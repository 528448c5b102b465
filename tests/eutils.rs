//! E-utilities client tests against a local axum stand-in for NCBI.

mod common;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use common::*;
use sdg_insights::{
    AnalysisConfig, AnalysisRequest, Analyzer, ErrorKind, EutilsClient, PmcId, RecordSource,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

type Calls = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

#[derive(Clone)]
struct Ncbi {
    calls: Calls,
    xml: String,
    idlist: Vec<&'static str>,
}

impl Ncbi {
    fn new(xml: impl Into<String>, idlist: Vec<&'static str>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            xml: xml.into(),
            idlist,
        }
    }

    fn record(&self, endpoint: &str, q: HashMap<String, String>) {
        self.calls.lock().unwrap().push((endpoint.to_string(), q));
    }

    fn calls_to(&self, endpoint: &str) -> Vec<HashMap<String, String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, q)| q.clone())
            .collect()
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/efetch.fcgi", get(efetch))
            .route("/esearch.fcgi", get(esearch))
            .route("/esummary.fcgi", get(esummary))
            .with_state(self.clone())
    }
}

async fn efetch(State(ncbi): State<Ncbi>, Query(q): Query<HashMap<String, String>>) -> String {
    ncbi.record("efetch", q);
    ncbi.xml.clone()
}

async fn esearch(
    State(ncbi): State<Ncbi>,
    Query(q): Query<HashMap<String, String>>,
) -> axum::Json<serde_json::Value> {
    ncbi.record("esearch", q);
    axum::Json(serde_json::json!({
        "header": { "type": "esearch" },
        "esearchresult": { "count": "3", "idlist": ncbi.idlist }
    }))
}

async fn esummary(
    State(ncbi): State<Ncbi>,
    Query(q): Query<HashMap<String, String>>,
) -> axum::Json<serde_json::Value> {
    ncbi.record("esummary", q);
    // Deliberately out of order; "333" is missing from the result map.
    axum::Json(serde_json::json!({
        "result": {
            "uids": ["222", "111"],
            "222": {
                "uid": "222",
                "title": "Solar microgrids in rural clinics",
                "sortfirstauthor": "Mensah A",
                "authors": [],
                "fulljournalname": "",
                "pubdate": "2024 Feb"
            },
            "111": {
                "uid": "111",
                "title": "Groundwater arsenic mapping",
                "sortfirstauthor": "Rahman M",
                "authors": [{ "name": "Rahman M" }, { "name": "Chen L" }],
                "fulljournalname": "Environmental Health",
                "pubdate": "2024 Mar 2"
            }
        }
    }))
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str) -> EutilsClient {
    EutilsClient::new(format!("{base}/"), 5).unwrap()
}

#[tokio::test]
async fn fetch_full_text_uses_numeric_id() {
    init_tracing();
    let ncbi = Ncbi::new("<article><body>x</body></article>", vec![]);
    let base = spawn(ncbi.router()).await;

    let id = PmcId::parse("PMC7654321").unwrap();
    let body = assert_ok!(client(&base).fetch_full_text(&id).await);
    assert_eq!(body, "<article><body>x</body></article>");

    let calls = ncbi.calls_to("efetch");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["db"], "pmc");
    assert_eq!(calls[0]["id"], "7654321");
    assert_eq!(calls[0]["rettype"], "xml");
}

#[tokio::test]
async fn zero_timeout_means_no_timeout() {
    let ncbi = Ncbi::new("<article><body>y</body></article>", vec![]);
    let base = spawn(ncbi.router()).await;

    let records = EutilsClient::new(base, 0).unwrap();
    let id = PmcId::parse("PMC1").unwrap();
    let body = assert_ok!(records.fetch_full_text(&id).await);
    assert_eq!(body, "<article><body>y</body></article>");
}

#[tokio::test]
async fn non_success_status_is_upstream_unavailable() {
    let app = Router::new().fallback(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") });
    let base = spawn(app).await;

    let id = PmcId::parse("PMC1").unwrap();
    let err = assert_err!(client(&base).fetch_full_text(&id).await);
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.to_string().contains("HTTP 500"), "{err}");
}

#[tokio::test]
async fn unreachable_host_is_upstream_unavailable() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let id = PmcId::parse("PMC1").unwrap();
    let err = assert_err!(client(&format!("http://{addr}")).fetch_full_text(&id).await);
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
}

#[tokio::test]
async fn search_summarises_in_search_order() {
    let ncbi = Ncbi::new("", vec!["111", "222", "333"]);
    let base = spawn(ncbi.router()).await;

    let papers = assert_ok!(client(&base).search("water AND open access[filter]", 7).await);
    assert_eq!(papers.len(), 2);

    assert_eq!(papers[0].pmcid, "PMC111");
    assert_eq!(papers[0].authors, "Rahman M, Chen L");
    assert_eq!(papers[0].journal, "Environmental Health");

    assert_eq!(papers[1].pmcid, "PMC222");
    assert_eq!(papers[1].authors, "Mensah A");
    assert_eq!(papers[1].journal, "Unknown");
    assert_eq!(papers[1].date, "2024 Feb");

    let search = &ncbi.calls_to("esearch")[0];
    assert_eq!(search["term"], "water AND open access[filter]");
    assert_eq!(search["retmax"], "7");
    assert_eq!(search["retmode"], "json");
    assert_eq!(search["sort"], "date");

    let summary = &ncbi.calls_to("esummary")[0];
    assert_eq!(summary["id"], "111,222,333");
}

#[tokio::test]
async fn empty_search_skips_summary_call() {
    let ncbi = Ncbi::new("", vec![]);
    let base = spawn(ncbi.router()).await;

    let papers = assert_ok!(client(&base).search("nothing", 10).await);
    assert!(papers.is_empty());
    assert_eq!(ncbi.calls_to("esearch").len(), 1);
    assert!(ncbi.calls_to("esummary").is_empty());
}

#[tokio::test]
async fn analyzer_over_http_records() {
    let ncbi = Ncbi::new(jats_article(LONG_BODY), vec![]);
    let base = spawn(ncbi.router()).await;

    let config = AnalysisConfig::builder()
        .eutils_base_url(base)
        .fetch_timeout_secs(5)
        .build()
        .unwrap();
    let records = Arc::new(assert_ok!(EutilsClient::from_config(&config)));
    let model = ScriptedModel::replying(VALID_REPLY);
    let analyzer = Analyzer::new(model.clone(), records, config);

    let result = assert_ok!(analyzer.analyze(AnalysisRequest::remote("PMC7654321")).await);
    assert_eq!(result.sdg_primary, 6);
    assert!(model.last_request().prompt.contains("120 homes & monitored"));
    assert_eq!(ncbi.calls_to("efetch")[0]["id"], "7654321");
}
