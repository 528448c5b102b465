//! CLI binary for sdg-insights.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, runs one command and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sdg_insights::{
    sdg, AnalysisConfig, AnalysisError, AnalysisProgressCallback, AnalysisRequest, AnalysisResult,
    Analyzer, PdfUpload, ProgressCallback, Stage,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that shows the current pipeline stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Analyzing");
        bar.set_message("starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_analysis_complete(&self, result: &AnalysisResult) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Classified under {}",
            green("✔"),
            bold(&format!("SDG {}", result.sdg_primary))
        );
    }

    fn on_analysis_error(&self, error: &AnalysisError) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(&error.to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a local PDF
  sdg-insights analyze --pdf paper.pdf

  # Analyse an open-access PubMed Central article
  sdg-insights analyze --pmcid PMC7654321 --json

  # Analyse pasted text with a known title
  sdg-insights analyze --text-file abstract.txt --title "Urban heat islands"

  # Find recent open-access papers for SDG 6, narrowed by keywords
  sdg-insights search --sdg 6 --keywords "groundwater"

  # Run the HTTP API
  sdg-insights serve --addr 0.0.0.0:3000

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter, e.g. sdg_insights=debug
"#;

/// Turn research papers into SDG-classified lessons and challenges.
#[derive(Parser, Debug)]
#[command(
    name = "sdg-insights",
    version,
    about = "Turn research papers into SDG-classified lessons and challenges",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    llm: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SDG_INSIGHTS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "SDG_INSIGHTS_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Model ID (default: gemini-2.0-flash).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "SDG_INSIGHTS_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "SDG_INSIGHTS_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Model call timeout in seconds (0 disables).
    #[arg(long, global = true, env = "SDG_INSIGHTS_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// PMC request timeout in seconds (0 disables).
    #[arg(long, global = true, env = "SDG_INSIGHTS_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// NCBI E-utilities base URL.
    #[arg(long, global = true, env = "SDG_INSIGHTS_EUTILS_URL")]
    eutils_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one paper.
    Analyze(AnalyzeArgs),
    /// Search open-access PMC papers for an SDG.
    Search(SearchArgs),
    /// Serve the HTTP API.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("source")
        .required(true)
        .args(["pdf", "text", "text_file", "pmcid"])
))]
struct AnalyzeArgs {
    /// PDF file to analyse (max 20 MB).
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Paper text given inline.
    #[arg(long)]
    text: Option<String>,

    /// File containing the paper text.
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// PubMed Central identifier, e.g. PMC7654321.
    #[arg(long)]
    pmcid: Option<String>,

    /// Paper title, if known.
    #[arg(long)]
    title: Option<String>,

    /// Print the result as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "SDG_INSIGHTS_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Goal number (1–17).
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=17))]
    sdg: i64,

    /// Extra keywords ANDed with the goal's query.
    #[arg(long)]
    keywords: Option<String>,

    /// Maximum number of papers.
    #[arg(long, default_value_t = 10)]
    max_results: usize,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "SDG_INSIGHTS_ADDR", default_value = "0.0.0.0:3000")]
    addr: std::net::SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers progress feedback for `analyze`; keep library
    // logs at warn there unless asked for more.
    let spinner = matches!(&cli.command, Command::Analyze(a) if !a.no_progress && !a.json);
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if spinner {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Analyze(args) => {
            let progress: Option<ProgressCallback> = if spinner && !cli.quiet {
                Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
            } else {
                None
            };
            run_analyze(&cli, args, progress).await
        }
        Command::Search(args) => run_search(&cli, args).await,
        Command::Serve(args) => run_serve(&cli, args).await,
    }
}

async fn run_analyze(
    cli: &Cli,
    args: &AnalyzeArgs,
    progress: Option<ProgressCallback>,
) -> Result<()> {
    let request = build_request(args).await?;
    let config = build_config(&cli.llm, progress, None)?;
    let analyzer = Analyzer::from_config(config).context("Failed to configure the model")?;

    let result = analyzer.analyze(request).await.context("Analysis failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
        println!("{json}");
    } else {
        print!("{}", result.render_text());
    }
    Ok(())
}

async fn run_search(cli: &Cli, args: &SearchArgs) -> Result<()> {
    let config = build_config(&cli.llm, None, Some(args.max_results))?;
    let records = sdg_insights::EutilsClient::from_config(&config)?;
    let papers = sdg_insights::search_papers(
        &records,
        args.sdg,
        args.keywords.as_deref(),
        config.search_max_results,
    )
    .await
    .context("PMC search failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&serde_json::json!({ "papers": papers }))
            .context("Failed to serialise results")?;
        println!("{json}");
        return Ok(());
    }

    let label = u8::try_from(args.sdg)
        .ok()
        .and_then(sdg::label)
        .unwrap_or("Unknown");
    if !cli.quiet {
        eprintln!(
            "{} {} papers for SDG {} ({})",
            green("✔"),
            papers.len(),
            args.sdg,
            label
        );
    }
    for p in &papers {
        println!("{}  {}", bold(&p.pmcid), p.title);
        println!("   {}", dim(&format!("{} · {} · {}", p.authors, p.journal, p.date)));
    }
    Ok(())
}

async fn run_serve(cli: &Cli, args: &ServeArgs) -> Result<()> {
    dotenvy::dotenv().ok();
    let config = build_config(&cli.llm, None, None)?;
    let state = sdg_insights::server::AppState::from_config(config)
        .context("Failed to configure the server")?;
    sdg_insights::server::serve(args.addr, state)
        .await
        .with_context(|| format!("Server on {} failed", args.addr))
}

/// Map CLI source flags to an `AnalysisRequest`.
async fn build_request(args: &AnalyzeArgs) -> Result<AnalysisRequest> {
    let request = if let Some(ref path) = args.pdf {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        AnalysisRequest::pdf(PdfUpload {
            filename: file_name(path),
            content_type: content_type_for(path).to_string(),
            data,
        })
    } else if let Some(ref path) = args.text_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        AnalysisRequest::text(text)
    } else if let Some(ref text) = args.text {
        AnalysisRequest::text(text.clone())
    } else {
        AnalysisRequest::remote(args.pmcid.clone().unwrap_or_default())
    };
    Ok(request.with_title(args.title.clone()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".to_string())
}

/// Declared type from the extension, the way a browser would label it.
fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(
    args: &ModelArgs,
    progress: Option<ProgressCallback>,
    max_results: Option<usize>,
) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .api_timeout_secs(args.api_timeout)
        .fetch_timeout_secs(args.fetch_timeout);

    if let Some(ref m) = args.model {
        builder = builder.model(m);
    }
    if let Some(ref p) = args.provider {
        builder = builder.provider_name(p);
    }
    if let Some(ref url) = args.eutils_url {
        builder = builder.eutils_base_url(url);
    }
    if let Some(n) = max_results {
        builder = builder.search_max_results(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_requires_a_source() {
        assert!(Cli::try_parse_from(["sdg-insights", "analyze"]).is_err());
        assert!(Cli::try_parse_from(["sdg-insights", "analyze", "--pmcid", "PMC1"]).is_ok());
    }

    #[test]
    fn sources_are_exclusive() {
        let r = Cli::try_parse_from([
            "sdg-insights",
            "analyze",
            "--pmcid",
            "PMC1",
            "--text",
            "x",
        ]);
        assert!(r.is_err());
    }

    #[test]
    fn search_sdg_range() {
        assert!(Cli::try_parse_from(["sdg-insights", "search", "--sdg", "18"]).is_err());
        assert!(Cli::try_parse_from(["sdg-insights", "search", "--sdg", "17"]).is_ok());
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for(Path::new("a/paper.PDF")), "application/pdf");
        assert_eq!(content_type_for(Path::new("notes.txt")), "application/octet-stream");
    }
}
