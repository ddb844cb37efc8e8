//! papergrade - score research papers for commercialization potential
//!
//! ## Commands
//!
//! - `evaluate`: run the selected evaluators and print the scored response
//! - `agent`: run a single evaluator through the same pipeline
//! - `probe`: show which orchestration strategy this environment supports
//! - `rubric`: print the weight table and grade bands

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{debug, Level};

use papergrade_core::rubric::{GRADE_BANDS, FALLBACK_RECOMMENDATION};
use papergrade_core::{
    AnalysisService, AnalyzeInput, ApiResponse, Authors, EngineConfig, EvaluatorKind, Rubric,
};

#[derive(Parser, Debug)]
#[command(name = "papergrade")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rubric-driven commercialization scoring for research papers", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "PAPERGRADE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a paper with all (or selected) evaluators
    Evaluate {
        /// Paper text: a file path, `-` for stdin, or literal text
        #[arg(short, long)]
        text: String,

        /// Author information: a file path or literal text
        #[arg(short, long)]
        authors: Option<String>,

        /// Comma-separated evaluator kinds (default: all)
        #[arg(long, value_delimiter = ',')]
        agents: Vec<String>,

        /// Also write the response JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a single evaluator
    Agent {
        /// Evaluator kind: tech_ip, market, team, scaling, funding, impact
        kind: EvaluatorKind,

        /// Paper text: a file path, `-` for stdin, or literal text
        #[arg(short, long)]
        text: String,

        /// Author information: a file path or literal text
        #[arg(short, long)]
        authors: Option<String>,
    },

    /// Show the orchestrator cascade and which strategy is active
    Probe,

    /// Print the scoring rubric
    Rubric,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    papergrade_core::init_tracing(cli.json, level);

    let config = EngineConfig::load(cli.config.as_deref())
        .context("Failed to load papergrade configuration")?;

    match cli.command {
        Commands::Evaluate {
            text,
            authors,
            agents,
            output,
        } => {
            let service = AnalysisService::from_config(&config);
            cmd_evaluate(&service, &text, authors.as_deref(), agents, output.as_deref()).await
        }
        Commands::Agent {
            kind,
            text,
            authors,
        } => {
            let service = AnalysisService::from_config(&config);
            cmd_agent(&service, kind, &text, authors.as_deref()).await
        }
        Commands::Probe => cmd_probe(&AnalysisService::from_config(&config)),
        Commands::Rubric => {
            let rubric = Rubric::standard();
            print!("{}", render_rubric(&rubric));
            Ok(())
        }
    }
}

/// Read `arg` as a file when it names one, stdin for `-`, else use it verbatim.
fn read_input(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    let path = Path::new(arg);
    if path.is_file() {
        debug!(path = %path.display(), "reading input file");
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    Ok(arg.to_string())
}

fn build_input(text: &str, authors: Option<&str>, agents: Vec<String>) -> Result<AnalyzeInput> {
    let authors = authors.map(read_input).transpose()?;
    Ok(AnalyzeInput {
        text: Some(read_input(text)?),
        authors: authors.map(Authors::One),
        agents_to_run: (!agents.is_empty()).then_some(agents),
    })
}

fn finish(response: &ApiResponse, body: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(body)?);
    if !response.is_success() {
        bail!("evaluation failed with status {}", response.status);
    }
    Ok(())
}

async fn cmd_evaluate(
    service: &AnalysisService,
    text: &str,
    authors: Option<&str>,
    agents: Vec<String>,
    output: Option<&Path>,
) -> Result<()> {
    let input = build_input(text, authors, agents)?;
    let response = service.analyze(input).await;

    if let Some(path) = output {
        let content = serde_json::to_string_pretty(&response.body).context("serialize response")?;
        std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    }
    finish(&response, &response.body)
}

async fn cmd_agent(
    service: &AnalysisService,
    kind: EvaluatorKind,
    text: &str,
    authors: Option<&str>,
) -> Result<()> {
    let input = build_input(text, authors, vec![kind.to_string()])?;
    let response = service.analyze(input).await;
    if !response.is_success() {
        return finish(&response, &response.body);
    }
    finish(&response, &single_agent_view(&response.body, kind))
}

/// The evaluator result plus its category score, dropping the composite.
fn single_agent_view(body: &Value, kind: EvaluatorKind) -> Value {
    let category = body["category_scores"]
        .as_array()
        .and_then(|c| c.iter().find(|c| c["kind"] == kind.as_str()))
        .cloned()
        .unwrap_or(Value::Null);
    json!({
        "agent": kind,
        "result": body[kind.as_str()],
        "category": category,
        "orchestrator": body["orchestrator"],
        "run_id": body["run_id"],
    })
}

fn cmd_probe(service: &AnalysisService) -> Result<()> {
    let availability = service.availability();
    let report = json!({
        "active": availability.strategy(),
        "probes": availability.probes(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !availability.is_available() {
        bail!("no orchestrator available");
    }
    Ok(())
}

fn render_rubric(rubric: &Rubric) -> String {
    let mut out = String::new();
    out.push_str(&format!("Rubric ({} points)\n\n", rubric.max_score()));
    for category in rubric.categories() {
        out.push_str(&format!(
            "{:<24} {:>5}  [{}]\n",
            category.name, category.weight, category.kind
        ));
        for sub in category.criteria {
            out.push_str(&format!(
                "  - {:<36} {:>4.0}%  {}\n",
                sub.label,
                sub.fraction * 100.0,
                sub.key
            ));
        }
    }
    out.push_str("\nGrades\n\n");
    for band in GRADE_BANDS {
        out.push_str(&format!(
            "  >= {:>4}  {:<2}  {}\n",
            band.lower_bound, band.grade.as_str(), band.recommendation
        ));
    }
    out.push_str(&format!("  else     D   {}\n", FALLBACK_RECOMMENDATION));
    out
}
