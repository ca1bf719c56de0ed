use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use upstatic_config::{init_tracing, json_schema, load_for_root, UpstaticConfig};
use upstatic_rank::{filter, score, CandidateStore, OrderedResultList, ResultKind};
use upstatic_suggest::{SessionSnapshot, SuggestSession};

mod script;

use script::Step;

#[derive(Parser)]
#[command(
    name = "upstatic",
    version,
    about = "Upstatic search suggestions (scoring, ranking, scripted sessions)"
)]
struct Cli {
    /// Config file (defaults to `upstatic.toml` discovery in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score one haystack against one abbreviation
    Score(ScoreArgs),
    /// Rank a candidate list against a query
    Rank(RankArgs),
    /// Replay a key script through a live suggestion session
    Session(SessionArgs),
    /// Print the JSON schema of the config file
    Schema,
}

#[derive(Args)]
struct ScoreArgs {
    haystack: String,
    abbreviation: String,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RankArgs {
    /// Query as typed; it is lowercased before scoring
    query: String,
    /// Candidate file, one title per line (defaults to stdin)
    #[arg(long)]
    candidates: Option<PathBuf>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SessionArgs {
    /// Candidate file, one title per line
    #[arg(long)]
    candidates: PathBuf,
    /// Script file (defaults to stdin)
    #[arg(long)]
    script: Option<PathBuf>,
    /// Emit one JSON object per step
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);
    for warning in config.validate() {
        tracing::warn!(target: "upstatic.config", ?warning, "config warning");
    }

    match cli.command {
        Command::Score(args) => {
            let value = score(&args.haystack, &args.abbreviation);
            if args.json {
                println!("{}", serde_json::json!({ "score": value }));
            } else {
                println!("{value}");
            }
            Ok(0)
        }
        Command::Rank(args) => {
            let store = read_candidates(args.candidates.as_deref())?;
            let results = filter(&store, &args.query);
            let rows = result_rows(&store, &results);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!("{:.4}\t{}\t{}", row.score, row.index, row.text);
                }
            }
            Ok(if rows.is_empty() { 1 } else { 0 })
        }
        Command::Session(args) => {
            let store = read_candidates(Some(&args.candidates))?;
            let script = match args.script.as_deref() {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read script {}", path.display()))?,
                None => {
                    let mut text = String::new();
                    std::io::stdin()
                        .read_to_string(&mut text)
                        .context("failed to read script from stdin")?;
                    text
                }
            };
            let steps = script::parse(&script)?;
            replay(store, &config, steps, args.json)?;
            Ok(0)
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&json_schema())?);
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<UpstaticConfig> {
    match path {
        Some(path) => UpstaticConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => {
            let cwd = std::env::current_dir().context("failed to determine current directory")?;
            load_for_root(&cwd).context("failed to load config")
        }
    }
}

fn read_candidates(path: Option<&Path>) -> Result<CandidateStore> {
    let mut bytes = Vec::new();
    match path {
        Some(path) => {
            bytes = std::fs::read(path)
                .with_context(|| format!("failed to read candidates {}", path.display()))?;
        }
        None => {
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("failed to read candidates from stdin")?;
        }
    }

    let mut lines: Vec<&[u8]> = bytes
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    Ok(CandidateStore::try_from_bytes(lines)?)
}

#[derive(Debug, Serialize)]
struct ResultRow {
    index: usize,
    text: String,
    score: f64,
}

fn result_rows(store: &CandidateStore, results: &OrderedResultList) -> Vec<ResultRow> {
    results
        .matches()
        .iter()
        .filter_map(|m| {
            store.get(m.candidate_index).map(|candidate| ResultRow {
                index: m.candidate_index,
                text: candidate.text().to_owned(),
                score: m.score,
            })
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct StepReport {
    step: String,
    query: String,
    kind: &'static str,
    results: Vec<ResultRow>,
    active: Option<usize>,
    focused: bool,
    list_open: bool,
    loading: bool,
    pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<usize>,
}

impl StepReport {
    fn new(step: &Step, snapshot: SessionSnapshot, store: &CandidateStore) -> Self {
        Self {
            step: step.label(),
            kind: match snapshot.results.kind() {
                ResultKind::Unfiltered => "unfiltered",
                ResultKind::Ranked => "ranked",
            },
            results: result_rows(store, &snapshot.results),
            active: snapshot.navigator.active,
            focused: snapshot.focused,
            list_open: snapshot.list_open,
            loading: snapshot.loading,
            pending: snapshot.pending,
            query: snapshot.query,
            selected: None,
        }
    }

    fn print_human(&self) {
        println!("> {}", self.step);
        println!(
            "  query={:?} {} open={} focused={} loading={} pending={}",
            self.query, self.kind, self.list_open, self.focused, self.loading, self.pending
        );
        for row in &self.results {
            let marker = if self.active == Some(row.index) { '*' } else { ' ' };
            println!("  {marker} {:.4}\t{}\t{}", row.score, row.index, row.text);
        }
        if let Some(index) = self.selected {
            println!("  selected {index}");
        }
    }
}

fn replay(
    store: CandidateStore,
    config: &UpstaticConfig,
    steps: Vec<Step>,
    json: bool,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    runtime.block_on(async {
        let session =
            SuggestSession::new(tokio::runtime::Handle::current(), store, &config.suggest);

        for step in &steps {
            let submission = match step {
                Step::Key(key) => session.on_key(key.clone()),
                Step::Wait(duration) => {
                    tokio::time::sleep(*duration).await;
                    None
                }
                Step::Focus => {
                    session.on_focus();
                    None
                }
                Step::Blur => {
                    session.on_blur();
                    None
                }
                Step::Hover(index) => {
                    session.hover(*index);
                    None
                }
                Step::Unhover(index) => {
                    session.unhover(*index);
                    None
                }
                Step::Click(index) => Some(session.click(*index)),
            };

            let store = session.store();
            let mut report = StepReport::new(step, session.snapshot(), &store);
            report.selected = submission.and_then(|s| s.selected);
            if json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                report.print_human();
            }
        }

        session.stop();
        Ok::<_, anyhow::Error>(())
    })
}
