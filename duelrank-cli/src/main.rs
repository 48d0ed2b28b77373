mod config;
mod llm;
mod output;
mod parse;
mod prompt;

use clap::{Parser, ValueEnum};
use duelrank_core::{
    compare_all_comparisons, merge_insertion_max_comparisons, merge_insertion_sort, rank_until_settled,
    CountingComparator, RankedEntry, RankedResults, TieGroup,
};
use reqwest::Client;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::llm::{JudgeSettings, LlmComparator, LlmConfig};
use crate::output::RunSummary;

const DEFAULT_TIE_ROUNDS: usize = 3;
const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_TEMPERATURE: f64 = 0.3;
const DEFAULT_RETRIES: usize = 3;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "duelrank", version, about = "Rank items with an LLM judging one pair at a time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Rank a list of items
    Rank(RankArgs),
    /// Show how many comparisons ranking n items takes with each method
    Estimate {
        /// Number of items
        n: usize,
    },
    /// Create a default config file at ~/.config/duelrank/config.toml
    Init,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Compare every pair, then re-ask within tied groups
    Exhaustive,
    /// Ford-Johnson merge-insertion; fewest comparisons, assumes a consistent judge
    MergeInsertion,
}

impl Method {
    fn label(self) -> &'static str {
        match self {
            Method::Exhaustive => "exhaustive",
            Method::MergeInsertion => "merge-insertion",
        }
    }

    fn max_comparisons(self, n: usize, tie_rounds: usize) -> usize {
        match self {
            // each tie round re-asks at most every pair once more
            Method::Exhaustive => compare_all_comparisons(n).saturating_mul(tie_rounds + 1),
            Method::MergeInsertion => merge_insertion_max_comparisons(n),
        }
    }
}

#[derive(Parser)]
struct RankArgs {
    /// The comparison criterion (e.g. "Which is more rewatchable?")
    #[arg(long)]
    criterion: String,

    /// File with one item per line, or a JSON array of strings
    #[arg(long)]
    items: Option<PathBuf>,

    /// Inline item (repeatable)
    #[arg(long = "item")]
    inline_items: Vec<String>,

    /// Ranking method [default: exhaustive]
    #[arg(long, value_enum)]
    method: Option<Method>,

    /// Maximum tie-break rounds after an exhaustive ranking. Default: 3
    #[arg(long)]
    tie_rounds: Option<usize>,

    /// OpenAI-compatible base URL (e.g. http://localhost:8000)
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer token for the API (also reads OPENAI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Model ID for the API
    #[arg(long)]
    model: Option<String>,

    /// LLM sampling temperature. Default: 0.3
    #[arg(long)]
    temperature: Option<f64>,

    /// How much analysis the LLM should write before its verdict.
    /// Default: "2 paragraphs". Examples: "3 sentences", "1 paragraph".
    #[arg(long)]
    analysis_length: Option<String>,

    /// Max retries per comparison. Default: 3. Set to 0 to disable.
    #[arg(long)]
    retries: Option<usize>,

    /// Max concurrent LLM requests. Only tie-break groups run in parallel. Default: 8
    #[arg(long)]
    concurrency: Option<usize>,

    /// Path to a custom prompt template file.
    /// The template must contain: $criterion, $option1, $option2, $length
    #[arg(long)]
    prompt_template: Option<PathBuf>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    /// Log every comparison and retry
    #[arg(short, long)]
    verbose: bool,

    /// Path to config file (default: ~/.config/duelrank/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Parse a string as either a JSON array of strings or plain text (one item per line).
fn parse_items_from_str(content: &str) -> Result<Vec<String>, serde_json::Error> {
    let trimmed = content.trim();
    if trimmed.starts_with('[') {
        let items: Vec<String> = serde_json::from_str(trimmed)?;
        Ok(items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else {
        Ok(trimmed
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Load items from all sources: --items file, --item inline args, or stdin.
fn load_items(args: &RankArgs) -> Vec<String> {
    let mut items = Vec::new();

    if let Some(ref path) = args.items {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| bail(format!("Failed to read items file {}: {e}", path.display())));
        items = parse_items_from_str(&content)
            .unwrap_or_else(|e| bail(format!("{} looks like JSON but failed to parse: {e}", path.display())));
    }

    items.extend(args.inline_items.iter().cloned());

    // stdin only if nothing else was given
    if items.is_empty() {
        let mut stdin = io::stdin();
        if stdin.is_terminal() {
            bail("No items provided. Use --items <file>, --item <name>, or pipe items via stdin.");
        }
        let mut content = String::new();
        stdin
            .read_to_string(&mut content)
            .unwrap_or_else(|e| bail(format!("Failed to read from stdin: {e}")));
        items = parse_items_from_str(&content)
            .unwrap_or_else(|e| bail(format!("stdin looks like JSON but failed to parse: {e}")));
    }

    if items.len() < 2 {
        bail(format!("Need at least 2 items to rank, got {}", items.len()));
    }
    items
}

fn init_logging(verbose: bool) {
    let default = if verbose { "warn,duelrank=debug" } else { "warn,duelrank=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank(args) => {
            init_logging(args.verbose);
            run_rank(args).await
        }
        Commands::Estimate { n } => print_estimate(n),
        Commands::Init => {
            let path = config::create_default_config();
            println!("Created config at {}", path.display());
            println!("Edit it to set your default endpoint, model, etc.");
        }
    }
}

fn print_estimate(n: usize) {
    println!("{n} items");
    println!("  exhaustive:      {} comparisons, plus tie-breaks", compare_all_comparisons(n));
    println!("  merge-insertion: at most {} comparisons", merge_insertion_max_comparisons(n));
}

async fn run_rank(args: RankArgs) {
    // Load config file, merge with CLI args (CLI wins)
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let endpoint = args.endpoint.clone().or(cfg.endpoint).unwrap_or_else(|| {
        bail(format!("No endpoint specified. Pass --endpoint or set it in {}", config_path.display()));
    });
    let model = args.model.clone().or(cfg.model).unwrap_or_else(|| {
        bail(format!("No model specified. Pass --model or set it in {}", config_path.display()));
    });
    let method = match (args.method, cfg.method.as_deref()) {
        (Some(m), _) => m,
        (None, Some(name)) => Method::from_str(name, true).unwrap_or_else(|_| {
            bail(format!(
                "Unknown method \"{name}\" in {}. Use \"exhaustive\" or \"merge-insertion\".",
                config_path.display()
            ))
        }),
        (None, None) => Method::Exhaustive,
    };
    let tie_rounds = args.tie_rounds.or(cfg.tie_rounds).unwrap_or(DEFAULT_TIE_ROUNDS);
    let concurrency = args.concurrency.or(cfg.concurrency).unwrap_or(DEFAULT_CONCURRENCY);
    if concurrency == 0 {
        bail("--concurrency must be at least 1");
    }
    let temperature = args.temperature.or(cfg.temperature).unwrap_or(DEFAULT_TEMPERATURE);
    if !(0.0..=2.0).contains(&temperature) {
        bail(format!("--temperature must be between 0.0 and 2.0, got {temperature}"));
    }

    // Prompt template: CLI arg > config file > built-in default
    let template = match args.prompt_template.clone().or_else(|| cfg.prompt_template.map(PathBuf::from)) {
        Some(path) => prompt::load_template(&path),
        None => prompt::DEFAULT_TEMPLATE.to_string(),
    };

    if method == Method::MergeInsertion && args.tie_rounds.is_some() {
        warn!("--tie-rounds has no effect with merge-insertion");
    }

    let items = load_items(&args);

    let api_key = args.api_key.clone().or_else(|| std::env::var("OPENAI_API_KEY").ok());

    let judge = CountingComparator::new(LlmComparator::new(
        Client::new(),
        LlmConfig {
            endpoint: endpoint.clone(),
            model: model.clone(),
            api_key,
            temperature,
        },
        JudgeSettings {
            criterion: args.criterion.clone(),
            template,
            analysis_length: args
                .analysis_length
                .clone()
                .unwrap_or_else(|| prompt::DEFAULT_ANALYSIS_LENGTH.to_string()),
            max_retries: args.retries.unwrap_or(DEFAULT_RETRIES),
            concurrency,
        },
    ));

    let max_comparisons = method.max_comparisons(items.len(), tie_rounds);
    info!(
        items = items.len(),
        method = method.label(),
        max_comparisons,
        %endpoint,
        %model,
        "ranking"
    );
    info!(criterion = %args.criterion);

    let (ranking, tie_rounds_used, unresolved): (RankedResults<String>, usize, Vec<TieGroup>) = match method {
        Method::Exhaustive => match rank_until_settled(&items, &judge, tie_rounds).await {
            Ok(settlement) => (settlement.results, settlement.tie_rounds, settlement.unresolved),
            Err(e) => bail(format!("Ranking failed after {} comparisons: {e}", judge.calls())),
        },
        Method::MergeInsertion => match merge_insertion_sort(&items, &judge).await {
            Ok(sorted) => {
                let ranking = sorted
                    .into_iter()
                    .enumerate()
                    .map(|(score, item)| RankedEntry::new(item, score))
                    .collect();
                (ranking, 0, Vec::new())
            }
            Err(e) => bail(format!("Ranking failed after {} comparisons: {e}", judge.calls())),
        },
    };

    let retries = judge.inner().retries_used();
    if !unresolved.is_empty() {
        warn!(groups = unresolved.len(), "ties remain after {tie_rounds_used} tie-break round(s)");
    }
    info!(comparisons = judge.calls(), retries, "done");

    let summary = RunSummary {
        method: method.label(),
        comparisons: judge.calls(),
        max_comparisons,
        retries,
        tie_rounds: tie_rounds_used,
        unresolved,
    };

    if args.json {
        output::print_json(&ranking, &summary);
    } else {
        output::print_table(&ranking, &summary);
    }
}
