use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tweet_sentiment::collector::{Collector, SearchSettings};
use tweet_sentiment::config::AppConfig;
use tweet_sentiment::db::Store;
use tweet_sentiment::logging::init_logging;
use tweet_sentiment::nlp::SentimentScorer;
use tweet_sentiment::service::{CollectionService, ServiceSettings, TermReport};
use tweet_sentiment::twitter::TwitterClient;
use tweet_sentiment::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file layered over config/default and config/local
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect, score and store every configured search term
    Run,
    /// Collect, score and store a single search term
    Search {
        /// Search term
        #[arg(short, long)]
        term: String,

        /// Maximum number of tweets (at most 1000)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print the sentiment scores of a text
    Score {
        /// Text to score
        text: String,
    },
    /// List the tables in the store with their row counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
        config.validate()?;
    }

    // Initialize logging
    let _guard = init_logging(&config.logging)?;

    info!("Starting tweet-sentiment");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let terms = config.collection.terms.clone();
            let mut service = build_service(&config).await?;
            let reports = service.run_all(&terms).await?;
            print_reports(&reports);
        },
        Commands::Search { term, limit } => {
            let limit = limit.unwrap_or(config.collection.limit);
            InputValidator::validate_search_limit(limit)?;
            let mut service = build_service(&config).await?;
            let report = service.run_term(&term, limit).await?;
            service.metrics().log_summary();
            print_reports(&[report]);
        },
        Commands::Score { text } => score_text(&config, &text)?,
        Commands::Stats => show_stats(&config)?,
    }

    Ok(())
}

fn build_scorer(config: &AppConfig) -> Result<SentimentScorer> {
    let lexicon_path = config.sentiment.lexicon_path.as_deref().map(Path::new);
    SentimentScorer::from_lexicon_path(lexicon_path).context("Failed to load the sentiment lexicon")
}

async fn build_service(config: &AppConfig) -> Result<CollectionService> {
    let scorer = build_scorer(config)?;
    let store = Store::new(config.store_path())?;
    let settings = ServiceSettings::from_config(config)?;

    let credentials = config.credentials()?;
    let client = TwitterClient::new(credentials, &config.twitter.api_base_url)?;
    let collector = Collector::connect(Box::new(client), SearchSettings::from(&config.twitter))
        .await
        .context("Failed to connect to the search API")?;

    Ok(CollectionService::new(collector, scorer, store, settings))
}

#[allow(clippy::print_stdout)]
fn print_reports(reports: &[TermReport]) {
    for report in reports {
        let rows = |rows: Option<usize>| rows.map_or_else(|| "failed".to_string(), |n| n.to_string());
        println!(
            "{}: fetched {}, {} rows -> {}, {} rows -> {} (positive {}, neutral {}, negative {})",
            report.term,
            report.fetched,
            rows(report.raw_rows),
            report.raw_table,
            rows(report.scored_rows),
            report.scored_table,
            report.positive,
            report.neutral,
            report.negative
        );
    }
}

#[allow(clippy::print_stdout)]
fn score_text(config: &AppConfig, text: &str) -> Result<()> {
    let scorer = build_scorer(config)?;
    let cleaned = scorer.clean_text(text);
    let scores = scorer.score(&cleaned);

    println!("neg_score:      {:.3}", scores.neg);
    println!("neutral_score:  {:.3}", scores.neu);
    println!("pos_score:      {:.3}", scores.pos);
    println!("compound_score: {:.4}", scores.compound);
    println!("Sentiment:      {}", scores.label());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn show_stats(config: &AppConfig) -> Result<()> {
    let store = Store::new(config.store_path())?;
    let tables = store.list_tables()?;
    if tables.is_empty() {
        warn!(path = %store.path().display(), "Store has no tables");
        return Ok(());
    }

    println!("{}", store.path().display());
    for table in tables {
        let rows = store.row_count(&table)?;
        println!("  {table:<32} {rows:>8}");
    }
    Ok(())
}
