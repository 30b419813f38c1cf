//! FarmaCheck - Compare medicine prices across Colombian pharmacies
//!
//! A command-line application that asks an AI backend with web search for
//! current medicine prices, caches the answers, and prints a price-sorted
//! comparison with direct purchase links.

use std::io::Write as _;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use farmacheck::cli::{parse_prompt_line, query_from_args, Cli, Command, PromptInput};
use farmacheck::config::Config;
use farmacheck::data::{FetchError, GeminiClient};
use farmacheck::output::{render_comparison, render_stats};
use farmacheck::session::{push_history, suggestions, SessionState, SessionStore, MAX_HISTORY};
use farmacheck::{
    classify_product_url, LinkVerdict, MedicineResult, PriceComparison, PriceSearch, ResultCache,
};

const PROMPT_HELP: &str = "Type a medicine name to search. Commands: \
    :r refresh the last search, :s <text> suggest from history, :stats cache statistics, :q quit.";

/// Sets up logging to stderr, filtered by `RUST_LOG` (default `warn`)
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Saved session plus the store it came from, if any
struct Session {
    store: Option<SessionStore>,
    state: SessionState,
}

impl Session {
    fn open(config: &Config) -> Self {
        let store = match &config.data_dir {
            Some(dir) => Some(SessionStore::with_dir(dir)),
            None => SessionStore::new(),
        };
        let state = store.as_ref().map(SessionStore::load).unwrap_or_default();
        Self { store, state }
    }

    /// Remembers a completed search, on disk when a store is available
    fn record(&mut self, query: &str, results: &[MedicineResult]) {
        let history = match &self.store {
            Some(store) => store
                .record_search(query, results, &self.state.history)
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Could not save session");
                    push_history(&self.state.history, query, MAX_HISTORY)
                }),
            None => push_history(&self.state.history, query, MAX_HISTORY),
        };

        self.state.history = history;
        self.state.last_query = Some(query.to_string());
        self.state.last_results = (!results.is_empty()).then(|| results.to_vec());
    }
}

fn build_search(config: &Config) -> Result<PriceSearch<GeminiClient>> {
    if config.api_key.is_none() {
        return Err(FetchError::MissingApiKey.into());
    }

    let client = GeminiClient::new(config.api_key.clone())
        .with_model(&config.model)
        .with_base_url(&config.api_base);

    Ok(PriceSearch::new(ResultCache::new(config.cache.clone()), client))
}

async fn run_query(
    search: &PriceSearch<GeminiClient>,
    session: &mut Session,
    query: &str,
    force_refresh: bool,
) {
    let results = search.search(query, force_refresh).await;
    session.record(query, &results);
    print!("{}", render_comparison(&PriceComparison::new(results)));
}

/// Reads queries from stdin until `:q` or end of input
async fn run_prompt(search: PriceSearch<GeminiClient>, session: &mut Session) -> Result<()> {
    if let (Some(query), Some(results)) = (&session.state.last_query, &session.state.last_results) {
        println!("Last search: {}", query);
        print!("{}", render_comparison(&PriceComparison::new(results.clone())));
    }
    println!("{}", PROMPT_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current = session.state.last_query.clone();

    loop {
        print!("farmacheck> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_prompt_line(&line) {
            PromptInput::Empty => continue,
            PromptInput::Quit => break,
            PromptInput::Help => println!("{}", PROMPT_HELP),
            PromptInput::Stats => {
                println!("{}", render_stats(&search.stats(), search.cache().len()));
            }
            PromptInput::Suggest(term) => {
                let found = suggestions(&session.state.history, &term);
                if found.is_empty() {
                    println!("No suggestions.");
                }
                for suggestion in found {
                    println!("  {}", suggestion);
                }
            }
            PromptInput::Refresh => match current.clone() {
                Some(query) => run_query(&search, session, &query, true).await,
                None => println!("Nothing to refresh yet."),
            },
            PromptInput::Search(query) => {
                run_query(&search, session, &query, false).await;
                current = Some(query);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    let mut session = Session::open(&config);

    match cli.command {
        Some(Command::Search {
            query,
            refresh,
            json,
        }) => {
            let query = query_from_args(&query)?;
            let search = build_search(&config)?;
            let results = search.search(&query, refresh).await;
            session.record(&query, &results);

            let comparison = PriceComparison::new(results);
            if json {
                println!("{}", serde_json::to_string_pretty(comparison.results())?);
            } else {
                print!("{}", render_comparison(&comparison));
            }
        }
        Some(Command::History) => {
            if session.state.history.is_empty() {
                println!("No searches yet.");
            }
            for (i, query) in session.state.history.iter().enumerate() {
                println!("{:>2}. {}", i + 1, query);
            }
        }
        Some(Command::Last) => match (&session.state.last_query, session.state.last_results) {
            (Some(query), Some(results)) => {
                println!("Last search: {}", query);
                print!("{}", render_comparison(&PriceComparison::new(results)));
            }
            _ => println!("No previous search."),
        },
        Some(Command::Clear) => {
            if let Some(store) = &session.store {
                store.clear_last().context("Could not clear the last search")?;
            }
            println!("Last search cleared.");
        }
        Some(Command::CheckUrl { url }) => {
            let verdict = classify_product_url(&url);
            println!("{}: {}", url, verdict.describe());
            if verdict != LinkVerdict::Valid {
                return Ok(ExitCode::from(1));
            }
        }
        None => {
            let search = build_search(&config)?;
            run_prompt(search, &mut session).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
