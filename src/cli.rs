//! Command-line interface parsing for FarmaCheck
//!
//! This module handles parsing of CLI arguments using clap, and of the lines
//! typed at the interactive prompt.

use clap::{Parser, Subcommand};
use thiserror::Error;

/// Error types for CLI argument parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// The query was empty after trimming
    #[error("Empty query: type the name of a medicine, e.g. 'ibuprofeno 400mg'")]
    EmptyQuery,
}

/// FarmaCheck - Compare medicine prices across Colombian pharmacies
#[derive(Parser, Debug)]
#[command(name = "farmacheck")]
#[command(about = "Medicine price comparison across Colombian pharmacies")]
#[command(version)]
pub struct Cli {
    /// What to do; without a command an interactive prompt starts
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search prices for a medicine
    ///
    /// Examples:
    ///   farmacheck search ibuprofeno 400mg
    ///   farmacheck search losartan --refresh
    Search {
        /// Medicine name, brand or generic
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Ignore cached results and ask the backend again
        #[arg(long)]
        refresh: bool,
        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show recent searches
    History,
    /// Show the results of the last search
    Last,
    /// Forget the last search (history is kept)
    Clear,
    /// Check whether a URL is a direct product page
    CheckUrl {
        /// URL to classify
        url: String,
    },
}

/// Joins the words of a query given as separate arguments
///
/// # Returns
/// * `Ok(String)` with the words joined by single spaces
/// * `Err(CliError::EmptyQuery)` if nothing but whitespace was given
pub fn query_from_args(words: &[String]) -> Result<String, CliError> {
    let query = words
        .iter()
        .flat_map(|word| word.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    if query.is_empty() {
        Err(CliError::EmptyQuery)
    } else {
        Ok(query)
    }
}

/// A line typed at the interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    /// Search for the given query
    Search(String),
    /// Refetch the last query, bypassing the cache
    Refresh,
    /// Show history entries matching a partial query
    Suggest(String),
    /// Show cache statistics
    Stats,
    /// Show the prompt commands
    Help,
    /// Leave the prompt
    Quit,
    /// Nothing typed
    Empty,
}

/// Parses a prompt line
///
/// Lines starting with `:` are commands; anything else is a query.
pub fn parse_prompt_line(line: &str) -> PromptInput {
    let line = line.trim();
    if line.is_empty() {
        return PromptInput::Empty;
    }

    let Some(command) = line.strip_prefix(':') else {
        return PromptInput::Search(line.to_string());
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    match name {
        "r" | "refresh" => PromptInput::Refresh,
        "s" | "suggest" => PromptInput::Suggest(rest.to_string()),
        "stats" => PromptInput::Stats,
        "q" | "quit" | "exit" => PromptInput::Quit,
        _ => PromptInput::Help,
    }
}
