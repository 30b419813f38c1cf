//! Persisted search session
//!
//! Stores the last query, its results and a short search history as JSON files
//! in an XDG-compliant data directory, so the next run can show the previous
//! search and offer suggestions.

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::data::MedicineResult;

/// Maximum number of queries kept in the history
pub const MAX_HISTORY: usize = 10;

/// Maximum number of suggestions offered for a partial query
pub const MAX_SUGGESTIONS: usize = 5;

const LAST_QUERY_FILE: &str = "last_query.json";
const LAST_RESULTS_FILE: &str = "last_results.json";
const HISTORY_FILE: &str = "search_history.json";

/// Everything restored at startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// The query of the last completed search
    pub last_query: Option<String>,
    /// Results of the last completed search, if any were found
    pub last_results: Option<Vec<MedicineResult>>,
    /// Distinct past queries, most recent first
    pub history: Vec<String>,
}

/// Reads and writes session files on disk
///
/// Uses `~/.local/share/farmacheck/` on Linux, or the equivalent data
/// directory on other platforms.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Creates a store in the platform data directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("co", "", "farmacheck")?;
        Some(Self {
            dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Creates a store in a custom directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the session files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the saved session
    ///
    /// Missing or unreadable files yield empty values. An empty saved result
    /// list is treated as no results.
    pub fn load(&self) -> SessionState {
        let last_query = self.read::<String>(LAST_QUERY_FILE);
        let last_results = self
            .read::<Vec<MedicineResult>>(LAST_RESULTS_FILE)
            .filter(|results| !results.is_empty());
        let history = self.read::<Vec<String>>(HISTORY_FILE).unwrap_or_default();

        SessionState {
            last_query,
            last_results,
            history,
        }
    }

    /// Saves a completed search and returns the updated history
    ///
    /// # Arguments
    /// * `query` - The query as the user typed it
    /// * `results` - The results shown for it
    /// * `history` - The history before this search
    pub fn record_search(
        &self,
        query: &str,
        results: &[MedicineResult],
        history: &[String],
    ) -> io::Result<Vec<String>> {
        let history = push_history(history, query, MAX_HISTORY);

        self.write(HISTORY_FILE, &history)?;
        self.write(LAST_QUERY_FILE, &query)?;
        self.write(LAST_RESULTS_FILE, &results)?;

        Ok(history)
    }

    /// Forgets the last query and results, keeping the history
    pub fn clear_last(&self) -> io::Result<()> {
        for name in [LAST_QUERY_FILE, LAST_RESULTS_FILE] {
            match fs::remove_file(self.dir.join(name)) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                _ => {}
            }
        }
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.dir.join(name);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.dir.join(name), json)
    }
}

/// Prepends `query` to `history`, dropping case-insensitive duplicates
///
/// The result holds at most `limit` entries, most recent first.
pub fn push_history(history: &[String], query: &str, limit: usize) -> Vec<String> {
    let lowered = query.to_lowercase();
    std::iter::once(query.to_string())
        .chain(
            history
                .iter()
                .filter(|past| past.to_lowercase() != lowered)
                .cloned(),
        )
        .take(limit)
        .collect()
}

/// History entries that extend a partially typed query
///
/// Only kicks in once the trimmed term has more than one character. Entries
/// must contain the term case-insensitively and must not equal it.
pub fn suggestions<'a>(history: &'a [String], term: &str) -> Vec<&'a str> {
    if term.trim().chars().count() <= 1 {
        return Vec::new();
    }

    let term = term.to_lowercase();
    history
        .iter()
        .filter(|past| {
            let past = past.to_lowercase();
            past.contains(&term) && past != term
        })
        .map(String::as_str)
        .take(MAX_SUGGESTIONS)
        .collect()
}
