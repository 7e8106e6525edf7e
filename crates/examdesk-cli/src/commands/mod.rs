//! Subcommand implementations and the helpers they share.

pub mod dashboard;
pub mod export;
pub mod init;
pub mod ranking;
pub mod results;
pub mod stats;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use examdesk_core::seed::{load_seed, validate_seed};
use examdesk_store::{ExamdeskConfig, MemoryStore, StoreSnapshot};

/// `--data` if given, else the configured `data_path`.
pub fn resolve_data_path(data: Option<PathBuf>, config: &ExamdeskConfig) -> Result<PathBuf> {
    match data.or_else(|| config.data_path.clone()) {
        Some(path) => Ok(path),
        None => bail!("no data file: pass --data or set data_path in examdesk.toml"),
    }
}

/// Build a store from a seed TOML or a snapshot JSON, chosen by extension.
pub fn open_store(data: Option<PathBuf>, config: &ExamdeskConfig) -> Result<MemoryStore> {
    let path = resolve_data_path(data, config)?;
    if is_snapshot(&path) {
        let snapshot = StoreSnapshot::load_json(&path)?;
        return Ok(MemoryStore::from_snapshot(snapshot, config.store));
    }

    let seed = load_seed(&path)?;
    for warning in validate_seed(&seed) {
        tracing::warn!(
            section = warning.section,
            position = warning.position,
            "seed: {}",
            warning.message
        );
    }
    MemoryStore::from_seed(seed, config.store)
        .with_context(|| format!("failed to load seed into store: {}", path.display()))
}

fn is_snapshot(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Output format for commands that can print JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => bail!("unknown format '{other}', expected text or json"),
        }
    }
}

/// Render an optional score with one decimal, or a dash.
pub fn fmt_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{s:.1}"))
}
