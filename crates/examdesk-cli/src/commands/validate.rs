//! The `examdesk validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examdesk_core::seed::{load_seed, validate_seed};
use examdesk_store::ExamdeskConfig;

use super::resolve_data_path;

pub fn execute(data: Option<PathBuf>, config: &ExamdeskConfig) -> Result<()> {
    let path = resolve_data_path(data, config)?;
    let seed = load_seed(&path)?;

    println!(
        "Seed: {} ({} students, {} exams, {} results, {} accounts)",
        path.display(),
        seed.students.len(),
        seed.exams.len(),
        seed.results.len(),
        seed.accounts.len()
    );

    let warnings = validate_seed(&seed);
    for w in &warnings {
        println!("  [{} #{}] WARNING: {}", w.section, w.position, w.message);
    }

    if warnings.is_empty() {
        println!("Seed file valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
