//! The `examdesk export` command.

use std::path::PathBuf;

use anyhow::Result;

use examdesk_store::ExamdeskConfig;

use super::open_store;

pub fn execute(data: Option<PathBuf>, config: &ExamdeskConfig, output: PathBuf) -> Result<()> {
    let store = open_store(data, config)?;

    let orphans = store.integrity_report();
    for issue in &orphans {
        tracing::warn!("integrity: {issue}");
    }

    let snapshot = store.snapshot();
    snapshot.save_json(&output)?;

    println!(
        "Exported {} record(s) to {} (snapshot {})",
        snapshot.record_count(),
        output.display(),
        snapshot.id
    );
    Ok(())
}
