//! The `examdesk stats` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examdesk_core::traits::ExamStore;
use examdesk_store::ExamdeskConfig;

use super::open_store;

pub async fn execute(data: Option<PathBuf>, config: &ExamdeskConfig) -> Result<()> {
    let store: Arc<dyn ExamStore> = Arc::new(open_store(data, config)?);
    let stats = store.get_statistics().await?;

    let mut table = Table::new();
    table.set_header(vec!["", "Count"]);
    table.add_row(vec![Cell::new("Students"), Cell::new(stats.total_students)]);
    table.add_row(vec![Cell::new("Upcoming exams"), Cell::new(stats.upcoming_exams)]);
    table.add_row(vec![Cell::new("Active exams"), Cell::new(stats.active_exams)]);
    table.add_row(vec![Cell::new("Completed exams"), Cell::new(stats.completed_exams)]);
    table.add_row(vec![Cell::new("Total exams"), Cell::new(stats.total_exams())]);

    println!("{table}");
    Ok(())
}
