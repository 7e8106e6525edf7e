//! The `examdesk results` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examdesk_core::traits::ExamStore;
use examdesk_store::ExamdeskConfig;

use super::open_store;

pub async fn execute(
    data: Option<PathBuf>,
    config: &ExamdeskConfig,
    student: Option<u64>,
    exam: Option<u64>,
) -> Result<()> {
    let store: Arc<dyn ExamStore> = Arc::new(open_store(data, config)?);

    let results = match (student, exam) {
        (Some(student_id), exam) => store
            .get_results_by_student(student_id)
            .await?
            .into_iter()
            .filter(|r| exam.map_or(true, |id| r.exam.id == id))
            .collect(),
        (None, Some(exam_id)) => store.get_results_by_exam(exam_id).await?,
        (None, None) => store.get_results().await?,
    };

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Student", "Exam", "Score", "Percentage", "Submitted"]);
    for r in &results {
        table.add_row(vec![
            Cell::new(r.result.id),
            Cell::new(&r.student.name),
            Cell::new(&r.exam.name),
            Cell::new(format!("{:.1} / {}", r.result.score, r.exam.total_marks)),
            Cell::new(format!("{:.2}%", r.result.percentage)),
            Cell::new(r.result.submitted_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    println!("{table}");
    println!("{} result(s)", results.len());
    Ok(())
}
