//! The `examdesk ranking` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use examdesk_core::traits::ExamStore;
use examdesk_store::ExamdeskConfig;

use super::{fmt_score, open_store, Format};

pub async fn execute(
    data: Option<PathBuf>,
    config: &ExamdeskConfig,
    exam_id: u64,
    format: String,
) -> Result<()> {
    let format = Format::parse(&format)?;
    let store: Arc<dyn ExamStore> = Arc::new(open_store(data, config)?);

    let exam = store
        .get_exam(exam_id)
        .await?
        .with_context(|| format!("exam {exam_id} not found"))?;
    let ranking = store
        .get_exam_ranking(exam_id)
        .await?
        .with_context(|| format!("exam {exam_id} not found"))?;
    let summary = store
        .get_exam_summary(exam_id)
        .await?
        .with_context(|| format!("exam {exam_id} not found"))?;

    if format == Format::Json {
        let body = serde_json::json!({
            "exam": exam,
            "ranking": ranking,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!(
        "{} ({}, {}) - {} participant(s)",
        exam.name, exam.subject, exam.date, ranking.total_participants
    );

    let mut table = Table::new();
    table.set_header(vec!["Rank", "Student", "Score", "Percentage"]);
    for entry in &ranking.entries {
        let name = match store.get_student(entry.student_id).await? {
            Some(student) => student.name,
            None => format!("(student {} removed)", entry.student_id),
        };
        table.add_row(vec![
            Cell::new(entry.rank),
            Cell::new(name),
            Cell::new(format!("{:.1} / {}", entry.score, exam.total_marks)),
            Cell::new(format!("{:.2}%", entry.percentage)),
        ]);
    }
    println!("{table}");

    println!(
        "Average: {:.2}%  Median: {:.2}%  Highest: {}  Lowest: {}",
        summary.average_percentage,
        summary.median_percentage,
        fmt_score(summary.highest_score),
        fmt_score(summary.lowest_score)
    );
    Ok(())
}
