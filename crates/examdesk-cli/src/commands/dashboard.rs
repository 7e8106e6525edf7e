//! The `examdesk dashboard` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examdesk_core::dashboard::DashboardData;
use examdesk_core::traits::ExamStore;
use examdesk_store::ExamdeskConfig;

use super::{open_store, Format};

pub async fn execute(
    data: Option<PathBuf>,
    config: &ExamdeskConfig,
    student_id: u64,
    format: String,
) -> Result<()> {
    let format = Format::parse(&format)?;
    let store: Arc<dyn ExamStore> = Arc::new(open_store(data, config)?);
    let mut dashboard = store.get_student_dashboard(student_id).await?;
    redact_credentials(&mut dashboard);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
        Format::Text => print_dashboard(&dashboard),
    }
    Ok(())
}

/// Stored credentials never leave the process.
fn redact_credentials(dashboard: &mut DashboardData) {
    dashboard.student.password.clear();
    for entry in &mut dashboard.exam_history {
        entry.student.password.clear();
    }
}

fn print_dashboard(dashboard: &DashboardData) {
    let student = &dashboard.student;
    println!(
        "Student: {} <{}> (class {})",
        student.name, student.email, student.class_label
    );
    println!("Exams taken: {}", dashboard.total_exams);
    println!("Average score: {:.2}%", dashboard.average_score);
    match dashboard.best_rank {
        Some(rank) => println!("Best rank: {rank}"),
        None => println!("Best rank: -"),
    }

    if !dashboard.exam_history.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Submitted", "Exam", "Subject", "Score", "Percentage"]);
        for entry in &dashboard.exam_history {
            table.add_row(vec![
                Cell::new(entry.result.submitted_at.format("%Y-%m-%d %H:%M")),
                Cell::new(&entry.exam.name),
                Cell::new(&entry.exam.subject),
                Cell::new(format!("{:.1} / {}", entry.result.score, entry.exam.total_marks)),
                Cell::new(format!("{:.2}%", entry.result.percentage)),
            ]);
        }
        println!("\nExam history:\n{table}");
    }

    if dashboard.available_exams.is_empty() {
        println!("\nNo upcoming or active exams.");
    } else {
        let mut table = Table::new();
        table.set_header(vec!["Date", "Exam", "Subject", "Duration", "Status"]);
        for exam in &dashboard.available_exams {
            table.add_row(vec![
                Cell::new(exam.date),
                Cell::new(&exam.name),
                Cell::new(&exam.subject),
                Cell::new(format!("{} min", exam.duration_minutes)),
                Cell::new(exam.status),
            ]);
        }
        println!("\nAvailable exams:\n{table}");
    }
}
