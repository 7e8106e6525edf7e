//! Per-student dashboard aggregation.
//!
//! Composes the assembler, the ranking and the statistics helpers into the
//! read-only summary a student sees after logging in.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::assembler::assemble_many;
use crate::collection::Collections;
use crate::error::{EntityKind, StoreError};
use crate::model::{Exam, ExamId, ResultWithDetails, StudentId, StudentProfile};
use crate::ranking::best_rank;
use crate::statistics::mean;

/// Everything the student dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub student: StudentProfile,
    /// Number of entries in `exam_history`.
    pub total_exams: usize,
    /// Mean percentage over the history; 0 with no history.
    pub average_score: f64,
    /// Best competition rank over every exam in the history.
    pub best_rank: Option<u32>,
    /// Upcoming and active exams, earliest first.
    pub available_exams: Vec<Exam>,
    /// The student's results, most recent submission first.
    pub exam_history: Vec<ResultWithDetails>,
}

/// Build the dashboard for `student_id`.
///
/// Fails with [`StoreError::NotFound`] if the student does not exist.
pub fn compute_student_dashboard(
    tables: &Collections,
    student_id: StudentId,
) -> Result<DashboardData, StoreError> {
    let student = tables
        .students
        .get(student_id)
        .cloned()
        .ok_or_else(|| StoreError::not_found(EntityKind::Student, student_id))?;

    let mut exam_history = assemble_many(tables, tables.results_for_student(student_id));
    exam_history.sort_by(|a, b| {
        b.result
            .submitted_at
            .cmp(&a.result.submitted_at)
            .then(b.result.id.cmp(&a.result.id))
    });

    let percentages: Vec<f64> = exam_history.iter().map(|r| r.result.percentage).collect();
    let average_score = mean(&percentages);

    let taken: Vec<ExamId> = exam_history
        .iter()
        .map(|r| r.exam.id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let best_rank = best_rank(student_id, &taken, tables.results.iter());

    let mut available_exams: Vec<Exam> = tables
        .exams
        .iter()
        .filter(|e| e.status.is_open())
        .cloned()
        .collect();
    available_exams.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    tracing::debug!(
        student_id,
        history = exam_history.len(),
        available = available_exams.len(),
        "computed student dashboard"
    );

    Ok(DashboardData {
        student,
        total_exams: exam_history.len(),
        average_score,
        best_rank,
        available_exams,
        exam_history,
    })
}
