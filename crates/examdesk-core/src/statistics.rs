//! Summary statistics over students, exams and results.
//!
//! Nothing is cached; every call rescans the collections. That is linear in
//! the number of rows and fine for a school's worth of data.

use serde::{Deserialize, Serialize};

use crate::collection::Collections;
use crate::model::{Exam, ExamId, ExamResult, ExamStatus};

/// Headline counts for the admin overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_students: usize,
    pub active_exams: usize,
    pub completed_exams: usize,
    pub upcoming_exams: usize,
}

impl Statistics {
    /// Every exam is in exactly one status, so this is the exam count.
    pub fn total_exams(&self) -> usize {
        self.active_exams + self.completed_exams + self.upcoming_exams
    }
}

/// Count students, and exams by status.
pub fn compute_statistics(tables: &Collections) -> Statistics {
    let mut stats = Statistics {
        total_students: tables.students.len(),
        ..Statistics::default()
    };
    for exam in tables.exams.iter() {
        match exam.status {
            ExamStatus::Upcoming => stats.upcoming_exams += 1,
            ExamStatus::Active => stats.active_exams += 1,
            ExamStatus::Completed => stats.completed_exams += 1,
        }
    }
    stats
}

/// Exams with the given status, in insertion order.
pub fn exams_with_status(tables: &Collections, status: ExamStatus) -> Vec<Exam> {
    tables
        .exams
        .iter()
        .filter(|e| e.status == status)
        .cloned()
        .collect()
}

/// Score distribution for a single exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSummary {
    pub exam_id: ExamId,
    pub total_marks: u32,
    pub participants: usize,
    /// Mean percentage; 0 with no participants.
    pub average_percentage: f64,
    /// Median percentage; 0 with no participants.
    pub median_percentage: f64,
    pub highest_score: Option<f64>,
    pub lowest_score: Option<f64>,
}

fn compute_median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0
    }
}

/// Arithmetic mean, defined as 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Summarize the results of `exam` found in `results`.
pub fn summarize_exam<'a, I>(exam: &Exam, results: I) -> ExamSummary
where
    I: IntoIterator<Item = &'a ExamResult>,
{
    let taken: Vec<&ExamResult> = results
        .into_iter()
        .filter(|r| r.exam_id == exam.id)
        .collect();
    let percentages: Vec<f64> = taken.iter().map(|r| r.percentage).collect();
    let highest_score = taken.iter().map(|r| r.score).max_by(|a, b| a.total_cmp(b));
    let lowest_score = taken.iter().map(|r| r.score).min_by(|a, b| a.total_cmp(b));

    ExamSummary {
        exam_id: exam.id,
        total_marks: exam.total_marks,
        participants: taken.len(),
        average_percentage: mean(&percentages),
        median_percentage: compute_median(&percentages),
        highest_score,
        lowest_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewExam, NewResult, NewStudent};
    use chrono::NaiveDate;

    fn new_exam(status: ExamStatus) -> NewExam {
        NewExam {
            name: format!("{status} exam"),
            subject: "Science".into(),
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            duration_minutes: 45,
            total_marks: 100,
            status,
            description: None,
        }
    }

    #[test]
    fn counts_exams_by_status() {
        let mut tables = Collections::new();
        for status in [
            ExamStatus::Upcoming,
            ExamStatus::Active,
            ExamStatus::Completed,
            ExamStatus::Completed,
        ] {
            tables.exams.create(new_exam(status));
        }
        tables.students.create(NewStudent {
            name: "Ada".into(),
            email: "ada@school.test".into(),
            class_label: "11B".into(),
            enrollment_date: None,
            password: "hash".into(),
            phone: None,
            address: None,
            guardian_name: None,
            guardian_phone: None,
            date_of_birth: None,
            profile_image: None,
        });

        let stats = compute_statistics(&tables);
        assert_eq!(stats.upcoming_exams, 1);
        assert_eq!(stats.active_exams, 1);
        assert_eq!(stats.completed_exams, 2);
        assert_eq!(stats.total_students, 1);
        assert_eq!(stats.total_exams(), tables.exams.len());
        assert_eq!(exams_with_status(&tables, ExamStatus::Completed).len(), 2);
    }

    #[test]
    fn empty_store_is_all_zero() {
        let stats = compute_statistics(&Collections::new());
        assert_eq!(stats, Statistics::default());
    }

    #[test]
    fn summary_of_exam_results() {
        let mut tables = Collections::new();
        let exam = tables.exams.create(new_exam(ExamStatus::Completed));
        let other = tables.exams.create(new_exam(ExamStatus::Completed));
        let rows = [
            (exam.id, 90.0),
            (exam.id, 70.0),
            (exam.id, 80.0),
            (other.id, 5.0),
        ];
        for (exam_id, score) in rows {
            tables.results.create(NewResult {
                student_id: 1,
                exam_id,
                score,
                percentage: Some(score),
                submitted_at: None,
            });
        }

        let summary = summarize_exam(&exam, tables.results.iter());
        assert_eq!(summary.participants, 3);
        assert!((summary.average_percentage - 80.0).abs() < f64::EPSILON);
        assert!((summary.median_percentage - 80.0).abs() < f64::EPSILON);
        assert_eq!(summary.highest_score, Some(90.0));
        assert_eq!(summary.lowest_score, Some(70.0));
    }

    #[test]
    fn summary_without_results() {
        let exam = Collections::new().exams.create(new_exam(ExamStatus::Upcoming));
        let summary = summarize_exam(&exam, &Vec::<ExamResult>::new());
        assert_eq!(summary.participants, 0);
        assert_eq!(summary.average_percentage, 0.0);
        assert_eq!(summary.highest_score, None);
    }

    #[test]
    fn median_of_even_count() {
        assert!((compute_median(&[87.0, 86.0]) - 86.5).abs() < f64::EPSILON);
        assert!((mean(&[87.0, 86.0]) - 86.5).abs() < f64::EPSILON);
        assert_eq!(mean(&[]), 0.0);
    }
}
