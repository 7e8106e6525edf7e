//! Joins results with the student and exam they refer to.
//!
//! Single and batch reads share one policy: a result whose student or exam
//! is gone is reported as [`Assembly::Orphaned`]. Single reads turn that into
//! an absent value, batch reads skip it; both log an integrity warning.

use std::fmt;

use crate::collection::Collections;
use crate::error::EntityKind;
use crate::model::{ExamResult, ResultId, ResultWithDetails};

/// A result that could not be joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityIssue {
    pub result_id: ResultId,
    pub missing: EntityKind,
    pub missing_id: u64,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "result {} refers to missing {} {}",
            self.result_id, self.missing, self.missing_id
        )
    }
}

/// Outcome of joining one result.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    Joined(ResultWithDetails),
    Orphaned(IntegrityIssue),
}

impl Assembly {
    /// The joined view, logging and discarding an orphan.
    pub fn into_joined(self) -> Option<ResultWithDetails> {
        match self {
            Assembly::Joined(details) => Some(details),
            Assembly::Orphaned(issue) => {
                tracing::warn!(
                    result_id = issue.result_id,
                    "integrity: {issue}, skipping"
                );
                None
            }
        }
    }
}

/// Join one result with its student and exam.
pub fn assemble_one(tables: &Collections, result: &ExamResult) -> Assembly {
    let Some(student) = tables.students.get(result.student_id) else {
        return Assembly::Orphaned(IntegrityIssue {
            result_id: result.id,
            missing: EntityKind::Student,
            missing_id: result.student_id,
        });
    };
    let Some(exam) = tables.exams.get(result.exam_id) else {
        return Assembly::Orphaned(IntegrityIssue {
            result_id: result.id,
            missing: EntityKind::Exam,
            missing_id: result.exam_id,
        });
    };
    Assembly::Joined(ResultWithDetails {
        result: result.clone(),
        student: student.clone(),
        exam: exam.clone(),
    })
}

/// Join every result, skipping orphans with a logged warning.
pub fn assemble_many<'a, I>(tables: &Collections, results: I) -> Vec<ResultWithDetails>
where
    I: IntoIterator<Item = &'a ExamResult>,
{
    results
        .into_iter()
        .filter_map(|r| assemble_one(tables, r).into_joined())
        .collect()
}

/// Every result that cannot currently be joined.
pub fn find_orphans(tables: &Collections) -> Vec<IntegrityIssue> {
    tables
        .results
        .iter()
        .filter_map(|r| match assemble_one(tables, r) {
            Assembly::Orphaned(issue) => Some(issue),
            Assembly::Joined(_) => None,
        })
        .collect()
}
