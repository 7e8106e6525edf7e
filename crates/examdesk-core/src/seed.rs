//! TOML seed file parser.
//!
//! A seed file lists students, exams, results and accounts as arrays of
//! tables. Records are created in that order, so within each collection the
//! n-th entry receives id n, and results and accounts refer to students and
//! exams by those ids. Dates are quoted ISO strings (`"2024-06-01"`,
//! `"2024-06-01T10:30:00Z"`).

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{same_email, NewAccount, NewExam, NewResult, NewStudent};

/// Percentage drift tolerated before validation warns.
pub const PERCENTAGE_DRIFT_TOLERANCE: f64 = 0.5;

/// The contents of a seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub students: Vec<NewStudent>,
    #[serde(default)]
    pub exams: Vec<NewExam>,
    #[serde(default)]
    pub results: Vec<NewResult>,
    #[serde(default)]
    pub accounts: Vec<NewAccount>,
}

/// Parse a seed file from disk.
pub fn load_seed(path: &Path) -> Result<SeedData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file: {}", path.display()))?;

    parse_seed_str(&content, path)
}

/// Parse seed TOML from a string (useful for testing).
pub fn parse_seed_str(content: &str, source_path: &Path) -> Result<SeedData> {
    let seed: SeedData = toml::from_str(content)
        .with_context(|| format!("failed to parse seed TOML: {}", source_path.display()))?;
    Ok(seed)
}

/// A problem found in a seed file.
#[derive(Debug, Clone)]
pub struct SeedWarning {
    /// Which array the offending entry is in.
    pub section: &'static str,
    /// 1-based position of the entry, which is also the id it will receive.
    pub position: usize,
    pub message: String,
}

impl SeedWarning {
    fn new(section: &'static str, index: usize, message: impl Into<String>) -> Self {
        Self {
            section,
            position: index + 1,
            message: message.into(),
        }
    }
}

/// Validate a seed for integrity problems the store would reject or that
/// would make the derived views misleading.
pub fn validate_seed(seed: &SeedData) -> Vec<SeedWarning> {
    let mut warnings = Vec::new();

    // Duplicate emails
    for (i, student) in seed.students.iter().enumerate() {
        if seed.students[..i]
            .iter()
            .any(|s| same_email(&s.email, &student.email))
        {
            warnings.push(SeedWarning::new(
                "students",
                i,
                format!("duplicate email: {}", student.email),
            ));
        }
    }
    for (i, account) in seed.accounts.iter().enumerate() {
        if seed.accounts[..i]
            .iter()
            .any(|a| same_email(&a.email, &account.email))
        {
            warnings.push(SeedWarning::new(
                "accounts",
                i,
                format!("duplicate email: {}", account.email),
            ));
        }
    }

    for (i, exam) in seed.exams.iter().enumerate() {
        if exam.total_marks == 0 {
            warnings.push(SeedWarning::new(
                "exams",
                i,
                format!("exam '{}' has total_marks = 0", exam.name),
            ));
        }
    }

    let student_exists = |id: u64| id >= 1 && id as usize <= seed.students.len();
    let mut seen_pairs = HashSet::new();

    for (i, result) in seed.results.iter().enumerate() {
        if !student_exists(result.student_id) {
            warnings.push(SeedWarning::new(
                "results",
                i,
                format!("references unknown student {}", result.student_id),
            ));
        }

        let exam = (result.exam_id >= 1)
            .then(|| seed.exams.get(result.exam_id as usize - 1))
            .flatten();
        let Some(exam) = exam else {
            warnings.push(SeedWarning::new(
                "results",
                i,
                format!("references unknown exam {}", result.exam_id),
            ));
            continue;
        };

        if !seen_pairs.insert((result.student_id, result.exam_id)) {
            warnings.push(SeedWarning::new(
                "results",
                i,
                format!(
                    "student {} already has a result for exam {}",
                    result.student_id, result.exam_id
                ),
            ));
        }

        if !result.score.is_finite() {
            warnings.push(SeedWarning::new(
                "results",
                i,
                format!("score {} is not a finite number", result.score),
            ));
            continue;
        }

        if result.score < 0.0 || result.score > f64::from(exam.total_marks) {
            warnings.push(SeedWarning::new(
                "results",
                i,
                format!(
                    "score {} is outside 0..={} for exam '{}'",
                    result.score, exam.total_marks, exam.name
                ),
            ));
        }

        if let Some(stored) = result.percentage {
            if !stored.is_finite() {
                warnings.push(SeedWarning::new(
                    "results",
                    i,
                    format!("percentage {stored} is not a finite number"),
                ));
            } else if exam.total_marks > 0 {
                let derived = result.score / f64::from(exam.total_marks) * 100.0;
                if (stored - derived).abs() > PERCENTAGE_DRIFT_TOLERANCE {
                    warnings.push(SeedWarning::new(
                        "results",
                        i,
                        format!(
                            "percentage {stored} does not match score {} / {} ({derived:.2})",
                            result.score, exam.total_marks
                        ),
                    ));
                }
            }
        }
    }

    for (i, account) in seed.accounts.iter().enumerate() {
        if let Some(student_id) = account.student_id {
            if !student_exists(student_id) {
                warnings.push(SeedWarning::new(
                    "accounts",
                    i,
                    format!("student_id {student_id} does not match any student"),
                ));
            }
        }
    }

    warnings
}
