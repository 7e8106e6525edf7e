//! Standard competition ranking of exam results.
//!
//! Tied scores share a rank and the next distinct score skips ahead by the
//! size of the tie group: scores `[90, 80, 80, 70]` rank `[1, 2, 2, 4]`.
//! A result's rank is always 1 plus the number of results with a strictly
//! greater score.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::{ExamId, ExamResult, ResultId, StudentId};

/// One result's place in an exam ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub rank: u32,
    pub result_id: ResultId,
    pub student_id: StudentId,
    pub score: f64,
    pub percentage: f64,
}

/// All results of one exam, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRanking {
    pub exam_id: ExamId,
    /// Number of results recorded for the exam.
    pub total_participants: usize,
    /// Sorted by score descending, ties by result id ascending.
    pub entries: Vec<RankedResult>,
}

impl ExamRanking {
    /// Best rank held by `student_id` in this exam, if they took it.
    pub fn rank_of(&self, student_id: StudentId) -> Option<u32> {
        self.entries
            .iter()
            .filter(|e| e.student_id == student_id)
            .map(|e| e.rank)
            .min()
    }

    /// Rank of a specific result.
    pub fn rank_of_result(&self, result_id: ResultId) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.result_id == result_id)
            .map(|e| e.rank)
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Competition ranks for `scores`, returned in the same order as the input.
pub fn competition_ranks(scores: &[f64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| descending(scores[a], scores[b]).then(a.cmp(&b)));

    let mut ranks = vec![0u32; scores.len()];
    let mut current = 0u32;
    for (position, &idx) in order.iter().enumerate() {
        // Adjacent after the sort, so inequality is enough. NaN never
        // joins a group.
        let starts_group = position == 0 || scores[idx] != scores[order[position - 1]];
        if starts_group {
            current = position as u32 + 1;
        }
        ranks[idx] = current;
    }
    ranks
}

/// Rank every result of `exam_id` found in `results`.
pub fn rank_exam<'a, I>(exam_id: ExamId, results: I) -> ExamRanking
where
    I: IntoIterator<Item = &'a ExamResult>,
{
    let mut taken: Vec<&ExamResult> = results
        .into_iter()
        .filter(|r| r.exam_id == exam_id)
        .collect();
    taken.sort_by(|a, b| descending(a.score, b.score).then(a.id.cmp(&b.id)));

    let scores: Vec<f64> = taken.iter().map(|r| r.score).collect();
    let ranks = competition_ranks(&scores);

    let entries = taken
        .iter()
        .zip(ranks)
        .map(|(r, rank)| RankedResult {
            rank,
            result_id: r.id,
            student_id: r.student_id,
            score: r.score,
            percentage: r.percentage,
        })
        .collect::<Vec<_>>();

    ExamRanking {
        exam_id,
        total_participants: entries.len(),
        entries,
    }
}

/// Best (lowest) rank `student_id` holds across `exam_ids`.
///
/// `None` when the student has no ranked result in any of them.
pub fn best_rank<'a, I>(student_id: StudentId, exam_ids: &[ExamId], results: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a ExamResult> + Clone,
{
    exam_ids
        .iter()
        .filter_map(|&exam_id| rank_exam(exam_id, results.clone()).rank_of(student_id))
        .min()
}
