//! Core trait definitions for exam stores and credential checks.
//!
//! `ExamStore` is the contract every backend satisfies. The in-memory store
//! in `examdesk-store` implements it without ever suspending; a database
//! backend would treat each method as its own transaction and report its
//! failures through [`StoreError::Backend`].

use async_trait::async_trait;

use crate::dashboard::DashboardData;
use crate::error::StoreError;
use crate::model::{
    Account, AccountId, AccountPatch, Exam, ExamId, ExamPatch, ExamResult, ExamStatus,
    NewAccount, NewExam, NewResult, NewStudent, ResultId, ResultPatch, ResultWithDetails,
    StudentId, StudentPatch, StudentProfile,
};
use crate::ranking::ExamRanking;
use crate::statistics::{ExamSummary, Statistics};

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Keyed storage for accounts, students, exams and results, plus the views
/// derived from them.
///
/// Single-record reads return `Ok(None)` for unknown ids, updates return
/// `Ok(None)` and deletes `Ok(false)`. Only
/// [`get_student_dashboard`](ExamStore::get_student_dashboard) fails with
/// [`StoreError::NotFound`].
#[async_trait]
pub trait ExamStore: Send + Sync {
    // Accounts
    async fn get_account(&self, id: AccountId) -> StoreResult<Option<Account>>;
    async fn get_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;
    async fn get_accounts(&self) -> StoreResult<Vec<Account>>;
    async fn create_account(&self, data: NewAccount) -> StoreResult<Account>;
    async fn update_account(
        &self,
        id: AccountId,
        patch: AccountPatch,
    ) -> StoreResult<Option<Account>>;
    async fn delete_account(&self, id: AccountId) -> StoreResult<bool>;

    // Students
    async fn get_students(&self) -> StoreResult<Vec<StudentProfile>>;
    async fn get_student(&self, id: StudentId) -> StoreResult<Option<StudentProfile>>;
    async fn get_student_by_email(&self, email: &str) -> StoreResult<Option<StudentProfile>>;
    async fn create_student(&self, data: NewStudent) -> StoreResult<StudentProfile>;
    async fn update_student(
        &self,
        id: StudentId,
        patch: StudentPatch,
    ) -> StoreResult<Option<StudentProfile>>;
    async fn delete_student(&self, id: StudentId) -> StoreResult<bool>;

    /// `Ok(None)` for an unknown email and for a wrong password alike, so
    /// callers cannot probe which emails exist.
    async fn authenticate_student(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<StudentProfile>>;

    // Exams
    async fn get_exams(&self) -> StoreResult<Vec<Exam>>;
    async fn get_exam(&self, id: ExamId) -> StoreResult<Option<Exam>>;
    async fn get_exams_by_status(&self, status: ExamStatus) -> StoreResult<Vec<Exam>>;
    async fn create_exam(&self, data: NewExam) -> StoreResult<Exam>;
    async fn update_exam(&self, id: ExamId, patch: ExamPatch) -> StoreResult<Option<Exam>>;
    async fn delete_exam(&self, id: ExamId) -> StoreResult<bool>;

    // Results
    async fn get_results(&self) -> StoreResult<Vec<ResultWithDetails>>;
    async fn get_result(&self, id: ResultId) -> StoreResult<Option<ResultWithDetails>>;
    async fn get_results_by_student(&self, id: StudentId)
        -> StoreResult<Vec<ResultWithDetails>>;
    async fn get_results_by_exam(&self, id: ExamId) -> StoreResult<Vec<ResultWithDetails>>;
    async fn create_result(&self, data: NewResult) -> StoreResult<ExamResult>;
    async fn update_result(
        &self,
        id: ResultId,
        patch: ResultPatch,
    ) -> StoreResult<Option<ExamResult>>;
    async fn delete_result(&self, id: ResultId) -> StoreResult<bool>;

    // Derived views
    async fn get_statistics(&self) -> StoreResult<Statistics>;
    async fn get_exam_ranking(&self, exam_id: ExamId) -> StoreResult<Option<ExamRanking>>;
    async fn get_exam_summary(&self, exam_id: ExamId) -> StoreResult<Option<ExamSummary>>;
    async fn get_student_dashboard(&self, student_id: StudentId) -> StoreResult<DashboardData>;
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Password hashing capability. The store never inspects credentials itself.
pub trait CredentialVerifier: Send + Sync {
    /// Turn a plaintext password into the stored credential.
    fn hash_password(&self, plain: &str) -> String;

    /// Check a plaintext password against a stored credential.
    fn verify_password(&self, plain: &str, stored: &str) -> bool;
}

/// Used when no verifier is configured: nothing ever authenticates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllVerifier;

/// Locked-credential marker, never produced by a real hash.
const LOCKED_CREDENTIAL: &str = "!";

impl CredentialVerifier for DenyAllVerifier {
    fn hash_password(&self, _plain: &str) -> String {
        LOCKED_CREDENTIAL.to_string()
    }

    fn verify_password(&self, _plain: &str, _stored: &str) -> bool {
        false
    }
}
