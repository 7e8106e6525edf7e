//! In-memory exam store.
//!
//! All four collections live behind one `RwLock`, so every cross-collection
//! check (email uniqueness, references, cascades) runs under the same write
//! guard as the mutation it protects.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use examdesk_core::assembler::{assemble_many, assemble_one, find_orphans, IntegrityIssue};
use examdesk_core::collection::{Collections, EmailKeyed, EntityCollection};
use examdesk_core::dashboard::{compute_student_dashboard, DashboardData};
use examdesk_core::model::{
    Account, AccountId, AccountPatch, Entity, Exam, ExamId, ExamPatch, ExamResult, ExamStatus,
    NewAccount, NewExam, NewResult, NewStudent, ResultId, ResultPatch, ResultWithDetails,
    StudentId, StudentPatch, StudentProfile,
};
use examdesk_core::ranking::{rank_exam, ExamRanking};
use examdesk_core::seed::{SeedData, PERCENTAGE_DRIFT_TOLERANCE};
use examdesk_core::statistics::{
    compute_statistics, exams_with_status, summarize_exam, ExamSummary, Statistics,
};
use examdesk_core::traits::{CredentialVerifier, DenyAllVerifier, ExamStore, StoreResult};
use examdesk_core::{EntityKind, StoreError};

use crate::config::{DeletePolicy, EmailPolicy, StoreConfig};
use crate::snapshot::StoreSnapshot;

/// A process-local [`ExamStore`].
///
/// Every method takes `&self`; share it across threads or tasks with `Arc`.
pub struct MemoryStore {
    tables: RwLock<Collections>,
    config: StoreConfig,
    verifier: Arc<dyn CredentialVerifier>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.read();
        f.debug_struct("MemoryStore")
            .field("config", &self.config)
            .field("accounts", &tables.accounts.len())
            .field("students", &tables.students.len())
            .field("exams", &tables.exams.len())
            .field("results", &tables.results.len())
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl MemoryStore {
    /// An empty store. Nothing authenticates until a verifier is supplied
    /// with [`with_verifier`](Self::with_verifier).
    pub fn new(config: StoreConfig) -> Self {
        Self::from_collections(Collections::new(), config)
    }

    fn from_collections(tables: Collections, config: StoreConfig) -> Self {
        Self {
            tables: RwLock::new(tables),
            config,
            verifier: Arc::new(DenyAllVerifier),
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// A store populated from a seed. Fails on the first record the store
    /// would reject.
    pub fn from_seed(seed: SeedData, config: StoreConfig) -> StoreResult<Self> {
        let store = Self::new(config);
        store.load_seed(seed)?;
        Ok(store)
    }

    /// A store resuming exactly where `snapshot` was taken.
    pub fn from_snapshot(snapshot: StoreSnapshot, config: StoreConfig) -> Self {
        tracing::info!(
            snapshot_id = %snapshot.id,
            records = snapshot.record_count(),
            "restored store from snapshot"
        );
        Self::from_collections(snapshot.into_collections(), config)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // A panicking writer never leaves the tables half-updated: every check
    // runs before the first mutation. So a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert every record of `seed`, returning how many were created.
    ///
    /// Seeds address records by position, so only a store that has never
    /// created anything accepts one. Credentials are stored as written in the
    /// seed, not hashed again. The load is all-or-nothing: on error the store
    /// is left unchanged.
    pub fn load_seed(&self, seed: SeedData) -> StoreResult<usize> {
        let mut tables = self.write();
        if !tables.is_fresh() {
            return Err(StoreError::NotEmpty {
                records: tables.record_count(),
            });
        }
        let mut staged = tables.clone();

        let total =
            seed.students.len() + seed.exams.len() + seed.results.len() + seed.accounts.len();
        for student in seed.students {
            self.insert_student(&mut staged, student)?;
        }
        for exam in seed.exams {
            insert_exam(&mut staged, exam);
        }
        for result in seed.results {
            insert_result(&mut staged, result)?;
        }
        for account in seed.accounts {
            self.insert_account(&mut staged, account)?;
        }

        *tables = staged;
        tracing::info!(
            records = total,
            students = tables.students.len(),
            exams = tables.exams.len(),
            results = tables.results.len(),
            accounts = tables.accounts.len(),
            "loaded seed data"
        );
        Ok(total)
    }

    /// Copy every record and id counter.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::capture(&self.read())
    }

    /// Results that currently cannot be joined with their student or exam.
    pub fn integrity_report(&self) -> Vec<IntegrityIssue> {
        find_orphans(&self.read())
    }

    // -- accounts ---------------------------------------------------------

    pub fn get_account(&self, id: AccountId) -> Option<Account> {
        self.read().accounts.get(id).cloned()
    }

    pub fn get_account_by_email(&self, email: &str) -> Option<Account> {
        self.read().accounts.get_by_email(email).cloned()
    }

    pub fn get_accounts(&self) -> Vec<Account> {
        self.read().accounts.get_all()
    }

    /// Create an account, hashing its plaintext password.
    pub fn create_account(&self, mut data: NewAccount) -> StoreResult<Account> {
        data.password = self.verifier.hash_password(&data.password);
        self.insert_account(&mut self.write(), data)
    }

    fn insert_account(&self, tables: &mut Collections, data: NewAccount) -> StoreResult<Account> {
        self.ensure_email_free(&tables.accounts, EntityKind::Account, &data.email, None)?;
        if let Some(student_id) = data.student_id {
            ensure_exists(&tables.students, EntityKind::Student, student_id)?;
        }
        let account = tables.accounts.create(data);
        tracing::debug!(entity = %EntityKind::Account, id = account.id, "created");
        Ok(account)
    }

    pub fn update_account(
        &self,
        id: AccountId,
        mut patch: AccountPatch,
    ) -> StoreResult<Option<Account>> {
        if let Some(plain) = patch.password.take() {
            patch.password = Some(self.verifier.hash_password(&plain));
        }

        let mut tables = self.write();
        if !tables.accounts.contains(id) {
            return Ok(None);
        }
        if let Some(email) = &patch.email {
            self.ensure_email_free(&tables.accounts, EntityKind::Account, email, Some(id))?;
        }
        if let Some(Some(student_id)) = patch.student_id {
            ensure_exists(&tables.students, EntityKind::Student, student_id)?;
        }
        let updated = tables.accounts.update(id, patch);
        tracing::debug!(entity = %EntityKind::Account, id, "updated");
        Ok(updated)
    }

    pub fn delete_account(&self, id: AccountId) -> bool {
        let deleted = self.write().accounts.delete(id);
        if deleted {
            tracing::debug!(entity = %EntityKind::Account, id, "deleted");
        }
        deleted
    }

    // -- students ---------------------------------------------------------

    pub fn get_students(&self) -> Vec<StudentProfile> {
        self.read().students.get_all()
    }

    pub fn get_student(&self, id: StudentId) -> Option<StudentProfile> {
        self.read().students.get(id).cloned()
    }

    pub fn get_student_by_email(&self, email: &str) -> Option<StudentProfile> {
        self.read().students.get_by_email(email).cloned()
    }

    /// Create a student profile, hashing its plaintext password.
    pub fn create_student(&self, mut data: NewStudent) -> StoreResult<StudentProfile> {
        data.password = self.verifier.hash_password(&data.password);
        self.insert_student(&mut self.write(), data)
    }

    fn insert_student(
        &self,
        tables: &mut Collections,
        data: NewStudent,
    ) -> StoreResult<StudentProfile> {
        self.ensure_email_free(&tables.students, EntityKind::Student, &data.email, None)?;
        let student = tables.students.create(data);
        tracing::debug!(entity = %EntityKind::Student, id = student.id, "created");
        Ok(student)
    }

    pub fn update_student(
        &self,
        id: StudentId,
        mut patch: StudentPatch,
    ) -> StoreResult<Option<StudentProfile>> {
        if let Some(plain) = patch.password.take() {
            patch.password = Some(self.verifier.hash_password(&plain));
        }

        let mut tables = self.write();
        if !tables.students.contains(id) {
            return Ok(None);
        }
        if let Some(email) = &patch.email {
            self.ensure_email_free(&tables.students, EntityKind::Student, email, Some(id))?;
        }
        let updated = tables.students.update(id, patch);
        tracing::debug!(entity = %EntityKind::Student, id, "updated");
        Ok(updated)
    }

    /// Delete a student, applying the delete policy to their results.
    /// Accounts linked to the student lose the link.
    pub fn delete_student(&self, id: StudentId) -> StoreResult<bool> {
        let mut tables = self.write();
        if !tables.students.contains(id) {
            return Ok(false);
        }
        self.release_results(&mut tables, EntityKind::Student, id, |r| r.student_id == id)?;
        tables.students.delete(id);

        let mut unlinked = 0;
        for account in tables.accounts.iter_mut() {
            if account.student_id == Some(id) {
                account.student_id = None;
                unlinked += 1;
            }
        }
        tracing::debug!(entity = %EntityKind::Student, id, unlinked, "deleted");
        Ok(true)
    }

    /// The student with `email`, if `password` verifies against their
    /// credential. Unknown email and wrong password look the same.
    pub fn authenticate_student(&self, email: &str, password: &str) -> Option<StudentProfile> {
        let tables = self.read();
        let student = tables.students.get_by_email(email);
        match student {
            Some(student) if self.verifier.verify_password(password, &student.password) => {
                Some(student.clone())
            }
            _ => {
                tracing::debug!("student authentication failed");
                None
            }
        }
    }

    // -- exams ------------------------------------------------------------

    pub fn get_exams(&self) -> Vec<Exam> {
        self.read().exams.get_all()
    }

    pub fn get_exam(&self, id: ExamId) -> Option<Exam> {
        self.read().exams.get(id).cloned()
    }

    pub fn get_exams_by_status(&self, status: ExamStatus) -> Vec<Exam> {
        exams_with_status(&self.read(), status)
    }

    pub fn create_exam(&self, data: NewExam) -> Exam {
        insert_exam(&mut self.write(), data)
    }

    /// Existing results keep their stored percentage when `total_marks`
    /// changes.
    pub fn update_exam(&self, id: ExamId, patch: ExamPatch) -> Option<Exam> {
        let updated = self.write().exams.update(id, patch);
        if updated.is_some() {
            tracing::debug!(entity = %EntityKind::Exam, id, "updated");
        }
        updated
    }

    /// Delete an exam, applying the delete policy to its results.
    pub fn delete_exam(&self, id: ExamId) -> StoreResult<bool> {
        let mut tables = self.write();
        if !tables.exams.contains(id) {
            return Ok(false);
        }
        self.release_results(&mut tables, EntityKind::Exam, id, |r| r.exam_id == id)?;
        tables.exams.delete(id);
        tracing::debug!(entity = %EntityKind::Exam, id, "deleted");
        Ok(true)
    }

    // -- results ----------------------------------------------------------

    pub fn get_results(&self) -> Vec<ResultWithDetails> {
        let tables = self.read();
        assemble_many(&tables, tables.results.iter())
    }

    pub fn get_result(&self, id: ResultId) -> Option<ResultWithDetails> {
        let tables = self.read();
        let result = tables.results.get(id)?;
        assemble_one(&tables, result).into_joined()
    }

    pub fn get_results_by_student(&self, id: StudentId) -> Vec<ResultWithDetails> {
        let tables = self.read();
        assemble_many(&tables, tables.results_for_student(id))
    }

    pub fn get_results_by_exam(&self, id: ExamId) -> Vec<ResultWithDetails> {
        let tables = self.read();
        assemble_many(&tables, tables.results_for_exam(id))
    }

    /// Record a result. The percentage is derived from the exam's total
    /// marks when not supplied.
    pub fn create_result(&self, data: NewResult) -> StoreResult<ExamResult> {
        insert_result(&mut self.write(), data)
    }

    /// Merge `patch` into a result. Changing the score or the exam without
    /// supplying a percentage re-derives it.
    pub fn update_result(
        &self,
        id: ResultId,
        mut patch: ResultPatch,
    ) -> StoreResult<Option<ExamResult>> {
        let mut tables = self.write();
        let Some(current) = tables.results.get(id).cloned() else {
            return Ok(None);
        };

        if let Some(student_id) = patch.student_id {
            ensure_exists(&tables.students, EntityKind::Student, student_id)?;
        }
        if let Some(exam_id) = patch.exam_id {
            ensure_exists(&tables.exams, EntityKind::Exam, exam_id)?;
        }
        if let Some(score) = patch.score {
            ensure_finite("score", score)?;
        }
        if let Some(percentage) = patch.percentage {
            ensure_finite("percentage", percentage)?;
        }

        let score = patch.score.unwrap_or(current.score);
        if let Some(exam) = tables.exams.get(patch.exam_id.unwrap_or(current.exam_id)) {
            match patch.percentage {
                Some(percentage) => warn_on_drift(exam, score, percentage),
                None if patch.score.is_some() || patch.exam_id.is_some() => {
                    patch.percentage = Some(exam.percentage_for(score));
                }
                None => {}
            }
        }

        let updated = tables.results.update(id, patch);
        tracing::debug!(entity = %EntityKind::Result, id, "updated");
        Ok(updated)
    }

    pub fn delete_result(&self, id: ResultId) -> bool {
        let deleted = self.write().results.delete(id);
        if deleted {
            tracing::debug!(entity = %EntityKind::Result, id, "deleted");
        }
        deleted
    }

    // -- derived views ----------------------------------------------------

    pub fn get_statistics(&self) -> Statistics {
        compute_statistics(&self.read())
    }

    /// Competition ranking of every result recorded for the exam, or `None`
    /// for an unknown exam.
    pub fn get_exam_ranking(&self, exam_id: ExamId) -> Option<ExamRanking> {
        let tables = self.read();
        let exam = tables.exams.get(exam_id)?;
        Some(rank_exam(exam.id, tables.results_for_exam(exam.id)))
    }

    pub fn get_exam_summary(&self, exam_id: ExamId) -> Option<ExamSummary> {
        let tables = self.read();
        let exam = tables.exams.get(exam_id)?;
        Some(summarize_exam(exam, tables.results_for_exam(exam.id)))
    }

    pub fn get_student_dashboard(&self, student_id: StudentId) -> StoreResult<DashboardData> {
        compute_student_dashboard(&self.read(), student_id)
    }

    // -- helpers ----------------------------------------------------------

    fn ensure_email_free<T: Entity + EmailKeyed>(
        &self,
        collection: &EntityCollection<T>,
        entity: EntityKind,
        email: &str,
        except: Option<u64>,
    ) -> StoreResult<()> {
        if self.config.email_policy == EmailPolicy::Unique && collection.email_taken(email, except)
        {
            return Err(StoreError::DuplicateEmail {
                entity,
                email: email.to_string(),
            });
        }
        Ok(())
    }

    /// Apply the delete policy to the results that depend on a record about
    /// to be deleted. Errors leave the tables untouched.
    fn release_results(
        &self,
        tables: &mut Collections,
        entity: EntityKind,
        id: u64,
        is_dependent: impl Fn(&ExamResult) -> bool,
    ) -> StoreResult<()> {
        match self.config.delete_policy {
            DeletePolicy::Cascade => {
                let removed = tables.results.delete_where(&is_dependent);
                if removed > 0 {
                    tracing::debug!(%entity, id, removed, "cascaded delete to results");
                }
            }
            DeletePolicy::Restrict => {
                let dependents = tables.results.iter().filter(|r| is_dependent(r)).count();
                if dependents > 0 {
                    return Err(StoreError::DependentsExist {
                        entity,
                        id,
                        dependents,
                    });
                }
            }
            DeletePolicy::Orphan => {
                let orphaned = tables.results.iter().filter(|r| is_dependent(r)).count();
                if orphaned > 0 {
                    tracing::warn!(
                        %entity,
                        id,
                        orphaned,
                        "integrity: deleting {entity} {id} leaves {orphaned} orphaned result(s)"
                    );
                }
            }
        }
        Ok(())
    }
}

fn ensure_exists<T: Entity>(
    collection: &EntityCollection<T>,
    entity: EntityKind,
    id: u64,
) -> StoreResult<()> {
    if collection.contains(id) {
        Ok(())
    } else {
        Err(StoreError::MissingReference { entity, id })
    }
}

fn insert_exam(tables: &mut Collections, data: NewExam) -> Exam {
    let exam = tables.exams.create(data);
    tracing::debug!(entity = %EntityKind::Exam, id = exam.id, "created");
    exam
}

fn ensure_finite(field: &'static str, value: f64) -> StoreResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(StoreError::NonFinite { field, value })
    }
}

fn insert_result(tables: &mut Collections, mut data: NewResult) -> StoreResult<ExamResult> {
    ensure_finite("score", data.score)?;
    if let Some(percentage) = data.percentage {
        ensure_finite("percentage", percentage)?;
    }
    ensure_exists(&tables.students, EntityKind::Student, data.student_id)?;
    let exam = tables
        .exams
        .get(data.exam_id)
        .ok_or(StoreError::MissingReference {
            entity: EntityKind::Exam,
            id: data.exam_id,
        })?;

    match data.percentage {
        Some(percentage) => warn_on_drift(exam, data.score, percentage),
        None => data.percentage = Some(exam.percentage_for(data.score)),
    }

    let result = tables.results.create(data);
    tracing::debug!(entity = %EntityKind::Result, id = result.id, "created");
    Ok(result)
}

fn warn_on_drift(exam: &Exam, score: f64, percentage: f64) {
    let derived = exam.percentage_for(score);
    if exam.total_marks > 0 && (percentage - derived).abs() > PERCENTAGE_DRIFT_TOLERANCE {
        tracing::warn!(
            exam_id = exam.id,
            score,
            percentage,
            derived,
            "integrity: stored percentage does not match score"
        );
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn get_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(MemoryStore::get_account(self, id))
    }

    async fn get_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(MemoryStore::get_account_by_email(self, email))
    }

    async fn get_accounts(&self) -> StoreResult<Vec<Account>> {
        Ok(MemoryStore::get_accounts(self))
    }

    async fn create_account(&self, data: NewAccount) -> StoreResult<Account> {
        MemoryStore::create_account(self, data)
    }

    async fn update_account(
        &self,
        id: AccountId,
        patch: AccountPatch,
    ) -> StoreResult<Option<Account>> {
        MemoryStore::update_account(self, id, patch)
    }

    async fn delete_account(&self, id: AccountId) -> StoreResult<bool> {
        Ok(MemoryStore::delete_account(self, id))
    }

    async fn get_students(&self) -> StoreResult<Vec<StudentProfile>> {
        Ok(MemoryStore::get_students(self))
    }

    async fn get_student(&self, id: StudentId) -> StoreResult<Option<StudentProfile>> {
        Ok(MemoryStore::get_student(self, id))
    }

    async fn get_student_by_email(&self, email: &str) -> StoreResult<Option<StudentProfile>> {
        Ok(MemoryStore::get_student_by_email(self, email))
    }

    async fn create_student(&self, data: NewStudent) -> StoreResult<StudentProfile> {
        MemoryStore::create_student(self, data)
    }

    async fn update_student(
        &self,
        id: StudentId,
        patch: StudentPatch,
    ) -> StoreResult<Option<StudentProfile>> {
        MemoryStore::update_student(self, id, patch)
    }

    async fn delete_student(&self, id: StudentId) -> StoreResult<bool> {
        MemoryStore::delete_student(self, id)
    }

    async fn authenticate_student(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<StudentProfile>> {
        Ok(MemoryStore::authenticate_student(self, email, password))
    }

    async fn get_exams(&self) -> StoreResult<Vec<Exam>> {
        Ok(MemoryStore::get_exams(self))
    }

    async fn get_exam(&self, id: ExamId) -> StoreResult<Option<Exam>> {
        Ok(MemoryStore::get_exam(self, id))
    }

    async fn get_exams_by_status(&self, status: ExamStatus) -> StoreResult<Vec<Exam>> {
        Ok(MemoryStore::get_exams_by_status(self, status))
    }

    async fn create_exam(&self, data: NewExam) -> StoreResult<Exam> {
        Ok(MemoryStore::create_exam(self, data))
    }

    async fn update_exam(&self, id: ExamId, patch: ExamPatch) -> StoreResult<Option<Exam>> {
        Ok(MemoryStore::update_exam(self, id, patch))
    }

    async fn delete_exam(&self, id: ExamId) -> StoreResult<bool> {
        MemoryStore::delete_exam(self, id)
    }

    async fn get_results(&self) -> StoreResult<Vec<ResultWithDetails>> {
        Ok(MemoryStore::get_results(self))
    }

    async fn get_result(&self, id: ResultId) -> StoreResult<Option<ResultWithDetails>> {
        Ok(MemoryStore::get_result(self, id))
    }

    async fn get_results_by_student(
        &self,
        id: StudentId,
    ) -> StoreResult<Vec<ResultWithDetails>> {
        Ok(MemoryStore::get_results_by_student(self, id))
    }

    async fn get_results_by_exam(&self, id: ExamId) -> StoreResult<Vec<ResultWithDetails>> {
        Ok(MemoryStore::get_results_by_exam(self, id))
    }

    async fn create_result(&self, data: NewResult) -> StoreResult<ExamResult> {
        MemoryStore::create_result(self, data)
    }

    async fn update_result(
        &self,
        id: ResultId,
        patch: ResultPatch,
    ) -> StoreResult<Option<ExamResult>> {
        MemoryStore::update_result(self, id, patch)
    }

    async fn delete_result(&self, id: ResultId) -> StoreResult<bool> {
        Ok(MemoryStore::delete_result(self, id))
    }

    async fn get_statistics(&self) -> StoreResult<Statistics> {
        Ok(MemoryStore::get_statistics(self))
    }

    async fn get_exam_ranking(&self, exam_id: ExamId) -> StoreResult<Option<ExamRanking>> {
        Ok(MemoryStore::get_exam_ranking(self, exam_id))
    }

    async fn get_exam_summary(&self, exam_id: ExamId) -> StoreResult<Option<ExamSummary>> {
        Ok(MemoryStore::get_exam_summary(self, exam_id))
    }

    async fn get_student_dashboard(&self, student_id: StudentId) -> StoreResult<DashboardData> {
        MemoryStore::get_student_dashboard(self, student_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockVerifier;
    use chrono::NaiveDate;
    use examdesk_core::model::Role;

    fn new_student(name: &str, email: &str) -> NewStudent {
        NewStudent {
            name: name.into(),
            email: email.into(),
            class_label: "10A".into(),
            enrollment_date: NaiveDate::from_ymd_opt(2023, 9, 1),
            password: "secret".into(),
            phone: None,
            address: None,
            guardian_name: None,
            guardian_phone: None,
            date_of_birth: None,
            profile_image: None,
        }
    }

    fn new_exam(name: &str, total_marks: u32) -> NewExam {
        NewExam {
            name: name.into(),
            subject: "Mathematics".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            duration_minutes: 90,
            total_marks,
            status: ExamStatus::Completed,
            description: None,
        }
    }

    fn new_result(student_id: StudentId, exam_id: ExamId, score: f64) -> NewResult {
        NewResult {
            student_id,
            exam_id,
            score,
            percentage: None,
            submitted_at: None,
        }
    }

    fn store_with(policy: DeletePolicy) -> (MemoryStore, StudentId, ExamId) {
        let store = MemoryStore::new(StoreConfig {
            delete_policy: policy,
            ..StoreConfig::default()
        });
        let student = store.create_student(new_student("John", "john@school.test")).unwrap();
        let exam = store.create_exam(new_exam("Final", 100));
        store.create_result(new_result(student.id, exam.id, 87.0)).unwrap();
        (store, student.id, exam.id)
    }

    #[test]
    fn create_then_get_round_trips() {
        let store = MemoryStore::default();
        let exam = store.create_exam(new_exam("Algebra", 50));
        assert_eq!(exam.id, 1);
        assert_eq!(store.get_exam(exam.id), Some(exam));
        assert_eq!(store.get_exam(2), None);
    }

    #[test]
    fn duplicate_student_email_is_rejected() {
        let store = MemoryStore::default();
        store.create_student(new_student("Jane", "jane@school.test")).unwrap();
        let err = store
            .create_student(new_student("Other Jane", "JANE@school.test"))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::DuplicateEmail {
                entity: EntityKind::Student,
                ..
            }
        ));
        assert_eq!(store.get_students().len(), 1);
    }

    #[test]
    fn unchecked_email_policy_allows_duplicates() {
        let store = MemoryStore::new(StoreConfig {
            email_policy: EmailPolicy::Unchecked,
            ..StoreConfig::default()
        });
        let first = store.create_student(new_student("A", "twin@school.test")).unwrap();
        store.create_student(new_student("B", "twin@school.test")).unwrap();
        assert_eq!(store.get_student_by_email("twin@school.test"), Some(first));
    }

    #[test]
    fn update_to_own_email_is_allowed() {
        let store = MemoryStore::default();
        let student = store.create_student(new_student("Jane", "jane@school.test")).unwrap();
        store.create_student(new_student("Mo", "mo@school.test")).unwrap();

        let patch = StudentPatch {
            email: Some("Jane@School.test".into()),
            ..Default::default()
        };
        assert!(store.update_student(student.id, patch).unwrap().is_some());

        let patch = StudentPatch {
            email: Some("mo@school.test".into()),
            ..Default::default()
        };
        assert!(store.update_student(student.id, patch).is_err());
    }

    #[test]
    fn result_percentage_is_derived() {
        let store = MemoryStore::default();
        let student = store.create_student(new_student("John", "john@school.test")).unwrap();
        let exam = store.create_exam(new_exam("Quiz", 20));
        let result = store.create_result(new_result(student.id, exam.id, 17.0)).unwrap();
        assert_eq!(result.percentage, 85.0);

        let updated = store
            .update_result(
                result.id,
                ResultPatch {
                    score: Some(15.0),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.percentage, 75.0);

        let explicit = store
            .update_result(
                result.id,
                ResultPatch {
                    percentage: Some(80.0),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(explicit.percentage, 80.0);
        assert_eq!(explicit.score, 15.0);
    }

    #[test]
    fn result_references_are_checked() {
        let store = MemoryStore::default();
        let student = store.create_student(new_student("John", "john@school.test")).unwrap();
        let err = store.create_result(new_result(student.id, 9, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingReference {
                entity: EntityKind::Exam,
                id: 9
            }
        ));

        let exam = store.create_exam(new_exam("Final", 100));
        let result = store.create_result(new_result(student.id, exam.id, 50.0)).unwrap();
        let patch = ResultPatch {
            student_id: Some(77),
            ..Default::default()
        };
        assert!(store.update_result(result.id, patch).is_err());
        assert_eq!(store.get_result(result.id).unwrap().student.id, student.id);
    }

    #[test]
    fn unknown_ids_have_no_side_effects() {
        let (store, _, _) = store_with(DeletePolicy::Cascade);
        let before = store.snapshot();

        assert!(!store.delete_student(99_999).unwrap());
        assert!(!store.delete_exam(99_999).unwrap());
        assert!(!store.delete_result(99_999));
        assert!(!store.delete_account(99_999));
        assert!(store.update_exam(99_999, ExamPatch::default()).is_none());
        assert!(store
            .update_result(99_999, ResultPatch::default())
            .unwrap()
            .is_none());

        let after = store.snapshot();
        assert_eq!(before.results, after.results);
        assert_eq!(before.next_ids, after.next_ids);
    }

    #[test]
    fn cascade_delete_removes_results() {
        let (store, student_id, _) = store_with(DeletePolicy::Cascade);
        assert!(store.delete_student(student_id).unwrap());
        assert!(store.get_results().is_empty());
        assert!(store.snapshot().results.is_empty());
    }

    #[test]
    fn restrict_delete_refuses_with_dependents() {
        let (store, student_id, exam_id) = store_with(DeletePolicy::Restrict);
        let err = store.delete_exam(exam_id).unwrap_err();
        assert_eq!(err.to_string(), "exam 1 still has 1 dependent result(s)");
        assert!(store.get_student(student_id).is_some());
        assert!(store.get_exam(exam_id).is_some());
    }

    #[test]
    fn orphan_delete_keeps_results_but_reads_skip_them() {
        let (store, _, exam_id) = store_with(DeletePolicy::Orphan);
        assert!(store.delete_exam(exam_id).unwrap());
        assert_eq!(store.snapshot().results.len(), 1);
        assert!(store.get_results().is_empty());
        assert!(store.get_result(1).is_none());

        let issues = store.integrity_report();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].missing, EntityKind::Exam);
    }

    #[test]
    fn deleting_student_unlinks_accounts() {
        let (store, student_id, _) = store_with(DeletePolicy::Cascade);
        let account = store
            .create_account(NewAccount {
                email: "john@school.test".into(),
                password: "secret".into(),
                name: "John".into(),
                role: Role::Student,
                is_admin: false,
                profile_image: None,
                student_id: Some(student_id),
                notifications: None,
            })
            .unwrap();
        store.delete_student(student_id).unwrap();
        assert_eq!(store.get_account(account.id).unwrap().student_id, None);
    }

    #[test]
    fn account_must_link_to_existing_student() {
        let store = MemoryStore::default();
        let err = store
            .create_account(NewAccount {
                email: "ghost@school.test".into(),
                password: "secret".into(),
                name: "Ghost".into(),
                role: Role::Student,
                is_admin: false,
                profile_image: None,
                student_id: Some(4),
                notifications: None,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference { id: 4, .. }));
    }

    #[test]
    fn authentication_uses_the_verifier() {
        let store = MemoryStore::default().with_verifier(Arc::new(MockVerifier::new()));
        let student = store.create_student(new_student("John", "john@school.test")).unwrap();
        assert_eq!(student.password, "$mock$secret");

        assert_eq!(
            store.authenticate_student("JOHN@school.test", "secret"),
            Some(student)
        );
        assert!(store.authenticate_student("john@school.test", "wrong").is_none());
        assert!(store.authenticate_student("nobody@school.test", "secret").is_none());
    }

    #[test]
    fn default_verifier_denies_everyone() {
        let store = MemoryStore::default();
        store.create_student(new_student("John", "john@school.test")).unwrap();
        assert!(store.authenticate_student("john@school.test", "secret").is_none());
    }

    #[test]
    fn failed_seed_load_leaves_store_unchanged() {
        let store = MemoryStore::default();
        let seed = SeedData {
            students: vec![new_student("A", "a@school.test")],
            exams: vec![new_exam("Quiz", 20)],
            results: vec![new_result(1, 42, 10.0)],
            ..SeedData::default()
        };
        assert!(store.load_seed(seed).is_err());
        assert!(store.get_students().is_empty());
        assert!(store.get_exams().is_empty());

        // Still fresh, so a corrected seed loads with positional ids.
        let seed = SeedData {
            students: vec![new_student("A", "a@school.test")],
            exams: vec![new_exam("Quiz", 20)],
            results: vec![new_result(1, 1, 10.0)],
            ..SeedData::default()
        };
        assert_eq!(store.load_seed(seed).unwrap(), 3);
        assert_eq!(store.get_result(1).unwrap().exam.name, "Quiz");
    }

    #[test]
    fn seed_is_refused_by_a_used_store() {
        let store = MemoryStore::default();
        store.create_exam(new_exam("Existing", 100));
        let seed = SeedData {
            exams: vec![new_exam("Seeded", 50)],
            ..SeedData::default()
        };
        let err = store.load_seed(seed.clone()).unwrap_err();
        assert!(matches!(err, StoreError::NotEmpty { records: 1 }));
        assert_eq!(store.get_exams().len(), 1);

        // Emptied again, but ids 1.. are spent.
        store.delete_exam(1).unwrap();
        assert!(matches!(
            store.load_seed(seed).unwrap_err(),
            StoreError::NotEmpty { records: 0 }
        ));
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        let store = MemoryStore::default();
        let student = store.create_student(new_student("John", "john@school.test")).unwrap();
        let exam = store.create_exam(new_exam("Quiz", 20));

        let err = store
            .create_result(new_result(student.id, exam.id, f64::NAN))
            .unwrap_err();
        assert!(matches!(err, StoreError::NonFinite { field: "score", .. }));

        let mut explicit = new_result(student.id, exam.id, 10.0);
        explicit.percentage = Some(f64::INFINITY);
        assert!(matches!(
            store.create_result(explicit).unwrap_err(),
            StoreError::NonFinite {
                field: "percentage",
                ..
            }
        ));
        assert!(store.get_results().is_empty());

        let result = store.create_result(new_result(student.id, exam.id, 18.0)).unwrap();
        let patch = ResultPatch {
            score: Some(f64::NAN),
            ..Default::default()
        };
        assert!(store.update_result(result.id, patch).is_err());
        let patch = ResultPatch {
            percentage: Some(f64::NEG_INFINITY),
            ..Default::default()
        };
        assert!(store.update_result(result.id, patch).is_err());
        assert_eq!(store.get_result(result.id).unwrap().result.score, 18.0);

        // The stored data still survives a JSON round trip.
        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let restored: StoreSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.results.len(), 1);
    }

    #[test]
    fn account_student_link_can_be_cleared() {
        let (store, student_id, _) = store_with(DeletePolicy::Cascade);
        let account = store
            .create_account(NewAccount {
                email: "john@school.test".into(),
                password: "secret".into(),
                name: "John".into(),
                role: Role::Student,
                is_admin: false,
                profile_image: Some("john.png".into()),
                student_id: Some(student_id),
                notifications: None,
            })
            .unwrap();

        let patch = AccountPatch {
            student_id: Some(Some(99)),
            ..Default::default()
        };
        assert!(store.update_account(account.id, patch).is_err());

        let patch = AccountPatch {
            student_id: Some(None),
            ..Default::default()
        };
        let updated = store.update_account(account.id, patch).unwrap().unwrap();
        assert_eq!(updated.student_id, None);
        assert_eq!(updated.profile_image.as_deref(), Some("john.png"));
    }

    #[test]
    fn snapshot_restores_ids_and_counters() {
        let (store, _, _) = store_with(DeletePolicy::Cascade);
        store.create_exam(new_exam("Doomed", 10));
        store.delete_exam(2).unwrap();

        let restored = MemoryStore::from_snapshot(store.snapshot(), StoreConfig::default());
        assert_eq!(restored.get_results().len(), 1);
        assert_eq!(restored.create_exam(new_exam("Next", 10)).id, 3);
    }

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(MemoryStore::default());
        std::thread::scope(|scope| {
            for t in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for i in 0..25 {
                        store
                            .create_student(new_student(
                                "Student",
                                &format!("s{t}-{i}@school.test"),
                            ))
                            .unwrap();
                    }
                });
            }
        });

        let mut ids: Vec<StudentId> = store.get_students().iter().map(|s| s.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&200));
    }

    #[tokio::test]
    async fn trait_object_delegates() {
        let store: Arc<dyn ExamStore> = Arc::new(MemoryStore::default());
        let exam = store.create_exam(new_exam("Async", 100)).await.unwrap();
        assert_eq!(store.get_exam(exam.id).await.unwrap(), Some(exam));
        assert_eq!(store.get_statistics().await.unwrap().completed_exams, 1);
        assert!(store.get_student_dashboard(1).await.is_err());
    }
}
