//! Keyed record arena with monotonic surrogate ids.
//!
//! A collection owns its id counter. Ids start at 1 and only move forward, so
//! a deleted id is never handed out again. Mutating methods take `&mut self`;
//! callers that share a collection across threads wrap it in a lock so the
//! counter bump and the insert happen under one guard.

use std::collections::btree_map::{BTreeMap, Values, ValuesMut};

use crate::model::{same_email, Account, Entity, Exam, ExamResult, StudentProfile};

/// Records that can be looked up by email.
pub trait EmailKeyed {
    fn email(&self) -> &str;
}

impl EmailKeyed for Account {
    fn email(&self) -> &str {
        &self.email
    }
}

impl EmailKeyed for StudentProfile {
    fn email(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone)]
pub struct EntityCollection<T> {
    records: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Entity> EntityCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a collection from saved records and counter.
    ///
    /// The counter is raised past the highest restored id if needed, so a
    /// stale counter can never collide with an existing record.
    pub fn restore(records: Vec<T>, next_id: u64) -> Self {
        let records: BTreeMap<u64, T> = records.into_iter().map(|r| (r.id(), r)).collect();
        let floor = records.keys().next_back().map_or(1, |max| max + 1);
        Self {
            records,
            next_id: next_id.max(floor),
        }
    }

    /// The id the next `create` will assign.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.records.contains_key(&id)
    }

    /// Assign the next id, store the record and return a copy of it.
    pub fn create(&mut self, new: T::New) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let record = T::from_new(id, new);
        self.records.insert(id, record.clone());
        record
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.records.get(&id)
    }

    /// All records in insertion order.
    pub fn get_all(&self) -> Vec<T> {
        self.records.values().cloned().collect()
    }

    pub fn iter(&self) -> Values<'_, u64, T> {
        self.records.values()
    }

    /// In-place access that bypasses `Patch`, for fix-ups such as clearing a
    /// back-reference. Ids must not be changed.
    pub fn iter_mut(&mut self) -> ValuesMut<'_, u64, T> {
        self.records.values_mut()
    }

    /// First record matching `predicate`, scanning in insertion order.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.records.values().find(|r| predicate(r))
    }

    /// Merge `patch` into the record with `id`. Absent for an unknown id.
    pub fn update(&mut self, id: u64, patch: T::Patch) -> Option<T> {
        let record = self.records.get_mut(&id)?;
        record.apply(patch);
        Some(record.clone())
    }

    pub fn delete(&mut self, id: u64) -> bool {
        self.records.remove(&id).is_some()
    }

    /// Remove every record matching `predicate`, returning how many went.
    pub fn delete_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| !predicate(r));
        before - self.records.len()
    }
}

impl<T: Entity + EmailKeyed> EntityCollection<T> {
    /// Linear scan for the first record with a matching email.
    pub fn get_by_email(&self, email: &str) -> Option<&T> {
        self.find(|r| same_email(r.email(), email))
    }

    /// Whether another record (not `except`) already uses `email`.
    pub fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        self.records
            .values()
            .any(|r| Some(r.id()) != except && same_email(r.email(), email))
    }
}

/// The four collections a store keeps. Derived views (assembly, ranking,
/// statistics, dashboards) read from this.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub accounts: EntityCollection<Account>,
    pub students: EntityCollection<StudentProfile>,
    pub exams: EntityCollection<Exam>,
    pub results: EntityCollection<ExamResult>,
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.accounts.len() + self.students.len() + self.exams.len() + self.results.len()
    }

    /// Nothing was ever created here, so every collection will hand out id 1
    /// next.
    pub fn is_fresh(&self) -> bool {
        self.accounts.next_id() == 1
            && self.students.next_id() == 1
            && self.exams.next_id() == 1
            && self.results.next_id() == 1
    }

    /// Results for one exam, in insertion order.
    pub fn results_for_exam(&self, exam_id: u64) -> impl Iterator<Item = &ExamResult> {
        self.results.iter().filter(move |r| r.exam_id == exam_id)
    }

    /// Results for one student, in insertion order.
    pub fn results_for_student(&self, student_id: u64) -> impl Iterator<Item = &ExamResult> {
        self.results.iter().filter(move |r| r.student_id == student_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Exam, ExamStatus, NewExam, NewStudent, StudentPatch};
    use chrono::NaiveDate;

    fn new_exam(name: &str) -> NewExam {
        NewExam {
            name: name.into(),
            subject: "Mathematics".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            duration_minutes: 60,
            total_marks: 100,
            status: ExamStatus::Upcoming,
            description: None,
        }
    }

    fn new_student(name: &str, email: &str) -> NewStudent {
        NewStudent {
            name: name.into(),
            email: email.into(),
            class_label: "10A".into(),
            enrollment_date: NaiveDate::from_ymd_opt(2023, 9, 1),
            password: "hash".into(),
            phone: None,
            address: None,
            guardian_name: None,
            guardian_phone: None,
            date_of_birth: None,
            profile_image: None,
        }
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let mut exams: EntityCollection<Exam> = EntityCollection::new();
        let ids: Vec<u64> = (0..5)
            .map(|i| exams.create(new_exam(&format!("Exam {i}"))).id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(exams.next_id(), 6);
    }

    #[test]
    fn collections_stop_being_fresh_after_a_create() {
        let mut tables = Collections::new();
        assert!(tables.is_fresh());
        tables.exams.create(new_exam("A"));
        tables.exams.delete(1);
        assert_eq!(tables.record_count(), 0);
        assert!(!tables.is_fresh());
    }

    #[test]
    fn deleted_ids_are_never_reused() {
        let mut exams: EntityCollection<Exam> = EntityCollection::new();
        exams.create(new_exam("A"));
        let b = exams.create(new_exam("B"));
        assert!(exams.delete(b.id));
        let c = exams.create(new_exam("C"));
        assert_eq!(c.id, 3);
        assert!(exams.get(b.id).is_none());
    }

    #[test]
    fn unknown_ids_are_absent_not_errors() {
        let mut students: EntityCollection<StudentProfile> = EntityCollection::new();
        let john = students.create(new_student("John", "john@school.test"));
        assert!(students
            .update(
                99_999,
                StudentPatch {
                    name: Some("Ghost".into()),
                    ..Default::default()
                }
            )
            .is_none());
        assert!(!students.delete(99_999));
        assert_eq!(students.get(john.id).unwrap().name, "John");
        assert_eq!(students.len(), 1);
    }

    #[test]
    fn get_all_keeps_insertion_order() {
        let mut exams: EntityCollection<Exam> = EntityCollection::new();
        exams.create(new_exam("First"));
        exams.create(new_exam("Second"));
        exams.create(new_exam("Third"));
        exams.delete(2);
        exams.create(new_exam("Fourth"));
        let names: Vec<String> = exams.get_all().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["First", "Third", "Fourth"]);
    }

    #[test]
    fn email_lookup_is_case_insensitive() {
        let mut students: EntityCollection<StudentProfile> = EntityCollection::new();
        students.create(new_student("Jane", "Jane@School.test"));
        let found = students.get_by_email("jane@school.test").unwrap();
        assert_eq!(found.name, "Jane");
        assert!(students.email_taken("JANE@school.test", None));
        assert!(!students.email_taken("jane@school.test", Some(found.id)));
    }

    #[test]
    fn restore_never_moves_counter_backwards() {
        let mut exams: EntityCollection<Exam> = EntityCollection::new();
        exams.create(new_exam("A"));
        exams.create(new_exam("B"));
        let saved = exams.get_all();

        let restored = EntityCollection::restore(saved.clone(), 1);
        assert_eq!(restored.next_id(), 3);

        let restored = EntityCollection::restore(saved, 10);
        assert_eq!(restored.next_id(), 10);
    }

    #[test]
    fn delete_where_counts_removed() {
        let mut exams: EntityCollection<Exam> = EntityCollection::new();
        exams.create(new_exam("Keep"));
        exams.create(new_exam("Drop"));
        exams.create(new_exam("Drop"));
        assert_eq!(exams.delete_where(|e| e.name == "Drop"), 2);
        assert_eq!(exams.len(), 1);
    }
}
