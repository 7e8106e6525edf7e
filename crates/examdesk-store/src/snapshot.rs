//! Point-in-time copies of a store with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use examdesk_core::collection::{Collections, EntityCollection};
use examdesk_core::model::{Account, Exam, ExamResult, StudentProfile};

/// Every record in a store, plus the id counters needed to resume it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Unique snapshot identifier.
    pub id: Uuid,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub students: Vec<StudentProfile>,
    pub exams: Vec<Exam>,
    pub results: Vec<ExamResult>,
    pub next_ids: NextIds,
}

/// The id each collection would assign next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextIds {
    pub accounts: u64,
    pub students: u64,
    pub exams: u64,
    pub results: u64,
}

impl StoreSnapshot {
    /// Copy the current contents of `tables`.
    pub fn capture(tables: &Collections) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            accounts: tables.accounts.get_all(),
            students: tables.students.get_all(),
            exams: tables.exams.get_all(),
            results: tables.results.get_all(),
            next_ids: NextIds {
                accounts: tables.accounts.next_id(),
                students: tables.students.next_id(),
                exams: tables.exams.next_id(),
                results: tables.results.next_id(),
            },
        }
    }

    /// Rebuild the collections this snapshot was taken from.
    pub fn into_collections(self) -> Collections {
        Collections {
            accounts: EntityCollection::restore(self.accounts, self.next_ids.accounts),
            students: EntityCollection::restore(self.students, self.next_ids.students),
            exams: EntityCollection::restore(self.exams, self.next_ids.exams),
            results: EntityCollection::restore(self.results, self.next_ids.results),
        }
    }

    /// Total number of records across all collections.
    pub fn record_count(&self) -> usize {
        self.accounts.len() + self.students.len() + self.exams.len() + self.results.len()
    }

    /// Save the snapshot as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot: StoreSnapshot =
            serde_json::from_str(&content).context("failed to parse snapshot JSON")?;
        Ok(snapshot)
    }
}
