//! Store error types.
//!
//! Plain reads never fail: an unknown id is an absent value. These errors
//! cover the writes a store refuses and the views that must name an existing
//! record.

use std::fmt;

use thiserror::Error;

/// The collection a failing operation was addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Account,
    Student,
    Exam,
    Result,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Account => write!(f, "account"),
            EntityKind::Student => write!(f, "student"),
            EntityKind::Exam => write!(f, "exam"),
            EntityKind::Result => write!(f, "result"),
        }
    }
}

/// Errors returned by an exam store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A view was requested for a record that does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: u64 },

    /// Another record in the same collection already uses this email.
    #[error("{entity} email already in use: {email}")]
    DuplicateEmail { entity: EntityKind, email: String },

    /// A write refers to a record that does not exist.
    #[error("referenced {entity} {id} does not exist")]
    MissingReference { entity: EntityKind, id: u64 },

    /// A delete was refused because other records still refer to this one.
    #[error("{entity} {id} still has {dependents} dependent result(s)")]
    DependentsExist {
        entity: EntityKind,
        id: u64,
        dependents: usize,
    },

    /// A score or percentage was NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    /// Seed data was offered to a store that already holds records.
    #[error("seed data can only be loaded into an empty store ({records} record(s) present)")]
    NotEmpty { records: usize },

    /// A backing service failed. Never produced by the in-memory store.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` if the caller sent something the store will never
    /// accept as-is, as opposed to a backend failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, StoreError::Backend(_))
    }

    pub fn not_found(entity: EntityKind, id: u64) -> Self {
        StoreError::NotFound { entity, id }
    }
}
