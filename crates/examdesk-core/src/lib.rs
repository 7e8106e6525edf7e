//! examdesk-core — Data model, collections and derived views.
//!
//! This crate defines the records an exam store keeps, the keyed collections
//! that hold them, the store contract, and the aggregation logic built on top:
//! result assembly, competition ranking, statistics and student dashboards.

pub mod assembler;
pub mod collection;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod ranking;
pub mod seed;
pub mod statistics;
pub mod traits;

pub use error::{EntityKind, StoreError};
