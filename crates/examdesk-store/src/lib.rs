//! examdesk-store — Store implementations, configuration and snapshots.
//!
//! Provides `MemoryStore`, the in-memory implementation of the `ExamStore`
//! contract, together with the TOML configuration that selects its policies
//! and JSON snapshots for saving and restoring its contents.

pub mod config;
pub mod memory;
pub mod mock;
pub mod snapshot;

pub use config::{load_config_from, DeletePolicy, EmailPolicy, ExamdeskConfig, StoreConfig};
pub use memory::MemoryStore;
pub use snapshot::StoreSnapshot;
