//! # mentat-core
//!
//! Core types, traits, and entry-management logic for the mentat entry service.
//!
//! This crate provides the entry data model, validation and normalization
//! rules, the storage-agnostic query filter, the [`EntryStore`] trait that
//! persistence backends implement, and the [`EntryGateway`] that exposes the
//! six entry operations (Add, Update, Delete, Cleanup, Stats, Search).

pub mod defaults;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod logging;
pub mod memory;
pub mod models;
pub mod patch;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{DomainError, EntryError, Error, Result};
pub use filter::EntryFilter;
pub use gateway::EntryGateway;
pub use memory::{MemoryEntryStore, StoreOp};
pub use models::*;
pub use patch::EntryPatch;
pub use traits::EntryStore;
