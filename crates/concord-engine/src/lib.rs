//! Reconciliation of local state against the remote storage service.
//!
//! [`StorageSync::reconcile`] runs a full pass over a [`LocalStore`]; the
//! building blocks (differencer, processing loop, processors, validator)
//! are public for callers that drive a pass themselves.

pub mod adapters;
pub mod config;
pub mod diff;
pub mod error;
pub mod manifest;
pub mod memory;
pub mod processor;
pub mod processors;
pub mod store;
pub mod sync;
pub mod validation;

pub use config::SyncConfig;
pub use diff::{find_id_difference, IdDifference};
pub use error::{Result, SyncError, ValidationError};
pub use manifest::{Manifest, WriteOperationResult};
pub use memory::MemoryStore;
pub use processor::{process, ProcessReport, RecordProcessor, RecordUpdate, SyncRecord};
pub use store::LocalStore;
pub use sync::{local_storage_ids, LocalEntity, RecordCollection, StorageSync, SyncOutcome};
pub use validation::validate;
