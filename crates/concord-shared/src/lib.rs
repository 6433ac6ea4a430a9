//! # concord-shared
//!
//! Identifiers, typed storage records and local row models shared by the
//! reconciliation engine and the local store.

pub mod codec;
pub mod constants;
pub mod error;
pub mod groups;
pub mod ids;
pub mod keys;
pub mod local;
pub mod records;
pub mod text;

pub use error::{CodecError, IdError};
pub use ids::{Aci, DistributionId, Pni, RawId, RecordType, StorageId};
pub use keys::{KeyGenerator, RandomKeyGenerator, SequentialKeyGenerator};
pub use records::*;
