//! Record-kind specific processors.

pub mod account;
pub mod contact;
pub mod distribution_list;
pub mod group_v1;
pub mod group_v2;

pub use account::AccountProcessor;
pub use contact::ContactProcessor;
pub use distribution_list::DistributionListProcessor;
pub use group_v1::GroupV1Processor;
pub use group_v2::GroupV2Processor;

use concord_shared::local::Recipient;
use concord_shared::KeyGenerator;

use crate::error::{Result, SyncError};
use crate::store::LocalStore;

/// Lift a store error into [`SyncError::Store`].
pub(crate) trait StoreResultExt<T> {
    fn store_err(self) -> Result<T>;
}

impl<T, E> StoreResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn store_err(self) -> Result<T> {
        self.map_err(SyncError::store)
    }
}

/// Give a never-synced recipient row a storage key before it is projected.
pub(crate) fn ensure_recipient_key<S: LocalStore>(
    store: &mut S,
    mut recipient: Recipient,
    keys: &mut dyn KeyGenerator,
) -> Result<Recipient> {
    if recipient.storage_id.is_none() {
        let raw = keys.generate();
        tracing::debug!(recipient = %recipient.id, key = %raw, "Assigning storage id to unsynced row");
        recipient.storage_id = Some(raw);
        store.update_recipient(&recipient).store_err()?;
    }
    Ok(recipient)
}
