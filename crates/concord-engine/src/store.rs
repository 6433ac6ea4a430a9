//! The seam between the engine and local persistence.
//!
//! Implementations are plain row CRUD; all matching and merging decisions
//! live in the processors. A reconciliation pass is expected to run inside
//! one transaction of the implementing store.

use concord_shared::groups::{GroupIdV1, GroupIdV2};
use concord_shared::local::{DistributionListRow, LocalAccount, Recipient, RecipientId};
use concord_shared::{Aci, DistributionId, Pni, RawId, UnknownRecord};

pub trait LocalStore {
    type Error: std::error::Error + Send + Sync + 'static;

    // ------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------

    fn local_account(&self) -> Result<LocalAccount, Self::Error>;

    fn update_local_account(&mut self, account: &LocalAccount) -> Result<(), Self::Error>;

    // ------------------------------------------------------------------
    // Recipients
    // ------------------------------------------------------------------

    fn all_recipients(&self) -> Result<Vec<Recipient>, Self::Error>;

    fn recipient(&self, id: RecipientId) -> Result<Option<Recipient>, Self::Error>;

    fn recipient_by_aci(&self, aci: &Aci) -> Result<Option<Recipient>, Self::Error>;

    fn recipient_by_pni(&self, pni: &Pni) -> Result<Option<Recipient>, Self::Error>;

    fn recipient_by_e164(&self, e164: &str) -> Result<Option<Recipient>, Self::Error>;

    fn recipient_by_group_v1(&self, group_id: &GroupIdV1) -> Result<Option<Recipient>, Self::Error>;

    fn recipient_by_group_v2(&self, group_id: &GroupIdV2) -> Result<Option<Recipient>, Self::Error>;

    /// A V1 group whose migration would produce `group_id`.
    fn recipient_by_expected_v2(
        &self,
        group_id: &GroupIdV2,
    ) -> Result<Option<Recipient>, Self::Error>;

    fn recipient_by_storage_id(&self, raw: &RawId) -> Result<Option<Recipient>, Self::Error>;

    /// Insert a new row and return its assigned id. `recipient.id` is ignored.
    fn insert_recipient(&mut self, recipient: &Recipient) -> Result<RecipientId, Self::Error>;

    /// Overwrite the row with `recipient.id`.
    fn update_recipient(&mut self, recipient: &Recipient) -> Result<(), Self::Error>;

    // ------------------------------------------------------------------
    // Distribution lists
    // ------------------------------------------------------------------

    fn all_distribution_lists(&self) -> Result<Vec<DistributionListRow>, Self::Error>;

    fn distribution_list(
        &self,
        id: &DistributionId,
    ) -> Result<Option<DistributionListRow>, Self::Error>;

    fn distribution_list_by_storage_id(
        &self,
        raw: &RawId,
    ) -> Result<Option<DistributionListRow>, Self::Error>;

    fn insert_distribution_list(&mut self, list: &DistributionListRow) -> Result<i64, Self::Error>;

    fn update_distribution_list(&mut self, list: &DistributionListRow) -> Result<(), Self::Error>;

    // ------------------------------------------------------------------
    // Unknown records
    // ------------------------------------------------------------------

    fn unknown_records(&self) -> Result<Vec<UnknownRecord>, Self::Error>;

    fn insert_unknown_records(&mut self, records: &[UnknownRecord]) -> Result<(), Self::Error>;

    fn delete_unknown_records(&mut self, ids: &[RawId]) -> Result<(), Self::Error>;
}
