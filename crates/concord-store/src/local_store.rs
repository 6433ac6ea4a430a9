//! [`LocalStore`] over an open SQLite transaction.

use concord_engine::LocalStore;
use concord_shared::groups::{GroupIdV1, GroupIdV2};
use concord_shared::local::{DistributionListRow, LocalAccount, Recipient, RecipientId};
use concord_shared::{Aci, DistributionId, Pni, RawId, UnknownRecord};

use crate::database::SyncTransaction;
use crate::error::StoreError;
use crate::{account, distribution_lists, recipients, unknown};

impl LocalStore for SyncTransaction<'_> {
    type Error = StoreError;

    fn local_account(&self) -> Result<LocalAccount, StoreError> {
        account::load(self.conn())
    }

    fn update_local_account(&mut self, account: &LocalAccount) -> Result<(), StoreError> {
        account::upsert(self.conn(), account)
    }

    fn all_recipients(&self) -> Result<Vec<Recipient>, StoreError> {
        recipients::list(self.conn())
    }

    fn recipient(&self, id: RecipientId) -> Result<Option<Recipient>, StoreError> {
        recipients::by_id(self.conn(), id)
    }

    fn recipient_by_aci(&self, aci: &Aci) -> Result<Option<Recipient>, StoreError> {
        recipients::by_aci(self.conn(), aci)
    }

    fn recipient_by_pni(&self, pni: &Pni) -> Result<Option<Recipient>, StoreError> {
        recipients::by_pni(self.conn(), pni)
    }

    fn recipient_by_e164(&self, e164: &str) -> Result<Option<Recipient>, StoreError> {
        recipients::by_e164(self.conn(), e164)
    }

    fn recipient_by_group_v1(&self, group_id: &GroupIdV1) -> Result<Option<Recipient>, StoreError> {
        recipients::by_group_v1(self.conn(), group_id)
    }

    fn recipient_by_group_v2(&self, group_id: &GroupIdV2) -> Result<Option<Recipient>, StoreError> {
        recipients::by_group_v2(self.conn(), group_id)
    }

    fn recipient_by_expected_v2(
        &self,
        group_id: &GroupIdV2,
    ) -> Result<Option<Recipient>, StoreError> {
        recipients::by_expected_v2(self.conn(), group_id)
    }

    fn recipient_by_storage_id(&self, raw: &RawId) -> Result<Option<Recipient>, StoreError> {
        recipients::by_storage_id(self.conn(), raw)
    }

    fn insert_recipient(&mut self, recipient: &Recipient) -> Result<RecipientId, StoreError> {
        recipients::insert(self.conn(), recipient)
    }

    fn update_recipient(&mut self, recipient: &Recipient) -> Result<(), StoreError> {
        recipients::update(self.conn(), recipient)
    }

    fn all_distribution_lists(&self) -> Result<Vec<DistributionListRow>, StoreError> {
        distribution_lists::list_all(self.conn())
    }

    fn distribution_list(
        &self,
        id: &DistributionId,
    ) -> Result<Option<DistributionListRow>, StoreError> {
        distribution_lists::by_distribution_id(self.conn(), id)
    }

    fn distribution_list_by_storage_id(
        &self,
        raw: &RawId,
    ) -> Result<Option<DistributionListRow>, StoreError> {
        distribution_lists::by_storage_id(self.conn(), raw)
    }

    fn insert_distribution_list(&mut self, list: &DistributionListRow) -> Result<i64, StoreError> {
        distribution_lists::insert(self.conn(), list)
    }

    fn update_distribution_list(&mut self, list: &DistributionListRow) -> Result<(), StoreError> {
        distribution_lists::update(self.conn(), list)
    }

    fn unknown_records(&self) -> Result<Vec<UnknownRecord>, StoreError> {
        unknown::list(self.conn())
    }

    fn insert_unknown_records(&mut self, records: &[UnknownRecord]) -> Result<(), StoreError> {
        unknown::insert(self.conn(), records)
    }

    fn delete_unknown_records(&mut self, ids: &[RawId]) -> Result<(), StoreError> {
        unknown::delete(self.conn(), ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use concord_shared::local::SelfIdentity;
    use uuid::Uuid;

    #[test]
    fn dropped_transaction_rolls_back() {
        let mut db = Database::open_in_memory().unwrap();
        {
            let mut tx = db.begin_sync().unwrap();
            tx.insert_recipient(&Recipient::contact(Some(Aci(Uuid::from_u128(4))), None, None))
                .unwrap();
            assert_eq!(tx.all_recipients().unwrap().len(), 1);
        }
        assert!(db.list_recipients().unwrap().is_empty());
    }

    #[test]
    fn committed_transaction_persists() {
        let mut db = Database::open_in_memory().unwrap();
        let account = LocalAccount::new(SelfIdentity {
            aci: Aci(Uuid::from_u128(1)),
            pni: None,
            e164: None,
        });

        let mut tx = db.begin_sync().unwrap();
        tx.update_local_account(&account).unwrap();
        tx.commit().unwrap();

        assert_eq!(db.local_account().unwrap(), account);
    }
}
