//! A `LocalStore` held entirely in memory.
//!
//! Used by tests and by callers that reconcile a snapshot without a
//! database. Rows keep insertion order so passes are reproducible.

use std::convert::Infallible;

use concord_shared::groups::{GroupIdV1, GroupIdV2};
use concord_shared::local::{DistributionListRow, LocalAccount, Recipient, RecipientId, RecipientKind};
use concord_shared::{Aci, DistributionId, Pni, RawId, UnknownRecord};

use crate::store::LocalStore;

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryStore {
    account: LocalAccount,
    recipients: Vec<Recipient>,
    lists: Vec<DistributionListRow>,
    unknown: Vec<UnknownRecord>,
    next_recipient_id: i64,
    next_list_id: i64,
}

impl MemoryStore {
    pub fn new(account: LocalAccount) -> Self {
        Self {
            account,
            recipients: Vec::new(),
            lists: Vec::new(),
            unknown: Vec::new(),
            next_recipient_id: 1,
            next_list_id: 1,
        }
    }

    fn find_recipient(&self, pred: impl Fn(&Recipient) -> bool) -> Option<Recipient> {
        self.recipients.iter().find(|r| pred(r)).cloned()
    }
}

impl LocalStore for MemoryStore {
    type Error = Infallible;

    fn local_account(&self) -> Result<LocalAccount, Infallible> {
        Ok(self.account.clone())
    }

    fn update_local_account(&mut self, account: &LocalAccount) -> Result<(), Infallible> {
        self.account = account.clone();
        Ok(())
    }

    fn all_recipients(&self) -> Result<Vec<Recipient>, Infallible> {
        Ok(self.recipients.clone())
    }

    fn recipient(&self, id: RecipientId) -> Result<Option<Recipient>, Infallible> {
        Ok(self.find_recipient(|r| r.id == id))
    }

    fn recipient_by_aci(&self, aci: &Aci) -> Result<Option<Recipient>, Infallible> {
        Ok(self.find_recipient(|r| r.aci().as_ref() == Some(aci)))
    }

    fn recipient_by_pni(&self, pni: &Pni) -> Result<Option<Recipient>, Infallible> {
        Ok(self.find_recipient(|r| r.pni().as_ref() == Some(pni)))
    }

    fn recipient_by_e164(&self, e164: &str) -> Result<Option<Recipient>, Infallible> {
        Ok(self.find_recipient(|r| r.e164() == Some(e164)))
    }

    fn recipient_by_group_v1(&self, group_id: &GroupIdV1) -> Result<Option<Recipient>, Infallible> {
        Ok(self.find_recipient(|r| r.group_v1_id().as_ref() == Some(group_id)))
    }

    fn recipient_by_group_v2(&self, group_id: &GroupIdV2) -> Result<Option<Recipient>, Infallible> {
        Ok(self.find_recipient(|r| r.group_v2_id().as_ref() == Some(group_id)))
    }

    fn recipient_by_expected_v2(
        &self,
        group_id: &GroupIdV2,
    ) -> Result<Option<Recipient>, Infallible> {
        Ok(self.find_recipient(|r| match &r.kind {
            RecipientKind::GroupV1 { group_id: v1 } => v1.expected_v2_id() == *group_id,
            _ => false,
        }))
    }

    fn recipient_by_storage_id(&self, raw: &RawId) -> Result<Option<Recipient>, Infallible> {
        Ok(self.find_recipient(|r| r.storage_id.as_ref() == Some(raw)))
    }

    fn insert_recipient(&mut self, recipient: &Recipient) -> Result<RecipientId, Infallible> {
        let id = RecipientId(self.next_recipient_id);
        self.next_recipient_id += 1;

        let mut row = recipient.clone();
        row.id = id;
        self.recipients.push(row);
        Ok(id)
    }

    fn update_recipient(&mut self, recipient: &Recipient) -> Result<(), Infallible> {
        if let Some(row) = self.recipients.iter_mut().find(|r| r.id == recipient.id) {
            *row = recipient.clone();
        }
        Ok(())
    }

    fn all_distribution_lists(&self) -> Result<Vec<DistributionListRow>, Infallible> {
        Ok(self.lists.clone())
    }

    fn distribution_list(
        &self,
        id: &DistributionId,
    ) -> Result<Option<DistributionListRow>, Infallible> {
        Ok(self.lists.iter().find(|l| l.distribution_id == *id).cloned())
    }

    fn distribution_list_by_storage_id(
        &self,
        raw: &RawId,
    ) -> Result<Option<DistributionListRow>, Infallible> {
        Ok(self
            .lists
            .iter()
            .find(|l| l.storage_id.as_ref() == Some(raw))
            .cloned())
    }

    fn insert_distribution_list(&mut self, list: &DistributionListRow) -> Result<i64, Infallible> {
        let id = self.next_list_id;
        self.next_list_id += 1;

        let mut row = list.clone();
        row.id = id;
        self.lists.push(row);
        Ok(id)
    }

    fn update_distribution_list(&mut self, list: &DistributionListRow) -> Result<(), Infallible> {
        if let Some(row) = self.lists.iter_mut().find(|l| l.id == list.id) {
            *row = list.clone();
        }
        Ok(())
    }

    fn unknown_records(&self) -> Result<Vec<UnknownRecord>, Infallible> {
        Ok(self.unknown.clone())
    }

    fn insert_unknown_records(&mut self, records: &[UnknownRecord]) -> Result<(), Infallible> {
        for record in records {
            if !self.unknown.iter().any(|u| u.id.raw == record.id.raw) {
                self.unknown.push(record.clone());
            }
        }
        Ok(())
    }

    fn delete_unknown_records(&mut self, ids: &[RawId]) -> Result<(), Infallible> {
        self.unknown.retain(|u| !ids.contains(&u.id.raw));
        Ok(())
    }
}
