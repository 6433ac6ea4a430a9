//! Final invariant check over a write-back proposal.
//!
//! Any failure here aborts the whole pass; the caller retries from a fresh
//! snapshot later.

use std::collections::HashSet;

use concord_shared::local::SelfIdentity;
use concord_shared::{RawId, StorageRecord};

use crate::error::ValidationError;
use crate::manifest::{Manifest, WriteOperationResult};

pub fn validate(
    write: &WriteOperationResult,
    previous: Option<&Manifest>,
    self_identity: &SelfIdentity,
) -> Result<(), ValidationError> {
    if let Some(previous) = previous {
        if previous.version.checked_add(1) != Some(write.manifest.version) {
            return Err(ValidationError::IncorrectManifestVersion {
                previous: previous.version,
                actual: write.manifest.version,
            });
        }
    }

    let mut full_set: HashSet<RawId> = HashSet::with_capacity(write.manifest.storage_ids.len());
    for id in &write.manifest.storage_ids {
        if !full_set.insert(id.raw) {
            return Err(ValidationError::DuplicateIdInManifest(*id));
        }
    }

    match write.manifest.account_ids().count() {
        1 => {}
        0 => return Err(ValidationError::MissingAccount),
        n => return Err(ValidationError::MultipleAccounts(n)),
    }

    let delete_set: HashSet<RawId> = write.deletes.iter().copied().collect();
    let mut insert_set: HashSet<RawId> = HashSet::with_capacity(write.inserts.len());

    for insert in &write.inserts {
        let id = insert.id();

        if !insert_set.insert(id.raw) {
            return Err(ValidationError::DuplicateInsert(*id));
        }
        if !full_set.contains(&id.raw) {
            return Err(ValidationError::InsertNotPresentInFullIdSet(*id));
        }
        if delete_set.contains(&id.raw) {
            return Err(ValidationError::InsertInDeleteSet(*id));
        }
        if insert.is_unknown() || id.is_unknown() {
            return Err(ValidationError::UnknownInsert(*id));
        }

        if let StorageRecord::Contact(contact) = insert {
            if self_identity.matches(
                contact.aci.as_ref(),
                contact.pni.as_ref(),
                contact.e164.as_deref(),
            ) {
                return Err(ValidationError::SelfAddedAsContact(*id));
            }
        }
    }

    if let Some(id) = write
        .manifest
        .storage_ids
        .iter()
        .find(|id| delete_set.contains(&id.raw))
    {
        return Err(ValidationError::DeletePresentInFullIdSet(*id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_shared::{
        AccountRecord, Aci, ContactRecord, Pni, RecordType, StorageId, UnknownRecord,
    };
    use uuid::Uuid;

    fn me() -> SelfIdentity {
        SelfIdentity {
            aci: Aci(Uuid::from_u128(0xAAAA)),
            pni: Some(Pni(Uuid::from_u128(0xBBBB))),
            e164: Some("+15555550100".into()),
        }
    }

    fn account(n: u8) -> StorageId {
        StorageId::for_account(RawId([n; 16]))
    }

    fn contact(n: u8) -> StorageId {
        StorageId::for_contact(RawId([n; 16]))
    }

    fn contact_record(n: u8, aci: u128) -> StorageRecord {
        ContactRecord {
            aci: Some(Aci(Uuid::from_u128(aci))),
            ..ContactRecord::new(contact(n))
        }
        .into()
    }

    fn write(ids: Vec<StorageId>, inserts: Vec<StorageRecord>, deletes: Vec<RawId>) -> WriteOperationResult {
        WriteOperationResult {
            manifest: Manifest::new(2, ids),
            inserts,
            deletes,
        }
    }

    fn previous() -> Manifest {
        Manifest::new(1, vec![])
    }

    #[test]
    fn test_valid_write_passes() {
        let w = write(
            vec![account(1), contact(2)],
            vec![contact_record(2, 5), AccountRecord::new(account(1)).into()],
            vec![RawId([9; 16])],
        );
        assert_eq!(validate(&w, Some(&previous()), &me()), Ok(()));
    }

    #[test]
    fn test_two_accounts_rejected() {
        let w = write(vec![account(1), account(2)], vec![], vec![]);
        assert_eq!(
            validate(&w, Some(&previous()), &me()),
            Err(ValidationError::MultipleAccounts(2))
        );
    }

    #[test]
    fn test_zero_accounts_rejected() {
        let w = write(vec![contact(1)], vec![], vec![]);
        assert_eq!(
            validate(&w, Some(&previous()), &me()),
            Err(ValidationError::MissingAccount)
        );
    }

    #[test]
    fn test_insert_also_deleted_rejected() {
        let w = write(
            vec![account(1), contact(2)],
            vec![contact_record(2, 5)],
            vec![RawId([2; 16])],
        );
        assert_eq!(
            validate(&w, Some(&previous()), &me()),
            Err(ValidationError::InsertInDeleteSet(contact(2)))
        );
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let w = write(
            vec![account(1), contact(2)],
            vec![contact_record(2, 5), contact_record(2, 6)],
            vec![],
        );
        assert_eq!(
            validate(&w, Some(&previous()), &me()),
            Err(ValidationError::DuplicateInsert(contact(2)))
        );
    }

    #[test]
    fn test_self_contact_rejected() {
        let w = write(
            vec![account(1), contact(2)],
            vec![contact_record(2, 0xAAAA)],
            vec![],
        );
        assert_eq!(
            validate(&w, Some(&previous()), &me()),
            Err(ValidationError::SelfAddedAsContact(contact(2)))
        );
    }

    #[test]
    fn test_unknown_insert_rejected() {
        let unknown = StorageId::new(RecordType::Unknown(77), RawId([3; 16]));
        let w = write(
            vec![account(1), unknown],
            vec![UnknownRecord {
                id: unknown,
                data: vec![1],
            }
            .into()],
            vec![],
        );
        assert_eq!(
            validate(&w, Some(&previous()), &me()),
            Err(ValidationError::UnknownInsert(unknown))
        );
    }

    #[test]
    fn test_insert_outside_manifest_rejected() {
        let w = write(vec![account(1)], vec![contact_record(2, 5)], vec![]);
        assert_eq!(
            validate(&w, Some(&previous()), &me()),
            Err(ValidationError::InsertNotPresentInFullIdSet(contact(2)))
        );
    }

    #[test]
    fn test_manifest_level_checks() {
        let w = write(vec![account(1)], vec![], vec![]);
        assert_eq!(
            validate(&w, Some(&Manifest::new(5, vec![])), &me()),
            Err(ValidationError::IncorrectManifestVersion {
                previous: 5,
                actual: 2
            })
        );
        assert_eq!(validate(&w, None, &me()), Ok(()));

        let mut w = write(vec![account(1)], vec![], vec![]);
        w.manifest.version = 0;
        assert_eq!(
            validate(&w, Some(&Manifest::new(u64::MAX, vec![])), &me()),
            Err(ValidationError::IncorrectManifestVersion {
                previous: u64::MAX,
                actual: 0
            })
        );

        let w = write(vec![account(1), contact(3), contact(3)], vec![], vec![]);
        assert_eq!(
            validate(&w, None, &me()),
            Err(ValidationError::DuplicateIdInManifest(contact(3)))
        );

        let w = write(vec![account(1), contact(3)], vec![], vec![RawId([3; 16])]);
        assert_eq!(
            validate(&w, None, &me()),
            Err(ValidationError::DeletePresentInFullIdSet(contact(3)))
        );
    }
}
