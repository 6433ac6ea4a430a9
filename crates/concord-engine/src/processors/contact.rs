use tracing::{info, warn};

use concord_shared::local::SelfIdentity;
use concord_shared::text::is_valid_e164;
use concord_shared::{Aci, ContactRecord, KeyGenerator, Pni, RecordType};

use super::{ensure_recipient_key, StoreResultExt};
use crate::adapters;
use crate::error::{Result, SyncError};
use crate::processor::{resolve_merge, RecordProcessor, RecordUpdate};
use crate::store::LocalStore;

/// Contacts match by ACI, then phone number, then PNI.
pub struct ContactProcessor<'a, S: LocalStore> {
    store: &'a mut S,
    self_identity: SelfIdentity,
}

impl<'a, S: LocalStore> ContactProcessor<'a, S> {
    pub fn new(store: &'a mut S, self_identity: SelfIdentity) -> Self {
        Self {
            store,
            self_identity,
        }
    }
}

impl<S: LocalStore> RecordProcessor for ContactProcessor<'_, S> {
    type Record = ContactRecord;
    type Identity = (Option<Aci>, Option<Pni>, Option<String>);

    fn kind(&self) -> RecordType {
        RecordType::Contact
    }

    fn is_invalid(&mut self, remote: &ContactRecord) -> Result<bool> {
        if remote.aci.is_none() {
            warn!(id = %remote.id, "Contact has no ACI");
            return Ok(true);
        }

        if self.self_identity.matches(
            remote.aci.as_ref(),
            remote.pni.as_ref(),
            remote.e164.as_deref(),
        ) {
            warn!(id = %remote.id, "Found a contact record for ourselves! Marking as invalid.");
            return Ok(true);
        }

        if let Some(e164) = &remote.e164 {
            if !is_valid_e164(e164) {
                warn!(id = %remote.id, "Contact has an invalid phone number");
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn find_local_match(
        &mut self,
        remote: &ContactRecord,
        keys: &mut dyn KeyGenerator,
    ) -> Result<Option<ContactRecord>> {
        let mut found = None;
        if let Some(aci) = &remote.aci {
            found = self.store.recipient_by_aci(aci).store_err()?;
        }
        if found.is_none() {
            if let Some(e164) = &remote.e164 {
                found = self.store.recipient_by_e164(e164).store_err()?;
            }
        }
        if found.is_none() {
            if let Some(pni) = &remote.pni {
                found = self.store.recipient_by_pni(pni).store_err()?;
            }
        }

        let Some(recipient) = found else {
            return Ok(None);
        };
        let recipient = ensure_recipient_key(&mut *self.store, recipient, keys)?;
        Ok(adapters::contact_record(&recipient))
    }

    fn merge(
        &self,
        remote: &ContactRecord,
        local: &ContactRecord,
        keys: &mut dyn KeyGenerator,
    ) -> ContactRecord {
        let (profile_given_name, profile_family_name) = prefer_remote_name(
            (&remote.profile_given_name, &remote.profile_family_name),
            (&local.profile_given_name, &local.profile_family_name),
        );
        let (system_given_name, system_family_name) = prefer_remote_name(
            (&remote.system_given_name, &remote.system_family_name),
            (&local.system_given_name, &local.system_family_name),
        );

        let remote_identity_wins = (remote.identity_state != local.identity_state
            && remote.identity_key.is_some())
            || (remote.identity_key.is_some() && local.identity_key.is_none());
        let (identity_state, identity_key) = if remote_identity_wins {
            (remote.identity_state, remote.identity_key.clone())
        } else {
            (local.identity_state, local.identity_key.clone())
        };

        let (e164, pni) = self.merge_e164_and_pni(remote, local);

        let merged = ContactRecord {
            id: remote.id,
            aci: remote.aci.or(local.aci),
            pni,
            e164,
            profile_given_name,
            profile_family_name,
            system_given_name,
            system_family_name,
            profile_key: remote.profile_key.clone().or_else(|| local.profile_key.clone()),
            username: if remote.username.is_empty() {
                local.username.clone()
            } else {
                remote.username.clone()
            },
            identity_state,
            identity_key,
            blocked: remote.blocked,
            profile_sharing: remote.profile_sharing,
            archived: remote.archived,
            forced_unread: remote.forced_unread,
            hidden: remote.hidden,
            hide_story: remote.hide_story,
            mute_until: remote.mute_until,
            unregistered_at: remote.unregistered_at,
            unknown_fields: remote.unknown_fields.clone(),
        };

        resolve_merge(merged, remote, local, keys)
    }

    fn insert_local(&mut self, record: ContactRecord) -> Result<()> {
        let recipient = adapters::recipient_from_contact(&record);
        let id = self.store.insert_recipient(&recipient).store_err()?;
        info!(recipient = %id, key = %record.id, "Inserted contact");
        Ok(())
    }

    fn update_local(&mut self, update: RecordUpdate<ContactRecord>) -> Result<()> {
        let mut recipient = self
            .store
            .recipient_by_storage_id(&update.old.id.raw)
            .store_err()?
            .ok_or(SyncError::MissingLocalRecord(update.old.id))?;

        adapters::apply_contact(&mut recipient, &update.new);
        self.store.update_recipient(&recipient).store_err()
    }

    fn identity(&self, record: &ContactRecord) -> Self::Identity {
        (record.aci, record.pni, record.e164.clone())
    }
}

impl<S: LocalStore> ContactProcessor<'_, S> {
    /// When both sides carry a full pairing and exactly one half agrees, the
    /// local pairing is kept. Otherwise each field prefers remote.
    fn merge_e164_and_pni(
        &self,
        remote: &ContactRecord,
        local: &ContactRecord,
    ) -> (Option<String>, Option<Pni>) {
        let complete = remote.e164.is_some()
            && remote.pni.is_some()
            && local.e164.is_some()
            && local.pni.is_some();

        if complete {
            let e164_matches = remote.e164 == local.e164;
            let pni_matches = remote.pni == local.pni;
            if e164_matches != pni_matches {
                warn!(
                    id = %remote.id,
                    e164_matches,
                    pni_matches,
                    "Remote and local disagree on phone number pairing. Keeping local."
                );
                return (local.e164.clone(), local.pni);
            }
        }

        (remote.e164.clone().or_else(|| local.e164.clone()), remote.pni.or(local.pni))
    }
}

fn prefer_remote_name(remote: (&String, &String), local: (&String, &String)) -> (String, String) {
    if !remote.0.is_empty() || !remote.1.is_empty() {
        (remote.0.clone(), remote.1.clone())
    } else {
        (local.0.clone(), local.1.clone())
    }
}
