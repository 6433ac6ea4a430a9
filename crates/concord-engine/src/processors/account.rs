use tracing::{debug, warn};

use concord_shared::{AccountRecord, AccountSettings, KeyGenerator, RecordType};

use super::StoreResultExt;
use crate::adapters;
use crate::error::{Result, SyncError};
use crate::processor::{resolve_merge, RecordProcessor, RecordUpdate};
use crate::store::LocalStore;

/// Exactly one account record is accepted per batch; it always matches the
/// local account.
pub struct AccountProcessor<'a, S: LocalStore> {
    store: &'a mut S,
    seen: bool,
}

impl<'a, S: LocalStore> AccountProcessor<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store, seen: false }
    }
}

impl<S: LocalStore> RecordProcessor for AccountProcessor<'_, S> {
    type Record = AccountRecord;
    type Identity = ();

    fn kind(&self) -> RecordType {
        RecordType::Account
    }

    fn is_invalid(&mut self, remote: &AccountRecord) -> Result<bool> {
        if self.seen {
            warn!(id = %remote.id, "Found an additional account record! Ignoring it.");
            return Ok(true);
        }
        self.seen = true;
        Ok(false)
    }

    fn find_local_match(
        &mut self,
        _remote: &AccountRecord,
        keys: &mut dyn KeyGenerator,
    ) -> Result<Option<AccountRecord>> {
        let mut account = self.store.local_account().store_err()?;
        if account.storage_id.is_none() {
            let raw = keys.generate();
            debug!(key = %raw, "Assigning storage id to the local account");
            account.storage_id = Some(raw);
            self.store.update_local_account(&account).store_err()?;
        }
        Ok(adapters::account_record(&account))
    }

    fn merge(
        &self,
        remote: &AccountRecord,
        local: &AccountRecord,
        keys: &mut dyn KeyGenerator,
    ) -> AccountRecord {
        let remote_has_name = !remote.given_name.is_empty() || !remote.family_name.is_empty();
        let (given_name, family_name) = if remote_has_name {
            (remote.given_name.clone(), remote.family_name.clone())
        } else {
            (local.given_name.clone(), local.family_name.clone())
        };

        let avatar_url_path = if remote.avatar_url_path.is_empty() {
            local.avatar_url_path.clone()
        } else {
            remote.avatar_url_path.clone()
        };

        let merged = AccountRecord {
            id: remote.id,
            given_name,
            family_name,
            avatar_url_path,
            profile_key: remote.profile_key.clone().or_else(|| local.profile_key.clone()),
            settings: merge_settings(&remote.settings, &local.settings),
            unknown_fields: remote.unknown_fields.clone(),
        };

        resolve_merge(merged, remote, local, keys)
    }

    fn insert_local(&mut self, record: AccountRecord) -> Result<()> {
        warn!(id = %record.id, "Attempted to insert an account record");
        Err(SyncError::UnexpectedAccountInsert)
    }

    fn update_local(&mut self, update: RecordUpdate<AccountRecord>) -> Result<()> {
        let mut account = self.store.local_account().store_err()?;
        adapters::apply_account(&mut account, &update.new);
        self.store.update_local_account(&account).store_err()
    }

    fn identity(&self, _record: &AccountRecord) {}
}

fn merge_settings(remote: &AccountSettings, local: &AccountSettings) -> AccountSettings {
    let payments = if remote.payments.entropy.is_some() {
        remote.payments.clone()
    } else {
        local.payments.clone()
    };

    AccountSettings {
        payments,
        subscriber: remote.subscriber.clone().or_else(|| local.subscriber.clone()),
        has_set_my_stories_privacy: remote.has_set_my_stories_privacy
            || local.has_set_my_stories_privacy,
        has_viewed_onboarding_story: remote.has_viewed_onboarding_story
            || local.has_viewed_onboarding_story,
        ..remote.clone()
    }
}
