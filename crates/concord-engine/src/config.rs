//! Reconciliation settings.

use chrono::Duration;

use concord_shared::constants::DEFAULT_UNREGISTERED_RETENTION_DAYS;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Whether this device is the account's primary device. Only the primary
    /// schedules a force push when the key sets disagree on record types.
    pub is_primary_device: bool,

    /// How long an unregistered contact keeps its storage key.
    pub unregistered_retention: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            is_primary_device: true,
            unregistered_retention: Duration::days(DEFAULT_UNREGISTERED_RETENTION_DAYS),
        }
    }
}
