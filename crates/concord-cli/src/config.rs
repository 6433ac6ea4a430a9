//! CLI configuration loaded from environment variables.
//!
//! Every setting has a default so a bare `concord` invocation reconciles
//! `./snapshot.json` against the platform database.

use std::path::PathBuf;

use chrono::Duration;

use concord_engine::SyncConfig;
use concord_shared::constants::DEFAULT_UNREGISTERED_RETENTION_DAYS;

#[derive(Debug, Clone)]
pub struct CliConfig {
    /// SQLite database file.
    /// Env: `CONCORD_DB_PATH`
    /// Default: the platform data directory (see `concord_store::default_path`).
    pub db_path: Option<PathBuf>,

    /// JSON file holding the manifests and remote records to reconcile.
    /// Env: `CONCORD_SNAPSHOT`
    /// Default: `./snapshot.json`
    pub snapshot_path: PathBuf,

    /// Roll the pass back instead of committing it.
    /// Env: `CONCORD_DRY_RUN` (true/false)
    /// Default: `false`
    pub dry_run: bool,

    /// Env: `CONCORD_PRIMARY_DEVICE` (true/false)
    /// Default: `true`
    pub primary_device: bool,

    /// Env: `CONCORD_UNREGISTERED_RETENTION_DAYS`
    /// Default: `30`
    pub unregistered_retention_days: i64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            snapshot_path: PathBuf::from("./snapshot.json"),
            dry_run: false,
            primary_device: true,
            unregistered_retention_days: DEFAULT_UNREGISTERED_RETENTION_DAYS,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("CONCORD_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(path) = lookup("CONCORD_SNAPSHOT") {
            config.snapshot_path = PathBuf::from(path);
        }

        if let Some(val) = lookup("CONCORD_DRY_RUN") {
            config.dry_run = val == "true" || val == "1";
        }

        if let Some(val) = lookup("CONCORD_PRIMARY_DEVICE") {
            config.primary_device = val != "false" && val != "0";
        }

        if let Some(val) = lookup("CONCORD_UNREGISTERED_RETENTION_DAYS") {
            match val.parse::<i64>() {
                Ok(days) if days >= 0 => config.unregistered_retention_days = days,
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid CONCORD_UNREGISTERED_RETENTION_DAYS, using default"
                    );
                }
            }
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter directly.

        config
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            is_primary_device: self.primary_device,
            unregistered_retention: Duration::days(self.unregistered_retention_days),
        }
    }
}
