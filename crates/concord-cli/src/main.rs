//! # concord
//!
//! Runs one reconciliation pass of the local SQLite database against a
//! snapshot of the remote storage service, then prints the resulting
//! outcome (merge reports and the proposed write operation) as JSON, along
//! with the encoded blobs for every record to upload.
//!
//! Without `CONCORD_DRY_RUN` the local mutations are committed; with it the
//! pass is rolled back after printing.

mod config;
mod snapshot;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use concord_engine::StorageSync;
use concord_shared::local::LocalAccount;
use concord_shared::RandomKeyGenerator;
use concord_store::{Database, StoreError};

use crate::config::CliConfig;
use crate::snapshot::{EncodedRecord, Report, Snapshot};

fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,concord=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting concord v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration and the remote snapshot
    // -----------------------------------------------------------------------
    let config = CliConfig::from_env();
    info!(?config, "Loaded configuration");

    let snapshot = Snapshot::load(&config.snapshot_path)?;
    info!(
        local = snapshot.local_manifest.version,
        remote = snapshot.remote_manifest.version,
        records = snapshot.records.len(),
        "Loaded snapshot"
    );

    // -----------------------------------------------------------------------
    // 3. Open the local database
    // -----------------------------------------------------------------------
    let mut db = match &config.db_path {
        Some(path) => Database::open_at(path),
        None => Database::new(),
    }
    .context("opening local database")?;

    if let Some(identity) = &snapshot.account {
        match db.local_account() {
            Ok(_) => {}
            Err(StoreError::NoLocalAccount) => {
                info!(aci = %identity.aci, "Creating local account");
                db.set_local_account(&LocalAccount::new(identity.clone()))?;
                db.ensure_my_story()?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    // -----------------------------------------------------------------------
    // 4. Reconcile inside one transaction
    // -----------------------------------------------------------------------
    let records = snapshot.decode_records();
    info!(
        decoded = records.len(),
        dropped = snapshot.records.len() - records.len(),
        "Decoded remote records"
    );

    let sync = StorageSync::new(config.sync_config());
    let mut tx = db.begin_sync()?;
    let outcome = sync
        .reconcile(
            &mut tx,
            &mut RandomKeyGenerator,
            &snapshot.local_manifest,
            &snapshot.remote_manifest,
            records,
            chrono::Utc::now(),
        )
        .context("reconciliation failed")?;

    let upload = outcome
        .write
        .iter()
        .flat_map(|write| write.inserts.iter())
        .map(EncodedRecord::encode)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let report = Report {
        outcome: &outcome,
        upload,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if config.dry_run {
        tx.rollback()?;
        info!("Dry run: local changes discarded");
    } else {
        tx.commit()?;
        info!(version = outcome.manifest.version, "Local changes committed");
    }

    Ok(())
}
