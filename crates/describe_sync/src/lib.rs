pub mod config;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod metadata;
pub mod reconcile;
pub mod snapshot;

use std::env;
use std::path::PathBuf;

use chrono::Local;
use tracing::{info, warn};

use config::{CliArgs, Configuration};
use error::SyncError;
use inventory::{ComputerRecord, Inventory, InventoryClient};
use metadata::load_metadata;
use reconcile::{RunReport, reconcile};
use snapshot::write_snapshot;

pub fn run(cli: CliArgs) -> Result<RunReport, SyncError> {
    run_in_env(cli, |name| env::var(name).ok())
}

/// Like [`run`], resolving environment fallbacks through `lookup`.
pub fn run_in_env<F>(cli: CliArgs, lookup: F) -> Result<RunReport, SyncError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = cli.resolve_with(lookup)?;
    let client = InventoryClient::new(&config)?;
    run_with(&config, &client)
}

/// Drive one reconciliation against any inventory backend.
///
/// A failed or empty inventory listing ends the run successfully without
/// touching the CSV.
pub fn run_with<I>(config: &Configuration, inventory: &I) -> Result<RunReport, SyncError>
where
    I: Inventory + ?Sized,
{
    let Some(computers) = inventory.list() else {
        warn!("No computer data retrieved; nothing to update");
        return Ok(RunReport::default());
    };

    let snapshot = save_snapshot(config, &computers);
    print_inventory(&computers);

    let mut report = RunReport {
        fetched: computers.len(),
        snapshot,
        outcomes: Vec::new(),
    };
    if computers.is_empty() {
        info!("Inventory is empty; nothing to update");
        return Ok(report);
    }

    let metadata = load_metadata(&config.csv_path)?;
    report.outcomes = reconcile(inventory, &computers, &metadata)?;

    info!(
        fetched = report.fetched,
        matched = report.matched(),
        updated = report.updated(),
        failed = report.failed(),
        "Reconciliation finished"
    );
    Ok(report)
}

/// Process exit status for a finished run. Per-computer failures do not count.
pub fn exit_status(result: &Result<RunReport, SyncError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn save_snapshot(config: &Configuration, computers: &[ComputerRecord]) -> Option<PathBuf> {
    match write_snapshot(&config.snapshot_dir, computers, &Local::now()) {
        Ok(path) => {
            info!(path = %path.display(), "Data saved");
            Some(path)
        }
        Err(err) => {
            warn!(error = %err, "Failed to write inventory snapshot");
            None
        }
    }
}

fn print_inventory(computers: &[ComputerRecord]) {
    println!("Computer Information:");
    for computer in computers {
        println!(
            "ID: {}, Hostname: {}, Display Name: {}",
            computer
                .id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string()),
            computer.host_name.as_deref().unwrap_or("-"),
            computer.display_name.as_deref().unwrap_or("-"),
        );
    }
}
