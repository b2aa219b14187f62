use std::cell::RefCell;
use std::fs;
use std::path::Path;

use clap::Parser;
use describe_sync::config::{CliArgs, Configuration, computers_url};
use describe_sync::error::SyncError;
use describe_sync::inventory::{ComputerId, ComputerRecord, Inventory};
use describe_sync::{exit_status, run_in_env, run_with};
use tempfile::tempdir;

// Scenario tests for the full fetch → snapshot → join → update flow, driven
// through an in-memory inventory that records every update call.

struct FakeInventory {
    computers: Option<Vec<ComputerRecord>>,
    reject: Vec<ComputerId>,
    updates: RefCell<Vec<(ComputerId, String)>>,
}

impl FakeInventory {
    fn listing(computers: Vec<ComputerRecord>) -> Self {
        Self {
            computers: Some(computers),
            reject: Vec::new(),
            updates: RefCell::new(Vec::new()),
        }
    }

    fn unreachable() -> Self {
        Self {
            computers: None,
            reject: Vec::new(),
            updates: RefCell::new(Vec::new()),
        }
    }
}

impl Inventory for FakeInventory {
    fn list(&self) -> Option<Vec<ComputerRecord>> {
        self.computers.clone()
    }

    fn update(&self, computer_id: &ComputerId, description: &str) -> bool {
        self.updates
            .borrow_mut()
            .push((computer_id.clone(), description.to_string()));
        !self.reject.contains(computer_id)
    }
}

fn computer(id: u64, host: &str) -> ComputerRecord {
    ComputerRecord {
        id: Some(ComputerId::from(id)),
        host_name: Some(host.to_string()),
        display_name: None,
    }
}

fn config_in(dir: &Path, csv: Option<&str>) -> Configuration {
    let csv_path = dir.join("computer_metadata.csv");
    if let Some(contents) = csv {
        fs::write(&csv_path, contents).expect("write csv fixture");
    }
    Configuration {
        api_key: "test-key".to_string(),
        region: "us-1".to_string(),
        csv_path,
        snapshot_dir: dir.to_path_buf(),
        computers_url: computers_url("us-1"),
    }
}

fn snapshot_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("computer_ids_") && name.ends_with(".json"))
        .collect()
}

#[test]
fn updates_only_the_host_present_in_both_sources() {
    let temp = tempdir().expect("tempdir");
    let config = config_in(
        temp.path(),
        Some("hostname,application_name\nhost-a,WebApp\nhost-b,DB"),
    );
    let inventory = FakeInventory::listing(vec![computer(1, "host-a"), computer(2, "host-c")]);

    let result = run_with(&config, &inventory);
    assert_eq!(exit_status(&result), 0);

    let report = result.expect("run succeeds");
    assert_eq!(
        *inventory.updates.borrow(),
        vec![(ComputerId::from(1), "WebApp".to_string())]
    );
    assert_eq!(report.fetched, 2);
    assert_eq!(report.matched(), 1);
    assert_eq!(report.updated(), 1);

    let snapshot = report.snapshot.expect("snapshot written");
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(snapshot).expect("read snapshot"))
            .expect("snapshot is json");
    let entries = parsed.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["ID"], 1);
    assert_eq!(entries[1]["hostName"], "host-c");
}

#[test]
fn update_failures_keep_exit_status_zero() {
    let temp = tempdir().expect("tempdir");
    let config = config_in(
        temp.path(),
        Some("hostname,application_name\nhost-a,WebApp\nhost-b,DB\n"),
    );
    let mut inventory = FakeInventory::listing(vec![computer(1, "host-a"), computer(2, "host-b")]);
    inventory.reject.push(ComputerId::from(1));

    let result = run_with(&config, &inventory);
    assert_eq!(exit_status(&result), 0);

    let report = result.expect("run succeeds");
    assert_eq!(inventory.updates.borrow().len(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.updated(), 1);
}

#[test]
fn failed_listing_ends_run_successfully_without_updates() {
    let temp = tempdir().expect("tempdir");
    // No CSV on disk: the loader must never be reached.
    let config = config_in(temp.path(), None);
    let inventory = FakeInventory::unreachable();

    let result = run_with(&config, &inventory);
    assert_eq!(exit_status(&result), 0);

    let report = result.expect("run succeeds");
    assert_eq!(report.fetched, 0);
    assert!(report.snapshot.is_none());
    assert!(inventory.updates.borrow().is_empty());
    assert!(snapshot_files(temp.path()).is_empty());
}

#[test]
fn empty_inventory_writes_snapshot_and_skips_csv() {
    let temp = tempdir().expect("tempdir");
    let config = config_in(temp.path(), None);
    let inventory = FakeInventory::listing(Vec::new());

    let report = run_with(&config, &inventory).expect("run succeeds");

    assert_eq!(report.fetched, 0);
    assert!(report.outcomes.is_empty());
    assert_eq!(snapshot_files(temp.path()).len(), 1);
}

#[test]
fn missing_csv_column_fails_the_run() {
    let temp = tempdir().expect("tempdir");
    let config = config_in(temp.path(), Some("hostname,app\nhost-a,WebApp\n"));
    let inventory = FakeInventory::listing(vec![computer(1, "host-a")]);

    let result = run_with(&config, &inventory);
    assert!(matches!(result, Err(SyncError::DataFormat(_))));
    assert_eq!(exit_status(&result), 1);
    assert!(inventory.updates.borrow().is_empty());
}

#[test]
fn unreadable_csv_fails_the_run() {
    let temp = tempdir().expect("tempdir");
    let config = config_in(temp.path(), None);
    let inventory = FakeInventory::listing(vec![computer(1, "host-a")]);

    let result = run_with(&config, &inventory);
    assert!(matches!(result, Err(SyncError::ReadFile { .. })));
    assert_eq!(exit_status(&result), 1);
}

#[test]
fn snapshot_failure_does_not_block_updates() {
    let temp = tempdir().expect("tempdir");
    let mut config = config_in(
        temp.path(),
        Some("hostname,application_name\nhost-a,WebApp\n"),
    );
    config.snapshot_dir = temp.path().join("missing").join("dir");
    let inventory = FakeInventory::listing(vec![computer(1, "host-a")]);

    let report = run_with(&config, &inventory).expect("run succeeds");
    assert!(report.snapshot.is_none());
    assert_eq!(report.updated(), 1);
}

#[test]
fn missing_api_key_fails_before_any_request() {
    let cli = CliArgs::try_parse_from(["describe-sync", "--region", "us-1"]).expect("valid args");

    let result = run_in_env(cli, |_| None);
    assert!(matches!(result, Err(SyncError::Config(_))));
    assert_eq!(exit_status(&result), 1);
}
