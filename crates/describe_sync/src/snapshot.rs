use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::SyncError;
use crate::inventory::{ComputerId, ComputerRecord};

#[derive(Debug, Serialize)]
pub struct SnapshotEntry<'a> {
    #[serde(rename = "ID")]
    pub id: Option<&'a ComputerId>,
    #[serde(rename = "hostName")]
    pub host_name: Option<&'a str>,
    #[serde(rename = "displayName")]
    pub display_name: Option<&'a str>,
}

impl<'a> From<&'a ComputerRecord> for SnapshotEntry<'a> {
    fn from(record: &'a ComputerRecord) -> Self {
        SnapshotEntry {
            id: record.id.as_ref(),
            host_name: record.host_name.as_deref(),
            display_name: record.display_name.as_deref(),
        }
    }
}

pub fn snapshot_file_name(at: &DateTime<Local>) -> String {
    format!("computer_ids_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Render the reduced inventory view as a four-space indented JSON array.
pub fn render_snapshot(computers: &[ComputerRecord]) -> Result<Vec<u8>, SyncError> {
    let entries: Vec<SnapshotEntry<'_>> = computers.iter().map(SnapshotEntry::from).collect();
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    entries.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Write the snapshot into `dir`, named after `at`. Returns the final path.
pub fn write_snapshot(
    dir: &Path,
    computers: &[ComputerRecord],
    at: &DateTime<Local>,
) -> Result<PathBuf, SyncError> {
    let path = dir.join(snapshot_file_name(at));
    let rendered = render_snapshot(computers)?;
    let temp_path = build_temp_path(&path);
    fs::write(&temp_path, rendered)?;
    fs::rename(&temp_path, &path)?;
    Ok(path)
}

fn build_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    temp_path.set_extension("json.tmp");
    temp_path
}
