use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::SyncError;

pub const HOSTNAME_COLUMN: &str = "hostname";
pub const DESCRIPTION_COLUMN: &str = "application_name";

/// Hostname to description, keyed exactly as written in the CSV.
pub type MetadataMap = HashMap<String, String>;

pub fn load_metadata(path: &Path) -> Result<MetadataMap, SyncError> {
    let file = File::open(path).map_err(|source| SyncError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let metadata = read_metadata(file)?;
    debug!(path = %path.display(), entries = metadata.len(), "Loaded computer metadata");
    Ok(metadata)
}

/// Hostnames are neither trimmed nor case-folded; a later row for the same
/// hostname replaces an earlier one.
pub fn read_metadata<R: Read>(reader: R) -> Result<MetadataMap, SyncError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let hostname_idx = column_index(&headers, HOSTNAME_COLUMN)?;
    let description_idx = column_index(&headers, DESCRIPTION_COLUMN)?;

    let mut metadata = MetadataMap::new();
    for record in reader.records() {
        let record = record?;
        let hostname = record.get(hostname_idx).unwrap_or_default();
        let description = record.get(description_idx).unwrap_or_default();
        metadata.insert(hostname.to_string(), description.to_string());
    }
    Ok(metadata)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, SyncError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| SyncError::data_format(format!("CSV is missing the `{name}` column")))
}
