use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::SyncError;
use crate::inventory::{ComputerId, ComputerRecord, Inventory};
use crate::metadata::MetadataMap;

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub hostname: String,
    pub computer_id: ComputerId,
    pub success: bool,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub fetched: usize,
    pub snapshot: Option<PathBuf>,
    pub outcomes: Vec<UpdateOutcome>,
}

impl RunReport {
    pub fn matched(&self) -> usize {
        self.outcomes.len()
    }

    pub fn updated(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.success).count()
    }

    pub fn failed(&self) -> usize {
        self.matched() - self.updated()
    }
}

/// Push the CSV description of every fetched computer whose hostname appears
/// in `metadata`, in inventory order. Computers without a CSV row are skipped.
pub fn reconcile<I>(
    inventory: &I,
    computers: &[ComputerRecord],
    metadata: &MetadataMap,
) -> Result<Vec<UpdateOutcome>, SyncError>
where
    I: Inventory + ?Sized,
{
    let mut outcomes = Vec::new();

    for computer in computers {
        let Some(hostname) = computer.host_name.as_deref() else {
            continue;
        };
        let Some(description) = metadata.get(hostname) else {
            continue;
        };
        let computer_id = computer.id.as_ref().ok_or_else(|| {
            SyncError::data_format(format!("computer {hostname} has no ID"))
        })?;

        info!(hostname, %computer_id, "Found matching computer");
        let success = inventory.update(computer_id, description);
        if success {
            info!(hostname, "Successfully updated");
        } else {
            warn!(hostname, "Failed to update");
        }

        outcomes.push(UpdateOutcome {
            hostname: hostname.to_string(),
            computer_id: computer_id.clone(),
            success,
        });
    }

    Ok(outcomes)
}
