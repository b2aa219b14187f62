use std::env;
use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::SyncError;

pub const DEFAULT_REGION: &str = "us-1";
pub const DEFAULT_CSV_FILE: &str = "computer_metadata.csv";

pub const API_KEY_ENV: &str = "API_KEY";
pub const REGION_ENV: &str = "REGION";
/// Replaces the region-derived computers endpoint when set.
pub const COMPUTERS_URL_ENV: &str = "DESCRIBE_SYNC_COMPUTERS_URL";

/// CLI surface for the description sync.
#[derive(Debug, Parser, Clone)]
#[command(
    author,
    version,
    about = "Push application names from a CSV into Workload Security computer descriptions"
)]
pub struct CliArgs {
    /// Workload Security API key (falls back to $API_KEY).
    #[arg(long = "api-key", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Workload Security region, e.g. us-1 (falls back to $REGION, then us-1).
    #[arg(long = "region", value_name = "REGION")]
    pub region: Option<String>,

    /// CSV with `hostname` and `application_name` columns.
    #[arg(
        long = "csv-file",
        value_name = "FILE",
        default_value = DEFAULT_CSV_FILE
    )]
    pub csv_file: PathBuf,

    /// Directory the computer_ids_<timestamp>.json snapshot is written to.
    #[arg(long = "snapshot-dir", value_name = "DIR", default_value = ".")]
    pub snapshot_dir: PathBuf,

    /// Format of the diagnostics written to stderr.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Fully resolved settings for one run.
#[derive(Clone)]
pub struct Configuration {
    pub api_key: String,
    pub region: String,
    pub csv_path: PathBuf,
    pub snapshot_dir: PathBuf,
    pub computers_url: String,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("api_key", &"<redacted>")
            .field("region", &self.region)
            .field("csv_path", &self.csv_path)
            .field("snapshot_dir", &self.snapshot_dir)
            .field("computers_url", &self.computers_url)
            .finish()
    }
}

impl CliArgs {
    pub fn resolve(self) -> Result<Configuration, SyncError> {
        self.resolve_with(|name| env::var(name).ok())
    }

    /// Resolve against an explicit environment lookup instead of the process environment.
    pub fn resolve_with<F>(self, lookup: F) -> Result<Configuration, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = non_empty(self.api_key)
            .or_else(|| non_empty(lookup(API_KEY_ENV)))
            .ok_or_else(|| {
                SyncError::config(format!(
                    "API key must be provided either as --api-key argument or set as {} environment variable",
                    API_KEY_ENV
                ))
            })?;

        let region = non_empty(self.region)
            .or_else(|| non_empty(lookup(REGION_ENV)))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let computers_url =
            non_empty(lookup(COMPUTERS_URL_ENV)).unwrap_or_else(|| computers_url(&region));

        Ok(Configuration {
            api_key,
            region,
            csv_path: self.csv_file,
            snapshot_dir: self.snapshot_dir,
            computers_url,
        })
    }
}

/// Base URL of the computers collection for a region.
pub fn computers_url(region: &str) -> String {
    format!("https://workload.{region}.cloudone.trendmicro.com/api/computers")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
