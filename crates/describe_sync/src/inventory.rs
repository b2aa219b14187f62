use std::fmt;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::Configuration;
use crate::error::SyncError;

const API_VERSION: &str = "v1";
const SECRET_KEY_HEADER: &str = "api-secret-key";

/// Remote computer identifier. Kept in whatever JSON shape the service used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComputerId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for ComputerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputerId::Number(value) => write!(f, "{value}"),
            ComputerId::Text(value) => f.write_str(value),
        }
    }
}

impl From<u64> for ComputerId {
    fn from(value: u64) -> Self {
        ComputerId::Number(value.into())
    }
}

impl From<&str> for ComputerId {
    fn from(value: &str) -> Self {
        ComputerId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComputerRecord {
    #[serde(rename = "ID", default)]
    pub id: Option<ComputerId>,
    #[serde(rename = "hostName", default)]
    pub host_name: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ComputersResponse {
    #[serde(default)]
    computers: Vec<ComputerRecord>,
}

#[derive(Debug, Serialize)]
struct DescriptionUpdate<'a> {
    description: &'a str,
}

/// Computer inventory operations used by the reconciler.
///
/// Neither operation returns an error: failures are logged and reported as
/// `None` / `false` so a run can carry on past a single bad call.
pub trait Inventory {
    fn list(&self) -> Option<Vec<ComputerRecord>>;
    fn update(&self, computer_id: &ComputerId, description: &str) -> bool;
}

pub struct InventoryClient {
    http: Client,
    computers_url: String,
    secret_key: HeaderValue,
}

impl InventoryClient {
    pub fn new(config: &Configuration) -> Result<Self, SyncError> {
        let http = Client::builder()
            .user_agent(concat!("describe-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(http, &config.computers_url, &config.api_key)
    }

    pub fn with_http_client(
        http: Client,
        computers_url: &str,
        api_key: &str,
    ) -> Result<Self, SyncError> {
        let mut secret_key = HeaderValue::from_str(api_key).map_err(|_| {
            SyncError::config("API key contains characters that cannot be sent in a header")
        })?;
        secret_key.set_sensitive(true);

        Ok(Self {
            http,
            computers_url: computers_url.trim_end_matches('/').to_string(),
            secret_key,
        })
    }

    pub fn computers_url(&self) -> &str {
        &self.computers_url
    }

    pub fn fetch_computers(&self) -> Result<Vec<ComputerRecord>, SyncError> {
        info!(url = %self.computers_url, "Requesting computer inventory");
        let response = self.authorized(self.http.get(&self.computers_url)).send()?;
        if !response.status().is_success() {
            return Err(SyncError::Status {
                url: self.computers_url.clone(),
                status: response.status(),
            });
        }

        let payload: ComputersResponse = response.json()?;
        debug!(count = payload.computers.len(), "Parsed computer inventory");
        Ok(payload.computers)
    }

    pub fn push_description(
        &self,
        computer_id: &ComputerId,
        description: &str,
    ) -> Result<(), SyncError> {
        let url = format!("{}/{}", self.computers_url, computer_id);
        info!(%computer_id, description, "Updating computer description");
        let response = self
            .authorized(self.http.post(&url))
            .json(&DescriptionUpdate { description })
            .send()?;
        if !response.status().is_success() {
            return Err(SyncError::Status {
                url,
                status: response.status(),
            });
        }
        Ok(())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("api-version", API_VERSION)
            .header(CONTENT_TYPE, "application/json")
            .header(SECRET_KEY_HEADER, self.secret_key.clone())
    }
}

impl Inventory for InventoryClient {
    fn list(&self) -> Option<Vec<ComputerRecord>> {
        match self.fetch_computers() {
            Ok(computers) => Some(computers),
            Err(err) => {
                error!(error = %err, "Error getting computer data");
                None
            }
        }
    }

    fn update(&self, computer_id: &ComputerId, description: &str) -> bool {
        match self.push_description(computer_id, description) {
            Ok(()) => true,
            Err(err) => {
                error!(%computer_id, error = %err, "Error updating computer");
                false
            }
        }
    }
}
