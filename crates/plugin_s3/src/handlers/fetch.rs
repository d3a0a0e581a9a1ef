use std::path::PathBuf;

use plugin_core::{ParamSchema, ParsedParams, StorageLocator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::object_store::ObjectStore;
use crate::error::StorageError;
use crate::transfer;

pub fn fetch_schema() -> ParamSchema {
    ParamSchema::new(["source_url", "destination_path"], ["upload_url"])
}

/// Input of the fetch plugin: copy one object to local disk and optionally
/// publish the local copy under another URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchRequest {
    pub source_url: String,
    pub destination_path: PathBuf,
    #[serde(default)]
    pub upload_url: Option<String>,
}

impl FetchRequest {
    pub fn from_params(params: ParsedParams) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(params))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchResponse {
    pub source_url: String,
    pub destination_path: PathBuf,
    pub bytes_downloaded: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_uploaded: Option<u64>,
    pub completed_at: String,
    pub success: bool,
}

pub fn handle_fetch(
    request: &FetchRequest,
    store: &impl ObjectStore,
    completed_at: impl Into<String>,
) -> Result<FetchResponse, StorageError> {
    let source = StorageLocator::parse(&request.source_url)?;
    // Parse the upload target up front so a bad URL fails before any transfer.
    let upload_target = request
        .upload_url
        .as_deref()
        .map(StorageLocator::parse)
        .transpose()?;

    let bytes_downloaded = transfer::download(store, &source, &request.destination_path)?;

    let bytes_uploaded = match &upload_target {
        Some(target) => Some(transfer::upload(store, target, &request.destination_path)?),
        None => None,
    };

    Ok(FetchResponse {
        source_url: source.url(),
        destination_path: request.destination_path.clone(),
        bytes_downloaded,
        uploaded_url: upload_target.as_ref().map(StorageLocator::url),
        bytes_uploaded,
        completed_at: completed_at.into(),
        success: true,
    })
}
