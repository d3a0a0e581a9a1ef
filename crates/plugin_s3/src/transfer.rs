//! Download and upload staging on top of an [`ObjectStore`].
//!
//! Downloads never expose partial data at the destination: bytes land in a
//! uniquely named temp file in the destination directory, are synced, and are
//! then renamed into place. The temp file is removed on every failure path.

use std::fs::{self, File};
use std::path::Path;

use plugin_core::StorageLocator;
use tracing::{debug, error, info};

use crate::adapters::object_store::ObjectStore;
use crate::error::{StorageError, TransferStage};

const STAGING_PREFIX: &str = ".download-";
const STAGING_SUFFIX: &str = ".part";

/// Downloads `locator` to `destination`, returning the number of bytes written.
pub fn download(
    store: &impl ObjectStore,
    locator: &StorageLocator,
    destination: &Path,
) -> Result<u64, StorageError> {
    let url = locator.url();
    debug!(url = %url, destination = %destination.display(), "downloading object");

    let fail = |stage: TransferStage, message: String| {
        error!(url = %url, stage = %stage, error = %message, "download failed");
        StorageError::transfer(stage, url.clone(), message)
    };

    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory).map_err(|error| {
        fail(
            TransferStage::CreateDir,
            format!("failed to make directory tree {}: {error}", directory.display()),
        )
    })?;

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(directory)
        .map_err(|error| {
            fail(
                TransferStage::StageTempFile,
                format!("failed to create temp file in {}: {error}", directory.display()),
            )
        })?;

    let bytes = store
        .download_object(locator, staged.as_file_mut())
        .map_err(|message| fail(TransferStage::Fetch, message))?;

    staged
        .as_file()
        .sync_all()
        .map_err(|error| fail(TransferStage::Flush, format!("failed to sync temp file: {error}")))?;

    staged.persist(destination).map_err(|error| {
        fail(
            TransferStage::Rename,
            format!(
                "failed to move temp file to {}: {}",
                destination.display(),
                error.error
            ),
        )
    })?;

    info!(url = %url, destination = %destination.display(), bytes, "downloaded object");
    Ok(bytes)
}

/// Uploads the file at `source` to `locator`, returning its size in bytes.
pub fn upload(
    store: &impl ObjectStore,
    locator: &StorageLocator,
    source: &Path,
) -> Result<u64, StorageError> {
    let url = locator.url();
    info!(source = %source.display(), url = %url, "uploading object");

    let fail = |stage: TransferStage, message: String| {
        error!(
            url = %url,
            source = %source.display(),
            stage = %stage,
            error = %message,
            "upload failed"
        );
        StorageError::transfer(stage, url.clone(), message)
    };

    let len = File::open(source)
        .and_then(|file| file.metadata())
        .map_err(|error| {
            fail(
                TransferStage::OpenSource,
                format!("failed to open {}: {error}", source.display()),
            )
        })?
        .len();

    store
        .upload_object(locator, source, len)
        .map_err(|message| fail(TransferStage::Send, message))?;

    info!(source = %source.display(), url = %url, bytes = len, "uploaded object");
    Ok(len)
}
