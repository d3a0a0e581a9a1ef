use std::path::Path;

use aws_sdk_s3::config::{Credentials, Region};
use plugin_core::StorageLocator;
use tokio::runtime::Runtime;

use crate::config::{EnvCredentials, TransferConfig};
use crate::error::StorageError;
use crate::transfer;

const CREDENTIALS_PROVIDER_NAME: &str = "plugin-environment";

/// A connected S3 client plus the runtime its calls block on.
///
/// Every method blocks the calling thread; do not call them from inside
/// another async runtime.
pub struct S3Session {
    pub(crate) runtime: Runtime,
    pub(crate) client: aws_sdk_s3::Client,
    pub(crate) config: TransferConfig,
}

/// Opens a session from `AWS_REGION`, `AWS_ACCESS_KEY_ID` and
/// `AWS_SECRET_ACCESS_KEY`, with part size from `PLUGIN_S3_PART_SIZE_MB`.
pub fn open_session() -> Result<S3Session, StorageError> {
    let credentials = EnvCredentials::from_env()?;
    let config = TransferConfig::from_env()?;
    S3Session::connect(credentials, config)
}

impl S3Session {
    pub fn connect(
        credentials: EnvCredentials,
        config: TransferConfig,
    ) -> Result<Self, StorageError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StorageError::Runtime)?;

        let provider = Credentials::new(
            credentials.access_key_id,
            credentials.secret_access_key,
            credentials.session_token,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );
        let sdk_config = runtime.block_on(
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(Region::new(credentials.region.clone()))
                .credentials_provider(provider)
                .load(),
        );
        tracing::debug!(
            region = %credentials.region,
            part_size = config.part_size,
            "storage session opened"
        );

        Ok(Self {
            runtime,
            client: aws_sdk_s3::Client::new(&sdk_config),
            config,
        })
    }

    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }

    pub fn transfer_config(&self) -> TransferConfig {
        self.config
    }

    pub fn download(
        &self,
        bucket: &str,
        key: &str,
        destination: impl AsRef<Path>,
    ) -> Result<u64, StorageError> {
        transfer::download(
            self,
            &StorageLocator::new(bucket, key),
            destination.as_ref(),
        )
    }

    pub fn upload(
        &self,
        bucket: &str,
        key: &str,
        source: impl AsRef<Path>,
    ) -> Result<u64, StorageError> {
        transfer::upload(self, &StorageLocator::new(bucket, key), source.as_ref())
    }

    pub fn download_url(
        &self,
        url: &str,
        destination: impl AsRef<Path>,
    ) -> Result<u64, StorageError> {
        let locator = StorageLocator::parse(url)?;
        transfer::download(self, &locator, destination.as_ref())
    }

    pub fn upload_url(&self, url: &str, source: impl AsRef<Path>) -> Result<u64, StorageError> {
        let locator = StorageLocator::parse(url)?;
        transfer::upload(self, &locator, source.as_ref())
    }
}
