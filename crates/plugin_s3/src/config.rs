use std::fmt;

use crate::error::StorageError;

pub const REGION_ENV: &str = "AWS_REGION";
pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";
pub const PART_SIZE_MB_ENV: &str = "PLUGIN_S3_PART_SIZE_MB";

const MIB: u64 = 1024 * 1024;
pub const DEFAULT_PART_SIZE: u64 = 64 * MIB;
/// Smallest part S3 accepts for every part but the last.
pub const MIN_PART_SIZE: u64 = 5 * MIB;
/// Most parts one multipart upload may have.
pub const MAX_UPLOAD_PARTS: u64 = 10_000;

/// Static credentials for one storage session.
#[derive(Clone, PartialEq, Eq)]
pub struct EnvCredentials {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl EnvCredentials {
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Collects every unset variable before failing so one error names them all.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let mut missing = Vec::new();
        let mut require = |name: &'static str| {
            let value = lookup(name);
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };

        let region = require(REGION_ENV);
        let access_key_id = require(ACCESS_KEY_ID_ENV);
        let secret_access_key = require(SECRET_ACCESS_KEY_ENV);

        if !missing.is_empty() {
            return Err(StorageError::Credentials { missing });
        }

        Ok(Self {
            region,
            access_key_id,
            secret_access_key,
            session_token: lookup(SESSION_TOKEN_ENV),
        })
    }
}

impl fmt::Debug for EnvCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredentials")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes per multipart upload part and per ranged download request.
    pub part_size: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl TransferConfig {
    pub fn new(part_size: u64) -> Result<Self, StorageError> {
        if part_size < MIN_PART_SIZE {
            return Err(StorageError::InvalidConfig(format!(
                "part_size must be at least {MIN_PART_SIZE} bytes, got {part_size}"
            )));
        }
        Ok(Self { part_size })
    }

    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Part size for uploading `len` bytes: the configured size, grown just
    /// enough to keep the upload within [`MAX_UPLOAD_PARTS`].
    pub fn upload_part_size(&self, len: u64) -> u64 {
        self.part_size.max(len.div_ceil(MAX_UPLOAD_PARTS))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StorageError> {
        let Some(raw) = lookup(PART_SIZE_MB_ENV) else {
            return Ok(Self::default());
        };
        let megabytes: u64 = raw.trim().parse().map_err(|_| {
            StorageError::InvalidConfig(format!(
                "{PART_SIZE_MB_ENV} must be a whole number of MiB, got {raw:?}"
            ))
        })?;
        Self::new(megabytes.saturating_mul(MIB))
    }
}
