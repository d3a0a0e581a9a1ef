use std::fmt;

use plugin_core::PluginError;

/// Step of a transfer that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    CreateDir,
    StageTempFile,
    Fetch,
    Flush,
    Rename,
    OpenSource,
    Send,
}

impl TransferStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateDir => "create_dir",
            Self::StageTempFile => "stage_temp_file",
            Self::Fetch => "fetch",
            Self::Flush => "flush",
            Self::Rename => "rename",
            Self::OpenSource => "open_source",
            Self::Send => "send",
        }
    }
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("environment variable(s) are not set: {missing:?}")]
    Credentials { missing: Vec<&'static str> },

    #[error("{stage} failed for {url}: {message}")]
    Transfer {
        stage: TransferStage,
        url: String,
        message: String,
    },

    #[error(transparent)]
    Locator(#[from] PluginError),

    #[error("failed to start storage runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("invalid storage configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    pub fn transfer(
        stage: TransferStage,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transfer {
            stage,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn stage(&self) -> Option<TransferStage> {
        match self {
            Self::Transfer { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
