//! S3 transfers for plugins built on `plugin_core`.
//!
//! This crate owns the AWS integration: session setup from environment
//! credentials, the [`adapters::object_store::ObjectStore`] seam and its S3
//! implementation, and the staging rules that keep partially downloaded
//! files away from their destination. Chunking of large objects is delegated
//! to the S3 multipart and ranged-read APIs.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod session;
pub mod transfer;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{EnvCredentials, TransferConfig};
pub use error::{StorageError, TransferStage};
pub use session::{open_session, S3Session};
