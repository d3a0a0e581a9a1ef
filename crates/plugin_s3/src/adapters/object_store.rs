use std::io::Write;
use std::path::Path;

use plugin_core::StorageLocator;

/// Byte-level access to a bucket. Errors are plain messages; the transfer
/// layer attaches the stage and URL.
pub trait ObjectStore {
    /// Streams the object into `sink` and returns the number of bytes written.
    fn download_object(&self, locator: &StorageLocator, sink: &mut dyn Write)
        -> Result<u64, String>;

    /// Stores the `len` bytes of the file at `source` as the object.
    fn upload_object(&self, locator: &StorageLocator, source: &Path, len: u64)
        -> Result<(), String>;
}
