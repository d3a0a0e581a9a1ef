use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::builders::GetObjectFluentBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use plugin_core::StorageLocator;

use crate::adapters::object_store::ObjectStore;
use crate::session::S3Session;

impl ObjectStore for S3Session {
    fn download_object(
        &self,
        locator: &StorageLocator,
        sink: &mut dyn Write,
    ) -> Result<u64, String> {
        self.runtime.block_on(self.download_ranges(locator, sink))
    }

    fn upload_object(
        &self,
        locator: &StorageLocator,
        source: &Path,
        len: u64,
    ) -> Result<(), String> {
        if len <= self.config.part_size {
            return self.runtime.block_on(self.put_file(locator, source));
        }

        let mut file =
            File::open(source).map_err(|error| format!("failed to open source: {error}"))?;
        let part_size = self.config.upload_part_size(len);
        self.runtime
            .block_on(self.multipart_upload(locator, &mut file, part_size))
    }
}

/// `Range` header values of at most `part_size` bytes covering `size` bytes.
fn byte_ranges(size: u64, part_size: u64) -> Vec<String> {
    let mut ranges = Vec::new();
    let mut start = 0u64;
    while start < size {
        let end = start.saturating_add(part_size).min(size) - 1;
        ranges.push(format!("bytes={start}-{end}"));
        start = end + 1;
    }
    ranges
}

/// Body that reads the file lazily instead of buffering it.
async fn file_body(path: &Path) -> Result<ByteStream, String> {
    ByteStream::from_path(path)
        .await
        .map_err(|error| format!("failed to read source: {error}"))
}

/// A GET for `locator` that fails if the object no longer has `etag`.
fn get_object_request(
    client: &aws_sdk_s3::Client,
    locator: &StorageLocator,
    range: Option<String>,
    etag: Option<&str>,
) -> GetObjectFluentBuilder {
    client
        .get_object()
        .bucket(&locator.bucket)
        .key(&locator.key)
        .set_range(range)
        .set_if_match(etag.map(str::to_string))
}

impl S3Session {
    async fn download_ranges(
        &self,
        locator: &StorageLocator,
        sink: &mut dyn Write,
    ) -> Result<u64, String> {
        let head = self
            .client
            .head_object()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .send()
            .await
            .map_err(|error| {
                format!("failed to read object metadata: {}", DisplayErrorContext(&error))
            })?;
        let size = u64::try_from(head.content_length().unwrap_or_default()).unwrap_or(0);
        // Every range must come from the version the size was read from.
        let etag = head.e_tag();

        if size <= self.config.part_size {
            return self.fetch_range(locator, None, etag, sink).await;
        }

        let mut written = 0u64;
        for range in byte_ranges(size, self.config.part_size) {
            written += self.fetch_range(locator, Some(range), etag, sink).await?;
        }
        Ok(written)
    }

    async fn fetch_range(
        &self,
        locator: &StorageLocator,
        range: Option<String>,
        etag: Option<&str>,
        sink: &mut dyn Write,
    ) -> Result<u64, String> {
        let output = get_object_request(&self.client, locator, range, etag)
            .send()
            .await
            .map_err(|error| {
                format!("failed to read object from s3: {}", DisplayErrorContext(&error))
            })?;

        let mut body = output.body;
        let mut written = 0u64;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|error| format!("failed to stream object body: {error}"))?
        {
            sink.write_all(&chunk)
                .map_err(|error| format!("failed to write object bytes: {error}"))?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }

    async fn put_file(&self, locator: &StorageLocator, source: &Path) -> Result<(), String> {
        self.client
            .put_object()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .body(file_body(source).await?)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                format!("failed to write object to s3: {}", DisplayErrorContext(&error))
            })
    }

    async fn multipart_upload(
        &self,
        locator: &StorageLocator,
        source: &mut dyn Read,
        part_size: u64,
    ) -> Result<(), String> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&locator.bucket)
            .key(&locator.key)
            .send()
            .await
            .map_err(|error| {
                format!("failed to start multipart upload: {}", DisplayErrorContext(&error))
            })?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| "multipart upload response is missing an upload id".to_string())?
            .to_string();

        let outcome = match self.upload_parts(locator, &upload_id, source, part_size).await {
            Ok(parts) => self
                .client
                .complete_multipart_upload()
                .bucket(&locator.bucket)
                .key(&locator.key)
                .upload_id(&upload_id)
                .multipart_upload(
                    CompletedMultipartUpload::builder()
                        .set_parts(Some(parts))
                        .build(),
                )
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    format!("failed to complete multipart upload: {}", DisplayErrorContext(&error))
                }),
            Err(message) => Err(message),
        };

        if outcome.is_err() {
            if let Err(error) = self
                .client
                .abort_multipart_upload()
                .bucket(&locator.bucket)
                .key(&locator.key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                tracing::warn!(
                    url = %locator,
                    upload_id = %upload_id,
                    error = %DisplayErrorContext(&error),
                    "failed to abort multipart upload"
                );
            }
        }
        outcome
    }

    async fn upload_parts(
        &self,
        locator: &StorageLocator,
        upload_id: &str,
        source: &mut dyn Read,
        part_size: u64,
    ) -> Result<Vec<CompletedPart>, String> {
        let mut parts = Vec::new();
        let mut part_number = 1i32;
        loop {
            let mut buffer = Vec::new();
            (&mut *source)
                .take(part_size)
                .read_to_end(&mut buffer)
                .map_err(|error| format!("failed to read source: {error}"))?;
            if buffer.is_empty() {
                break;
            }

            let uploaded = self
                .client
                .upload_part()
                .bucket(&locator.bucket)
                .key(&locator.key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(buffer))
                .send()
                .await
                .map_err(|error| {
                    format!("failed to upload part {part_number}: {}", DisplayErrorContext(&error))
                })?;
            parts.push(
                CompletedPart::builder()
                    .set_e_tag(uploaded.e_tag().map(str::to_string))
                    .part_number(part_number)
                    .build(),
            );
            part_number += 1;
        }
        Ok(parts)
    }
}
