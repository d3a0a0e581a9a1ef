use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::PluginError;

pub const DEFAULT_SCHEME: &str = "s3";

/// Bucket and key named by a `scheme://bucket/key` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageLocator {
    pub scheme: String,
    pub bucket: String,
    pub key: String,
}

fn locator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // The bucket ends at the first slash after the scheme; the key keeps the rest.
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*)://([^/]+)/(.+)$").expect("locator pattern is valid")
    })
}

impl StorageLocator {
    /// An `s3://` locator.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::with_scheme(DEFAULT_SCHEME, bucket, key)
    }

    pub fn with_scheme(
        scheme: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn parse(url: &str) -> Result<Self, PluginError> {
        let captures = locator_pattern()
            .captures(url)
            .ok_or_else(|| PluginError::LocatorFormat {
                url: url.to_string(),
            })?;

        Ok(Self::with_scheme(&captures[1], &captures[2], &captures[3]))
    }

    /// Renders the locator back as a URL, keeping the scheme it was parsed with.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

impl std::str::FromStr for StorageLocator {
    type Err = PluginError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        Self::parse(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_bucket_from_nested_key() {
        let locator = StorageLocator::parse("s3://my-bucket/a/b/c.txt").expect("valid url");
        assert_eq!(locator.bucket, "my-bucket");
        assert_eq!(locator.key, "a/b/c.txt");
    }

    #[test]
    fn accepts_other_schemes() {
        let locator = StorageLocator::parse("gs://archive/2024/run.json").expect("valid url");
        assert_eq!(
            locator,
            StorageLocator::with_scheme("gs", "archive", "2024/run.json")
        );
    }

    #[test]
    fn url_keeps_the_parsed_scheme() {
        for url in ["gs://archive/run.json", "s3a://lake/part-0000.parquet", "S3://b/k"] {
            let locator = StorageLocator::parse(url).expect("valid url");
            assert_eq!(locator.url(), url);
        }
    }

    #[test]
    fn key_may_end_with_slash() {
        let locator = StorageLocator::parse("s3://bucket/prefix/").expect("valid url");
        assert_eq!(locator.key, "prefix/");
    }

    #[test]
    fn rejects_malformed_urls() {
        for url in [
            "my-bucket/a/b.txt",
            "s3:/my-bucket/a.txt",
            "s3://my-bucket",
            "s3://my-bucket/",
            "s3:///key.txt",
            "://bucket/key",
            "",
        ] {
            let error = StorageLocator::parse(url).expect_err("url should be rejected");
            assert!(
                matches!(&error, PluginError::LocatorFormat { url: provided } if provided == url),
                "unexpected error for {url:?}: {error}"
            );
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        let locator = StorageLocator::new("bucket", "dir/file.bin");
        assert_eq!(locator.scheme, DEFAULT_SCHEME);
        assert_eq!(locator.url(), "s3://bucket/dir/file.bin");
        let reparsed: StorageLocator = locator.to_string().parse().expect("valid url");
        assert_eq!(reparsed, locator);
    }
}
