use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{debug, info};

use crate::{StorageError, ThumbnailStore, uri_encode, validate_key};

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    /// When set, objects are addressed path-style: `{endpoint}/{bucket}/{key}`.
    pub endpoint: Option<String>,
}

/// Thumbnails in an S3 bucket. Credentials come from the standard AWS
/// provider chain (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`, profile, IMDS).
pub struct S3Store {
    client: Client,
    config: S3Config,
}

impl S3Store {
    pub async fn new(config: S3Config) -> Result<Self, StorageError> {
        if config.bucket.is_empty() || config.region.is_empty() {
            return Err(StorageError::Config("bucket and region are required".into()));
        }

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!("Thumbnail bucket: {} ({})", config.bucket, config.region);
        Ok(Self {
            client: Client::from_conf(builder.build()),
            config,
        })
    }

    /// Public URL of an object, matching the addressing style the client uses.
    pub fn object_url(&self, key: &str) -> String {
        let key = uri_encode(key, true);
        match &self.config.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.config.bucket,
                key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.config.bucket, self.config.region, key
            ),
        }
    }
}

#[async_trait]
impl ThumbnailStore for S3Store {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::request("PUT", key, e))?;
        debug!("Uploaded {} ({} bytes)", key, size);
        Ok(self.object_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        // S3 answers 204 for a missing key too
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::request("DELETE", key, e))?;
        debug!("Deleted {}", key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(endpoint: Option<&str>) -> S3Store {
        S3Store::new(S3Config {
            bucket: "folio-thumbs".into(),
            region: "us-east-1".into(),
            endpoint: endpoint.map(String::from),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn object_urls_are_virtual_hosted_or_path_style() {
        assert_eq!(
            store(None).await.object_url("alice/My Project"),
            "https://folio-thumbs.s3.us-east-1.amazonaws.com/alice/My%20Project"
        );
        assert_eq!(
            store(Some("http://localhost:9000/"))
                .await
                .object_url("alice/demo"),
            "http://localhost:9000/folio-thumbs/alice/demo"
        );
    }

    #[tokio::test]
    async fn bad_keys_never_reach_the_bucket() {
        let s3 = store(Some("http://127.0.0.1:9")).await;
        let err = s3
            .put("alice/../etc", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
        assert!(matches!(
            s3.delete("alice//demo").await.unwrap_err(),
            StorageError::InvalidKey(_)
        ));
    }

    #[tokio::test]
    async fn missing_bucket_is_a_config_error() {
        let err = S3Store::new(S3Config {
            bucket: String::new(),
            region: "us-east-1".into(),
            endpoint: None,
        })
        .await
        .err()
        .unwrap();
        assert!(matches!(err, StorageError::Config(_)));
    }
}
