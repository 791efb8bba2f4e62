//! Object storage for project thumbnails.
//!
//! Objects are addressed by `{owner}/{title}`. Backends are swappable behind
//! [`ThumbnailStore`]: a local directory for development and any
//! S3-compatible service for deployment.

mod error;
pub mod local;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;

pub use error::StorageError;
pub use local::LocalStore;
pub use s3::{S3Config, S3Store};

#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object, and return
    /// the public URL it can be fetched from.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, StorageError>;

    /// Remove the object under `key`. Removing a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Object key for a project's thumbnail. Fails with
/// [`StorageError::InvalidKey`] when the owner or title would not make a
/// usable `{owner}/{title}` path.
pub fn thumbnail_key(owner: &str, title: &str) -> Result<String, StorageError> {
    let key = format!("{owner}/{title}");
    validate_key(&key)?;
    Ok(key)
}

/// Reject keys that would escape a directory or produce ambiguous paths.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad_segment = key
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad_segment || key.contains('\\') || key.contains('\0') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// RFC 3986 percent-encoding of everything but unreserved characters.
/// `/` is kept as a path separator when `keep_slash` is set.
pub(crate) fn uri_encode(input: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
