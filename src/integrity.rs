//! Write-then-verify persistence for article bodies.
//!
//! A file is written, closed, read back and compared by SHA-256 digest with the
//! content that was meant to be written. A mismatch means the file must not be
//! trusted (short write, full disk, concurrent tampering). The file is left in
//! place; the caller just refuses to record it as downloaded.

use crate::error::IntegrityError;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

/// Destination for article bodies.
pub trait ArticleStore {
    /// Persist `content` at `path`, failing if it cannot be verified.
    async fn save(&self, path: &Path, content: &str) -> Result<(), IntegrityError>;
}

/// Local file system store using [`save_and_validate`].
#[derive(Debug, Default, Clone, Copy)]
pub struct VerifiedStore;

impl ArticleStore for VerifiedStore {
    async fn save(&self, path: &Path, content: &str) -> Result<(), IntegrityError> {
        save_and_validate(path, content).await
    }
}

/// Hex-encoded SHA-256 of `content`.
pub fn content_digest(content: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(content.as_ref()))
}

/// Write `content` to `path` and confirm the file on disk matches it.
#[instrument(level = "debug", skip(content), fields(path = %path.display(), bytes = content.len()))]
pub async fn save_and_validate(path: &Path, content: &str) -> Result<(), IntegrityError> {
    write_article(path, content).await?;
    verify_written(path, content).await
}

/// Create or truncate `path` and write `content` in full.
///
/// The handle is flushed, synced and dropped before returning on every path.
pub async fn write_article(path: &Path, content: &str) -> Result<(), IntegrityError> {
    let io_err = |source| IntegrityError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).await.map_err(io_err)?;
    file.write_all(content.as_bytes()).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;
    file.sync_all().await.map_err(io_err)?;
    Ok(())
}

/// Re-read `path` and compare its digest with that of `expected`.
///
/// The raw bytes on disk are hashed; they are never decoded first.
pub async fn verify_written(path: &Path, expected: &str) -> Result<(), IntegrityError> {
    let bytes = fs::read(path).await.map_err(|source| IntegrityError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let expected_digest = content_digest(expected);
    let actual_digest = content_digest(&bytes);
    if expected_digest != actual_digest {
        warn!(
            path = %path.display(),
            expected = %expected_digest,
            actual = %actual_digest,
            "File validation failed"
        );
        return Err(IntegrityError::DigestMismatch {
            path: path.to_path_buf(),
            expected: expected_digest,
            actual: actual_digest,
        });
    }

    debug!(digest = %actual_digest, "File validated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_digest_is_stable() {
        assert_eq!(content_digest("ethics"), content_digest("ethics"));
        assert_ne!(content_digest("ethics"), content_digest("ethic"));
        assert_eq!(content_digest("").len(), 64);
    }

    #[tokio::test]
    async fn test_save_and_validate_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("kant.txt");
        let body = "Immanuel Kant (1724–1804) is the central figure in modern philosophy.";

        save_and_validate(&path, body).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), body);
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("kant.txt");
        std::fs::write(&path, "a much longer stale body than the new one").unwrap();

        save_and_validate(&path, "fresh").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_truncated_file_fails_validation() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hume.txt");
        let body = "David Hume was a Scottish philosopher.";

        write_article(&path, body).await.unwrap();
        std::fs::write(&path, &body[..10]).unwrap();

        match verify_written(&path, body).await {
            Err(IntegrityError::DigestMismatch { expected, actual, .. }) => {
                assert_eq!(expected, content_digest(body));
                assert_eq!(actual, content_digest(&body[..10]));
            }
            other => panic!("expected digest mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_on_disk_fails_validation() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("frege.txt");
        let body = "a\u{FFFD}b";

        write_article(&path, body).await.unwrap();
        std::fs::write(&path, b"a\xFFb").unwrap();

        assert!(matches!(
            verify_written(&path, body).await,
            Err(IntegrityError::DigestMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("no").join("such").join("dir.txt");

        assert!(matches!(
            save_and_validate(&path, "body").await,
            Err(IntegrityError::Io { .. })
        ));
    }
}
