//! # storage-adapters
//!
//! Concrete implementations of the persistence and media ports. The
//! in-memory store is always available (tests, local development); the
//! Postgres document store and the media backends are feature-gated.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

#[cfg(feature = "media-local")]
pub mod media_local;

#[cfg(feature = "media-s3")]
pub mod media_s3;

#[cfg(any(test, feature = "media-local", feature = "media-s3"))]
use {
    domains::StoredMedia,
    mime::Mime,
    sha2::{Digest, Sha256},
};

/// Content-addressed key for an uploaded binary: sha-256 hex, sharded two
/// levels deep so no single directory or prefix grows unbounded.
#[cfg(any(test, feature = "media-local", feature = "media-s3"))]
pub(crate) fn content_key(data: &[u8], content_type: &Mime) -> String {
    let hash = hex::encode(Sha256::digest(data));
    format!(
        "{}/{}/{}.{}",
        &hash[0..2],
        &hash[2..4],
        hash,
        extension_for(content_type)
    )
}

#[cfg(any(test, feature = "media-local", feature = "media-s3"))]
pub(crate) fn extension_for(content_type: &Mime) -> &'static str {
    match content_type.subtype().as_str() {
        "jpeg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        "bmp" => "bmp",
        "tiff" => "tiff",
        _ => "bin",
    }
}

#[cfg(any(test, feature = "media-local", feature = "media-s3"))]
pub(crate) fn public_url(base: &str, key: &str) -> StoredMedia {
    StoredMedia {
        url: format!("{}/{}", base.trim_end_matches('/'), key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_key_is_deterministic_and_sharded() {
        let mime: Mime = "image/png".parse().unwrap();
        let a = content_key(b"same bytes", &mime);
        let b = content_key(b"same bytes", &mime);
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));
        let parts: Vec<&str> = a.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 2);
    }

    #[test]
    fn jpeg_maps_to_jpg() {
        let mime: Mime = "image/jpeg".parse().unwrap();
        assert!(content_key(b"x", &mime).ends_with(".jpg"));
    }
}
