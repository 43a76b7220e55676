//! Local-filesystem implementation of the `MediaStore` port.
//!
//! Content-addressable: the sha-256 of the bytes names the file, which
//! deduplicates repeat uploads for free. The returned URL is the public
//! prefix the binary serves the root directory under.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use mime::Mime;
use tokio::fs;

use domains::{MediaStore, StoreError, StoredMedia};

use crate::{content_key, public_url};

pub struct LocalMediaStore {
    root: PathBuf,
    public_base: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, public_base: impl Into<String>) -> Self {
        Self {
            root,
            public_base: public_base.into(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, data: Bytes, content_type: Mime) -> Result<StoredMedia, StoreError> {
        let key = content_key(&data, &content_type);
        let target = self.root.join(&key);
        let parent = target
            .parent()
            .ok_or_else(|| StoreError::Backend("media root has no parent".into()))?;

        fs::create_dir_all(parent)
            .await
            .map_err(|err| StoreError::Backend(format!("creating media directory: {err}")))?;

        // same hash, same bytes; skip the rewrite
        if !fs::try_exists(&target).await.unwrap_or(false) {
            fs::write(&target, &data)
                .await
                .map_err(|err| StoreError::Backend(format!("writing media file: {err}")))?;
            tracing::debug!(path = %target.display(), "media file written");
        }

        Ok(public_url(&self.public_base, &key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("huntly-media-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn stores_and_deduplicates() {
        let root = temp_root();
        let store = LocalMediaStore::new(root.clone(), "/media");
        let mime: Mime = "image/png".parse().unwrap();

        let first = store
            .store(Bytes::from_static(PNG_MAGIC), mime.clone())
            .await
            .unwrap();
        let second = store
            .store(Bytes::from_static(PNG_MAGIC), mime)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert!(first.url.starts_with("/media/"));
        assert!(first.url.ends_with(".png"));

        let on_disk = root.join(first.url.trim_start_matches("/media/"));
        assert_eq!(tokio::fs::read(on_disk).await.unwrap(), PNG_MAGIC);

        tokio::fs::remove_dir_all(root).await.ok();
    }
}
