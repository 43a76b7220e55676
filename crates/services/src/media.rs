//! # MediaService
//!
//! Upload validation in front of the object store: size cap plus
//! magic-byte sniffing. The declared content type of the upload is
//! ignored; the bytes decide.

use std::sync::Arc;

use bytes::Bytes;
use mime::Mime;

use domains::{DomainError, DomainResult, MediaStore, StoredMedia};

pub struct MediaService {
    store: Arc<dyn MediaStore>,
    max_bytes: usize,
}

impl MediaService {
    pub fn new(store: Arc<dyn MediaStore>, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    pub async fn store_image(&self, data: Bytes) -> DomainResult<StoredMedia> {
        if data.is_empty() {
            return Err(DomainError::validation("empty upload"));
        }
        if data.len() > self.max_bytes {
            return Err(DomainError::validation(format!(
                "image exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        let format = image::guess_format(&data)
            .map_err(|_| DomainError::validation("upload is not a recognized image format"))?;
        let content_type: Mime = format
            .to_mime_type()
            .parse()
            .map_err(|_| DomainError::Internal("unmappable image content type".into()))?;

        let stored = self.store.store(data, content_type).await?;
        tracing::info!(url = %stored.url, "image stored");
        Ok(stored)
    }
}
