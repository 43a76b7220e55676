//! S3 implementation of the `MediaStore` port. Keys are content-addressed
//! the same way the local store's paths are; the public base URL is the
//! bucket's CDN or website endpoint.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use mime::Mime;

use domains::{MediaStore, StoreError, StoredMedia};

use crate::{content_key, public_url};

pub struct S3MediaStore {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3MediaStore {
    pub fn new(client: Client, bucket: impl Into<String>, public_base: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base: public_base.into(),
        }
    }

    /// Builds a store from the ambient AWS environment (credentials chain,
    /// region, endpoint overrides).
    pub async fn from_env(bucket: impl Into<String>, public_base: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, public_base)
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn store(&self, data: Bytes, content_type: Mime) -> Result<StoredMedia, StoreError> {
        let key = format!("uploads/{}", content_key(&data, &content_type));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type.as_ref())
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| StoreError::Backend(format!("s3 put_object: {err}")))?;

        tracing::debug!(bucket = %self.bucket, %key, "media object stored");
        Ok(public_url(&self.public_base, &key))
    }
}
