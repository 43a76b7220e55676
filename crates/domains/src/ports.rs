//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the binary.
//! Post updates carry an explicit document version: the store applies a
//! write only when the caller's version matches, which is what makes the
//! read-modify-write of a vote or comment safe across concurrent requests.

use async_trait::async_trait;
use bytes::Bytes;
use mime::Mime;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{DomainError, StoreError};
use crate::models::{Identity, Post, User, UserRecord};

/// A value read from the store together with the document version it had
/// at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub item: T,
    pub version: i64,
}

/// Result of a conditional (compare-and-swap) update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The write landed and the version advanced.
    Applied,
    /// Someone else wrote first; re-read and re-apply.
    VersionMismatch,
    /// The document no longer exists.
    Missing,
}

/// Per-document persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn insert(&self, post: &Post) -> Result<(), StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Versioned<Post>>, StoreError>;

    /// All posts, newest first.
    async fn list_recent(&self) -> Result<Vec<Post>, StoreError>;

    /// One author's posts, newest first.
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError>;

    /// Writes the whole post back, conditioned on `expected_version`.
    async fn update(&self, post: &Post, expected_version: i64) -> Result<UpdateOutcome, StoreError>;

    /// Returns whether a document was actually removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Per-document persistence contract for users.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert(&self, record: &UserRecord) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Credential lookup; the only read that surfaces the password hash.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Replaces the profile fields, and the password hash when one is
    /// given. Returns whether the user existed.
    async fn update(
        &self,
        user: &User,
        new_password_hash: Option<String>,
    ) -> Result<bool, StoreError>;
}

/// Where a stored binary ended up: a publicly resolvable URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMedia {
    pub url: String,
}

/// Object-storage contract for uploaded images.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, data: Bytes, content_type: Mime) -> Result<StoredMedia, StoreError>;
}

/// Identity provider contract: mints and verifies bearer tokens carrying
/// the caller's identity snapshot.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &User) -> Result<String, DomainError>;

    /// Fails with [`DomainError::Unauthenticated`] for anything but a
    /// valid, unexpired token.
    fn verify(&self, token: &str) -> Result<Identity, DomainError>;
}

/// Credential hashing contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    fn verify(&self, password: &str, hash: &str) -> bool;
}
