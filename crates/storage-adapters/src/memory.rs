//! In-memory implementations of the document-store ports, backed by
//! dashmap. The versioning contract is identical to the Postgres
//! adapter's: the compare-and-swap happens under the map entry's lock.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use domains::{Post, PostRepo, StoreError, UpdateOutcome, User, UserRecord, UserRepo, Versioned};

#[derive(Default)]
pub struct InMemoryPostRepo {
    posts: DashMap<Uuid, Versioned<Post>>,
}

impl InMemoryPostRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[async_trait]
impl PostRepo for InMemoryPostRepo {
    async fn insert(&self, post: &Post) -> Result<(), StoreError> {
        match self.posts.entry(post.id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!("post {}", post.id))),
            Entry::Vacant(slot) => {
                slot.insert(Versioned {
                    item: post.clone(),
                    version: 1,
                });
                Ok(())
            }
        }
    }

    async fn find(&self, id: Uuid) -> Result<Option<Versioned<Post>>, StoreError> {
        Ok(self.posts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_recent(&self) -> Result<Vec<Post>, StoreError> {
        let mut all: Vec<Post> = self
            .posts
            .iter()
            .map(|entry| entry.value().item.clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let mut authored: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| entry.value().item.user_id == author_id)
            .map(|entry| entry.value().item.clone())
            .collect();
        authored.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(authored)
    }

    async fn update(&self, post: &Post, expected_version: i64) -> Result<UpdateOutcome, StoreError> {
        match self.posts.get_mut(&post.id) {
            None => Ok(UpdateOutcome::Missing),
            Some(mut entry) => {
                if entry.version != expected_version {
                    return Ok(UpdateOutcome::VersionMismatch);
                }
                *entry = Versioned {
                    item: post.clone(),
                    version: expected_version + 1,
                };
                Ok(UpdateOutcome::Applied)
            }
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.posts.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepo {
    users: DashMap<Uuid, UserRecord>,
    // email (lowercased) → user id; insertion goes through this index so
    // the uniqueness check and the claim are a single entry operation
    emails: DashMap<String, Uuid>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        match self.emails.entry(record.user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate("user".into())),
            Entry::Vacant(slot) => {
                slot.insert(record.user.id);
                self.users.insert(record.user.id, record.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.value().user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(
        &self,
        user: &User,
        new_password_hash: Option<String>,
    ) -> Result<bool, StoreError> {
        match self.users.get_mut(&user.id) {
            None => Ok(false),
            Some(mut entry) => {
                entry.user = user.clone();
                if let Some(hash) = new_password_hash {
                    entry.password_hash = hash;
                }
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{Identity, VoteKind};

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            location: "London".into(),
        }
    }

    fn record(email: &str) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            user: User {
                id: Uuid::new_v4(),
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: email.into(),
                location: "London".into(),
                profile_picture: String::new(),
                created_at: now,
                updated_at: now,
            },
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn stale_version_is_refused() {
        let repo = InMemoryPostRepo::new();
        let author = identity();
        let mut post = Post::new(&author, "T", "C", "https://img", "B");
        repo.insert(&post).await.unwrap();

        post.ledger.cast(author.id, VoteKind::Upvote);
        assert_eq!(repo.update(&post, 1).await.unwrap(), UpdateOutcome::Applied);

        // a second writer still holding version 1 must lose
        post.ledger.cast(author.id, VoteKind::Upvote);
        assert_eq!(
            repo.update(&post, 1).await.unwrap(),
            UpdateOutcome::VersionMismatch
        );

        let stored = repo.find(post.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.item.ledger.score(), 1);
    }

    #[tokio::test]
    async fn update_of_deleted_post_reports_missing() {
        let repo = InMemoryPostRepo::new();
        let post = Post::new(&identity(), "T", "C", "https://img", "B");
        repo.insert(&post).await.unwrap();
        assert!(repo.delete(post.id).await.unwrap());
        assert_eq!(repo.update(&post, 1).await.unwrap(), UpdateOutcome::Missing);
        assert!(!repo.delete(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let repo = InMemoryPostRepo::new();
        let author = identity();
        for n in 0..3i64 {
            let mut post = Post::new(&author, format!("post {n}"), "C", "https://img", "B");
            post.created_at = Utc::now() + chrono::Duration::seconds(n);
            repo.insert(&post).await.unwrap();
        }
        let listed = repo.list_recent().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].title, "post 2");
        assert_eq!(listed[2].title, "post 0");
    }

    #[tokio::test]
    async fn duplicate_email_is_refused() {
        let repo = InMemoryUserRepo::new();
        repo.insert(&record("ada@example.com")).await.unwrap();
        let err = repo.insert(&record("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn credential_lookup_carries_the_hash() {
        let repo = InMemoryUserRepo::new();
        let rec = record("ada@example.com");
        repo.insert(&rec).await.unwrap();

        let found = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash");
        assert_eq!(found.user.id, rec.user.id);
        assert!(repo.find_by_email("ghost@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn profile_update_keeps_hash_unless_replaced() {
        let repo = InMemoryUserRepo::new();
        let rec = record("ada@example.com");
        repo.insert(&rec).await.unwrap();

        let mut user = rec.user.clone();
        user.location = "Cambridge".into();
        assert!(repo.update(&user, None).await.unwrap());
        let found = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(found.user.location, "Cambridge");
        assert_eq!(found.password_hash, "hash");

        assert!(repo.update(&user, Some("new-hash".to_string())).await.unwrap());
        let found = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new-hash");
    }
}
