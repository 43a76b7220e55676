//! # Domain Models
//!
//! These structs represent the core entities of Huntly. All wire-facing
//! types serialize as camelCase, matching the JSON shape the browser
//! client already speaks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vote::VoteLedger;

/// A registered account. The password hash never lives on this type;
/// reads that need it go through [`UserRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub location: String,
    /// URL of an uploaded avatar; empty string when unset.
    #[serde(default)]
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user together with its credential hash, as stored. Only the
/// credential lookup path (`UserRepo::find_by_email`) returns this;
/// it is deliberately not serializable.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// The identity snapshot carried by a bearer token. This is the sole
/// source of authorship for posts, comments, and votes; it is passed
/// explicitly per request, never held in process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub location: String,
}

/// A single comment, embedded in its post. Append-only, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: &Identity, text: impl Into<String>) -> Self {
        Self {
            user_id: author.id,
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            comment: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// A user-authored content item: an image plus text, owning its comment
/// sequence and vote ledger outright. The post is the unit of storage:
/// every mutation writes the whole document back in one versioned update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    /// Author identity snapshot, captured at creation time.
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub caption: String,
    pub image_url: String,
    /// The body text. The wire field is `post` for compatibility with
    /// the existing client.
    #[serde(rename = "post")]
    pub body: String,
    /// Most-recent-first; new comments are prepended.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Serializes as `votes` + `voteCount` at the top level of the post.
    #[serde(flatten)]
    pub ledger: VoteLedger,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        author: &Identity,
        title: impl Into<String>,
        caption: impl Into<String>,
        image_url: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: author.id,
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            title: title.into(),
            caption: caption.into(),
            image_url: image_url.into(),
            body: body.into(),
            comments: Vec::new(),
            ledger: VoteLedger::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Prepends a comment, keeping the most-recent-first order.
    pub fn prepend_comment(&mut self, comment: Comment) {
        self.comments.insert(0, comment);
    }
}
