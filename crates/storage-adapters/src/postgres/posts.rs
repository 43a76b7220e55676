//! Post documents in Postgres.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use domains::{Post, PostRepo, StoreError, UpdateOutcome, Versioned, Vote, VoteLedger};

use super::map_db_err;

pub struct PgPostRepo {
    pool: PgPool,
}

impl PgPostRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, author_id, author_first_name, author_last_name, title, caption, \
     image_url, body, comments, votes, vote_count, version, created_at, updated_at";

fn row_to_post(row: &PgRow) -> Result<Versioned<Post>, StoreError> {
    let comments = serde_json::from_value(row.get("comments"))
        .map_err(|err| StoreError::Backend(format!("corrupt comments column: {err}")))?;
    let votes: Vec<Vote> = serde_json::from_value(row.get("votes"))
        .map_err(|err| StoreError::Backend(format!("corrupt votes column: {err}")))?;

    let post = Post {
        id: row.get("id"),
        user_id: row.get("author_id"),
        first_name: row.get("author_first_name"),
        last_name: row.get("author_last_name"),
        title: row.get("title"),
        caption: row.get("caption"),
        image_url: row.get("image_url"),
        body: row.get("body"),
        comments,
        ledger: VoteLedger::from_parts(votes, row.get("vote_count")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    };
    Ok(Versioned {
        item: post,
        version: row.get("version"),
    })
}

#[async_trait]
impl PostRepo for PgPostRepo {
    async fn insert(&self, post: &Post) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO posts (id, author_id, author_first_name, author_last_name, title, \
             caption, image_url, body, comments, votes, vote_count, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 1, $12, $13)",
        )
        .bind(post.id)
        .bind(post.user_id)
        .bind(&post.first_name)
        .bind(&post.last_name)
        .bind(&post.title)
        .bind(&post.caption)
        .bind(&post.image_url)
        .bind(&post.body)
        .bind(serde_json::to_value(&post.comments).map_err(|err| StoreError::Backend(err.to_string()))?)
        .bind(serde_json::to_value(post.ledger.votes()).map_err(|err| StoreError::Backend(err.to_string()))?)
        .bind(post.ledger.score())
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Versioned<Post>>, StoreError> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.as_ref().map(row_to_post).transpose()
    }

    async fn list_recent(&self) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.iter()
            .map(|row| row_to_post(row).map(|stored| stored.item))
            .collect()
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 ORDER BY created_at DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.iter()
            .map(|row| row_to_post(row).map(|stored| stored.item))
            .collect()
    }

    /// The whole document is written back in one conditional statement;
    /// a row count of zero means either a concurrent writer advanced the
    /// version or the post is gone, so we look once more to tell which.
    async fn update(&self, post: &Post, expected_version: i64) -> Result<UpdateOutcome, StoreError> {
        let result = sqlx::query(
            "UPDATE posts SET title = $1, caption = $2, image_url = $3, body = $4, \
             comments = $5, votes = $6, vote_count = $7, version = version + 1, updated_at = $8 \
             WHERE id = $9 AND version = $10",
        )
        .bind(&post.title)
        .bind(&post.caption)
        .bind(&post.image_url)
        .bind(&post.body)
        .bind(serde_json::to_value(&post.comments).map_err(|err| StoreError::Backend(err.to_string()))?)
        .bind(serde_json::to_value(post.ledger.votes()).map_err(|err| StoreError::Backend(err.to_string()))?)
        .bind(post.ledger.score())
        .bind(post.updated_at)
        .bind(post.id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 1 {
            return Ok(UpdateOutcome::Applied);
        }

        let exists = sqlx::query("SELECT 1 FROM posts WHERE id = $1")
            .bind(post.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .is_some();
        Ok(if exists {
            UpdateOutcome::VersionMismatch
        } else {
            UpdateOutcome::Missing
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() == 1)
    }
}
