//! User documents in Postgres. The password hash column stays behind the
//! credential-lookup query; every other read selects around it.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use domains::{StoreError, User, UserRecord, UserRepo};

use super::map_db_err;

pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, location, profile_picture, created_at, updated_at";

fn row_to_user(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        location: row.get("location"),
        profile_picture: row.get("profile_picture"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, location, password_hash, \
             profile_picture, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(record.user.id)
        .bind(&record.user.first_name)
        .bind(&record.user.last_name)
        .bind(&record.user.email)
        .bind(&record.user.location)
        .bind(&record.password_hash)
        .bind(&record.user.profile_picture)
        .bind(record.user.created_at)
        .bind(record.user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match map_db_err(err) {
            StoreError::Duplicate(_) => StoreError::Duplicate("user".into()),
            other => other,
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.as_ref().map(|row| UserRecord {
            user: row_to_user(row),
            password_hash: row.get("password_hash"),
        }))
    }

    async fn update(
        &self,
        user: &User,
        new_password_hash: Option<String>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET first_name = $1, last_name = $2, location = $3, \
             profile_picture = $4, password_hash = COALESCE($5, password_hash), updated_at = $6 \
             WHERE id = $7",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.location)
        .bind(&user.profile_picture)
        .bind(new_password_hash)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(result.rows_affected() == 1)
    }
}
