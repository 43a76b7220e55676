//! # UserService
//!
//! Profile reads and the owner's profile update. Updates are whitelisted
//! field by field. Email is immutable here, and the password re-hashes
//! through the same hasher registration uses.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::{DomainError, DomainResult, PasswordHasher, User, UserRepo};

use crate::validate;

/// Owner-supplied partial profile update.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub password: Option<String>,
}

pub struct UserService {
    users: Arc<dyn UserRepo>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepo>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    pub async fn profile(&self, id: Uuid) -> DomainResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> DomainResult<User> {
        let mut user = self.profile(id).await?;

        if let Some(first_name) = &update.first_name {
            user.first_name = validate::required("first name", first_name)?;
        }
        if let Some(last_name) = &update.last_name {
            user.last_name = validate::required("last name", last_name)?;
        }
        if let Some(location) = &update.location {
            user.location = validate::required("location", location)?;
        }
        if let Some(picture) = &update.profile_picture {
            user.profile_picture = picture.trim().to_string();
        }

        let new_hash = match &update.password {
            Some(password) => {
                validate::password(password)?;
                Some(self.hasher.hash(password)?)
            }
            None => None,
        };

        let password_changed = new_hash.is_some();
        user.updated_at = Utc::now();
        if !self.users.update(&user, new_hash).await? {
            return Err(DomainError::not_found("user"));
        }
        tracing::info!(user_id = %id, password_changed, "profile updated");
        Ok(user)
    }
}
