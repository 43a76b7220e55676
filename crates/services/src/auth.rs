//! # AuthService
//!
//! Registration and login. Both wrong-email and wrong-password collapse
//! into the same "invalid credentials" failure so the response does not
//! reveal which accounts exist.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::{
    DomainError, DomainResult, PasswordHasher, TokenIssuer, User, UserRecord, UserRepo,
};

use crate::validate;

/// Registration input, as received from the API boundary.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub location: String,
    pub password: String,
}

/// A freshly minted bearer token plus the account it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    users: Arc<dyn UserRepo>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub async fn register(&self, input: NewUser) -> DomainResult<Session> {
        let first_name = validate::required("first name", &input.first_name)?;
        let last_name = validate::required("last name", &input.last_name)?;
        let location = validate::required("location", &input.location)?;
        let email = validate::email(&input.email)?;
        validate::password(&input.password)?;

        // Friendly pre-check; the unique key in the store still catches
        // a concurrent registration race.
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::validation("user already exists"));
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            location,
            profile_picture: String::new(),
            created_at: now,
            updated_at: now,
        };

        self.users
            .insert(&UserRecord {
                user: user.clone(),
                password_hash,
            })
            .await
            .map_err(|err| match err {
                domains::StoreError::Duplicate(_) => {
                    DomainError::validation("user already exists")
                }
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "account registered");
        let token = self.tokens.issue(&user)?;
        Ok(Session { token, user })
    }

    pub async fn login(&self, email: &str, password: &str) -> DomainResult<Session> {
        let email = email.trim().to_ascii_lowercase();
        let invalid = || DomainError::Unauthenticated("invalid credentials".into());

        let record = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        if !self.hasher.verify(password, &record.password_hash) {
            tracing::warn!(user_id = %record.user.id, "failed login attempt");
            return Err(invalid());
        }

        let token = self.tokens.issue(&record.user)?;
        Ok(Session {
            token,
            user: record.user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockPasswordHasher, MockTokenIssuer, MockUserRepo};

    fn input() -> NewUser {
        NewUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "Ada@Example.com".into(),
            location: "London".into(),
            password: "correct horse".into(),
        }
    }

    fn service(
        users: MockUserRepo,
        hasher: MockPasswordHasher,
        tokens: MockTokenIssuer,
    ) -> AuthService {
        AuthService::new(Arc::new(users), Arc::new(hasher), Arc::new(tokens))
    }

    #[tokio::test]
    async fn register_normalizes_email_and_issues_token() {
        let mut users = MockUserRepo::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "ada@example.com")
            .returning(|_| Ok(None));
        users
            .expect_insert()
            .withf(|record| {
                record.user.email == "ada@example.com" && record.password_hash == "hashed"
            })
            .returning(|_| Ok(()));

        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().returning(|_| Ok("hashed".into()));

        let mut tokens = MockTokenIssuer::new();
        tokens.expect_issue().returning(|_| Ok("tok".into()));

        let session = service(users, hasher, tokens).register(input()).await.unwrap();
        assert_eq!(session.token, "tok");
        assert_eq!(session.user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let mut users = MockUserRepo::new();
        let existing = input();
        users.expect_find_by_email().returning(move |_| {
            let now = Utc::now();
            Ok(Some(UserRecord {
                user: User {
                    id: Uuid::new_v4(),
                    first_name: existing.first_name.clone(),
                    last_name: existing.last_name.clone(),
                    email: "ada@example.com".into(),
                    location: existing.location.clone(),
                    profile_picture: String::new(),
                    created_at: now,
                    updated_at: now,
                },
                password_hash: "x".into(),
            }))
        });
        users.expect_insert().never();

        let err = service(users, MockPasswordHasher::new(), MockTokenIssuer::new())
            .register(input())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn register_rejects_short_password_before_touching_store() {
        let mut users = MockUserRepo::new();
        users.expect_find_by_email().never();

        let mut bad = input();
        bad.password = "short".into();
        let err = service(users, MockPasswordHasher::new(), MockTokenIssuer::new())
            .register(bad)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn login_unknown_email_and_bad_password_look_identical() {
        let mut users = MockUserRepo::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let unknown = service(users, MockPasswordHasher::new(), MockTokenIssuer::new())
            .login("ghost@example.com", "pw")
            .await
            .unwrap_err();

        let mut users = MockUserRepo::new();
        users.expect_find_by_email().returning(|_| {
            let now = Utc::now();
            Ok(Some(UserRecord {
                user: User {
                    id: Uuid::new_v4(),
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                    email: "ada@example.com".into(),
                    location: "London".into(),
                    profile_picture: String::new(),
                    created_at: now,
                    updated_at: now,
                },
                password_hash: "hash".into(),
            }))
        });
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().returning(|_, _| false);
        let wrong_pw = service(users, hasher, MockTokenIssuer::new())
            .login("ada@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong_pw.to_string());
    }
}
