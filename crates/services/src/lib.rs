//! # services
//!
//! The use-case layer: orchestrates domain logic over the ports, with no
//! knowledge of HTTP or of any concrete storage backend.

pub mod auth;
pub mod media;
pub mod posts;
pub mod users;

pub use auth::{AuthService, NewUser, Session};
pub use media::MediaService;
pub use posts::{NewPost, PostPatch, PostService};
pub use users::{ProfileUpdate, UserService};

/// Shared field validation helpers.
pub(crate) mod validate {
    use domains::{DomainError, DomainResult};

    /// Trims and rejects empty input, naming the field in the error.
    pub fn required(field: &str, value: &str) -> DomainResult<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation(format!("{field} is required")));
        }
        Ok(trimmed.to_string())
    }

    /// Structural email check; real deliverability is out of scope.
    pub fn email(value: &str) -> DomainResult<String> {
        let trimmed = value.trim().to_ascii_lowercase();
        let valid = match trimmed.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            }
            None => false,
        };
        if !valid {
            return Err(DomainError::validation("a valid email is required"));
        }
        Ok(trimmed)
    }

    pub fn password(value: &str) -> DomainResult<()> {
        if value.len() < 8 {
            return Err(DomainError::validation(
                "password must be at least 8 characters",
            ));
        }
        Ok(())
    }

}
