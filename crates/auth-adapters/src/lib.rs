//! # auth-adapters
//!
//! Credential hashing (Argon2id) and, behind the `auth-jwt` feature, the
//! jsonwebtoken-backed identity provider.

pub mod password;
pub use password::Argon2PasswordHasher;

#[cfg(feature = "auth-jwt")]
pub mod jwt;
#[cfg(feature = "auth-jwt")]
pub use jwt::JwtTokenIssuer;
