//! Authentication for the CreatorsLab API
//!
//! Provides:
//! - JWT token generation and validation (HS256)
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;

pub use jwt::{extract_token_from_header, Claims, JwtValidator};
pub use password::{hash_password, verify_password};
