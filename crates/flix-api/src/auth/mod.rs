//! Authentication and authorization module
//!
//! - Password hashing with Argon2id
//! - Stateless JWT issuance and verification
//! - Request gate and ownership middleware
//! - Authentication service for registration, login and profile updates

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{issue_token, verify_token, Claims, IssuedToken, JwtConfig, JwtError};
pub use middleware::{auth_middleware, authenticate, authorize, require_owner, AuthError, Identity};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use service::{AuthService, LoginResponse};
