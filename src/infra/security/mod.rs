//! Concrete credential signing and password hashing.

mod jwt;
mod password;

pub use jwt::JwtCodec;
pub use password::Argon2Scheme;
