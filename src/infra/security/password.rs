use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::application::auth::{PasswordError, PasswordScheme};

/// Argon2id with fixed cost parameters, stored as PHC strings.
pub struct Argon2Scheme {
    params: Params,
}

impl Argon2Scheme {
    /// 19 MiB memory, 2 passes, single lane.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|err| PasswordError::Hash(err.to_string()))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Scheme {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordScheme for Argon2Scheme {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| PasswordError::Hash(err.to_string()))
    }

    fn verify(&self, password: &str, password_hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|err| PasswordError::StoredHash(err.to_string()))?;

        match self.hasher().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(PasswordError::StoredHash(err.to_string())),
        }
    }
}
