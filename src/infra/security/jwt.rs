use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::application::auth::{Claims, CredentialCodec, CredentialError};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// HS256 bearer credentials signed with a shared secret.
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn from_secret(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl CredentialCodec for JwtCodec {
    fn sign(&self, caller_id: Uuid, email: &str, ttl: Duration) -> Result<String, CredentialError> {
        let issued_at = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: caller_id,
            email: email.to_string(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + ttl).unix_timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|err| CredentialError::Signing(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<Claims, CredentialError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                ErrorKind::InvalidSignature => CredentialError::InvalidSignature,
                _ => CredentialError::Malformed,
            })
    }
}
