use crate::clock::Clock;
use crate::error::AppError;
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: Uuid,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiration, seconds since epoch.
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
///
/// Expiry is checked against the injected [`Clock`] rather than by `jsonwebtoken`
/// itself, so the validity window follows simulated time in tests. There is no
/// revocation: a token is valid until `exp` no matter what happens to the account.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generates a token for `user_id` that expires `ttl` after now.
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature and structure, then the expiry against the clock.
    ///
    /// Every failure is `AppError::Unauthenticated`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;

        if self.clock.now().timestamp() > claims.exp {
            return Err(AppError::Unauthenticated("Token has expired".into()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Utc;

    fn service(secret: &str) -> (TokenService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let tokens = TokenService::new(secret, Duration::days(7), clock.clone());
        (tokens, clock)
    }

    #[test]
    fn test_token_generation_and_verification() {
        let (tokens, clock) = service("test_secret_for_gen_verify");
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iat, clock.now().timestamp());
        assert_eq!(claims.exp - claims.iat, Duration::days(7).num_seconds());
    }

    #[test]
    fn test_token_valid_until_expiry_instant() {
        let (tokens, clock) = service("test_secret_for_window");
        let token = tokens.issue(Uuid::new_v4()).unwrap();

        clock.advance(Duration::days(7));
        assert!(tokens.verify(&token).is_ok());

        clock.advance(Duration::seconds(1));
        match tokens.verify(&token) {
            Err(AppError::Unauthenticated(msg)) => assert!(msg.contains("expired")),
            other => panic!("Token should have expired, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let (issuer, _) = service("the_signing_secret");
        let (verifier, _) = service("a_completely_different_secret");
        let token = issuer.issue(Uuid::new_v4()).unwrap();

        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let (tokens, _) = service("tamper_secret");
        let token = tokens.issue(Uuid::new_v4()).unwrap();
        let other = tokens.issue(Uuid::new_v4()).unwrap();

        // Splice the payload of one token onto the signature of another.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(
            tokens.verify(&forged),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        let (tokens, _) = service("malformed_secret");

        for garbage in ["", "not-a-token", "a.b.c", "eyJhbGciOiJIUzI1NiJ9..sig"] {
            assert!(
                matches!(tokens.verify(garbage), Err(AppError::Unauthenticated(_))),
                "{:?} should not verify",
                garbage
            );
        }
    }
}
