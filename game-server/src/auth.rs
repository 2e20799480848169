use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use game_types::Player;

const MAX_USERNAME_LENGTH: usize = 32;

/// Supplies a verified player identity for a bearer token.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Player, AuthError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // player id
    pub username: String, // display name used inside rooms
    pub exp: u64,         // expiry, seconds since epoch
}

pub struct AuthService {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
    dev_mode: bool,
}

fn valid_username(name: &str) -> Option<String> {
    let name = name.trim();
    let ok = !name.is_empty()
        && name.chars().count() <= MAX_USERNAME_LENGTH
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    ok.then(|| name.to_string())
}

impl AuthService {
    /// HS256 verification with a shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            dev_mode: false,
        }
    }

    /// Accepts `uuid:username` or bare `username` tokens without any signature.
    pub fn new_dev_mode() -> Self {
        Self {
            dev_mode: true,
            ..Self::new("dev")
        }
    }

    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Sign a token for `player`, valid for `ttl`.
    pub fn issue_token(&self, player: &Player, ttl: Duration) -> Result<String, AuthError> {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::InvalidToken)?
            .saturating_add(ttl)
            .as_secs();

        let claims = Claims {
            sub: player.id.to_string(),
            username: player.username.clone(),
            exp,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn validate_token(&self, token: &str) -> Result<Player, AuthError> {
        if self.dev_mode {
            return self.validate_dev_token(token);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::warn!("JWT validation failed: {:?}", e);
                    AuthError::InvalidToken
                }
            }
        })?;

        let claims = data.claims;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let username = valid_username(&claims.username).ok_or(AuthError::InvalidUsername)?;

        Ok(Player::new(id, username))
    }

    fn validate_dev_token(&self, token: &str) -> Result<Player, AuthError> {
        match token.split_once(':') {
            Some((id, name)) => {
                let id = Uuid::parse_str(id.trim()).map_err(|_| AuthError::InvalidToken)?;
                let username = valid_username(name).ok_or(AuthError::InvalidUsername)?;
                Ok(Player::new(id, username))
            }
            None => {
                let username = valid_username(token).ok_or(AuthError::InvalidUsername)?;
                // stable id per name so reconnects map to the same player
                let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, username.as_bytes());
                Ok(Player::new(id, username))
            }
        }
    }
}

#[async_trait]
impl IdentityVerifier for AuthService {
    async fn verify(&self, token: &str) -> Result<Player, AuthError> {
        self.validate_token(token)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid username")]
    InvalidUsername,
    #[error("Failed to sign token")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_round_trips() {
        let auth = AuthService::new("secret");
        let player = Player::new(Uuid::new_v4(), "alice");

        let token = auth.issue_token(&player, Duration::from_secs(60)).unwrap();
        let verified = auth.validate_token(&token).unwrap();
        assert_eq!(verified, player);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let player = Player::new(Uuid::new_v4(), "alice");
        let token = AuthService::new("one")
            .issue_token(&player, Duration::from_secs(60))
            .unwrap();

        let result = AuthService::new("two").validate_token(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let auth = AuthService::new("secret");
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "alice".to_string(),
            exp: 1_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(auth.validate_token(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage_token() {
        let auth = AuthService::new("secret");
        assert!(matches!(
            auth.validate_token("invalid-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_dev_tokens() {
        let auth = AuthService::new_dev_mode();
        assert!(auth.is_dev_mode());

        let id = Uuid::new_v4();
        let player = auth.validate_token(&format!("{id}:alice")).unwrap();
        assert_eq!(player.id, id);
        assert_eq!(player.username, "alice");

        let a = auth.validate_token("bob").unwrap();
        let b = auth.validate_token("bob").unwrap();
        assert_eq!(a.id, b.id);

        assert!(matches!(auth.validate_token("not-a-uuid:carol"), Err(AuthError::InvalidToken)));
        assert!(matches!(auth.validate_token(""), Err(AuthError::InvalidUsername)));
        assert!(matches!(auth.validate_token("bad name"), Err(AuthError::InvalidUsername)));
    }

    #[tokio::test]
    async fn test_verifier_trait() {
        let auth: Box<dyn IdentityVerifier> = Box::new(AuthService::new_dev_mode());
        assert_eq!(auth.verify("dave").await.unwrap().username, "dave");
    }
}
