//! Session Token Service
//!
//! Issues and validates HS256-signed JWT session credentials. Validation is
//! stateless: any instance holding the signing secret accepts tokens issued
//! by any other, and a token stays valid until its fixed expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::domain::UserIdentity;
use crate::error::{PlatformError, Result};

/// Below this the HMAC key is accepted but flagged at startup.
const RECOMMENDED_KEY_BYTES: usize = 32;

/// Token service configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC signing secret
    pub secret_key: String,
    pub issuer: String,
    pub audience: String,
    pub expiry_minutes: i64,
    /// Leeway applied to `exp` checks
    pub clock_skew_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            issuer: "logitrack".to_string(),
            audience: "logitrack".to_string(),
            expiry_minutes: 60,
            clock_skew_secs: 30,
        }
    }
}

impl From<&lt_config::JwtConfig> for AuthConfig {
    fn from(jwt: &lt_config::JwtConfig) -> Self {
        Self {
            secret_key: jwt.key.clone(),
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            expiry_minutes: jwt.expires_minutes,
            clock_skew_secs: jwt.clock_skew_secs,
        }
    }
}

/// Claims carried by a session credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: String,
    /// User name, or email when the user has none
    pub unique_name: String,
    pub email: String,
    /// One entry per role
    #[serde(default)]
    pub role: Vec<String>,
    pub iss: String,
    pub aud: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Why a credential was rejected. Only ever logged; callers see a plain 401.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("wrong audience")]
    WrongAudience,
    #[error("wrong issuer")]
    WrongIssuer,
    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            ErrorKind::InvalidAudience => Self::WrongAudience,
            ErrorKind::InvalidIssuer => Self::WrongIssuer,
            other => Self::Malformed(format!("{:?}", other)),
        }
    }
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    expiry: Duration,
}

impl TokenService {
    /// Fails fast when the signing secret is missing; never per request.
    pub fn new(config: AuthConfig) -> Result<Self> {
        if config.secret_key.trim().is_empty() {
            return Err(PlatformError::configuration("JWT signing key is not configured"));
        }
        if config.secret_key.len() < RECOMMENDED_KEY_BYTES {
            warn!(
                key_bytes = config.secret_key.len(),
                "JWT signing key is shorter than {} bytes", RECOMMENDED_KEY_BYTES
            );
        }

        let secret = config.secret_key.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.clock_skew_secs;
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer,
            audience: config.audience,
            expiry: Duration::minutes(config.expiry_minutes),
        })
    }

    pub fn issue(&self, identity: &UserIdentity) -> Result<String> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue with an explicit issued-at instant.
    pub fn issue_at(&self, identity: &UserIdentity, issued_at: DateTime<Utc>) -> Result<String> {
        let claims = SessionClaims {
            sub: identity.id.clone(),
            unique_name: identity.display_name().to_string(),
            email: identity.email.clone(),
            role: identity.role_list(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.expiry).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            PlatformError::internal(format!("Failed to sign session token: {}", e))
        })
    }

    pub fn validate(&self, token: &str) -> std::result::Result<SessionClaims, TokenError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::from)?;
        debug!(user_id = %data.claims.sub, "Session token validated");
        Ok(data.claims)
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;

    const SECRET: &str = "test-signing-secret-with-enough-bytes!!";

    fn config() -> AuthConfig {
        AuthConfig {
            secret_key: SECRET.to_string(),
            ..Default::default()
        }
    }

    fn identity(roles: &[&str]) -> UserIdentity {
        let mut user = NewUser::new("a@b.com", "hash").with_user_name("alice");
        for role in roles {
            user = user.with_role(*role);
        }
        user.into_identity("user-1")
    }

    #[test]
    fn test_missing_secret_is_configuration_error() {
        let result = TokenService::new(AuthConfig::default());
        assert!(matches!(result, Err(PlatformError::Configuration { .. })));

        let blank = AuthConfig {
            secret_key: "   ".to_string(),
            ..Default::default()
        };
        assert!(TokenService::new(blank).is_err());
    }

    #[test]
    fn test_issue_then_validate_round_trip() {
        let service = TokenService::new(config()).unwrap();
        let token = service.issue(&identity(&["User", "Admin"])).unwrap();

        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.unique_name, "alice");
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, vec!["Admin".to_string(), "User".to_string()]);
        assert_eq!(claims.iss, "logitrack");
        assert_eq!(claims.aud, "logitrack");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let service = TokenService::new(config()).unwrap();
        let user = NewUser::new("solo@b.com", "hash").into_identity("7");
        let claims = service.validate(&service.issue(&user).unwrap()).unwrap();
        assert_eq!(claims.unique_name, "solo@b.com");
        assert!(claims.role.is_empty());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new(AuthConfig {
            expiry_minutes: 0,
            clock_skew_secs: 0,
            ..config()
        })
        .unwrap();

        let token = service
            .issue_at(&identity(&["User"]), Utc::now() - Duration::seconds(2))
            .unwrap();
        assert_eq!(service.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_clock_skew_tolerance() {
        let service = TokenService::new(config()).unwrap();
        // Expired 10 seconds ago, inside the 30 second leeway
        let token = service
            .issue_at(&identity(&["User"]), Utc::now() - Duration::minutes(60) - Duration::seconds(10))
            .unwrap();
        assert!(service.validate(&token).is_ok());

        // Expired two minutes ago
        let token = service
            .issue_at(&identity(&["User"]), Utc::now() - Duration::minutes(62))
            .unwrap();
        assert_eq!(service.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let issuer = TokenService::new(AuthConfig {
            secret_key: "another-secret-that-is-also-long-enough".to_string(),
            ..Default::default()
        })
        .unwrap();
        let verifier = TokenService::new(config()).unwrap();

        let token = issuer.issue(&identity(&["Admin"])).unwrap();
        assert_eq!(verifier.validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_wrong_audience_and_issuer() {
        let verifier = TokenService::new(config()).unwrap();

        let other_audience = TokenService::new(AuthConfig {
            audience: "someone-else".to_string(),
            ..config()
        })
        .unwrap();
        let token = other_audience.issue(&identity(&["User"])).unwrap();
        assert_eq!(verifier.validate(&token), Err(TokenError::WrongAudience));

        let other_issuer = TokenService::new(AuthConfig {
            issuer: "someone-else".to_string(),
            ..config()
        })
        .unwrap();
        let token = other_issuer.issue(&identity(&["User"])).unwrap();
        assert_eq!(verifier.validate(&token), Err(TokenError::WrongIssuer));
    }

    #[test]
    fn test_malformed_token() {
        let service = TokenService::new(config()).unwrap();
        assert!(matches!(service.validate("not-a-jwt"), Err(TokenError::Malformed(_))));
        assert!(matches!(service.validate(""), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let service = TokenService::new(config()).unwrap();
        let token = service.issue(&identity(&["User"])).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = SessionClaims {
            role: vec!["Admin".to_string()],
            ..service.validate(&token).unwrap()
        };
        let forged_payload = base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            serde_json::to_vec(&forged_claims).unwrap(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(service.validate(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Bearer"), None);
    }
}
