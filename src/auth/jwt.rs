use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::JwtConfig, error::AppError};

/// Fixed lifetime of every issued token.
pub const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signing secret is not configured")]
    MissingSecret,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("failed to sign token: {0}")]
    Encode(jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub email: String, // user email at issuance
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// Identity carried by a valid token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Issues and validates HS256 bearer tokens. Stateless apart from the secret;
/// a token stays valid until `exp` even if its user disappears.
#[derive(Clone)]
pub struct TokenService {
    secret: Option<String>,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            secret: cfg.secret.clone().filter(|s| !s.is_empty()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: TOKEN_TTL,
        }
    }

    fn secret(&self) -> Result<&[u8], TokenError> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or(TokenError::MissingSecret)
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, email, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let key = EncodingKey::from_secret(self.secret()?);
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token =
            encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(TokenError::Encode)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        let key = DecodingKey::from_secret(self.secret()?);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &key, &validation)?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(Identity {
            user_id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Authenticated caller, taken from `Authorization: Bearer <token>`.
pub struct AuthUser(pub Identity);

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::MissingToken)?;
        let token = bearer_token(header).ok_or(AppError::MissingToken)?;

        let tokens = TokenService::from_ref(state);
        match tokens.validate(token) {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(TokenError::Invalid(e)) => {
                warn!(error = %e, "invalid or expired token");
                Err(AppError::InvalidToken)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_service(secret: Option<&str>, issuer: &str, audience: &str) -> TokenService {
        TokenService::new(&JwtConfig {
            secret: secret.map(Into::into),
            issuer: issuer.into(),
            audience: audience.into(),
        })
    }

    #[test]
    fn issue_and_validate_roundtrip() {
        let tokens = make_service(Some("dev-secret"), "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id, "u@x.com").expect("issue");
        let identity = tokens.validate(&token).expect("validate");
        assert_eq!(
            identity,
            Identity {
                user_id,
                email: "u@x.com".into()
            }
        );
    }

    #[test]
    fn token_lives_for_24_hours() {
        let tokens = make_service(Some("dev-secret"), "iss", "aud");
        let token = tokens.issue(Uuid::new_v4(), "u@x.com").unwrap();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["aud"]);
        let data = decode::<Claims>(&token, &DecodingKey::from_secret(b"dev-secret"), &validation)
            .unwrap();
        assert_eq!(data.claims.exp - data.claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn missing_secret_fails_at_call_time() {
        let tokens = make_service(None, "iss", "aud");
        assert!(matches!(
            tokens.issue(Uuid::new_v4(), "u@x.com"),
            Err(TokenError::MissingSecret)
        ));
        assert!(matches!(tokens.validate("a.b.c"), Err(TokenError::MissingSecret)));

        let empty = make_service(Some(""), "iss", "aud");
        assert!(matches!(
            empty.issue(Uuid::new_v4(), "u@x.com"),
            Err(TokenError::MissingSecret)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = make_service(Some("dev-secret"), "iss", "aud");
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(25);
        let token = tokens.issue_at(Uuid::new_v4(), "u@x.com", issued).unwrap();
        assert!(matches!(tokens.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn token_just_inside_window_is_accepted() {
        let tokens = make_service(Some("dev-secret"), "iss", "aud");
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(23);
        let token = tokens.issue_at(Uuid::new_v4(), "u@x.com", issued).unwrap();
        assert!(tokens.validate(&token).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signer = make_service(Some("secret-a"), "iss", "aud");
        let verifier = make_service(Some("secret-b"), "iss", "aud");
        let token = signer.issue(Uuid::new_v4(), "u@x.com").unwrap();
        assert!(matches!(verifier.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let good = make_service(Some("same-secret"), "good-iss", "good-aud");
        let bad = make_service(Some("same-secret"), "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4(), "u@x.com").unwrap();
        assert!(matches!(bad.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn malformed_and_tampered_tokens_are_rejected() {
        let tokens = make_service(Some("dev-secret"), "iss", "aud");
        assert!(matches!(tokens.validate("not-a-jwt"), Err(TokenError::Invalid(_))));

        let token = tokens.issue(Uuid::new_v4(), "u@x.com").unwrap();
        let forged = tokens.issue(Uuid::new_v4(), "evil@x.com").unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged_payload;
        let tampered = parts.join(".");
        assert!(matches!(tokens.validate(&tampered), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer   "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
