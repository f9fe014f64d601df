//! Access and refresh token minting, and the admin gate.

use crate::error::SecurityError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use zar_core::config::SecurityConfig;
use zar_core::constants::{ACCESS_TOKEN_EXPIRE_HOURS, REFRESH_TOKEN_EXPIRE_DAYS};

/// Claims carried by access tokens.
#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    exp: i64,
}

/// Claims carried by the admin token. The original issues these without
/// an expiry, so validation does not require one.
#[derive(Debug, Serialize, Deserialize)]
struct AdminClaims {
    sub: String,
}

/// A freshly minted session: the short-lived access JWT plus the
/// server-side refresh token.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub access_token: String,
    pub refresh_token: Uuid,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Stateless token operations, configured once at startup.
///
/// The signing algorithm comes from configuration only; client-presented
/// tokens are never allowed to choose their own.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    admin_password: String,
}

impl TokenService {
    pub fn new(config: &SecurityConfig) -> Result<Self, SecurityError> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|_| SecurityError::UnsupportedAlgorithm(config.algorithm.clone()))?;
        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret_key.as_bytes()),
            algorithm,
            admin_password: config.admin_password.clone(),
        })
    }

    /// Mint an access token expiring in two hours.
    pub fn create_access_token(&self, user_id: Uuid) -> Result<String, SecurityError> {
        let claims = AccessClaims {
            sub: user_id.to_string(),
            exp: (Utc::now() + Duration::hours(ACCESS_TOKEN_EXPIRE_HOURS)).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding,
        )?)
    }

    /// Decode and validate an access token, returning its subject.
    pub fn verify_access_token(&self, token: &str) -> Option<Uuid> {
        let validation = Validation::new(self.algorithm);
        let data = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &validation).ok()?;
        Uuid::parse_str(&data.claims.sub).ok()
    }

    /// Mint a refresh token: a random UUID with a seven-day expiry,
    /// persisted by the caller.
    pub fn create_refresh_token(&self) -> (Uuid, DateTime<Utc>) {
        (
            Uuid::new_v4(),
            Utc::now() + Duration::days(REFRESH_TOKEN_EXPIRE_DAYS),
        )
    }

    /// Access plus refresh in one step.
    pub fn mint_session(&self, user_id: Uuid) -> Result<SessionToken, SecurityError> {
        let access_token = self.create_access_token(user_id)?;
        let (refresh_token, refresh_expires_at) = self.create_refresh_token();
        Ok(SessionToken {
            access_token,
            refresh_token,
            refresh_expires_at,
        })
    }

    /// Mint the admin token handed out by the admin-login endpoint.
    pub fn create_admin_token(&self) -> Result<String, SecurityError> {
        let claims = AdminClaims {
            sub: self.admin_password.clone(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding,
        )?)
    }

    /// Check the admin gate. Validated on every call, never cached.
    pub fn verify_admin_token(&self, token: &str) -> bool {
        if self.admin_password.is_empty() {
            return false;
        }
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        match jsonwebtoken::decode::<AdminClaims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims.sub == self.admin_password,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecurityConfig {
            secret_key: "test-secret".into(),
            algorithm: "HS256".into(),
            admin_password: "admin-pw".into(),
        })
        .unwrap()
    }

    #[test]
    fn access_token_round_trip() {
        let service = service();
        let user_id = Uuid::new_v4();
        let token = service.create_access_token(user_id).unwrap();
        assert_eq!(service.verify_access_token(&token), Some(user_id));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = service();
        let token = service.create_access_token(Uuid::new_v4()).unwrap();
        let other = TokenService::new(&SecurityConfig {
            secret_key: "other-secret".into(),
            algorithm: "HS256".into(),
            admin_password: String::new(),
        })
        .unwrap();
        assert_eq!(other.verify_access_token(&token), None);
    }

    #[test]
    fn admin_gate_matches_only_configured_password() {
        let service = service();
        let token = service.create_admin_token().unwrap();
        assert!(service.verify_admin_token(&token));
        assert!(!service.verify_admin_token("not-a-jwt"));
    }

    #[test]
    fn admin_gate_closed_without_password() {
        let service = TokenService::new(&SecurityConfig {
            secret_key: "test-secret".into(),
            algorithm: "HS256".into(),
            admin_password: String::new(),
        })
        .unwrap();
        let token = service.create_admin_token().unwrap();
        assert!(!service.verify_admin_token(&token));
    }

    #[test]
    fn unknown_algorithm_is_rejected_at_startup() {
        let result = TokenService::new(&SecurityConfig {
            secret_key: "s".into(),
            algorithm: "none".into(),
            admin_password: String::new(),
        });
        assert!(matches!(
            result,
            Err(SecurityError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn refresh_token_expires_in_seven_days() {
        let service = service();
        let (_, expires_at) = service.create_refresh_token();
        let days = (expires_at - Utc::now()).num_days();
        assert_eq!(days, 6);
    }
}
