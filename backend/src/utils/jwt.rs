//! JWT token utilities for authentication and authorization.
//!
//! Provides secure token creation, validation, and claims management for
//! user authentication. Token lifetimes depend on how the token was
//! obtained: session logins last a day, federated logins a week, and
//! password-reset tokens fifteen minutes.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::ServiceError;

/// JWT Claims structure containing user identity data
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// User email
    pub email: String,
    /// User role (validated against the closed role set at the boundary)
    pub role: String,
    /// Tenant ID; absent for SuperAdmin users
    pub tenant_id: Option<String>,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// Purpose of an issued token, which determines its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTtl {
    /// Interactive email/password login: 1 day by default.
    Session,
    /// Federated (OAuth) login: 7 days by default.
    Federated,
    /// Password-reset link: 15 minutes by default.
    PasswordReset,
}

/// JWT token utility for creating and validating tokens.
///
/// Built once at startup from the loaded configuration and shared with
/// handlers and middleware through a request extension. A missing
/// `JWT_SECRET` therefore fails the process at boot, not per request.
#[derive(Clone)]
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl_seconds: u64,
    federated_ttl_seconds: u64,
    reset_ttl_seconds: u64,
}

impl JwtUtils {
    /// Create a JwtUtils from an already-loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtUtils {
            encoding_key,
            decoding_key,
            validation,
            session_ttl_seconds: config.session_token_ttl_seconds,
            federated_ttl_seconds: config.federated_token_ttl_seconds,
            reset_ttl_seconds: config.reset_token_ttl_seconds,
        }
    }

    /// Lifetime in seconds for the given token purpose.
    pub fn ttl_seconds(&self, ttl: TokenTtl) -> u64 {
        match ttl {
            TokenTtl::Session => self.session_ttl_seconds,
            TokenTtl::Federated => self.federated_ttl_seconds,
            TokenTtl::PasswordReset => self.reset_ttl_seconds,
        }
    }

    /// Generate a new signed JWT token for the given identity.
    pub fn generate_token(
        &self,
        user_id: String,
        email: String,
        role: String,
        tenant_id: Option<String>,
        ttl: TokenTtl,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_seconds(ttl) as i64);

        let claims = Claims {
            sub: user_id,
            email,
            role,
            tenant_id,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal_error(format!("Token generation failed: {e}")))
    }

    /// Validate signature and expiry, returning the decoded claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ServiceError::unauthenticated("token expired"),
                ErrorKind::InvalidSignature => ServiceError::unauthenticated("invalid signature"),
                _ => ServiceError::unauthenticated(format!("invalid token: {e}")),
            })
    }

    /// Decode claims without verifying the signature or expiry.
    ///
    /// Used only for optimistic UI role routing; returns `None` on any
    /// malformed input, never errors. Never trust the result for
    /// authorization decisions.
    pub fn decode_unverified(token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|token_data| token_data.claims)
            .ok()
    }
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Check if token has expired
    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as usize;
        now > self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailConfig;

    fn test_config(secret: &str) -> Config {
        Config {
            database_url: "sqlite::memory:".into(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            jwt_secret: secret.into(),
            session_token_ttl_seconds: 86400,
            federated_token_ttl_seconds: 604800,
            reset_token_ttl_seconds: 900,
            temp_password_ttl_hours: 72,
            encryption_key: "test-key".into(),
            server_port: 0,
            sms_provider_base_url: "http://localhost".into(),
            email: EmailConfig {
                smtp_host: "localhost".into(),
                smtp_port: 587,
                smtp_username: String::new(),
                smtp_password: String::new(),
                from_name: "Test".into(),
                from_email: "test@localhost".into(),
                base_url: "http://localhost:3000".into(),
            },
        }
    }

    fn issue(utils: &JwtUtils, ttl: TokenTtl) -> String {
        utils
            .generate_token(
                "user-1".into(),
                "alice@acme.com".into(),
                "OrgUser".into(),
                Some("tenant-acme".into()),
                ttl,
            )
            .unwrap()
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let utils = JwtUtils::from_config(&test_config("secret-a"));
        let token = issue(&utils, TokenTtl::Session);

        let claims = utils.validate_token(&token).unwrap();
        assert_eq!(claims.user_id(), "user-1");
        assert_eq!(claims.role(), "OrgUser");
        assert_eq!(claims.tenant_id(), Some("tenant-acme"));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let issuer = JwtUtils::from_config(&test_config("secret-a"));
        let verifier = JwtUtils::from_config(&test_config("secret-b"));

        let token = issue(&issuer, TokenTtl::Session);
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let utils = JwtUtils::from_config(&test_config("secret-a"));
        let token = issue(&utils, TokenTtl::Session);

        // Flip a character in the payload segment.
        let mut bytes = token.into_bytes();
        let mid = bytes.len() / 2;
        bytes[mid] = if bytes[mid] == b'a' { b'b' } else { b'a' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(utils.validate_token(&tampered).is_err());
    }

    #[test]
    fn test_purpose_specific_ttls() {
        let utils = JwtUtils::from_config(&test_config("secret-a"));
        assert_eq!(utils.ttl_seconds(TokenTtl::Session), 86400);
        assert_eq!(utils.ttl_seconds(TokenTtl::Federated), 604800);
        assert_eq!(utils.ttl_seconds(TokenTtl::PasswordReset), 900);

        let session = issue(&utils, TokenTtl::Session);
        let reset = issue(&utils, TokenTtl::PasswordReset);
        let s = utils.validate_token(&session).unwrap();
        let r = utils.validate_token(&reset).unwrap();
        assert!(s.exp > r.exp);
    }

    #[test]
    fn test_decode_unverified() {
        let utils = JwtUtils::from_config(&test_config("secret-a"));
        let token = issue(&utils, TokenTtl::Session);

        let claims = JwtUtils::decode_unverified(&token).unwrap();
        assert_eq!(claims.role(), "OrgUser");

        assert!(JwtUtils::decode_unverified("not-a-token").is_none());
        assert!(JwtUtils::decode_unverified("").is_none());
    }
}
