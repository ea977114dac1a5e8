//! Bearer token issuance and verification.
//!
//! Tokens are HS256-signed JWTs. Verification keeps the full claim set as
//! raw JSON next to the typed [`Claims`], because timeline reads forward the
//! claims verbatim to the database's row-level security policies.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The claims this service relies on. Tokens may carry more.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject: the user id the row-level security policies match on.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// A token that passed signature and expiry checks.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub claims: Claims,
    /// Every claim in the token, as sent.
    pub raw: Value,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Required `aud` claim. Audience is not checked when `None`.
    pub audience: Option<String>,
    /// Lifetime of tokens minted by [`generate_access_token`] (default: 60).
    pub access_token_expiry_mins: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | **yes**  | --      |
    /// | `JWT_AUDIENCE`           | no       | unset   |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let audience = std::env::var("JWT_AUDIENCE").ok().filter(|a| !a.is_empty());

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        Self {
            secret,
            audience,
            access_token_expiry_mins,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => {
                validation.set_audience(&[aud]);
                validation.set_required_spec_claims(&["exp", "sub", "aud"]);
            }
            None => validation.validate_aud = false,
        }
        validation
    }
}

/// Mint an HS256 access token for `subject`.
///
/// Used by operators to provision dashboard sessions and by the test suite.
pub fn generate_access_token(
    subject: &str,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        role: Some(role.to_string()),
        exp: now + config.access_token_expiry_mins * 60,
        iat: now,
        aud: config.audience.clone(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, expiry and (when configured) audience.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<VerifiedToken, jsonwebtoken::errors::Error> {
    let token_data = decode::<Value>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &config.validation(),
    )?;
    let claims: Claims = serde_json::from_value(token_data.claims.clone())?;
    Ok(VerifiedToken {
        claims,
        raw: token_data.claims,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            audience: None,
            access_token_expiry_mins: 15,
        }
    }

    fn sign(claims: &Value, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encoding should succeed")
    }

    #[test]
    fn generated_token_validates() {
        let config = test_config();
        let token = generate_access_token("user-42", "authenticated", &config)
            .expect("token generation should succeed");

        let verified = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(verified.claims.sub, "user-42");
        assert_eq!(verified.claims.role.as_deref(), Some("authenticated"));
        assert!(verified.claims.exp > verified.claims.iat);
        assert_eq!(verified.raw["sub"], "user-42");
    }

    #[test]
    fn raw_claims_keep_unknown_fields() {
        let config = test_config();
        let exp = chrono::Utc::now().timestamp() + 600;
        let token = sign(
            &serde_json::json!({ "sub": "u1", "exp": exp, "org": "acme" }),
            &config.secret,
        );

        let verified = validate_token(&token, &config).unwrap();
        assert_eq!(verified.raw["org"], "acme");
        assert_eq!(verified.claims.role, None);
    }

    #[test]
    fn expired_token_fails() {
        let config = test_config();
        // Well past the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &serde_json::json!({ "sub": "u1", "exp": now - 300, "iat": now - 600 }),
            &config.secret,
        );

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn token_without_subject_fails() {
        let config = test_config();
        let exp = chrono::Utc::now().timestamp() + 600;
        let token = sign(&serde_json::json!({ "exp": exp }), &config.secret);

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn different_secret_fails() {
        let config = test_config();
        let token = generate_access_token("u1", "authenticated", &config).unwrap();

        let other = JwtConfig {
            secret: "secret-bravo".to_string(),
            ..test_config()
        };
        assert!(validate_token(&token, &other).is_err());
    }

    #[test]
    fn audience_is_enforced_when_configured() {
        let issuer = test_config();
        let token = generate_access_token("u1", "authenticated", &issuer).unwrap();

        let strict = JwtConfig {
            audience: Some("fleetwatch".to_string()),
            ..test_config()
        };
        assert!(validate_token(&token, &strict).is_err());

        let matching = generate_access_token("u1", "authenticated", &strict).unwrap();
        assert!(validate_token(&matching, &strict).is_ok());
    }

    #[test]
    fn token_without_audience_fails_when_audience_configured() {
        let strict = JwtConfig {
            audience: Some("fleetwatch".to_string()),
            ..test_config()
        };
        let exp = chrono::Utc::now().timestamp() + 600;
        let token = sign(&serde_json::json!({ "sub": "u1", "exp": exp }), &strict.secret);

        assert!(validate_token(&token, &strict).is_err());
    }

    #[test]
    fn wrong_audience_fails() {
        let strict = JwtConfig {
            audience: Some("fleetwatch".to_string()),
            ..test_config()
        };
        let exp = chrono::Utc::now().timestamp() + 600;
        let token = sign(
            &serde_json::json!({ "sub": "u1", "exp": exp, "aud": "billing" }),
            &strict.secret,
        );

        assert!(validate_token(&token, &strict).is_err());
    }
}
