//! Direct-upload token issuance and verification.
//!
//! A browser-direct upload first asks the server for a short-lived signed
//! token scoped to one blob pathname, then PUTs the bytes straight to the
//! blob route with that token. The server side only sees the resulting
//! blob descriptors when the group is finalized.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::UploadConfig;
use crate::web::error::ApiError;

/// Claims carried by a direct-upload token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTokenClaims {
    /// Blob pathname this token authorizes.
    pub pathname: String,
    /// Maximum accepted upload size in bytes.
    pub max_size: u64,
    /// Issued-at (seconds since epoch).
    pub iat: u64,
    /// Expiry (seconds since epoch).
    pub exp: u64,
}

/// An issued direct-upload authorization.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The signed token.
    pub token: String,
    /// Pathname the token is scoped to.
    pub pathname: String,
    /// Maximum accepted upload size in bytes.
    pub maximum_size_in_bytes: u64,
    /// Expiry timestamp.
    pub valid_until: DateTime<Utc>,
}

/// Issues and verifies direct-upload tokens.
#[derive(Clone)]
pub struct UploadTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    max_size: u64,
    expiry_secs: u64,
}

impl UploadTokenIssuer {
    /// Create a new issuer from the upload configuration.
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.token_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.token_secret.as_bytes()),
            max_size: config.max_file_size_bytes,
            expiry_secs: config.token_expiry_secs,
        }
    }

    /// Issue a token authorizing one upload of `pathname`.
    pub fn issue(&self, pathname: &str) -> Result<IssuedToken, ApiError> {
        let now = Utc::now().timestamp() as u64;
        let claims = UploadTokenClaims {
            pathname: pathname.to_string(),
            max_size: self.max_size,
            iat: now,
            exp: now + self.expiry_secs,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign upload token: {}", e);
            ApiError::bad_request("Failed to generate upload token")
        })?;

        let valid_until = Utc
            .timestamp_opt(claims.exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);

        Ok(IssuedToken {
            token,
            pathname: pathname.to_string(),
            maximum_size_in_bytes: self.max_size,
            valid_until,
        })
    }

    /// Verify a token against the pathname actually being uploaded.
    pub fn verify(&self, token: &str, pathname: &str) -> Result<UploadTokenClaims, ApiError> {
        let data = decode::<UploadTokenClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| ApiError::unauthorized("Invalid or expired upload token"))?;

        if data.claims.pathname != pathname {
            return Err(ApiError::unauthorized(
                "Upload token does not match pathname",
            ));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn issuer() -> UploadTokenIssuer {
        let config = UploadConfig {
            token_secret: "test-secret".to_string(),
            ..UploadConfig::default()
        };
        UploadTokenIssuer::new(&config)
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();

        let issued = issuer.issue("g1/a.txt").unwrap();
        assert_eq!(issued.pathname, "g1/a.txt");
        assert_eq!(issued.maximum_size_in_bytes, 1024 * 1024 * 1024);
        assert!(issued.valid_until > Utc::now());

        let claims = issuer.verify(&issued.token, "g1/a.txt").unwrap();
        assert_eq!(claims.pathname, "g1/a.txt");
        assert_eq!(claims.max_size, issued.maximum_size_in_bytes);
    }

    #[test]
    fn test_verify_rejects_other_pathname() {
        let issuer = issuer();
        let issued = issuer.issue("g1/a.txt").unwrap();

        let err = issuer.verify(&issued.token, "g1/b.txt").unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let issuer = issuer();
        let err = issuer.verify("not-a-token", "g1/a.txt").unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let issued = issuer().issue("g1/a.txt").unwrap();

        let other = UploadTokenIssuer::new(&UploadConfig {
            token_secret: "different-secret".to_string(),
            ..UploadConfig::default()
        });

        assert!(other.verify(&issued.token, "g1/a.txt").is_err());
    }
}
