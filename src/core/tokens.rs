//! JWT access/refresh token issuance and verification.
//!
//! Tokens are HS256-signed and carry the user id and email. The `token_type`
//! claim keeps refresh tokens from being accepted where an access token is
//! required, and the other way around.

use crate::{
    core::accounts::{authenticate, get_active_user},
    entities::user,
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{DatabaseConnection, prelude::Uuid};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Distinguishes the two kinds of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token that authenticates API requests
    Access,
    /// Longer-lived token that can only be exchanged for a new pair
    Refresh,
}

/// Claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id
    pub user_id: i64,
    /// Subject email at issue time
    pub email: String,
    /// Access or refresh
    pub token_type: TokenType,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

/// An access token and the refresh token that can renew it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access JWT
    pub access: String,
    /// Refresh JWT
    pub refresh: String,
}

/// Signing configuration for [`TokenPair`] issuance.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer signing with `secret`.
    #[must_use]
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    fn sign(&self, owner: &user::Model, token_type: TokenType) -> Result<String> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            user_id: owner.id,
            email: owner.email.clone(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Issues a fresh access/refresh pair for `owner`.
    pub fn issue_pair(&self, owner: &user::Model) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.sign(owner, TokenType::Access)?,
            refresh: self.sign(owner, TokenType::Refresh)?,
        })
    }

    /// Decodes `token`, checking signature, expiry and that it is of `expected` type.
    ///
    /// # Errors
    /// Returns [`Error::Token`] for bad signatures or expired tokens and
    /// [`Error::Authentication`] for a token of the wrong type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        if claims.token_type != expected {
            debug!(?expected, actual = ?claims.token_type, "Token type mismatch");
            return Err(Error::Authentication {
                message: "Token has wrong type".to_string(),
            });
        }
        Ok(claims)
    }
}

/// Exchanges email/password credentials for a token pair.
#[instrument(skip(db, issuer, password))]
pub async fn issue_token(
    db: &DatabaseConnection,
    issuer: &TokenIssuer,
    email: &str,
    password: &str,
) -> Result<TokenPair> {
    let owner = authenticate(db, email, password).await?;
    issuer.issue_pair(&owner)
}

/// Exchanges a valid refresh token for a new pair.
///
/// # Errors
/// Returns an authentication error when the token is invalid, is not a refresh
/// token, or its user is gone or inactive.
#[instrument(skip_all)]
pub async fn refresh_token(
    db: &DatabaseConnection,
    issuer: &TokenIssuer,
    refresh: &str,
) -> Result<TokenPair> {
    let claims = issuer.verify(refresh, TokenType::Refresh)?;
    let owner = get_active_user(db, claims.user_id)
        .await?
        .ok_or_else(|| Error::Authentication {
            message: "User not found".to_string(),
        })?;
    issuer.issue_pair(&owner)
}

/// Resolves an access token to its active user.
pub async fn resolve_access_token(
    db: &DatabaseConnection,
    issuer: &TokenIssuer,
    access: &str,
) -> Result<user::Model> {
    let claims = issuer.verify(access, TokenType::Access)?;
    get_active_user(db, claims.user_id)
        .await?
        .ok_or(Error::UserNotFound {
            id: claims.user_id,
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", Duration::minutes(5), Duration::days(1))
    }

    #[tokio::test]
    async fn test_issue_token_carries_email_claim() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let issuer = issuer();

        let pair = issue_token(&db, &issuer, "alice@example.com", TEST_PASSWORD).await?;
        let claims = issuer.verify(&pair.access, TokenType::Access)?;
        assert_eq!(claims.user_id, alice.id);
        assert_eq!(claims.email, "alice@example.com");
        assert!(claims.exp > claims.iat);

        let refresh_claims = issuer.verify(&pair.refresh, TokenType::Refresh)?;
        assert_eq!(refresh_claims.user_id, alice.id);
        assert_ne!(refresh_claims.jti, claims.jti);
        Ok(())
    }

    #[tokio::test]
    async fn test_issue_token_rejects_bad_credentials() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "alice").await?;

        let result = issue_token(&db, &issuer(), "alice@example.com", "wrong-password").await;
        assert!(matches!(result, Err(Error::Authentication { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_token_types_are_not_interchangeable() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let issuer = issuer();
        let pair = issuer.issue_pair(&alice)?;

        assert!(issuer.verify(&pair.refresh, TokenType::Access).is_err());
        assert!(issuer.verify(&pair.access, TokenType::Refresh).is_err());
        assert!(refresh_token(&db, &issuer, &pair.access).await.is_err());

        let renewed = refresh_token(&db, &issuer, &pair.refresh).await?;
        let user = resolve_access_token(&db, &issuer, &renewed.access).await?;
        assert_eq!(user.id, alice.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_and_foreign_tokens_are_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;

        let expired = TokenIssuer::new("test-secret", Duration::minutes(-5), Duration::days(1));
        let pair = expired.issue_pair(&alice)?;
        assert!(matches!(
            issuer().verify(&pair.access, TokenType::Access),
            Err(Error::Token(_))
        ));

        let other = TokenIssuer::new("other-secret", Duration::minutes(5), Duration::days(1));
        let pair = other.issue_pair(&alice)?;
        assert!(matches!(
            issuer().verify(&pair.access, TokenType::Access),
            Err(Error::Token(_))
        ));
        Ok(())
    }
}
