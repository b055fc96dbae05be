/// Password reset store
///
/// A reset request is a single-use random token, mailed to the account's
/// address, that lets its holder set a new password before a deadline.
/// Only the token's digest is stored and each user has at most one
/// outstanding request; asking again replaces the earlier token.
///
/// ```text
/// create ──► Created ──► Consumed    (consume before deadline)
///                   ├──► Expired     (consume after deadline)
///                   └──► Superseded  (create for the same user)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TABLE password_resets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash TEXT NOT NULL,
///     expires_at TIMESTAMPTZ NOT NULL,
///     CONSTRAINT password_resets_user_id_key UNIQUE (user_id),
///     CONSTRAINT password_resets_token_hash_key UNIQUE (token_hash)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use snapvault_shared::auth::token::TokenGenerator;
/// use snapvault_shared::models::password_reset::{PasswordResetStore, DEFAULT_RESET_TTL};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let resets = PasswordResetStore::new(pool, TokenGenerator::default(), DEFAULT_RESET_TTL);
///
/// let reset = resets.create("bob@example.com").await?;
/// // mail reset.token to the user ...
///
/// let user = resets.consume(&reset.token).await?;
/// assert!(resets.consume(&reset.token).await.is_err());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use super::user::User;
use crate::auth::token::{hash_token, TokenGenerator};
use crate::error::{TokenError, TokenResult};

/// Lifetime of a reset request when none is configured
pub const DEFAULT_RESET_TTL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// Longest lifetime a reset request may be given
pub const MAX_RESET_TTL: std::time::Duration = std::time::Duration::from_secs(7 * 24 * 60 * 60);

/// A freshly created reset request
///
/// Only [`PasswordResetStore::create`] produces this value, and it is the
/// only place the raw token is available.
#[derive(Clone)]
pub struct PasswordReset {
    /// Reset row ID
    pub id: Uuid,

    /// User whose password may be reset
    pub user_id: Uuid,

    /// Raw token to deliver out of band
    pub token: String,

    /// SHA-256 digest stored in the database
    pub token_hash: String,

    /// Deadline after which the token is rejected
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordReset")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .field("token_hash", &self.token_hash)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Row returned by the consuming delete
#[derive(sqlx::FromRow)]
struct ConsumedReset {
    expires_at: DateTime<Utc>,

    #[sqlx(flatten)]
    user: User,
}

/// Database-backed password reset store
#[derive(Debug, Clone)]
pub struct PasswordResetStore {
    pool: PgPool,
    tokens: TokenGenerator,
    ttl: Duration,
}

impl PasswordResetStore {
    /// Creates a store whose requests live for `ttl`
    ///
    /// A zero `ttl`, or one longer than [`MAX_RESET_TTL`], falls back to
    /// [`DEFAULT_RESET_TTL`].
    pub fn new(pool: PgPool, tokens: TokenGenerator, ttl: std::time::Duration) -> Self {
        let ttl = Some(ttl)
            .filter(|ttl| !ttl.is_zero() && *ttl <= MAX_RESET_TTL)
            .and_then(|ttl| Duration::from_std(ttl).ok())
            .unwrap_or_else(|| Duration::seconds(DEFAULT_RESET_TTL.as_secs() as i64));

        Self { pool, tokens, ttl }
    }

    /// Lifetime given to new requests
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Opens a reset request for the account registered under `email`
    ///
    /// Any earlier outstanding request of that user is replaced in the same
    /// statement.
    ///
    /// # Errors
    ///
    /// - `TokenError::NotFound` if no user has this email (case-insensitive)
    /// - `TokenError::InsufficientEntropy` if no token could be generated
    /// - `TokenError::Storage` on database failure
    pub async fn create(&self, email: &str) -> TokenResult<PasswordReset> {
        let user = User::find_by_email(&self.pool, email)
            .await?
            .ok_or(TokenError::NotFound("user"))?;

        let token = self.tokens.token()?;
        let token_hash = hash_token(&token);
        let expires_at = Utc::now() + self.ttl;

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO password_resets (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET token_hash = EXCLUDED.token_hash, expires_at = EXCLUDED.expires_at
            RETURNING id
            "#,
        )
        .bind(user.id)
        .bind(&token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        info!(reset_id = %id, user_id = %user.id, %expires_at, "Password reset requested");

        Ok(PasswordReset {
            id,
            user_id: user.id,
            token,
            token_hash,
            expires_at,
        })
    }

    /// Redeems a reset token and returns its user
    ///
    /// The matching row is deleted by the same statement that reads it, so
    /// of several concurrent calls with one token only one sees the row.
    /// An expired row is deleted as well; the token is dead either way.
    ///
    /// # Errors
    ///
    /// - `TokenError::NotFound` if no request matches (never issued, already
    ///   used, superseded, or expired and already rejected once)
    /// - `TokenError::Expired` if the request's deadline has passed
    /// - `TokenError::Storage` on database failure
    pub async fn consume(&self, token: &str) -> TokenResult<User> {
        self.consume_with(&self.pool, token).await
    }

    /// Redeems a reset token on the given connection or transaction
    ///
    /// Inside a transaction the token stays valid until the transaction
    /// commits, so a rollback hands the link back to its owner.
    pub async fn consume_with<'c, E>(&self, executor: E, token: &str) -> TokenResult<User>
    where
        E: PgExecutor<'c>,
    {
        let consumed = sqlx::query_as::<_, ConsumedReset>(
            r#"
            DELETE FROM password_resets
            USING users
            WHERE password_resets.token_hash = $1
              AND users.id = password_resets.user_id
            RETURNING password_resets.expires_at,
                      users.id, users.email, users.password_hash,
                      users.created_at, users.updated_at
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(executor)
        .await?
        .ok_or(TokenError::NotFound("password reset"))?;

        if Utc::now() > consumed.expires_at {
            debug!(user_id = %consumed.user.id, "Expired password reset presented");
            return Err(TokenError::Expired(consumed.expires_at));
        }

        info!(user_id = %consumed.user.id, "Password reset consumed");
        Ok(consumed.user)
    }

    /// Deletes every expired request
    ///
    /// # Returns
    ///
    /// Number of rows removed
    pub async fn purge_expired(&self) -> TokenResult<u64> {
        let result = sqlx::query("DELETE FROM password_resets WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        let purged = result.rows_affected();
        if purged > 0 {
            info!(purged, "Purged expired password resets");
        }
        Ok(purged)
    }
}
