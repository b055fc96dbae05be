/// Session store
///
/// A session binds a random bearer token (held by the browser in a cookie)
/// to a user. Only the token's SHA-256 digest is stored. Each user has at
/// most one session: signing in again replaces the previous token, which
/// immediately stops resolving.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT sessions_user_id_key UNIQUE (user_id),
///     CONSTRAINT sessions_token_hash_key UNIQUE (token_hash)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use snapvault_shared::auth::token::TokenGenerator;
/// use snapvault_shared::models::session::SessionStore;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let sessions = SessionStore::new(pool, TokenGenerator::default());
///
/// let session = sessions.upsert(user_id).await?;
/// // session.token goes into the cookie; it is never readable again
///
/// let user = sessions.user(&session.token).await?;
/// assert_eq!(user.id, user_id);
///
/// sessions.delete(&session.token).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::user::User;
use crate::auth::token::{hash_token, TokenGenerator};
use crate::error::{TokenError, TokenResult};

/// A freshly issued session
///
/// Only [`SessionStore::upsert`] produces this value, and it is the only
/// place the raw token is available.
#[derive(Clone)]
pub struct Session {
    /// Session row ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Raw token to hand to the client
    pub token: String,

    /// SHA-256 digest stored in the database
    pub token_hash: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .field("token_hash", &self.token_hash)
            .finish()
    }
}

/// Database-backed session store
#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: PgPool,
    tokens: TokenGenerator,
}

impl SessionStore {
    /// Creates a store issuing tokens from `tokens`
    pub fn new(pool: PgPool, tokens: TokenGenerator) -> Self {
        Self { pool, tokens }
    }

    /// Issues a new session for a user, replacing any existing one
    ///
    /// The replace-or-insert is a single `INSERT ... ON CONFLICT` statement,
    /// so concurrent calls for one user still leave exactly one row.
    ///
    /// # Errors
    ///
    /// - `TokenError::InsufficientEntropy` if no token could be generated
    /// - `TokenError::Storage` on database failure (including unknown user)
    pub async fn upsert(&self, user_id: Uuid) -> TokenResult<Session> {
        let token = self.tokens.token()?;
        let token_hash = hash_token(&token);

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO sessions (user_id, token_hash)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET token_hash = EXCLUDED.token_hash, created_at = NOW()
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .fetch_one(&self.pool)
        .await?;

        debug!(session_id = %id, user_id = %user_id, "Session issued");

        Ok(Session {
            id,
            user_id,
            token,
            token_hash,
        })
    }

    /// Resolves a presented token to its user
    ///
    /// # Errors
    ///
    /// - `TokenError::NotFound` if no session matches the token's digest
    /// - `TokenError::Storage` on database failure
    pub async fn user(&self, token: &str) -> TokenResult<User> {
        let token_hash = hash_token(token);

        sqlx::query_as::<_, User>(
            r#"
            SELECT users.id, users.email, users.password_hash,
                   users.created_at, users.updated_at
            FROM sessions
            JOIN users ON users.id = sessions.user_id
            WHERE sessions.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TokenError::NotFound("session"))
    }

    /// Removes the session matching a token
    ///
    /// Deleting an unknown or already deleted session is not an error.
    ///
    /// # Returns
    ///
    /// True if a session was removed
    pub async fn delete(&self, token: &str) -> TokenResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        debug!(deleted, "Session delete");
        Ok(deleted)
    }
}
