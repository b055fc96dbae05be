/// Database models for SnapVault
///
/// # Models
///
/// - `user`: User accounts and password authentication
/// - `session`: Session store (one active session per user)
/// - `password_reset`: Single-use, expiring password reset requests
/// - `gallery`: Per-user galleries and their image files
///
/// # Example
///
/// ```no_run
/// use snapvault_shared::db::pool::{create_pool, DatabaseConfig};
/// use snapvault_shared::models::user::{CreateUser, User};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod gallery;
pub mod password_reset;
pub mod session;
pub mod user;
