/// Authentication utilities
///
/// # Modules
///
/// - [`token`]: Credential token generation and SHA-256 hashing
/// - [`password`]: Argon2id password hashing and validation
/// - [`current_user`]: Request-scoped propagation of the signed-in user
///
/// Sessions and password resets themselves live in
/// [`crate::models::session`] and [`crate::models::password_reset`].
///
/// # Example
///
/// ```
/// use snapvault_shared::auth::password::{hash_password, verify_password};
/// use snapvault_shared::auth::token::{hash_token, TokenGenerator};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = TokenGenerator::default().token()?;
/// let stored = hash_token(&token);
/// assert_ne!(token, stored);
/// # Ok(())
/// # }
/// ```

pub mod current_user;
pub mod password;
pub mod token;
