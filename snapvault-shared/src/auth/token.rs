/// Credential token generation and hashing
///
/// Session and password-reset tokens are random byte strings handed to the
/// client as URL-safe base64 text. Only their SHA-256 digest is stored.
///
/// # Security
///
/// - **Entropy**: at least [`MIN_BYTES_PER_TOKEN`] bytes (256 bits) from the OS RNG
/// - **Encoding**: URL-safe base64 with padding
/// - **Storage**: SHA-256 digest, URL-safe base64 (44 chars)
/// - **Failure**: a short or failed RNG read is an error, never a shorter token
///
/// # Example
///
/// ```
/// use snapvault_shared::auth::token::{hash_token, TokenGenerator};
///
/// # fn example() -> Result<(), snapvault_shared::error::TokenError> {
/// let generator = TokenGenerator::new(16); // clamped up to 32
/// let token = generator.token()?;
/// assert_eq!(token.len(), 44);
///
/// let digest = hash_token(&token);
/// assert_eq!(digest, hash_token(&token));
/// # Ok(())
/// # }
/// ```

use base64::{engine::general_purpose::URL_SAFE, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::{TokenError, TokenResult};

/// Smallest number of random bytes accepted for a credential token
pub const MIN_BYTES_PER_TOKEN: usize = 32;

/// Generates credential tokens of a configured size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenGenerator {
    bytes_per_token: usize,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self {
            bytes_per_token: MIN_BYTES_PER_TOKEN,
        }
    }
}

impl TokenGenerator {
    /// Creates a generator producing `bytes_per_token` bytes per token
    ///
    /// Values below [`MIN_BYTES_PER_TOKEN`] are raised to the minimum.
    pub fn new(bytes_per_token: usize) -> Self {
        Self {
            bytes_per_token: bytes_per_token.max(MIN_BYTES_PER_TOKEN),
        }
    }

    /// Number of random bytes behind each token
    pub fn bytes_per_token(&self) -> usize {
        self.bytes_per_token
    }

    /// Generates a new URL-safe token
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InsufficientEntropy` if the OS RNG fails
    pub fn token(&self) -> TokenResult<String> {
        let bytes = generate(self.bytes_per_token)?;
        Ok(encode(&bytes))
    }
}

/// Reads `max(byte_count, MIN_BYTES_PER_TOKEN)` bytes from the OS RNG
///
/// # Errors
///
/// Returns `TokenError::InsufficientEntropy` if the RNG cannot fill the buffer
pub fn generate(byte_count: usize) -> TokenResult<Vec<u8>> {
    generate_with(&mut OsRng, byte_count)
}

/// Reads random bytes from an explicit source
///
/// Same clamping and failure rules as [`generate`].
pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R, byte_count: usize) -> TokenResult<Vec<u8>> {
    let mut bytes = vec![0u8; byte_count.max(MIN_BYTES_PER_TOKEN)];
    rng.try_fill_bytes(&mut bytes)
        .map_err(TokenError::InsufficientEntropy)?;
    Ok(bytes)
}

/// Encodes bytes as URL-safe base64 text
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Hashes a token with SHA-256
///
/// Deterministic and unsalted: the token's own entropy makes the digest a
/// unique lookup key. Not suitable for passwords, see [`super::password`].
///
/// # Returns
///
/// URL-safe base64 digest (44 characters)
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE.encode(digest)
}
