/// Configuration management for the web server
///
/// Configuration is read from environment variables, with a `.env` file
/// loaded first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 3000)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `APP_BASE_URL`: Public URL used in emailed links (default: http://localhost:3000)
/// - `SESSION_TOKEN_BYTES`: Random bytes per token (default: 32, minimum 32)
/// - `PASSWORD_RESET_TTL_MINUTES`: Reset link lifetime (default: 60, at most 10080)
/// - `COOKIE_SECURE`: Mark the session cookie `Secure` (default: false)
/// - `IMAGES_DIR`: Root of gallery image directories (default: images)
/// - `SMTP_HOST`: SMTP relay; unset means emails are only logged
/// - `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`: Relay settings
/// - `EMAIL_DEFAULT_SENDER`: From address (default: support@snapvault.dev)
///
/// # Example
///
/// ```no_run
/// use snapvault_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use snapvault_shared::{
    auth::token::MIN_BYTES_PER_TOKEN,
    db::pool::DatabaseConfig as PoolConfig,
    email::{SmtpConfig, DEFAULT_SENDER},
    models::password_reset::MAX_RESET_TTL,
};
use std::{env, path::PathBuf, str::FromStr, time::Duration};

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session and password reset configuration
    pub auth: AuthConfig,

    /// Outbound email configuration
    pub email: EmailConfig,

    /// Root directory of gallery images
    pub images_dir: PathBuf,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Public base URL, without trailing slash
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session and password reset configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Random bytes per session or reset token
    pub token_bytes: usize,

    /// How long a password reset link stays valid
    pub reset_ttl: Duration,

    /// Whether the session cookie is `Secure`
    pub cookie_secure: bool,
}

/// Outbound email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Sender for outgoing mail
    pub default_sender: String,

    /// SMTP relay; None means the log mailer is used
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A variable has an unparsable value
    /// - `SESSION_TOKEN_BYTES` or `PASSWORD_RESET_TTL_MINUTES` is out of range
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT", 587)?,
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            }),
            _ => None,
        };

        let token_bytes: usize = parse_var("SESSION_TOKEN_BYTES", MIN_BYTES_PER_TOKEN)?;
        if token_bytes < MIN_BYTES_PER_TOKEN {
            anyhow::bail!("SESSION_TOKEN_BYTES must be at least {}", MIN_BYTES_PER_TOKEN);
        }

        let reset_ttl = reset_ttl_from_minutes(parse_var("PASSWORD_RESET_TTL_MINUTES", 60)?)?;

        Ok(Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("API_PORT", 3000)?,
                base_url: env::var("APP_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            auth: AuthConfig {
                token_bytes,
                reset_ttl,
                cookie_secure: parse_var("COOKIE_SECURE", false)?,
            },
            email: EmailConfig {
                default_sender: env::var("EMAIL_DEFAULT_SENDER")
                    .unwrap_or_else(|_| DEFAULT_SENDER.to_string()),
                smtp,
            },
            images_dir: env::var("IMAGES_DIR")
                .unwrap_or_else(|_| "images".to_string())
                .into(),
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Pool settings for the shared database layer
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    /// Link mailed to a user to redeem a reset token
    pub fn reset_url(&self, token: &str) -> String {
        format!(
            "{}/reset-pw?token={}",
            self.api.base_url,
            urlencoding::encode(token)
        )
    }
}

/// Reset link lifetime, between one minute and [`MAX_RESET_TTL`]
fn reset_ttl_from_minutes(minutes: u64) -> anyhow::Result<Duration> {
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .filter(|ttl| !ttl.is_zero() && *ttl <= MAX_RESET_TTL)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "PASSWORD_RESET_TTL_MINUTES must be between 1 and {}",
                MAX_RESET_TTL.as_secs() / 60
            )
        })
}

/// Reads `name`, falling back to `default` when unset
fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}
