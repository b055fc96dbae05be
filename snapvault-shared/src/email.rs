/// Outbound email
///
/// [`EmailService`] composes messages (currently the password reset mail)
/// and hands them to a [`Mailer`]. Two mailers ship with the crate:
///
/// - [`SmtpMailer`]: delivers through an SMTP relay with STARTTLS
/// - [`LogMailer`]: writes the message to the log instead (development)
///
/// # Example
///
/// ```no_run
/// use snapvault_shared::email::{EmailService, SmtpConfig, SmtpMailer};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mailer = SmtpMailer::new(&SmtpConfig {
///     host: "sandbox.smtp.mailtrap.io".to_string(),
///     port: 587,
///     username: "user".to_string(),
///     password: "pass".to_string(),
/// })?;
///
/// let emails = EmailService::new("support@snapvault.dev", Arc::new(mailer));
/// emails
///     .forgot_password("bob@example.com", "https://snapvault.dev/reset-pw?token=abc")
///     .await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::info;

/// Sender used when neither the message nor the service names one
pub const DEFAULT_SENDER: &str = "support@snapvault.dev";

/// Error type for email delivery
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// A sender or recipient address could not be parsed
    #[error("Invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The message has neither a plain-text nor an HTML body
    #[error("Email has no body")]
    EmptyBody,

    /// The message could not be assembled
    #[error("Failed to build email: {0}")]
    Build(String),

    /// The transport rejected or failed to deliver the message
    #[error("Failed to send email: {0}")]
    Transport(String),
}

/// Outgoing message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Email {
    /// Sender; empty means the service default
    pub from: String,

    /// Recipient
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub plaintext: String,

    /// HTML body
    pub html: String,
}

/// Something that can deliver an [`Email`]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a fully addressed message
    async fn send(&self, email: &Email) -> Result<(), EmailError>;
}

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Relay host name
    pub host: String,

    /// Relay port (587 for STARTTLS)
    pub port: u16,

    /// Login user
    pub username: String,

    /// Login password
    pub password: String,
}

/// Delivers mail through an SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Builds a STARTTLS transport for the configured relay
    ///
    /// No connection is opened until the first message is sent.
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        let message = build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Logs messages instead of sending them
///
/// The body is logged too, which includes reset links: use only in
/// development.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        build_message(email)?;
        info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.plaintext,
            "Email not sent (log mailer)"
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address.parse().map_err(|e: lettre::address::AddressError| EmailError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Converts an [`Email`] into a MIME message
fn build_message(email: &Email) -> Result<Message, EmailError> {
    let builder = Message::builder()
        .from(parse_mailbox(&email.from)?)
        .to(parse_mailbox(&email.to)?)
        .subject(email.subject.clone());

    let text = || {
        SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(email.plaintext.clone())
    };
    let html = || {
        SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
    };

    let message = match (email.plaintext.is_empty(), email.html.is_empty()) {
        (false, false) => builder.multipart(MultiPart::alternative().singlepart(text()).singlepart(html())),
        (false, true) => builder.singlepart(text()),
        (true, false) => builder.singlepart(html()),
        (true, true) => return Err(EmailError::EmptyBody),
    };

    message.map_err(|e| EmailError::Build(e.to_string()))
}

/// Composes application emails and hands them to a [`Mailer`]
#[derive(Clone)]
pub struct EmailService {
    default_sender: String,
    mailer: Arc<dyn Mailer>,
}

impl EmailService {
    /// Creates a service sending as `default_sender`
    ///
    /// An empty sender falls back to [`DEFAULT_SENDER`].
    pub fn new(default_sender: impl Into<String>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            default_sender: default_sender.into(),
            mailer,
        }
    }

    /// Sender applied to messages that do not name one
    pub fn sender_for(&self, email: &Email) -> String {
        if !email.from.is_empty() {
            email.from.clone()
        } else if !self.default_sender.is_empty() {
            self.default_sender.clone()
        } else {
            DEFAULT_SENDER.to_string()
        }
    }

    /// Sends a message, filling in the sender
    pub async fn send(&self, mut email: Email) -> Result<(), EmailError> {
        email.from = self.sender_for(&email);
        self.mailer.send(&email).await
    }

    /// Sends the password reset link to `to`
    pub async fn forgot_password(&self, to: &str, reset_url: &str) -> Result<(), EmailError> {
        let email = Email {
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            plaintext: format!(
                "To reset your password, please visit the following link: {}\n\n\
                 If you did not ask for a password reset you can ignore this email.",
                reset_url
            ),
            html: format!(
                "<p>To reset your password, please visit the following link: \
                 <a href=\"{0}\">{0}</a></p>\
                 <p>If you did not ask for a password reset you can ignore this email.</p>",
                reset_url
            ),
            ..Default::default()
        };

        self.send(email).await
    }
}
