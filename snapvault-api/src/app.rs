/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use snapvault_api::{app::{build_mailer, build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let mailer = build_mailer(&config.email)?;
/// let app = build_router(AppState::new(pool, config, mailer));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, EmailConfig},
    middleware::session::{require_user, set_user},
    routes,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use snapvault_shared::{
    auth::token::TokenGenerator,
    email::{EmailError, EmailService, LogMailer, Mailer, SmtpMailer},
    models::{gallery::ImageLibrary, password_reset::PasswordResetStore, session::SessionStore},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every
/// field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Session store
    pub sessions: SessionStore,

    /// Password reset store
    pub resets: PasswordResetStore,

    /// Gallery images on disk
    pub images: ImageLibrary,

    /// Outbound email
    pub email: EmailService,
}

impl AppState {
    /// Creates application state, wiring the stores to `db`
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenGenerator::new(config.auth.token_bytes);

        Self {
            sessions: SessionStore::new(db.clone(), tokens),
            resets: PasswordResetStore::new(db.clone(), tokens, config.auth.reset_ttl),
            images: ImageLibrary::new(config.images_dir.clone()),
            email: EmailService::new(config.email.default_sender.clone(), mailer),
            db,
            config: Arc::new(config),
        }
    }
}

/// Picks the mailer for the configured environment
///
/// Without an SMTP host, emails are written to the log.
pub fn build_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>, EmailError> {
    match &config.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, port = smtp.port, "Sending email through SMTP");
            Ok(Arc::new(SmtpMailer::new(smtp)?))
        }
        None => {
            info!("SMTP_HOST not set, emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── POST /users                     # sign up
/// ├── GET  /users/me                  (signed in)
/// ├── POST /signin
/// ├── POST /signout
/// ├── POST /forgot-pw
/// ├── GET  /reset-pw?token=...        # form behind the emailed link
/// ├── POST /reset-pw
/// └── /galleries
///     ├── GET  /                      (signed in)
///     ├── POST /                      (signed in)
///     ├── GET  /:id
///     ├── POST /:id                   (owner)
///     ├── GET  /:id/edit              (owner)
///     ├── POST /:id/delete            (owner)
///     └── GET  /:id/images/:filename
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. Session resolution (`set_user`, every request)
/// 3. Sign-in guard (`require_user`, per route)
pub fn build_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/users", post(routes::users::signup))
        .route(
            "/users/me",
            get(routes::users::current_user).route_layer(from_fn(require_user)),
        )
        .route("/signin", post(routes::users::signin))
        .route("/signout", post(routes::users::signout))
        .route("/forgot-pw", post(routes::users::forgot_password))
        .route(
            "/reset-pw",
            get(routes::users::reset_password_form).post(routes::users::reset_password),
        );

    let gallery_routes = Router::new()
        .route(
            "/galleries",
            get(routes::galleries::index)
                .post(routes::galleries::create)
                .route_layer(from_fn(require_user)),
        )
        .route(
            "/galleries/:id",
            get(routes::galleries::show)
                .merge(post(routes::galleries::update).route_layer(from_fn(require_user))),
        )
        .route(
            "/galleries/:id/edit",
            get(routes::galleries::edit).route_layer(from_fn(require_user)),
        )
        .route(
            "/galleries/:id/delete",
            post(routes::galleries::delete).route_layer(from_fn(require_user)),
        )
        .route(
            "/galleries/:id/images/:filename",
            get(routes::galleries::image),
        );

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(user_routes)
        .merge(gallery_routes)
        .layer(from_fn_with_state(state.clone(), set_user))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapvault_shared::email::DEFAULT_SENDER;

    #[test]
    fn test_build_mailer_without_smtp() {
        let config = EmailConfig {
            default_sender: DEFAULT_SENDER.to_string(),
            smtp: None,
        };
        assert!(build_mailer(&config).is_ok());
    }
}
