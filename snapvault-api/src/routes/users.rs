/// Account endpoints
///
/// - `POST /users` - Sign up and sign in
/// - `GET /users/me` - Show the signed-in user
/// - `POST /signin` - Sign in
/// - `POST /signout` - Sign out
/// - `POST /forgot-pw` - Email a password reset link
/// - `GET /reset-pw?token=...` - Form behind the emailed link
/// - `POST /reset-pw` - Redeem the link and set a new password
///
/// Forms are `application/x-www-form-urlencoded`. Every successful sign-in
/// path (sign up, sign in, password reset) issues a new session, replacing
/// any session the user had before.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::session::{remove_session_cookie, session_cookie, SESSION_COOKIE},
    routes::redirect,
};
use axum::{
    extract::{Query, State},
    response::{Html, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use snapvault_shared::{
    auth::{current_user::CurrentUser, password},
    error::TokenError,
    models::user::{normalize_email, CreateUser, User},
};
use tracing::{debug, error, info};
use uuid::Uuid;
use validator::Validate;

/// Answer to every forgot-password request
pub const CHECK_YOUR_EMAIL: &str =
    "If an account exists for that address, we have sent it a link to reset your password.";

/// Sign-in failure message, identical for unknown email and wrong password
pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";

/// Sign-up and sign-in form
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsForm {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Forgot-password form
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordForm {
    /// Address of the account to reset
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Reset-password form
///
/// Both fields come from the same POST body: the token from a hidden input
/// and the password typed by the user.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    /// Raw reset token from the emailed link
    #[serde(default)]
    pub token: String,

    /// New password
    #[serde(default)]
    pub password: String,
}

/// Query string of the emailed reset link
#[derive(Debug, Deserialize)]
pub struct ResetLinkQuery {
    #[serde(default)]
    pub token: String,
}

fn check_password(password: &str) -> ApiResult<()> {
    password::validate_password_strength(password)
        .map_err(|e| ApiError::invalid_field("password", e))
}

/// Issues a session for `user_id` and sets its cookie
async fn sign_in(state: &AppState, jar: CookieJar, user_id: Uuid) -> ApiResult<CookieJar> {
    let session = state.sessions.upsert(user_id).await?;
    Ok(jar.add(session_cookie(session.token, state.config.auth.cookie_secure)))
}

/// Creates an account and signs it in
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Invalid email or weak password
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> ApiResult<(CookieJar, Response)> {
    form.validate()?;
    check_password(&form.password)?;

    let password_hash = password::hash_password(&form.password)?;
    let user = User::create(
        &state.db,
        CreateUser {
            email: form.email,
            password_hash,
        },
    )
    .await?;

    let jar = sign_in(&state, jar, user.id).await?;
    info!(user_id = %user.id, "User signed up");

    Ok((jar, redirect("/users/me")))
}

/// Signs in with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (same message)
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> ApiResult<(CookieJar, Response)> {
    let user = User::authenticate(&state.db, &form.email, &form.password)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let jar = sign_in(&state, jar, user.id).await?;
    info!(user_id = %user.id, "User signed in");

    Ok((jar, redirect("/users/me")))
}

/// Ends the session named by the cookie
///
/// Succeeds whether or not the cookie names a live session.
pub async fn signout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Response)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.delete(cookie.value()).await?;
    }

    Ok((remove_session_cookie(jar), redirect("/signin")))
}

/// Shows the signed-in user
pub async fn current_user(CurrentUser(user): CurrentUser) -> String {
    format!("Current user: {}", user.email)
}

/// Emails a password reset link
///
/// The response is the same whether or not the address belongs to an
/// account, and whether or not the email could be delivered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> ApiResult<String> {
    form.validate()?;

    match state.resets.create(&form.email).await {
        Ok(reset) => {
            let reset_url = state.config.reset_url(&reset.token);
            if let Err(e) = state
                .email
                .forgot_password(&normalize_email(&form.email), &reset_url)
                .await
            {
                error!(user_id = %reset.user_id, error = %e, "Failed to send password reset email");
            }
        }
        Err(TokenError::NotFound(_)) => {
            debug!("Password reset requested for unknown email");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(CHECK_YOUR_EMAIL.to_string())
}

/// Renders the form that posts a new password with the token
pub async fn reset_password_form(Query(query): Query<ResetLinkQuery>) -> Html<String> {
    Html(format!(
        r#"<form action="/reset-pw" method="post">
  <input type="hidden" name="token" value="{}">
  <label for="password">New password</label>
  <input type="password" id="password" name="password" required>
  <button type="submit">Update password</button>
</form>"#,
        escape_html(&query.token)
    ))
}

/// Sets a new password with a reset token and signs the user in
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown, used, superseded or expired token, or the
///   account is gone (same message)
/// - `422 Unprocessable Entity`: Weak password
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ResetPasswordForm>,
) -> ApiResult<(CookieJar, Response)> {
    // The token is consumed last, so a rejected password leaves the link usable
    check_password(&form.password)?;
    let password_hash = password::hash_password(&form.password)?;

    // Consume and update commit together; only an expired token stays deleted on failure
    let mut tx = state.db.begin().await?;
    let user = match state.resets.consume_with(&mut *tx, &form.token).await {
        Ok(user) => user,
        Err(e @ TokenError::Expired(_)) => {
            tx.commit().await?;
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    if !User::update_password(&mut *tx, user.id, &password_hash).await? {
        return Err(TokenError::NotFound("user").into());
    }
    tx.commit().await?;

    let jar = sign_in(&state, jar, user.id).await?;
    info!(user_id = %user.id, "Password reset");

    Ok((jar, redirect("/users/me")))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
