/// Session cookie middleware
///
/// [`set_user`] runs on every request: it looks up the session cookie in the
/// session store and attaches the signed-in user to the request. Requests
/// without a valid cookie continue anonymously. [`require_user`] guards the
/// routes that need a signed-in user and sends everyone else to the sign-in
/// page.
///
/// # Cookie
///
/// ```text
/// session=<token>; Path=/; HttpOnly; SameSite=Lax[; Secure]
/// ```

use crate::{app::AppState, routes::redirect};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use snapvault_shared::auth::current_user;
use tracing::{debug, warn};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Builds the cookie carrying a freshly issued session token
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Expires the session cookie in the browser
pub fn remove_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Resolves the session cookie and attaches the user to the request
///
/// A storage failure is logged and the request is served anonymously
/// rather than failed.
pub async fn set_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        match state.sessions.user(cookie.value()).await {
            Ok(user) => {
                debug!(user_id = %user.id, "Request authenticated by session");
                current_user::attach(req.extensions_mut(), user);
            }
            Err(e) if e.is_rejection() => {
                debug!("Session cookie does not match any session");
            }
            Err(e) => {
                warn!(error = %e, "Session lookup failed, continuing anonymously");
            }
        }
    }

    next.run(req).await
}

/// Redirects anonymous requests to `/signin`
pub async fn require_user(req: Request, next: Next) -> Response {
    if current_user::resolve(req.extensions()).is_none() {
        return redirect("/signin");
    }

    next.run(req).await
}
