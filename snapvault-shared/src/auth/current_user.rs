/// Request-scoped current user
///
/// The session middleware resolves the session cookie to a [`User`] and
/// attaches it to the request extensions. Handlers read it back with the
/// [`CurrentUser`] extractor (or `Option<CurrentUser>` for pages that also
/// serve anonymous visitors).
///
/// Request extensions are keyed by type. The user is stored inside the
/// `CurrentUser` newtype, so a bare `User` or any other value inserted by a
/// different layer is never mistaken for the authenticated user.
///
/// # Example
///
/// ```
/// use snapvault_shared::auth::current_user::CurrentUser;
///
/// async fn me(CurrentUser(user): CurrentUser) -> String {
///     format!("Current user: {}", user.email)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, Extensions, StatusCode},
};

use crate::models::user::User;

/// Authenticated user of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Borrows the user
    pub fn user(&self) -> &User {
        &self.0
    }

    /// Takes the user out
    pub fn into_inner(self) -> User {
        self.0
    }
}

/// Attaches `user` to the request scope, replacing any earlier user
pub fn attach(extensions: &mut Extensions, user: User) {
    extensions.insert(CurrentUser(user));
}

/// Returns the user attached to the request scope, if any
///
/// `None` is the normal outcome for anonymous requests.
pub fn resolve(extensions: &Extensions) -> Option<&User> {
    extensions.get::<CurrentUser>().map(CurrentUser::user)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "Sign in required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_returns_attached_user() {
        let user = sample_user("a@example.com");
        let mut extensions = Extensions::new();

        attach(&mut extensions, user.clone());

        assert_eq!(resolve(&extensions), Some(&user));
    }

    #[test]
    fn test_resolve_anonymous() {
        let extensions = Extensions::new();
        assert!(resolve(&extensions).is_none());
    }

    #[test]
    fn test_foreign_values_are_ignored() {
        let mut extensions = Extensions::new();

        // Another layer storing a bare user or an unrelated marker
        extensions.insert(sample_user("intruder@example.com"));
        extensions.insert("user");
        extensions.insert(String::from("user"));

        assert!(resolve(&extensions).is_none());
    }

    #[test]
    fn test_attach_replaces_previous_user() {
        let first = sample_user("first@example.com");
        let second = sample_user("second@example.com");
        let mut extensions = Extensions::new();

        attach(&mut extensions, first);
        attach(&mut extensions, second.clone());

        assert_eq!(resolve(&extensions), Some(&second));
    }

    #[tokio::test]
    async fn test_extractor() {
        let user = sample_user("me@example.com");
        let mut req = Request::new(());
        attach(req.extensions_mut(), user.clone());
        let (mut parts, _) = req.into_parts();

        let CurrentUser(extracted) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(extracted, user);
    }

    #[tokio::test]
    async fn test_extractor_rejects_anonymous() {
        let (mut parts, _) = Request::new(()).into_parts();

        let rejection = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(rejection.0, StatusCode::UNAUTHORIZED);
    }
}
