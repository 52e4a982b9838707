//! Credentials attached to outgoing requests.

use std::sync::Arc;

/// Header carrying the bearer token on protected endpoints.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Header identifying the application on unauthenticated auth endpoints.
pub const APP_KEY_HEADER: &str = "Normcore-App-Key";

/// Anything that can supply a bearer access token.
pub trait Credential {
    fn access_token(&self) -> &str;
}

impl<C: Credential + ?Sized> Credential for &C {
    fn access_token(&self) -> &str {
        (**self).access_token()
    }
}

impl<C: Credential + ?Sized> Credential for Arc<C> {
    fn access_token(&self) -> &str {
        (**self).access_token()
    }
}

/// A credential that also knows which user it authenticates.
pub trait UserIdentity: Credential {
    fn user_id(&self) -> &str;
}

impl<C: UserIdentity + ?Sized> UserIdentity for &C {
    fn user_id(&self) -> &str {
        (**self).user_id()
    }
}

impl<C: UserIdentity + ?Sized> UserIdentity for Arc<C> {
    fn user_id(&self) -> &str {
        (**self).user_id()
    }
}

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuthentication {
    pub access_token: String,
    pub user_id: String,
}

impl UserAuthentication {
    pub fn new(access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: user_id.into(),
        }
    }
}

impl Credential for UserAuthentication {
    fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl UserIdentity for UserAuthentication {
    fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Result of the anonymous user flows.
///
/// Keep `user_id` and `secret` to authenticate as the same anonymous user
/// again later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousUserAuthentication {
    pub user_id: String,
    pub secret: String,
    pub authentication: UserAuthentication,
}

impl Credential for AnonymousUserAuthentication {
    fn access_token(&self) -> &str {
        self.authentication.access_token()
    }
}

impl UserIdentity for AnonymousUserAuthentication {
    fn user_id(&self) -> &str {
        &self.user_id
    }
}
