use std::sync::Arc;

use crate::client::transport::GraphQLError;

/// Where the application sends the user. Injected so the client never
/// reaches for a global router.
pub trait Navigator: Send + Sync {
    fn replace(&self, route: &str);
}

pub const LOGIN_ROUTE: &str = "/login";

/// Sends the user to the login view whenever a response carries an
/// authorization error, whatever operation produced it.
#[derive(Clone)]
pub struct AuthErrorInterceptor {
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl AuthErrorInterceptor {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self::with_route(navigator, LOGIN_ROUTE)
    }

    pub fn with_route(navigator: Arc<dyn Navigator>, login_route: impl Into<String>) -> Self {
        Self {
            navigator,
            login_route: login_route.into(),
        }
    }

    /// Returns true when it redirected.
    pub fn inspect(&self, errors: &[GraphQLError]) -> bool {
        if !errors.iter().any(GraphQLError::is_unauthorized) {
            return false;
        }
        tracing::debug!(route = %self.login_route, "authorization error, redirecting");
        self.navigator.replace(&self.login_route);
        true
    }
}
