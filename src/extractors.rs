use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::auth::session;
use crate::db::models::UserId;
use crate::error::AppError;
use crate::state::AppState;

/// Who is making the request. Never rejects: anonymous requests carry
/// `user_id: None`, and resolvers decide what that means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<UserId>,
    /// Raw session cookie value, kept so logout can delete the row.
    pub session_token: Option<String>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            session_token: None,
        }
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_session_token(parts, &state.config.auth.cookie_name) else {
            return Ok(Viewer::anonymous());
        };

        let user_id = session::lookup_session(&state.db, token)?;
        if user_id.is_none() {
            tracing::debug!("ignoring unknown or expired session cookie");
        }

        Ok(Viewer {
            user_id,
            session_token: Some(token.to_string()),
        })
    }
}

fn extract_session_token<'a>(parts: &'a Parts, cookie_name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == cookie_name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}
