//! Bearer-token checks for admin and member routes.

use axum::http::HeaderMap;
use slab_shared::accounts::Member;

use crate::api::AppState;
use crate::error::ServerError;

/// Display name used for board posts made without a member session.
pub const GUEST_AUTHOR: &str = "Guest";
/// Display name used for board posts made with an admin session.
pub const ADMIN_AUTHOR: &str = "Slab City Team";

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Who is calling a member-gated route.
#[derive(Debug, Clone)]
pub enum Caller {
    Admin,
    Member(Member),
    Guest,
}

impl Caller {
    pub fn author(&self) -> &str {
        match self {
            Caller::Admin => ADMIN_AUTHOR,
            Caller::Member(member) => &member.username,
            Caller::Guest => GUEST_AUTHOR,
        }
    }
}

/// Require a live admin session.  Returns the session token.
pub async fn require_admin(headers: &HeaderMap, state: &AppState) -> Result<String, ServerError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ServerError::Unauthorized("admin session required".into()))?;
    let valid = state.db.lock().await.admin_session_valid(token)?;
    if !valid {
        return Err(ServerError::Unauthorized("admin session expired or unknown".into()));
    }
    Ok(token.to_string())
}

/// Resolve the caller of a community write.  Admin sessions pass too.  A
/// missing or dead token is only acceptable when member auth is switched
/// off.
pub async fn require_member(headers: &HeaderMap, state: &AppState) -> Result<Caller, ServerError> {
    let caller = match bearer_token(headers) {
        Some(token) => {
            let db = state.db.lock().await;
            if let Some(member) = db.member_for_session(token)? {
                Caller::Member(member)
            } else if db.admin_session_valid(token)? {
                Caller::Admin
            } else {
                Caller::Guest
            }
        }
        None => Caller::Guest,
    };

    if matches!(caller, Caller::Guest) && state.config.require_member_auth {
        return Err(ServerError::Unauthorized("sign in to continue".into()));
    }
    Ok(caller)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_needs_the_prefix() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert("authorization", "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
