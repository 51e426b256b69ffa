//! Request authorization
//!
//! Every route requires `Authorization: authkey <secret>`. The comparison is
//! constant-time and exact; any failure yields the same response.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq;

use super::{ApiError, AppState};

/// Compare a presented header value to the expected one in constant time
pub fn is_authorized(provided: &str, expected: &str) -> bool {
    constant_time_eq(provided.as_bytes(), expected.as_bytes())
}

/// Reject requests without the exact channel authorization header
pub async fn require_authkey(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = state.config.authorization_header();
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(value) if is_authorized(value, &expected) => next.run(request).await,
        _ => {
            tracing::debug!(
                method = %request.method(),
                uri = %request.uri(),
                "Rejected request with invalid authorization"
            );
            ApiError::Unauthorized.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_authorized_exact_match_only() {
        assert!(is_authorized("authkey secret", "authkey secret"));
        assert!(!is_authorized("authkey secre", "authkey secret"));
        assert!(!is_authorized("authkey secret ", "authkey secret"));
        assert!(!is_authorized("Authkey secret", "authkey secret"));
        assert!(!is_authorized("", "authkey secret"));
    }
}
