//! Gateway error taxonomy.
//!
//! # Responsibilities
//! - Map every pipeline failure mode to a status code
//! - Render structured JSON error bodies
//!
//! # Design Decisions
//! - Client, auth, and admission errors never contact an origin
//! - Upstream failures surface a generic safe message; detail goes to logs
//! - Internal errors return a bare 500 with no body detail

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Every failure mode the proxy pipeline can produce.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no configured route matches the request")]
    NoRoute,

    #[error("request body exceeds the endpoint limit")]
    BodyTooLarge,

    #[error("request body could not be read")]
    BodyRead,

    #[error("HTTP/1.0 requests are not accepted by this endpoint")]
    Http10Blocked,

    #[error("authentication required but no authenticator is configured")]
    AuthUnavailable,

    #[error("authentication denied")]
    AuthDenied { message: Option<String> },

    #[error("no healthy origin available")]
    NoOrigin,

    #[error("origin rate limit exceeded")]
    RateLimited,

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("internal gateway error")]
    Internal,
}

impl GatewayError {
    /// Stable machine-readable error kind for the JSON body.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NoRoute => "no_route",
            GatewayError::BodyTooLarge => "body_too_large",
            GatewayError::BodyRead => "body_read",
            GatewayError::Http10Blocked => "http_version_blocked",
            GatewayError::AuthUnavailable => "auth_unavailable",
            GatewayError::AuthDenied { .. } => "auth_denied",
            GatewayError::NoOrigin => "no_origin",
            GatewayError::RateLimited => "rate_limited",
            GatewayError::Upstream(_) => "upstream_unavailable",
            GatewayError::Internal => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoRoute | GatewayError::BodyTooLarge | GatewayError::BodyRead => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Http10Blocked => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
            GatewayError::AuthUnavailable | GatewayError::AuthDenied { .. } => {
                StatusCode::UNAUTHORIZED
            }
            GatewayError::NoOrigin | GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients. Upstream detail never leaks.
    fn client_message(&self) -> Option<String> {
        match self {
            GatewayError::NoRoute => Some("no route matches the request".into()),
            GatewayError::BodyTooLarge => {
                Some("request body exceeds the configured limit".into())
            }
            GatewayError::BodyRead => Some("the request body could not be read".into()),
            GatewayError::Http10Blocked => {
                Some("HTTP/1.0 is not accepted by this endpoint".into())
            }
            GatewayError::AuthUnavailable => Some("authentication is not available".into()),
            GatewayError::AuthDenied { message } => message.clone(),
            GatewayError::NoOrigin => Some("no healthy origin available".into()),
            GatewayError::RateLimited => Some("too many requests in flight".into()),
            GatewayError::Upstream(_) => Some("the origin did not produce a response".into()),
            GatewayError::Internal => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal errors are logged in full by the handler; the client
        // gets a bare 500.
        if matches!(self, GatewayError::Internal) {
            return status.into_response();
        }

        let body = match self.client_message() {
            Some(message) => {
                serde_json::json!({ "error": self.kind(), "message": message })
            }
            None => serde_json::json!({ "error": self.kind() }),
        };

        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(GatewayError::NoRoute.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::BodyTooLarge.status(), StatusCode::BAD_REQUEST);
        assert_eq!(GatewayError::BodyRead.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::Http10Blocked.status(),
            StatusCode::HTTP_VERSION_NOT_SUPPORTED
        );
        assert_eq!(
            GatewayError::AuthUnavailable.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::AuthDenied { message: None }.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(GatewayError::NoOrigin.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            GatewayError::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            GatewayError::Upstream("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_body_is_structured_json() {
        let response = GatewayError::NoRoute.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn denial_message_flows_to_body() {
        let err = GatewayError::AuthDenied {
            message: Some("token expired".into()),
        };
        assert_eq!(err.client_message().as_deref(), Some("token expired"));
    }

    #[test]
    fn upstream_detail_never_reaches_client() {
        let err = GatewayError::Upstream("connect ECONNREFUSED 10.0.0.7".into());
        let msg = err.client_message().unwrap();
        assert!(!msg.contains("10.0.0.7"));
    }
}
