//! Authentication callback contract.
//!
//! The gateway does not implement authentication itself. The embedding
//! application supplies a callback which is invoked at most once per
//! request whose matched route requires authentication; the gateway only
//! acts on the verdict.

use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use futures_util::future::BoxFuture;

/// The request view handed to the authentication callback.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
}

/// Verdict produced by the authentication callback. Consumed once.
#[derive(Debug, Clone)]
pub enum AuthVerdict {
    /// Request may proceed; `context` is forwarded to the origin as a
    /// header when the endpoint configures one.
    Allowed { context: Option<serde_json::Value> },
    /// Request is rejected with 401 and the optional message.
    Denied { message: Option<String> },
}

/// Externally supplied authentication callback.
pub type Authenticator =
    Arc<dyn Fn(AuthRequest) -> BoxFuture<'static, AuthVerdict> + Send + Sync>;

/// Wrap an async closure as an [`Authenticator`].
pub fn authenticator_fn<F, Fut>(f: F) -> Authenticator
where
    F: Fn(AuthRequest) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = AuthVerdict> + Send + 'static,
{
    Arc::new(move |request| Box::pin(f(request)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn callback_receives_request_view() {
        let auth = authenticator_fn(|request: AuthRequest| async move {
            if request.headers.contains_key("authorization") {
                AuthVerdict::Allowed {
                    context: Some(serde_json::json!({ "path": request.path })),
                }
            } else {
                AuthVerdict::Denied {
                    message: Some("missing credentials".into()),
                }
            }
        });

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer t".parse().unwrap());
        let verdict = auth(AuthRequest {
            method: Method::GET,
            path: "/private".into(),
            headers,
        })
        .await;
        assert!(matches!(verdict, AuthVerdict::Allowed { .. }));

        let verdict = auth(AuthRequest {
            method: Method::GET,
            path: "/private".into(),
            headers: HeaderMap::new(),
        })
        .await;
        match verdict {
            AuthVerdict::Denied { message } => {
                assert_eq!(message.as_deref(), Some("missing credentials"))
            }
            _ => panic!("expected denial"),
        }
    }
}
