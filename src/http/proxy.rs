//! Request proxy pipeline.
//!
//! # Responsibilities
//! - Orchestrate, per inbound request: route match, HTTP/1.0 gate,
//!   authentication callback, origin selection, body-size gate, admission
//!   control, outbound build, forward, response relay
//! - Relay event-stream responses without buffering
//! - Record timing and outcome on every exit path
//!
//! # Design Decisions
//! - No retry across origins for a single inbound request: a failed
//!   forward is reported as a gateway failure, not silently retried
//! - The concurrency permit is an RAII guard; for streamed responses it
//!   rides inside the relay stream and is released when the stream ends

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderName, HeaderValue, Method, Request, Response, StatusCode, Version};
use axum::response::IntoResponse;
use futures_util::StreamExt;
use uuid::Uuid;

use crate::auth::{AuthRequest, AuthVerdict};
use crate::balance::origin::AdmissionError;
use crate::balance::selector::select_origin;
use crate::http::error::GatewayError;
use crate::http::headers::{append_forwarded_for, encode_auth_context, X_REQUEST_ID};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Labels resolved along the pipeline, for metrics and logs.
#[derive(Default)]
struct ProxyContext {
    endpoint: Option<String>,
    origin: Option<String>,
}

/// Main proxy handler: every non-static path lands here.
pub async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> axum::response::Response {
    // OPTIONS is answered generically, outside the pipeline.
    if request.method() == Method::OPTIONS {
        return preflight_response();
    }

    let started = Instant::now();
    let mut ctx = ProxyContext::default();

    let response = match forward(&state, addr, request, &mut ctx).await {
        Ok(response) => response,
        Err(err) => {
            if matches!(err, GatewayError::Internal) {
                tracing::error!(error = %err, "Internal error in proxy pipeline");
            }
            err.into_response()
        }
    };

    metrics::record_request(
        ctx.endpoint.as_deref().unwrap_or("none"),
        ctx.origin.as_deref().unwrap_or("none"),
        response.status().as_u16(),
        started,
    );
    response
}

/// Permissive CORS preflight answer, regardless of endpoint configuration.
pub fn preflight_response() -> axum::response::Response {
    (
        StatusCode::NO_CONTENT,
        [
            ("access-control-allow-origin", "*"),
            (
                "access-control-allow-methods",
                "GET, POST, PUT, PATCH, DELETE, OPTIONS",
            ),
            ("access-control-allow-headers", "*"),
            ("access-control-max-age", "86400"),
        ],
    )
        .into_response()
}

async fn forward(
    state: &AppState,
    client_addr: SocketAddr,
    request: Request<Body>,
    ctx: &mut ProxyContext,
) -> Result<axum::response::Response, GatewayError> {
    let snapshot = state.snapshot.load_full();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let version = request.version();

    // 1. Match route.
    let Some(route) = snapshot.routes.match_route(&method, &path) else {
        tracing::warn!(method = %method, path = %path, "No route matched");
        return Err(GatewayError::NoRoute);
    };

    let endpoint = snapshot
        .endpoints
        .get(&route.endpoint_id)
        .ok_or(GatewayError::Internal)?;
    ctx.endpoint = Some(endpoint.id.clone());

    // 2. HTTP/1.0 gate.
    if endpoint.block_http10 && version == Version::HTTP_10 {
        tracing::debug!(endpoint = %endpoint.id, "Rejecting HTTP/1.0 request");
        return Err(GatewayError::Http10Blocked);
    }

    // 3. Authentication callback, at most once per request.
    let mut auth_context = None;
    if route.auth_required {
        let Some(authenticator) = &state.authenticator else {
            tracing::warn!(endpoint = %endpoint.id, path = %path, "Auth required but no authenticator configured");
            return Err(GatewayError::AuthUnavailable);
        };
        let verdict = authenticator(AuthRequest {
            method: method.clone(),
            path: path.clone(),
            headers: request.headers().clone(),
        })
        .await;
        match verdict {
            AuthVerdict::Allowed { context } => auth_context = context,
            AuthVerdict::Denied { message } => {
                tracing::warn!(endpoint = %endpoint.id, path = %path, "Authentication denied");
                return Err(GatewayError::AuthDenied { message });
            }
        }
    }

    // 4. Select an origin.
    let endpoint_state = snapshot
        .registry
        .endpoint(&endpoint.id)
        .ok_or(GatewayError::Internal)?;
    let candidates = snapshot.registry.origins_for(&endpoint.origins);
    let Some(origin) = select_origin(endpoint.policy, &endpoint_state, &candidates) else {
        tracing::warn!(endpoint = %endpoint.id, "No healthy origin available");
        endpoint_state.record_outcome(false);
        return Err(GatewayError::NoOrigin);
    };
    ctx.origin = Some(origin.id.clone());

    // 5. Body-size gate, enforced while buffering.
    let (parts, body) = request.into_parts();
    let body_bytes = match read_body(body, endpoint.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            match err {
                GatewayError::BodyTooLarge => tracing::warn!(
                    endpoint = %endpoint.id,
                    limit = endpoint.max_body_bytes,
                    "Request body exceeds the endpoint limit"
                ),
                _ => tracing::warn!(
                    endpoint = %endpoint.id,
                    "Failed to read request body"
                ),
            }
            return Err(err);
        }
    };

    // 6. Admission control: fast-reject gate, then bounded permit wait.
    let timeout = Duration::from_millis(endpoint.timeout_ms);
    let permit = match origin.admit(timeout).await {
        Ok(permit) => permit,
        Err(AdmissionError::RateLimited) => {
            tracing::warn!(origin = %origin.id, "Rate-limit threshold reached, refusing request");
            metrics::record_rate_limited(&endpoint.id);
            endpoint_state.record_outcome(false);
            return Err(GatewayError::RateLimited);
        }
        Err(AdmissionError::Saturated) => {
            tracing::warn!(origin = %origin.id, "Timed out waiting for origin capacity");
            endpoint_state.record_outcome(false);
            origin.record_outcome(false);
            return Err(GatewayError::Upstream("origin capacity exhausted".into()));
        }
    };

    // 7. Build the outbound request.
    let rewritten = snapshot
        .rewrites
        .get(&endpoint.id)
        .map(|engine| engine.rewrite(&method, &path))
        .unwrap_or_else(|| path.clone());
    let mut url = format!("{}://{}{}", origin.scheme, origin.authority, rewritten);
    if let Some(query) = &query {
        url.push('?');
        url.push_str(query);
    }

    let filter = snapshot
        .filters
        .get(&endpoint.id)
        .ok_or(GatewayError::Internal)?;
    let mut out_headers = filter.filtered(&parts.headers);
    append_forwarded_for(&mut out_headers, client_addr.ip());

    let request_id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        out_headers.insert(X_REQUEST_ID, value);
    }

    if let (Some(header_name), Some(context)) = (&endpoint.auth_context_header, &auth_context) {
        match (
            HeaderName::from_bytes(header_name.as_bytes()),
            encode_auth_context(context),
        ) {
            (Ok(name), Some(value)) => {
                out_headers.insert(name, value);
            }
            _ => {
                tracing::warn!(endpoint = %endpoint.id, header = %header_name, "Could not encode auth context header");
            }
        }
    }

    // 8. Body is forwarded as-is; default the content type for opaque bodies.
    if !body_bytes.is_empty() && !out_headers.contains_key(header::CONTENT_TYPE) {
        out_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
    }

    if endpoint.log_requests {
        tracing::debug!(
            request_id = %request_id,
            endpoint = %endpoint.id,
            origin = %origin.id,
            method = %method,
            path = %path,
            target = %rewritten,
            "Forwarding request"
        );
    }

    // 9. Send to origin. A failure here is a gateway failure; no failover.
    let outbound = state
        .client
        .request(method, &url)
        .headers(out_headers)
        .timeout(timeout)
        .body(body_bytes)
        .send()
        .await;

    let upstream = match outbound {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %request_id, origin = %origin.id, error = %e, "Origin request failed");
            endpoint_state.record_outcome(false);
            origin.record_outcome(false);
            return Err(GatewayError::Upstream(e.to_string()));
        }
    };

    // 10. Relay status and filtered headers; stream event responses.
    let status = upstream.status();
    let relay_headers = filter.filtered(upstream.headers());
    let is_event_stream = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false);

    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(relay_headers);
    }

    if is_event_stream {
        endpoint_state.record_outcome(true);
        origin.record_outcome(true);
        // The permit moves into the relay stream: it is released when the
        // origin ends the stream or the client disconnects. Once the origin
        // signals end-of-stream a final terminating event is sent so the
        // client sees an explicit end marker.
        let relay = upstream
            .bytes_stream()
            .map(move |chunk| {
                let _held = &permit;
                chunk
            })
            .chain(futures_util::stream::once(async {
                Ok::<_, reqwest::Error>(Bytes::from_static(b"data: \n\n"))
            }));
        builder
            .body(Body::from_stream(relay))
            .map_err(|_| GatewayError::Internal)
    } else {
        match upstream.bytes().await {
            Ok(body) => {
                endpoint_state.record_outcome(true);
                origin.record_outcome(true);
                builder
                    .body(Body::from(body))
                    .map_err(|_| GatewayError::Internal)
            }
            Err(e) => {
                tracing::warn!(request_id = %request_id, origin = %origin.id, error = %e, "No response body received");
                endpoint_state.record_outcome(false);
                origin.record_outcome(false);
                Err(GatewayError::Upstream(e.to_string()))
            }
        }
    }
}

/// Buffer the inbound body, enforcing the endpoint's size cap.
///
/// A body over the cap and a body that fails to read are distinct
/// failures; only the former means the client sent too much.
async fn read_body(body: Body, limit: usize) -> Result<Vec<u8>, GatewayError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|_| GatewayError::BodyRead)?;
        if buf.len() + chunk.len() > limit {
            return Err(GatewayError::BodyTooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn body_within_limit_is_buffered() {
        let body = Body::from(vec![7u8; 16]);
        let buf = read_body(body, 16).await.unwrap();
        assert_eq!(buf.len(), 16);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let body = Body::from(vec![0u8; 64]);
        let err = read_body(body, 16).await.unwrap_err();
        assert!(matches!(err, GatewayError::BodyTooLarge));
    }

    #[tokio::test]
    async fn read_failure_is_not_reported_as_oversized() {
        let stream = futures_util::stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
        ]);
        let body = Body::from_stream(stream);
        let err = read_body(body, 1024).await.unwrap_err();
        assert!(matches!(err, GatewayError::BodyRead));
    }
}
