use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Identifier attached to each request by [`logging_middleware`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Logging middleware for request/response tracking
///
/// Reuses an incoming `x-request-id` when present, otherwise mints one, and
/// echoes it on the response.
pub async fn logging_middleware(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request_id(&request);

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    info!(
        target: "slowdown::middleware",
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Incoming request"
    );

    let mut response = next.run(request).await;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(
            target: "slowdown::middleware",
            method = %method,
            uri = %uri,
            request_id = %request_id,
            "Request rejected by rate limit"
        );
    } else {
        info!(
            target: "slowdown::middleware",
            method = %method,
            uri = %uri,
            status = %status,
            request_id = %request_id,
            "Request completed"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }

    response
}

fn request_id(request: &Request) -> String {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
