use crate::error::ServerError;
use crate::state::ServerState;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use headers::authorization::Basic;
use headers::{Authorization, HeaderMapExt};
use std::sync::Arc;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Username of a request that passed Basic authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Request id stored in the request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// HTTP Basic authentication middleware
///
/// Verification runs on the blocking pool since password hashing is CPU-bound.
/// Rejected requests never reach the quota layer.
pub async fn basic_auth(
    State(state): State<Arc<ServerState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(Authorization(basic)) = request.headers().typed_get::<Authorization<Basic>>() else {
        return Err(ServerError::Authentication(
            "Basic credentials required".to_string(),
        ));
    };

    let username = basic.username().to_string();
    let password = basic.password().to_string();
    let credentials = state.credentials.clone();
    let user = username.clone();
    let verified =
        tokio::task::spawn_blocking(move || credentials.verify(&user, &password)).await?;

    if !verified {
        tracing::warn!(user = %username, "Rejected credentials");
        metrics::counter!("filegate_requests_rejected_total", "reason" => "unauthorized")
            .increment(1);
        return Err(ServerError::Authentication(
            "Invalid username or password".to_string(),
        ));
    }

    request.extensions_mut().insert(AuthenticatedUser(username));
    Ok(next.run(request).await)
}

/// Daily quota middleware
///
/// Requests without an [`AuthenticatedUser`] pass through unmetered.
pub async fn daily_quota(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(AuthenticatedUser(user)) = request.extensions().get::<AuthenticatedUser>().cloned()
    else {
        return Ok(next.run(request).await);
    };

    if !state.quota.try_admit(&user) {
        tracing::info!(user = %user, limit = state.quota.limit(), "Daily limit reached");
        metrics::counter!("filegate_requests_rejected_total", "reason" => "quota").increment(1);
        return Err(ServerError::RateLimitExceeded);
    }

    tracing::debug!(
        user = %user,
        remaining = state.quota.remaining(&user),
        "Request admitted"
    );
    metrics::counter!("filegate_requests_admitted_total").increment(1);
    Ok(next.run(request).await)
}

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    // Reuse a well-formed incoming id, otherwise generate one
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Logging middleware
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}
