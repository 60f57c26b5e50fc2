//! Terminal rejection responses.

use axum::body::Body;
use axum::http::{header::HeaderValue, Response, StatusCode};
use serde::Serialize;

use crate::auth::AuthRejection;
use crate::ratelimit::RateDecision;

/// JSON body attached to every policy rejection.
#[derive(Debug, Serialize)]
pub struct RejectionBody {
    pub error: String,
    pub code: &'static str,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

fn json_response(status: StatusCode, body: &RejectionBody) -> Response<Body> {
    // Serializing a struct of strings and ints cannot fail.
    let payload = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert("content-type", HeaderValue::from_static("application/json"));
    response
}

/// 401 for every auth rejection; the body's `code` keeps the reasons
/// distinguishable.
pub fn auth_rejected(rejection: &AuthRejection) -> Response<Body> {
    json_response(
        StatusCode::UNAUTHORIZED,
        &RejectionBody {
            error: rejection.message().to_string(),
            code: rejection.code(),
            retry_after: None,
        },
    )
}

/// 429 with `Retry-After` for a limiter rejection.
pub fn rate_limited(decision: &RateDecision) -> Response<Body> {
    let mut response = json_response(
        StatusCode::TOO_MANY_REQUESTS,
        &RejectionBody {
            error: "rate limit exceeded".to_string(),
            code: "RATE_LIMITED",
            retry_after: decision.retry_after_secs,
        },
    );
    if let Some(secs) = decision.retry_after_secs {
        if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
            response.headers_mut().insert("retry-after", value);
        }
    }
    response
}
