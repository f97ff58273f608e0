//! Generalized from the teacher's `request_id_middleware`: every inbound
//! request gets a correlation id, propagated through `tracing` spans and
//! returned on the response so callers can correlate logs. Ids use this
//! service's own `req_`-prefixed generator rather than a bare UUID, matching
//! component A (identifier generator) rather than reaching for `uuid`.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            auth_crypto::generate_id("req", 16).unwrap_or_else(|_| "req_unknown".to_string())
        });

    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}
