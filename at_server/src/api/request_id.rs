//! Request correlation middleware.
//!
//! Every request runs inside a `request` span carrying its id, method and
//! route template, so handler logs (including rejected tournament
//! operations) can be tied back to the call that produced them.

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Route label for requests that matched no route
const UNMATCHED_ROUTE: &str = "unmatched";

/// Caller's request ID, or a fresh UUID
fn get_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Route template the request matched, e.g. `/api/v1/sessions/{session_id}/result`
///
/// Templates keep the metric label set bounded no matter how many
/// tournaments and sessions exist.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Tag the request with an ID, log it and count it
///
/// Reuses the caller's `x-request-id` when present, echoes it on the
/// response and counts the request in `http_requests_total` by route
/// template.
///
/// # Example
///
/// ```no_run
/// use axum::{Router, routing::get, middleware};
/// use at_server::api::request_id::request_id_middleware;
///
/// # async fn example() {
/// let app: Router = Router::new()
///     .route("/formats", get(|| async { "[]" }))
///     .layer(middleware::from_fn(request_id_middleware));
/// # }
/// ```
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = get_or_generate_request_id(request.headers());
    let method = request.method().to_string();
    let route = route_label(&request);

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        route = %route,
    );
    tracing::debug!(parent: &span, uri = %request.uri(), "Request started");

    let mut response = next.run(request).instrument(span.clone()).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    let status = response.status();
    crate::metrics::http_requests_total(&method, &route, status.as_u16());
    tracing::info!(parent: &span, status = %status, "Request completed");

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, middleware, routing::post};
    use tower::ServiceExt;

    const ROUTE_HEADER: &str = "x-route";

    async fn echo_route(request: Request, next: Next) -> Response {
        let label = route_label(&request);
        let mut response = next.run(request).await;
        response
            .headers_mut()
            .insert(ROUTE_HEADER, HeaderValue::from_str(&label).unwrap());
        response
    }

    fn router() -> Router {
        Router::new()
            .route("/tournaments/{tournament_id}/generate", post(|| async { "ok" }))
            .layer(middleware::from_fn(echo_route))
    }

    #[test]
    fn test_existing_request_id_is_reused() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("test-id-123"));

        assert_eq!(get_or_generate_request_id(&headers), "test-id-123");
    }

    #[test]
    fn test_missing_request_id_is_generated() {
        let request_id = get_or_generate_request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&request_id).is_ok());
    }

    #[tokio::test]
    async fn test_route_label_uses_template() {
        let request = Request::builder()
            .method("POST")
            .uri("/tournaments/42/generate")
            .body(Body::empty())
            .unwrap();

        let response = router().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[ROUTE_HEADER],
            "/tournaments/{tournament_id}/generate"
        );
    }

    #[test]
    fn test_route_label_without_match() {
        let request = Request::builder()
            .uri("/tournaments/42/unknown")
            .body(Body::empty())
            .unwrap();

        assert_eq!(route_label(&request), UNMATCHED_ROUTE);
    }
}
