// CORS configuration

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Restrict cross-origin access to the configured origins. A literal
/// `*` entry opts into a fully permissive layer.
pub fn apply_cors(router: Router, allowed_origins: &[String]) -> Router {
    let layer = if allowed_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    router.layer(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::routing::get;
    use tower::ServiceExt;

    async fn allow_origin_header(allowed: &[String], origin: &str) -> Option<String> {
        let app = apply_cors(Router::new().route("/", get(|| async { "ok" })), allowed);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_configured_origin_is_allowed() {
        let allowed = vec!["http://localhost:3000".to_string()];
        assert_eq!(
            allow_origin_header(&allowed, "http://localhost:3000").await,
            Some("http://localhost:3000".to_string())
        );
    }

    #[tokio::test]
    async fn test_unlisted_origin_is_not_allowed() {
        let allowed = vec!["http://localhost:3000".to_string()];
        assert_eq!(
            allow_origin_header(&allowed, "https://evil.example").await,
            None
        );
    }

    #[tokio::test]
    async fn test_wildcard_allows_any_origin() {
        let allowed = vec!["*".to_string()];
        assert_eq!(
            allow_origin_header(&allowed, "https://anywhere.example").await,
            Some("*".to_string())
        );
    }
}
