use crate::extractors::RejectionType;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use semver::Version;
use service::config::ApiVersion;

pub(crate) struct CompareApiVersion(pub Version);

// Enforces the x-version header on JSON API endpoints. Endpoints reached via
// browser redirect (OAuth, email links) skip this extractor because redirects
// cannot set custom headers.
impl<S> FromRequestParts<S> for CompareApiVersion
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(ApiVersion::field_name())
            .and_then(|value| value.to_str().ok())
            .ok_or((
                StatusCode::BAD_REQUEST,
                format!("Missing {} header", ApiVersion::field_name()),
            ))?;

        if !ApiVersion::is_valid(header_value) {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Unsupported API version: {header_value}"),
            ));
        }

        let version = Version::parse(header_value).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("Unparseable API version: {header_value}"),
            )
        })?;

        Ok(CompareApiVersion(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn versioned() -> &'static str {
        "ok"
    }

    async fn handler(CompareApiVersion(_v): CompareApiVersion) -> &'static str {
        versioned().await
    }

    #[tokio::test]
    async fn test_missing_version_header_is_rejected() {
        let app = Router::new().route("/t", get(handler));
        let response = app
            .oneshot(Request::builder().uri("/t").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_supported_version_header_is_accepted() {
        let app = Router::new().route("/t", get(handler));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/t")
                    .header(ApiVersion::field_name(), ApiVersion::default_version())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_version_header_is_rejected() {
        let app = Router::new().route("/t", get(handler));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/t")
                    .header(ApiVersion::field_name(), "0.0.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
