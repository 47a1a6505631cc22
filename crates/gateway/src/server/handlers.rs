//! Axum request handlers for all gateway endpoints.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use common::protocol::{ErrorResponse, HealthResponse, FAILURE_MESSAGE};
use common::ServiceError;
use tracing::{error, info, warn};

use super::request::UnsealRequest;
use super::state::AppState;

/// `GET {prefix}/*resource`: decrypt a sealed object and return its plaintext.
///
/// The private key comes from the configured header (default `s5`). Every
/// failure, whatever its cause, produces the same [`FAILURE_MESSAGE`]
/// response; the precise kind is only logged.
pub async fn unseal(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let raw_path = match path {
        Ok(Path(p)) => p,
        Err(e) => {
            warn!(kind = "missing_parameter", error = %e, "unseal request path rejected");
            return failure();
        }
    };

    let request = match UnsealRequest::from_parts(&headers, &state.key_header_name, &raw_path) {
        Ok(r) => r,
        Err(e) => return log_failure(&raw_path, &e),
    };

    let resource = request.resource.clone();
    let store = state.store.clone();

    // Disk reads and RSA work both block. On timeout the blocking task is
    // left to finish on its own; its result is dropped.
    let work = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ServiceError> {
        let sealed = store.load(&request.resource)?;
        sealing::unseal(&sealed.ciphertext, &sealed.envelope, &request.private_key)
    });
    let outcome = match tokio::time::timeout(state.unseal_timeout, work).await {
        Ok(joined) => joined,
        Err(_) => {
            warn!(
                resource = %resource,
                kind = "timeout",
                timeout_ms = state.unseal_timeout.as_millis() as u64,
                "unseal did not finish in time"
            );
            return failure();
        }
    };

    match outcome {
        Ok(Ok(plaintext)) => {
            let content_type = state.content_types.for_path(resource.as_path()).clone();
            info!(resource = %resource, bytes = plaintext.len(), "served unsealed file");
            served(plaintext, content_type)
        }
        Ok(Err(e)) => log_failure(&resource.to_string(), &e),
        Err(e) => {
            error!(resource = %resource, error = %e, "unseal task did not complete");
            failure()
        }
    }
}

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` while the artifact store is reachable, `503` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let base_dir_available = state.store.is_available();

    let (status_code, status_str) = if base_dir_available {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        base_dir_available,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn served(plaintext: Vec<u8>, content_type: HeaderValue) -> Response {
    let len = plaintext.len();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        Bytes::from(plaintext),
    )
        .into_response()
}

/// The single response every failed unseal gets.
pub(crate) fn failure() -> Response {
    (StatusCode::BAD_REQUEST, FAILURE_MESSAGE).into_response()
}

fn log_failure(resource: &str, e: &ServiceError) -> Response {
    if e.is_decryption_failure() {
        warn!(resource, kind = e.kind(), error = %e, "unseal failed on present artifacts");
    } else {
        info!(resource, kind = e.kind(), error = %e, "unseal request rejected");
    }
    failure()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_type::ContentTypeTable;
    use crate::server::test_support;
    use crate::store::MockArtifactStore;
    use axum::{body::Body, http::Request, routing::get, Router};
    use sealing::SealedObject;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state_with(store: MockArtifactStore) -> AppState {
        AppState::new(Arc::new(store), ContentTypeTable::default(), "s5".into())
    }

    fn router_with(store: MockArtifactStore) -> Router {
        routes(state_with(store))
    }

    fn routes(state: AppState) -> Router {
        Router::new()
            .route("/sealed/*resource", get(unseal))
            .route("/health", get(health))
            .with_state(state)
    }

    fn request(uri: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(key) = key {
            builder = builder.header("s5", key);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_bytes(resp: Response) -> Bytes {
        axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()
    }

    fn sealed(plaintext: &[u8]) -> SealedObject {
        sealing::seal(plaintext, &test_support::public_key()).unwrap()
    }

    #[tokio::test]
    async fn serves_plaintext_with_headers() {
        let object = sealed(b"\x89PNG fake image");
        let mut store = MockArtifactStore::new();
        store
            .expect_load()
            .withf(|r| r.to_string() == "photos/photo.png")
            .times(1)
            .returning(move |_| Ok(object.clone()));

        let resp = router_with(store)
            .oneshot(request("/sealed/photos/photo.png", Some(&test_support::escaped_private_key())))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(resp.headers()[header::CONTENT_LENGTH], "15");
        assert_eq!(&body_bytes(resp).await[..], b"\x89PNG fake image");
    }

    #[tokio::test]
    async fn unmapped_extension_served_as_octet_stream() {
        let object = sealed(b"GIF89a");
        let mut store = MockArtifactStore::new();
        store.expect_load().returning(move |_| Ok(object.clone()));

        let resp = router_with(store)
            .oneshot(request("/sealed/anim.gif", Some(&test_support::escaped_private_key())))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/octet-stream");
    }

    #[tokio::test]
    async fn missing_key_never_touches_store() {
        let mut store = MockArtifactStore::new();
        store.expect_load().times(0);

        let resp = router_with(store)
            .oneshot(request("/sealed/a.png", None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(&body_bytes(resp).await[..], FAILURE_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn every_failure_kind_looks_the_same() {
        let cases: Vec<Box<dyn Fn() -> ServiceError + Send + Sync>> = vec![
            Box::new(|| ServiceError::ArtifactNotFound("a.png.env".into())),
            Box::new(|| ServiceError::MalformedEnvelope { len: 2, iv_len: 16 }),
            Box::new(|| ServiceError::io("reading a.png.sealed", std::io::Error::other("EIO"))),
        ];
        let mut bodies = Vec::new();
        for make in cases {
            let mut store = MockArtifactStore::new();
            store.expect_load().returning(move |_| Err(make()));
            let resp = router_with(store)
                .oneshot(request("/sealed/a.png", Some(&test_support::escaped_private_key())))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            bodies.push(body_bytes(resp).await);
        }

        // Wrong key on a present object.
        let object = sealed(b"secret");
        let mut store = MockArtifactStore::new();
        store.expect_load().returning(move |_| Ok(object.clone()));
        let resp = router_with(store)
            .oneshot(request("/sealed/a.png", Some(&test_support::other_escaped_private_key())))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(header::CONTENT_TYPE).map_or(true, |v| v != "image/png"));
        bodies.push(body_bytes(resp).await);

        assert!(bodies.iter().all(|b| &b[..] == FAILURE_MESSAGE.as_bytes()));
    }

    #[tokio::test]
    async fn slow_unseal_gets_generic_failure() {
        let object = sealed(b"eventually");
        let mut store = MockArtifactStore::new();
        store.expect_load().returning(move |_| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(object.clone())
        });
        let state = state_with(store).with_unseal_timeout(Duration::from_millis(20));

        let resp = routes(state)
            .oneshot(request("/sealed/a.png", Some(&test_support::escaped_private_key())))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(&body_bytes(resp).await[..], FAILURE_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn health_reflects_store_availability() {
        let mut store = MockArtifactStore::new();
        store.expect_is_available().return_const(false);
        let resp = router_with(store)
            .oneshot(request("/health", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let mut store = MockArtifactStore::new();
        store.expect_is_available().return_const(true);
        let resp = router_with(store)
            .oneshot(request("/health", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(body.status, "ok");
        assert!(body.base_dir_available);
    }
}
