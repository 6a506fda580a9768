//! Integration tests for the Noscope storefront.
//!
//! Tests drive the full router in-process with `tower::ServiceExt::oneshot`;
//! no server is bound. Each [`TestApp`] gets its own temporary data
//! directory, and the CEP lookup points at a `wiremock` server or at an
//! address where nothing listens.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p noscope-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::path::Path;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use noscope_storefront::config::StorefrontConfig;
use noscope_storefront::state::AppState;

/// CEP lookup base URL where nothing listens.
pub const UNREACHABLE_VIACEP: &str = "http://127.0.0.1:1/ws";

/// A storefront instance backed by a temporary data directory.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    data_dir: TempDir,
}

impl TestApp {
    /// Fresh storefront with an unreachable CEP service.
    pub async fn new() -> Self {
        Self::with_viacep(UNREACHABLE_VIACEP).await
    }

    /// Fresh storefront looking CEPs up at `viacep_base`.
    pub async fn with_viacep(viacep_base: &str) -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let (router, state) = build(data_dir.path(), viacep_base, &[]).await;
        Self {
            router,
            state,
            data_dir,
        }
    }

    /// Fresh storefront with extra environment settings.
    pub async fn with_vars(vars: &[(&str, &str)]) -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let (router, state) = build(data_dir.path(), UNREACHABLE_VIACEP, vars).await;
        Self {
            router,
            state,
            data_dir,
        }
    }

    /// Start a new storefront over the same data directory, as after a
    /// process restart.
    pub async fn restart(self) -> Self {
        let Self { data_dir, .. } = self;
        let (router, state) = build(data_dir.path(), UNREACHABLE_VIACEP, &[]).await;
        Self {
            router,
            state,
            data_dir,
        }
    }

    /// The data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Send a POST with a form-urlencoded body.
    pub async fn post_form(&self, uri: &str, body: &str) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_owned()))
                .unwrap(),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// A collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// Whether the response announces a cart change.
    #[must_use]
    pub fn cart_updated(&self) -> bool {
        self.headers
            .get("HX-Trigger")
            .is_some_and(|v| v == "cart-updated")
    }
}

async fn build(data_dir: &Path, viacep_base: &str, extra: &[(&str, &str)]) -> (Router, AppState) {
    let mut vars: HashMap<String, String> = HashMap::from([
        (
            "NOSCOPE_DATA_DIR".to_string(),
            data_dir.display().to_string(),
        ),
        ("VIACEP_BASE_URL".to_string(), viacep_base.to_string()),
        ("VIACEP_TIMEOUT_SECS".to_string(), "2".to_string()),
    ]);
    for (key, value) in extra {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let state = AppState::initialize(config).await.unwrap();
    (noscope_storefront::app(state.clone()), state)
}
