//! Test harness for the HTTP gate

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, Request, Response,
    },
    Router,
};
use axum_extra::{extract::cookie::Cookie, headers::Authorization};
use axum_extra::headers::HeaderMapExt;
use gatekeeper_applications::MemorySessionStore;
use gatekeeper_core::{GatekeeperConfig, ManualClock};
use gatekeeper_web::{create_app, AppState, GatekeeperServer, WebConfig};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tokio::net::TcpListener;

// Install the test subscriber once per binary
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub fn static_dir() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string()
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub clock: ManualClock,
}

/// App over the bundled static site, in-memory sessions and a manual clock
pub fn test_app() -> TestApp {
    test_app_with_config(GatekeeperConfig::default())
}

pub fn test_app_with_config(gatekeeper_config: GatekeeperConfig) -> TestApp {
    LazyLock::force(&TRACING);

    let clock = ManualClock::starting_now();
    let config = WebConfig {
        static_dir: static_dir(),
        ..WebConfig::default()
    };
    let state = AppState::assemble(
        config,
        gatekeeper_config,
        Arc::new(MemorySessionStore::new()),
        Some(Arc::new(clock.clone())),
    )
    .expect("Failed to assemble test state");

    TestApp {
        router: create_app(state.clone()),
        state,
        clock,
    }
}

pub fn basic_auth(username: &str, password: &str) -> HeaderValue {
    let mut headers = HeaderMap::new();
    headers.typed_insert(Authorization::basic(username, password));
    headers[AUTHORIZATION].clone()
}

/// Cookies a browser would hold after a login
#[derive(Debug, Clone)]
pub struct Browser {
    pub grant: String,
    pub csrf: String,
}

impl Browser {
    pub fn cookie_header(&self) -> String {
        format!("GRANT={}; CSRF={}", self.grant, self.csrf)
    }

    /// GET `uri` replaying both cookies and echoing the CSRF value in `XSRF`
    pub fn replay(&self, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(COOKIE, self.cookie_header())
            .header("XSRF", &self.csrf)
            .body(Body::empty())
            .unwrap()
    }
}

/// Every `Set-Cookie` on the response, keyed by cookie name
pub fn set_cookies<B>(response: &Response<B>) -> HashMap<String, Cookie<'static>> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_string()).ok())
        .map(|cookie| (cookie.name().to_string(), cookie))
        .collect()
}

pub fn set_cookie_count<B>(response: &Response<B>, name: &str) -> usize {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter(|value| value.starts_with(&format!("{}=", name)))
        .count()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Live server on an ephemeral port
pub struct LiveApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub async fn spawn_app() -> LiveApp {
    let app = test_app();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        GatekeeperServer::new(app.state).serve(listener).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    LiveApp {
        address: format!("http://127.0.0.1:{}", port),
        client,
    }
}
