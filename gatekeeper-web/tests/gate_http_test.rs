//! HTTP scenarios through the full router

mod helpers;

use axum::{
    body::Body,
    http::{header::COOKIE, header::WWW_AUTHENTICATE, Request, StatusCode},
};
use gatekeeper_web::middleware::gate_middleware;
use helpers::*;
use tower::ServiceExt;

async fn login(app: &TestApp, username: &str, password: &str) -> Browser {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/access")
                .header("Authorization", basic_auth(username, password))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let browser = Browser {
        grant: cookies["GRANT"].value().to_string(),
        csrf: cookies["CSRF"].value().to_string(),
    };
    assert_eq!(body_json(response).await["authenticated"], true);
    browser
}

#[tokio::test]
async fn ungoverned_path_mints_grant_cookie_only() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/home").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let grant = &cookies["GRANT"];
    assert_eq!(grant.value().len(), 32);
    assert_eq!(grant.http_only(), Some(true));
    assert_eq!(grant.path(), Some("/"));
    assert_eq!(grant.max_age(), Some(time::Duration::seconds(3600)));
    assert!(!cookies.contains_key("CSRF"));
    assert_eq!(body_text(response).await, "any-app");
}

#[tokio::test]
async fn existing_grant_cookie_is_not_reissued() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home")
                .header(COOKIE, "GRANT=ABCDEF0123456789")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn level_one_login_reaches_level_one_only() {
    let app = test_app();
    let browser = login(&app, "1#bob", "12341").await;

    let response = app
        .router
        .clone()
        .oneshot(browser.replay("/Level1/low/access.html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("<h2>Sponge bob</h2>"));

    let response = app
        .router
        .clone()
        .oneshot(browser.replay("/Level2/high_access.html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["requiredAccess"], "Level2");
    assert_eq!(body["message"], "invalid access level");
}

#[tokio::test]
async fn level_two_login_reaches_every_tier() {
    let app = test_app();
    let browser = login(&app, "2#alice", "wonderland").await;

    for uri in [
        "/Level1/low/access.html",
        "/Level2/high_access.html",
        "/public/index.html",
    ] {
        let response = app.router.clone().oneshot(browser.replay(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn public_path_without_xsrf_is_rejected() {
    let app = test_app();
    let browser = login(&app, "1#bob", "12341").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/public/index.html")
                .header(COOKIE, browser.cookie_header())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["csrfPassed"], false);
}

#[tokio::test]
async fn xsrf_query_parameter_is_accepted() {
    let app = test_app();
    let browser = login(&app, "1#bob", "12341").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/public/index.html?XSRF={}", browser.csrf))
                .header(COOKIE, browser.cookie_header())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_request_to_tiered_path_is_forbidden() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/Level1/low/access.html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(set_cookies(&response).contains_key("GRANT"));
    assert_eq!(body_json(response).await["requiredAccess"], "Level1");
}

#[tokio::test]
async fn expired_session_is_forbidden() {
    let app = test_app();
    let browser = login(&app, "1#bob", "12341").await;

    app.clock.advance_secs(3600);

    let response = app
        .router
        .clone()
        .oneshot(browser.replay("/Level1/low/access.html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn relogin_reuses_grant_with_remaining_lifetime() {
    let app = test_app();
    let first = login(&app, "1#bob", "12341").await;

    app.clock.advance_secs(1000);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/access")
                .header("Authorization", basic_auth("1#bob", "12341"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let cookies = set_cookies(&response);

    assert_eq!(cookies["GRANT"].value(), first.grant);
    assert_eq!(
        cookies["GRANT"].max_age(),
        Some(time::Duration::seconds(2600))
    );
    assert_eq!(set_cookie_count(&response, "GRANT"), 1);
}

#[tokio::test]
async fn level_above_user_maximum_is_unauthorized() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/access")
                .header("Authorization", basic_auth("2#bob", "12341"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(WWW_AUTHENTICATE));
    assert_eq!(body_json(response).await["authenticated"], false);
}

#[tokio::test]
async fn missing_credentials_are_unauthorized() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/access").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resources_lists_static_site() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/resources")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["resources"],
        serde_json::json!([
            "/Level1/low/access.html",
            "/Level2/high_access.html",
            "/public/index.html",
        ])
    );
}

#[tokio::test]
async fn gate_layered_twice_runs_once() {
    let app = test_app();
    let router = app.router.clone().layer(axum::middleware::from_fn_with_state(
        app.state.clone(),
        gate_middleware,
    ));

    let response = router
        .oneshot(Request::builder().uri("/home").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(set_cookie_count(&response, "GRANT"), 1);
}

#[tokio::test]
async fn live_server_login_and_replay() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/access", app.address))
        .basic_auth("1#bob", Some("12341"))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 200);

    let mut grant = None;
    let mut csrf = None;
    for cookie in response.cookies() {
        match cookie.name() {
            "GRANT" => grant = Some(cookie.value().to_string()),
            "CSRF" => csrf = Some(cookie.value().to_string()),
            _ => {}
        }
    }
    let (grant, csrf) = (grant.unwrap(), csrf.unwrap());

    let response = app
        .client
        .get(format!("{}/Level1/low/access.html", app.address))
        .header("Cookie", format!("GRANT={}; CSRF={}", grant, csrf))
        .header("XSRF", &csrf)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("Sponge bob"));
}

#[tokio::test]
async fn encoded_and_dotted_paths_are_gated_like_their_files() {
    let app = test_app();

    for (uri, required) in [
        ("/Level%31/low/access.html", "Level1"),
        ("//Level1/low/access.html", "Level1"),
        ("/Level1//low/./access.html", "Level1"),
        ("/Level1%2Flow%2Faccess.html", "Level1"),
        ("/./Level2/high_access.html", "Level2"),
        ("/Level2/", "Level2"),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body_json(response).await["requiredAccess"], required, "{}", uri);
    }
}

#[tokio::test]
async fn parent_segments_are_rejected() {
    let app = test_app();

    for uri in [
        "/public/../Level2/high_access.html",
        "/public/%2e%2e/Level2/high_access.html",
    ] {
        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert!(set_cookies(&response).is_empty());
    }
}

#[tokio::test]
async fn encoded_path_still_serves_file_to_authorized_caller() {
    let app = test_app();
    let browser = login(&app, "1#bob", "12341").await;

    let response = app
        .router
        .clone()
        .oneshot(browser.replay("/Level%31/low/access.html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Sponge bob"));
}

#[tokio::test]
async fn both_local_frontend_origins_are_allowed() {
    let app = test_app();

    for (origin, allowed) in [
        ("http://localhost:3000", true),
        ("http://127.0.0.1:3000", true),
        ("http://evil.example", false),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/public/index.html")
                    .header("Origin", origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let header = response
            .headers()
            .get("access-control-allow-origin")
            .map(|value| value.to_str().unwrap().to_string());
        if allowed {
            assert_eq!(header.as_deref(), Some(origin), "origin {origin}");
        } else {
            assert!(header.is_none(), "origin {origin}");
        }
    }
}
