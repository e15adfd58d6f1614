//! End-to-end dispatch against a mock vendor API.

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iterable_core::{HttpSettings, IntegrationError, IterableSettings, NormalizedEvent};
use iterable_dispatcher::{DispatchOutcome, HttpRuntime, Iterable};

const API_KEY: &str = "124175f3654446babf5b5966e232d91d";

fn destination(server: &MockServer, api_key: &str) -> Iterable<HttpRuntime> {
    let settings = IterableSettings {
        endpoint: format!("{}/api", server.uri()),
        ..IterableSettings::with_api_key(api_key)
    };
    let runtime = HttpRuntime::new(&HttpSettings {
        timeout_ms: 2_000,
        max_retries: 2,
        initial_backoff_ms: 1,
    })
    .unwrap();
    Iterable::new(settings, runtime)
}

fn event(raw: Value) -> NormalizedEvent {
    serde_json::from_value(raw).unwrap()
}

fn added_product(with_cart: bool) -> NormalizedEvent {
    let mut properties = json!({
        "revenue": 19.99,
        "email": "jd@example.com",
        "prop": true
    });
    if with_cart {
        properties["cart"] = json!([{
            "id": "foo-id",
            "sku": "foo-sku",
            "name": "foo-name",
            "price": 5.5,
            "quantity": 2,
            "category": "foo-category"
        }]);
    }
    event(json!({
        "type": "track",
        "event": "Added Product",
        "userId": "some-uid",
        "timestamp": "2014",
        "properties": properties
    }))
}

#[tokio::test]
async fn test_track_posts_with_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/track"))
        .and(header("Api-Key", API_KEY))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "userId": "7331",
            "eventName": "Watched Video",
            "dataFields": { "title": "Intro" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "msg": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = destination(&server, API_KEY)
        .dispatch(&event(json!({
            "type": "track",
            "event": "Watched Video",
            "userId": "7331",
            "properties": { "title": "Intro" }
        })))
        .await
        .unwrap();

    match outcome {
        DispatchOutcome::Sent(response) => {
            assert_eq!(response.status, 200);
            assert_eq!(response.json().unwrap()["msg"], "ok");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_added_product_with_cart_updates_cart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/commerce/updateCart"))
        .and(body_partial_json(json!({
            "user": { "userId": "some-uid", "email": "jd@example.com" },
            "items": [{
                "id": "foo-id",
                "categories": ["foo-category"],
                "price": 5.5,
                "quantity": 2
            }]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    destination(&server, API_KEY)
        .dispatch(&added_product(true))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_added_product_without_cart_tracks_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/track"))
        .and(body_partial_json(json!({
            "eventName": "Added Product",
            "createdAt": 1_388_534_400,
            "dataFields": { "amount": 19.99, "prop": true }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    destination(&server, API_KEY)
        .dispatch(&added_product(false))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_completed_order_without_cart_tracks_purchase() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/commerce/trackPurchase"))
        .and(body_partial_json(json!({ "total": 0.0, "items": [] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    destination(&server, API_KEY)
        .dispatch(&event(json!({
            "type": "track",
            "event": "Completed Order",
            "userId": "some-uid",
            "properties": { "prop": true }
        })))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_identify_posts_user_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/update"))
        .and(body_partial_json(json!({
            "email": "jd@example.com",
            "dataFields": { "phoneNumber": "555-1234" }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    destination(&server, API_KEY)
        .dispatch(&event(json!({
            "type": "identify",
            "traits": { "email": "jd@example.com", "phone": "555-1234" }
        })))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_api_key_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/update"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        // first attempt plus two retries
        .expect(3)
        .mount(&server)
        .await;

    let err = destination(&server, "x")
        .dispatch(&event(json!({ "type": "identify", "userId": "7331" })))
        .await
        .unwrap_err();

    match err {
        IntegrationError::Authentication { body } => assert_eq!(body, "Invalid API key"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/track"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/events/track"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = destination(&server, API_KEY)
        .dispatch(&event(json!({ "type": "track", "event": "Signed Up", "userId": "u1" })))
        .await
        .unwrap();
    assert!(matches!(outcome, DispatchOutcome::Sent(ref r) if r.status == 200));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/track"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"code":"BadParams"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let err = destination(&server, API_KEY)
        .dispatch(&event(json!({ "type": "track", "event": "Signed Up", "userId": "u1" })))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("BadParams"));
}

#[tokio::test]
async fn test_page_switches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/track"))
        .and(body_partial_json(json!({ "eventName": "Loaded a Page" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let page = event(json!({
        "type": "page",
        "userId": "u1",
        "name": "Docs",
        "category": "Help"
    }));

    let silent = destination(&server, API_KEY);
    let outcome = silent.dispatch(&page).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Skipped { .. }));

    let settings = IterableSettings {
        endpoint: format!("{}/api", server.uri()),
        track_all_pages: true,
        ..IterableSettings::with_api_key(API_KEY)
    };
    let runtime = HttpRuntime::new(&HttpSettings::default()).unwrap();
    let outcome = Iterable::new(settings, runtime).dispatch(&page).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Sent(_)));
}

#[tokio::test]
async fn test_missing_identity_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = destination(&server, API_KEY)
        .dispatch(&event(json!({ "type": "track", "event": "Signed Up" })))
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::Validation(_)));

    let err = destination(&server, "")
        .dispatch(&event(json!({ "type": "track", "event": "Signed Up", "userId": "u1" })))
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrationError::Configuration(_)));
}

#[tokio::test]
async fn test_truncated_body_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        // Read the whole request before answering.
        while !request.windows(4).any(|w| w == b"\r\n\r\n") || !request.ends_with(b"}") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 64\r\n\r\n{\"msg\"")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let settings = IterableSettings {
        endpoint: format!("http://{addr}/api"),
        ..IterableSettings::with_api_key(API_KEY)
    };
    let runtime = HttpRuntime::new(&HttpSettings::default()).unwrap();
    let err = Iterable::new(settings, runtime)
        .dispatch(&event(json!({ "type": "track", "event": "Signed Up", "userId": "u1" })))
        .await
        .unwrap_err();

    assert!(matches!(err, IntegrationError::Transport { status: Some(200), .. }));
    assert!(err.to_string().contains("failed to read response body"));
}
