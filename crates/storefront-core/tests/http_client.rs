//! HTTP adapter: auth header injection, error mapping, unauthorized signal.

mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use fixtures::*;
use reqwest::Method;
use serde_json::json;
use storefront_core::error::ClientErrorKind;
use storefront_core::http::{ApiClient, AuthEvent};
use storefront_core::tokens::{MemoryTokenStore, TokenStore};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_bearer_header_from_store() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/auth/me")))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("USER")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &logged_in_store());
    let user = storefront_core::api::auth::me(&client).await.unwrap();
    assert_eq!(user.id, 7);
}

#[tokio::test]
async fn test_no_header_without_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/products/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server, &Arc::new(MemoryTokenStore::new()));
    storefront_core::api::products::list(&client, 0, 12).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
    assert_eq!(received[0].url.query(), Some("skip=0&limit=12"));
}

#[tokio::test]
async fn test_token_change_applies_to_next_request() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/cart/count")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 1})))
        .mount(&server)
        .await;

    let store = logged_in_store();
    let client = client_for(&server, &store);
    storefront_core::api::cart::count(&client).await.unwrap();
    store.save(&tokens("access-2", "refresh-2")).unwrap();
    storefront_core::api::cart::count(&client).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].headers.get("authorization").unwrap(), "Bearer access-1");
    assert_eq!(received[1].headers.get("authorization").unwrap(), "Bearer access-2");
}

#[tokio::test]
async fn test_unauthorized_publishes_event() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/users")))
        .respond_with(detail(401, "Not authenticated"))
        .mount(&server)
        .await;

    let client = client_for(&server, &logged_in_store());
    let mut events = client.subscribe();

    let err = storefront_core::api::users::list(&client).await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Unauthorized);
    assert_eq!(err.detail.as_deref(), Some("Not authenticated"));

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        event,
        AuthEvent::Unauthorized {
            method: "GET".to_string(),
            path: format!("{API}/users"),
        }
    );
}

#[tokio::test]
async fn test_backend_error_does_not_publish_event() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/products/admin/3")))
        .respond_with(detail(403, "Недостаточно прав"))
        .mount(&server)
        .await;

    let client = client_for(&server, &logged_in_store());
    let mut events = client.subscribe();

    let err = storefront_core::api::products::delete(&client, 3)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Backend);
    assert_eq!(err.status, Some(403));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_kind() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/products/9")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 9}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let base = Url::parse(&format!("{}{API}/", server.uri())).unwrap();
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let client = ApiClient::with_http(http, base, store);

    let err = storefront_core::api::products::get(&client, 9)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Timeout);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_connection_refused_maps_to_network_kind() {
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    // Port 9 (discard) is essentially never listening on loopback.
    let base = Url::parse("http://127.0.0.1:9/api/v1/").unwrap();
    let client = ApiClient::with_http(reqwest::Client::new(), base, store);

    let builder = client.request(Method::GET, "products/").unwrap();
    let err = client.send(builder).await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Network);
    assert_eq!(err.user_message_or("fallback"), "fallback");
}

#[tokio::test]
async fn test_undecodable_body_maps_to_decode_kind() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind to localhost in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/auth/me")))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server, &logged_in_store());
    let err = storefront_core::api::auth::me(&client).await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Decode);
}

#[test]
fn test_unjoinable_path_maps_to_network() {
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
    let base = Url::parse("http://shop.test/api/v1/").unwrap();
    let client = ApiClient::with_http(reqwest::Client::new(), base, store);

    // Backslashes act as slashes in http URLs, so this names a host with a bad port.
    let err = client
        .request(Method::GET, "\\\\shop.test:99999/products")
        .unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Network);
    assert!(err.message.contains("invalid request path"));
}
