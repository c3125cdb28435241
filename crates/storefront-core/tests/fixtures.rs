//! Shared helpers for integration tests against a wiremock backend.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use storefront_core::cart::CartSynchronizer;
use storefront_core::config::Config;
use storefront_core::http::ApiClient;
use storefront_core::navigation::Navigator;
use storefront_core::session::SessionManager;
use storefront_core::tokens::{MemoryTokenStore, TokenPair, TokenStore};
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const API: &str = "/api/v1";

/// Config pointing at the mock server's `/api/v1`.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = format!("{}{API}", server.uri());
    config
}

pub fn client_for(server: &MockServer, store: &Arc<MemoryTokenStore>) -> ApiClient {
    let store: Arc<dyn TokenStore> = store.clone();
    ApiClient::from_config(&config_for(server), store).expect("build client")
}

pub fn tokens(access: &str, refresh: &str) -> TokenPair {
    TokenPair {
        access_token: access.to_string(),
        refresh_token: Some(refresh.to_string()),
    }
}

pub fn logged_in_store() -> Arc<MemoryTokenStore> {
    Arc::new(MemoryTokenStore::with_tokens(tokens("access-1", "refresh-1")))
}

/// Session manager plus cart synchronizer without background listeners.
pub struct Harness {
    pub client: ApiClient,
    pub store: Arc<MemoryTokenStore>,
    pub session: Arc<SessionManager>,
    pub cart: Arc<CartSynchronizer>,
}

pub fn harness(server: &MockServer, store: Arc<MemoryTokenStore>) -> Harness {
    let client = client_for(server, &store);
    let dyn_store: Arc<dyn TokenStore> = store.clone();
    let session = Arc::new(SessionManager::new(
        client.clone(),
        dyn_store,
        Navigator::new(),
    ));
    let cart = Arc::new(CartSynchronizer::new(client.clone(), session.subscribe()));
    Harness {
        client,
        store,
        session,
        cart,
    }
}

pub fn user_json(role: &str) -> Value {
    json!({"id": 7, "email": "user@shop.test", "role": role})
}

/// Mounts `GET /auth/me` answering with a user of `role`.
pub async fn mount_me(server: &MockServer, role: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{API}/auth/me")))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(role)))
        .mount(server)
        .await;
}

pub fn cart_item(id: i64, product_id: i64, quantity: u32) -> Value {
    json!({"id": id, "product_id": product_id, "quantity": quantity})
}

/// Mounts `GET /cart/` and `GET /cart/count` with fixed contents.
pub async fn mount_cart(server: &MockServer, items: Value, count: u32) {
    Mock::given(method("GET"))
        .and(path(format!("{API}/cart/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(items))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/cart/count")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": count})))
        .mount(server)
        .await;
}

pub fn detail(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({"detail": message}))
}

/// Requests the server received, filtered by method and path suffix.
pub async fn requests_to(server: &MockServer, http_method: &str, suffix: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == http_method && r.url.path().ends_with(suffix))
        .collect()
}

/// Waits until `rx` holds a value matching `pred`, or panics after 2s.
pub async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, pred: F)
where
    F: Fn(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|v| pred(v)))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed");
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}
