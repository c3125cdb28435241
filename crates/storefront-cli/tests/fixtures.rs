//! Shared helpers for CLI tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API: &str = "/api/v1";

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

pub fn temp_home() -> TempDir {
    TempDir::new().expect("create temp STOREFRONT_HOME")
}

pub fn base_url(server: &MockServer) -> String {
    format!("{}{API}", server.uri())
}

pub fn tokens_path(home: &Path) -> PathBuf {
    home.join("tokens.json")
}

pub fn write_tokens(home: &Path, access: &str, refresh: &str) {
    let body = json!({"access_token": access, "refresh_token": refresh});
    fs::write(tokens_path(home), body.to_string()).expect("write tokens.json");
}

pub fn read_tokens(home: &Path) -> Value {
    let contents = fs::read_to_string(tokens_path(home)).expect("read tokens.json");
    serde_json::from_str(&contents).expect("parse tokens.json")
}

pub async fn mount_me(server: &MockServer, role: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{API}/auth/me")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "email": "user@shop.test",
            "role": role
        })))
        .mount(server)
        .await;
}

pub fn detail(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({"detail": message}))
}

pub async fn count_requests(server: &MockServer, http_method: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == http_method)
        .count()
}
