//! `/auth` endpoints.

use reqwest::Method;

use super::types::{LoginForm, RefreshRequest, RegisterRequest, TokenResponse, User};
use crate::error::ClientResult;
use crate::http::ApiClient;

/// `POST /auth/login`, form-encoded (`username`, `password`).
pub async fn login(client: &ApiClient, email: &str, password: &str) -> ClientResult<TokenResponse> {
    let builder = client.request(Method::POST, "auth/login")?.form(&LoginForm {
        username: email,
        password,
    });
    client.send_json(builder).await
}

/// `POST /auth/register`, JSON body.
pub async fn register(
    client: &ApiClient,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> ClientResult<TokenResponse> {
    let builder = client
        .request(Method::POST, "auth/register")?
        .json(&RegisterRequest {
            email,
            password,
            confirm_password,
        });
    client.send_json(builder).await
}

/// `POST /auth/logout`.
pub async fn logout(client: &ApiClient) -> ClientResult<()> {
    let builder = client.request(Method::POST, "auth/logout")?;
    client.send_empty(builder).await
}

/// `POST /auth/refresh`, exchanging the refresh token for a new pair.
pub async fn refresh(client: &ApiClient, refresh_token: &str) -> ClientResult<TokenResponse> {
    let builder = client
        .request(Method::POST, "auth/refresh")?
        .json(&RefreshRequest { refresh_token });
    client.send_json(builder).await
}

/// `GET /auth/me`.
pub async fn me(client: &ApiClient) -> ClientResult<User> {
    client.get_json("auth/me").await
}
