//! `/users` endpoints (admin only).

use reqwest::Method;

use super::types::{Role, RoleUpdate, User};
use crate::error::ClientResult;
use crate::http::ApiClient;

/// `GET /users`.
pub async fn list(client: &ApiClient) -> ClientResult<Vec<User>> {
    client.get_json("users").await
}

/// `PATCH /users/{id}` with a new role.
pub async fn update_role(client: &ApiClient, user_id: i64, role: Role) -> ClientResult<()> {
    let builder = client
        .request(Method::PATCH, &format!("users/{user_id}"))?
        .json(&RoleUpdate { role });
    client.send_empty(builder).await
}
