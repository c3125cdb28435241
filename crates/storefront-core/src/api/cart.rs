//! `/cart` endpoints.

use reqwest::Method;

use super::types::{CartCount, CartItem, CartItemUpdate, NewCartItem};
use crate::error::ClientResult;
use crate::http::ApiClient;

/// `GET /cart/`.
pub async fn items(client: &ApiClient) -> ClientResult<Vec<CartItem>> {
    client.get_json("cart/").await
}

/// `GET /cart/count`.
pub async fn count(client: &ApiClient) -> ClientResult<u32> {
    let count: CartCount = client.get_json("cart/count").await?;
    Ok(count.count)
}

/// `POST /cart/`.
pub async fn add(client: &ApiClient, product_id: i64, quantity: u32) -> ClientResult<()> {
    let builder = client.request(Method::POST, "cart/")?.json(&NewCartItem {
        product_id,
        quantity,
    });
    client.send_empty(builder).await
}

/// `PUT /cart/{item_id}`.
pub async fn update(client: &ApiClient, item_id: i64, quantity: u32) -> ClientResult<()> {
    let builder = client
        .request(Method::PUT, &format!("cart/{item_id}"))?
        .json(&CartItemUpdate { quantity });
    client.send_empty(builder).await
}

/// `DELETE /cart/{item_id}`.
pub async fn remove(client: &ApiClient, item_id: i64) -> ClientResult<()> {
    let builder = client.request(Method::DELETE, &format!("cart/{item_id}"))?;
    client.send_empty(builder).await
}

/// `DELETE /cart/`.
pub async fn clear(client: &ApiClient) -> ClientResult<()> {
    let builder = client.request(Method::DELETE, "cart/")?;
    client.send_empty(builder).await
}
