//! `/products` endpoints, public and admin.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::types::{ImageUpload, Product, ProductForm, ProductPage};
use crate::error::{ClientError, ClientErrorKind, ClientResult};
use crate::http::ApiClient;

/// `GET /products/?skip=&limit=`.
pub async fn list(client: &ApiClient, skip: u64, limit: u32) -> ClientResult<ProductPage> {
    client
        .get_json(&format!("products/?skip={skip}&limit={limit}"))
        .await
}

/// `GET /products/{id}`.
pub async fn get(client: &ApiClient, product_id: i64) -> ClientResult<Product> {
    client.get_json(&format!("products/{product_id}")).await
}

/// `GET /products/admin/all`, including inactive products when asked.
pub async fn list_all(
    client: &ApiClient,
    skip: u64,
    limit: u32,
    include_inactive: bool,
) -> ClientResult<Vec<Product>> {
    client
        .get_json(&format!(
            "products/admin/all?skip={skip}&limit={limit}&include_inactive={include_inactive}"
        ))
        .await
}

/// `POST /products/admin/`, multipart with an optional `image` part.
pub async fn create(
    client: &ApiClient,
    form: &ProductForm,
    image: Option<&ImageUpload>,
) -> ClientResult<Product> {
    let mut multipart = Form::new();
    for (key, value) in form.fields() {
        multipart = multipart.text(key, value);
    }
    if let Some(image) = image {
        multipart = multipart.part("image", image_part(image)?);
    }

    let builder = client
        .request(Method::POST, "products/admin/")?
        .multipart(multipart);
    client.send_json(builder).await
}

/// `PUT /products/admin/{id}`, JSON body with empty fields omitted.
pub async fn update(client: &ApiClient, product_id: i64, form: &ProductForm) -> ClientResult<()> {
    let builder = client
        .request(Method::PUT, &format!("products/admin/{product_id}"))?
        .json(&form.to_json());
    client.send_empty(builder).await
}

/// `PATCH /products/admin/{id}/image`, multipart.
pub async fn update_image(
    client: &ApiClient,
    product_id: i64,
    image: &ImageUpload,
) -> ClientResult<()> {
    let multipart = Form::new().part("image", image_part(image)?);
    let builder = client
        .request(Method::PATCH, &format!("products/admin/{product_id}/image"))?
        .multipart(multipart);
    client.send_empty(builder).await
}

/// `PATCH /products/admin/{id}/toggle-active`.
pub async fn toggle_active(client: &ApiClient, product_id: i64) -> ClientResult<()> {
    let builder = client.request(
        Method::PATCH,
        &format!("products/admin/{product_id}/toggle-active"),
    )?;
    client.send_empty(builder).await
}

/// `DELETE /products/admin/{id}`.
pub async fn delete(client: &ApiClient, product_id: i64) -> ClientResult<()> {
    let builder = client.request(Method::DELETE, &format!("products/admin/{product_id}"))?;
    client.send_empty(builder).await
}

/// `GET /products/admin/stats/products`.
pub async fn product_stats(client: &ApiClient) -> ClientResult<Value> {
    client.get_json("products/admin/stats/products").await
}

/// `GET /products/admin/stats/categories`.
pub async fn category_stats(client: &ApiClient) -> ClientResult<Value> {
    client.get_json("products/admin/stats/categories").await
}

fn image_part(image: &ImageUpload) -> ClientResult<Part> {
    Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)
        .map_err(|e| {
            ClientError::new(
                ClientErrorKind::Validation,
                format!("invalid image content type: {e}"),
            )
        })
}
