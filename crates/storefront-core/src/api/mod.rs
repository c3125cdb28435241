//! Typed wrappers over the storefront REST endpoints.
//!
//! Each submodule mirrors one route group of the backend (`/auth`,
//! `/products`, `/cart`, `/users`). Functions are thin: build the request,
//! hand it to [`ApiClient`](crate::http::ApiClient), decode the reply.

pub mod auth;
pub mod cart;
pub mod products;
pub mod types;
pub mod users;

pub use types::{
    AdminStats, CartItem, ImageUpload, Product, ProductForm, ProductPage, Role, TokenResponse, User,
};
