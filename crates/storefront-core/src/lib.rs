//! Storefront client library (session, cart, catalog, admin, API client).

pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod navigation;
pub mod session;
pub mod tokens;
