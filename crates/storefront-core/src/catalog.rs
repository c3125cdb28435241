//! Catalog view model: paging, search, category filter and sorting.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::api;
use crate::api::types::Product;
use crate::cart::CartSynchronizer;
use crate::error::{ClientError, ClientResult, ValidationError};
use crate::http::ApiClient;
use crate::session::SessionManager;

/// Message shown when a catalog page cannot be loaded.
pub const LOAD_FAILURE: &str = "Не удалось загрузить товары. Попробуйте позже.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Name,
    PriceAsc,
    PriceDesc,
    Rating,
    Newest,
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortBy::Name),
            "price-asc" => Ok(SortBy::PriceAsc),
            "price-desc" => Ok(SortBy::PriceDesc),
            "rating" => Ok(SortBy::Rating),
            "newest" => Ok(SortBy::Newest),
            other => Err(format!(
                "unknown sort '{other}' (expected name, price-asc, price-desc, rating, newest)"
            )),
        }
    }
}

/// Search, category and ordering applied to the loaded page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    /// `None` means all categories.
    pub category: Option<String>,
    pub sort: SortBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            total: 0,
            total_pages: 1,
        }
    }

    fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Filters and sorts products for display.
pub fn filter_products(products: &[Product], query: &CatalogQuery) -> Vec<Product> {
    let needle = query.search.trim().to_lowercase();
    let mut filtered: Vec<Product> = products
        .iter()
        .filter(|p| needle.is_empty() || matches_search(p, &needle))
        .filter(|p| {
            query
                .category
                .as_deref()
                .is_none_or(|c| p.category.as_deref() == Some(c))
        })
        .cloned()
        .collect();

    filtered.sort_by(|a, b| compare(a, b, query.sort));
    filtered
}

fn matches_search(product: &Product, needle: &str) -> bool {
    let contains = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(needle));
    contains(Some(&product.name))
        || contains(product.description.as_deref())
        || contains(product.category.as_deref())
}

fn compare(a: &Product, b: &Product, sort: SortBy) -> Ordering {
    match sort {
        SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortBy::PriceAsc => a.price.total_cmp(&b.price),
        SortBy::PriceDesc => b.price.total_cmp(&a.price),
        SortBy::Rating => b
            .rating
            .unwrap_or_default()
            .total_cmp(&a.rating.unwrap_or_default()),
        // ISO-8601 timestamps order lexicographically.
        SortBy::Newest => b
            .created_at
            .as_deref()
            .unwrap_or_default()
            .cmp(a.created_at.as_deref().unwrap_or_default()),
    }
}

/// One browsing session over the public catalog.
pub struct Catalog {
    client: ApiClient,
    session: Arc<SessionManager>,
    cart: Arc<CartSynchronizer>,
    products: Vec<Product>,
    pagination: Pagination,
    pub query: CatalogQuery,
}

impl Catalog {
    pub fn new(
        client: ApiClient,
        session: Arc<SessionManager>,
        cart: Arc<CartSynchronizer>,
        page_size: u32,
    ) -> Self {
        Self {
            client,
            session,
            cart,
            products: Vec::new(),
            pagination: Pagination::new(page_size),
            query: CatalogQuery::default(),
        }
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Loads `page` (1-based). On failure the loaded list is emptied.
    ///
    /// # Errors
    /// Returns the request error.
    pub async fn load_page(&mut self, page: u32) -> ClientResult<()> {
        self.pagination.page = page.max(1);
        match api::products::list(&self.client, self.pagination.skip(), self.pagination.limit)
            .await
        {
            Ok(result) => {
                self.pagination.total = result.total;
                let pages = result.total.div_ceil(u64::from(self.pagination.limit));
                self.pagination.total_pages = u32::try_from(pages).unwrap_or(u32::MAX).max(1);
                self.products = result.products;
                Ok(())
            }
            Err(err) => {
                warn!(page, error = %err, "failed to load catalog page");
                self.products.clear();
                Err(err)
            }
        }
    }

    /// The loaded page with the current query applied.
    pub fn visible(&self) -> Vec<Product> {
        filter_products(&self.products, &self.query)
    }

    /// Distinct categories on the loaded page, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.products
            .iter()
            .filter_map(|p| p.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Full product details, falling back to the list entry when the
    /// request fails.
    ///
    /// # Errors
    /// Returns the request error only if the product is not on the page.
    pub async fn product_details(&self, product_id: i64) -> ClientResult<Product> {
        match api::products::get(&self.client, product_id).await {
            Ok(product) => Ok(product),
            Err(err) => {
                warn!(product_id, error = %err, "failed to load product details");
                self.products
                    .iter()
                    .find(|p| p.id == product_id)
                    .cloned()
                    .ok_or(err)
            }
        }
    }

    /// Adds to the cart, requiring a session first.
    ///
    /// # Errors
    /// `NotLoggedIn` without a session; otherwise whatever the cart returns.
    pub async fn add_to_cart(&self, product_id: i64, quantity: u32) -> ClientResult<()> {
        if !self.session.is_logged_in() {
            return Err(ClientError::validation(ValidationError::NotLoggedIn));
        }
        self.cart.add_to_cart(product_id, quantity).await
    }
}
