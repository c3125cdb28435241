//! Catalog command handlers.

use anyhow::Result;
use comfy_table::Table;
use storefront_core::api::types::Product;
use storefront_core::catalog::{LOAD_FAILURE, SortBy};
use storefront_core::context::AppContext;

use super::{client_failure, table};

pub async fn list(
    ctx: &AppContext,
    page: u32,
    search: String,
    category: Option<String>,
    sort: SortBy,
) -> Result<()> {
    let mut catalog = ctx.catalog();
    catalog
        .load_page(page)
        .await
        .map_err(|e| client_failure(ctx, LOAD_FAILURE, e))?;

    catalog.query.search = search;
    catalog.query.category = category;
    catalog.query.sort = sort;

    let visible = catalog.visible();
    if visible.is_empty() {
        println!("No products found.");
    } else {
        println!("{}", product_table(&visible));
    }

    let pagination = catalog.pagination();
    println!(
        "Page {}/{} ({} products)",
        pagination.page, pagination.total_pages, pagination.total
    );
    Ok(())
}

pub async fn show(ctx: &AppContext, id: i64) -> Result<()> {
    let product = ctx
        .catalog()
        .product_details(id)
        .await
        .map_err(|e| client_failure(ctx, "load product", e))?;

    println!("{} (#{})", product.name, product.id);
    match product.original_price {
        Some(original) if original > product.price => {
            println!("  price: {:.2} (was {original:.2})", product.price);
        }
        _ => println!("  price: {:.2}", product.price),
    }
    println!("  stock: {}", product.stock);
    if let Some(category) = &product.category {
        println!("  category: {category}");
    }
    if let Some(rating) = product.rating {
        println!("  rating: {rating:.1}");
    }
    if let Some(sku) = &product.sku {
        println!("  sku: {sku}");
    }
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("{description}");
    }
    Ok(())
}

fn product_table(products: &[Product]) -> Table {
    let mut rows = table(&["ID", "Name", "Price", "Category", "Stock"]);
    for product in products {
        rows.add_row(vec![
            product.id.to_string(),
            product.name.clone(),
            format!("{:.2}", product.price),
            product.category.clone().unwrap_or_else(|| "-".to_string()),
            product.stock.to_string(),
        ]);
    }
    rows
}
