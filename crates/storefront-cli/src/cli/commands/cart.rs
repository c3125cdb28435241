//! Cart command handlers.

use anyhow::Result;
use storefront_core::cart::CartState;
use storefront_core::context::AppContext;

use super::{client_failure, require_session, table};

pub async fn show(ctx: &AppContext) -> Result<()> {
    require_session(ctx).await?;
    ctx.cart
        .fetch_cart()
        .await
        .map_err(|e| client_failure(ctx, "load cart", e))?;
    print_cart(&ctx.cart.snapshot());
    Ok(())
}

pub async fn add(ctx: &AppContext, product_id: i64, quantity: u32) -> Result<()> {
    require_session(ctx).await?;
    ctx.cart
        .add_to_cart(product_id, quantity)
        .await
        .map_err(|e| client_failure(ctx, "add to cart", e))?;
    println!("✓ Added product {product_id} (x{quantity})");
    print_cart(&ctx.cart.snapshot());
    Ok(())
}

pub async fn update(ctx: &AppContext, item_id: i64, quantity: u32) -> Result<()> {
    require_session(ctx).await?;
    ctx.cart
        .update_cart_item(item_id, quantity)
        .await
        .map_err(|e| client_failure(ctx, "update cart item", e))?;
    println!("✓ Updated item {item_id}");
    print_cart(&ctx.cart.snapshot());
    Ok(())
}

pub async fn remove(ctx: &AppContext, item_id: i64) -> Result<()> {
    require_session(ctx).await?;
    ctx.cart
        .remove_from_cart(item_id)
        .await
        .map_err(|e| client_failure(ctx, "remove cart item", e))?;
    println!("✓ Removed item {item_id}");
    print_cart(&ctx.cart.snapshot());
    Ok(())
}

pub async fn clear(ctx: &AppContext) -> Result<()> {
    require_session(ctx).await?;
    ctx.cart
        .clear_cart()
        .await
        .map_err(|e| client_failure(ctx, "clear cart", e))?;
    println!("✓ Cart cleared");
    Ok(())
}

fn print_cart(state: &CartState) {
    if state.items.is_empty() {
        println!("Cart is empty.");
        return;
    }

    let mut rows = table(&["Item", "Product", "Qty", "Price", "Subtotal"]);
    let mut total = 0.0;
    for item in &state.items {
        match &item.product {
            Some(product) => {
                let subtotal = product.price * f64::from(item.quantity);
                total += subtotal;
                rows.add_row(vec![
                    item.id.to_string(),
                    product.name.clone(),
                    item.quantity.to_string(),
                    format!("{:.2}", product.price),
                    format!("{subtotal:.2}"),
                ]);
            }
            None => {
                rows.add_row(vec![
                    item.id.to_string(),
                    format!("#{}", item.product_id),
                    item.quantity.to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ]);
            }
        }
    }
    println!("{rows}");
    println!("Items: {}  Total: {total:.2}", state.count);
}
