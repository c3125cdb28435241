//! Admin command handlers.

use std::path::Path;

use anyhow::{Context, Result};
use storefront_core::admin::{AdminPanel, AdminTab};
use storefront_core::api::types::{ImageUpload, ProductForm, Role};
use storefront_core::context::AppContext;

use super::{client_failure, require_session, table};

/// Product fields plus an optional image, as parsed from the command line.
pub struct ProductInput {
    pub form: ProductForm,
    pub image: Option<ImageUpload>,
}

/// Reads an image file, guessing the content type from its extension.
pub fn read_image(path: &Path) -> Result<ImageUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    let content_type = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(ImageUpload {
        file_name,
        content_type: content_type.to_string(),
        bytes,
    })
}

async fn panel(ctx: &AppContext) -> Result<AdminPanel> {
    require_session(ctx).await?;
    Ok(ctx.admin())
}

pub async fn products(ctx: &AppContext) -> Result<()> {
    let panel = panel(ctx).await?;
    panel
        .open_tab(AdminTab::Products)
        .await
        .map_err(|e| client_failure(ctx, "load products", e))?;
    print_products(&panel);
    Ok(())
}

pub async fn users(ctx: &AppContext) -> Result<()> {
    let panel = panel(ctx).await?;
    panel
        .open_tab(AdminTab::Users)
        .await
        .map_err(|e| client_failure(ctx, "load users", e))?;

    let mut rows = table(&["ID", "Email", "Role"]);
    for user in panel.snapshot().users {
        rows.add_row(vec![user.id.to_string(), user.email, user.role.to_string()]);
    }
    println!("{rows}");
    Ok(())
}

pub async fn stats(ctx: &AppContext) -> Result<()> {
    let panel = panel(ctx).await?;
    panel
        .open_tab(AdminTab::Stats)
        .await
        .map_err(|e| client_failure(ctx, "load statistics", e))?;

    if let Some(stats) = panel.snapshot().stats {
        println!("Products:");
        println!("{}", serde_json::to_string_pretty(&stats.products)?);
        println!("Categories:");
        println!("{}", serde_json::to_string_pretty(&stats.categories)?);
    }
    Ok(())
}

pub async fn toggle(ctx: &AppContext, id: i64) -> Result<()> {
    let panel = panel(ctx).await?;
    panel
        .toggle_product_active(id)
        .await
        .map_err(|e| client_failure(ctx, "toggle product", e))?;

    let state = panel.snapshot();
    match state.products.iter().find(|p| p.id == id) {
        Some(product) if product.is_active => println!("✓ Product {id} is now active"),
        Some(_) => println!("✓ Product {id} is now inactive"),
        None => println!("✓ Toggled product {id}"),
    }
    Ok(())
}

pub async fn delete(ctx: &AppContext, id: i64) -> Result<()> {
    let panel = panel(ctx).await?;
    panel
        .delete_product(id)
        .await
        .map_err(|e| client_failure(ctx, "delete product", e))?;
    println!("✓ Deleted product {id}");
    Ok(())
}

pub async fn set_role(ctx: &AppContext, id: i64, role: Role) -> Result<()> {
    let panel = panel(ctx).await?;
    panel
        .update_user_role(id, role.clone())
        .await
        .map_err(|e| client_failure(ctx, "update role", e))?;
    println!("✓ User {id} is now {role}");
    Ok(())
}

pub async fn create(ctx: &AppContext, input: ProductInput) -> Result<()> {
    if input.form.name.trim().is_empty() {
        anyhow::bail!("--name is required");
    }
    let panel = panel(ctx).await?;
    let created = panel
        .create_product(&input.form, input.image.as_ref())
        .await
        .map_err(|e| client_failure(ctx, "create product", e))?;
    println!("✓ Created product {} (#{})", created.name, created.id);
    Ok(())
}

pub async fn update(ctx: &AppContext, id: i64, input: ProductInput) -> Result<()> {
    let panel = panel(ctx).await?;
    panel
        .update_product(id, &input.form, input.image.as_ref())
        .await
        .map_err(|e| client_failure(ctx, "update product", e))?;
    println!("✓ Updated product {id}");
    Ok(())
}

fn print_products(panel: &AdminPanel) {
    let mut rows = table(&["ID", "Name", "Price", "Stock", "Status"]);
    for product in panel.snapshot().products {
        let status = if product.is_active { "active" } else { "inactive" };
        rows.add_row(vec![
            product.id.to_string(),
            product.name,
            format!("{:.2}", product.price),
            product.stock.to_string(),
            status.to_string(),
        ]);
    }
    println!("{rows}");
}
