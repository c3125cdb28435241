//! Wire types for the storefront REST API.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Product as returned by `/products/` and the admin endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_true() -> bool {
    true
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub product_id: i64,
    pub quantity: u32,
    /// Embedded product snapshot, when the backend includes one.
    #[serde(default)]
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CartCount {
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NewCartItem {
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartItemUpdate {
    pub quantity: u32,
}

/// User role. Unknown wire values are preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "USER")]
    User,
    #[serde(untagged)]
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Other(s) => s,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Role::Admin,
            "USER" => Role::User,
            other => Role::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleUpdate {
    pub role: Role,
}

/// Body of `/auth/login`, `/auth/register` and `/auth/refresh` responses.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// One page of the public product listing.
///
/// The listing endpoint answers either with a bare array or with an object
/// wrapping the array under `products`/`items` plus `total`/`count`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
}

impl<'de> Deserialize<'de> for ProductPage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Bare(Vec<Product>),
            Wrapped {
                #[serde(alias = "items")]
                products: Vec<Product>,
                #[serde(default, alias = "count")]
                total: Option<u64>,
            },
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Bare(products) => ProductPage {
                total: products.len() as u64,
                products,
            },
            Wire::Wrapped { products, total } => ProductPage {
                total: total.unwrap_or(products.len() as u64),
                products,
            },
        })
    }
}

/// Product fields accepted by the admin create/update endpoints.
///
/// Empty strings and `None` are omitted from the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub weight: Option<f64>,
    pub dimensions: Option<String>,
    pub is_active: Option<bool>,
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ProductForm {
    /// Non-empty fields as `(name, value)` pairs in wire order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(name) = trimmed(Some(&self.name)) {
            out.push(("name", name));
        }
        if let Some(v) = trimmed(self.description.as_ref()) {
            out.push(("description", v));
        }
        if let Some(v) = self.price {
            out.push(("price", v.to_string()));
        }
        if let Some(v) = self.stock {
            out.push(("stock", v.to_string()));
        }
        if let Some(v) = trimmed(self.category.as_ref()) {
            out.push(("category", v));
        }
        if let Some(v) = trimmed(self.sku.as_ref()) {
            out.push(("sku", v));
        }
        if let Some(v) = self.weight {
            out.push(("weight", v.to_string()));
        }
        if let Some(v) = trimmed(self.dimensions.as_ref()) {
            out.push(("dimensions", v));
        }
        if let Some(v) = self.is_active {
            out.push(("is_active", v.to_string()));
        }
        out
    }

    /// JSON body for `PUT /products/admin/{id}`, typed where the backend
    /// expects numbers and booleans.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        };
        put("name", trimmed(Some(&self.name)).map(Value::String));
        put(
            "description",
            trimmed(self.description.as_ref()).map(Value::String),
        );
        put("price", self.price.map(Value::from));
        put("stock", self.stock.map(Value::from));
        put("category", trimmed(self.category.as_ref()).map(Value::String));
        put("sku", trimmed(self.sku.as_ref()).map(Value::String));
        put("weight", self.weight.map(Value::from));
        put(
            "dimensions",
            trimmed(self.dimensions.as_ref()).map(Value::String),
        );
        put("is_active", self.is_active.map(Value::Bool));
        Value::Object(map)
    }
}

/// Image bytes for the admin multipart endpoints. Passed through untouched.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Admin statistics. Shapes are backend-defined, so kept as JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminStats {
    pub products: Value,
    pub categories: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_page_accepts_bare_array() {
        let page: ProductPage =
            serde_json::from_str(r#"[{"id":1,"name":"Tea","price":3.5}]"#).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.products[0].name, "Tea");
        assert!(page.products[0].is_active);
    }

    #[test]
    fn test_product_page_accepts_wrapped_forms() {
        let page: ProductPage =
            serde_json::from_str(r#"{"products":[{"id":1},{"id":2}],"total":40}"#).unwrap();
        assert_eq!(page.total, 40);
        assert_eq!(page.products.len(), 2);

        let page: ProductPage =
            serde_json::from_str(r#"{"items":[{"id":7}],"count":9}"#).unwrap();
        assert_eq!(page.total, 9);

        let page: ProductPage = serde_json::from_str(r#"{"items":[{"id":7}]}"#).unwrap();
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_product_page_rejects_other_shapes() {
        assert!(serde_json::from_str::<ProductPage>(r#"{"data":"nope"}"#).is_err());
    }

    #[test]
    fn test_role_wire_names() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"email":"a@b.c","role":"ADMIN"}"#).unwrap();
        assert!(user.is_admin());

        let user: User =
            serde_json::from_str(r#"{"id":2,"email":"x@y.z","role":"MANAGER"}"#).unwrap();
        assert_eq!(user.role, Role::Other("MANAGER".to_string()));
        assert!(!user.is_admin());

        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!(
            serde_json::to_string(&RoleUpdate { role: Role::Admin }).unwrap(),
            r#"{"role":"ADMIN"}"#
        );
    }

    #[test]
    fn test_product_form_skips_empty_fields() {
        let form = ProductForm {
            name: "Lamp".to_string(),
            description: Some("  ".to_string()),
            price: Some(19.5),
            stock: Some(3),
            category: Some(String::new()),
            is_active: Some(true),
            ..ProductForm::default()
        };

        let keys: Vec<&str> = form.fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["name", "price", "stock", "is_active"]);

        let json = form.to_json();
        assert_eq!(json["price"], serde_json::json!(19.5));
        assert_eq!(json["stock"], serde_json::json!(3));
        assert_eq!(json["is_active"], serde_json::json!(true));
        assert!(json.get("description").is_none());
        assert!(json.get("category").is_none());
        assert_eq!(json["name"], serde_json::json!("Lamp"));
    }

    #[test]
    fn test_product_form_json_keeps_whole_number_price_numeric() {
        let form = ProductForm {
            name: " Desk ".to_string(),
            price: Some(120.0),
            weight: Some(7.25),
            stock: Some(0),
            is_active: Some(false),
            ..ProductForm::default()
        };

        assert_eq!(
            form.to_json(),
            serde_json::json!({
                "name": "Desk",
                "price": 120.0,
                "stock": 0,
                "weight": 7.25,
                "is_active": false
            })
        );
    }
}
