//! Admin panel model.
//!
//! Every operation checks the session's role first and refuses without
//! sending anything when the user is not an admin. State is published on a
//! watch channel like the session and cart.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use crate::api;
use crate::api::types::{AdminStats, ImageUpload, Product, ProductForm, Role, User};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::session::SessionManager;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdminTab {
    #[default]
    Products,
    Users,
    Stats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminState {
    pub tab: AdminTab,
    pub products: Vec<Product>,
    pub users: Vec<User>,
    pub stats: Option<AdminStats>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct AdminPanel {
    client: ApiClient,
    session: Arc<SessionManager>,
    page_size: u32,
    state: watch::Sender<AdminState>,
}

impl AdminPanel {
    pub fn new(client: ApiClient, session: Arc<SessionManager>, page_size: u32) -> Self {
        let (state, _) = watch::channel(AdminState::default());
        Self {
            client,
            session,
            page_size,
            state,
        }
    }

    pub fn snapshot(&self) -> AdminState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AdminState> {
        self.state.subscribe()
    }

    fn require_admin(&self) -> ClientResult<()> {
        if self.session.snapshot().is_admin() {
            Ok(())
        } else {
            let err = ClientError::access_denied();
            self.state
                .send_modify(|s| s.error = Some(err.message.clone()));
            Err(err)
        }
    }

    /// Switches tab and loads its data.
    ///
    /// # Errors
    /// `AccessDenied` for non-admins, otherwise the request error.
    pub async fn open_tab(&self, tab: AdminTab) -> ClientResult<()> {
        self.require_admin()?;
        self.state.send_modify(|s| {
            s.tab = tab;
            s.loading = true;
            s.error = None;
        });

        let result = match tab {
            AdminTab::Products => self.load_products().await,
            AdminTab::Users => self.load_users().await,
            AdminTab::Stats => self.load_stats().await,
        };
        self.state.send_modify(|s| s.loading = false);
        result
    }

    async fn load_products(&self) -> ClientResult<()> {
        let products = api::products::list_all(&self.client, 0, self.page_size, true)
            .await
            .inspect_err(|e| self.record("Ошибка загрузки товаров", e))?;
        self.state.send_modify(|s| s.products = products);
        Ok(())
    }

    async fn load_users(&self) -> ClientResult<()> {
        let users = api::users::list(&self.client)
            .await
            .inspect_err(|e| self.record("Ошибка загрузки пользователей", e))?;
        self.state.send_modify(|s| s.users = users);
        Ok(())
    }

    async fn load_stats(&self) -> ClientResult<()> {
        let (products, categories) = tokio::try_join!(
            api::products::product_stats(&self.client),
            api::products::category_stats(&self.client),
        )
        .inspect_err(|e| self.record("Ошибка загрузки статистики", e))?;
        self.state.send_modify(|s| {
            s.stats = Some(AdminStats {
                products,
                categories,
            });
        });
        Ok(())
    }

    /// # Errors
    /// `AccessDenied` for non-admins, otherwise the request error.
    pub async fn toggle_product_active(&self, product_id: i64) -> ClientResult<()> {
        self.require_admin()?;
        api::products::toggle_active(&self.client, product_id)
            .await
            .inspect_err(|e| self.record("Ошибка обновления товара", e))?;
        self.load_products().await
    }

    /// # Errors
    /// `AccessDenied` for non-admins, otherwise the request error.
    pub async fn delete_product(&self, product_id: i64) -> ClientResult<()> {
        self.require_admin()?;
        api::products::delete(&self.client, product_id)
            .await
            .inspect_err(|e| self.record("Ошибка удаления товара", e))?;
        self.load_products().await
    }

    /// # Errors
    /// `AccessDenied` for non-admins, otherwise the request error.
    pub async fn update_user_role(&self, user_id: i64, role: Role) -> ClientResult<()> {
        self.require_admin()?;
        api::users::update_role(&self.client, user_id, role)
            .await
            .inspect_err(|e| self.record("Ошибка обновления пользователя", e))?;
        self.load_users().await
    }

    /// Creates a product (multipart, optional image) and reloads the list.
    ///
    /// # Errors
    /// `AccessDenied` for non-admins, otherwise the request error.
    pub async fn create_product(
        &self,
        form: &ProductForm,
        image: Option<&ImageUpload>,
    ) -> ClientResult<Product> {
        self.require_admin()?;
        let created = api::products::create(&self.client, form, image)
            .await
            .inspect_err(|e| self.record("Ошибка добавления товара", e))?;
        self.load_products().await?;
        Ok(created)
    }

    /// Updates product fields, then the image when one is given, then
    /// reloads the list.
    ///
    /// # Errors
    /// `AccessDenied` for non-admins, otherwise the first failing request.
    pub async fn update_product(
        &self,
        product_id: i64,
        form: &ProductForm,
        image: Option<&ImageUpload>,
    ) -> ClientResult<()> {
        self.require_admin()?;
        api::products::update(&self.client, product_id, form)
            .await
            .inspect_err(|e| self.record("Ошибка обновления товара", e))?;
        if let Some(image) = image {
            api::products::update_image(&self.client, product_id, image)
                .await
                .inspect_err(|e| self.record("Ошибка обновления товара", e))?;
        }
        self.load_products().await
    }

    fn record(&self, fallback: &str, err: &ClientError) {
        warn!(error = %err, "{fallback}");
        let message = err.user_message_or(fallback).to_string();
        self.state.send_modify(|s| s.error = Some(message));
    }
}
