//! Application root.
//!
//! `AppContext` is constructed once and handed to the view layer. It owns
//! the background listeners (unauthorized signal, session-driven cart
//! refresh) and aborts them when shut down or dropped.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::admin::AdminPanel;
use crate::cart::CartSynchronizer;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::http::ApiClient;
use crate::navigation::Navigator;
use crate::session::SessionManager;
use crate::tokens::TokenStore;

pub struct AppContext {
    pub config: Config,
    pub client: ApiClient,
    pub navigator: Navigator,
    pub session: Arc<SessionManager>,
    pub cart: Arc<CartSynchronizer>,
    listeners: Vec<JoinHandle<()>>,
}

impl AppContext {
    /// Wires the client, session manager and cart synchronizer and starts
    /// the listeners. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built from `config`.
    pub fn new(config: Config, tokens: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        let mut ctx = Self::detached(config, tokens)?;
        ctx.listen();
        Ok(ctx)
    }

    /// Like [`Self::new`] but without background listeners. One-shot callers
    /// react to 401s themselves via [`SessionManager::handle_unauthorized`].
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built from `config`.
    pub fn detached(config: Config, tokens: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        let client = ApiClient::from_config(&config, Arc::clone(&tokens))?;
        Ok(Self::wire(config, client, tokens))
    }

    /// Like [`Self::new`] with a prebuilt client.
    pub fn with_client(config: Config, client: ApiClient, tokens: Arc<dyn TokenStore>) -> Self {
        let mut ctx = Self::wire(config, client, tokens);
        ctx.listen();
        ctx
    }

    fn wire(config: Config, client: ApiClient, tokens: Arc<dyn TokenStore>) -> Self {
        let navigator = Navigator::new();
        let session = Arc::new(SessionManager::new(
            client.clone(),
            tokens,
            navigator.clone(),
        ));
        let cart = Arc::new(CartSynchronizer::new(client.clone(), session.subscribe()));

        Self {
            config,
            client,
            navigator,
            session,
            cart,
            listeners: Vec::new(),
        }
    }

    /// Spawns the unauthorized-signal and session-driven cart listeners.
    /// No-op when they are already running.
    pub fn listen(&mut self) {
        if !self.listeners.is_empty() {
            return;
        }
        self.listeners = vec![
            self.session.spawn_unauthorized_listener(),
            self.cart.spawn_session_listener(),
        ];
    }

    /// Validates stored credentials; call before rendering protected views.
    pub async fn start(&self) -> bool {
        self.session.check_auth().await
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(
            self.client.clone(),
            Arc::clone(&self.session),
            Arc::clone(&self.cart),
            self.config.catalog.page_size,
        )
    }

    pub fn admin(&self) -> AdminPanel {
        AdminPanel::new(
            self.client.clone(),
            Arc::clone(&self.session),
            self.config.admin.page_size,
        )
    }

    /// Stops the background listeners.
    pub fn shutdown(&mut self) {
        for listener in self.listeners.drain(..) {
            listener.abort();
        }
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
