//! Cart synchronizer.
//!
//! Keeps a local view of the signed-in user's cart. The backend is the source
//! of truth: every successful mutation is followed by a full refetch of the
//! items and the count, never by local arithmetic. `clear_cart` is the one
//! exception since the empty result is already known.
//!
//! Mutations (and their refetch) are serialized through one async lock, so
//! rapid successive writes resolve in order and the last refetch reflects
//! all of them. `loading` is true while any cart request is in flight.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api;
use crate::api::types::CartItem;
use crate::error::{ClientError, ClientResult, ValidationError};
use crate::http::ApiClient;
use crate::session::Session;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartState {
    pub items: Vec<CartItem>,
    /// Server-reported item count (`GET /cart/count`).
    pub count: u32,
    /// Number of cart requests currently in flight.
    pub in_flight: usize,
}

impl CartState {
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }
}

pub struct CartSynchronizer {
    client: ApiClient,
    session: watch::Receiver<Session>,
    state: watch::Sender<CartState>,
    write_lock: Mutex<()>,
}

impl CartSynchronizer {
    /// The session receiver gates all cart data: logged out means empty.
    pub fn new(client: ApiClient, session: watch::Receiver<Session>) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            client,
            session,
            state,
            write_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    fn logged_in(&self) -> bool {
        self.session.borrow().is_logged_in
    }

    /// Refetches items and count. Logged out: clears local state, no request.
    ///
    /// # Errors
    /// Returns the first failing request's error.
    pub async fn fetch_cart(&self) -> ClientResult<()> {
        let _writes = self.write_lock.lock().await;
        self.resync().await
    }

    /// Adds a product line, then resyncs.
    ///
    /// # Errors
    /// `InvalidQuantity` for zero, `NotLoggedIn` without a session (both
    /// before any request), otherwise the backend error.
    pub async fn add_to_cart(&self, product_id: i64, quantity: u32) -> ClientResult<()> {
        if quantity < 1 {
            return Err(ClientError::validation(ValidationError::InvalidQuantity));
        }
        if !self.logged_in() {
            return Err(ClientError::validation(ValidationError::NotLoggedIn));
        }

        let _writes = self.write_lock.lock().await;
        self.tracked(api::cart::add(&self.client, product_id, quantity))
            .await
            .inspect_err(|e| warn!(product_id, error = %e, "add to cart failed"))?;
        self.resync().await
    }

    /// Sets a line's quantity, then resyncs.
    ///
    /// # Errors
    /// `InvalidQuantity` below 1 without touching the network, otherwise the
    /// backend error.
    pub async fn update_cart_item(&self, item_id: i64, quantity: u32) -> ClientResult<()> {
        if quantity < 1 {
            return Err(ClientError::validation(ValidationError::InvalidQuantity));
        }

        let _writes = self.write_lock.lock().await;
        self.tracked(api::cart::update(&self.client, item_id, quantity))
            .await
            .inspect_err(|e| warn!(item_id, error = %e, "cart update failed"))?;
        self.resync().await
    }

    /// Removes a line, then resyncs.
    ///
    /// # Errors
    /// Returns the backend error.
    pub async fn remove_from_cart(&self, item_id: i64) -> ClientResult<()> {
        let _writes = self.write_lock.lock().await;
        self.tracked(api::cart::remove(&self.client, item_id))
            .await
            .inspect_err(|e| warn!(item_id, error = %e, "cart remove failed"))?;
        self.resync().await
    }

    /// Empties the cart and sets local state to empty directly.
    ///
    /// # Errors
    /// Returns the backend error; local state is untouched on failure.
    pub async fn clear_cart(&self) -> ClientResult<()> {
        let _writes = self.write_lock.lock().await;
        self.tracked(api::cart::clear(&self.client))
            .await
            .inspect_err(|e| warn!(error = %e, "cart clear failed"))?;
        self.reset();
        Ok(())
    }

    /// Follows the session: refetch on login, clear on logout. Waits out the
    /// startup auth check so an unvalidated token never hits the cart.
    pub fn spawn_session_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut session = self.session.clone();
        let cart = Arc::clone(self);
        tokio::spawn(async move {
            let mut active = false;
            loop {
                let now = {
                    let s = session.borrow_and_update();
                    s.is_logged_in && !s.is_auth_checking
                };
                if now != active {
                    active = now;
                    if active {
                        debug!("session active; loading cart");
                        if let Err(err) = cart.fetch_cart().await {
                            warn!(error = %err, "failed to load cart");
                        }
                    } else {
                        debug!("session ended; clearing cart");
                        cart.reset();
                    }
                }
                if session.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    async fn resync(&self) -> ClientResult<()> {
        if !self.logged_in() {
            self.reset();
            return Ok(());
        }

        let items = self.tracked(api::cart::items(&self.client)).await?;
        self.state.send_modify(|s| s.items = items);
        let count = self.tracked(api::cart::count(&self.client)).await?;
        self.state.send_modify(|s| s.count = count);
        Ok(())
    }

    async fn tracked<T>(&self, request: impl Future<Output = ClientResult<T>>) -> ClientResult<T> {
        let _busy = InFlight::start(&self.state);
        request.await
    }

    fn reset(&self) {
        self.state.send_modify(|s| {
            s.items.clear();
            s.count = 0;
        });
    }
}

/// Bumps `in_flight` for its lifetime.
struct InFlight<'a> {
    state: &'a watch::Sender<CartState>,
}

impl<'a> InFlight<'a> {
    fn start(state: &'a watch::Sender<CartState>) -> Self {
        state.send_modify(|s| s.in_flight += 1);
        Self { state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state
            .send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
    }
}
