//! Current view and route guards.

use tokio::sync::watch;

use crate::session::Session;

/// Top-level views of the storefront.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Home,
    Catalog,
    Cart,
    Profile,
    Admin,
}

/// Outcome of a route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Auth check still pending; render a loading state.
    Loading,
    Allow,
    Redirect(View),
}

/// Publishes the current view to observers.
#[derive(Debug, Clone)]
pub struct Navigator {
    tx: watch::Sender<View>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(View::Home);
        Self { tx }
    }

    pub fn navigate(&self, view: View) {
        self.tx.send_replace(view);
    }

    pub fn current(&self) -> View {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.tx.subscribe()
    }
}

/// Guard for views that need a logged-in user.
pub fn protected_route(session: &Session) -> RouteDecision {
    if session.is_auth_checking {
        RouteDecision::Loading
    } else if session.is_logged_in {
        RouteDecision::Allow
    } else {
        RouteDecision::Redirect(View::Home)
    }
}

/// Guard for the admin panel.
pub fn admin_route(session: &Session) -> RouteDecision {
    match protected_route(session) {
        RouteDecision::Allow if !session.is_admin() => RouteDecision::Redirect(View::Profile),
        other => other,
    }
}
