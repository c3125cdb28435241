//! Session manager.
//!
//! Single source of truth for "is this client authenticated". Owns the
//! session state machine, the auth modal form, and every write to the token
//! store (login, register, refresh, logout, unauthorized reset).
//!
//! STATE
//! =====
//! Session and modal state live in `watch` channels so views can re-render
//! on change. Writers go through `send_modify`, which never fails even with
//! no subscribers.
//!
//! UNAUTHORIZED SIGNAL
//! ===================
//! [`SessionManager::spawn_unauthorized_listener`] subscribes to the HTTP
//! adapter's broadcast channel and resets the session on every 401, except
//! those from the credential endpoints where a 401 only means "wrong
//! password".

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api;
use crate::api::types::{TokenResponse, User};
use crate::error::{ClientError, ClientErrorKind, ClientResult, ValidationError};
use crate::http::{ApiClient, AuthEvent};
use crate::navigation::{Navigator, View};
use crate::tokens::{TokenPair, TokenStore};

/// Fallback shown when authentication fails without a backend detail.
pub const AUTH_FAILURE_FALLBACK: &str = "Произошла ошибка при аутентификации";

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authentication state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub is_logged_in: bool,
    pub is_auth_checking: bool,
    pub tokens: Option<TokenPair>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    fn logged_out() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// Login/register form. Ephemeral: reset whenever the modal opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthModalState {
    pub is_open: bool,
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub password_error: Option<String>,
}

/// Checks registration passwords before anything is sent.
///
/// # Errors
/// `PasswordMismatch` when the confirmation differs, otherwise
/// `PasswordTooShort` below [`MIN_PASSWORD_LEN`] characters.
pub fn validate_registration(password: &str, confirm_password: &str) -> Result<(), ValidationError> {
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub struct SessionManager {
    client: ApiClient,
    tokens: Arc<dyn TokenStore>,
    navigator: Navigator,
    session: watch::Sender<Session>,
    modal: watch::Sender<AuthModalState>,
}

impl SessionManager {
    /// Creates the manager. `is_logged_in` starts from token presence and
    /// `is_auth_checking` stays true until [`Self::check_auth`] completes.
    pub fn new(client: ApiClient, tokens: Arc<dyn TokenStore>, navigator: Navigator) -> Self {
        let stored = tokens.load().unwrap_or_else(|e| {
            warn!(error = %format!("{e:#}"), "failed to read stored tokens");
            None
        });
        let initial = Session {
            is_logged_in: stored.is_some(),
            is_auth_checking: true,
            tokens: stored,
            user: None,
        };
        let (session, _) = watch::channel(initial);
        let (modal, _) = watch::channel(AuthModalState::default());
        Self {
            client,
            tokens,
            navigator,
            session,
            modal,
        }
    }

    pub fn snapshot(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.borrow().is_logged_in
    }

    pub fn modal(&self) -> AuthModalState {
        self.modal.borrow().clone()
    }

    pub fn subscribe_modal(&self) -> watch::Receiver<AuthModalState> {
        self.modal.subscribe()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Validates stored credentials against the backend.
    ///
    /// Without a stored token this settles immediately with no request. A
    /// failed validation clears the stored tokens. Always ends with
    /// `is_auth_checking == false`. Returns the resulting logged-in flag.
    pub async fn check_auth(&self) -> bool {
        self.session.send_modify(|s| s.is_auth_checking = true);

        let stored = match self.tokens.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "failed to read stored tokens");
                None
            }
        };

        let Some(tokens) = stored else {
            debug!("no stored token; skipping validation");
            self.session.send_replace(Session::logged_out());
            return false;
        };

        match api::auth::me(&self.client).await {
            Ok(user) => {
                debug!(user_id = user.id, "stored token validated");
                self.session.send_replace(Session {
                    is_logged_in: true,
                    is_auth_checking: false,
                    tokens: Some(tokens),
                    user: Some(user),
                });
                true
            }
            Err(err) => {
                info!(error = %err, "stored token rejected; clearing session");
                self.clear_stored_tokens();
                self.session.send_replace(Session::logged_out());
                false
            }
        }
    }

    /// Submits the auth modal in its current mode.
    ///
    /// Register mode validates the passwords locally first. On success the
    /// token pair is persisted, the session is logged in, the modal closes
    /// with its credential fields cleared, and the view moves to `Profile`.
    /// On failure the modal's `error` holds the most specific message and
    /// stored tokens are left alone.
    ///
    /// # Errors
    /// Returns the validation, transport or backend error that stopped the
    /// attempt.
    pub async fn handle_auth(&self) -> ClientResult<()> {
        let form = self.modal();
        self.modal.send_modify(|m| {
            m.is_loading = true;
            m.error = None;
        });

        if form.mode == AuthMode::Register {
            if let Err(invalid) = validate_registration(&form.password, &form.confirm_password) {
                self.modal.send_modify(|m| {
                    m.password_error = Some(invalid.message().to_string());
                    m.is_loading = false;
                });
                return Err(ClientError::validation(invalid));
            }
        }
        self.modal.send_modify(|m| m.password_error = None);

        let response = match form.mode {
            AuthMode::Login => api::auth::login(&self.client, &form.email, &form.password).await,
            AuthMode::Register => {
                api::auth::register(
                    &self.client,
                    &form.email,
                    &form.password,
                    &form.confirm_password,
                )
                .await
            }
        };

        let outcome = match response {
            Ok(response) => self.complete_login(response).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                self.modal.send_modify(|m| {
                    m.is_open = false;
                    m.is_loading = false;
                    m.error = None;
                    m.email.clear();
                    m.password.clear();
                    m.confirm_password.clear();
                });
                self.navigator.navigate(View::Profile);
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, mode = ?form.mode, "authentication failed");
                let message = err.user_message_or(AUTH_FAILURE_FALLBACK).to_string();
                self.modal.send_modify(|m| {
                    m.error = Some(message);
                    m.is_loading = false;
                });
                Err(err)
            }
        }
    }

    async fn complete_login(&self, response: TokenResponse) -> ClientResult<()> {
        let pair = TokenPair {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        };
        self.tokens
            .save(&pair)
            .map_err(|e| ClientError::storage(format!("{e:#}")))?;

        self.session.send_replace(Session {
            is_logged_in: true,
            is_auth_checking: false,
            tokens: Some(pair),
            user: None,
        });
        info!("logged in");

        // The role gates the admin panel, but login itself already succeeded.
        if let Err(err) = self.fetch_profile().await {
            warn!(error = %err, "failed to load profile after login");
        }
        Ok(())
    }

    /// Loads the current user from `/auth/me` into the session.
    ///
    /// # Errors
    /// Returns the request error; a 401 also triggers the unauthorized reset.
    pub async fn fetch_profile(&self) -> ClientResult<User> {
        let user = api::auth::me(&self.client).await?;
        self.session.send_modify(|s| s.user = Some(user.clone()));
        Ok(user)
    }

    /// Logs out. The backend call is best effort; local state is always
    /// cleared and the view returns to `Home`.
    pub async fn logout(&self) {
        if let Err(err) = api::auth::logout(&self.client).await {
            warn!(error = %err, "logout request failed; clearing session anyway");
        }
        self.reset_session();
        self.navigator.navigate(View::Home);
        info!("logged out");
    }

    /// Exchanges the stored refresh token for a new pair.
    ///
    /// Any failure, including a missing refresh token, performs a full
    /// logout before returning the error.
    ///
    /// # Errors
    /// Returns the refresh failure.
    pub async fn refresh_token(&self) -> ClientResult<TokenPair> {
        let stored = self.tokens.load().ok().flatten();
        let Some(refresh) = stored.and_then(|t| t.refresh_token) else {
            self.logout().await;
            return Err(ClientError::new(
                ClientErrorKind::Unauthorized,
                "no refresh token stored",
            ));
        };

        let response = match api::auth::refresh(&self.client, &refresh).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "token refresh failed");
                self.logout().await;
                return Err(err);
            }
        };

        let pair = TokenPair {
            access_token: response.access_token,
            // Keep the old refresh token when the backend does not rotate it.
            refresh_token: response.refresh_token.or(Some(refresh)),
        };
        if let Err(e) = self.tokens.save(&pair) {
            self.logout().await;
            return Err(ClientError::storage(format!("{e:#}")));
        }

        self.session.send_modify(|s| {
            s.is_logged_in = true;
            s.tokens = Some(pair.clone());
        });
        debug!("token pair refreshed");
        Ok(pair)
    }

    /// Opens the modal in `mode` with a fresh form.
    pub fn open_auth_modal(&self, mode: AuthMode) {
        self.modal.send_replace(AuthModalState {
            is_open: true,
            mode,
            ..AuthModalState::default()
        });
    }

    pub fn close_auth_modal(&self) {
        self.modal.send_modify(|m| {
            m.is_open = false;
            m.error = None;
            m.password_error = None;
        });
    }

    pub fn set_auth_mode(&self, mode: AuthMode) {
        self.modal.send_modify(|m| m.mode = mode);
    }

    pub fn set_email(&self, email: impl Into<String>) {
        let email = email.into();
        self.modal.send_modify(|m| m.email = email);
    }

    pub fn set_password(&self, password: impl Into<String>) {
        let password = password.into();
        self.modal.send_modify(|m| m.password = password);
    }

    pub fn set_confirm_password(&self, confirm_password: impl Into<String>) {
        let confirm_password = confirm_password.into();
        self.modal.send_modify(|m| m.confirm_password = confirm_password);
    }

    /// Reaction to the unauthorized signal: drop credentials, go home.
    pub fn handle_unauthorized(&self) {
        if !self.is_logged_in() && self.session.borrow().tokens.is_none() {
            return;
        }
        info!("received unauthorized response; ending session");
        self.reset_session();
        self.navigator.navigate(View::Home);
    }

    /// Subscribes to the adapter's auth events for the lifetime of the
    /// returned task. The owner aborts the task at teardown.
    pub fn spawn_unauthorized_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.client.subscribe();
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::Unauthorized { path, .. }) => {
                        if is_credential_endpoint(&path) {
                            continue;
                        }
                        manager.handle_unauthorized();
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth events lagged");
                        manager.handle_unauthorized();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn reset_session(&self) {
        self.clear_stored_tokens();
        self.session.send_replace(Session::logged_out());
    }

    fn clear_stored_tokens(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %format!("{e:#}"), "failed to clear stored tokens");
        }
    }
}

/// A 401 from these means bad credentials, not an expired session.
fn is_credential_endpoint(path: &str) -> bool {
    let path = path.trim_end_matches('/');
    path.ends_with("/auth/login") || path.ends_with("/auth/register")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_mismatch_checked_first() {
        assert_eq!(
            validate_registration("abc", "abd"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_registration("abc", "abc"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(validate_registration("secret", "secret"), Ok(()));
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert_eq!(validate_registration("пароль", "пароль"), Ok(()));
        assert_eq!(
            validate_registration("парол", "парол"),
            Err(ValidationError::PasswordTooShort)
        );
    }

    #[test]
    fn test_credential_endpoints() {
        assert!(is_credential_endpoint("/api/v1/auth/login"));
        assert!(is_credential_endpoint("/api/v1/auth/register/"));
        assert!(!is_credential_endpoint("/api/v1/auth/me"));
        assert!(!is_credential_endpoint("/api/v1/cart/"));
    }
}
