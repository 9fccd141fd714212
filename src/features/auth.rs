//! # Authentication
//!
//! Session lifecycle: restore the persisted session at startup, exchange
//! credentials for a new one, and log out. The login call runs under a
//! cancellation key so an abandoned login screen leaves nothing behind.
//!
//! A restored session that has already expired is discarded; the app
//! starts logged out rather than presenting a dead token.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::api::{Credentials, FailureKind, MarketplaceApi, Session};
use crate::runtime::{CancelKey, Effect, Reducer};
use crate::storage::SessionStore;

/// The in-flight login exchange.
pub const LOGIN_TASK: CancelKey = CancelKey::from_static("auth.login");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub logging_in: bool,
    pub restoring: bool,
    pub error: Option<FailureKind>,
}

impl AuthState {
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    /// Load the persisted session, if any.
    Restore,
    Restored(Option<Session>),
    RestoreFailed(FailureKind),
    Login(Credentials),
    LoggedIn(Session),
    LoginFailed(FailureKind),
    /// Abandon an in-flight login.
    CancelLogin,
    Logout,
}

pub struct AuthReducer {
    api: Arc<dyn MarketplaceApi>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthReducer {
    pub fn new(api: Arc<dyn MarketplaceApi>, sessions: Arc<dyn SessionStore>) -> Self {
        AuthReducer { api, sessions }
    }
}

impl Reducer for AuthReducer {
    type State = AuthState;
    type Action = AuthAction;

    fn reduce(&self, state: &mut AuthState, action: AuthAction) -> Effect<AuthAction> {
        match action {
            AuthAction::Restore => {
                state.restoring = true;
                let sessions = Arc::clone(&self.sessions);
                Effect::run(move |emitter| async move {
                    match sessions.load().await {
                        Ok(session) => {
                            // Expiry is judged here, against the load-time
                            // clock; Restored carries the verdict.
                            let session = session.filter(|s| {
                                if s.is_expired() {
                                    debug!("discarding expired session for user {}", s.user_id);
                                    false
                                } else {
                                    true
                                }
                            });
                            emitter.emit(AuthAction::Restored(session));
                        }
                        Err(e) => {
                            warn!("session restore failed: {}", e);
                            emitter.emit(AuthAction::RestoreFailed(e.kind()));
                        }
                    }
                })
            }
            AuthAction::Restored(session) => {
                state.restoring = false;
                if let Some(s) = &session {
                    info!("restored session for user {}", s.user_id);
                }
                state.session = session;
                Effect::none()
            }
            AuthAction::RestoreFailed(_) => {
                // A broken session file means starting logged out, not an
                // error banner.
                state.restoring = false;
                state.session = None;
                Effect::none()
            }
            AuthAction::Login(credentials) => {
                state.logging_in = true;
                state.error = None;
                let api = Arc::clone(&self.api);
                let sessions = Arc::clone(&self.sessions);
                Effect::run(move |emitter| async move {
                    match api.login(&credentials).await {
                        Ok(session) => {
                            if let Err(e) = sessions.save(&session).await {
                                warn!("failed to persist session: {}", e);
                            }
                            emitter.emit(AuthAction::LoggedIn(session));
                        }
                        Err(e) => {
                            warn!("login failed: {}", e);
                            emitter.emit(AuthAction::LoginFailed(e.kind()));
                        }
                    }
                })
                .cancellable(LOGIN_TASK)
            }
            AuthAction::LoggedIn(session) => {
                info!("logged in as user {}", session.user_id);
                state.logging_in = false;
                state.session = Some(session);
                Effect::none()
            }
            AuthAction::LoginFailed(kind) => {
                state.logging_in = false;
                state.error = Some(kind);
                Effect::none()
            }
            AuthAction::CancelLogin => {
                state.logging_in = false;
                Effect::cancel(LOGIN_TASK)
            }
            AuthAction::Logout => {
                info!("logged out");
                state.session = None;
                state.logging_in = false;
                state.error = None;
                let sessions = Arc::clone(&self.sessions);
                Effect::merge([
                    Effect::cancel(LOGIN_TASK),
                    Effect::run(move |_emitter| async move {
                        if let Err(e) = sessions.clear().await {
                            warn!("failed to clear stored session: {}", e);
                        }
                    }),
                ])
            }
        }
    }
}
