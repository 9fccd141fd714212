//! # App Composition
//!
//! The whole client is one store over [`AppState`]/[`AppAction`]. Each
//! feature reducer is written against its own slice and lifted into the
//! app domain:
//!
//! ```text
//! AppAction ─▶ Combined ──▶ Scoped(search)    ──▶ SearchReducer
//!                       ──▶ Scoped(events)    ──▶ EventsReducer
//!                       ──▶ Scoped(favorites) ──▶ FavoritesReducer
//!                       ──▶ Scoped(auth)      ──▶ AuthReducer
//!                       ──▶ Scoped(tickets)   ──▶ TicketsReducer
//!                       ──▶ Coordinator            (cross-feature glue)
//! ```
//!
//! The coordinator runs after the feature reducers, so it reads their
//! already-updated slices. It owns no slice of its own; it only turns
//! one feature's milestones into another feature's actions:
//! - `Start` fans out into session restore, featured load, favorites load
//! - a login or a restored session kicks off a ticket wallet load
//! - logout clears the wallet (which also stops an in-flight load)

use std::sync::Arc;
use std::time::Duration;

use crate::api::MarketplaceApi;
use crate::runtime::{Combined, Effect, Reducer, Scoped};
use crate::storage::{FavoritesStore, SessionStore};

use super::auth::{AuthAction, AuthReducer, AuthState};
use super::events::{EventsAction, EventsReducer, EventsState};
use super::favorites::{FavoritesAction, FavoritesReducer, FavoritesState};
use super::search::{SearchAction, SearchReducer, SearchState};
use super::tickets::{TicketsAction, TicketsReducer, TicketsState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub search: SearchState,
    pub events: EventsState,
    pub favorites: FavoritesState,
    pub auth: AuthState,
    pub tickets: TicketsState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Dispatched once when the app comes up.
    Start,
    Search(SearchAction),
    Events(EventsAction),
    Favorites(FavoritesAction),
    Auth(AuthAction),
    Tickets(TicketsAction),
}

/// Build the app reducer from its collaborators.
pub fn app_reducer(
    api: Arc<dyn MarketplaceApi>,
    favorites: Arc<dyn FavoritesStore>,
    sessions: Arc<dyn SessionStore>,
    search_debounce: Duration,
) -> Combined<AppState, AppAction> {
    Combined::new()
        .with(Scoped::new(
            SearchReducer::new(Arc::clone(&api), search_debounce),
            |app: &mut AppState| &mut app.search,
            |action: &AppAction| match action {
                AppAction::Search(inner) => Some(inner.clone()),
                _ => None,
            },
            AppAction::Search,
        ))
        .with(Scoped::new(
            EventsReducer::new(Arc::clone(&api)),
            |app: &mut AppState| &mut app.events,
            |action: &AppAction| match action {
                AppAction::Events(inner) => Some(inner.clone()),
                _ => None,
            },
            AppAction::Events,
        ))
        .with(Scoped::new(
            FavoritesReducer::new(favorites),
            |app: &mut AppState| &mut app.favorites,
            |action: &AppAction| match action {
                AppAction::Favorites(inner) => Some(inner.clone()),
                _ => None,
            },
            AppAction::Favorites,
        ))
        .with(Scoped::new(
            AuthReducer::new(Arc::clone(&api), sessions),
            |app: &mut AppState| &mut app.auth,
            |action: &AppAction| match action {
                AppAction::Auth(inner) => Some(inner.clone()),
                _ => None,
            },
            AppAction::Auth,
        ))
        .with(Scoped::new(
            TicketsReducer::new(api),
            |app: &mut AppState| &mut app.tickets,
            |action: &AppAction| match action {
                AppAction::Tickets(inner) => Some(inner.clone()),
                _ => None,
            },
            AppAction::Tickets,
        ))
        .with(Coordinator)
}

/// Cross-feature glue. Must stay last in the composition.
struct Coordinator;

impl Reducer for Coordinator {
    type State = AppState;
    type Action = AppAction;

    fn reduce(&self, state: &mut AppState, action: AppAction) -> Effect<AppAction> {
        match action {
            AppAction::Start => Effect::merge([
                Effect::send(AppAction::Auth(AuthAction::Restore)),
                Effect::send(AppAction::Events(EventsAction::LoadFeatured)),
                Effect::send(AppAction::Favorites(FavoritesAction::Load)),
            ]),
            AppAction::Auth(AuthAction::LoggedIn(session)) => {
                Effect::send(AppAction::Tickets(TicketsAction::Load(session.token)))
            }
            AppAction::Auth(AuthAction::Restored(_)) => {
                // Expiry was resolved before Restored was emitted; the auth
                // slice already holds the final session.
                match &state.auth.session {
                    Some(session) => Effect::send(AppAction::Tickets(TicketsAction::Load(
                        session.token.clone(),
                    ))),
                    None => Effect::none(),
                }
            }
            AppAction::Auth(AuthAction::Logout) => {
                Effect::send(AppAction::Tickets(TicketsAction::Clear))
            }
            _ => Effect::none(),
        }
    }
}
