//! End-to-end flows through the composed app store, with the network and
//! the filesystem replaced by scripted stand-ins. Time is paused where a
//! test depends on debounce or latency windows.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use stagedoor::api::{
    ApiError, Credentials, Event, FavoriteEvent, MarketplaceApi, Session, Ticket, TicketStatus,
};
use stagedoor::features::{
    AppAction, AppState, AuthAction, EventsAction, SearchAction, TicketsAction, app_reducer,
};
use stagedoor::runtime::{Combined, Store};
use stagedoor::storage::{FavoritesStore, SessionStore, StorageError};
use stagedoor::testing::{await_state, settle};

const DEBOUNCE: Duration = Duration::from_millis(300);

// ============================================================================
// Scripted Collaborators
// ============================================================================

/// Marketplace stand-in that keeps an ordered log of every call, so tests
/// can assert not just state but which requests actually went out.
struct ScriptedApi {
    delay: Duration,
    log: Mutex<Vec<String>>,
}

impl ScriptedApi {
    fn instant() -> Arc<Self> {
        Self::slow(Duration::ZERO)
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(ScriptedApi {
            delay,
            log: Mutex::new(Vec::new()),
        })
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    async fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl MarketplaceApi for ScriptedApi {
    async fn search_events(&self, query: &str) -> Result<Vec<Event>, ApiError> {
        self.record(format!("search:{query}")).await;
        Ok(vec![event(&format!("found-{query}"), &format!("Results for {query}"))])
    }

    async fn featured_events(&self) -> Result<Vec<Event>, ApiError> {
        self.record("featured".to_string()).await;
        Ok(vec![event("ev-1", "Featured One")])
    }

    async fn event(&self, id: &str) -> Result<Event, ApiError> {
        self.record(format!("event:{id}")).await;
        Ok(event(id, "Detail"))
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        self.record(format!("login:{}", credentials.email)).await;
        Ok(session("tok-1"))
    }

    async fn my_tickets(&self, token: &str) -> Result<Vec<Ticket>, ApiError> {
        self.record(format!("tickets:{token}")).await;
        Ok(vec![ticket("t-1")])
    }
}

#[derive(Default)]
struct MemFavorites(Mutex<Vec<FavoriteEvent>>);

#[async_trait]
impl FavoritesStore for MemFavorites {
    async fn load(&self) -> Result<Vec<FavoriteEvent>, StorageError> {
        Ok(self.0.lock().unwrap().clone())
    }

    async fn save(&self, favorites: &[FavoriteEvent]) -> Result<(), StorageError> {
        *self.0.lock().unwrap() = favorites.to_vec();
        Ok(())
    }
}

#[derive(Default)]
struct MemSessions(Mutex<Option<Session>>);

#[async_trait]
impl SessionStore for MemSessions {
    async fn load(&self) -> Result<Option<Session>, StorageError> {
        Ok(self.0.lock().unwrap().clone())
    }

    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        *self.0.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.0.lock().unwrap() = None;
        Ok(())
    }
}

// ============================================================================
// Builders
// ============================================================================

fn event(id: &str, title: &str) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        venue: None,
        city: None,
        starts_at: Utc::now(),
        min_price: None,
        category: None,
        image_url: None,
    }
}

fn ticket(id: &str) -> Ticket {
    Ticket {
        id: id.to_string(),
        event_id: "ev-1".to_string(),
        event_title: "Featured One".to_string(),
        section: None,
        row: None,
        seat: None,
        barcode: None,
        status: TicketStatus::Valid,
    }
}

fn session(token: &str) -> Session {
    Session {
        token: token.to_string(),
        user_id: "u-1".to_string(),
        email: "fan@example.com".to_string(),
        expires_at: None,
    }
}

fn login_credentials() -> Credentials {
    Credentials {
        email: "fan@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

fn app_store(
    api: &Arc<ScriptedApi>,
    sessions: &Arc<MemSessions>,
) -> Store<Combined<AppState, AppAction>> {
    Store::new(
        AppState::default(),
        app_reducer(
            Arc::clone(api) as Arc<dyn MarketplaceApi>,
            Arc::new(MemFavorites::default()),
            Arc::clone(sessions) as Arc<dyn SessionStore>,
            DEBOUNCE,
        ),
    )
}

// ============================================================================
// Search Flows
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_typing_supersedes_the_previous_search() {
    let api = ScriptedApi::instant();
    let sessions = Arc::new(MemSessions::default());
    let store = app_store(&api, &sessions);

    store.dispatch(AppAction::Search(SearchAction::QueryChanged("ham".into())));
    settle().await;
    tokio::time::advance(Duration::from_millis(200)).await;
    settle().await;

    // Second keystroke lands mid-debounce; the first lookup must die
    // without ever reaching the network.
    store.dispatch(AppAction::Search(SearchAction::QueryChanged("hamilton".into())));
    settle().await;
    tokio::time::advance(DEBOUNCE).await;
    settle().await;

    let state = store.state();
    assert_eq!(api.entries(), vec!["search:hamilton"]);
    assert_eq!(state.search.results.len(), 1);
    assert!(state.search.results[0].title.contains("hamilton"));
    assert!(!state.search.searching);
}

#[tokio::test(start_paused = true)]
async fn test_clearing_the_query_stops_the_search_entirely() {
    let api = ScriptedApi::instant();
    let sessions = Arc::new(MemSessions::default());
    let store = app_store(&api, &sessions);

    store.dispatch(AppAction::Search(SearchAction::QueryChanged("ham".into())));
    settle().await;
    store.dispatch(AppAction::Search(SearchAction::QueryChanged("".into())));

    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;

    let state = store.state();
    assert!(api.entries().is_empty());
    assert!(state.search.results.is_empty());
    assert!(!state.search.searching);
}

#[tokio::test(start_paused = true)]
async fn test_result_wait_skips_the_pre_search_state() {
    let api = ScriptedApi::instant();
    let sessions = Arc::new(MemSessions::default());
    let store = app_store(&api, &sessions);
    let mut states = store.subscribe();

    // Dispatch from another task, so the wait below starts while the
    // published state is still the idle one. Waiting on the search's own
    // outcome (query matches, lookup finished) must not accept it.
    let handle = store.clone();
    tokio::spawn(async move {
        handle.dispatch(AppAction::Search(SearchAction::QueryChanged("hamilton".into())));
    });

    let state = await_state(&mut states, |s: &AppState| {
        s.search.query == "hamilton" && !s.search.searching
    })
    .await;

    assert_eq!(state.search.results.len(), 1);
    assert!(state.search.results[0].title.contains("hamilton"));
    assert_eq!(api.entries(), vec!["search:hamilton"]);
}

// ============================================================================
// Wallet Flows
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancelled_wallet_load_never_lands() {
    let api = ScriptedApi::slow(Duration::from_secs(1));
    let sessions = Arc::new(MemSessions::default());
    let store = app_store(&api, &sessions);

    store.dispatch(AppAction::Tickets(TicketsAction::Load("tok-1".into())));
    settle().await;
    assert!(store.state().tickets.loading);

    store.dispatch(AppAction::Tickets(TicketsAction::CancelLoad));
    assert!(!store.state().tickets.loading);

    // The request was already on the wire; its response must be ignored.
    tokio::time::advance(Duration::from_secs(3)).await;
    settle().await;

    let state = store.state();
    assert_eq!(api.entries(), vec!["tickets:tok-1"]);
    assert!(state.tickets.tickets.is_empty());
    assert!(!state.tickets.loading);
    assert_eq!(state.tickets.error, None);
}

#[tokio::test(start_paused = true)]
async fn test_cancelling_one_feature_leaves_others_running() {
    let api = ScriptedApi::slow(Duration::from_secs(1));
    let sessions = Arc::new(MemSessions::default());
    let store = app_store(&api, &sessions);

    store.dispatch(AppAction::Events(EventsAction::LoadFeatured));
    store.dispatch(AppAction::Tickets(TicketsAction::Load("tok-1".into())));
    settle().await;

    store.dispatch(AppAction::Tickets(TicketsAction::CancelLoad));
    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;

    let state = store.state();
    assert_eq!(state.events.featured.len(), 1);
    assert!(state.tickets.tickets.is_empty());
}

// ============================================================================
// Startup and Session Flows
// ============================================================================

#[tokio::test]
async fn test_cold_start_stays_logged_out() {
    let api = ScriptedApi::instant();
    let sessions = Arc::new(MemSessions::default());
    let store = app_store(&api, &sessions);

    store.dispatch(AppAction::Start);
    settle().await;

    let state = store.state();
    assert_eq!(state.events.featured.len(), 1);
    assert!(state.favorites.loaded);
    assert!(!state.auth.is_logged_in());

    let entries = api.entries();
    assert!(entries.contains(&"featured".to_string()));
    assert!(!entries.iter().any(|e| e.starts_with("tickets:")));
}

#[tokio::test]
async fn test_warm_start_restores_session_and_loads_wallet() {
    let api = ScriptedApi::instant();
    let sessions = Arc::new(MemSessions::default());
    sessions.save(&session("tok-9")).await.unwrap();
    let store = app_store(&api, &sessions);

    store.dispatch(AppAction::Start);
    settle().await;

    let state = store.state();
    assert!(state.auth.is_logged_in());
    assert_eq!(state.tickets.tickets.len(), 1);
    assert!(api.entries().contains(&"tickets:tok-9".to_string()));
}

#[tokio::test]
async fn test_login_logout_round_trip() {
    let api = ScriptedApi::instant();
    let sessions = Arc::new(MemSessions::default());
    let store = app_store(&api, &sessions);

    store.dispatch(AppAction::Auth(AuthAction::Login(login_credentials())));
    settle().await;

    let state = store.state();
    assert!(state.auth.is_logged_in());
    assert_eq!(state.tickets.tickets.len(), 1);
    assert!(sessions.load().await.unwrap().is_some());

    store.dispatch(AppAction::Auth(AuthAction::Logout));
    settle().await;

    let state = store.state();
    assert!(!state.auth.is_logged_in());
    assert!(state.tickets.tickets.is_empty());
    assert!(sessions.load().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_logout_kills_an_inflight_wallet_load() {
    let api = ScriptedApi::slow(Duration::from_secs(1));
    let sessions = Arc::new(MemSessions::default());
    let store = app_store(&api, &sessions);

    store.dispatch(AppAction::Auth(AuthAction::Login(login_credentials())));
    settle().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    assert!(store.state().auth.is_logged_in());
    assert!(store.state().tickets.loading);

    store.dispatch(AppAction::Auth(AuthAction::Logout));
    tokio::time::advance(Duration::from_secs(3)).await;
    settle().await;

    let state = store.state();
    assert!(!state.auth.is_logged_in());
    assert!(state.tickets.tickets.is_empty());
    assert!(!state.tickets.loading);
}
