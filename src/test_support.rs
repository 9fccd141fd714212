//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`). It provides
//! scripted stand-ins for the network and the filesystem so reducer tests
//! run hermetically, plus builders for the domain types.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::types::FavoriteEvent;
use crate::api::{
    ApiError, Credentials, Event, FailureKind, MarketplaceApi, Price, Session, Ticket,
    TicketStatus,
};
use crate::storage::{FavoritesStore, SessionStore, StorageError};

// ============================================================================
// Scripted Marketplace API
// ============================================================================

/// A marketplace backend that answers from canned data. Responses echo
/// their inputs (a search result names its query) so tests can tell which
/// request produced what. Supports an optional latency and a one-shot
/// scripted failure.
#[derive(Default)]
pub struct FakeApi {
    delay: Duration,
    fail: Mutex<Option<FailureKind>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeApi {
    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        FakeApi {
            delay,
            ..Default::default()
        }
    }

    /// Make the next call (any endpoint) fail with the given kind.
    pub fn fail_next(&self, kind: FailureKind) {
        *self.fail.lock().unwrap() = Some(kind);
    }

    /// How many times an endpoint was called: "search", "featured",
    /// "event", "login", or "tickets".
    pub fn calls(&self, endpoint: &'static str) -> usize {
        *self.calls.lock().unwrap().get(endpoint).unwrap_or(&0)
    }

    async fn begin(&self, endpoint: &'static str) -> Result<(), ApiError> {
        *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.fail.lock().unwrap().take() {
            Some(kind) => Err(scripted_error(kind)),
            None => Ok(()),
        }
    }
}

fn scripted_error(kind: FailureKind) -> ApiError {
    match kind {
        FailureKind::Network => ApiError::Network("scripted network failure".to_string()),
        FailureKind::Unauthorized => ApiError::Api {
            status: 401,
            message: "scripted unauthorized".to_string(),
        },
        FailureKind::Api { status } => ApiError::Api {
            status,
            message: "scripted server error".to_string(),
        },
        FailureKind::Decode => ApiError::Decode("scripted decode failure".to_string()),
        FailureKind::Storage => unreachable!("storage failures come from stores, not the API"),
    }
}

#[async_trait]
impl MarketplaceApi for FakeApi {
    async fn search_events(&self, query: &str) -> Result<Vec<Event>, ApiError> {
        self.begin("search").await?;
        Ok(vec![event_titled(
            &format!("search-{query}"),
            &format!("Results for {query}"),
        )])
    }

    async fn featured_events(&self) -> Result<Vec<Event>, ApiError> {
        self.begin("featured").await?;
        Ok(vec![
            event_titled("ev-1", "Featured One"),
            event_titled("ev-2", "Featured Two"),
        ])
    }

    async fn event(&self, id: &str) -> Result<Event, ApiError> {
        self.begin("event").await?;
        Ok(event(id))
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        self.begin("login").await?;
        let user = credentials.email.split('@').next().unwrap_or("user");
        Ok(session(user))
    }

    async fn my_tickets(&self, _token: &str) -> Result<Vec<Ticket>, ApiError> {
        self.begin("tickets").await?;
        Ok(vec![ticket("t-1"), ticket("t-2")])
    }
}

// ============================================================================
// In-Memory Stores
// ============================================================================

#[derive(Default)]
pub struct MemoryFavorites {
    saved: Mutex<Vec<FavoriteEvent>>,
    load_fails: AtomicBool,
    save_fails: AtomicBool,
}

impl MemoryFavorites {
    pub fn seed(&self, event_id: &str) {
        self.saved.lock().unwrap().push(favorite(event_id));
    }

    pub fn saved_ids(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|f| f.event_id.clone())
            .collect()
    }

    pub fn fail_loads(&self) {
        self.load_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_saves(&self) {
        self.save_fails.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FavoritesStore for MemoryFavorites {
    async fn load(&self) -> Result<Vec<FavoriteEvent>, StorageError> {
        if self.load_fails.load(Ordering::SeqCst) {
            return Err(StorageError::Io("scripted load failure".to_string()));
        }
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn save(&self, favorites: &[FavoriteEvent]) -> Result<(), StorageError> {
        if self.save_fails.load(Ordering::SeqCst) {
            return Err(StorageError::Io("scripted save failure".to_string()));
        }
        *self.saved.lock().unwrap() = favorites.to_vec();
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySession {
    stored: Mutex<Option<Session>>,
    fails: AtomicBool,
}

impl MemorySession {
    pub fn set(&self, session: Option<Session>) {
        *self.stored.lock().unwrap() = session;
    }

    pub fn get(&self) -> Option<Session> {
        self.stored.lock().unwrap().clone()
    }

    pub fn fail(&self) {
        self.fails.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.fails.load(Ordering::SeqCst) {
            return Err(StorageError::Io("scripted session store failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemorySession {
    async fn load(&self) -> Result<Option<Session>, StorageError> {
        self.check()?;
        Ok(self.get())
    }

    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        self.check()?;
        self.set(Some(session.clone()));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.check()?;
        self.set(None);
        Ok(())
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn event(id: &str) -> Event {
    event_titled(id, &format!("Event {id}"))
}

pub fn event_titled(id: &str, title: &str) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        venue: Some("The Depot".to_string()),
        city: Some("Salt Lake City".to_string()),
        starts_at: Utc.with_ymd_and_hms(2026, 3, 1, 19, 30, 0).unwrap(),
        min_price: Some(Price {
            amount: 45.0,
            currency: "USD".to_string(),
        }),
        category: Some("concert".to_string()),
        image_url: None,
    }
}

pub fn ticket(id: &str) -> Ticket {
    Ticket {
        id: id.to_string(),
        event_id: "ev-1".to_string(),
        event_title: "Event ev-1".to_string(),
        section: Some("104".to_string()),
        row: Some("J".to_string()),
        seat: Some("12".to_string()),
        barcode: Some(format!("BC-{id}")),
        status: TicketStatus::Valid,
    }
}

pub fn favorite(event_id: &str) -> FavoriteEvent {
    FavoriteEvent {
        event_id: event_id.to_string(),
        title: format!("Event {event_id}"),
        added_at: Utc::now(),
    }
}

pub fn session(user_id: &str) -> Session {
    Session {
        token: format!("tok-{user_id}"),
        user_id: user_id.to_string(),
        email: format!("{user_id}@example.com"),
        expires_at: Some(Utc::now() + chrono::Duration::hours(12)),
    }
}

pub fn expired_session(user_id: &str) -> Session {
    Session {
        expires_at: Some(Utc::now() - chrono::Duration::hours(1)),
        ..session(user_id)
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        email: "fan@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}
