//! HTTP client for the ticket marketplace backend.
//!
//! Endpoints:
//! - GET  /events/search?q=   full-text event search
//! - GET  /events/featured    curated front-page events
//! - GET  /events/{id}        single event detail
//! - POST /auth/login         credential login, returns a session
//! - GET  /me/tickets         tickets for the bearer session
//!
//! Raw bodies go straight through [`decode`](super::decode); nothing
//! above this layer sees backend JSON.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use super::decode;
use super::error::ApiError;
use super::types::{Credentials, Event, Session, Ticket};

const DEFAULT_BASE_URL: &str = "https://api.stagedoor.app/v1";

// ============================================================================
// Marketplace Trait
// ============================================================================

/// The marketplace backend as the rest of the app sees it.
///
/// Features depend on this trait rather than on the HTTP client so tests
/// can script responses without a network.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Full-text search over upcoming events.
    async fn search_events(&self, query: &str) -> Result<Vec<Event>, ApiError>;

    /// Curated events for the landing screen.
    async fn featured_events(&self) -> Result<Vec<Event>, ApiError>;

    /// Detail for a single event.
    async fn event(&self, id: &str) -> Result<Event, ApiError>;

    /// Exchange credentials for a session.
    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError>;

    /// Tickets owned by the session's user.
    async fn my_tickets(&self, token: &str) -> Result<Vec<Ticket>, ApiError>;
}

// ============================================================================
// HTTP Implementation
// ============================================================================

/// Production [`MarketplaceApi`] backed by reqwest.
pub struct HttpMarketplaceApi {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpMarketplaceApi {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        let env_url = std::env::var("STAGEDOOR_API_BASE_URL").ok();
        let final_url = base_url
            .or(env_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = api_key.or_else(|| std::env::var("STAGEDOOR_API_KEY").ok());

        Self {
            base_url: final_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Start a request with the per-call plumbing every endpoint shares:
    /// a fresh X-Request-Id for log correlation and the API key header.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let request_id = Uuid::new_v4();
        debug!("{} {} [{}]", method, path, request_id);

        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Request-Id", request_id.to_string());
        if let Some(key) = &self.api_key {
            builder = builder.header("X-Api-Key", key);
        }
        builder
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        debug!("marketplace response status: {}", status);

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("marketplace API error: {} - {}", status.as_u16(), message);
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MarketplaceApi for HttpMarketplaceApi {
    async fn search_events(&self, query: &str) -> Result<Vec<Event>, ApiError> {
        let body = self
            .send(self.request(Method::GET, "/events/search").query(&[("q", query)]))
            .await?;
        let events = decode::decode_events(&body)?;
        info!("search '{}' returned {} events", query, events.len());
        Ok(events)
    }

    async fn featured_events(&self) -> Result<Vec<Event>, ApiError> {
        let body = self.send(self.request(Method::GET, "/events/featured")).await?;
        let events = decode::decode_events(&body)?;
        info!("featured feed returned {} events", events.len());
        Ok(events)
    }

    async fn event(&self, id: &str) -> Result<Event, ApiError> {
        let body = self
            .send(self.request(Method::GET, &format!("/events/{}", id)))
            .await?;
        decode::decode_event(&body)
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        let body = self
            .send(self.request(Method::POST, "/auth/login").json(credentials))
            .await?;
        let session = decode::decode_session(&body)?;
        info!("login ok for user {}", session.user_id);
        Ok(session)
    }

    async fn my_tickets(&self, token: &str) -> Result<Vec<Ticket>, ApiError> {
        let body = self
            .send(self.request(Method::GET, "/me/tickets").bearer_auth(token))
            .await?;
        let tickets = decode::decode_tickets(&body)?;
        info!("ticket wallet returned {} tickets", tickets.len());
        Ok(tickets)
    }
}
