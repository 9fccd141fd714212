//! # Domain Types
//!
//! The normalized values the rest of the app works with: plain data,
//! comparable and cloneable, with serde derives for persistence. Raw API
//! payloads never leave [`decode`](super::decode) un-normalized, so
//! nothing here carries alias or fallback logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listed event in the marketplace.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub min_price: Option<Price>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// Display price. The client never does arithmetic on it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

/// A ticket owned by the signed-in user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: String,
    pub event_id: String,
    pub event_title: String,
    pub section: Option<String>,
    pub row: Option<String>,
    pub seat: Option<String>,
    pub barcode: Option<String>,
    pub status: TicketStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Valid,
    Used,
    Refunded,
    /// Status string the client does not recognize. Kept as a value so one
    /// odd ticket does not fail the whole decode.
    Unknown,
}

/// An authenticated session, as returned by the login endpoint and kept
/// on disk between launches.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A locally saved favorite. Only what the favorites list needs; the full
/// event is re-fetched when opened.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FavoriteEvent {
    pub event_id: String,
    pub title: String,
    pub added_at: DateTime<Utc>,
}
