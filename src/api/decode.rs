//! # Payload Decoding
//!
//! The marketplace backend has grown several generations of payload
//! shapes: camelCase and snake_case field names, list containers under
//! different keys, prices as bare numbers or objects, and at least five
//! date representations. This module owns all of that: every payload is
//! normalized here, once, at the network boundary. Reducers and effects
//! only ever see the types in [`types`](super::types).
//!
//! Aliases are tried in the order listed on each `*_ALIASES` constant;
//! the first present, non-null field wins.
//!
//! Accepted date formats, in order:
//! 1. RFC 3339 / ISO-8601 (`2026-03-01T19:30:00Z`)
//! 2. `YYYY-MM-DD HH:MM:SS` (assumed UTC)
//! 3. `YYYY-MM-DD` (midnight UTC)
//! 4. Unix epoch seconds (number or numeric string)
//! 5. Unix epoch milliseconds (detected at >= 10^12)

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use log::debug;
use serde_json::{Map, Value};

use super::error::ApiError;
use super::types::{Event, Price, Session, Ticket, TicketStatus};

// ============================================================================
// Field Alias Chains
// ============================================================================

const EVENT_LIST_ALIASES: &[&str] = &["events", "data", "results", "items"];
const EVENT_ID_ALIASES: &[&str] = &["id", "eventId", "event_id"];
const EVENT_TITLE_ALIASES: &[&str] = &["title", "name", "eventName", "event_name"];
const VENUE_ALIASES: &[&str] = &["venue", "venueName", "venue_name", "location"];
const CITY_ALIASES: &[&str] = &["city", "venueCity", "venue_city"];
const STARTS_AT_ALIASES: &[&str] = &["startsAt", "starts_at", "startDate", "start_date", "date"];
const MIN_PRICE_ALIASES: &[&str] = &["minPrice", "min_price", "priceFrom", "price_from", "price"];
const AMOUNT_ALIASES: &[&str] = &["amount", "value"];
const CATEGORY_ALIASES: &[&str] = &["category", "genre"];
const IMAGE_ALIASES: &[&str] = &["imageUrl", "image_url", "image"];

const TICKET_LIST_ALIASES: &[&str] = &["tickets", "data", "results", "items"];
const TICKET_ID_ALIASES: &[&str] = &["id", "ticketId", "ticket_id"];
const TICKET_EVENT_ID_ALIASES: &[&str] = &["eventId", "event_id"];
const TICKET_EVENT_TITLE_ALIASES: &[&str] = &["eventTitle", "event_title", "eventName", "event_name"];
const SECTION_ALIASES: &[&str] = &["section", "sectionName", "section_name"];
const ROW_ALIASES: &[&str] = &["row", "rowName", "row_name"];
const SEAT_ALIASES: &[&str] = &["seat", "seatNumber", "seat_number"];
const BARCODE_ALIASES: &[&str] = &["barcode", "barcodeValue", "barcode_value", "qrCode", "qr_code"];
const STATUS_ALIASES: &[&str] = &["status", "state"];

const TOKEN_ALIASES: &[&str] = &["token", "accessToken", "access_token"];
// Bare "id" is deliberately absent at the top level: older payloads use it
// for the session record itself. Inside the nested user object it is safe.
const USER_ID_ALIASES: &[&str] = &["userId", "user_id"];
const EMAIL_ALIASES: &[&str] = &["email", "userEmail", "user_email"];
const USER_OBJECT_ALIASES: &[&str] = &["user", "account"];
const EXPIRES_ALIASES: &[&str] = &["expiresAt", "expires_at", "expiry"];

/// Epoch values at or above this are taken as milliseconds. Seconds would
/// not reach it until the year 33658.
const EPOCH_MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

// ============================================================================
// Decoders
// ============================================================================

/// Decode a list of events from either a bare array or a recognized
/// container object.
pub fn decode_events(value: &Value) -> Result<Vec<Event>, ApiError> {
    list(value, EVENT_LIST_ALIASES, "event list")?
        .iter()
        .map(decode_event)
        .collect()
}

pub fn decode_event(value: &Value) -> Result<Event, ApiError> {
    let obj = object(value, "event")?;
    let starts_at = date_field(obj, STARTS_AT_ALIASES)
        .ok_or_else(|| ApiError::Decode("event: no parseable start date".to_string()))?;
    Ok(Event {
        id: required_string(obj, EVENT_ID_ALIASES, "event id")?,
        title: required_string(obj, EVENT_TITLE_ALIASES, "event title")?,
        venue: string_field(obj, VENUE_ALIASES),
        city: string_field(obj, CITY_ALIASES),
        starts_at,
        min_price: price_field(obj, MIN_PRICE_ALIASES),
        category: string_field(obj, CATEGORY_ALIASES),
        image_url: string_field(obj, IMAGE_ALIASES),
    })
}

pub fn decode_tickets(value: &Value) -> Result<Vec<Ticket>, ApiError> {
    list(value, TICKET_LIST_ALIASES, "ticket list")?
        .iter()
        .map(decode_ticket)
        .collect()
}

pub fn decode_ticket(value: &Value) -> Result<Ticket, ApiError> {
    let obj = object(value, "ticket")?;
    Ok(Ticket {
        id: required_string(obj, TICKET_ID_ALIASES, "ticket id")?,
        event_id: required_string(obj, TICKET_EVENT_ID_ALIASES, "ticket event id")?,
        event_title: string_field(obj, TICKET_EVENT_TITLE_ALIASES).unwrap_or_default(),
        section: string_field(obj, SECTION_ALIASES),
        row: string_field(obj, ROW_ALIASES),
        seat: string_field(obj, SEAT_ALIASES),
        barcode: string_field(obj, BARCODE_ALIASES),
        status: ticket_status(obj),
    })
}

pub fn decode_session(value: &Value) -> Result<Session, ApiError> {
    let obj = object(value, "session")?;
    let user = alias(obj, USER_OBJECT_ALIASES).and_then(Value::as_object);
    let user_id = string_field(obj, USER_ID_ALIASES)
        .or_else(|| user.and_then(|u| string_field(u, &["id", "userId", "user_id"])))
        .ok_or_else(|| ApiError::Decode("session: no user id".to_string()))?;
    let email = string_field(obj, EMAIL_ALIASES)
        .or_else(|| user.and_then(|u| string_field(u, EMAIL_ALIASES)))
        .unwrap_or_default();
    Ok(Session {
        token: required_string(obj, TOKEN_ALIASES, "session token")?,
        user_id,
        email,
        expires_at: date_field(obj, EXPIRES_ALIASES),
    })
}

// ============================================================================
// Field Helpers
// ============================================================================

fn object<'v>(value: &'v Value, what: &str) -> Result<&'v Map<String, Value>, ApiError> {
    value
        .as_object()
        .ok_or_else(|| ApiError::Decode(format!("{what}: expected a JSON object")))
}

fn list<'v>(
    value: &'v Value,
    aliases: &[&str],
    what: &str,
) -> Result<&'v Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(obj) => alias(obj, aliases)
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::Decode(format!("{what}: no recognized container field"))),
        _ => Err(ApiError::Decode(format!(
            "{what}: expected an array or container object"
        ))),
    }
}

/// First present, non-null field among `aliases`. A null under an earlier
/// alias does not block a later one that carries the value.
fn alias<'v>(obj: &'v Map<String, Value>, aliases: &[&str]) -> Option<&'v Value> {
    aliases
        .iter()
        .find_map(|name| obj.get(*name).filter(|value| !value.is_null()))
}

/// String field with numeric tolerance: older payloads serve ids and seat
/// numbers as JSON numbers.
fn string_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    match alias(obj, aliases)? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_string(
    obj: &Map<String, Value>,
    aliases: &[&str],
    what: &str,
) -> Result<String, ApiError> {
    string_field(obj, aliases).ok_or_else(|| ApiError::Decode(format!("{what}: missing")))
}

fn date_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<DateTime<Utc>> {
    parse_timestamp(alias(obj, aliases)?)
}

/// Price in any of the served shapes: bare number, numeric string, or an
/// object with amount/currency. Currency defaults to USD when absent.
fn price_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<Price> {
    match alias(obj, aliases)? {
        Value::Number(n) => Some(Price {
            amount: n.as_f64()?,
            currency: "USD".to_string(),
        }),
        Value::String(s) => Some(Price {
            amount: s.trim().parse().ok()?,
            currency: "USD".to_string(),
        }),
        Value::Object(price) => Some(Price {
            amount: match alias(price, AMOUNT_ALIASES)? {
                Value::Number(n) => n.as_f64()?,
                Value::String(s) => s.trim().parse().ok()?,
                _ => return None,
            },
            currency: string_field(price, &["currency"]).unwrap_or_else(|| "USD".to_string()),
        }),
        _ => None,
    }
}

fn ticket_status(obj: &Map<String, Value>) -> TicketStatus {
    let Some(raw) = string_field(obj, STATUS_ALIASES) else {
        return TicketStatus::Unknown;
    };
    match raw.to_ascii_lowercase().as_str() {
        "valid" | "active" | "confirmed" => TicketStatus::Valid,
        "used" | "redeemed" | "scanned" => TicketStatus::Used,
        "refunded" | "cancelled" | "canceled" => TicketStatus::Refunded,
        other => {
            debug!("unrecognized ticket status '{other}'");
            TicketStatus::Unknown
        }
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Try every accepted date representation, in the documented order.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_date_string(raw.trim()),
        Value::Number(n) => epoch_to_datetime(n.as_i64()?),
        _ => None,
    }
}

fn parse_date_string(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    if let Ok(n) = raw.parse::<i64>() {
        return epoch_to_datetime(n);
    }
    None
}

fn epoch_to_datetime(n: i64) -> Option<DateTime<Utc>> {
    if n.abs() >= EPOCH_MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(n).single()
    } else {
        Utc.timestamp_opt(n, 0).single()
    }
}

// ============================================================================
// Tests
// ============================================================================
