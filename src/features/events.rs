//! # Featured Events and Event Detail
//!
//! The landing feed of curated events plus a detail view for one selected
//! event. Both loads run under their own cancellation keys: pulling to
//! refresh supersedes an in-flight refresh, and backing out of a detail
//! view cancels its load.

use std::sync::Arc;

use log::warn;

use crate::api::{Event, FailureKind, MarketplaceApi};
use crate::runtime::{CancelKey, Effect, Reducer};

/// The in-flight featured-feed load.
pub const FEATURED_TASK: CancelKey = CancelKey::from_static("events.featured");
/// The in-flight detail load.
pub const DETAIL_TASK: CancelKey = CancelKey::from_static("events.detail");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventsState {
    pub featured: Vec<Event>,
    pub loading: bool,
    pub selected: Option<Event>,
    pub loading_detail: bool,
    pub error: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventsAction {
    /// Load (or reload) the featured feed.
    LoadFeatured,
    FeaturedLoaded(Vec<Event>),
    FeaturedFailed(FailureKind),
    /// Open the detail view for an event id.
    Select(String),
    DetailLoaded(Event),
    DetailFailed(FailureKind),
    /// Close the detail view; an unfinished detail load dies with it.
    ClearSelection,
}

pub struct EventsReducer {
    api: Arc<dyn MarketplaceApi>,
}

impl EventsReducer {
    pub fn new(api: Arc<dyn MarketplaceApi>) -> Self {
        EventsReducer { api }
    }
}

impl Reducer for EventsReducer {
    type State = EventsState;
    type Action = EventsAction;

    fn reduce(&self, state: &mut EventsState, action: EventsAction) -> Effect<EventsAction> {
        match action {
            EventsAction::LoadFeatured => {
                state.loading = true;
                state.error = None;
                let api = Arc::clone(&self.api);
                Effect::run(move |emitter| async move {
                    match api.featured_events().await {
                        Ok(events) => emitter.emit(EventsAction::FeaturedLoaded(events)),
                        Err(e) => {
                            warn!("featured feed load failed: {}", e);
                            emitter.emit(EventsAction::FeaturedFailed(e.kind()));
                        }
                    }
                })
                .cancellable(FEATURED_TASK)
            }
            EventsAction::FeaturedLoaded(events) => {
                state.loading = false;
                state.featured = events;
                Effect::none()
            }
            EventsAction::FeaturedFailed(kind) => {
                state.loading = false;
                state.error = Some(kind);
                Effect::none()
            }
            EventsAction::Select(id) => {
                state.loading_detail = true;
                let api = Arc::clone(&self.api);
                Effect::run(move |emitter| async move {
                    match api.event(&id).await {
                        Ok(event) => emitter.emit(EventsAction::DetailLoaded(event)),
                        Err(e) => {
                            warn!("event detail load failed: {}", e);
                            emitter.emit(EventsAction::DetailFailed(e.kind()));
                        }
                    }
                })
                .cancellable(DETAIL_TASK)
            }
            EventsAction::DetailLoaded(event) => {
                state.loading_detail = false;
                state.selected = Some(event);
                Effect::none()
            }
            EventsAction::DetailFailed(kind) => {
                state.loading_detail = false;
                state.error = Some(kind);
                Effect::none()
            }
            EventsAction::ClearSelection => {
                state.selected = None;
                state.loading_detail = false;
                Effect::cancel(DETAIL_TASK)
            }
        }
    }
}
