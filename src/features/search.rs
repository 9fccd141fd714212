//! # Event Search
//!
//! Search-as-you-type against the marketplace. Every keystroke dispatches
//! [`SearchAction::QueryChanged`]; the reducer answers with a debounced
//! lookup task under one cancellation key, so a newer keystroke always
//! supersedes an older in-flight lookup. Results can therefore never
//! arrive out of order: at most one lookup exists, and it carries the
//! newest query.
//!
//! Clearing the query (empty or whitespace-only) drops the results and
//! cancels any pending lookup instead of starting one.

use std::sync::Arc;
use std::time::Duration;

use log::warn;

use crate::api::{Event, FailureKind, MarketplaceApi};
use crate::runtime::{CancelKey, Effect, Reducer};

/// The single in-flight search lookup.
pub const SEARCH_TASK: CancelKey = CancelKey::from_static("search.query");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// The query as typed, including whitespace.
    pub query: String,
    pub results: Vec<Event>,
    pub searching: bool,
    pub error: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    QueryChanged(String),
    ResultsLoaded(Vec<Event>),
    SearchFailed(FailureKind),
}

pub struct SearchReducer {
    api: Arc<dyn MarketplaceApi>,
    debounce: Duration,
}

impl SearchReducer {
    pub fn new(api: Arc<dyn MarketplaceApi>, debounce: Duration) -> Self {
        SearchReducer { api, debounce }
    }
}

impl Reducer for SearchReducer {
    type State = SearchState;
    type Action = SearchAction;

    fn reduce(&self, state: &mut SearchState, action: SearchAction) -> Effect<SearchAction> {
        match action {
            SearchAction::QueryChanged(query) => {
                let trimmed = query.trim().to_string();
                state.query = query;

                if trimmed.is_empty() {
                    state.results.clear();
                    state.searching = false;
                    state.error = None;
                    return Effect::cancel(SEARCH_TASK);
                }

                state.searching = true;
                state.error = None;
                let api = Arc::clone(&self.api);
                let debounce = self.debounce;
                Effect::run(move |emitter| async move {
                    tokio::time::sleep(debounce).await;
                    match api.search_events(&trimmed).await {
                        Ok(events) => emitter.emit(SearchAction::ResultsLoaded(events)),
                        Err(e) => {
                            warn!("search '{}' failed: {}", trimmed, e);
                            emitter.emit(SearchAction::SearchFailed(e.kind()));
                        }
                    }
                })
                .cancellable(SEARCH_TASK)
            }
            SearchAction::ResultsLoaded(events) => {
                state.searching = false;
                state.results = events;
                Effect::none()
            }
            SearchAction::SearchFailed(kind) => {
                state.searching = false;
                state.error = Some(kind);
                Effect::none()
            }
        }
    }
}
