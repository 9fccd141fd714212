//! Ticket wallet: the tickets owned by the signed-in user.
//!
//! Loads run under one cancellation key. A cancelled load leaves the
//! wallet exactly as it was: the flag flips back and no response ever
//! arrives for it.

use std::sync::Arc;

use log::warn;

use crate::api::{FailureKind, MarketplaceApi, Ticket};
use crate::runtime::{CancelKey, Effect, Reducer};

/// The in-flight wallet load.
pub const TICKETS_TASK: CancelKey = CancelKey::from_static("tickets.load");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketsState {
    pub tickets: Vec<Ticket>,
    pub loading: bool,
    pub error: Option<FailureKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TicketsAction {
    /// Load the wallet with the given session token.
    Load(String),
    Loaded(Vec<Ticket>),
    LoadFailed(FailureKind),
    /// Abandon an in-flight load, keeping whatever is already shown.
    CancelLoad,
    /// Drop the wallet entirely (logout).
    Clear,
}

pub struct TicketsReducer {
    api: Arc<dyn MarketplaceApi>,
}

impl TicketsReducer {
    pub fn new(api: Arc<dyn MarketplaceApi>) -> Self {
        TicketsReducer { api }
    }
}

impl Reducer for TicketsReducer {
    type State = TicketsState;
    type Action = TicketsAction;

    fn reduce(&self, state: &mut TicketsState, action: TicketsAction) -> Effect<TicketsAction> {
        match action {
            TicketsAction::Load(token) => {
                state.loading = true;
                state.error = None;
                let api = Arc::clone(&self.api);
                Effect::run(move |emitter| async move {
                    match api.my_tickets(&token).await {
                        Ok(tickets) => emitter.emit(TicketsAction::Loaded(tickets)),
                        Err(e) => {
                            warn!("ticket wallet load failed: {}", e);
                            emitter.emit(TicketsAction::LoadFailed(e.kind()));
                        }
                    }
                })
                .cancellable(TICKETS_TASK)
            }
            TicketsAction::Loaded(tickets) => {
                state.loading = false;
                state.tickets = tickets;
                Effect::none()
            }
            TicketsAction::LoadFailed(kind) => {
                state.loading = false;
                state.error = Some(kind);
                Effect::none()
            }
            TicketsAction::CancelLoad => {
                state.loading = false;
                Effect::cancel(TICKETS_TASK)
            }
            TicketsAction::Clear => {
                state.tickets.clear();
                state.loading = false;
                state.error = None;
                Effect::cancel(TICKETS_TASK)
            }
        }
    }
}
