pub mod app;
pub mod auth;
pub mod events;
pub mod favorites;
pub mod search;
pub mod tickets;

pub use app::{AppAction, AppState, app_reducer};
pub use auth::{AuthAction, AuthState};
pub use events::{EventsAction, EventsState};
pub use favorites::{FavoritesAction, FavoritesState};
pub use search::{SearchAction, SearchState};
pub use tickets::{TicketsAction, TicketsState};
