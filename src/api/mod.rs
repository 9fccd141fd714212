pub mod decode;
pub mod error;
pub mod http;
pub mod types;

pub use error::{ApiError, FailureKind};
pub use http::{HttpMarketplaceApi, MarketplaceApi};
pub use types::{Credentials, Event, FavoriteEvent, Price, Session, Ticket, TicketStatus};
