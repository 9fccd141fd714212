pub mod files;
pub mod store;

pub use files::{JsonFavoritesStore, JsonSessionStore, data_dir};
pub use store::{FavoritesStore, SessionStore, StorageError};
