//! Persistence traits for on-device state.
//!
//! Favorites and the login session survive restarts. The traits keep
//! reducers decoupled from the filesystem the same way
//! [`MarketplaceApi`](crate::api::MarketplaceApi) keeps them off the
//! network.

use async_trait::async_trait;

use crate::api::FailureKind;
use crate::api::types::{FavoriteEvent, Session};

// ============================================================================
// Errors
// ============================================================================

/// Errors from on-device persistence.
#[derive(Debug)]
pub enum StorageError {
    /// Filesystem trouble: permissions, missing home dir, failed rename.
    Io(String),
    /// A file exists but its contents don't parse.
    Corrupt(String),
}

impl StorageError {
    /// Every storage failure carries the same comparable kind; the variant
    /// split only matters for logs.
    pub fn kind(&self) -> FailureKind {
        FailureKind::Storage
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "Storage I/O error: {}", msg),
            StorageError::Corrupt(msg) => write!(f, "Corrupt storage file: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

// ============================================================================
// Store Traits
// ============================================================================

/// Persisted set of favorited events.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Load all favorites. An empty store is `Ok(vec![])`, not an error.
    async fn load(&self) -> Result<Vec<FavoriteEvent>, StorageError>;

    /// Replace the stored favorites.
    async fn save(&self, favorites: &[FavoriteEvent]) -> Result<(), StorageError>;
}

/// Persisted login session (at most one).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The stored session, if any.
    async fn load(&self) -> Result<Option<Session>, StorageError>;

    /// Store `session` as the current one.
    async fn save(&self, session: &Session) -> Result<(), StorageError>;

    /// Forget the stored session. Succeeds when none is stored.
    async fn clear(&self) -> Result<(), StorageError>;
}
