//! Favorited events, persisted on device and loaded once at startup.
//!
//! Toggling is optimistic: the list changes immediately and the save runs
//! behind it. Every save writes the complete list snapshot, so a save that
//! loses a race with a newer one costs nothing but staleness.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::warn;

use crate::api::FailureKind;
use crate::api::types::FavoriteEvent;
use crate::runtime::{Effect, Reducer};
use crate::storage::FavoritesStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesState {
    pub favorites: Vec<FavoriteEvent>,
    pub loaded: bool,
    pub error: Option<FailureKind>,
}

impl FavoritesState {
    pub fn contains(&self, event_id: &str) -> bool {
        self.favorites.iter().any(|f| f.event_id == event_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FavoritesAction {
    Load,
    Loaded(Vec<FavoriteEvent>),
    LoadFailed(FailureKind),
    /// Flip one event. The dispatcher stamps when it happened; the reducer
    /// never consults the clock.
    Toggle {
        event_id: String,
        title: String,
        added_at: DateTime<Utc>,
    },
    SaveFailed(FailureKind),
}

pub struct FavoritesReducer {
    store: Arc<dyn FavoritesStore>,
}

impl FavoritesReducer {
    pub fn new(store: Arc<dyn FavoritesStore>) -> Self {
        FavoritesReducer { store }
    }

    fn persist(&self, favorites: Vec<FavoriteEvent>) -> Effect<FavoritesAction> {
        let store = Arc::clone(&self.store);
        Effect::run(move |emitter| async move {
            if let Err(e) = store.save(&favorites).await {
                warn!("failed to save favorites: {}", e);
                emitter.emit(FavoritesAction::SaveFailed(e.kind()));
            }
        })
    }
}

impl Reducer for FavoritesReducer {
    type State = FavoritesState;
    type Action = FavoritesAction;

    fn reduce(&self, state: &mut FavoritesState, action: FavoritesAction) -> Effect<FavoritesAction> {
        match action {
            FavoritesAction::Load => {
                let store = Arc::clone(&self.store);
                Effect::run(move |emitter| async move {
                    match store.load().await {
                        Ok(favorites) => emitter.emit(FavoritesAction::Loaded(favorites)),
                        Err(e) => {
                            warn!("failed to load favorites: {}", e);
                            emitter.emit(FavoritesAction::LoadFailed(e.kind()));
                        }
                    }
                })
            }
            FavoritesAction::Loaded(favorites) => {
                state.favorites = favorites;
                state.loaded = true;
                Effect::none()
            }
            FavoritesAction::LoadFailed(kind) => {
                state.loaded = true;
                state.error = Some(kind);
                Effect::none()
            }
            FavoritesAction::Toggle {
                event_id,
                title,
                added_at,
            } => {
                if state.contains(&event_id) {
                    state.favorites.retain(|f| f.event_id != event_id);
                } else {
                    state.favorites.push(FavoriteEvent {
                        event_id,
                        title,
                        added_at,
                    });
                }
                self.persist(state.favorites.clone())
            }
            FavoritesAction::SaveFailed(kind) => {
                state.error = Some(kind);
                Effect::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Store;
    use crate::test_support::MemoryFavorites;
    use crate::testing::settle;

    fn favorites_store(mem: &Arc<MemoryFavorites>) -> Store<FavoritesReducer> {
        Store::new(
            FavoritesState::default(),
            FavoritesReducer::new(Arc::clone(mem) as Arc<dyn FavoritesStore>),
        )
    }

    fn toggle(id: &str) -> FavoritesAction {
        FavoritesAction::Toggle {
            event_id: id.to_string(),
            title: format!("Event {}", id),
            added_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_load_fills_state_from_store() {
        let mem = Arc::new(MemoryFavorites::default());
        mem.seed("ev-1");
        let store = favorites_store(&mem);

        store.dispatch(FavoritesAction::Load);
        settle().await;

        let state = store.state();
        assert!(state.loaded);
        assert!(state.contains("ev-1"));
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes_and_persists() {
        let mem = Arc::new(MemoryFavorites::default());
        let store = favorites_store(&mem);

        store.dispatch(toggle("ev-1"));
        assert!(store.state().contains("ev-1"));
        settle().await;
        assert_eq!(mem.saved_ids(), vec!["ev-1"]);

        store.dispatch(toggle("ev-1"));
        assert!(!store.state().contains("ev-1"));
        settle().await;
        assert!(mem.saved_ids().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_optimistic_state_and_reports() {
        let mem = Arc::new(MemoryFavorites::default());
        mem.fail_saves();
        let store = favorites_store(&mem);

        store.dispatch(toggle("ev-1"));
        settle().await;

        let state = store.state();
        assert!(state.contains("ev-1"));
        assert_eq!(state.error, Some(FailureKind::Storage));
    }

    #[test]
    fn test_equal_toggle_inputs_reduce_identically() {
        let mem = Arc::new(MemoryFavorites::default());
        let reducer = FavoritesReducer::new(Arc::clone(&mem) as Arc<dyn FavoritesStore>);
        let stamp = "2026-03-01T19:30:00Z".parse().unwrap();
        let action = FavoritesAction::Toggle {
            event_id: "ev-1".to_string(),
            title: "Hamilton".to_string(),
            added_at: stamp,
        };

        let mut first = FavoritesState::default();
        let mut second = FavoritesState::default();
        reducer.reduce(&mut first, action.clone());
        reducer.reduce(&mut second, action);

        assert_eq!(first, second);
        assert_eq!(first.favorites[0].added_at, stamp);
    }

    #[tokio::test]
    async fn test_failed_load_reports_storage_kind() {
        let mem = Arc::new(MemoryFavorites::default());
        mem.fail_loads();
        let store = favorites_store(&mem);

        store.dispatch(FavoritesAction::Load);
        settle().await;

        let state = store.state();
        assert!(state.loaded);
        assert_eq!(state.error, Some(FailureKind::Storage));
        assert!(state.favorites.is_empty());
    }
}
