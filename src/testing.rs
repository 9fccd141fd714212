//! # Testing Helpers
//!
//! Small utilities for driving a [`Store`](crate::runtime::Store) from
//! async tests: wait for a state to satisfy a predicate, or just give
//! spawned tasks a chance to run. Kept in the library (rather than under
//! `#[cfg(test)]`) so integration tests can use them too.

use std::time::Duration;

use tokio::sync::watch;

/// How long [`await_state`] waits before declaring the state unreachable.
/// Under paused-clock tests the timeout auto-advances, so an unreachable
/// state fails fast instead of hanging.
pub const AWAIT_STATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait until the observed state satisfies `predicate` and return it.
/// The current value counts, so a state reached before the call is not
/// missed.
///
/// # Panics
///
/// Panics when the store is dropped or the timeout elapses first; in a
/// test either means the expected state was never published.
pub async fn await_state<S, F>(rx: &mut watch::Receiver<S>, predicate: F) -> S
where
    S: Clone,
    F: FnMut(&S) -> bool,
{
    let observed = tokio::time::timeout(AWAIT_STATE_TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for the expected state")
        .expect("store dropped before the expected state was published");
    observed.clone()
}

/// Yield to the runtime a handful of times so freshly spawned tasks get
/// polled. Useful after a dispatch whose effects emit without sleeping.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}
