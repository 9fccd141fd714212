//! # Runtime
//!
//! The unidirectional loop every feature in the app runs on.
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 │           STORE              │
//!                 │                              │
//!      action ──▶ │  reduce ──▶ state' ──▶ watch │ ──▶ observers
//!                 │     │                        │
//!                 │     └──▶ effects             │
//!                 └───────────┬──────────────────┘
//!                             │ run / send / cancel
//!                             ▼
//!                     async tasks ──▶ actions (back into the store)
//! ```
//!
//! ## Modules
//!
//! - [`effect`]: the `Effect` value type, `Emitter`, and `CancelKey`
//! - [`reducer`]: the `Reducer` trait plus `Scoped` and `Combined`
//! - [`store`]: the `Store` that owns state and interprets effects

pub mod effect;
pub mod reducer;
pub mod store;

pub use effect::{CancelKey, Effect, Emitter};
pub use reducer::{Combined, Reducer, Scoped};
pub use store::Store;
