//! Stagedoor library: the reusable core of the ticket marketplace client.
//!
//! State management lives in [`runtime`], the features built on it in
//! [`features`], and their collaborators in [`api`] and [`storage`].

pub mod api;
pub mod config;
pub mod features;
pub mod runtime;
pub mod storage;
pub mod testing;

#[cfg(test)]
pub mod test_support;
