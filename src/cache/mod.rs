//! Query caching layer.
//!
//! This module provides the `QueryCache` that sits between the UI-facing
//! service layer and the `ApiClient`. Values are cached under semantic
//! `QueryKey`s in three policy classes:
//!
//! - lists (events, blogs): 5 minute staleness, periodic background refresh
//! - detail records: 10 minute staleness, refreshed on demand
//! - live registration counters: 30 second staleness, refreshed on interval
//!   and window focus
//!
//! Reads are de-duplicated and served stale-while-revalidate; writes go
//! through `Mutation`, which applies the expected effect optimistically and
//! rolls back on failure.

pub mod key;
pub mod mutation;
pub mod policy;
pub mod store;

pub use key::{KeyClass, QueryKey};
pub use mutation::{Mutation, MutationState};
pub use policy::QueryPolicy;
pub use store::{
    query_fn, CachedValue, QueryCache, QueryError, QueryFn, QueryState, QuerySubscription,
};
