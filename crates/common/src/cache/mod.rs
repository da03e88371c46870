//! TTL response cache over the key-value store.
//!
//! Successful GET responses are memoized under `@cache:<key>` as a JSON
//! envelope carrying the payload, its write time, its own TTL, and a set
//! of invalidation tags. Expiry is lazy (an expired entry is deleted on
//! the read that discovers it) with an eager [`clear_expired`]
//! (`CacheStore::clear_expired`) sweep available. Mutations invalidate by
//! tag rather than by string-matching key prefixes.

mod store;

pub use store::{CacheLookup, CacheStore, DEFAULT_TTL};
