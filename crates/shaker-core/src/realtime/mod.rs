//! Realtime push channel and the cache invalidation built on it.

mod connection;
mod sync;

pub use connection::{ConnectionManager, Listener, ListenerId};
pub use sync::{ProjectSync, Refetch};
