//! Durable, observable pool of in-flight user operations
//!
//! The pool is the single shared mutable resource of the engine. All mutation goes through the
//! key-path-addressable [StateStore](crate::StateStore) primitive, whose atomic updates and
//! path-filtered change notifications give waiters a consistent view: a subscriber never
//! observes a torn write, and `wait` resolves exactly once per operation.

mod bridge;
mod error;
mod pool;
mod store;

pub use bridge::EntryPointBridge;
pub use error::PoolError;
pub use pool::{PoolState, UserOperationPool};
pub use store::{MemoryStore, StatePath, StateStore, StateSubscription};
