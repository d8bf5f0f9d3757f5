//! One-shot multi-waiter resolution.
//!
//! Owners keep these queues inside their guarded state. Every resolve
//! operation only moves waiters out of the queue and returns a
//! [`DeferredAction`]; delivering the result happens when the action fires,
//! after the owner released its lock. A waiter continuation may therefore
//! call straight back into its owner without deadlocking.
//!
//! Every waiter registered before a resolve call receives exactly one value.
//! Waiters registered afterwards join the next round.

mod deferred_action;
mod index_wait_queue;
mod resolve_aggregator;

pub use deferred_action::*;
pub use index_wait_queue::*;
pub use resolve_aggregator::*;
