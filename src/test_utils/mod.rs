//! Shared doubles for unit tests: a deterministic scheduler, an in-memory
//! storage and the logger bootstrap.
mod common;
mod manual_scheduler;
mod mem_storage;
mod recording_listener;

pub use common::*;
pub use manual_scheduler::*;
pub use mem_storage::*;
pub use recording_listener::*;
