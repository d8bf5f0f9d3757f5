mod commit;
mod compaction;
mod wait_queue;

pub use commit::*;
pub use compaction::*;
pub use wait_queue::*;
