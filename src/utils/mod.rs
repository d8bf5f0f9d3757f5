mod guarded;
mod scheduler;

pub use guarded::*;
pub use scheduler::*;
