mod log_range;
mod storage_manager;


#[doc(hidden)]
pub use log_range::*;
#[doc(hidden)]
pub use storage_manager::*;
