use crate::LogIndex;
use crate::LogRange;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

pub(crate) fn range(
    from: u64,
    to: u64,
) -> LogRange {
    LogRange::new(LogIndex::from(from), LogIndex::from(to))
}
