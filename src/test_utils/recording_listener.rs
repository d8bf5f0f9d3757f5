use parking_lot::Mutex;

use crate::CommitListener;
use crate::LogIndex;

/// Remembers every commit index it was told about.
#[derive(Debug, Default)]
pub struct RecordingListener {
    seen: Mutex<Vec<LogIndex>>,
}

impl RecordingListener {
    pub fn seen(&self) -> Vec<LogIndex> {
        self.seen.lock().clone()
    }
}

impl CommitListener for RecordingListener {
    fn on_commit_index_advanced(
        &self,
        commit_index: LogIndex,
    ) {
        self.seen.lock().push(commit_index);
    }
}
