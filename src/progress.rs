use std::path::Path;

use crate::state_machine::Stage;

/// Receives progress events from a running submission.
///
/// Every method defaults to a no-op so sinks only implement what they show.
pub trait ProgressSink {
    fn stage_started(&self, _stage: Stage) {}

    fn stage_completed(&self, _stage: Stage) {}

    fn stage_failed(&self, _stage: Stage, _diagnostic: &str) {}

    fn file_started(&self, _file_index: u32, _path: &Path, _total_bytes: u64) {}

    fn part_sent(&self, _file_index: u32, _bytes_sent: u64, _total_bytes: u64) {}

    fn confirm_pending(&self, _poll: u32) {}
}
