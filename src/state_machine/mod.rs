mod job;
mod state;

pub use job::{FileReceipt, FileRole, Job, StageResponse, SubmissionReport};
pub use state::{JobState, Stage, StageOutcome, StateMachine, Transition};
