use std::fmt;

use serde::{Deserialize, Serialize};

use super::job::Job;

/// Unit of work the submission workflow performs, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Authenticate,
    Initialize,
    SendDocument,
    SendAttachments,
    Commit,
    Confirm,
}

impl Stage {
    /// State the job enters when this stage succeeds. Authentication does not
    /// move the job.
    fn completes_into(self) -> Option<JobState> {
        match self {
            Stage::Authenticate => None,
            Stage::Initialize => Some(JobState::Initialized),
            Stage::SendDocument => Some(JobState::DocumentSent),
            Stage::SendAttachments => Some(JobState::AttachmentsSent),
            Stage::Commit => Some(JobState::Committed),
            Stage::Confirm => Some(JobState::Confirmed),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Authenticate => write!(f, "authenticate"),
            Stage::Initialize => write!(f, "initialize"),
            Stage::SendDocument => write!(f, "send document"),
            Stage::SendAttachments => write!(f, "send attachments"),
            Stage::Commit => write!(f, "commit"),
            Stage::Confirm => write!(f, "confirm"),
        }
    }
}

/// Lifecycle of a print job.
///
/// UNINITIALIZED → INITIALIZED → DOCUMENT_SENT → ATTACHMENTS_SENT → COMMITTED → CONFIRMED,
/// or FAILED from any non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum JobState {
    Uninitialized,
    Initialized,
    DocumentSent,
    AttachmentsSent,
    Committed,
    Confirmed,
    Failed { stage: Stage, reason: String },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Confirmed | JobState::Failed { .. })
    }

    fn accepts(&self, stage: Stage) -> bool {
        matches!(
            (self, stage),
            (JobState::Uninitialized, Stage::Authenticate | Stage::Initialize)
                | (JobState::Initialized, Stage::SendDocument)
                | (JobState::DocumentSent, Stage::SendAttachments)
                | (JobState::AttachmentsSent, Stage::Commit)
                | (JobState::Committed, Stage::Confirm)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Uninitialized => write!(f, "UNINITIALIZED"),
            JobState::Initialized => write!(f, "INITIALIZED"),
            JobState::DocumentSent => write!(f, "DOCUMENT_SENT"),
            JobState::AttachmentsSent => write!(f, "ATTACHMENTS_SENT"),
            JobState::Committed => write!(f, "COMMITTED"),
            JobState::Confirmed => write!(f, "CONFIRMED"),
            JobState::Failed { stage, .. } => write!(f, "FAILED({stage})"),
        }
    }
}

/// Result of running one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    Failure(String),
}

/// The result of evaluating a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The job moved one state forward.
    Next(JobState),
    /// The stage succeeded without moving the job (authentication).
    Unchanged,
    /// The job is now terminally failed at this stage.
    Failed(Stage),
    /// The stage does not follow from the current state; the job is untouched.
    Rejected { from: JobState, stage: Stage },
}

/// Drives a [`Job`] through its states. Transitions are strictly forward and
/// one step at a time.
pub struct StateMachine;

impl StateMachine {
    pub fn next(job: &mut Job, stage: Stage, outcome: StageOutcome) -> Transition {
        if job.state.is_terminal() || !job.state.accepts(stage) {
            return Transition::Rejected {
                from: job.state.clone(),
                stage,
            };
        }

        match outcome {
            StageOutcome::Success => match stage.completes_into() {
                Some(next_state) => {
                    job.enter(next_state.clone());
                    Transition::Next(next_state)
                }
                None => Transition::Unchanged,
            },
            StageOutcome::Failure(reason) => {
                job.enter(JobState::Failed { stage, reason });
                Transition::Failed(stage)
            }
        }
    }
}
