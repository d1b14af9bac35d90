use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{JobState, Stage};

/// One print submission. The id is assigned by the service at `print/init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Option<Uuid>,
    pub state: JobState,
    pub state_history: Vec<JobState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

impl Job {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            state: JobState::Uninitialized,
            state_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(super) fn enter(&mut self, next: JobState) {
        let previous = std::mem::replace(&mut self.state, next);
        self.state_history.push(previous);
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Document,
    Attachment,
}

/// A file that was fully transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReceipt {
    pub role: FileRole,
    pub file_index: u32,
    pub path: PathBuf,
    pub bytes_sent: u64,
}

/// The deciding response of a stage, kept verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResponse {
    pub stage: Stage,
    pub status: u16,
    pub body: String,
}

/// Structured record produced when a submission is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub job_id: Option<Uuid>,
    pub state_transitions: Vec<JobState>,
    pub files: Vec<FileReceipt>,
    pub responses: Vec<StageResponse>,
    pub confirm_polls: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl SubmissionReport {
    pub fn from_job(
        job: &Job,
        files: Vec<FileReceipt>,
        responses: Vec<StageResponse>,
        confirm_polls: u32,
    ) -> Self {
        let now = Utc::now();
        let mut transitions = job.state_history.clone();
        transitions.push(job.state.clone());

        Self {
            job_id: job.id,
            state_transitions: transitions,
            files,
            responses,
            confirm_polls,
            started_at: job.created_at,
            completed_at: now,
            duration_ms: (now - job.created_at).num_milliseconds(),
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes_sent).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_creation_defaults() {
        let job = Job::new();
        assert!(job.id.is_none());
        assert_eq!(job.state, JobState::Uninitialized);
        assert!(job.state_history.is_empty());
    }

    #[test]
    fn report_from_job_appends_current_state() {
        let mut job = Job::new();
        job.enter(JobState::Initialized);
        let files = vec![
            FileReceipt {
                role: FileRole::Document,
                file_index: 0,
                path: "doc.pdf".into(),
                bytes_sent: 4000,
            },
            FileReceipt {
                role: FileRole::Attachment,
                file_index: 0,
                path: "a.csv".into(),
                bytes_sent: 12,
            },
        ];
        let report = SubmissionReport::from_job(&job, files, Vec::new(), 0);

        assert_eq!(
            report.state_transitions,
            vec![JobState::Uninitialized, JobState::Initialized]
        );
        assert_eq!(report.total_bytes(), 4012);
        assert!(report.duration_ms >= 0);
    }

    #[test]
    fn report_serializes_failed_state() {
        let mut job = Job::new();
        job.enter(JobState::Failed {
            stage: Stage::Initialize,
            reason: "status 400".into(),
        });
        let report = SubmissionReport::from_job(&job, Vec::new(), Vec::new(), 0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state_transitions"][1]["state"], "failed");
        assert_eq!(json["state_transitions"][1]["stage"], "initialize");
    }
}
