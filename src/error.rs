use thiserror::Error;

use crate::hpod::TransportError;
use crate::state_machine::Stage;

/// Terminal failure of a submission. Throttling never reaches this type.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("authentication failed (status {status}): {body}")]
    AuthenticationFailed { status: u16, body: String },

    #[error("print job initialisation failed (status {status}): {body}")]
    InitializationFailed { status: u16, body: String },

    #[error("transfer of file {file_index} failed: {source}")]
    TransferFailed {
        stage: Stage,
        file_index: u32,
        #[source]
        source: TransferError,
    },

    #[error("failed to commit print job (status {status}): {body}")]
    CommitFailed { status: u16, body: String },

    #[error("submission was not confirmed after {polls} poll(s) (status {status}): {body}")]
    ConfirmationFailed { polls: u32, status: u16, body: String },

    #[error("{stage} stage could not reach the service: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: TransportError,
    },
}

impl SubmissionError {
    /// Stage the failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            SubmissionError::AuthenticationFailed { .. } => Stage::Authenticate,
            SubmissionError::InitializationFailed { .. } => Stage::Initialize,
            SubmissionError::TransferFailed { stage, .. } => *stage,
            SubmissionError::CommitFailed { .. } => Stage::Commit,
            SubmissionError::ConfirmationFailed { .. } => Stage::Confirm,
            SubmissionError::Transport { stage, .. } => *stage,
        }
    }

    /// Raw response body or diagnostic text for the reporting collaborator.
    pub fn diagnostic(&self) -> String {
        match self {
            SubmissionError::AuthenticationFailed { body, .. }
            | SubmissionError::InitializationFailed { body, .. }
            | SubmissionError::CommitFailed { body, .. }
            | SubmissionError::ConfirmationFailed { body, .. } => body.clone(),
            SubmissionError::TransferFailed { source, .. } => source.diagnostic(),
            SubmissionError::Transport { source, .. } => source.to_string(),
        }
    }
}

/// Why one file transfer stopped.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} shrank to {read} of {expected} bytes during transfer")]
    Truncated {
        path: String,
        read: u64,
        expected: u64,
    },

    #[error("part {part_index} rejected by {endpoint} (status {status}): {body}")]
    PartRejected {
        endpoint: String,
        part_index: u32,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl TransferError {
    fn diagnostic(&self) -> String {
        match self {
            TransferError::PartRejected { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_map_to_stages() {
        let err = SubmissionError::InitializationFailed {
            status: 400,
            body: "{}".into(),
        };
        assert_eq!(err.stage(), Stage::Initialize);

        let err = SubmissionError::Transport {
            stage: Stage::Commit,
            source: TransportError::InvalidHeader {
                name: "authorization",
                reason: "bad".into(),
            },
        };
        assert_eq!(err.stage(), Stage::Commit);
    }

    #[test]
    fn part_rejection_keeps_raw_body() {
        let err = SubmissionError::TransferFailed {
            stage: Stage::SendAttachments,
            file_index: 2,
            source: TransferError::PartRejected {
                endpoint: "print/attpart".into(),
                part_index: 7,
                status: 500,
                body: r#"{"result":{"code":"500"}}"#.into(),
            },
        };
        assert_eq!(err.diagnostic(), r#"{"result":{"code":"500"}}"#);
        assert_eq!(err.stage(), Stage::SendAttachments);
        assert_eq!(
            err.to_string(),
            r#"transfer of file 2 failed: part 7 rejected by print/attpart (status 500): {"result":{"code":"500"}}"#
        );
    }

    #[test]
    fn truncated_display() {
        let err = TransferError::Truncated {
            path: "doc.pdf".into(),
            read: 10,
            expected: 20,
        };
        assert_eq!(err.to_string(), "doc.pdf shrank to 10 of 20 bytes during transfer");
    }
}
