use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::SubmissionError;
use crate::hpod::types::{ATT_PART, COMMIT, COMMITTED, DOC_PART, InitResponse, PRINT_INIT};
use crate::hpod::{ApiCall, ApiExecutor, ApiResult, Credentials, TransportError};
use crate::progress::ProgressSink;
use crate::session::{Session, authenticate};
use crate::state_machine::{
    FileReceipt, FileRole, Job, Stage, StageOutcome, StageResponse, StateMachine,
    SubmissionReport, Transition,
};
use crate::transfer::{ChunkedFileSender, DEFAULT_CHUNK_SIZE};

/// Tunables of a submission run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub chunk_size: usize,
    /// Wait between two `print/committed` polls.
    pub confirm_poll_interval: Duration,
    /// Upper bound on `print/committed` polls; `None` polls until confirmed.
    pub max_confirm_polls: Option<u32>,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            confirm_poll_interval: Duration::from_millis(500),
            max_confirm_polls: None,
        }
    }
}

/// What gets submitted.
#[derive(Debug, Clone)]
pub struct SubmissionInputs {
    /// Print-options JSON, passed through to `print/init` untouched.
    pub print_options: String,
    pub document: PathBuf,
    /// `None` when no attachment list was given at all.
    pub attachments: Option<Vec<PathBuf>>,
}

#[derive(Default)]
struct Ledger {
    files: Vec<FileReceipt>,
    responses: Vec<StageResponse>,
}

impl Ledger {
    fn record(&mut self, stage: Stage, result: &ApiResult) {
        self.responses.push(StageResponse {
            stage,
            status: result.code(),
            body: result.body.clone(),
        });
    }
}

/// Drives one job from authentication to confirmed receipt.
pub struct SubmissionWorkflow<E> {
    executor: E,
    sender: ChunkedFileSender,
    settings: WorkflowSettings,
}

fn transport(stage: Stage) -> impl FnOnce(TransportError) -> SubmissionError {
    move |source| SubmissionError::Transport { stage, source }
}

fn session_headers(session: &Session, stage: Stage) -> Result<HeaderMap, SubmissionError> {
    session.headers().map_err(transport(stage))
}

impl<E: ApiExecutor> SubmissionWorkflow<E> {
    pub fn new(executor: E, settings: WorkflowSettings) -> Self {
        Self {
            executor,
            sender: ChunkedFileSender::new(settings.chunk_size),
            settings,
        }
    }

    #[cfg(test)]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Runs every stage in order and returns the report once the service has
    /// confirmed the job.
    ///
    /// The first failing stage ends the run: the job is left in
    /// `Failed(stage, reason)` and the error carries the raw response body.
    /// Nothing already transferred is rolled back.
    pub async fn run(
        &self,
        job: &mut Job,
        credentials: &Credentials,
        inputs: &SubmissionInputs,
        progress: &dyn ProgressSink,
    ) -> Result<SubmissionReport, SubmissionError> {
        let mut ledger = Ledger::default();
        match self.drive(job, credentials, inputs, progress, &mut ledger).await {
            Ok(confirm_polls) => Ok(SubmissionReport::from_job(
                job,
                ledger.files,
                ledger.responses,
                confirm_polls,
            )),
            Err(err) => {
                let stage = err.stage();
                StateMachine::next(job, stage, StageOutcome::Failure(err.to_string()));
                warn!(%stage, error = %err, "submission failed");
                progress.stage_failed(stage, &err.diagnostic());
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        job: &mut Job,
        credentials: &Credentials,
        inputs: &SubmissionInputs,
        progress: &dyn ProgressSink,
        ledger: &mut Ledger,
    ) -> Result<u32, SubmissionError> {
        // AUTHENTICATE
        progress.stage_started(Stage::Authenticate);
        let (session, response) = authenticate(&self.executor, credentials).await?;
        ledger.record(Stage::Authenticate, &response);
        self.complete(job, Stage::Authenticate, progress);

        // INITIALIZE
        progress.stage_started(Stage::Initialize);
        let session = self.initialize(job, session, &inputs.print_options, ledger).await?;
        self.complete(job, Stage::Initialize, progress);
        let headers = session_headers(&session, Stage::SendDocument)?;

        // SEND DOCUMENT
        progress.stage_started(Stage::SendDocument);
        self.send(&headers, FileRole::Document, &inputs.document, 0, progress, ledger)
            .await?;
        self.complete(job, Stage::SendDocument, progress);

        // SEND ATTACHMENTS
        progress.stage_started(Stage::SendAttachments);
        if let Some(attachments) = &inputs.attachments {
            let mut file_index = 0;
            for path in attachments {
                if !is_existing_file(path).await {
                    debug!(path = %path.display(), "skipping missing attachment");
                    continue;
                }
                self.send(&headers, FileRole::Attachment, path, file_index, progress, ledger)
                    .await?;
                file_index += 1;
            }
        }
        self.complete(job, Stage::SendAttachments, progress);

        // COMMIT
        progress.stage_started(Stage::Commit);
        let result = self
            .executor
            .execute(ApiCall::get(COMMIT, headers.clone()))
            .await
            .map_err(transport(Stage::Commit))?;
        if !result.is_success() {
            return Err(SubmissionError::CommitFailed {
                status: result.code(),
                body: result.body,
            });
        }
        ledger.record(Stage::Commit, &result);
        self.complete(job, Stage::Commit, progress);

        // CONFIRM
        progress.stage_started(Stage::Confirm);
        let polls = self.confirm(&headers, progress, ledger).await?;
        self.complete(job, Stage::Confirm, progress);

        Ok(polls)
    }

    async fn initialize(
        &self,
        job: &mut Job,
        session: Session,
        print_options: &str,
        ledger: &mut Ledger,
    ) -> Result<Session, SubmissionError> {
        let headers = session_headers(&session, Stage::Initialize)?;
        let result = self
            .executor
            .execute(ApiCall::post_json(PRINT_INIT, headers, print_options.to_string()))
            .await
            .map_err(transport(Stage::Initialize))?;
        if !result.is_success() {
            return Err(SubmissionError::InitializationFailed {
                status: result.code(),
                body: result.body,
            });
        }

        let job_id = match serde_json::from_str::<InitResponse>(&result.body) {
            Ok(init) => init.job_guid,
            Err(_) => {
                return Err(SubmissionError::InitializationFailed {
                    status: result.code(),
                    body: result.body,
                });
            }
        };

        info!(%job_id, "print job initialised");
        ledger.record(Stage::Initialize, &result);
        job.id = Some(job_id);
        Ok(session.with_job(job_id))
    }

    async fn send(
        &self,
        headers: &HeaderMap,
        role: FileRole,
        path: &Path,
        file_index: u32,
        progress: &dyn ProgressSink,
        ledger: &mut Ledger,
    ) -> Result<(), SubmissionError> {
        let (endpoint, stage) = match role {
            FileRole::Document => (DOC_PART, Stage::SendDocument),
            FileRole::Attachment => (ATT_PART, Stage::SendAttachments),
        };
        let bytes_sent = self
            .sender
            .send_file(&self.executor, headers, endpoint, path, file_index, progress)
            .await
            .map_err(|source| SubmissionError::TransferFailed {
                stage,
                file_index,
                source,
            })?;

        info!(path = %path.display(), file_index, bytes_sent, "file sent");
        ledger.files.push(FileReceipt {
            role,
            file_index,
            path: path.to_path_buf(),
            bytes_sent,
        });
        Ok(())
    }

    /// Polls `print/committed` until the service reports the job as received.
    async fn confirm(
        &self,
        headers: &HeaderMap,
        progress: &dyn ProgressSink,
        ledger: &mut Ledger,
    ) -> Result<u32, SubmissionError> {
        let max_polls = self.settings.max_confirm_polls.map(|max| max.max(1));
        let mut polls: u32 = 0;
        loop {
            let result = self
                .executor
                .execute(ApiCall::get(COMMITTED, headers.clone()))
                .await
                .map_err(transport(Stage::Confirm))?;
            polls += 1;

            if result.is_success() {
                ledger.record(Stage::Confirm, &result);
                return Ok(polls);
            }
            if matches!(max_polls, Some(max) if polls >= max) {
                return Err(SubmissionError::ConfirmationFailed {
                    polls,
                    status: result.code(),
                    body: result.body,
                });
            }

            debug!(polls, status = result.code(), "submission not confirmed yet");
            progress.confirm_pending(polls);
            sleep(self.settings.confirm_poll_interval).await;
        }
    }

    fn complete(&self, job: &mut Job, stage: Stage, progress: &dyn ProgressSink) {
        let transition = StateMachine::next(job, stage, StageOutcome::Success);
        debug_assert!(
            !matches!(transition, Transition::Rejected { .. }),
            "stage {stage} completed out of order from {}",
            job.state
        );
        info!(%stage, state = %job.state, "stage complete");
        progress.stage_completed(stage);
    }
}

async fn is_existing_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
