//! Terminal output: spinners, transfer bars and coloured stage results.
//!
//! Uses `indicatif` for the spinner and byte progress bars and `console`
//! for styling. [`TerminalProgress`] is the [`ProgressSink`] the binary
//! plugs into the submission workflow.

use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

use console::Style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::error::SubmissionError;
use crate::progress::ProgressSink;
use crate::state_machine::{Stage, SubmissionReport};

/// Human-readable label shown while a stage runs.
fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Authenticate => "Authenticating",
        Stage::Initialize => "Initialising print job",
        Stage::SendDocument => "Sending document",
        Stage::SendAttachments => "Sending attachments",
        Stage::Commit => "Committing submission for processing",
        Stage::Confirm => "Validating receipt of submission",
    }
}

pub struct TerminalProgress {
    multi: MultiProgress,
    spinner: ProgressBar,
    // Byte bar of the file currently being transferred.
    transfer: RefCell<Option<ProgressBar>>,
    verbose: bool,
    green: Style,
    red: Style,
    yellow: Style,
}

impl TerminalProgress {
    pub fn start(verbose: bool) -> Self {
        Self::with_target(ProgressDrawTarget::stderr(), verbose)
    }

    fn with_target(target: ProgressDrawTarget, verbose: bool) -> Self {
        let multi = MultiProgress::with_draw_target(target);
        let spinner = multi.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            multi,
            spinner,
            transfer: RefCell::new(None),
            verbose,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    fn finish_transfer(&self) {
        if let Some(bar) = self.transfer.borrow_mut().take() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }

    /// Stops the spinner and prints the outcome of the whole run.
    pub fn complete(&self, outcome: &Result<SubmissionReport, SubmissionError>) {
        self.finish_transfer();
        self.spinner.finish_and_clear();
        match outcome {
            Ok(report) => {
                let job = report
                    .job_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {} Submission confirmed (job {job}, {} file(s), {} bytes)",
                    self.green.apply_to("✓"),
                    report.files.len(),
                    report.total_bytes()
                );
                if self.verbose {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(report).unwrap_or_default()
                    );
                }
            }
            Err(err) => {
                eprintln!("  {} {err}", self.red.apply_to("✗"));
            }
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn stage_started(&self, stage: Stage) {
        self.spinner.set_message(format!("{}...", stage_label(stage)));
    }

    fn stage_completed(&self, stage: Stage) {
        self.finish_transfer();
        self.spinner.println(format!(
            "  {} {}",
            self.green.apply_to("✓"),
            stage_label(stage)
        ));
    }

    fn stage_failed(&self, stage: Stage, diagnostic: &str) {
        self.finish_transfer();
        self.spinner.println(format!(
            "  {} {} failed",
            self.red.apply_to("✗"),
            stage_label(stage)
        ));
        if !diagnostic.is_empty() {
            self.spinner.println(format!("    {diagnostic}"));
        }
    }

    fn file_started(&self, _file_index: u32, path: &Path, total_bytes: u64) {
        self.finish_transfer();
        let bar = self.multi.add(ProgressBar::new(total_bytes));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("    {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(path.display().to_string());
        *self.transfer.borrow_mut() = Some(bar);
    }

    fn part_sent(&self, _file_index: u32, bytes_sent: u64, _total_bytes: u64) {
        if let Some(bar) = self.transfer.borrow().as_ref() {
            bar.set_position(bytes_sent);
        }
    }

    fn confirm_pending(&self, poll: u32) {
        self.spinner.set_message(format!(
            "{}... {}",
            stage_label(Stage::Confirm),
            self.yellow.apply_to(format!("↻ retry {poll}"))
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stage_has_a_label() {
        for stage in [
            Stage::Authenticate,
            Stage::Initialize,
            Stage::SendDocument,
            Stage::SendAttachments,
            Stage::Commit,
            Stage::Confirm,
        ] {
            assert!(!stage_label(stage).is_empty());
        }
    }

    #[test]
    fn transfer_bar_tracks_current_file() {
        let progress = TerminalProgress::with_target(ProgressDrawTarget::hidden(), false);
        progress.file_started(0, Path::new("doc.pdf"), 4000);
        progress.part_sent(0, 2000, 4000);
        assert_eq!(
            progress.transfer.borrow().as_ref().map(|b| b.position()),
            Some(2000)
        );

        progress.stage_completed(Stage::SendDocument);
        assert!(progress.transfer.borrow().is_none());
    }
}
