mod cli;
mod config;
mod error;
mod hpod;
mod inputs;
mod progress;
mod session;
mod state_machine;
#[cfg(test)]
mod testing;
mod transfer;
mod ui;
mod workflow;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cli::Cli;
use config::SubmitConfig;
use hpod::{Credentials, HpodClient};
use state_machine::Job;
use ui::TerminalProgress;
use workflow::{SubmissionInputs, SubmissionWorkflow};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one submission. `Ok(false)` means a stage failed and was reported.
async fn run(cli: Cli) -> Result<bool> {
    let config = SubmitConfig::load(cli.config.as_deref())?;
    let password = cli
        .password
        .clone()
        .or_else(|| config.password.clone())
        .context("no password given: pass -p or set HPOD_PASSWORD")?;

    let print_options = inputs::load_print_options(&cli.options_file)?;
    let attachments = cli
        .attachment_list
        .as_deref()
        .map(inputs::load_attachment_list)
        .transpose()?;

    let client = match &config.base_url {
        Some(base_url) => HpodClient::with_base_url(base_url.clone(), config.client_settings()),
        None => HpodClient::new(&cli.instance, config.client_settings()),
    }
    .context("failed to build HTTP client")?;
    info!(base_url = client.base_url(), "submitting to H-POD");

    let workflow = SubmissionWorkflow::new(client, config.workflow_settings());
    let credentials = Credentials {
        account_login: cli.account_login,
        email: cli.email,
        password,
    };
    let inputs = SubmissionInputs {
        print_options,
        document: cli.file,
        attachments,
    };

    let mut job = Job::new();
    let progress = TerminalProgress::start(cli.verbose);
    let outcome = workflow.run(&mut job, &credentials, &inputs, &progress).await;
    progress.complete(&outcome);

    Ok(outcome.is_ok())
}
