//! Command-line interface based on clap.
//!
//! Short flags follow the long-standing H-POD submission tool
//! (`-i -f -o -l -a -u -p`).

use std::path::PathBuf;

use clap::Parser;

/// Submit a document and its attachments to an H-POD instance.
#[derive(Debug, Parser)]
#[command(name = "hpod-submit", version, about)]
pub struct Cli {
    /// DNS name of the H-POD instance.
    #[arg(short = 'i', long)]
    pub instance: String,

    /// Path to the document to submit.
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Path to the .json file containing the print options.
    #[arg(short = 'o', long = "options")]
    pub options_file: PathBuf,

    /// File listing attachments to submit, one path per line.
    #[arg(short = 'l', long)]
    pub attachment_list: Option<PathBuf>,

    /// Account login.
    #[arg(short = 'a', long)]
    pub account_login: String,

    /// User login (email).
    #[arg(short = 'u', long)]
    pub email: String,

    /// Password. Falls back to HPOD_PASSWORD or the config file.
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Configuration file (defaults to ./hpod.toml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_original_short_flags() {
        let cli = Cli::parse_from([
            "hpod-submit",
            "-i",
            "print.example.com",
            "-f",
            "report.pdf",
            "-o",
            "options.json",
            "-l",
            "attachments.txt",
            "-a",
            "acme",
            "-u",
            "ops@acme.test",
            "-p",
            "s3cret",
        ]);
        assert_eq!(cli.instance, "print.example.com");
        assert_eq!(cli.file, PathBuf::from("report.pdf"));
        assert_eq!(cli.options_file, PathBuf::from("options.json"));
        assert_eq!(cli.attachment_list, Some(PathBuf::from("attachments.txt")));
        assert_eq!(cli.account_login, "acme");
        assert_eq!(cli.email, "ops@acme.test");
        assert_eq!(cli.password.as_deref(), Some("s3cret"));
        assert!(!cli.verbose);
    }

    #[test]
    fn attachment_list_and_password_are_optional() {
        let cli = Cli::parse_from([
            "hpod-submit",
            "--instance",
            "print.example.com",
            "--file",
            "report.pdf",
            "--options",
            "options.json",
            "--account-login",
            "acme",
            "--email",
            "ops@acme.test",
            "--verbose",
        ]);
        assert!(cli.attachment_list.is_none());
        assert!(cli.password.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn missing_required_flag_is_an_error() {
        let result = Cli::try_parse_from(["hpod-submit", "-i", "print.example.com"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
