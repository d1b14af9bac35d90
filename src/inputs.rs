//! Reads the submission inputs that live on disk: the print-options document
//! and the optional attachment list.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Reads the print-options file as text. The JSON must be well-formed; its
/// contents are the service's business.
pub fn load_print_options(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read print options {}", path.display()))?;
    serde_json::from_str::<serde_json::Value>(&text)
        .with_context(|| format!("print options {} are not valid JSON", path.display()))?;
    Ok(text)
}

/// Reads a newline-delimited list of attachment paths.
pub fn load_attachment_list(path: &Path) -> Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attachment list {}", path.display()))?;
    Ok(parse_attachment_list(&text))
}

/// One path per line; surrounding whitespace is trimmed and blank lines dropped.
pub fn parse_attachment_list(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_blank_lines_and_crlf() {
        let list = parse_attachment_list("a.pdf\r\n\r\n  b.csv  \n\n/tmp/c.txt");
        assert_eq!(
            list,
            vec![
                PathBuf::from("a.pdf"),
                PathBuf::from("b.csv"),
                PathBuf::from("/tmp/c.txt")
            ]
        );
    }

    #[test]
    fn parse_empty_list() {
        assert!(parse_attachment_list("").is_empty());
        assert!(parse_attachment_list("\n \n").is_empty());
    }

    #[test]
    fn load_print_options_returns_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        let json = "{ \"copies\": 2, \"duplex\": true }\n";
        std::fs::write(&path, json).unwrap();

        assert_eq!(load_print_options(&path).unwrap(), json);
    }

    #[test]
    fn load_print_options_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, "{ copies: ").unwrap();

        let err = load_print_options(&path).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn load_missing_attachment_list_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_attachment_list(&dir.path().join("missing.txt")).is_err());
    }
}
