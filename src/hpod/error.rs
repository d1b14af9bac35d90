//! Transport-level failures of the H-POD client.
//!
//! Throttling never appears here: the executor absorbs it. What is left is
//! the network itself failing or a request that could not be built.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS, TLS, connection or timeout failure underneath the call.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A header value could not be encoded (token, file name, ...).
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_header_display() {
        let err = TransportError::InvalidHeader {
            name: "hpod-filename",
            reason: "failed to parse header value".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid header hpod-filename: failed to parse header value"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransportError>();
    }
}
