pub mod backoff;
pub mod client;
pub mod error;
pub mod types;

pub use backoff::BackoffPolicy;
pub use client::{ApiExecutor, ClientSettings, HpodClient};
pub use error::TransportError;
pub use types::{ApiCall, ApiResult, Credentials};
