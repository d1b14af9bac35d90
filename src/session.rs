//! Authentication against the service and the header set derived from it.
//!
//! A [`Session`] is a plain value: the bearer token plus, once the job is
//! initialized, its guid. [`Session::headers`] rebuilds the header set from
//! that value for every call instead of accumulating state on a shared client.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SubmissionError;
use crate::hpod::types::{AUTHENTICATE, AuthResponse};
use crate::hpod::{ApiCall, ApiExecutor, ApiResult, Credentials, TransportError};
use crate::state_machine::Stage;

/// Job-correlation header carried once `print/init` has assigned a guid.
pub const JOB_GUID_HEADER: &str = "hpod-jobguid";

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    bearer_token: String,
    job_id: Option<Uuid>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("bearer_token", &"<redacted>")
            .field("job_id", &self.job_id)
            .finish()
    }
}

impl Session {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            job_id: None,
        }
    }

    /// Same session, now scoped to `job_id`.
    pub fn with_job(self, job_id: Uuid) -> Self {
        Self {
            job_id: Some(job_id),
            ..self
        }
    }

    /// Header set every call after authentication must carry.
    pub fn headers(&self) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.bearer_token)).map_err(|e| {
            TransportError::InvalidHeader {
                name: "authorization",
                reason: e.to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, bearer);

        if let Some(job_id) = self.job_id {
            let value = HeaderValue::from_str(&job_id.to_string()).map_err(|e| {
                TransportError::InvalidHeader {
                    name: JOB_GUID_HEADER,
                    reason: e.to_string(),
                }
            })?;
            headers.insert(HeaderName::from_static(JOB_GUID_HEADER), value);
        }
        Ok(headers)
    }
}

/// Exchanges `credentials` for a [`Session`].
///
/// Returns the deciding response alongside the session so the caller can
/// keep it for diagnostics.
pub async fn authenticate(
    executor: &impl ApiExecutor,
    credentials: &Credentials,
) -> Result<(Session, ApiResult), SubmissionError> {
    let body = serde_json::to_string(credentials).map_err(|e| SubmissionError::AuthenticationFailed {
        status: 0,
        body: e.to_string(),
    })?;
    debug!(account = %credentials.account_login, email = %credentials.email, "authenticating");

    let result = executor
        .execute(ApiCall::post_json(AUTHENTICATE, HeaderMap::new(), body))
        .await
        .map_err(|source| SubmissionError::Transport {
            stage: Stage::Authenticate,
            source,
        })?;

    if !result.is_success() {
        return Err(SubmissionError::AuthenticationFailed {
            status: result.code(),
            body: result.body,
        });
    }

    let response: AuthResponse = match serde_json::from_str(&result.body) {
        Ok(response) => response,
        Err(_) => {
            return Err(SubmissionError::AuthenticationFailed {
                status: result.code(),
                body: result.body,
            });
        }
    };

    let session = Session::new(response.token);
    // A token that cannot travel as a header is as good as no token.
    if session.headers().is_err() {
        return Err(SubmissionError::AuthenticationFailed {
            status: result.code(),
            body: result.body,
        });
    }

    info!(account = %credentials.account_login, "authenticated");
    Ok((session, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpod::client::tests::client_for;
    use crate::hpod::types::STATUS_OK;
    use crate::testing::{ScriptedExecutor, result_with};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            account_login: "acme".into(),
            email: "ops@acme.test".into(),
            password: "s3cret".into(),
        }
    }

    #[test]
    fn headers_without_job_carry_only_bearer() {
        let headers = Session::new("tok-123").headers().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[AUTHORIZATION], "Bearer tok-123");
    }

    #[test]
    fn headers_with_job_carry_guid() {
        let job_id = Uuid::new_v4();
        let session = Session::new("tok-123").with_job(job_id);
        let headers = session.headers().unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[JOB_GUID_HEADER], job_id.to_string().as_str());
    }

    #[test]
    fn debug_redacts_token() {
        let debug = format!("{:?}", Session::new("very-secret"));
        assert!(!debug.contains("very-secret"));
    }

    #[tokio::test]
    async fn authenticate_posts_credentials_and_reads_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/authenticate"))
            .and(body_json(serde_json::json!({
                "accountLogin": "acme",
                "email": "ops@acme.test",
                "password": "s3cret"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "tok-abc",
                "result": { "code": "200" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (session, response) = authenticate(&client_for(&server), &credentials())
            .await
            .unwrap();

        assert_eq!(session, Session::new("tok-abc"));
        assert_eq!(response.code(), STATUS_OK);
    }

    #[tokio::test]
    async fn authenticate_failure_keeps_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/authenticate"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid login"))
            .mount(&server)
            .await;

        let err = authenticate(&client_for(&server), &credentials())
            .await
            .unwrap_err();

        match err {
            SubmissionError::AuthenticationFailed { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid login");
            }
            other => panic!("expected AuthenticationFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn embedded_failure_code_fails_authentication() {
        let executor = ScriptedExecutor::new(|_| result_with(r#"{"result":{"code":"403"}}"#));
        let err = authenticate(&executor, &credentials()).await.unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::AuthenticationFailed { status: 403, .. }
        ));
    }

    #[tokio::test]
    async fn missing_token_fails_authentication() {
        let executor = ScriptedExecutor::new(|_| result_with(r#"{"result":{"code":"200"}}"#));
        let err = authenticate(&executor, &credentials()).await.unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::AuthenticationFailed { status: 200, .. }
        ));
    }

    #[tokio::test]
    async fn unusable_token_fails_authentication() {
        let executor = ScriptedExecutor::new(|_| result_with("{\"token\":\"bad\\ntoken\"}"));
        let err = authenticate(&executor, &credentials()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::AuthenticationFailed { .. }));
    }
}
