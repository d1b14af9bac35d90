//! In-memory executor for tests that care about call order rather than HTTP.

use std::cell::RefCell;

use crate::hpod::{ApiCall, ApiExecutor, ApiResult, TransportError};
use crate::progress::ProgressSink;

type Responder = Box<dyn Fn(&ApiCall) -> ApiResult>;

/// Answers every call with `responder` and records what it was asked.
pub struct ScriptedExecutor {
    calls: RefCell<Vec<ApiCall>>,
    responder: Responder,
}

impl ScriptedExecutor {
    pub fn new(responder: impl Fn(&ApiCall) -> ApiResult + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Succeeds every call.
    pub fn accepting() -> Self {
        Self::new(|_| ok())
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.borrow().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.path.clone()).collect()
    }
}

impl ApiExecutor for ScriptedExecutor {
    async fn execute(&self, call: ApiCall) -> Result<ApiResult, TransportError> {
        let result = (self.responder)(&call);
        self.calls.borrow_mut().push(call);
        Ok(result)
    }
}

/// A 2xx response carrying `body`; any embedded `result.code` decides the status.
pub fn result_with(body: &str) -> ApiResult {
    ApiResult::normalize(200, body.to_string())
}

pub fn ok() -> ApiResult {
    result_with(r#"{"result":{"code":"200"}}"#)
}

pub fn failed(code: u16) -> ApiResult {
    result_with(&format!(r#"{{"result":{{"code":"{code}"}}}}"#))
}

/// Discards every progress event.
pub struct Silent;

impl ProgressSink for Silent {}
