//! In-memory fakes for the HTTP and deploy boundaries (testing only)
//!
//! Provides `ScriptedSender` and `RecordingDeployer`, which satisfy the
//! `HttpSender` and `DeployInvoker` contracts without any network or
//! process access.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::deploy::{DeployArgs, DeployInvoker};
use crate::error::{GctsError, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpSender};

// ---------------------------------------------------------------------------
// ScriptedSender
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Reply {
    Response(HttpResponse),
    TransportFailure(String),
}

/// Replays queued replies in order and records every request it receives.
///
/// Once the queue is empty every further request fails with a transport
/// error, so an unexpected extra call shows up as a failure.
#[derive(Debug, Default)]
pub struct ScriptedSender {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.push(HttpResponse::new(status, body))
    }

    /// Queue a prepared response.
    pub fn push(self, response: HttpResponse) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Response(response));
        self
    }

    /// Queue a transport-level failure.
    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::TransportFailure(message.to_string()));
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpSender for ScriptedSender {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::TransportFailure(message)) => Err(GctsError::Transport(message)),
            None => Err(GctsError::Transport(format!(
                "no scripted response left for {url}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingDeployer
// ---------------------------------------------------------------------------

/// Records deploy invocations; optionally reports failure.
#[derive(Debug, Default)]
pub struct RecordingDeployer {
    calls: Mutex<Vec<DeployArgs>>,
    failure: Option<String>,
}

impl RecordingDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A deployer whose every invocation fails with `message`.
    pub fn failing(message: &str) -> Self {
        RecordingDeployer {
            calls: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<DeployArgs> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeployInvoker for RecordingDeployer {
    async fn deploy(&self, args: &DeployArgs) -> Result<()> {
        self.calls.lock().unwrap().push(args.clone());
        match &self.failure {
            Some(message) => Err(GctsError::DeployFailed(message.clone())),
            None => Ok(()),
        }
    }
}
