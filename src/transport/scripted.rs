//! Scripted transport
//!
//! In-memory transport replaying a queue of canned outcomes and recording
//! every request it receives. Used to test clients without a server.

use super::{Transport, TransportFailure};
use crate::models::{ApiResponse, HttpRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// One canned outcome
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Respond(ApiResponse),
    /// Waits out the attempt's timeout, then reports it
    Timeout,
    /// Non-timeout failure such as a refused connection
    Fail(String),
}

/// A request as seen by the transport
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub at: Instant,
    pub request: HttpRequest,
    pub timeout: Duration,
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: Option<ScriptedReply>,
    recorded: Mutex<Vec<RecordedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply
    pub fn then(self, reply: ScriptedReply) -> Self {
        lock(&self.replies).push_back(reply);
        self
    }

    pub fn respond(self, response: ApiResponse) -> Self {
        self.then(ScriptedReply::Respond(response))
    }

    pub fn time_out(self) -> Self {
        self.then(ScriptedReply::Timeout)
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.then(ScriptedReply::Fail(message.into()))
    }

    /// Reply used once the queue is exhausted
    pub fn always(mut self, reply: ScriptedReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Queue a reply on a shared transport
    pub fn push(&self, reply: ScriptedReply) {
        lock(&self.replies).push_back(reply);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.recorded).iter().map(|r| r.request.clone()).collect()
    }

    pub fn recorded(&self) -> Vec<RecordedRequest> {
        lock(&self.recorded).clone()
    }

    pub fn calls(&self) -> usize {
        lock(&self.recorded).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<ApiResponse, TransportFailure> {
        lock(&self.recorded).push(RecordedRequest {
            at: Instant::now(),
            request: request.clone(),
            timeout,
        });

        let reply = lock(&self.replies).pop_front().or_else(|| self.fallback.clone());

        match reply {
            Some(ScriptedReply::Respond(response)) => Ok(response),
            Some(ScriptedReply::Timeout) => {
                tokio::time::sleep(timeout).await;
                Err(TransportFailure::Timeout)
            }
            Some(ScriptedReply::Fail(message)) => Err(TransportFailure::Connection(message)),
            None => Err(TransportFailure::Connection(format!(
                "No scripted reply for {} {}",
                request.verb, request.url
            ))),
        }
    }
}
