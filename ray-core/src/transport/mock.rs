//! In-memory upstream doubles for tests and local runs
//!
//! Each double records what it was asked so tests can assert on call counts
//! (for example that an unauthorized request never reached the model).

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;

use super::{CompletionBackend, CompletionRequest, Mailer, OutgoingEmail, WebSearch};
use crate::errors::{RayError, Result};
use crate::types::SearchResult;

/// A scripted reply from the completion double
#[derive(Debug, Clone)]
pub enum Reply {
    /// A normal completion whose message content is this text
    Text(String),
    /// A raw upstream body
    Raw(Value),
    /// A non-2xx upstream answer
    Status(u16, String),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    fn into_result(self) -> Result<Value> {
        match self {
            Reply::Text(text) => Ok(completion_body(&text)),
            Reply::Raw(value) => Ok(value),
            Reply::Status(status, body) => Err(RayError::upstream("openai", status, &body)),
        }
    }
}

/// Wrap text in the completion response shape
pub fn completion_body(text: &str) -> Value {
    json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]
    })
}

type Responder = Box<dyn Fn(&CompletionRequest) -> Reply + Send + Sync>;

/// Completion double answering from a queue, then from a responder
pub struct ScriptedCompletion {
    queue: Mutex<VecDeque<Reply>>,
    responder: Responder,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    /// Answer with `replies` in order, then `"ok"` for every further call
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            queue: Mutex::new(replies.into_iter().collect()),
            responder: Box::new(|_| Reply::text("ok")),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call by inspecting the request
    pub fn with_responder(
        responder: impl Fn(&CompletionRequest) -> Reply + Send + Sync + 'static,
    ) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<Value> {
        let reply = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| (self.responder)(&request));
        self.requests.lock().push(request);
        reply.into_result()
    }
}

/// Search double returning a fixed result list
pub struct StaticSearch {
    results: Vec<SearchResult>,
    fail_with: Option<u16>,
    queries: Mutex<Vec<(String, u32)>>,
}

impl StaticSearch {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            fail_with: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Every search answers with this HTTP status
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::empty()
        }
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn queries(&self) -> Vec<(String, u32)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl WebSearch for StaticSearch {
    async fn search_raw(&self, query: &str, num: u32) -> Result<Value> {
        self.queries.lock().push((query.to_string(), num));
        if let Some(status) = self.fail_with {
            return Err(RayError::upstream("google-search", status, "search unavailable"));
        }

        let items: Vec<Value> = self
            .results
            .iter()
            .take(num as usize)
            .map(|r| json!({"title": r.title, "snippet": r.snippet, "link": r.link}))
            .collect();
        if items.is_empty() {
            Ok(json!({"searchInformation": {"totalResults": "0"}}))
        } else {
            Ok(json!({"items": items}))
        }
    }
}

/// Mailer double that records sent mail
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with a provider error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<String> {
        if self.fail {
            return Err(RayError::upstream("resend", 422, r#"{"message":"invalid recipient"}"#));
        }
        let mut sent = self.sent.lock();
        sent.push(email);
        Ok(format!("mock-email-{}", sent.len()))
    }
}

/// Shared handles to a full set of doubles
#[derive(Clone)]
pub struct MockUpstreams {
    pub completion: Arc<ScriptedCompletion>,
    pub search: Arc<StaticSearch>,
    pub mailer: Arc<RecordingMailer>,
}

impl MockUpstreams {
    pub fn new(completion: ScriptedCompletion, search: StaticSearch, mailer: RecordingMailer) -> Self {
        Self {
            completion: Arc::new(completion),
            search: Arc::new(search),
            mailer: Arc::new(mailer),
        }
    }
}
