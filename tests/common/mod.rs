//! In-memory gateway shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use payline::{
    Connector, Credentials, Document, PaylineClient, PaylineError, PaylineResult, Transport,
    TransportError,
};
use serde_json::json;

type Reply = Result<Document, TransportError>;

#[derive(Default)]
struct State {
    connects: AtomicUsize,
    failing_connects: AtomicUsize,
    connect_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<(String, Document)>>,
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
}

/// Scripted gateway. Clones share state, so a test keeps one handle and
/// gives another to the client.
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<State>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next call of `operation`.
    pub fn reply(&self, operation: &str, reply: Reply) -> &Self {
        self.state
            .replies
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue a response document carrying `code`, merged with `extra`.
    pub fn respond(&self, operation: &str, code: &str, extra: Document) -> &Self {
        let mut document = json!({ "result": { "code": code, "shortMessage": short_message(code) } });
        if let (Some(target), Document::Object(fields)) = (document.as_object_mut(), extra) {
            target.extend(fields);
        }
        self.reply(operation, Ok(document))
    }

    /// Queue an HTTP status failure for `operation`.
    pub fn fail(&self, operation: &str, status: u16) -> &Self {
        self.reply(
            operation,
            Err(TransportError::Status {
                status,
                body: String::new(),
            }),
        )
    }

    /// Make the next `count` handshakes fail.
    pub fn fail_connects(&self, count: usize) {
        self.state.failing_connects.store(count, Ordering::SeqCst);
    }

    pub fn delay_connect(&self, delay: Duration) {
        *self.state.connect_delay.lock().unwrap() = Some(delay);
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(String, Document)> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|(operation, _)| operation).collect()
    }

    /// Request document of the `index`-th call.
    pub fn request(&self, index: usize) -> Document {
        self.calls()[index].1.clone()
    }
}

fn short_message(code: &str) -> &'static str {
    if payline::result::is_success_code(code) {
        "ACCEPTED"
    } else {
        "REFUSED"
    }
}

/// Connection handed out by [`MockGateway`].
pub struct MockConnection {
    pub id: usize,
    gateway: MockGateway,
}

#[async_trait]
impl Connector for MockGateway {
    type Connection = MockConnection;

    async fn connect(&self, _credentials: &Credentials) -> PaylineResult<MockConnection> {
        let id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;

        let delay = *self.state.connect_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self.state.failing_connects.load(Ordering::SeqCst);
        if failing > 0 {
            self.state.failing_connects.store(failing - 1, Ordering::SeqCst);
            return Err(PaylineError::Connection("description unavailable".to_string()));
        }

        Ok(MockConnection {
            id,
            gateway: self.clone(),
        })
    }
}

#[async_trait]
impl Transport for MockConnection {
    async fn invoke(&self, operation: &str, document: Document) -> Result<Document, TransportError> {
        let state = &self.gateway.state;
        state
            .calls
            .lock()
            .unwrap()
            .push((operation.to_string(), document));

        state
            .replies
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(json!({ "result": { "code": "00000", "shortMessage": "ACCEPTED" } })))
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("merchant", "access-key", "1234567").unwrap()
}

/// Client over a fresh gateway, plus a handle on that gateway.
pub fn client() -> (PaylineClient<MockGateway>, MockGateway) {
    let gateway = MockGateway::new();
    (
        PaylineClient::with_connector(credentials(), gateway.clone()),
        gateway,
    )
}
