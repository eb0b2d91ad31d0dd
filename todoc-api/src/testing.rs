use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use todoc_session::{MemoryStore, SessionStore};

use crate::gateway::Gateway;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

pub const TEST_BASE_URL: &str = "http://todoc.test";

enum Scripted {
    Respond(HttpResponse),
    Fail(String),
}

#[derive(Default)]
struct MockState {
    queue: VecDeque<Scripted>,
    fallback: Option<HttpResponse>,
    requests: Vec<HttpRequest>,
}

/// Transport that answers from a script instead of the network
///
/// Responses are served in the order they were queued. Once the queue is
/// empty the fallback response (if any) is returned, otherwise the call
/// fails like an unreachable host.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Queue a raw response
    pub fn respond(&self, status: u16, body: &str) -> &Self {
        let response = HttpResponse::new(status_code(status), body.as_bytes());
        self.with_state(|s| s.queue.push_back(Scripted::Respond(response)));
        self
    }

    pub fn respond_json(&self, status: u16, body: serde_json::Value) -> &Self {
        self.respond(status, &body.to_string())
    }

    /// Queue a transport failure (no response received)
    pub fn fail(&self, message: &str) -> &Self {
        let message = message.to_string();
        self.with_state(|s| s.queue.push_back(Scripted::Fail(message)));
        self
    }

    /// Response served whenever the queue is empty
    pub fn respond_always(&self, status: u16, body: &str) -> &Self {
        let response = HttpResponse::new(status_code(status), body.as_bytes());
        self.with_state(|s| s.fallback = Some(response));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.with_state(|s| s.requests.clone())
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.with_state(|s| s.requests.last().cloned())
    }

    pub fn request_count(&self) -> usize {
        self.with_state(|s| s.requests.len())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.with_state(|s| {
            s.requests.push(request);
            match s.queue.pop_front() {
                Some(Scripted::Respond(response)) => Ok(response),
                Some(Scripted::Fail(message)) => Err(TransportError::Other(message)),
                None => s
                    .fallback
                    .clone()
                    .ok_or_else(|| TransportError::Other("connection refused".into())),
            }
        })
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A gateway over an in-memory session and a scripted transport
pub struct TestGateway {
    pub gateway: Gateway,
    pub session: Arc<SessionStore>,
    pub storage: MemoryStore,
    pub transport: MockTransport,
}

impl TestGateway {
    pub fn new() -> Self {
        let storage = MemoryStore::new();
        let session = Arc::new(SessionStore::new(Arc::new(storage.clone())));
        let transport = MockTransport::new();
        let gateway = Gateway::with_transport(
            TEST_BASE_URL,
            session.clone(),
            Arc::new(transport.clone()),
        );

        Self {
            gateway,
            session,
            storage,
            transport,
        }
    }

    pub fn silent_refresh(mut self, enabled: bool) -> Self {
        self.gateway = self.gateway.silent_refresh(enabled);
        self
    }
}

impl Default for TestGateway {
    fn default() -> Self {
        Self::new()
    }
}
