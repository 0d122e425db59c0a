//! Scripted transport double for controller tests.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;
use transport::{ErrorKind, Request, Transport, TransportError};

enum Step {
    Reply(transport::Result<Value>),
    Gated(oneshot::Receiver<transport::Result<Value>>),
}

/// Answers requests in issue order from a prepared script.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    sent: Mutex<Vec<Request>>,
}

/// Holds back a scripted response until released.
pub(crate) struct Gate(oneshot::Sender<transport::Result<Value>>);

impl Gate {
    pub(crate) fn release(self, outcome: transport::Result<Value>) {
        let _ = self.0.send(outcome);
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn reply(&self, body: Value) {
        self.push(Step::Reply(Ok(body)));
    }

    pub(crate) fn reply_err(&self, error: TransportError) {
        self.push(Step::Reply(Err(error)));
    }

    /// Queue a response that resolves only when the returned gate is released.
    pub(crate) fn gated(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.push(Step::Gated(rx));
        Gate(tx)
    }

    /// Requests received so far, in issue order.
    pub(crate) fn sent(&self) -> Vec<Request> {
        self.sent.lock().unwrap().clone()
    }

    fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> transport::Result<Value> {
        self.sent.lock().unwrap().push(request);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(outcome)) => outcome,
            Some(Step::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::network("gate dropped"))),
            None => Err(TransportError::network("no scripted response")),
        }
    }
}

pub(crate) fn client_error(status: u16, message: &str) -> TransportError {
    TransportError::new(ErrorKind::Client(status), message)
}

pub(crate) fn server_error(status: u16, message: &str) -> TransportError {
    TransportError::new(ErrorKind::Server(status), message)
}
