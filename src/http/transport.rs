//! Transports: the blocking `ureq` agent used in production and a scripted
//! in-memory transport for tests and offline rendering.
use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use super::PreparedRequest;

/// Status line and body of a response, whatever the status code.
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Box<dyn Read + Send>,
}

impl RawResponse {
    /// In-memory response, mostly for tests.
    pub fn new(status: u16, status_text: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            body: Box::new(Cursor::new(body.into())),
        }
    }
}

/// Performs one HTTP round trip.
///
/// A non-2xx status is still `Ok`; only network failures (refused
/// connection, DNS, timeout) are errors.
pub trait Transport: Send + Sync {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse> {
        (**self).send(request)
    }
}

// ---------------------------------------------------------------------------
// ureq
// ---------------------------------------------------------------------------

/// Blocking transport over a shared `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse> {
        // "localhost" may resolve to ::1 first while local backends bind IPv4.
        let url = request.url.replace("://localhost", "://127.0.0.1");

        let mut req = self.agent.request(request.method.as_str(), &url);
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }
        for (name, value) in &request.headers {
            req = req.set(name, value);
        }

        let result = match &request.body {
            Some(bytes) => req.send_bytes(bytes),
            None => req.call(),
        };

        let response = match result {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(t)) => anyhow::bail!("{t}"),
        };

        Ok(RawResponse {
            status: response.status(),
            status_text: response.status_text().to_string(),
            body: response.into_reader(),
        })
    }
}

// ---------------------------------------------------------------------------
// Scripted
// ---------------------------------------------------------------------------

/// One canned reply of a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Response {
        status: u16,
        status_text: String,
        body: Vec<u8>,
    },
    NetworkError(String),
}

impl ScriptedReply {
    pub fn ok(body: &str) -> Self {
        Self::status(200, "OK", body)
    }

    pub fn status(status: u16, status_text: &str, body: &str) -> Self {
        Self::Response {
            status,
            status_text: status_text.to_string(),
            body: body.as_bytes().to_vec(),
        }
    }
}

/// Replays queued replies in order and records every request it sees.
///
/// Replies can be bound to a path prefix; unbound replies serve any request.
/// With nothing left to serve, requests fail as network errors.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<(Option<String>, ScriptedReply)>>,
    seen: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next request.
    pub fn push(&self, reply: ScriptedReply) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back((None, reply));
        }
        self
    }

    /// Queue a reply for the next request whose URL path starts with `path`.
    pub fn push_for(&self, path: &str, reply: ScriptedReply) -> &Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back((Some(path.to_string()), reply));
        }
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

fn url_path(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }

        let path = url_path(&request.url);
        let reply = {
            let mut replies = self
                .replies
                .lock()
                .map_err(|_| anyhow::anyhow!("scripted transport poisoned"))?;
            let index = replies.iter().position(|(prefix, _)| match prefix {
                Some(prefix) => path.starts_with(prefix.as_str()),
                None => true,
            });
            index.and_then(|i| replies.remove(i)).map(|(_, reply)| reply)
        };

        match reply {
            Some(ScriptedReply::Response {
                status,
                status_text,
                body,
            }) => Ok(RawResponse::new(status, &status_text, body)),
            Some(ScriptedReply::NetworkError(message)) => anyhow::bail!("{message}"),
            None => anyhow::bail!("connection refused: no scripted reply for {path}"),
        }
    }
}
