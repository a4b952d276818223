//! The HTTP execution seam.
//!
//! `HttpExec` abstracts over how the server is reached so the retry and
//! transaction layers don't depend on a live socket. Two implementations:
//! - [`ReqwestExec`]: real HTTP (production)
//! - [`MockHttp`]: records calls and replays preconfigured replies (testing)

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use super::{TransportError, TransportResult};

/// Raw reply from the wire: status plus unparsed body.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Minimal HTTP surface the client needs.
#[async_trait]
pub trait HttpExec: Send + Sync {
    /// GET with optional `Authorization` header.
    async fn get(&self, url: &str, auth: Option<&str>) -> TransportResult<HttpReply>;

    /// POST a JSON body with optional `Authorization` header.
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        auth: Option<&str>,
    ) -> TransportResult<HttpReply>;

    /// POST a form-urlencoded body (the credential exchange).
    async fn post_form(&self, url: &str, body: &str) -> TransportResult<HttpReply>;
}

/// Production executor over a shared `reqwest` client.
#[derive(Debug, Default)]
pub struct ReqwestExec {
    client: reqwest::Client,
}

impl ReqwestExec {
    pub fn new() -> Self {
        Self::default()
    }

    async fn reply(response: reqwest::Response) -> TransportResult<HttpReply> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

#[async_trait]
impl HttpExec for ReqwestExec {
    async fn get(&self, url: &str, auth: Option<&str>) -> TransportResult<HttpReply> {
        let mut req = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(token) = auth {
            req = req.header(AUTHORIZATION, token);
        }
        Self::reply(req.send().await?).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        auth: Option<&str>,
    ) -> TransportResult<HttpReply> {
        let mut req = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body);
        if let Some(token) = auth {
            req = req.header(AUTHORIZATION, token);
        }
        Self::reply(req.send().await?).await
    }

    async fn post_form(&self, url: &str, body: &str) -> TransportResult<HttpReply> {
        let req = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.to_string());
        Self::reply(req.send().await?).await
    }
}

/// One observed call against a [`MockHttp`].
#[derive(Debug, Clone)]
pub struct MockCall {
    /// "GET", "POST", or "FORM"
    pub method: &'static str,
    pub url: String,
    /// JSON body for POSTs, form body text for FORMs
    pub body: Option<Value>,
    pub auth: Option<String>,
}

/// Recording executor that replays preconfigured replies.
///
/// Replies are keyed by a URL substring and consumed front-to-back, so a
/// pattern can carry a different reply for each successive call (e.g.
/// first vertex creation succeeds, second fails).
#[derive(Debug, Default)]
pub struct MockHttp {
    rules: Mutex<Vec<(String, VecDeque<TransportResult<HttpReply>>)>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for URLs containing `pattern`.
    pub fn with_reply(self, pattern: &str, status: u16, body: &str) -> Self {
        self.push(
            pattern,
            Ok(HttpReply {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    /// Queue a connection-level failure for URLs containing `pattern`.
    pub fn with_failure(self, pattern: &str, message: &str) -> Self {
        self.push(pattern, Err(TransportError::Connection(message.to_string())));
        self
    }

    fn push(&self, pattern: &str, reply: TransportResult<HttpReply>) {
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((_, queue)) = rules.iter_mut().find(|(p, _)| p == pattern) {
            queue.push_back(reply);
        } else {
            rules.push((pattern.to_string(), VecDeque::from([reply])));
        }
    }

    /// Every call observed so far, in arrival order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Observed calls whose URL contains `pattern`.
    pub fn calls_to(&self, pattern: &str) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.url.contains(pattern))
            .collect()
    }

    fn respond(&self, call: MockCall) -> TransportResult<HttpReply> {
        let url = call.url.clone();
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        for (pattern, queue) in rules.iter_mut() {
            if url.contains(pattern.as_str()) {
                if let Some(reply) = queue.pop_front() {
                    return reply;
                }
            }
        }
        Err(TransportError::Connection(format!(
            "no mock reply queued for {}",
            url
        )))
    }
}

#[async_trait]
impl HttpExec for MockHttp {
    async fn get(&self, url: &str, auth: Option<&str>) -> TransportResult<HttpReply> {
        self.respond(MockCall {
            method: "GET",
            url: url.to_string(),
            body: None,
            auth: auth.map(str::to_string),
        })
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        auth: Option<&str>,
    ) -> TransportResult<HttpReply> {
        self.respond(MockCall {
            method: "POST",
            url: url.to_string(),
            body: Some(body.clone()),
            auth: auth.map(str::to_string),
        })
    }

    async fn post_form(&self, url: &str, body: &str) -> TransportResult<HttpReply> {
        self.respond(MockCall {
            method: "FORM",
            url: url.to_string(),
            body: Some(Value::String(body.to_string())),
            auth: None,
        })
    }
}
