//! HTTP transport with the single reauthenticate-and-retry policy.
//!
//! [`Transport`] owns the execution seam, the endpoint configuration,
//! and the cached bearer token. Every operation follows the same shape:
//! issue the call, and on a non-success status refresh the token through
//! the credential grant and retry exactly once. Nothing else is ever
//! retried.

mod auth;
mod exec;

use std::sync::{Arc, RwLock};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::config::GraphConfig;

pub use exec::{HttpExec, HttpReply, MockCall, MockHttp, ReqwestExec};

/// Errors from transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Non-success status after the retry policy ran its course
    #[error("http error {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// Reply parsed but is missing a field the protocol requires
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The reauthentication exchange failed; carries the error that
    /// triggered the refresh
    #[error("reauthentication failed: {cause} (original error: {original})")]
    Auth {
        original: Box<TransportError>,
        cause: Box<TransportError>,
    },

    /// A write reply came back HTTP 200 but carried an explicit
    /// `success: false`
    #[error("server rejected request")]
    Rejected(Value),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Bookkeeping fields the server adds to every reply.
const BOOKKEEPING_FIELDS: [&str; 3] = ["version", "queryTime", "txProcessed"];

enum Call<'a> {
    Get(String),
    Post(String, &'a Value),
}

/// Transport to one graph endpoint family, with token caching.
pub struct Transport {
    config: Arc<GraphConfig>,
    exec: Arc<dyn HttpExec>,
    /// Cached bearer header value. Refreshed lazily on the first
    /// non-success status, never preemptively. Concurrent refreshes may
    /// race; the outcome is idempotent so the waste is tolerated.
    token: RwLock<Option<String>>,
}

impl Transport {
    pub fn new(config: Arc<GraphConfig>, exec: Arc<dyn HttpExec>) -> Self {
        Self {
            config,
            exec,
            token: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &Arc<GraphConfig> {
        &self.config
    }

    /// Read path: submit a traversal script and return the parsed reply
    /// with bookkeeping fields stripped.
    pub async fn read(&self, script: &str) -> TransportResult<Value> {
        let encoded: String = form_urlencoded::byte_serialize(script.as_bytes()).collect();
        let url = format!(
            "{}{}{}",
            self.config.graph_url(),
            self.config.script_ext,
            encoded
        );
        debug!(script, "submitting traversal");
        self.send(Call::Get(url)).await
    }

    /// Write path: create a single vertex from a raw document.
    pub async fn create_vertex(&self, doc: &Value) -> TransportResult<Value> {
        let url = format!("{}{}", self.config.graph_url(), self.config.vertex_ext);
        self.send(Call::Post(url, doc)).await
    }

    /// Write path: submit a staged-operation list as one batch commit.
    pub async fn batch(&self, payload: &Value) -> TransportResult<Value> {
        let url = format!("{}{}", self.config.graph_url(), self.config.batch_ext);
        debug!(ops = payload["tx"].as_array().map(Vec::len).unwrap_or(0), "submitting batch");
        self.send(Call::Post(url, payload)).await
    }

    async fn perform(&self, call: &Call<'_>) -> TransportResult<HttpReply> {
        let token = self
            .token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match call {
            Call::Get(url) => self.exec.get(url, token.as_deref()).await,
            Call::Post(url, body) => self.exec.post_json(url, body, token.as_deref()).await,
        }
    }

    async fn send(&self, call: Call<'_>) -> TransportResult<Value> {
        // only write replies carry a meaningful success flag; read
        // replies pass through whatever the server returned
        let reject_failure = matches!(call, Call::Post(..));
        let reply = self.perform(&call).await?;
        if reply.status == 200 {
            return parse(reply, reject_failure);
        }
        self.reauthenticate(TransportError::Status(reply.status))
            .await?;
        let reply = self.perform(&call).await?;
        if reply.status == 200 {
            parse(reply, reject_failure)
        } else {
            Err(TransportError::Status(reply.status))
        }
    }

    /// Refresh the cached token through the credential grant. With no
    /// credentials configured this signals the original error untouched.
    async fn reauthenticate(&self, original: TransportError) -> TransportResult<()> {
        let Some(credentials) = &self.config.credentials else {
            return Err(original);
        };
        match auth::refresh(self.exec.as_ref(), credentials).await {
            Ok(header) => {
                *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(header);
                Ok(())
            }
            Err(cause) => {
                // A transport-level failure of the exchange invalidates
                // whatever token we were holding.
                if !matches!(cause, TransportError::Status(_)) {
                    *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
                }
                warn!(%cause, "token refresh failed");
                Err(TransportError::Auth {
                    original: Box::new(original),
                    cause: Box::new(cause),
                })
            }
        }
    }
}

/// Parse a 200 reply: strip server bookkeeping, and on write replies
/// reject an explicit `success:false` payload.
fn parse(reply: HttpReply, reject_failure: bool) -> TransportResult<Value> {
    let mut value: Value = serde_json::from_str(&reply.body)?;
    if let Some(map) = value.as_object_mut() {
        if reject_failure && map.get("success") == Some(&Value::Bool(false)) {
            return Err(TransportError::Rejected(value));
        }
        for field in BOOKKEEPING_FIELDS {
            map.remove(field);
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    fn transport(mock: Arc<MockHttp>, credentials: Option<Credentials>) -> Transport {
        let mut config = GraphConfig::default();
        config.credentials = credentials;
        Transport::new(Arc::new(config), mock)
    }

    fn credentials() -> Credentials {
        Credentials {
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            scopes: "graph.read".to_string(),
            token_url: "http://auth.local/token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_read_strips_bookkeeping() {
        let mock = Arc::new(MockHttp::new().with_reply(
            "/tp/gremlin",
            200,
            r#"{"results":[{"name":"marko"}],"version":"2.4","queryTime":3.2}"#,
        ));
        let t = transport(mock.clone(), None);
        let reply = t.read("g.v(1)").await.unwrap();
        assert_eq!(reply["results"][0]["name"], "marko");
        assert!(reply.get("version").is_none());
        assert!(reply.get("queryTime").is_none());
    }

    #[tokio::test]
    async fn test_read_url_encodes_script() {
        let mock = Arc::new(MockHttp::new().with_reply("/tp/gremlin", 200, r#"{"results":[]}"#));
        let t = transport(mock.clone(), None);
        t.read("g.v(1).out('knows')").await.unwrap();
        let call = &mock.calls()[0];
        assert!(call.url.contains("script=g.v%281%29.out%28%27knows%27%29"));
    }

    #[tokio::test]
    async fn test_failure_without_credentials_makes_no_auth_call() {
        let mock = Arc::new(MockHttp::new().with_reply("/tp/gremlin", 500, ""));
        let t = transport(mock.clone(), None);
        let err = t.read("g.V()").await.unwrap_err();
        assert!(matches!(err, TransportError::Status(500)));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_once_after_refresh() {
        let mock = Arc::new(
            MockHttp::new()
                .with_reply("/tp/gremlin", 401, "")
                .with_reply("/tp/gremlin", 200, r#"{"results":[]}"#)
                .with_reply(
                    "/token",
                    200,
                    r#"{"token_type":"Bearer","access_token":"abc123"}"#,
                ),
        );
        let t = transport(mock.clone(), Some(credentials()));
        t.read("g.V()").await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].method, "GET");
        assert_eq!(calls[1].method, "FORM");
        assert_eq!(calls[2].method, "GET");
        assert_eq!(calls[2].auth.as_deref(), Some("Bearer abc123"));
        let form = calls[1].body.as_ref().unwrap().as_str().unwrap().to_string();
        assert!(form.contains("grant_type=client_credentials"));
        assert!(form.contains("client_id=cid"));
        assert!(form.contains("scope=graph.read"));
    }

    #[tokio::test]
    async fn test_second_failure_surfaced_without_another_retry() {
        let mock = Arc::new(
            MockHttp::new()
                .with_reply("/tp/gremlin", 401, "")
                .with_reply("/tp/gremlin", 403, "")
                .with_reply(
                    "/token",
                    200,
                    r#"{"token_type":"Bearer","access_token":"abc123"}"#,
                ),
        );
        let t = transport(mock.clone(), Some(credentials()));
        let err = t.read("g.V()").await.unwrap_err();
        assert!(matches!(err, TransportError::Status(403)));
        assert_eq!(mock.calls_to("/tp/gremlin").len(), 2);
        assert_eq!(mock.calls_to("/token").len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_wraps_original_error() {
        let mock = Arc::new(
            MockHttp::new()
                .with_reply("/tp/gremlin", 401, "")
                .with_reply("/token", 400, ""),
        );
        let t = transport(mock.clone(), Some(credentials()));
        let err = t.read("g.V()").await.unwrap_err();
        match err {
            TransportError::Auth { original, cause } => {
                assert!(matches!(*original, TransportError::Status(401)));
                assert!(matches!(*cause, TransportError::Status(400)));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
        // no retry of the graph request after a failed refresh
        assert_eq!(mock.calls_to("/tp/gremlin").len(), 1);
    }

    #[tokio::test]
    async fn test_read_passes_success_false_through() {
        let mock = Arc::new(MockHttp::new().with_reply(
            "/tp/gremlin",
            200,
            r#"{"results":[],"success":false,"version":"2.4"}"#,
        ));
        let t = transport(mock.clone(), None);
        let reply = t.read("g.v(1)").await.unwrap();
        assert_eq!(reply["success"], false);
        assert!(reply.get("version").is_none());
    }

    #[tokio::test]
    async fn test_success_false_is_rejected_even_on_200() {
        let mock = Arc::new(MockHttp::new().with_reply(
            "/tp/batch",
            200,
            r#"{"success":false,"message":"constraint violation"}"#,
        ));
        let t = transport(mock.clone(), None);
        let err = t
            .batch(&serde_json::json!({"tx": []}))
            .await
            .unwrap_err();
        match err {
            TransportError::Rejected(payload) => {
                assert_eq!(payload["message"], "constraint violation");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_batch_strips_tx_processed() {
        let mock = Arc::new(MockHttp::new().with_reply(
            "/tp/batch",
            200,
            r#"{"success":true,"txProcessed":4,"version":"2.4"}"#,
        ));
        let t = transport(mock.clone(), None);
        let reply = t.batch(&serde_json::json!({"tx": []})).await.unwrap();
        assert!(reply.get("txProcessed").is_none());
        assert!(reply.get("version").is_none());
        assert_eq!(reply["success"], true);
    }
}
