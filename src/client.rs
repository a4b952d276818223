//! Consumer-facing entry point.
//!
//! `GraphClient` hands out root-anchored [`Traversal`]s, executes them
//! over the transport, and opens transactions. It is cheap to clone;
//! clones share the transport and its cached token.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::GraphConfig;
use crate::script::{Arg, Args, Traversal};
use crate::transport::{HttpExec, ReqwestExec, Transport, TransportResult};
use crate::tx::Transaction;

/// Reply to a read request: the `results` rows plus whatever else the
/// server sent (bookkeeping fields already stripped in the transport).
#[derive(Debug, Clone, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Client for one graph on one server.
#[derive(Clone)]
pub struct GraphClient {
    config: Arc<GraphConfig>,
    transport: Arc<Transport>,
}

impl GraphClient {
    /// Connect over real HTTP.
    pub fn new(config: GraphConfig) -> Self {
        Self::with_exec(config, Arc::new(ReqwestExec::new()))
    }

    /// Connect over a caller-supplied executor (tests, instrumentation).
    pub fn with_exec(config: GraphConfig, exec: Arc<dyn HttpExec>) -> Self {
        let config = Arc::new(config);
        let transport = Arc::new(Transport::new(config.clone(), exec));
        Self { config, transport }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn root(&self) -> Traversal {
        Traversal::root(self.config.clone())
    }

    fn anchor(&self, name: &str, args: impl Into<Args>) -> Traversal {
        self.root().step(name, args.into())
    }

    // --- Traversal anchors ---

    /// `g.v(id,...)` — vertex lookup by identity.
    pub fn v(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("v", args)
    }

    /// `g.e(id,...)` — edge lookup by identity.
    pub fn e(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("e", args)
    }

    /// `g.V(...)` — all vertices.
    pub fn vertices(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("V", args)
    }

    /// `g.E(...)` — all edges.
    pub fn edges(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("E", args)
    }

    /// `g._(...)` — the anonymous pipe, used to build sub-traversals for
    /// the pipe combinators (`and_`, `or_`, ...).
    pub fn pipe(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("_", args)
    }

    /// `g.idx(name)[[key:value]]` — index lookup.
    pub fn idx(&self, name: impl Into<Arg>, spec: Option<&Value>) -> Traversal {
        self.root().index_lookup(name.into(), spec)
    }

    // --- Graph management ---

    pub fn create_index(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("createIndex", args)
    }

    pub fn create_key_index(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("createKeyIndex", args)
    }

    pub fn get_indices(&self) -> Traversal {
        self.anchor("getIndices", ())
    }

    pub fn get_indexed_keys(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("getIndexedKeys", args)
    }

    pub fn get_index(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("getIndex", args)
    }

    pub fn drop_index(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("dropIndex", args)
    }

    pub fn drop_key_index(&self, args: impl Into<Args>) -> Traversal {
        self.anchor("dropKeyIndex", args)
    }

    pub fn clear(&self) -> Traversal {
        self.anchor("clear", ())
    }

    pub fn shutdown(&self) -> Traversal {
        self.anchor("shutdown", ())
    }

    pub fn get_features(&self) -> Traversal {
        self.anchor("getFeatures", ())
    }

    // --- Execution ---

    /// Submit a traversal over the read path.
    pub async fn execute(&self, traversal: &Traversal) -> TransportResult<ResultSet> {
        let reply = self.transport.read(traversal.script()).await?;
        Ok(serde_json::from_value(reply)?)
    }

    /// Open a transaction against this client's transport.
    pub fn begin(&self) -> Transaction {
        Transaction::new(self.transport.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockHttp;
    use serde_json::json;

    fn client(mock: Arc<MockHttp>) -> GraphClient {
        GraphClient::with_exec(GraphConfig::default(), mock)
    }

    #[test]
    fn test_anchor_scripts() {
        let c = client(Arc::new(MockHttp::new()));
        assert_eq!(c.v(1).script(), "g.v(1)");
        assert_eq!(c.e((1, 2)).script(), "g.e(1,2)");
        assert_eq!(c.vertices(()).script(), "g.V()");
        assert_eq!(c.edges(()).script(), "g.E()");
        assert_eq!(c.pipe(()).script(), "g._()");
        assert_eq!(
            c.create_key_index(("name", "Vertex.class")).script(),
            "g.createKeyIndex('name',Vertex.class)"
        );
        assert_eq!(c.get_features().script(), "g.getFeatures()");
    }

    #[test]
    fn test_idx_anchor() {
        let c = client(Arc::new(MockHttp::new()));
        assert_eq!(
            c.idx("edges", Some(&json!({"label": "knows"}))).script(),
            "g.idx('edges')[[label:'knows']]"
        );
    }

    #[test]
    fn test_readme_style_chain() {
        let c = client(Arc::new(MockHttp::new()));
        let q = c.v(1).out_e(()).or_((
            c.pipe(()).has(("id", "T.eq", 9)),
            c.pipe(()).has(("weight", "T.lt", "0.6")),
        ));
        assert_eq!(
            q.script(),
            "g.v(1).outE().or(g._().has('id',T.eq,9),g._().has('weight',T.lt,0.6))"
        );
    }

    #[tokio::test]
    async fn test_execute_returns_result_set() {
        let mock = Arc::new(MockHttp::new().with_reply(
            "/tp/gremlin",
            200,
            r#"{"results":[{"name":"marko"},{"name":"josh"}],"version":"2.4"}"#,
        ));
        let c = client(mock);
        let rows = c.execute(&c.v(1).out("knows")).await.unwrap();
        assert_eq!(rows.results.len(), 2);
        assert_eq!(rows.results[0]["name"], "marko");
        assert!(rows.extra.get("version").is_none());
    }
}
