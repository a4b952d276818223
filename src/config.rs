//! Client configuration: endpoints, graph selection, identity pattern,
//! optional credential grant.

use regex::Regex;

/// Client-credential grant settings for the token endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Space-separated scope list
    pub scopes: String,
    /// Full URL of the token endpoint
    pub token_url: String,
}

/// Connection settings for a Rexster-style graph server.
///
/// Defaults target a local TinkerGraph instance. Endpoint suffixes are
/// overridable for servers mounted under non-standard prefixes.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Name of the graph to address
    pub graph: String,
    /// Prefix under which graphs are mounted
    pub path_base: String,
    /// Suffix for the script endpoint, up to and including `?script=`
    pub script_ext: String,
    /// Suffix for the batch-transaction endpoint
    pub batch_ext: String,
    /// Suffix for the single-vertex creation endpoint
    pub vertex_ext: String,
    /// Identities matching this pattern are rendered as quoted string
    /// literals even when they look numeric (e.g. OrientDB `12:7` ids).
    pub id_regex: Option<Regex>,
    /// Credential grant used by the reauthenticate-and-retry policy.
    /// When absent, a failed request is surfaced without any auth call.
    pub credentials: Option<Credentials>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8182,
            graph: "tinkergraph".to_string(),
            path_base: "/graphs/".to_string(),
            script_ext: "/tp/gremlin?script=".to_string(),
            batch_ext: "/tp/batch/tx".to_string(),
            vertex_ext: "/vertices".to_string(),
            id_regex: None,
            credentials: None,
        }
    }
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = graph.into();
        self
    }

    pub fn with_path_base(mut self, path_base: impl Into<String>) -> Self {
        self.path_base = path_base.into();
        self
    }

    pub fn with_script_ext(mut self, script_ext: impl Into<String>) -> Self {
        self.script_ext = script_ext.into();
        self
    }

    pub fn with_batch_ext(mut self, batch_ext: impl Into<String>) -> Self {
        self.batch_ext = batch_ext.into();
        self
    }

    pub fn with_vertex_ext(mut self, vertex_ext: impl Into<String>) -> Self {
        self.vertex_ext = vertex_ext.into();
        self
    }

    pub fn with_id_regex(mut self, pattern: Regex) -> Self {
        self.id_regex = Some(pattern);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Whether a value matches the configured identity pattern.
    ///
    /// Always false when no pattern is configured.
    pub fn is_id_string(&self, value: &str) -> bool {
        self.id_regex
            .as_ref()
            .map(|re| re.is_match(value))
            .unwrap_or(false)
    }

    /// `http://<host>:<port><path_base><graph>` — the prefix shared by the
    /// script, vertex-create, and batch endpoints.
    pub fn graph_url(&self) -> String {
        format!(
            "http://{}:{}{}{}",
            self.host, self.port, self.path_base, self.graph
        )
    }
}
