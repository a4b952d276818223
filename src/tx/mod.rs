//! Transactional batch staging and the two-phase commit protocol.
//!
//! Operations stage locally into an ordered list; brand-new vertices
//! stage into a separate pending list because the server must assign
//! their identities before any dependent edge can be submitted. `commit`
//! creates pending vertices first (concurrently), rewrites edge
//! endpoints through the resolution table, then submits everything else
//! as a single batch. A creation failure rolls the whole transaction
//! back by deleting whatever vertices did get created.


use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::codec::encode_document;
use crate::transport::{Transport, TransportError};

/// Errors from staging and commit.
#[derive(Debug, Error)]
pub enum TxError {
    /// A creation step failed and every already-created vertex was
    /// deleted again
    #[error("could not complete transaction, transaction has been rolled back")]
    RolledBack {
        #[source]
        cause: Box<TransportError>,
    },

    /// Rollback itself failed; the listed vertex identities exist on the
    /// server and need manual cleanup
    #[error("transaction rolled back, but newly created vertices could not be removed; manual cleanup required")]
    RollbackIncomplete {
        orphaned: Vec<Value>,
        #[source]
        cause: Box<TransportError>,
    },

    /// An edge endpoint references a pending vertex from a transaction
    /// that has already committed or rolled back
    #[error("edge endpoint references a vertex from a cleared transaction")]
    UnresolvedEndpoint,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type TxResult<T> = Result<T, TxError>;

/// Placeholder key for a staged vertex whose server identity is not yet
/// known. Resolved through the commit-time indirection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexRef(usize);

/// An edge endpoint: either a known identity or a pending new vertex.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    Id(Value),
    Pending(VertexRef),
}

impl From<VertexRef> for Endpoint {
    fn from(v: VertexRef) -> Self {
        Endpoint::Pending(v)
    }
}

impl From<i32> for Endpoint {
    fn from(v: i32) -> Self {
        Endpoint::Id(Value::from(v))
    }
}

impl From<i64> for Endpoint {
    fn from(v: i64) -> Self {
        Endpoint::Id(Value::from(v))
    }
}

impl From<&str> for Endpoint {
    fn from(v: &str) -> Self {
        Endpoint::Id(Value::from(v))
    }
}

impl From<String> for Endpoint {
    fn from(v: String) -> Self {
        Endpoint::Id(Value::from(v))
    }
}

impl From<Value> for Endpoint {
    fn from(v: Value) -> Self {
        Endpoint::Id(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Vertex,
    Edge,
}

impl EntityKind {
    fn wire(self) -> &'static str {
        match self {
            EntityKind::Vertex => "vertex",
            EntityKind::Edge => "edge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    fn wire(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// One pending create/update/delete awaiting batch submission.
#[derive(Debug, Clone)]
pub struct StagedOp {
    entity: EntityKind,
    action: Action,
    id: Option<Value>,
    out_v: Option<Endpoint>,
    in_v: Option<Endpoint>,
    label: Option<String>,
    /// Flat property fields of the wire record. Update documents have
    /// passed through the typed-literal codec before landing here.
    properties: Map<String, Value>,
    removed_keys: Option<Vec<String>>,
}

impl StagedOp {
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Swap pending endpoints for their server-assigned identities.
    fn resolve_endpoints(&mut self, table: &[Option<Value>]) -> TxResult<()> {
        for slot in [&mut self.out_v, &mut self.in_v] {
            if let Some(Endpoint::Pending(VertexRef(i))) = slot {
                let id = table
                    .get(*i)
                    .and_then(|entry| entry.clone())
                    .ok_or(TxError::UnresolvedEndpoint)?;
                *slot = Some(Endpoint::Id(id));
            }
        }
        Ok(())
    }

    fn wire(&self) -> TxResult<Value> {
        let mut record = self.properties.clone();
        record.insert("_type".to_string(), self.entity.wire().into());
        record.insert("_action".to_string(), self.action.wire().into());
        if let Some(id) = &self.id {
            record.insert("_id".to_string(), id.clone());
        }
        if let Some(label) = &self.label {
            record.insert("_label".to_string(), label.as_str().into());
        }
        for (key, endpoint) in [("_outV", &self.out_v), ("_inV", &self.in_v)] {
            match endpoint {
                Some(Endpoint::Id(id)) => {
                    record.insert(key.to_string(), id.clone());
                }
                Some(Endpoint::Pending(_)) => return Err(TxError::UnresolvedEndpoint),
                None => {}
            }
        }
        if let Some(keys) = &self.removed_keys {
            record.insert("_keys".to_string(), keys.clone().into());
        }
        Ok(Value::Object(record))
    }
}

/// A vertex staged for creation; its identity arrives with the reply.
#[derive(Debug, Clone)]
struct PendingVertex {
    props: Value,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// Created vertex documents with their server-assigned `_id`, in
    /// staging order
    pub new_vertices: Vec<Value>,
    /// Server reply to the batch request, bookkeeping stripped; `None`
    /// when no batch was needed
    pub batch: Option<Value>,
}

/// One client-side transaction: staged operations plus pending vertex
/// creations. Single-owner; commit drains it, win or lose.
pub struct Transaction {
    transport: Arc<Transport>,
    ops: Vec<StagedOp>,
    pending: Vec<PendingVertex>,
}

impl Transaction {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self {
            transport,
            ops: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn props_of(doc: Option<Value>) -> Map<String, Value> {
        match doc {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Stage a brand-new vertex. The returned [`VertexRef`] can be used
    /// as an edge endpoint before the identity exists.
    pub fn add_vertex(&mut self, doc: Value) -> VertexRef {
        self.pending.push(PendingVertex { props: doc });
        VertexRef(self.pending.len() - 1)
    }

    /// Stage an anonymous new vertex with no properties.
    pub fn add_vertex_empty(&mut self) -> VertexRef {
        self.add_vertex(json!({}))
    }

    /// Stage a create record for a vertex whose identity is already
    /// known (the server upserts it).
    pub fn add_vertex_with_id(&mut self, id: impl Into<Value>, doc: Option<Value>) {
        self.ops.push(StagedOp {
            entity: EntityKind::Vertex,
            action: Action::Create,
            id: Some(id.into()),
            out_v: None,
            in_v: None,
            label: None,
            properties: Self::props_of(doc),
            removed_keys: None,
        });
    }

    /// Stage an edge creation. Endpoints may be scalar identities or
    /// [`VertexRef`]s for vertices created in this same transaction.
    pub fn add_edge(
        &mut self,
        out_v: impl Into<Endpoint>,
        in_v: impl Into<Endpoint>,
        label: impl Into<String>,
        doc: Option<Value>,
    ) {
        self.stage_edge(None, out_v.into(), in_v.into(), label.into(), doc);
    }

    /// Stage an edge creation with an explicit edge identity.
    pub fn add_edge_with_id(
        &mut self,
        id: impl Into<Value>,
        out_v: impl Into<Endpoint>,
        in_v: impl Into<Endpoint>,
        label: impl Into<String>,
        doc: Option<Value>,
    ) {
        self.stage_edge(Some(id.into()), out_v.into(), in_v.into(), label.into(), doc);
    }

    fn stage_edge(
        &mut self,
        id: Option<Value>,
        out_v: Endpoint,
        in_v: Endpoint,
        label: String,
        doc: Option<Value>,
    ) {
        self.ops.push(StagedOp {
            entity: EntityKind::Edge,
            action: Action::Create,
            id,
            out_v: Some(out_v),
            in_v: Some(in_v),
            label: Some(label),
            properties: Self::props_of(doc),
            removed_keys: None,
        });
    }

    /// Stage a vertex deletion, optionally of individual property keys.
    pub fn remove_vertex(&mut self, id: impl Into<Value>, keys: Option<Vec<String>>) {
        self.stage_delete(EntityKind::Vertex, id.into(), keys);
    }

    /// Stage an edge deletion, optionally of individual property keys.
    pub fn remove_edge(&mut self, id: impl Into<Value>, keys: Option<Vec<String>>) {
        self.stage_delete(EntityKind::Edge, id.into(), keys);
    }

    fn stage_delete(&mut self, entity: EntityKind, id: Value, keys: Option<Vec<String>>) {
        self.ops.push(StagedOp {
            entity,
            action: Action::Delete,
            id: Some(id),
            out_v: None,
            in_v: None,
            label: None,
            properties: Map::new(),
            removed_keys: keys,
        });
    }

    /// Stage a vertex property update; the document goes through the
    /// typed-literal codec here, at staging time.
    pub fn update_vertex(&mut self, id: impl Into<Value>, doc: Value) {
        self.stage_update(EntityKind::Vertex, id.into(), doc);
    }

    /// Stage an edge property update (typed-literal encoded).
    pub fn update_edge(&mut self, id: impl Into<Value>, doc: Value) {
        self.stage_update(EntityKind::Edge, id.into(), doc);
    }

    fn stage_update(&mut self, entity: EntityKind, id: Value, doc: Value) {
        self.ops.push(StagedOp {
            entity,
            action: Action::Update,
            id: Some(id),
            out_v: None,
            in_v: None,
            label: None,
            properties: Self::props_of(Some(encode_document(&doc))),
            removed_keys: None,
        });
    }

    /// Number of generically staged operations (pending new vertices are
    /// tracked separately).
    pub fn staged_len(&self) -> usize {
        self.ops.len()
    }

    /// Number of pending new-vertex creations.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Run the two-phase commit. Whatever the outcome, the staged lists
    /// are empty afterwards; a failed commit means the transaction must
    /// be rebuilt from scratch.
    pub async fn commit(&mut self) -> TxResult<CommitReceipt> {
        let mut ops = std::mem::take(&mut self.ops);
        let pending = std::mem::take(&mut self.pending);

        if pending.is_empty() {
            let table: Vec<Option<Value>> = Vec::new();
            for op in &mut ops {
                op.resolve_endpoints(&table)?;
            }
            let batch = self.submit_batch(&ops).await?;
            return Ok(CommitReceipt {
                new_vertices: Vec::new(),
                batch: Some(batch),
            });
        }

        // Phase one: create every pending vertex, concurrently.
        let creations = pending
            .iter()
            .map(|vertex| self.transport.create_vertex(&vertex.props));
        let results = join_all(creations).await;

        let mut table: Vec<Option<Value>> = vec![None; pending.len()];
        let mut failure: Option<TransportError> = None;
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(reply) => match reply.pointer("/results/_id") {
                    Some(id) => table[i] = Some(id.clone()),
                    None => {
                        failure.get_or_insert(TransportError::Protocol(
                            "vertex creation reply missing results._id".to_string(),
                        ));
                    }
                },
                Err(e) => {
                    failure = failure.or(Some(e));
                }
            }
        }

        if let Some(cause) = failure {
            return Err(self.rollback(&table, cause).await);
        }

        let new_vertices: Vec<Value> = pending
            .into_iter()
            .zip(table.iter())
            .map(|(vertex, id)| {
                let mut doc = vertex.props;
                if let (Some(map), Some(id)) = (doc.as_object_mut(), id) {
                    map.insert("_id".to_string(), id.clone());
                }
                doc
            })
            .collect();

        // Phase two: rewrite edge endpoints, then submit the batch.
        for op in &mut ops {
            op.resolve_endpoints(&table)?;
        }
        if ops.is_empty() {
            return Ok(CommitReceipt {
                new_vertices,
                batch: None,
            });
        }
        match self.submit_batch(&ops).await {
            Ok(batch) => Ok(CommitReceipt {
                new_vertices,
                batch: Some(batch),
            }),
            // The server explicitly refused the batch after the vertices
            // were created: those vertices must not survive.
            Err(TxError::Transport(rejected @ TransportError::Rejected(_))) => {
                Err(self.rollback(&table, rejected).await)
            }
            // An HTTP-level failure of the final batch is surfaced as-is;
            // the created vertices are left in place. Inherited behavior,
            // see DESIGN.md.
            Err(other) => Err(other),
        }
    }

    async fn submit_batch(&self, ops: &[StagedOp]) -> TxResult<Value> {
        let records: Vec<Value> = ops.iter().map(StagedOp::wire).collect::<TxResult<_>>()?;
        Ok(self.transport.batch(&json!({ "tx": records })).await?)
    }

    /// Compensation: delete every vertex that did get an identity. Other
    /// staged operations are already discarded; they must not run against
    /// an inconsistent vertex set.
    async fn rollback(&self, table: &[Option<Value>], cause: TransportError) -> TxError {
        warn!(%cause, "rolling back transaction");
        let created: Vec<Value> = table.iter().rev().flatten().cloned().collect();
        if created.is_empty() {
            return TxError::RolledBack {
                cause: Box::new(cause),
            };
        }
        let deletes: Vec<Value> = created
            .iter()
            .map(|id| json!({"_id": id, "_type": "vertex", "_action": "delete"}))
            .collect();
        match self.transport.batch(&json!({ "tx": deletes })).await {
            Ok(_) => TxError::RolledBack {
                cause: Box::new(cause),
            },
            Err(batch_err) => {
                error!(%batch_err, orphaned = created.len(), "compensating deletes failed");
                TxError::RollbackIncomplete {
                    orphaned: created,
                    cause: Box::new(batch_err),
                }
            }
        }
    }
}
