//! Rhizome: async client for Rexster-style graph servers
//!
//! A client library that builds graph-traversal scripts through a fluent
//! expression builder and stages vertex/edge writes into server-side
//! batch transactions.
//!
//! # Core Concepts
//!
//! - **Traversals**: immutable query values; every chained step returns
//!   a new value with one more script segment
//! - **Transactions**: client-side staging of create/update/delete
//!   operations, committed as one batch with rollback of partially
//!   created vertices
//! - **Transport**: one HTTP seam with a single reauthenticate-and-retry
//!   policy, mockable for tests
//!
//! # Example
//!
//! ```no_run
//! use rhizome::{GraphClient, GraphConfig};
//!
//! # async fn run() -> Result<(), rhizome::TransportError> {
//! let client = GraphClient::new(GraphConfig::default());
//! let friends = client.v(1).out("knows").property("name");
//! let rows = client.execute(&friends).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;

pub mod codec;
pub mod script;
pub mod transport;
pub mod tx;

pub use client::{GraphClient, ResultSet};
pub use config::{Credentials, GraphConfig};
pub use script::{Arg, Args, StepArg, Traversal};
pub use transport::{
    HttpExec, HttpReply, MockCall, MockHttp, ReqwestExec, Transport, TransportError,
    TransportResult,
};
pub use tx::{
    Action, CommitReceipt, Endpoint, EntityKind, StagedOp, Transaction, TxError, TxResult,
    VertexRef,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
