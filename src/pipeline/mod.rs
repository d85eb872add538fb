//! Node-based dataflow pipeline.
//!
//! Nodes live in a tree: each has a name unique among its siblings and a set
//! of output terminals. A node refers to another node's outputs by a
//! hierarchical path resolved relative to its siblings.
//!
//! # Architecture
//!
//! ```text
//! [CursorSource] ──► [HistogramFill] ──► [StoreWriter] ──► ObjectStore
//!        └────────────────────────────────────┘
//! ```
//!
//! # Design
//!
//! - **Enum dispatch** for built-in nodes (`BuiltinNode`), trait objects for plugins.
//! - **Flat graph** with `NodeId` as array index and packed `TerminalId`s.
//! - **Output counters** per node, bumped whenever a node produces a new
//!   generation; consumers compare against the counter they last saw.
//! - **Topological order** computed once at connect time from node dependencies.

pub mod executor;
pub mod graph;
pub mod id;
pub mod node;
pub mod nodes;
pub mod path;
pub mod port;

pub use executor::{Pipeline, PipelineBuilder, RunStats, StoreBackend};
pub use graph::{Component, Graph, NodeSlot, Terminal};
pub use id::{GroupId, NodeId, TerminalId};
pub use node::{AnyNode, BuiltinNode, NodeContext, NodePlugin, NodeRole};
pub use path::{HierPath, THIS_CONTAINER};
pub use port::{PortDirection, TerminalDescriptor};
