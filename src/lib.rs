//! # pipestore: incremental artifact persistence for dataflow pipelines
//!
//! A pipeline is a tree of named nodes. Source nodes advance a generation at
//! a time, transforms derive new values from them, and reducers consume what
//! the others produced. Two node types carry the core behavior:
//!
//! - **CursorSource** serves the records of a stream that is split across
//!   several segment files, one record per generation.
//! - **StoreWriter** persists nameable artifacts (histograms, tables, named
//!   objects) into a hierarchical store, writing each source's outputs at
//!   most once per generation that source produced.
//!
//! ## Architecture
//!
//! - **artifact**: values flowing between nodes and what can be stored
//! - **records**: segment files and the segmented stream over them
//! - **store**: the `ObjectStore` seam with filesystem and in-memory backends
//! - **pipeline**: graph, node dispatch, executor and built-in nodes
//! - **config**: TOML/JSON pipeline definitions
//! - **logging**: `tracing` subscriber setup
//!
//! ## Example
//!
//! ```ignore
//! use pipestore::{config::PipelineConfig, pipeline::{PipelineBuilder, StoreBackend}};
//!
//! fn main() -> pipestore::Result<()> {
//!     let config = PipelineConfig::load("scan.toml")?;
//!     let _guard = pipestore::logging::init(&config.logging)?;
//!     let mut pipeline =
//!         PipelineBuilder::from_config(config, StoreBackend::Filesystem("out".into()))?;
//!     let stats = pipeline.run()?;
//!     tracing::info!("{} generations processed", stats.generations);
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod records;
pub mod store;

// Re-export commonly used types
pub use artifact::{Artifact, Histogram, NamedObject, Scalar, ScalarType, Table, Value, ValueKind};
pub use config::{ContentSpec, NodeConfig, NodeSpec, PipelineConfig};
pub use error::{ErrorCategory, PipeStoreError, Result, ResultExt};
pub use pipeline::{Pipeline, PipelineBuilder, RunStats, StoreBackend};
pub use records::{ColumnDef, Segment, SegmentSource, SegmentedStream};
pub use store::{AutoRegistration, FsStore, MemoryStore, ObjectStore, WritePolicy};
