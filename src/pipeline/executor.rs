//! Pipeline executor: graph construction, scheduling and the run loop.
//!
//! A run goes through these phases:
//! 1. `connect` resolves every node's inputs and computes a topological
//!    execution order from the declared dependencies.
//! 2. `open_run` opens every node's outputs and opens the sources.
//! 3. `step` advances every source by one record, bumps the output counter
//!    of each source that advanced, then lets the other nodes process in
//!    execution order, bumping the counter of each node that produced output.
//! 4. `finish_run` closes every node's outputs.

use crate::artifact::Histogram;
use crate::config::{NodeConfig, NodeSpec, PipelineConfig};
use crate::error::{PipeStoreError, Result};
use crate::pipeline::graph::{Component, Graph};
use crate::pipeline::id::NodeId;
use crate::pipeline::node::{AnyNode, NodeContext, NodeRole};
use crate::pipeline::nodes::{CursorSourceNode, HistogramFillNode, StoreWriterNode, WriteTally};
use crate::pipeline::path::HierPath;
use crate::records::SegmentSource;
use crate::store::{FsStore, MemoryStore, ObjectStore, WritePolicy};
use std::path::{Path, PathBuf};

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Steps in which at least one source advanced.
    pub generations: u64,
    /// Artifacts written to their stores immediately, over all store writers.
    pub artifacts_written: usize,
    /// Artifacts handed to their directories for persisting at finalize.
    /// An artifact that changes every generation is counted every generation
    /// but stored once.
    pub artifacts_registered: usize,
}

/// The pipeline graph and executor.
#[derive(Default)]
pub struct Pipeline {
    graph: Graph,
    /// Indexed like the graph's node slots.
    nodes: Vec<AnyNode>,
    /// Topological execution order (indices into `nodes`).
    execution_order: Vec<usize>,
    connected: bool,
    running: bool,
    generation: u64,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("graph", &self.graph)
            .field("nodes", &self.nodes.iter().map(|n| n.type_name()).collect::<Vec<_>>())
            .field("execution_order", &self.execution_order)
            .field("connected", &self.connected)
            .field("running", &self.running)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Graph building ──

    /// Add a top-level node. Returns its NodeId.
    pub fn add_node(&mut self, name: &str, node: impl Into<AnyNode>) -> Result<NodeId> {
        self.add_child_node(None, name, node)
    }

    /// Add a node below `parent`. Its inputs are resolved later, by `connect`.
    pub fn add_child_node(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        node: impl Into<AnyNode>,
    ) -> Result<NodeId> {
        if self.connected {
            return Err(PipeStoreError::State(format!(
                "Cannot add node \"{}\" to a connected pipeline",
                name
            )));
        }
        let node = node.into();
        let id = self.graph.add_slot(name, parent, node.outputs())?;
        self.nodes.push(node);
        tracing::trace!("Added {} node \"{}\"", self.nodes[id.index()].type_name(), name);
        Ok(id)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable graph access, for driving outputs by hand.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn node(&self, id: NodeId) -> Option<&AnyNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by its path from the top of the tree.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        match self.graph.resolve(None, &HierPath::parse(path)) {
            Some(Component::Node(id)) => Some(id),
            _ => None,
        }
    }

    pub fn execution_order(&self) -> &[usize] {
        &self.execution_order
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of the last step of the current or last run.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Call a node hook with the node's outputs moved out of the graph.
    fn call_node<T>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut AnyNode, &mut NodeContext) -> Result<T>,
    ) -> Result<T> {
        let mut outputs = self.graph.take_outputs(id);
        let result = {
            let mut ctx = NodeContext {
                node: id,
                graph: &self.graph,
                outputs: &mut outputs,
                generation: self.generation,
            };
            f(&mut self.nodes[id.index()], &mut ctx)
        };
        self.graph.restore_outputs(id, outputs);
        result.map_err(|e| e.with_context(format!("Node \"{}\"", self.graph.absolute_path(id))))
    }

    // ── Connection ──

    /// Resolve all inputs and compute the execution order. Runs once.
    pub fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(PipeStoreError::State(
                "Pipeline is already connected".to_string(),
            ));
        }
        for idx in 0..self.nodes.len() {
            self.call_node(NodeId(idx as u32), |n, ctx| n.connect_inputs(ctx))?;
        }
        self.execution_order = self.compute_execution_order()?;
        self.connected = true;
        tracing::debug!("Pipeline connected: {} nodes", self.nodes.len());
        Ok(())
    }

    // ── Topological sort (Kahn's algorithm) ──

    fn compute_execution_order(&self) -> Result<Vec<usize>> {
        let n = self.nodes.len();
        let mut in_degree = vec![0u32; n];
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (to, node) in self.nodes.iter().enumerate() {
            for dep in node.dependencies() {
                let from = dep.index();
                if from < n && from != to {
                    adj[from].push(to);
                    in_degree[to] += 1;
                }
            }
        }

        let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(node) = queue.pop() {
            order.push(node);
            for &next in &adj[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push(next);
                }
            }
        }

        if order.len() != n {
            tracing::warn!(
                "Pipeline graph has a cycle! Only {} of {} nodes scheduled.",
                order.len(),
                n
            );
            return Err(PipeStoreError::CycleDetected);
        }
        Ok(order)
    }

    // ── Run lifecycle ──

    /// Open all outputs and rewind all sources.
    pub fn open_run(&mut self) -> Result<()> {
        if !self.connected {
            return Err(PipeStoreError::State(
                "Pipeline must be connected before a run".to_string(),
            ));
        }
        if self.running {
            return Err(PipeStoreError::State("A run is already open".to_string()));
        }
        self.generation = 0;
        let order = self.execution_order.clone();
        for &idx in &order {
            self.call_node(NodeId(idx as u32), |n, ctx| n.open_output(ctx))?;
        }
        for &idx in &order {
            if self.nodes[idx].role() == NodeRole::Source {
                self.call_node(NodeId(idx as u32), |n, ctx| n.process_input(ctx))?;
            }
        }
        self.running = true;
        tracing::info!("Run opened with {} nodes", self.nodes.len());
        Ok(())
    }

    /// Run one generation. Returns false once no source advances.
    ///
    /// A pipeline without sources processes a single generation.
    pub fn step(&mut self) -> Result<bool> {
        if !self.running {
            return Err(PipeStoreError::State("No run is open".to_string()));
        }
        let order = self.execution_order.clone();
        self.generation += 1;

        let mut has_sources = false;
        let mut advanced = false;
        for &idx in &order {
            if self.nodes[idx].role() != NodeRole::Source {
                continue;
            }
            has_sources = true;
            let id = NodeId(idx as u32);
            if self.call_node(id, |n, ctx| n.next_output(ctx))? {
                self.graph.advance_counter(id);
                advanced = true;
            }
        }
        if has_sources && !advanced {
            self.generation -= 1;
            return Ok(false);
        }

        for &idx in &order {
            if self.nodes[idx].role() == NodeRole::Source {
                continue;
            }
            let id = NodeId(idx as u32);
            if self.call_node(id, |n, ctx| n.process_input(ctx))? {
                self.graph.advance_counter(id);
            }
        }
        Ok(advanced)
    }

    /// Close all outputs.
    pub fn finish_run(&mut self) -> Result<RunStats> {
        if !self.running {
            return Err(PipeStoreError::State("No run is open".to_string()));
        }
        self.running = false;
        let order = self.execution_order.clone();
        for &idx in &order {
            self.call_node(NodeId(idx as u32), |n, ctx| n.close_output(ctx))?;
        }
        let tally = self
            .nodes
            .iter()
            .filter_map(AnyNode::as_store_writer)
            .fold(WriteTally::default(), |mut sum, w| {
                sum += w.tally();
                sum
            });
        let stats = RunStats {
            generations: self.generation,
            artifacts_written: tally.explicit,
            artifacts_registered: tally.registered,
        };
        tracing::info!(
            "Run finished after {} generations, {} artifacts written, {} registrations",
            stats.generations,
            stats.artifacts_written,
            stats.artifacts_registered
        );
        Ok(stats)
    }

    /// Open a run, step until the sources are exhausted and close it.
    pub fn run(&mut self) -> Result<RunStats> {
        self.open_run()?;
        while self.step()? {}
        self.finish_run()
    }
}

/// Where store writers built from configuration write to.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// One directory tree per store file below this directory.
    Filesystem(PathBuf),
    /// A shared in-memory store; keep a clone to inspect the result.
    Memory(MemoryStore),
}

impl StoreBackend {
    fn open(&self) -> Box<dyn ObjectStore> {
        match self {
            StoreBackend::Filesystem(base) => Box::new(FsStore::new(base.clone())),
            StoreBackend::Memory(store) => Box::new(store.clone()),
        }
    }
}

/// Builder for constructing a pipeline from configuration.
pub struct PipelineBuilder {
    config: PipelineConfig,
    backend: StoreBackend,
    base_dir: Option<PathBuf>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            backend: StoreBackend::Memory(MemoryStore::new()),
            base_dir: None,
        }
    }

    /// Build and connect a pipeline writing to `backend`.
    pub fn from_config(config: PipelineConfig, backend: StoreBackend) -> Result<Pipeline> {
        let mut pipeline = Self::new(config).store(backend).build()?;
        pipeline.connect()?;
        Ok(pipeline)
    }

    pub fn store(mut self, backend: StoreBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Directory that relative segment paths are resolved against.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Create every configured node in order. The result is not yet connected.
    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;
        let mut pipeline = Pipeline::new();
        for node in &self.config.nodes {
            let parent = match &node.parent {
                Some(path) => Some(pipeline.find(path).ok_or_else(|| {
                    PipeStoreError::Config(format!(
                        "Parent \"{}\" of node \"{}\" is not defined before it",
                        path, node.name
                    ))
                })?),
                None => None,
            };
            let created = self.create(node)?;
            pipeline.add_child_node(parent, &node.name, created)?;
        }
        tracing::debug!(
            "Built pipeline \"{}\" with {} nodes",
            self.config.name,
            pipeline.len()
        );
        Ok(pipeline)
    }

    fn create(&self, node: &NodeConfig) -> Result<AnyNode> {
        Ok(match &node.spec {
            NodeSpec::CursorSource {
                stream,
                segments,
                outputs,
            } => {
                let paths = segments.iter().map(|p| self.resolve_path(p)).collect();
                CursorSourceNode::new(stream.clone(), SegmentSource::Files(paths), outputs).into()
            }
            NodeSpec::HistogramFill {
                input,
                bins,
                low,
                high,
                title,
            } => {
                let template = Histogram::new(node.name.clone(), title.clone(), *bins, *low, *high)?;
                HistogramFillNode::new(input.as_str(), template).into()
            }
            NodeSpec::StoreWriter {
                file,
                title,
                content,
                auto_registration,
            } => StoreWriterNode::new(file.clone(), title.clone(), content.clone(), self.backend.open())
                .with_policy(WritePolicy::new(*auto_registration))
                .into(),
        })
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for StoreBackend {
    fn default() -> Self {
        StoreBackend::Memory(MemoryStore::new())
    }
}
