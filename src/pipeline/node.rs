//! Node abstraction for the pipeline.
//!
//! Two-layer design:
//! - **`NodePlugin` trait**: for user-defined nodes.
//! - **`BuiltinNode` enum**: for all built-in nodes, dispatched by `match`.
//!
//! `AnyNode` wraps either variant so the pipeline can handle both uniformly.
//!
//! # Lifecycle
//!
//! ```text
//! connect_inputs ─► [ open_output ─► (next_output | process_input)* ─► close_output ]*
//! ```
//!
//! `connect_inputs` runs once when the pipeline is connected, after every node
//! has been added, and the bracketed part once per run.

use crate::error::Result;
use crate::pipeline::graph::{Graph, Terminal};
use crate::pipeline::id::NodeId;
use crate::pipeline::nodes::{CursorSourceNode, HistogramFillNode, StoreWriterNode};
use crate::pipeline::port::TerminalDescriptor;

/// Context passed to node lifecycle hooks.
pub struct NodeContext<'a> {
    /// The node being called.
    pub node: NodeId,
    /// Read-only view of the graph. The node's own outputs are not in it
    /// during the call; use `outputs` instead.
    pub graph: &'a Graph,
    /// The node's output terminals.
    pub outputs: &'a mut [Terminal],
    /// Generation number of the current step, 0 outside a run.
    pub generation: u64,
}

/// How the executor drives a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Produces generations through `next_output`.
    Source,
    /// Reads other nodes and produces outputs in `process_input`.
    Transform,
    /// Reads other nodes without producing outputs.
    Reducer,
}

/// Trait for pluggable/user-defined nodes.
pub trait NodePlugin: Send {
    /// Human-readable type name of this node.
    fn type_name(&self) -> &str;

    /// Output terminals declared by this node.
    fn outputs(&self) -> &[TerminalDescriptor];

    fn role(&self) -> NodeRole {
        NodeRole::Transform
    }

    /// Resolve inputs. Called once when the pipeline is connected.
    fn connect_inputs(&mut self, _ctx: &mut NodeContext) -> Result<()> {
        Ok(())
    }

    /// Nodes whose outputs this node reads; valid after `connect_inputs`.
    fn dependencies(&self) -> Vec<NodeId> {
        Vec::new()
    }

    fn open_output(&mut self, _ctx: &mut NodeContext) -> Result<()> {
        Ok(())
    }

    /// Process one generation. Returns true if new outputs were produced.
    fn process_input(&mut self, ctx: &mut NodeContext) -> Result<bool>;

    /// Advance a source. Returns false once exhausted.
    fn next_output(&mut self, _ctx: &mut NodeContext) -> Result<bool> {
        Ok(false)
    }

    fn close_output(&mut self, _ctx: &mut NodeContext) -> Result<()> {
        Ok(())
    }
}

/// Enum dispatch for built-in nodes.
pub enum BuiltinNode {
    CursorSource(CursorSourceNode),
    HistogramFill(HistogramFillNode),
    StoreWriter(StoreWriterNode),
}

impl BuiltinNode {
    pub fn type_name(&self) -> &str {
        match self {
            BuiltinNode::CursorSource(n) => n.type_name(),
            BuiltinNode::HistogramFill(n) => n.type_name(),
            BuiltinNode::StoreWriter(n) => n.type_name(),
        }
    }

    pub fn outputs(&self) -> &[TerminalDescriptor] {
        match self {
            BuiltinNode::CursorSource(n) => n.outputs(),
            BuiltinNode::HistogramFill(n) => n.outputs(),
            BuiltinNode::StoreWriter(n) => n.outputs(),
        }
    }

    pub fn role(&self) -> NodeRole {
        match self {
            BuiltinNode::CursorSource(_) => NodeRole::Source,
            BuiltinNode::HistogramFill(_) => NodeRole::Transform,
            BuiltinNode::StoreWriter(_) => NodeRole::Reducer,
        }
    }

    pub fn connect_inputs(&mut self, ctx: &mut NodeContext) -> Result<()> {
        match self {
            BuiltinNode::CursorSource(_) => Ok(()),
            BuiltinNode::HistogramFill(n) => n.connect_inputs(ctx),
            BuiltinNode::StoreWriter(n) => n.connect_inputs(ctx),
        }
    }

    pub fn dependencies(&self) -> Vec<NodeId> {
        match self {
            BuiltinNode::CursorSource(_) => Vec::new(),
            BuiltinNode::HistogramFill(n) => n.dependencies(),
            BuiltinNode::StoreWriter(n) => n.dependencies(),
        }
    }

    pub fn open_output(&mut self, ctx: &mut NodeContext) -> Result<()> {
        match self {
            BuiltinNode::CursorSource(_) => Ok(()),
            BuiltinNode::HistogramFill(n) => n.open_output(ctx),
            BuiltinNode::StoreWriter(n) => n.open_output(ctx),
        }
    }

    pub fn process_input(&mut self, ctx: &mut NodeContext) -> Result<bool> {
        match self {
            BuiltinNode::CursorSource(n) => n.process_input(ctx),
            BuiltinNode::HistogramFill(n) => n.process_input(ctx),
            BuiltinNode::StoreWriter(n) => n.process_input(ctx),
        }
    }

    pub fn next_output(&mut self, ctx: &mut NodeContext) -> Result<bool> {
        match self {
            BuiltinNode::CursorSource(n) => n.next_output(ctx),
            BuiltinNode::HistogramFill(_) | BuiltinNode::StoreWriter(_) => Ok(false),
        }
    }

    pub fn close_output(&mut self, ctx: &mut NodeContext) -> Result<()> {
        match self {
            BuiltinNode::CursorSource(_) | BuiltinNode::HistogramFill(_) => Ok(()),
            BuiltinNode::StoreWriter(n) => n.close_output(ctx),
        }
    }
}

/// Wrapper that holds either a built-in node (enum dispatch) or a plugin (trait object).
pub enum AnyNode {
    Builtin(BuiltinNode),
    Plugin(Box<dyn NodePlugin>),
}

impl AnyNode {
    pub fn type_name(&self) -> &str {
        match self {
            AnyNode::Builtin(n) => n.type_name(),
            AnyNode::Plugin(n) => n.type_name(),
        }
    }

    pub fn outputs(&self) -> &[TerminalDescriptor] {
        match self {
            AnyNode::Builtin(n) => n.outputs(),
            AnyNode::Plugin(n) => n.outputs(),
        }
    }

    pub fn role(&self) -> NodeRole {
        match self {
            AnyNode::Builtin(n) => n.role(),
            AnyNode::Plugin(n) => n.role(),
        }
    }

    pub fn connect_inputs(&mut self, ctx: &mut NodeContext) -> Result<()> {
        match self {
            AnyNode::Builtin(n) => n.connect_inputs(ctx),
            AnyNode::Plugin(n) => n.connect_inputs(ctx),
        }
    }

    pub fn dependencies(&self) -> Vec<NodeId> {
        match self {
            AnyNode::Builtin(n) => n.dependencies(),
            AnyNode::Plugin(n) => n.dependencies(),
        }
    }

    pub fn open_output(&mut self, ctx: &mut NodeContext) -> Result<()> {
        match self {
            AnyNode::Builtin(n) => n.open_output(ctx),
            AnyNode::Plugin(n) => n.open_output(ctx),
        }
    }

    pub fn process_input(&mut self, ctx: &mut NodeContext) -> Result<bool> {
        match self {
            AnyNode::Builtin(n) => n.process_input(ctx),
            AnyNode::Plugin(n) => n.process_input(ctx),
        }
    }

    pub fn next_output(&mut self, ctx: &mut NodeContext) -> Result<bool> {
        match self {
            AnyNode::Builtin(n) => n.next_output(ctx),
            AnyNode::Plugin(n) => n.next_output(ctx),
        }
    }

    pub fn close_output(&mut self, ctx: &mut NodeContext) -> Result<()> {
        match self {
            AnyNode::Builtin(n) => n.close_output(ctx),
            AnyNode::Plugin(n) => n.close_output(ctx),
        }
    }

    pub fn as_store_writer(&self) -> Option<&StoreWriterNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::StoreWriter(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_cursor_source(&self) -> Option<&CursorSourceNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::CursorSource(n)) => Some(n),
            _ => None,
        }
    }
}

impl From<CursorSourceNode> for AnyNode {
    fn from(node: CursorSourceNode) -> Self {
        AnyNode::Builtin(BuiltinNode::CursorSource(node))
    }
}

impl From<HistogramFillNode> for AnyNode {
    fn from(node: HistogramFillNode) -> Self {
        AnyNode::Builtin(BuiltinNode::HistogramFill(node))
    }
}

impl From<StoreWriterNode> for AnyNode {
    fn from(node: StoreWriterNode) -> Self {
        AnyNode::Builtin(BuiltinNode::StoreWriter(node))
    }
}
