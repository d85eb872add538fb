//! Pipeline graph: node hierarchy, output terminals and generation counters.
//!
//! Nodes form a tree (top-level nodes have no parent). Each node owns an
//! ordered list of output terminals and an output counter that the executor
//! advances whenever the node produces a new generation of outputs.
//!
//! Paths are resolved segment by segment: a segment names a child node, and
//! the final segment may instead name an output terminal of the node reached
//! so far.

use crate::artifact::{Value, ValueKind};
use crate::error::{PipeStoreError, Result};
use crate::pipeline::id::{NodeId, TerminalId};
use crate::pipeline::path::HierPath;
use crate::pipeline::port::TerminalDescriptor;

/// Output slot holding a node's current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminal {
    pub name: String,
    pub kind: ValueKind,
    pub value: Value,
}

impl Terminal {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: Value::Empty,
        }
    }
}

impl From<&TerminalDescriptor> for Terminal {
    fn from(desc: &TerminalDescriptor) -> Self {
        Terminal::new(desc.name.clone(), desc.kind)
    }
}

#[derive(Debug)]
pub struct NodeSlot {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub outputs: Vec<Terminal>,
    pub output_counter: u64,
}

/// What a path resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Node(NodeId),
    Terminal(TerminalId),
}

#[derive(Debug, Default)]
pub struct Graph {
    slots: Vec<NodeSlot>,
    top_level: Vec<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Add a node named `name` under `parent` with the given output terminals.
    pub fn add_slot(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        outputs: &[TerminalDescriptor],
    ) -> Result<NodeId> {
        if name.is_empty() || name.contains('/') {
            return Err(PipeStoreError::Config(format!(
                "\"{}\" is not a valid node name",
                name
            )));
        }
        if let Some(p) = parent {
            if self.slots.get(p.index()).is_none() {
                return Err(PipeStoreError::Config(format!("Unknown parent node {}", p)));
            }
        }
        if self.find_child(parent, name).is_some() {
            return Err(PipeStoreError::Config(format!(
                "Duplicate node name \"{}\" under \"{}\"",
                name,
                parent.map(|p| self.absolute_path(p).to_string()).unwrap_or_default()
            )));
        }
        if outputs.len() > TerminalId::MAX_TERMINALS {
            return Err(PipeStoreError::Config(format!(
                "Node \"{}\" declares {} outputs, at most {} are supported",
                name,
                outputs.len(),
                TerminalId::MAX_TERMINALS
            )));
        }

        let id = NodeId(self.slots.len() as u32);
        self.slots.push(NodeSlot {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            outputs: outputs.iter().map(Terminal::from).collect(),
            output_counter: 0,
        });
        match parent {
            Some(p) => self.slots[p.index()].children.push(id),
            None => self.top_level.push(id),
        }
        Ok(id)
    }

    pub fn slot(&self, node: NodeId) -> Option<&NodeSlot> {
        self.slots.get(node.index())
    }

    pub fn name(&self, node: NodeId) -> &str {
        self.slots
            .get(node.index())
            .map(|s| s.name.as_str())
            .unwrap_or("")
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slots.get(node.index()).and_then(|s| s.parent)
    }

    /// Children of `parent`, or the top-level nodes for `None`.
    pub fn children(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(p) => self
                .slots
                .get(p.index())
                .map(|s| s.children.as_slice())
                .unwrap_or(&[]),
            None => &self.top_level,
        }
    }

    pub fn find_child(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.slots[c.index()].name == name)
    }

    /// Path of `node` from the top of the tree.
    pub fn absolute_path(&self, node: NodeId) -> HierPath {
        let mut names = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            match self.slots.get(id.index()) {
                Some(slot) => {
                    names.push(slot.name.clone());
                    current = slot.parent;
                }
                None => break,
            }
        }
        names.reverse();
        HierPath::from_segments(names)
    }

    /// Display path of an output terminal (`node/path/terminal`).
    pub fn terminal_path(&self, terminal: TerminalId) -> String {
        let name = self
            .terminal(terminal)
            .map(|t| t.name.as_str())
            .unwrap_or("?");
        format!("{}/{}", self.absolute_path(terminal.node()), name)
    }

    /// Resolve `path` starting in the scope of `scope`'s children.
    pub fn resolve(&self, scope: Option<NodeId>, path: &HierPath) -> Option<Component> {
        let segments = path.segments();
        if segments.is_empty() {
            return None;
        }
        let mut current = scope;
        for (i, segment) in segments.iter().enumerate() {
            if let Some(child) = self.find_child(current, segment) {
                current = Some(child);
                continue;
            }
            let is_last = i + 1 == segments.len();
            let node = current?;
            if !is_last || i == 0 {
                return None;
            }
            let index = self.slots[node.index()]
                .outputs
                .iter()
                .position(|t| t.name == *segment)?;
            return Some(Component::Terminal(TerminalId::new(node, index as u16)));
        }
        current.map(Component::Node)
    }

    /// Resolve `path` among the siblings of `node`, then among the siblings
    /// of each ancestor in turn.
    pub fn resolve_rel_to_siblings(&self, node: NodeId, path: &HierPath) -> Result<Component> {
        let mut scope = self.parent(node);
        loop {
            if let Some(found) = self.resolve(scope, path) {
                return Ok(found);
            }
            match scope {
                Some(s) => scope = self.parent(s),
                None => break,
            }
        }
        Err(PipeStoreError::Unresolved {
            path: path.to_string(),
            anchor: self.absolute_path(node).to_string(),
        })
    }

    pub fn terminal(&self, terminal: TerminalId) -> Option<&Terminal> {
        self.slots
            .get(terminal.node().index())
            .and_then(|s| s.outputs.get(terminal.terminal_index() as usize))
    }

    pub fn outputs(&self, node: NodeId) -> &[Terminal] {
        self.slots
            .get(node.index())
            .map(|s| s.outputs.as_slice())
            .unwrap_or(&[])
    }

    /// Current output generation of `node`.
    pub fn output_counter(&self, node: NodeId) -> u64 {
        self.slots
            .get(node.index())
            .map(|s| s.output_counter)
            .unwrap_or(0)
    }

    pub fn advance_counter(&mut self, node: NodeId) -> u64 {
        match self.slots.get_mut(node.index()) {
            Some(slot) => {
                slot.output_counter += 1;
                slot.output_counter
            }
            None => 0,
        }
    }

    pub fn set_output(&mut self, terminal: TerminalId, value: Value) -> Result<()> {
        let slot = self
            .slots
            .get_mut(terminal.node().index())
            .and_then(|s| s.outputs.get_mut(terminal.terminal_index() as usize))
            .ok_or_else(|| PipeStoreError::State(format!("Unknown terminal {:?}", terminal)))?;
        slot.value = value;
        Ok(())
    }

    /// Move a node's outputs out so the node can mutate them while reading the rest of the graph.
    pub(crate) fn take_outputs(&mut self, node: NodeId) -> Vec<Terminal> {
        self.slots
            .get_mut(node.index())
            .map(|s| std::mem::take(&mut s.outputs))
            .unwrap_or_default()
    }

    pub(crate) fn restore_outputs(&mut self, node: NodeId, outputs: Vec<Terminal>) {
        if let Some(slot) = self.slots.get_mut(node.index()) {
            slot.outputs = outputs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ScalarType;

    fn hist_out(name: &str) -> TerminalDescriptor {
        TerminalDescriptor::output(name, ValueKind::Histogram)
    }

    /// top: gen(h1, h2), ana{ reader(energy), writer }, writer2
    fn sample() -> (Graph, NodeId, NodeId, NodeId, NodeId) {
        let mut g = Graph::new();
        let gen = g.add_slot("gen", None, &[hist_out("h1"), hist_out("h2")]).unwrap();
        let ana = g.add_slot("ana", None, &[]).unwrap();
        let reader = g
            .add_slot(
                "reader",
                Some(ana),
                &[TerminalDescriptor::output(
                    "energy",
                    ValueKind::Scalar(ScalarType::Float),
                )],
            )
            .unwrap();
        let writer = g.add_slot("writer", Some(ana), &[]).unwrap();
        (g, gen, ana, reader, writer)
    }

    #[test]
    fn test_absolute_path() {
        let (g, _, _, reader, _) = sample();
        assert_eq!(g.absolute_path(reader).to_string(), "ana/reader");
    }

    #[test]
    fn test_duplicate_sibling_rejected() {
        let (mut g, _, ana, _, _) = sample();
        assert!(g.add_slot("reader", Some(ana), &[]).unwrap_err().is_config());
        assert!(g.add_slot("reader", None, &[]).is_ok());
        assert!(g.add_slot("", None, &[]).is_err());
        assert!(g.add_slot("a/b", None, &[]).is_err());
    }

    #[test]
    fn test_resolve_node_and_terminal() {
        let (g, gen, _, _, _) = sample();
        assert_eq!(
            g.resolve(None, &HierPath::parse("gen")),
            Some(Component::Node(gen))
        );
        assert_eq!(
            g.resolve(None, &HierPath::parse("gen/h2")),
            Some(Component::Terminal(TerminalId::new(gen, 1)))
        );
        assert_eq!(g.resolve(None, &HierPath::parse("gen/h3")), None);
        assert_eq!(g.resolve(None, &HierPath::parse("h1")), None);
    }

    #[test]
    fn test_resolve_rel_to_siblings_walks_up() {
        let (g, gen, _, reader, writer) = sample();
        assert_eq!(
            g.resolve_rel_to_siblings(writer, &HierPath::parse("reader/energy"))
                .unwrap(),
            Component::Terminal(TerminalId::new(reader, 0))
        );
        assert_eq!(
            g.resolve_rel_to_siblings(writer, &HierPath::parse("gen/h1"))
                .unwrap(),
            Component::Terminal(TerminalId::new(gen, 0))
        );
        let err = g
            .resolve_rel_to_siblings(writer, &HierPath::parse("nowhere"))
            .unwrap_err();
        assert!(err.to_string().contains("ana/writer"));
    }

    #[test]
    fn test_counters_and_outputs() {
        let (mut g, gen, _, _, _) = sample();
        assert_eq!(g.output_counter(gen), 0);
        assert_eq!(g.advance_counter(gen), 1);
        assert_eq!(g.output_counter(gen), 1);

        let taken = g.take_outputs(gen);
        assert_eq!(taken.len(), 2);
        assert!(g.outputs(gen).is_empty());
        g.restore_outputs(gen, taken);
        assert_eq!(g.terminal_path(TerminalId::new(gen, 1)), "gen/h2");
    }
}
