//! Generation-tracking content tree of a store writer.
//!
//! The tree mirrors the directory layout written to the store. Each group
//! holds the sources that feed it, keyed by the node that produces them, and
//! remembers the last generation of every such node it has written. A group's
//! artifacts are written again only when their producer's output counter has
//! moved past that generation, so each artifact is written at most once per
//! generation and never misses the newest one.
//!
//! Groups live in an arena indexed by [`GroupId`]; group 0 is the root and
//! owns the store file, every other group borrows a directory inside its
//! parent's.

use crate::artifact::{Capabilities, Nameable};
use crate::config::ContentSpec;
use crate::error::{PipeStoreError, Result};
use crate::pipeline::graph::{Component, Graph};
use crate::pipeline::id::{GroupId, NodeId, TerminalId};
use crate::pipeline::path::{HierPath, THIS_CONTAINER};
use crate::store::{validate_entry_name, DirHandle, ObjectStore, WriteAction, WritePolicy};
use std::collections::BTreeSet;

/// Whether a group owns its store handle or borrows it from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOwnership {
    Owns,
    Borrows,
}

/// A resolved source reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundInput {
    pub path: HierPath,
    pub terminal: TerminalId,
    /// Node whose output counter governs this input.
    pub effective_source: NodeId,
}

/// Inputs fed by one producing node, plus the last generation written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    pub inputs: Vec<BoundInput>,
    pub last_seen: u64,
}

/// Artifacts handed to the store by one or more `process_input` calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteTally {
    /// Written to the store immediately.
    pub explicit: usize,
    /// Registered with their directory and persisted when the file is finalized.
    pub registered: usize,
}

impl WriteTally {
    pub fn total(&self) -> usize {
        self.explicit + self.registered
    }

    fn record(&mut self, action: WriteAction) {
        match action {
            WriteAction::Explicit => self.explicit += 1,
            WriteAction::AutoRegistered => self.registered += 1,
        }
    }
}

impl std::ops::AddAssign for WriteTally {
    fn add_assign(&mut self, other: Self) {
        self.explicit += other.explicit;
        self.registered += other.registered;
    }
}

#[derive(Debug)]
pub struct ContentGroup {
    name: String,
    parent: Option<GroupId>,
    ownership: HandleOwnership,
    children: Vec<GroupId>,
    /// Source references not yet resolved.
    content: Vec<HierPath>,
    /// In order of first encounter.
    sources: Vec<(NodeId, SourceInfo)>,
    inputs_connected: bool,
    dependencies: BTreeSet<NodeId>,
    handle: Option<DirHandle>,
}

impl ContentGroup {
    fn new(name: &str, parent: Option<GroupId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            ownership: if parent.is_some() {
                HandleOwnership::Borrows
            } else {
                HandleOwnership::Owns
            },
            children: Vec::new(),
            content: Vec::new(),
            sources: Vec::new(),
            inputs_connected: false,
            dependencies: BTreeSet::new(),
            handle: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub fn ownership(&self) -> HandleOwnership {
        self.ownership
    }

    pub fn children(&self) -> &[GroupId] {
        &self.children
    }

    pub fn pending_content(&self) -> &[HierPath] {
        &self.content
    }

    pub fn sources(&self) -> &[(NodeId, SourceInfo)] {
        &self.sources
    }

    pub fn source_info(&self, node: NodeId) -> Option<&SourceInfo> {
        self.sources.iter().find(|(n, _)| *n == node).map(|(_, s)| s)
    }

    pub fn inputs_connected(&self) -> bool {
        self.inputs_connected
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

#[derive(Debug)]
pub struct ContentTree {
    groups: Vec<ContentGroup>,
}

impl ContentTree {
    /// New tree whose root group is named after the store file it writes.
    pub fn new(file_name: &str) -> Self {
        Self {
            groups: vec![ContentGroup::new(file_name, None)],
        }
    }

    pub fn root(&self) -> &ContentGroup {
        &self.groups[GroupId::ROOT.index()]
    }

    pub fn group(&self, id: GroupId) -> Option<&ContentGroup> {
        self.groups.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Find a group by its path below the root (`"hist/calib"`).
    pub fn find(&self, path: &str) -> Option<GroupId> {
        HierPath::parse(path)
            .segments()
            .iter()
            .try_fold(GroupId::ROOT, |group, name| self.child_named(group, name))
    }

    /// Display path of a group, starting with `/` and the root name.
    pub fn path(&self, id: GroupId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(g) = current.and_then(|g| self.groups.get(g.index())) {
            names.push(g.name.as_str());
            current = g.parent;
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }

    /// Dependencies of a group, valid after `connect_inputs`.
    pub fn dependencies(&self, id: GroupId) -> &BTreeSet<NodeId> {
        &self.groups[id.index()].dependencies
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut ContentGroup> {
        self.groups
            .get_mut(id.index())
            .ok_or_else(|| PipeStoreError::State(format!("Unknown content group {:?}", id)))
    }

    fn child_named(&self, parent: GroupId, name: &str) -> Option<GroupId> {
        self.groups.get(parent.index()).and_then(|g| {
            g.children
                .iter()
                .copied()
                .find(|&c| self.groups[c.index()].name == name)
        })
    }

    /// Get or create the child group `name` of `parent`.
    pub fn sub_group(&mut self, parent: GroupId, name: &str) -> Result<GroupId> {
        if validate_entry_name(name).is_err() {
            return Err(PipeStoreError::Config(format!(
                "\"{}\" is not a valid group name in \"{}\"",
                name,
                self.path(parent)
            )));
        }
        self.group_mut(parent)?;
        if let Some(existing) = self.child_named(parent, name) {
            return Ok(existing);
        }
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(ContentGroup::new(name, Some(parent)));
        self.groups[parent.index()].children.push(id);
        tracing::trace!("Creating content group \"{}\"", self.path(id));
        Ok(id)
    }

    /// Add declarative content to `group`, resolving references relative to `anchor`.
    pub fn add_content(
        &mut self,
        group: GroupId,
        spec: &ContentSpec,
        graph: &Graph,
        anchor: NodeId,
    ) -> Result<()> {
        match spec {
            ContentSpec::Mapping(entries) => {
                for (name, nested) in entries {
                    let target = if name == THIS_CONTAINER {
                        group
                    } else {
                        self.sub_group(group, name)?
                    };
                    self.add_content(target, nested, graph, anchor)?;
                }
            }
            ContentSpec::Sequence(refs) => {
                for r in refs {
                    let path = HierPath::parse(r);
                    if path.is_empty() {
                        return Err(PipeStoreError::Config(format!(
                            "Empty source reference in content of \"{}\"",
                            self.path(group)
                        )));
                    }
                    self.add_source(group, &path, graph, anchor)?;
                }
            }
        }
        Ok(())
    }

    /// Add one source reference. A reference to a node adds each of its
    /// outputs as it exists now; outputs declared later are not picked up.
    pub fn add_source(
        &mut self,
        group: GroupId,
        path: &HierPath,
        graph: &Graph,
        anchor: NodeId,
    ) -> Result<()> {
        let component = graph.resolve_rel_to_siblings(anchor, path)?;
        let group_path = self.path(group);
        let target = self.group_mut(group)?;
        match component {
            Component::Terminal(_) => target.content.push(path.clone()),
            Component::Node(node) => {
                let outputs = graph.outputs(node);
                if outputs.is_empty() {
                    tracing::warn!(
                        "Source node \"{}\" for \"{}\" has no outputs",
                        graph.absolute_path(node),
                        group_path
                    );
                }
                target
                    .content
                    .extend(outputs.iter().map(|t| path.join(t.name.clone())));
            }
        }
        Ok(())
    }

    /// Resolve pending content of `group` and all its descendants, then
    /// recompute their dependencies.
    ///
    /// Nothing is committed unless every group resolves, so a failed call
    /// leaves the subtree unconnected and can be retried.
    pub fn connect_inputs(&mut self, group: GroupId, graph: &Graph, anchor: NodeId) -> Result<()> {
        let mut resolved = Vec::new();
        self.resolve_sources(group, graph, anchor, &mut resolved)?;
        for (id, sources) in &mut resolved {
            let target = &mut self.groups[id.index()];
            target.sources = std::mem::take(sources);
            target.inputs_connected = true;
        }
        // Children come after their parent in `resolved`
        for (id, _) in resolved.iter().rev() {
            self.update_dependencies(*id);
        }
        Ok(())
    }

    /// Bind the pending content of `group` and its descendants into `out`, parents first.
    fn resolve_sources(
        &self,
        group: GroupId,
        graph: &Graph,
        anchor: NodeId,
        out: &mut Vec<(GroupId, Vec<(NodeId, SourceInfo)>)>,
    ) -> Result<()> {
        let group_path = self.path(group);
        let target = self
            .groups
            .get(group.index())
            .ok_or_else(|| PipeStoreError::State(format!("Unknown content group {:?}", group)))?;
        if target.inputs_connected {
            return Err(PipeStoreError::State(format!(
                "Inputs of \"{}\" are already connected",
                group_path
            )));
        }

        let required = Capabilities::NAMEABLE_CLONEABLE;
        let mut sources: Vec<(NodeId, SourceInfo)> = Vec::new();
        for path in &target.content {
            let terminal = match graph.resolve_rel_to_siblings(anchor, path)? {
                Component::Terminal(t) => t,
                Component::Node(n) => {
                    return Err(PipeStoreError::Config(format!(
                        "\"{}\" used in \"{}\" names node \"{}\", not a terminal",
                        path,
                        group_path,
                        graph.absolute_path(n)
                    )))
                }
            };
            let kind = graph
                .terminal(terminal)
                .map(|t| t.kind)
                .ok_or_else(|| PipeStoreError::State(format!("Unknown terminal {:?}", terminal)))?;
            if !kind.capabilities().satisfies(required) {
                return Err(PipeStoreError::TypeMismatch {
                    terminal: graph.terminal_path(terminal),
                    container: group_path,
                });
            }

            let source = terminal.node();
            let input = BoundInput {
                path: path.clone(),
                terminal,
                effective_source: source,
            };
            match sources.iter_mut().find(|(n, _)| *n == source) {
                Some((_, info)) => info.inputs.push(input),
                None => sources.push((
                    source,
                    SourceInfo {
                        inputs: vec![input],
                        last_seen: 0,
                    },
                )),
            }
        }
        out.push((group, sources));

        for &child in &target.children {
            self.resolve_sources(child, graph, anchor, out)?;
        }
        Ok(())
    }

    /// Recompute a group's dependencies from its own sources and its children's dependencies.
    pub fn update_dependencies(&mut self, group: GroupId) {
        let Some(g) = self.groups.get(group.index()) else {
            return;
        };
        let mut deps: BTreeSet<NodeId> = g.sources.iter().map(|(n, _)| *n).collect();
        for &child in &g.children {
            deps.extend(self.groups[child.index()].dependencies.iter().copied());
        }
        self.groups[group.index()].dependencies = deps;
    }

    /// Reset generations and acquire store handles for `group` and its descendants.
    ///
    /// The root creates the store file fresh, other groups create or reuse a
    /// directory in their parent's.
    pub fn open_output(
        &mut self,
        group: GroupId,
        store: &mut dyn ObjectStore,
        title: &str,
    ) -> Result<()> {
        let parent = self.group_mut(group)?.parent;
        let group_path = self.path(group);
        let parent_handle = match parent {
            Some(p) => Some(self.groups[p.index()].handle.ok_or_else(|| {
                PipeStoreError::State(format!("Parent of \"{}\" is not open", group_path))
            })?),
            None => None,
        };

        let target = &mut self.groups[group.index()];
        for (_, info) in target.sources.iter_mut() {
            info.last_seen = 0;
        }
        let handle = match (target.ownership, parent_handle) {
            (HandleOwnership::Borrows, Some(parent)) => store.mkdir(parent, &target.name)?,
            _ => {
                tracing::debug!("Opening store file \"{}\"", target.name);
                store.create_file(&target.name, title)?
            }
        };
        target.handle = Some(handle);
        tracing::trace!("Opened \"{}\" as {:?}", group_path, handle);

        let children = target.children.clone();
        for child in children {
            self.open_output(child, store, title)?;
        }
        Ok(())
    }

    /// Write every artifact whose producer advanced since it was last written.
    /// Returns what was handed to the store for `group` and its descendants.
    /// A registered artifact is counted each time it is handed over, even
    /// though the store persists it only once.
    pub fn process_input(
        &mut self,
        group: GroupId,
        graph: &Graph,
        store: &mut dyn ObjectStore,
        policy: &WritePolicy,
    ) -> Result<WriteTally> {
        let group_path = self.path(group);
        let target = self.group_mut(group)?;
        let handle = target.handle.ok_or_else(|| {
            PipeStoreError::State(format!("Content group \"{}\" is not open", group_path))
        })?;

        let mut tally = WriteTally::default();
        for (source, info) in target.sources.iter_mut() {
            let current = graph.output_counter(*source);
            if info.last_seen >= current {
                continue;
            }
            info.last_seen = current;
            for input in &info.inputs {
                let artifact = graph
                    .terminal(input.terminal)
                    .and_then(|t| t.value.to_artifact())
                    .ok_or_else(|| {
                        PipeStoreError::State(format!(
                            "Terminal \"{}\" holds no nameable value",
                            graph.terminal_path(input.terminal)
                        ))
                    })?;
                tracing::trace!(
                    "Writing {} \"{}\" to \"{}\" (generation {})",
                    artifact.kind(),
                    artifact.name(),
                    group_path,
                    current
                );
                tally.record(policy.write(store, handle, artifact)?);
            }
        }

        let children = target.children.clone();
        for child in children {
            tally += self.process_input(child, graph, store, policy)?;
        }
        Ok(tally)
    }

    /// Release handles of `group` and its descendants, children first.
    /// The root finalizes the store file. Groups that are not open are skipped.
    pub fn close_output(&mut self, group: GroupId, store: &mut dyn ObjectStore) -> Result<()> {
        let children = self.group_mut(group)?.children.clone();
        for child in children {
            self.close_output(child, store)?;
        }
        let target = &mut self.groups[group.index()];
        if let Some(handle) = target.handle.take() {
            if target.ownership == HandleOwnership::Owns {
                store.finalize(handle)?;
                tracing::debug!("Closed store file \"{}\"", target.name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Histogram, ScalarType, Value, ValueKind};
    use crate::pipeline::port::TerminalDescriptor;
    use crate::store::MemoryStore;

    struct Fixture {
        graph: Graph,
        gen: NodeId,
        writer: NodeId,
    }

    fn fixture() -> Fixture {
        let mut graph = Graph::new();
        let gen = graph
            .add_slot(
                "gen",
                None,
                &[
                    TerminalDescriptor::output("h1", ValueKind::Histogram),
                    TerminalDescriptor::output("h2", ValueKind::Histogram),
                ],
            )
            .unwrap();
        graph
            .add_slot(
                "reader",
                None,
                &[TerminalDescriptor::output(
                    "energy",
                    ValueKind::Scalar(ScalarType::Float),
                )],
            )
            .unwrap();
        graph.add_slot("empty", None, &[]).unwrap();
        let writer = graph.add_slot("writer", None, &[]).unwrap();
        for (i, name) in ["h1", "h2"].iter().enumerate() {
            let hist = Histogram::new(*name, "", 4, 0.0, 4.0).unwrap();
            graph
                .set_output(TerminalId::new(gen, i as u16), Value::Histogram(hist))
                .unwrap();
        }
        Fixture { graph, gen, writer }
    }

    #[test]
    fn test_add_content_builds_groups() {
        let f = fixture();
        let mut tree = ContentTree::new("run");
        let spec = ContentSpec::group(vec![
            ("hist", ContentSpec::sources(["gen/h1"])),
            (".", ContentSpec::sources(["gen/h2"])),
            ("hist", ContentSpec::sources(["gen/h2"])),
        ]);
        tree.add_content(GroupId::ROOT, &spec, &f.graph, f.writer).unwrap();

        assert_eq!(tree.len(), 2);
        let hist = tree.find("hist").unwrap();
        assert_eq!(tree.path(hist), "/run/hist");
        let pending: Vec<String> = tree
            .group(hist)
            .unwrap()
            .pending_content()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(pending, vec!["gen/h1", "gen/h2"]);
        assert_eq!(tree.root().pending_content().len(), 1);
    }

    #[test]
    fn test_node_reference_expands_outputs() {
        let f = fixture();
        let mut tree = ContentTree::new("run");
        tree.add_content(GroupId::ROOT, &ContentSpec::sources(["gen", "empty"]), &f.graph, f.writer)
            .unwrap();
        let pending: Vec<String> = tree
            .root()
            .pending_content()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(pending, vec!["gen/h1", "gen/h2"]);
    }

    #[test]
    fn test_bad_references() {
        let f = fixture();
        let mut tree = ContentTree::new("run");
        let err = tree
            .add_content(GroupId::ROOT, &ContentSpec::sources([" / "]), &f.graph, f.writer)
            .unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Empty source reference"));

        let err = tree
            .add_content(GroupId::ROOT, &ContentSpec::sources(["nope"]), &f.graph, f.writer)
            .unwrap_err();
        assert!(matches!(err, PipeStoreError::Unresolved { .. }));
    }

    #[test]
    fn test_connect_rejects_non_nameable() {
        let f = fixture();
        let mut tree = ContentTree::new("run");
        let spec = ContentSpec::group(vec![("scalars", ContentSpec::sources(["reader/energy"]))]);
        tree.add_content(GroupId::ROOT, &spec, &f.graph, f.writer).unwrap();
        let err = tree.connect_inputs(GroupId::ROOT, &f.graph, f.writer).unwrap_err();
        match err {
            PipeStoreError::TypeMismatch {
                terminal,
                container,
            } => {
                assert_eq!(terminal, "reader/energy");
                assert_eq!(container, "/run/scalars");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_connect_twice_is_state_error() {
        let f = fixture();
        let mut tree = ContentTree::new("run");
        tree.add_content(GroupId::ROOT, &ContentSpec::sources(["gen"]), &f.graph, f.writer)
            .unwrap();
        tree.connect_inputs(GroupId::ROOT, &f.graph, f.writer).unwrap();
        let info = tree.root().source_info(f.gen).unwrap();
        assert_eq!(info.inputs.len(), 2);
        assert_eq!(info.last_seen, 0);
        assert!(tree
            .connect_inputs(GroupId::ROOT, &f.graph, f.writer)
            .unwrap_err()
            .is_state());
    }

    #[test]
    fn test_dependencies_include_children() {
        let f = fixture();
        let mut tree = ContentTree::new("run");
        let spec = ContentSpec::group(vec![("a", ContentSpec::group(vec![("b", ContentSpec::sources(["gen/h1"]))]))]);
        tree.add_content(GroupId::ROOT, &spec, &f.graph, f.writer).unwrap();
        tree.connect_inputs(GroupId::ROOT, &f.graph, f.writer).unwrap();
        tree.update_dependencies(GroupId::ROOT);

        let a = tree.find("a").unwrap();
        assert!(tree.dependencies(a).contains(&f.gen));
        assert!(tree.dependencies(GroupId::ROOT).contains(&f.gen));
    }

    #[test]
    fn test_generation_tracking() {
        let mut f = fixture();
        let mut store = MemoryStore::new();
        let mut tree = ContentTree::new("run");
        let spec = ContentSpec::group(vec![("hist", ContentSpec::sources(["gen/h1"]))]);
        tree.add_content(GroupId::ROOT, &spec, &f.graph, f.writer).unwrap();
        tree.connect_inputs(GroupId::ROOT, &f.graph, f.writer).unwrap();

        let policy = WritePolicy::new(crate::store::AutoRegistration::DISABLED);
        tree.open_output(GroupId::ROOT, &mut store, "Run").unwrap();
        assert!(store.has_dir("run/hist"));

        let mut process = |tree: &mut ContentTree, graph: &Graph| {
            tree.process_input(GroupId::ROOT, graph, &mut store, &policy)
                .unwrap()
                .explicit
        };
        assert_eq!(process(&mut tree, &f.graph), 0);
        f.graph.advance_counter(f.gen);
        assert_eq!(process(&mut tree, &f.graph), 1);
        assert_eq!(process(&mut tree, &f.graph), 0);
        f.graph.advance_counter(f.gen);
        f.graph.advance_counter(f.gen);
        assert_eq!(process(&mut tree, &f.graph), 1);
        assert_eq!(store.object("run/hist", "h1").unwrap().cycle, 2);

        tree.close_output(GroupId::ROOT, &mut store).unwrap();
        assert!(store.is_finalized("run"));
        assert!(!tree.root().is_open());
    }

    #[test]
    fn test_process_outside_bracket_is_state_error() {
        let f = fixture();
        let mut store = MemoryStore::new();
        let mut tree = ContentTree::new("run");
        let err = tree
            .process_input(GroupId::ROOT, &f.graph, &mut store, &WritePolicy::default())
            .unwrap_err();
        assert!(err.is_state());
        tree.close_output(GroupId::ROOT, &mut store).unwrap();
    }

    #[test]
    fn test_invalid_group_names() {
        let mut tree = ContentTree::new("run");
        assert!(tree.sub_group(GroupId::ROOT, "").is_err());
        assert!(tree.sub_group(GroupId::ROOT, ".").is_err());
        assert!(tree.sub_group(GroupId::ROOT, "..").unwrap_err().is_config());
        assert!(tree.sub_group(GroupId::ROOT, "a/b").is_err());
        assert!(tree.sub_group(GroupId::ROOT, "a\\b").is_err());
        let a = tree.sub_group(GroupId::ROOT, "a").unwrap();
        assert_eq!(tree.sub_group(GroupId::ROOT, "a").unwrap(), a);
        assert_eq!(tree.group(a).unwrap().ownership(), HandleOwnership::Borrows);
        assert_eq!(tree.root().ownership(), HandleOwnership::Owns);

        let spec = ContentSpec::group(vec![("..", ContentSpec::sources(["gen/h1"]))]);
        let f = fixture();
        assert!(tree
            .add_content(GroupId::ROOT, &spec, &f.graph, f.writer)
            .unwrap_err()
            .is_config());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_failed_connect_commits_nothing() {
        let f = fixture();
        let mut tree = ContentTree::new("run");
        let spec = ContentSpec::group(vec![
            (".", ContentSpec::sources(["gen/h1"])),
            ("hist", ContentSpec::sources(["gen/h2"])),
            ("scalars", ContentSpec::sources(["reader/energy"])),
        ]);
        tree.add_content(GroupId::ROOT, &spec, &f.graph, f.writer).unwrap();
        let err = tree.connect_inputs(GroupId::ROOT, &f.graph, f.writer).unwrap_err();
        assert!(matches!(err, PipeStoreError::TypeMismatch { .. }));

        let hist = tree.find("hist").unwrap();
        for id in [GroupId::ROOT, hist] {
            let group = tree.group(id).unwrap();
            assert!(group.sources().is_empty());
            assert!(!group.inputs_connected());
        }
        assert!(tree.dependencies(GroupId::ROOT).is_empty());

        // Once the bad entry is gone the same groups connect with single bindings
        let scalars = tree.find("scalars").unwrap();
        tree.groups[scalars.index()].content.clear();
        tree.connect_inputs(GroupId::ROOT, &f.graph, f.writer).unwrap();
        assert_eq!(tree.root().source_info(f.gen).unwrap().inputs.len(), 1);
        assert_eq!(tree.group(hist).unwrap().source_info(f.gen).unwrap().inputs.len(), 1);
        assert!(tree.dependencies(GroupId::ROOT).contains(&f.gen));
        assert!(tree.group(scalars).unwrap().inputs_connected());
    }

    #[test]
    fn test_tally_separates_registered_artifacts() {
        let mut f = fixture();
        let mut store = MemoryStore::new();
        let mut tree = ContentTree::new("run");
        tree.add_content(GroupId::ROOT, &ContentSpec::sources(["gen"]), &f.graph, f.writer)
            .unwrap();
        tree.connect_inputs(GroupId::ROOT, &f.graph, f.writer).unwrap();
        tree.open_output(GroupId::ROOT, &mut store, "").unwrap();

        let mut total = WriteTally::default();
        for _ in 0..3 {
            f.graph.advance_counter(f.gen);
            total += tree
                .process_input(GroupId::ROOT, &f.graph, &mut store, &WritePolicy::default())
                .unwrap();
        }
        assert_eq!(total, WriteTally { explicit: 0, registered: 6 });
        assert_eq!(total.total(), 6);
        assert!(store.object_names("run").is_empty());

        tree.close_output(GroupId::ROOT, &mut store).unwrap();
        assert_eq!(store.object_names("run"), vec!["h1", "h2"]);
    }
}
