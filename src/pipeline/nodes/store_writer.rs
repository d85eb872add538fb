//! StoreWriter node: persists artifacts of other nodes into an object store.
//!
//! The node owns a [`ContentTree`] built from its content configuration when
//! the pipeline is connected. Each run opens one store file named after the
//! node's `file_name`, writes changed artifacts every generation and finalizes
//! the file when the run closes.

use super::content_tree::{ContentTree, WriteTally};
use crate::config::ContentSpec;
use crate::error::{PipeStoreError, Result};
use crate::pipeline::id::{GroupId, NodeId};
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::TerminalDescriptor;
use crate::store::{ObjectStore, WritePolicy};

pub struct StoreWriterNode {
    file_name: String,
    title: String,
    content: ContentSpec,
    tree: ContentTree,
    store: Box<dyn ObjectStore>,
    policy: WritePolicy,
    /// Artifacts handed to the store in the current or last run.
    tally: WriteTally,
}

impl StoreWriterNode {
    pub fn new(
        file_name: impl Into<String>,
        title: impl Into<String>,
        content: ContentSpec,
        store: Box<dyn ObjectStore>,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            tree: ContentTree::new(&file_name),
            file_name,
            title: title.into(),
            content,
            store,
            policy: WritePolicy::default(),
            tally: WriteTally::default(),
        }
    }

    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn type_name(&self) -> &str {
        "StoreWriter"
    }

    pub fn outputs(&self) -> &[TerminalDescriptor] {
        &[]
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    /// Artifacts handed to the store in the current or last run. Registered
    /// artifacts are counted once per generation, not once per stored copy.
    pub fn tally(&self) -> WriteTally {
        self.tally
    }

    /// Build the content tree from the configured content and resolve it.
    ///
    /// Node references expand to the outputs their nodes declare at this
    /// point, so the writer may be declared before the nodes it stores.
    pub fn connect_inputs(&mut self, ctx: &mut NodeContext) -> Result<()> {
        if self.tree.root().inputs_connected() {
            return Err(PipeStoreError::State(format!(
                "Inputs of store file \"{}\" are already connected",
                self.file_name
            )));
        }
        let mut tree = ContentTree::new(&self.file_name);
        tree.add_content(GroupId::ROOT, &self.content, ctx.graph, ctx.node)?;
        tree.connect_inputs(GroupId::ROOT, ctx.graph, ctx.node)?;
        self.tree = tree;
        Ok(())
    }

    pub fn dependencies(&self) -> Vec<NodeId> {
        self.tree
            .dependencies(GroupId::ROOT)
            .iter()
            .copied()
            .collect()
    }

    pub fn open_output(&mut self, _ctx: &mut NodeContext) -> Result<()> {
        self.tally = WriteTally::default();
        self.tree
            .open_output(GroupId::ROOT, self.store.as_mut(), &self.title)
    }

    /// Write changed artifacts. Produces no outputs of its own.
    pub fn process_input(&mut self, ctx: &mut NodeContext) -> Result<bool> {
        self.tally +=
            self.tree
                .process_input(GroupId::ROOT, ctx.graph, self.store.as_mut(), &self.policy)?;
        Ok(false)
    }

    pub fn close_output(&mut self, _ctx: &mut NodeContext) -> Result<()> {
        self.tree.close_output(GroupId::ROOT, self.store.as_mut())?;
        tracing::info!(
            "Store file \"{}\" closed, {} artifacts written, {} registrations",
            self.file_name,
            self.tally.explicit,
            self.tally.registered
        );
        Ok(())
    }
}
