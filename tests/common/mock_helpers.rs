//! Plugin nodes for driving pipelines in tests

use pipestore::artifact::NamedObject;
use pipestore::pipeline::{NodeContext, NodePlugin, NodeRole, TerminalDescriptor};
use pipestore::{Result, Scalar, ValueKind};

/// Source producing one named object per output for a fixed number of generations.
///
/// Each object carries the generation it was produced in as its `generation`
/// attribute.
pub struct ObjectEmitter {
    outputs: Vec<TerminalDescriptor>,
    generations: u32,
    remaining: u32,
}

impl ObjectEmitter {
    pub fn new(outputs: &[&str], generations: u32) -> Self {
        Self {
            outputs: outputs
                .iter()
                .map(|name| TerminalDescriptor::output(*name, ValueKind::Object))
                .collect(),
            generations,
            remaining: 0,
        }
    }
}

impl NodePlugin for ObjectEmitter {
    fn type_name(&self) -> &str {
        "ObjectEmitter"
    }

    fn outputs(&self) -> &[TerminalDescriptor] {
        &self.outputs
    }

    fn role(&self) -> NodeRole {
        NodeRole::Source
    }

    fn process_input(&mut self, _ctx: &mut NodeContext) -> Result<bool> {
        self.remaining = self.generations;
        Ok(false)
    }

    fn next_output(&mut self, ctx: &mut NodeContext) -> Result<bool> {
        if self.remaining == 0 {
            return Ok(false);
        }
        self.remaining -= 1;
        for (terminal, desc) in ctx.outputs.iter_mut().zip(&self.outputs) {
            terminal.value = NamedObject::new(desc.name.clone(), "")
                .with_attribute("generation", Scalar::Int(ctx.generation as i64))
                .into();
        }
        Ok(true)
    }
}

/// Source whose single object output is declared with an empty name.
pub fn unnamed_emitter() -> UnnamedEmitter {
    UnnamedEmitter {
        outputs: vec![TerminalDescriptor::output("obj", ValueKind::Object)],
        done: false,
    }
}

pub struct UnnamedEmitter {
    outputs: Vec<TerminalDescriptor>,
    done: bool,
}

impl NodePlugin for UnnamedEmitter {
    fn type_name(&self) -> &str {
        "UnnamedEmitter"
    }

    fn outputs(&self) -> &[TerminalDescriptor] {
        &self.outputs
    }

    fn role(&self) -> NodeRole {
        NodeRole::Source
    }

    fn process_input(&mut self, _ctx: &mut NodeContext) -> Result<bool> {
        self.done = false;
        Ok(false)
    }

    fn next_output(&mut self, ctx: &mut NodeContext) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        self.done = true;
        ctx.outputs[0].value = NamedObject::new("", "").into();
        Ok(true)
    }
}
