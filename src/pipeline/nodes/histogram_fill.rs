//! HistogramFill node: fills a histogram from a numeric terminal.
//!
//! The input is resolved relative to the node's siblings. The histogram is
//! filled once for every advance of the input node's generation and starts
//! empty at every run.

use crate::artifact::{Histogram, Nameable, Value, ValueKind};
use crate::error::{PipeStoreError, Result};
use crate::pipeline::graph::Component;
use crate::pipeline::id::{NodeId, TerminalId};
use crate::pipeline::node::NodeContext;
use crate::pipeline::path::HierPath;
use crate::pipeline::port::TerminalDescriptor;

/// Name of the single output terminal.
pub const HISTOGRAM_OUTPUT: &str = "hist";

pub struct HistogramFillNode {
    input: HierPath,
    template: Histogram,
    outputs: Vec<TerminalDescriptor>,
    bound: Option<TerminalId>,
    last_seen: u64,
}

impl HistogramFillNode {
    /// `template` gives the binning and the name the histogram is stored under.
    pub fn new(input: impl Into<HierPath>, template: Histogram) -> Self {
        Self {
            input: input.into(),
            template,
            outputs: vec![TerminalDescriptor::output(
                HISTOGRAM_OUTPUT,
                ValueKind::Histogram,
            )],
            bound: None,
            last_seen: 0,
        }
    }

    pub fn type_name(&self) -> &str {
        "HistogramFill"
    }

    pub fn outputs(&self) -> &[TerminalDescriptor] {
        &self.outputs
    }

    pub fn input(&self) -> &HierPath {
        &self.input
    }

    pub fn connect_inputs(&mut self, ctx: &mut NodeContext) -> Result<()> {
        let terminal = match ctx.graph.resolve_rel_to_siblings(ctx.node, &self.input)? {
            Component::Terminal(t) => t,
            Component::Node(_) => {
                return Err(PipeStoreError::Config(format!(
                    "Histogram input \"{}\" must name a terminal",
                    self.input
                )))
            }
        };
        let numeric = matches!(
            ctx.graph.terminal(terminal).map(|t| t.kind),
            Some(ValueKind::Scalar(s)) if s.is_numeric()
        );
        if !numeric {
            return Err(PipeStoreError::Config(format!(
                "Histogram input \"{}\" is not a numeric scalar",
                ctx.graph.terminal_path(terminal)
            )));
        }
        self.bound = Some(terminal);
        Ok(())
    }

    pub fn dependencies(&self) -> Vec<NodeId> {
        self.bound.map(|t| t.node()).into_iter().collect()
    }

    pub fn open_output(&mut self, ctx: &mut NodeContext) -> Result<()> {
        let mut hist = self.template.clone();
        hist.reset();
        let output = ctx
            .outputs
            .first_mut()
            .ok_or_else(|| PipeStoreError::State("Histogram output is missing".to_string()))?;
        output.value = hist.into();
        self.last_seen = 0;
        Ok(())
    }

    /// Fill from the input if its producer advanced. Returns true if filled.
    pub fn process_input(&mut self, ctx: &mut NodeContext) -> Result<bool> {
        let terminal = self.bound.ok_or_else(|| {
            PipeStoreError::State(format!("Histogram input \"{}\" is not connected", self.input))
        })?;
        let current = ctx.graph.output_counter(terminal.node());
        if current <= self.last_seen {
            return Ok(false);
        }
        self.last_seen = current;

        let Some(x) = ctx
            .graph
            .terminal(terminal)
            .and_then(|t| t.value.as_scalar())
            .and_then(|s| s.as_f64())
        else {
            return Ok(false);
        };
        match ctx.outputs.first_mut().map(|t| &mut t.value) {
            Some(Value::Histogram(hist)) => {
                hist.fill(x);
                Ok(true)
            }
            _ => Err(PipeStoreError::State(format!(
                "Histogram \"{}\" is not open",
                self.template.name()
            ))),
        }
    }
}
