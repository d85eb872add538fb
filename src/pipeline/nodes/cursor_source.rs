//! CursorSource node: serves records of a segmented stream one at a time.
//!
//! Each declared output terminal is bound to the column of the same name.
//! `process_input` (re)opens the stream and rewinds the cursor to before the
//! first record; every `next_output` loads the following record into the
//! terminals until the stream is exhausted.

use crate::artifact::ValueKind;
use crate::error::{PipeStoreError, Result};
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::TerminalDescriptor;
use crate::records::{ColumnDef, SegmentSource, SegmentedStream};

/// Cursor position relative to the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Unopened,
    /// Opened, before the first record.
    Open,
    /// Positioned on a record.
    Iterating,
    /// Past the last record.
    Exhausted,
}

pub struct CursorSourceNode {
    stream_name: String,
    source: SegmentSource,
    outputs: Vec<TerminalDescriptor>,
    stream: Option<SegmentedStream>,
    /// -1 before the first record, `size` once exhausted.
    index: i64,
    size: i64,
}

impl CursorSourceNode {
    pub fn new(stream_name: impl Into<String>, source: SegmentSource, columns: &[ColumnDef]) -> Self {
        Self {
            stream_name: stream_name.into(),
            source,
            outputs: columns
                .iter()
                .map(|c| TerminalDescriptor::output(c.name.clone(), ValueKind::Scalar(c.kind)))
                .collect(),
            stream: None,
            index: -1,
            size: 0,
        }
    }

    pub fn type_name(&self) -> &str {
        "CursorSource"
    }

    pub fn outputs(&self) -> &[TerminalDescriptor] {
        &self.outputs
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Current record index, -1 before the first record.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Number of records in the opened stream.
    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn state(&self) -> CursorState {
        if self.stream.is_none() {
            CursorState::Unopened
        } else if self.index < 0 {
            CursorState::Open
        } else if self.index < self.size {
            CursorState::Iterating
        } else {
            CursorState::Exhausted
        }
    }

    /// Open the stream, bind every output to its column and rewind.
    pub fn process_input(&mut self, _ctx: &mut NodeContext) -> Result<bool> {
        let mut stream = self.source.open(&self.stream_name)?;
        stream.set_all_columns_enabled(false);
        for (i, output) in self.outputs.iter().enumerate() {
            let ValueKind::Scalar(kind) = output.kind else {
                return Err(PipeStoreError::Config(format!(
                    "Output \"{}\" of stream \"{}\" must be a scalar",
                    output.name, self.stream_name
                )));
            };
            stream.bind(&output.name, i, kind)?;
        }

        self.size = stream.entries() as i64;
        self.index = -1;
        tracing::debug!(
            "Opened stream \"{}\": {} records in {} segments",
            self.stream_name,
            self.size,
            stream.segment_count()
        );
        self.stream = Some(stream);
        Ok(false)
    }

    /// Load the next record. Returns false once the stream is exhausted.
    pub fn next_output(&mut self, ctx: &mut NodeContext) -> Result<bool> {
        let stream = self.stream.as_ref().ok_or_else(|| {
            PipeStoreError::State(format!(
                "Cursor on stream \"{}\" advanced before opening",
                self.stream_name
            ))
        })?;
        let next = self.index + 1;
        if next < self.size {
            stream.load(next as usize, ctx.outputs)?;
            self.index = next;
            Ok(true)
        } else {
            self.index = self.size;
            Ok(false)
        }
    }
}
