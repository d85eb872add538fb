//! Logical record streams spanning several segments.
//!
//! Segments are concatenated in the order given. Record `i` of the stream is
//! found by binary search over the segment start offsets. Columns can be
//! switched off individually; only enabled, bound columns are loaded.

use super::segment::{ColumnDef, Segment};
use crate::artifact::{ScalarType, Value};
use crate::error::{PipeStoreError, Result};
use crate::pipeline::graph::Terminal;
use std::path::PathBuf;

/// Column-to-terminal binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnBinding {
    column: usize,
    terminal: usize,
    kind: ScalarType,
}

#[derive(Debug, Clone)]
pub struct SegmentedStream {
    name: String,
    columns: Vec<ColumnDef>,
    segments: Vec<Segment>,
    /// First record index of each segment.
    starts: Vec<usize>,
    total: usize,
    enabled: Vec<bool>,
    bindings: Vec<ColumnBinding>,
}

impl SegmentedStream {
    /// Open a stream from segment files; the first path is the primary segment.
    pub fn open(name: &str, paths: &[PathBuf]) -> Result<Self> {
        if paths.is_empty() {
            return Err(PipeStoreError::Config(format!(
                "Stream \"{}\" has no segments",
                name
            )));
        }
        let segments = paths
            .iter()
            .map(|p| Segment::load(p))
            .collect::<Result<Vec<_>>>()?;
        Self::from_segments(name, segments)
    }

    pub fn from_segments(name: &str, segments: Vec<Segment>) -> Result<Self> {
        let Some(primary) = segments.first() else {
            return Err(PipeStoreError::Config(format!(
                "Stream \"{}\" has no segments",
                name
            )));
        };
        let columns = primary.columns.clone();

        let mut starts = Vec::with_capacity(segments.len());
        let mut total = 0;
        for (i, segment) in segments.iter().enumerate() {
            if segment.stream != name {
                return Err(PipeStoreError::Config(format!(
                    "Segment {} holds stream \"{}\", expected \"{}\"",
                    i, segment.stream, name
                )));
            }
            if segment.columns != columns {
                return Err(PipeStoreError::Config(format!(
                    "Segment {} of stream \"{}\" has a different column layout than the primary segment",
                    i, name
                )));
            }
            starts.push(total);
            total += segment.len();
        }

        Ok(Self {
            name: name.to_string(),
            enabled: vec![true; columns.len()],
            columns,
            segments,
            starts,
            total,
            bindings: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of records across all segments.
    pub fn entries(&self) -> usize {
        self.total
    }

    pub fn set_all_columns_enabled(&mut self, enabled: bool) {
        self.enabled.iter_mut().for_each(|e| *e = enabled);
    }

    pub fn set_column_enabled(&mut self, column: &str, enabled: bool) -> Result<()> {
        let index = self.column_index(column)?;
        self.enabled[index] = enabled;
        Ok(())
    }

    pub fn is_column_enabled(&self, column: &str) -> bool {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .map(|i| self.enabled[i])
            .unwrap_or(false)
    }

    /// Bind `column` to output terminal `terminal` and enable it.
    ///
    /// `expected` is the terminal's declared type; an integer column may feed
    /// a float terminal, any other difference is rejected.
    pub fn bind(&mut self, column: &str, terminal: usize, expected: ScalarType) -> Result<()> {
        let index = self.column_index(column)?;
        let found = self.columns[index].kind;
        let compatible = found == expected || (found == ScalarType::Int && expected == ScalarType::Float);
        if !compatible {
            return Err(PipeStoreError::Config(format!(
                "Column \"{}\" of stream \"{}\" is {}, but terminal expects {}",
                column,
                self.name,
                found.display_name(),
                expected.display_name()
            )));
        }
        if self.bindings.iter().any(|b| b.terminal == terminal) {
            return Err(PipeStoreError::Config(format!(
                "Terminal {} of stream \"{}\" is bound twice",
                terminal, self.name
            )));
        }
        self.bindings.push(ColumnBinding {
            column: index,
            terminal,
            kind: expected,
        });
        self.enabled[index] = true;
        Ok(())
    }

    /// Copy record `index` into the bound terminals.
    pub fn load(&self, index: usize, terminals: &mut [Terminal]) -> Result<()> {
        if index >= self.total {
            return Err(PipeStoreError::State(format!(
                "Record {} is out of range for stream \"{}\" ({} records)",
                index, self.name, self.total
            )));
        }
        // Empty segments share their start with the next one; take the last match
        let segment = self.starts.partition_point(|&start| start <= index) - 1;
        let record = &self.segments[segment].records[index - self.starts[segment]];

        for binding in self.bindings.iter().filter(|b| self.enabled[b.column]) {
            let terminal = terminals.get_mut(binding.terminal).ok_or_else(|| {
                PipeStoreError::State(format!(
                    "No terminal {} to load column \"{}\" into",
                    binding.terminal, self.columns[binding.column].name
                ))
            })?;
            // Values were coerced to the column type on load, so only widening remains
            let value = record[binding.column]
                .clone()
                .coerce(binding.kind)
                .ok_or_else(|| {
                    PipeStoreError::Config(format!(
                        "Column \"{}\" cannot be loaded as {}",
                        self.columns[binding.column].name,
                        binding.kind.display_name()
                    ))
                })?;
            terminal.value = Value::Scalar(value);
        }
        Ok(())
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| {
                PipeStoreError::Config(format!(
                    "Stream \"{}\" has no column \"{}\"",
                    self.name, column
                ))
            })
    }
}
