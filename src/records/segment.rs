//! Physical record segments.
//!
//! A segment is one JSON document holding part of a named record stream:
//!
//! ```json
//! {
//!   "stream": "events",
//!   "columns": [{ "name": "energy", "type": "float" }, { "name": "id", "type": "int" }],
//!   "records": [[12.5, 1], [3.0, 2]]
//! }
//! ```

use crate::artifact::{Scalar, ScalarType};
use crate::error::{PipeStoreError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name and type of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ScalarType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub stream: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub records: Vec<Vec<Scalar>>,
}

impl Segment {
    pub fn new(stream: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            stream: stream.into(),
            columns,
            records: Vec::new(),
        }
    }

    /// Load and validate a segment file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| PipeStoreError::Resource {
            resource: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut segment: Segment = serde_json::from_str::<Segment>(&json)
            .map_err(PipeStoreError::from)
            .with_context(|| format!("Failed to parse segment {:?}", path))?;
        segment
            .normalize()
            .with_context(|| format!("Invalid segment {:?}", path))?;
        Ok(segment)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Append a record, coercing values to the column types.
    pub fn push_record(&mut self, record: Vec<Scalar>) -> Result<()> {
        let record = self.coerce_record(self.records.len(), record)?;
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Check record widths and coerce every value to its column type.
    pub fn normalize(&mut self) -> Result<()> {
        let records = std::mem::take(&mut self.records);
        self.records = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| self.coerce_record(i, record))
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    fn coerce_record(&self, index: usize, record: Vec<Scalar>) -> Result<Vec<Scalar>> {
        if record.len() != self.columns.len() {
            return Err(PipeStoreError::Config(format!(
                "Record {} of stream \"{}\" has {} values, expected {}",
                index,
                self.stream,
                record.len(),
                self.columns.len()
            )));
        }
        record
            .into_iter()
            .zip(&self.columns)
            .map(|(value, column)| {
                let found = value.scalar_type();
                value.coerce(column.kind).ok_or_else(|| {
                    PipeStoreError::Config(format!(
                        "Record {} of stream \"{}\": column \"{}\" expects {}, found {}",
                        index,
                        self.stream,
                        column.name,
                        column.kind.display_name(),
                        found.display_name()
                    ))
                })
            })
            .collect()
    }
}
