//! Tabular artifact: named columns and rows of scalars.

use super::{Nameable, Scalar};
use crate::error::{PipeStoreError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    title: String,
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl Table {
    pub fn new<I, S>(name: impl Into<String>, title: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            title: title.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. The row must have one value per column.
    pub fn push_row(&mut self, row: Vec<Scalar>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipeStoreError::Config(format!(
                "Row with {} values doesn't fit table \"{}\" with {} columns",
                row.len(),
                self.name,
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Nameable for Table {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row() {
        let mut table = Table::new("events", "Selected events", ["id", "energy"]);
        table
            .push_row(vec![Scalar::Int(1), Scalar::Float(12.5)])
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns(), &["id", "energy"]);
    }

    #[test]
    fn test_push_row_width_mismatch() {
        let mut table = Table::new("events", "", ["id"]);
        let err = table
            .push_row(vec![Scalar::Int(1), Scalar::Int(2)])
            .unwrap_err();
        assert!(err.is_config());
        assert!(table.is_empty());
    }
}
