//! Test data builders for creating test objects

use pipestore::{ColumnDef, Scalar, ScalarType, Segment};
use std::path::Path;

/// Builder for creating test Segments
pub struct SegmentBuilder {
    stream: String,
    columns: Vec<ColumnDef>,
    records: Vec<Vec<Scalar>>,
}

impl SegmentBuilder {
    pub fn new(stream: &str) -> Self {
        Self {
            stream: stream.to_string(),
            columns: Vec::new(),
            records: Vec::new(),
        }
    }

    /// `id: int, energy: float` segment of the shared test stream
    pub fn events() -> Self {
        Self::new(super::STREAM)
            .column("id", ScalarType::Int)
            .column("energy", ScalarType::Float)
    }

    pub fn column(mut self, name: &str, kind: ScalarType) -> Self {
        self.columns.push(ColumnDef::new(name, kind));
        self
    }

    pub fn record(mut self, record: Vec<Scalar>) -> Self {
        self.records.push(record);
        self
    }

    pub fn event(self, id: i64, energy: f64) -> Self {
        self.record(vec![Scalar::Int(id), Scalar::Float(energy)])
    }

    pub fn build(self) -> Segment {
        let mut segment = Segment::new(self.stream, self.columns);
        for record in self.records {
            segment.push_record(record).unwrap();
        }
        segment
    }

    pub fn write_to(self, path: &Path) {
        self.build().save(path).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_builder() {
        let segment = SegmentBuilder::events().event(0, 1.5).event(1, 2.5).build();

        assert_eq!(segment.stream, "events");
        assert_eq!(segment.len(), 2);
        assert_eq!(segment.column_index("energy"), Some(1));
    }
}
