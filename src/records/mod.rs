//! Segmented record streams.
//!
//! A logical stream is made of one or more [`Segment`]s that share a name and
//! a column layout. [`SegmentedStream`] presents them as one indexable
//! sequence of records and copies selected columns into output terminals.

pub mod segment;
pub mod stream;

pub use segment::{ColumnDef, Segment};
pub use stream::SegmentedStream;

use crate::error::Result;
use std::path::PathBuf;

/// Where a cursor source gets its segments from.
#[derive(Debug, Clone)]
pub enum SegmentSource {
    /// Segment files, primary first.
    Files(Vec<PathBuf>),
    /// Segments already in memory.
    Memory(Vec<Segment>),
}

impl SegmentSource {
    /// Open the logical stream `name` over these segments.
    pub fn open(&self, name: &str) -> Result<SegmentedStream> {
        match self {
            SegmentSource::Files(paths) => SegmentedStream::open(name, paths),
            SegmentSource::Memory(segments) => SegmentedStream::from_segments(name, segments.clone()),
        }
    }

    pub fn segment_count(&self) -> usize {
        match self {
            SegmentSource::Files(paths) => paths.len(),
            SegmentSource::Memory(segments) => segments.len(),
        }
    }
}
