//! Built-in pipeline node implementations.

pub mod content_tree;
pub mod cursor_source;
pub mod histogram_fill;
pub mod store_writer;

pub use content_tree::{
    BoundInput, ContentGroup, ContentTree, HandleOwnership, SourceInfo, WriteTally,
};
pub use cursor_source::{CursorSourceNode, CursorState};
pub use histogram_fill::{HistogramFillNode, HISTOGRAM_OUTPUT};
pub use store_writer::StoreWriterNode;
