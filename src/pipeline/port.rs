//! Terminal descriptors for the node system.
//!
//! Each node declares its output terminals via `TerminalDescriptor`s.
//! The graph uses them to create the terminal slots that hold values,
//! and consumers use the declared kind for capability checks.

use crate::artifact::ValueKind;

/// Whether a terminal is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// Descriptor for a node's terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalDescriptor {
    pub name: String,
    pub direction: PortDirection,
    pub kind: ValueKind,
}

impl TerminalDescriptor {
    pub fn input(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
            kind,
        }
    }

    pub fn output(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
            kind,
        }
    }
}
