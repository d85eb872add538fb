//! Identity types for the pipeline system.
//!
//! All IDs are newtypes over `u32` that serve as direct array indices
//! into their respective arenas, providing O(1) lookup.

use std::fmt;

/// Index into the pipeline graph's node slots.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "NodeId(INVALID)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Compact output terminal identifier. High 20 bits = node index, low 12 bits = terminal index.
/// Supports up to ~1M nodes with 4096 outputs each.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TerminalId(pub u32);

impl TerminalId {
    const TERMINAL_BITS: u32 = 12;
    const TERMINAL_MASK: u32 = (1 << Self::TERMINAL_BITS) - 1;

    /// Largest number of outputs a single node may declare.
    pub const MAX_TERMINALS: usize = 1 << Self::TERMINAL_BITS;

    pub fn new(node: NodeId, terminal_index: u16) -> Self {
        debug_assert!((terminal_index as usize) < Self::MAX_TERMINALS);
        Self((node.0 << Self::TERMINAL_BITS) | (terminal_index as u32 & Self::TERMINAL_MASK))
    }

    #[inline]
    pub fn node(self) -> NodeId {
        NodeId(self.0 >> Self::TERMINAL_BITS)
    }

    #[inline]
    pub fn terminal_index(self) -> u16 {
        (self.0 & Self::TERMINAL_MASK) as u16
    }
}

impl fmt::Debug for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TerminalId(node={}, terminal={})",
            self.node().0,
            self.terminal_index()
        )
    }
}

/// Index into a `ContentTree`'s group arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GroupId(pub u32);

impl GroupId {
    /// The root group of every content tree.
    pub const ROOT: GroupId = GroupId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId(42);
        assert!(id.is_valid());
        assert_eq!(id.index(), 42);
        assert!(!NodeId::INVALID.is_valid());
    }

    #[test]
    fn test_terminal_id_round_trip() {
        let node = NodeId(100);
        let terminal = TerminalId::new(node, 7);
        assert_eq!(terminal.node(), node);
        assert_eq!(terminal.terminal_index(), 7);
    }

    #[test]
    fn test_terminal_id_limits() {
        let node = NodeId((1 << 20) - 1); // Max node
        let terminal = TerminalId::new(node, 4095); // Max terminal
        assert_eq!(terminal.node(), node);
        assert_eq!(terminal.terminal_index(), 4095);
    }

    #[test]
    fn test_group_id_root() {
        assert!(GroupId::ROOT.is_root());
        assert!(!GroupId(3).is_root());
        assert_eq!(GroupId(3).index(), 3);
    }
}
