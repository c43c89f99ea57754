// This module encapsulates the bitflags API
// so that we don't leak details that may
// affect semver later on.

use bitflags::bitflags;

bitflags! {
    #[repr(transparent)]
    #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
    struct OperatorBitFlags: u32 {
        const EMPTY = 0;
        const ROOT_MOVES_OK = 1 << 1;
        const CHECK_NODES = 1 << 2;
    }
}

/// Behavioural switches for [`crate::ReassortmentEventOperator`].
#[repr(transparent)]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct OperatorOptions(OperatorBitFlags);

impl OperatorOptions {
    /// Allow events above the current root, and the removal
    /// of events whose bifurcation is the root.
    pub fn with_root_moves(self) -> Self {
        Self(self.0 | OperatorBitFlags::ROOT_MOVES_OK)
    }

    /// Re-run the full node check after every performed move.
    pub fn with_node_checks(self) -> Self {
        Self(self.0 | OperatorBitFlags::CHECK_NODES)
    }

    pub fn root_moves_ok(&self) -> bool {
        self.0.contains(OperatorBitFlags::ROOT_MOVES_OK)
    }

    pub fn check_nodes(&self) -> bool {
        self.0.contains(OperatorBitFlags::CHECK_NODES)
    }
}
