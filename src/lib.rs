//! Reversible-jump MCMC moves that add or remove reassortment
//! events on an ancestral recombination graph (ARG).
//!
//! A reassortment event is a new bifurcation joined by a fresh edge
//! to a new reassortment node lower down. [`AddMove`] inserts one,
//! [`RemoveMove`] deletes one, and [`ReassortmentEventOperator`]
//! chooses between them and reports the log Hastings ratio of the
//! proposal. Acceptance is left to the caller.
//!
//! All topology edits go through [`GraphEdit`], which validates the
//! graph on commit. Per-node parameter vectors are kept aligned with
//! node numbers by [`NodeParameterContainers`].

use nohash::BuildNoHashHasher;
use std::collections::HashSet;

mod add_move;
mod builder;
mod config;
mod edit;
mod error;
mod flags;
mod graph;
mod heights;
mod locator;
mod operator;
mod parameters;
mod partition;
mod random;
mod remove_move;

#[cfg(test)]
mod graph_fixtures;

pub use add_move::AddMove;
pub use builder::GraphBuilder;
pub use config::{HeightProposalConfig, OperatorConfig, PartitionSamplerConfig};
pub use edit::GraphEdit;
pub use error::{ArgError, Result};
pub use flags::OperatorOptions;
pub use graph::{Graph, NodeKind, ParentSlot};
pub use heights::{AboveRootMixture, EventHeights, ExponentialHeights, HeightProposal};
pub use locator::{
    attachment_points, eligible_parent_slots, find_potential_attachment_points,
    find_potential_nodes_to_remove, removable_via, AttachmentPoint,
};
pub use operator::{MoveKind, MoveOutcome, ReassortmentEvent, ReassortmentEventOperator, RejectReason};
pub use parameters::{NodeParameterContainers, NodeParameters};
pub use partition::{PartitionSampler, Partitioning, ReassortmentPartitions, RecombinationPartitions};
pub use random::{RandomSource, RngSource, ScriptedSource};

/// A node number.
///
/// Numbers are dense: a graph with `n` nodes uses exactly `0..n`.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct Node(usize);

impl Node {
    pub fn number(&self) -> usize {
        self.0
    }

    #[inline(always)]
    fn as_index(&self) -> usize {
        self.0
    }

    #[inline(always)]
    fn sentinel() -> Self {
        Self(usize::MAX)
    }

    #[inline(always)]
    fn is_sentinel(&self) -> bool {
        self.0 == usize::MAX
    }

    #[inline(always)]
    fn into_option(self) -> Option<Self> {
        if self.is_sentinel() {
            None
        } else {
            Some(self)
        }
    }
}

type NodeHash = HashSet<Node, BuildNoHashHasher<usize>>;
