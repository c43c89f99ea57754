use thiserror::Error;

use crate::operator::MoveKind;
use crate::Node;

/// Errors raised by graph construction and by the add/remove moves.
///
/// Everything except [`ArgError::InvalidConfig`] and [`ArgError::InvalidGraph`]
/// indicates a defect in move bookkeeping and should terminate the chain.
/// Routine "nothing to do" outcomes are not errors, see
/// [`crate::MoveOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum ArgError {
    #[error("invalid operator configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid initial graph: {0}")]
    InvalidGraph(String),

    /// A low-level edit was asked to do something its precondition forbids.
    #[error("{op}: precondition violated for parent {parent:?}, child {child:?}\n{summary}")]
    Primitive {
        op: &'static str,
        parent: Node,
        child: Node,
        summary: String,
    },

    /// The graph failed validation when an edit was committed.
    #[error("structural failure: {reason}\n{summary}")]
    Structural { reason: String, summary: String },

    #[error("parameter containers out of sync with graph: {0}")]
    Containers(String),

    #[error("degenerate log hastings ratio {value} from {kind:?} move")]
    Degenerate { kind: MoveKind, value: f64 },
}

pub type Result<T> = std::result::Result<T, ArgError>;
