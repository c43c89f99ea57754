use tracing::{debug, error};

use crate::add_move::AddMove;
use crate::config::OperatorConfig;
use crate::error::{ArgError, Result};
use crate::flags::OperatorOptions;
use crate::graph::{Graph, ParentSlot};
use crate::heights::{EventHeights, HeightProposal};
use crate::parameters::NodeParameterContainers;
use crate::partition::{PartitionSampler, Partitioning};
use crate::random::RandomSource;
use crate::remove_move::RemoveMove;
use crate::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Add,
    Remove,
}

/// Why a move left the graph unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Removal was chosen but no event qualifies.
    NoEventToRemove,
    /// An event above the root was drawn while root moves are disabled.
    RootMoveDisallowed,
    /// A proposed height coincides with an existing node height.
    NoAttachmentPoint,
    /// The height proposal gives zero density to re-adding the event.
    ZeroReverseDensity,
    /// The partition sampler cannot produce the partitioning of the
    /// event chosen for removal.
    ZeroPartitionProbability,
}

/// The event added or removed by a move.
///
/// For removals, node numbers refer to the graph before removal.
#[derive(Debug, Clone, PartialEq)]
pub struct ReassortmentEvent {
    pub bifurcation: Node,
    pub reassortment: Node,
    /// The reassortment node's parent slot leading to `bifurcation`.
    pub bifurcation_slot: ParentSlot,
    pub heights: EventHeights,
    pub partitioning: Partitioning,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Performed {
        kind: MoveKind,
        log_hastings_ratio: f64,
        event: ReassortmentEvent,
    },
    Rejected {
        kind: MoveKind,
        reason: RejectReason,
    },
}

impl MoveOutcome {
    pub fn kind(&self) -> MoveKind {
        match self {
            MoveOutcome::Performed { kind, .. } | MoveOutcome::Rejected { kind, .. } => *kind,
        }
    }

    /// Negative infinity for rejected moves.
    pub fn log_hastings_ratio(&self) -> f64 {
        match self {
            MoveOutcome::Performed {
                log_hastings_ratio, ..
            } => *log_hastings_ratio,
            MoveOutcome::Rejected { .. } => f64::NEG_INFINITY,
        }
    }

    pub fn is_performed(&self) -> bool {
        matches!(self, MoveOutcome::Performed { .. })
    }

    pub fn event(&self) -> Option<&ReassortmentEvent> {
        match self {
            MoveOutcome::Performed { event, .. } => Some(event),
            MoveOutcome::Rejected { .. } => None,
        }
    }
}

const TARGET_ACCEPTANCE: f64 = 0.5;
const MIN_GOOD_ACCEPTANCE: f64 = 0.1;
const MAX_GOOD_ACCEPTANCE: f64 = 0.4;

/// Reversible-jump operator adding or removing one reassortment event.
///
/// The add/remove choice is tuned through a coercible parameter
/// `size = logit(add_probability)`. The returned log Hastings ratio
/// already includes the log ratio of the two choice probabilities.
#[derive(Debug)]
pub struct ReassortmentEventOperator {
    size: f64,
    weight: u32,
    options: OperatorOptions,
    height_proposal: Box<dyn HeightProposal>,
    partition_sampler: Box<dyn PartitionSampler>,
}

impl ReassortmentEventOperator {
    pub fn new(
        add_probability: f64,
        options: OperatorOptions,
        height_proposal: Box<dyn HeightProposal>,
        partition_sampler: Box<dyn PartitionSampler>,
    ) -> Result<Self> {
        if !(add_probability > 0.0 && add_probability < 1.0) {
            return Err(ArgError::InvalidConfig(format!(
                "add probability must lie strictly between 0 and 1, got {add_probability}"
            )));
        }
        if !options.root_moves_ok() && height_proposal.places_mass_above_root() {
            debug!("root moves disabled; event heights drawn above the root will be rejected");
        }
        Ok(Self {
            size: logit(add_probability),
            weight: 1,
            options,
            height_proposal,
            partition_sampler,
        })
    }

    pub fn from_config(config: &OperatorConfig) -> Result<Self> {
        config.validate()?;
        let mut operator = Self::new(
            config.add_probability,
            config.options(),
            config.height_proposal.build(),
            config.partition_sampler.build(),
        )?;
        operator.weight = config.weight;
        Ok(operator)
    }

    pub fn add_move(&self) -> AddMove<'_> {
        AddMove {
            heights: self.height_proposal.as_ref(),
            partitions: self.partition_sampler.as_ref(),
            options: self.options,
        }
    }

    pub fn remove_move(&self) -> RemoveMove<'_> {
        RemoveMove {
            heights: self.height_proposal.as_ref(),
            partitions: self.partition_sampler.as_ref(),
            options: self.options,
        }
    }

    /// Propose adding (with probability [`Self::add_probability`]) or
    /// removing one event, editing `graph` and `containers` in place.
    ///
    /// # Errors
    ///
    /// Any error means the graph bookkeeping is broken and the chain
    /// should stop.
    pub fn perform_move(
        &self,
        graph: &mut Graph,
        containers: &mut NodeParameterContainers,
        rng: &mut dyn RandomSource,
    ) -> Result<MoveOutcome> {
        let outcome = if rng.uniform() < self.add_probability() {
            let mut outcome = self.add_move().apply(graph, containers, rng)?;
            adjust_ratio(&mut outcome, -self.size);
            outcome
        } else {
            let mut outcome = self.remove_move().apply(graph, containers, rng)?;
            adjust_ratio(&mut outcome, self.size);
            outcome
        };
        if let MoveOutcome::Performed {
            kind,
            log_hastings_ratio,
            ref event,
        } = outcome
        {
            if !log_hastings_ratio.is_finite() {
                error!(?kind, log_hastings_ratio, "degenerate hastings ratio");
                return Err(ArgError::Degenerate {
                    kind,
                    value: log_hastings_ratio,
                });
            }
            if self.options.check_nodes() && !graph.node_check() {
                let reason = graph
                    .find_node_defect()
                    .unwrap_or_else(|| "node check failed".to_string());
                return Err(ArgError::Structural {
                    reason,
                    summary: graph.to_string(),
                });
            }
            debug!(
                ?kind,
                bifurcation = event.bifurcation.number(),
                reassortment = event.reassortment.number(),
                log_hastings_ratio,
                nodes = graph.node_count(),
                "performed reassortment move"
            );
        } else {
            debug!(?outcome, "rejected reassortment move");
        }
        Ok(outcome)
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn options(&self) -> OperatorOptions {
        self.options
    }

    pub fn add_probability(&self) -> f64 {
        1.0 / (1.0 + (-self.size).exp())
    }

    /// The coercible parameter, `logit(add_probability)`.
    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn set_size(&mut self, size: f64) {
        self.size = size;
    }

    pub fn target_acceptance_probability(&self) -> f64 {
        TARGET_ACCEPTANCE
    }

    /// Advice for a user whose chain shows the given acceptance rate.
    pub fn performance_suggestion(&self, acceptance: f64) -> Option<String> {
        if acceptance < MIN_GOOD_ACCEPTANCE || acceptance > MAX_GOOD_ACCEPTANCE {
            Some(format!(
                "Try setting add_probability closer to 0.5 (currently {:.3})",
                self.add_probability()
            ))
        } else {
            None
        }
    }
}

fn adjust_ratio(outcome: &mut MoveOutcome, delta: f64) {
    if let MoveOutcome::Performed {
        log_hastings_ratio, ..
    } = outcome
    {
        *log_hastings_ratio += delta;
    }
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}
