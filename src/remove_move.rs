use std::f64::consts::LN_2;

use tracing::trace;

use crate::error::{ArgError, Result};
use crate::flags::OperatorOptions;
use crate::graph::Graph;
use crate::heights::{EventHeights, HeightProposal};
use crate::locator::{
    eligible_parent_slots, find_potential_attachment_points, find_potential_nodes_to_remove,
    successor_root,
};
use crate::operator::{MoveKind, MoveOutcome, ReassortmentEvent, RejectReason};
use crate::parameters::NodeParameterContainers;
use crate::partition::PartitionSampler;
use crate::random::RandomSource;

/// Removes one reassortment node together with one of its
/// bifurcation parents. Exact reverse of [`crate::AddMove`].
#[derive(Debug, Clone, Copy)]
pub struct RemoveMove<'a> {
    pub(crate) heights: &'a dyn HeightProposal,
    pub(crate) partitions: &'a dyn PartitionSampler,
    pub(crate) options: OperatorOptions,
}

impl RemoveMove<'_> {
    pub fn apply(
        &self,
        graph: &mut Graph,
        containers: &mut NodeParameterContainers,
        rng: &mut dyn RandomSource,
    ) -> Result<MoveOutcome> {
        let reject = |reason| {
            Ok(MoveOutcome::Rejected {
                kind: MoveKind::Remove,
                reason,
            })
        };
        let allow_root = self.options.root_moves_ok();

        let mut candidates = vec![];
        let num_candidates = find_potential_nodes_to_remove(graph, Some(&mut candidates), allow_root);
        if num_candidates == 0 {
            trace!("no removable reassortment event");
            return reject(RejectReason::NoEventToRemove);
        }
        let mut log_hastings = (num_candidates as f64).ln();
        let reassortment = candidates[rng.index(num_candidates)];

        let slots = eligible_parent_slots(graph, reassortment, allow_root).collect::<Vec<_>>();
        let slot = match slots[..] {
            [only] => only,
            [first, second] => {
                log_hastings += LN_2;
                if rng.coin() {
                    first
                } else {
                    second
                }
            }
            _ => {
                return Err(ArgError::Structural {
                    reason: format!(
                        "candidate {} has {} deletable parents",
                        reassortment.number(),
                        slots.len()
                    ),
                    summary: graph.to_string(),
                })
            }
        };

        let missing = |what: &str| ArgError::Structural {
            reason: format!("reassortment {} has no {what}", reassortment.number()),
            summary: graph.to_string(),
        };
        let deleted_parent = graph
            .parent(reassortment, slot)
            .ok_or_else(|| missing("parent on the chosen slot"))?;
        let kept_parent = graph
            .parent(reassortment, slot.other())
            .ok_or_else(|| missing("second parent"))?;
        let partitioning = graph
            .partitioning(reassortment)
            .cloned()
            .ok_or_else(|| missing("partitioning"))?;
        let heights = EventHeights {
            bifurcation: graph.height(deleted_parent),
            reassortment: graph.height(reassortment),
        };

        // Root height of the graph left behind, against which the
        // reverse height proposal is evaluated.
        let deletes_root = graph.is_root(deleted_parent);
        let remaining_root_height = if deletes_root {
            let successor = successor_root(graph, reassortment, deleted_parent)
                .ok_or_else(|| missing("successor for the root"))?;
            graph.height(successor)
        } else {
            graph.root_height()
        };
        let log_reverse_heights = self.heights.log_density(remaining_root_height, heights);
        if log_reverse_heights == f64::NEG_INFINITY {
            trace!(?heights, remaining_root_height, "event cannot be proposed back");
            return reject(RejectReason::ZeroReverseDensity);
        }
        log_hastings += log_reverse_heights;
        let log_partition = self.partitions.log_probability(&partitioning);
        if log_partition == f64::NEG_INFINITY {
            trace!(%partitioning, "partitioning cannot be drawn back");
            return reject(RejectReason::ZeroPartitionProbability);
        }

        let mut edit = graph.begin_edit();
        edit.disconnect(deleted_parent, reassortment, slot)?;
        edit.join_edge(reassortment)?;
        let removed_bifurcation = if deletes_root {
            edit.hand_back_root()?
        } else {
            edit.join_edge(deleted_parent)?;
            deleted_parent
        };
        containers.contract_with_recombinant(edit.graph(), [removed_bifurcation, reassortment])?;
        edit.remove_detached(&[removed_bifurcation, reassortment])?;
        containers.refresh_root(edit.graph())?;
        edit.commit()?;

        let num_bifurcation_points = find_potential_attachment_points(graph, heights.bifurcation, None);
        let num_reassortment_points = find_potential_attachment_points(graph, heights.reassortment, None);
        log_hastings -= ((num_bifurcation_points * num_reassortment_points) as f64).ln();
        if deleted_parent != kept_parent {
            log_hastings -= LN_2;
        }
        log_hastings += log_partition;

        trace!(
            bifurcation = deleted_parent.number(),
            reassortment = reassortment.number(),
            %partitioning,
            deletes_root,
            log_hastings,
            "removed reassortment event"
        );
        Ok(MoveOutcome::Performed {
            kind: MoveKind::Remove,
            log_hastings_ratio: log_hastings,
            event: ReassortmentEvent {
                bifurcation: deleted_parent,
                reassortment,
                bifurcation_slot: slot,
                heights,
                partitioning,
            },
        })
    }
}
