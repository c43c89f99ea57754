use std::f64::consts::LN_2;

use tracing::{trace, warn};

use crate::error::{ArgError, Result};
use crate::flags::OperatorOptions;
use crate::graph::{Graph, NodeKind, ParentSlot};
use crate::heights::{EventHeights, HeightProposal};
use crate::locator::{
    eligible_parent_slots, find_potential_attachment_points, find_potential_nodes_to_remove,
    AttachmentPoint,
};
use crate::operator::{MoveKind, MoveOutcome, ReassortmentEvent, RejectReason};
use crate::parameters::NodeParameterContainers;
use crate::partition::{PartitionSampler, Partitioning};
use crate::random::RandomSource;

/// Adds one reassortment event: a new bifurcation above a new
/// reassortment node, joined by a fresh edge.
#[derive(Debug, Clone, Copy)]
pub struct AddMove<'a> {
    pub(crate) heights: &'a dyn HeightProposal,
    pub(crate) partitions: &'a dyn PartitionSampler,
    pub(crate) options: OperatorOptions,
}

impl AddMove<'_> {
    /// Apply the move, returning the log Hastings ratio of the proposal.
    ///
    /// On rejection the graph and containers are untouched.
    pub fn apply(
        &self,
        graph: &mut Graph,
        containers: &mut NodeParameterContainers,
        rng: &mut dyn RandomSource,
    ) -> Result<MoveOutcome> {
        let reject = |reason| Ok(MoveOutcome::Rejected {
            kind: MoveKind::Add,
            reason,
        });
        let root = graph.root();
        let tree_height = graph.root_height();
        let allow_root = self.options.root_moves_ok();

        let (first, second) = self.heights.draw(tree_height, rng);
        let heights = EventHeights::sorted(first, second);
        let above_root = heights.bifurcation > tree_height;
        if above_root && !allow_root {
            trace!(?heights, tree_height, "bifurcation above the root, root moves disabled");
            return reject(RejectReason::RootMoveDisallowed);
        }
        let mut log_hastings = -self.heights.log_density(tree_height, heights);

        let mut bifurcation_points = vec![];
        let mut reassortment_points = vec![];
        let num_bifurcation_points =
            find_potential_attachment_points(graph, heights.bifurcation, Some(&mut bifurcation_points));
        let num_reassortment_points = find_potential_attachment_points(
            graph,
            heights.reassortment,
            Some(&mut reassortment_points),
        );
        if num_bifurcation_points == 0 || num_reassortment_points == 0 {
            // only when a height ties exactly with an existing node
            warn!(?heights, "no edge spans a proposed height");
            return reject(RejectReason::NoAttachmentPoint);
        }
        log_hastings += ((num_bifurcation_points * num_reassortment_points) as f64).ln();

        let reassortment_point = reassortment_points[rng.index(num_reassortment_points)];
        let bifurcation_point = bifurcation_points[rng.index(num_bifurcation_points)];

        let num_partitions = graph.num_partitions();
        let mut edit = graph.begin_edit();
        let new_bifurcation = edit.push_node(NodeKind::Bifurcation, heights.bifurcation, 1.0);
        let reassortment = edit.push_node(
            NodeKind::Reassortment(Partitioning::all_left(num_partitions)),
            heights.reassortment,
            1.0,
        );

        // The node that ends up as the event's bifurcation. Above the
        // root it is the root itself, which hands its old place to the
        // new node.
        let event_bifurcation = if above_root {
            edit.hand_over_root(new_bifurcation, heights.bifurcation)?;
            root
        } else {
            edit.split_edge(bifurcation_point, new_bifurcation, ParentSlot::Left)?;
            new_bifurcation
        };

        // Above the root the only spanning edge is the root edge, now
        // owned by the node that took the root's old place.
        let reassortment_point = if reassortment_point.child == root
            && edit.graph().parent(root, reassortment_point.slot).is_none()
        {
            AttachmentPoint {
                child: new_bifurcation,
                slot: ParentSlot::Left,
            }
        } else {
            reassortment_point
        };
        let reassortment_parent = edit
            .graph()
            .parent(reassortment_point.child, reassortment_point.slot)
            .ok_or_else(|| ArgError::Primitive {
                op: "add event",
                parent: event_bifurcation,
                child: reassortment_point.child,
                summary: edit.graph().to_string(),
            })?;

        let bifurcation_slot = if reassortment_parent == event_bifurcation {
            ParentSlot::Left
        } else {
            log_hastings += LN_2;
            if rng.coin() {
                ParentSlot::Left
            } else {
                ParentSlot::Right
            }
        };
        edit.split_edge(reassortment_point, reassortment, bifurcation_slot.other())?;

        let partitioning = self.partitions.draw(num_partitions, rng);
        log_hastings -= self.partitions.log_probability(&partitioning);
        edit.add_child_as_recombinant(
            event_bifurcation,
            reassortment_parent,
            reassortment,
            bifurcation_slot,
            partitioning.clone(),
        )?;

        containers.expand_with_recombinant(edit.graph(), new_bifurcation, reassortment)?;
        edit.commit()?;

        let removable = find_potential_nodes_to_remove(graph, None, allow_root);
        log_hastings -= (removable as f64).ln();
        let deletable_parents = eligible_parent_slots(graph, reassortment, allow_root).count();
        log_hastings -= (deletable_parents as f64).ln();

        trace!(
            bifurcation = event_bifurcation.number(),
            reassortment = reassortment.number(),
            %partitioning,
            above_root,
            log_hastings,
            "added reassortment event"
        );
        Ok(MoveOutcome::Performed {
            kind: MoveKind::Add,
            log_hastings_ratio: log_hastings,
            event: ReassortmentEvent {
                bifurcation: event_bifurcation,
                reassortment,
                bifurcation_slot,
                heights,
                partitioning,
            },
        })
    }
}
