//! Where events can be added, and which ones can be removed.

use crate::graph::{Graph, ParentSlot};
use crate::Node;

/// An edge, named by its lower end and the parent slot it leaves through.
///
/// The root's [`ParentSlot::Left`] edge is the open edge above the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentPoint {
    pub child: Node,
    pub slot: ParentSlot,
}

/// Edges spanning `time`: child below it, parent (if any) above it.
///
/// Edges are listed in node order, a reassortment node contributing
/// once per spanning parent slot.
pub fn attachment_points(graph: &Graph, time: f64) -> impl Iterator<Item = AttachmentPoint> + '_ {
    graph
        .nodes()
        .filter(move |&node| graph.height(node) < time)
        .flat_map(move |node| {
            graph
                .edges_above(node)
                .filter(move |&(_, parent)| parent.map_or(true, |p| graph.height(p) > time))
                .map(move |(slot, _)| AttachmentPoint { child: node, slot })
        })
}

/// Count the edges spanning `time`, optionally collecting them into `out`.
pub fn find_potential_attachment_points(
    graph: &Graph,
    time: f64,
    out: Option<&mut Vec<AttachmentPoint>>,
) -> usize {
    match out {
        Some(points) => {
            points.clear();
            points.extend(attachment_points(graph, time));
            points.len()
        }
        None => attachment_points(graph, time).count(),
    }
}

/// The node that takes over the root when `root`'s link to
/// `reassortment` is deleted.
pub(crate) fn successor_root(graph: &Graph, reassortment: Node, root: Node) -> Option<Node> {
    match graph.other_child(root, reassortment) {
        Some(other) if other == reassortment => graph.child(reassortment),
        other => other,
    }
}

/// Whether the event formed by `node` and the parent on `slot` can be removed.
pub fn removable_via(graph: &Graph, node: Node, slot: ParentSlot, allow_root_deletion: bool) -> bool {
    if !graph.is_reassortment(node) {
        return false;
    }
    let Some(parent) = graph.parent(node, slot) else {
        return false;
    };
    if !graph.is_bifurcation(parent) {
        return false;
    }
    if !graph.is_root(parent) {
        return true;
    }
    allow_root_deletion
        && successor_root(graph, node, parent).is_some_and(|n| graph.is_bifurcation(n))
}

/// Parent slots of `node` leading to distinct, deletable parents.
pub fn eligible_parent_slots(
    graph: &Graph,
    node: Node,
    allow_root_deletion: bool,
) -> impl Iterator<Item = ParentSlot> + '_ {
    let slots: &'static [ParentSlot] = if graph.has_single_parent(node) {
        &[ParentSlot::Left]
    } else {
        &ParentSlot::BOTH
    };
    slots
        .iter()
        .copied()
        .filter(move |&slot| removable_via(graph, node, slot, allow_root_deletion))
}

/// Count reassortment nodes with at least one deletable parent,
/// optionally collecting them into `out`.
pub fn find_potential_nodes_to_remove(
    graph: &Graph,
    out: Option<&mut Vec<Node>>,
    allow_root_deletion: bool,
) -> usize {
    let candidates = graph
        .nodes()
        .filter(|&n| eligible_parent_slots(graph, n, allow_root_deletion).next().is_some());
    match out {
        Some(nodes) => {
            nodes.clear();
            nodes.extend(candidates);
            nodes.len()
        }
        None => candidates.count(),
    }
}
