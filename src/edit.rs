use tracing::{error, trace};

use crate::error::{ArgError, Result};
use crate::graph::{Graph, NodeKind, ParentSlot};
use crate::locator::AttachmentPoint;
use crate::partition::Partitioning;
use crate::Node;

/// An open edit of a [`Graph`].
///
/// Every topology change goes through one of these. The graph is only
/// guaranteed valid again after [`GraphEdit::commit`] succeeds.
/// Dropping an edit without committing restores the graph as it was
/// when the edit began.
#[derive(Debug)]
pub struct GraphEdit<'g> {
    graph: &'g mut Graph,
    snapshot: Option<Graph>,
    nodes_at_start: usize,
}

impl Graph {
    pub fn begin_edit(&mut self) -> GraphEdit<'_> {
        let snapshot = Some(self.clone());
        let nodes_at_start = self.node_count();
        GraphEdit {
            graph: self,
            snapshot,
            nodes_at_start,
        }
    }
}

impl Drop for GraphEdit<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            trace!(revision = snapshot.revision, "rolling back uncommitted graph edit");
            *self.graph = snapshot;
        }
    }
}

impl GraphEdit<'_> {
    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// A failed precondition, with a dump of the graph as it stands mid-edit.
    fn primitive(&self, op: &'static str, parent: Node, child: Node) -> ArgError {
        ArgError::Primitive {
            op,
            parent,
            child,
            summary: self.graph.to_string(),
        }
    }

    /// Validate the edited graph and make the changes permanent.
    ///
    /// # Errors
    ///
    /// [`ArgError::Structural`], carrying a dump of the offending graph.
    /// The graph itself is rolled back.
    pub fn commit(mut self) -> Result<()> {
        if let Err(reason) = self.graph.validate() {
            let summary = self.graph.to_string();
            error!(%reason, "graph edit failed validation");
            return Err(ArgError::Structural { reason, summary });
        }
        self.graph.revision += 1;
        if self.graph.node_count() != self.nodes_at_start {
            trace!(
                revision = self.graph.revision,
                from = self.nodes_at_start,
                to = self.graph.node_count(),
                "graph size changed"
            );
        }
        self.snapshot = None;
        Ok(())
    }

    /// Discard all changes.
    pub fn rollback(self) {}

    pub(crate) fn push_node(&mut self, kind: NodeKind, height: f64, rate: f64) -> Node {
        self.graph.push_node(kind, height, rate)
    }

    /// Remove nodes that nothing refers to any more and renumber the rest.
    pub(crate) fn remove_detached(&mut self, nodes: &[Node]) -> Result<()> {
        let mut nodes = nodes.to_vec();
        nodes.sort_unstable();
        nodes.dedup();
        for &node in &nodes {
            let slots = [
                self.graph.parents[node.as_index()],
                self.graph.children[node.as_index()],
            ];
            if slots.iter().flatten().any(|n| !n.is_sentinel()) || self.graph.is_referenced(node) {
                return Err(self.primitive("remove_detached", Node::sentinel(), node));
            }
        }
        for &node in nodes.iter().rev() {
            self.graph.remove_node(node);
        }
        Ok(())
    }
}

// Child-side primitives. These edit only the parent's child slots.
impl GraphEdit<'_> {
    /// Clear one child slot of a bifurcation that holds `child`.
    pub fn single_remove_child(&mut self, parent: Node, child: Node) -> Result<()> {
        let position = if self.graph.is_bifurcation(parent) {
            self.graph.children[parent.as_index()]
                .iter()
                .position(|&c| c == child)
        } else {
            None
        };
        let Some(i) = position else {
            return Err(self.primitive("single_remove_child", parent, child));
        };
        self.graph.children[parent.as_index()][i] = Node::sentinel();
        Ok(())
    }

    /// Clear both child slots of a node whose single child is `child`.
    pub fn double_remove_child(&mut self, parent: Node, child: Node) -> Result<()> {
        if self.graph.children[parent.as_index()] != [child, child] {
            return Err(self.primitive("double_remove_child", parent, child));
        }
        self.graph.children[parent.as_index()] = [Node::sentinel(); 2];
        Ok(())
    }

    /// Fill the first empty child slot of a bifurcation.
    pub fn single_add_child(&mut self, parent: Node, child: Node) -> Result<()> {
        let position = if self.graph.is_bifurcation(parent) {
            self.graph.children[parent.as_index()]
                .iter()
                .position(|c| c.is_sentinel())
        } else {
            None
        };
        let Some(i) = position else {
            return Err(self.primitive("single_add_child", parent, child));
        };
        self.graph.children[parent.as_index()][i] = child;
        Ok(())
    }

    /// Fill both child slots of a childless reassortment node.
    pub fn double_add_child(&mut self, parent: Node, child: Node) -> Result<()> {
        if !self.graph.is_reassortment(parent)
            || !self.graph.children[parent.as_index()]
                .iter()
                .all(|c| c.is_sentinel())
        {
            return Err(self.primitive("double_add_child", parent, child));
        }
        self.graph.children[parent.as_index()] = [child, child];
        Ok(())
    }

    /// Replace one child-edge of `parent` to `old` by an edge to `new`.
    fn redirect_child(&mut self, parent: Node, old: Node, new: Node) -> Result<()> {
        if self.graph.is_reassortment(parent) {
            self.double_remove_child(parent, old)?;
            self.double_add_child(parent, new)
        } else {
            self.single_remove_child(parent, old)?;
            self.single_add_child(parent, new)
        }
    }
}

// Parent-side primitives. These edit only the child's parent slots.
impl GraphEdit<'_> {
    /// Point `child`'s edge on `slot` at `parent`.
    /// Nodes with a single parent have both slots set.
    pub fn set_parent(&mut self, child: Node, slot: ParentSlot, parent: Node) {
        let reassortment = self.graph.is_reassortment(child);
        let slots = &mut self.graph.parents[child.as_index()];
        if reassortment {
            slots[slot.index()] = parent;
        } else {
            *slots = [parent, parent];
        }
    }

    pub fn clear_parent(&mut self, child: Node, slot: ParentSlot) {
        self.set_parent(child, slot, Node::sentinel());
    }

    /// Point every parent slot of `child` holding `old` at `new`.
    fn replace_parent(&mut self, child: Node, old: Node, new: Node) -> Result<()> {
        if !self.graph.parents[child.as_index()].contains(&old) {
            return Err(self.primitive("replace_parent", old, child));
        }
        self.graph.parents[child.as_index()]
            .iter_mut()
            .filter(|p| **p == old)
            .for_each(|p| *p = new);
        Ok(())
    }
}

// Composite edits used by the moves
impl GraphEdit<'_> {
    /// Insert the detached node `mid` part way along `point`.
    ///
    /// `mid` inherits the edge's parent on `mid_slot` and takes the
    /// edge's child as its child.
    pub fn split_edge(&mut self, point: AttachmentPoint, mid: Node, mid_slot: ParentSlot) -> Result<()> {
        let AttachmentPoint { child, slot } = point;
        let parent = self
            .graph
            .parent(child, slot)
            .ok_or_else(|| self.primitive("split_edge", Node::sentinel(), child))?;
        self.redirect_child(parent, child, mid)?;
        self.set_parent(child, slot, mid);
        self.set_parent(mid, mid_slot, parent);
        if self.graph.is_reassortment(mid) {
            self.double_add_child(mid, child)
        } else {
            self.single_add_child(mid, child)
        }
    }

    /// Splice out a node left with one parent edge and one child edge.
    pub fn join_edge(&mut self, mid: Node) -> Result<()> {
        let parent = self.graph.parents[mid.as_index()]
            .into_iter()
            .find(|p| !p.is_sentinel());
        let child = self.graph.children[mid.as_index()]
            .into_iter()
            .find(|c| !c.is_sentinel());
        let (Some(parent), Some(child)) = (parent, child) else {
            return Err(self.primitive("join_edge", mid, mid));
        };
        self.replace_parent(child, mid, parent)?;
        self.redirect_child(parent, mid, child)?;
        self.graph.parents[mid.as_index()] = [Node::sentinel(); 2];
        self.graph.children[mid.as_index()] = [Node::sentinel(); 2];
        Ok(())
    }

    /// Remove the edge from `child`'s `slot` up to `parent`, on both sides.
    pub fn disconnect(&mut self, parent: Node, child: Node, slot: ParentSlot) -> Result<()> {
        if self.graph.parent(child, slot) != Some(parent) {
            return Err(self.primitive("disconnect", parent, child));
        }
        self.single_remove_child(parent, child)?;
        self.clear_parent(child, slot);
        Ok(())
    }

    /// Wire a reassortment node, already hanging below `reassortment_parent`,
    /// to `bifurcation_parent` on `bifurcation_slot`, and record its partitioning.
    pub fn add_child_as_recombinant(
        &mut self,
        bifurcation_parent: Node,
        reassortment_parent: Node,
        node: Node,
        bifurcation_slot: ParentSlot,
        partitioning: Partitioning,
    ) -> Result<()> {
        if !self.graph.is_reassortment(node)
            || self.graph.parent(node, bifurcation_slot.other()) != Some(reassortment_parent)
            || self.graph.parent(node, bifurcation_slot).is_some()
        {
            return Err(self.primitive("add_child_as_recombinant", bifurcation_parent, node));
        }
        self.single_add_child(bifurcation_parent, node)?;
        self.set_parent(node, bifurcation_slot, bifurcation_parent);
        self.graph.kinds[node.as_index()] = NodeKind::Reassortment(partitioning);
        Ok(())
    }

    /// Give the root a new height above its current one.
    ///
    /// The detached bifurcation `replacement` takes over the root's
    /// children and height; the root keeps its number and becomes
    /// `replacement`'s parent.
    pub fn hand_over_root(&mut self, replacement: Node, new_height: f64) -> Result<()> {
        let root = self.graph.root;
        if !self.graph.is_bifurcation(replacement) || self.graph.is_referenced(replacement) {
            return Err(self.primitive("hand_over_root", root, replacement));
        }
        let children = self.graph.children[root.as_index()];
        for child in children.into_iter().filter(|c| !c.is_sentinel()) {
            if self.graph.parents[child.as_index()].contains(&root) {
                self.replace_parent(child, root, replacement)?;
            }
        }
        self.graph.children[replacement.as_index()] = children;
        self.graph.heights[replacement.as_index()] = self.graph.heights[root.as_index()];
        self.graph.children[root.as_index()] = [replacement, Node::sentinel()];
        self.graph.parents[replacement.as_index()] = [root, root];
        self.graph.heights[root.as_index()] = new_height;
        Ok(())
    }

    /// Undo [`GraphEdit::hand_over_root`]: the root's only child is
    /// absorbed into the root, which takes its children and height.
    ///
    /// Returns the absorbed node, now detached.
    pub fn hand_back_root(&mut self) -> Result<Node> {
        let root = self.graph.root;
        let absorbed = match self.graph.children[root.as_index()] {
            [c, s] | [s, c] if s.is_sentinel() && !c.is_sentinel() => c,
            _ => return Err(self.primitive("hand_back_root", root, Node::sentinel())),
        };
        if !self.graph.is_bifurcation(absorbed) {
            return Err(self.primitive("hand_back_root", root, absorbed));
        }
        let children = self.graph.children[absorbed.as_index()];
        for child in children.into_iter().filter(|c| !c.is_sentinel()) {
            if self.graph.parents[child.as_index()].contains(&absorbed) {
                self.replace_parent(child, absorbed, root)?;
            }
        }
        self.graph.children[root.as_index()] = children;
        self.graph.heights[root.as_index()] = self.graph.heights[absorbed.as_index()];
        self.graph.children[absorbed.as_index()] = [Node::sentinel(); 2];
        self.graph.parents[absorbed.as_index()] = [Node::sentinel(); 2];
        Ok(absorbed)
    }
}
