use std::fmt;

use crate::partition::Partitioning;
use crate::Node;
use crate::NodeHash;

/// Which of a node's two parent slots an edge leaves through.
///
/// Nodes with a single parent only ever use [`ParentSlot::Left`];
/// both slots hold the same parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParentSlot {
    Left,
    Right,
}

impl ParentSlot {
    pub const BOTH: [ParentSlot; 2] = [ParentSlot::Left, ParentSlot::Right];

    pub(crate) fn index(self) -> usize {
        match self {
            ParentSlot::Left => 0,
            ParentSlot::Right => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            ParentSlot::Left => ParentSlot::Right,
            ParentSlot::Right => ParentSlot::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A sampled sequence.
    Tip(String),
    /// Two child edges, one parent edge (none for the root).
    Bifurcation,
    /// Two parent edges, one child edge.
    /// The partitioning records which parent carries each genomic partition.
    Reassortment(Partitioning),
}

impl NodeKind {
    fn label(&self) -> &'static str {
        match self {
            NodeKind::Tip(_) => "tip",
            NodeKind::Bifurcation => "bifurcation",
            NodeKind::Reassortment(_) => "reassortment",
        }
    }
}

/// An ancestral recombination graph.
///
/// Nodes live in parallel vectors indexed by node number.
/// Numbers are always dense in `0..node_count()`: removing nodes
/// shifts every larger number down, so that external containers
/// indexed by node number stay aligned.
///
/// Empty parent/child slots hold a sentinel node number.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) heights: Vec<f64>,
    pub(crate) rates: Vec<f64>,
    pub(crate) kinds: Vec<NodeKind>,
    pub(crate) parents: Vec<[Node; 2]>,
    pub(crate) children: Vec<[Node; 2]>,
    pub(crate) root: Node,
    pub(crate) num_partitions: usize,
    pub(crate) revision: u64,
}

// Revision is edit bookkeeping, not state.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.heights == other.heights
            && self.rates == other.rates
            && self.kinds == other.kinds
            && self.parents == other.parents
            && self.children == other.children
            && self.root == other.root
            && self.num_partitions == other.num_partitions
    }
}

// Queries
impl Graph {
    pub fn node_count(&self) -> usize {
        self.heights.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        (0..self.node_count()).map(Node)
    }

    pub fn root(&self) -> Node {
        self.root
    }

    pub fn root_height(&self) -> f64 {
        self.heights[self.root.as_index()]
    }

    pub fn is_root(&self, node: Node) -> bool {
        node == self.root
    }

    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    /// Incremented by every committed edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // NOTE: panics if node is out of bounds
    pub fn height(&self, node: Node) -> f64 {
        self.heights[node.as_index()]
    }

    pub fn rate(&self, node: Node) -> f64 {
        self.rates[node.as_index()]
    }

    pub fn kind(&self, node: Node) -> &NodeKind {
        &self.kinds[node.as_index()]
    }

    pub fn is_tip(&self, node: Node) -> bool {
        matches!(self.kind(node), NodeKind::Tip(_))
    }

    pub fn is_bifurcation(&self, node: Node) -> bool {
        matches!(self.kind(node), NodeKind::Bifurcation)
    }

    pub fn is_reassortment(&self, node: Node) -> bool {
        matches!(self.kind(node), NodeKind::Reassortment(_))
    }

    pub fn partitioning(&self, node: Node) -> Option<&Partitioning> {
        match self.kind(node) {
            NodeKind::Reassortment(p) => Some(p),
            _ => None,
        }
    }

    pub fn taxon(&self, node: Node) -> Option<&str> {
        match self.kind(node) {
            NodeKind::Tip(name) => Some(name),
            _ => None,
        }
    }

    pub fn find_taxon(&self, taxon: &str) -> Option<Node> {
        self.nodes().find(|&n| self.taxon(n) == Some(taxon))
    }

    pub fn parent(&self, node: Node, slot: ParentSlot) -> Option<Node> {
        self.parents[node.as_index()][slot.index()].into_option()
    }

    pub fn parents(&self, node: Node) -> [Option<Node>; 2] {
        let [l, r] = self.parents[node.as_index()];
        [l.into_option(), r.into_option()]
    }

    pub fn children(&self, node: Node) -> [Option<Node>; 2] {
        let [l, r] = self.children[node.as_index()];
        [l.into_option(), r.into_option()]
    }

    /// Both parent slots refer to the same node (or both are empty).
    pub fn has_single_parent(&self, node: Node) -> bool {
        let [l, r] = self.parents[node.as_index()];
        l == r
    }

    /// The child of a node with a single child edge.
    pub fn child(&self, node: Node) -> Option<Node> {
        self.children[node.as_index()][0].into_option()
    }

    /// The child of `parent` that is not `child`.
    /// When both child slots hold `child`, returns `child`.
    pub fn other_child(&self, parent: Node, child: Node) -> Option<Node> {
        let [l, r] = self.children[parent.as_index()];
        if l == child {
            r.into_option()
        } else if r == child {
            l.into_option()
        } else {
            None
        }
    }

    pub fn reassortment_count(&self) -> usize {
        self.kinds
            .iter()
            .filter(|k| matches!(k, NodeKind::Reassortment(_)))
            .count()
    }

    pub fn tip_count(&self) -> usize {
        self.kinds
            .iter()
            .filter(|k| matches!(k, NodeKind::Tip(_)))
            .count()
    }

    /// The edges leaving `node` upwards, as `(slot, parent)`.
    ///
    /// The root has a single open edge whose parent is `None`.
    /// Reassortment nodes report both slots, even when they
    /// lead to the same parent.
    pub fn edges_above(&self, node: Node) -> impl Iterator<Item = (ParentSlot, Option<Node>)> {
        let [l, r] = self.parents[node.as_index()];
        let second = if self.is_reassortment(node) {
            Some((ParentSlot::Right, r.into_option()))
        } else {
            None
        };
        std::iter::once((ParentSlot::Left, l.into_option())).chain(second)
    }

    /// Parent ends of the parent edges of `node`, with multiplicity.
    fn parent_edge_targets(&self, node: Node) -> [Option<Node>; 2] {
        let [l, r] = self.parents[node.as_index()];
        match self.kind(node) {
            NodeKind::Reassortment(_) => [l.into_option(), r.into_option()],
            _ => [l.into_option(), None],
        }
    }

    /// Child ends of the child edges of `node`, with multiplicity.
    fn child_edge_targets(&self, node: Node) -> [Option<Node>; 2] {
        let [l, r] = self.children[node.as_index()];
        match self.kind(node) {
            NodeKind::Bifurcation => [l.into_option(), r.into_option()],
            NodeKind::Reassortment(_) => [l.into_option(), None],
            NodeKind::Tip(_) => [None, None],
        }
    }
}

// Invariant checks
impl Graph {
    /// Local consistency of every node's slots and back references.
    pub fn node_check(&self) -> bool {
        self.find_node_defect().is_none()
    }

    pub(crate) fn find_node_defect(&self) -> Option<String> {
        let n = self.node_count();
        if self.rates.len() != n
            || self.kinds.len() != n
            || self.parents.len() != n
            || self.children.len() != n
        {
            return Some("node tables have different lengths".to_string());
        }
        for node in self.nodes() {
            let [pl, pr] = self.parents[node.as_index()];
            let [cl, cr] = self.children[node.as_index()];
            if pl != pr && (pl.is_sentinel() || pr.is_sentinel()) {
                return Some(format!("node {} has one empty parent slot", node.0));
            }
            if cl != cr && (cl.is_sentinel() || cr.is_sentinel()) {
                return Some(format!("node {} has one empty child slot", node.0));
            }
            for other in [pl, pr, cl, cr] {
                if !other.is_sentinel() && other.as_index() >= n {
                    return Some(format!("node {} refers to missing node {}", node.0, other.0));
                }
            }
            let shape_ok = match self.kind(node) {
                NodeKind::Tip(_) => cl.is_sentinel() && pl == pr,
                NodeKind::Bifurcation => !cl.is_sentinel() && pl == pr,
                NodeKind::Reassortment(_) => !pl.is_sentinel() && !cl.is_sentinel() && cl == cr,
            };
            if !shape_ok {
                return Some(format!(
                    "{} {} has slots inconsistent with its kind",
                    self.kind(node).label(),
                    node.0
                ));
            }
            for parent in self.parent_edge_targets(node).into_iter().flatten() {
                let up = count(self.parent_edge_targets(node), parent);
                let down = count(self.child_edge_targets(parent), node);
                if up != down {
                    return Some(format!(
                        "node {} lists {} as parent {} time(s), but {} lists it as child {} time(s)",
                        node.0, parent.0, up, parent.0, down
                    ));
                }
            }
            for child in self.child_edge_targets(node).into_iter().flatten() {
                let down = count(self.child_edge_targets(node), child);
                let up = count(self.parent_edge_targets(child), node);
                if up != down {
                    return Some(format!(
                        "node {} lists {} as child {} time(s), but {} lists it as parent {} time(s)",
                        node.0, child.0, down, child.0, up
                    ));
                }
            }
        }
        None
    }

    /// Full validation: node checks plus global properties.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if let Some(defect) = self.find_node_defect() {
            return Err(defect);
        }
        if self.root.is_sentinel() || self.root.as_index() >= self.node_count() {
            return Err("root is not a node of the graph".to_string());
        }
        if !self.is_bifurcation(self.root) {
            return Err(format!("root {} is not a bifurcation", self.root.0));
        }
        for node in self.nodes() {
            let parentless = self.parents[node.as_index()][0].is_sentinel();
            if parentless != self.is_root(node) {
                return Err(format!(
                    "node {} has no parent but the root is {}",
                    node.0, self.root.0
                ));
            }
            let height = self.height(node);
            if !height.is_finite() || height < 0.0 {
                return Err(format!("node {} has invalid height {}", node.0, height));
            }
            let rate = self.rate(node);
            if !rate.is_finite() || rate <= 0.0 {
                return Err(format!("node {} has invalid rate {}", node.0, rate));
            }
            for parent in self.parent_edge_targets(node).into_iter().flatten() {
                if self.height(parent) <= height {
                    return Err(format!(
                        "parent {} (height {}) is not above child {} (height {})",
                        parent.0,
                        self.height(parent),
                        node.0,
                        height
                    ));
                }
            }
            if let Some(p) = self.partitioning(node) {
                if p.len() != self.num_partitions {
                    return Err(format!(
                        "reassortment {} has {} partitions, expected {}",
                        node.0,
                        p.len(),
                        self.num_partitions
                    ));
                }
            }
        }
        let reachable = self.reachable_from_root();
        if reachable.len() != self.node_count() {
            return Err(format!(
                "{} of {} nodes are reachable from the root",
                reachable.len(),
                self.node_count()
            ));
        }
        Ok(())
    }

    fn reachable_from_root(&self) -> NodeHash {
        let mut seen = NodeHash::with_hasher(Default::default());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if seen.insert(node) {
                stack.extend(self.child_edge_targets(node).into_iter().flatten());
            }
        }
        seen
    }
}

fn count(targets: [Option<Node>; 2], node: Node) -> usize {
    targets.iter().filter(|&&t| t == Some(node)).count()
}

// Low-level storage edits, used by GraphEdit
impl Graph {
    pub(crate) fn push_node(&mut self, kind: NodeKind, height: f64, rate: f64) -> Node {
        self.heights.push(height);
        self.rates.push(rate);
        self.kinds.push(kind);
        self.parents.push([Node::sentinel(); 2]);
        self.children.push([Node::sentinel(); 2]);
        Node(self.heights.len() - 1)
    }

    /// Remove a node nothing refers to, shifting every larger number down by one.
    pub(crate) fn remove_node(&mut self, node: Node) {
        let index = node.as_index();
        self.heights.remove(index);
        self.rates.remove(index);
        self.kinds.remove(index);
        self.parents.remove(index);
        self.children.remove(index);
        let shift = |slot: &mut Node| {
            if !slot.is_sentinel() && slot.0 > index {
                slot.0 -= 1;
            }
        };
        for slots in self.parents.iter_mut().chain(self.children.iter_mut()) {
            slots.iter_mut().for_each(shift);
        }
        shift(&mut self.root);
    }

    pub(crate) fn is_referenced(&self, node: Node) -> bool {
        self.root == node
            || self
                .parents
                .iter()
                .chain(self.children.iter())
                .any(|slots| slots.contains(&node))
    }
}

/// Textual dump used in structural failure reports.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ARG: {} nodes, root {} at height {:.6}, {} partitions, {} reassortments",
            self.node_count(),
            self.root.0,
            self.heights.get(self.root.as_index()).copied().unwrap_or(f64::NAN),
            self.num_partitions,
            self.reassortment_count()
        )?;
        let slot = |n: Node| {
            if n.is_sentinel() {
                "-".to_string()
            } else {
                n.0.to_string()
            }
        };
        for node in self.nodes() {
            let i = node.as_index();
            let kind = match &self.kinds[i] {
                NodeKind::Tip(name) => format!("tip({name})"),
                NodeKind::Bifurcation => "bifurcation".to_string(),
                NodeKind::Reassortment(p) => format!("reassortment[{p}]"),
            };
            writeln!(
                f,
                "  {:>4} {:<24} height={:.6} rate={:.4} parents=({}, {}) children=({}, {})",
                i,
                kind,
                self.heights[i],
                self.rates[i],
                slot(self.parents[i][0]),
                slot(self.parents[i][1]),
                slot(self.children[i][0]),
                slot(self.children[i][1]),
            )?;
        }
        Ok(())
    }
}
