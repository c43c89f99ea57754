use crate::error::{ArgError, Result};
use crate::graph::{Graph, NodeKind};
use crate::partition::Partitioning;
use crate::Node;

/// Builds an initial [`Graph`] bottom-up.
///
/// Children must be added before their parents. The single node left
/// without a parent becomes the root.
///
/// # Example
///
/// ```
/// use reassortment_graph::GraphBuilder;
///
/// let mut builder = GraphBuilder::new(2);
/// let a = builder.add_tip("A", 0.0);
/// let b = builder.add_tip("B", 0.0);
/// let c = builder.add_tip("C", 0.0);
/// let ab = builder.add_bifurcation(0.5, a, b).unwrap();
/// let _root = builder.add_bifurcation(1.0, ab, c).unwrap();
/// let graph = builder.build().unwrap();
/// assert_eq!(graph.node_count(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(num_partitions: usize) -> Self {
        Self {
            graph: Graph {
                heights: vec![],
                rates: vec![],
                kinds: vec![],
                parents: vec![],
                children: vec![],
                root: Node::sentinel(),
                num_partitions,
                revision: 0,
            },
        }
    }

    pub fn add_tip<S: Into<String>>(&mut self, taxon: S, height: f64) -> Node {
        self.graph.push_node(NodeKind::Tip(taxon.into()), height, 1.0)
    }

    /// Passing the same `left` and `right` is only valid for a
    /// reassortment child, whose two parent edges then both lead here.
    pub fn add_bifurcation(&mut self, height: f64, left: Node, right: Node) -> Result<Node> {
        self.check_exists(left)?;
        self.check_exists(right)?;
        let node = self.graph.push_node(NodeKind::Bifurcation, height, 1.0);
        self.graph.children[node.as_index()] = [left, right];
        self.link(node, left)?;
        self.link(node, right)?;
        Ok(node)
    }

    pub fn add_reassortment(&mut self, height: f64, child: Node, partitioning: Partitioning) -> Result<Node> {
        self.check_exists(child)?;
        if partitioning.len() != self.graph.num_partitions {
            return Err(ArgError::InvalidGraph(format!(
                "partitioning {partitioning} does not have {} partitions",
                self.graph.num_partitions
            )));
        }
        if !partitioning.is_proper() {
            return Err(ArgError::InvalidGraph(format!(
                "partitioning {partitioning} sends every partition through one parent"
            )));
        }
        let node = self
            .graph
            .push_node(NodeKind::Reassortment(partitioning), height, 1.0);
        self.graph.children[node.as_index()] = [child, child];
        self.link(node, child)?;
        Ok(node)
    }

    pub fn set_rate(&mut self, node: Node, rate: f64) -> Result<()> {
        self.check_exists(node)?;
        self.graph.rates[node.as_index()] = rate;
        Ok(())
    }

    pub fn build(self) -> Result<Graph> {
        let mut graph = self.graph;
        if graph.num_partitions < 2 {
            return Err(ArgError::InvalidGraph(format!(
                "need at least two partitions, got {}",
                graph.num_partitions
            )));
        }
        let parentless = graph
            .nodes()
            .filter(|&n| graph.parents[n.as_index()][0].is_sentinel())
            .take(2)
            .collect::<Vec<_>>();
        let root = match parentless[..] {
            [root] => root,
            [] => return Err(ArgError::InvalidGraph("graph has no nodes".to_string())),
            [a, b, ..] => {
                return Err(ArgError::InvalidGraph(format!(
                    "nodes {} and {} both lack a parent",
                    a.number(),
                    b.number()
                )))
            }
        };
        graph.root = root;
        graph.validate().map_err(ArgError::InvalidGraph)?;
        Ok(graph)
    }

    fn check_exists(&self, node: Node) -> Result<()> {
        if node.is_sentinel() || node.as_index() >= self.graph.node_count() {
            return Err(ArgError::InvalidGraph(format!("unknown node {node:?}")));
        }
        Ok(())
    }

    // Fill the next free parent slot of child.
    fn link(&mut self, parent: Node, child: Node) -> Result<()> {
        let reassortment = self.graph.is_reassortment(child);
        let slots = &mut self.graph.parents[child.as_index()];
        if reassortment {
            match slots.iter_mut().find(|p| p.is_sentinel()) {
                Some(slot) => *slot = parent,
                None => {
                    return Err(ArgError::InvalidGraph(format!(
                        "reassortment {} already has two parents",
                        child.number()
                    )))
                }
            }
        } else if slots[0].is_sentinel() {
            *slots = [parent, parent];
        } else {
            return Err(ArgError::InvalidGraph(format!(
                "node {} already has a parent",
                child.number()
            )));
        }
        Ok(())
    }
}
