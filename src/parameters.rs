use std::fmt;

use tracing::trace;

use crate::error::{ArgError, Result};
use crate::graph::Graph;
use crate::Node;

/// A resizable vector of per-node values owned by the likelihood side.
pub trait NodeParameters: fmt::Debug {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<f64>;

    fn set(&mut self, index: usize, value: f64);

    fn insert(&mut self, index: usize, value: f64);

    fn remove(&mut self, index: usize) -> f64;
}

impl NodeParameters for Vec<f64> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<f64> {
        self.as_slice().get(index).copied()
    }

    fn set(&mut self, index: usize, value: f64) {
        self[index] = value;
    }

    fn insert(&mut self, index: usize, value: f64) {
        Vec::insert(self, index, value)
    }

    fn remove(&mut self, index: usize) -> f64 {
        Vec::remove(self, index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    InternalHeights,
    InternalAndRootHeights,
    NodeRates,
}

impl Category {
    fn includes(self, graph: &Graph, node: Node) -> bool {
        match self {
            Category::InternalHeights => !graph.is_tip(node) && !graph.is_root(node),
            Category::InternalAndRootHeights => !graph.is_tip(node),
            Category::NodeRates => !graph.is_root(node),
        }
    }

    fn value(self, graph: &Graph, node: Node) -> f64 {
        match self {
            Category::NodeRates => graph.rate(node),
            _ => graph.height(node),
        }
    }

    /// Position of `node` within the container: the number of
    /// included nodes with a smaller number.
    fn index(self, graph: &Graph, node: Node) -> usize {
        graph
            .nodes()
            .take_while(|&n| n < node)
            .filter(|&n| self.includes(graph, n))
            .count()
    }

    fn name(self) -> &'static str {
        match self {
            Category::InternalHeights => "internal node heights",
            Category::InternalAndRootHeights => "internal and root heights",
            Category::NodeRates => "node rates",
        }
    }
}

const CATEGORIES: [Category; 3] = [
    Category::InternalHeights,
    Category::InternalAndRootHeights,
    Category::NodeRates,
];

/// The three per-node containers that must track graph size changes.
///
/// Entries are ordered by node number within each category:
/// internal heights cover non-tip, non-root nodes; internal-and-root
/// heights cover all non-tip nodes; rates cover all non-root nodes.
#[derive(Debug)]
pub struct NodeParameterContainers {
    internal_heights: Box<dyn NodeParameters>,
    internal_and_root_heights: Box<dyn NodeParameters>,
    node_rates: Box<dyn NodeParameters>,
}

impl NodeParameterContainers {
    pub fn new(
        internal_heights: Box<dyn NodeParameters>,
        internal_and_root_heights: Box<dyn NodeParameters>,
        node_rates: Box<dyn NodeParameters>,
    ) -> Self {
        Self {
            internal_heights,
            internal_and_root_heights,
            node_rates,
        }
    }

    /// Containers filled from the graph's current heights and rates.
    pub fn from_graph(graph: &Graph) -> Self {
        let fill = |category: Category| -> Box<dyn NodeParameters> {
            Box::new(
                graph
                    .nodes()
                    .filter(|&n| category.includes(graph, n))
                    .map(|n| category.value(graph, n))
                    .collect::<Vec<f64>>(),
            )
        };
        Self::new(
            fill(Category::InternalHeights),
            fill(Category::InternalAndRootHeights),
            fill(Category::NodeRates),
        )
    }

    pub fn internal_heights(&self) -> &dyn NodeParameters {
        self.internal_heights.as_ref()
    }

    pub fn internal_and_root_heights(&self) -> &dyn NodeParameters {
        self.internal_and_root_heights.as_ref()
    }

    pub fn node_rates(&self) -> &dyn NodeParameters {
        self.node_rates.as_ref()
    }

    fn container(&mut self, category: Category) -> &mut dyn NodeParameters {
        match category {
            Category::InternalHeights => self.internal_heights.as_mut(),
            Category::InternalAndRootHeights => self.internal_and_root_heights.as_mut(),
            Category::NodeRates => self.node_rates.as_mut(),
        }
    }

    /// Insert entries for a newly added bifurcation and reassortment node,
    /// both already numbered and wired into `graph`.
    pub fn expand_with_recombinant(&mut self, graph: &Graph, bifurcation: Node, reassortment: Node) -> Result<()> {
        let mut added = [bifurcation, reassortment];
        added.sort_unstable();
        for category in CATEGORIES {
            for &node in &added {
                if !category.includes(graph, node) {
                    continue;
                }
                let index = category.index(graph, node);
                let container = self.container(category);
                if index > container.len() {
                    return Err(ArgError::Containers(format!(
                        "cannot insert {} entry for node {} at {index}, length {}",
                        category.name(),
                        node.number(),
                        container.len()
                    )));
                }
                container.insert(index, category.value(graph, node));
            }
        }
        self.refresh_root(graph)
    }

    /// Remove entries for a detached bifurcation and reassortment node.
    ///
    /// `graph` must still contain both nodes, numbered as before removal.
    pub fn contract_with_recombinant(&mut self, graph: &Graph, removed: [Node; 2]) -> Result<()> {
        let mut removed = removed;
        removed.sort_unstable();
        for category in CATEGORIES {
            // indices come from the unmodified numbering, larger first
            let indices = removed
                .iter()
                .filter(|&&n| category.includes(graph, n))
                .map(|&n| category.index(graph, n))
                .collect::<Vec<_>>();
            let container = self.container(category);
            for &index in indices.iter().rev() {
                if index >= container.len() {
                    return Err(ArgError::Containers(format!(
                        "cannot remove {} entry {index}, length {}",
                        category.name(),
                        container.len()
                    )));
                }
                container.remove(index);
            }
        }
        Ok(())
    }

    /// Re-read the root's height, which moves when an event is
    /// added above or removed from the root.
    pub fn refresh_root(&mut self, graph: &Graph) -> Result<()> {
        let root = graph.root();
        let index = Category::InternalAndRootHeights.index(graph, root);
        let container = self.container(Category::InternalAndRootHeights);
        if index >= container.len() {
            return Err(ArgError::Containers(format!(
                "no root height entry at {index}, length {}",
                container.len()
            )));
        }
        container.set(index, graph.root_height());
        trace!(root = root.number(), index, "refreshed root height entry");
        Ok(())
    }

    /// Every container matches the graph entry for entry.
    pub fn check_consistency(&self, graph: &Graph) -> Result<()> {
        let containers: [(Category, &dyn NodeParameters); 3] = [
            (Category::InternalHeights, self.internal_heights()),
            (Category::InternalAndRootHeights, self.internal_and_root_heights()),
            (Category::NodeRates, self.node_rates()),
        ];
        for (category, container) in containers {
            let expected = graph
                .nodes()
                .filter(|&n| category.includes(graph, n))
                .map(|n| (n, category.value(graph, n)))
                .collect::<Vec<_>>();
            if expected.len() != container.len() {
                return Err(ArgError::Containers(format!(
                    "{} has {} entries, graph has {}",
                    category.name(),
                    container.len(),
                    expected.len()
                )));
            }
            for (index, (node, value)) in expected.into_iter().enumerate() {
                if container.get(index) != Some(value) {
                    return Err(ArgError::Containers(format!(
                        "{} entry {index} is {:?}, node {} has {value}",
                        category.name(),
                        container.get(index),
                        node.number()
                    )));
                }
            }
        }
        Ok(())
    }
}
