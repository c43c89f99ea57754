#![allow(dead_code)]

use reassortment_graph::{
    AboveRootMixture, ExponentialHeights, Graph, GraphBuilder, Node, NodeParameterContainers,
    OperatorOptions, PartitionSampler, ReassortmentEventOperator, ReassortmentPartitions,
};

//        root (1.0)
//       /    \
//     ab      cd
//   (0.5)    (0.7)
//   / \      / \
//  A   B    C   D
pub struct FourTips {
    pub a: Node,
    pub b: Node,
    pub c: Node,
    pub d: Node,
    pub ab: Node,
    pub cd: Node,
    pub root: Node,
    pub graph: Graph,
}

impl FourTips {
    pub fn new(num_partitions: usize) -> Self {
        let mut builder = GraphBuilder::new(num_partitions);
        let a = builder.add_tip("A", 0.0);
        let b = builder.add_tip("B", 0.0);
        let c = builder.add_tip("C", 0.0);
        let d = builder.add_tip("D", 0.0);
        let ab = builder.add_bifurcation(0.5, a, b).unwrap();
        let cd = builder.add_bifurcation(0.7, c, d).unwrap();
        let root = builder.add_bifurcation(1.0, ab, cd).unwrap();
        let graph = builder.build().unwrap();
        Self {
            a,
            b,
            c,
            d,
            ab,
            cd,
            root,
            graph,
        }
    }
}

/// A random coalescent-like tree over `num_tips` tips sampled at time 0.
pub fn random_tree(num_tips: usize, num_partitions: usize, seed: u64) -> Graph {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut builder = GraphBuilder::new(num_partitions);
    let mut lineages = (0..num_tips)
        .map(|i| builder.add_tip(format!("tip{i}"), 0.0))
        .collect::<Vec<_>>();
    let mut height = 0.0;
    while lineages.len() > 1 {
        height += rng.gen_range(0.05..0.5);
        let first = lineages.swap_remove(rng.gen_range(0..lineages.len()));
        let second = lineages.swap_remove(rng.gen_range(0..lineages.len()));
        lineages.push(builder.add_bifurcation(height, first, second).unwrap());
    }
    builder.build().unwrap()
}

pub fn mixture_operator(
    above_root_probability: f64,
    root_moves: bool,
    sampler: Box<dyn PartitionSampler>,
) -> ReassortmentEventOperator {
    let mut options = OperatorOptions::default().with_node_checks();
    if root_moves {
        options = options.with_root_moves();
    }
    ReassortmentEventOperator::new(
        0.5,
        options,
        Box::new(AboveRootMixture {
            above_root_probability,
            excess_scale: EXCESS_SCALE,
        }),
        sampler,
    )
    .unwrap()
}

pub fn exponential_operator(root_moves: bool) -> ReassortmentEventOperator {
    let mut options = OperatorOptions::default().with_node_checks();
    if root_moves {
        options = options.with_root_moves();
    }
    ReassortmentEventOperator::new(
        0.5,
        options,
        Box::new(ExponentialHeights::default()),
        Box::new(ReassortmentPartitions::default()),
    )
    .unwrap()
}

pub const EXCESS_SCALE: f64 = 0.5;

/// Uniforms making the mixture proposal draw `height` below the root.
pub fn below_root(height: f64, root_height: f64) -> [f64; 2] {
    [0.999, 1.0 - height / root_height]
}

/// Uniforms making the mixture proposal draw `height` above the root.
pub fn above_root(height: f64, root_height: f64) -> [f64; 2] {
    let rate = 1.0 / (EXCESS_SCALE * root_height);
    [0.0, 1.0 - (-rate * (height - root_height)).exp()]
}

/// Uniform, then a swap and a cut: sends partition 0 right for two partitions.
pub const FIRST_PARTITION_RIGHT: ([f64; 1], [usize; 2]) = ([0.5], [0, 0]);

pub fn assert_containers_match(lhs: &NodeParameterContainers, rhs: &NodeParameterContainers) {
    let pairs = [
        (lhs.internal_heights(), rhs.internal_heights()),
        (lhs.internal_and_root_heights(), rhs.internal_and_root_heights()),
        (lhs.node_rates(), rhs.node_rates()),
    ];
    for (l, r) in pairs {
        assert_eq!(l.len(), r.len());
        for i in 0..l.len() {
            assert_eq!(l.get(i), r.get(i), "entry {i}");
        }
    }
}
