// Small graphs shared by the unit tests.
// Tips are all sampled at time 0 and every graph has two partitions.

use crate::builder::GraphBuilder;
use crate::graph::Graph;
use crate::partition::Partitioning;
use crate::Node;

//     root (1.0)
//     /  \
//   ab    \
//  (0.5)   \
//   / \     \
//  A   B     C
pub struct ThreeTips {
    pub a: Node,
    pub b: Node,
    pub c: Node,
    pub ab: Node,
    pub root: Node,
    pub graph: Graph,
}

impl ThreeTips {
    pub fn new() -> Self {
        let mut builder = GraphBuilder::new(2);
        let a = builder.add_tip("A", 0.0);
        let b = builder.add_tip("B", 0.0);
        let c = builder.add_tip("C", 0.0);
        let ab = builder.add_bifurcation(0.5, a, b).unwrap();
        let root = builder.add_bifurcation(1.0, ab, c).unwrap();
        let graph = builder.build().unwrap();
        Self {
            a,
            b,
            c,
            ab,
            root,
            graph,
        }
    }
}

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
    pub fn new() -> Self {
        let mut builder = GraphBuilder::new(2);
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

// A reassortment whose two parent edges both lead to the same bifurcation.
//
//        root (1.0)
//       /    \
//   bubble    \
//   (0.6)      \
//    ||         \
//    R (0.3)     \
//    |            \
//    ab (0.2)      C
//   /  \
//  A    B
pub struct WithBubble {
    pub ab: Node,
    pub reassortment: Node,
    pub bubble_parent: Node,
    pub root: Node,
    pub graph: Graph,
}

impl WithBubble {
    pub fn new() -> Self {
        let mut builder = GraphBuilder::new(2);
        let a = builder.add_tip("A", 0.0);
        let b = builder.add_tip("B", 0.0);
        let c = builder.add_tip("C", 0.0);
        let ab = builder.add_bifurcation(0.2, a, b).unwrap();
        let reassortment = builder
            .add_reassortment(0.3, ab, Partitioning::new(vec![false, true]))
            .unwrap();
        let bubble_parent = builder
            .add_bifurcation(0.6, reassortment, reassortment)
            .unwrap();
        let root = builder.add_bifurcation(1.0, bubble_parent, c).unwrap();
        let graph = builder.build().unwrap();
        Self {
            ab,
            reassortment,
            bubble_parent,
            root,
            graph,
        }
    }
}

// A reassortment with an internal left parent and the root as right parent.
//
//          root (1.0)
//         /     \
//       x (0.6)  \
//      /   \      |
//   y (0.4) B     |
//   /   \         |
//  A     R (0.2)--+
//        |
//        C
pub struct UnderRoot {
    pub reassortment: Node,
    pub y: Node,
    pub x: Node,
    pub root: Node,
    pub graph: Graph,
}

impl UnderRoot {
    pub fn new() -> Self {
        let mut builder = GraphBuilder::new(2);
        let a = builder.add_tip("A", 0.0);
        let b = builder.add_tip("B", 0.0);
        let c = builder.add_tip("C", 0.0);
        let reassortment = builder
            .add_reassortment(0.2, c, Partitioning::new(vec![true, false]))
            .unwrap();
        let y = builder.add_bifurcation(0.4, a, reassortment).unwrap();
        let x = builder.add_bifurcation(0.6, y, b).unwrap();
        let root = builder.add_bifurcation(1.0, x, reassortment).unwrap();
        let graph = builder.build().unwrap();
        Self {
            reassortment,
            y,
            x,
            root,
            graph,
        }
    }
}
