mod common;

use common::*;
use reassortment_graph::{
    find_potential_attachment_points, GraphBuilder, MoveKind, MoveOutcome, NodeParameterContainers,
    ParentSlot, Partitioning, ReassortmentPartitions, RecombinationPartitions, RejectReason,
    ScriptedSource,
};

fn partition_script(rng: ScriptedSource) -> ScriptedSource {
    let (uniforms, indices) = FIRST_PARTITION_RIGHT;
    rng.with_uniforms(uniforms).with_indices(indices)
}

#[test]
fn test_add_then_remove_internal_event() {
    let FourTips {
        ab, cd, d, mut graph, ..
    } = FourTips::new(2);
    let original = graph.clone();
    let op = mixture_operator(0.0, false, Box::new(ReassortmentPartitions::default()));
    let mut containers = NodeParameterContainers::from_graph(&graph);
    let original_containers = NodeParameterContainers::from_graph(&graph);

    // Bifurcation at 0.6 on the edge above ab (third of C, D, ab),
    // reassortment at 0.3 on the edge above D (fourth of A..D).
    let rng = ScriptedSource::new()
        .with_uniforms(below_root(0.6, 1.0))
        .with_uniforms(below_root(0.3, 1.0))
        .with_indices([3, 2])
        .with_coins([true]);
    let mut rng = partition_script(rng);
    let added = op.add_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!(rng.is_exhausted());

    let event = added.event().unwrap().clone();
    assert_eq!(graph.node_count(), 9);
    assert_eq!(graph.reassortment_count(), 1);
    assert_eq!(event.bifurcation.number(), 7);
    assert_eq!(event.reassortment.number(), 8);
    assert_eq!(event.bifurcation_slot, ParentSlot::Left);
    assert_eq!(event.partitioning, Partitioning::new(vec![true, false]));
    assert!((event.heights.bifurcation - 0.6).abs() < 1e-12);
    assert!((event.heights.reassortment - 0.3).abs() < 1e-12);
    assert_eq!(graph.parent(event.reassortment, ParentSlot::Left), Some(event.bifurcation));
    assert_eq!(graph.parent(event.reassortment, ParentSlot::Right), Some(cd));
    assert_eq!(graph.parent(d, ParentSlot::Left), Some(event.reassortment));
    assert_eq!(graph.parent(ab, ParentSlot::Left), Some(event.bifurcation));
    assert_eq!(graph.parent(event.bifurcation, ParentSlot::Left), Some(graph.root()));
    assert!(containers.check_consistency(&graph).is_ok());

    // 3 x 4 attachment choices; the orientation coin and the partition
    // draw cancel against the density 2 and the two deletable parents.
    assert!((added.log_hastings_ratio() - 12.0f64.ln()).abs() < 1e-12);

    let mut rng = ScriptedSource::new().with_indices([0]).with_coins([true]);
    let removed = op.remove_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!(rng.is_exhausted());
    assert_eq!(removed.kind(), MoveKind::Remove);
    assert_eq!(removed.event().unwrap().bifurcation, event.bifurcation);
    assert!((added.log_hastings_ratio() + removed.log_hastings_ratio()).abs() < 1e-12);
    assert_eq!(graph, original);
    assert_containers_match(&containers, &original_containers);
}

#[test]
fn test_coincident_edges_form_a_bubble() {
    let FourTips { c, mut graph, .. } = FourTips::new(2);
    let original = graph.clone();
    let op = mixture_operator(0.0, false, Box::new(ReassortmentPartitions::default()));
    let mut containers = NodeParameterContainers::from_graph(&graph);

    // Both ends on the edge above C. No orientation coin is drawn.
    let rng = ScriptedSource::new()
        .with_uniforms(below_root(0.3, 1.0))
        .with_uniforms(below_root(0.6, 1.0))
        .with_indices([2, 0]);
    let mut rng = partition_script(rng);
    let added = op.add_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!(rng.is_exhausted());

    let event = added.event().unwrap().clone();
    assert_eq!(graph.parents(event.reassortment), [Some(event.bifurcation); 2]);
    assert_eq!(graph.children(event.bifurcation), [Some(event.reassortment); 2]);
    assert_eq!(graph.parent(c, ParentSlot::Left), Some(event.reassortment));
    assert!((added.log_hastings_ratio() - 12.0f64.ln()).abs() < 1e-12);

    // One candidate, one distinct parent: no coin either.
    let mut rng = ScriptedSource::new().with_indices([0]);
    let removed = op.remove_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!(rng.is_exhausted());
    assert!((added.log_hastings_ratio() + removed.log_hastings_ratio()).abs() < 1e-12);
    assert_eq!(graph, original);
    assert!(containers.check_consistency(&graph).is_ok());
}

#[test]
fn test_event_above_root() {
    let FourTips {
        ab, b, mut graph, ..
    } = FourTips::new(2);
    let original = graph.clone();
    let root = graph.root();
    let op = mixture_operator(0.5, true, Box::new(ReassortmentPartitions::default()));
    let mut containers = NodeParameterContainers::from_graph(&graph);
    let original_containers = NodeParameterContainers::from_graph(&graph);

    // Bifurcation at 1.4 on the root edge, reassortment at 0.3 above B;
    // the coin puts the root on the right.
    let rng = ScriptedSource::new()
        .with_uniforms(above_root(1.4, 1.0))
        .with_uniforms(below_root(0.3, 1.0))
        .with_indices([1, 0])
        .with_coins([false]);
    let mut rng = partition_script(rng);
    let added = op.add_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!(rng.is_exhausted());

    let event = added.event().unwrap().clone();
    assert_eq!(graph.root(), root);
    assert_eq!(event.bifurcation, root);
    assert!((graph.root_height() - 1.4).abs() < 1e-12);
    let replacement = graph.children(root)[0].unwrap();
    assert_eq!(graph.height(replacement), 1.0);
    assert_eq!(graph.parent(ab, ParentSlot::Left), Some(replacement));
    assert_eq!(graph.parent(event.reassortment, ParentSlot::Right), Some(root));
    assert_eq!(graph.parent(event.reassortment, ParentSlot::Left), Some(ab));
    assert_eq!(graph.parent(b, ParentSlot::Left), Some(event.reassortment));
    assert!(containers.check_consistency(&graph).is_ok());
    // density exp(-0.8), 1 x 4 choices, coin, partition, two deletable parents
    assert!((added.log_hastings_ratio() - (0.8 + 8.0f64.ln())).abs() < 1e-9);

    // removal through the root is the second of the two slots
    let mut rng = ScriptedSource::new().with_indices([0]).with_coins([false]);
    let removed = op.remove_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!(rng.is_exhausted());
    assert!((added.log_hastings_ratio() + removed.log_hastings_ratio()).abs() < 1e-9);
    assert_eq!(graph, original);
    assert_containers_match(&containers, &original_containers);
}

#[test]
fn test_both_heights_above_root() {
    let FourTips { mut graph, .. } = FourTips::new(2);
    let original = graph.clone();
    let root = graph.root();
    let op = mixture_operator(0.5, true, Box::new(ReassortmentPartitions::default()));
    let mut containers = NodeParameterContainers::from_graph(&graph);

    let rng = ScriptedSource::new()
        .with_uniforms(above_root(1.6, 1.0))
        .with_uniforms(above_root(1.2, 1.0))
        .with_indices([0, 0]);
    let mut rng = partition_script(rng);
    let added = op.add_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!(rng.is_exhausted());

    let event = added.event().unwrap().clone();
    assert_eq!(event.bifurcation, root);
    assert_eq!(graph.children(root), [Some(event.reassortment); 2]);
    assert!((graph.root_height() - 1.6).abs() < 1e-12);
    assert!((added.log_hastings_ratio() - 1.6).abs() < 1e-9);

    let mut rng = ScriptedSource::new().with_indices([0]);
    let removed = op.remove_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!(rng.is_exhausted());
    assert!((added.log_hastings_ratio() + removed.log_hastings_ratio()).abs() < 1e-9);
    assert_eq!(graph, original);
    assert!(containers.check_consistency(&graph).is_ok());
}

#[test]
fn test_root_move_disallowed() {
    let FourTips { mut graph, .. } = FourTips::new(2);
    let original = graph.clone();
    let op = mixture_operator(0.5, false, Box::new(ReassortmentPartitions::default()));
    let mut containers = NodeParameterContainers::from_graph(&graph);
    let mut rng = ScriptedSource::new()
        .with_uniforms(above_root(1.4, 1.0))
        .with_uniforms(below_root(0.3, 1.0));
    let outcome = op.add_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Rejected {
            kind: MoveKind::Add,
            reason: RejectReason::RootMoveDisallowed
        }
    );
    assert_eq!(graph, original);
}

#[test]
fn test_removal_with_zero_reverse_density() {
    // root bubble whose reassortment sits above the would-be new root
    let mut builder = GraphBuilder::new(2);
    let a = builder.add_tip("A", 0.0);
    let b = builder.add_tip("B", 0.0);
    let x = builder.add_bifurcation(0.5, a, b).unwrap();
    let r = builder
        .add_reassortment(0.8, x, Partitioning::new(vec![false, true]))
        .unwrap();
    builder.add_bifurcation(1.0, r, r).unwrap();
    let mut graph = builder.build().unwrap();
    let original = graph.clone();
    let mut containers = NodeParameterContainers::from_graph(&graph);

    let op = exponential_operator(true);
    let mut rng = ScriptedSource::new().with_indices([0]);
    let outcome = op.remove_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Rejected {
            kind: MoveKind::Remove,
            reason: RejectReason::ZeroReverseDensity
        }
    );
    assert_eq!(graph, original);

    let op = exponential_operator(false);
    let mut rng = ScriptedSource::new();
    let outcome = op.remove_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Rejected {
            kind: MoveKind::Remove,
            reason: RejectReason::NoEventToRemove
        }
    );
}

#[test]
fn test_attachment_counts_change_only_between_event_heights() {
    let FourTips { mut graph, .. } = FourTips::new(2);
    let before = graph.clone();
    let op = mixture_operator(0.0, false, Box::new(ReassortmentPartitions::default()));
    let mut containers = NodeParameterContainers::from_graph(&graph);
    let rng = ScriptedSource::new()
        .with_uniforms(below_root(0.6, 1.0))
        .with_uniforms(below_root(0.3, 1.0))
        .with_indices([3, 2])
        .with_coins([true]);
    let mut rng = partition_script(rng);
    op.add_move().apply(&mut graph, &mut containers, &mut rng).unwrap();

    for t in [0.05, 0.25, 0.35, 0.45, 0.55, 0.65, 0.75, 0.95, 1.5] {
        let expected = find_potential_attachment_points(&before, t, None)
            + usize::from(t > 0.3 && t < 0.6);
        assert_eq!(find_potential_attachment_points(&graph, t, None), expected, "t = {t}");
    }
}

#[test]
fn test_recombination_partitions_round_trip() {
    let FourTips { mut graph, .. } = FourTips::new(4);
    let original = graph.clone();
    let op = mixture_operator(0.0, false, Box::new(RecombinationPartitions));
    let mut containers = NodeParameterContainers::from_graph(&graph);

    // coins: orientation, then which side of the breakpoint goes right
    let mut rng = ScriptedSource::new()
        .with_uniforms(below_root(0.6, 1.0))
        .with_uniforms(below_root(0.3, 1.0))
        .with_indices([0, 1, 1])
        .with_coins([true, true]);
    let added = op.add_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!(rng.is_exhausted());
    let event = added.event().unwrap();
    assert_eq!(
        event.partitioning,
        Partitioning::new(vec![true, true, false, false])
    );
    assert_eq!(
        graph.partitioning(event.reassortment),
        Some(&event.partitioning)
    );

    let mut rng = ScriptedSource::new().with_indices([0]).with_coins([true]);
    let removed = op.remove_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert!((added.log_hastings_ratio() + removed.log_hastings_ratio()).abs() < 1e-12);
    assert_eq!(graph, original);
}

#[test]
fn test_removal_of_partitioning_the_sampler_cannot_draw() {
    // two breakpoints: never drawn by the recombination sampler
    let mut builder = GraphBuilder::new(4);
    let a = builder.add_tip("A", 0.0);
    let b = builder.add_tip("B", 0.0);
    let c = builder.add_tip("C", 0.0);
    let ab = builder.add_bifurcation(0.2, a, b).unwrap();
    let r = builder
        .add_reassortment(0.3, ab, Partitioning::new(vec![false, true, false, true]))
        .unwrap();
    let bubble = builder.add_bifurcation(0.6, r, r).unwrap();
    builder.add_bifurcation(1.0, bubble, c).unwrap();
    let mut graph = builder.build().unwrap();
    let original = graph.clone();
    let mut containers = NodeParameterContainers::from_graph(&graph);
    let op = mixture_operator(0.0, false, Box::new(RecombinationPartitions));

    let expected = MoveOutcome::Rejected {
        kind: MoveKind::Remove,
        reason: RejectReason::ZeroPartitionProbability,
    };
    let mut rng = ScriptedSource::new().with_indices([0]);
    let outcome = op.remove_move().apply(&mut graph, &mut containers, &mut rng).unwrap();
    assert_eq!(outcome, expected);
    assert_eq!(graph, original);

    // through the operator: a rejection, not a degenerate ratio
    let mut rng = ScriptedSource::new().with_uniforms([0.9]).with_indices([0]);
    let outcome = op.perform_move(&mut graph, &mut containers, &mut rng).unwrap();
    assert_eq!(outcome, expected);
    assert!(rng.is_exhausted());
    assert_eq!(graph, original);
    assert!(containers.check_consistency(&graph).is_ok());
}
