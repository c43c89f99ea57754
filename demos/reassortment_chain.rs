// A toy Metropolis-Hastings chain over reassortment events.
//
// The target penalises each event by a fixed log factor, so the chain
// settles around a small number of events. Run with RUST_LOG=debug to
// see individual moves.

use rand::Rng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reassortment_graph::{
    Graph, GraphBuilder, NodeParameterContainers, OperatorConfig, RandomSource,
    ReassortmentEventOperator, RngSource,
};

const LOG_PENALTY_PER_EVENT: f64 = -1.5;

fn initial_tree(num_tips: usize, num_partitions: usize, seed: u64) -> Graph {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut builder = GraphBuilder::new(num_partitions);
    let mut lineages = (0..num_tips)
        .map(|i| builder.add_tip(format!("seq{i}"), 0.0))
        .collect::<Vec<_>>();
    let mut height = 0.0;
    while lineages.len() > 1 {
        let k = lineages.len() as f64;
        height += -(1.0 - rng.gen::<f64>()).ln() / (k * (k - 1.0) / 2.0);
        let first = lineages.swap_remove(rng.gen_range(0..lineages.len()));
        let second = lineages.swap_remove(rng.gen_range(0..lineages.len()));
        lineages.push(builder.add_bifurcation(height, first, second).unwrap());
    }
    builder.build().unwrap()
}

fn log_target(graph: &Graph) -> f64 {
    LOG_PENALTY_PER_EVENT * graph.reassortment_count() as f64
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config: OperatorConfig = serde_json::from_str(
        r#"{ "add_probability": 0.5, "root_moves_ok": true }"#,
    )
    .unwrap();
    let operator = ReassortmentEventOperator::from_config(&config).unwrap();

    let mut graph = initial_tree(10, 8, 101);
    let mut containers = NodeParameterContainers::from_graph(&graph);
    let mut rng = RngSource::seed_from_u64(202);

    let steps = 20_000;
    let mut accepted = 0;
    let mut total_events = 0;
    for step in 0..steps {
        let checkpoint = graph.clone();
        let before = log_target(&graph);
        let outcome = operator
            .perform_move(&mut graph, &mut containers, &mut rng)
            .unwrap();
        let log_alpha = log_target(&graph) - before + outcome.log_hastings_ratio();
        if outcome.is_performed() && rng.uniform().ln() < log_alpha {
            accepted += 1;
        } else if outcome.is_performed() {
            graph = checkpoint;
            containers = NodeParameterContainers::from_graph(&graph);
        }
        total_events += graph.reassortment_count();
        if step % 5_000 == 0 {
            info!(step, events = graph.reassortment_count(), nodes = graph.node_count());
        }
    }

    let acceptance = accepted as f64 / steps as f64;
    info!(
        acceptance,
        mean_events = total_events as f64 / steps as f64,
        "chain finished"
    );
    if let Some(advice) = operator.performance_suggestion(acceptance) {
        info!("{advice}");
    }
}
