use std::fmt;

use crate::random::RandomSource;

/// Per-partition routing of a reassortment node.
///
/// Entry `i` is `true` when partition `i` is inherited through
/// the node's right parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partitioning(Vec<bool>);

impl Partitioning {
    pub fn new(routes: Vec<bool>) -> Self {
        Self(routes)
    }

    /// Every partition follows the left parent.
    pub fn all_left(num_partitions: usize) -> Self {
        Self(vec![false; num_partitions])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn right_count(&self) -> usize {
        self.0.iter().filter(|&&r| r).count()
    }

    /// Both parents carry at least one partition.
    pub fn is_proper(&self) -> bool {
        let right = self.right_count();
        right > 0 && right < self.len()
    }

    pub fn routes(&self) -> &[bool] {
        &self.0
    }
}

impl fmt::Display for Partitioning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &r in &self.0 {
            f.write_str(if r { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Draws the partitioning of a newly added reassortment node.
pub trait PartitionSampler: fmt::Debug {
    fn draw(&self, num_partitions: usize, rng: &mut dyn RandomSource) -> Partitioning;

    /// Log probability that [`PartitionSampler::draw`] returns `partitioning`.
    fn log_probability(&self, partitioning: &Partitioning) -> f64;
}

/// Segmented genomes.
///
/// With probability `single_partition_probability` exactly one
/// uniformly chosen partition goes right. Otherwise the partitions
/// are shuffled and cut at a uniform point, the tail going right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReassortmentPartitions {
    pub single_partition_probability: f64,
}

impl Default for ReassortmentPartitions {
    fn default() -> Self {
        Self {
            single_partition_probability: 0.0,
        }
    }
}

impl PartitionSampler for ReassortmentPartitions {
    fn draw(&self, num_partitions: usize, rng: &mut dyn RandomSource) -> Partitioning {
        debug_assert!(num_partitions >= 2);
        let mut routes = vec![false; num_partitions];
        if rng.uniform() < self.single_partition_probability {
            routes[rng.index(num_partitions)] = true;
        } else {
            let mut order = (0..num_partitions).collect::<Vec<_>>();
            for i in (1..num_partitions).rev() {
                let j = rng.index(i + 1);
                order.swap(i, j);
            }
            let cut = rng.index(num_partitions - 1);
            for &p in &order[cut + 1..] {
                routes[p] = true;
            }
        }
        Partitioning(routes)
    }

    fn log_probability(&self, partitioning: &Partitioning) -> f64 {
        if !partitioning.is_proper() {
            return f64::NEG_INFINITY;
        }
        let n = partitioning.len() as f64;
        let right = partitioning.right_count();
        let s = self.single_partition_probability;
        let shuffled = (1.0 - s) / ((n - 1.0) * binomial(partitioning.len(), right));
        if right == 1 {
            (s / n + shuffled).ln()
        } else {
            shuffled.ln()
        }
    }
}

/// Linear genomes: a single breakpoint, with a coin for which side goes right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecombinationPartitions;

impl PartitionSampler for RecombinationPartitions {
    fn draw(&self, num_partitions: usize, rng: &mut dyn RandomSource) -> Partitioning {
        debug_assert!(num_partitions >= 2);
        let head_goes_right = rng.coin();
        let breakpoint = rng.index(num_partitions - 1);
        let routes = (0..num_partitions)
            .map(|i| if i <= breakpoint { head_goes_right } else { !head_goes_right })
            .collect();
        Partitioning(routes)
    }

    fn log_probability(&self, partitioning: &Partitioning) -> f64 {
        let breaks = partitioning
            .routes()
            .windows(2)
            .filter(|w| w[0] != w[1])
            .count();
        if breaks != 1 {
            return f64::NEG_INFINITY;
        }
        -(2.0 * (partitioning.len() as f64 - 1.0)).ln()
    }
}

fn binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}
