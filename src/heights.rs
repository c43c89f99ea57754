use std::f64::consts::LN_2;
use std::fmt;

use crate::random::RandomSource;

/// The two heights of an event, already sorted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventHeights {
    pub bifurcation: f64,
    pub reassortment: f64,
}

impl EventHeights {
    /// The larger height becomes the bifurcation.
    pub fn sorted(first: f64, second: f64) -> Self {
        if first >= second {
            Self {
                bifurcation: first,
                reassortment: second,
            }
        } else {
            Self {
                bifurcation: second,
                reassortment: first,
            }
        }
    }
}

/// Proposes the heights of a new event relative to the current root height.
///
/// `log_density` is the density of the *sorted* pair, which is what
/// enters the Hastings ratio. Removal evaluates it against the root
/// height of the graph left after removal.
pub trait HeightProposal: fmt::Debug {
    /// Two unordered heights.
    fn draw(&self, root_height: f64, rng: &mut dyn RandomSource) -> (f64, f64);

    fn log_density(&self, root_height: f64, heights: EventHeights) -> f64;

    /// Whether a bifurcation above the root has positive density.
    fn places_mass_above_root(&self) -> bool;
}

/// Two exponential heights, redrawn until at least one falls below the root.
///
/// The rate is set so that a single draw lands below the root with
/// probability `sqrt(below_root_probability)`, i.e. both land below
/// it with probability `below_root_probability`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialHeights {
    pub below_root_probability: f64,
}

impl Default for ExponentialHeights {
    fn default() -> Self {
        Self {
            below_root_probability: 0.9,
        }
    }
}

impl ExponentialHeights {
    fn rate(&self, root_height: f64) -> f64 {
        -(1.0 - self.below_root_probability.sqrt()).ln() / root_height
    }
}

impl HeightProposal for ExponentialHeights {
    fn draw(&self, root_height: f64, rng: &mut dyn RandomSource) -> (f64, f64) {
        let rate = self.rate(root_height);
        loop {
            let first = rng.exponential(rate);
            let second = rng.exponential(rate);
            if first < root_height || second < root_height {
                return (first, second);
            }
        }
    }

    fn log_density(&self, root_height: f64, heights: EventHeights) -> f64 {
        let EventHeights {
            bifurcation,
            reassortment,
        } = heights;
        if reassortment < 0.0 || reassortment >= root_height {
            return f64::NEG_INFINITY;
        }
        let rate = self.rate(root_height);
        // normaliser: P(min of the two draws < root height)
        let accepted = -(-2.0 * rate * root_height).exp_m1();
        LN_2 + 2.0 * rate.ln() - rate * (bifurcation + reassortment) - accepted.ln()
    }

    fn places_mass_above_root(&self) -> bool {
        true
    }
}

/// Each height is independently uniform below the root with probability
/// `1 - above_root_probability`, otherwise the root height plus an
/// exponential excess with mean `excess_scale * root_height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AboveRootMixture {
    pub above_root_probability: f64,
    pub excess_scale: f64,
}

impl Default for AboveRootMixture {
    fn default() -> Self {
        Self {
            above_root_probability: 0.1,
            excess_scale: 0.5,
        }
    }
}

impl AboveRootMixture {
    fn excess_rate(&self, root_height: f64) -> f64 {
        1.0 / (self.excess_scale * root_height)
    }

    fn draw_one(&self, root_height: f64, rng: &mut dyn RandomSource) -> f64 {
        let above = rng.uniform() < self.above_root_probability;
        if above {
            root_height + rng.exponential(self.excess_rate(root_height))
        } else {
            root_height * (1.0 - rng.uniform())
        }
    }

    fn log_density_one(&self, root_height: f64, height: f64) -> f64 {
        if height <= 0.0 {
            f64::NEG_INFINITY
        } else if height < root_height {
            (1.0 - self.above_root_probability).ln() - root_height.ln()
        } else {
            let rate = self.excess_rate(root_height);
            self.above_root_probability.ln() + rate.ln() - rate * (height - root_height)
        }
    }
}

impl HeightProposal for AboveRootMixture {
    fn draw(&self, root_height: f64, rng: &mut dyn RandomSource) -> (f64, f64) {
        let first = self.draw_one(root_height, rng);
        let second = self.draw_one(root_height, rng);
        (first, second)
    }

    fn log_density(&self, root_height: f64, heights: EventHeights) -> f64 {
        LN_2 + self.log_density_one(root_height, heights.bifurcation)
            + self.log_density_one(root_height, heights.reassortment)
    }

    fn places_mass_above_root(&self) -> bool {
        self.above_root_probability > 0.0
    }
}
