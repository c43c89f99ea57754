use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// The random draws a move needs.
///
/// Moves take `&mut dyn RandomSource` so that tests can replay
/// a fixed sequence of choices with [`ScriptedSource`].
pub trait RandomSource {
    /// Uniform on `[0, 1)`.
    fn uniform(&mut self) -> f64;

    /// Uniform on `0..len`. `len` must be positive.
    fn index(&mut self, len: usize) -> usize;

    fn coin(&mut self) -> bool;

    /// Exponential with the given rate, by inversion.
    fn exponential(&mut self, rate: f64) -> f64 {
        -(1.0 - self.uniform()).ln() / rate
    }
}

/// Adapts any [`rand::Rng`].
#[derive(Debug, Clone)]
pub struct RngSource<R>(R);

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngSource<StdRng> {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    fn coin(&mut self) -> bool {
        self.0.gen::<bool>()
    }
}

/// Replays queued values, one queue per kind of draw.
///
/// # Panics
///
/// Drawing from an empty queue, or queueing an index that is
/// out of range for the request, panics.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    uniforms: VecDeque<f64>,
    indices: VecDeque<usize>,
    coins: VecDeque<bool>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_uniforms(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.uniforms.extend(values);
        self
    }

    pub fn with_indices(mut self, values: impl IntoIterator<Item = usize>) -> Self {
        self.indices.extend(values);
        self
    }

    pub fn with_coins(mut self, values: impl IntoIterator<Item = bool>) -> Self {
        self.coins.extend(values);
        self
    }

    /// Every queued value has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.uniforms.is_empty() && self.indices.is_empty() && self.coins.is_empty()
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self) -> f64 {
        match self.uniforms.pop_front() {
            Some(u) => u,
            None => panic!("scripted source ran out of uniforms"),
        }
    }

    fn index(&mut self, len: usize) -> usize {
        match self.indices.pop_front() {
            Some(i) if i < len => i,
            Some(i) => panic!("scripted index {i} is out of range for length {len}"),
            None => panic!("scripted source ran out of indices"),
        }
    }

    fn coin(&mut self) -> bool {
        match self.coins.pop_front() {
            Some(c) => c,
            None => panic!("scripted source ran out of coins"),
        }
    }
}
