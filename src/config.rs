use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ArgError, Result};
use crate::flags::OperatorOptions;
use crate::heights::{AboveRootMixture, ExponentialHeights, HeightProposal};
use crate::partition::{PartitionSampler, ReassortmentPartitions, RecombinationPartitions};

/// Settings for [`crate::ReassortmentEventOperator`].
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub weight: u32,
    pub add_probability: f64,
    pub root_moves_ok: bool,
    pub check_nodes: bool,
    pub height_proposal: HeightProposalConfig,
    pub partition_sampler: PartitionSamplerConfig,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            weight: 1,
            add_probability: 0.5,
            root_moves_ok: false,
            check_nodes: true,
            height_proposal: HeightProposalConfig::default(),
            partition_sampler: PartitionSamplerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeightProposalConfig {
    Exponential {
        below_root_probability: f64,
    },
    AboveRootMixture {
        above_root_probability: f64,
        excess_scale: f64,
    },
}

impl Default for HeightProposalConfig {
    fn default() -> Self {
        let ExponentialHeights {
            below_root_probability,
        } = ExponentialHeights::default();
        HeightProposalConfig::Exponential {
            below_root_probability,
        }
    }
}

impl HeightProposalConfig {
    pub fn build(&self) -> Box<dyn HeightProposal> {
        match *self {
            HeightProposalConfig::Exponential {
                below_root_probability,
            } => Box::new(ExponentialHeights {
                below_root_probability,
            }),
            HeightProposalConfig::AboveRootMixture {
                above_root_probability,
                excess_scale,
            } => Box::new(AboveRootMixture {
                above_root_probability,
                excess_scale,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartitionSamplerConfig {
    Reassortment { single_partition_probability: f64 },
    Recombination,
}

impl Default for PartitionSamplerConfig {
    fn default() -> Self {
        PartitionSamplerConfig::Reassortment {
            single_partition_probability: ReassortmentPartitions::default()
                .single_partition_probability,
        }
    }
}

impl PartitionSamplerConfig {
    pub fn build(&self) -> Box<dyn PartitionSampler> {
        match *self {
            PartitionSamplerConfig::Reassortment {
                single_partition_probability,
            } => Box::new(ReassortmentPartitions {
                single_partition_probability,
            }),
            PartitionSamplerConfig::Recombination => Box::new(RecombinationPartitions),
        }
    }
}

fn invalid<T>(message: String) -> Result<T> {
    Err(ArgError::InvalidConfig(message))
}

impl OperatorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.add_probability > 0.0 && self.add_probability < 1.0) {
            return invalid(format!(
                "add_probability must lie strictly between 0 and 1, got {}",
                self.add_probability
            ));
        }
        if self.weight == 0 {
            return invalid("weight must be positive".to_string());
        }
        match self.height_proposal {
            HeightProposalConfig::Exponential {
                below_root_probability: p,
            } => {
                if !(p > 0.0 && p < 1.0) {
                    return invalid(format!(
                        "below_root_probability must lie strictly between 0 and 1, got {p}"
                    ));
                }
            }
            HeightProposalConfig::AboveRootMixture {
                above_root_probability: p,
                excess_scale,
            } => {
                if !(0.0..1.0).contains(&p) {
                    return invalid(format!(
                        "above_root_probability must lie in [0, 1), got {p}"
                    ));
                }
                if !(excess_scale > 0.0 && excess_scale.is_finite()) {
                    return invalid(format!("excess_scale must be positive, got {excess_scale}"));
                }
                if p > 0.0 && !self.root_moves_ok {
                    warn!(
                        above_root_probability = p,
                        "heights above the root are proposed but root moves are disabled"
                    );
                }
            }
        }
        if let PartitionSamplerConfig::Reassortment {
            single_partition_probability: s,
        } = self.partition_sampler
        {
            if !(0.0..=1.0).contains(&s) {
                return invalid(format!(
                    "single_partition_probability must lie in [0, 1], got {s}"
                ));
            }
        }
        Ok(())
    }

    pub fn options(&self) -> OperatorOptions {
        let mut options = OperatorOptions::default();
        if self.root_moves_ok {
            options = options.with_root_moves();
        }
        if self.check_nodes {
            options = options.with_node_checks();
        }
        options
    }
}
