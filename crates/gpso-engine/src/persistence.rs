//! Versioned, self-describing persistence: `{version, iter, tree, surrogate}`
//! plus the extra optimizer-only state (`config`, `xi`, `lb`, `retrain_n`)
//! needed so a resumed run behaves identically to an uninterrupted one. The
//! objective callable is never persisted — it is supplied fresh at resume
//! time, matching its status as an opaque external collaborator.

use gpso_core::{Domain, PartitionTree, Surrogate};
use gpso_error::{GpsoResult, gpso_err};
use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::events::Observer;
use crate::optimizer::{IterationRecord, Optimizer};

const FORMAT_VERSION: &str = "0.1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: String,
    pub iter: Vec<IterationRecord>,
    pub tree: PartitionTree,
    pub surrogate: Surrogate,
    pub domain: Domain,
    pub config: OptimizerConfig,
    pub xi: f64,
    pub lb: f64,
    pub retrain_n: usize,
}

impl<F> Optimizer<F>
where
    F: Fn(&[f64]) -> f64,
{
    /// Snapshots all persistable state. The running objective, and any
    /// registered observers, are not part of the checkpoint.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            version: FORMAT_VERSION.to_string(),
            iter: self.history.clone(),
            tree: self.tree.clone(),
            surrogate: self.surrogate.clone(),
            domain: self.domain.clone(),
            config: self.config.clone(),
            xi: self.xi,
            lb: self.lb,
            retrain_n: self.retrain_n,
        }
    }

    /// Rebuilds a running `Optimizer` from a checkpoint, a fresh objective,
    /// and a fresh set of observers (observers are never persisted).
    pub fn resume(checkpoint: Checkpoint, objective: F, observers: Vec<Box<dyn Observer>>) -> GpsoResult<Self> {
        if checkpoint.version != FORMAT_VERSION {
            return Err(gpso_err!(
                Configuration: "unsupported checkpoint version {} (expected {})",
                checkpoint.version,
                FORMAT_VERSION
            ));
        }

        let mut optimizer = Optimizer::new(
            checkpoint.domain,
            checkpoint.surrogate,
            checkpoint.tree,
            objective,
            checkpoint.config,
            checkpoint.lb,
            observers,
        );
        optimizer.xi = checkpoint.xi;
        optimizer.retrain_n = checkpoint.retrain_n;
        optimizer.iter_count = checkpoint.iter.len();
        optimizer.history = checkpoint.iter;

        Ok(optimizer)
    }
}

pub fn to_json(checkpoint: &Checkpoint) -> GpsoResult<String> {
    serde_json::to_string(checkpoint)
        .map_err(|e| gpso_err!(Configuration: "failed to serialize checkpoint: {}", e))
}

pub fn from_json(json: &str) -> GpsoResult<Checkpoint> {
    serde_json::from_str(json).map_err(|e| gpso_err!(Configuration: "failed to deserialize checkpoint: {}", e))
}
