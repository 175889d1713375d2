//! Configuration structures for training
//!
//! This module provides the training configuration parsed from JSON files:
//! loop sizes, the random seed, and the optimizer with its hyperparameters.

use crate::error::{Error, Result};
use crate::optimizers::adam::{DEFAULT_BETA1, DEFAULT_BETA2, DEFAULT_EPSILON};
use crate::optimizers::{Adam, Optimizer, Sgd};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Optimization algorithm selected by a [`TrainingConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

/// Configuration for training.
///
/// Every field is optional in the JSON file; missing fields take the values
/// of [`TrainingConfig::default`].
///
/// - **adam**: uses `beta1`, `beta2` and `epsilon`
/// - **sgd**: uses `momentum` (0 disables it)
///
/// Both optimizers decay the learning rate as
/// `learning_rate / (1 + decay * step)`.
///
/// # Example
///
/// ```json
/// {
///   "epochs": 5,
///   "batch_size": 128,
///   "seed": 7,
///   "optimizer": "adam",
///   "learning_rate": 0.005,
///   "decay": 0.0001
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Passes over the training split
    pub epochs: usize,
    /// Rows per mini-batch
    pub batch_size: usize,
    /// Seed for weight initialization, dropout and batch shuffling
    pub seed: u64,
    pub optimizer: OptimizerKind,
    /// Initial learning rate
    pub learning_rate: f32,
    /// Learning-rate decay per optimizer step
    pub decay: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// SGD momentum
    pub momentum: f32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 64,
            seed: 42,
            optimizer: OptimizerKind::Adam,
            learning_rate: 0.001,
            decay: 0.0,
            beta1: DEFAULT_BETA1,
            beta2: DEFAULT_BETA2,
            epsilon: DEFAULT_EPSILON,
            momentum: 0.0,
        }
    }
}

impl TrainingConfig {
    /// Checks every field against its valid range.
    ///
    /// # Errors
    ///
    /// Returns an invalid-config error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(invalid("epochs must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be greater than 0"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(invalid("learning_rate must be positive"));
        }
        if !(self.decay >= 0.0 && self.decay.is_finite()) {
            return Err(invalid("decay must be non-negative"));
        }
        if !(0.0..1.0).contains(&self.beta1) {
            return Err(invalid("beta1 must be in range [0.0, 1.0)"));
        }
        if !(0.0..1.0).contains(&self.beta2) {
            return Err(invalid("beta2 must be in range [0.0, 1.0)"));
        }
        if !(self.epsilon > 0.0) {
            return Err(invalid("epsilon must be positive"));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(invalid("momentum must be in range [0.0, 1.0)"));
        }
        Ok(())
    }

    /// Optimizer described by this configuration.
    pub fn build_optimizer(&self) -> Box<dyn Optimizer> {
        match self.optimizer {
            OptimizerKind::Adam => Box::new(
                Adam::new(self.learning_rate, self.decay)
                    .with_betas(self.beta1, self.beta2)
                    .with_epsilon(self.epsilon),
            ),
            OptimizerKind::Sgd => Box::new(Sgd::new(self.learning_rate, self.decay).with_momentum(self.momentum)),
        }
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidConfig(message.to_string())
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path`, deserializes its JSON contents into a
/// `TrainingConfig` and validates it.
///
/// # Examples
///
/// ```no_run
/// use ann_engine::config::load_config;
///
/// let cfg = load_config("config/mnist_mlp.json").unwrap();
/// assert!(cfg.batch_size > 0);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainingConfig> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
