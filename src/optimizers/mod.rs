//! Optimizer abstractions for neural network parameter updates
//!
//! This module provides the Optimizer trait and implementations for different
//! optimization algorithms used to update Dense layer parameters during training.
//!
//! # Overview
//!
//! Optimizers define how to use gradients to update model parameters. The basic
//! gradient descent update is `weight = weight - learning_rate * gradient`, but
//! Adam uses momentum and adaptive per-parameter step sizes to improve
//! convergence.
//!
//! One optimization step over a network is bracketed by
//! [`Optimizer::pre_update`] and [`Optimizer::post_update`]:
//!
//! ```ignore
//! optimizer.pre_update();
//! for layer in dense_layers {
//!     optimizer.update_params(layer)?;
//! }
//! optimizer.post_update();
//! ```
//!
//! # Available Optimizers
//!
//! - SGD: Stochastic gradient descent with optional momentum
//! - Adam: Adaptive moment estimation with bias correction

pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::Sgd;

use crate::error::Result;
use crate::layers::DenseLayer;

/// Core trait for neural network optimizers.
///
/// # State Management
///
/// Optimizers keep per-layer state (momentum, second moments) keyed by
/// [`DenseLayer::id`], created lazily on a layer's first update and kept for
/// the optimizer's lifetime. A single step counter drives learning-rate decay
/// and bias correction.
pub trait Optimizer {
    /// Recomputes the current learning rate from the decay schedule
    /// `lr = initial_lr / (1 + decay * iterations)`.
    fn pre_update(&mut self);

    /// Applies one update to the weights and biases of `layer` using the
    /// gradients from its latest backward pass.
    ///
    /// # Errors
    ///
    /// Returns a shape-mismatch error when the layer has no gradients.
    fn update_params(&mut self, layer: &mut DenseLayer) -> Result<()>;

    /// Advances the step counter.
    fn post_update(&mut self);

    /// Learning rate in effect for the current step.
    fn learning_rate(&self) -> f32;

    /// Number of completed steps.
    fn iterations(&self) -> usize;

    /// Reset optimizer state.
    ///
    /// Clears accumulated per-layer statistics and the step counter, and
    /// restores the initial learning rate.
    fn reset(&mut self);
}

/// `initial / (1 + decay * iterations)`, or `initial` when decay is zero.
pub(crate) fn decayed_learning_rate(initial: f32, decay: f32, iterations: usize) -> f32 {
    if decay == 0.0 {
        initial
    } else {
        initial / (1.0 + decay * iterations as f32)
    }
}
