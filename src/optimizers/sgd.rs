//! Stochastic Gradient Descent (SGD) optimizer implementation
//!
//! This module provides an SGD optimizer that performs the gradient descent
//! update `parameter = parameter - learning_rate * gradient`, optionally with
//! classical momentum.

use crate::error::Result;
use crate::layers::{DenseLayer, Parameter};
use crate::math::{Matrix, MatrixBase, Vector, VectorBase, DEFAULT_COST};
use crate::optimizers::{decayed_learning_rate, Optimizer};
use crate::utils::parallel::dynamic_parallel_for_mut;
use log::debug;
use std::collections::HashMap;

/// Stochastic Gradient Descent optimizer.
///
/// Without momentum this is the plain rule `w = w - η * ∇L/∂w`. With a
/// non-zero `momentum` each parameter keeps a velocity:
///
/// ```text
/// velocity = momentum * velocity - η * gradient
/// w = w + velocity
/// ```
///
/// # Example
///
/// ```
/// use ann_engine::optimizers::{Optimizer, Sgd};
///
/// let optimizer = Sgd::new(0.01, 0.0).with_momentum(0.9);
/// assert_eq!(optimizer.learning_rate(), 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct Sgd {
    initial_learning_rate: f32,
    learning_rate: f32,
    decay: f32,
    momentum: f32,
    iterations: usize,
    velocities: HashMap<usize, (Matrix<f32>, Vector<f32>)>,
}

impl Sgd {
    /// Creates a new SGD optimizer without momentum.
    ///
    /// # Arguments
    ///
    /// * `learning_rate` - Initial step size (must be positive)
    /// * `decay` - Learning-rate decay per step; 0 keeps the rate constant
    pub fn new(learning_rate: f32, decay: f32) -> Self {
        Self {
            initial_learning_rate: learning_rate,
            learning_rate,
            decay,
            momentum: 0.0,
            iterations: 0,
            velocities: HashMap::new(),
        }
    }

    pub fn with_momentum(mut self, momentum: f32) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }
}

fn plain_step(parameter: Parameter<'_>, learning_rate: f32) {
    let Parameter { values, gradients } = parameter;
    dynamic_parallel_for_mut(
        DEFAULT_COST,
        values,
        |index, value| *value -= learning_rate * gradients[index],
        None,
        0,
    );
}

fn momentum_step(parameter: Parameter<'_>, velocity: &mut [f32], learning_rate: f32, momentum: f32) {
    let Parameter { values, gradients } = parameter;
    let mut slots: Vec<(&mut f32, &mut f32)> = values.iter_mut().zip(velocity.iter_mut()).collect();
    dynamic_parallel_for_mut(
        DEFAULT_COST,
        &mut slots,
        |index, (value, velocity)| {
            **velocity = momentum * **velocity - learning_rate * gradients[index];
            **value += **velocity;
        },
        None,
        0,
    );
}

impl Optimizer for Sgd {
    fn pre_update(&mut self) {
        if self.decay != 0.0 {
            self.learning_rate = decayed_learning_rate(self.initial_learning_rate, self.decay, self.iterations);
            debug!("sgd step {}: learning rate {:.6}", self.iterations, self.learning_rate);
        }
    }

    fn update_params(&mut self, layer: &mut DenseLayer) -> Result<()> {
        let learning_rate = self.learning_rate;
        let id = layer.id();
        let (rows, cols) = layer.weights().shape();
        let (weights, biases) = layer.parameters_mut()?;

        if self.momentum == 0.0 {
            plain_step(weights, learning_rate);
            plain_step(biases, learning_rate);
            return Ok(());
        }

        let velocity = self
            .velocities
            .entry(id)
            .or_insert_with(|| (Matrix::zeros(rows, cols), Vector::zeros(cols)));
        if velocity.0.shape() != (rows, cols) || velocity.1.len() != cols {
            *velocity = (Matrix::zeros(rows, cols), Vector::zeros(cols));
        }

        momentum_step(weights, velocity.0.as_mut_slice(), learning_rate, self.momentum);
        momentum_step(biases, velocity.1.as_mut_slice(), learning_rate, self.momentum);
        Ok(())
    }

    fn post_update(&mut self) {
        self.iterations += 1;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn iterations(&self) -> usize {
        self.iterations
    }

    fn reset(&mut self) {
        self.velocities.clear();
        self.iterations = 0;
        self.learning_rate = self.initial_learning_rate;
    }
}
