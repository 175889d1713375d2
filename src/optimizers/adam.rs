//! Adam (Adaptive Moment Estimation) optimizer implementation
//!
//! This module provides the Adam optimizer, which combines momentum and
//! adaptive learning rates with bias correction for improved convergence.

use crate::error::Result;
use crate::layers::DenseLayer;
use crate::math::{Matrix, MatrixBase, Vector, VectorBase};
use crate::optimizers::{decayed_learning_rate, Optimizer};
use crate::utils::parallel::dynamic_parallel_for_mut;
use log::debug;
use std::collections::HashMap;

pub const DEFAULT_BETA1: f32 = 0.9;
pub const DEFAULT_BETA2: f32 = 0.999;
pub const DEFAULT_EPSILON: f32 = 1e-7;

/// First and second moment estimates for one layer.
#[derive(Debug, Clone)]
struct Moments {
    weight_m: Matrix<f32>,
    weight_v: Matrix<f32>,
    bias_m: Vector<f32>,
    bias_v: Vector<f32>,
}

impl Moments {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            weight_m: Matrix::zeros(rows, cols),
            weight_v: Matrix::zeros(rows, cols),
            bias_m: Vector::zeros(cols),
            bias_v: Vector::zeros(cols),
        }
    }

    fn fits(&self, rows: usize, cols: usize) -> bool {
        self.weight_m.shape() == (rows, cols) && self.bias_m.len() == cols
    }
}

/// Adam (Adaptive Moment Estimation) optimizer.
///
/// Adam keeps two moving averages for every parameter:
///
/// 1. First moment (mean) of gradients (momentum)
/// 2. Second moment (uncentered variance) of gradients (adaptive step size)
///
/// The update rule, with `t` the number of completed steps, is:
///
/// ```text
/// m = β1 * m + (1 - β1) * gradient
/// v = β2 * v + (1 - β2) * gradient²
/// m_hat = m / (1 - β1^(t+1))
/// v_hat = v / (1 - β2^(t+1))
/// parameter = parameter - lr * m_hat / (√v_hat + ε)
/// ```
///
/// where `lr` follows the decay schedule `initial_lr / (1 + decay * t)`.
///
/// # Example
///
/// ```
/// use ann_engine::optimizers::{Adam, Optimizer};
///
/// let optimizer = Adam::new(0.001, 0.0).with_betas(0.9, 0.99);
/// assert_eq!(optimizer.learning_rate(), 0.001);
/// ```
///
/// # Reference
///
/// Kingma, D. P., & Ba, J. (2014). Adam: A method for stochastic optimization.
/// arXiv preprint arXiv:1412.6980.
#[derive(Debug, Clone)]
pub struct Adam {
    initial_learning_rate: f32,
    learning_rate: f32,
    decay: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    iterations: usize,
    moments: HashMap<usize, Moments>,
}

impl Adam {
    /// Creates a new Adam optimizer with default betas (0.9, 0.999) and
    /// epsilon (1e-7).
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
            beta1: DEFAULT_BETA1,
            beta2: DEFAULT_BETA2,
            epsilon: DEFAULT_EPSILON,
            iterations: 0,
            moments: HashMap::new(),
        }
    }

    pub fn with_betas(mut self, beta1: f32, beta2: f32) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn beta1(&self) -> f32 {
        self.beta1
    }

    pub fn beta2(&self) -> f32 {
        self.beta2
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }
}

/// Step-wide coefficients shared by every parameter in one update.
#[derive(Clone, Copy)]
struct StepCoefficients {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    correction1: f32,
    correction2: f32,
}

/// Per-element price of one Adam update for the parallel heuristic.
const UPDATE_COST: usize = 10;

fn adam_step(values: &mut [f32], gradients: &[f32], m: &mut [f32], v: &mut [f32], c: StepCoefficients) {
    let mut slots: Vec<(&mut f32, &mut f32, &mut f32)> = values
        .iter_mut()
        .zip(m.iter_mut())
        .zip(v.iter_mut())
        .map(|((value, m), v)| (value, m, v))
        .collect();
    dynamic_parallel_for_mut(
        UPDATE_COST,
        &mut slots,
        |index, (value, m, v)| {
            let gradient = gradients[index];
            **m = c.beta1 * **m + (1.0 - c.beta1) * gradient;
            **v = c.beta2 * **v + (1.0 - c.beta2) * gradient * gradient;
            let m_hat = **m / c.correction1;
            let v_hat = **v / c.correction2;
            **value -= c.learning_rate * m_hat / (v_hat.sqrt() + c.epsilon);
        },
        None,
        0,
    );
}

impl Optimizer for Adam {
    fn pre_update(&mut self) {
        if self.decay != 0.0 {
            self.learning_rate = decayed_learning_rate(self.initial_learning_rate, self.decay, self.iterations);
            debug!("adam step {}: learning rate {:.6}", self.iterations, self.learning_rate);
        }
    }

    fn update_params(&mut self, layer: &mut DenseLayer) -> Result<()> {
        let step = self.iterations as i32 + 1;
        let coefficients = StepCoefficients {
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            correction1: 1.0 - self.beta1.powi(step),
            correction2: 1.0 - self.beta2.powi(step),
        };

        let id = layer.id();
        let (rows, cols) = layer.weights().shape();
        let (weights, biases) = layer.parameters_mut()?;

        let moments = self.moments.entry(id).or_insert_with(|| Moments::new(rows, cols));
        if !moments.fits(rows, cols) {
            *moments = Moments::new(rows, cols);
        }

        adam_step(
            weights.values,
            weights.gradients,
            moments.weight_m.as_mut_slice(),
            moments.weight_v.as_mut_slice(),
            coefficients,
        );
        adam_step(
            biases.values,
            biases.gradients,
            moments.bias_m.as_mut_slice(),
            moments.bias_v.as_mut_slice(),
            coefficients,
        );
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
        self.moments.clear();
        self.iterations = 0;
        self.learning_rate = self.initial_learning_rate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Layer;
    use approx::assert_relative_eq;

    /// Layer with one weight and one bias whose gradients are both `gradient`.
    fn layer_with_gradient(gradient: f32) -> DenseLayer {
        let weights = Matrix::from_vec(1, 1, vec![1.0]).unwrap();
        let mut layer = DenseLayer::from_parameters(weights, Vector::from_vec(vec![0.0])).unwrap();
        let input = Matrix::from_vec(1, 1, vec![1.0]).unwrap();
        layer.forward(input.view()).unwrap();
        let dvalues = Matrix::from_vec(1, 1, vec![gradient]).unwrap();
        layer.backward(dvalues.view()).unwrap();
        layer
    }

    fn step(optimizer: &mut Adam, layer: &mut DenseLayer) {
        optimizer.pre_update();
        optimizer.update_params(layer).unwrap();
        optimizer.post_update();
    }

    #[test]
    fn test_adam_new() {
        let optimizer = Adam::new(0.001, 0.0);
        assert_eq!(optimizer.learning_rate(), 0.001);
        assert_eq!(optimizer.beta1(), 0.9);
        assert_eq!(optimizer.beta2(), 0.999);
        assert_eq!(optimizer.epsilon(), 1e-7);
        assert_eq!(optimizer.iterations(), 0);
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        // With bias correction the first step is lr * g / (|g| + eps) ≈ lr.
        let mut optimizer = Adam::new(0.01, 0.0);
        let mut layer = layer_with_gradient(0.5);
        step(&mut optimizer, &mut layer);

        assert_relative_eq!(layer.weights()[(0, 0)], 0.99, epsilon = 1e-5);
        assert_relative_eq!(layer.biases()[0], -0.01, epsilon = 1e-5);
        assert_eq!(optimizer.iterations(), 1);
    }

    #[test]
    fn test_adam_learning_rate_decay() {
        let mut optimizer = Adam::new(0.1, 0.5);
        let mut layer = layer_with_gradient(1.0);

        step(&mut optimizer, &mut layer);
        assert_relative_eq!(optimizer.learning_rate(), 0.1);
        step(&mut optimizer, &mut layer);
        assert_relative_eq!(optimizer.learning_rate(), 0.1 / 1.5);
        step(&mut optimizer, &mut layer);
        assert_relative_eq!(optimizer.learning_rate(), 0.05);
    }

    #[test]
    fn test_adam_state_is_per_layer() {
        let mut optimizer = Adam::new(0.01, 0.0);
        let mut first = layer_with_gradient(1.0);
        let mut second = layer_with_gradient(-1.0);

        optimizer.pre_update();
        optimizer.update_params(&mut first).unwrap();
        optimizer.update_params(&mut second).unwrap();
        optimizer.post_update();

        assert_eq!(optimizer.moments.len(), 2);
        assert!(first.weights()[(0, 0)] < 1.0);
        assert!(second.weights()[(0, 0)] > 1.0);
    }

    #[test]
    fn test_adam_reset() {
        let mut optimizer = Adam::new(0.1, 1.0);
        let mut layer = layer_with_gradient(0.3);
        step(&mut optimizer, &mut layer);
        step(&mut optimizer, &mut layer);

        optimizer.reset();

        assert_eq!(optimizer.iterations(), 0);
        assert!(optimizer.moments.is_empty());
        assert_eq!(optimizer.learning_rate(), 0.1);
    }

    #[test]
    fn test_adam_requires_gradients() {
        let weights = Matrix::from_vec(1, 1, vec![1.0]).unwrap();
        let mut layer = DenseLayer::from_parameters(weights, Vector::from_vec(vec![0.0])).unwrap();
        let mut optimizer = Adam::new(0.01, 0.0);
        assert!(optimizer.update_params(&mut layer).is_err());
        assert!(optimizer.moments.is_empty());
    }

    #[test]
    fn test_adam_clones_keep_separate_moments() {
        let mut original = layer_with_gradient(1.0);
        let mut copy = original.clone();
        let dvalues = Matrix::from_vec(1, 1, vec![-1.0]).unwrap();
        copy.backward(dvalues.view()).unwrap();

        let mut optimizer = Adam::new(0.1, 0.0);
        optimizer.pre_update();
        optimizer.update_params(&mut original).unwrap();
        optimizer.update_params(&mut copy).unwrap();
        optimizer.post_update();

        // Each layer takes a full first step of size lr in its own direction.
        assert_eq!(optimizer.moments.len(), 2);
        assert_relative_eq!(original.weights()[(0, 0)], 0.9, epsilon = 1e-5);
        assert_relative_eq!(copy.weights()[(0, 0)], 1.1, epsilon = 1e-5);
    }

    #[test]
    fn test_adam_large_layer_matches_elementwise_rule() {
        // 300 x 300 weights take the parallel path.
        let weights = Matrix::from_fn(300, 300, || 0.5);
        let mut layer = DenseLayer::from_parameters(weights, Vector::zeros(300)).unwrap();
        let input = Matrix::from_fn(2, 300, || 1.0);
        layer.forward(input.view()).unwrap();
        let dvalues = Matrix::from_fn(2, 300, || 0.25);
        layer.backward(dvalues.view()).unwrap();

        let mut optimizer = Adam::new(0.01, 0.0);
        step(&mut optimizer, &mut layer);

        assert!(layer.weights().as_slice().iter().all(|&w| (w - 0.49).abs() < 1e-5));
        assert!(layer.biases().as_slice().iter().all(|&b| (b + 0.01).abs() < 1e-5));
    }

    #[test]
    fn test_adam_adaptive_learning_rates() {
        let mut optimizer = Adam::new(0.01, 0.0);
        let mut large = layer_with_gradient(10.0);
        let mut small = layer_with_gradient(0.1);

        for _ in 0..5 {
            optimizer.pre_update();
            optimizer.update_params(&mut large).unwrap();
            optimizer.update_params(&mut small).unwrap();
            optimizer.post_update();
        }

        // Both parameters should have moved by a similar amount despite very
        // different gradient magnitudes
        let large_step = 1.0 - large.weights()[(0, 0)];
        let small_step = 1.0 - small.weights()[(0, 0)];
        assert_relative_eq!(large_step, small_step, max_relative = 0.01);
    }
}
