//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer (also known as Linear or Fully Connected layer)
//! that performs the transformation: output = input × weights + biases

use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::math::{Matrix, MatrixBase, MatrixView, Vector, VectorBase, DEFAULT_COST, DEFAULT_TRANSPOSE_CHUNK};
use crate::utils::standard_normal;
use rand::Rng;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_LAYER_ID: AtomicUsize = AtomicUsize::new(0);

/// Weight initialization scheme for a [`DenseLayer`].
///
/// Every scheme scales a standard normal draw; biases always start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// `0.01 * N(0, 1)`
    Random,
    /// `N(0, 1) * sqrt(1 / input_size)`
    Xavier,
    /// `N(0, 1) * sqrt(2 / input_size)`, suited to ReLU-family activations.
    #[default]
    He,
}

impl WeightInit {
    /// Factor applied to a standard normal draw for a layer with `input_size` inputs.
    pub fn scale(self, input_size: usize) -> f32 {
        let fan_in = input_size.max(1) as f32;
        match self {
            WeightInit::Random => 0.01,
            WeightInit::Xavier => (1.0 / fan_in).sqrt(),
            WeightInit::He => (2.0 / fan_in).sqrt(),
        }
    }
}

/// L1/L2 penalty coefficients for weights and biases. All zero disables
/// regularization.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Regularization {
    pub weight_l1: f32,
    pub weight_l2: f32,
    pub bias_l1: f32,
    pub bias_l2: f32,
}

/// A trainable buffer paired with its gradient from the latest backward pass.
pub struct Parameter<'a> {
    pub values: &'a mut [f32],
    pub gradients: &'a [f32],
}

/// Dense (fully connected) layer with weights and biases.
///
/// Performs the linear transformation: y = xW + b
/// where x is the input (batch_size × input_size),
/// W is the weight matrix (input_size × output_size),
/// and b is the bias vector (output_size), broadcast over rows.
///
/// # Example
///
/// ```
/// use ann_engine::layers::{DenseLayer, Layer, WeightInit};
/// use ann_engine::math::{Matrix, MatrixBase};
/// use ann_engine::utils::seeded_rng;
///
/// let mut rng = seeded_rng(42);
/// let mut layer = DenseLayer::new(4, 3, WeightInit::He, &mut rng);
/// let batch = Matrix::<f32>::zeros(8, 4);
/// let output = layer.forward(batch.view()).unwrap();
/// assert_eq!(output.shape(), (8, 3));
/// ```
#[derive(Debug)]
pub struct DenseLayer {
    id: usize,
    weights: Matrix<f32>,
    biases: Vector<f32>,
    regularization: Regularization,
    input: Matrix<f32>,
    output: Matrix<f32>,
    dweights: Matrix<f32>,
    dbiases: Vector<f32>,
    dinputs: Matrix<f32>,
}

impl DenseLayer {
    /// Create a new DenseLayer with weights drawn according to `init`.
    ///
    /// # Arguments
    ///
    /// * `input_size` - Number of input features
    /// * `output_size` - Number of output features
    /// * `init` - Weight initialization scheme
    /// * `rng` - Random number generator for weight initialization
    pub fn new(input_size: usize, output_size: usize, init: WeightInit, rng: &mut impl Rng) -> Self {
        let scale = init.scale(input_size);
        let weights = Matrix::from_fn(input_size, output_size, || scale * standard_normal(&mut *rng));
        Self::with_parameters(weights, Vector::zeros(output_size))
    }

    /// Builds a layer from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns a shape-mismatch error unless `biases.len() == weights.cols()`.
    pub fn from_parameters(weights: Matrix<f32>, biases: Vector<f32>) -> Result<Self> {
        if biases.len() != weights.cols() {
            return Err(Error::ShapeMismatch(format!(
                "{} biases for {} outputs",
                biases.len(),
                weights.cols()
            )));
        }
        Ok(Self::with_parameters(weights, biases))
    }

    fn with_parameters(weights: Matrix<f32>, biases: Vector<f32>) -> Self {
        Self {
            id: NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed),
            weights,
            biases,
            regularization: Regularization::default(),
            input: Matrix::default(),
            output: Matrix::default(),
            dweights: Matrix::default(),
            dbiases: Vector::default(),
            dinputs: Matrix::default(),
        }
    }

    /// Sets the L1/L2 penalty coefficients.
    pub fn with_regularization(mut self, regularization: Regularization) -> Self {
        self.regularization = regularization;
        self
    }

    /// Process-unique identifier, used by optimizers to key per-layer state.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.cols()
    }

    pub fn weights(&self) -> &Matrix<f32> {
        &self.weights
    }

    pub fn biases(&self) -> &Vector<f32> {
        &self.biases
    }

    pub fn dweights(&self) -> &Matrix<f32> {
        &self.dweights
    }

    pub fn dbiases(&self) -> &Vector<f32> {
        &self.dbiases
    }

    pub fn regularization(&self) -> Regularization {
        self.regularization
    }

    /// Weights and biases with their gradients, for optimizers.
    ///
    /// # Errors
    ///
    /// Returns a shape-mismatch error when no backward pass has produced
    /// gradients for the current parameters.
    pub fn parameters_mut(&mut self) -> Result<(Parameter<'_>, Parameter<'_>)> {
        if self.dweights.shape() != self.weights.shape() || self.dbiases.len() != self.biases.len() {
            return Err(Error::ShapeMismatch(format!(
                "layer {} has no gradients for its {}x{} weights; run backward first",
                self.id,
                self.weights.rows(),
                self.weights.cols()
            )));
        }
        Ok((
            Parameter {
                values: self.weights.as_mut_slice(),
                gradients: self.dweights.as_slice(),
            },
            Parameter {
                values: self.biases.as_mut_slice(),
                gradients: self.dbiases.as_slice(),
            },
        ))
    }

    /// Penalty `sum(|W|)*L1w + sum(W²)*L2w + sum(|b|)*L1b + sum(b²)*L2b`.
    pub fn regularization_loss(&self) -> f32 {
        let reg = self.regularization;
        let mut loss = 0.0;
        let weights = self.weights.as_slice();
        let biases = self.biases.as_slice();

        if reg.weight_l1 > 0.0 {
            loss += reg.weight_l1 * weights.iter().map(|w| w.abs()).sum::<f32>();
        }
        if reg.weight_l2 > 0.0 {
            loss += reg.weight_l2 * weights.iter().map(|w| w * w).sum::<f32>();
        }
        if reg.bias_l1 > 0.0 {
            loss += reg.bias_l1 * biases.iter().map(|b| b.abs()).sum::<f32>();
        }
        if reg.bias_l2 > 0.0 {
            loss += reg.bias_l2 * biases.iter().map(|b| b * b).sum::<f32>();
        }
        loss
    }
}

/// Gradient of `l1 * |p| + l2 * p²`, with the L1 subgradient at zero taken as +l1.
fn penalty_gradient(param: f32, l1: f32, l2: f32) -> f32 {
    let sign = if param >= 0.0 { 1.0 } else { -1.0 };
    l1 * sign + 2.0 * l2 * param
}

/// Clones copy parameters and buffers but draw a new id, so an optimizer keeps
/// separate state for the original and the copy.
impl Clone for DenseLayer {
    fn clone(&self) -> Self {
        Self {
            id: NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed),
            weights: self.weights.clone(),
            biases: self.biases.clone(),
            regularization: self.regularization,
            input: self.input.clone(),
            output: self.output.clone(),
            dweights: self.dweights.clone(),
            dbiases: self.dbiases.clone(),
            dinputs: self.dinputs.clone(),
        }
    }
}

impl Layer for DenseLayer {
    fn forward(&mut self, input: MatrixView<'_, f32>) -> Result<&Matrix<f32>> {
        if input.cols() != self.weights.rows() {
            return Err(Error::ShapeMismatch(format!(
                "dense layer expects {} input features, got {}",
                self.weights.rows(),
                input.cols()
            )));
        }

        let mut output = Matrix::dot(&input, &self.weights)?;
        let biases = self.biases.as_slice();
        output.map_rows(
            |_, row| {
                for (value, bias) in row.iter_mut().zip(biases) {
                    *value += bias;
                }
            },
            None,
            biases.len(),
        );

        self.input.copy_from(&input);
        self.output = output;
        Ok(&self.output)
    }

    fn backward(&mut self, dvalues: MatrixView<'_, f32>) -> Result<&Matrix<f32>> {
        if dvalues.shape() != self.output.shape() {
            return Err(Error::ShapeMismatch(format!(
                "dense backward expects {}x{} gradients, got {}x{}",
                self.output.rows(),
                self.output.cols(),
                dvalues.rows(),
                dvalues.cols()
            )));
        }

        let inputs_t = self.input.transpose(DEFAULT_TRANSPOSE_CHUNK, None);
        let mut dweights = Matrix::dot(&inputs_t, &dvalues)?;
        let mut dbiases = dvalues.column_sums();
        let weights_t = self.weights.transpose(DEFAULT_TRANSPOSE_CHUNK, None);
        let dinputs = Matrix::dot(&dvalues, &weights_t)?;

        let reg = self.regularization;
        if reg.weight_l1 > 0.0 || reg.weight_l2 > 0.0 {
            dweights.transform(
                &self.weights,
                |grad, weight| *grad += penalty_gradient(weight, reg.weight_l1, reg.weight_l2),
                None,
                DEFAULT_COST,
            )?;
        }
        if reg.bias_l1 > 0.0 || reg.bias_l2 > 0.0 {
            dbiases.transform(
                &self.biases,
                |grad, bias| *grad += penalty_gradient(bias, reg.bias_l1, reg.bias_l2),
                None,
                DEFAULT_COST,
            )?;
        }

        self.dweights = dweights;
        self.dbiases = dbiases;
        self.dinputs = dinputs;
        Ok(&self.dinputs)
    }

    fn output(&self) -> &Matrix<f32> {
        &self.output
    }

    fn dinputs(&self) -> &Matrix<f32> {
        &self.dinputs
    }

    /// Returns input_size × output_size (weights) + output_size (biases).
    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    fn name(&self) -> &'static str {
        "dense"
    }

    fn as_dense(&self) -> Option<&DenseLayer> {
        Some(self)
    }

    fn as_dense_mut(&mut self) -> Option<&mut DenseLayer> {
        Some(self)
    }
}
