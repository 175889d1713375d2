//! Dropout layer implementation for regularization
//!
//! This module provides a DropoutLayer that randomly drops (sets to zero) a fraction
//! of input units during training to prevent overfitting. During evaluation, all units
//! are kept and outputs are passed through unchanged.

use crate::error::{Error, Result};
use crate::layers::Layer;
use crate::math::{Matrix, MatrixBase, MatrixView, DEFAULT_COST};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Inverted dropout layer.
///
/// During training, each unit is set to zero with probability `drop_rate` and the
/// remaining units are scaled by `1 / (1 - drop_rate)` so the expected activation is
/// unchanged. The scaled mask is retained and applied to the gradient on the way
/// back. During evaluation, forward and backward are the identity.
///
/// # Fields
///
/// * `drop_rate` - Probability of dropping each unit (0.0 = no dropout, 1.0 = drop all)
/// * `training` - Whether the layer is in training mode (true) or evaluation mode (false)
/// * `mask` - Scaled keep mask from the last training forward pass
/// * `rng` - Generator owned by the layer, reseedable for reproducible masks
///
/// # Example
///
/// ```
/// use ann_engine::layers::{DropoutLayer, Layer};
/// use ann_engine::math::{Matrix, MatrixBase};
/// use ann_engine::utils::seeded_rng;
///
/// let mut rng = seeded_rng(42);
/// let mut layer = DropoutLayer::new(0.5, &mut rng).unwrap();
/// layer.set_training(false);
/// let batch = Matrix::from_vec(1, 2, vec![1.0f32, 2.0]).unwrap();
/// assert_eq!(layer.forward(batch.view()).unwrap(), &batch);
/// ```
#[derive(Debug, Clone)]
pub struct DropoutLayer {
    drop_rate: f32,
    training: bool,
    masked: bool,
    rng: StdRng,
    mask: Matrix<f32>,
    output: Matrix<f32>,
    dinputs: Matrix<f32>,
}

impl DropoutLayer {
    /// Creates a new dropout layer in training mode.
    ///
    /// The layer's own generator is seeded from `rng`, so layers built from the same
    /// seeded generator produce the same masks.
    ///
    /// # Errors
    ///
    /// Returns an invalid-config error unless `drop_rate` lies in `[0.0, 1.0]`.
    pub fn new(drop_rate: f32, rng: &mut impl Rng) -> Result<Self> {
        if !(0.0..=1.0).contains(&drop_rate) {
            return Err(Error::InvalidConfig(format!(
                "drop_rate must be in range [0.0, 1.0], got {}",
                drop_rate
            )));
        }

        Ok(Self {
            drop_rate,
            training: true,
            masked: false,
            rng: StdRng::seed_from_u64(rng.gen()),
            mask: Matrix::default(),
            output: Matrix::default(),
            dinputs: Matrix::default(),
        })
    }

    /// Get whether the layer is in training mode.
    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Get the dropout rate.
    pub fn drop_rate(&self) -> f32 {
        self.drop_rate
    }

    /// Restarts the mask sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Scaled keep mask of the latest training forward pass.
    pub fn mask(&self) -> &Matrix<f32> {
        &self.mask
    }
}

impl Layer for DropoutLayer {
    fn forward(&mut self, input: MatrixView<'_, f32>) -> Result<&Matrix<f32>> {
        if !self.training {
            self.masked = false;
            self.output.copy_from(&input);
            return Ok(&self.output);
        }

        let drop_rate = self.drop_rate;
        let keep = 1.0 - drop_rate;
        let scale = if keep > 0.0 { 1.0 / keep } else { 0.0 };
        let rng = &mut self.rng;
        let mask = Matrix::from_fn(input.rows(), input.cols(), || {
            if rng.gen::<f32>() < drop_rate {
                0.0
            } else {
                scale
            }
        });

        let mut output = Matrix::zeros(input.rows(), input.cols());
        output.transform2(&input, &mask, |out, x, m| *out = x * m, None, DEFAULT_COST)?;

        self.mask = mask;
        self.masked = true;
        self.output = output;
        Ok(&self.output)
    }

    fn backward(&mut self, dvalues: MatrixView<'_, f32>) -> Result<&Matrix<f32>> {
        if !self.masked {
            if dvalues.shape() != self.output.shape() {
                return Err(Error::ShapeMismatch(format!(
                    "dropout backward expects {}x{} gradients, got {}x{}",
                    self.output.rows(),
                    self.output.cols(),
                    dvalues.rows(),
                    dvalues.cols()
                )));
            }
            self.dinputs.copy_from(&dvalues);
            return Ok(&self.dinputs);
        }

        let mut dinputs = Matrix::zeros(dvalues.rows(), dvalues.cols());
        dinputs.transform2(&dvalues, &self.mask, |grad, upstream, m| *grad = upstream * m, None, DEFAULT_COST)?;
        self.dinputs = dinputs;
        Ok(&self.dinputs)
    }

    fn output(&self) -> &Matrix<f32> {
        &self.output
    }

    fn dinputs(&self) -> &Matrix<f32> {
        &self.dinputs
    }

    /// Set whether the layer is in training mode.
    ///
    /// When `training` is false (evaluation mode), inputs and gradients pass
    /// through unchanged, allowing deterministic predictions.
    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn name(&self) -> &'static str {
        "dropout"
    }
}
