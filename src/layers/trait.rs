//! Layer trait definition for neural network layers
//!
//! This module defines the core Layer trait shared by every stage of the
//! pipeline that maps one batch matrix to another.

use crate::error::Result;
use crate::layers::DenseLayer;
use crate::math::{Matrix, MatrixView};

/// Core trait for neural network layers.
///
/// A layer consumes a batch (one sample per row) and produces a batch. Each layer
/// owns its `output` and `dinputs` buffers and overwrites them on every call, so
/// at most one forward/backward pair is in flight per instance.
///
/// Inputs arrive as [`MatrixView`]s, so any contiguous row range of a larger
/// matrix can be fed without copying. Whatever a layer needs from its input for
/// the backward pass is copied into a buffer the layer owns; no borrow of the
/// producer's output outlives the call.
///
/// # Example
///
/// ```ignore
/// dense.forward(batch)?;
/// activation.forward(dense.output().view())?;
///
/// activation.backward(upstream.view())?;
/// dense.backward(activation.dinputs().view())?;
/// ```
pub trait Layer {
    /// Forward propagation through the layer.
    ///
    /// # Errors
    ///
    /// Returns a shape-mismatch error when `input` does not fit the layer.
    fn forward(&mut self, input: MatrixView<'_, f32>) -> Result<&Matrix<f32>>;

    /// Backward propagation through the layer.
    ///
    /// `dvalues` is the gradient of the loss with respect to this layer's output
    /// from the latest forward pass. Returns the gradient with respect to the
    /// layer's input and stores any parameter gradients internally.
    ///
    /// # Errors
    ///
    /// Returns a shape-mismatch error when `dvalues` does not match the latest
    /// output.
    fn backward(&mut self, dvalues: MatrixView<'_, f32>) -> Result<&Matrix<f32>>;

    /// Output of the latest forward pass.
    fn output(&self) -> &Matrix<f32>;

    /// Input gradient of the latest backward pass.
    fn dinputs(&self) -> &Matrix<f32>;

    /// Number of trainable parameters.
    fn parameter_count(&self) -> usize {
        0
    }

    /// Switches between training and evaluation behaviour; a no-op for layers
    /// that behave identically in both.
    fn set_training(&mut self, _training: bool) {}

    /// Short lowercase name used in logs.
    fn name(&self) -> &'static str;

    fn as_dense(&self) -> Option<&DenseLayer> {
        None
    }

    /// Access for optimizers, which only update dense layers.
    fn as_dense_mut(&mut self) -> Option<&mut DenseLayer> {
        None
    }
}
