//! Layer abstractions for neural networks
//!
//! This module provides the Layer trait and the layer types a feed-forward
//! classifier is assembled from: Dense, Leaky ReLU, Dropout, and the fused
//! Softmax + cross-entropy loss that terminates the stack.

mod r#trait;
pub mod dense;
pub mod dropout;
pub mod leaky_relu;
pub mod softmax_loss;

// Re-export the Layer trait for convenience
pub use r#trait::Layer;
pub use dense::{DenseLayer, Parameter, Regularization, WeightInit};
pub use dropout::DropoutLayer;
pub use leaky_relu::LeakyReluLayer;
pub use softmax_loss::SoftmaxCrossEntropy;
