//! Shared utilities for the container model and the layers
//!
//! This module provides the fork-join execution engine, random number helpers,
//! and the scalar activation functions used by the layers.

pub mod activations;
pub mod parallel;
pub mod rng;

pub use activations::{leaky_relu, leaky_relu_derivative, softmax_in_place};
pub use rng::{seeded_rng, shuffled_indices, standard_normal};
