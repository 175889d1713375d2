//! From-scratch matrix engine and feed-forward network training library
//!
//! This library provides row-major numeric containers with adaptive fork-join
//! parallelism, and the layers, loss and optimizers needed to train a
//! multi-layer perceptron classifier on them.
//!
//! # Modules
//!
//! - `math`: Matrix/Vector containers and borrowed views
//! - `layers`: Layer trait and implementations (Dense, LeakyReLU, Dropout, Softmax + cross-entropy)
//! - `optimizers`: Optimizer trait and implementations (Adam, SGD)
//! - `network`: Layer stack with mini-batch training and evaluation loops
//! - `dataset`: IDX (MNIST) file loading
//! - `utils`: Parallel execution engine, RNG helpers, scalar activation functions
//! - `config`: Training configuration structures
//! - `architecture`: Architecture configuration and network building
//!
//! # Example
//!
//! ```
//! use ann_engine::architecture::{build_network, ArchitectureConfig};
//! use ann_engine::layers::SoftmaxCrossEntropy;
//! use ann_engine::math::Matrix;
//! use ann_engine::optimizers::Adam;
//! use ann_engine::utils::seeded_rng;
//!
//! let mut rng = seeded_rng(42);
//! let config = ArchitectureConfig::mlp(2, &[8], 2, 0.01, 0.0);
//! let mut network = build_network(&config, &mut rng).unwrap();
//!
//! let samples = Matrix::from_vec(2, 2, vec![1.0f32, 0.0, 0.0, 1.0]).unwrap();
//! let labels = Matrix::from_vec(2, 1, vec![0.0f32, 1.0]).unwrap();
//! let mut loss = SoftmaxCrossEntropy::new();
//! let mut optimizer = Adam::new(0.01, 0.0);
//!
//! let report = network
//!     .train_epoch(&samples, &labels, 2, &mut loss, &mut optimizer, &mut rng)
//!     .unwrap();
//! assert!(report.data_loss > 0.0);
//! ```

pub mod architecture;
pub mod config;
pub mod dataset;
pub mod error;
pub mod layers;
pub mod math;
pub mod network;
pub mod optimizers;
pub mod utils;

pub use error::{Error, Result};
