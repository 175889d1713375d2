//! Architecture configuration structures
//!
//! This module provides configuration structures for defining network
//! architectures via JSON configuration files, so layer stacks can be changed
//! without code changes.

use crate::error::{Error, Result};
use crate::layers::{DenseLayer, DropoutLayer, LeakyReluLayer, Layer, Regularization, WeightInit};
use crate::network::Network;
use log::info;
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Slope used for negative inputs when a Leaky ReLU layer omits `alpha`.
pub const DEFAULT_LEAKY_RELU_ALPHA: f32 = 0.01;

/// Configuration for a single layer in the network.
///
/// Defines the layer type and its parameters. Different layer types require different fields:
///
/// - **Dense**: Requires `input_size` and `output_size`; optional `init`
///   (`random`, `xavier` or `he`, default `he`) and `weight_l1`, `weight_l2`,
///   `bias_l1`, `bias_l2` (default 0)
/// - **LeakyReLU**: Optional `alpha` (default 0.01)
/// - **Dropout**: Requires `drop_rate` (probability of dropping units, range [0.0, 1.0])
///
/// # Examples
///
/// ```json
/// {
///   "layer_type": "dense",
///   "input_size": 784,
///   "output_size": 128,
///   "init": "he",
///   "weight_l2": 0.0005
/// }
/// ```
///
/// ```json
/// { "layer_type": "leaky_relu", "alpha": 0.01 }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerConfig {
    /// Type of layer: "dense", "leaky_relu", or "dropout"
    pub layer_type: String,

    // Dense layer parameters
    /// Input size for Dense layer
    pub input_size: Option<usize>,
    /// Output size for Dense layer
    pub output_size: Option<usize>,
    /// Weight initialization scheme for Dense layer
    pub init: Option<WeightInit>,
    /// L1/L2 penalties for Dense layer
    #[serde(flatten)]
    pub regularization: Regularization,

    // Leaky ReLU parameters
    /// Negative slope for Leaky ReLU layer (default: 0.01)
    pub alpha: Option<f32>,

    // Dropout layer parameters
    /// Drop rate for Dropout layer (probability of dropping units)
    pub drop_rate: Option<f32>,
}

impl LayerConfig {
    pub fn dense(input_size: usize, output_size: usize, init: WeightInit) -> Self {
        Self {
            layer_type: "dense".to_string(),
            input_size: Some(input_size),
            output_size: Some(output_size),
            init: Some(init),
            ..Default::default()
        }
    }

    pub fn leaky_relu(alpha: f32) -> Self {
        Self {
            layer_type: "leaky_relu".to_string(),
            alpha: Some(alpha),
            ..Default::default()
        }
    }

    pub fn dropout(drop_rate: f32) -> Self {
        Self {
            layer_type: "dropout".to_string(),
            drop_rate: Some(drop_rate),
            ..Default::default()
        }
    }
}

/// Configuration for the entire network architecture.
///
/// Contains a sequence of layer configurations that define the network structure.
/// Layers are applied in the order they appear in the configuration.
///
/// # Example
///
/// ```json
/// {
///   "layers": [
///     { "layer_type": "dense", "input_size": 784, "output_size": 32 },
///     { "layer_type": "leaky_relu" },
///     { "layer_type": "dropout", "drop_rate": 0.1 },
///     { "layer_type": "dense", "input_size": 32, "output_size": 10, "init": "xavier" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchitectureConfig {
    /// Sequence of layer configurations defining the network structure
    pub layers: Vec<LayerConfig>,
}

impl ArchitectureConfig {
    /// Multi-layer perceptron `input -> hidden... -> classes` with He-initialized
    /// Dense layers, each hidden one followed by Leaky ReLU and, for a non-zero
    /// `drop_rate`, Dropout.
    pub fn mlp(input_size: usize, hidden: &[usize], classes: usize, alpha: f32, drop_rate: f32) -> Self {
        let mut layers = Vec::new();
        let mut width = input_size;
        for &size in hidden {
            layers.push(LayerConfig::dense(width, size, WeightInit::He));
            layers.push(LayerConfig::leaky_relu(alpha));
            if drop_rate > 0.0 {
                layers.push(LayerConfig::dropout(drop_rate));
            }
            width = size;
        }
        layers.push(LayerConfig::dense(width, classes, WeightInit::He));
        Self { layers }
    }

    /// Width of the network input, taken from the first Dense layer.
    pub fn input_size(&self) -> Option<usize> {
        self.layers
            .iter()
            .find(|layer| layer.layer_type.eq_ignore_ascii_case("dense"))
            .and_then(|layer| layer.input_size)
    }
}

/// Loads an architecture configuration from a JSON file.
///
/// Reads the file at `path`, deserializes its JSON contents into an
/// `ArchitectureConfig` and validates the layer stack.
///
/// # Examples
///
/// ```no_run
/// use ann_engine::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/mlp_dropout.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path)?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

/// Checks every layer and the chaining of Dense sizes.
///
/// Activation and dropout layers keep the width of their input, so each Dense
/// layer's `input_size` must equal the previous Dense layer's `output_size`.
///
/// # Errors
///
/// Returns an invalid-config error with a descriptive message.
pub fn validate_architecture(config: &ArchitectureConfig) -> Result<()> {
    if config.layers.is_empty() {
        return Err(Error::InvalidConfig("Architecture must have at least one layer".to_string()));
    }

    let mut width: Option<(usize, usize)> = None;
    for (index, layer) in config.layers.iter().enumerate() {
        validate_layer(layer, index)?;

        if let (Some(input), Some(output)) = (layer.input_size, layer.output_size) {
            if let Some((previous_index, previous_output)) = width {
                if previous_output != input {
                    return Err(Error::InvalidConfig(format!(
                        "Layer connection mismatch: Layer {} output size ({}) does not match Layer {} input size ({})",
                        previous_index, previous_output, index, input
                    )));
                }
            }
            width = Some((index, output));
        }
    }

    Ok(())
}

/// Validates a single layer configuration.
///
/// Checks that the layer has all required fields for its type and that
/// parameter values are within valid ranges.
fn validate_layer(layer: &LayerConfig, index: usize) -> Result<()> {
    let fail = |message: String| Err(Error::InvalidConfig(format!("Layer {}: {}", index, message)));

    match layer.layer_type.to_lowercase().as_str() {
        "dense" => {
            match (layer.input_size, layer.output_size) {
                (None, _) => return fail("Dense layer requires 'input_size'".to_string()),
                (_, None) => return fail("Dense layer requires 'output_size'".to_string()),
                (Some(0), _) => return fail("input_size must be greater than 0".to_string()),
                (_, Some(0)) => return fail("output_size must be greater than 0".to_string()),
                _ => {}
            }
            let reg = layer.regularization;
            let penalties = [reg.weight_l1, reg.weight_l2, reg.bias_l1, reg.bias_l2];
            if penalties.iter().any(|&penalty| !(penalty >= 0.0 && penalty.is_finite())) {
                return fail("regularization coefficients must be non-negative".to_string());
            }
        }
        "leaky_relu" => {
            if let Some(alpha) = layer.alpha {
                if !(alpha >= 0.0 && alpha.is_finite()) {
                    return fail(format!("alpha must be non-negative, got {}", alpha));
                }
            }
        }
        "dropout" => match layer.drop_rate {
            None => return fail("Dropout layer requires 'drop_rate'".to_string()),
            Some(rate) if !(0.0..=1.0).contains(&rate) => {
                return fail(format!("drop_rate must be in range [0.0, 1.0], got {}", rate));
            }
            Some(_) => {}
        },
        other => {
            return fail(format!(
                "Invalid layer type '{}'. Must be one of: dense, leaky_relu, dropout",
                other
            ));
        }
    }

    Ok(())
}

/// Builds a network from a validated architecture.
///
/// Dense weights and dropout generators are drawn from `rng` in layer order,
/// so the same seed builds the same network.
pub fn build_network(config: &ArchitectureConfig, rng: &mut impl Rng) -> Result<Network> {
    validate_architecture(config)?;

    let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(config.layers.len());
    for layer in &config.layers {
        match layer.layer_type.to_lowercase().as_str() {
            "dense" => {
                let (input_size, output_size) = match (layer.input_size, layer.output_size) {
                    (Some(input), Some(output)) => (input, output),
                    _ => return Err(Error::InvalidConfig("Dense layer requires sizes".to_string())),
                };
                let init = layer.init.unwrap_or_default();
                let dense = DenseLayer::new(input_size, output_size, init, &mut *rng)
                    .with_regularization(layer.regularization);
                layers.push(Box::new(dense));
            }
            "leaky_relu" => {
                let alpha = layer.alpha.unwrap_or(DEFAULT_LEAKY_RELU_ALPHA);
                layers.push(Box::new(LeakyReluLayer::new(alpha)));
            }
            "dropout" => {
                let rate = layer.drop_rate.unwrap_or(0.0);
                layers.push(Box::new(DropoutLayer::new(rate, &mut *rng)?));
            }
            other => {
                return Err(Error::InvalidConfig(format!("Invalid layer type '{}'", other)));
            }
        }
    }

    let network = Network::new(layers)?;
    info!(
        "built network {} with {} parameters",
        network.describe(),
        network.parameter_count()
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Matrix, MatrixBase};
    use crate::utils::seeded_rng;

    #[test]
    fn test_validate_dense_layer() {
        let layer = LayerConfig::dense(784, 128, WeightInit::He);
        assert!(validate_layer(&layer, 0).is_ok());
    }

    #[test]
    fn test_validate_dense_layer_missing_fields() {
        let layer = LayerConfig {
            layer_type: "dense".to_string(),
            input_size: Some(784),
            ..Default::default()
        };
        assert!(validate_layer(&layer, 0).is_err());
    }

    #[test]
    fn test_validate_negative_regularization() {
        let mut layer = LayerConfig::dense(4, 2, WeightInit::He);
        layer.regularization.weight_l2 = -1.0;
        assert!(validate_layer(&layer, 0).is_err());
    }

    #[test]
    fn test_validate_invalid_layer_type() {
        let layer = LayerConfig {
            layer_type: "conv2d".to_string(),
            ..Default::default()
        };
        assert!(matches!(validate_layer(&layer, 0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_empty_architecture() {
        assert!(validate_architecture(&ArchitectureConfig::default()).is_err());
    }

    #[test]
    fn test_validate_dropout_layer() {
        assert!(validate_layer(&LayerConfig::dropout(0.5), 0).is_ok());
        assert!(validate_layer(&LayerConfig::dropout(1.0), 0).is_ok());
        assert!(validate_layer(&LayerConfig::dropout(1.5), 0).is_err());
        let missing = LayerConfig {
            layer_type: "dropout".to_string(),
            ..Default::default()
        };
        assert!(validate_layer(&missing, 0).is_err());
    }

    #[test]
    fn test_validate_layer_connection_mismatch() {
        let config = ArchitectureConfig {
            layers: vec![
                LayerConfig::dense(784, 64, WeightInit::He),
                LayerConfig::leaky_relu(0.01),
                LayerConfig::dense(32, 10, WeightInit::He),
            ],
        };
        let err = validate_architecture(&config).unwrap_err();
        assert!(err.to_string().contains("Layer 0 output size (64)"));
    }

    #[test]
    fn test_mlp_layout() {
        let config = ArchitectureConfig::mlp(784, &[32, 16], 10, 0.01, 0.1);
        let types: Vec<&str> = config.layers.iter().map(|l| l.layer_type.as_str()).collect();
        assert_eq!(
            types,
            ["dense", "leaky_relu", "dropout", "dense", "leaky_relu", "dropout", "dense"]
        );
        assert_eq!(config.input_size(), Some(784));
        assert!(validate_architecture(&config).is_ok());
    }

    #[test]
    fn test_build_network() {
        let config = ArchitectureConfig::mlp(4, &[8], 3, 0.01, 0.0);
        let mut network = build_network(&config, &mut seeded_rng(42)).unwrap();

        assert_eq!(network.describe(), "dense -> leaky_relu -> dense");
        assert_eq!(network.parameter_count(), 4 * 8 + 8 + 8 * 3 + 3);

        let batch = Matrix::<f32>::zeros(5, 4);
        assert_eq!(network.forward(batch.view()).unwrap().shape(), (5, 3));
    }

    #[test]
    fn test_build_network_is_deterministic() {
        let config = ArchitectureConfig::mlp(6, &[5], 2, 0.01, 0.2);
        let first = build_network(&config, &mut seeded_rng(9)).unwrap();
        let second = build_network(&config, &mut seeded_rng(9)).unwrap();

        let weights = |network: &Network| -> Vec<Matrix<f32>> {
            network.dense_layers().map(|dense| dense.weights().clone()).collect()
        };
        assert_eq!(weights(&first), weights(&second));
    }

    #[test]
    fn test_parse_regularization_fields() {
        let json = r#"{
            "layers": [
                { "layer_type": "dense", "input_size": 2, "output_size": 2,
                  "init": "xavier", "weight_l2": 0.001, "bias_l1": 0.5 }
            ]
        }"#;
        let config: ArchitectureConfig = serde_json::from_str(json).unwrap();
        let layer = &config.layers[0];
        assert_eq!(layer.init, Some(WeightInit::Xavier));
        assert_eq!(layer.regularization.weight_l2, 0.001);
        assert_eq!(layer.regularization.bias_l1, 0.5);
        assert_eq!(layer.regularization.weight_l1, 0.0);
    }
}
