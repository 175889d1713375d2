//! Tests for architecture configuration parsing and network building
//!
//! This file tests the architecture module including:
//! - Loading architecture JSON files
//! - Per-layer validation and Dense size chaining
//! - Building networks from configurations

use ann_engine::architecture::{
    build_network, load_architecture, validate_architecture, ArchitectureConfig, LayerConfig,
};
use ann_engine::layers::WeightInit;
use ann_engine::math::{Matrix, MatrixBase};
use ann_engine::utils::seeded_rng;
use ann_engine::Error;
use approx::assert_relative_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ============================================================================
// Loading
// ============================================================================

mod loading_tests {
    use super::*;

    #[test]
    fn test_load_shipped_architecture() {
        let config = load_architecture("config/architectures/mlp_dropout.json").unwrap();

        assert_eq!(config.layers.len(), 6);
        assert_eq!(config.input_size(), Some(784));
        assert_eq!(config.layers[0].init, Some(WeightInit::He));
        assert_relative_eq!(config.layers[0].regularization.weight_l2, 0.0005);
        assert_relative_eq!(config.layers[2].drop_rate.unwrap(), 0.1);
        assert_eq!(config.layers[5].init, Some(WeightInit::Xavier));
    }

    #[test]
    fn test_load_simple_mlp() {
        let file = write_temp_config(
            r#"{
  "layers": [
    { "layer_type": "dense", "input_size": 784, "output_size": 256 },
    { "layer_type": "leaky_relu" },
    { "layer_type": "dense", "input_size": 256, "output_size": 10 }
  ]
}"#,
        );
        let config = load_architecture(file.path()).unwrap();

        assert_eq!(config.layers.len(), 3);
        assert_eq!(config.layers[0].output_size, Some(256));
        assert_eq!(config.layers[0].init, None);
        assert_eq!(config.layers[1].alpha, None);
        assert_eq!(config.layers[2].regularization.bias_l1, 0.0);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_architecture("config/architectures/missing.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_load_invalid_init() {
        let file = write_temp_config(
            r#"{ "layers": [ { "layer_type": "dense", "input_size": 2, "output_size": 2, "init": "lecun" } ] }"#,
        );
        assert!(matches!(load_architecture(file.path()), Err(Error::Json(_))));
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validation_tests {
    use super::*;

    fn config(layers: Vec<LayerConfig>) -> ArchitectureConfig {
        ArchitectureConfig { layers }
    }

    #[test]
    fn test_empty_architecture() {
        assert!(matches!(
            validate_architecture(&ArchitectureConfig::default()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_size_chaining_across_activations() {
        let ok = config(vec![
            LayerConfig::dense(4, 8, WeightInit::He),
            LayerConfig::leaky_relu(0.01),
            LayerConfig::dropout(0.5),
            LayerConfig::dense(8, 3, WeightInit::Xavier),
        ]);
        assert!(validate_architecture(&ok).is_ok());

        let broken = config(vec![
            LayerConfig::dense(4, 8, WeightInit::He),
            LayerConfig::leaky_relu(0.01),
            LayerConfig::dense(6, 3, WeightInit::Xavier),
        ]);
        match validate_architecture(&broken) {
            Err(Error::InvalidConfig(message)) => assert!(message.contains("mismatch")),
            other => panic!("unexpected result {:?}", other.err()),
        }
    }

    #[test]
    fn test_invalid_layers() {
        let cases = vec![
            LayerConfig {
                layer_type: "conv2d".to_string(),
                ..Default::default()
            },
            LayerConfig {
                layer_type: "dense".to_string(),
                input_size: Some(3),
                ..Default::default()
            },
            LayerConfig::dense(0, 3, WeightInit::He),
            LayerConfig {
                layer_type: "dropout".to_string(),
                ..Default::default()
            },
            LayerConfig::dropout(1.5),
            LayerConfig::leaky_relu(-0.1),
        ];
        for layer in cases {
            let description = format!("{:?}", layer);
            assert!(
                matches!(validate_architecture(&config(vec![layer])), Err(Error::InvalidConfig(_))),
                "accepted {}",
                description
            );
        }
    }

    #[test]
    fn test_negative_regularization() {
        let mut layer = LayerConfig::dense(2, 2, WeightInit::He);
        layer.regularization.weight_l2 = -1.0;
        assert!(validate_architecture(&config(vec![layer])).is_err());
    }
}

// ============================================================================
// Building
// ============================================================================

mod build_tests {
    use super::*;

    #[test]
    fn test_build_from_file() {
        let config = load_architecture("config/architectures/mlp_dropout.json").unwrap();
        let mut network = build_network(&config, &mut seeded_rng(3)).unwrap();

        assert_eq!(
            network.describe(),
            "dense -> leaky_relu -> dropout -> dense -> leaky_relu -> dense"
        );
        assert_eq!(network.parameter_count(), 784 * 32 + 32 + 32 * 16 + 16 + 16 * 10 + 10);

        let batch = Matrix::<f32>::zeros(5, 784);
        let output = network.forward(batch.view()).unwrap();
        assert_eq!(output.shape(), (5, 10));
    }

    #[test]
    fn test_build_carries_regularization() {
        let config = load_architecture("config/architectures/mlp_dropout.json").unwrap();
        let network = build_network(&config, &mut seeded_rng(3)).unwrap();
        let first = network.dense_layers().next().unwrap();
        assert_relative_eq!(first.regularization().weight_l2, 0.0005);
        assert_relative_eq!(first.regularization().bias_l2, 0.0005);
        assert!(network.regularization_loss() > 0.0);
    }

    #[test]
    fn test_same_seed_same_network() {
        let config = ArchitectureConfig::mlp(10, &[6, 4], 3, 0.01, 0.2);
        let first = build_network(&config, &mut seeded_rng(8)).unwrap();
        let second = build_network(&config, &mut seeded_rng(8)).unwrap();
        let weights = |network: &ann_engine::network::Network| {
            network
                .dense_layers()
                .map(|dense| dense.weights().clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(weights(&first), weights(&second));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = ArchitectureConfig {
            layers: vec![LayerConfig::dropout(2.0)],
        };
        assert!(build_network(&config, &mut seeded_rng(0)).is_err());
    }
}
