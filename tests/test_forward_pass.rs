// Tests for forward propagation: output dimensions and basic correctness
// against hand-computed values.

use ann_engine::layers::{DenseLayer, Layer, LeakyReluLayer, SoftmaxCrossEntropy, WeightInit};
use ann_engine::math::{Matrix, MatrixBase, VectorBase};
use ann_engine::network::Network;
use ann_engine::utils::seeded_rng;
use ann_engine::Error;
use approx::assert_relative_eq;

// ============================================================================
// Dense
// ============================================================================

#[test]
fn test_dense_forward_known_values() {
    // 2 inputs -> 3 outputs.
    let weights = Matrix::from_rows(&[vec![1.0, 0.0, -1.0], vec![2.0, 0.5, 1.0]]).unwrap();
    let biases = vec![0.1, 0.2, 0.3].into_iter().collect();
    let mut layer = DenseLayer::from_parameters(weights, biases).unwrap();

    let input = Matrix::from_rows(&[vec![1.0, 1.0], vec![0.0, -2.0]]).unwrap();
    let output = layer.forward(input.view()).unwrap();

    assert_eq!(output.shape(), (2, 3));
    let expected = [3.1, 0.7, 0.3, -3.9, -0.8, -1.7];
    for (&actual, &want) in output.as_slice().iter().zip(&expected) {
        assert_relative_eq!(actual, want, epsilon = 1e-6);
    }
}

#[test]
fn test_dense_forward_on_row_range_view() {
    let mut rng = seeded_rng(1);
    let mut layer = DenseLayer::new(3, 2, WeightInit::Xavier, &mut rng);
    let data = Matrix::from_fn(10, 3, || 0.5);

    let full = layer.forward(data.view()).unwrap().clone();
    let partial = layer.forward(data.view_rows(4, 7).unwrap()).unwrap();
    assert_eq!(partial.shape(), (3, 2));
    assert_eq!(partial.row(0).as_slice(), full.row(4).as_slice());
}

#[test]
fn test_dense_forward_rejects_wrong_width() {
    let mut layer = DenseLayer::new(4, 2, WeightInit::He, &mut seeded_rng(2));
    let input = Matrix::<f32>::zeros(3, 5);
    assert!(matches!(layer.forward(input.view()), Err(Error::ShapeMismatch(_))));
}

#[test]
fn test_dense_initialization_scale() {
    let layer = DenseLayer::new(400, 300, WeightInit::He, &mut seeded_rng(3));
    let values = layer.weights().as_slice();
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    let variance = values.iter().map(|w| (w - mean).powi(2)).sum::<f32>() / values.len() as f32;

    assert_relative_eq!(mean, 0.0, epsilon = 0.01);
    assert_relative_eq!(variance, 2.0 / 400.0, epsilon = 1e-3);
    assert!(layer.biases().as_slice().iter().all(|&b| b == 0.0));
}

// ============================================================================
// Network
// ============================================================================

#[test]
fn test_network_forward_shapes_and_probabilities() {
    let mut rng = seeded_rng(4);
    let layers: Vec<Box<dyn Layer>> = vec![
        Box::new(DenseLayer::new(6, 5, WeightInit::He, &mut rng)),
        Box::new(LeakyReluLayer::new(0.01)),
        Box::new(DenseLayer::new(5, 4, WeightInit::Xavier, &mut rng)),
    ];
    let mut network = Network::new(layers).unwrap();
    assert_eq!(network.len(), 3);
    assert_eq!(network.parameter_count(), 6 * 5 + 5 + 5 * 4 + 4);

    let batch = Matrix::from_fn(7, 6, {
        let mut x = -1.0f32;
        move || {
            x += 0.13;
            x
        }
    });
    let logits = network.forward(batch.view()).unwrap().clone();
    assert_eq!(logits.shape(), (7, 4));

    let labels = Matrix::from_vec(7, 1, vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0]).unwrap();
    let mut loss = SoftmaxCrossEntropy::new();
    let probabilities = loss.forward(logits.view(), labels.view()).unwrap();
    for row in 0..7 {
        let sum: f32 = probabilities.row(row).as_slice().iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
    }
    assert!(loss.mean() > 0.0);
    assert_eq!(loss.losses().len(), 7);
}

#[test]
fn test_network_rejects_empty_stack() {
    assert!(matches!(Network::new(Vec::new()), Err(Error::InvalidConfig(_))));
}
