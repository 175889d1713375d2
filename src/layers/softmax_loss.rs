//! Softmax activation fused with categorical cross-entropy loss

use crate::error::{Error, Result};
use crate::layers::DenseLayer;
use crate::math::{Matrix, MatrixBase, MatrixView, Vector, VectorBase, DEFAULT_COST};
use crate::utils::softmax_in_place;

/// Lower clamp applied to predicted probabilities before taking the log.
pub const PROBABILITY_EPSILON: f32 = 1e-7;

/// Row-wise softmax followed by categorical cross-entropy.
///
/// Fusing the two gives the simple gradient `(softmax - one_hot) / batch_size`
/// with respect to the logits.
///
/// Labels come in one of two layouts:
/// - a single column of class indices (stored as `f32`),
/// - one-hot rows as wide as the logits, the class being the row's argmax.
///
/// # Example
///
/// ```
/// use ann_engine::layers::SoftmaxCrossEntropy;
/// use ann_engine::math::{Matrix, MatrixBase};
///
/// let logits = Matrix::from_vec(2, 2, vec![2.0f32, 0.0, 0.0, 2.0]).unwrap();
/// let labels = Matrix::from_vec(2, 1, vec![0.0f32, 1.0]).unwrap();
/// let mut loss = SoftmaxCrossEntropy::new();
/// loss.forward(logits.view(), labels.view()).unwrap();
/// assert_eq!(loss.accuracy(), 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SoftmaxCrossEntropy {
    output: Matrix<f32>,
    classes: Vec<usize>,
    losses: Vector<f32>,
    dinputs: Matrix<f32>,
}

impl SoftmaxCrossEntropy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes softmax probabilities and per-sample losses for a batch.
    ///
    /// # Errors
    ///
    /// - shape mismatch when the label and logit row counts differ, or the labels
    ///   are neither one column nor as wide as the logits
    /// - range error when a class index is not a whole number below the logit
    ///   width
    pub fn forward(&mut self, logits: MatrixView<'_, f32>, labels: MatrixView<'_, f32>) -> Result<&Matrix<f32>> {
        let classes = class_indices(&logits, &labels)?;

        let mut output = logits.to_matrix();
        output.map_rows(|_, row| softmax_in_place(row), None, logits.cols() * DEFAULT_COST);

        self.losses = classes
            .iter()
            .enumerate()
            .map(|(row, &class)| {
                let p = output[(row, class)].clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
                -p.ln()
            })
            .collect();
        self.classes = classes;
        self.output = output;
        Ok(&self.output)
    }

    /// Average sample loss of the latest forward pass; 0 for an empty batch.
    pub fn mean(&self) -> f32 {
        if self.losses.is_empty() {
            return 0.0;
        }
        self.losses.sum() / self.losses.len() as f32
    }

    /// Fraction of rows whose most probable class is the true class.
    pub fn accuracy(&self) -> f32 {
        if self.classes.is_empty() {
            return 0.0;
        }
        let predictions = self.output.argmax_row();
        let correct = predictions
            .as_slice()
            .iter()
            .zip(&self.classes)
            .filter(|(predicted, actual)| predicted == actual)
            .count();
        correct as f32 / self.classes.len() as f32
    }

    /// Gradient of the mean loss with respect to the logits.
    ///
    /// # Errors
    ///
    /// Returns a shape-mismatch error when called before any forward pass.
    pub fn backward(&mut self) -> Result<&Matrix<f32>> {
        if self.output.rows() != self.classes.len() || self.classes.is_empty() {
            return Err(Error::ShapeMismatch(
                "softmax cross-entropy backward needs a preceding forward pass".to_string(),
            ));
        }

        let samples = self.classes.len() as f32;
        let classes = &self.classes;
        let mut dinputs = self.output.clone();
        dinputs.map_rows(
            |row, values| {
                values[classes[row]] -= 1.0;
                for value in values.iter_mut() {
                    *value /= samples;
                }
            },
            None,
            self.output.cols(),
        );

        self.dinputs = dinputs;
        Ok(&self.dinputs)
    }

    /// Softmax probabilities of the latest forward pass.
    pub fn output(&self) -> &Matrix<f32> {
        &self.output
    }

    pub fn dinputs(&self) -> &Matrix<f32> {
        &self.dinputs
    }

    /// Per-sample losses of the latest forward pass.
    pub fn losses(&self) -> &Vector<f32> {
        &self.losses
    }

    /// Regularization penalty of `layer`, reported next to the data loss.
    pub fn regularization_loss(&self, layer: &DenseLayer) -> f32 {
        layer.regularization_loss()
    }
}

/// True class of every row, from either label layout.
fn class_indices(logits: &MatrixView<'_, f32>, labels: &MatrixView<'_, f32>) -> Result<Vec<usize>> {
    if labels.rows() != logits.rows() {
        return Err(Error::ShapeMismatch(format!(
            "{} label rows for {} logit rows",
            labels.rows(),
            logits.rows()
        )));
    }

    let width = logits.cols();
    if labels.cols() == 1 {
        labels
            .as_slice()
            .iter()
            .map(|&label| {
                if label < 0.0 || label.fract() != 0.0 || label as usize >= width {
                    Err(Error::Range(format!(
                        "label {} is not a class index below {}",
                        label, width
                    )))
                } else {
                    Ok(label as usize)
                }
            })
            .collect()
    } else if labels.cols() == width {
        Ok(labels.argmax_row().into_vec())
    } else {
        Err(Error::ShapeMismatch(format!(
            "labels must have 1 or {} columns, got {}",
            width,
            labels.cols()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_logits_loss() {
        let logits = Matrix::<f32>::zeros(3, 4);
        let labels = Matrix::from_vec(3, 1, vec![0.0, 1.0, 3.0]).unwrap();
        let mut loss = SoftmaxCrossEntropy::new();
        let probabilities = loss.forward(logits.view(), labels.view()).unwrap();

        assert!(probabilities.as_slice().iter().all(|&p| (p - 0.25).abs() < 1e-6));
        assert_relative_eq!(loss.mean(), 4.0f32.ln(), epsilon = 1e-5);
    }

    #[test]
    fn test_rows_sum_to_one_with_large_logits() {
        let logits = Matrix::from_vec(2, 3, vec![1000.0, 1001.0, 1002.0, -5.0, 0.0, 5.0]).unwrap();
        let labels = Matrix::from_vec(2, 1, vec![2.0, 0.0]).unwrap();
        let mut loss = SoftmaxCrossEntropy::new();
        let probabilities = loss.forward(logits.view(), labels.view()).unwrap();

        for row in 0..2 {
            assert_relative_eq!(probabilities.row(row).sum(), 1.0, epsilon = 1e-5);
        }
        assert!(loss.mean().is_finite());
    }

    #[test]
    fn test_confident_wrong_prediction_is_clamped() {
        let logits = Matrix::from_vec(1, 2, vec![0.0, 200.0]).unwrap();
        let labels = Matrix::from_vec(1, 1, vec![0.0]).unwrap();
        let mut loss = SoftmaxCrossEntropy::new();
        loss.forward(logits.view(), labels.view()).unwrap();

        assert_relative_eq!(loss.mean(), -(PROBABILITY_EPSILON.ln()), epsilon = 1e-3);
    }

    #[test]
    fn test_one_hot_labels_match_index_labels() {
        let logits = Matrix::from_vec(2, 3, vec![0.5, 1.5, -1.0, 2.0, 0.0, 0.1]).unwrap();
        let indices = Matrix::from_vec(2, 1, vec![1.0, 2.0]).unwrap();
        let one_hot = Matrix::from_vec(2, 3, vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0]).unwrap();

        let mut by_index = SoftmaxCrossEntropy::new();
        by_index.forward(logits.view(), indices.view()).unwrap();
        let mut by_one_hot = SoftmaxCrossEntropy::new();
        by_one_hot.forward(logits.view(), one_hot.view()).unwrap();

        assert_eq!(by_index.mean(), by_one_hot.mean());
        assert_eq!(by_index.accuracy(), 0.5);
        assert_eq!(by_one_hot.accuracy(), 0.5);
    }

    #[test]
    fn test_backward_gradient() {
        let logits = Matrix::<f32>::zeros(2, 2);
        let labels = Matrix::from_vec(2, 1, vec![0.0, 1.0]).unwrap();
        let mut loss = SoftmaxCrossEntropy::new();
        loss.forward(logits.view(), labels.view()).unwrap();
        let dinputs = loss.backward().unwrap();

        // (0.5 - 1) / 2 and 0.5 / 2
        assert_eq!(dinputs.as_slice(), &[-0.25, 0.25, 0.25, -0.25]);
    }

    #[test]
    fn test_backward_before_forward_fails() {
        let mut loss = SoftmaxCrossEntropy::new();
        assert!(matches!(loss.backward(), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_label_errors() {
        let logits = Matrix::<f32>::zeros(2, 3);
        let mut loss = SoftmaxCrossEntropy::new();

        let short = Matrix::from_vec(1, 1, vec![0.0]).unwrap();
        assert!(matches!(loss.forward(logits.view(), short.view()), Err(Error::ShapeMismatch(_))));

        let wide = Matrix::<f32>::zeros(2, 2);
        assert!(matches!(loss.forward(logits.view(), wide.view()), Err(Error::ShapeMismatch(_))));

        let out_of_range = Matrix::from_vec(2, 1, vec![0.0, 3.0]).unwrap();
        assert!(matches!(loss.forward(logits.view(), out_of_range.view()), Err(Error::Range(_))));
    }
}
