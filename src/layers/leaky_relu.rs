//! Leaky ReLU activation layer

use crate::error::Result;
use crate::layers::Layer;
use crate::math::{Matrix, MatrixBase, MatrixView, DEFAULT_COST};
use crate::utils::{leaky_relu, leaky_relu_derivative};

/// Element-wise Leaky ReLU: `x` where `x > 0`, `alpha * x` elsewhere.
///
/// The layer has no trainable parameters. It keeps a copy of the latest input to
/// select the gradient branch on the way back.
#[derive(Debug, Clone)]
pub struct LeakyReluLayer {
    alpha: f32,
    input: Matrix<f32>,
    output: Matrix<f32>,
    dinputs: Matrix<f32>,
}

impl LeakyReluLayer {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            input: Matrix::default(),
            output: Matrix::default(),
            dinputs: Matrix::default(),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Layer for LeakyReluLayer {
    fn forward(&mut self, input: MatrixView<'_, f32>) -> Result<&Matrix<f32>> {
        let alpha = self.alpha;
        let mut output = Matrix::zeros(input.rows(), input.cols());
        output.transform(&input, |out, x| *out = leaky_relu(x, alpha), None, DEFAULT_COST)?;

        self.input.copy_from(&input);
        self.output = output;
        Ok(&self.output)
    }

    /// `dinputs = dvalues` where the input was positive, `dvalues * alpha` elsewhere.
    fn backward(&mut self, dvalues: MatrixView<'_, f32>) -> Result<&Matrix<f32>> {
        let alpha = self.alpha;
        let mut dinputs = Matrix::zeros(dvalues.rows(), dvalues.cols());
        dinputs.transform2(
            &dvalues,
            &self.input,
            |grad, upstream, x| *grad = upstream * leaky_relu_derivative(x, alpha),
            None,
            DEFAULT_COST,
        )?;

        self.dinputs = dinputs;
        Ok(&self.dinputs)
    }

    fn output(&self) -> &Matrix<f32> {
        &self.output
    }

    fn dinputs(&self) -> &Matrix<f32> {
        &self.dinputs
    }

    fn name(&self) -> &'static str {
        "leaky_relu"
    }
}
