//! Scalar activation functions
//!
//! Element-level building blocks used by the activation and loss layers:
//! - Leaky ReLU and its derivative
//! - Softmax over a single row

/// Leaky ReLU: `x` for positive inputs, `alpha * x` otherwise.
pub fn leaky_relu(x: f32, alpha: f32) -> f32 {
    if x > 0.0 {
        x
    } else {
        alpha * x
    }
}

/// Derivative of [`leaky_relu`] with respect to its input.
///
/// Zero itself takes the `alpha` branch, matching the forward pass.
pub fn leaky_relu_derivative(x: f32, alpha: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else {
        alpha
    }
}

/// Softmax applied in place to one row of logits.
///
/// Subtracts the row maximum before exponentiating so large logits cannot
/// overflow.
pub fn softmax_in_place(row: &mut [f32]) {
    if row.is_empty() {
        return;
    }

    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for value in row.iter_mut() {
        *value = (*value - max).exp();
        sum += *value;
    }
    for value in row.iter_mut() {
        *value /= sum;
    }
}
