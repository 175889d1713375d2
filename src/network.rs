//! Feed-forward network assembled from boxed layers
//!
//! A [`Network`] chains layers so each one consumes the previous layer's
//! output. The loss is kept outside the stack: the caller feeds
//! `network.output()` to a [`SoftmaxCrossEntropy`] and hands its gradient
//! back to [`Network::backward`]. [`Network::train_epoch`] and
//! [`Network::evaluate`] wrap that loop over mini-batches.

use crate::error::{Error, Result};
use crate::layers::{DenseLayer, Layer, SoftmaxCrossEntropy};
use crate::math::{Matrix, MatrixBase, MatrixView};
use crate::optimizers::Optimizer;
use crate::utils::shuffled_indices;
use log::{debug, info};
use rand::Rng;

/// Aggregated metrics over a set of mini-batches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Report {
    /// Sample-weighted mean of the data loss.
    pub data_loss: f32,
    /// Regularization penalty after the last batch.
    pub regularization_loss: f32,
    /// Fraction of correctly classified samples.
    pub accuracy: f32,
    /// Learning rate used for the last batch; 0 for evaluation.
    pub learning_rate: f32,
}

impl Report {
    pub fn total_loss(&self) -> f32 {
        self.data_loss + self.regularization_loss
    }
}

/// Ordered stack of layers.
pub struct Network {
    layers: Vec<Box<dyn Layer>>,
}

impl Network {
    /// Wraps a non-empty stack of layers.
    ///
    /// # Errors
    ///
    /// Returns an invalid-config error when `layers` is empty.
    pub fn new(layers: Vec<Box<dyn Layer>>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidConfig("network needs at least one layer".to_string()));
        }
        let network = Self { layers };
        debug!("network: {}", network.describe());
        Ok(network)
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer names joined with arrows, e.g. `dense -> leaky_relu -> dense`.
    pub fn describe(&self) -> String {
        self.layers
            .iter()
            .map(|layer| layer.name())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Total number of trainable parameters.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.parameter_count()).sum()
    }

    /// Dense layers in stack order.
    pub fn dense_layers(&self) -> impl Iterator<Item = &DenseLayer> {
        self.layers.iter().filter_map(|layer| layer.as_dense())
    }

    /// Runs `input` through every layer and returns the last layer's output.
    pub fn forward(&mut self, input: MatrixView<'_, f32>) -> Result<&Matrix<f32>> {
        for index in 0..self.layers.len() {
            let (done, remaining) = self.layers.split_at_mut(index);
            let current = &mut remaining[0];
            match done.last() {
                None => current.forward(input)?,
                Some(previous) => current.forward(previous.output().view())?,
            };
        }
        Ok(self.output())
    }

    /// Propagates `dvalues`, the gradient with respect to the network output,
    /// back through every layer and returns the gradient with respect to the
    /// input.
    pub fn backward(&mut self, dvalues: MatrixView<'_, f32>) -> Result<&Matrix<f32>> {
        for index in (0..self.layers.len()).rev() {
            let (through, after) = self.layers.split_at_mut(index + 1);
            let current = &mut through[index];
            match after.first() {
                None => current.backward(dvalues)?,
                Some(next) => current.backward(next.dinputs().view())?,
            };
        }
        Ok(self.layers[0].dinputs())
    }

    /// Output of the last layer from the latest forward pass.
    pub fn output(&self) -> &Matrix<f32> {
        self.layers[self.layers.len() - 1].output()
    }

    /// Switches every layer between training and evaluation behaviour.
    pub fn set_training(&mut self, training: bool) {
        for layer in &mut self.layers {
            layer.set_training(training);
        }
    }

    /// One optimizer step over every Dense layer.
    pub fn update(&mut self, optimizer: &mut dyn Optimizer) -> Result<()> {
        optimizer.pre_update();
        for layer in &mut self.layers {
            if let Some(dense) = layer.as_dense_mut() {
                optimizer.update_params(dense)?;
            }
        }
        optimizer.post_update();
        Ok(())
    }

    /// Sum of the regularization penalties of every Dense layer.
    pub fn regularization_loss(&self) -> f32 {
        self.dense_layers().map(DenseLayer::regularization_loss).sum()
    }

    /// Forward, loss, backward and update on a single batch.
    ///
    /// Returns `(data_loss, accuracy)` for the batch.
    pub fn train_batch(
        &mut self,
        samples: MatrixView<'_, f32>,
        labels: MatrixView<'_, f32>,
        loss: &mut SoftmaxCrossEntropy,
        optimizer: &mut dyn Optimizer,
    ) -> Result<(f32, f32)> {
        self.forward(samples)?;
        loss.forward(self.output().view(), labels)?;
        let (data_loss, accuracy) = (loss.mean(), loss.accuracy());
        loss.backward()?;
        self.backward(loss.dinputs().view())?;
        self.update(optimizer)?;
        Ok((data_loss, accuracy))
    }

    /// One pass over `samples` in mini-batches of `batch_size` rows.
    ///
    /// Batches are contiguous row ranges visited in an order shuffled with
    /// `rng`, so no sample data is copied.
    pub fn train_epoch(
        &mut self,
        samples: &Matrix<f32>,
        labels: &Matrix<f32>,
        batch_size: usize,
        loss: &mut SoftmaxCrossEntropy,
        optimizer: &mut dyn Optimizer,
        rng: &mut impl Rng,
    ) -> Result<Report> {
        let ranges = batch_ranges(samples.rows(), labels.rows(), batch_size)?;
        self.set_training(true);

        let mut tally = Tally::default();
        let mut learning_rate = optimizer.learning_rate();
        for batch in shuffled_indices(rng, ranges.len()) {
            let (start, end) = ranges[batch];
            let (data_loss, accuracy) = self.train_batch(
                samples.view_rows(start, end)?,
                labels.view_rows(start, end)?,
                loss,
                optimizer,
            )?;
            learning_rate = optimizer.learning_rate();
            tally.add(end - start, data_loss, accuracy);
        }

        let report = Report {
            data_loss: tally.mean_loss(),
            regularization_loss: self
                .dense_layers()
                .map(|dense| loss.regularization_loss(dense))
                .sum(),
            accuracy: tally.accuracy(),
            learning_rate,
        };
        Ok(report)
    }

    /// Loss and accuracy on `samples` with dropout disabled.
    ///
    /// Training mode is restored before returning.
    pub fn evaluate(
        &mut self,
        samples: &Matrix<f32>,
        labels: &Matrix<f32>,
        batch_size: usize,
        loss: &mut SoftmaxCrossEntropy,
    ) -> Result<Report> {
        let ranges = batch_ranges(samples.rows(), labels.rows(), batch_size)?;
        self.set_training(false);

        let result = ranges.iter().try_fold(Tally::default(), |mut tally, &(start, end)| {
            self.forward(samples.view_rows(start, end)?)?;
            loss.forward(self.output().view(), labels.view_rows(start, end)?)?;
            tally.add(end - start, loss.mean(), loss.accuracy());
            Ok::<_, Error>(tally)
        });
        self.set_training(true);

        let tally = result?;
        let report = Report {
            data_loss: tally.mean_loss(),
            regularization_loss: self.regularization_loss(),
            accuracy: tally.accuracy(),
            learning_rate: 0.0,
        };
        info!(
            "evaluated {} samples: accuracy {:.4}, loss {:.4}",
            tally.samples, report.accuracy, report.data_loss
        );
        Ok(report)
    }
}

/// `[start, end)` row ranges of consecutive batches.
fn batch_ranges(samples: usize, labels: usize, batch_size: usize) -> Result<Vec<(usize, usize)>> {
    if samples != labels {
        return Err(Error::ShapeMismatch(format!(
            "{} samples but {} labels",
            samples, labels
        )));
    }
    if batch_size == 0 {
        return Err(Error::InvalidConfig("batch size must be positive".to_string()));
    }
    Ok((0..samples)
        .step_by(batch_size)
        .map(|start| (start, (start + batch_size).min(samples)))
        .collect())
}

#[derive(Debug, Default)]
struct Tally {
    samples: usize,
    weighted_loss: f32,
    correct: f32,
}

impl Tally {
    fn add(&mut self, samples: usize, mean_loss: f32, accuracy: f32) {
        self.samples += samples;
        self.weighted_loss += mean_loss * samples as f32;
        self.correct += accuracy * samples as f32;
    }

    fn mean_loss(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.weighted_loss / self.samples as f32
        }
    }

    fn accuracy(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.correct / self.samples as f32
        }
    }
}
