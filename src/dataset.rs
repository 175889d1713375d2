//! IDX dataset loading
//!
//! Reads the IDX files MNIST is distributed in: a big-endian header followed by
//! one unsigned byte per label or pixel. Labels become a single-column matrix
//! of class indices and images become one flattened, `[0, 1]`-scaled sample per
//! row, the two layouts [`SoftmaxCrossEntropy`](crate::layers::SoftmaxCrossEntropy)
//! and [`DenseLayer`](crate::layers::DenseLayer) consume.

use crate::error::{Error, Result};
use crate::math::{Matrix, MatrixBase};
use log::info;
use std::path::Path;

pub const LABEL_MAGIC: u32 = 2049;
pub const IMAGE_MAGIC: u32 = 2051;

/// Samples with their labels, row `i` of one belonging to row `i` of the other.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub samples: Matrix<f32>,
    pub labels: Matrix<f32>,
}

impl Split {
    /// Pairs samples with labels.
    ///
    /// # Errors
    ///
    /// Returns a format error when the row counts differ.
    pub fn new(samples: Matrix<f32>, labels: Matrix<f32>) -> Result<Self> {
        if samples.rows() != labels.rows() {
            return Err(Error::Format(format!(
                "{} samples but {} labels",
                samples.rows(),
                labels.rows()
            )));
        }
        Ok(Self { samples, labels })
    }

    pub fn len(&self) -> usize {
        self.samples.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.rows() == 0
    }

    /// Features per sample.
    pub fn features(&self) -> usize {
        self.samples.cols()
    }
}

/// Cursor over big-endian header fields.
struct Header<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Header<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self
            .data
            .get(self.offset..self.offset + 4)
            .ok_or_else(|| Error::Format("IDX header is truncated".to_string()))?;
        self.offset += 4;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn expect_magic(&mut self, expected: u32) -> Result<()> {
        let magic = self.read_u32()?;
        if magic != expected {
            return Err(Error::Format(format!(
                "bad IDX magic number {}, expected {}",
                magic, expected
            )));
        }
        Ok(())
    }

    /// The next `len` bytes of payload.
    fn payload(&self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or_else(|| Error::Format(format!("IDX payload of {} bytes overflows", len)))?;
        self.data.get(self.offset..end).ok_or_else(|| {
            Error::Format(format!(
                "IDX payload is truncated: expected {} bytes, found {}",
                len,
                self.data.len().saturating_sub(self.offset)
            ))
        })
    }
}

/// Parses an in-memory IDX label file into an `n x 1` matrix.
pub fn parse_labels(data: &[u8]) -> Result<Matrix<f32>> {
    let mut header = Header::new(data);
    header.expect_magic(LABEL_MAGIC)?;
    let count = header.read_u32()? as usize;
    let labels = header.payload(count)?;
    Matrix::from_vec(count, 1, labels.iter().map(|&label| label as f32).collect())
}

/// Parses an in-memory IDX image file into an `n x (rows * cols)` matrix with
/// pixels scaled to `[0, 1]`.
pub fn parse_images(data: &[u8]) -> Result<Matrix<f32>> {
    let mut header = Header::new(data);
    header.expect_magic(IMAGE_MAGIC)?;
    let count = header.read_u32()? as usize;
    let rows = header.read_u32()? as usize;
    let cols = header.read_u32()? as usize;
    let features = rows
        .checked_mul(cols)
        .ok_or_else(|| Error::Format(format!("IDX image size {}x{} overflows", rows, cols)))?;
    let total = count
        .checked_mul(features)
        .ok_or_else(|| Error::Format(format!("IDX payload of {} images of {} pixels overflows", count, features)))?;
    let pixels = header.payload(total)?;
    Matrix::from_vec(count, features, pixels.iter().map(|&pixel| pixel as f32 / 255.0).collect())
}

/// Reads an IDX label file (magic 2049).
pub fn load_labels(path: impl AsRef<Path>) -> Result<Matrix<f32>> {
    let path = path.as_ref();
    let labels = parse_labels(&std::fs::read(path)?)?;
    info!("loaded {} labels from {}", labels.rows(), path.display());
    Ok(labels)
}

/// Reads an IDX image file (magic 2051).
pub fn load_images(path: impl AsRef<Path>) -> Result<Matrix<f32>> {
    let path = path.as_ref();
    let images = parse_images(&std::fs::read(path)?)?;
    info!(
        "loaded {} images of {} pixels from {}",
        images.rows(),
        images.cols(),
        path.display()
    );
    Ok(images)
}

/// Reads a matching pair of label and image files.
pub fn load_split(labels: impl AsRef<Path>, images: impl AsRef<Path>) -> Result<Split> {
    Split::new(load_images(images)?, load_labels(labels)?)
}
