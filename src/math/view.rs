//! Non-owning matrix window

use super::{MatrixBase, Scalar};
use crate::error::{Error, Result};
use std::ops::Index;

/// Read-only window of `rows * cols` contiguous elements borrowed from another buffer.
///
/// Views are `Copy` and cost nothing to create. A view of rows `[a, b)` of a matrix
/// starts at offset `a * cols` of the owner's buffer, so `view[(i, j)]` reads the
/// owner's element `(a + i, j)`.
///
/// ```
/// use ann_engine::math::{Matrix, MatrixBase};
///
/// let m = Matrix::from_vec(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
/// let batch = m.view_rows(1, 3).unwrap();
/// assert_eq!(batch.shape(), (2, 2));
/// assert_eq!(batch[(0, 1)], 4);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
}

impl<'a, T: Scalar> MatrixView<'a, T> {
    /// Callers guarantee `data.len() == rows * cols`.
    pub(crate) fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    /// Wraps a flat row-major slice.
    pub fn from_slice(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::ShapeMismatch(format!(
                "{} elements cannot be viewed as {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { data, rows, cols })
    }

    /// Reinterprets the window with a new shape of the same element count.
    pub fn reshape(&mut self, rows: usize, cols: usize) -> Result<&mut Self> {
        if rows * cols != self.data.len() {
            return Err(Error::Range(format!(
                "cannot reshape {}x{} view into {}x{}",
                self.rows, self.cols, rows, cols
            )));
        }
        self.rows = rows;
        self.cols = cols;
        Ok(self)
    }

    /// The borrowed window with the owner's lifetime.
    pub fn data(&self) -> &'a [T] {
        self.data
    }
}

impl<T: Scalar> MatrixBase<T> for MatrixView<'_, T> {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn as_slice(&self) -> &[T] {
        self.data
    }
}

impl<T: Scalar> Index<(usize, usize)> for MatrixView<'_, T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        debug_assert!(col < self.cols, "column {} out of {}", col, self.cols);
        &self.data[row * self.cols + col]
    }
}
