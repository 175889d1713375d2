//! Numeric containers backed by contiguous row-major storage
//!
//! The module offers two 2-D containers and two 1-D containers:
//!
//! - [`Matrix`] / [`Vector`] own their buffer.
//! - [`MatrixView`] / [`VectorView`] borrow a window of somebody else's buffer.
//!   Because a view holds a shared borrow, the owner can be neither resized nor
//!   dropped while the view is alive.
//!
//! Read-only behaviour common to owners and views (checked access, row views,
//! argmax, transpose, sub-views) lives in the [`MatrixBase`] and [`VectorBase`]
//! capability traits. Both are used through generics, never as trait objects, so
//! per-element paths are statically dispatched.

pub mod matrix;
pub mod vector;
pub mod view;

pub use matrix::Matrix;
pub use vector::{Vector, VectorBase, VectorView};
pub use view::MatrixView;

use crate::error::{Error, Result};
use crate::utils::parallel::dynamic_parallel_for_mut;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul};

/// Default per-element cost handed to the parallel heuristic by fill/transform.
pub const DEFAULT_COST: usize = 5;

/// Default column-block width used by [`MatrixBase::transpose`].
pub const DEFAULT_TRANSPOSE_CHUNK: usize = 4;

/// Element types storable in the containers.
pub trait Scalar:
    Copy + Default + PartialOrd + Debug + Send + Sync + Add<Output = Self> + Mul<Output = Self> + AddAssign + 'static
{
}

impl<T> Scalar for T where
    T: Copy
        + Default
        + PartialOrd
        + Debug
        + Send
        + Sync
        + Add<Output = T>
        + Mul<Output = T>
        + AddAssign
        + 'static
{
}

/// Read-only capabilities shared by [`Matrix`] and [`MatrixView`].
pub trait MatrixBase<T: Scalar> {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    /// The window's elements in row-major order, exactly `rows * cols` long.
    fn as_slice(&self) -> &[T];

    fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds-checked single element access.
    fn at(&self, row: usize, col: usize) -> Result<&T> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::Range(format!(
                "element ({}, {}) outside {}x{} matrix",
                row,
                col,
                self.rows(),
                self.cols()
            )));
        }
        Ok(&self.as_slice()[row * self.cols() + col])
    }

    /// Row access without a range check beyond the slice's own panic.
    fn row(&self, row: usize) -> VectorView<'_, T> {
        let cols = self.cols();
        VectorView::new(&self.as_slice()[row * cols..(row + 1) * cols])
    }

    /// Bounds-checked row access.
    fn row_at(&self, row: usize) -> Result<VectorView<'_, T>> {
        if row >= self.rows() {
            return Err(Error::Range(format!(
                "row {} outside matrix with {} rows",
                row,
                self.rows()
            )));
        }
        Ok(self.row(row))
    }

    /// View of the whole matrix.
    fn view(&self) -> MatrixView<'_, T> {
        MatrixView::new(self.as_slice(), self.rows(), self.cols())
    }

    /// View of rows `[start_row, end_row)`, all columns, without copying.
    ///
    /// Fails with a range error when `end_row > rows` or `start_row >= end_row`.
    fn view_rows(&self, start_row: usize, end_row: usize) -> Result<MatrixView<'_, T>> {
        if end_row > self.rows() || start_row >= end_row {
            return Err(Error::Range(format!(
                "row range {}..{} invalid for matrix with {} rows",
                start_row,
                end_row,
                self.rows()
            )));
        }
        let cols = self.cols();
        Ok(MatrixView::new(
            &self.as_slice()[start_row * cols..end_row * cols],
            end_row - start_row,
            cols,
        ))
    }

    /// `(row, col)` of the largest element; ties keep the first in row-major order.
    fn argmax(&self) -> Result<(usize, usize)> {
        let (index, _) = first_max(self.as_slice())
            .ok_or_else(|| Error::Range("argmax of an empty matrix".to_string()))?;
        Ok((index / self.cols(), index % self.cols()))
    }

    /// Column index of the largest element in every row.
    fn argmax_row(&self) -> Vector<usize> {
        let cols = self.cols();
        if cols == 0 {
            return Vector::zeros(self.rows());
        }
        self.as_slice()
            .chunks_exact(cols)
            .map(|row| first_max(row).map_or(0, |(index, _)| index))
            .collect()
    }

    /// Row index of the largest element in every column; ties keep the topmost.
    fn argmax_col(&self) -> Vector<usize> {
        let cols = self.cols();
        let mut best_rows = vec![0usize; cols];
        if self.rows() == 0 || cols == 0 {
            return Vector::from_vec(best_rows);
        }
        let mut best_values: Vec<T> = self.as_slice()[..cols].to_vec();
        for (row, values) in self.as_slice().chunks_exact(cols).enumerate().skip(1) {
            for (col, &value) in values.iter().enumerate() {
                if value > best_values[col] {
                    best_values[col] = value;
                    best_rows[col] = row;
                }
            }
        }
        Vector::from_vec(best_rows)
    }

    /// Column sums as a vector of length `cols`.
    fn column_sums(&self) -> Vector<T> {
        let mut sums = vec![T::default(); self.cols()];
        if self.cols() > 0 {
            for row in self.as_slice().chunks_exact(self.cols()) {
                for (sum, &value) in sums.iter_mut().zip(row) {
                    *sum += value;
                }
            }
        }
        Vector::from_vec(sums)
    }

    fn sum(&self) -> T {
        self.as_slice()
            .iter()
            .fold(T::default(), |acc, &value| acc + value)
    }

    /// New owning matrix with rows and columns swapped.
    ///
    /// Work is split into blocks of `chunk_size` source columns; each block fills a
    /// contiguous run of destination rows, which keeps writes local. A zero
    /// `chunk_size` is treated as 1.
    fn transpose(&self, chunk_size: usize, parallelize: Option<bool>) -> Matrix<T> {
        let (rows, cols) = self.shape();
        let mut transposed = Matrix::zeros(cols, rows);
        if rows == 0 || cols == 0 {
            return transposed;
        }

        let chunk = chunk_size.max(1);
        let source = self.as_slice();
        {
            let mut blocks: Vec<&mut [T]> = transposed.as_mut_slice().chunks_mut(chunk * rows).collect();
            dynamic_parallel_for_mut(
                chunk * rows,
                &mut blocks,
                |block, destination| {
                    let first_col = block * chunk;
                    let width = destination.len() / rows;
                    for row in 0..rows {
                        let start = row * cols + first_col;
                        for (offset, &value) in source[start..start + width].iter().enumerate() {
                            destination[offset * rows + row] = value;
                        }
                    }
                },
                parallelize,
                0,
            );
        }
        transposed
    }

    /// Owning copy of the window.
    fn to_matrix(&self) -> Matrix<T> {
        Matrix {
            data: self.as_slice().to_vec(),
            rows: self.rows(),
            cols: self.cols(),
        }
    }
}

/// Index and value of the first maximum in scan order.
pub(crate) fn first_max<T: Scalar>(values: &[T]) -> Option<(usize, T)> {
    let mut iter = values.iter().copied().enumerate();
    let first = iter.next()?;
    Some(iter.fold(first, |best, (index, value)| {
        if value > best.1 {
            (index, value)
        } else {
            best
        }
    }))
}

/// Fails with a shape-mismatch error unless both operands have the same shape.
pub(crate) fn ensure_same_shape<T: Scalar>(
    operation: &str,
    left: &impl MatrixBase<T>,
    right: &impl MatrixBase<T>,
) -> Result<()> {
    if left.shape() != right.shape() {
        return Err(Error::ShapeMismatch(format!(
            "{}: {}x{} vs {}x{}",
            operation,
            left.rows(),
            left.cols(),
            right.rows(),
            right.cols()
        )));
    }
    Ok(())
}
