//! Owning row-major matrix

use super::{ensure_same_shape, MatrixBase, MatrixView, Scalar, VectorBase, VectorView};
use crate::error::{Error, Result};
use crate::utils::parallel::dynamic_parallel_for_mut;
use std::ops::{Index, IndexMut};

/// Matrix that exclusively owns a contiguous buffer of `rows * cols` elements.
///
/// The buffer length equals `rows * cols` at all times; [`Matrix::reshape`] only
/// accepts shapes with the same element count.
///
/// # Example
///
/// ```
/// use ann_engine::math::{Matrix, MatrixBase, VectorBase};
///
/// let m = Matrix::from_vec(2, 3, vec![1.0f32, 5.0, 2.0, 7.0, 0.0, 7.0]).unwrap();
/// assert_eq!(m[(1, 0)], 7.0);
/// assert_eq!(m.argmax().unwrap(), (1, 0));
/// assert_eq!(m.argmax_row().as_slice(), &[1, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix<T> {
    pub(crate) data: Vec<T>,
    pub(crate) rows: usize,
    pub(crate) cols: usize,
}

impl<T: Scalar> Matrix<T> {
    /// Matrix of the given shape filled with `T::default()`.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![T::default(); rows * cols],
            rows,
            cols,
        }
    }

    /// Takes ownership of `data` laid out row-major.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::ShapeMismatch(format!(
                "{} elements cannot form a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { data, rows, cols })
    }

    /// Builds a matrix from nested rows; every row must have the same length.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::ShapeMismatch(format!(
                    "row {} has {} columns, expected {}",
                    index,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Fills a new matrix sequentially in row-major order from a stateful generator.
    ///
    /// Use this instead of [`Matrix::fill`] when the generator carries mutable
    /// state such as a random number generator.
    pub fn from_fn(rows: usize, cols: usize, mut generator: impl FnMut() -> T) -> Self {
        Self {
            data: (0..rows * cols).map(|_| generator()).collect(),
            rows,
            cols,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Bounds-checked mutable element access.
    pub fn at_mut(&mut self, row: usize, col: usize) -> Result<&mut T> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::Range(format!(
                "element ({}, {}) outside {}x{} matrix",
                row, col, self.rows, self.cols
            )));
        }
        Ok(&mut self.data[row * self.cols + col])
    }

    /// Mutable row access without a range check beyond the slice's own panic.
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        let cols = self.cols;
        &mut self.data[row * cols..(row + 1) * cols]
    }

    /// Changes the shape in place, keeping row-major element order.
    pub fn reshape(&mut self, rows: usize, cols: usize) -> Result<&mut Self> {
        if rows * cols != self.data.len() {
            return Err(Error::Range(format!(
                "cannot reshape {}x{} into {}x{}",
                self.rows, self.cols, rows, cols
            )));
        }
        self.rows = rows;
        self.cols = cols;
        Ok(self)
    }

    /// Replaces shape and contents with a copy of `source`, reusing the allocation.
    pub fn copy_from(&mut self, source: &impl MatrixBase<T>) {
        self.data.clear();
        self.data.extend_from_slice(source.as_slice());
        self.rows = source.rows();
        self.cols = source.cols();
    }

    /// Appends `row` as a new last row.
    ///
    /// An empty `0x0` matrix adopts the row's width.
    pub fn insert_row(&mut self, row: &impl VectorBase<T>) -> Result<()> {
        if self.rows == 0 && self.cols == 0 {
            self.cols = row.len();
        }
        if row.len() != self.cols {
            return Err(Error::ShapeMismatch(format!(
                "cannot insert a row of {} elements into a matrix with {} columns",
                row.len(),
                self.cols
            )));
        }
        self.data.extend_from_slice(row.as_slice());
        self.rows += 1;
        Ok(())
    }

    /// The whole buffer as a flat vector view.
    pub fn as_vector(&self) -> VectorView<'_, T> {
        VectorView::new(&self.data)
    }

    /// Writes every element from a zero-argument generator.
    ///
    /// `cost` estimates the generator's price (1 = one addition) and feeds the
    /// parallel heuristic unless `parallelize` overrides it.
    pub fn fill<F>(&mut self, generator: F, parallelize: Option<bool>, cost: usize)
    where
        F: Fn() -> T + Sync,
    {
        dynamic_parallel_for_mut(cost, &mut self.data, |_, slot| *slot = generator(), parallelize, 0);
    }

    /// Combines every element with the matching element of `other`.
    ///
    /// `operation(&mut self_value, other_value)` runs once per element. Fails
    /// before touching the receiver when the shapes differ.
    pub fn transform<F>(
        &mut self,
        other: &impl MatrixBase<T>,
        operation: F,
        parallelize: Option<bool>,
        cost: usize,
    ) -> Result<()>
    where
        F: Fn(&mut T, T) + Sync,
    {
        ensure_same_shape("transform", &*self, other)?;
        let source = other.as_slice();
        dynamic_parallel_for_mut(
            cost,
            &mut self.data,
            |index, slot| operation(slot, source[index]),
            parallelize,
            0,
        );
        Ok(())
    }

    /// Combines every element with the matching elements of `a` and `b`.
    pub fn transform2<F>(
        &mut self,
        a: &impl MatrixBase<T>,
        b: &impl MatrixBase<T>,
        operation: F,
        parallelize: Option<bool>,
        cost: usize,
    ) -> Result<()>
    where
        F: Fn(&mut T, T, T) + Sync,
    {
        ensure_same_shape("transform2", &*self, a)?;
        ensure_same_shape("transform2", &*self, b)?;
        let (first, second) = (a.as_slice(), b.as_slice());
        dynamic_parallel_for_mut(
            cost,
            &mut self.data,
            |index, slot| operation(slot, first[index], second[index]),
            parallelize,
            0,
        );
        Ok(())
    }

    /// Runs `operation(row_index, row)` on every row; `cost` is per row.
    pub fn map_rows<F>(&mut self, operation: F, parallelize: Option<bool>, cost: usize)
    where
        F: Fn(usize, &mut [T]) + Sync,
    {
        if self.rows == 0 || self.cols == 0 {
            return;
        }
        let mut rows: Vec<&mut [T]> = self.data.chunks_mut(self.cols).collect();
        dynamic_parallel_for_mut(cost, &mut rows, |index, row| operation(index, &mut **row), parallelize, 0);
    }

    /// Matrix product `a · b`, computed in parallel over output rows.
    pub fn dot(a: &impl MatrixBase<T>, b: &impl MatrixBase<T>) -> Result<Self> {
        if a.cols() != b.rows() {
            return Err(Error::ShapeMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                a.rows(),
                a.cols(),
                b.rows(),
                b.cols()
            )));
        }

        let (inner, cols) = (a.cols(), b.cols());
        let (lhs, rhs) = (a.as_slice(), b.as_slice());
        let mut product = Self::zeros(a.rows(), cols);
        product.map_rows(
            |row, out| {
                let lhs_row = &lhs[row * inner..(row + 1) * inner];
                for (k, &scale) in lhs_row.iter().enumerate() {
                    let rhs_row = &rhs[k * cols..(k + 1) * cols];
                    for (value, &factor) in out.iter_mut().zip(rhs_row) {
                        *value += scale * factor;
                    }
                }
            },
            None,
            inner * cols,
        );
        Ok(product)
    }
}

impl<T: Scalar> MatrixBase<T> for Matrix<T> {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: Scalar> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        debug_assert!(col < self.cols, "column {} out of {}", col, self.cols);
        &self.data[row * self.cols + col]
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        debug_assert!(col < self.cols, "column {} out of {}", col, self.cols);
        &mut self.data[row * self.cols + col]
    }
}

impl<'a, T: Scalar> From<MatrixView<'a, T>> for Matrix<T> {
    fn from(view: MatrixView<'a, T>) -> Self {
        view.to_matrix()
    }
}
