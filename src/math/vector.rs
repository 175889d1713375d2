//! One-dimensional containers

use super::{first_max, Scalar};
use crate::error::{Error, Result};
use crate::utils::parallel::dynamic_parallel_for_mut;
use std::ops::{Index, IndexMut};

/// Read-only capabilities shared by [`Vector`] and [`VectorView`].
pub trait VectorBase<T: Scalar> {
    fn as_slice(&self) -> &[T];

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Bounds-checked element access.
    fn at(&self, index: usize) -> Result<&T> {
        self.as_slice().get(index).ok_or_else(|| {
            Error::Range(format!("index {} outside vector of length {}", index, self.len()))
        })
    }

    /// Index of the largest element; ties keep the first.
    fn argmax(&self) -> Result<usize> {
        first_max(self.as_slice())
            .map(|(index, _)| index)
            .ok_or_else(|| Error::Range("argmax of an empty vector".to_string()))
    }

    fn sum(&self) -> T {
        self.as_slice()
            .iter()
            .fold(T::default(), |acc, &value| acc + value)
    }

    fn view(&self) -> VectorView<'_, T> {
        VectorView::new(self.as_slice())
    }

    fn to_vector(&self) -> Vector<T> {
        Vector::from_vec(self.as_slice().to_vec())
    }
}

/// Vector owning a contiguous buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vector<T> {
    data: Vec<T>,
}

impl<T: Scalar> Vector<T> {
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![T::default(); len],
        }
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Bounds-checked mutable element access.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.data.len();
        self.data
            .get_mut(index)
            .ok_or_else(|| Error::Range(format!("index {} outside vector of length {}", index, len)))
    }

    /// Writes every element from a zero-argument generator.
    pub fn fill<F>(&mut self, generator: F, parallelize: Option<bool>, cost: usize)
    where
        F: Fn() -> T + Sync,
    {
        dynamic_parallel_for_mut(cost, &mut self.data, |_, slot| *slot = generator(), parallelize, 0);
    }

    /// Combines every element with the matching element of `other`.
    pub fn transform<F>(
        &mut self,
        other: &impl VectorBase<T>,
        operation: F,
        parallelize: Option<bool>,
        cost: usize,
    ) -> Result<()>
    where
        F: Fn(&mut T, T) + Sync,
    {
        if other.len() != self.data.len() {
            return Err(Error::ShapeMismatch(format!(
                "transform: vector lengths {} vs {}",
                self.data.len(),
                other.len()
            )));
        }
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
}

impl<T: Scalar> VectorBase<T> for Vector<T> {
    fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: Scalar> Index<usize> for Vector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T: Scalar> IndexMut<usize> for Vector<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<T: Scalar> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

/// Read-only window over a contiguous run of elements.
#[derive(Debug, Clone, Copy)]
pub struct VectorView<'a, T> {
    data: &'a [T],
}

impl<'a, T: Scalar> VectorView<'a, T> {
    pub fn new(data: &'a [T]) -> Self {
        Self { data }
    }

    /// View of elements `[start, end)`.
    pub fn subview(&self, start: usize, end: usize) -> Result<Self> {
        if end > self.data.len() || start >= end {
            return Err(Error::Range(format!(
                "range {}..{} invalid for vector of length {}",
                start,
                end,
                self.data.len()
            )));
        }
        Ok(Self::new(&self.data[start..end]))
    }
}

impl<T: Scalar> VectorBase<T> for VectorView<'_, T> {
    fn as_slice(&self) -> &[T] {
        self.data
    }
}

impl<T: Scalar> Index<usize> for VectorView<'_, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}
