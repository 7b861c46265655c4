use serde::{Deserialize, Serialize};

/// Row-major `n_y × n_x` matrix over the nanofiber cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    n_x: usize,
    n_y: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(n_x: usize, n_y: usize, value: T) -> Self {
        Self {
            n_x,
            n_y,
            cells: vec![value; n_x * n_y],
        }
    }
}

impl<T> Grid<T> {
    pub fn n_x(&self) -> usize {
        self.n_x
    }

    pub fn n_y(&self) -> usize {
        self.n_y
    }

    /// `(n_y, n_x)`, rows first.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_y, self.n_x)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.cells.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Whether the backing storage agrees with the declared shape.
    pub fn is_consistent(&self) -> bool {
        self.n_x.checked_mul(self.n_y) == Some(self.cells.len())
    }
}
