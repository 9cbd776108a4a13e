use crate::{boundary::BoundaryPolicy, errors::PhysarumError, Agent, Swapper};
use grid::Grid;
use log::debug;
use std::ops::Range;

/// The trail map: a `rows` x `cols` grid of intensities, stored row-major so that cell
/// `(row, col)` lives at linear index `col + row * cols`.
pub struct ScalarField {
    grid: Swapper<Grid<u8>>,
}

impl ScalarField {
    pub fn new(rows: usize, cols: usize) -> Result<Self, PhysarumError> {
        Self::from_values(rows, cols, vec![0; rows * cols])
    }

    pub fn from_values(rows: usize, cols: usize, values: Vec<u8>) -> Result<Self, PhysarumError> {
        if rows == 0 || cols == 0 {
            return Err(PhysarumError::InvalidConfiguration(format!(
                "field dimensions must be positive, got {}x{}",
                rows, cols
            )));
        }
        if values.len() != rows * cols {
            return Err(PhysarumError::InvalidConfiguration(format!(
                "expected {} values for a {}x{} field, got {}",
                rows * cols,
                rows,
                cols,
                values.len()
            )));
        }

        let grid = Grid::from_vec(values, cols);

        debug!(
            "Created new field with {} rows and {} columns",
            grid.rows(),
            grid.cols()
        );

        Ok(Self {
            grid: Swapper::new(grid.clone(), grid),
        })
    }

    pub fn rows(&self) -> usize {
        self.grid.a().rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.a().cols()
    }

    pub fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear (row-major) index of a cell.
    pub fn index(&self, row: usize, col: usize) -> Result<usize, PhysarumError> {
        self.check_bounds(row, col)?;

        Ok(col + row * self.cols())
    }

    pub fn get(&self, row: usize, col: usize) -> Result<u8, PhysarumError> {
        self.grid
            .a()
            .get(row, col)
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, col))
    }

    /// Overwrite a cell. Values outside of `0..=255` are clamped.
    pub fn set(&mut self, row: usize, col: usize, value: i32) -> Result<(), PhysarumError> {
        let cell = self.cell_mut(row, col)?;
        *cell = value.clamp(u8::MIN as i32, u8::MAX as i32) as u8;

        Ok(())
    }

    /// Add `amount` to a cell, saturating at 255.
    pub fn deposit(&mut self, row: usize, col: usize, amount: u8) -> Result<(), PhysarumError> {
        let cell = self.cell_mut(row, col)?;
        *cell = cell.saturating_add(amount);

        Ok(())
    }

    /// Deposit `amount` under every agent. Agent locations are rounded to a cell and mapped into
    /// the field with `boundary`, so this never fails for agents that drifted off the grid.
    pub fn deposit_agents(
        &mut self,
        agents: &[Agent],
        amount: u8,
        boundary: BoundaryPolicy,
    ) -> Result<(), PhysarumError> {
        let (rows, cols) = (self.rows(), self.cols());

        for agent in agents {
            let (row, col) = boundary.resolve_cell(agent.location(), rows, cols);
            self.deposit(row, col, amount)?;
        }

        Ok(())
    }

    /// Blur over the `(2 * kernel_radius + 1)` square window around each cell, reading only
    /// in-bounds cells. Neighbor `j` of cell `i` contributes with weight `1 / max(n_i, n_j)`,
    /// where `n` is the number of in-bounds cells in a window, and `i` keeps the remaining
    /// weight. The weights are symmetric, so a uniform field stays uniform and, with results
    /// truncated, the total intensity never grows.
    pub fn diffuse(&mut self, kernel_radius: usize) {
        let rows = self.rows();
        let cols = self.cols();
        // windows stop growing once they cover the whole field
        let kernel_radius = kernel_radius.min(rows.max(cols));
        if kernel_radius == 0 {
            return;
        }

        let row_counts = window_counts(kernel_radius, rows);
        let col_counts = window_counts(kernel_radius, cols);
        let (current, next) = self.grid.read_a_write_b();

        cell_iter(rows, cols).for_each(|(row, col)| {
            let (row_range, col_range) = kernel_window(row, col, kernel_radius, rows, cols);
            let window_count = row_counts[row] * col_counts[col];
            let value = current[(row, col)] as f64;

            let exchanged: f64 = row_range
                .flat_map(|r| col_range.clone().map(move |c| (r, c)))
                .filter(|&neighbor| neighbor != (row, col))
                .map(|(r, c)| {
                    let weight = window_count.max(row_counts[r] * col_counts[c]) as f64;
                    (current[(r, c)] as f64 - value) / weight
                })
                .sum();

            next[(row, col)] = (value + exchanged).clamp(0.0, u8::MAX as f64) as u8;
        });

        self.grid.swap()
    }

    /// Scale every cell by `1 - rate`, truncating toward zero. `rate` is clamped to `[0, 1]`.
    pub fn decay(&mut self, rate: f64) {
        let retained = 1.0 - rate.clamp(0.0, 1.0);

        self.grid
            .mut_a()
            .iter_mut()
            .for_each(|value| *value = (*value as f64 * retained) as u8)
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &u8> {
        self.grid.a().iter()
    }

    pub fn total_intensity(&self) -> u64 {
        self.iter().map(|value| *value as u64).sum()
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            rows: self.rows(),
            cols: self.cols(),
            values: self.iter().copied().collect(),
        }
    }

    fn cell_mut(&mut self, row: usize, col: usize) -> Result<&mut u8, PhysarumError> {
        let error = self.out_of_bounds(row, col);
        self.grid.mut_a().get_mut(row, col).ok_or(error)
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<(), PhysarumError> {
        if row < self.rows() && col < self.cols() {
            Ok(())
        } else {
            Err(self.out_of_bounds(row, col))
        }
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> PhysarumError {
        PhysarumError::OutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        }
    }
}

/// An owned copy of the field at one point in time, for consumers that outlive the tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSnapshot {
    rows: usize,
    cols: usize,
    values: Vec<u8>,
}

impl FieldSnapshot {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major cell values.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        if row < self.rows && col < self.cols {
            self.values.get(col + row * self.cols).copied()
        } else {
            None
        }
    }
}

fn cell_iter(rows: usize, cols: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
}

/// Row and column ranges of the kernel centered on `(row, col)`, clipped to the field.
fn kernel_window(
    row: usize,
    col: usize,
    radius: usize,
    rows: usize,
    cols: usize,
) -> (Range<usize>, Range<usize>) {
    let row_end = row.saturating_add(radius).saturating_add(1).min(rows);
    let col_end = col.saturating_add(radius).saturating_add(1).min(cols);

    let row_range = row.saturating_sub(radius)..row_end;
    let col_range = col.saturating_sub(radius)..col_end;

    (row_range, col_range)
}

/// For each position along an axis of length `len`, how many positions its window covers.
fn window_counts(radius: usize, len: usize) -> Vec<usize> {
    (0..len)
        .map(|i| kernel_window(i, i, radius, len, len).0.len())
        .collect()
}
