/// Two rows of a pairwise DP surface, each holding one value per state and column.
///
/// Rows are filled in order. Advancing to the next row discards the previous one,
/// so memory stays linear in the number of columns.
#[derive(Debug, Clone)]
pub struct PairDpCursor<T> {
    columns: usize,
    states: usize,
    row: usize,
    previous: Vec<T>,
    current: Vec<T>,
    empty: T,
}

impl<T: Clone> PairDpCursor<T> {
    /// Creates a cursor at row 0 where every cell holds `empty`.
    pub fn new(columns: usize, states: usize, empty: T) -> Self {
        Self {
            columns,
            states,
            row: 0,
            previous: vec![empty.clone(); columns * states],
            current: vec![empty.clone(); columns * states],
            empty,
        }
    }

    /// The row currently being filled.
    pub fn row(&self) -> usize {
        self.row
    }

    /// The values of all states at a cell of the current or the previous row.
    ///
    /// Returns `None` for cells that are not held by the cursor.
    pub fn cell(&self, row: usize, column: usize) -> Option<&[T]> {
        if column >= self.columns {
            return None;
        }

        let values = if row == self.row {
            &self.current
        } else if row + 1 == self.row {
            &self.previous
        } else {
            return None;
        };
        Some(&values[column * self.states..(column + 1) * self.states])
    }

    /// Replaces the values at `column` of the current row.
    pub fn set(&mut self, column: usize, values: &[T]) {
        debug_assert_eq!(values.len(), self.states);
        self.current[column * self.states..(column + 1) * self.states].clone_from_slice(values);
    }

    /// Moves to the next row, which starts out empty.
    pub fn advance(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.fill(self.empty.clone());
        self.row += 1;
    }
}
