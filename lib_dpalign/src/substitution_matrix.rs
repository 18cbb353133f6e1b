use std::sync::Arc;

use log::debug;
use ndarray::Array2;

use crate::{
    error::{Error, Result},
    symbol::{Alphabet, Symbol},
};

mod io;

/// A table of integer scores for aligning a row symbol against a column symbol.
///
/// The row and column symbols are subsets of the alphabet, in the order of the text
/// the matrix was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionMatrix {
    alphabet: Arc<Alphabet>,
    name: String,
    description: String,
    rows: Vec<Symbol>,
    columns: Vec<Symbol>,
    /// Maps a symbol index to its row, if the symbol has one.
    row_map: Vec<Option<usize>>,
    /// Maps a symbol index to its column, if the symbol has one.
    column_map: Vec<Option<usize>>,
    scores: Array2<i32>,
    min: i32,
    max: i32,
}

impl SubstitutionMatrix {
    fn new(
        alphabet: Arc<Alphabet>,
        name: String,
        description: String,
        rows: Vec<Symbol>,
        columns: Vec<Symbol>,
        scores: Array2<i32>,
    ) -> Self {
        debug_assert_eq!(scores.dim(), (rows.len(), columns.len()));

        let mut row_map = vec![None; alphabet.len()];
        for (index, row) in rows.iter().enumerate() {
            row_map[row.index()] = Some(index);
        }
        let mut column_map = vec![None; alphabet.len()];
        for (index, column) in columns.iter().enumerate() {
            column_map[column.index()] = Some(index);
        }

        let min = scores.iter().copied().min().unwrap_or(0);
        let max = scores.iter().copied().max().unwrap_or(0);

        debug!(
            "Created substitution matrix {name} with {} rows and {} columns over {}",
            rows.len(),
            columns.len(),
            alphabet.name()
        );

        Self {
            alphabet,
            name,
            description,
            rows,
            columns,
            row_map,
            column_map,
            scores,
            min,
            max,
        }
    }

    /// Creates a matrix over all symbols of the alphabet that scores `match_score` for
    /// symbols whose ambiguity sets overlap, and `replace_score` otherwise.
    pub fn identity(alphabet: Arc<Alphabet>, match_score: i32, replace_score: i32) -> Self {
        let symbols: Vec<_> = alphabet.symbols().collect();
        let scores = Array2::from_shape_fn((symbols.len(), symbols.len()), |(row, column)| {
            if alphabet.matches(symbols[row], symbols[column]) {
                match_score
            } else {
                replace_score
            }
        });

        let name = format!("IDENTITY_{match_score}_{replace_score}");
        let description = format!(
            "Identity matrix over the {} alphabet. Matching symbols score {match_score}, all other pairs score {replace_score}.",
            alphabet.name()
        );
        Self::new(
            alphabet,
            name,
            description,
            symbols.clone(),
            symbols,
            scores,
        )
    }

    pub fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn rows(&self) -> &[Symbol] {
        &self.rows
    }

    pub fn columns(&self) -> &[Symbol] {
        &self.columns
    }

    /// Returns the score of the pair, or `None` if the matrix has no entry for it.
    pub fn get(&self, row: Symbol, column: Symbol) -> Option<i32> {
        let row = (*self.row_map.get(row.index())?)?;
        let column = (*self.column_map.get(column.index())?)?;
        Some(self.scores[[row, column]])
    }

    /// Returns the score of the pair, failing with [`Error::NoSubstitutionEntry`]
    /// if the matrix has no entry for it.
    pub fn lookup(&self, row: Symbol, column: Symbol) -> Result<i32> {
        self.get(row, column)
            .ok_or_else(|| Error::NoSubstitutionEntry {
                row: self.alphabet.token(row),
                column: self.alphabet.token(column),
            })
    }

    /// Rescales all scores into the range `0..=10` by `(score - min) * 10 / (max - min)`.
    ///
    /// The scores stay integers, so the division truncates.
    /// If all scores are equal, they all become zero.
    pub fn normalize(&self) -> Self {
        let range = self.max - self.min;
        let scores = self.scores.mapv(|score| {
            if range == 0 {
                0
            } else {
                (score - self.min) * 10 / range
            }
        });

        Self::new(
            self.alphabet.clone(),
            format!("{}_normalized", self.name),
            self.description.clone(),
            self.rows.clone(),
            self.columns.clone(),
            scores,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{error::Error, symbol::Alphabet};

    use super::SubstitutionMatrix;

    #[test]
    fn identity() {
        let alphabet = Arc::new(Alphabet::dna());
        let matrix = SubstitutionMatrix::identity(alphabet.clone(), 1, -1);
        let a = alphabet.symbol('A').unwrap();
        let c = alphabet.symbol('C').unwrap();
        let m = alphabet.symbol('M').unwrap();

        assert_eq!(matrix.name(), "IDENTITY_1_-1");
        assert_eq!(matrix.lookup(a, a).unwrap(), 1);
        assert_eq!(matrix.lookup(a, c).unwrap(), -1);
        assert_eq!(matrix.lookup(m, c).unwrap(), 1);
        assert_eq!(matrix.min(), -1);
        assert_eq!(matrix.max(), 1);
    }

    #[test]
    fn missing_entry() {
        let alphabet = Arc::new(Alphabet::dna());
        let matrix =
            SubstitutionMatrix::parse(alphabet.clone(), "partial", " A C\nA 2 -1\nC -1 2\n")
                .unwrap();
        let a = alphabet.symbol('A').unwrap();
        let t = alphabet.symbol('T').unwrap();

        assert_eq!(matrix.get(a, t), None);
        assert!(matches!(
            matrix.lookup(t, a),
            Err(Error::NoSubstitutionEntry {
                row: 'T',
                column: 'A'
            })
        ));
    }

    #[test]
    fn normalize() {
        let alphabet = Arc::new(Alphabet::dna());
        let matrix = SubstitutionMatrix::parse(
            alphabet.clone(),
            "small",
            " A C G\nA 5 -4 -1\nC -4 5 0\nG -1 0 5\n",
        )
        .unwrap();
        let normalized = matrix.normalize();
        let a = alphabet.symbol('A').unwrap();
        let c = alphabet.symbol('C').unwrap();
        let g = alphabet.symbol('G').unwrap();

        assert_eq!(normalized.name(), "small_normalized");
        assert_eq!(normalized.lookup(a, a).unwrap(), 10);
        assert_eq!(normalized.lookup(a, c).unwrap(), 0);
        // (-1 + 4) * 10 / 9
        assert_eq!(normalized.lookup(a, g).unwrap(), 3);
        assert_eq!(normalized.lookup(c, g).unwrap(), 4);
        assert_eq!(normalized.min(), 0);
        assert_eq!(normalized.max(), 10);
    }
}
