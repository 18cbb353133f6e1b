use std::sync::Arc;

use log::trace;
use ndarray::Array2;

use crate::{
    context::Advance,
    error::{Error, Result},
    markov_model::{EmissionState, SENTINEL, SimpleMarkovModel},
    sequence::Sequence,
    symbol::{Alphabet, Symbol},
};

/// A positional model with one distribution of log weights over the alphabet per column.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    alphabet: Arc<Alphabet>,
    /// Indexed by `[column, symbol]`.
    weights: Array2<f64>,
}

impl WeightMatrix {
    /// Creates a matrix with the given number of columns where every weight is negative infinity.
    pub fn new(alphabet: Arc<Alphabet>, columns: usize) -> Self {
        let weights = Array2::from_elem((columns, alphabet.len()), f64::NEG_INFINITY);
        Self { alphabet, weights }
    }

    /// Creates a matrix from one row of probabilities per column, ordered like the symbols of the alphabet.
    ///
    /// Missing trailing probabilities are zero.
    pub fn from_probabilities(alphabet: Arc<Alphabet>, columns: &[Vec<f64>]) -> Self {
        let mut matrix = Self::new(alphabet, columns.len());
        for (column, probabilities) in columns.iter().enumerate() {
            for (symbol, probability) in probabilities.iter().enumerate() {
                matrix.weights[[column, symbol]] = probability.ln();
            }
        }
        matrix
    }

    pub fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    pub fn columns(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weight(&self, symbol: Symbol, column: usize) -> f64 {
        self.weights[[column, symbol.index()]]
    }

    pub fn set_weight(&mut self, symbol: Symbol, column: usize, weight: f64) {
        self.weights[[column, symbol.index()]] = weight;
    }

    /// The log probability of the matrix emitting the first [`Self::columns`] symbols of the sequence.
    ///
    /// Column `c` scores the symbol at position `c + 1`, symbols beyond the last column are ignored.
    pub fn score(&self, sequence: &Sequence) -> Result<f64> {
        if sequence.alphabet().as_ref() != self.alphabet.as_ref() {
            return Err(Error::AlphabetMismatch {
                query: sequence.alphabet().name().to_string(),
                subject: sequence.alphabet().name().to_string(),
                matrix: self.alphabet.name().to_string(),
            });
        }
        if sequence.len() < self.columns() {
            return Err(Error::SequenceTooShort {
                length: sequence.len(),
                columns: self.columns(),
            });
        }

        Ok((0..self.columns())
            .map(|column| self.weight(sequence.symbol_at(column + 1), column))
            .sum())
    }

    /// Builds a one-head model that walks through the columns in order, one state per column.
    ///
    /// The sentinel enters the first column and the last column returns to the sentinel,
    /// all with probability one. The forward score of a sequence as long as the matrix
    /// is therefore equal to [`Self::score`].
    pub fn to_model(&self, name: impl Into<String>) -> Result<SimpleMarkovModel> {
        let mut model = SimpleMarkovModel::new(name, 1);
        let mut previous = SENTINEL;

        for (column, weights) in self.weights.rows().into_iter().enumerate() {
            let state = model.add_state(EmissionState::new(
                format!("column{column}"),
                Advance::FIRST,
                weights.to_vec(),
            ))?;
            model.create_transition(previous, state, 0.0)?;
            previous = state;
        }
        model.create_transition(previous, SENTINEL, 0.0)?;

        trace!(
            "Converted a weight matrix with {} columns into a model",
            self.columns()
        );
        Ok(model)
    }
}
