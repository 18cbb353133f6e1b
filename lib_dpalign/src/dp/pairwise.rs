use std::{rc::Rc, time::Instant};

use log::{debug, trace};

use super::{BackPointer, StatePath};
use crate::{
    context::{AlignmentContext, Residue},
    error::{Error, Result},
    flat_model::FlatModel,
    log_space::log_sum_exp,
    markov_model::{MarkovModel, SENTINEL, StateId},
    pairwise_alignment::{AlignmentColumn, PairwiseAlignment},
    sequence::Sequence,
};

pub mod cursor;

#[cfg(test)]
mod tests;

use cursor::PairDpCursor;

/// DP over a model with two heads and a pair of sequences.
///
/// Cell `(i, j)` holds the scores of all states after consuming `i` symbols of the first
/// and `j` symbols of the second sequence. Row `n + 1` and column `m + 1` are only
/// reachable by the sentinel, which consumes the sentinel residue of both sequences.
pub struct PairwiseDp<'a> {
    context: &'a AlignmentContext,
    model: &'a FlatModel,
    sentinel: Residue,
}

/// The most probable path through a pair model, also written as an alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseViterbi {
    pub path: StatePath,
    pub alignment: PairwiseAlignment,
}

impl<'a> PairwiseDp<'a> {
    pub fn new(context: &'a AlignmentContext, model: &'a FlatModel) -> Result<Self> {
        model.check_heads(2)?;
        Ok(Self {
            context,
            model,
            sentinel: context.pair_sentinel(),
        })
    }

    pub fn model(&self) -> &FlatModel {
        self.model
    }

    /// The log probability of the pair of sequences, summed over all paths.
    pub fn forward(&self, first: &Sequence, second: &Sequence) -> Result<f64> {
        let mut start = vec![f64::NEG_INFINITY; self.model.state_count()];
        start[SENTINEL] = 0.0;

        let last = self.fill(
            first,
            second,
            f64::NEG_INFINITY,
            start,
            |state, _, weight, predecessor| {
                weight
                    + log_sum_exp(
                        self.model
                            .transitions_to(state)
                            .iter()
                            .map(|transition| (transition.score, predecessor[transition.state])),
                    )
            },
        )?;

        debug!(
            "Forward score of {} and {} through {} is {}",
            first.name(),
            second.name(),
            self.model.name(),
            last[SENTINEL]
        );
        Ok(last[SENTINEL])
    }

    /// The most probable path emitting the pair of sequences.
    ///
    /// Among equally scoring predecessors, the one with the lowest state id wins.
    pub fn viterbi(&self, first: &Sequence, second: &Sequence) -> Result<PairwiseViterbi> {
        let started = Instant::now();
        let mut start = vec![None; self.model.state_count()];
        start[SENTINEL] = Some(BackPointer::start(SENTINEL, self.sentinel));

        let last = self.fill(
            first,
            second,
            None,
            start,
            |state, residue, weight, predecessor: &[Option<Rc<BackPointer>>]| {
                let mut best = None;
                let mut best_score = f64::NEG_INFINITY;
                for transition in self.model.transitions_to(state) {
                    if let Some(pointer) = &predecessor[transition.state] {
                        let score = pointer.score + transition.score;
                        if score > best_score {
                            best_score = score;
                            best = Some(pointer);
                        }
                    }
                }

                best.map(|pointer| BackPointer::extend(pointer, state, residue, best_score + weight))
            },
        )?;

        let path = last[SENTINEL]
            .as_ref()
            .map(BackPointer::to_path)
            .ok_or(Error::NoPath)?;
        let columns: Vec<AlignmentColumn> = path
            .steps()
            .iter()
            .map(|step| self.context.split_pair(step.residue))
            .collect();
        let alignment = PairwiseAlignment::from_columns(
            first,
            second,
            &columns,
            0..first.len(),
            0..second.len(),
            path.score(),
            started.elapsed(),
        );

        debug!(
            "Viterbi path of {} and {} through {} has {} steps and score {}",
            first.name(),
            second.name(),
            self.model.name(),
            path.len(),
            path.score()
        );
        Ok(PairwiseViterbi { path, alignment })
    }

    /// Fills the DP surface row by row and returns the values at the terminal cell.
    ///
    /// `compute` receives a state, the residue it emits at the cell, its emission weight and the
    /// values of all states at the predecessor cell given by the advance of the state.
    /// It is only called for states with a finite weight and a predecessor inside the surface.
    fn fill<T: Clone>(
        &self,
        first: &Sequence,
        second: &Sequence,
        empty: T,
        start: Vec<T>,
        mut compute: impl FnMut(StateId, Residue, f64, &[T]) -> T,
    ) -> Result<Vec<T>> {
        self.context.check_alphabets(first, second)?;
        let state_count = self.model.state_count();
        let rows = first.len() + 2;
        let columns = second.len() + 2;
        trace!(
            "Filling a {rows}x{columns} pair DP surface with {state_count} states of {}",
            self.model.name()
        );

        let mut cursor = PairDpCursor::new(columns, state_count, empty.clone());
        cursor.set(0, &start);
        let mut values = vec![empty.clone(); state_count];

        for row in 0..rows {
            if row > 0 {
                cursor.advance();
            }

            for column in 0..columns {
                if row == 0 && column == 0 {
                    continue;
                }
                values.fill(empty.clone());

                for (state, entry) in values.iter_mut().enumerate() {
                    let advance = self.model.advance(state);
                    if (advance.first && row == 0) || (advance.second && column == 0) {
                        continue;
                    }

                    let first_residue = if advance.first {
                        self.context.residue(first, row)
                    } else {
                        self.context.gap()
                    };
                    let second_residue = if advance.second {
                        self.context.residue(second, column)
                    } else {
                        self.context.gap()
                    };
                    let Some(residue) = self.context.pair(first_residue, second_residue) else {
                        continue;
                    };

                    let weight = self.model.state(state).weight(residue, self.sentinel);
                    if weight == f64::NEG_INFINITY {
                        continue;
                    }

                    let Some(predecessor) = cursor.cell(
                        row - usize::from(advance.first),
                        column - usize::from(advance.second),
                    ) else {
                        continue;
                    };
                    *entry = compute(state, residue, weight, predecessor);
                }

                cursor.set(column, &values);
            }
        }

        Ok(cursor
            .cell(rows - 1, columns - 1)
            .map(<[T]>::to_vec)
            .unwrap_or_else(|| vec![empty; state_count]))
    }
}
