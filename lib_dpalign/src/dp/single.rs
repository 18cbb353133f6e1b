use std::rc::Rc;

use log::debug;
use ndarray::{Array2, aview1};
use rand::Rng;

use super::{BackPointer, DpMatrix, PathStep, StatePath};
use crate::{
    context::{AlignmentContext, Residue},
    error::{Error, Result},
    flat_model::FlatModel,
    log_space::log_sum_exp,
    markov_model::{MarkovModel, SENTINEL, StateId},
    sequence::Sequence,
};


/// DP over a model with one head and a single sequence.
///
/// Position 0 of a sequence of length `n` and position `n + 1` hold the sentinel residue,
/// so every path starts and ends in the sentinel state.
pub struct SingleDp<'a> {
    context: &'a AlignmentContext,
    model: &'a FlatModel,
    sentinel: Residue,
}

/// A sequence sampled from a model, together with the path that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub sequence: Sequence,
    pub path: StatePath,
}

impl<'a> SingleDp<'a> {
    pub fn new(context: &'a AlignmentContext, model: &'a FlatModel) -> Result<Self> {
        model.check_heads(1)?;
        Ok(Self {
            context,
            model,
            sentinel: context.sentinel(),
        })
    }

    pub fn model(&self) -> &FlatModel {
        self.model
    }

    /// The log probability of the sequence, summed over all paths.
    pub fn forward(&self, sequence: &Sequence) -> Result<f64> {
        let last = self.forward_columns(sequence, |_, _| {})?;
        Ok(last[SENTINEL])
    }

    /// Like [`Self::forward`], but keeps every column.
    pub fn forward_matrix(&self, sequence: &Sequence) -> Result<DpMatrix> {
        let mut scores = self.empty_matrix(sequence);
        let last = self.forward_columns(sequence, |position, column| {
            scores.row_mut(position).assign(&aview1(column));
        })?;
        Ok(DpMatrix::new(scores, last[SENTINEL]))
    }

    /// The log probability of the sequence computed from the end towards the start.
    pub fn backward(&self, sequence: &Sequence) -> Result<f64> {
        let first = self.backward_columns(sequence, |_, _| {})?;
        Ok(first[SENTINEL])
    }

    pub fn backward_matrix(&self, sequence: &Sequence) -> Result<DpMatrix> {
        let mut scores = self.empty_matrix(sequence);
        let first = self.backward_columns(sequence, |position, column| {
            scores.row_mut(position).assign(&aview1(column));
        })?;
        Ok(DpMatrix::new(scores, first[SENTINEL]))
    }

    /// Sums the forward and backward matrices, such that [`DpMatrix::posterior`]
    /// yields the posterior probability of each state at each position.
    pub fn forwards_backwards(&self, sequence: &Sequence) -> Result<DpMatrix> {
        let forward = self.forward_matrix(sequence)?;
        let backward = self.backward_matrix(sequence)?;
        Ok(DpMatrix::new(
            forward.scores() + backward.scores(),
            forward.score(),
        ))
    }

    /// The most probable path emitting the sequence.
    ///
    /// Among equally scoring predecessors, the one with the lowest state id wins.
    pub fn viterbi(&self, sequence: &Sequence) -> Result<StatePath> {
        self.check_sequence(sequence)?;
        let state_count = self.model.state_count();

        let mut previous: Vec<Option<Rc<BackPointer>>> = vec![None; state_count];
        previous[SENTINEL] = Some(BackPointer::start(SENTINEL, self.sentinel));

        for position in 1..=sequence.len() + 1 {
            let residue = self.context.residue(sequence, position);
            let mut current = vec![None; state_count];

            for (state, entry) in current.iter_mut().enumerate() {
                let weight = self.weight(state, residue);
                if weight == f64::NEG_INFINITY {
                    continue;
                }

                let mut best = None;
                let mut best_score = f64::NEG_INFINITY;
                for transition in self.model.transitions_to(state) {
                    if let Some(pointer) = &previous[transition.state] {
                        let score = pointer.score + transition.score;
                        if score > best_score {
                            best_score = score;
                            best = Some(pointer);
                        }
                    }
                }

                if let Some(pointer) = best {
                    *entry = Some(BackPointer::extend(
                        pointer,
                        state,
                        residue,
                        best_score + weight,
                    ));
                }
            }

            previous = current;
        }

        let path = previous[SENTINEL]
            .as_ref()
            .map(BackPointer::to_path)
            .ok_or(Error::NoPath)?;
        debug!(
            "Viterbi path of {} through {} has {} steps and score {}",
            sequence.name(),
            self.model.name(),
            path.len(),
            path.score()
        );
        Ok(path)
    }

    /// Samples a sequence by walking the model from the sentinel.
    ///
    /// Stops after `length` emissions, or when the walk returns to the sentinel.
    /// The score of the returned path includes the transition into the sentinel if there was one.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        length: Option<usize>,
        rng: &mut R,
    ) -> Result<Generated> {
        let mut state = SENTINEL;
        let mut steps = Vec::new();
        let mut score = 0.0;

        while length.is_none_or(|length| steps.len() < length) {
            let next = self.model.sample_transition(state, rng)?;
            let transition = self.model.transition_score(state, next)?;
            score += transition;

            let Some(emission) = self.model.state(next).emission() else {
                break;
            };
            let residue = emission.sample_residue(rng)?;
            let step_score = transition + emission.weight(residue);
            score += emission.weight(residue);

            steps.push(PathStep {
                state: next,
                residue,
                score: step_score,
            });
            state = next;
        }

        let symbols = steps
            .iter()
            .filter_map(|step| self.context.residue_symbol(step.residue))
            .collect();
        Ok(Generated {
            sequence: Sequence::new(self.context.alphabet().clone(), "generated", symbols),
            path: StatePath::new(steps, score),
        })
    }

    /// Runs the forward recurrence, handing every column to `visit` and returning the last.
    fn forward_columns(
        &self,
        sequence: &Sequence,
        mut visit: impl FnMut(usize, &[f64]),
    ) -> Result<Vec<f64>> {
        self.check_sequence(sequence)?;
        let state_count = self.model.state_count();

        let mut previous = vec![f64::NEG_INFINITY; state_count];
        previous[SENTINEL] = 0.0;
        let mut current = vec![f64::NEG_INFINITY; state_count];
        visit(0, &previous);

        for position in 1..=sequence.len() + 1 {
            let residue = self.context.residue(sequence, position);

            for (state, entry) in current.iter_mut().enumerate() {
                let weight = self.weight(state, residue);
                *entry = if weight == f64::NEG_INFINITY {
                    f64::NEG_INFINITY
                } else {
                    weight
                        + log_sum_exp(
                            self.model
                                .transitions_to(state)
                                .iter()
                                .map(|transition| (transition.score, previous[transition.state])),
                        )
                };
            }

            visit(position, &current);
            std::mem::swap(&mut previous, &mut current);
        }

        debug!(
            "Forward score of {} through {} is {}",
            sequence.name(),
            self.model.name(),
            previous[SENTINEL]
        );
        Ok(previous)
    }

    /// Runs the backward recurrence from the terminal sentinel towards position 0.
    fn backward_columns(
        &self,
        sequence: &Sequence,
        mut visit: impl FnMut(usize, &[f64]),
    ) -> Result<Vec<f64>> {
        self.check_sequence(sequence)?;
        let state_count = self.model.state_count();

        let mut next = vec![f64::NEG_INFINITY; state_count];
        next[SENTINEL] = 0.0;
        let mut current = vec![f64::NEG_INFINITY; state_count];
        visit(sequence.len() + 1, &next);

        for position in (0..=sequence.len()).rev() {
            let residue = self.context.residue(sequence, position + 1);

            for (state, entry) in current.iter_mut().enumerate() {
                *entry = log_sum_exp(self.model.transitions_from(state).iter().map(
                    |transition| {
                        (
                            transition.score + self.weight(transition.state, residue),
                            next[transition.state],
                        )
                    },
                ));
            }

            visit(position, &current);
            std::mem::swap(&mut next, &mut current);
        }

        Ok(next)
    }

    fn empty_matrix(&self, sequence: &Sequence) -> Array2<f64> {
        Array2::from_elem(
            (sequence.len() + 2, self.model.state_count()),
            f64::NEG_INFINITY,
        )
    }

    fn weight(&self, state: StateId, residue: Residue) -> f64 {
        self.model.state(state).weight(residue, self.sentinel)
    }

    fn check_sequence(&self, sequence: &Sequence) -> Result<()> {
        self.context.check_alphabets(sequence, sequence)
    }
}
