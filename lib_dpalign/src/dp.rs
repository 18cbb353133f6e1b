//! Forward, backward and Viterbi over flat Markov models.
//!
//! [`single::SingleDp`] scores one sequence and keeps whole columns of state scores,
//! while [`pairwise::PairwiseDp`] scores two sequences with a rolling two-row cursor.

use std::rc::Rc;

use ndarray::Array2;

use crate::{context::Residue, markov_model::StateId};

pub mod pairwise;
pub mod single;

/// A link in the chain of states of a Viterbi path.
///
/// Chains share their prefixes, so that every cell of the DP can point to its best
/// predecessor without copying the path leading there.
#[derive(Debug)]
pub struct BackPointer {
    pub state: StateId,
    pub residue: Residue,
    pub previous: Option<Rc<BackPointer>>,
    /// The score of the best path up to and including this state.
    pub score: f64,
}

/// One visited emission state of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStep {
    pub state: StateId,
    pub residue: Residue,
    /// The transition score into this state plus its emission weight.
    pub score: f64,
}

/// A path through a model, without the sentinel at either end.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePath {
    steps: Vec<PathStep>,
    score: f64,
}

/// A DP matrix with one row per sequence position (including both sentinel positions)
/// and one column per state, together with the total score of the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct DpMatrix {
    scores: Array2<f64>,
    score: f64,
}

impl BackPointer {
    pub fn start(state: StateId, residue: Residue) -> Rc<Self> {
        Rc::new(Self {
            state,
            residue,
            previous: None,
            score: 0.0,
        })
    }

    pub fn extend(
        previous: &Rc<BackPointer>,
        state: StateId,
        residue: Residue,
        score: f64,
    ) -> Rc<Self> {
        Rc::new(Self {
            state,
            residue,
            previous: Some(previous.clone()),
            score,
        })
    }

    /// Collects the chain ending in this pointer into a path.
    ///
    /// The first pointer of the chain (the starting sentinel) and this pointer
    /// (the terminal sentinel) are not part of the path.
    pub fn to_path(self: &Rc<Self>) -> StatePath {
        let mut steps = Vec::new();
        let mut current = self.previous.clone();

        while let Some(pointer) = current {
            let Some(previous) = &pointer.previous else {
                break;
            };
            steps.push(PathStep {
                state: pointer.state,
                residue: pointer.residue,
                score: pointer.score - previous.score,
            });
            current = Some(previous.clone());
        }

        steps.reverse();
        StatePath {
            steps,
            score: self.score,
        }
    }
}

/// Frees the chain one link at a time, so that long chains do not overflow the stack.
impl Drop for BackPointer {
    fn drop(&mut self) {
        let mut next = self.previous.take();
        while let Some(pointer) = next {
            next = match Rc::try_unwrap(pointer) {
                Ok(mut pointer) => pointer.previous.take(),
                // Still shared with another chain, which frees the rest.
                Err(_) => None,
            };
        }
    }
}

impl StatePath {
    pub fn new(steps: Vec<PathStep>, score: f64) -> Self {
        Self { steps, score }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.steps.iter().map(|step| step.state)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The total score of the path, including the transition into the terminal sentinel.
    pub fn score(&self) -> f64 {
        self.score
    }
}

impl DpMatrix {
    pub(crate) fn new(scores: Array2<f64>, score: f64) -> Self {
        Self { scores, score }
    }

    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    pub fn get(&self, position: usize, state: StateId) -> f64 {
        self.scores[[position, state]]
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// The probability of being in `state` at `position`, given the whole sequence.
    ///
    /// Only meaningful for the matrix returned by [`single::SingleDp::forwards_backwards`].
    pub fn posterior(&self, position: usize, state: StateId) -> f64 {
        (self.get(position, state) - self.score).exp()
    }
}
