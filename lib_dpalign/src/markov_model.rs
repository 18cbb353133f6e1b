use std::{fmt::Write, sync::Arc};

use log::trace;
use rand::Rng;

use crate::{
    context::{Advance, Residue},
    error::{Error, Result},
};


/// The index of a state in its model.
pub type StateId = usize;

/// Every model has the sentinel state at this index.
pub const SENTINEL: StateId = 0;

const SENTINEL_NAME: &str = "sentinel";

/// A state that emits one residue each time it is entered.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionState {
    name: String,
    advance: Advance,
    /// Log weights indexed by [`Residue::index`].
    weights: Vec<f64>,
}

#[derive(Debug, Clone)]
pub enum State {
    /// The start and end state of every path.
    Sentinel,
    Emission(EmissionState),
    /// A state that stands for a whole nested model.
    Model {
        name: String,
        model: Arc<SimpleMarkovModel>,
    },
}

/// One end of a scored transition.
///
/// In [`MarkovModel::transitions_from`], `state` is the target,
/// and in [`MarkovModel::transitions_to`] it is the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: StateId,
    /// A log probability.
    pub score: f64,
}

/// A graph of states with scored transitions.
pub trait MarkovModel {
    fn name(&self) -> &str;

    /// The number of sequences a path through this model emits.
    fn heads(&self) -> usize;

    fn state_count(&self) -> usize;

    fn state_name(&self, state: StateId) -> &str;

    fn transitions_from(&self, from: StateId) -> &[Transition];

    fn transitions_to(&self, to: StateId) -> &[Transition];

    fn transition_score(&self, from: StateId, to: StateId) -> Result<f64> {
        self.transitions_from(from)
            .iter()
            .find(|transition| transition.state == to)
            .map(|transition| transition.score)
            .ok_or_else(|| Error::IllegalTransition {
                from: self.state_name(from).to_string(),
                to: self.state_name(to).to_string(),
            })
    }

    /// Chooses a successor of `from` with the probabilities given by the transition scores.
    ///
    /// Fails with [`Error::SamplingExhausted`] if the outgoing probabilities sum to less than
    /// the sampled value.
    fn sample_transition<R: Rng + ?Sized>(&self, from: StateId, rng: &mut R) -> Result<StateId> {
        let sampled: f64 = rng.gen_range(0.0..1.0);
        let mut remaining = sampled;

        for transition in self.transitions_from(from) {
            remaining -= transition.score.exp();
            if remaining <= 0.0 {
                return Ok(transition.state);
            }
        }

        let mut transitions = String::new();
        for transition in self.transitions_from(from) {
            // Writing into a string cannot fail.
            let _ = writeln!(
                transitions,
                "\t{} -> {}: p={}",
                self.state_name(from),
                self.state_name(transition.state),
                transition.score.exp()
            );
        }

        Err(Error::SamplingExhausted {
            state: self.state_name(from).to_string(),
            sampled,
            transitions,
        })
    }
}

/// An editable Markov model whose states may contain nested models.
#[derive(Debug, Clone)]
pub struct SimpleMarkovModel {
    name: String,
    heads: usize,
    states: Vec<State>,
    outgoing: Vec<Vec<Transition>>,
    incoming: Vec<Vec<Transition>>,
}

impl EmissionState {
    pub fn new(name: impl Into<String>, advance: Advance, weights: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            advance,
            weights,
        }
    }

    /// Creates a state from emission probabilities instead of log weights.
    pub fn from_probabilities(
        name: impl Into<String>,
        advance: Advance,
        probabilities: &[f64],
    ) -> Self {
        Self::new(
            name,
            advance,
            probabilities
                .iter()
                .map(|probability| probability.ln())
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn advance(&self) -> Advance {
        self.advance
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The log weight of emitting `residue`. Residues outside of the table,
    /// including every sentinel, have weight negative infinity.
    pub fn weight(&self, residue: Residue) -> f64 {
        self.weights
            .get(residue.index())
            .copied()
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Draws a residue with the probabilities given by the weights.
    pub fn sample_residue<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Residue> {
        let sampled: f64 = rng.gen_range(0.0..1.0);
        let mut remaining = sampled;

        for (index, weight) in self.weights.iter().enumerate() {
            remaining -= weight.exp();
            if remaining <= 0.0 {
                return Ok(Residue::from_index(index));
            }
        }

        let mut weights = String::new();
        for (index, weight) in self.weights.iter().enumerate() {
            let _ = writeln!(weights, "\tresidue {index}: p={}", weight.exp());
        }

        Err(Error::SamplingExhausted {
            state: self.name.clone(),
            sampled,
            transitions: weights,
        })
    }
}

impl State {
    pub fn name(&self) -> &str {
        match self {
            State::Sentinel => SENTINEL_NAME,
            State::Emission(state) => state.name(),
            State::Model { name, .. } => name,
        }
    }
}

impl SimpleMarkovModel {
    /// Creates a model that contains only the sentinel state.
    pub fn new(name: impl Into<String>, heads: usize) -> Self {
        Self {
            name: name.into(),
            heads,
            states: vec![State::Sentinel],
            outgoing: vec![Vec::new()],
            incoming: vec![Vec::new()],
        }
    }

    pub fn add_state(&mut self, state: EmissionState) -> Result<StateId> {
        if !state.advance().fits(self.heads) {
            return Err(Error::IllegalAdvance {
                state: state.name().to_string(),
                advance: state.advance().to_string(),
            });
        }

        self.push_state(State::Emission(state))
    }

    /// Adds a state that is replaced by the states of `model` when the model is flattened.
    pub fn add_model_state(
        &mut self,
        name: impl Into<String>,
        model: Arc<SimpleMarkovModel>,
    ) -> Result<StateId> {
        if model.heads() != self.heads {
            return Err(Error::HeadCountMismatch {
                expected: self.heads,
                actual: model.heads(),
            });
        }

        self.push_state(State::Model {
            name: name.into(),
            model,
        })
    }

    fn push_state(&mut self, state: State) -> Result<StateId> {
        if self.state_by_name(state.name()).is_ok() {
            return Err(Error::DuplicateState(state.name().to_string()));
        }

        let id = self.states.len();
        trace!("Adding state {} to model {} as {id}", state.name(), self.name);
        self.states.push(state);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        Ok(id)
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state_by_name(&self, name: &str) -> Result<StateId> {
        self.states
            .iter()
            .position(|state| state.name() == name)
            .ok_or_else(|| Error::UnknownState(name.to_string()))
    }

    /// Creates a transition with the given log probability, replacing the score of an
    /// existing transition between the same states.
    pub fn create_transition(&mut self, from: StateId, to: StateId, score: f64) -> Result<()> {
        self.check_state(from)?;
        self.check_state(to)?;

        if self.contains_transition(from, to) {
            return self.set_transition_score(from, to, score);
        }

        self.outgoing[from].push(Transition { state: to, score });
        self.incoming[to].push(Transition { state: from, score });
        Ok(())
    }

    pub fn set_transition_score(&mut self, from: StateId, to: StateId, score: f64) -> Result<()> {
        self.check_state(from)?;
        self.check_state(to)?;

        if !self.contains_transition(from, to) {
            return Err(self.illegal_transition(from, to));
        }

        for transition in &mut self.outgoing[from] {
            if transition.state == to {
                transition.score = score;
            }
        }
        for transition in &mut self.incoming[to] {
            if transition.state == from {
                transition.score = score;
            }
        }
        Ok(())
    }

    pub fn destroy_transition(&mut self, from: StateId, to: StateId) -> Result<()> {
        self.check_state(from)?;
        self.check_state(to)?;

        if !self.contains_transition(from, to) {
            return Err(self.illegal_transition(from, to));
        }

        self.outgoing[from].retain(|transition| transition.state != to);
        self.incoming[to].retain(|transition| transition.state != from);
        Ok(())
    }

    pub fn contains_transition(&self, from: StateId, to: StateId) -> bool {
        self.outgoing
            .get(from)
            .is_some_and(|outgoing| outgoing.iter().any(|transition| transition.state == to))
    }

    /// Returns the score of the transition, or `None` if it does not exist.
    pub fn get_transition_score(&self, from: StateId, to: StateId) -> Option<f64> {
        self.outgoing
            .get(from)?
            .iter()
            .find(|transition| transition.state == to)
            .map(|transition| transition.score)
    }

    fn check_state(&self, id: StateId) -> Result<()> {
        if id < self.states.len() {
            Ok(())
        } else {
            Err(Error::UnknownState(format!("#{id} in model {}", self.name)))
        }
    }

    fn illegal_transition(&self, from: StateId, to: StateId) -> Error {
        Error::IllegalTransition {
            from: self.state_name(from).to_string(),
            to: self.state_name(to).to_string(),
        }
    }
}

impl MarkovModel for SimpleMarkovModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn heads(&self) -> usize {
        self.heads
    }

    fn state_count(&self) -> usize {
        self.states.len()
    }

    fn state_name(&self, state: StateId) -> &str {
        self.states[state].name()
    }

    fn transitions_from(&self, from: StateId) -> &[Transition] {
        &self.outgoing[from]
    }

    fn transitions_to(&self, to: StateId) -> &[Transition] {
        &self.incoming[to]
    }
}
