use log::{debug, trace};

use crate::{
    context::{Advance, Residue},
    error::{Error, Result},
    markov_model::{
        EmissionState, MarkovModel, SENTINEL, SimpleMarkovModel, State, StateId, Transition,
    },
};


/// A state of a [`FlatModel`].
#[derive(Debug, Clone, PartialEq)]
pub enum FlatState {
    Sentinel,
    Emission(EmissionState),
    /// A state of a nested model, seen from the model containing it.
    Wrapped {
        /// The name of the model state that contained the nested model.
        container: String,
        inner: Box<FlatState>,
    },
}

/// A Markov model without nested models, with transitions indexed for the DP engines.
///
/// State ids are assigned depth-first: the sentinel is 0, and the states of a nested model
/// follow each other in the position of the model state that contained them.
/// Predecessor and successor lists are ordered by state id.
#[derive(Debug, Clone)]
pub struct FlatModel {
    name: String,
    heads: usize,
    states: Vec<FlatState>,
    names: Vec<String>,
    predecessors: Vec<Vec<Transition>>,
    successors: Vec<Vec<Transition>>,
}

/// Where a flat state comes from in the model being flattened.
#[derive(Debug, Clone, Copy)]
enum Origin {
    Original(StateId),
    Wrapped { container: StateId, inner: StateId },
}

impl FlatState {
    /// The log weight of emitting `residue`, where `sentinel` is the sentinel residue of the model.
    pub fn weight(&self, residue: Residue, sentinel: Residue) -> f64 {
        match self {
            FlatState::Sentinel => {
                if residue == sentinel {
                    0.0
                } else {
                    f64::NEG_INFINITY
                }
            }
            FlatState::Emission(state) => state.weight(residue),
            FlatState::Wrapped { inner, .. } => inner.weight(residue, sentinel),
        }
    }

    pub fn advance(&self, heads: usize) -> Advance {
        match self {
            FlatState::Sentinel => Advance::all(heads),
            FlatState::Emission(state) => state.advance(),
            FlatState::Wrapped { inner, .. } => inner.advance(heads),
        }
    }

    /// The emission state behind any number of wrappers, or `None` for the sentinel.
    pub fn emission(&self) -> Option<&EmissionState> {
        match self {
            FlatState::Sentinel => None,
            FlatState::Emission(state) => Some(state),
            FlatState::Wrapped { inner, .. } => inner.emission(),
        }
    }
}

impl FlatModel {
    pub fn new(model: &SimpleMarkovModel) -> Self {
        // Pass 1: assign ids.
        let mut states = vec![FlatState::Sentinel];
        let mut names = vec![model.state_name(SENTINEL).to_string()];
        let mut origins = vec![Origin::Original(SENTINEL)];
        let mut inner_models: Vec<Option<FlatModel>> =
            (0..model.state_count()).map(|_| None).collect();

        for (id, state) in model.states().iter().enumerate().skip(1) {
            match state {
                State::Sentinel => {}
                State::Emission(emission) => {
                    trace!("Flat state {} is {}", states.len(), emission.name());
                    states.push(FlatState::Emission(emission.clone()));
                    names.push(emission.name().to_string());
                    origins.push(Origin::Original(id));
                }
                State::Model {
                    name,
                    model: nested,
                } => {
                    let inner_model = FlatModel::new(nested);
                    for inner in 1..inner_model.states.len() {
                        let inner_name = format!("{name}.{}", inner_model.names[inner]);
                        trace!("Flat state {} is {inner_name}", states.len());
                        states.push(FlatState::Wrapped {
                            container: name.clone(),
                            inner: Box::new(inner_model.states[inner].clone()),
                        });
                        names.push(inner_name);
                        origins.push(Origin::Wrapped {
                            container: id,
                            inner,
                        });
                    }
                    inner_models[id] = Some(inner_model);
                }
            }
        }

        // Pass 2: rewrite transitions in terms of the new ids.
        let inner_score = |container: StateId, from: StateId, to: StateId| {
            inner_models[container]
                .as_ref()
                .and_then(|inner_model| inner_model.get_transition_score(from, to))
        };
        let score = |source: Origin, target: Origin| -> Option<f64> {
            match (source, target) {
                (Origin::Original(from), Origin::Original(to)) => {
                    model.get_transition_score(from, to)
                }
                (Origin::Original(from), Origin::Wrapped { container, inner }) => Some(
                    model.get_transition_score(from, container)?
                        + inner_score(container, SENTINEL, inner)?,
                ),
                (Origin::Wrapped { container, inner }, Origin::Original(to)) => Some(
                    inner_score(container, inner, SENTINEL)?
                        + model.get_transition_score(container, to)?,
                ),
                (
                    Origin::Wrapped {
                        container: from_container,
                        inner: from,
                    },
                    Origin::Wrapped {
                        container: to_container,
                        inner: to,
                    },
                ) => {
                    if from_container == to_container {
                        if let Some(score) = inner_score(from_container, from, to) {
                            return Some(score);
                        }
                    }

                    Some(
                        inner_score(from_container, from, SENTINEL)?
                            + model.get_transition_score(from_container, to_container)?
                            + inner_score(to_container, SENTINEL, to)?,
                    )
                }
            }
        };

        let mut predecessors = vec![Vec::new(); states.len()];
        let mut successors = vec![Vec::new(); states.len()];
        for (target, &target_origin) in origins.iter().enumerate() {
            for (source, &source_origin) in origins.iter().enumerate() {
                if let Some(score) = score(source_origin, target_origin) {
                    predecessors[target].push(Transition {
                        state: source,
                        score,
                    });
                    successors[source].push(Transition {
                        state: target,
                        score,
                    });
                }
            }
        }

        debug!(
            "Flattened model {} into {} states with {} transitions",
            model.name(),
            states.len(),
            predecessors.iter().map(Vec::len).sum::<usize>()
        );

        Self {
            name: model.name().to_string(),
            heads: model.heads(),
            states,
            names,
            predecessors,
            successors,
        }
    }

    pub fn state(&self, id: StateId) -> &FlatState {
        &self.states[id]
    }

    pub fn states(&self) -> &[FlatState] {
        &self.states
    }

    pub fn state_by_name(&self, name: &str) -> Result<StateId> {
        self.names
            .iter()
            .position(|known| known == name)
            .ok_or_else(|| Error::UnknownState(name.to_string()))
    }

    pub fn advance(&self, id: StateId) -> Advance {
        self.states[id].advance(self.heads)
    }

    /// Returns the score of the transition, or `None` if it does not exist.
    pub fn get_transition_score(&self, from: StateId, to: StateId) -> Option<f64> {
        self.successors
            .get(from)?
            .iter()
            .find(|transition| transition.state == to)
            .map(|transition| transition.score)
    }

    /// Fails with [`Error::HeadCountMismatch`] unless the model has `heads` heads.
    pub(crate) fn check_heads(&self, heads: usize) -> Result<()> {
        if self.heads == heads {
            Ok(())
        } else {
            Err(Error::HeadCountMismatch {
                expected: heads,
                actual: self.heads,
            })
        }
    }
}

impl MarkovModel for FlatModel {
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
        &self.names[state]
    }

    fn transitions_from(&self, from: StateId) -> &[Transition] {
        &self.successors[from]
    }

    fn transitions_to(&self, to: StateId) -> &[Transition] {
        &self.predecessors[to]
    }
}
