use std::sync::Arc;

use crate::{
    context::{Advance, AlignmentContext},
    error::Error,
    flat_model::FlatModel,
    markov_model::{EmissionState, SENTINEL, SimpleMarkovModel},
    sequence::Sequence,
    symbol::Alphabet,
};

use super::PairwiseDp;

const MATCH: usize = 1;
const INSERT: usize = 2;
const DELETE: usize = 3;

/// A pair model with one match state, one state emitting only from the second
/// sequence and one emitting only from the first.
fn pair_model(context: &AlignmentContext) -> FlatModel {
    let alphabet = context.alphabet();
    let bases: Vec<_> = "ACGT".chars().map(|token| alphabet.symbol(token).unwrap()).collect();
    let residues = context.residue_count(2);

    let mut matching = vec![0.0; residues];
    let mut inserting = vec![0.0; residues];
    let mut deleting = vec![0.0; residues];
    for &a in &bases {
        for &b in &bases {
            matching[context.pair_symbols(Some(a), Some(b)).index()] =
                if a == b { 0.2 } else { 0.2 / 12.0 };
        }
        inserting[context.pair_symbols(None, Some(a)).index()] = 0.25;
        deleting[context.pair_symbols(Some(a), None).index()] = 0.25;
    }

    let mut model = SimpleMarkovModel::new("pair", 2);
    let states = [
        model
            .add_state(EmissionState::from_probabilities(
                "match",
                Advance::BOTH,
                &matching,
            ))
            .unwrap(),
        model
            .add_state(EmissionState::from_probabilities(
                "insert",
                Advance::SECOND,
                &inserting,
            ))
            .unwrap(),
        model
            .add_state(EmissionState::from_probabilities(
                "delete",
                Advance::FIRST,
                &deleting,
            ))
            .unwrap(),
    ];
    assert_eq!(states, [MATCH, INSERT, DELETE]);

    for (from, to, probability) in [
        (SENTINEL, MATCH, 0.8),
        (SENTINEL, INSERT, 0.1),
        (SENTINEL, DELETE, 0.1),
        (MATCH, MATCH, 0.8),
        (MATCH, INSERT, 0.05),
        (MATCH, DELETE, 0.05),
        (MATCH, SENTINEL, 0.1),
        (INSERT, INSERT, 0.4),
        (INSERT, MATCH, 0.5),
        (INSERT, SENTINEL, 0.1),
        (DELETE, DELETE, 0.4),
        (DELETE, MATCH, 0.5),
        (DELETE, SENTINEL, 0.1),
    ] {
        model
            .create_transition(from, to, f64::ln(probability))
            .unwrap();
    }

    FlatModel::new(&model)
}

fn dna_context() -> AlignmentContext {
    AlignmentContext::new(Arc::new(Alphabet::dna()))
}

/// Visits every path emitting exactly the two sequences and collects the log of the
/// summed probability and the best log probability.
fn brute_force(
    model: &FlatModel,
    context: &AlignmentContext,
    first: &Sequence,
    second: &Sequence,
) -> (f64, f64) {
    #[expect(clippy::too_many_arguments)]
    fn visit(
        model: &FlatModel,
        context: &AlignmentContext,
        first: &Sequence,
        second: &Sequence,
        position: (usize, usize),
        previous: usize,
        score: f64,
        result: &mut (f64, f64),
    ) {
        if score == f64::NEG_INFINITY {
            return;
        }
        if position == (first.len(), second.len()) {
            let score = score
                + model
                    .get_transition_score(previous, SENTINEL)
                    .unwrap_or(f64::NEG_INFINITY);
            result.0 += score.exp();
            result.1 = result.1.max(score);
        }

        for state in [MATCH, INSERT, DELETE] {
            let advance = model.advance(state);
            let next = (
                position.0 + usize::from(advance.first),
                position.1 + usize::from(advance.second),
            );
            if next.0 > first.len() || next.1 > second.len() {
                continue;
            }

            let residue = context.pair_symbols(
                advance.first.then(|| first.symbol_at(next.0)),
                advance.second.then(|| second.symbol_at(next.1)),
            );
            let step = model
                .get_transition_score(previous, state)
                .unwrap_or(f64::NEG_INFINITY)
                + model.state(state).weight(residue, context.pair_sentinel());
            visit(
                model,
                context,
                first,
                second,
                next,
                state,
                score + step,
                result,
            );
        }
    }

    let mut result = (0.0, f64::NEG_INFINITY);
    visit(
        model,
        context,
        first,
        second,
        (0, 0),
        SENTINEL,
        0.0,
        &mut result,
    );
    (result.0.ln(), result.1)
}

#[test]
fn forward_and_viterbi_match_enumeration() {
    let context = dna_context();
    let model = pair_model(&context);
    let dp = PairwiseDp::new(&context, &model).unwrap();

    for (first, second) in [("ACG", "AG"), ("GATT", "GTTA"), ("C", "CCC"), ("AC", "")] {
        let first = Sequence::parse(context.alphabet().clone(), "first", first).unwrap();
        let second = Sequence::parse(context.alphabet().clone(), "second", second).unwrap();
        let (expected_forward, expected_viterbi) = brute_force(&model, &context, &first, &second);

        let forward = dp.forward(&first, &second).unwrap();
        assert!(
            (forward - expected_forward).abs() < 1e-9,
            "{first} {second}: {forward} != {expected_forward}"
        );

        let viterbi = dp.viterbi(&first, &second).unwrap();
        assert!(
            (viterbi.path.score() - expected_viterbi).abs() < 1e-9,
            "{first} {second}: {} != {expected_viterbi}",
            viterbi.path.score()
        );
        assert_eq!(
            viterbi.alignment.aligned_query().replace('-', ""),
            first.to_string()
        );
        assert_eq!(
            viterbi.alignment.aligned_subject().replace('-', ""),
            second.to_string()
        );
        assert!(forward >= viterbi.path.score());
    }
}

#[test]
fn identical_sequences_align_by_matches() {
    let context = dna_context();
    let model = pair_model(&context);
    let dp = PairwiseDp::new(&context, &model).unwrap();
    let sequence = Sequence::parse(context.alphabet().clone(), "s", "GATTACA").unwrap();

    let viterbi = dp.viterbi(&sequence, &sequence).unwrap();
    assert!(viterbi.path.states().all(|state| state == MATCH));
    assert_eq!(viterbi.alignment.aligned_query(), "GATTACA");
    assert_eq!(viterbi.alignment.markers(), "|||||||");
    assert_eq!(viterbi.alignment.score(), viterbi.path.score());

    let sum: f64 = viterbi.path.steps().iter().map(|step| step.score).sum();
    assert!((viterbi.path.score() - sum - 0.1f64.ln()).abs() < 1e-9);
}

#[test]
fn gaps_follow_the_advance() {
    let context = dna_context();
    let model = pair_model(&context);
    let dp = PairwiseDp::new(&context, &model).unwrap();
    let first = Sequence::parse(context.alphabet().clone(), "first", "").unwrap();
    let second = Sequence::parse(context.alphabet().clone(), "second", "TG").unwrap();

    let viterbi = dp.viterbi(&first, &second).unwrap();
    assert_eq!(viterbi.path.states().collect::<Vec<_>>(), [INSERT, INSERT]);
    assert_eq!(viterbi.alignment.aligned_query(), "--");
    assert_eq!(viterbi.alignment.aligned_subject(), "TG");
    let expected = 0.1f64.ln() + 0.25f64.ln() + 0.4f64.ln() + 0.25f64.ln() + 0.1f64.ln();
    assert!((viterbi.path.score() - expected).abs() < 1e-9);
}

#[test]
fn long_gaps() {
    let context = dna_context();
    let model = pair_model(&context);
    let dp = PairwiseDp::new(&context, &model).unwrap();
    let text = "GATTACA".repeat(20_000);
    let first = Sequence::parse(context.alphabet().clone(), "first", &text).unwrap();
    let second = Sequence::parse(context.alphabet().clone(), "second", "").unwrap();

    let viterbi = dp.viterbi(&first, &second).unwrap();
    assert_eq!(viterbi.path.len(), 140_000);
    assert!(viterbi.path.states().all(|state| state == DELETE));
    assert_eq!(viterbi.alignment.aligned_query(), text);
}

#[test]
fn rejects_foreign_inputs() {
    let context = dna_context();
    let model = pair_model(&context);
    let dp = PairwiseDp::new(&context, &model).unwrap();
    let protein = Sequence::parse(Arc::new(Alphabet::protein()), "p", "MKV").unwrap();
    let dna = Sequence::parse(context.alphabet().clone(), "d", "ACG").unwrap();
    assert!(matches!(
        dp.forward(&dna, &protein),
        Err(Error::AlphabetMismatch { .. })
    ));

    let single = FlatModel::new(&SimpleMarkovModel::new("single", 1));
    assert!(matches!(
        PairwiseDp::new(&context, &single),
        Err(Error::HeadCountMismatch {
            expected: 2,
            actual: 1
        })
    ));
}

#[test]
fn unreachable_end() {
    let context = dna_context();
    let model = pair_model(&context);
    let dp = PairwiseDp::new(&context, &model).unwrap();
    let first = Sequence::parse(context.alphabet().clone(), "first", "N").unwrap();
    let second = Sequence::parse(context.alphabet().clone(), "second", "A").unwrap();

    assert_eq!(dp.forward(&first, &second).unwrap(), f64::NEG_INFINITY);
    assert!(matches!(dp.viterbi(&first, &second), Err(Error::NoPath)));
}
