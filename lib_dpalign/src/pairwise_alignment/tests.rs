use std::sync::Arc;

use crate::{
    error::Error, sequence::Sequence, substitution_matrix::SubstitutionMatrix, symbol::Alphabet,
};

use super::{
    AlignmentScoring, SequenceAligner, needleman_wunsch::NeedlemanWunsch,
    smith_waterman::SmithWaterman,
};

fn scoring(
    match_score: f64,
    replace_score: f64,
    insert_score: f64,
    delete_score: f64,
    gap_extend_score: f64,
) -> AlignmentScoring {
    AlignmentScoring {
        match_score,
        replace_score,
        insert_score,
        delete_score,
        gap_extend_score,
    }
}

fn dna(name: &str, text: &str) -> Sequence {
    Sequence::parse(Arc::new(Alphabet::dna()), name, text).unwrap()
}

fn identity(scoring: &AlignmentScoring) -> Arc<SubstitutionMatrix> {
    Arc::new(SubstitutionMatrix::identity(
        Arc::new(Alphabet::dna()),
        scoring.match_score as i32,
        scoring.replace_score as i32,
    ))
}

fn global(scoring: AlignmentScoring) -> NeedlemanWunsch {
    NeedlemanWunsch::new(scoring, identity(&scoring))
}

fn local(scoring: AlignmentScoring) -> SmithWaterman {
    SmithWaterman::new(scoring, identity(&scoring))
}

#[test]
fn global_identical() {
    let aligner = global(AlignmentScoring::default());
    let alignment = aligner
        .align(&dna("query", "ACGT"), &dna("subject", "ACGT"))
        .unwrap();

    assert_eq!(alignment.score(), 4.0);
    assert_eq!(alignment.aligned_query(), "ACGT");
    assert_eq!(alignment.aligned_subject(), "ACGT");
    assert_eq!(alignment.markers(), "||||");
    assert_eq!(alignment.query_range(), 0..4);
    assert_eq!(alignment.subject_range(), 0..4);
}

#[test]
fn global_with_deletion() {
    let aligner = global(AlignmentScoring::default());
    let alignment = aligner
        .align(&dna("query", "ACGT"), &dna("subject", "AGT"))
        .unwrap();

    assert_eq!(alignment.score(), 1.0);
    assert_eq!(alignment.aligned_query(), "ACGT");
    assert_eq!(alignment.aligned_subject(), "A-GT");
    assert_eq!(alignment.markers(), "| ||");
    assert_eq!(alignment.len(), 4);
    assert_eq!(
        aligner
            .pairwise_alignment(&dna("query", "ACGT"), &dna("subject", "AGT"))
            .unwrap(),
        1.0
    );
}

#[test]
fn global_affine() {
    let aligner = global(scoring(1.0, -1.0, -3.0, -3.0, -1.0));
    assert!(aligner.scoring().is_affine());
    let alignment = aligner
        .align(&dna("query", "ACGT"), &dna("subject", "AGT"))
        .unwrap();
    assert_eq!(alignment.score(), -1.0);
    assert_eq!(alignment.aligned_subject(), "A-GT");

    let aligner = global(scoring(2.0, -1.0, -4.0, -4.0, -1.0));
    let alignment = aligner
        .align(&dna("query", "AAAACCCC"), &dna("subject", "AAAATTCCCC"))
        .unwrap();
    assert_eq!(alignment.score(), 10.0);
    assert_eq!(alignment.aligned_query(), "AAAA--CCCC");
    assert_eq!(alignment.aligned_subject(), "AAAATTCCCC");
    assert_eq!(alignment.markers(), "||||  ||||");
}

#[test]
fn global_against_empty() {
    let aligner = global(AlignmentScoring::default());
    let alignment = aligner
        .align(&dna("query", "ACG"), &dna("subject", ""))
        .unwrap();
    assert_eq!(alignment.score(), -6.0);
    assert_eq!(alignment.aligned_query(), "ACG");
    assert_eq!(alignment.aligned_subject(), "---");

    let alignment = aligner
        .align(&dna("query", ""), &dna("subject", ""))
        .unwrap();
    assert!(alignment.is_empty());
    assert_eq!(alignment.score(), 0.0);
}

#[test]
fn local_finds_the_shared_core() {
    let query = dna("query", "AAACGTAAA");
    let subject = dna("subject", "CGT");

    for (scoring, expected) in [
        (scoring(5.0, -3.0, -4.0, -4.0, -4.0), 15.0),
        (scoring(5.0, -3.0, -6.0, -6.0, -1.0), 15.0),
        (AlignmentScoring::default(), 3.0),
        (scoring(2.0, -1.0, -1.0, -1.0, -1.0), 6.0),
    ] {
        let aligner = local(scoring);
        let alignment = aligner.align(&query, &subject).unwrap();
        assert_eq!(alignment.score(), expected, "{scoring:?}");
        assert_eq!(alignment.aligned_query(), "CGT");
        assert_eq!(alignment.aligned_subject(), "CGT");
        assert_eq!(alignment.query_range(), 3..6);
        assert_eq!(alignment.subject_range(), 0..3);

        let matrix = aligner.fill(&query, &subject).unwrap();
        assert_eq!(matrix.start().position(), (6, 3));
    }
}

#[test]
fn local_affine_borders_start_at_zero() {
    let aligner = local(scoring(1.0, -1.0, -2.0, -2.0, -1.0));
    assert!(aligner.scoring().is_affine());
    let query = dna("query", "A");
    let subject = dna("subject", "GA");

    let alignment = aligner.align(&query, &subject).unwrap();
    assert_eq!(alignment.score(), 1.0);
    assert_eq!(alignment.aligned_query(), "A");
    assert_eq!(alignment.aligned_subject(), "A");
    assert_eq!(alignment.subject_range(), 1..2);

    let matrix = aligner.fill(&query, &subject).unwrap();
    assert_eq!(matrix.start().position(), (1, 2));
    assert!(matrix.scores().row(0).iter().all(|&score| score == 0.0));
    assert_eq!(matrix.insertions().unwrap()[[0, 2]], f64::NEG_INFINITY);
}

#[test]
fn local_invalidation_stops_early_extensions() {
    let aligner = local(scoring(2.0, -1.0, -1.0, -1.0, -1.0));
    let query = dna("query", "TGT");
    let subject = dna("subject", "TTT");

    let alignment = aligner.align(&query, &subject).unwrap();
    assert_eq!(alignment.score(), 2.0);
    assert_eq!(alignment.aligned_query(), "T");
    assert_eq!(alignment.aligned_subject(), "T");
    assert_eq!(alignment.query_range(), 0..1);

    let matrix = aligner.fill(&query, &subject).unwrap();
    assert_eq!(matrix.start().position(), (1, 1));
    assert_eq!(matrix.scores()[[0, 1]], f64::NEG_INFINITY);
    assert_eq!(matrix.scores()[[1, 0]], f64::NEG_INFINITY);
    assert_eq!(matrix.scores()[[3, 1]], 2.0);
}

#[test]
fn self_alignment_is_gap_free() {
    let text = "GATTACACCGTAGGCTTA";
    let sequence = dna("self", text);

    for scoring in [
        AlignmentScoring::default(),
        scoring(2.0, -1.0, -4.0, -4.0, -1.0),
    ] {
        let expected = scoring.match_score * text.len() as f64;

        let alignment = global(scoring).align(&sequence, &sequence).unwrap();
        assert_eq!(alignment.score(), expected);
        assert_eq!(alignment.aligned_query(), text);
        assert_eq!(alignment.aligned_subject(), text);

        let alignment = local(scoring).align(&sequence, &sequence).unwrap();
        assert_eq!(alignment.score(), expected);
        assert_eq!(alignment.aligned_query(), text);
    }
}

#[test]
fn aligned_sequences_have_equal_length() {
    let pairs = [
        ("ACGTTGCA", "AGTTCA"),
        ("TTTT", "GATTACA"),
        ("CCCCGGGG", "GGGGCCCC"),
        ("A", "TTTTTT"),
    ];

    for (query, subject) in pairs {
        let query = dna("query", query);
        let subject = dna("subject", subject);
        for scoring in [
            AlignmentScoring::default(),
            scoring(2.0, -1.0, -4.0, -4.0, -1.0),
        ] {
            let alignment = global(scoring).align(&query, &subject).unwrap();
            assert_eq!(
                alignment.aligned_query().len(),
                alignment.aligned_subject().len()
            );
            assert_eq!(
                alignment.aligned_query().replace('-', ""),
                query.to_string()
            );
            assert_eq!(
                alignment.aligned_subject().replace('-', ""),
                subject.to_string()
            );

            let alignment = local(scoring).align(&query, &subject).unwrap();
            assert_eq!(
                alignment.aligned_query().len(),
                alignment.aligned_subject().len()
            );
            assert!(alignment.score() >= 0.0);
        }
    }
}

#[test]
fn missing_matrix_entries_fall_back_to_match_and_replace() {
    let alphabet = Arc::new(Alphabet::dna());
    let matrix = Arc::new(
        SubstitutionMatrix::parse(alphabet.clone(), "partial", " A C\nA 5 -4\nC -4 5\n").unwrap(),
    );
    let aligner = NeedlemanWunsch::new(AlignmentScoring::default(), matrix);

    let alignment = aligner
        .align(&dna("query", "AG"), &dna("subject", "AG"))
        .unwrap();
    assert_eq!(alignment.score(), 6.0);

    let alignment = aligner
        .align(&dna("query", "AG"), &dna("subject", "AT"))
        .unwrap();
    assert_eq!(alignment.score(), 4.0);
    assert_eq!(alignment.markers(), "| ");
}

#[test]
fn rejects_foreign_alphabets() {
    let aligner = global(AlignmentScoring::default());
    let protein = Sequence::parse(Arc::new(Alphabet::protein()), "protein", "MKV").unwrap();

    assert!(matches!(
        aligner.align(&protein, &dna("subject", "ACG")),
        Err(Error::AlphabetMismatch { .. })
    ));
    assert!(matches!(
        local(AlignmentScoring::default()).align(&dna("query", "ACG"), &protein),
        Err(Error::AlphabetMismatch { .. })
    ));
}

#[test]
fn align_all_keeps_going() {
    let aligner = global(AlignmentScoring::default());
    let queries = [
        dna("first", "ACGT"),
        Sequence::parse(Arc::new(Alphabet::protein()), "protein", "MKV").unwrap(),
        dna("third", "AGT"),
    ];
    let subjects = [dna("a", "ACGT"), dna("b", "AGT")];

    let results = aligner.align_all(&queries, &subjects);
    assert_eq!(results.len(), 6);
    assert_eq!(results[0].as_ref().unwrap().score(), 4.0);
    assert_eq!(results[1].as_ref().unwrap().score(), 1.0);
    assert!(results[2].is_err());
    assert!(results[3].is_err());
    assert_eq!(results[4].as_ref().unwrap().query_name(), "third");
    assert_eq!(results[5].as_ref().unwrap().score(), 3.0);
}

#[test]
fn report_is_split_into_blocks() {
    let text = "ACGTACGTAC".repeat(7);
    let sequence = dna("long", &text);
    let alignment = global(AlignmentScoring::default())
        .align(&sequence, &sequence)
        .unwrap();
    let report = alignment.to_string();
    let lines: Vec<_> = report.lines().collect();

    assert!(lines[0].starts_with("Time in ms:\t"));
    assert_eq!(lines[1], "Length:\t\t70");
    assert_eq!(lines[2], "Score:\t\t70");
    assert_eq!(lines[3], "");
    assert_eq!(lines[4], format!("Query:\t{}", &text[..60]));
    assert_eq!(lines[5], format!("\t{}", "|".repeat(60)));
    assert_eq!(lines[6], format!("Target:\t{}", &text[..60]));
    assert_eq!(lines[7], "");
    assert_eq!(lines[8], format!("Query:\t{}", &text[60..]));
    assert_eq!(lines[9], format!("\t{}", "|".repeat(10)));
    assert_eq!(lines[10], format!("Target:\t{}", &text[60..]));
    assert_eq!(lines.len(), 11);
}

#[test]
fn cost_matrix_rendering() {
    let aligner = global(AlignmentScoring::default());
    let matrix = aligner
        .fill(&dna("query", "AC"), &dna("subject", "AGC"))
        .unwrap();

    assert!(!matrix.is_affine());
    assert_eq!(matrix.dim(), (3, 4));
    assert_eq!(
        matrix.to_string(),
        "   -  A  G  C\n-  0  2  4  6\nA  2 -1  1  3\nC  4  1  0  0\n"
    );

    let affine = global(scoring(1.0, -1.0, -3.0, -3.0, -1.0))
        .fill(&dna("query", "AC"), &dna("subject", "AGC"))
        .unwrap();
    assert!(affine.is_affine());
    let rendered = affine.to_string();
    assert!(rendered.contains("Insertions:\n"));
    assert!(rendered.contains("Deletions:\n"));
    assert_eq!(affine.insertions().unwrap()[[0, 2]], 5.0);
    assert_eq!(affine.deletions().unwrap()[[1, 0]], 4.0);
}
