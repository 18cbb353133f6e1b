use std::{fmt::Display, ops::Range, time::Duration};

use log::warn;

use crate::{
    context::AlignmentContext,
    error::Result,
    sequence::Sequence,
    substitution_matrix::SubstitutionMatrix,
    symbol::Symbol,
};

pub mod alignment_matrix;
pub mod needleman_wunsch;
pub mod smith_waterman;

#[cfg(test)]
mod tests;

/// The number of alignment columns per block of the report.
const REPORT_WIDTH: usize = 60;

/// Scores for the pairwise aligners. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentScoring {
    /// Used for symbol pairs without a substitution matrix entry whose ambiguity sets overlap.
    pub match_score: f64,
    /// Used for symbol pairs without a substitution matrix entry whose ambiguity sets are disjoint.
    pub replace_score: f64,
    /// Opening a gap in the query.
    pub insert_score: f64,
    /// Opening a gap in the subject.
    pub delete_score: f64,
    /// Extending a gap by one position.
    pub gap_extend_score: f64,
}

/// One column of an alignment, where `None` is a gap.
pub type AlignmentColumn = (Option<Symbol>, Option<Symbol>);

/// Aligns pairs of sequences.
pub trait SequenceAligner {
    fn align(&self, query: &Sequence, subject: &Sequence) -> Result<PairwiseAlignment>;

    /// Returns only the score of the optimal alignment.
    fn pairwise_alignment(&self, query: &Sequence, subject: &Sequence) -> Result<f64> {
        self.align(query, subject).map(|alignment| alignment.score())
    }

    /// Aligns every query against every subject, in query-major order.
    ///
    /// A failing pair does not stop the others.
    fn align_all(
        &self,
        queries: &[Sequence],
        subjects: &[Sequence],
    ) -> Vec<Result<PairwiseAlignment>> {
        let mut result = Vec::with_capacity(queries.len() * subjects.len());
        for query in queries {
            for subject in subjects {
                let alignment = self.align(query, subject);
                if let Err(error) = &alignment {
                    warn!(
                        "Aligning {} against {} failed: {error}",
                        query.name(),
                        subject.name()
                    );
                }
                result.push(alignment);
            }
        }
        result
    }
}

/// Two gapped sequences of equal length with their score.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseAlignment {
    query_name: String,
    subject_name: String,
    aligned_query: String,
    aligned_subject: String,
    /// `|` where both sequences have the same symbol, a space otherwise.
    markers: String,
    query_range: Range<usize>,
    subject_range: Range<usize>,
    score: f64,
    elapsed: Duration,
}

impl AlignmentScoring {
    /// Returns true if gap extensions score differently from gap openings,
    /// which requires separate matrices for alignments ending in gaps.
    ///
    /// The comparison is exact.
    pub fn is_affine(&self) -> bool {
        self.gap_extend_score != self.delete_score || self.gap_extend_score != self.insert_score
    }

    /// The score of aligning `a` against `b`, taken from the matrix if it has an entry,
    /// and from the match or replace score otherwise.
    pub fn substitution_score(&self, matrix: &SubstitutionMatrix, a: Symbol, b: Symbol) -> f64 {
        match matrix.get(a, b) {
            Some(score) => f64::from(score),
            None if matrix.alphabet().matches(a, b) => self.match_score,
            None => self.replace_score,
        }
    }
}

impl Default for AlignmentScoring {
    fn default() -> Self {
        Self {
            match_score: 1.0,
            replace_score: -1.0,
            insert_score: -2.0,
            delete_score: -2.0,
            gap_extend_score: -2.0,
        }
    }
}

impl PairwiseAlignment {
    /// Builds the gapped sequences from alignment columns.
    ///
    /// The ranges are the half-open, 0-based ranges of the sequences covered by the columns.
    pub fn from_columns(
        query: &Sequence,
        subject: &Sequence,
        columns: &[AlignmentColumn],
        query_range: Range<usize>,
        subject_range: Range<usize>,
        score: f64,
        elapsed: Duration,
    ) -> Self {
        let query_alphabet = query.alphabet();
        let subject_alphabet = subject.alphabet();
        let mut aligned_query = String::with_capacity(columns.len());
        let mut aligned_subject = String::with_capacity(columns.len());
        let mut markers = String::with_capacity(columns.len());

        for &(query_symbol, subject_symbol) in columns {
            aligned_query.push(query_symbol.map_or('-', |symbol| query_alphabet.token(symbol)));
            aligned_subject.push(
                subject_symbol.map_or('-', |symbol| subject_alphabet.token(symbol)),
            );
            markers.push(match (query_symbol, subject_symbol) {
                (Some(a), Some(b)) if a == b => '|',
                _ => ' ',
            });
        }

        Self {
            query_name: query.name().to_string(),
            subject_name: subject.name().to_string(),
            aligned_query,
            aligned_subject,
            markers,
            query_range,
            subject_range,
            score,
            elapsed,
        }
    }

    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    pub fn aligned_query(&self) -> &str {
        &self.aligned_query
    }

    pub fn aligned_subject(&self) -> &str {
        &self.aligned_subject
    }

    pub fn markers(&self) -> &str {
        &self.markers
    }

    pub fn query_range(&self) -> Range<usize> {
        self.query_range.clone()
    }

    pub fn subject_range(&self) -> Range<usize> {
        self.subject_range.clone()
    }

    /// The number of alignment columns.
    pub fn len(&self) -> usize {
        self.markers.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Display for PairwiseAlignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Time in ms:\t{}", self.elapsed.as_millis())?;
        writeln!(f, "Length:\t\t{}", self.len())?;
        writeln!(f, "Score:\t\t{}", self.score)?;

        let query: Vec<char> = self.aligned_query.chars().collect();
        let subject: Vec<char> = self.aligned_subject.chars().collect();
        let markers: Vec<char> = self.markers.chars().collect();

        for ((query, markers), subject) in query
            .chunks(REPORT_WIDTH)
            .zip(markers.chunks(REPORT_WIDTH))
            .zip(subject.chunks(REPORT_WIDTH))
        {
            writeln!(f)?;
            writeln!(f, "Query:\t{}", query.iter().collect::<String>())?;
            writeln!(f, "\t{}", markers.iter().collect::<String>())?;
            writeln!(f, "Target:\t{}", subject.iter().collect::<String>())?;
        }

        Ok(())
    }
}

/// Fails unless query, subject and substitution matrix share one alphabet.
fn check_alphabets(
    matrix: &SubstitutionMatrix,
    query: &Sequence,
    subject: &Sequence,
) -> Result<()> {
    AlignmentContext::new(matrix.alphabet().clone()).check_alphabets(query, subject)
}

/// Reverses the columns collected by a traceback and counts the symbols they cover.
fn finish_traceback(mut columns: Vec<AlignmentColumn>) -> (Vec<AlignmentColumn>, usize, usize) {
    columns.reverse();
    let query_count = columns.iter().filter(|(query, _)| query.is_some()).count();
    let subject_count = columns
        .iter()
        .filter(|(_, subject)| subject.is_some())
        .count();
    (columns, query_count, subject_count)
}
