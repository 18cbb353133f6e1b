use std::{sync::Arc, time::Instant};

use log::debug;

use super::{
    AlignmentColumn, AlignmentScoring, PairwiseAlignment, SequenceAligner,
    alignment_matrix::{AlignmentMatrix, AlignmentMatrixIndex},
    check_alphabets, finish_traceback,
};
use crate::{error::Result, sequence::Sequence, substitution_matrix::SubstitutionMatrix};

/// Global alignment with full cost matrices.
///
/// The matrices hold costs, i.e. negated scores, so lower values are better.
/// The score of an alignment is its negated cost.
#[derive(Debug, Clone)]
pub struct NeedlemanWunsch {
    scoring: AlignmentScoring,
    matrix: Arc<SubstitutionMatrix>,
}

/// Gap scores turned into costs.
#[derive(Debug, Clone, Copy)]
struct GapCosts {
    insert: f64,
    delete: f64,
    extend: f64,
}

/// The matrix the traceback currently walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TracebackMatrix {
    Primary,
    /// Extending a run of insertions.
    Insertions,
    /// Extending a run of deletions.
    Deletions,
}

impl NeedlemanWunsch {
    pub fn new(scoring: AlignmentScoring, matrix: Arc<SubstitutionMatrix>) -> Self {
        Self { scoring, matrix }
    }

    pub fn scoring(&self) -> &AlignmentScoring {
        &self.scoring
    }

    pub fn substitution_matrix(&self) -> &Arc<SubstitutionMatrix> {
        &self.matrix
    }

    /// Fills the cost matrices for aligning `query` against `subject`.
    pub fn fill(&self, query: &Sequence, subject: &Sequence) -> Result<AlignmentMatrix> {
        check_alphabets(&self.matrix, query, subject)?;

        let affine = self.scoring.is_affine();
        debug!(
            "Aligning {} ({}) against {} ({}) globally with {} gap costs",
            query.name(),
            query.len(),
            subject.name(),
            subject.len(),
            if affine { "affine" } else { "linear" }
        );

        let mut matrix = AlignmentMatrix::new(query, subject, affine, 0.0, f64::INFINITY);
        if affine {
            self.fill_affine(&mut matrix, query, subject);
        } else {
            self.fill_linear(&mut matrix, query, subject);
        }
        Ok(matrix)
    }

    fn costs(&self) -> GapCosts {
        GapCosts {
            insert: -self.scoring.insert_score,
            delete: -self.scoring.delete_score,
            extend: -self.scoring.gap_extend_score,
        }
    }

    fn substitution(
        &self,
        query: &Sequence,
        subject: &Sequence,
        index: AlignmentMatrixIndex,
    ) -> f64 {
        self.scoring.substitution_score(
            &self.matrix,
            query.symbol_at(index.query_index),
            subject.symbol_at(index.subject_index),
        )
    }

    fn fill_linear(&self, matrix: &mut AlignmentMatrix, query: &Sequence, subject: &Sequence) {
        let costs = self.costs();
        let scores = &mut matrix.scores;

        for query_index in 1..=query.len() {
            scores[[query_index, 0]] = scores[[query_index - 1, 0]] + costs.delete;
        }
        for subject_index in 1..=subject.len() {
            scores[[0, subject_index]] = scores[[0, subject_index - 1]] + costs.insert;
        }

        for query_index in 1..=query.len() {
            for subject_index in 1..=subject.len() {
                let index = AlignmentMatrixIndex::new(query_index, subject_index);
                let substitution = self.substitution(query, subject, index);

                scores[index] = (scores[index.up()] + costs.delete)
                    .min(scores[index.left()] + costs.insert)
                    .min(scores[index.diagonal()] - substitution);
            }
        }
    }

    fn fill_affine(&self, matrix: &mut AlignmentMatrix, query: &Sequence, subject: &Sequence) {
        let costs = self.costs();
        let AlignmentMatrix {
            scores,
            insertions: Some(insertions),
            deletions: Some(deletions),
            ..
        } = matrix
        else {
            unreachable!("affine matrices have gap matrices")
        };

        for query_index in 1..=query.len() {
            scores[[query_index, 0]] = costs.delete + query_index as f64 * costs.extend;
            deletions[[query_index, 0]] = scores[[query_index, 0]];
        }
        for subject_index in 1..=subject.len() {
            scores[[0, subject_index]] = costs.insert + subject_index as f64 * costs.extend;
            insertions[[0, subject_index]] = scores[[0, subject_index]];
        }

        for query_index in 1..=query.len() {
            for subject_index in 1..=subject.len() {
                let index = AlignmentMatrixIndex::new(query_index, subject_index);
                let substitution = self.substitution(query, subject, index);

                let insertion = insertions[index.left()]
                    .min(scores[index.left()] + costs.insert)
                    + costs.extend;
                let deletion = deletions[index.up()]
                    .min(scores[index.up()] + costs.delete)
                    + costs.extend;
                let substitution =
                    scores[index.diagonal()] - substitution;

                insertions[index] = insertion;
                deletions[index] = deletion;
                scores[index] = insertion.min(deletion).min(substitution);
            }
        }
    }

    fn traceback(
        &self,
        matrix: &AlignmentMatrix,
        query: &Sequence,
        subject: &Sequence,
    ) -> Vec<AlignmentColumn> {
        let costs = self.costs();
        let scores = &matrix.scores;
        let mut columns = Vec::with_capacity(query.len() + subject.len());
        let mut index = matrix.start;
        let mut current = TracebackMatrix::Primary;

        let insertion = |index: AlignmentMatrixIndex| {
            (None, Some(subject.symbol_at(index.subject_index)))
        };
        let deletion =
            |index: AlignmentMatrixIndex| (Some(query.symbol_at(index.query_index)), None);
        let diagonal = |index: AlignmentMatrixIndex| {
            (
                Some(query.symbol_at(index.query_index)),
                Some(subject.symbol_at(index.subject_index)),
            )
        };

        while index.query_index > 0 || index.subject_index > 0 {
            if index.query_index == 0 {
                columns.push(insertion(index));
                index = index.left();
                continue;
            }
            if index.subject_index == 0 {
                columns.push(deletion(index));
                index = index.up();
                continue;
            }

            let (Some(insertions), Some(deletions)) = (&matrix.insertions, &matrix.deletions)
            else {
                // Linear gap costs.
                if scores[index]
                    == scores[index.diagonal()]
                        - self.substitution(query, subject, index)
                {
                    columns.push(diagonal(index));
                    index = index.diagonal();
                } else if scores[index] == scores[index.left()] + costs.insert {
                    columns.push(insertion(index));
                    index = index.left();
                } else {
                    columns.push(deletion(index));
                    index = index.up();
                }
                continue;
            };

            if current == TracebackMatrix::Primary {
                if scores[index]
                    == scores[index.diagonal()]
                        - self.substitution(query, subject, index)
                {
                    columns.push(diagonal(index));
                    index = index.diagonal();
                    continue;
                }

                current = if scores[index] == insertions[index] {
                    TracebackMatrix::Insertions
                } else {
                    TracebackMatrix::Deletions
                };
            }

            if current == TracebackMatrix::Insertions {
                let extending = index.subject_index > 1
                    && insertions[index]
                        == insertions[index.left()] + costs.extend;
                columns.push(insertion(index));
                index = index.left();
                if !extending {
                    current = TracebackMatrix::Primary;
                }
            } else {
                let extending = index.query_index > 1
                    && deletions[index] == deletions[index.up()] + costs.extend;
                columns.push(deletion(index));
                index = index.up();
                if !extending {
                    current = TracebackMatrix::Primary;
                }
            }
        }

        columns
    }
}

impl SequenceAligner for NeedlemanWunsch {
    fn align(&self, query: &Sequence, subject: &Sequence) -> Result<PairwiseAlignment> {
        let start = Instant::now();
        let matrix = self.fill(query, subject)?;
        let (columns, query_count, subject_count) =
            finish_traceback(self.traceback(&matrix, query, subject));
        let score = -matrix.scores[matrix.start];

        debug!(
            "Global alignment of {} against {} has {} columns and score {score}",
            query.name(),
            subject.name(),
            columns.len()
        );
        debug_assert_eq!((query_count, subject_count), (query.len(), subject.len()));

        Ok(PairwiseAlignment::from_columns(
            query,
            subject,
            &columns,
            0..query.len(),
            0..subject.len(),
            score,
            start.elapsed(),
        ))
    }
}
