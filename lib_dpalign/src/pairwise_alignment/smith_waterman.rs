use std::{sync::Arc, time::Instant};

use log::{debug, trace};

use super::{
    AlignmentColumn, AlignmentScoring, PairwiseAlignment, SequenceAligner,
    alignment_matrix::{AlignmentMatrix, AlignmentMatrixIndex},
    check_alphabets, finish_traceback,
};
use crate::{error::Result, sequence::Sequence, substitution_matrix::SubstitutionMatrix};

/// Local alignment with full score matrices.
///
/// No cell drops below zero, so an alignment can start anywhere.
/// After filling a cell, neighbouring cells that can no longer be part of the best
/// alignment through it are set to negative infinity, which stops the traceback there.
#[derive(Debug, Clone)]
pub struct SmithWaterman {
    scoring: AlignmentScoring,
    matrix: Arc<SubstitutionMatrix>,
}

impl SmithWaterman {
    pub fn new(scoring: AlignmentScoring, matrix: Arc<SubstitutionMatrix>) -> Self {
        Self { scoring, matrix }
    }

    pub fn scoring(&self) -> &AlignmentScoring {
        &self.scoring
    }

    pub fn substitution_matrix(&self) -> &Arc<SubstitutionMatrix> {
        &self.matrix
    }

    /// Fills the score matrices for aligning `query` against `subject`.
    ///
    /// The start of the returned matrix is the first cell with the maximum score in row-major order.
    pub fn fill(&self, query: &Sequence, subject: &Sequence) -> Result<AlignmentMatrix> {
        check_alphabets(&self.matrix, query, subject)?;

        let affine = self.scoring.is_affine();
        debug!(
            "Aligning {} ({}) against {} ({}) locally with {} gap scores",
            query.name(),
            query.len(),
            subject.name(),
            subject.len(),
            if affine { "affine" } else { "linear" }
        );

        let mut matrix = AlignmentMatrix::new(query, subject, affine, 0.0, f64::NEG_INFINITY);
        let mut best = AlignmentMatrixIndex::new(0, 0);

        for query_index in 1..=query.len() {
            for subject_index in 1..=subject.len() {
                let index = AlignmentMatrixIndex::new(query_index, subject_index);
                let substitution = self.scoring.substitution_score(
                    &self.matrix,
                    query.symbol_at(query_index),
                    subject.symbol_at(subject_index),
                );
                let diagonal = matrix.scores[index.diagonal()] + substitution;

                let score = match (&mut matrix.insertions, &mut matrix.deletions) {
                    (Some(insertions), Some(deletions)) => {
                        let insertion = insertions[index.left()].max(
                            matrix.scores[index.left()] + self.scoring.insert_score,
                        ) + self.scoring.gap_extend_score;
                        let deletion = deletions[index.up()].max(
                            matrix.scores[index.up()] + self.scoring.delete_score,
                        ) + self.scoring.gap_extend_score;

                        insertions[index] = insertion;
                        deletions[index] = deletion;
                        insertion.max(deletion).max(diagonal)
                    }
                    _ => (matrix.scores[index.up()] + self.scoring.delete_score)
                        .max(matrix.scores[index.left()] + self.scoring.insert_score)
                        .max(diagonal),
                };

                matrix.scores[index] = score.max(0.0);
                invalidate_neighbours(&mut matrix, index);

                if matrix.scores[index] > matrix.scores[best] {
                    best = index;
                }
            }
        }

        trace!(
            "Best local alignment ends at ({}, {})",
            best.query_index, best.subject_index
        );
        matrix.start = best;
        Ok(matrix)
    }

    fn traceback(
        &self,
        matrix: &AlignmentMatrix,
        query: &Sequence,
        subject: &Sequence,
    ) -> Vec<AlignmentColumn> {
        let scores = &matrix.scores;
        let mut columns = Vec::new();
        let mut index = matrix.start;

        while index.query_index > 0
            && index.subject_index > 0
            && scores[index] != f64::NEG_INFINITY
        {
            if scores[index] == 0.0 {
                break;
            }

            let diagonal = scores[index.diagonal()];
            let up = scores[index.up()];
            let left = scores[index.left()];

            if left == up && diagonal == up && up == f64::NEG_INFINITY {
                // Every way back was invalidated, so this is the first column.
                columns.push((
                    Some(query.symbol_at(index.query_index)),
                    Some(subject.symbol_at(index.subject_index)),
                ));
                break;
            } else if left > diagonal.max(up) {
                columns.push((None, Some(subject.symbol_at(index.subject_index))));
                index = index.left();
            } else if up > diagonal.max(left) {
                columns.push((Some(query.symbol_at(index.query_index)), None));
                index = index.up();
            } else {
                columns.push((
                    Some(query.symbol_at(index.query_index)),
                    Some(subject.symbol_at(index.subject_index)),
                ));
                index = index.diagonal();
            }
        }

        columns
    }
}

/// Marks the neighbours of a freshly filled cell that are worse than both other neighbours.
fn invalidate_neighbours(matrix: &mut AlignmentMatrix, index: AlignmentMatrixIndex) {
    let scores = &mut matrix.scores;
    let up = index.up();
    let left = index.left();
    let diagonal = index.diagonal();

    if scores[up] < scores[left].min(scores[diagonal]) {
        scores[up] = f64::NEG_INFINITY;
    }
    if scores[left] < scores[up].min(scores[diagonal]) {
        scores[left] = f64::NEG_INFINITY;
    }
    if scores[diagonal] < scores[up].max(scores[left]) {
        scores[diagonal] = f64::NEG_INFINITY;
    }
}

impl SequenceAligner for SmithWaterman {
    fn align(&self, query: &Sequence, subject: &Sequence) -> Result<PairwiseAlignment> {
        let start = Instant::now();
        let matrix = self.fill(query, subject)?;
        let (columns, query_count, subject_count) =
            finish_traceback(self.traceback(&matrix, query, subject));
        let end = matrix.start;
        let score = matrix.scores[end];

        debug!(
            "Local alignment of {} against {} has {} columns and score {score}",
            query.name(),
            subject.name(),
            columns.len()
        );

        Ok(PairwiseAlignment::from_columns(
            query,
            subject,
            &columns,
            end.query_index - query_count..end.query_index,
            end.subject_index - subject_count..end.subject_index,
            score,
            start.elapsed(),
        ))
    }
}
