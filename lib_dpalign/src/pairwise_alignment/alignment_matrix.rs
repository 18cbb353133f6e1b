use std::{
    fmt::Display,
    ops::{Index, IndexMut},
};

use ndarray::Array2;

use crate::sequence::Sequence;

/// A cell of an [`AlignmentMatrix`]: row `query_index` and column `subject_index`,
/// where index 0 stands for the empty prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentMatrixIndex {
    pub(in crate::pairwise_alignment) query_index: usize,
    pub(in crate::pairwise_alignment) subject_index: usize,
}

/// The filled matrices of a full-matrix aligner.
///
/// The primary matrix holds the best value of any alignment of the prefixes.
/// With affine gap scores, two more matrices hold the best values of alignments
/// ending in an insertion and a deletion respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentMatrix {
    pub(in crate::pairwise_alignment) scores: Array2<f64>,
    pub(in crate::pairwise_alignment) insertions: Option<Array2<f64>>,
    pub(in crate::pairwise_alignment) deletions: Option<Array2<f64>>,
    /// The cell where the traceback starts.
    pub(in crate::pairwise_alignment) start: AlignmentMatrixIndex,
    query_labels: Vec<char>,
    subject_labels: Vec<char>,
}

impl AlignmentMatrixIndex {
    pub fn new(query_index: usize, subject_index: usize) -> Self {
        Self {
            query_index,
            subject_index,
        }
    }

    /// The cell as `(query_index, subject_index)`.
    pub fn position(&self) -> (usize, usize) {
        (self.query_index, self.subject_index)
    }

    /// One query symbol less, reached by aligning a query symbol against a gap.
    pub(in crate::pairwise_alignment) fn up(self) -> Self {
        Self::new(self.query_index - 1, self.subject_index)
    }

    /// One subject symbol less, reached by aligning a gap against a subject symbol.
    pub(in crate::pairwise_alignment) fn left(self) -> Self {
        Self::new(self.query_index, self.subject_index - 1)
    }

    pub(in crate::pairwise_alignment) fn diagonal(self) -> Self {
        self.up().left()
    }
}

impl<T> Index<AlignmentMatrixIndex> for Array2<T> {
    type Output = <Array2<T> as Index<[usize; 2]>>::Output;

    fn index(&self, index: AlignmentMatrixIndex) -> &Self::Output {
        let (row, column) = index.position();
        &self[[row, column]]
    }
}

impl<T> IndexMut<AlignmentMatrixIndex> for Array2<T> {
    fn index_mut(&mut self, index: AlignmentMatrixIndex) -> &mut Self::Output {
        let (row, column) = index.position();
        &mut self[[row, column]]
    }
}

impl AlignmentMatrix {
    /// Creates matrices of dimension `(query.len() + 1) x (subject.len() + 1)`.
    ///
    /// The primary matrix is filled with `initial`, the gap matrices (if `affine`) with `gap_initial`.
    pub(in crate::pairwise_alignment) fn new(
        query: &Sequence,
        subject: &Sequence,
        affine: bool,
        initial: f64,
        gap_initial: f64,
    ) -> Self {
        let dimension = (query.len() + 1, subject.len() + 1);
        let gap_matrix = || affine.then(|| Array2::from_elem(dimension, gap_initial));

        Self {
            scores: Array2::from_elem(dimension, initial),
            insertions: gap_matrix(),
            deletions: gap_matrix(),
            start: AlignmentMatrixIndex::new(query.len(), subject.len()),
            query_labels: labels(query),
            subject_labels: labels(subject),
        }
    }

    /// Returns `(query.len() + 1, subject.len() + 1)`.
    pub fn dim(&self) -> (usize, usize) {
        self.scores.dim()
    }

    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    pub fn insertions(&self) -> Option<&Array2<f64>> {
        self.insertions.as_ref()
    }

    pub fn deletions(&self) -> Option<&Array2<f64>> {
        self.deletions.as_ref()
    }

    pub fn is_affine(&self) -> bool {
        self.insertions.is_some()
    }

    /// The cell where the traceback starts: the bottom-right cell for global alignments,
    /// and the best cell for local alignments.
    pub fn start(&self) -> AlignmentMatrixIndex {
        self.start
    }

    fn write_table(&self, f: &mut std::fmt::Formatter<'_>, table: &Array2<f64>) -> std::fmt::Result {
        let cells: Vec<String> = table.iter().map(|value| value.to_string()).collect();
        let width = cells.iter().map(String::len).max().unwrap_or(1);

        write!(f, "  {: >width$}", '-')?;
        for label in &self.subject_labels {
            write!(f, " {label: >width$}")?;
        }
        writeln!(f)?;

        for (row, chunk) in cells.chunks(self.dim().1).enumerate() {
            let label = if row == 0 {
                '-'
            } else {
                self.query_labels[row - 1]
            };
            write!(f, "{label}")?;
            for cell in chunk {
                write!(f, " {cell: >width$}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

fn labels(sequence: &Sequence) -> Vec<char> {
    sequence
        .symbols()
        .iter()
        .map(|&symbol| sequence.alphabet().token(symbol))
        .collect()
}

impl Display for AlignmentMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_table(f, &self.scores)?;

        if let Some(insertions) = &self.insertions {
            writeln!(f, "Insertions:")?;
            self.write_table(f, insertions)?;
        }
        if let Some(deletions) = &self.deletions {
            writeln!(f, "Deletions:")?;
            self.write_table(f, deletions)?;
        }

        Ok(())
    }
}
