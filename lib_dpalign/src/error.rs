use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("An IO error occurred: {0}.")]
    Io(#[from] std::io::Error),

    #[error("A parsing error of kind '{kind:?}' occurred when the remaining input was '{input}'.")]
    Parser {
        input: String,
        kind: nom::error::ErrorKind,
    },

    #[error("Parsing was unsuccessful due to incomplete input: {0:?}.")]
    ParserIncomplete(nom::Needed),

    #[error("The substitution matrix is malformed in line {line}: {kind}.")]
    MalformedMatrix {
        line: usize,
        kind: MalformedMatrixKind,
    },

    #[error("The substitution matrix has no entry for the symbols '{row}' and '{column}'.")]
    NoSubstitutionEntry { row: char, column: char },

    #[error(
        "Alphabet mismatch: query uses '{query}', subject uses '{subject}' and the substitution matrix or model uses '{matrix}'. Sequences with different alphabets cannot be aligned."
    )]
    AlphabetMismatch {
        query: String,
        subject: String,
        matrix: String,
    },

    #[error("The token '{token}' is not part of the alphabet '{alphabet}'.")]
    IllegalSymbol { token: char, alphabet: String },

    #[error("There is no transition from state '{from}' to state '{to}'.")]
    IllegalTransition { from: String, to: String },

    #[error(
        "Could not find a transition from state '{state}' for the sampled value p={sampled}. Do the probabilities sum to 1?\n{transitions}"
    )]
    SamplingExhausted {
        state: String,
        sampled: f64,
        transitions: String,
    },

    #[error("The state '{0}' is not known to the model.")]
    UnknownState(String),

    #[error("The state name '{0}' was encountered twice.")]
    DuplicateState(String),

    #[error("Expected a model with {expected} head(s), but it has {actual}.")]
    HeadCountMismatch { expected: usize, actual: usize },

    #[error("The state '{state}' has the advance vector {advance}, which does not fit its model.")]
    IllegalAdvance { state: String, advance: String },

    #[error("No path with a finite score leads to the terminal state.")]
    NoPath,

    #[error("The weight matrix has {columns} columns, but the sequence has only {length} symbols.")]
    SequenceTooShort { length: usize, columns: usize },
}

/// The reason why a substitution matrix could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedMatrixKind {
    #[error("a score row appeared before the column header")]
    MissingHeader,

    #[error("the column header is given twice")]
    DuplicateHeader,

    #[error("the input contains no score rows")]
    Empty,

    #[error("'{0}' is not an integer score")]
    NonNumericScore(String),

    #[error("'{0}' is not a symbol of the alphabet")]
    UnknownSymbol(String),

    #[error("the symbol '{0}' is listed twice")]
    DuplicateSymbol(String),

    #[error("expected {expected} scores, but found {actual}")]
    RowLength { expected: usize, actual: usize },
}
