use std::{
    fmt::Display,
    io::{Read, Write},
    sync::Arc,
};

use log::trace;
use ndarray::Array2;
use nom::{
    IResult, Parser,
    combinator::all_consuming,
    multi::many0,
    sequence::preceded,
};

use super::SubstitutionMatrix;
use crate::{
    error::{Error, MalformedMatrixKind, Result},
    io::{parse_token, parse_whitespace, translate_nom_error},
    symbol::{Alphabet, Symbol},
};


const DESCRIPTION_WIDTH: usize = 60;

impl SubstitutionMatrix {
    pub fn read_plain(
        alphabet: Arc<Alphabet>,
        name: impl Into<String>,
        mut reader: impl Read,
    ) -> Result<Self> {
        let mut input = String::new();
        reader.read_to_string(&mut input)?;
        Self::parse(alphabet, name, &input)
    }

    /// Parses a matrix in the plain text format.
    ///
    /// Lines starting with `#` form the description.
    /// The line starting with whitespace lists the column symbols.
    /// Every other non-blank line is a row symbol followed by one integer score per column.
    pub fn parse(alphabet: Arc<Alphabet>, name: impl Into<String>, input: &str) -> Result<Self> {
        let mut description = Vec::new();
        let mut columns: Option<Vec<Symbol>> = None;
        let mut rows = Vec::new();
        let mut scores = Vec::new();

        for (line_index, line) in input.lines().enumerate() {
            let line_number = line_index + 1;
            let malformed = |kind| Error::MalformedMatrix {
                line: line_number,
                kind,
            };

            if line.trim().is_empty() {
                continue;
            }

            if let Some(text) = line.strip_prefix('#') {
                trace!("Line {line_number} is a description line");
                if !text.trim().is_empty() {
                    description.push(text.trim());
                }
                continue;
            }

            let tokens = parse_tokens(line)?;

            if line.starts_with(char::is_whitespace) {
                trace!("Line {line_number} is the column header");
                if columns.is_some() {
                    return Err(malformed(MalformedMatrixKind::DuplicateHeader));
                }

                let mut header = Vec::with_capacity(tokens.len());
                for token in tokens {
                    let symbol = parse_symbol(&alphabet, token).map_err(malformed)?;
                    if header.contains(&symbol) {
                        return Err(malformed(MalformedMatrixKind::DuplicateSymbol(
                            token.to_string(),
                        )));
                    }
                    header.push(symbol);
                }
                columns = Some(header);
                continue;
            }

            trace!("Line {line_number} is a score row");
            let Some(columns) = &columns else {
                return Err(malformed(MalformedMatrixKind::MissingHeader));
            };

            let (row_token, score_tokens) = tokens
                .split_first()
                .ok_or_else(|| malformed(MalformedMatrixKind::Empty))?;
            let row = parse_symbol(&alphabet, row_token).map_err(malformed)?;
            if rows.contains(&row) {
                return Err(malformed(MalformedMatrixKind::DuplicateSymbol(
                    row_token.to_string(),
                )));
            }
            if score_tokens.len() != columns.len() {
                return Err(malformed(MalformedMatrixKind::RowLength {
                    expected: columns.len(),
                    actual: score_tokens.len(),
                }));
            }

            for token in score_tokens {
                scores.push(parse_score(token).map_err(malformed)?);
            }
            rows.push(row);
        }

        let Some(columns) = columns else {
            return Err(Error::MalformedMatrix {
                line: input.lines().count(),
                kind: MalformedMatrixKind::MissingHeader,
            });
        };
        if rows.is_empty() {
            return Err(Error::MalformedMatrix {
                line: input.lines().count(),
                kind: MalformedMatrixKind::Empty,
            });
        }

        let scores = Array2::from_shape_vec((rows.len(), columns.len()), scores)
            .map_err(|_| Error::MalformedMatrix {
                line: input.lines().count(),
                kind: MalformedMatrixKind::Empty,
            })?;

        Ok(Self::new(
            alphabet,
            name.into(),
            description.join(" "),
            rows,
            columns,
            scores,
        ))
    }

    pub fn write_plain(&self, mut writer: impl Write) -> Result<()> {
        write!(writer, "{self}")?;
        Ok(())
    }
}

impl Display for SubstitutionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in wrap_description(&self.description) {
            writeln!(f, "# {line}")?;
        }

        let column_width = self
            .scores
            .iter()
            .map(|score| score.to_string().len())
            .max()
            .unwrap_or(1);

        write!(f, " ")?;
        for &column in &self.columns {
            write!(f, " {: >column_width$}", self.alphabet.token(column))?;
        }
        writeln!(f)?;

        for (row_index, &row) in self.rows.iter().enumerate() {
            write!(f, "{}", self.alphabet.token(row))?;
            for column_index in 0..self.columns.len() {
                let score = self.scores[[row_index, column_index]];
                write!(f, " {score: >column_width$}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

fn parse_tokens(line: &str) -> Result<Vec<&str>> {
    all_consuming(parse_line_tokens)
        .parse(line)
        .map(|(_, tokens)| tokens)
        .map_err(translate_nom_error)
}

fn parse_line_tokens(input: &str) -> IResult<&str, Vec<&str>> {
    let (input, tokens) = many0(preceded(parse_whitespace, parse_token)).parse(input)?;
    let (input, ()) = parse_whitespace(input)?;
    Ok((input, tokens))
}

fn parse_symbol(
    alphabet: &Alphabet,
    token: &str,
) -> std::result::Result<Symbol, MalformedMatrixKind> {
    let mut characters = token.chars();
    match (characters.next(), characters.next()) {
        (Some(character), None) => alphabet
            .symbol(character)
            .map_err(|_| MalformedMatrixKind::UnknownSymbol(token.to_string())),
        _ => Err(MalformedMatrixKind::UnknownSymbol(token.to_string())),
    }
}

fn parse_score(token: &str) -> std::result::Result<i32, MalformedMatrixKind> {
    let result: IResult<&str, i32> = all_consuming(nom::character::complete::i32).parse(token);
    result
        .map(|(_, score)| score)
        .map_err(|_| MalformedMatrixKind::NonNumericScore(token.to_string()))
}

/// Breaks the description into lines of about [`DESCRIPTION_WIDTH`] characters at word boundaries.
fn wrap_description(description: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in description.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > DESCRIPTION_WIDTH {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
