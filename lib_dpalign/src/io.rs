use nom::{
    IResult, Parser,
    bytes::complete::{take_till1, take_while},
};

use crate::error::Error;

/// Skips spaces and tabs, but not line breaks.
pub fn parse_whitespace(input: &str) -> IResult<&str, ()> {
    take_while(|c: char| c.is_whitespace() && !is_line_break(c))
        .map(|_| ())
        .parse(input)
}

/// Parses a token that ends at the next whitespace or line break.
pub fn parse_token(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

pub fn translate_nom_error(error: nom::Err<nom::error::Error<&str>>) -> Error {
    match error {
        nom::Err::Incomplete(needed) => Error::ParserIncomplete(needed),
        nom::Err::Error(error) | nom::Err::Failure(error) => Error::Parser {
            input: error.input.to_string(),
            kind: error.code,
        },
    }
}
