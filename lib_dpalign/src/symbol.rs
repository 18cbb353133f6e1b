use std::fmt::Display;

use crate::error::{Error, Result};

#[cfg(test)]
mod tests;

/// An element of an [`Alphabet`], identified by its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u16);

/// A finite set of symbols with a one-character token each.
///
/// Every symbol stands for a set of atomic symbols (its ambiguity set).
/// Atomic symbols stand only for themselves, while e.g. the nucleotide code `N`
/// stands for all four bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    name: String,
    tokens: Vec<char>,
    ambiguity: Vec<u64>,
}

impl Symbol {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u16)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl Alphabet {
    /// Creates an alphabet of atomic symbols only.
    pub fn new(name: impl Into<String>, atomic: &[char]) -> Self {
        Self::with_ambiguity(name, atomic, &[])
    }

    /// Creates an alphabet from atomic symbols and ambiguity codes.
    ///
    /// Each ambiguity code is given with the tokens of the atomic symbols it stands for.
    /// At most 64 atomic symbols are supported.
    pub fn with_ambiguity(
        name: impl Into<String>,
        atomic: &[char],
        ambiguous: &[(char, &str)],
    ) -> Self {
        assert!(atomic.len() <= 64, "at most 64 atomic symbols are supported");

        let mut tokens: Vec<char> = atomic.to_vec();
        let mut ambiguity: Vec<u64> = (0..atomic.len()).map(|index| 1 << index).collect();

        for (token, members) in ambiguous {
            let set = members
                .chars()
                .filter_map(|member| atomic.iter().position(|&atomic| atomic == member))
                .fold(0, |set, index| set | (1 << index));
            tokens.push(*token);
            ambiguity.push(set);
        }

        Self {
            name: name.into(),
            tokens,
            ambiguity,
        }
    }

    /// The nucleotides `ACGT` with the IUPAC ambiguity codes.
    pub fn dna() -> Self {
        Self::with_ambiguity(
            "DNA",
            &['A', 'C', 'G', 'T'],
            &[
                ('R', "AG"),
                ('Y', "CT"),
                ('K', "GT"),
                ('M', "AC"),
                ('S', "CG"),
                ('W', "AT"),
                ('B', "CGT"),
                ('D', "AGT"),
                ('H', "ACT"),
                ('V', "ACG"),
                ('N', "ACGT"),
            ],
        )
    }

    /// The 20 standard amino acids, the stop symbol `*` and the ambiguity codes `B`, `Z` and `X`.
    pub fn protein() -> Self {
        const AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";
        let mut atomic: Vec<char> = AMINO_ACIDS.chars().collect();
        atomic.push('*');

        Self::with_ambiguity(
            "PROTEIN",
            &atomic,
            &[('B', "DN"), ('Z', "EQ"), ('X', AMINO_ACIDS)],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + use<> {
        (0..self.tokens.len()).map(Symbol::from_index)
    }

    pub fn token(&self, symbol: Symbol) -> char {
        self.tokens[symbol.index()]
    }

    /// Looks up the symbol of a token, ignoring case if there is no exact match.
    pub fn symbol(&self, token: char) -> Result<Symbol> {
        self.tokens
            .iter()
            .position(|&known| known == token)
            .or_else(|| {
                self.tokens
                    .iter()
                    .position(|known| known.eq_ignore_ascii_case(&token))
            })
            .map(Symbol::from_index)
            .ok_or_else(|| Error::IllegalSymbol {
                token,
                alphabet: self.name.clone(),
            })
    }

    /// Tokenizes a string, skipping whitespace.
    pub fn parse(&self, text: &str) -> Result<Vec<Symbol>> {
        text.chars()
            .filter(|character| !character.is_whitespace())
            .map(|token| self.symbol(token))
            .collect()
    }

    pub fn is_ambiguous(&self, symbol: Symbol) -> bool {
        self.ambiguity[symbol.index()].count_ones() > 1
    }

    /// Returns true if the ambiguity sets of the two symbols overlap.
    pub fn matches(&self, a: Symbol, b: Symbol) -> bool {
        self.ambiguity[a.index()] & self.ambiguity[b.index()] != 0
    }
}

impl Display for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
