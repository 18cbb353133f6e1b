use std::{fmt::Display, sync::Arc};

use crate::{
    error::Result,
    symbol::{Alphabet, Symbol},
};

/// A named sequence of symbols over a shared alphabet.
///
/// Positions are 1-indexed, matching the row and column indices of the DP matrices
/// where index 0 stands for the empty prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    alphabet: Arc<Alphabet>,
    name: String,
    symbols: Vec<Symbol>,
}

impl Sequence {
    pub fn new(alphabet: Arc<Alphabet>, name: impl Into<String>, symbols: Vec<Symbol>) -> Self {
        Self {
            alphabet,
            name: name.into(),
            symbols,
        }
    }

    /// Tokenizes `text` with the given alphabet.
    pub fn parse(alphabet: Arc<Alphabet>, name: impl Into<String>, text: &str) -> Result<Self> {
        let symbols = alphabet.parse(text)?;
        Ok(Self::new(alphabet, name, symbols))
    }

    pub fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Returns the symbol at the 1-based `position`, or `None` outside of `1..=len`.
    pub fn get(&self, position: usize) -> Option<Symbol> {
        position
            .checked_sub(1)
            .and_then(|index| self.symbols.get(index))
            .copied()
    }

    /// Returns the symbol at the 1-based `position`.
    ///
    /// Panics if the position is out of range.
    pub fn symbol_at(&self, position: usize) -> Symbol {
        assert!(
            (1..=self.len()).contains(&position),
            "position {position} is out of range for a sequence of length {}",
            self.len()
        );
        self.symbols[position - 1]
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &symbol in &self.symbols {
            write!(f, "{}", self.alphabet.token(symbol))?;
        }
        Ok(())
    }
}
