use std::{fmt::Display, sync::Arc};

use crate::{
    error::{Error, Result},
    sequence::Sequence,
    symbol::{Alphabet, Symbol},
};

/// A value consumed by an emission state in one DP step.
///
/// For models with one head, a residue is a symbol of the alphabet or the sentinel.
/// For models with two heads, it is an element of the cross-product alphabet, i.e. a pair
/// of symbols or gaps, or the composite sentinel.
/// The encoding is defined by [`AlignmentContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Residue(usize);

/// The sequence dimensions consumed when a state is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Advance {
    pub first: bool,
    pub second: bool,
}

/// The symbols shared by every engine call: the alphabet, the gap and the sentinel.
///
/// One context is created per alphabet and passed by reference into the DP engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentContext {
    alphabet: Arc<Alphabet>,
}

impl Residue {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl From<Symbol> for Residue {
    fn from(symbol: Symbol) -> Self {
        Self(symbol.index())
    }
}

impl Advance {
    pub const FIRST: Self = Self {
        first: true,
        second: false,
    };
    pub const SECOND: Self = Self {
        first: false,
        second: true,
    };
    pub const BOTH: Self = Self {
        first: true,
        second: true,
    };

    /// The advance of the sentinel state, which consumes every dimension.
    pub fn all(heads: usize) -> Self {
        if heads == 1 { Self::FIRST } else { Self::BOTH }
    }

    /// Returns true if a state of a model with `heads` heads may have this advance.
    /// States that advance in no dimension are never valid.
    pub fn fits(self, heads: usize) -> bool {
        match heads {
            1 => self == Self::FIRST,
            2 => self.first || self.second,
            _ => false,
        }
    }
}

impl Display for Advance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", u8::from(self.first), u8::from(self.second))
    }
}

impl AlignmentContext {
    pub fn new(alphabet: Arc<Alphabet>) -> Self {
        Self { alphabet }
    }

    pub fn alphabet(&self) -> &Arc<Alphabet> {
        &self.alphabet
    }

    /// The residue of a gap in one dimension of a pair.
    pub fn gap(&self) -> Residue {
        Residue(self.alphabet.len())
    }

    /// The residue found before the first and after the last position of a sequence.
    pub fn sentinel(&self) -> Residue {
        Residue(self.alphabet.len() + 1)
    }

    /// The composite sentinel of the cross-product alphabet.
    pub fn pair_sentinel(&self) -> Residue {
        Residue(self.pair_width() * self.pair_width())
    }

    /// The number of residues an emission state of a model with `heads` heads can emit.
    /// Emission weight tables are indexed by [`Residue::index`] and have this length.
    pub fn residue_count(&self, heads: usize) -> usize {
        if heads == 1 {
            self.alphabet.len()
        } else {
            self.pair_width() * self.pair_width()
        }
    }

    /// Returns the residue at the 1-based `position` of `sequence`.
    /// Position 0 and positions beyond the end yield the sentinel.
    pub fn residue(&self, sequence: &Sequence, position: usize) -> Residue {
        sequence
            .get(position)
            .map(Residue::from)
            .unwrap_or_else(|| self.sentinel())
    }

    /// Combines the residues of two dimensions into a residue of the cross-product alphabet.
    ///
    /// Returns `None` if exactly one of them is the sentinel, as no state can emit such a pair.
    pub fn pair(&self, first: Residue, second: Residue) -> Option<Residue> {
        let sentinel = self.sentinel();
        match (first == sentinel, second == sentinel) {
            (true, true) => Some(self.pair_sentinel()),
            (false, false) => Some(Residue(first.0 * self.pair_width() + second.0)),
            _ => None,
        }
    }

    /// Builds a cross-product residue from two symbols, where `None` stands for a gap.
    pub fn pair_symbols(&self, first: Option<Symbol>, second: Option<Symbol>) -> Residue {
        let first = first.map(Residue::from).unwrap_or_else(|| self.gap());
        let second = second.map(Residue::from).unwrap_or_else(|| self.gap());
        Residue(first.0 * self.pair_width() + second.0)
    }

    /// Splits a cross-product residue into its symbols, where `None` stands for a gap.
    pub fn split_pair(&self, residue: Residue) -> (Option<Symbol>, Option<Symbol>) {
        let width = self.pair_width();
        (
            self.residue_symbol(Residue(residue.0 / width)),
            self.residue_symbol(Residue(residue.0 % width)),
        )
    }

    /// Returns the symbol of a single-dimension residue, or `None` for the gap and the sentinel.
    pub fn residue_symbol(&self, residue: Residue) -> Option<Symbol> {
        (residue.0 < self.alphabet.len()).then(|| Symbol::from_index(residue.0))
    }

    /// Fails with [`Error::AlphabetMismatch`] unless all sequences use the alphabet of this context.
    pub fn check_alphabets(&self, query: &Sequence, subject: &Sequence) -> Result<()> {
        if query.alphabet().as_ref() == self.alphabet.as_ref()
            && subject.alphabet().as_ref() == self.alphabet.as_ref()
        {
            Ok(())
        } else {
            Err(Error::AlphabetMismatch {
                query: query.alphabet().name().to_string(),
                subject: subject.alphabet().name().to_string(),
                matrix: self.alphabet.name().to_string(),
            })
        }
    }

    /// Symbols and the gap.
    fn pair_width(&self) -> usize {
        self.alphabet.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{sequence::Sequence, symbol::Alphabet};

    use super::{Advance, AlignmentContext};

    #[test]
    fn residues_of_a_sequence() {
        let alphabet = Arc::new(Alphabet::dna());
        let context = AlignmentContext::new(alphabet.clone());
        let sequence = Sequence::parse(alphabet.clone(), "s", "AC").unwrap();

        assert_eq!(context.residue(&sequence, 0), context.sentinel());
        assert_eq!(
            context.residue(&sequence, 2),
            alphabet.symbol('C').unwrap().into()
        );
        assert_eq!(context.residue(&sequence, 3), context.sentinel());
    }

    #[test]
    fn cross_product() {
        let alphabet = Arc::new(Alphabet::dna());
        let context = AlignmentContext::new(alphabet.clone());
        let a = alphabet.symbol('A').unwrap();
        let g = alphabet.symbol('G').unwrap();

        let pair = context.pair(a.into(), context.gap()).unwrap();
        assert_eq!(pair, context.pair_symbols(Some(a), None));
        assert_eq!(context.split_pair(pair), (Some(a), None));
        assert_eq!(
            context.split_pair(context.pair_symbols(Some(g), Some(a))),
            (Some(g), Some(a))
        );

        assert_eq!(
            context.pair(context.sentinel(), context.sentinel()),
            Some(context.pair_sentinel())
        );
        assert_eq!(context.pair(context.sentinel(), a.into()), None);
        assert_eq!(context.pair(context.gap(), context.sentinel()), None);
        assert!(context.pair_sentinel().index() >= context.residue_count(2));
        assert!(context.sentinel().index() >= context.residue_count(1));
    }

    #[test]
    fn advances() {
        assert!(Advance::FIRST.fits(1));
        assert!(!Advance::BOTH.fits(1));
        assert!(Advance::SECOND.fits(2));
        assert!(
            !Advance {
                first: false,
                second: false
            }
            .fits(2)
        );
        assert_eq!(Advance::all(2).to_string(), "(1, 1)");
    }
}
