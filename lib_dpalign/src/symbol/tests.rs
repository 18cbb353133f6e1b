use crate::error::Error;

use super::Alphabet;

#[test]
fn dna_tokens() {
    let dna = Alphabet::dna();
    assert_eq!(dna.len(), 15);

    let symbols = dna.parse("acgT n").unwrap();
    let tokens: String = symbols.iter().map(|&symbol| dna.token(symbol)).collect();
    assert_eq!(tokens, "ACGTN");

    assert!(matches!(
        dna.symbol('U'),
        Err(Error::IllegalSymbol { token: 'U', .. })
    ));
}

#[test]
fn ambiguity_sets() {
    let dna = Alphabet::dna();
    let a = dna.symbol('A').unwrap();
    let c = dna.symbol('C').unwrap();
    let r = dna.symbol('R').unwrap();
    let y = dna.symbol('Y').unwrap();
    let n = dna.symbol('N').unwrap();

    assert!(dna.matches(a, a));
    assert!(!dna.matches(a, c));
    assert!(dna.matches(a, r));
    assert!(!dna.matches(r, y));
    assert!(dna.matches(n, y));
    assert!(!dna.is_ambiguous(a));
    assert!(dna.is_ambiguous(n));
}

#[test]
fn protein_tokens() {
    let protein = Alphabet::protein();
    assert_eq!(protein.len(), 24);

    let w = protein.symbol('w').unwrap();
    let x = protein.symbol('X').unwrap();
    let stop = protein.symbol('*').unwrap();
    assert!(protein.matches(w, x));
    assert!(!protein.matches(stop, x));
}

#[test]
fn custom_alphabets_are_distinct() {
    let binary = Alphabet::new("BINARY", &['0', '1']);
    assert_eq!(binary.symbols().count(), 2);
    assert_ne!(binary, Alphabet::dna());
    assert_eq!(binary.to_string(), "BINARY");
}
