//! String mutation operators applied to header names and values
//!
//! Every operator is a pure `&str -> String` transform. Many operators are
//! no-ops on a given input (e.g. lower-casing an already lower-case name), so
//! callers always receive the deduplicated, sorted set of outputs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

/// Seed for the random-case operator
pub const RANDOM_CASE_SEED: u64 = 42;

/// Multi-byte sequences inserted in addition to every ASCII char
pub const EXTRA_INSERT_SEQS: [&str; 3] = ["  ", "\u{00A0}a", "\u{FF0C}"];

/// Characters replaced by the substitution operators
pub const CHARS_TO_REPLACE: [char; 8] = [';', ',', ':', '=', '\'', '"', '-', '_'];

/// Replacement strings for each of [`CHARS_TO_REPLACE`]
pub const REPLACEMENTS: [&str; 20] = [
    "", " ", ";", ",", ":", "=", "-", "_", "'", "\"", "`", "\u{00B4}", "\u{2018}", "\u{2019}",
    "\u{201A}", "\u{201B}", "\u{201C}", "\u{201D}", "\u{201E}", "\u{201F}",
];

/// Where an inserted sequence goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Lead,
    Middle,
    Trail,
}

/// A single string transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Upper,
    Lower,
    RandomCase,
    LeadTrailSpace,
    DoubleQuotes,
    SingleQuotes,
    RemoveWhitespace,
    DoubleSpaces,
    SpaceToTab,
    Insert { seq: String, at: Position },
    Replace { from: char, to: &'static str },
}

impl Mutation {
    /// Apply the transform
    pub fn apply(&self, input: &str) -> String {
        match self {
            Mutation::Upper => input.to_uppercase(),
            Mutation::Lower => input.to_lowercase(),
            Mutation::RandomCase => random_case(input, RANDOM_CASE_SEED),
            Mutation::LeadTrailSpace => format!(" {} ", input),
            Mutation::DoubleQuotes => format!("\"{}\"", input),
            Mutation::SingleQuotes => format!("'{}'", input),
            Mutation::RemoveWhitespace => input.replace(' ', ""),
            Mutation::DoubleSpaces => input.replace(' ', "  "),
            Mutation::SpaceToTab => input.replace(' ', "\t"),
            Mutation::Insert { seq, at } => match at {
                Position::Lead => format!("{}{}", seq, input),
                Position::Trail => format!("{}{}", input, seq),
                Position::Middle => insert_middle(input, seq),
            },
            Mutation::Replace { from, to } => input.replace(*from, to),
        }
    }
}

/// Randomize the casing of every char with a fixed seed
pub fn random_case(input: &str, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if rng.gen_bool(0.5) {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Insert `seq` at char index `len / 2`
fn insert_middle(input: &str, seq: &str) -> String {
    let middle = input.chars().count() / 2;
    let split = input
        .char_indices()
        .nth(middle)
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    format!("{}{}{}", &input[..split], seq, &input[split..])
}

/// The full operator list used for header names and values
pub fn general_mutations() -> Vec<Mutation> {
    let mut ops = vec![
        Mutation::Upper,
        Mutation::Lower,
        Mutation::RandomCase,
        Mutation::LeadTrailSpace,
        Mutation::DoubleQuotes,
        Mutation::SingleQuotes,
        Mutation::RemoveWhitespace,
        Mutation::DoubleSpaces,
        Mutation::SpaceToTab,
    ];

    let seqs: Vec<String> = (0u8..128)
        .map(|b| char::from(b).to_string())
        .chain(EXTRA_INSERT_SEQS.iter().map(|s| s.to_string()))
        .collect();

    for at in [Position::Lead, Position::Trail, Position::Middle] {
        for seq in &seqs {
            ops.push(Mutation::Insert {
                seq: seq.clone(),
                at,
            });
        }
    }

    for from in CHARS_TO_REPLACE {
        for to in REPLACEMENTS {
            if to.chars().eq(std::iter::once(from)) {
                continue;
            }
            ops.push(Mutation::Replace { from, to });
        }
    }

    ops
}

/// Small operator set used for multi-header name mutation
pub fn basic_mutations() -> Vec<Mutation> {
    vec![Mutation::Lower, Mutation::RandomCase, Mutation::LeadTrailSpace]
}

/// All distinct mutated forms of a header name
pub fn mutate_header_name(name: &str) -> BTreeSet<String> {
    mutate_header_value(name, &general_mutations())
}

/// All distinct outputs of `ops` applied to a header value
pub fn mutate_header_value(value: &str, ops: &[Mutation]) -> BTreeSet<String> {
    ops.iter().map(|op| op.apply(value)).collect()
}
