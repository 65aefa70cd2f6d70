//! Raw-text normalization and slot resolution.

use thiserror::Error;

use super::descriptor::StateDescriptor;

/// User text matched no interpretation in the current state's value table.
///
/// Carries the state's configured hint, which the dialog sends back verbatim
/// as the re-prompt. State and slots stay unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized input: {hint}")]
pub struct UnrecognizedInput {
    pub hint: String,
}

/// Project raw text onto the alphabet the interpretation tables use.
///
/// Lower-cases the input and drops every character that is not a lowercase
/// Cyrillic letter, an ASCII digit, or whitespace. Chat messages arrive full
/// of punctuation and Latin noise; interpretations are plain Cyrillic.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| ('а'..='я').contains(c) || c.is_ascii_digit() || c.is_whitespace())
        .collect()
}

/// Resolve raw user text to a canonical value via the state's value table.
///
/// The table is scanned in order; the first entry whose interpretations
/// contain the normalized text wins.
pub fn resolve(descriptor: &StateDescriptor, raw: &str) -> Result<String, UnrecognizedInput> {
    let text = normalize(raw);
    descriptor
        .values
        .iter()
        .find(|entry| entry.interpretations.iter().any(|i| *i == text))
        .map(|entry| entry.value.clone())
        .ok_or_else(|| UnrecognizedInput {
            hint: descriptor.hint.clone(),
        })
}
