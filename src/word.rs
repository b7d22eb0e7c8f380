//! Word resolution: fragments to one concatenated string.

use crate::command::{Word, WordPart};
use crate::env;

/// Resolve a word into a single string.
///
/// Fragments are walked in order: literals are appended verbatim, variable
/// references are replaced by the variable's value, or by nothing when the
/// variable is unset. Resolution never fails and has no side effects; an
/// all-unset word resolves to the empty string.
pub fn resolve(word: &Word) -> String {
    resolve_parts(&word.parts)
}

/// Resolve a sub-slice of fragments. Used directly by assignment handling,
/// which skips the `NAME` and `=` fragments of the verb.
pub(crate) fn resolve_parts(parts: &[WordPart]) -> String {
    let mut out = String::new();
    for part in parts {
        match part {
            WordPart::Literal(text) => out.push_str(text),
            WordPart::Variable(name) => {
                if let Some(value) = env::lookup(name) {
                    out.push_str(&value);
                }
            }
        }
    }
    out
}
