//! The lexical layer: tokens built directly on top of the combinator
//! primitives in [`crate::combinators`], each consuming trailing
//! insignificant whitespace/comments. There is no separate token-vector pass
//! — every combinator in the grammar module operates straight against the
//! [`crate::source::Source`] cursor, and "tokenizing" is just a convention
//! for how a leaf parser is built.

use crate::combinators::{constant, regexp, zero_or_more, Parser};

pub const ID_PATTERN: &str = r"[a-zA-Z_][a-zA-Z0-9_]*";
pub const NUMBER_PATTERN: &str = r"[0-9]+";

/// One or more of space, tab, CR, LF.
fn whitespace() -> Parser<String> {
    regexp(r"[ \t\r\n]+")
}

/// A line comment (`//` to end of line) or a block comment (`/* ... */`).
/// The block-comment pattern is compiled with the `s` flag so `.` also
/// matches newlines — block comments may span multiple lines.
fn comments() -> Parser<String> {
    let line = regexp(r"//[^\n]*");
    let block = regexp(r"(?s)/\*.*?\*/");
    line.or(block)
}

/// Zero or more of whitespace or comments, discarded.
fn ignored() -> Parser<()> {
    zero_or_more(whitespace().or(comments())).map(|_| ())
}

/// A token combinator: match `pattern`, then consume trailing `ignored`.
pub fn token(pattern: &str) -> Parser<String> {
    let matcher = regexp(pattern);
    let trailer = ignored();
    matcher.bind(move |matched| trailer.clone().and(constant(matched)))
}

/// A keyword token: like [`token`], but requires a word boundary right
/// after the keyword so `iffy` is not misread as `if` followed by `fy`.
pub fn keyword(word: &str) -> Parser<String> {
    token(&format!("{word}\\b"))
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, consuming trailing `ignored`.
pub fn identifier() -> Parser<String> {
    token(ID_PATTERN)
}

/// One or more decimal digits, consuming trailing `ignored`.
pub fn number() -> Parser<String> {
    token(NUMBER_PATTERN)
}

/// The leading `ignored` run at the very start of a program (there is no
/// preceding token to attach it to).
pub fn leading_ignored() -> Parser<()> {
    ignored()
}
