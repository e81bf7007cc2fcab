//! PEG-style parser combinators.
//!
//! A [`Parser<T>`] wraps a pure function from a [`Source`] cursor to an
//! optional `(T, Source)` pair. `None` is a *miss* — ordinary backtracking
//! information, not an error. Only [`error`] raises, and only when invoked;
//! every other combinator either advances the cursor or misses. The driver
//! ([`parse_string_to_completion`]) is the single place a trailing miss is
//! promoted into a fatal [`ParseError`].
//!
//! Parsers are `Rc<dyn Fn(..)>`, so cloning a `Parser` is cheap — `or` and
//! `zero_or_more` clone their operands on every attempt.

use std::cell::RefCell;
use std::rc::Rc;

use regex::Regex;

use crate::error::ParseError;
use crate::source::Source;

pub type ParseResult<T> = (T, Source);

/// A parser of values of type `T`.
#[derive(Clone)]
pub struct Parser<T> {
    run: Rc<dyn Fn(&Source) -> Option<ParseResult<T>>>,
}

impl<T: 'static> Parser<T> {
    pub fn new(run: impl Fn(&Source) -> Option<ParseResult<T>> + 'static) -> Self {
        Parser { run: Rc::new(run) }
    }

    pub fn parse(&self, source: &Source) -> Option<ParseResult<T>> {
        (self.run)(source)
    }

    /// `bind` — apply `self`; on success, hand the value to `f`, which
    /// produces the next parser to run against the resulting cursor.
    pub fn bind<U: 'static>(&self, f: impl Fn(T) -> Parser<U> + 'static) -> Parser<U> {
        let this = self.clone();
        Parser::new(move |source| {
            let (value, rest) = this.parse(source)?;
            f(value).parse(&rest)
        })
    }

    /// `and` — sequence two parsers, keeping the second's value.
    pub fn and<U: 'static>(&self, next: Parser<U>) -> Parser<U> {
        self.bind(move |_| next.clone())
    }

    /// `map` — rewrite the value of a successful parse.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Parser<U> {
        let this = self.clone();
        Parser::new(move |source| {
            let (value, rest) = this.parse(source)?;
            Some((f(value), rest))
        })
    }

    /// `or` — ordered choice: try `self`; on miss, try `other`. Neither
    /// branch has side effects on miss, so no explicit backtracking state is
    /// needed beyond discarding the failed cursor.
    pub fn or(&self, other: Parser<T>) -> Parser<T> {
        let this = self.clone();
        Parser::new(move |source| this.parse(source).or_else(|| other.parse(source)))
    }

    /// `maybe` — try `self`; on miss, succeed with `None` without advancing.
    pub fn maybe(&self) -> Parser<Option<T>> {
        let this = self.clone();
        Parser::new(move |source| match this.parse(source) {
            Some((value, rest)) => Some((Some(value), rest)),
            None => Some((None, source.clone())),
        })
    }
}

/// `regexp(pattern)` — succeeds with the matched text iff the sticky regex
/// matches at the cursor.
pub fn regexp(pattern: &str) -> Parser<String> {
    let regex = compile_sticky(pattern);
    Parser::new(move |source| source.match_regex(&regex))
}

fn compile_sticky(pattern: &str) -> Regex {
    Regex::new(&format!(r"\A(?:{})", pattern))
        .unwrap_or_else(|e| panic!("invalid regex pattern {pattern:?}: {e}"))
}

/// `constant(v)` — always succeeds with a clone of `v`, without advancing.
pub fn constant<T: Clone + 'static>(value: T) -> Parser<T> {
    Parser::new(move |source| Some((value.clone(), source.clone())))
}

/// `error(msg)` — a parser that, when invoked, raises a fatal parse error.
/// Used only to seed forward-reference placeholders (see [`Forward`]); a
/// correctly wired grammar never actually calls one.
pub fn error<T: 'static>(msg: &'static str) -> Parser<T> {
    Parser::new(move |_source| panic!("{msg}"))
}

/// `fail()` — always misses, without advancing. The dual of [`constant`]:
/// where `constant` always succeeds, `fail` always backtracks. Lets a
/// `bind` reject a value its input lexically matched but can't represent
/// (e.g. a numeric literal that overflows `u64`), routing control back to
/// ordered choice instead of panicking.
pub fn fail<T: 'static>() -> Parser<T> {
    Parser::new(|_source| None)
}

/// `zero_or_more(p)` — repeatedly apply `p`, collecting values, until it
/// misses. Always succeeds, possibly with an empty `Vec`.
pub fn zero_or_more<T: 'static>(p: Parser<T>) -> Parser<Vec<T>> {
    Parser::new(move |source| {
        let mut results = Vec::new();
        let mut cursor = source.clone();
        while let Some((value, rest)) = p.parse(&cursor) {
            results.push(value);
            cursor = rest;
        }
        Some((results, cursor))
    })
}

/// Late-bound placeholder for a mutually recursive parser. Construct with
/// [`Forward::new`], hand out [`Forward::parser`] to build the grammar, then
/// [`Forward::define`] once the real parser is known. Equivalent to the
/// "build a placeholder via `error`, patch its parse function later" scheme,
/// phrased as a deferred-resolution cell rather than method reassignment.
pub struct Forward<T> {
    slot: Rc<RefCell<Parser<T>>>,
}

impl<T: 'static> Forward<T> {
    pub fn new(unresolved_message: &'static str) -> Self {
        Forward {
            slot: Rc::new(RefCell::new(error(unresolved_message))),
        }
    }

    /// A parser that forwards every call through the current contents of the
    /// slot. Safe to embed in other parsers before `define` is called, as
    /// long as it is not actually *invoked* until after `define`.
    pub fn parser(&self) -> Parser<T> {
        let slot = Rc::clone(&self.slot);
        Parser::new(move |source| slot.borrow().parse(source))
    }

    pub fn define(&self, real: Parser<T>) {
        *self.slot.borrow_mut() = real;
    }
}

/// `parseStringToCompletion` — the driver. Parses `source` from index 0;
/// fails fatally if `p` misses at index 0, or if `p` succeeds but the
/// resulting cursor is not at end-of-input.
pub fn parse_string_to_completion<T>(p: &Parser<T>, source: &str) -> Result<T, ParseError> {
    let start = Source::new(source);
    match p.parse(&start) {
        Some((value, rest)) if rest.is_at_end() => Ok(value),
        Some((_, rest)) => Err(ParseError::AtIndex { index: rest.index }),
        None => Err(ParseError::AtIndex { index: 0 }),
    }
}
