use std::rc::Rc;

use regex::Regex;

/// An immutable cursor into the program text: the original contents plus a
/// byte index. Matching a regex at the cursor never mutates it — it produces
/// a fresh `Source` advanced by the matched length.
///
/// `contents` is reference-counted so cursors are cheap to clone; the
/// combinator library clones them liberally (every `or`/`zero_or_more` branch
/// needs its own cursor to retry from).
#[derive(Debug, Clone)]
pub struct Source {
    contents: Rc<str>,
    pub index: usize,
}

impl Source {
    pub fn new(contents: impl Into<Rc<str>>) -> Self {
        Source {
            contents: contents.into(),
            index: 0,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.contents.len()
    }

    pub fn as_str(&self) -> &str {
        &self.contents[self.index..]
    }

    /// Sticky match: `regex` must succeed starting *exactly* at `self.index`,
    /// not by scanning forward. `regex::Regex` has no sticky flag, so we
    /// simulate it by anchoring with `\A` against the suffix slice — the
    /// "prefix the input slice" strategy this system's design notes call for.
    pub fn match_regex(&self, regex: &Regex) -> Option<(String, Source)> {
        let haystack = self.as_str();
        let m = regex.find(haystack)?;
        if m.start() != 0 {
            return None;
        }
        let matched = m.as_str().to_string();
        let next = Source {
            contents: Rc::clone(&self.contents),
            index: self.index + m.end(),
        };
        Some((matched, next))
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Rc::ptr_eq(&self.contents, &other.contents)
    }
}
