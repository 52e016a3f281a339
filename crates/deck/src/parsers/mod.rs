// All nom parsers split among files for organisation
mod cell;
mod data;
mod number;
mod surface;

// Internal re-exports for convenience
pub(crate) use cell::*;
pub(crate) use data::*;
pub(crate) use number::*;
pub(crate) use surface::*;

// external crates
use nom::error::{Error, ErrorKind};

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::diagnostic::Code;

/// A card, or part of a card, that could not be understood
///
/// Carries the diagnostic code to report. The reader attaches the span of the
/// card when turning it into a [Diagnostic](crate::Diagnostic).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParseFailure {
    pub code: Code,
    pub message: String,
}

impl ParseFailure {
    pub(crate) fn new<S: Into<String>>(code: Code, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Token that should have been a number
    pub(crate) fn number(token: &str) -> Self {
        Self::new(Code::ParseNumber, f!("invalid number '{token}'"))
    }

    /// Missing or unexpected tokens
    pub(crate) fn token_count<S: Into<String>>(message: S) -> Self {
        Self::new(Code::ParseTokenCount, message)
    }

    /// Prefix the message with the entity being parsed, e.g. `cell 10`
    pub(crate) fn context(self, context: &str) -> Self {
        Self {
            code: self.code,
            message: f!("{context}: {}", self.message),
        }
    }
}

/// Result of parsing a whole card
///
/// The outer error means nothing usable could be read. Otherwise the record
/// comes with any problems found in the parts that had to be skipped.
pub(crate) type Parsed<T> = std::result::Result<(T, Vec<ParseFailure>), ParseFailure>;

/// More convenient error creation for nom
pub(in crate::parsers) fn cause(s: &str) -> nom::Err<Error<&str>> {
    nom::Err::Error(Error::new(s, ErrorKind::Fail))
}

/// Pad the given delimiters with spaces so they split into separate tokens
///
/// ```text
/// "imp:n=1 fill=2(1)"  ->  "imp:n = 1 fill = 2 ( 1 )"
/// ```
pub(in crate::parsers) fn spaced(text: &str, delimiters: &[char]) -> String {
    let mut s = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if delimiters.contains(&c) {
            s.push(' ');
            s.push(c);
            s.push(' ');
        } else {
            s.push(c);
        }
    }
    s
}

/// Lower case whitespace separated tokens
pub(in crate::parsers) fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.to_ascii_lowercase())
        .collect()
}

/// Split a token list into `keyword values...` groups
///
/// A keyword starts with a letter, optionally after a `*` or `+`. Standalone
/// `=` tokens are dropped.
pub(in crate::parsers) fn keyword_groups(tokens: &[String]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for token in tokens {
        if token == "=" {
            continue;
        }
        match (is_keyword(token), groups.last_mut()) {
            (false, Some((_, values))) => values.push(token.clone()),
            _ => groups.push((token.clone(), Vec::new())),
        }
    }
    groups
}

/// True for tokens that start a keyword
pub(in crate::parsers) fn is_keyword(token: &str) -> bool {
    let token = token.trim_start_matches(&['*', '+'][..]);
    token.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}
