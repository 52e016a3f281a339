//! Static analysis of MCNP input decks
//!
//! An MCNP input deck is free-form text describing a geometry of cells bounded
//! by surfaces, the materials that fill them, and everything else needed for a
//! transport run. This crate reads a deck without running it, resolves every
//! cross reference, and checks the constructs that are easy to get wrong by
//! hand, lattice fills and universe nesting especially.
//!
//! - [Deck] - Typed model of the deck
//! - [analyze] - Full analysis producing an [AnalysisResult]
//!
//! Every problem found is a [Diagnostic] with a contractual [Code], a
//! [Severity], and the [Span] of lines it came from.
//!
//! | Severity | Meaning                                         |
//! | -------- | ----------------------------------------------- |
//! | fatal    | the deck could not be split into its blocks     |
//! | error    | the deck is invalid, e.g. an undefined surface  |
//! | warning  | suspicious but valid, e.g. an unused material   |
//! | info     | summary information such as the nesting depth   |
//!
//! # Quickstart example
//!
//! ```rust
//! # use mcnptools_deck::{analyze, Code};
//! let deck = "\
//! simple
//! 1 0 -2 imp:n=1
//! 2 0  1 imp:n=0
//!
//! 1 so 1.0
//!
//! mode n
//! nps 1000
//! ";
//!
//! let result = analyze(deck);
//! assert_eq!(result.exit_code(), 1);
//!
//! let error = result.errors().next().unwrap();
//! assert_eq!(error.code, Code::UndefinedSurface);
//! assert_eq!(error.value("surface"), Some(2));
//! ```
//!
//! Cells, surfaces and data cards are kept in source order in the [Deck], and
//! the [CrossRefs] and [UniverseReport] give the resolved tables and universe
//! hierarchy.

mod analysis;
mod core;
mod deck;
mod diagnostic;
mod error;
mod parsers;
mod reader;

pub mod lexer;

// standard library
use std::path::Path;

// flatten public API and inline the documentation
#[doc(inline)]
pub use analysis::{AnalysisResult, Analyzer, CrossRefs, UniverseReport};

#[doc(inline)]
pub use deck::Deck;

#[doc(inline)]
pub use diagnostic::{Code, Diagnostic, Severity, Span};

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use crate::core::*;

/// Analyse deck text with the default settings
pub fn analyze(text: &str) -> AnalysisResult {
    Analyzer::new().analyze(text)
}

/// Analyse a deck file with the default settings
///
/// ```rust, no_run
/// # use mcnptools_deck::analyze_file;
/// let result = analyze_file("path/to/input.i");
/// println!("{}", result.render_text());
/// ```
pub fn analyze_file<P: AsRef<Path>>(path: P) -> AnalysisResult {
    Analyzer::new().analyze_file(path)
}
