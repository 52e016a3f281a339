//! Whole-deck analysis
//!
//! The [Analyzer] runs every stage over a deck and collects the diagnostics
//! into a single [AnalysisResult].
//!
//! | Stage     | Finds                                                   |
//! | --------- | ------------------------------------------------------- |
//! | lexer     | missing title, bad block separators, empty blocks       |
//! | reader    | malformed cards, duplicate numbers, LIKE BUT problems   |
//! | resolver  | undefined and unused cells, surfaces, materials, ...    |
//! | geometry  | lattice surfaces, fill array sizes, volumes, transforms |
//! | universe  | cycles, unreachable universes, deep nesting             |
//!
//! Structural problems found by the lexer stop the analysis. Everything else
//! is accumulated.
mod geometry;
mod resolver;
mod universe;

#[doc(inline)]
pub use resolver::CrossRefs;
#[doc(inline)]
pub use universe::UniverseReport;

// standard library
use std::path::Path;

// external crates
use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::diagnostic::{Code, Diagnostic, Severity};
use crate::error::{Error, Result};
use crate::lexer;
use crate::reader::Reader;
use crate::Deck;

/// Configurable deck analysis
///
/// The defaults suit most decks, so [analyze](crate::analyze) is usually all
/// that is needed.
///
/// ```rust
/// # use mcnptools_deck::Analyzer;
/// let mut analyzer = Analyzer::new();
/// analyzer.set_max_nesting(2);
/// analyzer.suppress_warnings();
///
/// let result = analyzer.analyze("title\n1 0 -1\n2 0 1\n\n1 so 1\n\nnps 1\n");
/// assert!(!result.has_errors());
/// assert!(result.diagnostics.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Analyzer {
    /// Nesting depth above which `DEEP_NESTING` is reported
    max_nesting: usize,
    /// Tolerance for rotation matrix checks
    tolerance: f64,
    /// Drop warnings and informational diagnostics from the result
    quiet: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            max_nesting: 10,
            tolerance: 1e-6,
            quiet: false,
        }
    }
}

// ! ------------------------------------------------------------------------
// !                                Public API
// ! ------------------------------------------------------------------------

impl Analyzer {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Setter for the advisory universe nesting threshold
    pub fn set_max_nesting(&mut self, max_nesting: usize) {
        self.max_nesting = max_nesting;
    }

    /// Setter for the rotation matrix tolerance
    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    /// Only keep fatal and error diagnostics
    pub fn suppress_warnings(&mut self) {
        self.quiet = true;
    }

    /// Analyse deck text
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let segmentation = match lexer::segment(text) {
            Ok(segmentation) => segmentation,
            Err(e) => return AnalysisResult::fatal(e),
        };

        let (deck, mut diagnostics) = Reader::new().read(segmentation);
        debug!("{} diagnostics from reading", diagnostics.len());

        let (cross_refs, found) = resolver::resolve(&deck);
        diagnostics.extend(found);

        diagnostics.extend(geometry::validate(&deck, self.tolerance));

        let (universe_report, found) = universe::analyze(&deck, self.max_nesting);
        diagnostics.extend(found);

        diagnostics.extend(summary(&cross_refs, &universe_report));

        // stable, so each severity keeps its phase order
        diagnostics.sort_by_key(|d| d.severity);
        if self.quiet {
            diagnostics.retain(Diagnostic::is_error);
        }

        AnalysisResult {
            deck: Some(deck),
            diagnostics,
            universe_report: Some(universe_report),
            cross_refs: Some(cross_refs),
        }
    }

    /// Analyse a deck file
    ///
    /// A file that cannot be read gives a single fatal `IO_ERROR`.
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> AnalysisResult {
        info!("Analysing {}", path.as_ref().display());
        match std::fs::read_to_string(path) {
            Ok(text) => self.analyze(&text),
            Err(e) => AnalysisResult::fatal(e.into()),
        }
    }
}

/// Informational summary of the deck
fn summary(refs: &CrossRefs, report: &UniverseReport) -> [Diagnostic; 2] {
    let depth = Diagnostic::new(
        Code::MaxDepth,
        None,
        f!("maximum universe nesting depth is {}", report.max_depth),
    )
    .with("max_depth", report.max_depth as i64);

    let counts = [
        ("cells", refs.cells.len()),
        ("surfaces", refs.surfaces.len()),
        ("materials", refs.materials.len()),
        ("transforms", refs.transforms.len()),
        ("tallies", refs.tallies.len()),
        ("universes", report.universes.len()),
    ];
    let message = counts.iter().map(|(name, n)| f!("{n} {name}")).join(", ");
    let counts = counts
        .into_iter()
        .fold(Diagnostic::new(Code::EntityCounts, None, message), |d, (name, n)| {
            d.with(name, n as i64)
        });

    [depth, counts]
}

/// Everything found by an analysis
///
/// The model and reports are only missing when the deck could not be split
/// into blocks, in which case `diagnostics` holds the single fatal problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Typed deck model
    pub deck: Option<Deck>,
    /// Diagnostics ordered by severity, then by the order they were found
    pub diagnostics: Vec<Diagnostic>,
    /// Universe hierarchy
    pub universe_report: Option<UniverseReport>,
    /// Cross reference tables
    pub cross_refs: Option<CrossRefs>,
}

impl AnalysisResult {
    fn fatal(error: Error) -> Self {
        Self {
            deck: None,
            diagnostics: vec![error.into_diagnostic()],
            universe_report: None,
            cross_refs: None,
        }
    }

    /// True if anything fatal or an error was found
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// True if the deck could not be read at all
    pub fn is_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Fatal)
    }

    /// 0 if there are no errors, 1 otherwise
    ///
    /// Warnings never change the exit code.
    pub fn exit_code(&self) -> i32 {
        match self.has_errors() {
            true => 1,
            false => 0,
        }
    }

    /// Fatal and error diagnostics
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Warning diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Diagnostics with the given code
    pub fn with_code(&self, code: Code) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    /// Plain text report, one diagnostic per line and a closing tally
    ///
    /// ```text
    /// simple
    /// error[UNDEFINED_SURFACE] line 2: cell 1: surface 2 is not defined
    /// info[MAX_DEPTH]: maximum universe nesting depth is 0
    /// 1 error, 0 warnings
    /// ```
    pub fn render_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.diagnostics.len() + 2);
        if let Some(deck) = &self.deck {
            lines.push(deck.title.clone());
        }
        lines.extend(self.diagnostics.iter().map(|d| d.to_string()));

        let errors = self.errors().count();
        let warnings = self.warnings().count();
        lines.push(f!(
            "{errors} {}, {warnings} {}",
            plural("error", errors),
            plural("warning", warnings)
        ));

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Pretty JSON report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn plural(word: &str, n: usize) -> String {
    match n {
        1 => word.to_string(),
        _ => f!("{word}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "simple\n1 0 -1 imp:n=1\n2 0  1 imp:n=0\n\n1 so 1.0\n\nmode n\nnps 1000\n";

    #[test]
    fn severity_order_is_stable() {
        let text = "order\n1 0 -1 vol=-1\n2 0 -2 u=3\n\n1 so 1\n\nm1 1001 1\nnps 1\n";
        let result = Analyzer::new().analyze(text);

        let codes: Vec<Code> = result.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                Code::UndefinedSurface,
                Code::BadVolume,
                Code::UnusedMaterial,
                Code::UnusedUniverse,
                Code::MaxDepth,
                Code::EntityCounts,
            ]
        );
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn quiet_keeps_errors_only() {
        let mut analyzer = Analyzer::new();
        analyzer.suppress_warnings();
        let result = analyzer.analyze("quiet\n1 0 -1\n\n1 so 1\n2 so 2\n\nnps 1\n");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn fatal_structure() {
        let result = Analyzer::new().analyze("\n1 0 -1\n\n1 so 1\n\nnps 1\n");
        assert!(result.is_fatal());
        assert!(result.deck.is_none());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, Code::MissingTitle);
    }

    #[test]
    fn missing_file() {
        let result = Analyzer::new().analyze_file("does/not/exist.i");
        assert!(result.is_fatal());
        assert_eq!(result.diagnostics[0].code, Code::IoError);
    }

    #[test]
    fn summary_counts() {
        let result = Analyzer::new().analyze(SIMPLE);
        let counts = result.with_code(Code::EntityCounts).next().unwrap();
        assert_eq!(counts.value("cells"), Some(2));
        assert_eq!(counts.value("surfaces"), Some(1));
        assert_eq!(counts.value("universes"), Some(1));
        assert_eq!(
            counts.message,
            "2 cells, 1 surfaces, 0 materials, 0 transforms, 0 tallies, 1 universes"
        );
    }

    #[test]
    fn text_report() {
        let result = Analyzer::new().analyze(&SIMPLE.replace("1 0 -1 imp", "1 0 -2 imp"));
        let text = result.render_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "simple");
        assert_eq!(
            lines[1],
            "error[UNDEFINED_SURFACE] line 2: cell 1: surface 2 is not defined"
        );
        assert_eq!(lines.last(), Some(&"1 error, 0 warnings"));
    }

    #[test]
    fn json_report() {
        let result = Analyzer::new().analyze(SIMPLE);
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

        assert_eq!(json["deck"]["title"], "simple");
        assert_eq!(json["diagnostics"][0]["code"], "MAX_DEPTH");
        assert_eq!(json["diagnostics"][0]["severity"], "info");
        assert_eq!(json["universe_report"]["max_depth"], 0);
    }
}
