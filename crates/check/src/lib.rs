//! Command line checker for MCNP input decks
//!
//! `deckcheck` runs the full [mcnptools_deck] analysis over a single deck and
//! prints the report to stdout, as text or JSON.
//!
//! ```text
//! Usage: deckcheck [OPTIONS] <DECK>
//!
//! Arguments:
//!   <DECK>  Path to the MCNP input deck
//!
//! Options:
//!   -f, --format <FORMAT>    Report format [default: text] [possible values: text, json]
//!   -n, --max-nesting <N>    Nesting depth above which DEEP_NESTING is reported [default: 10]
//!   -q, --quiet              Only report fatal problems and errors
//!   -v, --verbose...         Verbose logging to stderr
//! ```
//!
//! | Exit code | Meaning                                     |
//! | --------- | ------------------------------------------- |
//! | 0         | no errors, warnings are allowed             |
//! | 1         | at least one error                          |
//! | 2         | the deck could not be read or segmented     |

mod error;

// standard library
use std::path::PathBuf;

// external crates
use clap::{Parser, ValueEnum};
use log::{debug, error, info};

// mcnptools modules
use mcnptools_deck::{AnalysisResult, Analyzer, Severity};
use mcnptools_utils::StringExt;

#[doc(inline)]
pub use error::{Error, Result};

/// No errors were found
pub const EXIT_OK: u8 = 0;
/// The deck has at least one error
pub const EXIT_ERRORS: u8 = 1;
/// The deck could not be read at all
pub const EXIT_FATAL: u8 = 2;

/// Static analysis of an MCNP input deck
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "deckcheck", version, about, long_about = None)]
pub struct Cli {
    /// Path to the MCNP input deck
    #[arg(value_name = "DECK")]
    pub deck: PathBuf,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Nesting depth above which DEEP_NESTING is reported
    #[arg(short = 'n', long, value_name = "N", default_value_t = 10)]
    pub max_nesting: usize,

    /// Only report fatal problems and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose logging to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Output formats for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One diagnostic per line with a closing tally
    Text,
    /// The full analysis result as pretty JSON
    Json,
}

impl Cli {
    /// Analyzer configured from the command line flags
    pub fn analyzer(&self) -> Analyzer {
        let mut analyzer = Analyzer::new();
        analyzer.set_max_nesting(self.max_nesting);
        if self.quiet {
            analyzer.suppress_warnings();
        }
        analyzer
    }
}

/// Run the checker, returning the process exit code
///
/// Sets up logging, analyses the deck and prints the report to stdout.
pub fn run(cli: &Cli) -> Result<u8> {
    init_logging(cli.verbose, cli.quiet)?;
    debug!("{cli:?}");

    let result = cli.analyzer().analyze_file(&cli.deck);
    let report = render(&result, cli.format)?;
    print!("{report}");

    if let Some(fatal) = result.diagnostics.iter().find(|d| d.severity == Severity::Fatal) {
        error!("{}", fatal.message.capitalise());
    }

    let code = exit_code(&result);
    info!("Finished with exit code {code}");
    Ok(code)
}

/// Render the report in the requested format
pub fn render(result: &AnalysisResult, format: Format) -> Result<String> {
    match format {
        Format::Text => Ok(result.render_text()),
        Format::Json => {
            let mut json = result.to_json()?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Exit code for a finished analysis
///
/// ```rust
/// # use mcnptools_check::{exit_code, EXIT_ERRORS, EXIT_FATAL};
/// let result = mcnptools_deck::analyze("title\n1 0 -2\n\n1 so 1\n\nnps 1\n");
/// assert_eq!(exit_code(&result), EXIT_ERRORS);
///
/// let result = mcnptools_deck::analyze("title\n1 0 -1\n");
/// assert_eq!(exit_code(&result), EXIT_FATAL);
/// ```
pub fn exit_code(result: &AnalysisResult) -> u8 {
    if result.is_fatal() {
        EXIT_FATAL
    } else if result.has_errors() {
        EXIT_ERRORS
    } else {
        EXIT_OK
    }
}

/// Logs to stderr, warnings by default and more with each `-v`
fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    stderrlog::new()
        .module(module_path!())
        .module("mcnptools_deck")
        .quiet(quiet)
        .verbosity(1 + verbose as usize)
        .init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SIMPLE: &str = "simple\n1 0 -1 imp:n=1\n2 0  1 imp:n=0\n\n1 so 1.0\n\nmode n\nnps 1000\n";

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("deckcheck").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["input.i"]);
        assert_eq!(cli.deck, PathBuf::from("input.i"));
        assert_eq!(cli.format, Format::Text);
        assert_eq!(cli.max_nesting, 10);
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn all_flags() {
        let cli = parse(&["input.i", "--format", "json", "--max-nesting", "3", "-q", "-vv"]);
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.max_nesting, 3);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 2);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["input.i", "--format", "yaml"])]
    #[case(&["input.i", "--max-nesting", "-1"])]
    fn bad_arguments(#[case] args: &[&str]) {
        let args = std::iter::once("deckcheck").chain(args.iter().copied());
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[rstest]
    #[case(SIMPLE, EXIT_OK)]
    #[case("simple\n1 0 -2\n2 0 1\n\n1 so 1\n\nnps 1\n", EXIT_ERRORS)]
    #[case("simple\n1 0 -1\n\n\n1 so 1\n\nnps 1\n", EXIT_FATAL)]
    #[case("simple\n1 0 -1\n2 0 1\n\n1 so 1\n2 so 2\n\nnps 1\n", EXIT_OK)]
    fn exit_codes(#[case] text: &str, #[case] expected: u8) {
        assert_eq!(exit_code(&mcnptools_deck::analyze(text)), expected);
    }

    #[test]
    fn quiet_and_nesting_flags_reach_the_analyzer() {
        let text = "nested\n1 0 -1 fill=1\n2 0 1\n3 0 -1 u=1 fill=2\n4 0 -1 u=2\n\n1 so 1\n\nnps 1\n";

        let loud = parse(&["deck.i", "--max-nesting", "1"]).analyzer().analyze(text);
        assert_eq!(loud.warnings().count(), 1);

        let quiet = parse(&["deck.i", "-n", "1", "--quiet"]).analyzer().analyze(text);
        assert!(quiet.diagnostics.is_empty());
    }

    #[rstest]
    #[case(Format::Text, "simple\n")]
    #[case(Format::Json, "{\n")]
    fn reports(#[case] format: Format, #[case] start: &str) {
        let report = render(&mcnptools_deck::analyze(SIMPLE), format).unwrap();
        assert!(report.starts_with(start));
        assert!(report.ends_with('\n'));
    }
}
