mod cells;
mod data;
mod surfaces;

// external crates
use log::debug;

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::diagnostic::{Code, Diagnostic, Span};
use crate::lexer::Segmentation;
use crate::parsers::ParseFailure;
use crate::Deck;

/// Internal reader turning logical lines into a [Deck]
///
/// Every problem found along the way is collected as a [Diagnostic] rather
/// than stopping the read.
pub(crate) struct Reader {
    deck: Deck,
    diagnostics: Vec<Diagnostic>,
}

// ! Internal API
impl Reader {
    /// Create a new reader with an empty deck
    pub(crate) fn new() -> Self {
        Self {
            deck: Deck::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Read every block of a segmented deck
    pub(crate) fn read(mut self, segmentation: Segmentation) -> (Deck, Vec<Diagnostic>) {
        debug!("Title       = {:?}", segmentation.title);
        self.deck.title = segmentation.title;
        self.deck.messages = segmentation.messages;

        self.read_cells(&segmentation.cells);
        self.read_surfaces(&segmentation.surfaces);
        self.read_data(&segmentation.data);

        debug!("Read complete with {} diagnostics", self.diagnostics.len());
        (self.deck, self.diagnostics)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        debug!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Report a parse failure against the card it came from
    fn failure(&mut self, failure: ParseFailure, span: Span) {
        self.report(Diagnostic::new(failure.code, Some(span), failure.message));
    }

    /// Report a repeated entity number, the first definition is kept
    fn duplicate(&mut self, entity: &str, number: u32, span: Span, first: Span) {
        let diagnostic = Diagnostic::new(
            Code::DuplicateEntityNumber,
            Some(span),
            f!("{entity} {number} is already defined on {first}"),
        )
        .with(entity_key(entity), number);
        self.report(diagnostic);
    }
}

/// Diagnostic data key for an entity kind
fn entity_key(entity: &str) -> &'static str {
    match entity {
        "cell" => "cell",
        "surface" => "surface",
        "material" => "material",
        "transform" => "transform",
        _ => "tally",
    }
}
