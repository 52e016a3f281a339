// standard library
use std::path::Path;

// external crates
use log::{info, warn};
use serde::Serialize;

// crate modules
use crate::core::*;
use crate::error::Result;
use crate::lexer;
use crate::reader::Reader;

/// Data structure for a parsed MCNP input deck
///
/// This [Deck] is the typed model built from the deck text. Every record
/// keeps the span of physical lines it was read from.
///
/// | Block      | Records                                                   |
/// | ---------- | --------------------------------------------------------- |
/// | cells      | [Cell], with `LIKE m BUT` cells already expanded          |
/// | surfaces   | [Surface]                                                 |
/// | data       | [DataCard], with a typed [Payload] where understood       |
///
/// Records are kept in source order. Where an entity number is defined more
/// than once only the first definition is kept.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Deck {
    /// Title card
    pub title: String,
    /// Message block lines
    pub messages: Vec<String>,
    /// Cell cards
    pub cells: Vec<Cell>,
    /// Surface cards
    pub surfaces: Vec<Surface>,
    /// Data cards
    pub data: Vec<DataCard>,
}

impl Deck {
    /// Create a new empty [Deck]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a deck from text
    ///
    /// Only structural problems are returned as errors. Anything found while
    /// parsing individual cards is logged as a warning, so use
    /// [analyze](crate::analyze) for the full set of diagnostics.
    ///
    /// ```rust
    /// # use mcnptools_deck::Deck;
    /// let deck = Deck::from_text("title\n1 0 -1\n2 0 1\n\n1 so 5\n\nnps 10\n").unwrap();
    /// assert_eq!(deck.cells.len(), 2);
    /// assert!(deck.surface(1).is_some());
    /// ```
    pub fn from_text(text: &str) -> Result<Self> {
        let segmentation = lexer::segment(text)?;
        let (deck, diagnostics) = Reader::new().read(segmentation);
        for diagnostic in diagnostics {
            warn!("{diagnostic}");
        }
        Ok(deck)
    }

    /// Read a deck from a file
    ///
    /// The `path` may be a [&str], [String], [Path], etc..
    ///
    /// ```rust, no_run
    /// # use mcnptools_deck::Deck;
    /// let deck = Deck::from_file("path/to/input.i").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Reading {}", path.as_ref().display());
        let text = std::fs::read_to_string(path)?;
        Self::from_text(&text)
    }

    /// Find a cell by number
    pub fn cell(&self, number: u32) -> Option<&Cell> {
        self.cells.iter().find(|c| c.number == number)
    }

    /// Find a surface by number
    pub fn surface(&self, number: u32) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.number == number)
    }

    /// Find a material by number
    pub fn material(&self, number: u32) -> Option<&Material> {
        self.materials().find(|m| m.number == number)
    }

    /// Find a transform by number
    pub fn transform(&self, number: u32) -> Option<&Transform> {
        self.transforms().find(|t| t.number == number)
    }

    /// Find a tally by number
    ///
    /// ```rust
    /// # use mcnptools_deck::Deck;
    /// let deck = Deck::from_text("t\n1 0 -1\n\n1 so 5\n\nf4:n 1\nnps 10\n").unwrap();
    /// assert!(deck.tally(4).is_some());
    /// assert!(deck.tally(14).is_none());
    /// ```
    pub fn tally(&self, number: u32) -> Option<&Tally> {
        self.tallies().find(|t| t.number == number)
    }

    /// All material cards
    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.data.iter().filter_map(|card| match &card.payload {
            Payload::Material(m) => Some(m),
            _ => None,
        })
    }

    /// All thermal scattering cards
    pub fn thermals(&self) -> impl Iterator<Item = &Thermal> {
        self.data.iter().filter_map(|card| match &card.payload {
            Payload::Thermal(t) => Some(t),
            _ => None,
        })
    }

    /// All transform cards
    pub fn transforms(&self) -> impl Iterator<Item = &Transform> {
        self.data.iter().filter_map(|card| match &card.payload {
            Payload::Transform(t) => Some(t),
            _ => None,
        })
    }

    /// All standard tallies
    pub fn tallies(&self) -> impl Iterator<Item = &Tally> {
        self.data.iter().filter_map(|card| match &card.payload {
            Payload::Tally(t) => Some(t),
            _ => None,
        })
    }

    /// Particles on the `mode` card, if there is one
    pub fn mode(&self) -> Option<&[Particle]> {
        self.data.iter().find_map(|card| match &card.payload {
            Payload::Mode(particles) => Some(particles.as_slice()),
            _ => None,
        })
    }

    /// Data cards with the given mnemonic, e.g. `sdef` or `imp`
    pub fn cards<'a>(&'a self, mnemonic: &'a str) -> impl Iterator<Item = &'a DataCard> + 'a {
        self.data.iter().filter(move |card| card.mnemonic == mnemonic)
    }
}
