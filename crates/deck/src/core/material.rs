//! Material and thermal scattering cards

// standard library
use std::fmt;

// external crates
use serde::Serialize;

// crate modules
use crate::diagnostic::Span;

/// Isotope identifier `ZZZAAA[.xxL]`
///
/// ```rust
/// # use mcnptools_deck::Zaid;
/// let zaid = Zaid { z: 92, a: 235, library: Some("80c".into()) };
/// assert_eq!(zaid.to_string(), "92235.80c");
///
/// // natural elements have A = 0
/// let zaid = Zaid { z: 6, a: 0, library: None };
/// assert_eq!(zaid.to_string(), "6000");
/// assert!(zaid.is_natural());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Zaid {
    /// Atomic number
    pub z: u32,
    /// Mass number, 0 for natural elements
    pub a: u32,
    /// Library suffix, two digits and a data class letter
    pub library: Option<String>,
}

impl Zaid {
    /// Largest atomic number accepted
    pub const MAX_Z: u32 = 118;

    /// True for natural element evaluations
    pub fn is_natural(&self) -> bool {
        self.a == 0
    }

    /// Data class letter of the library, e.g. `c` for continuous energy
    pub fn data_class(&self) -> Option<char> {
        self.library.as_ref().and_then(|l| l.chars().last())
    }
}

impl fmt::Display for Zaid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.z, self.a)?;
        if let Some(library) = &self.library {
            write!(f, ".{library}")?;
        }
        Ok(())
    }
}

/// Whether material fractions are atom or mass fractions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FractionKind {
    /// All fractions positive
    Atom,
    /// All fractions negative
    Mass,
}

/// One isotope of a material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub zaid: Zaid,
    /// Fraction as written
    pub fraction: f64,
}

/// A material card `mN`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Material {
    /// Material number
    pub number: u32,
    /// Isotopes in the order written
    pub components: Vec<Component>,
    /// Keyword options such as `nlib=80c`
    pub options: Vec<(String, String)>,
    /// Originating lines
    pub span: Span,
}

impl Material {
    /// Kind of fractions used, `None` if the signs are mixed or there are none
    pub fn fraction_kind(&self) -> Option<FractionKind> {
        let first = self.components.first()?;
        let negative = first.fraction < 0.0;
        if self
            .components
            .iter()
            .any(|c| (c.fraction < 0.0) != negative)
        {
            return None;
        }

        match negative {
            true => Some(FractionKind::Mass),
            false => Some(FractionKind::Atom),
        }
    }

    /// Sum of the fraction magnitudes
    pub fn total_fraction(&self) -> f64 {
        self.components.iter().map(|c| c.fraction.abs()).sum()
    }

    /// Value of a keyword option
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Thermal scattering card `mtN`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Thermal {
    /// Material the tables apply to
    pub material: u32,
    /// S(a,b) table identifiers, e.g. `lwtr.20t`
    pub tables: Vec<String>,
    /// Originating lines
    pub span: Span,
}
