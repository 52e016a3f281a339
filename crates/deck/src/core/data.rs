//! Data block cards

// standard library
use std::fmt;

// external crates
use serde::Serialize;

// crate modules
use crate::core::{Material, Particle, Tally, Thermal, Transform};
use crate::diagnostic::Span;

/// A data card
///
/// The card name is split into its parts, so `*f14:n,p` has the prefix `*`,
/// mnemonic `f`, number 14 and particles `[n, p]`. The payload carries the
/// parsed content for cards that are understood, and raw tokens otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataCard {
    /// Lower case mnemonic without prefix, number or particles
    pub mnemonic: String,
    /// Entity number following the mnemonic
    pub number: Option<u32>,
    /// `*` or `+` prefix
    pub prefix: Option<char>,
    /// Particle designators after the colon
    pub particles: Vec<Particle>,
    /// Parsed content
    pub payload: Payload,
    /// Originating lines
    pub span: Span,
}

impl DataCard {
    /// Full card name, e.g. `*f14:n,p`
    pub fn name(&self) -> String {
        let mut name = String::new();
        if let Some(prefix) = self.prefix {
            name.push(prefix);
        }
        name.push_str(&self.mnemonic);
        if let Some(number) = self.number {
            name.push_str(&number.to_string());
        }
        if !self.particles.is_empty() {
            name.push(':');
            let particles: Vec<String> = self.particles.iter().map(|p| p.to_string()).collect();
            name.push_str(&particles.join(","));
        }
        name
    }
}

impl fmt::Display for DataCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Keyword groups such as `cel=1 erg=14.1 pos=0 0 0`
pub type KeywordGroups = Vec<(String, Vec<String>)>;

/// Parsed content of a data card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Payload {
    /// `mN`
    Material(Material),
    /// `mtN`
    Thermal(Thermal),
    /// `mode`
    Mode(Vec<Particle>),
    /// `nps`
    Nps(u64),
    /// `kcode`, with `j` defaults as `None`
    Kcode(Vec<Option<f64>>),
    /// `ksrc` source points
    Ksrc(Vec<[f64; 3]>),
    /// `sdef`
    Sdef(KeywordGroups),
    /// `[*|+]fN:<pl>`
    Tally(Tally),
    /// `fcN`, text as written
    TallyComment(String),
    /// `eN` energy bin bounds after shorthand expansion
    EnergyBins(Vec<f64>),
    /// `tN` time bin bounds after shorthand expansion
    TimeBins(Vec<f64>),
    /// `[*]trN`
    Transform(Transform),
    /// `imp:<pl>`, one value per cell in cell block order
    Importance(Vec<f64>),
    /// `wwn`, `wwe`, `wwp`, with `j` defaults as `None`
    WeightWindow(Vec<Option<f64>>),
    /// `dxt:<pl>`
    Dxtran(Vec<f64>),
    /// `cut:<pl>`, with `j` defaults as `None`
    Cutoff(Vec<Option<f64>>),
    /// `burn`
    Burn(KeywordGroups),
    /// `fmeshN:<pl>`
    Fmesh(KeywordGroups),
    /// Any other card, tokens kept as written
    Opaque(Vec<String>),
}

impl Payload {
    /// Short description of the payload type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Material(_) => "material",
            Self::Thermal(_) => "thermal",
            Self::Mode(_) => "mode",
            Self::Nps(_) => "nps",
            Self::Kcode(_) => "kcode",
            Self::Ksrc(_) => "ksrc",
            Self::Sdef(_) => "sdef",
            Self::Tally(_) => "tally",
            Self::TallyComment(_) => "tally comment",
            Self::EnergyBins(_) => "energy bins",
            Self::TimeBins(_) => "time bins",
            Self::Transform(_) => "transform",
            Self::Importance(_) => "importance",
            Self::WeightWindow(_) => "weight window",
            Self::Dxtran(_) => "dxtran",
            Self::Cutoff(_) => "cutoff",
            Self::Burn(_) => "burn",
            Self::Fmesh(_) => "fmesh",
            Self::Opaque(_) => "opaque",
        }
    }
}
