//! Standard `F` tally cards

// standard library
use std::fmt;

// external crates
use serde::Serialize;

// crate modules
use crate::core::Particle;
use crate::diagnostic::Span;

/// Standard tally definition
///
/// Built from an `Fn:<pl>` card, where the tally type is the last digit of
/// the tally number.
///
/// | Mnemonic | Tally Description                  | Bins refer to |
/// | -------- | ---------------------------------- | ------------- |
/// | F1:P     | Integrated surface current         | surfaces      |
/// | F2:P     | Surface flux                       | surfaces      |
/// | F4:P     | Cell flux                          | cells         |
/// | F5:P     | Flux at a point or ring detector   | points        |
/// | F6:P     | Cell energy deposition             | cells         |
/// | F7:P     | Cell fission energy deposition     | cells         |
/// | F8:P     | Pulse height tally                 | cells         |
///
/// Repeated structure chains such as `(1 < 2 < 3)` are flattened: the first
/// level refers to whatever the tally type bins on and every deeper level is
/// a cell. Lattice index brackets and `T` total bins are not kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally {
    /// Tally number
    pub number: u32,
    /// Tally type from the last digit of the number
    pub kind: TallyKind,
    /// Tally modifier (none, *, +)
    pub modifier: Modifier,
    /// Particle types
    pub particles: Vec<Particle>,
    /// Cell and surface references in the order written
    pub bins: Vec<TallyRef>,
    /// Detector locations `x y z r0` for F5 tallies
    pub points: Vec<[f64; 4]>,
    /// Originating lines
    pub span: Span,
}

impl Tally {
    /// Cell numbers referenced by the tally
    pub fn cells(&self) -> impl Iterator<Item = u32> + '_ {
        self.bins
            .iter()
            .filter(|b| b.entity == Entity::Cell)
            .map(|b| b.id)
    }

    /// Surface numbers referenced by the tally
    pub fn surfaces(&self) -> impl Iterator<Item = u32> + '_ {
        self.bins
            .iter()
            .filter(|b| b.entity == Entity::Surface)
            .map(|b| b.id)
    }
}

/// Variants of standard tally types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TallyKind {
    SurfaceCurrent,
    SurfaceFlux,
    CellFlux,
    Detector,
    EnergyDeposition,
    FissionDeposition,
    PulseHeight,
}

impl TallyKind {
    /// Tally type for a tally number, `None` for types 0, 3 and 9
    ///
    /// ```rust
    /// # use mcnptools_deck::TallyKind;
    /// assert_eq!(TallyKind::from_number(104), Some(TallyKind::CellFlux));
    /// assert_eq!(TallyKind::from_number(5), Some(TallyKind::Detector));
    /// assert_eq!(TallyKind::from_number(13), None);
    /// ```
    pub fn from_number(number: u32) -> Option<Self> {
        match number % 10 {
            1 => Some(Self::SurfaceCurrent),
            2 => Some(Self::SurfaceFlux),
            4 => Some(Self::CellFlux),
            5 => Some(Self::Detector),
            6 => Some(Self::EnergyDeposition),
            7 => Some(Self::FissionDeposition),
            8 => Some(Self::PulseHeight),
            _ => None,
        }
    }

    /// What the first level of tally bins refers to
    pub fn entity(&self) -> Entity {
        match self {
            Self::SurfaceCurrent | Self::SurfaceFlux => Entity::Surface,
            Self::Detector => Entity::Point,
            _ => Entity::Cell,
        }
    }
}

impl fmt::Display for TallyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SurfaceCurrent => "surface current",
            Self::SurfaceFlux => "surface flux",
            Self::CellFlux => "cell flux",
            Self::Detector => "detector",
            Self::EnergyDeposition => "energy deposition",
            Self::FissionDeposition => "fission energy deposition",
            Self::PulseHeight => "pulse height",
        };
        write!(f, "{s}")
    }
}

/// Variants of tally modifiers
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Modifier {
    #[default]
    None,
    /// `*Fn`, energy units
    Star,
    /// `+Fn`, collision heating or charge deposition
    Plus,
}

/// Geometry entity a tally bin refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Entity {
    Cell,
    Surface,
    Point,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cell => "cell",
            Self::Surface => "surface",
            Self::Point => "point",
        };
        write!(f, "{s}")
    }
}

/// Reference from a tally bin to a cell or surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TallyRef {
    pub entity: Entity,
    pub id: u32,
}
