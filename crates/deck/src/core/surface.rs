//! Surface cards and surface mnemonics

// standard library
use std::fmt;

// external crates
use serde::Serialize;

// crate modules
use crate::diagnostic::Span;

/// Boundary condition marker preceding the surface number
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Boundary {
    /// Ordinary surface
    #[default]
    None,
    /// `*` prefix, specularly reflecting
    Reflecting,
    /// `+` prefix, white (cosine) reflecting
    White,
}

/// Surface type from the deck mnemonic
///
/// Mnemonics are case insensitive. Anything that is not recognised is kept as
/// [SurfaceKind::Other] so that the analysis can carry on.
///
/// ```rust
/// # use mcnptools_deck::SurfaceKind;
/// assert_eq!(SurfaceKind::from_mnemonic("C/Z"), SurfaceKind::CylZ);
/// assert_eq!(SurfaceKind::from_mnemonic("rpp"), SurfaceKind::Rpp);
/// assert_eq!(SurfaceKind::Rpp.mnemonic(), "rpp");
///
/// // Coefficient counts are table driven
/// assert_eq!(SurfaceKind::So.expected_coefficients(), Some(&[1][..]));
/// assert_eq!(SurfaceKind::P.expected_coefficients(), Some(&[4, 9][..]));
/// assert_eq!(SurfaceKind::Other("xyz".into()).expected_coefficients(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SurfaceKind {
    // planes
    P,
    Px,
    Py,
    Pz,
    // spheres
    So,
    S,
    Sx,
    Sy,
    Sz,
    // cylinders
    CylX,
    CylY,
    CylZ,
    Cx,
    Cy,
    Cz,
    // cones
    ConeX,
    ConeY,
    ConeZ,
    Kx,
    Ky,
    Kz,
    // general quadrics and tori
    Sq,
    Gq,
    Tx,
    Ty,
    Tz,
    // axisymmetric surfaces defined by points
    X,
    Y,
    Z,
    // macrobodies
    Box,
    Rpp,
    Sph,
    Rcc,
    Rhp,
    Hex,
    Rec,
    Trc,
    Ell,
    Wed,
    Arb,
    /// Unrecognised mnemonic
    Other(String),
}

impl SurfaceKind {
    /// Interpret a mnemonic, ignoring case
    pub fn from_mnemonic(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "p" => Self::P,
            "px" => Self::Px,
            "py" => Self::Py,
            "pz" => Self::Pz,
            "so" => Self::So,
            "s" => Self::S,
            "sx" => Self::Sx,
            "sy" => Self::Sy,
            "sz" => Self::Sz,
            "c/x" => Self::CylX,
            "c/y" => Self::CylY,
            "c/z" => Self::CylZ,
            "cx" => Self::Cx,
            "cy" => Self::Cy,
            "cz" => Self::Cz,
            "k/x" => Self::ConeX,
            "k/y" => Self::ConeY,
            "k/z" => Self::ConeZ,
            "kx" => Self::Kx,
            "ky" => Self::Ky,
            "kz" => Self::Kz,
            "sq" => Self::Sq,
            "gq" => Self::Gq,
            "tx" => Self::Tx,
            "ty" => Self::Ty,
            "tz" => Self::Tz,
            "x" => Self::X,
            "y" => Self::Y,
            "z" => Self::Z,
            "box" => Self::Box,
            "rpp" => Self::Rpp,
            "sph" => Self::Sph,
            "rcc" => Self::Rcc,
            "rhp" => Self::Rhp,
            "hex" => Self::Hex,
            "rec" => Self::Rec,
            "trc" => Self::Trc,
            "ell" => Self::Ell,
            "wed" => Self::Wed,
            "arb" => Self::Arb,
            other => Self::Other(other.to_string()),
        }
    }

    /// Lower case deck mnemonic
    pub fn mnemonic(&self) -> &str {
        match self {
            Self::P => "p",
            Self::Px => "px",
            Self::Py => "py",
            Self::Pz => "pz",
            Self::So => "so",
            Self::S => "s",
            Self::Sx => "sx",
            Self::Sy => "sy",
            Self::Sz => "sz",
            Self::CylX => "c/x",
            Self::CylY => "c/y",
            Self::CylZ => "c/z",
            Self::Cx => "cx",
            Self::Cy => "cy",
            Self::Cz => "cz",
            Self::ConeX => "k/x",
            Self::ConeY => "k/y",
            Self::ConeZ => "k/z",
            Self::Kx => "kx",
            Self::Ky => "ky",
            Self::Kz => "kz",
            Self::Sq => "sq",
            Self::Gq => "gq",
            Self::Tx => "tx",
            Self::Ty => "ty",
            Self::Tz => "tz",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Box => "box",
            Self::Rpp => "rpp",
            Self::Sph => "sph",
            Self::Rcc => "rcc",
            Self::Rhp => "rhp",
            Self::Hex => "hex",
            Self::Rec => "rec",
            Self::Trc => "trc",
            Self::Ell => "ell",
            Self::Wed => "wed",
            Self::Arb => "arb",
            Self::Other(s) => s,
        }
    }

    /// Allowed numbers of coefficients, `None` if unknown
    pub fn expected_coefficients(&self) -> Option<&'static [usize]> {
        let counts: &'static [usize] = match self {
            Self::P => &[4, 9],
            Self::Px | Self::Py | Self::Pz => &[1],
            Self::So => &[1],
            Self::S => &[4],
            Self::Sx | Self::Sy | Self::Sz => &[2],
            Self::CylX | Self::CylY | Self::CylZ => &[3],
            Self::Cx | Self::Cy | Self::Cz => &[1],
            Self::ConeX | Self::ConeY | Self::ConeZ => &[4, 5],
            Self::Kx | Self::Ky | Self::Kz => &[2, 3],
            Self::Sq | Self::Gq => &[10],
            Self::Tx | Self::Ty | Self::Tz => &[6],
            Self::X | Self::Y | Self::Z => &[2, 4, 6],
            Self::Box => &[12],
            Self::Rpp => &[6],
            Self::Sph => &[4],
            Self::Rcc => &[7],
            Self::Rhp | Self::Hex => &[9, 15],
            Self::Rec => &[10, 12],
            Self::Trc => &[8],
            Self::Ell => &[7],
            Self::Wed => &[12],
            Self::Arb => &[30],
            Self::Other(_) => return None,
        };
        Some(counts)
    }

    /// True for macrobodies, which may be referenced by facet
    pub fn is_macrobody(&self) -> bool {
        matches!(
            self,
            Self::Box
                | Self::Rpp
                | Self::Sph
                | Self::Rcc
                | Self::Rhp
                | Self::Hex
                | Self::Rec
                | Self::Trc
                | Self::Ell
                | Self::Wed
                | Self::Arb
        )
    }

    /// Number of lattice bounding planes the surface stands in for
    ///
    /// A whole `rpp` or `box` bounds a rectangular lattice element on its own,
    /// and a whole `rhp`/`hex` a hexagonal element. Everything else is one.
    pub fn lattice_planes(&self) -> usize {
        match self {
            Self::Box | Self::Rpp => 6,
            Self::Rhp | Self::Hex => 8,
            _ => 1,
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// A surface card
///
/// ```text
/// [*|+] NUM [TR] MNEMONIC <coefficients>
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surface {
    /// Surface number
    pub number: u32,
    /// Boundary condition
    pub boundary: Boundary,
    /// Transform number, or the negated number of a periodic partner surface
    pub transform: Option<i32>,
    /// Surface type
    pub kind: SurfaceKind,
    /// Coefficients in the order written
    pub coefficients: Vec<f64>,
    /// Originating lines
    pub span: Span,
}

impl Surface {
    /// Referenced `TRn` card, if any
    pub fn transform_ref(&self) -> Option<u32> {
        self.transform.filter(|n| *n > 0).map(|n| n as u32)
    }

    /// Periodic partner surface, if any
    pub fn periodic_partner(&self) -> Option<u32> {
        self.transform.filter(|n| *n < 0).map(|n| n.unsigned_abs())
    }
}
