//! Cell cards and their parameters

// standard library
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// external crates
use serde::Serialize;

// crate modules
use crate::core::{Particle, TransformSpec};
use crate::diagnostic::Span;

/// A cell card
///
/// ```text
/// NUM MAT [DENSITY] <region> <params>*
/// NUM LIKE M BUT <params>*
/// ```
///
/// Cells written with `LIKE m BUT` are expanded once the whole cell block has
/// been read, so every [Cell] in a [Deck](crate::Deck) is complete. The base
/// cell is remembered in `like`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cell {
    /// Cell number
    pub number: u32,
    /// Material number, 0 for void
    pub material: u32,
    /// Density as written, present for non-void cells
    pub density: Option<f64>,
    /// Geometry of the cell
    pub region: Region,
    /// Keyword parameters
    pub params: CellParams,
    /// Base cell for `LIKE m BUT` cells
    pub like: Option<u32>,
    /// Originating lines
    pub span: Span,
}

impl Cell {
    /// True for void cells
    pub fn is_void(&self) -> bool {
        self.material == 0
    }

    /// Density with its units made explicit
    ///
    /// ```rust
    /// # use mcnptools_deck::{Cell, Density};
    /// let cell = Cell {
    ///     number: 1,
    ///     material: 1,
    ///     density: Some(-10.4),
    ///     ..Default::default()
    /// };
    /// assert_eq!(cell.density(), Some(Density::Mass(10.4)));
    /// ```
    pub fn density(&self) -> Option<Density> {
        self.density.map(Density::from_value)
    }

    /// Universe the cell belongs to, 0 for the real world
    pub fn universe(&self) -> u32 {
        self.params.universe()
    }

    /// True if the cell is a lattice cell
    pub fn is_lattice(&self) -> bool {
        self.params.lattice.is_some()
    }
}

/// Cell density with explicit units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Density {
    /// Atom density in atoms/barn-cm, written positive
    Atomic(f64),
    /// Mass density in g/cm3, written negative
    Mass(f64),
}

impl Density {
    /// Interpret the signed value from a cell card
    pub fn from_value(value: f64) -> Self {
        if value < 0.0 {
            Self::Mass(-value)
        } else {
            Self::Atomic(value)
        }
    }
}

/// Which side of a surface a half-space term refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Sense {
    Negative,
    Positive,
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "-"),
            Self::Positive => write!(f, "+"),
        }
    }
}

/// A signed surface term in a cell region, e.g. `-12` or `+3.2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SurfaceRef {
    /// Surface number
    pub id: u32,
    /// Half space
    pub sense: Sense,
    /// Macrobody facet number, if the term is written `n.f`
    pub facet: Option<u8>,
}

impl fmt::Display for SurfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sense == Sense::Negative {
            write!(f, "-")?;
        }
        write!(f, "{}", self.id)?;
        if let Some(facet) = self.facet {
            write!(f, ".{facet}")?;
        }
        Ok(())
    }
}

/// CSG region of a cell
///
/// The expression is never evaluated. It is kept as normalised text alongside
/// the surface terms and cell complements it mentions, in the order written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Region {
    /// Normalised expression text
    pub text: String,
    /// Half-space terms
    pub surfaces: Vec<SurfaceRef>,
    /// Cells complemented with `#n`
    pub complements: Vec<u32>,
}

impl Region {
    /// True if the region mentions nothing at all
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty() && self.complements.is_empty()
    }

    /// Distinct surface numbers referenced
    pub fn surface_ids(&self) -> BTreeSet<u32> {
        self.surfaces.iter().map(|s| s.id).collect()
    }
}

/// Keyword parameters of a cell
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellParams {
    /// Importance by particle, `imp:n,p=1` sets both
    pub importance: BTreeMap<Particle, f64>,
    /// Universe as written, sign preserved
    pub universe: Option<i32>,
    /// Fill specification
    pub fill: Option<Fill>,
    /// Lattice type as written
    pub lattice: Option<i32>,
    /// Cell transformation from `trcl`/`*trcl`
    pub transform: Option<TransformSpec>,
    /// Per-instance volume
    pub volume: Option<f64>,
    /// Temperature in MeV
    pub temperature: Option<f64>,
    /// Recognised keywords that are not modelled, with their raw values
    pub other: Vec<(String, Vec<String>)>,
}

impl CellParams {
    /// Universe the cell belongs to, ignoring the sign
    ///
    /// ```rust
    /// # use mcnptools_deck::CellParams;
    /// let mut params = CellParams::default();
    /// assert_eq!(params.universe(), 0);
    ///
    /// params.universe = Some(-3);
    /// assert_eq!(params.universe(), 3);
    /// ```
    pub fn universe(&self) -> u32 {
        self.universe.map_or(0, |u| u.unsigned_abs())
    }

    /// Raw values of an unmodelled keyword
    pub fn other(&self, key: &str) -> Option<&[String]> {
        self.other
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Overwrite with everything set in `overrides`
    ///
    /// Used to expand `LIKE m BUT` cells, where anything after `BUT` replaces
    /// the value inherited from the base cell.
    pub fn merge(&mut self, overrides: &CellParams) {
        self.importance.extend(overrides.importance.iter());

        if overrides.universe.is_some() {
            self.universe = overrides.universe;
        }
        if overrides.fill.is_some() {
            self.fill.clone_from(&overrides.fill);
        }
        if overrides.lattice.is_some() {
            self.lattice = overrides.lattice;
        }
        if overrides.transform.is_some() {
            self.transform.clone_from(&overrides.transform);
        }
        if overrides.volume.is_some() {
            self.volume = overrides.volume;
        }
        if overrides.temperature.is_some() {
            self.temperature = overrides.temperature;
        }

        for (key, values) in &overrides.other {
            match self.other.iter_mut().find(|(k, _)| k == key) {
                Some(existing) => existing.1.clone_from(values),
                None => self.other.push((key.clone(), values.clone())),
            }
        }
    }
}

/// A `fill` or `*fill` specification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Fill {
    /// `fill=u` with an optional transform
    Simple {
        universe: i32,
        transform: Option<TransformSpec>,
    },
    /// `fill=i0:i1 j0:j1 k0:k1 <entries>` for lattice cells
    Array(FillArray),
}

impl Fill {
    /// Filled universe for every placement, ignoring signs
    ///
    /// An array contributes one value per lattice element, so repeated
    /// universes appear once per element.
    pub fn targets(&self) -> Vec<u32> {
        match self {
            Self::Simple { universe, .. } => vec![universe.unsigned_abs()],
            Self::Array(array) => array
                .entries
                .iter()
                .map(|e| e.universe.unsigned_abs())
                .collect(),
        }
    }

    /// Every transform attached to the fill
    pub fn transforms(&self) -> Vec<&TransformSpec> {
        match self {
            Self::Simple { transform, .. } => transform.iter().collect(),
            Self::Array(array) => array
                .entries
                .iter()
                .filter_map(|e| e.transform.as_ref())
                .collect(),
        }
    }

    /// Array form, if any
    pub fn as_array(&self) -> Option<&FillArray> {
        match self {
            Self::Array(array) => Some(array),
            Self::Simple { .. } => None,
        }
    }
}

/// One lattice element of an array fill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillEntry {
    /// Universe as written, sign preserved
    pub universe: i32,
    /// Optional transform written in parentheses after the universe
    pub transform: Option<TransformSpec>,
}

impl FillEntry {
    /// Entry without a transform
    pub fn new(universe: i32) -> Self {
        Self {
            universe,
            transform: None,
        }
    }
}

/// Lattice fill array
///
/// Entries are stored exactly as given, in column-major order with `i`
/// varying fastest, then `j`, then `k`. Nothing is reordered.
///
/// ```rust
/// # use mcnptools_deck::{FillArray, FillEntry};
/// let array = FillArray {
///     ranges: [(-1, 1), (0, 1), (0, 0)],
///     entries: (1..=6).map(FillEntry::new).collect(),
/// };
///
/// assert_eq!(array.widths(), [3, 2, 1]);
/// assert_eq!(array.expected_len(), Some(6));
///
/// // i varies fastest
/// assert_eq!(array.get(0, 0, 0).unwrap().universe, 2);
/// assert_eq!(array.get(-1, 1, 0).unwrap().universe, 4);
/// assert!(array.get(2, 0, 0).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillArray {
    /// Index ranges `(low, high)` for `i`, `j` and `k`
    pub ranges: [(i32, i32); 3],
    /// Lattice elements in column-major order
    pub entries: Vec<FillEntry>,
}

impl FillArray {
    /// Declared widths `high - low + 1` for each axis
    pub fn widths(&self) -> [i64; 3] {
        self.ranges.map(|(lo, hi)| i64::from(hi) - i64::from(lo) + 1)
    }

    /// True if every declared width is at least 1
    pub fn has_positive_widths(&self) -> bool {
        self.widths().iter().all(|w| *w > 0)
    }

    /// Number of entries the ranges declare
    ///
    /// `None` if any width is not positive, or if the product does not fit in
    /// a `usize`.
    ///
    /// ```rust
    /// # use mcnptools_deck::FillArray;
    /// let huge = FillArray {
    ///     ranges: [(i32::MIN, i32::MAX); 3],
    ///     entries: Vec::new(),
    /// };
    /// assert!(huge.has_positive_widths());
    /// assert_eq!(huge.expected_len(), None);
    /// ```
    pub fn expected_len(&self) -> Option<usize> {
        if !self.has_positive_widths() {
            return None;
        }
        let product = self
            .widths()
            .into_iter()
            .try_fold(1i64, |acc, w| acc.checked_mul(w))?;
        usize::try_from(product).ok()
    }

    /// Entry at lattice index `(i, j, k)`
    pub fn get(&self, i: i32, j: i32, k: i32) -> Option<&FillEntry> {
        let outside = [i, j, k]
            .into_iter()
            .zip(self.ranges)
            .any(|(n, (lo, hi))| n < lo || n > hi);
        if outside {
            return None;
        }

        let [(i0, _), (j0, _), (k0, _)] = self.ranges;
        let [wi, wj, _] = self.widths();
        let di = i64::from(i) - i64::from(i0);
        let dj = i64::from(j) - i64::from(j0);
        let dk = i64::from(k) - i64::from(k0);
        let offset = wj
            .checked_mul(dk)
            .and_then(|n| n.checked_add(dj))
            .and_then(|n| n.checked_mul(wi))
            .and_then(|n| n.checked_add(di))?;
        self.entries.get(usize::try_from(offset).ok()?)
    }

    /// Every entry with its lattice index, in storage order
    ///
    /// ```rust
    /// # use mcnptools_deck::{FillArray, FillEntry};
    /// let array = FillArray {
    ///     ranges: [(0, 1), (0, 1), (0, 0)],
    ///     entries: (1..=4).map(FillEntry::new).collect(),
    /// };
    /// let indices: Vec<[i32; 3]> = array.positions().map(|(ijk, _)| ijk).collect();
    /// assert_eq!(indices, vec![[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0]]);
    /// ```
    pub fn positions(&self) -> impl Iterator<Item = ([i32; 3], &FillEntry)> + '_ {
        let [(i0, _), (j0, _), (k0, _)] = self.ranges;
        let [wi, wj, _] = self.widths().map(|w| w.max(1));
        self.entries.iter().enumerate().map(move |(n, entry)| {
            let n = n as i64;
            let i = (i64::from(i0) + n % wi) as i32;
            let j = (i64::from(j0) + (n / wi) % wj) as i32;
            let k = (i64::from(k0) + n / wi.saturating_mul(wj)) as i32;
            ([i, j, k], entry)
        })
    }
}
