//! Structured diagnostics produced by every analysis stage

// standard library
use std::collections::BTreeMap;
use std::fmt;

// external crates
use serde::{Deserialize, Serialize};

/// How serious a [Diagnostic] is
///
/// Variants are ordered from most to least severe, which is the order the
/// final report is sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The deck could not be read at all
    Fatal,
    /// The deck is semantically invalid
    Error,
    /// The deck may be valid but looks suspicious
    Warning,
    /// Informational summary
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        write!(f, "{s}")
    }
}

/// Diagnostic codes
///
/// The serialised names (e.g. `FILL_ARRAY_CARDINALITY`) are stable and safe to
/// match on in downstream tooling. Every code has a fixed [Severity].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    // fatal
    MissingTitle,
    BadBlockSeparator,
    EmptyBlock,
    IoError,

    // error
    ParseNumber,
    ParseTokenCount,
    ParseMaterialZaid,
    ParseFillArrayCardinality,
    DuplicateEntityNumber,
    UndefinedSurface,
    UndefinedMaterial,
    UndefinedTransform,
    UndefinedUniverse,
    UndefinedTallyEntity,
    UndefinedCell,
    SurfaceCoeffCount,
    LatticeKind,
    LatticeSurfaceCount,
    FillArrayCardinality,
    CircularUniverse,
    BadVolume,
    TransformInvalid,
    MaterialMixedFractions,
    TallyKind,

    // warning
    UnusedSurface,
    UnusedMaterial,
    UnusedTransform,
    UnusedUniverse,
    UniverseUnreachable,
    DeepNesting,
    TransformNotOrthonormal,
    TransformReflection,
    UnknownDataCard,

    // info
    MaxDepth,
    EntityCounts,
}

impl Code {
    /// The fixed severity of the code
    ///
    /// ```rust
    /// # use mcnptools_deck::{Code, Severity};
    /// assert_eq!(Code::EmptyBlock.severity(), Severity::Fatal);
    /// assert_eq!(Code::CircularUniverse.severity(), Severity::Error);
    /// assert_eq!(Code::DeepNesting.severity(), Severity::Warning);
    /// assert_eq!(Code::MaxDepth.severity(), Severity::Info);
    /// ```
    pub fn severity(&self) -> Severity {
        use Code::*;
        match self {
            MissingTitle | BadBlockSeparator | EmptyBlock | IoError => Severity::Fatal,
            UnusedSurface
            | UnusedMaterial
            | UnusedTransform
            | UnusedUniverse
            | UniverseUnreachable
            | DeepNesting
            | TransformNotOrthonormal
            | TransformReflection
            | UnknownDataCard => Severity::Warning,
            MaxDepth | EntityCounts => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// Contractual name of the code, as it appears in reports
    pub fn as_str(&self) -> &'static str {
        use Code::*;
        match self {
            MissingTitle => "MISSING_TITLE",
            BadBlockSeparator => "BAD_BLOCK_SEPARATOR",
            EmptyBlock => "EMPTY_BLOCK",
            IoError => "IO_ERROR",
            ParseNumber => "PARSE_NUMBER",
            ParseTokenCount => "PARSE_TOKEN_COUNT",
            ParseMaterialZaid => "PARSE_MATERIAL_ZAID",
            ParseFillArrayCardinality => "PARSE_FILL_ARRAY_CARDINALITY",
            DuplicateEntityNumber => "DUPLICATE_ENTITY_NUMBER",
            UndefinedSurface => "UNDEFINED_SURFACE",
            UndefinedMaterial => "UNDEFINED_MATERIAL",
            UndefinedTransform => "UNDEFINED_TRANSFORM",
            UndefinedUniverse => "UNDEFINED_UNIVERSE",
            UndefinedTallyEntity => "UNDEFINED_TALLY_ENTITY",
            UndefinedCell => "UNDEFINED_CELL",
            SurfaceCoeffCount => "SURFACE_COEFF_COUNT",
            LatticeKind => "LATTICE_KIND",
            LatticeSurfaceCount => "LATTICE_SURFACE_COUNT",
            FillArrayCardinality => "FILL_ARRAY_CARDINALITY",
            CircularUniverse => "CIRCULAR_UNIVERSE",
            BadVolume => "BAD_VOLUME",
            TransformInvalid => "TRANSFORM_INVALID",
            MaterialMixedFractions => "MATERIAL_MIXED_FRACTIONS",
            TallyKind => "TALLY_KIND",
            UnusedSurface => "UNUSED_SURFACE",
            UnusedMaterial => "UNUSED_MATERIAL",
            UnusedTransform => "UNUSED_TRANSFORM",
            UnusedUniverse => "UNUSED_UNIVERSE",
            UniverseUnreachable => "UNIVERSE_UNREACHABLE",
            DeepNesting => "DEEP_NESTING",
            TransformNotOrthonormal => "TRANSFORM_NOT_ORTHONORMAL",
            TransformReflection => "TRANSFORM_REFLECTION",
            UnknownDataCard => "UNKNOWN_DATA_CARD",
            MaxDepth => "MAX_DEPTH",
            EntityCounts => "ENTITY_COUNTS",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Range of physical input lines, 1-based and inclusive
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Span {
    /// First physical line
    pub start: usize,
    /// Last physical line, equal to `start` for single line cards
    pub end: usize,
}

impl Span {
    /// Span covering lines `start` to `end`
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Span of a single line
    pub fn line(line: usize) -> Self {
        Self::new(line, line)
    }

    /// Extend the span to finish on `line`
    pub fn extend_to(&mut self, line: usize) {
        self.end = self.end.max(line);
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "line {}", self.start)
        } else {
            write!(f, "lines {}-{}", self.start, self.end)
        }
    }
}

/// A single finding about the deck
///
/// Carries the [Code], its [Severity], a human readable message, and where
/// possible the [Span] of the offending card. Numeric context useful to
/// tooling (expected/actual counts, entity numbers) is kept in `data`.
///
/// ```rust
/// # use mcnptools_deck::{Code, Diagnostic, Severity, Span};
/// let d = Diagnostic::new(Code::UndefinedSurface, Some(Span::line(2)), "cell 1: surface 2 is not defined")
///     .with("cell", 1)
///     .with("surface", 2);
///
/// assert_eq!(d.severity, Severity::Error);
/// assert_eq!(d.value("surface"), Some(2));
/// assert_eq!(d.to_string(), "error[UNDEFINED_SURFACE] line 2: cell 1: surface 2 is not defined");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Severity derived from the code
    pub severity: Severity,
    /// Contractual diagnostic code
    pub code: Code,
    /// Human readable description
    pub message: String,
    /// Originating lines, if the finding is tied to a card
    #[serde(rename = "source_span")]
    pub span: Option<Span>,
    /// Named numeric context, e.g. `expected`, `actual`, `diff`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<&'static str, i64>,
}

impl Diagnostic {
    /// New diagnostic with the severity implied by `code`
    pub fn new<S: Into<String>>(code: Code, span: Option<Span>, message: S) -> Self {
        Self {
            severity: code.severity(),
            code,
            message: message.into(),
            span,
            data: BTreeMap::new(),
        }
    }

    /// Attach a named value
    pub fn with<V: Into<i64>>(mut self, key: &'static str, value: V) -> Self {
        self.data.insert(key, value.into());
        self
    }

    /// Look up a named value
    pub fn value(&self, key: &str) -> Option<i64> {
        self.data.get(key).copied()
    }

    /// True for fatal and error severities
    pub fn is_error(&self) -> bool {
        self.severity <= Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.code)?;
        if let Some(span) = &self.span {
            write!(f, " {span}")?;
        }
        write!(f, ": {}", self.message)
    }
}
