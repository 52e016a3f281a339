//! Cross reference tables and dangling reference checks

// standard library
use std::collections::{BTreeMap, BTreeSet};

// external crates
use log::{debug, trace};
use serde::Serialize;

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::core::{Cell, DataCard, Entity, Fill, Payload, Surface, TransformSpec};
use crate::diagnostic::{Code, Diagnostic, Span};
use crate::Deck;

/// Cross reference tables for every numbered entity in a deck
///
/// Definitions map the entity number to the span it was defined on. The
/// `*_users` tables map an entity to the cells that refer to it, in source
/// order and without repeats.
///
/// Universe 0 always exists and holds every cell without an explicit `u=`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrossRefs {
    /// Cell definitions
    pub cells: BTreeMap<u32, Span>,
    /// Surface definitions
    pub surfaces: BTreeMap<u32, Span>,
    /// Material definitions
    pub materials: BTreeMap<u32, Span>,
    /// Transform definitions
    pub transforms: BTreeMap<u32, Span>,
    /// Tally definitions
    pub tallies: BTreeMap<u32, Span>,
    /// Cells in each universe
    pub universes: BTreeMap<u32, Vec<u32>>,
    /// Cells whose region uses each surface
    pub surface_users: BTreeMap<u32, Vec<u32>>,
    /// Cells made of each material
    pub material_users: BTreeMap<u32, Vec<u32>>,
    /// Surfaces never referenced
    pub unused_surfaces: Vec<u32>,
    /// Materials no cell is made of
    pub unused_materials: Vec<u32>,
    /// Transforms never referenced
    pub unused_transforms: Vec<u32>,
    /// Universes other than 0 that are never filled into anything
    pub unused_universes: Vec<u32>,
}

impl CrossRefs {
    /// True if any cell belongs to universe `u`, or `u` is the real world
    pub fn has_universe(&self, u: u32) -> bool {
        u == 0 || self.universes.contains_key(&u)
    }
}

/// Build the cross reference tables and report everything left dangling
pub(crate) fn resolve(deck: &Deck) -> (CrossRefs, Vec<Diagnostic>) {
    debug!("Resolving cross references");
    let mut resolver = Resolver::new(deck);

    for cell in &deck.cells {
        resolver.resolve_cell(cell);
    }
    for surface in &deck.surfaces {
        resolver.resolve_surface(surface);
    }
    for card in &deck.data {
        resolver.resolve_data(card);
    }

    resolver.report_unused();
    (resolver.refs, resolver.diagnostics)
}

/// Working state while resolving
struct Resolver<'a> {
    deck: &'a Deck,
    refs: CrossRefs,
    diagnostics: Vec<Diagnostic>,
    used_surfaces: BTreeSet<u32>,
    used_transforms: BTreeSet<u32>,
    filled: BTreeSet<u32>,
}

impl<'a> Resolver<'a> {
    fn new(deck: &'a Deck) -> Self {
        let mut refs = CrossRefs::default();

        for cell in &deck.cells {
            refs.cells.insert(cell.number, cell.span);
            refs.universes
                .entry(cell.universe())
                .or_default()
                .push(cell.number);
        }
        refs.universes.entry(0).or_default();

        for surface in &deck.surfaces {
            refs.surfaces.insert(surface.number, surface.span);
        }

        for card in &deck.data {
            match &card.payload {
                Payload::Material(m) => refs.materials.insert(m.number, m.span),
                Payload::Transform(t) => refs.transforms.insert(t.number, t.span),
                Payload::Tally(t) => refs.tallies.insert(t.number, t.span),
                _ => None,
            };
        }

        trace!("{} universes defined", refs.universes.len());
        Self {
            deck,
            refs,
            diagnostics: Vec::new(),
            used_surfaces: BTreeSet::new(),
            used_transforms: BTreeSet::new(),
            filled: BTreeSet::new(),
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        trace!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    fn resolve_cell(&mut self, cell: &Cell) {
        let c = cell.number;
        let span = Some(cell.span);

        let mut seen = BTreeSet::new();
        for id in cell.region.surfaces.iter().map(|s| s.id) {
            if !seen.insert(id) {
                continue;
            }
            self.used_surfaces.insert(id);
            self.refs.surface_users.entry(id).or_default().push(c);
            if !self.refs.surfaces.contains_key(&id) {
                self.report(
                    Diagnostic::new(
                        Code::UndefinedSurface,
                        span,
                        f!("cell {c}: surface {id} is not defined"),
                    )
                    .with("cell", c)
                    .with("surface", id),
                );
            }
        }

        for &other in &cell.region.complements {
            if !self.refs.cells.contains_key(&other) {
                self.report(
                    Diagnostic::new(
                        Code::UndefinedCell,
                        span,
                        f!("cell {c}: complement #{other} refers to an undefined cell"),
                    )
                    .with("cell", other),
                );
            }
        }

        if cell.material != 0 {
            let m = cell.material;
            self.refs.material_users.entry(m).or_default().push(c);
            if !self.refs.materials.contains_key(&m) {
                self.report(
                    Diagnostic::new(
                        Code::UndefinedMaterial,
                        span,
                        f!("cell {c}: material {m} is not defined"),
                    )
                    .with("cell", c)
                    .with("material", m),
                );
            }
        }

        if let Some(spec) = &cell.params.transform {
            self.transform_spec(spec, &f!("cell {c}: trcl"), span);
        }

        if let Some(fill) = &cell.params.fill {
            self.resolve_fill(cell, fill);
        }
    }

    fn resolve_fill(&mut self, cell: &Cell, fill: &Fill) {
        let c = cell.number;
        let owner = cell.universe();
        let is_array = matches!(fill, Fill::Array(_));

        let targets: BTreeSet<u32> = fill.targets().into_iter().collect();
        for u in targets {
            // lattice elements may hold the lattice cell itself
            if !(is_array && u == owner) {
                self.filled.insert(u);
            }
            if !self.refs.has_universe(u) {
                self.report(
                    Diagnostic::new(
                        Code::UndefinedUniverse,
                        Some(cell.span),
                        f!("cell {c}: fill universe {u} is not defined"),
                    )
                    .with("cell", c)
                    .with("universe", u),
                );
            }
        }

        for spec in fill.transforms() {
            self.transform_spec(spec, &f!("cell {c}: fill"), Some(cell.span));
        }
    }

    /// Check a transform reference, inline transforms are left to geometry
    fn transform_spec(&mut self, spec: &TransformSpec, context: &str, span: Option<Span>) {
        if let Some(n) = spec.reference() {
            self.transform_number(n, context, span);
        }
    }

    fn transform_number(&mut self, n: u32, context: &str, span: Option<Span>) {
        self.used_transforms.insert(n);
        if !self.refs.transforms.contains_key(&n) {
            self.report(
                Diagnostic::new(
                    Code::UndefinedTransform,
                    span,
                    f!("{context}: transform {n} is not defined"),
                )
                .with("transform", n),
            );
        }
    }

    fn resolve_surface(&mut self, surface: &Surface) {
        let s = surface.number;
        let span = Some(surface.span);

        if let Some(n) = surface.transform_ref() {
            self.transform_number(n, &f!("surface {s}"), span);
        }

        if let Some(partner) = surface.periodic_partner() {
            self.used_surfaces.insert(partner);
            if !self.refs.surfaces.contains_key(&partner) {
                self.report(
                    Diagnostic::new(
                        Code::UndefinedSurface,
                        span,
                        f!("surface {s}: periodic partner surface {partner} is not defined"),
                    )
                    .with("surface", partner),
                );
            }
        }
    }

    fn resolve_data(&mut self, card: &DataCard) {
        let span = Some(card.span);
        match &card.payload {
            Payload::Thermal(thermal) => {
                let m = thermal.material;
                if !self.refs.materials.contains_key(&m) {
                    self.report(
                        Diagnostic::new(
                            Code::UndefinedMaterial,
                            span,
                            f!("mt{m}: material {m} is not defined"),
                        )
                        .with("material", m),
                    );
                }
            }
            Payload::Tally(tally) => {
                let mut seen = BTreeSet::new();
                for bin in &tally.bins {
                    if !seen.insert((bin.entity, bin.id)) {
                        continue;
                    }
                    let (defined, key) = match bin.entity {
                        Entity::Cell => (self.refs.cells.contains_key(&bin.id), "cell"),
                        Entity::Surface => {
                            self.used_surfaces.insert(bin.id);
                            (self.refs.surfaces.contains_key(&bin.id), "surface")
                        }
                        Entity::Point => continue,
                    };
                    if !defined {
                        self.report(
                            Diagnostic::new(
                                Code::UndefinedTallyEntity,
                                span,
                                f!(
                                    "tally {}: {} {} is not defined",
                                    tally.number,
                                    bin.entity,
                                    bin.id
                                ),
                            )
                            .with("tally", tally.number)
                            .with(key, bin.id),
                        );
                    }
                }
            }
            Payload::Sdef(groups) => {
                for (keyword, values) in groups {
                    // distributions such as cel=d1 are not references
                    let Some(n) = values.first().and_then(|v| v.parse::<u32>().ok()) else {
                        continue;
                    };
                    match keyword.as_str() {
                        "cel" => self.sdef_entity(Code::UndefinedCell, "cel", n, span),
                        "sur" if n > 0 => {
                            self.used_surfaces.insert(n);
                            self.sdef_entity(Code::UndefinedSurface, "sur", n, span)
                        }
                        "tr" => self.transform_number(n, "sdef", span),
                        _ => (),
                    }
                }
            }
            Payload::Importance(values) => {
                let cells = self.deck.cells.len();
                if values.len() != cells {
                    self.report(
                        Diagnostic::new(
                            Code::ParseTokenCount,
                            span,
                            f!(
                                "{}: {} entries given for {cells} cells",
                                card.name(),
                                values.len()
                            ),
                        )
                        .with("expected", cells as i64)
                        .with("actual", values.len() as i64),
                    );
                }
            }
            _ => (),
        }
    }

    fn sdef_entity(&mut self, code: Code, keyword: &str, n: u32, span: Option<Span>) {
        let defined = match code {
            Code::UndefinedCell => self.refs.cells.contains_key(&n),
            _ => self.refs.surfaces.contains_key(&n),
        };
        if !defined {
            let key = match code {
                Code::UndefinedCell => "cell",
                _ => "surface",
            };
            self.report(
                Diagnostic::new(code, span, f!("sdef: {keyword}={n} is not defined")).with(key, n),
            );
        }
    }

    /// Unused entities, grouped by kind and in entity order
    fn report_unused(&mut self) {
        self.refs.unused_surfaces = unused(&self.refs.surfaces, &self.used_surfaces);
        let used_materials: BTreeSet<u32> = self.refs.material_users.keys().copied().collect();
        self.refs.unused_materials = unused(&self.refs.materials, &used_materials);
        self.refs.unused_transforms = unused(&self.refs.transforms, &self.used_transforms);
        self.refs.unused_universes = self
            .refs
            .universes
            .keys()
            .filter(|u| **u != 0 && !self.filled.contains(u))
            .copied()
            .collect();

        for s in self.refs.unused_surfaces.clone() {
            let span = self.refs.surfaces.get(&s).copied();
            self.report(
                Diagnostic::new(Code::UnusedSurface, span, f!("surface {s} is never used"))
                    .with("surface", s),
            );
        }

        for m in self.refs.unused_materials.clone() {
            let span = self.refs.materials.get(&m).copied();
            self.report(
                Diagnostic::new(
                    Code::UnusedMaterial,
                    span,
                    f!("material {m} is not used by any cell"),
                )
                .with("material", m),
            );
        }

        for t in self.refs.unused_transforms.clone() {
            let span = self.refs.transforms.get(&t).copied();
            self.report(
                Diagnostic::new(Code::UnusedTransform, span, f!("transform {t} is never used"))
                    .with("transform", t),
            );
        }

        for u in self.refs.unused_universes.clone() {
            let span = self
                .refs
                .universes
                .get(&u)
                .and_then(|cells| cells.first())
                .and_then(|c| self.refs.cells.get(c))
                .copied();
            self.report(
                Diagnostic::new(
                    Code::UnusedUniverse,
                    span,
                    f!("universe {u} is never filled into another cell"),
                )
                .with("universe", u),
            );
        }
    }
}

/// Defined entities missing from the used set, in entity order
fn unused(defined: &BTreeMap<u32, Span>, used: &BTreeSet<u32>) -> Vec<u32> {
    defined
        .keys()
        .filter(|n| !used.contains(n))
        .copied()
        .collect()
}
