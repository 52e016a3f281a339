//! Universe containment graph, nesting depth and cycles

// standard library
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// external crates
use itertools::Itertools;
use log::{debug, trace};
use serde::Serialize;

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::core::{Cell, Fill};
use crate::diagnostic::{Code, Diagnostic, Span};
use crate::Deck;

/// Summary of the universe hierarchy
///
/// Nodes are universe 0, every `u=` value and every fill target, always by
/// absolute value. An edge `u -> v` exists when a cell in `u` is filled with
/// `v`, and counts the number of placements. Lattice elements that hold the
/// lattice's own universe are not edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UniverseReport {
    /// Every universe in the graph
    pub universes: BTreeSet<u32>,
    /// Shortest nesting depth from universe 0, for reachable universes only
    pub depth: BTreeMap<u32, usize>,
    /// Placements of each filled universe, by owner
    pub fills: BTreeMap<u32, BTreeMap<u32, usize>>,
    /// Owners of each filled universe
    pub filled_by: BTreeMap<u32, BTreeSet<u32>>,
    /// Largest finite depth
    pub max_depth: usize,
    /// Every distinct cycle as a closed path from its smallest universe
    pub cycles: Vec<Vec<u32>>,
    /// Universes not reachable from universe 0
    pub unreachable: Vec<u32>,
    /// Number of placements of each reachable universe in the real world,
    /// left empty if the graph has cycles
    pub instances: BTreeMap<u32, u64>,
}

impl UniverseReport {
    /// True if no universe contains itself
    pub fn is_acyclic(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Universes filled directly into `u`, with their placement counts
    pub fn children(&self, u: u32) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.fills
            .get(&u)
            .into_iter()
            .flat_map(|m| m.iter().map(|(v, n)| (*v, *n)))
    }

    /// Render a closed path with arrows
    ///
    /// ```rust
    /// # use mcnptools_deck::UniverseReport;
    /// assert_eq!(UniverseReport::format_path(&[1, 2, 1]), "1 → 2 → 1");
    /// ```
    pub fn format_path(path: &[u32]) -> String {
        path.iter().join(" → ")
    }
}

/// Build the universe graph and report cycles, unreachable universes and
/// excessive nesting
pub(crate) fn analyze(deck: &Deck, max_nesting: usize) -> (UniverseReport, Vec<Diagnostic>) {
    debug!("Analysing universe hierarchy");
    let graph = Graph::new(deck);
    let mut report = UniverseReport {
        universes: graph.nodes.clone(),
        fills: graph.fills.clone(),
        ..Default::default()
    };

    for (owner, targets) in &graph.fills {
        for target in targets.keys() {
            report.filled_by.entry(*target).or_default().insert(*owner);
        }
    }

    report.depth = graph.depths();
    report.max_depth = report.depth.values().copied().max().unwrap_or(0);
    report.unreachable = graph
        .nodes
        .iter()
        .filter(|u| !report.depth.contains_key(u))
        .copied()
        .collect();

    let cycles = graph.cycles();
    report.cycles = cycles.iter().map(|(path, _)| path.clone()).collect();
    if report.cycles.is_empty() {
        report.instances = graph.instances(&report.depth);
    }
    trace!("Universe depths {:?}", report.depth);

    let mut diagnostics = Vec::new();
    for (path, (owner, target)) in &cycles {
        let (cell, span) = graph.first_fill(*owner, *target);
        diagnostics.push(
            Diagnostic::new(
                Code::CircularUniverse,
                span,
                f!(
                    "universe cycle {} closed by the fill on cell {cell}",
                    UniverseReport::format_path(path)
                ),
            )
            .with("cell", cell)
            .with("universe", *target),
        );
    }

    for u in &report.unreachable {
        // never filled at all is reported as unused
        let Some((cell, span)) = graph.filled.get(u) else {
            continue;
        };
        diagnostics.push(
            Diagnostic::new(
                Code::UniverseUnreachable,
                Some(*span),
                f!("universe {u} is filled by cell {cell} but is not reachable from universe 0"),
            )
            .with("universe", *u),
        );
    }

    if report.max_depth > max_nesting {
        diagnostics.push(
            Diagnostic::new(
                Code::DeepNesting,
                None,
                f!(
                    "universe nesting depth {} exceeds the limit of {max_nesting}",
                    report.max_depth
                ),
            )
            .with("max_depth", report.max_depth as i64)
            .with("limit", max_nesting as i64),
        );
    }

    (report, diagnostics)
}

/// Fill graph with the cells that created each edge
struct Graph {
    nodes: BTreeSet<u32>,
    fills: BTreeMap<u32, BTreeMap<u32, usize>>,
    /// First cell, in source order, filling `owner` with `target`
    edge_cells: BTreeMap<(u32, u32), (u32, Span)>,
    /// First cell, in source order, filling each universe
    filled: BTreeMap<u32, (u32, Span)>,
}

impl Graph {
    fn new(deck: &Deck) -> Self {
        let mut graph = Self {
            nodes: BTreeSet::from([0]),
            fills: BTreeMap::new(),
            edge_cells: BTreeMap::new(),
            filled: BTreeMap::new(),
        };

        for cell in &deck.cells {
            graph.nodes.insert(cell.universe());
            if let Some(fill) = &cell.params.fill {
                graph.add_fill(cell, fill);
            }
        }

        graph
    }

    fn add_fill(&mut self, cell: &Cell, fill: &Fill) {
        let owner = cell.universe();
        let is_array = matches!(fill, Fill::Array(_));

        for target in fill.targets() {
            self.nodes.insert(target);
            if is_array && target == owner {
                continue;
            }

            *self
                .fills
                .entry(owner)
                .or_default()
                .entry(target)
                .or_default() += 1;
            self.edge_cells
                .entry((owner, target))
                .or_insert((cell.number, cell.span));
            self.filled
                .entry(target)
                .or_insert((cell.number, cell.span));
        }
    }

    fn targets(&self, u: u32) -> impl Iterator<Item = u32> + '_ {
        self.fills.get(&u).into_iter().flat_map(|m| m.keys().copied())
    }

    fn first_fill(&self, owner: u32, target: u32) -> (u32, Option<Span>) {
        match self.edge_cells.get(&(owner, target)) {
            Some((cell, span)) => (*cell, Some(*span)),
            None => (0, None),
        }
    }

    /// Breadth first depths from universe 0
    fn depths(&self) -> BTreeMap<u32, usize> {
        let mut depth = BTreeMap::from([(0, 0)]);
        let mut queue = VecDeque::from([0]);

        while let Some(u) = queue.pop_front() {
            let Some(&d) = depth.get(&u) else {
                continue;
            };
            for v in self.targets(u) {
                if !depth.contains_key(&v) {
                    depth.insert(v, d + 1);
                    queue.push_back(v);
                }
            }
        }

        depth
    }

    /// Distinct cycles with the edge that closed each of them
    fn cycles(&self) -> Vec<(Vec<u32>, (u32, u32))> {
        let mut search = CycleSearch {
            graph: self,
            colour: BTreeMap::new(),
            path: Vec::new(),
            found: Vec::new(),
        };

        // root first, so cycles are closed where they are entered from 0
        for u in std::iter::once(0).chain(self.nodes.iter().copied()) {
            if search.colour(u) == Colour::White {
                search.visit(u);
            }
        }

        search.found
    }

    /// Placements of each reachable universe, in topological order
    fn instances(&self, depth: &BTreeMap<u32, usize>) -> BTreeMap<u32, u64> {
        let mut indegree: BTreeMap<u32, usize> = self.nodes.iter().map(|u| (*u, 0)).collect();
        for targets in self.fills.values() {
            for v in targets.keys() {
                *indegree.entry(*v).or_default() += 1;
            }
        }

        let mut ready: BTreeSet<u32> = indegree
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(u, _)| *u)
            .collect();
        let mut instances: BTreeMap<u32, u64> = BTreeMap::from([(0, 1)]);

        while let Some(u) = ready.pop_first() {
            let count = instances.get(&u).copied().unwrap_or(0);
            for (v, n) in self.fills.get(&u).into_iter().flatten() {
                let placed = instances.entry(*v).or_default();
                *placed = placed.saturating_add(count.saturating_mul(*n as u64));
                if let Some(remaining) = indegree.get_mut(v) {
                    *remaining -= 1;
                    if *remaining == 0 {
                        ready.insert(*v);
                    }
                }
            }
        }

        instances.retain(|u, _| depth.contains_key(u));
        instances
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Depth first search with white/grey/black marking
struct CycleSearch<'a> {
    graph: &'a Graph,
    colour: BTreeMap<u32, Colour>,
    path: Vec<u32>,
    found: Vec<(Vec<u32>, (u32, u32))>,
}

impl CycleSearch<'_> {
    fn colour(&self, u: u32) -> Colour {
        self.colour.get(&u).copied().unwrap_or(Colour::White)
    }

    fn enter(&mut self, u: u32) {
        self.colour.insert(u, Colour::Grey);
        self.path.push(u);
    }

    /// Iterative visit from `root`, one frame per universe on the path
    fn visit(&mut self, root: u32) {
        let graph = self.graph;
        self.enter(root);
        let mut stack = vec![(root, graph.targets(root))];

        while let Some((u, targets)) = stack.last_mut() {
            let u = *u;
            match targets.next() {
                Some(v) => match self.colour(v) {
                    Colour::White => {
                        self.enter(v);
                        stack.push((v, graph.targets(v)));
                    }
                    Colour::Grey => self.record(u, v),
                    Colour::Black => (),
                },
                None => {
                    stack.pop();
                    self.path.pop();
                    self.colour.insert(u, Colour::Black);
                }
            }
        }
    }

    /// Grey to grey edge `u -> v`, the path from `v` back to itself is a cycle
    fn record(&mut self, u: u32, v: u32) {
        let Some(start) = self.path.iter().position(|w| *w == v) else {
            return;
        };

        let cycle = canonical(&self.path[start..]);
        if !self.found.iter().any(|(path, _)| *path == cycle) {
            debug!("Found universe cycle {}", UniverseReport::format_path(&cycle));
            self.found.push((cycle, (u, v)));
        }
    }
}

/// Rotate an open cycle to start at its smallest universe, then close it
fn canonical(cycle: &[u32]) -> Vec<u32> {
    let start = cycle.iter().position_min().unwrap_or(0);
    let mut path: Vec<u32> = cycle[start..].iter().chain(&cycle[..start]).copied().collect();
    if let Some(first) = path.first().copied() {
        path.push(first);
    }
    path
}
