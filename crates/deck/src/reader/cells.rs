// standard library
use std::collections::{BTreeMap, BTreeSet};

// external crates
use itertools::Itertools;
use log::{debug, trace};

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use super::Reader;
use crate::core::Cell;
use crate::diagnostic::{Code, Diagnostic, Span};
use crate::lexer::LogicalLine;
use crate::parsers::{parse_cell, parse_float, parse_int, ParseFailure};

/// Why a `LIKE m BUT` chain could not be followed
enum LikeFailure {
    Missing(u32),
    Loop(Vec<u32>),
}

impl Reader {
    pub(super) fn read_cells(&mut self, lines: &[LogicalLine]) {
        debug!("---------------------");
        debug!(" Parsing cell block ");
        debug!("---------------------");

        let mut seen: BTreeMap<u32, Span> = BTreeMap::new();
        let mut cells: Vec<Cell> = Vec::with_capacity(lines.len());

        for line in lines {
            trace!("{:?} {}", line.span, line.text);
            let (mut cell, issues) = match parse_cell(&line.text) {
                Ok(parsed) => parsed,
                Err(failure) => {
                    self.failure(failure, line.span);
                    continue;
                }
            };

            for issue in issues {
                self.failure(issue, line.span);
            }

            if let Some(first) = seen.get(&cell.number) {
                self.duplicate("cell", cell.number, line.span, *first);
                continue;
            }

            cell.span = line.span;
            seen.insert(cell.number, line.span);
            cells.push(cell);
        }

        debug!("Read {} cells", cells.len());
        self.deck.cells = self.expand_like(cells);
    }

    /// Replace every `LIKE m BUT` cell with its full definition
    fn expand_like(&mut self, cells: Vec<Cell>) -> Vec<Cell> {
        let originals: BTreeMap<u32, Cell> = cells.iter().map(|c| (c.number, c.clone())).collect();

        cells
            .into_iter()
            .map(|cell| {
                let Some(base) = cell.like else {
                    return cell;
                };

                let mut resolved = match resolve_like(cell.number, &originals) {
                    Ok(resolved) => resolved,
                    Err(failure) => {
                        self.like_failure(&cell, failure);
                        return cell;
                    }
                };

                debug!("Cell {} expanded from cell {base}", cell.number);
                for issue in apply_overrides(&mut resolved) {
                    self.failure(issue.context(&f!("cell {}", cell.number)), cell.span);
                }
                resolved
            })
            .collect()
    }

    fn like_failure(&mut self, cell: &Cell, failure: LikeFailure) {
        let diagnostic = match failure {
            LikeFailure::Missing(base) => Diagnostic::new(
                Code::UndefinedCell,
                Some(cell.span),
                f!("cell {}: LIKE refers to undefined cell {base}", cell.number),
            )
            .with("cell", base),
            LikeFailure::Loop(chain) => Diagnostic::new(
                Code::UndefinedCell,
                Some(cell.span),
                f!(
                    "cell {}: LIKE chain never reaches a full definition ({})",
                    cell.number,
                    chain.iter().join(" -> ")
                ),
            )
            .with("cell", cell.number),
        };
        self.report(diagnostic);
    }
}

/// Follow a chain of `LIKE m BUT` cells down to a full definition
///
/// Overrides are merged from the base upwards, so the cell nearest the top of
/// the chain wins.
fn resolve_like(number: u32, cells: &BTreeMap<u32, Cell>) -> Result<Cell, LikeFailure> {
    let mut chain: Vec<&Cell> = Vec::new();
    let mut visited = BTreeSet::new();
    let mut current = number;

    let mut resolved = loop {
        let cell = cells.get(&current).ok_or(LikeFailure::Missing(current))?;
        let Some(base) = cell.like else {
            break cell.clone();
        };

        if !visited.insert(current) {
            let mut numbers: Vec<u32> = chain.iter().map(|c| c.number).collect();
            numbers.push(current);
            return Err(LikeFailure::Loop(numbers));
        }
        chain.push(cell);
        current = base;
    };

    for cell in chain.iter().rev() {
        resolved.number = cell.number;
        resolved.span = cell.span;
        resolved.like = cell.like;
        resolved.params.merge(&cell.params);
    }
    Ok(resolved)
}

/// Apply `mat=` and `rho=` overrides from the BUT clause
fn apply_overrides(cell: &mut Cell) -> Vec<ParseFailure> {
    let mut issues = Vec::new();
    let (overrides, other): (Vec<_>, Vec<_>) = cell
        .params
        .other
        .drain(..)
        .partition(|(key, _)| key == "mat" || key == "rho");
    cell.params.other = other;

    for (key, values) in overrides {
        let [value] = values.as_slice() else {
            issues.push(ParseFailure::token_count(f!(
                "'{key}' expects one value, found {}",
                values.len()
            )));
            continue;
        };

        match key.as_str() {
            "mat" => match parse_int(value).map(u32::try_from) {
                Ok(Ok(material)) => {
                    cell.material = material;
                    if material == 0 {
                        cell.density = None;
                    }
                }
                _ => issues.push(ParseFailure::number(value)),
            },
            _ => match parse_float(value) {
                Ok(density) => cell.density = Some(density),
                Err(e) => issues.push(e),
            },
        }
    }

    if cell.material != 0 && cell.density.is_none() {
        issues.push(ParseFailure::token_count(f!(
            "material {} has no density",
            cell.material
        )));
    }

    issues
}
