//! Local checks on lattices, fills, volumes, surfaces and transforms

// standard library
use std::collections::BTreeMap;

// external crates
use itertools::Itertools;
use log::debug;
use nalgebra::{Matrix3, Vector3};

// mcnptools modules
use mcnptools_utils::{f, ValueExt};

// crate modules
use crate::core::{Cell, FillArray, Payload, Surface, Transform};
use crate::diagnostic::{Code, Diagnostic, Span};
use crate::Deck;

/// Bounding surface terms required for each lattice type
const LATTICE_SURFACES: [(i32, usize); 2] = [(1, 6), (2, 8)];

/// Run every geometry check over the deck, in source order
pub(crate) fn validate(deck: &Deck, tolerance: f64) -> Vec<Diagnostic> {
    debug!("Validating geometry with tolerance {}", tolerance.sci(1, 2));
    let mut diagnostics = Vec::new();

    let surfaces: BTreeMap<u32, &Surface> = deck.surfaces.iter().map(|s| (s.number, s)).collect();

    for cell in &deck.cells {
        diagnostics.extend(check_lattice(&surfaces, cell));
        if let Some(array) = cell.params.fill.as_ref().and_then(|f| f.as_array()) {
            diagnostics.extend(check_fill_array(cell, array));
        }
        diagnostics.extend(check_volume(cell));
        diagnostics.extend(check_inline_transforms(cell, tolerance));
    }

    for surface in &deck.surfaces {
        diagnostics.extend(check_coefficients(surface));
    }

    for card in &deck.data {
        if let Payload::Transform(transform) = &card.payload {
            let name = f!("transform {}", transform.number);
            diagnostics.extend(check_rotation(transform, &name, card.span, tolerance));
        }
    }

    diagnostics
}

/// Lattice type and number of bounding surface terms
///
/// Each half-space term counts once, except a whole `rpp`/`box` or
/// `rhp`/`hex` macrobody which stands in for all of its planes.
fn check_lattice(surfaces: &BTreeMap<u32, &Surface>, cell: &Cell) -> Option<Diagnostic> {
    let kind = cell.params.lattice?;
    let c = cell.number;

    let Some((_, expected)) = LATTICE_SURFACES.iter().find(|(k, _)| *k == kind) else {
        return Some(
            Diagnostic::new(
                Code::LatticeKind,
                Some(cell.span),
                f!("cell {c}: lattice type {kind} is not 1 or 2"),
            )
            .with("cell", c)
            .with("kind", kind),
        );
    };

    let actual: usize = cell
        .region
        .surfaces
        .iter()
        .map(|term| match (term.facet, surfaces.get(&term.id)) {
            (None, Some(surface)) => surface.kind.lattice_planes(),
            _ => 1,
        })
        .sum();

    if actual == *expected {
        return None;
    }

    Some(
        Diagnostic::new(
            Code::LatticeSurfaceCount,
            Some(cell.span),
            f!("cell {c}: lat={kind} needs {expected} bounding surfaces, found {actual}"),
        )
        .with("cell", c)
        .with("kind", kind)
        .with("expected", *expected as i64)
        .with("actual", actual as i64),
    )
}

/// Number of values in an array fill against the declared index ranges
fn check_fill_array(cell: &Cell, array: &FillArray) -> Option<Diagnostic> {
    let c = cell.number;
    let actual = array.entries.len() as i64;

    let ranges = || {
        array
            .ranges
            .iter()
            .map(|(lo, hi)| f!("{lo}:{hi}"))
            .join(" ")
    };

    if !array.has_positive_widths() {
        return Some(
            Diagnostic::new(
                Code::FillArrayCardinality,
                Some(cell.span),
                f!("cell {c}: fill array ranges {} must all have positive widths", ranges()),
            )
            .with("cell", c)
            .with("actual", actual),
        );
    }

    let Some(expected) = array.expected_len().and_then(|n| i64::try_from(n).ok()) else {
        return Some(
            Diagnostic::new(
                Code::FillArrayCardinality,
                Some(cell.span),
                f!("cell {c}: fill array ranges {} declare too many values to count", ranges()),
            )
            .with("cell", c)
            .with("actual", actual),
        );
    };

    if expected == actual {
        return None;
    }

    let [wi, wj, wk] = array.widths();
    let diff = actual - expected;
    Some(
        Diagnostic::new(
            Code::FillArrayCardinality,
            Some(cell.span),
            f!("cell {c}: fill array declares {wi}×{wj}×{wk} = {expected} values, found {actual} (diff {diff})"),
        )
        .with("cell", c)
        .with("expected", expected)
        .with("actual", actual)
        .with("diff", diff),
    )
}

fn check_volume(cell: &Cell) -> Option<Diagnostic> {
    let volume = cell.params.volume?;
    if volume > 0.0 {
        return None;
    }

    Some(
        Diagnostic::new(
            Code::BadVolume,
            Some(cell.span),
            f!(
                "cell {}: volume must be positive, found {}",
                cell.number,
                volume.sci(5, 2)
            ),
        )
        .with("cell", cell.number),
    )
}

/// Rotation checks on transforms written inline with `trcl` or `fill`
fn check_inline_transforms(cell: &Cell, tolerance: f64) -> Vec<Diagnostic> {
    let c = cell.number;
    let mut specs = Vec::new();
    if let Some(spec) = &cell.params.transform {
        specs.push(("trcl", spec));
    }
    if let Some(fill) = &cell.params.fill {
        specs.extend(fill.transforms().into_iter().map(|spec| ("fill", spec)));
    }

    specs
        .into_iter()
        .filter_map(|(keyword, spec)| Some((keyword, spec.to_transform()?)))
        .flat_map(|(keyword, transform)| {
            check_rotation(&transform, &f!("cell {c}: {keyword} transform"), cell.span, tolerance)
        })
        .collect()
}

fn check_coefficients(surface: &Surface) -> Option<Diagnostic> {
    let expected = surface.kind.expected_coefficients()?;
    let actual = surface.coefficients.len();
    if expected.contains(&actual) {
        return None;
    }

    Some(
        Diagnostic::new(
            Code::SurfaceCoeffCount,
            Some(surface.span),
            f!(
                "surface {}: '{}' takes {} coefficients, found {actual}",
                surface.number,
                surface.kind,
                expected.iter().join(" or ")
            ),
        )
        .with("surface", surface.number)
        .with("expected", expected[0] as i64)
        .with("actual", actual as i64),
    )
}

/// Orthonormality and determinant of a rotation matrix
///
/// A determinant that is not ±1 makes the transform unusable. Otherwise the
/// rows must be unit length and mutually orthogonal, and a determinant of -1
/// is flagged as a reflection.
fn check_rotation(
    transform: &Transform,
    name: &str,
    span: Span,
    tolerance: f64,
) -> Vec<Diagnostic> {
    let Some(matrix) = transform.rotation_matrix() else {
        return Vec::new();
    };

    let mut diagnostics = Vec::new();
    let det = matrix.determinant();
    let number = transform.number;

    if (det.abs() - 1.0).abs() > tolerance {
        diagnostics.push(
            Diagnostic::new(
                Code::TransformInvalid,
                Some(span),
                f!("{name}: rotation determinant {} is not ±1", det.sci(5, 2)),
            )
            .with("transform", number),
        );
        return diagnostics;
    }

    if !is_orthonormal(&matrix, tolerance) {
        diagnostics.push(
            Diagnostic::new(
                Code::TransformNotOrthonormal,
                Some(span),
                f!("{name}: rotation rows are not orthonormal"),
            )
            .with("transform", number),
        );
    }

    if det < 0.0 {
        diagnostics.push(
            Diagnostic::new(
                Code::TransformReflection,
                Some(span),
                f!("{name}: rotation has determinant -1 and is a reflection"),
            )
            .with("transform", number),
        );
    }

    diagnostics
}

fn is_orthonormal(matrix: &Matrix3<f64>, tolerance: f64) -> bool {
    let rows: [Vector3<f64>; 3] = [0, 1, 2].map(|i| matrix.row(i).transpose());
    let unit = rows.iter().all(|r| (r.norm() - 1.0).abs() <= tolerance);
    let orthogonal = rows
        .iter()
        .tuple_combinations()
        .all(|(a, b)| a.dot(b).abs() <= tolerance);
    unit && orthogonal
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f64 = 1e-6;

    fn diagnostics(cells: &str, surfaces: &str, data: &str) -> Vec<Diagnostic> {
        let data = match data {
            "" => String::new(),
            card => f!("{card}\n"),
        };
        let text = f!("geometry\n{cells}\n\n{surfaces}\n\n{data}nps 1\n");
        validate(&Deck::from_text(&text).unwrap(), EPS)
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<Code> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[rstest]
    #[case("1 0 -1 2 -3 4 -5 6 lat=1", None)]
    #[case("1 0 -1 2 -3 4 lat=1", Some(4))]
    #[case("1 0 -1 2 -3 4 -5 6 -7 8 lat=2", None)]
    #[case("1 0 -1 2 -3 4 -5 6 lat=2", Some(6))]
    #[case("1 0 -10 lat=1", None)]
    #[case("1 0 -10.1 lat=1", Some(1))]
    fn lattice_surfaces(#[case] cell: &str, #[case] actual: Option<i64>) {
        let surfaces = "1 px 0\n2 px 1\n3 py 0\n4 py 1\n5 pz 0\n6 pz 1\n7 pz 2\n8 pz 3\n10 rpp 0 1 0 1 0 1";
        let found = diagnostics(cell, surfaces, "");
        match actual {
            None => assert!(found.is_empty(), "{found:?}"),
            Some(actual) => {
                assert_eq!(codes(&found), vec![Code::LatticeSurfaceCount]);
                assert_eq!(found[0].value("actual"), Some(actual));
            }
        }
    }

    #[test]
    fn lattice_kind() {
        let found = diagnostics("1 0 -1 lat=3", "1 so 1", "");
        assert_eq!(codes(&found), vec![Code::LatticeKind]);
        assert_eq!(found[0].value("kind"), Some(3));
    }

    #[test]
    fn fill_cardinality() {
        let cell = "100 0 -1 lat=1 u=1 fill=-1:1 -1:1 0:0 1 1 1 1 1 1 1 1";
        let found = diagnostics(cell, "1 rpp -1 1 -1 1 -1 1", "");

        assert_eq!(codes(&found), vec![Code::FillArrayCardinality]);
        assert_eq!(
            found[0].message,
            "cell 100: fill array declares 3×3×1 = 9 values, found 8 (diff -1)"
        );
        assert_eq!(found[0].value("expected"), Some(9));
        assert_eq!(found[0].value("actual"), Some(8));
        assert_eq!(found[0].value("diff"), Some(-1));
    }

    #[test]
    fn fill_with_negative_width() {
        let found = diagnostics("1 0 -1 lat=1 fill=1:0 0:0 0:0 1", "1 rpp -1 1 -1 1 -1 1", "");
        assert_eq!(codes(&found), vec![Code::FillArrayCardinality]);
        assert_eq!(found[0].value("expected"), None);
    }

    #[test]
    fn fill_with_huge_ranges() {
        let full = "-2147483648:2147483647";
        let cell = f!("3 0 -10 lat=1 u=1 fill={full} {full} {full} 1");
        let found = diagnostics(&cell, "10 rpp 0 1 0 1 0 1", "");

        assert_eq!(codes(&found), vec![Code::FillArrayCardinality]);
        assert!(found[0].message.contains("too many values"), "{}", found[0].message);
        assert_eq!(found[0].value("actual"), Some(1));
        assert_eq!(found[0].value("expected"), None);
    }

    #[test]
    fn volumes() {
        let found = diagnostics("1 0 -1 vol=0\n2 0 1 vol=2.5", "1 so 1", "");
        assert_eq!(codes(&found), vec![Code::BadVolume]);
        assert_eq!(found[0].value("cell"), Some(1));
    }

    #[rstest]
    #[case("1 so 1 2", Some(1))]
    #[case("1 p 1 0 0 2", None)]
    #[case("1 p 1 0 0", Some(4))]
    #[case("1 c/z 0 0", Some(3))]
    #[case("1 rpp 0 1 0 1 0 1", None)]
    #[case("1 zz 1 2 3", None)]
    fn coefficient_counts(#[case] surface: &str, #[case] expected: Option<i64>) {
        let found = diagnostics("1 0 -1", surface, "");
        match expected {
            None => assert!(found.is_empty(), "{found:?}"),
            Some(expected) => {
                assert_eq!(codes(&found), vec![Code::SurfaceCoeffCount]);
                assert_eq!(found[0].value("expected"), Some(expected));
            }
        }
    }

    #[rstest]
    #[case("tr1 0 0 0 1 0 0 0 1 0 0 0 1", vec![])]
    #[case("*tr1 0 0 0 0 90 90 90 0 90 90 90 0", vec![])]
    #[case("tr1 0 0 0 1 0 0 0 1 0 0 0 -1", vec![Code::TransformReflection])]
    #[case("tr1 0 0 0 1 1 0 0 1 0 0 0 1", vec![Code::TransformNotOrthonormal])]
    #[case("tr1 0 0 0 2 0 0 0 1 0 0 0 1", vec![Code::TransformInvalid])]
    #[case("tr1 1 2 3", vec![])]
    fn transforms(#[case] card: &str, #[case] expected: Vec<Code>) {
        let found = diagnostics("1 0 -1", "1 so 1", card);
        assert_eq!(codes(&found), expected);
    }

    #[test]
    fn inline_transforms() {
        let found = diagnostics(
            "1 0 -1 trcl=(0 0 0 1 0 0 0 1 0 0 0 -1)\n2 0 1 fill=3 (0 0 0 2 0 0 0 1 0 0 0 1)",
            "1 so 1",
            "",
        );
        assert_eq!(
            codes(&found),
            vec![Code::TransformReflection, Code::TransformInvalid]
        );
        assert!(found[0].message.starts_with("cell 1: trcl transform"));
        assert!(found[1].message.starts_with("cell 2: fill transform"));
    }
}
