//! Integration tests for complete decks

use std::collections::BTreeSet;

use mcnptools_deck::{analyze_file, AnalysisResult, Code, Severity};
use rstest::{fixture, rstest};

#[fixture]
fn simple() -> AnalysisResult {
    analyze_file("./data/decks/simple.i")
}

#[fixture]
fn pin_lattice() -> AnalysisResult {
    analyze_file("./data/decks/pin_lattice.i")
}

fn keys<V>(map: &std::collections::BTreeMap<u32, V>) -> BTreeSet<u32> {
    map.keys().copied().collect()
}

#[rstest]
fn minimal_valid_deck(simple: AnalysisResult) {
    assert!(!simple.has_errors());
    assert_eq!(simple.warnings().count(), 0);
    assert_eq!(simple.exit_code(), 0);

    let report = simple.universe_report.as_ref().unwrap();
    assert_eq!(report.max_depth, 0);
    assert_eq!(report.universes, BTreeSet::from([0]));

    let refs = simple.cross_refs.as_ref().unwrap();
    assert_eq!(keys(&refs.cells), BTreeSet::from([1, 2]));
    assert_eq!(keys(&refs.surfaces), BTreeSet::from([1]));
}

#[test]
fn undefined_surface_reference() {
    let result = analyze_file("./data/decks/undefined_surface.i");

    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, Code::UndefinedSurface);
    assert_eq!(errors[0].severity, Severity::Error);
    assert_eq!(errors[0].value("cell"), Some(1));
    assert_eq!(errors[0].value("surface"), Some(2));
    assert_eq!(result.exit_code(), 1);
}

#[test]
fn fill_array_cardinality_mismatch() {
    let result = analyze_file("./data/decks/fill_array.i");

    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].code, Code::FillArrayCardinality);
    assert_eq!(errors[0].value("cell"), Some(3));
    assert_eq!(errors[0].value("expected"), Some(9));
    assert_eq!(errors[0].value("actual"), Some(8));
    assert_eq!(errors[0].value("diff"), Some(-1));
}

#[test]
fn circular_universe_reference() {
    let result = analyze_file("./data/decks/circular.i");

    let cycles: Vec<_> = result.with_code(Code::CircularUniverse).collect();
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].message.contains("1 → 2 → 1"));
    assert_eq!(result.with_code(Code::DeepNesting).count(), 0);

    let report = result.universe_report.as_ref().unwrap();
    assert_eq!(report.cycles, vec![vec![1, 2, 1]]);
    assert!(!report.is_acyclic());
}

#[test]
fn lattice_surface_count_violation() {
    let result = analyze_file("./data/decks/lattice_surfaces.i");

    let found: Vec<_> = result.with_code(Code::LatticeSurfaceCount).collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value("kind"), Some(1));
    assert_eq!(found[0].value("expected"), Some(6));
    assert_eq!(found[0].value("actual"), Some(4));
}

#[test]
fn deep_nesting_advisory() {
    let result = analyze_file("./data/decks/deep_nesting.i");

    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    let warnings: Vec<_> = result.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, Code::DeepNesting);
    assert_eq!(warnings[0].value("max_depth"), Some(12));

    let report = result.universe_report.as_ref().unwrap();
    assert_eq!(report.max_depth, 12);
    assert_eq!(report.depth[&12], 12);
}

#[rstest]
fn pin_lattice_is_clean(pin_lattice: AnalysisResult) {
    assert!(!pin_lattice.has_errors(), "{:?}", pin_lattice.diagnostics);
    assert_eq!(pin_lattice.warnings().count(), 0, "{:?}", pin_lattice.diagnostics);
}

#[rstest]
fn pin_lattice_model(pin_lattice: AnalysisResult) {
    let deck = pin_lattice.deck.as_ref().unwrap();

    assert_eq!(deck.title, "3x3 pin lattice with one water hole");
    assert_eq!(deck.cells.len(), 6);
    assert_eq!(deck.surfaces.len(), 8);

    // like 2 but u=3 mat=0
    let hole = deck.cell(4).unwrap();
    assert_eq!(hole.universe(), 3);
    assert!(hole.is_void());
    assert_eq!(hole.density, None);
    assert_eq!(hole.region.text, deck.cell(2).unwrap().region.text);

    let fuel = deck.material(1).unwrap();
    assert_eq!(fuel.components.len(), 3);
    assert_eq!(fuel.components[2].zaid.z, 8);

    let lattice = deck.cell(3).unwrap();
    assert!(lattice.is_lattice());
    let array = lattice.params.fill.as_ref().and_then(|f| f.as_array()).unwrap();
    assert_eq!(array.get(0, 0, 0).map(|e| e.universe), Some(3));
    assert_eq!(array.get(-1, -1, 0).map(|e| e.universe), Some(1));
}

#[rstest]
fn pin_lattice_universes(pin_lattice: AnalysisResult) {
    let report = pin_lattice.universe_report.as_ref().unwrap();

    assert_eq!(report.universes, BTreeSet::from([0, 1, 2, 3]));
    assert_eq!(report.depth[&2], 1);
    assert_eq!(report.depth[&1], 2);
    assert_eq!(report.max_depth, 2);
    assert_eq!(report.fills[&2][&1], 8);
    assert_eq!(report.instances[&1], 8);
    assert_eq!(report.instances[&3], 1);

    let refs = pin_lattice.cross_refs.as_ref().unwrap();
    assert_eq!(refs.universes[&1], vec![1, 2]);
    assert_eq!(refs.surface_users[&1], vec![1, 2, 4]);
    assert_eq!(refs.material_users[&2], vec![2]);
}

#[rstest]
fn pin_lattice_reports(pin_lattice: AnalysisResult) {
    let text = pin_lattice.render_text();
    assert!(text.starts_with("3x3 pin lattice with one water hole\n"));
    assert!(text.contains("info[MAX_DEPTH]: maximum universe nesting depth is 2"));
    assert!(text.ends_with("0 errors, 0 warnings\n"));

    let json: serde_json::Value = serde_json::from_str(&pin_lattice.to_json().unwrap()).unwrap();
    assert_eq!(json["universe_report"]["max_depth"], 2);
    assert_eq!(json["diagnostics"][1]["code"], "ENTITY_COUNTS");
    assert_eq!(json["diagnostics"][1]["data"]["cells"], 6);
}

#[test]
fn missing_file_is_fatal() {
    let result = analyze_file("./data/decks/not_a_deck.i");

    assert!(result.is_fatal());
    assert_eq!(result.diagnostics[0].code, Code::IoError);
    assert_eq!(result.exit_code(), 1);
}
