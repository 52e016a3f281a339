//! Integration tests for properties that hold for any deck

use std::collections::BTreeSet;

use mcnptools_deck::{analyze, Analyzer, Code, Deck};
use rstest::rstest;

const CELLS: [&str; 6] = [
    "1 1 -10.4 -1 u=1 imp:n=1",
    "2 2 -1.0 1 u=1 imp:n=1",
    "3 0 -2 3 -4 5 -6 7 lat=1 u=2 imp:n=1 fill=0:1 0:1 0:0 1 1 1 1",
    "5 0 -10 fill=2 imp:n=1",
    "6 0 10 imp:n=0",
    "7 like 2 but u=4",
];

const SURFACES: [&str; 8] = [
    "1 cz 0.4",
    "2 px 1.26",
    "3 px 0",
    "4 py 1.26",
    "5 py 0",
    "6 pz 10",
    "7 pz -10",
    "10 rpp 0 2.52 0 2.52 -10 10",
];

const DATA: [&str; 4] = [
    "m1 92235.80c 0.05 92238.80c 0.95 8016.80c 2.0",
    "m2 1001.80c 2 8016.80c 1",
    "f4:n 1 2",
    "nps 100",
];

fn deck(cells: &[&str], surfaces: &[&str], data: &[&str]) -> String {
    format!(
        "property deck\n{}\n\n{}\n\n{}\n",
        cells.join("\n"),
        surfaces.join("\n"),
        data.join("\n")
    )
}

fn numbers(deck: &Deck) -> [BTreeSet<u32>; 3] {
    [
        deck.cells.iter().map(|c| c.number).collect(),
        deck.surfaces.iter().map(|s| s.number).collect(),
        deck.data.iter().filter_map(|d| d.number).collect(),
    ]
}

#[test]
fn analysis_is_deterministic() {
    let text = deck(&CELLS, &SURFACES, &DATA);
    let first = analyze(&text);
    let second = analyze(&text);

    assert_eq!(first, second);
    assert_eq!(first.render_text(), second.render_text());
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[rstest]
#[case(&["1 0 -1", "2 0 1"])]
#[case(&["1 0 -1 u=0", "2 0 1 u=0", "3 0 -1 1"])]
fn real_world_only_has_one_node(#[case] cells: &[&str]) {
    let result = analyze(&deck(cells, &["1 so 1"], &["nps 1"]));
    let report = result.universe_report.unwrap();

    assert_eq!(report.universes, BTreeSet::from([0]));
    assert_eq!(report.depth.get(&0), Some(&0));
    assert!(report.is_acyclic());
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
fn truncated_fill_array(#[case] missing: usize) {
    let truncated = format!(
        "3 0 -2 3 -4 5 -6 7 lat=1 u=2 imp:n=1 fill=0:1 0:1 0:0{}",
        " 1".repeat(4 - missing)
    );

    let mut cells = CELLS.to_vec();
    cells[2] = truncated.as_str();
    let result = analyze(&deck(&cells, &SURFACES, &DATA));

    let found: Vec<_> = result.with_code(Code::FillArrayCardinality).collect();
    match missing {
        0 => assert!(found.is_empty()),
        n => {
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].value("cell"), Some(3));
            assert_eq!(found[0].value("diff"), Some(-(n as i64)));
        }
    }
}

#[rstest]
#[case("8 0 -1 u=1 fill=2", 2)]
#[case("8 0 -1 u=2 fill=0", 0)]
#[case("8 0 -1 u=4 fill=4", 4)]
fn closing_a_cycle(#[case] extra: &str, #[case] target: u32) {
    let mut cells = CELLS.to_vec();
    cells.push(extra);
    let result = analyze(&deck(&cells, &SURFACES, &DATA));

    let report = result.universe_report.as_ref().unwrap();
    assert!(report.cycles.iter().any(|cycle| cycle.contains(&target)));
    assert!(result
        .with_code(Code::CircularUniverse)
        .any(|d| d.message.contains(&target.to_string())));
}

#[test]
fn entity_numbers_survive_permutation() {
    let original = Deck::from_text(&deck(&CELLS, &SURFACES, &DATA)).unwrap();

    let mut cells = CELLS;
    let mut surfaces = SURFACES;
    let mut data = DATA;
    cells.reverse();
    surfaces.rotate_left(3);
    data.swap(0, 2);
    let permuted = Deck::from_text(&deck(&cells, &surfaces, &data)).unwrap();

    assert_eq!(numbers(&original), numbers(&permuted));
    assert_eq!(permuted.cells[0].number, 7);
    assert_eq!(permuted.cell(7).map(|c| c.universe()), Some(4));
}

#[test]
fn warnings_never_change_the_exit_code() {
    let result = analyze(&deck(&CELLS, &SURFACES, &DATA));

    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(result.with_code(Code::UnusedUniverse).count(), 1);
    assert_eq!(result.exit_code(), 0);

    let mut analyzer = Analyzer::new();
    analyzer.suppress_warnings();
    assert!(analyzer.analyze(&deck(&CELLS, &SURFACES, &DATA)).diagnostics.is_empty());
}

#[test]
fn continuation_styles_agree() {
    let ampersand = "1 1 -10.4 -1 &\nu=1 imp:n=1";
    let indented = "1 1 -10.4 -1\n      u=1 imp:n=1";

    let a = Deck::from_text(&deck(&[ampersand, "6 0 1"], &["1 so 1"], &DATA[..2])).unwrap();
    let b = Deck::from_text(&deck(&[indented, "6 0 1"], &["1 so 1"], &DATA[..2])).unwrap();

    assert_eq!(a.cells[0].params, b.cells[0].params);
    assert_eq!(a.cells[0].region, b.cells[0].region);
    assert_eq!(a.cells[0].span, b.cells[0].span);
}

#[test]
fn cross_references_are_checked_everywhere() {
    let cells = ["1 3 -1.0 -1 9 #8 imp:n=1", "2 0 1 fill=6 imp:n=0"];
    let surfaces = ["1 2 so 1", "4 -5 px 0"];
    let data = ["f4:n 1 7", "mt3 lwtr.20t", "sdef cel=9", "nps 1"];
    let result = analyze(&deck(&cells, &surfaces, &data));

    let codes: BTreeSet<Code> = result.errors().map(|d| d.code).collect();
    assert_eq!(
        codes,
        BTreeSet::from([
            Code::UndefinedSurface,
            Code::UndefinedCell,
            Code::UndefinedMaterial,
            Code::UndefinedTransform,
            Code::UndefinedUniverse,
            Code::UndefinedTallyEntity,
        ])
    );
}

#[rstest]
#[case("m1 200001.80c 1", Code::ParseMaterialZaid)]
#[case("m1 1001.80c 1 8016.80c", Code::ParseTokenCount)]
#[case("m1 1001.80c 1 8016.80c -1", Code::MaterialMixedFractions)]
#[case("f13:n 1", Code::TallyKind)]
#[case("tr1 0 0 0 1 0 0 0 1 0 0 0 -1", Code::TransformReflection)]
fn data_card_problems(#[case] card: &str, #[case] code: Code) {
    let result = analyze(&deck(&["1 0 -1", "2 0 1"], &["1 so 1"], &[card, "nps 1"]));
    assert_eq!(result.with_code(code).count(), 1, "{:?}", result.diagnostics);
}
