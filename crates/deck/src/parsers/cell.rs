// standard library
use std::iter::repeat;

// nom parser combinators
use nom::character::complete::{self, char, one_of};
use nom::combinator::{all_consuming, opt};
use nom::sequence::preceded;
use nom::IResult;

// external crates
use log::warn;

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::core::{
    Cell, CellParams, Fill, FillArray, FillEntry, Particle, Region, Sense, SurfaceRef, Transform,
    TransformSpec,
};
use crate::diagnostic::Code;
use crate::parsers::number::*;
use crate::parsers::{cause, is_keyword, keyword_groups, spaced, tokens, ParseFailure, Parsed};

/// Keywords kept as raw values in [CellParams::other]
const UNMODELLED_KEYWORDS: [&str; 13] = [
    "mat", "rho", "pwt", "ext", "fcl", "wwn", "dxc", "nonu", "pd", "elpt", "cosy", "bflcl",
    "unc",
];

/// Parse a cell card
///
/// Problems with individual parameters are returned alongside the cell, and
/// the offending parameter is left unset. Only a card without a usable
/// number, material, density or region fails outright.
pub(crate) fn parse_cell(text: &str) -> Parsed<Cell> {
    let t = tokens(&spaced(text, &['=']));
    if t.len() < 2 {
        return Err(ParseFailure::token_count(
            "cell card needs at least a number and a material",
        ));
    }

    let number = parse_id(&t[0]).map_err(|e| e.context("cell card"))?;
    let context = f!("cell {number}");
    let mut cell = Cell {
        number,
        ..Default::default()
    };

    // LIKE m BUT form has no material, density or region of its own
    if t[1] == "like" {
        let base = t
            .get(2)
            .ok_or_else(|| ParseFailure::token_count("expected 'LIKE m BUT'"))
            .and_then(|token| parse_id(token))
            .map_err(|e| e.context(&context))?;
        if t.get(3).map(String::as_str) != Some("but") {
            return Err(ParseFailure::token_count("expected 'BUT' after 'LIKE m'").context(&context));
        }
        cell.like = Some(base);
        let (params, issues) = parse_params(&t[4..]);
        cell.params = params;
        return Ok((cell, with_context(issues, &context)));
    }

    cell.material = parse_int(&t[1])
        .ok()
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(|| ParseFailure::number(&t[1]).context(&context))?;

    let mut start = 2;
    if cell.material != 0 {
        let density = t
            .get(2)
            .ok_or_else(|| ParseFailure::token_count("missing density"))
            .and_then(|token| parse_float(token))
            .map_err(|e| e.context(&context))?;
        cell.density = Some(density);
        start = 3;
    }

    // region runs up to the first keyword
    let end = t[start..]
        .iter()
        .position(|token| is_keyword(token))
        .map_or(t.len(), |p| start + p);
    if start == end {
        return Err(ParseFailure::token_count("no region given").context(&context));
    }

    cell.region = parse_region(&t[start..end].join(" ")).map_err(|e| e.context(&context))?;

    let (params, issues) = parse_params(&t[end..]);
    cell.params = params;
    Ok((cell, with_context(issues, &context)))
}

fn with_context(issues: Vec<ParseFailure>, context: &str) -> Vec<ParseFailure> {
    issues.into_iter().map(|e| e.context(context)).collect()
}

/// Signed surface term, with an optional macrobody facet
pub(crate) fn surface_ref(i: &str) -> IResult<&str, SurfaceRef> {
    let (i, sign) = opt(one_of("+-"))(i)?;
    let (i, id) = complete::u32(i)?;
    let (i, facet) = opt(preceded(char('.'), complete::u8))(i)?;

    if id == 0 {
        return Err(cause("surface numbers start at 1"));
    }

    let sense = match sign {
        Some('-') => Sense::Negative,
        _ => Sense::Positive,
    };
    Ok((i, SurfaceRef { id, sense, facet }))
}

/// Extract surface terms and complements from a region expression
pub(crate) fn parse_region(text: &str) -> Result<Region, ParseFailure> {
    let mut region = Region {
        text: text.split_whitespace().collect::<Vec<_>>().join(" "),
        ..Default::default()
    };

    // operators carry no references
    let cleaned = text.replace(&['(', ')', ':'][..], " ");
    for token in cleaned.split_whitespace() {
        if let Some(cell) = token.strip_prefix('#') {
            if !cell.is_empty() {
                region.complements.push(parse_id(cell)?);
            }
            continue;
        }

        let (_, surface) = all_consuming(surface_ref)(token).map_err(|_| {
            ParseFailure::new(Code::ParseNumber, f!("invalid surface term '{token}'"))
        })?;
        region.surfaces.push(surface);
    }

    Ok(region)
}

/// Parse `KEY[:PARTICLES] [=] VALUES` groups into cell parameters
pub(crate) fn parse_params(raw: &[String]) -> (CellParams, Vec<ParseFailure>) {
    let t = tokens(&spaced(&raw.join(" "), &['(', ')']));
    let mut params = CellParams::default();
    let mut issues = Vec::new();

    for (keyword, values) in keyword_groups(&t) {
        if let Err(e) = apply_param(&mut params, &keyword, &values) {
            issues.push(e);
        }
    }

    (params, issues)
}

fn apply_param(params: &mut CellParams, keyword: &str, values: &[String]) -> Result<(), ParseFailure> {
    let (name, designators) = match keyword.split_once(':') {
        Some((name, designators)) => (name, Some(designators)),
        None => (keyword, None),
    };

    match name {
        "imp" => {
            let designators = designators.ok_or_else(|| {
                ParseFailure::token_count("'imp' requires a particle designator")
            })?;
            let particles = Particle::parse_list(designators).ok_or_else(|| {
                ParseFailure::token_count(f!("unknown particle designator in '{keyword}'"))
            })?;
            let value = parse_float(single(keyword, values)?)?;
            if value < 0.0 {
                return Err(ParseFailure::new(
                    Code::ParseNumber,
                    f!("importance must not be negative, found {value}"),
                ));
            }
            for particle in particles {
                params.importance.insert(particle, value);
            }
        }
        "u" => params.universe = Some(parse_i32(single(keyword, values)?)?),
        "lat" => params.lattice = Some(parse_i32(single(keyword, values)?)?),
        "vol" => params.volume = Some(parse_float(single(keyword, values)?)?),
        "tmp" => {
            let value = parse_float(single(keyword, values)?)?;
            if value <= 0.0 {
                return Err(ParseFailure::new(
                    Code::ParseNumber,
                    f!("temperature must be positive, found {value}"),
                ));
            }
            params.temperature = Some(value);
        }
        "trcl" | "*trcl" => {
            params.transform = Some(parse_transform(values, name.starts_with('*'))?);
        }
        "fill" | "*fill" => params.fill = Some(parse_fill(values, name.starts_with('*'))?),
        _ => {
            let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
            if !UNMODELLED_KEYWORDS.contains(&stem) {
                warn!("Unrecognised cell keyword '{keyword}'");
            }
            params.other.push((keyword.to_string(), values.to_vec()));
        }
    }

    Ok(())
}

/// The only value of a keyword
fn single<'a>(keyword: &str, values: &'a [String]) -> Result<&'a str, ParseFailure> {
    match values {
        [value] => Ok(value.as_str()),
        _ => Err(ParseFailure::token_count(f!(
            "'{keyword}' expects one value, found {}",
            values.len()
        ))),
    }
}

/// Transform reference `n`, `(n)`, or inline entries `( ... )`
pub(crate) fn parse_transform(values: &[String], degrees: bool) -> Result<TransformSpec, ParseFailure> {
    let inner = match values {
        [n] => return Ok(TransformSpec::Reference(parse_id(n)?)),
        [open, inner @ .., close] if open == "(" && close == ")" => inner,
        _ => return Err(ParseFailure::token_count("invalid transform specification")),
    };

    if let [n] = inner {
        return Ok(TransformSpec::Reference(parse_id(n)?));
    }

    let entries = inner
        .iter()
        .map(|v| parse_float(v))
        .collect::<Result<Vec<f64>, ParseFailure>>()?;

    if !Transform::VALID_LENGTHS.contains(&entries.len()) {
        return Err(ParseFailure::token_count(f!(
            "transform expects 3, 12 or 13 entries, found {}",
            entries.len()
        )));
    }
    if Transform::from_values(0, &entries, degrees).is_none() {
        return Err(ParseFailure::new(Code::ParseNumber, "origin flag 'm' must be 1 or -1"));
    }

    Ok(TransformSpec::Inline {
        values: entries,
        degrees,
    })
}

/// Fill sub-parser, only treating the value as an array when it starts with
/// an index range
pub(crate) fn parse_fill(values: &[String], degrees: bool) -> Result<Fill, ParseFailure> {
    let Some(first) = values.first() else {
        return Err(ParseFailure::token_count("'fill' expects a universe"));
    };

    if is_range(first) {
        let ranges: Vec<(i32, i32)> = values
            .iter()
            .take(3)
            .map_while(|v| all_consuming(range)(v.as_str()).ok().map(|(_, r)| r))
            .collect();

        if ranges.len() != 3 {
            return Err(ParseFailure::new(
                Code::ParseFillArrayCardinality,
                f!("fill array needs three index ranges, found {}", ranges.len()),
            ));
        }

        let mut array = FillArray {
            ranges: [ranges[0], ranges[1], ranges[2]],
            entries: Vec::new(),
        };

        // repeats may only expand up to the declared size
        let limit = array
            .expected_len()
            .unwrap_or(0)
            .min(MAX_EXPANDED_LEN)
            .max(values.len() - 3);

        array.entries = fill_entries(&values[3..], degrees, limit)?;
        if array.entries.is_empty() {
            return Err(ParseFailure::new(
                Code::ParseFillArrayCardinality,
                "fill array has no universe entries",
            ));
        }

        return Ok(Fill::Array(array));
    }

    let universe = parse_i32(first)?;
    let transform = match &values[1..] {
        [] => None,
        rest if rest[0] == "(" => Some(parse_transform(rest, degrees)?),
        rest => {
            return Err(ParseFailure::token_count(f!(
                "unexpected '{}' after fill universe",
                rest[0]
            )))
        }
    };

    Ok(Fill::Simple {
        universe,
        transform,
    })
}

/// Universe entries of an array fill, with repeats expanded up to `limit`
fn fill_entries(
    values: &[String],
    degrees: bool,
    limit: usize,
) -> Result<Vec<FillEntry>, ParseFailure> {
    let mut entries: Vec<FillEntry> = Vec::with_capacity(values.len());
    let mut i = 0;

    while i < values.len() {
        let token = values[i].as_str();

        // transform applies to the preceding entry
        if token == "(" {
            let close = values[i..]
                .iter()
                .position(|t| t == ")")
                .map(|p| i + p)
                .ok_or_else(|| ParseFailure::token_count("unclosed '(' in fill array"))?;
            let transform = parse_transform(&values[i..=close], degrees)?;
            let last = entries.last_mut().ok_or_else(|| {
                ParseFailure::new(
                    Code::ParseFillArrayCardinality,
                    "transform with no preceding universe",
                )
            })?;
            last.transform = Some(transform);
            i = close + 1;
            continue;
        }

        if let Ok(universe) = parse_i32(token) {
            entries.push(FillEntry::new(universe));
        } else if let Ok((_, Shorthand::Repeat(n))) = all_consuming(shorthand)(token) {
            let last = entries.last().cloned().ok_or_else(|| {
                ParseFailure::new(
                    Code::ParseFillArrayCardinality,
                    f!("repeat '{token}' with no preceding universe"),
                )
            })?;
            if entries.len().saturating_add(n) > limit {
                return Err(ParseFailure::new(
                    Code::ParseFillArrayCardinality,
                    f!("repeat '{token}' expands the fill array past {limit} entries"),
                ));
            }
            entries.extend(repeat(last).take(n));
        } else {
            return Err(ParseFailure::number(token));
        }
        i += 1;
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cell(text: &str) -> Cell {
        let (cell, issues) = parse_cell(text).unwrap();
        assert!(issues.is_empty(), "unexpected issues {issues:?}");
        cell
    }

    #[test]
    fn material_cell() {
        let c = cell("1 1 -10.4 -1 2 IMP:N=1 u=3");
        assert_eq!(c.number, 1);
        assert_eq!(c.material, 1);
        assert_eq!(c.density, Some(-10.4));
        assert_eq!(c.region.text, "-1 2");
        assert_eq!(c.region.surfaces.len(), 2);
        assert_eq!(c.region.surfaces[0].sense, Sense::Negative);
        assert_eq!(c.region.surfaces[1].sense, Sense::Positive);
        assert_eq!(c.params.universe, Some(3));
        assert_eq!(c.params.importance[&Particle::Neutron], 1.0);
    }

    #[test]
    fn region_operators_and_complements() {
        let c = cell("3 0 (-1:2) #4 #(5 -6) imp:n,p 1");
        assert_eq!(c.region.surface_ids().into_iter().collect::<Vec<_>>(), vec![1, 2, 5, 6]);
        assert_eq!(c.region.complements, vec![4]);
        assert_eq!(c.params.importance.len(), 2);
    }

    #[test]
    fn macrobody_facets() {
        let c = cell("5 0 -10.1 +11.2 12");
        assert_eq!(c.region.surfaces[0].facet, Some(1));
        assert_eq!(c.region.surfaces[1].facet, Some(2));
        assert_eq!(c.region.surfaces[2].facet, None);
    }

    #[test]
    fn lattice_fill_array() {
        let c = cell("10 0 -1 2 -3 4 -5 6 lat=1 u=1 fill=-1:1 -1:1 0:0 1 2 2r (3) 4 5 6 7");
        assert_eq!(c.params.lattice, Some(1));

        let array = c.params.fill.as_ref().and_then(Fill::as_array).unwrap();
        assert_eq!(array.ranges, [(-1, 1), (-1, 1), (0, 0)]);
        assert_eq!(array.entries.len(), 8);
        assert_eq!(array.entries[2].universe, 2);
        assert_eq!(array.entries[3].transform, Some(TransformSpec::Reference(3)));
    }

    #[test]
    fn fill_repeats_up_to_the_declared_size() {
        let c = cell("10 0 -1 lat=1 u=1 fill=0:2 0:2 0:0 1 8r");
        let array = c.params.fill.as_ref().and_then(Fill::as_array).unwrap();
        assert_eq!(array.entries.len(), 9);

        let (_, issues) = parse_cell("10 0 -1 lat=1 u=1 fill=0:2 0:2 0:0 1 9r").unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, Code::ParseFillArrayCardinality);
        assert!(issues[0].message.contains("past 9 entries"));
    }

    #[test]
    fn simple_fill_with_transform() {
        let c = cell("2 0 -7 *fill=-4 (0 0 1 0 90 90 90 0 90 90 90 0)");
        match c.params.fill {
            Some(Fill::Simple {
                universe,
                transform: Some(TransformSpec::Inline { values, degrees }),
            }) => {
                assert_eq!(universe, -4);
                assert_eq!(values.len(), 12);
                assert!(degrees);
            }
            other => panic!("unexpected fill {other:?}"),
        }
    }

    #[test]
    fn transforms() {
        let c = cell("1 0 -1 trcl=(2)");
        assert_eq!(c.params.transform, Some(TransformSpec::Reference(2)));

        let c = cell("1 0 -1 trcl 5");
        assert_eq!(c.params.transform, Some(TransformSpec::Reference(5)));
    }

    #[test]
    fn like_but() {
        let c = cell("2 LIKE 1 BUT u=4 mat=3 rho=-1.0");
        assert_eq!(c.like, Some(1));
        assert!(c.region.is_empty());
        assert_eq!(c.params.universe, Some(4));
        assert_eq!(c.params.other("mat"), Some(&["3".to_string()][..]));
    }

    #[rstest]
    #[case("x 0 -1", Code::ParseNumber)]
    #[case("1 1 -1", Code::ParseTokenCount)]
    #[case("1 1", Code::ParseTokenCount)]
    #[case("1 0 imp:n=1", Code::ParseTokenCount)]
    #[case("1 0 -1 2.x", Code::ParseNumber)]
    #[case("1 like 2 u=1", Code::ParseTokenCount)]
    fn broken_cards(#[case] text: &str, #[case] code: Code) {
        assert_eq!(parse_cell(text).unwrap_err().code, code);
    }

    #[rstest]
    #[case("1 0 -1 imp:n=-1", Code::ParseNumber)]
    #[case("1 0 -1 imp=1", Code::ParseTokenCount)]
    #[case("1 0 -1 tmp=0", Code::ParseNumber)]
    #[case("1 0 -1 u=1 2", Code::ParseTokenCount)]
    #[case("1 0 -1 fill=0:1 0:1", Code::ParseFillArrayCardinality)]
    #[case("1 0 -1 fill=0:0 0:0 0:0", Code::ParseFillArrayCardinality)]
    #[case("1 0 -1 fill=0:1 0:0 0:0 2r", Code::ParseFillArrayCardinality)]
    #[case("1 0 -1 fill=0:1 0:0 0:0 (1) 2", Code::ParseFillArrayCardinality)]
    #[case("1 0 -1 fill=2 3", Code::ParseTokenCount)]
    #[case("1 0 -1 trcl=(1 2)", Code::ParseTokenCount)]
    #[case("1 0 -1 trcl=(0 0 0 1 0 0 0 1 0 0 0 1 2)", Code::ParseNumber)]
    #[case("1 0 -1 fill=0:0 0:0 0:0 1 1000000000000000000r", Code::ParseFillArrayCardinality)]
    #[case("1 0 -1 fill=0:1 0:0 0:0 1 2r", Code::ParseFillArrayCardinality)]
    fn parameter_issues(#[case] text: &str, #[case] code: Code) {
        let (cell, issues) = parse_cell(text).unwrap();
        assert_eq!(cell.number, 1);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, code);
        assert!(issues[0].message.starts_with("cell 1: "));
    }
}
