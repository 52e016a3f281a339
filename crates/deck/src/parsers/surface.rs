// nom parser combinators
use nom::character::complete::{self, one_of};
use nom::combinator::{all_consuming, opt};
use nom::IResult;

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::core::{Boundary, Surface, SurfaceKind};
use crate::diagnostic::Span;
use crate::parsers::number::*;
use crate::parsers::{tokens, ParseFailure, Parsed};

/// Boundary prefix and surface number, e.g. `*12`
fn surface_number(i: &str) -> IResult<&str, (Boundary, u32)> {
    let (i, prefix) = opt(one_of("*+"))(i)?;
    let (i, number) = complete::u32(i)?;
    let boundary = match prefix {
        Some('*') => Boundary::Reflecting,
        Some('+') => Boundary::White,
        _ => Boundary::None,
    };
    Ok((i, (boundary, number)))
}

/// Parse a surface card
///
/// Coefficients that are not numbers are reported and left out, so the
/// surface itself still exists for cross referencing.
pub(crate) fn parse_surface(text: &str) -> Parsed<Surface> {
    let t = tokens(text);
    let Some(first) = t.first() else {
        return Err(ParseFailure::token_count("empty surface card"));
    };

    let (boundary, number) = match all_consuming(surface_number)(first.as_str()) {
        Ok((_, (boundary, number))) if number > 0 => (boundary, number),
        _ => return Err(ParseFailure::number(first).context("surface card")),
    };
    let context = f!("surface {number}");

    // optional transform or periodic partner before the mnemonic
    let mut index = 1;
    let transform = match t.get(index).map(|token| parse_i32(token)) {
        Some(Ok(n)) => {
            index += 1;
            Some(n)
        }
        _ => None,
    };

    let Some(mnemonic) = t.get(index) else {
        return Err(ParseFailure::token_count("missing surface mnemonic").context(&context));
    };
    let kind = SurfaceKind::from_mnemonic(mnemonic);

    let mut issues = Vec::new();
    let mut coefficients = Vec::new();
    for token in &t[index + 1..] {
        match parse_float(token) {
            Ok(value) => coefficients.push(value),
            Err(e) => issues.push(e.context(&context)),
        }
    }

    if t.len() == index + 1 {
        return Err(ParseFailure::token_count(f!("no coefficients for '{kind}'")).context(&context));
    }

    let surface = Surface {
        number,
        boundary,
        transform,
        kind,
        coefficients,
        span: Span::default(),
    };
    Ok((surface, issues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Code;
    use rstest::rstest;

    #[test]
    fn plain_surface() {
        let (s, issues) = parse_surface("1 SO 1.0").unwrap();
        assert!(issues.is_empty());
        assert_eq!(s.number, 1);
        assert_eq!(s.boundary, Boundary::None);
        assert_eq!(s.kind, SurfaceKind::So);
        assert_eq!(s.coefficients, vec![1.0]);
        assert_eq!(s.transform, None);
    }

    #[rstest]
    #[case("*2 pz 0", Boundary::Reflecting)]
    #[case("+2 pz 0", Boundary::White)]
    fn boundaries(#[case] text: &str, #[case] boundary: Boundary) {
        let (s, _) = parse_surface(text).unwrap();
        assert_eq!(s.number, 2);
        assert_eq!(s.boundary, boundary);
    }

    #[test]
    fn transforms_and_periodic_partners() {
        let (s, _) = parse_surface("3 4 c/z 0 0 1.5-1").unwrap();
        assert_eq!(s.transform_ref(), Some(4));
        assert_eq!(s.kind, SurfaceKind::CylZ);
        assert_eq!(s.coefficients[2], 0.15);

        let (s, _) = parse_surface("5 -6 px 10").unwrap();
        assert_eq!(s.transform_ref(), None);
        assert_eq!(s.periodic_partner(), Some(6));
    }

    #[test]
    fn unknown_mnemonics_are_kept() {
        let (s, _) = parse_surface("7 zz 1 2 3").unwrap();
        assert_eq!(s.kind, SurfaceKind::Other("zz".into()));
    }

    #[test]
    fn bad_coefficient_is_reported() {
        let (s, issues) = parse_surface("8 rpp -1 1 -1 1 -1 x").unwrap();
        assert_eq!(s.coefficients.len(), 5);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, Code::ParseNumber);
    }

    #[rstest]
    #[case("a so 1", Code::ParseNumber)]
    #[case("0 so 1", Code::ParseNumber)]
    #[case("1", Code::ParseTokenCount)]
    #[case("1 so", Code::ParseTokenCount)]
    #[case("1 2 3", Code::ParseTokenCount)]
    fn broken_cards(#[case] text: &str, #[case] code: Code) {
        assert_eq!(parse_surface(text).unwrap_err().code, code);
    }
}
