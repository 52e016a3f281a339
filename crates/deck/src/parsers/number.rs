// standard library
use std::iter::repeat;

// nom parser combinators
use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{char, digit0, digit1, one_of};
use nom::combinator::{all_consuming, map_res, opt, recognize};
use nom::sequence::{pair, preceded, separated_pair, terminated};
use nom::IResult;

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::diagnostic::Code;
use crate::parsers::{cause, ParseFailure};

/// Largest number of entries a numeric list may expand to
///
/// Shorthand counts that would go past this are reported rather than
/// expanded.
pub(crate) const MAX_EXPANDED_LEN: usize = 1_000_000;

/// Shorthand notation allowed in numeric lists
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Shorthand {
    /// `nR`, repeat the previous entry n times
    Repeat(usize),
    /// `nI`, n linear interpolates between neighbours
    Interpolate(usize),
    /// `nILOG`, n logarithmic interpolates between neighbours
    LogInterpolate(usize),
    /// `xM`, previous entry multiplied by x
    Multiply(f64),
    /// `nJ`, skip n entries leaving the defaults
    Jump(usize),
}

/// Mantissa with optional sign and decimal point
fn mantissa(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
    ))(i)
}

/// Exponent with or without the `e`/`d` marker, e.g. `e-3`, `d+2`, `-3`
fn exponent(i: &str) -> IResult<&str, &str> {
    alt((
        preceded(one_of("eEdD"), recognize(pair(opt(one_of("+-")), digit1))),
        recognize(pair(one_of("+-"), digit1)),
    ))(i)
}

/// Fortran style floating point value
pub(crate) fn fortran_float(i: &str) -> IResult<&str, f64> {
    let (i, mantissa) = mantissa(i)?;
    let (i, exponent) = opt(exponent)(i)?;
    let text = match exponent {
        Some(e) => f!("{mantissa}e{e}"),
        None => mantissa.to_string(),
    };
    match text.parse::<f64>() {
        Ok(value) => Ok((i, value)),
        Err(_) => Err(cause("invalid floating point value")),
    }
}

/// Signed integer value
pub(crate) fn integer(i: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), str::parse::<i64>)(i)
}

/// Integer index range `lo:hi`
pub(crate) fn range(i: &str) -> IResult<&str, (i32, i32)> {
    let (i, (lo, hi)) = separated_pair(integer, char(':'), integer)(i)?;
    match (i32::try_from(lo), i32::try_from(hi)) {
        (Ok(lo), Ok(hi)) => Ok((i, (lo, hi))),
        _ => Err(cause("range bound out of bounds")),
    }
}

fn multiply(i: &str) -> IResult<&str, Shorthand> {
    let (i, x) = terminated(fortran_float, tag_no_case("m"))(i)?;
    Ok((i, Shorthand::Multiply(x)))
}

fn counted(i: &str) -> IResult<&str, Shorthand> {
    let (i, n) = opt(map_res(digit1, str::parse::<usize>))(i)?;
    let (i, kind) = alt((
        tag_no_case("ilog"),
        tag_no_case("log"),
        tag_no_case("r"),
        tag_no_case("i"),
        tag_no_case("j"),
    ))(i)?;

    let n = n.unwrap_or(1);
    let shorthand = match kind.to_ascii_lowercase().as_str() {
        "r" => Shorthand::Repeat(n),
        "i" => Shorthand::Interpolate(n),
        "j" => Shorthand::Jump(n),
        _ => Shorthand::LogInterpolate(n),
    };
    Ok((i, shorthand))
}

/// Any of the numeric list shorthands
pub(crate) fn shorthand(i: &str) -> IResult<&str, Shorthand> {
    alt((multiply, counted))(i)
}

/// Parse a complete token as a Fortran style float
pub(crate) fn parse_float(token: &str) -> Result<f64, ParseFailure> {
    all_consuming(fortran_float)(token)
        .map(|(_, v)| v)
        .map_err(|_| ParseFailure::number(token))
}

/// Parse a complete token as an integer
pub(crate) fn parse_int(token: &str) -> Result<i64, ParseFailure> {
    all_consuming(integer)(token)
        .map(|(_, v)| v)
        .map_err(|_| ParseFailure::number(token))
}

/// Parse a complete token as an entity number, which must be at least 1
pub(crate) fn parse_id(token: &str) -> Result<u32, ParseFailure> {
    match parse_int(token).map(u32::try_from) {
        Ok(Ok(id)) if id > 0 => Ok(id),
        _ => Err(ParseFailure::number(token)),
    }
}

/// Parse a complete token as a signed 32-bit integer
pub(crate) fn parse_i32(token: &str) -> Result<i32, ParseFailure> {
    parse_int(token).and_then(|v| i32::try_from(v).map_err(|_| ParseFailure::number(token)))
}

/// True if the whole token is an integer range `lo:hi`
pub(crate) fn is_range(token: &str) -> bool {
    all_consuming(range)(token).is_ok()
}

/// Expand a numeric list, keeping `j` entries as `None`
pub(crate) fn expand_values(tokens: &[String]) -> Result<Vec<Option<f64>>, ParseFailure> {
    let dangling =
        |token: &str| ParseFailure::new(Code::ParseNumber, f!("dangling shorthand '{token}'"));
    let too_long = |token: &str| {
        ParseFailure::new(
            Code::ParseNumber,
            f!("shorthand '{token}' expands past {MAX_EXPANDED_LEN} entries"),
        )
    };

    let mut values: Vec<Option<f64>> = Vec::with_capacity(tokens.len());
    let mut pending: Option<(&str, usize, bool)> = None;

    for token in tokens.iter().map(String::as_str) {
        if let Ok(value) = parse_float(token) {
            // fill in any interpolation waiting on this value
            if let Some((marker, n, log)) = pending.take() {
                let start = values
                    .last()
                    .copied()
                    .flatten()
                    .ok_or_else(|| dangling(marker))?;
                let points = interpolate(start, value, n, log).ok_or_else(|| dangling(marker))?;
                values.extend(points.into_iter().map(Some));
            }
            values.push(Some(value));
            continue;
        }

        if let Some((marker, _, _)) = pending {
            return Err(dangling(marker));
        }

        let (_, shorthand) =
            all_consuming(shorthand)(token).map_err(|_| ParseFailure::number(token))?;

        let count = match shorthand {
            Shorthand::Repeat(n)
            | Shorthand::Interpolate(n)
            | Shorthand::LogInterpolate(n)
            | Shorthand::Jump(n) => n,
            Shorthand::Multiply(_) => 1,
        };
        if values.len().saturating_add(count) > MAX_EXPANDED_LEN {
            return Err(too_long(token));
        }

        match shorthand {
            Shorthand::Repeat(n) => {
                let last = *values.last().ok_or_else(|| dangling(token))?;
                values.extend(repeat(last).take(n));
            }
            Shorthand::Interpolate(n) => pending = Some((token, n, false)),
            Shorthand::LogInterpolate(n) => pending = Some((token, n, true)),
            Shorthand::Multiply(x) => {
                let last = values
                    .last()
                    .copied()
                    .flatten()
                    .ok_or_else(|| dangling(token))?;
                values.push(Some(last * x));
            }
            Shorthand::Jump(n) => values.extend(repeat(None).take(n)),
        }
    }

    match pending {
        Some((marker, _, _)) => Err(dangling(marker)),
        None => Ok(values),
    }
}

/// Expand a numeric list where every entry must be given
pub(crate) fn expand_numbers(tokens: &[String]) -> Result<Vec<f64>, ParseFailure> {
    expand_values(tokens)?
        .into_iter()
        .map(|v| v.ok_or_else(|| ParseFailure::new(Code::ParseNumber, "'j' is not allowed here")))
        .collect()
}

/// Points strictly between `start` and `end`
fn interpolate(start: f64, end: f64, n: usize, log: bool) -> Option<Vec<f64>> {
    if log && (start <= 0.0 || end <= 0.0) {
        return None;
    }

    let steps = (n + 1) as f64;
    let points = (1..=n)
        .map(|k| {
            let t = k as f64 / steps;
            match log {
                true => (start.ln() + (end.ln() - start.ln()) * t).exp(),
                false => start + (end - start) * t,
            }
        })
        .collect();
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[rstest]
    #[case("1.0e-3", 1.0e-3)]
    #[case("1.0-3", 1.0e-3)]
    #[case("1.0d-3", 1.0e-3)]
    #[case("2.5+2", 250.0)]
    #[case("-4", -4.0)]
    #[case(".5", 0.5)]
    #[case("7.", 7.0)]
    #[case("1E6", 1.0e6)]
    fn fortran_numbers(#[case] token: &str, #[case] expected: f64) {
        let value = parse_float(token).unwrap();
        assert!((value - expected).abs() < 1e-12 * expected.abs().max(1.0));
    }

    #[rstest]
    #[case("-1:1")]
    #[case("1.0.0")]
    #[case("abc")]
    #[case("")]
    fn not_numbers(#[case] token: &str) {
        assert!(parse_float(token).is_err());
    }

    #[test]
    fn ranges_are_never_rewritten() {
        assert_eq!(all_consuming(range)("-7:7"), Ok(("", (-7, 7))));
        assert!(is_range("0:0"));
        assert!(!is_range("1.0-3"));
        assert!(!is_range("5"));
    }

    #[test]
    fn entity_numbers() {
        assert_eq!(parse_id("12"), Ok(12));
        assert!(parse_id("0").is_err());
        assert!(parse_id("-3").is_err());
        assert_eq!(parse_i32("-3"), Ok(-3));
    }

    #[rstest]
    #[case("1 2r", vec![1.0, 1.0, 1.0])]
    #[case("1 r 4", vec![1.0, 1.0, 4.0])]
    #[case("1 2i 4", vec![1.0, 2.0, 3.0, 4.0])]
    #[case("1 2ilog 100", vec![1.0, 10f64.powf(2.0 / 3.0), 10f64.powf(4.0 / 3.0), 100.0])]
    #[case("2 3m", vec![2.0, 6.0])]
    #[case("1-3 1", vec![1.0e-3, 1.0])]
    fn shorthands(#[case] text: &str, #[case] expected: Vec<f64>) {
        let values = expand_numbers(&strings(text)).unwrap();
        assert_eq!(values.len(), expected.len());
        for (v, e) in values.iter().zip(expected) {
            assert!((v - e).abs() < 1e-9, "{v} != {e}");
        }
    }

    #[test]
    fn jumps() {
        let values = expand_values(&strings("1000 1.0 2j 50")).unwrap();
        assert_eq!(values, vec![Some(1000.0), Some(1.0), None, None, Some(50.0)]);
        assert!(expand_numbers(&strings("1 j 2")).is_err());
    }

    #[rstest]
    #[case("1 1000000000000000000r")]
    #[case("1 1000000000000000000i 2")]
    #[case("1 1000000000000000000ilog 2")]
    #[case("1 1000000000000000000j")]
    #[case("1 999999r 1r")]
    fn oversized_shorthands(#[case] text: &str) {
        let failure = expand_values(&strings(text)).unwrap_err();
        assert_eq!(failure.code, Code::ParseNumber);
        assert!(failure.message.contains("expands past"), "{}", failure.message);
    }

    #[test]
    fn shorthand_up_to_the_cap() {
        let values = expand_values(&strings("1 999999r")).unwrap();
        assert_eq!(values.len(), MAX_EXPANDED_LEN);
    }

    #[rstest]
    #[case("2r 1")]
    #[case("1 3i")]
    #[case("3i 1")]
    #[case("1 2i 2i 3")]
    #[case("0 1ilog 10")]
    fn dangling_shorthands(#[case] text: &str) {
        let failure = expand_values(&strings(text)).unwrap_err();
        assert_eq!(failure.code, Code::ParseNumber);
    }
}
