// nom parser combinators
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{self, alpha1, char, one_of, satisfy};
use nom::combinator::{all_consuming, map_res, opt, recognize, rest};
use nom::sequence::{preceded, tuple};
use nom::IResult;

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::core::{
    Component, DataCard, Entity, KeywordGroups, Material, Modifier, Particle, Payload, Tally,
    TallyKind, TallyRef, Thermal, Transform, Zaid,
};
use crate::diagnostic::{Code, Span};
use crate::parsers::number::*;
use crate::parsers::{keyword_groups, spaced, tokens, ParseFailure, Parsed};

/// Further MCNP data cards that are recognised but kept opaque
const OPAQUE_CARDS: &[&str] = &[
    "act", "area", "awtab", "bbrem", "bfld", "cf", "cm", "cmesh", "cosy", "cosyp", "ctme",
    "dawwg", "dbcn", "dd", "de", "df", "dm", "drxs", "ds", "dxc", "elpt", "em", "embeb", "embed",
    "embee", "embem", "embtb", "embtm", "esplt", "ext", "fcl", "fic", "files", "fill", "fip",
    "fir", "field", "fm", "fmult", "fq", "fs", "ft", "fu", "hsrc", "histp", "kopts", "kpert",
    "ksen", "lat", "lca", "lcb", "lcc", "lea", "leb", "lost", "m", "mesh", "mgopt", "mplot",
    "mpn", "mx", "nonu", "notrn", "otfdb", "pd", "pert", "phys", "pikmt", "print", "prdmp",
    "ptrac", "pwt", "rand", "read", "rmesh", "sb", "sc", "sd", "sf", "si", "smesh", "sp",
    "spdtl", "ssr", "ssw", "stop", "talnp", "tf", "thtme", "tm", "tmesh", "tmp", "totnu",
    "trcl", "tropt", "tsplt", "u", "unc", "var", "vol", "void", "wwg", "wwge", "wwgt", "xs",
];

/// Name of a data card split into its parts
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CardName {
    pub prefix: Option<char>,
    pub mnemonic: String,
    pub number: Option<u32>,
    pub designators: Option<String>,
}

/// `[*|+]MNEMONIC[N][:PARTICLES]`
pub(crate) fn card_name(i: &str) -> IResult<&str, CardName> {
    let (i, prefix) = opt(one_of("*+"))(i)?;
    let (i, mnemonic) = alpha1(i)?;
    let (i, number) = opt(complete::u32)(i)?;
    let (i, designators) = opt(preceded(char(':'), rest))(i)?;
    Ok((
        i,
        CardName {
            prefix,
            mnemonic: mnemonic.to_ascii_lowercase(),
            number,
            designators: designators.map(str::to_ascii_lowercase),
        },
    ))
}

/// True for data cards the analysis knows about
pub(crate) fn is_known_card(mnemonic: &str) -> bool {
    matches!(
        mnemonic,
        "m" | "mt"
            | "mode"
            | "nps"
            | "kcode"
            | "ksrc"
            | "sdef"
            | "f"
            | "fc"
            | "e"
            | "t"
            | "tr"
            | "imp"
            | "wwn"
            | "wwe"
            | "wwp"
            | "dxt"
            | "cut"
            | "burn"
            | "fmesh"
    ) || OPAQUE_CARDS.contains(&mnemonic)
}

/// `ZZZAAA[.xxL]`
pub(crate) fn zaid(i: &str) -> IResult<&str, Zaid> {
    let (i, number) = map_res(take_while_m_n(1, 6, |c: char| c.is_ascii_digit()), str::parse::<u32>)(i)?;
    let (i, library) = opt(preceded(
        char('.'),
        recognize(tuple((
            take_while_m_n(2, 2, |c: char| c.is_ascii_digit()),
            satisfy(|c| c.is_ascii_alphabetic()),
        ))),
    ))(i)?;

    Ok((
        i,
        Zaid {
            z: number / 1000,
            a: number % 1000,
            library: library.map(str::to_ascii_lowercase),
        },
    ))
}

/// Parse a data card
///
/// The first token names the card. Everything after it is parsed according
/// to the card type, and anything not understood is kept as raw tokens.
pub(crate) fn parse_data(text: &str) -> Parsed<DataCard> {
    let (head, body) = match text.trim().split_once(|c: char| c.is_whitespace()) {
        Some((head, body)) => (head, body.trim()),
        None => (text.trim(), ""),
    };

    let name = match all_consuming(card_name)(head) {
        Ok((_, name)) => name,
        // vertical input and anything else without a plain mnemonic
        Err(_) => {
            let card = DataCard {
                mnemonic: head.to_ascii_lowercase(),
                number: None,
                prefix: None,
                particles: Vec::new(),
                payload: Payload::Opaque(tokens(body)),
                span: Span::default(),
            };
            return Ok((card, Vec::new()));
        }
    };

    let context = head.to_ascii_lowercase();
    let particles = match &name.designators {
        Some(d) => Particle::parse_list(d).ok_or_else(|| {
            ParseFailure::token_count(f!("unknown particle designator in '{context}'"))
        })?,
        None => Vec::new(),
    };

    let mut issues = Vec::new();
    let payload = payload(&name, &particles, body, &mut issues).map_err(|e| e.context(&context))?;

    let card = DataCard {
        mnemonic: name.mnemonic,
        number: name.number,
        prefix: name.prefix,
        particles,
        payload,
        span: Span::default(),
    };
    Ok((card, issues.into_iter().map(|e| e.context(&context)).collect()))
}

fn payload(
    name: &CardName,
    particles: &[Particle],
    body: &str,
    issues: &mut Vec<ParseFailure>,
) -> Result<Payload, ParseFailure> {
    let t = tokens(body);
    let payload = match (name.mnemonic.as_str(), name.number) {
        ("m", Some(n)) if n > 0 => Payload::Material(material(n, &t, issues)?),
        ("mt", Some(n)) => Payload::Thermal(Thermal {
            material: n,
            tables: t,
            span: Span::default(),
        }),
        ("mode", _) => Payload::Mode(mode(&t)?),
        ("nps", _) => Payload::Nps(nps(&t)?),
        ("kcode", _) => Payload::Kcode(expand_values(&t)?),
        ("ksrc", _) => Payload::Ksrc(ksrc(&t)?),
        ("sdef", _) => Payload::Sdef(groups(body)),
        ("f", Some(n)) => Payload::Tally(tally(n, name.prefix, particles, body)?),
        ("fc", Some(_)) => Payload::TallyComment(body.to_string()),
        ("e", _) => Payload::EnergyBins(expand_numbers(&t)?),
        ("t", _) => Payload::TimeBins(expand_numbers(&t)?),
        ("tr", Some(n)) => Payload::Transform(transform(n, name.prefix == Some('*'), &t)?),
        ("imp", _) => Payload::Importance(importance(particles, &t)?),
        ("wwn" | "wwe" | "wwp", _) => Payload::WeightWindow(expand_values(&t)?),
        ("dxt", _) => Payload::Dxtran(expand_numbers(&t)?),
        ("cut", _) => Payload::Cutoff(expand_values(&t)?),
        ("burn", _) => Payload::Burn(groups(body)),
        ("fmesh", _) => Payload::Fmesh(groups(body)),
        ("f" | "fc" | "tr", None) => {
            return Err(ParseFailure::token_count(f!(
                "'{}' requires a number",
                name.mnemonic
            )))
        }
        _ => Payload::Opaque(t),
    };
    Ok(payload)
}

fn groups(body: &str) -> KeywordGroups {
    keyword_groups(&tokens(&spaced(body, &['='])))
}

/// Isotope and fraction pairs, plus keyword options
fn material(
    number: u32,
    t: &[String],
    issues: &mut Vec<ParseFailure>,
) -> Result<Material, ParseFailure> {
    let t = tokens(&spaced(&t.join(" "), &['=']));
    let mut material = Material {
        number,
        ..Default::default()
    };

    let mut i = 0;
    while i < t.len() {
        // keyword options, e.g. nlib=80c
        if t.get(i + 1).map(String::as_str) == Some("=") {
            let value = t.get(i + 2).ok_or_else(|| {
                ParseFailure::token_count(f!("missing value for '{}'", t[i]))
            })?;
            material.options.push((t[i].clone(), value.clone()));
            i += 3;
            continue;
        }

        let Some(fraction) = t.get(i + 1) else {
            return Err(ParseFailure::token_count(f!(
                "isotope '{}' has no fraction",
                t[i]
            )));
        };
        let fraction = parse_float(fraction)?;

        match all_consuming(zaid)(t[i].as_str()) {
            Ok((_, zaid)) if (1..=Zaid::MAX_Z).contains(&zaid.z) => {
                material.components.push(Component { zaid, fraction })
            }
            Ok((_, zaid)) => issues.push(ParseFailure::new(
                Code::ParseMaterialZaid,
                f!("atomic number {} of '{}' is outside 1-{}", zaid.z, t[i], Zaid::MAX_Z),
            )),
            Err(_) => issues.push(ParseFailure::new(
                Code::ParseMaterialZaid,
                f!("invalid ZAID '{}'", t[i]),
            )),
        }
        i += 2;
    }

    if material.components.is_empty() && issues.is_empty() {
        return Err(ParseFailure::token_count("material has no isotopes"));
    }

    Ok(material)
}

fn mode(t: &[String]) -> Result<Vec<Particle>, ParseFailure> {
    let mut particles: Vec<Particle> = Vec::new();
    for token in t {
        let list = Particle::parse_list(token).ok_or_else(|| {
            ParseFailure::token_count(f!("unknown particle designator '{token}'"))
        })?;
        for particle in list {
            if !particles.contains(&particle) {
                particles.push(particle);
            }
        }
    }

    if particles.is_empty() {
        return Err(ParseFailure::token_count("no particles given"));
    }
    Ok(particles)
}

fn nps(t: &[String]) -> Result<u64, ParseFailure> {
    let Some(first) = t.first() else {
        return Err(ParseFailure::token_count("no history count given"));
    };
    match parse_float(first)? {
        n if n >= 0.0 && n.fract() == 0.0 => Ok(n as u64),
        _ => Err(ParseFailure::new(
            Code::ParseNumber,
            f!("history count must be a whole number, found '{first}'"),
        )),
    }
}

fn ksrc(t: &[String]) -> Result<Vec<[f64; 3]>, ParseFailure> {
    let values = expand_numbers(t)?;
    if values.is_empty() || values.len() % 3 != 0 {
        return Err(ParseFailure::token_count(f!(
            "source points need 3 coordinates each, found {} values",
            values.len()
        )));
    }
    Ok(values.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

fn transform(number: u32, degrees: bool, t: &[String]) -> Result<Transform, ParseFailure> {
    let values = expand_numbers(t)?;
    if !Transform::VALID_LENGTHS.contains(&values.len()) {
        return Err(ParseFailure::token_count(f!(
            "transform expects 3, 12 or 13 entries, found {}",
            values.len()
        )));
    }
    Transform::from_values(number, &values, degrees).ok_or_else(|| {
        ParseFailure::new(Code::ParseNumber, "origin flag 'm' must be 1 or -1")
    })
}

fn importance(particles: &[Particle], t: &[String]) -> Result<Vec<f64>, ParseFailure> {
    if particles.is_empty() {
        return Err(ParseFailure::token_count("'imp' requires a particle designator"));
    }

    let values = expand_numbers(t)?;
    if let Some(value) = values.iter().find(|v| **v < 0.0) {
        return Err(ParseFailure::new(
            Code::ParseNumber,
            f!("importance must not be negative, found {value}"),
        ));
    }
    Ok(values)
}

/// `[*|+]FN:<pl>` with its list of bins
fn tally(
    number: u32,
    prefix: Option<char>,
    particles: &[Particle],
    body: &str,
) -> Result<Tally, ParseFailure> {
    let kind = TallyKind::from_number(number).ok_or_else(|| {
        ParseFailure::new(
            Code::TallyKind,
            f!("tally type {} is not one of 1, 2, 4, 5, 6, 7, 8", number % 10),
        )
    })?;

    if particles.is_empty() {
        return Err(ParseFailure::token_count("tally requires a particle designator"));
    }

    let modifier = match prefix {
        Some('*') => Modifier::Star,
        Some('+') => Modifier::Plus,
        _ => Modifier::None,
    };

    let mut tally = Tally {
        number,
        kind,
        modifier,
        particles: particles.to_vec(),
        bins: Vec::new(),
        points: Vec::new(),
        span: Span::default(),
    };

    match kind {
        TallyKind::Detector => tally.points = detector_points(&tokens(body))?,
        _ => tally.bins = tally_bins(kind.entity(), body)?,
    }

    Ok(tally)
}

fn detector_points(t: &[String]) -> Result<Vec<[f64; 4]>, ParseFailure> {
    let values = t
        .iter()
        .filter(|token| *token != "nd")
        .map(|token| parse_float(token))
        .collect::<Result<Vec<f64>, ParseFailure>>()?;

    if values.is_empty() || values.len() % 4 != 0 {
        return Err(ParseFailure::token_count(f!(
            "detectors need 4 values each, found {}",
            values.len()
        )));
    }
    Ok(values.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]]).collect())
}

/// Flatten cell and surface bins, including repeated structure chains
///
/// The first level of a `<` chain refers to the tally entity and every
/// deeper level to cells. Lattice index brackets and `t` totals are skipped.
fn tally_bins(entity: Entity, body: &str) -> Result<Vec<TallyRef>, ParseFailure> {
    let t = tokens(&spaced(body, &['(', ')', '<', '[', ']']));
    let mut bins = Vec::new();
    let mut depth = 0usize;
    let mut level = 0usize;
    let mut in_brackets = false;

    for token in &t {
        match token.as_str() {
            "[" => in_brackets = true,
            "]" => in_brackets = false,
            _ if in_brackets => (),
            "(" => depth += 1,
            ")" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    level = 0;
                }
            }
            "<" => level += 1,
            "t" => (),
            // universe selections in chains are not entity references
            s if s.starts_with("u=") => (),
            s => {
                let id = parse_id(s)?;
                let entity = match level {
                    0 => entity,
                    _ => Entity::Cell,
                };
                bins.push(TallyRef { entity, id });
            }
        }
    }

    if bins.is_empty() {
        return Err(ParseFailure::token_count("tally has no bins"));
    }
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn card(text: &str) -> DataCard {
        let (card, issues) = parse_data(text).unwrap();
        assert!(issues.is_empty(), "unexpected issues {issues:?}");
        card
    }

    #[rstest]
    #[case("m1", None, "m", Some(1), None)]
    #[case("*TR2", Some('*'), "tr", Some(2), None)]
    #[case("+f16:n,p", Some('+'), "f", Some(16), Some("n,p"))]
    #[case("imp:n", None, "imp", None, Some("n"))]
    #[case("fmesh14:n", None, "fmesh", Some(14), Some("n"))]
    fn card_names(
        #[case] text: &str,
        #[case] prefix: Option<char>,
        #[case] mnemonic: &str,
        #[case] number: Option<u32>,
        #[case] designators: Option<&str>,
    ) {
        let (_, name) = all_consuming(card_name)(text).unwrap();
        assert_eq!(name.prefix, prefix);
        assert_eq!(name.mnemonic, mnemonic);
        assert_eq!(name.number, number);
        assert_eq!(name.designators.as_deref(), designators);
    }

    #[test]
    fn zaids() {
        let (_, z) = all_consuming(zaid)("92235.80c").unwrap();
        assert_eq!((z.z, z.a), (92, 235));
        assert_eq!(z.library.as_deref(), Some("80c"));

        let (_, z) = all_consuming(zaid)("1001").unwrap();
        assert_eq!((z.z, z.a, z.library), (1, 1, None));

        assert!(all_consuming(zaid)("92235.8c").is_err());
        assert!(all_consuming(zaid)("92235.800c").is_err());
    }

    #[test]
    fn materials() {
        let c = card("m1 1001.80c 2 8016.80c 1 nlib=80c");
        let Payload::Material(m) = c.payload else {
            panic!("expected a material");
        };
        assert_eq!(m.number, 1);
        assert_eq!(m.components.len(), 2);
        assert_eq!(m.option("nlib"), Some("80c"));
        assert_eq!(m.total_fraction(), 3.0);
    }

    #[rstest]
    #[case("m1 200001.80c 1")]
    #[case("m1 1001.8c 1")]
    #[case("m1 h-1 1")]
    fn bad_zaids(#[case] text: &str) {
        let (c, issues) = parse_data(text).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, Code::ParseMaterialZaid);
        assert!(matches!(c.payload, Payload::Material(_)));
    }

    #[test]
    fn tallies() {
        let c = card("*F14:N 1 2 (3 < 4 < 5) [0:1 0:0 0:0] T");
        let Payload::Tally(t) = c.payload else {
            panic!("expected a tally");
        };
        assert_eq!(t.kind, TallyKind::CellFlux);
        assert_eq!(t.modifier, Modifier::Star);
        assert_eq!(t.cells().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

        let c = card("f2:p 10 (11 < 3)");
        let Payload::Tally(t) = c.payload else {
            panic!("expected a tally");
        };
        assert_eq!(t.surfaces().collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(t.cells().collect::<Vec<_>>(), vec![3]);

        let c = card("f5:n 0 0 0 1 10 0 0 1 nd");
        let Payload::Tally(t) = c.payload else {
            panic!("expected a tally");
        };
        assert_eq!(t.points.len(), 2);
        assert!(t.bins.is_empty());
    }

    #[rstest]
    #[case("f13:n 1", Code::TallyKind)]
    #[case("f4 1", Code::ParseTokenCount)]
    #[case("f4:n", Code::ParseTokenCount)]
    #[case("f4:n 1 x", Code::ParseNumber)]
    #[case("f5:n 0 0 0", Code::ParseTokenCount)]
    #[case("f4:j 1", Code::ParseTokenCount)]
    fn bad_tallies(#[case] text: &str, #[case] code: Code) {
        assert_eq!(parse_data(text).unwrap_err().code, code);
    }

    #[test]
    fn transforms() {
        let c = card("*tr1 0 0 5 0 90 90 90 0 90 90 90 0");
        let Payload::Transform(t) = c.payload else {
            panic!("expected a transform");
        };
        assert_eq!(t.number, 1);
        assert!(t.degrees);
        assert_eq!(t.translation, [0.0, 0.0, 5.0]);

        assert_eq!(parse_data("tr2 1 2").unwrap_err().code, Code::ParseTokenCount);
    }

    #[rstest]
    #[case("tr3 0 0 0 1 0 0 0 1 0 0 0 1 -1", Some(-1))]
    #[case("tr3 0 0 0 1 0 0 0 1 0 0 0 1 1", Some(1))]
    #[case("tr3 0 0 0 1 0 0 0 1 0 0 0 1 2", None)]
    #[case("tr3 0 0 0 1 0 0 0 1 0 0 0 1 0", None)]
    fn origin_flag(#[case] text: &str, #[case] origin: Option<i32>) {
        match origin {
            Some(m) => {
                let Payload::Transform(t) = card(text).payload else {
                    panic!("expected a transform");
                };
                assert_eq!(t.origin, m);
            }
            None => {
                let failure = parse_data(text).unwrap_err();
                assert_eq!(failure.code, Code::ParseNumber);
                assert!(failure.message.ends_with("origin flag 'm' must be 1 or -1"));
            }
        }
    }

    #[rstest]
    #[case("imp:n 1 1000000000000000000r")]
    #[case("e4 1 1000000000000000000i 20")]
    #[case("kcode 1000 1.0 1000000000000000000j")]
    #[case("wwn1:n 1 1000000000000000000r")]
    #[case("cut:n 1 1000000000000000000j")]
    fn oversized_shorthands(#[case] text: &str) {
        assert_eq!(parse_data(text).unwrap_err().code, Code::ParseNumber);
    }

    #[test]
    fn numeric_cards() {
        assert_eq!(card("nps 1e6").payload, Payload::Nps(1_000_000));
        assert_eq!(
            card("e4 1 2i 4").payload,
            Payload::EnergyBins(vec![1.0, 2.0, 3.0, 4.0])
        );
        assert_eq!(
            card("kcode 1000 1.0 2j 50").payload,
            Payload::Kcode(vec![Some(1000.0), Some(1.0), None, None, Some(50.0)])
        );
        assert_eq!(
            card("imp:n 1 3r 0").payload,
            Payload::Importance(vec![1.0, 1.0, 1.0, 1.0, 0.0])
        );
        assert_eq!(
            card("ksrc 0 0 0 1 1 1").payload,
            Payload::Ksrc(vec![[0.0; 3], [1.0; 3]])
        );
    }

    #[test]
    fn mode_and_comments() {
        let c = card("MODE n p");
        assert_eq!(c.payload, Payload::Mode(vec![Particle::Neutron, Particle::Photon]));

        let c = card("fc4 Flux in the Fuel");
        assert_eq!(c.payload, Payload::TallyComment("Flux in the Fuel".into()));
        assert_eq!(c.name(), "fc4");
    }

    #[test]
    fn keyword_cards() {
        let c = card("sdef cel=1 erg=14.1 pos = 0 0 0");
        let Payload::Sdef(groups) = c.payload else {
            panic!("expected sdef");
        };
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[2].1.len(), 3);
    }

    #[test]
    fn unknown_cards_are_opaque() {
        let c = card("blah 1 2 3");
        assert_eq!(c.payload, Payload::Opaque(vec!["1".into(), "2".into(), "3".into()]));
        assert!(!is_known_card(&c.mnemonic));
        assert!(is_known_card("print"));
    }
}
