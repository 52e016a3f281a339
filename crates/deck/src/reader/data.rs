// standard library
use std::collections::{BTreeMap, BTreeSet};

// external crates
use log::{debug, trace};

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use super::Reader;
use crate::core::{DataCard, Payload};
use crate::diagnostic::{Code, Diagnostic, Span};
use crate::lexer::LogicalLine;
use crate::parsers::{is_known_card, parse_data};

impl Reader {
    pub(super) fn read_data(&mut self, lines: &[LogicalLine]) {
        debug!("---------------------");
        debug!(" Parsing data block ");
        debug!("---------------------");

        let mut seen: BTreeMap<(&'static str, u32), Span> = BTreeMap::new();
        let mut unknown: BTreeSet<String> = BTreeSet::new();

        for line in lines {
            trace!("{:?} {}", line.span, line.text);
            let (mut card, issues) = match parse_data(&line.text) {
                Ok(parsed) => parsed,
                Err(failure) => {
                    self.failure(failure, line.span);
                    continue;
                }
            };

            for issue in issues {
                self.failure(issue, line.span);
            }

            if !is_known_card(&card.mnemonic) && unknown.insert(card.mnemonic.clone()) {
                self.report(Diagnostic::new(
                    Code::UnknownDataCard,
                    Some(line.span),
                    f!("unknown data card '{}' kept as raw text", card.mnemonic),
                ));
            }

            if let Some(key) = numbered_entity(&card) {
                if let Some(first) = seen.get(&key) {
                    self.duplicate(key.0, key.1, line.span, *first);
                    continue;
                }
                seen.insert(key, line.span);
            }

            set_span(&mut card, line.span);
            self.check_fractions(&card);
            self.deck.data.push(card);
        }

        debug!("Read {} data cards", self.deck.data.len());
    }

    /// Material fractions must be all atom or all mass
    fn check_fractions(&mut self, card: &DataCard) {
        let Payload::Material(material) = &card.payload else {
            return;
        };

        if material.fraction_kind().is_none() && !material.components.is_empty() {
            let atom = material
                .components
                .iter()
                .filter(|c| c.fraction >= 0.0)
                .count();
            let diagnostic = Diagnostic::new(
                Code::MaterialMixedFractions,
                Some(card.span),
                f!(
                    "material {}: mixes {atom} atom and {} mass fractions",
                    material.number,
                    material.components.len() - atom,
                ),
            )
            .with("material", material.number);
            self.report(diagnostic);
        }
    }
}

/// Entity kind and number for cards that may only be defined once
fn numbered_entity(card: &DataCard) -> Option<(&'static str, u32)> {
    match &card.payload {
        Payload::Material(m) => Some(("material", m.number)),
        Payload::Transform(t) => Some(("transform", t.number)),
        Payload::Tally(t) => Some(("tally", t.number)),
        _ => None,
    }
}

/// Attach the span to the card and to the record it carries
fn set_span(card: &mut DataCard, span: Span) {
    card.span = span;
    match &mut card.payload {
        Payload::Material(m) => m.span = span,
        Payload::Thermal(t) => t.span = span,
        Payload::Transform(t) => t.span = span,
        Payload::Tally(t) => t.span = span,
        _ => (),
    }
}
