// standard library
use std::collections::BTreeMap;

// external crates
use log::{debug, trace};

// crate modules
use super::Reader;
use crate::diagnostic::Span;
use crate::lexer::LogicalLine;
use crate::parsers::parse_surface;

impl Reader {
    pub(super) fn read_surfaces(&mut self, lines: &[LogicalLine]) {
        debug!("---------------------");
        debug!(" Parsing surface block ");
        debug!("---------------------");

        let mut seen: BTreeMap<u32, Span> = BTreeMap::new();

        for line in lines {
            trace!("{:?} {}", line.span, line.text);
            let (mut surface, issues) = match parse_surface(&line.text) {
                Ok(parsed) => parsed,
                Err(failure) => {
                    self.failure(failure, line.span);
                    continue;
                }
            };

            for issue in issues {
                self.failure(issue, line.span);
            }

            if let Some(first) = seen.get(&surface.number) {
                self.duplicate("surface", surface.number, line.span, *first);
                continue;
            }

            surface.span = line.span;
            seen.insert(surface.number, line.span);
            self.deck.surfaces.push(surface);
        }

        debug!("Read {} surfaces", self.deck.surfaces.len());
    }
}
