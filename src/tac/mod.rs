//! The three-address-code intermediate representation.

mod instr;
mod parser;

pub use instr::*;
pub use parser::{parse, ParseError};

use log::warn;

use crate::listing::Position;
use crate::symbols::SymbolTable;

/// A compilation unit: the flat TAC listing plus the symbols it refers to.
#[derive(Debug)]
pub struct TacProgram {
    pub symbols: SymbolTable,
    pub listing: TacListing,
}

/// A function's span within the listing: its `label` instruction through
/// the matching `epilogue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpan {
    pub start: Position,
    pub end: Position,
}

impl FunctionSpan {
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        (self.start.0..=self.end.0).map(Position)
    }

    /// Positions strictly after `position`, up to and including the end of
    /// the span.
    pub fn after(&self, position: Position) -> impl Iterator<Item = Position> {
        (position.0 + 1..=self.end.0).map(Position)
    }
}

/// Find the next function at or after `from`: a `label` immediately
/// followed by a `prologue`, ending at the first `epilogue` after it.
/// Labels that are mere jump targets do not start a function.
pub fn next_function_span(listing: &TacListing, from: Position) -> Option<FunctionSpan> {
    let start = listing.iter_lines().skip(from.0).find_map(|(line, instr)| {
        let starts_function = matches!(instr, TacInstr::Label(_))
            && line.0 + 1 < listing.len()
            && matches!(listing.at(line + 1), TacInstr::Prologue);
        starts_function.then_some(line)
    })?;

    let end = listing
        .iter_lines()
        .skip(start.0)
        .find_map(|(line, instr)| matches!(instr, TacInstr::Epilogue).then_some(line));

    match end {
        Some(end) => Some(FunctionSpan { start, end }),
        None => {
            warn!("function at line {} has no epilogue", start);
            None
        }
    }
}
