//! TAC optimisation: a fixed-point pass pipeline, applied per function.

mod constant_folding;
mod constant_propagation;
mod copy_propagation;
mod dead_code;
mod index_propagation;

use log::warn;

use crate::listing::Position;
use crate::tac::{next_function_span, FunctionSpan, TacListing};

/// Iteration cap for the per-function fixed-point loop. Hitting it is a
/// warning, not an error; the last state is kept.
const MAX_ITERATIONS: usize = 100;

/// Optimise every function in the listing, in place.
pub fn optimise(listing: &mut TacListing) {
    let mut from = Position(0);
    while let Some(span) = next_function_span(listing, from) {
        optimise_function(listing, span);
        from = span.start + 1;
    }
}

/// Run the four rewriting passes to a fixed point, then eliminate dead
/// code exactly once.
fn optimise_function(listing: &mut TacListing, span: FunctionSpan) {
    for iteration in 1..=MAX_ITERATIONS {
        let mut changed = false;
        changed |= constant_propagation::apply(listing, span);
        changed |= index_propagation::apply(listing, span);
        changed |= constant_folding::apply(listing, span);
        changed |= copy_propagation::apply(listing, span);
        if !changed {
            break;
        }
        if iteration == MAX_ITERATIONS {
            warn!(
                "no fixed point after {} optimiser iterations, keeping the last state",
                MAX_ITERATIONS
            );
        }
    }
    dead_code::apply(listing, span);
}
