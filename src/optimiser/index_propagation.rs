use std::collections::HashMap;

use crate::tac::{FunctionSpan, Literal, Name, TacInstr, TacListing, Value};

pub(super) fn apply(listing: &mut TacListing, span: FunctionSpan) -> bool {
    IndexPropagation::default().run(listing, span)
}

/// Rewrites variable array indices with their known constant values.
/// Keeps its own scalar constant map, independent of constant
/// propagation's, with the same reset-on-boundary semantics.
#[derive(Default)]
struct IndexPropagation {
    constants: HashMap<Name, Literal>,
}

impl IndexPropagation {
    fn run(&mut self, listing: &mut TacListing, span: FunctionSpan) -> bool {
        let mut changed = false;
        for position in span.positions() {
            let instr = listing.at_mut(position);
            if instr.is_boundary() {
                self.constants.clear();
                continue;
            }

            // Indices are read before the instruction takes effect, so
            // rewrite first, then update the map.
            changed |= self.rewrite_index(instr);
            self.track(instr);
        }
        changed
    }

    fn rewrite_index(&self, instr: &mut TacInstr) -> bool {
        let Some(element) = instr.element_mut() else {
            return false;
        };
        if let Value::Name(name) = &element.index {
            if let Some(literal @ Literal::Int(_)) = self.constants.get(name) {
                element.index = Value::Const(*literal);
                return true;
            }
        }
        false
    }

    fn track(&mut self, instr: &TacInstr) {
        match instr {
            TacInstr::Assign(dest, Value::Const(literal)) => {
                self.constants.insert(dest.clone(), *literal);
            }
            TacInstr::Assign(dest, Value::Name(src)) => match self.constants.get(src).copied() {
                Some(literal) => {
                    self.constants.insert(dest.clone(), literal);
                }
                None => {
                    self.constants.remove(dest);
                }
            },
            other => {
                if let Some(result) = other.defines() {
                    self.constants.remove(result);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::optimised_lines;
    use super::*;

    macro_rules! assert_rewrites {
        ($source:expr, $expected:expr) => {{
            let lines = optimised_lines($source, |listing, span| {
                apply(listing, span);
            });
            assert_eq!($expected, lines);
        }};
    }

    #[test]
    fn rewrites_variable_indices_with_known_constants() {
        assert_rewrites!(
            "main:\nprologue\ni = 2\nx = arr [ i ]\narr [ i ] = 9\nepilogue\n",
            vec![
                "main:",
                "prologue",
                "i = 2",
                "x = arr [ 2 ]",
                "arr [ 2 ] = 9",
                "epilogue"
            ]
        );
    }

    #[test]
    fn tracks_constants_through_copies() {
        assert_rewrites!(
            "main:\nprologue\ni = 2\nj = i\nx = arr [ j ]\nepilogue\n",
            vec![
                "main:",
                "prologue",
                "i = 2",
                "j = i",
                "x = arr [ 2 ]",
                "epilogue"
            ]
        );
    }

    #[test]
    fn boundaries_clear_the_map() {
        assert_rewrites!(
            "main:\nprologue\ni = 2\ncall foo\nx = arr [ i ]\nepilogue\n",
            vec![
                "main:",
                "prologue",
                "i = 2",
                "call foo",
                "x = arr [ i ]",
                "epilogue"
            ]
        );
    }
}
