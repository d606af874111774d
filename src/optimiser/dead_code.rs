use crate::listing::Position;
use crate::tac::{FunctionSpan, Name, TacInstr, TacListing};

/// Remove instructions whose result is never read before its next
/// redefinition or the function's epilogue. Instructions with side
/// effects, and the front end's `result` return slot, are never removed.
pub(super) fn apply(listing: &mut TacListing, span: FunctionSpan) {
    let mut dead = vec![];
    for position in span.positions() {
        let instr = listing.at(position);
        if instr.has_side_effect() {
            continue;
        }
        let Some(result) = instr.defines() else {
            continue;
        };
        if matches!(result, Name::Var(name) if name == "result") {
            continue;
        }
        if !read_before_redefinition(listing, span, position, result) {
            dead.push(position);
        }
    }
    remove_lines(listing, dead);
}

fn read_before_redefinition(
    listing: &TacListing,
    span: FunctionSpan,
    position: Position,
    name: &Name,
) -> bool {
    for later in span.after(position) {
        let instr = listing.at(later);
        if instr.reads_from(name) {
            return true;
        }
        if matches!(instr, TacInstr::Epilogue) || instr.defines() == Some(name) {
            return false;
        }
    }
    false
}

fn remove_lines(listing: &mut TacListing, mut lines: Vec<Position>) {
    lines.sort_unstable();
    lines.reverse();
    for line in lines {
        listing.remove(line);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::optimised_lines;
    use super::*;

    macro_rules! assert_eliminates {
        ($source:expr, $expected:expr) => {{
            let lines = optimised_lines($source, |listing, span| apply(listing, span));
            assert_eq!($expected, lines);
        }};
    }

    #[test]
    fn unread_results_are_removed() {
        assert_eliminates!(
            "main:\nprologue\nt1 = 1 + 1\nwrite 0\nepilogue\n",
            vec!["main:", "prologue", "write 0", "epilogue"]
        );
    }

    #[test]
    fn side_effects_are_never_removed() {
        assert_eliminates!(
            "main:\nprologue\nwrite 1\narr [ 0 ] = 2\ncall foo\nepilogue\n",
            vec![
                "main:",
                "prologue",
                "write 1",
                "arr [ 0 ] = 2",
                "call foo",
                "epilogue"
            ]
        );
    }

    #[test]
    fn the_return_slot_is_never_removed() {
        assert_eliminates!(
            "main:\nprologue\nresult = 3\nepilogue\n",
            vec!["main:", "prologue", "result = 3", "epilogue"]
        );
    }

    #[test]
    fn a_read_before_redefinition_keeps_the_instruction() {
        assert_eliminates!(
            "main:\nprologue\na = 1\nwrite a\na = 2\nwrite a\nepilogue\n",
            vec![
                "main:",
                "prologue",
                "a = 1",
                "write a",
                "a = 2",
                "write a",
                "epilogue"
            ]
        );
    }

    #[test]
    fn a_redefinition_before_any_read_kills_the_first_definition() {
        assert_eliminates!(
            "main:\nprologue\na = 1\na = 2\nwrite a\nepilogue\n",
            vec!["main:", "prologue", "a = 2", "write a", "epilogue"]
        );
    }
}
