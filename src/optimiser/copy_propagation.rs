use crate::tac::{FunctionSpan, TacInstr, TacListing, Value};

/// For every copy `dest = src` where `src` is a bare name, substitute
/// `src` for later reads of `dest`, stopping at the first redefinition of
/// `dest` or at a prologue/epilogue/call boundary.
pub(super) fn apply(listing: &mut TacListing, span: FunctionSpan) -> bool {
    let mut changed = false;
    for position in span.positions() {
        let (dest, src) = match listing.at(position) {
            TacInstr::Assign(dest, Value::Name(src)) => (dest.clone(), src.clone()),
            _ => continue,
        };
        if dest == src {
            continue;
        }

        let replacement = Value::Name(src);
        for later in span.after(position) {
            let instr = listing.at_mut(later);
            if instr.is_boundary() {
                break;
            }
            changed |= instr.replace_reads(&dest, &replacement);
            if instr.defines() == Some(&dest) {
                break;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::super::tests::optimised_lines;
    use super::*;

    macro_rules! assert_copies {
        ($source:expr, $expected:expr) => {{
            let lines = optimised_lines($source, |listing, span| {
                apply(listing, span);
            });
            assert_eq!($expected, lines);
        }};
    }

    #[test]
    fn substitutes_the_copied_name_forward() {
        assert_copies!(
            "main:\nprologue\nt1 = x\nt2 = t1 + 1\nepilogue\n",
            vec!["main:", "prologue", "t1 = x", "t2 = x + 1", "epilogue"]
        );
    }

    #[test]
    fn stops_at_a_redefinition_of_the_destination() {
        assert_copies!(
            "main:\nprologue\na = b\nc = a\na = 9\nd = a\nepilogue\n",
            vec![
                "main:",
                "prologue",
                "a = b",
                "c = b",
                "a = 9",
                "d = a",
                "epilogue"
            ]
        );
    }

    #[test]
    fn stops_at_a_call_boundary() {
        assert_copies!(
            "main:\nprologue\na = b\ncall foo\nc = a\nepilogue\n",
            vec![
                "main:",
                "prologue",
                "a = b",
                "call foo",
                "c = a",
                "epilogue"
            ]
        );
    }

    #[test]
    fn literal_assignments_are_not_copies() {
        assert_copies!(
            "main:\nprologue\na = 5\nc = a\nepilogue\n",
            vec!["main:", "prologue", "a = 5", "c = a", "epilogue"]
        );
    }
}
