use crate::tac::{BinOp, FunctionSpan, Literal, TacInstr, TacListing, Value};

/// Fold two-operand arithmetic on literal operands. Control-flow,
/// comparison, logical, memory and call opcodes are left alone.
pub(super) fn apply(listing: &mut TacListing, span: FunctionSpan) -> bool {
    let mut changed = false;
    for position in span.positions() {
        let instr = listing.at_mut(position);
        let (dest, folded) = {
            let TacInstr::Bin(dest, op, lhs, rhs) = &*instr else {
                continue;
            };
            if !op.is_arithmetic() {
                continue;
            }
            let (Value::Const(lhs), Value::Const(rhs)) = (lhs, rhs) else {
                continue;
            };
            match fold(*op, *lhs, *rhs) {
                Some(folded) => (dest.clone(), folded),
                // Division by zero: leave the instruction unmodified.
                None => continue,
            }
        };
        *instr = TacInstr::Assign(dest, Value::Const(folded));
        changed = true;
    }
    changed
}

/// Compute `lhs op rhs` at compile time: integer arithmetic when neither
/// operand is a decimal, double precision otherwise.
fn fold(op: BinOp, lhs: Literal, rhs: Literal) -> Option<Literal> {
    if op.is_division() && rhs.is_zero() {
        return None;
    }

    let literal = if lhs.is_float() || rhs.is_float() {
        let (lhs, rhs) = (lhs.as_float(), rhs.as_float());
        Literal::Float(match op {
            BinOp::Add | BinOp::FAdd => lhs + rhs,
            BinOp::Sub | BinOp::FSub => lhs - rhs,
            BinOp::Mul | BinOp::FMul => lhs * rhs,
            BinOp::Div | BinOp::FDiv => lhs / rhs,
            _ => unreachable!("fold applies to arithmetic operators only"),
        })
    } else {
        let (lhs, rhs) = (lhs.as_int(), rhs.as_int());
        Literal::Int(match op {
            BinOp::Add | BinOp::FAdd => lhs + rhs,
            BinOp::Sub | BinOp::FSub => lhs - rhs,
            BinOp::Mul | BinOp::FMul => lhs * rhs,
            BinOp::Div | BinOp::FDiv => lhs / rhs,
            _ => unreachable!("fold applies to arithmetic operators only"),
        })
    };
    Some(literal)
}

#[cfg(test)]
mod tests {
    use super::super::tests::optimised_lines;
    use super::*;

    macro_rules! assert_folds {
        ($source:expr, $expected:expr) => {{
            let lines = optimised_lines($source, |listing, span| {
                apply(listing, span);
            });
            assert_eq!($expected, lines);
        }};
    }

    #[test]
    fn folds_integer_arithmetic() {
        assert_folds!(
            "main:\nprologue\nt1 = 2 + 3\nepilogue\n",
            vec!["main:", "prologue", "t1 = 5", "epilogue"]
        );
    }

    #[test]
    fn folds_float_arithmetic_with_six_decimals() {
        assert_folds!(
            "main:\nprologue\nt1 = 1.000000 fadd 2.000000\nepilogue\n",
            vec!["main:", "prologue", "t1 = 3.000000", "epilogue"]
        );
    }

    #[test]
    fn division_by_zero_is_never_folded() {
        assert_folds!(
            "main:\nprologue\nt1 = 5 / 0\nt2 = 1.000000 fdiv 0.000000\nepilogue\n",
            vec![
                "main:",
                "prologue",
                "t1 = 5 / 0",
                "t2 = 1.000000 fdiv 0.000000",
                "epilogue"
            ]
        );
    }

    #[test]
    fn comparisons_are_excluded() {
        assert_folds!(
            "main:\nprologue\nt1 = 2 < 3\nepilogue\n",
            vec!["main:", "prologue", "t1 = 2 < 3", "epilogue"]
        );
    }

    #[test]
    fn mixed_operands_fold_in_double_precision() {
        assert_folds!(
            "main:\nprologue\nt1 = 2 * 1.500000\nepilogue\n",
            vec!["main:", "prologue", "t1 = 3.000000", "epilogue"]
        );
    }
}
