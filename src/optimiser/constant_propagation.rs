use std::collections::HashMap;

use crate::tac::{FunctionSpan, Literal, Name, TacInstr, TacListing, Value};

pub(super) fn apply(listing: &mut TacListing, span: FunctionSpan) -> bool {
    ConstantPropagation::default().run(listing, span)
}

/// Propagates known scalar and array-element constants through a function.
/// Both maps are cleared at every prologue, epilogue and call, since
/// cross-call and cross-scope aliasing is unknown.
#[derive(Default)]
struct ConstantPropagation {
    scalars: HashMap<Name, Literal>,
    elements: HashMap<(String, i64), Literal>,
}

impl ConstantPropagation {
    fn run(&mut self, listing: &mut TacListing, span: FunctionSpan) -> bool {
        let mut changed = false;
        for position in span.positions() {
            let instr = listing.at_mut(position);
            if instr.is_boundary() {
                self.scalars.clear();
                self.elements.clear();
                continue;
            }

            // Operands are rewritten both before and after the
            // opcode-specific transfer, so one sweep is idempotent.
            changed |= self.substitute(instr);
            changed |= self.transfer(instr);
            changed |= self.substitute(instr);
        }
        changed
    }

    /// Update the constant maps from one instruction, rewriting array loads
    /// whose element value is already known.
    fn transfer(&mut self, instr: &mut TacInstr) -> bool {
        match instr {
            TacInstr::Assign(dest, value) => {
                match value {
                    Value::Const(literal) => {
                        self.scalars.insert(dest.clone(), *literal);
                    }
                    _ => {
                        self.scalars.remove(dest);
                    }
                }
                false
            }
            TacInstr::LoadElem(dest, element) => {
                if let Some(index) = element.const_index() {
                    let known = self.elements.get(&(element.base.clone(), index)).copied();
                    if let Some(literal) = known {
                        let dest = dest.clone();
                        self.scalars.insert(dest.clone(), literal);
                        *instr = TacInstr::Assign(dest, Value::Const(literal));
                        return true;
                    }
                }
                self.scalars.remove(dest);
                false
            }
            TacInstr::StoreElem(element, value) => {
                if let Some(index) = element.const_index() {
                    let key = (element.base.clone(), index);
                    match value {
                        Value::Const(literal) => {
                            self.elements.insert(key, *literal);
                        }
                        Value::Name(name) => match self.scalars.get(name) {
                            Some(literal) => {
                                self.elements.insert(key, *literal);
                            }
                            None => {
                                self.elements.remove(&key);
                            }
                        },
                        Value::ReturnValue => {
                            self.elements.remove(&key);
                        }
                    }
                }
                // A store through a non-constant index leaves the element
                // map untouched.
                false
            }
            other => {
                if let Some(result) = other.defines() {
                    let result = result.clone();
                    self.scalars.remove(&result);
                }
                false
            }
        }
    }

    /// Rewrite reads of names with known constant values.
    fn substitute(&self, instr: &mut TacInstr) -> bool {
        let mut changed = false;
        instr.visit_reads(|value| {
            if let Value::Name(name) = value {
                if let Some(literal) = self.scalars.get(name) {
                    *value = Value::Const(*literal);
                    changed = true;
                }
            }
        });
        changed
    }
}
