use log::warn;

use crate::error::CompileError;
use crate::listing::Position;
use crate::symbols::{SymbolTable, Type};
use crate::tac::{BinOp, Element, FunctionSpan, Name, TacInstr, TacListing, Value};

use super::allocator::RegisterAllocator;
use super::assembly::{Op, Operand::*, Text};
use super::calling_convention as cc;
use super::float_table::FloatTable;
use super::label_generator::LabelGenerator;
use super::registers::Register::{self, *};

use Op::*;

/// Lowers one function's TAC span to assembly, driving the register
/// allocator on demand.
pub struct FunctionCompiler<'c> {
    listing: &'c TacListing,
    span: FunctionSpan,
    symbols: &'c SymbolTable,
    text: &'c mut Text,
    floats: &'c mut FloatTable,
    labels: &'c mut LabelGenerator,
    allocator: RegisterAllocator,
    /// Values staged by `param` instructions, consumed by the next call.
    pending_args: Vec<Value>,
    /// Anonymous registers acquired for the current instruction.
    scratch: Vec<Register>,
    current: Position,
    name: String,
    return_type: Type,
}

impl<'c> FunctionCompiler<'c> {
    /// Compile the function at `span` into the text segment.
    pub fn compile(
        listing: &'c TacListing,
        span: FunctionSpan,
        symbols: &'c SymbolTable,
        floats: &'c mut FloatTable,
        labels: &'c mut LabelGenerator,
        text: &'c mut Text,
    ) -> Result<(), CompileError> {
        let name = match listing.at(span.start) {
            TacInstr::Label(name) => name.clone(),
            _ => unreachable!("function spans start at their label"),
        };
        let return_type = symbols.find(&name).map(|s| s.ty).unwrap_or(Type::Void);

        let mut compiler = Self {
            listing,
            span,
            symbols,
            text,
            floats,
            labels,
            allocator: RegisterAllocator::new(),
            pending_args: vec![],
            scratch: vec![],
            current: span.start,
            name,
            return_type,
        };
        compiler.compile_function()
    }

    fn compile_function(&mut self) -> Result<(), CompileError> {
        for position in self.span.positions() {
            self.current = position;
            let instr = self.listing.at(position).clone();
            self.compile_instr(&instr)?;
            self.release_after(&instr);
        }
        Ok(())
    }

    /// Compile a single TAC instruction.
    fn compile_instr(&mut self, instr: &TacInstr) -> Result<(), CompileError> {
        let comment = instr.to_string();
        match instr {
            TacInstr::Label(name) => {
                self.text.add_label(name);
            }
            TacInstr::Prologue => self.compile_prologue(),
            TacInstr::Epilogue => self.compile_epilogue(),
            TacInstr::Assign(dest, value) => self.compile_assign(dest, value, comment)?,
            TacInstr::Bin(dest, op, lhs, rhs) => {
                self.compile_bin(dest, *op, lhs, rhs, comment)?
            }
            TacInstr::Not(dest, value) => {
                let value = self.ensure_int(value)?;
                let dest = self.allocator.bind_int(dest.clone())?;
                self.text.push_cmt(Sltiu, [Reg(dest), Reg(value), Imm(1)], comment);
            }
            TacInstr::LoadElem(dest, element) => self.compile_load(dest, element, comment)?,
            TacInstr::StoreElem(element, value) => {
                self.compile_store(element, value, comment)?
            }
            TacInstr::Param(value) => self.pending_args.push(value.clone()),
            TacInstr::Call(name) => self.compile_call(name, comment)?,
            TacInstr::Goto(label) => {
                self.text.push_cmt(J, [Sym(label.clone())], comment);
            }
            TacInstr::Write(value) => {
                let value = self.ensure_int(value)?;
                self.text.push_cmt(Li, [Reg(V0), Imm(1)], comment);
                self.text.push(Move, [Reg(A0), Reg(value)]);
                self.text.push(Syscall, []);
            }
            TacInstr::WriteFloat(value) => {
                let value = self.ensure_float(value)?;
                self.text.push_cmt(Li, [Reg(V0), Imm(2)], comment);
                self.text.push(MovS, [Reg(F12), Reg(value)]);
                self.text.push(Syscall, []);
            }
            TacInstr::Return(value) => self.compile_return(value.as_ref(), comment)?,
            TacInstr::IfFalse(_, _) => {
                warn!("skipping instruction with no lowering: {}", instr);
            }
        }
        Ok(())
    }

    fn compile_prologue(&mut self) {
        self.allocator.reset();
        self.text
            .push_cmt(Addiu, [Reg(Sp), Reg(Sp), Imm(-8)], "prologue");
        self.text.push(Sw, [Reg(Fp), Mem(4, Sp)]);
        self.text.push(Sw, [Reg(Ra), Mem(0, Sp)]);
        self.text.push(Move, [Reg(Fp), Reg(Sp)]);
    }

    fn compile_epilogue(&mut self) {
        self.text.push_cmt(Move, [Reg(Sp), Reg(Fp)], "epilogue");
        self.text.push(Lw, [Reg(Ra), Mem(0, Sp)]);
        self.text.push(Lw, [Reg(Fp), Mem(4, Sp)]);
        self.text.push(Addiu, [Reg(Sp), Reg(Sp), Imm(8)]);
        if self.name == "main" {
            self.text.push_cmt(Li, [Reg(V0), Imm(10)], "exit");
            self.text.push(Syscall, []);
        } else {
            self.text.push(Jr, [Reg(Ra)]);
        }
    }

    fn compile_assign(
        &mut self,
        dest: &Name,
        value: &Value,
        comment: String,
    ) -> Result<(), CompileError> {
        // A declared destination dictates the assignment's kind; a
        // temporary takes whichever kind the value has.
        let float = match dest {
            Name::Var(_) => self.name_is_float(dest),
            Name::Temp(_) => {
                self.allocator.lookup_float(dest).is_some() || self.value_is_float(value)
            }
        };
        if float {
            let dest = self.allocator.bind_float(dest.clone())?;
            match value {
                Value::Const(literal) if literal.is_float() => {
                    let label = self.floats.label_for(literal.as_float());
                    self.text.push_cmt(LS, [Reg(dest), Sym(label)], comment);
                }
                _ => {
                    let value = self.ensure_float(value)?;
                    self.text.push_cmt(MovS, [Reg(dest), Reg(value)], comment);
                }
            }
        } else {
            match value {
                Value::Const(literal) => {
                    let dest = self.allocator.bind_int(dest.clone())?;
                    self.text
                        .push_cmt(Li, [Reg(dest), Imm(literal.as_int())], comment);
                }
                _ => {
                    let value = self.ensure_int(value)?;
                    let dest = self.allocator.bind_int(dest.clone())?;
                    self.text.push_cmt(Move, [Reg(dest), Reg(value)], comment);
                }
            }
        }
        Ok(())
    }

    fn compile_bin(
        &mut self,
        dest: &Name,
        op: BinOp,
        lhs: &Value,
        rhs: &Value,
        comment: String,
    ) -> Result<(), CompileError> {
        if op.is_comparison() {
            return self.compile_cmp(dest, op, lhs, rhs, comment);
        }

        if op.is_float_arithmetic() {
            let lhs = self.ensure_float(lhs)?;
            let rhs = self.ensure_float(rhs)?;
            let dest = self.allocator.bind_float(dest.clone())?;
            let op = match op {
                BinOp::FAdd => AddS,
                BinOp::FSub => SubS,
                BinOp::FMul => MulS,
                BinOp::FDiv => DivS,
                _ => unreachable!(),
            };
            self.text.push_cmt(op, [Reg(dest), Reg(lhs), Reg(rhs)], comment);
        } else {
            let lhs = self.ensure_int(lhs)?;
            let rhs = self.ensure_int(rhs)?;
            let dest = self.allocator.bind_int(dest.clone())?;
            let op = match op {
                BinOp::Add => Addu,
                BinOp::Sub => Subu,
                BinOp::Mul => Mul,
                BinOp::Div => Div,
                BinOp::And => And,
                BinOp::Or => Or,
                _ => unreachable!(),
            };
            self.text.push_cmt(op, [Reg(dest), Reg(lhs), Reg(rhs)], comment);
        }
        Ok(())
    }

    /// Compile a comparison to a 0/1 result. Integer comparisons use the
    /// set pseudo-ops; float comparisons set the FP condition flag and
    /// materialise it over a generated label.
    fn compile_cmp(
        &mut self,
        dest: &Name,
        op: BinOp,
        lhs: &Value,
        rhs: &Value,
        comment: String,
    ) -> Result<(), CompileError> {
        if !self.value_is_float(lhs) && !self.value_is_float(rhs) {
            let lhs = self.ensure_int(lhs)?;
            let rhs = self.ensure_int(rhs)?;
            let dest = self.allocator.bind_int(dest.clone())?;
            let op = match op {
                BinOp::Eq => Seq,
                BinOp::Ne => Sne,
                BinOp::Lt => Slt,
                BinOp::Le => Sle,
                BinOp::Gt => Sgt,
                BinOp::Ge => Sge,
                _ => unreachable!(),
            };
            self.text.push_cmt(op, [Reg(dest), Reg(lhs), Reg(rhs)], comment);
            return Ok(());
        }

        let lhs = self.ensure_float(lhs)?;
        let rhs = self.ensure_float(rhs)?;
        // Greater-than forms swap operands; `!=` inverts the materialised
        // flag. `<=` sets the flag twice and the branch consumes the last
        // one, matching the original lowering.
        let (compares, lhs, rhs, if_flag) = match op {
            BinOp::Eq => (&[CEqS][..], lhs, rhs, 1),
            BinOp::Ne => (&[CEqS][..], lhs, rhs, 0),
            BinOp::Lt => (&[CLtS][..], lhs, rhs, 1),
            BinOp::Le => (&[CLtS, CLeS][..], lhs, rhs, 1),
            BinOp::Gt => (&[CLtS][..], rhs, lhs, 1),
            BinOp::Ge => (&[CLeS][..], rhs, lhs, 1),
            _ => unreachable!(),
        };
        for (index, compare) in compares.iter().enumerate() {
            if index == 0 {
                self.text
                    .push_cmt(*compare, [Reg(lhs), Reg(rhs)], comment.clone());
            } else {
                self.text.push(*compare, [Reg(lhs), Reg(rhs)]);
            }
        }
        let dest = self.allocator.bind_int(dest.clone())?;
        let done = self.labels.next("cc");
        self.text.push(Li, [Reg(dest), Imm(if_flag)]);
        self.text.push(Bc1t, [Sym(done.clone())]);
        self.text.push(Li, [Reg(dest), Imm(1 - if_flag)]);
        self.text.add_label(&done);
        Ok(())
    }

    fn compile_load(
        &mut self,
        dest: &Name,
        element: &Element,
        comment: String,
    ) -> Result<(), CompileError> {
        let float = self.element_is_float(element)?;
        let address = self.element_address(element, comment)?;
        if float {
            let dest = self.allocator.bind_float(dest.clone())?;
            self.text.push(Lwc1, [Reg(dest), Mem(0, address)]);
        } else {
            let dest = self.allocator.bind_int(dest.clone())?;
            self.text.push(Lw, [Reg(dest), Mem(0, address)]);
        }
        Ok(())
    }

    fn compile_store(
        &mut self,
        element: &Element,
        value: &Value,
        comment: String,
    ) -> Result<(), CompileError> {
        let float = self.element_is_float(element)?;
        let value = if float {
            self.ensure_float(value)?
        } else {
            self.ensure_int(value)?
        };
        let address = self.element_address(element, comment)?;
        let op = if float { Swc1 } else { Sw };
        self.text.push(op, [Reg(value), Mem(0, address)]);
        Ok(())
    }

    /// Compute an element's address into the reserved scratch pair:
    /// `base + (index << 2)`. Elements are word-sized.
    fn element_address(
        &mut self,
        element: &Element,
        comment: String,
    ) -> Result<Register, CompileError> {
        let index = self.ensure_int(&element.index)?;
        let (address, shifted) = cc::ADDRESS_SCRATCH;
        self.text
            .push_cmt(La, [Reg(address), Sym(element.base.clone())], comment);
        self.text.push(Sll, [Reg(shifted), Reg(index), Imm(2)]);
        self.text
            .push(Addu, [Reg(address), Reg(address), Reg(shifted)]);
        Ok(address)
    }

    fn element_is_float(&self, element: &Element) -> Result<bool, CompileError> {
        self.symbols
            .find(&element.base)
            .map(|symbol| symbol.ty.is_float())
            .ok_or_else(|| CompileError::UnknownSymbol(element.base.clone()))
    }

    /// Move staged arguments into the argument registers and emit the
    /// call. Argument overflow is dropped with a warning.
    fn compile_call(&mut self, name: &str, comment: String) -> Result<(), CompileError> {
        let args = std::mem::take(&mut self.pending_args);
        let mut int_args = cc::INT_ARGS.iter();
        let mut float_args = cc::FLOAT_ARGS.iter();

        for (index, value) in args.iter().enumerate() {
            if self.value_is_float(value) {
                match float_args.next() {
                    Some(&register) => {
                        let value = self.ensure_float(value)?;
                        self.text.push(MovS, [Reg(register), Reg(value)]);
                    }
                    None => warn!(
                        "dropping argument {} to '{}': at most {} float arguments",
                        index + 1,
                        name,
                        cc::FLOAT_ARGS.len()
                    ),
                }
            } else {
                match int_args.next() {
                    Some(&register) => {
                        let value = self.ensure_int(value)?;
                        self.text.push(Move, [Reg(register), Reg(value)]);
                    }
                    None => warn!(
                        "dropping argument {} to '{}': at most {} integer arguments",
                        index + 1,
                        name,
                        cc::INT_ARGS.len()
                    ),
                }
            }
        }

        // Spill argument values that are now dead, then call.
        for value in &args {
            if let Some(name) = value.as_name() {
                self.store_if_unused(&name.clone());
            }
        }
        self.text.push_cmt(Jal, [Sym(name.to_string())], comment);

        let returns_float = self
            .symbols
            .find(name)
            .map(|symbol| symbol.ty.is_float())
            .unwrap_or(false);
        self.allocator.set_last_call_returned_float(returns_float);
        Ok(())
    }

    fn compile_return(
        &mut self,
        value: Option<&Value>,
        comment: String,
    ) -> Result<(), CompileError> {
        let Some(value) = value else {
            return Ok(());
        };
        if self.return_type.is_float() {
            let value = self.ensure_float(value)?;
            self.text
                .push_cmt(MovS, [Reg(cc::FLOAT_RETURN), Reg(value)], comment);
        } else {
            let value = self.ensure_int(value)?;
            self.text
                .push_cmt(Move, [Reg(cc::INT_RETURN), Reg(value)], comment);
        }
        Ok(())
    }

    /// Ensure a value is available in an integer register.
    fn ensure_int(&mut self, value: &Value) -> Result<Register, CompileError> {
        match value {
            Value::ReturnValue => {
                if !self.allocator.last_call_returned_float() {
                    return Ok(cc::INT_RETURN);
                }
                // The call returned a float; convert it out of $f0.
                let register = self.allocator.acquire_int()?;
                self.scratch.push(register);
                self.text.push(CvtWS, [Reg(cc::FLOAT_RETURN), Reg(cc::FLOAT_RETURN)]);
                self.text.push(Mfc1, [Reg(register), Reg(cc::FLOAT_RETURN)]);
                Ok(register)
            }
            Value::Const(literal) => {
                let register = self.allocator.acquire_int()?;
                self.scratch.push(register);
                self.text.push(Li, [Reg(register), Imm(literal.as_int())]);
                Ok(register)
            }
            Value::Name(name) => {
                if let Some(register) = self.allocator.lookup_int(name) {
                    return Ok(register);
                }
                if let Some(float_reg) = self.allocator.lookup_float(name) {
                    // Mapped as a float; convert in place and move pools.
                    self.text.push(CvtWS, [Reg(float_reg), Reg(float_reg)]);
                    let register = self.allocator.bind_int(name.clone())?;
                    self.text.push(Mfc1, [Reg(register), Reg(float_reg)]);
                    return Ok(register);
                }
                let symbol_ty = self.declared_type(name)?;
                if symbol_ty.is_float() {
                    self.load_float_from_memory(name)?;
                    return self.ensure_int(value);
                }
                let register = self.allocator.bind_int(name.clone())?;
                self.text
                    .push(Lw, [Reg(register), Sym(name.to_string())]);
                Ok(register)
            }
        }
    }

    /// Ensure a value is available in a float register.
    fn ensure_float(&mut self, value: &Value) -> Result<Register, CompileError> {
        match value {
            Value::ReturnValue => {
                if self.allocator.last_call_returned_float() {
                    return Ok(cc::FLOAT_RETURN);
                }
                // The call returned an integer; convert it out of $v0.
                let register = self.allocator.acquire_float()?;
                self.scratch.push(register);
                self.text.push(Mtc1, [Reg(cc::INT_RETURN), Reg(register)]);
                self.text.push(CvtSW, [Reg(register), Reg(register)]);
                Ok(register)
            }
            Value::Const(literal) => {
                if literal.is_float() {
                    let register = self.allocator.acquire_float()?;
                    self.scratch.push(register);
                    let label = self.floats.label_for(literal.as_float());
                    self.text.push(LS, [Reg(register), Sym(label)]);
                    return Ok(register);
                }
                // An integer literal requested as a float.
                let staging = self.allocator.acquire_int()?;
                self.scratch.push(staging);
                let register = self.allocator.acquire_float()?;
                self.scratch.push(register);
                self.text.push(Li, [Reg(staging), Imm(literal.as_int())]);
                self.text.push(Mtc1, [Reg(staging), Reg(register)]);
                self.text.push(CvtSW, [Reg(register), Reg(register)]);
                Ok(register)
            }
            Value::Name(name) => {
                if let Some(register) = self.allocator.lookup_float(name) {
                    return Ok(register);
                }
                if let Some(int_reg) = self.allocator.lookup_int(name) {
                    // Mapped as an integer; convert in place and move pools.
                    let register = self.allocator.bind_float(name.clone())?;
                    self.text.push(Mtc1, [Reg(int_reg), Reg(register)]);
                    self.text.push(CvtSW, [Reg(register), Reg(register)]);
                    return Ok(register);
                }
                let symbol_ty = self.declared_type(name)?;
                if !symbol_ty.is_float() {
                    let register = self.allocator.bind_int(name.clone())?;
                    self.text
                        .push(Lw, [Reg(register), Sym(name.to_string())]);
                    return self.ensure_float(value);
                }
                self.load_float_from_memory(name)
            }
        }
    }

    fn load_float_from_memory(&mut self, name: &Name) -> Result<Register, CompileError> {
        let register = self.allocator.bind_float(name.clone())?;
        self.text.push(LS, [Reg(register), Sym(name.to_string())]);
        Ok(register)
    }

    /// The declared type of a memory-backed name. Reading a temporary that
    /// was never materialised is fatal.
    fn declared_type(&self, name: &Name) -> Result<Type, CompileError> {
        match name {
            Name::Temp(index) => Err(CompileError::TempReadBeforeWrite(*index)),
            Name::Var(var) => self
                .symbols
                .find(var)
                .map(|symbol| symbol.ty)
                .ok_or_else(|| CompileError::UnknownSymbol(var.clone())),
        }
    }

    /// Release anonymous scratch, then apply the liveness rule to every
    /// name the instruction mentioned. Staged `param` values stay bound
    /// until their call.
    fn release_after(&mut self, instr: &TacInstr) {
        for register in std::mem::take(&mut self.scratch) {
            self.allocator.release(register);
        }
        if matches!(instr, TacInstr::Param(_)) {
            return;
        }
        for name in instr.names() {
            self.store_if_unused(&name);
        }
    }

    /// If `name` is not referenced again before the function ends, release
    /// its register, writing real symbols back to memory first.
    fn store_if_unused(&mut self, name: &Name) {
        if self
            .listing
            .is_referenced_after(name, self.current, self.span.end)
        {
            return;
        }
        let Some(register) = self.allocator.unbind(name) else {
            return;
        };
        if let Name::Var(var) = name {
            let memory_backed = self
                .symbols
                .find(var)
                .map(|symbol| !symbol.is_function && !symbol.is_array)
                .unwrap_or(false);
            if memory_backed {
                let op = if register.is_float() { SS } else { Sw };
                self.text
                    .push_cmt(op, [Reg(register), Sym(var.clone())], format!("{} is dead, write it back", var));
            }
        }
    }

    fn name_is_float(&self, name: &Name) -> bool {
        match name {
            Name::Var(var) => self
                .symbols
                .find(var)
                .map(|symbol| symbol.ty.is_float())
                .unwrap_or(false),
            Name::Temp(_) => self.allocator.lookup_float(name).is_some(),
        }
    }

    fn value_is_float(&self, value: &Value) -> bool {
        match value {
            Value::Const(literal) => literal.is_float(),
            Value::Name(name) => self.name_is_float(name),
            Value::ReturnValue => self.allocator.last_call_returned_float(),
        }
    }
}
