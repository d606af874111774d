//! MIPS assembly text, in the form SPIM accepts.

use std::fmt::{self, Display, Formatter};

use super::registers::Register;

/// A complete assembly file: a data segment and a text segment.
pub struct Assembly {
    pub data: Data,
    pub text: Text,
}

impl Assembly {
    pub fn new() -> Self {
        Self {
            data: Data::new(),
            text: Text::new(),
        }
    }
}

impl Display for Assembly {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.data)?;
        write!(f, "{}", self.text)
    }
}

/// The `.data` segment: one declaration per global scalar, array or float
/// literal.
pub struct Data {
    lines: Vec<Line<Directive>>,
}

impl Data {
    pub fn new() -> Self {
        Self { lines: vec![] }
    }

    pub fn word(&mut self, name: &str, value: i64) -> &mut Self {
        self.lines
            .push(Line::new(Directive::Word(name.to_string(), value)));
        self
    }

    pub fn float(&mut self, name: &str, value: f64) -> &mut Self {
        self.lines
            .push(Line::new(Directive::Float(name.to_string(), value)));
        self
    }

    pub fn space(&mut self, name: &str, bytes: usize) -> &mut Self {
        self.lines
            .push(Line::new(Directive::Space(name.to_string(), bytes)));
        self
    }
}

impl Display for Data {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, ".data")?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// A `.data` directive.
pub enum Directive {
    Word(String, i64),
    Float(String, f64),
    Space(String, usize),
}

impl Display for Directive {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Directive::Word(name, value) => {
                write!(f, "{:11} .word {}", format!("{}:", name), value)
            }
            Directive::Float(name, value) => {
                write!(f, "{:11} .float {:.6}", format!("{}:", name), value)
            }
            Directive::Space(name, bytes) => {
                write!(f, "{:11} .space {}", format!("{}:", name), bytes)
            }
        }
    }
}

/// The `.text` segment: labels and straight-line instructions.
pub struct Text {
    lines: Vec<Line<TextItem>>,
}

enum TextItem {
    Label(String),
    Instr(Instr),
    Directive(String),
}

impl Text {
    pub fn new() -> Self {
        Self { lines: vec![] }
    }

    pub fn push<V: Into<Vec<Operand>>>(&mut self, op: Op, operands: V) -> &mut Self {
        self.lines
            .push(Line::new(TextItem::Instr(Instr::new(op, operands.into()))));
        self
    }

    pub fn push_cmt<V: Into<Vec<Operand>>, S: Into<String>>(
        &mut self,
        op: Op,
        operands: V,
        comment: S,
    ) -> &mut Self {
        self.lines.push(Line::new_cmt(
            TextItem::Instr(Instr::new(op, operands.into())),
            comment.into(),
        ));
        self
    }

    pub fn add_label(&mut self, name: &str) -> &mut Self {
        self.lines
            .push(Line::new(TextItem::Label(name.to_string())));
        self
    }

    pub fn directive(&mut self, text: &str) -> &mut Self {
        self.lines
            .push(Line::new(TextItem::Directive(text.to_string())));
        self
    }
}

impl Display for Text {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, ".text")?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl Display for TextItem {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TextItem::Label(name) => write!(f, "{}:", name),
            TextItem::Instr(instr) => instr.fmt(f),
            TextItem::Directive(text) => f.write_str(text),
        }
    }
}

/// A line of assembly with an optional comment.
struct Line<T> {
    line: T,
    comment: Option<String>,
}

impl<T> Line<T> {
    fn new(line: T) -> Self {
        Self {
            line,
            comment: None,
        }
    }

    fn new_cmt(line: T, comment: String) -> Self {
        Self {
            line,
            comment: Some(comment),
        }
    }
}

impl<T: Display> Display for Line<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.comment.as_ref() {
            None => write!(f, "{}", self.line),
            Some(comment) => write!(f, "{:32}# {}", self.line.to_string(), comment),
        }
    }
}

/// A single instruction: an operator and zero or more operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    operator: Op,
    operands: Vec<Operand>,
}

impl Instr {
    pub fn new(operator: Op, operands: Vec<Operand>) -> Instr {
        Self { operator, operands }
    }
}

impl Display for Instr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.operands.is_empty() {
            return write!(f, "    {}", self.operator);
        }
        write!(f, "    {:7} ", self.operator.to_string())?;
        let operands = self
            .operands
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&operands)
    }
}

/// An operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A register.
    Reg(Register),
    /// An immediate value.
    Imm(i64),
    /// A symbol or label.
    Sym(String),
    /// A register-relative memory reference, `offset($reg)`.
    Mem(i32, Register),
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Operand::Reg(register) => register.fmt(f),
            Operand::Imm(value) => value.fmt(f),
            Operand::Sym(name) => f.write_str(name),
            Operand::Mem(offset, register) => write!(f, "{}({})", offset, register),
        }
    }
}

/// The instruction mnemonics the code generator emits. `seq` through
/// `sge` and the label-addressed loads and stores are SPIM pseudo-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Loads, stores, moves
    Li,
    La,
    Lw,
    Sw,
    LS,
    SS,
    Lwc1,
    Swc1,
    Move,
    MovS,
    Mtc1,
    Mfc1,
    CvtSW,
    CvtWS,
    // Integer arithmetic and logic
    Addiu,
    Addu,
    Subu,
    Mul,
    Div,
    And,
    Or,
    Sll,
    Sltiu,
    // Integer comparisons
    Seq,
    Sne,
    Slt,
    Sle,
    Sgt,
    Sge,
    // Float arithmetic and comparisons
    AddS,
    SubS,
    MulS,
    DivS,
    CEqS,
    CLtS,
    CLeS,
    Bc1t,
    // Control
    J,
    Jal,
    Jr,
    Syscall,
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Op::Li => "li",
            Op::La => "la",
            Op::Lw => "lw",
            Op::Sw => "sw",
            Op::LS => "l.s",
            Op::SS => "s.s",
            Op::Lwc1 => "lwc1",
            Op::Swc1 => "swc1",
            Op::Move => "move",
            Op::MovS => "mov.s",
            Op::Mtc1 => "mtc1",
            Op::Mfc1 => "mfc1",
            Op::CvtSW => "cvt.s.w",
            Op::CvtWS => "cvt.w.s",
            Op::Addiu => "addiu",
            Op::Addu => "addu",
            Op::Subu => "subu",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::And => "and",
            Op::Or => "or",
            Op::Sll => "sll",
            Op::Sltiu => "sltiu",
            Op::Seq => "seq",
            Op::Sne => "sne",
            Op::Slt => "slt",
            Op::Sle => "sle",
            Op::Sgt => "sgt",
            Op::Sge => "sge",
            Op::AddS => "add.s",
            Op::SubS => "sub.s",
            Op::MulS => "mul.s",
            Op::DivS => "div.s",
            Op::CEqS => "c.eq.s",
            Op::CLtS => "c.lt.s",
            Op::CLeS => "c.le.s",
            Op::Bc1t => "bc1t",
            Op::J => "j",
            Op::Jal => "jal",
            Op::Jr => "jr",
            Op::Syscall => "syscall",
        })
    }
}
