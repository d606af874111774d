//! Declared symbols, as consumed by the optimiser and the code generator.
//!
//! The front end owns scope resolution; by the time TAC reaches this crate
//! every name is unique, so a flat table suffices.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::tac::Literal;

/// A declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Bool,
    Char,
    Void,
}

impl Type {
    pub fn parse(name: &str) -> Option<Type> {
        Some(match name {
            "int" => Type::Int,
            "float" => Type::Float,
            "bool" => Type::Bool,
            "char" => Type::Char,
            "void" => Type::Void,
            _ => return None,
        })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Bool => "bool",
            Type::Char => "char",
            Type::Void => "void",
        })
    }
}

/// A declared variable, array or function.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    /// The declared initial value, if any. Scalars only.
    pub value: Option<Literal>,
    pub is_array: bool,
    pub is_function: bool,
    /// Element count for arrays.
    pub array_size: Option<usize>,
}

impl Symbol {
    pub fn scalar<S: Into<String>>(name: S, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            value: None,
            is_array: false,
            is_function: false,
            array_size: None,
        }
    }

    pub fn array<S: Into<String>>(name: S, ty: Type, size: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            value: None,
            is_array: true,
            is_function: false,
            array_size: Some(size),
        }
    }

    pub fn function<S: Into<String>>(name: S, return_type: Type) -> Self {
        Self {
            name: name.into(),
            ty: return_type,
            value: None,
            is_array: false,
            is_function: true,
            array_size: None,
        }
    }
}

/// A flat symbol table with insertion-order enumeration, so the data
/// segment comes out in declaration order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a symbol, replacing any previous declaration of the same name.
    pub fn insert(&mut self, symbol: Symbol) {
        match self.index.get(&symbol.name) {
            Some(&at) => self.symbols[at] = symbol,
            None => {
                self.index.insert(symbol.name.clone(), self.symbols.len());
                self.symbols.push(symbol);
            }
        }
    }

    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&at| &self.symbols[at])
    }

    pub fn update_value(&mut self, name: &str, value: Literal) {
        if let Some(&at) = self.index.get(name) {
            self.symbols[at].value = Some(value);
        }
    }

    pub fn value_of(&self, name: &str) -> Option<Literal> {
        self.find(name).and_then(|symbol| symbol.value)
    }

    /// All declared data symbols (everything but functions), in
    /// declaration order.
    pub fn data_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|symbol| !symbol.is_function)
    }
}
