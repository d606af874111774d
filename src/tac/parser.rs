//! A reader for the textual TAC dump, the boundary between the front end
//! and this crate. Declaration directives (`.global`, `.array`, `.func`)
//! populate the symbol table; every other line is one instruction in the
//! same grammar the dump writer produces.

use thiserror::Error;

use crate::symbols::{Symbol, SymbolTable, Type};

use super::{BinOp, Element, Literal, Name, TacInstr, TacListing, TacProgram, Value};

/// An error produced while reading a TAC dump.
#[derive(Debug, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    line: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("malformed instruction: '{0}'")]
    MalformedInstruction(String),
    #[error("malformed declaration: '{0}'")]
    MalformedDeclaration(String),
    #[error("unknown operator: '{0}'")]
    UnknownOperator(String),
    #[error("unknown type: '{0}'")]
    UnknownType(String),
    #[error("'{0}' cannot be assigned to")]
    InvalidDestination(String),
}

/// Parse a TAC dump into a program.
pub fn parse(source: &str) -> Result<TacProgram, ParseError> {
    let mut symbols = SymbolTable::new();
    let mut listing = TacListing::new();

    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let at_line = |kind| ParseError {
            line: index + 1,
            kind,
        };
        match line.strip_prefix('.') {
            Some(decl) => parse_declaration(decl, &mut symbols).map_err(at_line)?,
            None => listing.push(parse_instruction(line).map_err(at_line)?),
        }
    }

    Ok(TacProgram { symbols, listing })
}

fn parse_declaration(decl: &str, symbols: &mut SymbolTable) -> Result<(), ParseErrorKind> {
    let malformed = || ParseErrorKind::MalformedDeclaration(format!(".{}", decl));
    let tokens: Vec<_> = decl.split_whitespace().collect();

    let ty = |name: &str| {
        Type::parse(name).ok_or_else(|| ParseErrorKind::UnknownType(name.to_string()))
    };
    match tokens.as_slice() {
        ["global", type_name, name] => symbols.insert(Symbol::scalar(*name, ty(type_name)?)),
        ["global", type_name, name, default] => {
            symbols.insert(Symbol::scalar(*name, ty(type_name)?));
            symbols.update_value(name, parse_literal(default).ok_or_else(malformed)?);
        }
        ["array", type_name, name, size] => {
            let size = size.parse().map_err(|_| malformed())?;
            symbols.insert(Symbol::array(*name, ty(type_name)?, size));
        }
        ["func", type_name, name] => symbols.insert(Symbol::function(*name, ty(type_name)?)),
        _ => return Err(malformed()),
    }
    Ok(())
}

fn parse_instruction(line: &str) -> Result<TacInstr, ParseErrorKind> {
    let tokens: Vec<_> = line.split_whitespace().collect();

    let instr = match tokens.as_slice() {
        ["prologue"] => TacInstr::Prologue,
        ["epilogue"] => TacInstr::Epilogue,
        ["call", name] => TacInstr::Call(name.to_string()),
        ["goto", label] => TacInstr::Goto(label.to_string()),
        ["param", value] => TacInstr::Param(parse_value(value)),
        ["write", value] => TacInstr::Write(parse_value(value)),
        ["write_float", value] => TacInstr::WriteFloat(parse_value(value)),
        ["return"] => TacInstr::Return(None),
        ["return", value] => TacInstr::Return(Some(parse_value(value))),
        ["ifFalse", value, "goto", label] => {
            TacInstr::IfFalse(parse_value(value), label.to_string())
        }
        [label] if label.ends_with(':') && label.len() > 1 => {
            TacInstr::Label(label.trim_end_matches(':').to_string())
        }
        [dest, "=", "!", value] => TacInstr::Not(parse_name(dest)?, parse_value(value)),
        [dest, "=", base, "[", index, "]"] => {
            TacInstr::LoadElem(parse_name(dest)?, Element::new(*base, parse_value(index)))
        }
        [base, "[", index, "]", "=", value] => {
            TacInstr::StoreElem(Element::new(*base, parse_value(index)), parse_value(value))
        }
        [dest, "=", lhs, op, rhs] => {
            let op =
                BinOp::parse(op).ok_or_else(|| ParseErrorKind::UnknownOperator(op.to_string()))?;
            TacInstr::Bin(parse_name(dest)?, op, parse_value(lhs), parse_value(rhs))
        }
        [dest, "=", value] => TacInstr::Assign(parse_name(dest)?, parse_value(value)),
        _ => return Err(ParseErrorKind::MalformedInstruction(line.to_string())),
    };
    Ok(instr)
}

fn parse_value(token: &str) -> Value {
    if token == "v0" {
        return Value::ReturnValue;
    }
    match parse_literal(token) {
        Some(literal) => Value::Const(literal),
        None => Value::Name(parse_bare_name(token)),
    }
}

fn parse_name(token: &str) -> Result<Name, ParseErrorKind> {
    match parse_value(token) {
        Value::Name(name) => Ok(name),
        _ => Err(ParseErrorKind::InvalidDestination(token.to_string())),
    }
}

fn parse_bare_name(token: &str) -> Name {
    token
        .strip_prefix('t')
        .and_then(|digits| digits.parse().ok())
        .map(Name::Temp)
        .unwrap_or_else(|| Name::var(token))
}

fn parse_literal(token: &str) -> Option<Literal> {
    if let Ok(value) = token.parse() {
        return Some(Literal::Int(value));
    }
    token.parse().ok().map(Literal::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_parses {
        ($line:expr, $expected:expr) => {{
            let program = parse($line).unwrap();
            assert_eq!(&$expected, program.listing.at(crate::listing::Position(0)));
        }};
    }

    #[test]
    fn parses_assignment_forms() {
        assert_parses!(
            "x = 2 + 3",
            TacInstr::Bin(
                Name::var("x"),
                BinOp::Add,
                Literal::Int(2).into(),
                Literal::Int(3).into(),
            )
        );
        assert_parses!(
            "t4 = y",
            TacInstr::Assign(Name::Temp(4), Name::var("y").into())
        );
        assert_parses!(
            "t1 = ! t2",
            TacInstr::Not(Name::Temp(1), Name::Temp(2).into())
        );
    }

    #[test]
    fn parses_array_forms() {
        assert_parses!(
            "x = arr [ t1 ]",
            TacInstr::LoadElem(Name::var("x"), Element::new("arr", Name::Temp(1).into()))
        );
        assert_parses!(
            "arr [ 2 ] = 7",
            TacInstr::StoreElem(
                Element::new("arr", Literal::Int(2).into()),
                Literal::Int(7).into(),
            )
        );
    }

    #[test]
    fn parses_sentinel_and_float_literals() {
        assert_parses!(
            "x = v0",
            TacInstr::Assign(Name::var("x"), Value::ReturnValue)
        );
        assert_parses!(
            "y = 1.500000",
            TacInstr::Assign(Name::var("y"), Literal::Float(1.5).into())
        );
    }

    #[test]
    fn parses_declarations_into_the_symbol_table() {
        let program = parse(
            ".global int x 3\n\
             .array float samples 8\n\
             .func float scale\n",
        )
        .unwrap();

        assert_eq!(Some(Literal::Int(3)), program.symbols.value_of("x"));
        let samples = program.symbols.find("samples").unwrap();
        assert!(samples.is_array);
        assert_eq!(Some(8), samples.array_size);
        assert!(program.symbols.find("scale").unwrap().is_function);
    }

    #[test]
    fn round_trips_through_display() {
        let source = "main:\n\
                      prologue\n\
                      t1 = 2 + 3\n\
                      arr [ 0 ] = t1\n\
                      param t1\n\
                      call foo\n\
                      x = v0\n\
                      write x\n\
                      epilogue\n";

        let program = parse(source).unwrap();

        assert_eq!(source, program.listing.to_string());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(
            parse("x = ").unwrap_err().kind(),
            ParseErrorKind::MalformedInstruction(_)
        ));
        assert!(matches!(
            parse("x = a <> b").unwrap_err().kind(),
            ParseErrorKind::UnknownOperator(_)
        ));
        assert!(matches!(
            parse("5 = x").unwrap_err().kind(),
            ParseErrorKind::InvalidDestination(_)
        ));
        assert!(matches!(
            parse(".global quux x").unwrap_err().kind(),
            ParseErrorKind::UnknownType(_)
        ));
    }
}
