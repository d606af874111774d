//! MIPS32 code generation for SPIM.

mod allocator;
mod assembly;
mod calling_convention;
mod float_table;
mod function_compiler;
mod label_generator;
mod registers;

pub use assembly::Assembly;

use crate::error::CompileError;
use crate::listing::Position;
use crate::symbols::SymbolTable;
use crate::tac::{next_function_span, TacProgram};

use assembly::Data;
use float_table::FloatTable;
use function_compiler::FunctionCompiler;
use label_generator::LabelGenerator;

/// Compile an optimised program into an assembly file: the data segment
/// first, then one block of text per function. Instructions outside any
/// label/prologue…epilogue span are ignored.
pub fn compile(program: &TacProgram) -> Result<Assembly, CompileError> {
    let mut asm = Assembly::new();
    data_segment(&mut asm.data, &program.symbols);

    let mut floats = FloatTable::new();
    let mut labels = LabelGenerator::new();
    asm.text.directive(".globl main");

    let mut from = Position(0);
    while let Some(span) = next_function_span(&program.listing, from) {
        FunctionCompiler::compile(
            &program.listing,
            span,
            &program.symbols,
            &mut floats,
            &mut labels,
            &mut asm.text,
        )?;
        from = span.end + 1;
    }

    for (label, value) in floats.iter() {
        asm.data.float(&label, value);
    }
    Ok(asm)
}

/// Declare every non-function symbol: a word per scalar, a single
/// precision float per float scalar, four bytes per array element.
fn data_segment(data: &mut Data, symbols: &SymbolTable) {
    for symbol in symbols.data_symbols() {
        if symbol.is_array {
            data.space(&symbol.name, symbol.array_size.unwrap_or(0) * 4);
        } else if symbol.ty.is_float() {
            data.float(
                &symbol.name,
                symbol.value.map(|value| value.as_float()).unwrap_or(0.0),
            );
        } else {
            data.word(
                &symbol.name,
                symbol.value.map(|value| value.as_int()).unwrap_or(0),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tac::parse;

    fn compile_source(source: &str) -> String {
        let program = parse(source).unwrap();
        compile(&program).unwrap().to_string()
    }

    #[test]
    fn data_segment_declares_symbols_by_type() {
        let asm = compile_source(
            ".global int x 3\n\
             .global float y\n\
             .array int arr 10\n\
             .func void main\n\
             main:\n\
             prologue\n\
             epilogue\n",
        );

        assert!(asm.contains("x:          .word 3"));
        assert!(asm.contains("y:          .float 0.000000"));
        assert!(asm.contains("arr:        .space 40"));
        assert!(asm.contains(".globl main"));
    }

    #[test]
    fn float_literals_are_emitted_once() {
        let asm = compile_source(
            ".global float y\n\
             main:\n\
             prologue\n\
             y = 1.500000\n\
             write_float y\n\
             y = 1.500000\n\
             write_float y\n\
             epilogue\n",
        );

        assert_eq!(1, asm.matches("float_0:    .float 1.500000").count());
        assert!(!asm.contains("float_1"));
    }

    #[test]
    fn main_exits_through_syscall_10() {
        let asm = compile_source("main:\nprologue\nepilogue\n");

        assert!(asm.contains("li      $v0, 10"));
        assert!(!asm.contains("jr      $ra"));
    }

    #[test]
    fn other_functions_return_through_ra() {
        let asm = compile_source("foo:\nprologue\nepilogue\n");

        assert!(asm.contains("jr      $ra"));
    }

    #[test]
    fn write_uses_print_int_syscall() {
        let asm = compile_source("main:\nprologue\nwrite 42\nepilogue\n");

        assert!(asm.contains("li      $v0, 1"));
        assert!(asm.contains("move    $a0,"));
        assert!(asm.contains("syscall"));
    }

    #[test]
    fn array_loads_use_the_reserved_address_pair() {
        let asm = compile_source(
            ".global int i\n\
             .array int arr 4\n\
             main:\n\
             prologue\n\
             x = arr [ i ]\n\
             write x\n\
             epilogue\n",
        );

        assert!(asm.contains("la      $t8, arr"));
        assert!(asm.contains("sll     $t9,"));
        assert!(asm.contains("addu    $t8, $t8, $t9"));
        assert!(asm.contains("lw      $t1, 0($t8)"));
    }

    #[test]
    fn float_le_emits_both_condition_instructions() {
        let asm = compile_source(
            ".global float a\n\
             .global float b\n\
             main:\n\
             prologue\n\
             t1 = a <= b\n\
             write t1\n\
             epilogue\n",
        );

        assert!(asm.contains("c.lt.s"));
        assert!(asm.contains("c.le.s"));
        assert!(asm.contains("bc1t    cc_1"));
    }

    #[test]
    fn integer_use_of_a_float_return_value_converts() {
        let asm = compile_source(
            ".global int x\n\
             .func float scale\n\
             main:\n\
             prologue\n\
             call scale\n\
             x = v0\n\
             write x\n\
             epilogue\n",
        );

        assert!(asm.contains("cvt.w.s $f0, $f0"));
        assert!(asm.contains("mfc1"));
    }

    #[test]
    fn integer_return_values_read_v0_directly() {
        let asm = compile_source(
            ".global int x\n\
             .func int next\n\
             main:\n\
             prologue\n\
             call next\n\
             x = v0\n\
             write x\n\
             epilogue\n",
        );

        assert!(asm.contains("move    $t0, $v0"));
        assert!(!asm.contains("cvt.w.s"));
    }

    #[test]
    fn reading_an_unwritten_temporary_is_fatal() {
        let program = parse("main:\nprologue\nwrite t1\nepilogue\n").unwrap();

        assert_eq!(
            Err(CompileError::TempReadBeforeWrite(1)),
            compile(&program).map(|_| ())
        );
    }

    #[test]
    fn calls_fill_both_argument_register_sequences() {
        let asm = compile_source(
            ".global float f\n\
             .func void plot\n\
             main:\n\
             prologue\n\
             param 1\n\
             param f\n\
             param 2\n\
             call plot\n\
             epilogue\n",
        );

        assert!(asm.contains("move    $a0,"));
        assert!(asm.contains("mov.s   $f12,"));
        assert!(asm.contains("move    $a1,"));
        assert!(asm.contains("jal     plot"));
    }

    #[test]
    fn dead_globals_are_written_back_to_memory() {
        let asm = compile_source(
            ".global int x\n\
             main:\n\
             prologue\n\
             x = 5\n\
             epilogue\n",
        );

        assert!(asm.contains("sw      $t0, x"));
    }
}
