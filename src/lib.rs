//! `toycc` compiles a small C-like toy language straight to 32-bit ARM
//! assembly text. The pipeline has three stages: [`grammar::parse_program`]
//! turns source text into an [`ast::AstNode`] tree, and [`codegen::emit_program`]
//! walks that tree to assembly lines. [`combinators`], [`lexer`], [`source`]
//! and [`error`] are the shared plumbing both stages sit on; [`environment`]
//! and [`label`] are codegen-only bookkeeping.

pub mod ast;
pub mod codegen;
pub mod combinators;
pub mod environment;
pub mod error;
pub mod grammar;
pub mod label;
pub mod lexer;
pub mod source;

pub use error::{CompileError, ParseError};

/// Compile toy-language source straight to ARM assembly lines.
pub fn compile(source: &str) -> Result<Vec<String>, CompileError> {
    let program = grammar::parse_program(source)?;
    codegen::emit_program(&program)
}

/// Compile toy-language source, streaming each assembly line to `sink` as
/// it's produced rather than collecting them into a `Vec` first.
pub fn compile_with_sink(source: &str, sink: impl FnMut(String)) -> Result<(), CompileError> {
    let program = grammar::parse_program(source)?;
    codegen::emit_program_with_sink(&program, sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_factorial_function() {
        let src = "function fact(n) { var r = 1; while (n != 1) { r = r * n; n = n - 1; } return r; }";
        let out = compile(src).unwrap();
        assert_eq!(out[0], ".global fact");
        assert!(!out.iter().any(|l| l == "  bl putchar"));
    }

    #[test]
    fn propagates_undefined_variable_as_a_compile_error() {
        let src = "function f() { return n; }";
        let err = compile(src).unwrap_err();
        assert_eq!(err, CompileError::UndefinedVariable { name: "n".to_string() });
    }

    #[test]
    fn propagates_parse_errors() {
        let err = compile("function f( { }").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn assert_intrinsic_compiles_to_putchar() {
        let src = "function f() { assert(1 == 1); return 0; }";
        let out = compile(src).unwrap();
        assert!(out.iter().any(|l| l == "  bl putchar"));
    }

    #[test]
    fn compile_with_sink_streams_the_same_lines() {
        let src = "function f() { return 1; }";
        let mut streamed = Vec::new();
        compile_with_sink(src, |line| streamed.push(line)).unwrap();
        assert_eq!(streamed, compile(src).unwrap());
    }
}
