//! Lowers an [`AstNode`] tree to 32-bit ARM assembly text, one instruction
//! per emitted line. [`CodeGenerator`] is generic over its output sink — a
//! plain `Vec<String>` collector for the common case, or any `FnMut(String)`
//! for streaming use — and owns the label counter for one compilation;
//! [`Environment`] (built fresh per function) tracks where each local lives
//! relative to `fp`.
//!
//! Binary operators share one stack discipline: emit the left operand,
//! `push {r0, ip}` to save it, emit the right operand, `pop {r1, ip}` to
//! recover the left operand into `r1` — `ip` rides along purely to keep the
//! push/pop pair 8-byte aligned. `r0` then holds the right operand and `r1`
//! the left, which is also why subtraction and division read `r1, r0` rather
//! than `r0, r1`. Division is `udiv`: the language has no negative number
//! literals, so operands are always non-negative.
//!
//! `Var` reuses that same `push {r0, ip}` as its store: pushing is what
//! actually advances `sp` past the slot `Environment::bind` just computed,
//! reserving it for the rest of the function. A plain `str` into that offset
//! would leave `sp` where it was, so the very next binary-op/comparison
//! scratch push would land on top of the local and clobber it. `Assign`, by
//! contrast, targets an already-reserved slot, so it does use a plain `str`.

use crate::ast::{AstNode, MAX_ARITY};
use crate::environment::Environment;
use crate::error::CompileError;
use crate::label::LabelGenerator;

pub struct CodeGenerator<F: FnMut(String)> {
    sink: F,
    labels: LabelGenerator,
}

impl<F: FnMut(String)> CodeGenerator<F> {
    pub fn new(sink: F) -> Self {
        CodeGenerator {
            sink,
            labels: LabelGenerator::new(),
        }
    }

    fn emit_line(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::trace!("{line}");
        (self.sink)(line);
    }

    pub fn emit(&mut self, node: &AstNode, env: &mut Environment) -> Result<(), CompileError> {
        match node {
            AstNode::Number(value) => self.emit_line(format!("  ldr r0, ={value}")),
            AstNode::Id(name) => {
                let offset = env.lookup(name)?;
                self.emit_line(format!("  ldr r0, [fp, #{offset}]"));
            }
            AstNode::Not(term) => {
                self.emit(term, env)?;
                self.emit_line("  cmp r0, #0");
                self.emit_line("  moveq r0, #1");
                self.emit_line("  movne r0, #0");
            }
            AstNode::Equal(left, right) => self.emit_compare(left, right, env, "moveq", "movne")?,
            AstNode::NotEqual(left, right) => {
                self.emit_compare(left, right, env, "movne", "moveq")?
            }
            AstNode::Add(left, right) => self.emit_arith(left, right, env, "add r0, r0, r1")?,
            AstNode::Subtract(left, right) => self.emit_arith(left, right, env, "sub r0, r1, r0")?,
            AstNode::Multiply(left, right) => self.emit_arith(left, right, env, "mul r0, r1, r0")?,
            AstNode::Divide(left, right) => self.emit_arith(left, right, env, "udiv r0, r1, r0")?,
            AstNode::Call { callee, args } => self.emit_call(callee, args, env)?,
            AstNode::Return(value) => {
                self.emit(value, env)?;
                self.emit_line("  mov sp, fp");
                self.emit_line("  pop {fp, pc}");
            }
            AstNode::Block(statements) => {
                for statement in statements {
                    self.emit(statement, env)?;
                }
            }
            AstNode::If {
                conditional,
                consequence,
                alternative,
            } => {
                let if_false = self.labels.fresh();
                let end_if = self.labels.fresh();
                self.emit(conditional, env)?;
                self.emit_line("  cmp r0, #0");
                self.emit_line(format!("  beq {if_false}"));
                self.emit(consequence, env)?;
                self.emit_line(format!("  b {end_if}"));
                self.emit_line(format!("{if_false}:"));
                self.emit(alternative, env)?;
                self.emit_line(format!("{end_if}:"));
            }
            AstNode::Function {
                name,
                parameters,
                body,
            } => {
                if parameters.len() > MAX_ARITY {
                    return Err(CompileError::TooManyParams);
                }
                log::debug!("compiling function {name} ({} params)", parameters.len());
                self.emit_line(format!(".global {name}"));
                self.emit_line(format!("{name}:"));
                self.emit_line("  push {fp, lr}");
                self.emit_line("  mov fp, sp");
                self.emit_line("  push {r0, r1, r2, r3}");
                let mut function_env = Environment::for_function(parameters);
                self.emit(body, &mut function_env)?;
                self.emit_line("  mov sp, fp");
                self.emit_line("  mov r0, #0");
                self.emit_line("  pop {fp, pc}");
            }
            AstNode::Var { name, value } => {
                self.emit(value, env)?;
                env.bind(name.clone());
                self.emit_line("  push {r0, ip}");
            }
            AstNode::Assign { name, value } => {
                self.emit(value, env)?;
                let offset = env.lookup(name)?;
                self.emit_line(format!("  str r0, [fp, #{offset}]"));
            }
            AstNode::While { conditional, body } => {
                let loop_start = self.labels.fresh();
                let loop_end = self.labels.fresh();
                self.emit_line(format!("{loop_start}:"));
                self.emit(conditional, env)?;
                self.emit_line("  cmp r0, #0");
                self.emit_line(format!("  beq {loop_end}"));
                self.emit(body, env)?;
                self.emit_line(format!("  b {loop_start}"));
                self.emit_line(format!("{loop_end}:"));
            }
            AstNode::Assert { conditional } => {
                self.emit(conditional, env)?;
                self.emit_line("  cmp r0, #1");
                self.emit_line("  moveq r0, #'.'");
                self.emit_line("  movne r0, #'F'");
                self.emit_line("  bl putchar");
            }
        }
        Ok(())
    }

    fn emit_compare(
        &mut self,
        left: &AstNode,
        right: &AstNode,
        env: &mut Environment,
        on_eq: &str,
        on_ne: &str,
    ) -> Result<(), CompileError> {
        self.emit(left, env)?;
        self.emit_line("  push {r0, ip}");
        self.emit(right, env)?;
        self.emit_line("  pop {r1, ip}");
        self.emit_line("  cmp r0, r1");
        self.emit_line(format!("  {on_eq} r0, #1"));
        self.emit_line(format!("  {on_ne} r0, #0"));
        Ok(())
    }

    fn emit_arith(
        &mut self,
        left: &AstNode,
        right: &AstNode,
        env: &mut Environment,
        instruction: &str,
    ) -> Result<(), CompileError> {
        self.emit(left, env)?;
        self.emit_line("  push {r0, ip}");
        self.emit(right, env)?;
        self.emit_line("  pop {r1, ip}");
        self.emit_line(format!("  {instruction}"));
        Ok(())
    }

    fn emit_call(
        &mut self,
        callee: &str,
        args: &[AstNode],
        env: &mut Environment,
    ) -> Result<(), CompileError> {
        match args.len() {
            0 => self.emit_line(format!("  bl {callee}")),
            1 => {
                self.emit(&args[0], env)?;
                self.emit_line(format!("  bl {callee}"));
            }
            2..=4 => {
                self.emit_line("  sub sp, sp, #16");
                for (index, arg) in args.iter().enumerate() {
                    self.emit(arg, env)?;
                    self.emit_line(format!("  str r0, [sp, #{}]", 4 * index));
                }
                self.emit_line("  pop {r0, r1, r2, r3}");
                self.emit_line(format!("  bl {callee}"));
            }
            _ => return Err(CompileError::TooManyArguments),
        }
        Ok(())
    }
}

/// Compile a whole program (a top-level [`AstNode::Block`]) to assembly
/// text, streaming each line to `sink` as it's produced.
pub fn emit_program_with_sink(
    program: &AstNode,
    sink: impl FnMut(String),
) -> Result<(), CompileError> {
    let mut codegen = CodeGenerator::new(sink);
    let mut env = Environment::for_function(&[]);
    codegen.emit(program, &mut env)
}

/// Compile a whole program to a `Vec` of assembly lines, in emission order.
/// Top-level statements that aren't `Function` declarations run against a
/// throwaway empty environment — the language has no module-level locals.
pub fn emit_program(program: &AstNode) -> Result<Vec<String>, CompileError> {
    let mut lines = Vec::new();
    emit_program_with_sink(program, |line| lines.push(line))?;
    Ok(lines)
}
