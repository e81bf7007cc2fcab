//! The grammar: a precedence-climbing expression parser and a statement
//! parser, built from the combinators in [`crate::combinators`] and the
//! tokens in [`crate::lexer`], sharing one top-level parser that produces a
//! [`AstNode::Block`].
//!
//! expression and statement are each self-referential (parenthesized
//! expressions and call arguments re-enter `expression`; blocks and the
//! bodies of `if`/`while` re-enter `statement`), so both are built behind a
//! [`Forward`] cell and patched in once the rest of the grammar exists.
//!
//! Left-associative infix operators are folded by [`left_assoc`]: parse one
//! operand, then zero or more `(operator, operand)` pairs, then fold
//! `build(op, acc, rhs)` over them left to right.

use crate::ast::AstNode;
use crate::combinators::{constant, fail, parse_string_to_completion, zero_or_more, Forward, Parser};
use crate::error::ParseError;
use crate::lexer::{identifier, keyword, leading_ignored, number, token};

/// Parse a whole program to completion, or fail with a [`ParseError`]
/// carrying the byte index where progress stopped.
pub fn parse_program(source: &str) -> Result<AstNode, ParseError> {
    let (_expression, statement) = build_grammar();
    let program = leading_ignored()
        .and(zero_or_more(statement))
        .map(AstNode::block);
    parse_string_to_completion(&program, source)
}

/// `a.and(b)` keeps `b`'s value; `left(a, b)` is its mirror image — parse
/// both in sequence but keep `a`'s value, discarding `b` (typically a
/// punctuation token). Not one of the named primitives, but derived purely
/// from `bind`/`and`/`constant`.
fn left<T: Clone + 'static, U: 'static>(a: Parser<T>, b: Parser<U>) -> Parser<T> {
    a.bind(move |value| b.clone().and(constant(value)))
}

/// `item (',' item)*`, or an empty list.
fn comma_separated<T: Clone + 'static>(item: Parser<T>) -> Parser<Vec<T>> {
    let tail = token(",").and(item.clone());
    let at_least_one = item.bind(move |first| {
        zero_or_more(tail.clone()).map(move |rest| {
            let mut all = Vec::with_capacity(rest.len() + 1);
            all.push(first.clone());
            all.extend(rest);
            all
        })
    });
    at_least_one.maybe().map(|items| items.unwrap_or_default())
}

/// Fold `operand (op operand)*` left to right: `build(op, acc, rhs)` at
/// each step, starting from the first operand.
fn left_assoc(
    operand: Parser<AstNode>,
    op: Parser<String>,
    build: fn(&str, AstNode, AstNode) -> AstNode,
) -> Parser<AstNode> {
    let pair = {
        let operand = operand.clone();
        op.bind(move |op_text| operand.clone().map(move |rhs| (op_text.clone(), rhs)))
    };
    let pairs = zero_or_more(pair);
    operand.bind(move |first| {
        pairs.clone().map(move |rest| {
            rest.into_iter()
                .fold(first.clone(), |acc, (op_text, rhs)| build(&op_text, acc, rhs))
        })
    })
}

fn build_comparison(op: &str, left: AstNode, right: AstNode) -> AstNode {
    match op {
        "==" => AstNode::equal(left, right),
        "!=" => AstNode::not_equal(left, right),
        _ => unreachable!("comparison operator token only ever matches == or !="),
    }
}

fn build_sum(op: &str, left: AstNode, right: AstNode) -> AstNode {
    match op {
        "+" => AstNode::add(left, right),
        "-" => AstNode::subtract(left, right),
        _ => unreachable!("sum operator token only ever matches + or -"),
    }
}

fn build_product(op: &str, left: AstNode, right: AstNode) -> AstNode {
    match op {
        "*" => AstNode::multiply(left, right),
        "/" => AstNode::divide(left, right),
        _ => unreachable!("product operator token only ever matches * or /"),
    }
}

/// `assert` is a parse-time intrinsic: a call whose callee is `assert`
/// becomes an `Assert` node over its first argument, regardless of how many
/// arguments were written — it is never treated as an ordinary user call.
fn build_call(callee: String, mut args: Vec<AstNode>) -> AstNode {
    if callee == "assert" {
        let conditional = if args.is_empty() {
            AstNode::number(0)
        } else {
            args.remove(0)
        };
        AstNode::assert(conditional)
    } else {
        AstNode::call(callee, args)
    }
}

fn return_parser(expression: Parser<AstNode>) -> Parser<AstNode> {
    left(keyword("return").and(expression), token(";")).map(AstNode::return_)
}

fn block_parser(statement: Parser<AstNode>) -> Parser<AstNode> {
    left(token(r"\{").and(zero_or_more(statement)), token(r"\}")).map(AstNode::block)
}

fn function_parser(statement: Parser<AstNode>) -> Parser<AstNode> {
    let block = block_parser(statement);
    let params = left(token(r"\(").and(comma_separated(identifier())), token(r"\)"));
    keyword("function").and(identifier()).bind(move |name| {
        let block = block.clone();
        params.clone().bind(move |parameters| {
            let name = name.clone();
            block.clone()
                .map(move |body| AstNode::function(name.clone(), parameters.clone(), body))
        })
    })
}

fn if_parser(expression: Parser<AstNode>, statement: Parser<AstNode>) -> Parser<AstNode> {
    let condition = left(token(r"\(").and(expression), token(r"\)"));
    let else_clause = keyword("else").and(statement.clone());
    keyword("if").and(condition).bind(move |cond| {
        let else_clause = else_clause.clone();
        statement.clone().bind(move |consequence| {
            let cond = cond.clone();
            else_clause.clone().map(move |alternative| {
                AstNode::if_(cond.clone(), consequence.clone(), alternative)
            })
        })
    })
}

fn while_parser(expression: Parser<AstNode>, statement: Parser<AstNode>) -> Parser<AstNode> {
    let condition = left(token(r"\(").and(expression), token(r"\)"));
    keyword("while").and(condition).bind(move |cond| {
        statement.clone().map(move |body| AstNode::while_(cond.clone(), body))
    })
}

fn var_parser(expression: Parser<AstNode>) -> Parser<AstNode> {
    keyword("var").and(identifier()).bind(move |name| {
        let rhs = left(token("=").and(expression.clone()), token(";"));
        rhs.map(move |value| AstNode::var(name.clone(), value))
    })
}

fn assign_parser(expression: Parser<AstNode>) -> Parser<AstNode> {
    identifier().bind(move |name| {
        let rhs = left(token("=").and(expression.clone()), token(";"));
        rhs.map(move |value| AstNode::assign(name.clone(), value))
    })
}

fn expr_stmt_parser(expression: Parser<AstNode>) -> Parser<AstNode> {
    left(expression, token(";"))
}

/// Builds the whole mutually-recursive grammar and returns `(expression,
/// statement)`. Each is the forwarding proxy, safe to hand to callers; by
/// the time this function returns, both forward cells have been patched in
/// with their real parsers.
fn build_grammar() -> (Parser<AstNode>, Parser<AstNode>) {
    let expr_forward: Forward<AstNode> = Forward::new("expression parser used before definition");
    let stmt_forward: Forward<AstNode> = Forward::new("statement parser used before definition");
    let expression = expr_forward.parser();
    let statement = stmt_forward.parser();

    // ---- expression ----
    // `NUMBER_PATTERN` has no length cap, so the lexical match can outrun
    // what fits in a `u64`. Rather than panic, treat an overflowing literal
    // as a miss: the grammar backtracks and the driver reports it as an
    // ordinary parse error, like any other input the grammar doesn't accept.
    let number_atom = number().bind(|digits| match digits.parse::<u64>() {
        Ok(value) => constant(AstNode::number(value)),
        Err(_) => fail(),
    });
    let id_atom = identifier().map(AstNode::id);
    let paren_atom = left(token(r"\(").and(expression.clone()), token(r"\)"));
    let args = comma_separated(expression.clone());
    let call_atom = identifier().bind(move |callee| {
        let inner = left(token(r"\(").and(args.clone()), token(r"\)"));
        inner.map(move |arg_list| build_call(callee.clone(), arg_list))
    });
    let atom = call_atom.or(id_atom).or(number_atom).or(paren_atom);

    let unary = token("!").maybe().bind(move |bang| {
        atom.clone().map(move |value| {
            if bang.is_some() {
                AstNode::not(value)
            } else {
                value
            }
        })
    });

    let product = left_assoc(unary, token(r"\*|/"), build_product);
    let sum = left_assoc(product, token(r"\+|-"), build_sum);
    let comparison = left_assoc(sum, token(r"==|!="), build_comparison);

    expr_forward.define(comparison);

    // ---- statement, tried in this fixed order ----
    let statement_alt = return_parser(expression.clone())
        .or(function_parser(statement.clone()))
        .or(if_parser(expression.clone(), statement.clone()))
        .or(while_parser(expression.clone(), statement.clone()))
        .or(var_parser(expression.clone()))
        .or(assign_parser(expression.clone()))
        .or(block_parser(statement.clone()))
        .or(expr_stmt_parser(expression.clone()));

    stmt_forward.define(statement_alt);

    (expression, statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> AstNode {
        parse_program(src).unwrap_or_else(|e| panic!("parse failed for {src:?}: {e}"))
    }

    #[test]
    fn parses_a_number() {
        assert_eq!(parse("1;"), AstNode::block(vec![AstNode::number(1)]));
    }

    #[test]
    fn oversized_numeric_literal_is_a_parse_error_not_a_panic() {
        // NUMBER_PATTERN has no length cap, so this is lexically a number —
        // it just doesn't fit in a u64. This must fail gracefully rather
        // than panic.
        let err = parse_program("99999999999999999999;").unwrap_err();
        assert!(matches!(err, ParseError::AtIndex { .. }));
    }

    #[test]
    fn left_associative_subtraction() {
        // 1 - 2 - 3 == (1 - 2) - 3
        let expected = AstNode::subtract(
            AstNode::subtract(AstNode::number(1), AstNode::number(2)),
            AstNode::number(3),
        );
        assert_eq!(parse("1 - 2 - 3;"), AstNode::block(vec![expected]));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        // 1 + 2 * 3 == 1 + (2 * 3)
        let expected = AstNode::add(
            AstNode::number(1),
            AstNode::multiply(AstNode::number(2), AstNode::number(3)),
        );
        assert_eq!(parse("1 + 2 * 3;"), AstNode::block(vec![expected]));
    }

    #[test]
    fn comparison_binds_loosest() {
        // a == b + c == a == (b + c)
        let expected = AstNode::equal(
            AstNode::id("a"),
            AstNode::add(AstNode::id("b"), AstNode::id("c")),
        );
        assert_eq!(parse("a == b + c;"), AstNode::block(vec![expected]));
    }

    #[test]
    fn keyword_requires_word_boundary_in_context() {
        // `iffy` must parse as an identifier statement, not `if` + `fy`.
        let got = parse("iffy;");
        assert_eq!(got, AstNode::block(vec![AstNode::id("iffy")]));
    }

    #[test]
    fn assignment_with_comparison_rhs_falls_through_to_expr_stmt_on_ambiguous_input() {
        // `x==1;` looks like it could start an `assign` (`ID '=' ...`), but
        // the `=` token only ever matches a single character, so the
        // sub-parse for `assign` fails on the stray second `=` and the
        // statement grammar correctly falls through to `exprStmt`.
        let got = parse("x==1;");
        let expected = AstNode::equal(AstNode::id("x"), AstNode::number(1));
        assert_eq!(got, AstNode::block(vec![expected]));
    }

    #[test]
    fn assignment_with_space_is_unambiguous() {
        let got = parse("x = y == 1;");
        let expected = AstNode::assign(
            "x",
            AstNode::equal(AstNode::id("y"), AstNode::number(1)),
        );
        assert_eq!(got, AstNode::block(vec![expected]));
    }

    #[test]
    fn whitespace_and_comments_are_insignificant() {
        let a = parse("function f(a,b){return a+b;}");
        let b = parse(
            "function f(a, b) { // sum\n  return a /* plus */ + b;\n}\n",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn else_is_mandatory_for_if() {
        assert!(parse_program("function f() { if (1) return 1; }").is_err());
    }

    #[test]
    fn compound_assignment_is_rejected() {
        assert!(parse_program("function f() { n += 10; }").is_err());
    }

    #[test]
    fn assert_call_becomes_assert_node_regardless_of_arity() {
        let got = parse("assert(1 == 1);");
        let expected = AstNode::assert(AstNode::equal(AstNode::number(1), AstNode::number(1)));
        assert_eq!(got, AstNode::block(vec![expected]));
    }

    #[test]
    fn fact_program_structure() {
        let src = "function fact(n) { var r = 1; while (n != 1) { r = r * n; n = n - 1; } return r; }";
        let body = AstNode::block(vec![
            AstNode::var("r", AstNode::number(1)),
            AstNode::while_(
                AstNode::not_equal(AstNode::id("n"), AstNode::number(1)),
                AstNode::block(vec![
                    AstNode::assign("r", AstNode::multiply(AstNode::id("r"), AstNode::id("n"))),
                    AstNode::assign("n", AstNode::subtract(AstNode::id("n"), AstNode::number(1))),
                ]),
            ),
            AstNode::return_(AstNode::id("r")),
        ]);
        let expected = AstNode::block(vec![AstNode::function("fact", vec!["n".into()], body)]);
        assert_eq!(parse(src), expected);
    }

    #[test]
    fn zero_to_four_call_arguments_parse() {
        for n in 0..=4 {
            let args: Vec<String> = (0..n).map(|i| i.to_string()).collect();
            let src = format!("f({});", args.join(", "));
            let expected_args: Vec<AstNode> = (0..n).map(|i| AstNode::number(i as u64)).collect();
            assert_eq!(
                parse(&src),
                AstNode::block(vec![AstNode::call("f", expected_args)])
            );
        }
    }
}
