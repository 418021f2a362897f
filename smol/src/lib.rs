//! smol, a tiny lisp.
//!
//! Expressions are ints, single quoted strings, identifiers and calls of the
//! form `(func arg ...)`.
//!
//! ```
//! use smol::Val;
//!
//! assert_eq!(smol::eval("(add 1 (mul 2 3))", None).unwrap(), Val::Int(7));
//! ```

use anyhow::{bail, Context, Result};
use ebnf::Language;
use log::debug;
use parsegen::Syntax;

mod expr;
mod val;

pub use expr::Expr;
pub use val::{builtins, Builtin, Scope, Val};

const GRAMMAR: &str = include_str!("smol.ebnf");

pub struct Interpreter {
    language: Language,
    syntax: Syntax<Expr>,
}

impl Interpreter {
    pub fn new() -> Result<Self> {
        let language = ebnf::load(GRAMMAR).context("failed to load smol grammar")?;
        Ok(Interpreter {
            language,
            syntax: expr::reductions(),
        })
    }

    pub fn parse(&self, input: &str) -> Result<Expr> {
        let node = self.language.parse(input)?;
        // Reductions drop leaves they cannot convert, so check ints up front.
        for token in node.tokens() {
            if token.rule_name == "int" && token.value.parse::<i64>().is_err() {
                bail!(
                    "int literal out of range at {}: {}",
                    token.location,
                    token.value
                );
            }
        }
        let expr = self.syntax.apply(&node)?;
        debug!("parsed {:?} as {}", input, expr);
        Ok(expr)
    }

    pub fn eval(&self, input: &str, scope: &Scope) -> Result<Val> {
        self.parse(input)?.eval(scope)
    }
}

/// Evaluate one expression, using the builtins when no scope is given.
pub fn eval(input: &str, scope: Option<&Scope>) -> Result<Val> {
    let interpreter = Interpreter::new()?;
    match scope {
        Some(scope) => interpreter.eval(input, scope),
        None => interpreter.eval(input, &builtins()),
    }
}
