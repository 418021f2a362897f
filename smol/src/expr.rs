use anyhow::{anyhow, Result};
use parsegen::syntax::{self, Reduction};
use parsegen::Syntax;
use std::fmt::{self, Display};

use crate::val::{Scope, Val};

/// An expression of the language.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Str(String),
    Ref(String),
    Call { func: Box<Expr>, args: Vec<Expr> },
}

impl Expr {
    pub fn eval(&self, scope: &Scope) -> Result<Val> {
        match self {
            Expr::Int(v) => Ok(Val::Int(*v)),
            Expr::Str(s) => Ok(Val::Str(s.clone())),
            Expr::Ref(name) => scope
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("unknown var '{}'", name)),
            Expr::Call { func, args } => {
                let func = func.eval(scope)?;
                let args = args
                    .iter()
                    .map(|arg| arg.eval(scope))
                    .collect::<Result<Vec<_>>>()?;
                func.apply(&args)
            }
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Int(v) => write!(f, "{}", v),
            Expr::Str(s) => write!(f, "'{}'", s),
            Expr::Ref(name) => write!(f, "{}", name),
            Expr::Call { func, args } => {
                write!(f, "({}", func)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Reductions from parse trees into expressions.
pub fn reductions() -> Syntax<Expr> {
    let rules: Vec<Reduction<Expr>> = vec![
        syntax::terminal("int", |val: &str| val.parse().ok().map(Expr::Int)),
        syntax::terminal("str", |val: &str| -> Option<Expr> {
            let inner = val.strip_prefix('\'')?.strip_suffix('\'')?;
            Some(Expr::Str(inner.to_owned()))
        }),
        syntax::terminal("id", |val: &str| Expr::Ref(val.to_owned())),
        syntax::variadic("call", |exprs: &[Expr]| match exprs {
            [func, args @ ..] => Some(Expr::Call {
                func: Box::new(func.clone()),
                args: args.to_vec(),
            }),
            [] => None,
        }),
    ];
    Syntax::new(rules)
}
