use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Int(i64),
    Str(String),
    Builtin(Builtin),
}

impl Val {
    /// Call this value with `args`.
    pub fn apply(&self, args: &[Val]) -> Result<Val> {
        match self {
            Val::Int(_) => bail!("int not callable"),
            Val::Str(_) => bail!("str not callable"),
            Val::Builtin(builtin) => {
                (builtin.func)(args).with_context(|| format!("failed to call '{}'", builtin.name))
            }
        }
    }
}

impl Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Val::Int(v) => write!(f, "{}", v),
            Val::Str(s) => write!(f, "'{}'", s),
            Val::Builtin(b) => write!(f, "<builtin {}>", b.name),
        }
    }
}

/// A function provided by the interpreter.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: fn(&[Val]) -> Result<Val>,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

/// Named values, falling back to a parent scope.
#[derive(Debug, Default)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    vals: HashMap<String, Val>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Scope {
            parent: None,
            vals: HashMap::new(),
        }
    }

    pub fn with_parent(parent: &'a Scope<'a>) -> Self {
        Scope {
            parent: Some(parent),
            vals: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Val> {
        match self.vals.get(name) {
            Some(val) => Some(val),
            None => self.parent.and_then(|p| p.get(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: impl Into<String>, val: Val) {
        self.vals.insert(name.into(), val);
    }
}

fn ints(args: &[Val]) -> Result<Vec<i64>> {
    args.iter()
        .map(|arg| match arg {
            Val::Int(v) => Ok(*v),
            other => Err(anyhow!("expected int, got {}", other)),
        })
        .collect()
}

fn add(args: &[Val]) -> Result<Val> {
    let mut sum: i64 = 0;
    for v in ints(args)? {
        sum = sum.checked_add(v).ok_or_else(|| anyhow!("overflow"))?;
    }
    Ok(Val::Int(sum))
}

fn sub(args: &[Val]) -> Result<Val> {
    let vals = ints(args)?;
    let (first, rest) = match vals.split_first() {
        Some(split) => split,
        None => bail!("expected at least one argument"),
    };
    if rest.is_empty() {
        return first
            .checked_neg()
            .map(Val::Int)
            .ok_or_else(|| anyhow!("overflow"));
    }
    let mut diff = *first;
    for v in rest {
        diff = diff.checked_sub(*v).ok_or_else(|| anyhow!("overflow"))?;
    }
    Ok(Val::Int(diff))
}

fn mul(args: &[Val]) -> Result<Val> {
    let mut product: i64 = 1;
    for v in ints(args)? {
        product = product.checked_mul(v).ok_or_else(|| anyhow!("overflow"))?;
    }
    Ok(Val::Int(product))
}

fn concat(args: &[Val]) -> Result<Val> {
    let mut s = String::new();
    for arg in args {
        match arg {
            Val::Str(v) => s.push_str(v),
            other => bail!("expected str, got {}", other),
        }
    }
    Ok(Val::Str(s))
}

/// A scope holding every builtin function.
pub fn builtins() -> Scope<'static> {
    let mut scope = Scope::new();
    let funcs: [(&'static str, fn(&[Val]) -> Result<Val>); 4] =
        [("add", add), ("sub", sub), ("mul", mul), ("concat", concat)];
    for (name, func) in funcs.iter() {
        scope.set(
            *name,
            Val::Builtin(Builtin {
                name: *name,
                func: *func,
            }),
        );
    }
    scope
}
