//! Bottom-up reduction of parse trees into caller defined values.
//!
//! Each reduction looks at a node along with the values its children reduced
//! to, and may claim the node by producing a value. Nodes nobody claims pass
//! their children's values up to their parent.

use std::fmt::Debug;

use crate::error::Error;
use crate::parser::Node;

pub type Reduction<E> = Box<dyn Fn(&Node, &[E]) -> Option<E>>;

pub struct Syntax<E> {
    rules: Vec<Reduction<E>>,
}

impl<E: Clone + Debug> Syntax<E> {
    pub fn new(rules: Vec<Reduction<E>>) -> Self {
        Syntax { rules }
    }

    /// Reduce `node` to exactly one value.
    pub fn apply(&self, node: &Node) -> Result<E, Error> {
        let mut exprs = self.apply_many(node)?;
        if exprs.len() != 1 {
            return Err(Error::with_location(
                format!("syntax error: expected one expression, got {:?}", exprs),
                node.location(),
            ));
        }
        Ok(exprs.remove(0))
    }

    /// Reduce `node` to any number of values.
    pub fn apply_many(&self, node: &Node) -> Result<Vec<E>, Error> {
        let mut children = Vec::new();
        for child in &node.children {
            children.extend(self.apply_many(child)?);
        }

        let mut exprs: Vec<E> = self
            .rules
            .iter()
            .filter_map(|rule| rule(node, &children))
            .collect();
        match exprs.len() {
            0 => Ok(children),
            1 => Ok(vec![exprs.remove(0)]),
            _ => Err(Error::with_location(
                format!(
                    "syntax error: ambiguous reduction of {} to {:?}",
                    node.name().unwrap_or("_"),
                    exprs
                ),
                node.location(),
            )),
        }
    }
}

/// Whole node inspection, for any node.
pub fn node<E, F, R>(f: F) -> Reduction<E>
where
    F: Fn(&Node, &[E]) -> R + 'static,
    R: Into<Option<E>>,
    E: 'static,
{
    Box::new(move |node: &Node, exprs: &[E]| -> Option<E> { f(node, exprs).into() })
}

/// Only consider nodes named `name`.
pub fn rule_name<E: 'static>(name: impl Into<String>, rule: Reduction<E>) -> Reduction<E> {
    let name = name.into();
    Box::new(move |node: &Node, exprs: &[E]| -> Option<E> {
        if node.name() == Some(name.as_str()) {
            rule(node, exprs)
        } else {
            None
        }
    })
}

/// Build a value from the token of a leaf named `name`.
pub fn terminal<E, F, R>(name: impl Into<String>, f: F) -> Reduction<E>
where
    F: Fn(&str) -> R + 'static,
    R: Into<Option<E>>,
    E: 'static,
{
    rule_name(
        name,
        node(move |node: &Node, _: &[E]| -> Option<E> {
            let token = node.token.as_ref()?;
            f(&token.value).into()
        }),
    )
}

/// Build a value from all child values of a node named `name`.
pub fn variadic<E, F, R>(name: impl Into<String>, f: F) -> Reduction<E>
where
    F: Fn(&[E]) -> R + 'static,
    R: Into<Option<E>>,
    E: 'static,
{
    rule_name(name, node(move |_: &Node, exprs: &[E]| -> Option<E> { f(exprs).into() }))
}

pub fn nary<E, F, R>(name: impl Into<String>, n: usize, f: F) -> Reduction<E>
where
    F: Fn(&[E]) -> R + 'static,
    R: Into<Option<E>>,
    E: 'static,
{
    variadic(name, move |exprs: &[E]| -> Option<E> {
        if exprs.len() == n {
            f(exprs).into()
        } else {
            None
        }
    })
}

pub fn unary<E, F, R>(name: impl Into<String>, f: F) -> Reduction<E>
where
    F: Fn(E) -> R + 'static,
    R: Into<Option<E>>,
    E: Clone + 'static,
{
    nary(name, 1, move |exprs: &[E]| -> Option<E> { f(exprs[0].clone()).into() })
}

pub fn binary<E, F, R>(name: impl Into<String>, f: F) -> Reduction<E>
where
    F: Fn(E, E) -> R + 'static,
    R: Into<Option<E>>,
    E: Clone + 'static,
{
    nary(name, 2, move |exprs: &[E]| -> Option<E> {
        f(exprs[0].clone(), exprs[1].clone()).into()
    })
}

/// Build a value from the descendants named `child` of a node named `name`.
pub fn descendants<E, F, R>(name: impl Into<String>, child: impl Into<String>, f: F) -> Reduction<E>
where
    F: Fn(&[&Node]) -> R + 'static,
    R: Into<Option<E>>,
    E: 'static,
{
    let child = child.into();
    rule_name(
        name,
        node(move |node: &Node, _: &[E]| -> Option<E> {
            f(&node.descendants_named(&child)).into()
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Token;
    use crate::location::Location;

    #[derive(Debug, Clone, PartialEq)]
    enum Expr {
        Int(i64),
        Operand(Box<Expr>),
        Add(Box<Expr>, Box<Expr>),
        List(Vec<Expr>),
    }

    fn int(val: &str, col: usize) -> Node {
        Node::leaf(Token::new("int", val, Location::new(0, col)))
    }

    fn int_terminal() -> Reduction<Expr> {
        terminal("int", |val: &str| val.parse().ok().map(Expr::Int))
    }

    #[test]
    fn threads_unclaimed_nodes() {
        let syntax = Syntax::new(vec![
            int_terminal(),
            unary("operand", |e| Expr::Operand(Box::new(e))),
            binary("add", |l, r| Expr::Add(Box::new(l), Box::new(r))),
        ]);
        let tree = Node::rule(
            "add",
            vec![
                Node::rule("other_rule", vec![Node::rule("operand", vec![int("1", 0)])]),
                Node::rule("operand", vec![int("2", 2)]),
            ],
        );
        let operand = |v| Expr::Operand(Box::new(Expr::Int(v)));
        assert_eq!(
            syntax.apply(&tree).unwrap(),
            Expr::Add(Box::new(operand(1)), Box::new(operand(2)))
        );
    }

    #[test]
    fn variadic_lists() {
        let syntax = Syntax::new(vec![
            int_terminal(),
            variadic("list", |exprs: &[Expr]| Expr::List(exprs.to_vec())),
        ]);
        let tests = vec![
            (Node::rule("list", vec![]), Expr::List(vec![])),
            (Node::rule("list", vec![int("1", 0)]), Expr::List(vec![Expr::Int(1)])),
            (
                Node::rule("list", vec![int("1", 0), int("2", 2), int("3", 4)]),
                Expr::List(vec![Expr::Int(1), Expr::Int(2), Expr::Int(3)]),
            ),
        ];
        for test in tests {
            assert_eq!(syntax.apply(&test.0).unwrap(), test.1, "test case: {:?}", test);
        }
    }

    #[test]
    fn nary_checks_arity() {
        let syntax = Syntax::new(vec![int_terminal(), binary("add", |l, r| Expr::Add(Box::new(l), Box::new(r)))]);
        let tree = Node::rule("add", vec![int("1", 0), int("2", 2), int("3", 4)]);
        // Unclaimed, so three values reach the root.
        assert_eq!(syntax.apply_many(&tree).unwrap().len(), 3);
        let err = syntax.apply(&tree).unwrap_err();
        assert_eq!(err.location(), Some(Location::new(0, 0)));
    }

    #[test]
    fn ambiguous_reduction() {
        let syntax = Syntax::new(vec![int_terminal(), int_terminal()]);
        let err = syntax.apply(&int("1", 3)).unwrap_err();
        assert!(err.msg().contains("ambiguous reduction of int"), "error: {}", err);
        assert_eq!(err.location(), Some(Location::new(0, 3)));
    }

    #[test]
    fn declining_factories() {
        // Factories returning None leave the node unclaimed.
        let syntax = Syntax::new(vec![int_terminal()]);
        assert!(syntax.apply(&int("x", 0)).is_err());
        assert_eq!(syntax.apply(&int("-4", 0)).unwrap(), Expr::Int(-4));
    }

    #[test]
    fn node_and_descendants() {
        let syntax: Syntax<Expr> = Syntax::new(vec![
            rule_name("sum", node(|n: &Node, _: &[Expr]| Expr::Int(n.tokens().len() as i64))),
            descendants("pair", "int", |nodes: &[&Node]| {
                if nodes.len() == 2 {
                    Some(Expr::List(vec![Expr::Int(0), Expr::Int(0)]))
                } else {
                    None
                }
            }),
        ]);
        let sum = Node::rule("sum", vec![int("1", 0), int("2", 2)]);
        assert_eq!(syntax.apply(&sum).unwrap(), Expr::Int(2));

        let pair = Node::rule("pair", vec![Node::rule("x", vec![int("1", 0)]), int("2", 2)]);
        assert_eq!(
            syntax.apply(&pair).unwrap(),
            Expr::List(vec![Expr::Int(0), Expr::Int(0)])
        );
    }
}
