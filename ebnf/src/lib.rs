//! A grammar definition language for building lexers and parsers from text.
//!
//! ```text
//! ws ~= "( |\n)+" ;
//! int = "[0-9]+" ;
//! sum -> int , { "+" , int } ;
//! ```
//!
//! `=` declares a lexer rule and `~=` a silent one, both taking a pattern
//! loaded by [`pattern::load_regex`]. `->` declares a parser production. The
//! first production is the root of the parser.

use std::fmt::{self, Display};
use std::str::FromStr;

mod error;
mod load;
mod parser;
pub mod pattern;

pub use error::Error;
pub use load::{load, Language};

/// A constant identifying rules.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Identifier(pub String);

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A literal string.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Terminal(pub String);

impl Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.contains('"') {
            write!(f, "'{}'", self.0)
        } else {
            write!(f, "\"{}\"", self.0)
        }
    }
}

impl From<&str> for Terminal {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The lhs of a production rule.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Lhs(pub Identifier);

impl From<&str> for Lhs {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl Display for Lhs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The rhs of a production rule.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Rhs {
    /// Either a production or a lexer rule.
    Identifier(Identifier),
    /// A token matching the text exactly.
    Terminal(Terminal),
    Optional(Box<Rhs>),
    Repeat(Box<Rhs>),
    RepeatOnce(Box<Rhs>),
    Alternation(Box<Rhs>, Box<Rhs>),
    Concatenation(Box<Rhs>, Box<Rhs>),
}

impl Rhs {
    /// Every terminal referenced by this rhs, in order.
    pub fn terminals(&self) -> Vec<&Terminal> {
        match self {
            Rhs::Identifier(_) => Vec::new(),
            Rhs::Terminal(term) => vec![term],
            Rhs::Optional(rhs) | Rhs::Repeat(rhs) | Rhs::RepeatOnce(rhs) => rhs.terminals(),
            Rhs::Alternation(rhs1, rhs2) | Rhs::Concatenation(rhs1, rhs2) => {
                let mut terms = rhs1.terminals();
                terms.extend(rhs2.terminals());
                terms
            }
        }
    }
}

impl Display for Rhs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rhs::Identifier(iden) => write!(f, "{}", iden),
            Rhs::Terminal(term) => write!(f, "{}", term),
            Rhs::Optional(rhs) => write!(f, "[ {} ]", rhs),
            Rhs::Repeat(rhs) => write!(f, "{{ {} }}", rhs),
            Rhs::RepeatOnce(rhs) => write!(f, "{{ {} }}+", rhs),
            Rhs::Alternation(rhs1, rhs2) => {
                let left = matches!(**rhs1, Rhs::Alternation(..));
                write!(f, "{} | {}", Grouped(rhs1, left), rhs2)
            }
            Rhs::Concatenation(rhs1, rhs2) => {
                let left = matches!(**rhs1, Rhs::Alternation(..) | Rhs::Concatenation(..));
                let right = matches!(**rhs2, Rhs::Alternation(..));
                write!(f, "{} , {}", Grouped(rhs1, left), Grouped(rhs2, right))
            }
        }
    }
}

/// An operand written in parentheses when `.1` is set.
///
/// Both operators nest to the right, so a left operand of the same operator
/// or any looser operand needs parentheses to parse back into the same tree.
struct Grouped<'a>(&'a Rhs, bool);

impl Display for Grouped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.1 {
            write!(f, "( {} )", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Rhs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, rhs) = parser::rhs(s)?;
        Ok(rhs)
    }
}

/// A production rule.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Production {
    pub lhs: Lhs,
    pub rhs: Rhs,
}

impl Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {} ;", self.lhs, self.rhs)
    }
}

/// A lexer rule.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TokenRule {
    pub name: Identifier,
    pub pattern: Terminal,
    /// Silent rules match input without producing tokens.
    pub silent: bool,
}

impl Display for TokenRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = if self.silent { "~=" } else { "=" };
        write!(f, "{} {} {} ;", self.name, op, self.pattern)
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Statement {
    Token(TokenRule),
    Production(Production),
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Token(rule) => write!(f, "{}", rule),
            Statement::Production(rule) => write!(f, "{}", rule),
        }
    }
}

impl FromStr for Statement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, statement) = parser::statement(s)?;
        Ok(statement)
    }
}

/// A set of rules.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Grammar {
    pub rules: Vec<Statement>,
}

impl Grammar {
    pub fn token_rules(&self) -> impl Iterator<Item = &TokenRule> {
        self.rules.iter().filter_map(|s| match s {
            Statement::Token(rule) => Some(rule),
            Statement::Production(_) => None,
        })
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.rules.iter().filter_map(|s| match s {
            Statement::Production(rule) => Some(rule),
            Statement::Token(_) => None,
        })
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl FromStr for Grammar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, grammar) = parser::grammar(s)?;
        Ok(grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Debug;
    use std::string::ToString;

    fn assert_lossless_conversion<T, E>(t: T)
    where
        T: ToString + FromStr<Err = E> + Eq + Debug,
        E: std::error::Error,
    {
        let s = t.to_string();
        let t_parse = T::from_str(&s).unwrap();
        assert_eq!(t, t_parse, "To string:\n{}\n", s);
    }

    #[test]
    fn lossless_rhs() {
        let tests = vec![
            Rhs::RepeatOnce(Box::new(Rhs::Terminal("hello".into()))),
            Rhs::Alternation(
                Box::new(Rhs::Identifier("a".into())),
                Box::new(Rhs::Alternation(
                    Box::new(Rhs::Identifier("b".into())),
                    Box::new(Rhs::Concatenation(
                        Box::new(Rhs::Terminal("c".into())),
                        Box::new(Rhs::Terminal("d".into())),
                    )),
                )),
            ),
            Rhs::Concatenation(
                Box::new(Rhs::Optional(Box::new(Rhs::Identifier("a".into())))),
                Box::new(Rhs::Alternation(
                    Box::new(Rhs::Terminal("\"".into())),
                    Box::new(Rhs::Repeat(Box::new(Rhs::Identifier("b".into())))),
                )),
            ),
            Rhs::Concatenation(
                Box::new(Rhs::Alternation(
                    Box::new(Rhs::Identifier("a".into())),
                    Box::new(Rhs::Identifier("b".into())),
                )),
                Box::new(Rhs::Identifier("c".into())),
            ),
            Rhs::Alternation(
                Box::new(Rhs::Alternation(
                    Box::new(Rhs::Identifier("a".into())),
                    Box::new(Rhs::Identifier("b".into())),
                )),
                Box::new(Rhs::Identifier("c".into())),
            ),
            Rhs::Concatenation(
                Box::new(Rhs::Concatenation(
                    Box::new(Rhs::Identifier("a".into())),
                    Box::new(Rhs::Identifier("b".into())),
                )),
                Box::new(Rhs::Optional(Box::new(Rhs::Alternation(
                    Box::new(Rhs::Identifier("c".into())),
                    Box::new(Rhs::Identifier("d".into())),
                )))),
            ),
        ];

        for test in tests {
            assert_lossless_conversion(test);
        }
    }

    #[test]
    fn lossless_statement() {
        let tests = vec![
            Statement::Production(Production {
                lhs: Lhs("a".into()),
                rhs: Rhs::Identifier("b".into()),
            }),
            Statement::Token(TokenRule {
                name: "str".into(),
                pattern: "'(^')*'".into(),
                silent: false,
            }),
            Statement::Token(TokenRule {
                name: "ws".into(),
                pattern: " +".into(),
                silent: true,
            }),
        ];

        for test in tests {
            assert_lossless_conversion(test);
        }
    }

    #[test]
    fn lossless_grammar() {
        let g = Grammar {
            rules: vec![
                Statement::Token(TokenRule {
                    name: "d".into(),
                    pattern: "[0-9]".into(),
                    silent: false,
                }),
                Statement::Production(Production {
                    lhs: Lhs("a".into()),
                    rhs: Rhs::Identifier("b".into()),
                }),
                Statement::Production(Production {
                    lhs: Lhs("c".into()),
                    rhs: Rhs::Identifier("d".into()),
                }),
            ],
        };

        assert_lossless_conversion(g);
    }

    #[test]
    fn terminals() {
        let rhs: Rhs = "\"(\" , { a | \"+\" } , \")\"".parse().unwrap();
        let terms: Vec<&str> = rhs.terminals().iter().map(|t| t.0.as_str()).collect();
        assert_eq!(terms, vec!["(", "+", ")"]);
    }
}
