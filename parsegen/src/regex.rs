//! Character level matching.
//!
//! A [`Regex`] is a single rule over chars, built from the combinators in
//! [`Rule`] and the primitives in [`Matcher`]. Matching is anchored at the
//! start of the input and never needs to consume all of it.

use std::fmt::{self, Display};

use crate::error::Error;
use crate::location::Position;
use crate::processor::{Context, Domain, Processor, Rule, Rules};

/// Name of the single rule held by a regex processor.
const ROOT: &str = "<root>";

#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Match an exact string.
    Literal(String),
    /// Match a single char in an inclusive range.
    Class(char, char),
    /// Match a single char, as long as the inner rule doesn't match.
    Not(Box<Rule<Matcher>>),
}

pub fn literal(s: impl Into<String>) -> Rule<Matcher> {
    Rule::Matcher(Matcher::Literal(s.into()))
}

pub fn class(min: char, max: char) -> Rule<Matcher> {
    Rule::Matcher(Matcher::Class(min, max))
}

pub fn not(rule: Rule<Matcher>) -> Rule<Matcher> {
    Rule::Matcher(Matcher::Not(Box::new(rule)))
}

impl Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Matcher::Literal(s) => write!(f, "'{}'", s),
            Matcher::Class(min, max) => write!(f, "[{}-{}]", min, max),
            Matcher::Not(rule) => write!(f, "^{}", rule),
        }
    }
}

/// The regex domain: input is a position in a str, output the matched text.
#[derive(Debug, Clone, PartialEq)]
pub struct Matching;

impl Domain for Matching {
    type Input = Position;
    type Output = String;
    type Matcher = Matcher;

    fn apply_matcher(&self, matcher: &Matcher, context: &Context<'_, Self>) -> Result<String, Error> {
        let input = context.input();
        match matcher {
            Matcher::Literal(s) => {
                if input.starts_with(s) {
                    Ok(s.clone())
                } else {
                    Err(context.error(format!("failed to match '{}'", s)))
                }
            }
            Matcher::Class(min, max) => match input.peek() {
                None => Err(context.error("no input")),
                Some(c) if *min <= c && c <= *max => Ok(c.to_string()),
                Some(_) => Err(context.error(format!("failed to match {}", matcher))),
            },
            Matcher::Not(rule) => match input.peek() {
                None => Err(context.error("no input")),
                Some(c) => match rule.apply(context) {
                    Ok(_) => Err(context.error(format!("failed to match {}", matcher))),
                    Err(_) => Ok(c.to_string()),
                },
            },
        }
    }

    fn advance(&self, input: &Position, output: &String) -> Position {
        input.skip(output.len())
    }

    fn aggregate(&self, _context: &Context<'_, Self>, outputs: Vec<String>) -> String {
        outputs.concat()
    }

    fn empty(&self, input: &Position) -> bool {
        input.is_empty()
    }

    fn error_message(&self, input: &Position, msg: String) -> String {
        let snippet: String = input.rest().chars().take(10).collect();
        format!("regex error {:?} at {:?}", msg, snippet)
    }
}

/// A compiled pattern.
///
/// # Examples
///
/// ```
/// use parsegen::regex::{self, Regex};
/// use parsegen::Rule;
///
/// let re = Regex::new(Rule::one_or_more(regex::class('0', '9')));
/// assert_eq!(re.process("123abc").unwrap(), "123");
/// assert!(re.process("abc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Regex {
    rule: Rule<Matcher>,
    processor: Processor<Matching>,
}

impl Regex {
    pub fn new(rule: Rule<Matcher>) -> Self {
        let rules: Rules<Matcher> = vec![(ROOT, rule.clone())].into_iter().collect();
        Regex {
            rule,
            processor: Processor::new(Matching, rules, ROOT),
        }
    }

    pub fn rule(&self) -> &Rule<Matcher> {
        &self.rule
    }

    /// Match a prefix of `input`, returning the matched text.
    pub fn process(&self, input: &str) -> Result<String, Error> {
        self.match_at(Position::new(input))
    }

    /// Match a prefix of the input remaining at `position`.
    pub fn match_at(&self, position: Position) -> Result<String, Error> {
        self.processor.process(position)
    }
}

impl Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.rule())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(rule: Rule<Matcher>, tests: Vec<(&str, Option<&str>)>) {
        let re = Regex::new(rule);
        for test in tests {
            let got = re.process(test.0).ok();
            assert_eq!(got.as_deref(), test.1, "regex: {}, test case: {:?}", re, test);
        }
    }

    #[test]
    fn literal_matching() {
        check(
            literal("ab"),
            vec![
                ("ab", Some("ab")),
                ("abc", Some("ab")),
                ("a", None),
                ("", None),
                ("ba", None),
            ],
        );
    }

    #[test]
    fn class_matching() {
        check(
            class('a', 'c'),
            vec![
                ("a", Some("a")),
                ("c", Some("c")),
                ("bz", Some("b")),
                ("d", None),
                ("", None),
            ],
        );
    }

    #[test]
    fn not_matching() {
        check(
            not(literal("a")),
            vec![("b", Some("b")), ("bc", Some("b")), ("a", None), ("", None)],
        );
    }

    #[test]
    fn combinators() {
        let tests = vec![
            (
                Rule::and(vec![literal("a"), literal("b")]),
                vec![("ab", Some("ab")), ("abc", Some("ab")), ("a", None), ("b", None)],
            ),
            (
                Rule::or(vec![literal("a"), literal("b")]),
                vec![("a", Some("a")), ("b", Some("b")), ("c", None)],
            ),
            (
                Rule::zero_or_more(literal("a")),
                vec![("", Some("")), ("b", Some("")), ("aab", Some("aa"))],
            ),
            (
                Rule::one_or_more(literal("a")),
                vec![("", None), ("b", None), ("aab", Some("aa"))],
            ),
            (
                Rule::zero_or_one(literal("a")),
                vec![("", Some("")), ("aab", Some("a"))],
            ),
            (
                Rule::until_empty(literal("a")),
                vec![("", Some("")), ("aa", Some("aa")), ("aab", None)],
            ),
        ];
        for (rule, cases) in tests {
            check(rule, cases);
        }
    }

    #[test]
    fn quoted_string() {
        let quote = || literal("'");
        let rule = Rule::and(vec![quote(), Rule::zero_or_more(not(quote())), quote()]);
        check(
            rule,
            vec![
                ("''", Some("''")),
                ("'abc' rest", Some("'abc'")),
                ("'abc", None),
                ("abc'", None),
            ],
        );
    }

    #[test]
    fn error_message() {
        let err = Regex::new(literal("a")).process("b").unwrap_err();
        assert_eq!(
            err.msg(),
            r#"error while applying rule '<root>': regex error "failed to match 'a'" at "b""#
        );
        assert_eq!(err.location(), None);
    }

    #[test]
    fn display() {
        let tests = vec![
            (literal("a"), "'a'"),
            (class('a', 'z'), "[a-z]"),
            (not(literal("a")), "^'a'"),
            (Rule::and(vec![literal("a"), class('0', '9')]), "('a' [0-9])"),
            (Rule::or(vec![literal("a"), literal("b")]), "('a' | 'b')"),
            (Rule::zero_or_more(literal("a")), "'a'*"),
            (Rule::one_or_more(literal("a")), "'a'+"),
            (Rule::zero_or_one(literal("a")), "'a'?"),
            (Rule::until_empty(literal("a")), "'a'!"),
        ];
        for test in tests {
            assert_eq!(Regex::new(test.0.clone()).to_string(), test.1, "test case: {:?}", test);
        }
    }

    #[test]
    fn keeps_root_rule() {
        let rule = Rule::and(vec![literal("a"), Rule::zero_or_more(class('0', '9'))]);
        let re = Regex::new(rule.clone());
        assert_eq!(re.rule(), &rule);
        assert_eq!(re.clone().rule(), &rule);
    }
}
