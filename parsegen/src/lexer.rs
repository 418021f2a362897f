use log::debug;
use std::collections::BTreeSet;
use std::fmt::{self, Display};

use crate::error::Error;
use crate::location::{Location, Position};
use crate::processor::{Context, Domain, Processor, Rule, Rules};
use crate::regex::Regex;

/// Name of the rule tying all lexer rules together.
const ROOT: &str = "<root>";

/// A classified span of input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub location: Location,
    /// Name of the lexer rule that produced this token.
    pub rule_name: String,
    /// False for tokens produced by silent rules.
    pub include: bool,
}

impl Token {
    pub fn new(rule_name: impl Into<String>, value: impl Into<String>, location: Location) -> Self {
        Token {
            value: value.into(),
            location,
            rule_name: rule_name.into(),
            include: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({:?})", self.rule_name, self.value)
    }
}

/// A position in the input, along with the line and column it corresponds to.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    position: Position,
    location: Location,
}

impl Located {
    pub fn new(input: &str) -> Self {
        Located {
            position: Position::new(input),
            location: Location::default(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }
}

/// The lexer domain. Rules are regexes, each match producing a single token.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexing {
    visible: BTreeSet<String>,
    silent: BTreeSet<String>,
}

impl Domain for Lexing {
    type Input = Located;
    type Output = Vec<Token>;
    type Matcher = Regex;

    fn apply_matcher(&self, regex: &Regex, context: &Context<'_, Self>) -> Result<Vec<Token>, Error> {
        let input = context.input();
        match regex.match_at(input.position.clone()) {
            Ok(value) if value.is_empty() => Err(context.error(format!("empty match for {}", regex))),
            Ok(value) => Ok(vec![Token::new("", value, input.location)]),
            Err(err) => Err(context.error(err.msg())),
        }
    }

    fn advance(&self, input: &Located, output: &Vec<Token>) -> Located {
        output.iter().fold(input.clone(), |input, token| Located {
            position: input.position.skip(token.value.len()),
            location: input.location.advance(&token.value),
        })
    }

    fn aggregate(&self, _context: &Context<'_, Self>, outputs: Vec<Vec<Token>>) -> Vec<Token> {
        outputs.concat()
    }

    fn empty(&self, input: &Located) -> bool {
        input.position.is_empty()
    }

    fn location_of(&self, input: &Located) -> Option<Location> {
        Some(input.location)
    }

    fn with_rule_name(&self, mut output: Vec<Token>, rule_name: &str) -> Vec<Token> {
        let silent = self.silent.contains(rule_name);
        if silent || self.visible.contains(rule_name) {
            for token in output.iter_mut() {
                token.rule_name = rule_name.to_owned();
                token.include = !silent;
            }
        }
        output
    }
}

/// Splits text into tokens.
///
/// Every position of the input must be matched by exactly one rule. Tokens
/// from silent rules take part in matching but are dropped from the result.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexer {
    processor: Processor<Lexing>,
}

impl Lexer {
    pub fn new<V, S, N, M>(visible: V, silent: S) -> Result<Self, Error>
    where
        V: IntoIterator<Item = (N, Regex)>,
        S: IntoIterator<Item = (M, Regex)>,
        N: Into<String>,
        M: Into<String>,
    {
        let mut rules = Rules::new();
        let mut domain = Lexing {
            visible: BTreeSet::new(),
            silent: BTreeSet::new(),
        };

        let visible = visible.into_iter().map(|(n, r)| (n.into(), r, false));
        let silent = silent.into_iter().map(|(n, r)| (n.into(), r, true));
        for (name, regex, is_silent) in visible.chain(silent) {
            if name == ROOT {
                return Err(Error::new(format!("reserved rule name '{}'", name)));
            }
            rules.insert(name.clone(), Rule::Matcher(regex))?;
            if is_silent {
                domain.silent.insert(name);
            } else {
                domain.visible.insert(name);
            }
        }

        let alternatives = rules.names().map(Rule::reference).collect();
        rules.insert(ROOT, Rule::until_empty(Rule::or(alternatives)))?;
        debug!(
            "built lexer with visible rules {:?} and silent rules {:?}",
            domain.visible, domain.silent
        );

        Ok(Lexer {
            processor: Processor::new(domain, rules, ROOT),
        })
    }

    /// Tokenize `input`, dropping tokens from silent rules.
    pub fn lex(&self, input: &str) -> Result<Vec<Token>, Error> {
        let tokens = self.lex_all(input)?;
        Ok(tokens.into_iter().filter(|t| t.include).collect())
    }

    /// Tokenize `input`, keeping every token.
    pub fn lex_all(&self, input: &str) -> Result<Vec<Token>, Error> {
        self.processor.process(Located::new(input))
    }

    /// Names of every visible rule.
    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.processor.domain().visible.iter().map(|s| s.as_str())
    }

    /// Names of every silent rule.
    pub fn silent(&self) -> impl Iterator<Item = &str> {
        self.processor.domain().silent.iter().map(|s| s.as_str())
    }

    pub fn regex(&self, rule_name: &str) -> Option<&Regex> {
        match self.processor.rule(rule_name) {
            Some(Rule::Matcher(regex)) => Some(regex),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex;

    fn letters_digits() -> Regex {
        Regex::new(Rule::and(vec![
            Rule::one_or_more(regex::class('a', 'z')),
            Rule::one_or_more(regex::class('0', '9')),
        ]))
    }

    fn whitespace() -> Regex {
        Regex::new(Rule::one_or_more(Rule::or(vec![
            regex::literal(" "),
            regex::literal("\n"),
        ])))
    }

    fn lexer() -> Lexer {
        Lexer::new(vec![("id", letters_digits())], vec![("ws", whitespace())]).unwrap()
    }

    #[test]
    fn lex_skips_silent() {
        let tokens = lexer().lex(" a1 b2 ").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new("id", "a1", Location::new(0, 1)),
                Token::new("id", "b2", Location::new(0, 4)),
            ]
        );
    }

    #[test]
    fn lex_all_covers_input() {
        let tests = vec!["", " ", "a1", " a1 b2 ", "a1\n  bb22\nc3"];
        for test in tests {
            let tokens = lexer().lex_all(test).unwrap();
            let joined: String = tokens.iter().map(|t| t.as_str()).collect();
            assert_eq!(joined, test, "test case: {:?}", test);
        }
    }

    #[test]
    fn lex_tracks_lines() {
        let tokens = lexer().lex("a1\n  b2\n\nc3").unwrap();
        let locations: Vec<Location> = tokens.iter().map(|t| t.location).collect();
        assert_eq!(
            locations,
            vec![Location::new(0, 0), Location::new(1, 2), Location::new(3, 0)]
        );
    }

    #[test]
    fn silent_tokens_marked() {
        let tokens = lexer().lex_all("a1 ").unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].include);
        assert_eq!(tokens[1].rule_name, "ws");
        assert!(!tokens[1].include);
    }

    #[test]
    fn ambiguous_rules() {
        let lexer = Lexer::new(
            vec![
                ("a", Regex::new(regex::literal("a"))),
                ("b", Regex::new(regex::class('a', 'z'))),
            ],
            Vec::<(&str, Regex)>::new(),
        )
        .unwrap();
        let err = lexer.lex("a").unwrap_err();
        assert_eq!(err.location(), Some(Location::new(0, 0)));
        assert!(err.msg().contains("ambiguous result"), "error: {}", err);
    }

    #[test]
    fn unmatched_input() {
        let err = lexer().lex("a1 ?").unwrap_err();
        assert_eq!(err.location(), Some(Location::new(0, 3)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Lexer::new(vec![("id", letters_digits())], vec![("id", whitespace())]).unwrap_err();
        assert_eq!(err.msg(), "duplicate rule 'id'");

        let err = Lexer::new(vec![(ROOT, letters_digits())], Vec::<(&str, Regex)>::new()).unwrap_err();
        assert_eq!(err.msg(), "reserved rule name '<root>'");
    }

    #[test]
    fn rule_accessors() {
        let lexer = lexer();
        assert_eq!(lexer.visible().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(lexer.silent().collect::<Vec<_>>(), vec!["ws"]);
        assert!(lexer.regex("id").is_some());
        assert!(lexer.regex(ROOT).is_none());
        assert!(lexer.regex("nope").is_none());
    }
}
