use log::debug;
use parsegen::parser::{self, Matcher};
use parsegen::{regex, Lexer, Node, Parser, Regex, Rule, Rules, Token};
use std::collections::BTreeSet;

use crate::pattern::load_regex;
use crate::{Error, Grammar, Rhs};

/// A lexer and parser built from a grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    lexer: Lexer,
    parser: Parser,
}

/// Load a language from grammar text.
pub fn load(text: &str) -> Result<Language, Error> {
    let grammar: Grammar = text.parse()?;
    Language::from_grammar(&grammar)
}

impl Language {
    pub fn from_grammar(grammar: &Grammar) -> Result<Self, Error> {
        let mut visible = Vec::new();
        let mut silent = Vec::new();
        let mut lexer_rules = BTreeSet::new();
        for rule in grammar.token_rules() {
            let pattern = &rule.pattern.0;
            let regex = load_regex(pattern).map_err(|e| Error::Pattern(pattern.clone(), e))?;
            let name = rule.name.0.clone();
            lexer_rules.insert(name.clone());
            if rule.silent {
                silent.push((name, regex));
            } else {
                visible.push((name, regex));
            }
        }

        // Terminals match their own text.
        for production in grammar.productions() {
            for term in production.rhs.terminals() {
                if lexer_rules.insert(term.0.clone()) {
                    visible.push((term.0.clone(), Regex::new(regex::literal(term.0.as_str()))));
                }
            }
        }

        let productions: BTreeSet<&str> = grammar
            .productions()
            .map(|p| (p.lhs.0).0.as_str())
            .collect();
        let mut rules = Rules::new();
        let mut root = None;
        for production in grammar.productions() {
            let name = &(production.lhs.0).0;
            let rule = convert(&production.rhs, &productions, &lexer_rules)?;
            rules.insert(name.clone(), rule)?;
            root.get_or_insert_with(|| name.clone());
        }
        let root = root.ok_or(Error::NoProductions)?;

        debug!(
            "loaded grammar with {} lexer rules and {} productions, root '{}'",
            lexer_rules.len(),
            rules.len(),
            root
        );
        Ok(Language {
            lexer: Lexer::new(visible, silent)?,
            parser: Parser::new(rules, root)?,
        })
    }

    pub fn lexer(&self) -> &Lexer {
        &self.lexer
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn lex(&self, input: &str) -> Result<Vec<Token>, Error> {
        Ok(self.lexer.lex(input)?)
    }

    pub fn parse(&self, input: &str) -> Result<Node, Error> {
        let tokens = self.lex(input)?;
        Ok(self.parser.parse(tokens)?)
    }
}

fn convert(
    rhs: &Rhs,
    productions: &BTreeSet<&str>,
    lexer_rules: &BTreeSet<String>,
) -> Result<Rule<Matcher>, Error> {
    let rule = match rhs {
        Rhs::Identifier(iden) => {
            let name = iden.0.as_str();
            if productions.contains(name) {
                Rule::reference(name)
            } else if lexer_rules.contains(name) {
                parser::literal(name)
            } else {
                return Err(Error::UnknownIdentifier(name.to_owned()));
            }
        }
        Rhs::Terminal(term) => parser::literal(term.0.as_str()),
        Rhs::Optional(inner) => Rule::zero_or_one(convert(inner, productions, lexer_rules)?),
        Rhs::Repeat(inner) => Rule::zero_or_more(convert(inner, productions, lexer_rules)?),
        Rhs::RepeatOnce(inner) => Rule::one_or_more(convert(inner, productions, lexer_rules)?),
        Rhs::Alternation(_, _) => {
            let mut alternatives = Vec::new();
            for rhs in flatten(rhs) {
                alternatives.push(convert(rhs, productions, lexer_rules)?);
            }
            Rule::or(alternatives)
        }
        Rhs::Concatenation(_, _) => {
            let mut sequence = Vec::new();
            for rhs in flatten(rhs) {
                sequence.push(convert(rhs, productions, lexer_rules)?);
            }
            Rule::and(sequence)
        }
    };
    Ok(rule)
}

/// Collect the operands of a chain of alternations or concatenations.
fn flatten(rhs: &Rhs) -> Vec<&Rhs> {
    match rhs {
        Rhs::Alternation(first, rest) => {
            let mut operands = vec![first.as_ref()];
            match rest.as_ref() {
                Rhs::Alternation(_, _) => operands.extend(flatten(rest)),
                other => operands.push(other),
            }
            operands
        }
        Rhs::Concatenation(first, rest) => {
            let mut operands = vec![first.as_ref()];
            match rest.as_ref() {
                Rhs::Concatenation(_, _) => operands.extend(flatten(rest)),
                other => operands.push(other),
            }
            operands
        }
        other => vec![other],
    }
}
