//! Patterns for lexer rules.
//!
//! | pattern  | rule                       |
//! |----------|----------------------------|
//! | `ab`     | `a` followed by `b`        |
//! | `a\|b`   | exactly one of `a` or `b`  |
//! | `a*`     | zero or more               |
//! | `a+`     | one or more                |
//! | `a?`     | zero or one                |
//! | `a!`     | repeat until input is done |
//! | `^a`     | any char not matching `a`  |
//! | `[a-z]`  | char range                 |
//! | `(a)`    | grouping                   |
//! | `\*`     | escaped operator           |
//! | `\n`     | newline                    |
//! | `\t`     | tab                        |
//!
//! Patterns are themselves lexed, parsed and reduced with parsegen.

use log::trace;
use parsegen::parser;
use parsegen::regex::{self, Matcher};
use parsegen::syntax::{self, Reduction};
use parsegen::{Lexer, Node, Parser, Regex, Rule, Rules, Syntax};

const OPERATORS: &[&str] = &["*", "+", "?", "!", "^", "(", ")", "[", "]", "-", "|", "\\"];
const SUFFIXES: &[&str] = &["*", "+", "?", "!"];

/// Compile `pattern` into a regex.
pub fn load_regex(pattern: &str) -> Result<Regex, parsegen::Error> {
    PatternLoader::new()?.load(pattern)
}

/// The lexer, parser and syntax of the pattern language.
struct PatternLoader {
    lexer: Lexer,
    parser: Parser,
    syntax: Syntax<Rule<Matcher>>,
}

impl PatternLoader {
    fn new() -> Result<Self, parsegen::Error> {
        Ok(PatternLoader {
            lexer: lexer()?,
            parser: pattern_parser()?,
            syntax: pattern_syntax(),
        })
    }

    fn load(&self, pattern: &str) -> Result<Regex, parsegen::Error> {
        let tokens = self.lexer.lex(pattern)?;
        let tree = self.parser.parse(tokens)?;
        let rule = self.syntax.apply(&tree)?;
        trace!("loaded pattern {:?} as {}", pattern, rule);
        Ok(Regex::new(rule))
    }
}

fn operator(op: &str) -> Rule<Matcher> {
    regex::literal(op)
}

fn lexer() -> Result<Lexer, parsegen::Error> {
    let mut visible: Vec<(String, Regex)> = OPERATORS
        .iter()
        .filter(|op| **op != "\\")
        .map(|op| (op.to_string(), Regex::new(operator(op))))
        .collect();

    let reserved = || Rule::or(OPERATORS.iter().map(|op| operator(op)).collect());
    let escaped = Rule::or(vec![reserved(), regex::literal("n"), regex::literal("t")]);
    visible.push((
        "escape".to_owned(),
        Regex::new(Rule::and(vec![operator("\\"), escaped])),
    ));
    visible.push(("any".to_owned(), Regex::new(regex::not(reserved()))));

    Lexer::new(visible, Vec::<(String, Regex)>::new())
}

fn pattern_parser() -> Result<Parser, parsegen::Error> {
    let lit = parser::literal;
    let r = Rule::reference;

    let mut rules: Rules<parser::Matcher> = Rules::new();
    rules.insert(
        "alternation",
        Rule::and(vec![
            r("sequence"),
            Rule::zero_or_more(Rule::and(vec![lit("|"), r("sequence")])),
        ]),
    )?;
    rules.insert("sequence", Rule::one_or_more(r("item")))?;
    rules.insert(
        "item",
        Rule::and(vec![
            r("operand"),
            Rule::zero_or_one(Rule::or(SUFFIXES.iter().map(|s| lit(*s)).collect())),
        ]),
    )?;
    // A '-' outside of a class is a plain char.
    rules.insert(
        "operand",
        Rule::or(vec![
            r("class"),
            r("group"),
            r("negation"),
            lit("escape"),
            lit("any"),
            lit("-"),
        ]),
    )?;
    rules.insert(
        "class",
        Rule::and(vec![lit("["), lit("any"), lit("-"), lit("any"), lit("]")]),
    )?;
    rules.insert(
        "group",
        Rule::and(vec![lit("("), r("alternation"), lit(")")]),
    )?;
    rules.insert("negation", Rule::and(vec![lit("^"), r("operand")]))?;
    Parser::new(rules, "alternation")
}

fn class_range(node: &Node) -> Option<Rule<Matcher>> {
    let tokens = node.tokens();
    let min = tokens.get(1)?.value.chars().next()?;
    let max = tokens.get(3)?.value.chars().next()?;
    Some(regex::class(min, max))
}

fn suffixed(node: &Node, exprs: &[Rule<Matcher>]) -> Option<Rule<Matcher>> {
    let suffix = node
        .children
        .iter()
        .filter_map(|c| c.token.as_ref())
        .find(|t| SUFFIXES.iter().any(|s| *s == t.rule_name))?;
    let rule = match exprs {
        [rule] => rule.clone(),
        _ => return None,
    };
    match suffix.rule_name.as_str() {
        "*" => Some(Rule::zero_or_more(rule)),
        "+" => Some(Rule::one_or_more(rule)),
        "?" => Some(Rule::zero_or_one(rule)),
        "!" => Some(Rule::until_empty(rule)),
        _ => None,
    }
}

fn pattern_syntax() -> Syntax<Rule<Matcher>> {
    let rules: Vec<Reduction<Rule<Matcher>>> = vec![
        syntax::terminal("any", |val: &str| regex::literal(val)),
        syntax::terminal("-", |val: &str| regex::literal(val)),
        syntax::terminal("escape", |val: &str| -> Option<Rule<Matcher>> {
            match val.strip_prefix('\\')? {
                "n" => Some(regex::literal("\n")),
                "t" => Some(regex::literal("\t")),
                c => Some(regex::literal(c)),
            }
        }),
        syntax::rule_name("class", syntax::node(|node: &Node, _: &[Rule<Matcher>]| class_range(node))),
        syntax::unary("negation", regex::not),
        syntax::rule_name("item", syntax::node(suffixed)),
        syntax::variadic("sequence", |exprs: &[Rule<Matcher>]| match exprs {
            [rule] => rule.clone(),
            _ => Rule::and(exprs.to_vec()),
        }),
        syntax::variadic("alternation", |exprs: &[Rule<Matcher>]| match exprs {
            [rule] => rule.clone(),
            _ => Rule::or(exprs.to_vec()),
        }),
    ];
    Syntax::new(rules)
}
