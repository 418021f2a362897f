use log::debug;
use std::fmt::{self, Display};
use std::rc::Rc;

use crate::error::Error;
use crate::lexer::Token;
use crate::location::Location;
use crate::processor::{Context, Domain, Processor, Rule, Rules};

/// A node in a parse tree.
///
/// Leaves hold a single token. Interior nodes are labelled with the name of
/// the rule that produced them, or left unlabelled when they only group the
/// outputs of combinators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub token: Option<Token>,
    pub rule_name: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn leaf(token: Token) -> Self {
        Node {
            token: Some(token),
            rule_name: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(children: Vec<Node>) -> Self {
        Node {
            token: None,
            rule_name: None,
            children,
        }
    }

    pub fn rule(rule_name: impl Into<String>, children: Vec<Node>) -> Self {
        Node {
            token: None,
            rule_name: Some(rule_name.into()),
            children,
        }
    }

    /// The rule name for labelled nodes, the token's rule name for leaves.
    pub fn name(&self) -> Option<&str> {
        match (&self.rule_name, &self.token) {
            (Some(name), _) => Some(name),
            (None, Some(token)) => Some(&token.rule_name),
            (None, None) => None,
        }
    }

    /// Number of tokens in this subtree.
    pub fn len(&self) -> usize {
        let own = if self.token.is_some() { 1 } else { 0 };
        own + self.children.iter().map(|c| c.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every node of this subtree, depth first, starting with this node.
    pub fn descendants(&self) -> Vec<&Node> {
        let mut nodes = vec![self];
        for child in &self.children {
            nodes.extend(child.descendants());
        }
        nodes
    }

    /// Nodes of this subtree named `name`, depth first.
    pub fn descendants_named(&self, name: &str) -> Vec<&Node> {
        self.descendants()
            .into_iter()
            .filter(|n| n.name() == Some(name))
            .collect()
    }

    /// Tokens of this subtree, in input order.
    pub fn tokens(&self) -> Vec<&Token> {
        self.descendants()
            .into_iter()
            .filter_map(|n| n.token.as_ref())
            .collect()
    }

    /// Location of the first token in this subtree.
    pub fn location(&self) -> Option<Location> {
        self.tokens().first().map(|t| t.location)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match (&self.rule_name, &self.token) {
            (Some(name), Some(token)) => writeln!(f, "{}{} {}", indent, name, token)?,
            (Some(name), None) => writeln!(f, "{}{}", indent, name)?,
            (None, Some(token)) => writeln!(f, "{}{}", indent, token)?,
            (None, None) => writeln!(f, "{}_", indent)?,
        }
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Match one token produced by the named lexer rule.
    Literal(String),
}

pub fn literal(rule_name: impl Into<String>) -> Rule<Matcher> {
    Rule::Matcher(Matcher::Literal(rule_name.into()))
}

impl Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Matcher::Literal(name) => write!(f, "'{}'", name),
        }
    }
}

/// The remaining tokens of a parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Tokens {
    tokens: Rc<[Token]>,
    pos: usize,
}

impl Tokens {
    pub fn new(tokens: Vec<Token>) -> Self {
        Tokens {
            tokens: tokens.into(),
            pos: 0,
        }
    }

    pub fn rest(&self) -> &[Token] {
        &self.tokens[self.pos..]
    }

    fn skip(&self, n: usize) -> Self {
        Tokens {
            tokens: self.tokens.clone(),
            pos: (self.pos + n).min(self.tokens.len()),
        }
    }
}

/// The parser domain. Input is a token sequence, output a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsing;

impl Domain for Parsing {
    type Input = Tokens;
    type Output = Node;
    type Matcher = Matcher;

    fn apply_matcher(&self, matcher: &Matcher, context: &Context<'_, Self>) -> Result<Node, Error> {
        let Matcher::Literal(name) = matcher;
        match context.input().rest().first() {
            None => Err(context.error(format!("failed to find literal '{}': eof", name))),
            Some(token) if &token.rule_name == name => Ok(Node::leaf(token.clone())),
            Some(_) => Err(context.error(format!("failed to find literal '{}'", name))),
        }
    }

    fn advance(&self, input: &Tokens, output: &Node) -> Tokens {
        input.skip(output.len())
    }

    fn aggregate(&self, _context: &Context<'_, Self>, outputs: Vec<Node>) -> Node {
        let mut children = Vec::new();
        for output in outputs {
            // Unlabelled groups are spliced into their parent.
            if output.rule_name.is_none() && output.token.is_none() {
                children.extend(output.children);
            } else {
                children.push(output);
            }
        }
        Node::with_children(children)
    }

    fn empty(&self, input: &Tokens) -> bool {
        input.rest().is_empty()
    }

    fn location_of(&self, input: &Tokens) -> Option<Location> {
        input.rest().iter().map(|t| t.location).max()
    }

    fn with_rule_name(&self, output: Node, rule_name: &str) -> Node {
        if output.rule_name.is_none() && output.token.is_none() {
            Node {
                rule_name: Some(rule_name.to_owned()),
                ..output
            }
        } else {
            Node::rule(rule_name, vec![output])
        }
    }
}

/// Builds a tree from a token sequence.
///
/// The root rule must consume every token.
#[derive(Debug, Clone, PartialEq)]
pub struct Parser {
    processor: Processor<Parsing>,
}

impl Parser {
    pub fn new(rules: Rules<Matcher>, root: impl Into<String>) -> Result<Self, Error> {
        let root = root.into();
        if !rules.contains(&root) {
            return Err(Error::new(format!("unknown root rule '{}'", root)));
        }
        Ok(Parser {
            processor: Processor::new(Parsing, rules, root),
        })
    }

    pub fn root(&self) -> &str {
        self.processor.root()
    }

    pub fn rule(&self, name: &str) -> Option<&Rule<Matcher>> {
        self.processor.rule(name)
    }

    pub fn parse(&self, tokens: Vec<Token>) -> Result<Node, Error> {
        let total = tokens.len();
        let input = Tokens::new(tokens);
        let (result, swallowed) = self.processor.process_logged(input.clone());
        let node = result?;
        if node.len() == total {
            return Ok(node);
        }

        debug!(
            "rule '{}' consumed {} of {} tokens",
            self.root(),
            node.len(),
            total
        );
        if !swallowed.is_empty() {
            // The errors that stopped repetition explain why input was left over.
            let context = Context::new(&self.processor, input);
            return Err(context.aggregate_errors(swallowed));
        }
        let leftover = &input.rest()[node.len()];
        Err(Error::at(
            format!("unconsumed input starting at {}", leftover),
            leftover.location,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(rule_name: &str, line: usize, col: usize) -> Token {
        Token::new(rule_name, rule_name, Location::new(line, col))
    }

    fn leaf(rule_name: &str, line: usize, col: usize) -> Node {
        Node::leaf(tok(rule_name, line, col))
    }

    fn parser(rules: Vec<(&str, Rule<Matcher>)>, root: &str) -> Parser {
        Parser::new(rules.into_iter().collect(), root).unwrap()
    }

    #[test]
    fn literal_matching() {
        let p = parser(vec![("a", literal("x"))], "a");
        assert_eq!(
            p.parse(vec![tok("x", 0, 0)]).unwrap(),
            Node::rule("a", vec![leaf("x", 0, 0)])
        );

        let err = p.parse(vec![tok("y", 0, 0)]).unwrap_err();
        assert_eq!(err.msg(), "error while applying rule 'a': failed to find literal 'x'");
        assert_eq!(err.location(), Some(Location::new(0, 0)));

        let err = p.parse(vec![]).unwrap_err();
        assert_eq!(
            err.msg(),
            "error while applying rule 'a': failed to find literal 'x': eof"
        );
        assert_eq!(err.location(), None);
    }

    #[test]
    fn nested_rules() {
        let p = parser(
            vec![
                ("a", Rule::one_or_more(Rule::reference("b"))),
                ("b", Rule::or(vec![literal("c"), literal("d")])),
            ],
            "a",
        );
        let got = p.parse(vec![tok("c", 0, 0), tok("d", 0, 1)]).unwrap();
        assert_eq!(
            got,
            Node::rule(
                "a",
                vec![
                    Node::rule("b", vec![leaf("c", 0, 0)]),
                    Node::rule("b", vec![leaf("d", 0, 1)]),
                ]
            )
        );
        assert_eq!(got.len(), 2);
        assert_eq!(got.location(), Some(Location::new(0, 0)));
        assert_eq!(got.descendants().len(), 5);
    }

    #[test]
    fn unconsumed_input() {
        let p = parser(
            vec![
                ("a", Rule::one_or_more(Rule::reference("b"))),
                ("b", Rule::or(vec![literal("c"), literal("d")])),
            ],
            "a",
        );
        let err = p
            .parse(vec![tok("c", 0, 0), tok("d", 1, 0), tok("e", 2, 0)])
            .unwrap_err();
        assert_eq!(err.location(), Some(Location::new(2, 0)));
        assert_eq!(
            err.msg(),
            "error while applying rule 'b': [failed to find literal 'c', failed to find literal 'd']"
        );
    }

    #[test]
    fn unconsumed_input_without_swallowed_errors() {
        let p = parser(vec![("a", literal("x"))], "a");
        let err = p.parse(vec![tok("x", 0, 0), tok("y", 0, 1)]).unwrap_err();
        assert_eq!(err.location(), Some(Location::new(0, 1)));
        assert_eq!(err.msg(), "unconsumed input starting at y(\"y\")");
    }

    #[test]
    fn optional_and_groups() {
        let p = parser(
            vec![(
                "a",
                Rule::and(vec![
                    literal("x"),
                    Rule::zero_or_one(literal("y")),
                    Rule::zero_or_more(Rule::and(vec![literal(","), literal("x")])),
                ]),
            )],
            "a",
        );
        let tests = vec![
            (vec!["x"], vec!["x"]),
            (vec!["x", "y"], vec!["x", "y"]),
            (vec!["x", ",", "x", ",", "x"], vec!["x", ",", "x", ",", "x"]),
        ];
        for test in tests {
            let tokens = test.0.iter().enumerate().map(|(i, n)| tok(n, 0, i)).collect();
            let node = p.parse(tokens).unwrap();
            // Combinator groups are flattened into the rule's node.
            let names: Vec<&str> = node.children.iter().filter_map(|c| c.name()).collect();
            assert_eq!(names, test.1, "test case: {:?}", test);
        }
    }

    #[test]
    fn ambiguous_derivation() {
        let p = parser(
            vec![
                ("a", Rule::or(vec![Rule::reference("b"), Rule::reference("c")])),
                ("b", Rule::and(vec![literal("x"), literal("y")])),
                ("c", Rule::and(vec![literal("x"), Rule::zero_or_one(literal("y"))])),
            ],
            "a",
        );
        let err = p.parse(vec![tok("x", 0, 0), tok("y", 0, 1)]).unwrap_err();
        assert!(
            err.msg().starts_with("error while applying rule 'a': ambiguous result"),
            "error: {}",
            err
        );
        assert_eq!(err.location(), Some(Location::new(0, 1)));

        // Only one production derives a lone 'x'.
        let node = p.parse(vec![tok("x", 0, 0)]).unwrap();
        assert_eq!(
            node,
            Node::rule("a", vec![Node::rule("c", vec![leaf("x", 0, 0)])])
        );
    }

    #[test]
    fn unknown_root() {
        let err = Parser::new(Rules::new(), "a").unwrap_err();
        assert_eq!(err.msg(), "unknown root rule 'a'");
    }

    #[test]
    fn node_display() {
        let node = Node::rule("a", vec![Node::rule("b", vec![leaf("c", 0, 0)])]);
        assert_eq!(node.to_string(), "a\n  b\n    c(\"c\")\n");
    }
}
