//! The generic evaluation engine.
//!
//! A [`Processor`] owns a table of named [`Rule`]s and a [`Domain`], the set of
//! hooks that decide what input and output look like. The combinators are
//! written once here and reused by the regex, lexer and parser domains.

use log::{debug, trace};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::iter::FromIterator;
use std::rc::Rc;

use crate::error::Error;
use crate::location::Location;

/// Hooks specializing a [`Processor`] to some input and output.
pub trait Domain: Debug + Sized {
    type Input: Clone + Debug;
    type Output: Clone + Debug;
    /// Domain specific primitive rules.
    type Matcher: Clone + Debug + PartialEq;

    /// Apply a primitive rule.
    fn apply_matcher(
        &self,
        matcher: &Self::Matcher,
        context: &Context<'_, Self>,
    ) -> Result<Self::Output, Error>;

    /// Move input past the part accounted for by `output`.
    fn advance(&self, input: &Self::Input, output: &Self::Output) -> Self::Input;

    /// Combine the outputs of consecutive rule applications.
    fn aggregate(&self, context: &Context<'_, Self>, outputs: Vec<Self::Output>) -> Self::Output;

    fn empty(&self, input: &Self::Input) -> bool;

    fn location_of(&self, _input: &Self::Input) -> Option<Location> {
        None
    }

    /// Tag the output of a named rule.
    fn with_rule_name(&self, output: Self::Output, _rule_name: &str) -> Self::Output {
        output
    }

    /// Choose the location errors are reported at when aggregating.
    fn furthest_location(&self, locations: &[Location]) -> Option<Location> {
        locations.iter().max().copied()
    }

    /// Decorate an error message raised at `input`.
    fn error_message(&self, _input: &Self::Input, msg: String) -> String {
        msg
    }
}

/// Errors swallowed by combinators during one top level evaluation.
#[derive(Debug, Default)]
struct FailureLog {
    errors: RefCell<Vec<Error>>,
}

/// A processor bound to some position in the input.
///
/// Contexts are never modified, advancing produces a new context.
pub struct Context<'a, D: Domain> {
    processor: &'a Processor<D>,
    input: D::Input,
    failures: Rc<FailureLog>,
}

impl<'a, D: Domain> Clone for Context<'a, D> {
    fn clone(&self) -> Self {
        Context {
            processor: self.processor,
            input: self.input.clone(),
            failures: self.failures.clone(),
        }
    }
}

impl<'a, D: Domain> Debug for Context<'a, D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("input", &self.input)
            .finish()
    }
}

impl<'a, D: Domain> Context<'a, D> {
    pub fn new(processor: &'a Processor<D>, input: D::Input) -> Self {
        Context {
            processor,
            input,
            failures: Rc::new(FailureLog::default()),
        }
    }

    pub fn processor(&self) -> &'a Processor<D> {
        self.processor
    }

    pub fn input(&self) -> &D::Input {
        &self.input
    }

    pub fn advance(&self, output: &D::Output) -> Self {
        Context {
            processor: self.processor,
            input: self.processor.domain.advance(&self.input, output),
            failures: self.failures.clone(),
        }
    }

    pub fn aggregate(&self, outputs: Vec<D::Output>) -> D::Output {
        self.processor.domain.aggregate(self, outputs)
    }

    /// Aggregate errors using the processor's notion of furthest location.
    pub fn aggregate_errors(&self, errors: Vec<Error>) -> Error {
        Error::aggregate_by(errors, |locations| {
            self.processor.domain.furthest_location(locations)
        })
    }

    /// Create an error at the current location.
    pub fn error(&self, msg: impl Into<String>) -> Error {
        let msg = self.processor.domain.error_message(&self.input, msg.into());
        Error::with_location(msg, self.location())
    }

    pub fn empty(&self) -> bool {
        self.processor.domain.empty(&self.input)
    }

    pub fn location(&self) -> Option<Location> {
        self.processor.domain.location_of(&self.input)
    }

    fn swallow(&self, error: Error) {
        trace!("swallowed: {}", error);
        self.failures.errors.borrow_mut().push(error);
    }

    fn swallowed(&self) -> Vec<Error> {
        self.failures.errors.borrow().clone()
    }
}

/// A rule, either a domain primitive or a combinator over other rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule<M> {
    Matcher(M),
    /// Apply the named rule of the processor.
    Ref(String),
    And(Vec<Rule<M>>),
    /// Exactly one alternative must match. Every alternative is always tried.
    Or(Vec<Rule<M>>),
    ZeroOrMore(Box<Rule<M>>),
    OneOrMore(Box<Rule<M>>),
    ZeroOrOne(Box<Rule<M>>),
    /// Repeat until the input is exhausted. Failures propagate.
    UntilEmpty(Box<Rule<M>>),
}

impl<M> Rule<M> {
    pub fn reference(name: impl Into<String>) -> Self {
        Rule::Ref(name.into())
    }

    pub fn and(rules: Vec<Rule<M>>) -> Self {
        Rule::And(rules)
    }

    pub fn or(rules: Vec<Rule<M>>) -> Self {
        Rule::Or(rules)
    }

    pub fn zero_or_more(rule: Rule<M>) -> Self {
        Rule::ZeroOrMore(Box::new(rule))
    }

    pub fn one_or_more(rule: Rule<M>) -> Self {
        Rule::OneOrMore(Box::new(rule))
    }

    pub fn zero_or_one(rule: Rule<M>) -> Self {
        Rule::ZeroOrOne(Box::new(rule))
    }

    pub fn until_empty(rule: Rule<M>) -> Self {
        Rule::UntilEmpty(Box::new(rule))
    }

    pub fn apply<D>(&self, context: &Context<'_, D>) -> Result<D::Output, Error>
    where
        D: Domain<Matcher = M>,
    {
        match self {
            Rule::Matcher(matcher) => context.processor.domain.apply_matcher(matcher, context),
            Rule::Ref(name) => {
                let output = context.processor.apply_rule(name, context)?;
                Ok(context.aggregate(vec![output]))
            }
            Rule::And(rules) => {
                let mut context = context.clone();
                let mut outputs = Vec::with_capacity(rules.len());
                for rule in rules {
                    let output = rule.apply(&context)?;
                    context = context.advance(&output);
                    outputs.push(output);
                }
                Ok(context.aggregate(outputs))
            }
            Rule::Or(rules) => {
                let mut successes = Vec::new();
                let mut failures = Vec::new();
                for rule in rules {
                    match rule.apply(context) {
                        Ok(output) => successes.push(output),
                        Err(error) => failures.push(error),
                    }
                }
                match successes.len() {
                    0 => Err(context.aggregate_errors(failures)),
                    1 => Ok(successes.remove(0)),
                    _ => {
                        debug!("ambiguous result at {:?}: {:?}", context.location(), successes);
                        Err(context.error(format!("ambiguous result {:?}", successes)))
                    }
                }
            }
            Rule::ZeroOrMore(rule) => {
                let (outputs, context) = repeat(rule, context.clone(), Vec::new());
                Ok(context.aggregate(outputs))
            }
            Rule::OneOrMore(rule) => {
                let first = rule.apply(context)?;
                let next = context.advance(&first);
                let (outputs, context) = repeat(rule, next, vec![first]);
                Ok(context.aggregate(outputs))
            }
            Rule::ZeroOrOne(rule) => match rule.apply(context) {
                Ok(output) => Ok(output),
                Err(error) => {
                    context.swallow(error);
                    Ok(context.aggregate(Vec::new()))
                }
            },
            Rule::UntilEmpty(rule) => {
                let mut context = context.clone();
                let mut outputs = Vec::new();
                while !context.empty() {
                    let output = rule.apply(&context)?;
                    context = context.advance(&output);
                    outputs.push(output);
                }
                Ok(context.aggregate(outputs))
            }
        }
    }
}

/// Repeatedly applies `rule` until the first error, which is swallowed.
fn repeat<'a, D: Domain>(
    rule: &Rule<D::Matcher>,
    mut context: Context<'a, D>,
    mut outputs: Vec<D::Output>,
) -> (Vec<D::Output>, Context<'a, D>) {
    loop {
        match rule.apply(&context) {
            Ok(output) => {
                context = context.advance(&output);
                outputs.push(output);
            }
            Err(error) => {
                context.swallow(error);
                return (outputs, context);
            }
        }
    }
}

impl<M: Display> Display for Rule<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn join<M: Display>(rules: &[Rule<M>], sep: &str) -> String {
            rules
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(sep)
        }

        match self {
            Rule::Matcher(m) => write!(f, "{}", m),
            Rule::Ref(name) => write!(f, "{}", name),
            Rule::And(rules) => write!(f, "({})", join(rules, " ")),
            Rule::Or(rules) => write!(f, "({})", join(rules, " | ")),
            Rule::ZeroOrMore(rule) => write!(f, "{}*", rule),
            Rule::OneOrMore(rule) => write!(f, "{}+", rule),
            Rule::ZeroOrOne(rule) => write!(f, "{}?", rule),
            Rule::UntilEmpty(rule) => write!(f, "{}!", rule),
        }
    }
}

/// A table of named rules, built up before being handed to a processor.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules<M> {
    rules: BTreeMap<String, Rule<M>>,
}

impl<M> Rules<M> {
    pub fn new() -> Self {
        Rules {
            rules: BTreeMap::new(),
        }
    }

    /// Add a rule. Names must be unique.
    pub fn insert(&mut self, name: impl Into<String>, rule: Rule<M>) -> Result<(), Error> {
        let name = name.into();
        if self.rules.contains_key(&name) {
            return Err(Error::new(format!("duplicate rule '{}'", name)));
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<M> Default for Rules<M> {
    fn default() -> Self {
        Rules::new()
    }
}

/// Collects rules, later entries replacing earlier ones with the same name.
impl<M, S: Into<String>> FromIterator<(S, Rule<M>)> for Rules<M> {
    fn from_iter<I: IntoIterator<Item = (S, Rule<M>)>>(iter: I) -> Self {
        Rules {
            rules: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A set of named rules evaluated within some domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Processor<D: Domain> {
    domain: D,
    rules: BTreeMap<String, Rule<D::Matcher>>,
    root: String,
}

impl<D: Domain> Processor<D> {
    pub fn new(domain: D, rules: Rules<D::Matcher>, root: impl Into<String>) -> Self {
        Processor {
            domain,
            rules: rules.rules,
            root: root.into(),
        }
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn rule(&self, name: &str) -> Option<&Rule<D::Matcher>> {
        self.rules.get(name)
    }

    /// Apply a named rule.
    ///
    /// Failures are wrapped with the rule name, keeping the innermost location
    /// when there is one.
    pub fn apply_rule(&self, rule_name: &str, context: &Context<'_, D>) -> Result<D::Output, Error> {
        let rule = self
            .rules
            .get(rule_name)
            .ok_or_else(|| context.error(format!("unknown rule '{}'", rule_name)))?;
        trace!("applying rule '{}' at {:?}", rule_name, context.location());
        match rule.apply(context) {
            Ok(output) => Ok(self.domain.with_rule_name(output, rule_name)),
            Err(error) => {
                trace!("rule '{}' failed: {}", rule_name, error);
                let location = error.location().or_else(|| context.location());
                Err(Error::with_location(
                    format!("error while applying rule '{}': {}", rule_name, error.msg()),
                    location,
                ))
            }
        }
    }

    /// Apply the root rule to `input`.
    pub fn process(&self, input: D::Input) -> Result<D::Output, Error> {
        self.apply_rule(&self.root, &Context::new(self, input))
    }

    /// Like [`Processor::process`], also returning every error swallowed along
    /// the way.
    pub fn process_logged(&self, input: D::Input) -> (Result<D::Output, Error>, Vec<Error>) {
        let context = Context::new(self, input);
        let result = self.apply_rule(&self.root, &context);
        (result, context.swallowed())
    }
}
