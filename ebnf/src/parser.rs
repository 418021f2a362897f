use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{alpha1, alphanumeric1, multispace0},
    combinator::{all_consuming, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::{Grammar, Identifier, Lhs, Production, Rhs, Statement, Terminal, TokenRule};

/// Surround a parser with optional whitespace.
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

pub fn terminal(input: &str) -> IResult<&str, Terminal> {
    let (rem, matched) = alt((
        delimited(tag("\""), take_until("\""), tag("\"")),
        delimited(tag("\'"), take_until("\'"), tag("\'")),
    ))(input)?;
    Ok((rem, Terminal(matched.to_owned())))
}

pub fn identifier(input: &str) -> IResult<&str, Identifier> {
    let (rem, matched) = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)?;
    Ok((rem, Identifier(matched.to_owned())))
}

/// Alternation binds loosest, then concatenation.
pub fn rhs(input: &str) -> IResult<&str, Rhs> {
    let (rem, (first, rest)) = pair(rhs_concatenation, opt(preceded(tag("|"), rhs)))(input)?;
    let rhs = match rest {
        Some(rest) => Rhs::Alternation(Box::new(first), Box::new(rest)),
        None => first,
    };
    Ok((rem, rhs))
}

pub fn statement(input: &str) -> IResult<&str, Statement> {
    let (rem, (name, op)) = pair(ws(identifier), alt((tag("~="), tag("="), tag("->"))))(input)?;
    if op == "->" {
        let (rem, rhs) = terminated(rhs, tag(";"))(rem)?;
        return Ok((
            rem,
            Statement::Production(Production {
                lhs: Lhs(name),
                rhs,
            }),
        ));
    }
    let (rem, pattern) = terminated(ws(terminal), tag(";"))(rem)?;
    Ok((
        rem,
        Statement::Token(TokenRule {
            name,
            pattern,
            silent: op == "~=",
        }),
    ))
}

pub fn grammar(input: &str) -> IResult<&str, Grammar> {
    let (rem, rules) = all_consuming(terminated(many0(statement), multispace0))(input)?;
    Ok((rem, Grammar { rules }))
}

fn rhs_concatenation(input: &str) -> IResult<&str, Rhs> {
    let (rem, (first, rest)) = pair(rhs_term, opt(preceded(tag(","), rhs_concatenation)))(input)?;
    let rhs = match rest {
        Some(rest) => Rhs::Concatenation(Box::new(first), Box::new(rest)),
        None => first,
    };
    Ok((rem, rhs))
}

fn rhs_term(input: &str) -> IResult<&str, Rhs> {
    ws(alt((
        rhs_group,
        rhs_repetition,
        rhs_optional,
        rhs_terminal,
        rhs_identifier,
    )))(input)
}

fn rhs_identifier(input: &str) -> IResult<&str, Rhs> {
    let (rem, matched) = identifier(input)?;
    Ok((rem, Rhs::Identifier(matched)))
}

fn rhs_terminal(input: &str) -> IResult<&str, Rhs> {
    let (rem, matched) = terminal(input)?;
    Ok((rem, Rhs::Terminal(matched)))
}

/// Parentheses only affect nesting and leave no node behind.
fn rhs_group(input: &str) -> IResult<&str, Rhs> {
    delimited(tag("("), rhs, tag(")"))(input)
}

fn rhs_repetition(input: &str) -> IResult<&str, Rhs> {
    let (rem, (inner, once)) = pair(delimited(tag("{"), rhs, tag("}")), opt(tag("+")))(input)?;
    let rhs = match once {
        Some(_) => Rhs::RepeatOnce(Box::new(inner)),
        None => Rhs::Repeat(Box::new(inner)),
    };
    Ok((rem, rhs))
}

fn rhs_optional(input: &str) -> IResult<&str, Rhs> {
    let (rem, inner) = delimited(tag("["), rhs, tag("]"))(input)?;
    Ok((rem, Rhs::Optional(Box::new(inner))))
}
