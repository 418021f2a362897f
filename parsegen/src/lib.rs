//! Rule combinators for building regexes, lexers and parsers.
//!
//! Every stage is a [`Processor`] evaluating [`Rule`]s within some
//! [`Domain`]: chars to strings for [`Regex`], chars to tokens for [`Lexer`]
//! and tokens to trees for [`Parser`]. [`Syntax`] then reduces trees into
//! caller defined values.

mod error;
mod location;
mod processor;

pub mod lexer;
pub mod parser;
pub mod regex;
pub mod syntax;

pub use error::Error;
pub use lexer::{Lexer, Token};
pub use location::{Location, Position};
pub use parser::{Node, Parser};
pub use processor::{Context, Domain, Processor, Rule, Rules};
pub use regex::Regex;
pub use syntax::Syntax;
