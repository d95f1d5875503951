//! Parser for the WORKSPACE dialect: top-level assignments and calls with
//! keyword arguments, string/integer/list literals, `%` interpolation, and
//! `#` comments. Anything outside that subset is rejected outright rather
//! than half-understood, since a misread file means a corrupted rewrite.

mod lexer;
mod parser;

use thiserror::Error;

#[derive(Error, Debug)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// A comment, text including the leading `#`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub line: usize,
    /// True when the comment follows other tokens on its line
    pub trailing: bool,
}

/// Comments attached to one top-level statement
#[derive(Debug, Clone, Default)]
pub struct Comments {
    /// Standalone comments on the lines directly above the statement
    pub leading: Vec<Comment>,
    /// Comments anywhere within the statement's line span
    pub trailing: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct File {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `name = expr`
    Assign {
        name: String,
        value: Expr,
        comments: Comments,
    },
    /// A bare expression statement (calls, docstrings)
    Expr { expr: Expr, comments: Comments },
}

#[derive(Debug, Clone)]
pub enum Expr {
    Str {
        value: String,
        line: usize,
    },
    Int {
        value: i64,
        line: usize,
    },
    Ident {
        name: String,
        line: usize,
    },
    List {
        items: Vec<Expr>,
        line: usize,
    },
    /// `lhs % rhs` string interpolation
    Percent {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: usize,
    },
    Call(Call),
}

#[derive(Debug, Clone)]
pub struct Call {
    pub function: String,
    pub args: Vec<Arg>,
    pub line: usize,
    /// Line of the closing parenthesis
    pub end_line: usize,
}

#[derive(Debug, Clone)]
pub enum Arg {
    Positional(Expr),
    Keyword { name: String, value: Expr },
}

/// Parse a complete file. Lines are 1-based.
pub fn parse(source: &str) -> Result<File, ParseError> {
    let (tokens, comments) = lexer::Lexer::new(source).tokenize()?;
    parser::Parser::new(tokens, comments).parse_file()
}
