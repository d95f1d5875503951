use super::lexer::{SpannedToken, Token};
use super::{Arg, Call, Comment, Comments, Expr, File, ParseError, Stmt};
use std::mem;

pub struct Parser {
    tokens: Vec<SpannedToken>,
    comments: Vec<Comment>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>, comments: Vec<Comment>) -> Self {
        Self {
            tokens,
            comments,
            pos: 0,
        }
    }

    pub fn parse_file(mut self) -> Result<File, ParseError> {
        let mut statements = Vec::new();
        let mut spans = Vec::new();
        while !self.at(&Token::Eof) {
            let start = self.peek_line();
            let stmt = self.parse_statement()?;
            statements.push(stmt);
            spans.push((start, self.prev_line()));
        }
        self.attach_comments(&mut statements, &spans);
        Ok(File { statements })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn peek_line(&self) -> usize {
        self.tokens[self.pos].line
    }

    fn peek_second(&self) -> &Token {
        self.tokens
            .get(self.pos + 1)
            .map_or(&Token::Eof, |t| &t.token)
    }

    /// Line of the last consumed token
    fn prev_line(&self) -> usize {
        if self.pos == 0 {
            1
        } else {
            self.tokens[self.pos - 1].line
        }
    }

    fn advance(&mut self) -> SpannedToken {
        let spanned = self.tokens[self.pos].clone();
        if spanned.token != Token::Eof {
            self.pos += 1;
        }
        spanned
    }

    fn at(&self, kind: &Token) -> bool {
        mem::discriminant(self.peek()) == mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &Token) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &Token, what: &str) -> Result<SpannedToken, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {what}, found {}", describe(self.peek()))))
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            line: self.peek_line(),
            message,
        }
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        if matches!(self.peek(), Token::Ident(_)) && matches!(self.peek_second(), Token::Eq) {
            let name = self.expect_ident()?;
            self.pos += 1; // '='
            let value = self.parse_expr()?;
            return Ok(Stmt::Assign {
                name,
                value,
                comments: Comments::default(),
            });
        }
        let expr = self.parse_expr()?;
        Ok(Stmt::Expr {
            expr,
            comments: Comments::default(),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        // `%` chains are left-associative
        while self.at(&Token::Percent) {
            let line = self.peek_line();
            self.pos += 1;
            let rhs = self.parse_primary()?;
            expr = Expr::Percent {
                lhs: Box::new(expr),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let SpannedToken { token, line } = self.advance();
        match token {
            Token::Str(value) => Ok(Expr::Str { value, line }),
            Token::Int(value) => Ok(Expr::Int { value, line }),
            Token::Ident(name) => {
                if self.at(&Token::LParen) {
                    self.parse_call(name, line)
                } else {
                    Ok(Expr::Ident { name, line })
                }
            }
            Token::LBracket => self.parse_list(line),
            other => Err(ParseError {
                line,
                message: format!("unexpected {}", describe(&other)),
            }),
        }
    }

    fn parse_list(&mut self, line: usize) -> Result<Expr, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.at(&Token::RBracket) {
                break;
            }
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBracket, "']'")?;
        Ok(Expr::List { items, line })
    }

    fn parse_call(&mut self, function: String, line: usize) -> Result<Expr, ParseError> {
        self.pos += 1; // '('
        let mut args = Vec::new();
        loop {
            if self.at(&Token::RParen) {
                break;
            }
            if matches!(self.peek(), Token::Ident(_)) && matches!(self.peek_second(), Token::Eq) {
                let name = self.expect_ident()?;
                self.pos += 1; // '='
                let value = self.parse_expr()?;
                args.push(Arg::Keyword { name, value });
            } else {
                args.push(Arg::Positional(self.parse_expr()?));
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        let close = self.expect(&Token::RParen, "')'")?;
        Ok(Expr::Call(Call {
            function,
            args,
            line,
            end_line: close.line,
        }))
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let SpannedToken { token, line } = self.advance();
        match token {
            Token::Ident(name) => Ok(name),
            other => Err(ParseError {
                line,
                message: format!("expected identifier, found {}", describe(&other)),
            }),
        }
    }

    /// Attach comments to statements by line: standalone comments between
    /// two statements lead the later one; anything within a statement's
    /// span trails it.
    fn attach_comments(&self, statements: &mut [Stmt], spans: &[(usize, usize)]) {
        let mut prev_end = 0;
        for (stmt, &(start, end)) in statements.iter_mut().zip(spans) {
            let leading = self
                .comments
                .iter()
                .filter(|c| !c.trailing && c.line > prev_end && c.line < start)
                .cloned()
                .collect();
            let trailing = self
                .comments
                .iter()
                .filter(|c| c.line >= start && c.line <= end)
                .cloned()
                .collect();
            let (Stmt::Assign { comments, .. } | Stmt::Expr { comments, .. }) = stmt;
            comments.leading = leading;
            comments.trailing = trailing;
            prev_end = end;
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("identifier '{name}'"),
        Token::Str(_) => "string literal".to_string(),
        Token::Int(_) => "integer literal".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::LBracket => "'['".to_string(),
        Token::RBracket => "']'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Eq => "'='".to_string(),
        Token::Percent => "'%'".to_string(),
        Token::Eof => "end of file".to_string(),
    }
}
