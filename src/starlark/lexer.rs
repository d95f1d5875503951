use super::{Comment, ParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eq,
    Percent,
    Eof,
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    /// Whether a token was already produced on the current line; a `#`
    /// comment after one is a trailing comment
    token_on_line: bool,
    tokens: Vec<SpannedToken>,
    comments: Vec<Comment>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            pos: 0,
            line: 1,
            token_on_line: false,
            tokens: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<(Vec<SpannedToken>, Vec<Comment>), ParseError> {
        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.src.len() {
                break;
            }
            let line = self.line;
            let token = self.scan_token()?;
            self.tokens.push(SpannedToken { token, line });
            self.token_on_line = true;
        }
        let line = self.line;
        self.tokens.push(SpannedToken {
            token: Token::Eof,
            line,
        });
        Ok((self.tokens, self.comments))
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.token_on_line = false;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'#' => self.scan_comment(),
                _ => break,
            }
        }
    }

    fn scan_comment(&mut self) {
        let line = self.line;
        let trailing = self.token_on_line;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos])
            .trim_end()
            .to_string();
        self.comments.push(Comment {
            text,
            line,
            trailing,
        });
    }

    fn scan_token(&mut self) -> Result<Token, ParseError> {
        let c = self.src[self.pos];
        match c {
            b'(' => {
                self.pos += 1;
                Ok(Token::LParen)
            }
            b')' => {
                self.pos += 1;
                Ok(Token::RParen)
            }
            b'[' => {
                self.pos += 1;
                Ok(Token::LBracket)
            }
            b']' => {
                self.pos += 1;
                Ok(Token::RBracket)
            }
            b',' => {
                self.pos += 1;
                Ok(Token::Comma)
            }
            b'=' => {
                self.pos += 1;
                Ok(Token::Eq)
            }
            b'%' => {
                self.pos += 1;
                Ok(Token::Percent)
            }
            b'"' | b'\'' => self.scan_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() || c == b'_' => Ok(self.scan_ident()),
            other => Err(ParseError {
                line: self.line,
                message: format!("unexpected character '{}'", other as char),
            }),
        }
    }

    fn scan_ident(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Token::Ident(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
    }

    fn scan_number(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]);
        text.parse::<i64>().map(Token::Int).map_err(|_| ParseError {
            line: self.line,
            message: format!("invalid integer literal '{text}'"),
        })
    }

    fn scan_string(&mut self) -> Result<Token, ParseError> {
        let quote = self.src[self.pos];
        if quote == b'"' && self.src[self.pos..].starts_with(b"\"\"\"") {
            return self.scan_triple_string();
        }
        let start_line = self.line;
        self.pos += 1;
        let mut value = Vec::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(unterminated(start_line));
            };
            match c {
                b'\n' => return Err(unterminated(start_line)),
                c if c == quote => {
                    self.pos += 1;
                    break;
                }
                b'\\' => {
                    self.pos += 1;
                    self.scan_escape(&mut value)?;
                }
                c => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(Token::Str(String::from_utf8_lossy(&value).into_owned()))
    }

    fn scan_triple_string(&mut self) -> Result<Token, ParseError> {
        let start_line = self.line;
        self.pos += 3;
        let mut value = Vec::new();
        loop {
            if self.pos >= self.src.len() {
                return Err(unterminated(start_line));
            }
            if self.src[self.pos..].starts_with(b"\"\"\"") {
                self.pos += 3;
                break;
            }
            let c = self.src[self.pos];
            if c == b'\n' {
                self.line += 1;
            }
            if c == b'\\' {
                self.pos += 1;
                self.scan_escape(&mut value)?;
            } else {
                value.push(c);
                self.pos += 1;
            }
        }
        Ok(Token::Str(String::from_utf8_lossy(&value).into_owned()))
    }

    fn scan_escape(&mut self, value: &mut Vec<u8>) -> Result<(), ParseError> {
        let Some(c) = self.peek() else {
            return Err(unterminated(self.line));
        };
        self.pos += 1;
        match c {
            b'n' => value.push(b'\n'),
            b't' => value.push(b'\t'),
            b'r' => value.push(b'\r'),
            b'\\' => value.push(b'\\'),
            b'"' => value.push(b'"'),
            b'\'' => value.push(b'\''),
            // escaped newline is a continuation
            b'\n' => self.line += 1,
            other => {
                // keep unrecognized escapes verbatim
                value.push(b'\\');
                value.push(other);
            }
        }
        Ok(())
    }
}

fn unterminated(line: usize) -> ParseError {
    ParseError {
        line,
        message: "unterminated string literal".to_string(),
    }
}
