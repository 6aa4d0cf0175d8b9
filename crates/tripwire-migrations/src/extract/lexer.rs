//! Tokenizer for trigger declarations
//!
//! Tokens are produced on demand from a cursor into the source text, so the
//! parser can stop at the end of a declaration without looking at whatever
//! free-form text follows it.

use tripwire_triggers::normalize_sql;

use super::{ExtractError, ExtractResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    Eof,
}

impl Token {
    /// Human readable form for error messages
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("'{name}'"),
            Token::Str(_) => "a string".to_string(),
            Token::Int(value) => format!("'{value}'"),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::LBracket => "'['".to_string(),
            Token::RBracket => "']'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Dot => "'.'".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    /// Starts lexing at byte offset `pos`, which lies on `line`
    pub(crate) fn new(src: &'a str, pos: usize, line: usize) -> Self {
        Self { src, pos, line }
    }

    /// Byte offset just past the last consumed token
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn line(&self) -> usize {
        self.line
    }

    /// Returns the next token without consuming it
    pub(crate) fn peek(&self) -> ExtractResult<Token> {
        let mut lookahead = *self;
        lookahead.next_token()
    }

    /// Returns true if the next token is `expected`; lexing errors count as no
    pub(crate) fn peek_is(&self, expected: &Token) -> bool {
        self.peek().is_ok_and(|token| &token == expected)
    }

    pub(crate) fn next_token(&mut self) -> ExtractResult<Token> {
        self.skip_trivia();
        let Some(c) = self.peek_char() else {
            return Ok(Token::Eof);
        };

        let punctuation = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ',' => Some(Token::Comma),
            ':' => Some(Token::Colon),
            '.' => Some(Token::Dot),
            _ => None,
        };
        if let Some(token) = punctuation {
            self.bump();
            return Ok(token);
        }

        match c {
            '"' => self.string(),
            '-' => self.integer(),
            c if c.is_ascii_digit() => self.integer(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(Token::Ident(self.ident())),
            c => Err(ExtractError::syntax(
                self.line,
                format!("unexpected character '{c}'"),
            )),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Skips whitespace and `--` comments
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.rest().starts_with("--") => {
                    while self.peek_char().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn integer(&mut self) -> ExtractResult<Token> {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.bump();
        }
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        text.parse()
            .map(Token::Int)
            .map_err(|_| ExtractError::syntax(self.line, format!("invalid integer '{text}'")))
    }

    fn string(&mut self) -> ExtractResult<Token> {
        let line = self.line;
        let unterminated = || ExtractError::syntax(line, "unterminated string");

        if self.rest().starts_with("\"\"\"") {
            self.pos += 3;
            let end = self.rest().find("\"\"\"").ok_or_else(unterminated)?;
            let raw = &self.rest()[..end];
            self.line += raw.matches('\n').count();
            self.pos += end + 3;
            return Ok(Token::Str(normalize_sql(raw)));
        }

        self.bump();
        let mut value = String::new();
        loop {
            match self.bump().ok_or_else(unterminated)? {
                '"' => return Ok(Token::Str(value)),
                '\\' => match self.bump().ok_or_else(unterminated)? {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '"' => value.push('"'),
                    '\\' => value.push('\\'),
                    other => {
                        return Err(ExtractError::syntax(
                            self.line,
                            format!("unknown escape '\\{other}'"),
                        ));
                    }
                },
                c => value.push(c),
            }
        }
    }
}
