//! Recursive descent parser for a single trigger declaration
//!
//! ```text
//! declaration := head chain* block?
//! head        := ("trigger" | "create_trigger") args?
//!              | "drop_trigger" args
//!              | "execute" args
//! chain       := "." IDENT args
//! block       := "{" (STRING | IDENT ":" STRING) ("," ...)* "}"
//! args        := "(" (value | IDENT ":" value) ("," ...)* ")"
//! value       := STRING | INT | IDENT | "[" value ("," value)* "]"
//! ```

use tripwire_triggers::{OptionValue, SpecKind, TriggerSpec};

use super::lexer::{Lexer, Token};
use super::{ExtractError, ExtractResult};

/// A parsed declaration and where it ended
#[derive(Debug)]
pub(crate) struct Declaration {
    pub spec: TriggerSpec,
    /// Line the declaration starts on
    pub line: usize,
    /// Byte offset just past the declaration
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Ident(String),
    List(Vec<Value>),
}

impl Value {
    fn into_text(self) -> Option<String> {
        match self {
            Value::Str(text) | Value::Ident(text) => Some(text),
            _ => None,
        }
    }

    fn into_option(self) -> OptionValue {
        match self {
            Value::Str(text) | Value::Ident(text) => OptionValue::Str(text),
            Value::Int(value) => OptionValue::Int(value),
            Value::Bool(value) => OptionValue::Bool(value),
            Value::List(items) => {
                OptionValue::List(items.into_iter().map(Value::into_option).collect())
            }
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    line: usize,
}

impl<'a> Parser<'a> {
    /// Parser positioned at byte offset `start` of `src`
    pub(crate) fn new(src: &'a str, start: usize) -> Self {
        let line = src[..start].matches('\n').count() + 1;
        Self {
            lexer: Lexer::new(src, start, line),
            line,
        }
    }

    pub(crate) fn parse_declaration(mut self) -> ExtractResult<Declaration> {
        let head = self.expect_ident()?;
        let mut spec = match head.as_str() {
            "trigger" | "create_trigger" => {
                let mut spec = TriggerSpec::create();
                if self.lexer.peek_is(&Token::LParen) {
                    let args = self.args()?;
                    self.apply_create_args(&mut spec, args)?;
                }
                spec
            }
            "drop_trigger" => {
                let args = self.args()?;
                self.drop_spec(args)?
            }
            "execute" => {
                let args = self.args()?;
                let spec = self.manual_spec(args)?;
                return Ok(self.finish(spec));
            }
            other => {
                return Err(self.error(format!("unknown declaration '{other}'")));
            }
        };

        while self.lexer.peek_is(&Token::Dot) {
            self.lexer.next_token()?;
            let method = self.expect_ident()?;
            let args = self.args()?;
            self.apply_method(&mut spec, &method, args)?;
        }

        if self.lexer.peek_is(&Token::LBrace) {
            self.block(&mut spec)?;
        }

        Ok(self.finish(spec))
    }

    fn finish(&self, spec: TriggerSpec) -> Declaration {
        Declaration {
            spec,
            line: self.line,
            end: self.lexer.pos(),
        }
    }

    fn error(&self, message: impl Into<String>) -> ExtractError {
        ExtractError::syntax(self.lexer.line(), message)
    }

    fn expect(&mut self, expected: Token) -> ExtractResult<()> {
        let token = self.lexer.next_token()?;
        if token == expected {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                expected.describe(),
                token.describe()
            )))
        }
    }

    fn expect_ident(&mut self) -> ExtractResult<String> {
        match self.lexer.next_token()? {
            Token::Ident(name) => Ok(name),
            other => Err(self.error(format!("expected a name, found {}", other.describe()))),
        }
    }

    fn args(&mut self) -> ExtractResult<Args> {
        self.expect(Token::LParen)?;
        let mut args = Args::default();

        loop {
            if self.lexer.peek_is(&Token::RParen) {
                self.lexer.next_token()?;
                break;
            }

            let token = self.lexer.next_token()?;
            match token {
                Token::Ident(name) if self.lexer.peek_is(&Token::Colon) => {
                    self.lexer.next_token()?;
                    let first = self.lexer.next_token()?;
                    let value = self.value(first)?;
                    args.keyword.push((name, value));
                }
                other => {
                    let value = self.value(other)?;
                    if !args.keyword.is_empty() {
                        return Err(self.error("positional argument after keyword argument"));
                    }
                    args.positional.push(value);
                }
            }

            match self.lexer.next_token()? {
                Token::Comma => continue,
                Token::RParen => break,
                other => {
                    return Err(self.error(format!("expected ',' or ')', found {}", other.describe())));
                }
            }
        }

        Ok(args)
    }

    fn value(&mut self, token: Token) -> ExtractResult<Value> {
        match token {
            Token::Str(text) => Ok(Value::Str(text)),
            Token::Int(value) => Ok(Value::Int(value)),
            Token::Ident(word) => Ok(match word.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Ident(word),
            }),
            Token::LBracket => {
                let mut items = Vec::new();
                loop {
                    match self.lexer.next_token()? {
                        Token::RBracket => break,
                        first => items.push(self.value(first)?),
                    }
                    match self.lexer.next_token()? {
                        Token::Comma => continue,
                        Token::RBracket => break,
                        other => {
                            return Err(self.error(format!(
                                "expected ',' or ']', found {}",
                                other.describe()
                            )));
                        }
                    }
                }
                Ok(Value::List(items))
            }
            other => Err(self.error(format!("expected a value, found {}", other.describe()))),
        }
    }

    fn text(&self, value: Value, what: &str) -> ExtractResult<String> {
        value
            .into_text()
            .ok_or_else(|| self.error(format!("{what} must be a string")))
    }

    fn apply_create_args(&self, spec: &mut TriggerSpec, args: Args) -> ExtractResult<()> {
        let mut positional = args.positional.into_iter();
        if let Some(name) = positional.next() {
            spec.name = Some(self.text(name, "trigger name")?);
        }
        if positional.next().is_some() {
            return Err(self.error("trigger takes at most one positional argument"));
        }
        for (key, value) in args.keyword {
            spec.options.insert(key, value.into_option());
        }
        Ok(())
    }

    fn drop_spec(&self, args: Args) -> ExtractResult<TriggerSpec> {
        let mut positional = args.positional.into_iter();
        let name = positional
            .next()
            .ok_or_else(|| self.error("drop_trigger requires a trigger name"))?;
        let mut spec = TriggerSpec::drop_trigger(self.text(name, "trigger name")?);
        if let Some(table) = positional.next() {
            spec.table = Some(self.text(table, "table name")?);
        }
        if positional.next().is_some() {
            return Err(self.error("drop_trigger takes at most two positional arguments"));
        }
        for (key, value) in args.keyword {
            spec.options.insert(key, value.into_option());
        }
        Ok(spec)
    }

    fn manual_spec(&self, args: Args) -> ExtractResult<TriggerSpec> {
        match (args.positional.as_slice(), args.keyword.is_empty()) {
            ([Value::Str(sql)], true) => Ok(TriggerSpec::manual(sql.clone())),
            _ => Err(self.error("execute takes a single SQL string")),
        }
    }

    fn apply_method(&self, spec: &mut TriggerSpec, method: &str, args: Args) -> ExtractResult<()> {
        if !args.keyword.is_empty() {
            return Err(self.error(format!("{method} does not take keyword arguments")));
        }
        let words = args
            .positional
            .into_iter()
            .map(|value| self.text(value, &format!("argument of {method}")))
            .collect::<ExtractResult<Vec<_>>>()?;

        let single = |words: Vec<String>| -> ExtractResult<String> {
            match <[String; 1]>::try_from(words) {
                Ok([word]) => Ok(word),
                Err(_) => Err(self.error(format!("{method} takes exactly one argument"))),
            }
        };

        match method {
            "on" => spec.table = Some(single(words)?),
            "before" | "after" | "instead_of" => {
                spec.timing = Some(method.to_string());
                spec.events = words;
            }
            "for_each" => spec.scope = Some(single(words)?),
            "name" => spec.name = Some(single(words)?),
            "where" => spec.when = Some(single(words)?),
            "of" => spec.update_columns = words,
            other => return Err(self.error(format!("unknown method '{other}'"))),
        }
        Ok(())
    }

    fn block(&mut self, spec: &mut TriggerSpec) -> ExtractResult<()> {
        if spec.kind != SpecKind::Create {
            return Err(self.error("only trigger declarations take a body"));
        }
        self.expect(Token::LBrace)?;

        loop {
            match self.lexer.next_token()? {
                Token::RBrace => break,
                Token::Str(body) => spec.body = Some(body),
                Token::Ident(dialect) => {
                    self.expect(Token::Colon)?;
                    match self.lexer.next_token()? {
                        Token::Str(body) => {
                            spec.body_overrides.insert(dialect, body);
                        }
                        other => {
                            return Err(self.error(format!(
                                "expected a body string, found {}",
                                other.describe()
                            )));
                        }
                    }
                }
                other => {
                    return Err(self.error(format!(
                        "expected a body string or '}}', found {}",
                        other.describe()
                    )));
                }
            }
            if self.lexer.peek_is(&Token::Comma) {
                self.lexer.next_token()?;
            }
        }
        Ok(())
    }
}
