//! Tokenizer and parser for the merge-field syntax.

use serde_json::{Number, Value};

use crate::errors::TemplateError;
use crate::template::helpers::HelperRegistry;

type ParseResult<T> = std::result::Result<T, TemplateError>;

/// compiled template tree
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Output { expr: Expr, escape: bool },
    If { cond: Expr, negate: bool, then: Vec<Node>, otherwise: Vec<Node> },
    Each { list: Expr, body: Vec<Node>, otherwise: Vec<Node> },
    With { scope: Expr, body: Vec<Node>, otherwise: Vec<Node> },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Path(Path),
    /// `@index`, `@first`, `@last`, `@key`
    Data(String),
    Call { helper: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Path {
    /// number of `../` hops
    pub parents: usize,
    /// anchored at `@root`
    pub root: bool,
    pub segments: Vec<String>,
}

// ---- template level tokens ----

#[derive(Debug, Clone, PartialEq)]
enum Tag {
    Output { content: String, escape: bool },
    Open { name: String, args: String },
    Close { name: String },
    Else { rest: String },
    Comment,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Tag { tag: Tag, offset: usize, trim_before: bool, trim_after: bool },
}

fn tokenize(source: &str) -> ParseResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut consumed = 0;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        let offset = consumed + start;
        let after_open = &rest[start..];

        let (inner, tag_len, raw) = if after_open.starts_with("{{{") {
            let end = after_open[3..]
                .find("}}}")
                .ok_or(TemplateError::UnterminatedTag { offset })?;
            (&after_open[3..3 + end], end + 6, true)
        } else if after_open.starts_with("{{!--") || after_open.starts_with("{{~!--") {
            let (end, close_len) = match (after_open.find("--}}"), after_open.find("--~}}")) {
                (Some(plain), Some(trimmed)) if trimmed < plain => (trimmed, 5),
                (Some(plain), _) => (plain, 4),
                (None, Some(trimmed)) => (trimmed, 5),
                (None, None) => return Err(TemplateError::UnterminatedTag { offset }),
            };
            (&after_open[2..end + close_len - 2], end + close_len, false)
        } else {
            let end = after_open[2..]
                .find("}}")
                .ok_or(TemplateError::UnterminatedTag { offset })?;
            (&after_open[2..2 + end], end + 4, false)
        };

        let trim_before = inner.starts_with('~');
        let trim_after = inner.ends_with('~');
        let inner = inner.trim_start_matches('~').trim_end_matches('~').trim();

        let tag = classify(inner, raw, offset)?;
        tokens.push(Token::Tag { tag, offset, trim_before, trim_after });

        consumed = offset + tag_len;
        rest = &after_open[tag_len..];
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }

    apply_whitespace_control(&mut tokens);
    Ok(tokens)
}

fn classify(inner: &str, raw: bool, offset: usize) -> ParseResult<Tag> {
    if raw {
        if inner.is_empty() {
            return Err(TemplateError::EmptyTag { offset });
        }
        return Ok(Tag::Output { content: inner.to_string(), escape: false });
    }
    if inner.starts_with('!') {
        return Ok(Tag::Comment);
    }
    if let Some(block) = inner.strip_prefix('#') {
        let block = block.trim();
        let (name, args) = split_first_word(block);
        if name.is_empty() {
            return Err(TemplateError::EmptyTag { offset });
        }
        return Ok(Tag::Open { name: name.to_string(), args: args.to_string() });
    }
    if let Some(name) = inner.strip_prefix('/') {
        return Ok(Tag::Close { name: name.trim().to_string() });
    }
    if inner == "else" || inner == "^" {
        return Ok(Tag::Else { rest: String::new() });
    }
    if let Some(rest) = inner.strip_prefix("else ") {
        return Ok(Tag::Else { rest: rest.trim().to_string() });
    }
    if inner.starts_with('>') {
        return Err(TemplateError::InvalidExpression {
            expression: inner.to_string(),
            message: "partials are not supported".to_string(),
        });
    }
    if let Some(content) = inner.strip_prefix('&') {
        return Ok(Tag::Output { content: content.trim().to_string(), escape: false });
    }
    if inner.is_empty() {
        return Err(TemplateError::EmptyTag { offset });
    }
    Ok(Tag::Output { content: inner.to_string(), escape: true })
}

fn split_first_word(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim()),
        None => (s, ""),
    }
}

/// `{{~` trims whitespace before the tag, `~}}` after it
fn apply_whitespace_control(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        let (trim_before, trim_after) = match &tokens[i] {
            Token::Tag { trim_before, trim_after, .. } => (*trim_before, *trim_after),
            Token::Text(_) => continue,
        };
        if trim_before && i > 0 {
            if let Token::Text(text) = &mut tokens[i - 1] {
                *text = text.trim_end().to_string();
            }
        }
        if trim_after {
            if let Some(Token::Text(text)) = tokens.get_mut(i + 1) {
                *text = text.trim_start().to_string();
            }
        }
    }
}

// ---- block structure ----

enum Stop {
    Eof,
    Else { rest: String, offset: usize },
    Close { name: String },
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    helpers: &'a HelperRegistry,
}

pub(crate) fn parse(source: &str, helpers: &HelperRegistry) -> ParseResult<Vec<Node>> {
    let mut parser = Parser { tokens: tokenize(source)?, pos: 0, helpers };
    let (nodes, stop) = parser.parse_body()?;
    match stop {
        Stop::Eof => Ok(nodes),
        Stop::Else { offset, .. } => Err(TemplateError::StrayElse { offset }),
        Stop::Close { name } => Err(TemplateError::MismatchedBlock { expected: None, found: name }),
    }
}

impl<'a> Parser<'a> {
    fn parse_body(&mut self) -> ParseResult<(Vec<Node>, Stop)> {
        let mut nodes = Vec::new();
        while self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            match token {
                Token::Text(text) => {
                    if !text.is_empty() {
                        nodes.push(Node::Text(text));
                    }
                }
                Token::Tag { tag, offset, .. } => match tag {
                    Tag::Comment => {}
                    Tag::Output { content, escape } => {
                        let expr = self.parse_output(&content)?;
                        nodes.push(Node::Output { expr, escape });
                    }
                    Tag::Open { name, args } => {
                        let node = self.parse_block(&name, &args, &name)?;
                        nodes.push(node);
                    }
                    Tag::Close { name } => return Ok((nodes, Stop::Close { name })),
                    Tag::Else { rest } => return Ok((nodes, Stop::Else { rest, offset })),
                },
            }
        }
        Ok((nodes, Stop::Eof))
    }

    /// parse a block body up to `{{/close_name}}`
    fn parse_block(&mut self, name: &str, args: &str, close_name: &str) -> ParseResult<Node> {
        let kind = match name {
            "if" | "unless" | "each" | "with" => name,
            other => return Err(TemplateError::UnknownBlock { name: other.to_string() }),
        };
        if args.is_empty() {
            return Err(TemplateError::InvalidExpression {
                expression: format!("#{}", name),
                message: "block needs an argument".to_string(),
            });
        }
        let expr = self.parse_expr(args)?;

        let (body, stop) = self.parse_body()?;
        let otherwise = match stop {
            Stop::Close { name: found } => {
                self.check_close(close_name, found)?;
                Vec::new()
            }
            Stop::Else { rest, .. } if rest.is_empty() => {
                let (otherwise, stop) = self.parse_body()?;
                match stop {
                    Stop::Close { name: found } => self.check_close(close_name, found)?,
                    Stop::Else { offset, .. } => return Err(TemplateError::StrayElse { offset }),
                    Stop::Eof => {
                        return Err(TemplateError::UnclosedBlock { name: close_name.to_string() })
                    }
                }
                otherwise
            }
            // `{{else if cond}}` chains a nested block closed by the outer tag
            Stop::Else { rest, offset } => {
                let (chained, chained_args) = split_first_word(&rest);
                if !matches!(kind, "if" | "unless") || !matches!(chained, "if" | "unless") {
                    return Err(TemplateError::StrayElse { offset });
                }
                vec![self.parse_block(chained, chained_args, close_name)?]
            }
            Stop::Eof => return Err(TemplateError::UnclosedBlock { name: close_name.to_string() }),
        };

        Ok(match kind {
            "if" => Node::If { cond: expr, negate: false, then: body, otherwise },
            "unless" => Node::If { cond: expr, negate: true, then: body, otherwise },
            "each" => Node::Each { list: expr, body, otherwise },
            _ => Node::With { scope: expr, body, otherwise },
        })
    }

    fn check_close(&self, expected: &str, found: String) -> ParseResult<()> {
        if found == expected {
            Ok(())
        } else {
            Err(TemplateError::MismatchedBlock { expected: Some(expected.to_string()), found })
        }
    }

    /// a bare registered helper name is a zero-argument call
    fn parse_output(&self, content: &str) -> ParseResult<Expr> {
        let expr = self.parse_expr(content)?;
        if let Expr::Path(path) = &expr {
            if path.parents == 0 && !path.root && path.segments.len() == 1 {
                let name = &path.segments[0];
                if self.helpers.contains(name) {
                    return Ok(Expr::Call { helper: name.clone(), args: Vec::new() });
                }
            }
        }
        Ok(expr)
    }

    fn parse_expr(&self, source: &str) -> ParseResult<Expr> {
        let tokens = lex_expr(source)?;
        let mut cursor = ExprCursor { tokens: &tokens, pos: 0, source, helpers: self.helpers };
        let expr = cursor.parse_top()?;
        if cursor.pos != tokens.len() {
            return Err(invalid(source, "unexpected trailing tokens"));
        }
        Ok(expr)
    }
}

// ---- expressions ----

#[derive(Debug, Clone, PartialEq)]
enum ExprToken {
    Open,
    Close,
    Str(String),
    Word(String),
}

fn invalid(expression: &str, message: &str) -> TemplateError {
    TemplateError::InvalidExpression {
        expression: expression.to_string(),
        message: message.to_string(),
    }
}

fn lex_expr(source: &str) -> ParseResult<Vec<ExprToken>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(ExprToken::Open);
            }
            ')' => {
                chars.next();
                tokens.push(ExprToken::Close);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut literal = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            literal.push(escaped);
                        }
                    } else if c == quote {
                        closed = true;
                        break;
                    } else {
                        literal.push(c);
                    }
                }
                if !closed {
                    return Err(invalid(source, "unterminated string literal"));
                }
                tokens.push(ExprToken::Str(literal));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                if word.contains('=') {
                    return Err(invalid(source, "hash arguments are not supported"));
                }
                tokens.push(ExprToken::Word(word));
            }
        }
    }
    if tokens.is_empty() {
        return Err(invalid(source, "empty expression"));
    }
    Ok(tokens)
}

struct ExprCursor<'t> {
    tokens: &'t [ExprToken],
    pos: usize,
    source: &'t str,
    helpers: &'t HelperRegistry,
}

impl<'t> ExprCursor<'t> {
    /// `name arg arg ...` or a single operand
    fn parse_top(&mut self) -> ParseResult<Expr> {
        if self.tokens.len() > 1 {
            if let Some(ExprToken::Word(name)) = self.tokens.first() {
                self.pos = 1;
                return self.parse_call(name.clone());
            }
        }
        self.parse_operand()
    }

    fn parse_call(&mut self, helper: String) -> ParseResult<Expr> {
        if !self.helpers.contains(&helper) {
            return Err(TemplateError::UnknownHelper { name: helper });
        }
        let mut args = Vec::new();
        while self.pos < self.tokens.len() && self.tokens[self.pos] != ExprToken::Close {
            args.push(self.parse_operand()?);
        }
        Ok(Expr::Call { helper, args })
    }

    fn parse_operand(&mut self) -> ParseResult<Expr> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| invalid(self.source, "missing operand"))?;
        self.pos += 1;
        match token {
            ExprToken::Str(s) => Ok(Expr::Literal(Value::String(s))),
            ExprToken::Word(w) => parse_word(&w, self.source),
            ExprToken::Close => Err(invalid(self.source, "unexpected ')'")),
            ExprToken::Open => {
                let name = match self.tokens.get(self.pos) {
                    Some(ExprToken::Word(name)) => name.clone(),
                    _ => return Err(invalid(self.source, "sub-expression needs a helper name")),
                };
                self.pos += 1;
                let call = self.parse_call(name)?;
                match self.tokens.get(self.pos) {
                    Some(ExprToken::Close) => {
                        self.pos += 1;
                        Ok(call)
                    }
                    _ => Err(invalid(self.source, "unbalanced parentheses")),
                }
            }
        }
    }
}

fn parse_word(word: &str, source: &str) -> ParseResult<Expr> {
    match word {
        "true" => return Ok(Expr::Literal(Value::Bool(true))),
        "false" => return Ok(Expr::Literal(Value::Bool(false))),
        "null" | "undefined" => return Ok(Expr::Literal(Value::Null)),
        _ => {}
    }
    if let Some(number) = parse_number(word) {
        return Ok(Expr::Literal(Value::Number(number)));
    }
    if let Some(rest) = word.strip_prefix("@root") {
        let rest = rest.strip_prefix('.').unwrap_or(rest);
        return Ok(Expr::Path(Path { parents: 0, root: true, segments: split_segments(rest) }));
    }
    if let Some(name) = word.strip_prefix('@') {
        if name.is_empty() {
            return Err(invalid(source, "empty data variable"));
        }
        return Ok(Expr::Data(name.to_string()));
    }

    let mut rest = word;
    let mut parents = 0;
    while let Some(stripped) = rest.strip_prefix("../") {
        parents += 1;
        rest = stripped;
    }
    if rest == ".." {
        parents += 1;
        rest = "";
    }
    let rest = match rest.strip_prefix("this") {
        Some(tail) if tail.is_empty() || tail.starts_with(is_separator) => {
            tail.trim_start_matches(is_separator)
        }
        _ => rest,
    };
    let rest = rest.strip_prefix("./").unwrap_or(rest);
    let rest = if rest == "." { "" } else { rest };
    Ok(Expr::Path(Path { parents, root: false, segments: split_segments(rest) }))
}

fn parse_number(word: &str) -> Option<Number> {
    let first = word.chars().next()?;
    if !(first.is_ascii_digit() || first == '-') {
        return None;
    }
    if let Ok(i) = word.parse::<i64>() {
        return Some(Number::from(i));
    }
    word.parse::<f64>().ok().and_then(Number::from_f64)
}

fn is_separator(c: char) -> bool {
    c == '.' || c == '/'
}

fn split_segments(path: &str) -> Vec<String> {
    path.split(is_separator)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_matches(|c| c == '[' || c == ']').to_string())
        .collect()
}
