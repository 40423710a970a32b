//! Text templates used to render a [`LogRecord`] into a console line.
//!
//! The syntax is a small subset of Go's `text/template`:
//!
//! - `{{.LevelName}}`, `{{.Message}}`, `{{.Timestamp}}`, `{{.Level}}`,
//!   `{{.Attrs}}` and `{{.Attrs.some_key}}` read from the record.
//! - `{{color}}` / `{{reset}}` emit the level color and the reset sequence
//!   when colorizing, and nothing otherwise.
//! - `ucase`, `lcase`, `title`, `json` and `paint` take one argument, either
//!   inline (`{{ucase .LevelName}}`) or piped (`{{.LevelName | ucase}}`).
//! - `{{if X}}..{{else}}..{{end}}` and
//!   `{{range $key, $val := .Attrs}}..{{else}}..{{end}}`.
//! - `{{- ` and ` -}}` trim whitespace around an action, `{{/* .. */}}` is
//!   a comment.

use crate::color;
use crate::record::{Attrs, LogRecord};
use chrono::SecondsFormat;
use std::borrow::Cow;
use std::str::FromStr;

/// Template installed by [`ConsoleLogger::new`](crate::console::ConsoleLogger::new).
pub const DEFAULT_TEMPLATE: &str = "[{{color}}{{ucase .LevelName}}{{reset}}] {{.Message}}";

const NO_VALUE: &str = "<no value>";
const NIL: &str = "<nil>";

/// Error raised while compiling or executing a [`Template`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template parse error at byte {offset}: {reason}")]
    Parse { offset: usize, reason: String },

    #[error("template execution failed: {0}")]
    Exec(String),
}

fn parse_err(offset: usize, reason: impl Into<String>) -> TemplateError {
    TemplateError::Parse {
        offset,
        reason: reason.into(),
    }
}

fn exec_err(reason: impl Into<String>) -> TemplateError {
    TemplateError::Exec(reason.into())
}

/// A compiled template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Compile `source`. An empty source is valid and renders nothing.
    pub fn new(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let items = scan(&source)?;
        let mut parser = Parser {
            items: items.into_iter(),
        };
        let (nodes, stop) = parser.parse_nodes()?;
        match stop {
            Stop::Eof => Ok(Template { source, nodes }),
            Stop::Else(at) => Err(parse_err(at, "unexpected else")),
            Stop::End(at) => Err(parse_err(at, "unexpected end")),
        }
    }

    /// Source text this template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render `record`. Color sequences are emitted only when `colorize` is set.
    pub fn execute(&self, record: &LogRecord, colorize: bool) -> Result<String, TemplateError> {
        let mut exec = Exec {
            record,
            colorize,
            vars: Vec::new(),
        };
        let mut out = String::with_capacity(self.source.len() + record.message.len());
        exec.run(&self.nodes, &mut out)?;
        Ok(out)
    }
}

impl Default for Template {
    fn default() -> Self {
        Template::new(DEFAULT_TEMPLATE).expect("default template compiles")
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::new(s)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Pipeline(Pipeline),
    If {
        cond: Pipeline,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Range {
        key: Option<String>,
        value: String,
        source: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

#[derive(Debug, Clone)]
struct Pipeline {
    cmds: Vec<Command>,
}

#[derive(Debug, Clone)]
enum Command {
    Value(Operand),
    Call(Func, Vec<Operand>),
}

#[derive(Debug, Clone)]
enum Operand {
    Field(Vec<String>),
    Var(String, Vec<String>),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Color,
    Reset,
    Ucase,
    Lcase,
    Title,
    Json,
    Paint,
}

impl Func {
    fn lookup(name: &str) -> Option<Func> {
        match name {
            "color" => Some(Func::Color),
            "reset" => Some(Func::Reset),
            "ucase" => Some(Func::Ucase),
            "lcase" => Some(Func::Lcase),
            "title" => Some(Func::Title),
            "json" => Some(Func::Json),
            "paint" => Some(Func::Paint),
            _ => None,
        }
    }

    fn arity(self) -> usize {
        match self {
            Func::Color | Func::Reset => 0,
            _ => 1,
        }
    }
}

enum Item {
    Text(String),
    Action { toks: Vec<Tok>, offset: usize },
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Str(String),
    Pipe,
    Comma,
    Declare,
}

/// Split the source into text runs and lexed actions, applying trim markers.
fn scan(src: &str) -> Result<Vec<Item>, TemplateError> {
    let mut items = Vec::new();
    let mut rest = src;
    let mut pos = 0;
    let mut trim_next = false;

    while let Some(start) = rest.find("{{") {
        let mut text = &rest[..start];
        if trim_next {
            text = text.trim_start();
        }

        let after = &rest[start + 2..];
        let end = find_close(after).ok_or_else(|| parse_err(pos + start, "unclosed action"))?;
        let mut body = &after[..end];
        let mut body_offset = pos + start + 2;

        let trim_left = body.starts_with('-') && body[1..].starts_with(char::is_whitespace);
        if trim_left {
            body = &body[1..];
            body_offset += 1;
            text = text.trim_end();
        }
        let trim_right =
            body.ends_with('-') && body[..body.len() - 1].ends_with(char::is_whitespace);
        if trim_right {
            body = &body[..body.len() - 1];
        }

        if !text.is_empty() {
            items.push(Item::Text(text.to_string()));
        }

        let trimmed = body.trim();
        if !(trimmed.starts_with("/*") && trimmed.ends_with("*/")) {
            items.push(Item::Action {
                toks: lex(body, body_offset)?,
                offset: body_offset,
            });
        }

        trim_next = trim_right;
        let consumed = start + 2 + end + 2;
        pos += consumed;
        rest = &rest[consumed..];
    }

    let text = if trim_next { rest.trim_start() } else { rest };
    if !text.is_empty() {
        items.push(Item::Text(text.to_string()));
    }
    Ok(items)
}

/// Position of the closing `}}`, skipping over string literals.
fn find_close(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut in_str = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_str => i += 1,
            b'"' => in_str = !in_str,
            b'}' if !in_str && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn lex(body: &str, offset: usize) -> Result<Vec<Tok>, TemplateError> {
    let mut toks = Vec::new();
    let mut chars = body.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '|' => {
                chars.next();
                toks.push(Tok::Pipe);
            }
            ',' => {
                chars.next();
                toks.push(Tok::Comma);
            }
            ':' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => toks.push(Tok::Declare),
                    _ => return Err(parse_err(offset + i, "expected ':='")),
                }
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((j, '\\')) => match chars.next() {
                            Some((_, 'n')) => s.push('\n'),
                            Some((_, 't')) => s.push('\t'),
                            Some((_, '"')) => s.push('"'),
                            Some((_, '\\')) => s.push('\\'),
                            _ => return Err(parse_err(offset + j, "invalid escape in string")),
                        },
                        Some((_, ch)) => s.push(ch),
                        None => return Err(parse_err(offset + i, "unterminated string")),
                    }
                }
                toks.push(Tok::Str(s));
            }
            _ => {
                let mut end = body.len();
                while let Some(&(j, ch)) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '|' | ',' | ':' | '"') {
                        end = j;
                        break;
                    }
                    chars.next();
                }
                toks.push(Tok::Word(body[i..end].to_string()));
            }
        }
    }
    Ok(toks)
}

enum Stop {
    Eof,
    Else(usize),
    End(usize),
}

struct Parser {
    items: std::vec::IntoIter<Item>,
}

impl Parser {
    fn parse_nodes(&mut self) -> Result<(Vec<Node>, Stop), TemplateError> {
        let mut nodes = Vec::new();
        while let Some(item) = self.items.next() {
            let (toks, offset) = match item {
                Item::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Item::Action { toks, offset } => (toks, offset),
            };

            match toks.first() {
                None => return Err(parse_err(offset, "empty action")),
                Some(Tok::Word(w)) if w == "end" || w == "else" => {
                    if toks.len() > 1 {
                        return Err(parse_err(offset, format!("unexpected tokens after {w}")));
                    }
                    let stop = if w == "end" {
                        Stop::End(offset)
                    } else {
                        Stop::Else(offset)
                    };
                    return Ok((nodes, stop));
                }
                Some(Tok::Word(w)) if w == "if" => {
                    let cond = parse_pipeline(&toks[1..], offset)?;
                    let (then, otherwise) = self.parse_branches("if", offset)?;
                    nodes.push(Node::If {
                        cond,
                        then,
                        otherwise,
                    });
                }
                Some(Tok::Word(w)) if w == "range" => {
                    let (key, value, source) = parse_range_header(&toks[1..], offset)?;
                    let (body, otherwise) = self.parse_branches("range", offset)?;
                    nodes.push(Node::Range {
                        key,
                        value,
                        source,
                        body,
                        otherwise,
                    });
                }
                _ => nodes.push(Node::Pipeline(parse_pipeline(&toks, offset)?)),
            }
        }
        Ok((nodes, Stop::Eof))
    }

    fn parse_branches(
        &mut self,
        what: &str,
        offset: usize,
    ) -> Result<(Vec<Node>, Vec<Node>), TemplateError> {
        let (body, stop) = self.parse_nodes()?;
        match stop {
            Stop::End(_) => Ok((body, Vec::new())),
            Stop::Else(_) => {
                let (otherwise, stop) = self.parse_nodes()?;
                match stop {
                    Stop::End(_) => Ok((body, otherwise)),
                    Stop::Else(at) => Err(parse_err(at, format!("duplicate else in {what}"))),
                    Stop::Eof => Err(parse_err(offset, format!("unclosed {what}"))),
                }
            }
            Stop::Eof => Err(parse_err(offset, format!("unclosed {what}"))),
        }
    }
}

fn parse_range_header(
    toks: &[Tok],
    offset: usize,
) -> Result<(Option<String>, String, Pipeline), TemplateError> {
    match toks {
        [Tok::Word(k), Tok::Comma, Tok::Word(v), Tok::Declare, rest @ ..] => Ok((
            Some(var_name(k, offset)?),
            var_name(v, offset)?,
            parse_pipeline(rest, offset)?,
        )),
        [Tok::Word(v), Tok::Declare, rest @ ..] => {
            Ok((None, var_name(v, offset)?, parse_pipeline(rest, offset)?))
        }
        _ => Err(parse_err(
            offset,
            "range must declare its variables, e.g. range $key, $val := .Attrs",
        )),
    }
}

fn var_name(word: &str, offset: usize) -> Result<String, TemplateError> {
    match word.strip_prefix('$') {
        Some(name) if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') => {
            Ok(name.to_string())
        }
        _ => Err(parse_err(offset, format!("bad variable name {word:?}"))),
    }
}

fn parse_pipeline(toks: &[Tok], offset: usize) -> Result<Pipeline, TemplateError> {
    if toks.is_empty() {
        return Err(parse_err(offset, "missing value"));
    }

    let mut cmds = Vec::new();
    for (stage, seg) in toks.split(|t| *t == Tok::Pipe).enumerate() {
        let Some(first) = seg.first() else {
            return Err(parse_err(offset, "empty command in pipeline"));
        };

        match first {
            Tok::Word(w) if !w.starts_with('.') && !w.starts_with('$') => {
                let func = Func::lookup(w)
                    .ok_or_else(|| parse_err(offset, format!("function {w:?} not defined")))?;
                let args = seg[1..]
                    .iter()
                    .map(|t| parse_operand(t, offset))
                    .collect::<Result<Vec<_>, _>>()?;
                let supplied = args.len() + usize::from(stage > 0);
                if supplied != func.arity() {
                    return Err(parse_err(
                        offset,
                        format!(
                            "wrong number of args for {w}: want {} got {supplied}",
                            func.arity()
                        ),
                    ));
                }
                cmds.push(Command::Call(func, args));
            }
            _ => {
                if stage > 0 {
                    return Err(parse_err(offset, "non-function in pipeline stage"));
                }
                if seg.len() > 1 {
                    return Err(parse_err(offset, "unexpected operand after value"));
                }
                cmds.push(Command::Value(parse_operand(first, offset)?));
            }
        }
    }
    Ok(Pipeline { cmds })
}

fn parse_operand(tok: &Tok, offset: usize) -> Result<Operand, TemplateError> {
    match tok {
        Tok::Str(s) => Ok(Operand::Str(s.clone())),
        Tok::Word(w) if w.starts_with('.') => {
            let path: Vec<String> = w[1..].split('.').map(str::to_string).collect();
            if path.iter().any(String::is_empty) {
                return Err(parse_err(offset, format!("bad field path {w:?}")));
            }
            Ok(Operand::Field(path))
        }
        Tok::Word(w) if w.starts_with('$') => {
            let mut parts = w.split('.');
            let name = var_name(parts.next().unwrap_or_default(), offset)?;
            let path: Vec<String> = parts.map(str::to_string).collect();
            if path.iter().any(String::is_empty) {
                return Err(parse_err(offset, format!("bad field path {w:?}")));
            }
            Ok(Operand::Var(name, path))
        }
        other => Err(parse_err(offset, format!("unexpected {other:?}"))),
    }
}

#[derive(Debug, Clone)]
enum Value<'r> {
    Text(Cow<'r, str>),
    Json(&'r serde_json::Value),
    Attrs(&'r Attrs),
    Missing,
}

struct Exec<'t, 'r> {
    record: &'r LogRecord,
    colorize: bool,
    vars: Vec<(&'t str, Value<'r>)>,
}

impl<'t, 'r> Exec<'t, 'r> {
    fn run(&mut self, nodes: &'t [Node], out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Pipeline(p) => {
                    let value = self.eval(p)?;
                    out.push_str(&display(&value));
                }
                Node::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    if truthy(&self.eval(cond)?) {
                        self.run(then, out)?;
                    } else {
                        self.run(otherwise, out)?;
                    }
                }
                Node::Range {
                    key,
                    value,
                    source,
                    body,
                    otherwise,
                } => {
                    let entries = entries(self.eval(source)?)?;
                    if entries.is_empty() {
                        self.run(otherwise, out)?;
                        continue;
                    }
                    for (k, v) in entries {
                        let mark = self.vars.len();
                        if let Some(key) = key {
                            self.vars.push((key.as_str(), k));
                        }
                        self.vars.push((value.as_str(), v));
                        let res = self.run(body, out);
                        self.vars.truncate(mark);
                        res?;
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&self, pipeline: &Pipeline) -> Result<Value<'r>, TemplateError> {
        let mut acc: Option<Value<'r>> = None;
        for cmd in &pipeline.cmds {
            let value = match cmd {
                Command::Value(op) => self.operand(op)?,
                Command::Call(func, args) => {
                    let mut vals = args
                        .iter()
                        .map(|a| self.operand(a))
                        .collect::<Result<Vec<_>, _>>()?;
                    vals.extend(acc.take());
                    self.call(*func, vals)
                }
            };
            acc = Some(value);
        }
        Ok(acc.unwrap_or(Value::Missing))
    }

    fn operand(&self, op: &Operand) -> Result<Value<'r>, TemplateError> {
        match op {
            Operand::Str(s) => Ok(Value::Text(Cow::Owned(s.clone()))),
            Operand::Field(path) => {
                let root = self.field(&path[0])?;
                walk(root, &path[1..])
            }
            Operand::Var(name, path) => {
                let root = self
                    .vars
                    .iter()
                    .rev()
                    .find(|(n, _)| *n == name)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| exec_err(format!("undefined variable ${name}")))?;
                walk(root, path)
            }
        }
    }

    fn field(&self, name: &str) -> Result<Value<'r>, TemplateError> {
        let record: &'r LogRecord = self.record;
        let value = match name {
            "LevelName" => Value::Text(Cow::Borrowed(record.level.name())),
            "Level" => Value::Text(Cow::Owned(record.level.value().to_string())),
            "Message" => Value::Text(Cow::Borrowed(record.message.as_str())),
            "Timestamp" => Value::Text(Cow::Owned(
                record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            "Attrs" => Value::Attrs(&record.attrs),
            _ => return Err(exec_err(format!("can't evaluate field {name} in log record"))),
        };
        Ok(value)
    }

    fn call(&self, func: Func, args: Vec<Value<'r>>) -> Value<'r> {
        let level = self.record.level;
        let arg = args.into_iter().next().unwrap_or(Value::Missing);
        let text = match func {
            Func::Color => {
                let code = if self.colorize { color::level_code(level) } else { String::new() };
                return Value::Text(Cow::Owned(code));
            }
            Func::Reset => {
                let code = if self.colorize { color::reset_code(level) } else { String::new() };
                return Value::Text(Cow::Owned(code));
            }
            Func::Ucase => display(&arg).to_uppercase(),
            Func::Lcase => display(&arg).to_lowercase(),
            Func::Title => title(&display(&arg)),
            Func::Json => to_json(&arg),
            Func::Paint => color::color_fn(level, self.colorize)(&display(&arg)),
        };
        Value::Text(Cow::Owned(text))
    }
}

fn walk<'r>(mut value: Value<'r>, path: &[String]) -> Result<Value<'r>, TemplateError> {
    for key in path {
        value = match value {
            Value::Attrs(map) => map.get(key).map_or(Value::Missing, Value::Json),
            Value::Json(serde_json::Value::Object(map)) => {
                map.get(key).map_or(Value::Missing, Value::Json)
            }
            Value::Missing => Value::Missing,
            other => {
                return Err(exec_err(format!(
                    "can't evaluate field {key} in non-map value {}",
                    display(&other)
                )))
            }
        };
    }
    Ok(value)
}

type Entry<'r> = (Value<'r>, Value<'r>);

fn entries(value: Value<'_>) -> Result<Vec<Entry<'_>>, TemplateError> {
    match value {
        Value::Attrs(map) => Ok(map
            .iter()
            .map(|(k, v)| (Value::Text(Cow::Borrowed(k.as_str())), Value::Json(v)))
            .collect()),
        Value::Json(serde_json::Value::Object(map)) => Ok(map
            .iter()
            .map(|(k, v)| (Value::Text(Cow::Borrowed(k.as_str())), Value::Json(v)))
            .collect()),
        Value::Json(serde_json::Value::Array(items)) => Ok(items
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::Text(Cow::Owned(i.to_string())), Value::Json(v)))
            .collect()),
        Value::Json(serde_json::Value::Null) | Value::Missing => Ok(Vec::new()),
        other => Err(exec_err(format!("range can't iterate over {}", display(&other)))),
    }
}

fn display<'a>(value: &'a Value<'_>) -> Cow<'a, str> {
    match value {
        Value::Text(s) => Cow::Borrowed(s.as_ref()),
        Value::Json(serde_json::Value::String(s)) => Cow::Borrowed(s.as_str()),
        Value::Json(serde_json::Value::Null) => Cow::Borrowed(NIL),
        Value::Json(other) => Cow::Owned(other.to_string()),
        Value::Attrs(map) => Cow::Owned(attrs_json(map)),
        Value::Missing => Cow::Borrowed(NO_VALUE),
    }
}

fn to_json(value: &Value<'_>) -> String {
    match value {
        Value::Text(s) => serde_json::Value::String(s.to_string()).to_string(),
        Value::Json(v) => v.to_string(),
        Value::Attrs(map) => attrs_json(map),
        Value::Missing => "null".to_string(),
    }
}

fn attrs_json(map: &Attrs) -> String {
    serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .to_string()
}

fn truthy(value: &Value<'_>) -> bool {
    match value {
        Value::Text(s) => !s.is_empty(),
        Value::Attrs(map) => !map.is_empty(),
        Value::Missing => false,
        Value::Json(v) => match v {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
            serde_json::Value::String(s) => !s.is_empty(),
            serde_json::Value::Array(a) => !a.is_empty(),
            serde_json::Value::Object(o) => !o.is_empty(),
        },
    }
}

fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}
