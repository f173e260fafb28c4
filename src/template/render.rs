use serde_json::Value;

use crate::errors::TemplateError;
use crate::template::helpers::HelperRegistry;
use crate::template::parser::{Expr, Node, Path};

type RenderResult<T> = std::result::Result<T, TemplateError>;

/// `@index`, `@first`, `@last` and `@key` of the innermost `each`
#[derive(Debug, Clone)]
struct LoopData {
    index: usize,
    first: bool,
    last: bool,
    key: Option<String>,
}

/// context chain; `each` and `with` push a frame, `../` walks back up
struct Scope<'a> {
    value: &'a Value,
    data: Option<LoopData>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    fn root(&self) -> &Scope<'a> {
        let mut scope = self;
        while let Some(parent) = scope.parent {
            scope = parent;
        }
        scope
    }

    fn ancestor(&self, hops: usize) -> Option<&Scope<'a>> {
        let mut scope = self;
        for _ in 0..hops {
            scope = scope.parent?;
        }
        Some(scope)
    }

    fn data(&self) -> Option<&LoopData> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(data) = &current.data {
                return Some(data);
            }
            scope = current.parent;
        }
        None
    }
}

struct Renderer<'h> {
    helpers: &'h HelperRegistry,
    escape_html: bool,
}

/// render a compiled tree; `escape_html` enables escaping of `{{ }}` output
pub(crate) fn render_nodes(
    nodes: &[Node],
    context: &Value,
    helpers: &HelperRegistry,
    escape_html: bool,
) -> RenderResult<String> {
    let renderer = Renderer { helpers, escape_html };
    let scope = Scope { value: context, data: None, parent: None };
    let mut out = String::new();
    renderer.render(nodes, &scope, &mut out)?;
    Ok(out)
}

impl<'h> Renderer<'h> {
    fn render(&self, nodes: &[Node], scope: &Scope<'_>, out: &mut String) -> RenderResult<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output { expr, escape } => {
                    let value = self.evaluate(expr, scope)?;
                    let text = stringify(&value);
                    if *escape && self.escape_html {
                        escape_html_into(&text, out);
                    } else {
                        out.push_str(&text);
                    }
                }
                Node::If { cond, negate, then, otherwise } => {
                    let value = self.evaluate(cond, scope)?;
                    if is_truthy(&value) != *negate {
                        self.render(then, scope, out)?;
                    } else {
                        self.render(otherwise, scope, out)?;
                    }
                }
                Node::Each { list, body, otherwise } => {
                    let value = self.evaluate(list, scope)?;
                    if !self.render_each(&value, body, scope, out)? {
                        self.render(otherwise, scope, out)?;
                    }
                }
                Node::With { scope: expr, body, otherwise } => {
                    let value = self.evaluate(expr, scope)?;
                    if is_truthy(&value) {
                        let child = Scope { value: &value, data: None, parent: Some(scope) };
                        self.render(body, &child, out)?;
                    } else {
                        self.render(otherwise, scope, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// false when there was nothing to iterate
    fn render_each(
        &self,
        value: &Value,
        body: &[Node],
        scope: &Scope<'_>,
        out: &mut String,
    ) -> RenderResult<bool> {
        match value {
            Value::Array(items) if !items.is_empty() => {
                let last = items.len() - 1;
                for (index, item) in items.iter().enumerate() {
                    let data =
                        LoopData { index, first: index == 0, last: index == last, key: None };
                    let child = Scope { value: item, data: Some(data), parent: Some(scope) };
                    self.render(body, &child, out)?;
                }
                Ok(true)
            }
            Value::Object(map) if !map.is_empty() => {
                let last = map.len() - 1;
                for (index, (key, item)) in map.iter().enumerate() {
                    let data = LoopData {
                        index,
                        first: index == 0,
                        last: index == last,
                        key: Some(key.clone()),
                    };
                    let child = Scope { value: item, data: Some(data), parent: Some(scope) };
                    self.render(body, &child, out)?;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn evaluate(&self, expr: &Expr, scope: &Scope<'_>) -> RenderResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Path(path) => Ok(resolve(path, scope).unwrap_or(Value::Null)),
            Expr::Data(name) => Ok(data_variable(name, scope)),
            Expr::Call { helper, args } => {
                let function = self
                    .helpers
                    .get(helper)
                    .ok_or_else(|| TemplateError::UnknownHelper { name: helper.clone() })?;
                let values = args
                    .iter()
                    .map(|arg| self.evaluate(arg, scope))
                    .collect::<RenderResult<Vec<Value>>>()?;
                function(&values).map_err(|message| TemplateError::HelperFailed {
                    helper: helper.clone(),
                    message,
                })
            }
        }
    }
}

/// lookup along `path`; `length` of an array is its item count
fn resolve(path: &Path, scope: &Scope<'_>) -> Option<Value> {
    let start = if path.root { scope.root() } else { scope.ancestor(path.parents)? };
    let mut current: &Value = start.value;
    for (i, segment) in path.segments.iter().enumerate() {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(index) => items.get(index)?,
                Err(_) if segment == "length" && i + 1 == path.segments.len() => {
                    return Some(Value::from(items.len()));
                }
                Err(_) => return None,
            },
            _ => return None,
        };
    }
    Some(current.clone())
}

fn data_variable(name: &str, scope: &Scope<'_>) -> Value {
    let Some(data) = scope.data() else {
        return Value::Null;
    };
    match name {
        "index" => Value::from(data.index),
        "first" => Value::Bool(data.first),
        "last" => Value::Bool(data.last),
        "key" => data.key.clone().map(Value::String).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// falsy: null, false, 0, "" and []
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => String::new(),
    }
}

fn escape_html_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            c => out.push(c),
        }
    }
}
