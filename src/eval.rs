//! Evaluates the supported expression subset over a parsed file and collects
//! dependency declarations. Values stay tied to the source lines their text
//! came from, because a later upgrade has to rewrite every one of them.

use crate::starlark::{Arg, Comments, Expr, File, Stmt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("line {line}: '%' operands must be strings, found {found}")]
    InterpolationOperand { line: usize, found: &'static str },
}

/// A source position a resolved value's text occurs at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

/// A resolved string plus every location its original text occupies.
///
/// One logical value, typically a version, surfaces in several places:
/// repeated across mirror URLs, embedded in a strip_prefix, interpolated
/// from a variable defined lines away. Upgrading the value means editing
/// all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedValue {
    pub value: String,
    pub locations: Vec<Location>,
}

impl TrackedValue {
    pub fn new(value: impl Into<String>, file: &Path, line: usize) -> Self {
        Self {
            value: value.into(),
            locations: vec![Location {
                file: file.to_path_buf(),
                line,
            }],
        }
    }

    /// `self % other`: substitute the other value for the first `%s` and
    /// union the location sets, left operand first
    fn interpolate(&self, other: &TrackedValue) -> TrackedValue {
        let value = if self.value.contains("%s") {
            self.value.replacen("%s", &other.value, 1)
        } else {
            self.value.clone()
        };
        let mut locations = self.locations.clone();
        locations.extend(other.locations.iter().cloned());
        TrackedValue { value, locations }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Str(TrackedValue),
    List(Vec<TrackedValue>),
    /// Evaluable but useless to handlers (a nested call's result)
    Opaque,
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "a string",
            Value::List(_) => "a list",
            Value::Opaque => "a call result",
        }
    }
}

/// One call found during the scan, keyword arguments fully evaluated
#[derive(Debug, Clone)]
pub struct Declaration {
    pub rule: String,
    pub file: PathBuf,
    pub line: usize,
    /// Keyword arguments in source order; unknown ones are simply never
    /// looked up
    pub kwargs: Vec<(String, Value)>,
    pub comments: Comments,
}

impl Declaration {
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn str_kwarg(&self, name: &str) -> Option<&TrackedValue> {
        match self.kwarg(name) {
            Some(Value::Str(v)) => Some(v),
            _ => None,
        }
    }

    pub fn list_kwarg(&self, name: &str) -> Option<&[TrackedValue]> {
        match self.kwarg(name) {
            Some(Value::List(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// The declaration's `name` attribute, empty when missing
    pub fn name(&self) -> &str {
        self.str_kwarg("name").map_or("", |v| v.value.as_str())
    }
}

/// Walk the file's statements in order and collect every call as a
/// Declaration. Assignments extend the variable environment as they are
/// met; the last assignment to a name wins.
pub fn scan_file(file: &File, path: &Path) -> Result<Vec<Declaration>, EvalError> {
    let mut scanner = Scanner {
        path,
        env: HashMap::new(),
        declarations: Vec::new(),
    };
    for stmt in &file.statements {
        match stmt {
            Stmt::Assign {
                name,
                value,
                comments,
            } => {
                let value = scanner.eval_expr(value, comments)?;
                scanner.env.insert(name.clone(), value);
            }
            Stmt::Expr { expr, comments } => {
                scanner.eval_expr(expr, comments)?;
            }
        }
    }
    Ok(scanner.declarations)
}

struct Scanner<'a> {
    path: &'a Path,
    env: HashMap<String, Value>,
    declarations: Vec<Declaration>,
}

impl Scanner<'_> {
    fn eval_expr(&mut self, expr: &Expr, comments: &Comments) -> Result<Value, EvalError> {
        match expr {
            Expr::Str { value, line } => Ok(Value::Str(TrackedValue::new(
                value.clone(),
                self.path,
                *line,
            ))),
            Expr::Int { value, line } => Ok(Value::Str(TrackedValue::new(
                value.to_string(),
                self.path,
                *line,
            ))),
            // Unknown names evaluate to their own text so a single pass
            // stays total
            Expr::Ident { name, line } => Ok(self.env.get(name).cloned().unwrap_or_else(|| {
                Value::Str(TrackedValue::new(name.clone(), self.path, *line))
            })),
            Expr::List { items, .. } => {
                let mut values = Vec::new();
                for item in items {
                    // only string-valued elements mean anything to handlers
                    if let Value::Str(v) = self.eval_expr(item, comments)? {
                        values.push(v);
                    }
                }
                Ok(Value::List(values))
            }
            Expr::Percent { lhs, rhs, line } => {
                let lhs = self.eval_expr(lhs, comments)?;
                let rhs = self.eval_expr(rhs, comments)?;
                match (lhs, rhs) {
                    (Value::Str(l), Value::Str(r)) => Ok(Value::Str(l.interpolate(&r))),
                    (Value::Str(_), other) | (other, _) => Err(EvalError::InterpolationOperand {
                        line: *line,
                        found: other.kind(),
                    }),
                }
            }
            Expr::Call(call) => {
                let mut kwargs = Vec::new();
                for arg in &call.args {
                    if let Arg::Keyword { name, value } = arg {
                        let value = self.eval_expr(value, comments)?;
                        kwargs.push((name.clone(), value));
                    }
                }
                self.declarations.push(Declaration {
                    rule: call.function.clone(),
                    file: self.path.to_path_buf(),
                    line: call.line,
                    kwargs,
                    comments: comments.clone(),
                });
                Ok(Value::Opaque)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::starlark;

    fn scan(source: &str) -> Vec<Declaration> {
        let file = starlark::parse(source).unwrap();
        scan_file(&file, Path::new("WORKSPACE")).unwrap()
    }

    fn loc(line: usize) -> Location {
        Location {
            file: PathBuf::from("WORKSPACE"),
            line,
        }
    }

    #[test]
    fn test_literal_kwarg_position() {
        let decls = scan("http_archive(\n    name = \"rules_go\",\n    sha256 = \"abc\",\n)\n");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].rule, "http_archive");
        assert_eq!(decls[0].name(), "rules_go");
        let sha = decls[0].str_kwarg("sha256").unwrap();
        assert_eq!(sha.value, "abc");
        assert_eq!(sha.locations, vec![loc(3)]);
    }

    #[test]
    fn test_variable_resolution_keeps_literal_position() {
        let decls = scan("V = \"0.19.3\"\nhttp_archive(name = \"x\", version = V)\n");
        let version = decls[0].str_kwarg("version").unwrap();
        assert_eq!(version.value, "0.19.3");
        assert_eq!(version.locations, vec![loc(1)]);
    }

    #[test]
    fn test_last_assignment_wins() {
        let decls = scan("V = \"1\"\nV = \"2\"\nf(x = V)\n");
        assert_eq!(decls[0].str_kwarg("x").unwrap().value, "2");
        assert_eq!(decls[0].str_kwarg("x").unwrap().locations, vec![loc(2)]);
    }

    #[test]
    fn test_interpolation_unions_locations() {
        let decls = scan(
            "V = \"1.15.2\"\nhttp_archive(\n    name = \"x\",\n    url = \"https://github.com/o/r/archive/%s.zip\" % V,\n)\n",
        );
        let url = decls[0].str_kwarg("url").unwrap();
        assert_eq!(url.value, "https://github.com/o/r/archive/1.15.2.zip");
        assert_eq!(url.locations, vec![loc(4), loc(1)]);
    }

    #[test]
    fn test_interpolation_without_placeholder_keeps_left() {
        let decls = scan("f(x = \"plain\" % \"arg\")\n");
        let x = decls[0].str_kwarg("x").unwrap();
        assert_eq!(x.value, "plain");
        assert_eq!(x.locations.len(), 2);
    }

    #[test]
    fn test_unknown_identifier_synthesizes_value() {
        let decls = scan("f(x = SOME_NAME)\n");
        let x = decls[0].str_kwarg("x").unwrap();
        assert_eq!(x.value, "SOME_NAME");
        assert_eq!(x.locations, vec![loc(1)]);
    }

    #[test]
    fn test_list_elements_resolve_individually() {
        let decls = scan(
            "V = \"2.0\"\nf(urls = [\n    \"https://a/%s.tar.gz\" % V,\n    \"https://b/2.0.tar.gz\",\n])\n",
        );
        let urls = decls[0].list_kwarg("urls").unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].value, "https://a/2.0.tar.gz");
        assert_eq!(urls[0].locations, vec![loc(3), loc(1)]);
        assert_eq!(urls[1].locations, vec![loc(4)]);
    }

    #[test]
    fn test_list_variable_lookup() {
        let decls = scan("URLS = [\"https://a\", \"https://b\"]\nf(urls = URLS)\n");
        let urls = decls[0].list_kwarg("urls").unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].locations, vec![loc(1)]);
    }

    #[test]
    fn test_nested_call_is_collected_and_opaque() {
        let decls = scan("outer(inner = g(name = \"deep\"))\n");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].rule, "g");
        assert_eq!(decls[1].rule, "outer");
        assert!(matches!(decls[1].kwarg("inner"), Some(Value::Opaque)));
    }

    #[test]
    fn test_interpolating_a_list_is_fatal() {
        let file = starlark::parse("f(x = \"%s\" % [\"a\"])\n").unwrap();
        let err = scan_file(&file, Path::new("WORKSPACE")).unwrap_err();
        assert!(matches!(
            err,
            EvalError::InterpolationOperand { line: 1, .. }
        ));
    }

    #[test]
    fn test_declarations_keep_source_order() {
        let decls = scan("a(name = \"1\")\nb(name = \"2\")\nc(name = \"3\")\n");
        let rules: Vec<&str> = decls.iter().map(|d| d.rule.as_str()).collect();
        assert_eq!(rules, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_int_kwarg_becomes_text() {
        let decls = scan("f(timeout = 600)\n");
        assert_eq!(decls[0].str_kwarg("timeout").unwrap().value, "600");
    }
}
