//! Payload path selector.
//!
//! A signature covers the sub-document of its link selected by a path
//! expression. Supported subset of the JMESPath grammar:
//!
//! ```text
//! expr     = primary *( "." rhs / "[" number "]" )
//! primary  = ident / "@" / "[" number "]" / "[" expr *( "," expr ) "]" / hash
//! rhs      = ident / "[" expr *( "," expr ) "]" / hash
//! hash     = "{" ident ":" expr *( "," ident ":" expr ) "}"
//! ident    = bare / quoted
//! ```
//!
//! Field names are matched with a case-insensitive first letter against the
//! camelCase schema names (`mapId`, `MapId`, `prevLinkHash`, ...). Selecting
//! a missing field, or anything on `null`, yields `null`. Unset scalars yield
//! their zero value; empty bytes and empty lists yield `null`.
//!
//! Paths arrive with untrusted segments, so the source length and the
//! nesting of multi-selects are bounded ([`MAX_PATH_LEN`], [`MAX_DEPTH`]).

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{Link, LinkMeta, LinkReference, Process, Signature};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Err.Path.Syntax: {message} at offset {offset} in {path:?}")]
    Syntax {
        path: String,
        offset: usize,
        message: String,
    },
    #[error("Err.Path.Encode: {0}")]
    Encode(String),
}

/// Longest accepted path source, in bytes.
pub const MAX_PATH_LEN: usize = 4096;

/// Deepest accepted nesting of multi-select lists and hashes.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Current,
    Field(String),
    Index(i64),
    /// `a.b[0].c`: each step is applied to the result of the previous one.
    Chain(Vec<Expr>),
    MultiList(Vec<Expr>),
    MultiHash(Vec<(String, Expr)>),
}

/// A parsed payload path.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadPath {
    source: String,
    expr: Expr,
}

impl PayloadPath {
    pub fn parse(source: &str) -> Result<Self, PathError> {
        let expr = Parser::new(source).parse()?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate against `link` and return the selected sub-document as JSON.
    pub fn select(&self, link: &Link) -> Result<Value, PathError> {
        to_value(&eval(&self.expr, &Node::Link(link)))
    }
}

impl FromStr for PayloadPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, PathError> {
        Self::parse(s)
    }
}

impl fmt::Display for PayloadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: Vec::new(),
            pos: 0,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Expr, PathError> {
        if self.src.len() > MAX_PATH_LEN {
            return Err(PathError::Syntax {
                path: self.src.chars().take(64).collect(),
                offset: MAX_PATH_LEN,
                message: format!("path longer than {MAX_PATH_LEN} bytes"),
            });
        }
        self.chars = self.src.char_indices().collect();
        self.skip_ws();
        let expr = self.expr()?;
        self.skip_ws();
        match self.peek() {
            None => Ok(expr),
            Some(c) => Err(self.error(format!("unexpected {c:?}"))),
        }
    }

    fn expr(&mut self) -> Result<Expr, PathError> {
        let mut steps = vec![self.primary()?];
        loop {
            self.skip_ws();
            match self.peek() {
                Some('.') => {
                    self.bump();
                    self.skip_ws();
                    steps.push(self.dot_rhs()?);
                }
                Some('[') if self.index_follows() => {
                    steps.push(Expr::Index(self.index()?));
                }
                _ => break,
            }
        }
        if steps.len() == 1 {
            Ok(steps.remove(0))
        } else {
            Ok(Expr::Chain(steps))
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, PathError>,
    ) -> Result<T, PathError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nesting deeper than {MAX_DEPTH}")));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn primary(&mut self) -> Result<Expr, PathError> {
        match self.peek() {
            Some('[') if self.index_follows() => Ok(Expr::Index(self.index()?)),
            Some('[') => self.multi_list(),
            Some('{') => self.multi_hash(),
            Some('@') => {
                self.bump();
                Ok(Expr::Current)
            }
            Some(_) => Ok(Expr::Field(self.identifier()?)),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn dot_rhs(&mut self) -> Result<Expr, PathError> {
        match self.peek() {
            Some('[') => self.multi_list(),
            Some('{') => self.multi_hash(),
            Some(_) => Ok(Expr::Field(self.identifier()?)),
            None => Err(self.error("expected identifier after '.'")),
        }
    }

    fn multi_list(&mut self) -> Result<Expr, PathError> {
        self.nested(|p| {
            p.expect('[')?;
            let mut items = Vec::new();
            loop {
                p.skip_ws();
                items.push(p.expr()?);
                p.skip_ws();
                match p.bump() {
                    Some(',') => continue,
                    Some(']') => return Ok(Expr::MultiList(items)),
                    _ => return Err(p.error("expected ',' or ']'")),
                }
            }
        })
    }

    fn multi_hash(&mut self) -> Result<Expr, PathError> {
        self.nested(|p| {
            p.expect('{')?;
            let mut pairs = Vec::new();
            loop {
                p.skip_ws();
                let key = p.identifier()?;
                p.skip_ws();
                p.expect(':')?;
                p.skip_ws();
                pairs.push((key, p.expr()?));
                p.skip_ws();
                match p.bump() {
                    Some(',') => continue,
                    Some('}') => return Ok(Expr::MultiHash(pairs)),
                    _ => return Err(p.error("expected ',' or '}'")),
                }
            }
        })
    }

    fn index(&mut self) -> Result<i64, PathError> {
        self.expect('[')?;
        self.skip_ws();
        let start = self.offset();
        if self.peek() == Some('-') {
            self.bump();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.src[start..self.offset()];
        let idx = text
            .parse::<i64>()
            .map_err(|_| self.error(format!("invalid index {text:?}")))?;
        self.skip_ws();
        self.expect(']')?;
        Ok(idx)
    }

    fn identifier(&mut self) -> Result<String, PathError> {
        match self.peek() {
            Some('"') => self.quoted_identifier(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let start = self.offset();
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                    self.bump();
                }
                Ok(self.src[start..self.offset()].to_string())
            }
            Some(c) => Err(self.error(format!("unexpected {c:?}, expected identifier"))),
            None => Err(self.error("expected identifier")),
        }
    }

    fn quoted_identifier(&mut self) -> Result<String, PathError> {
        let start = self.offset();
        self.expect('"')?;
        let mut escaped = false;
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated quoted identifier")),
                Some('\\') if !escaped => escaped = true,
                Some('"') if !escaped => break,
                Some(_) => escaped = false,
            }
        }
        let raw = &self.src[start..self.offset()];
        serde_json::from_str::<String>(raw).map_err(|e| self.error(format!("bad quoted identifier: {e}")))
    }

    fn index_follows(&self) -> bool {
        let mut i = self.pos + 1;
        while matches!(self.chars.get(i), Some((_, c)) if c.is_whitespace()) {
            i += 1;
        }
        matches!(self.chars.get(i), Some((_, c)) if *c == '-' || c.is_ascii_digit())
    }

    fn expect(&mut self, want: char) -> Result<(), PathError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            _ => Err(self.error(format!("expected {want:?}"))),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.src.len(), |(i, _)| *i)
    }

    fn error(&self, message: impl Into<String>) -> PathError {
        PathError::Syntax {
            path: self.src.to_string(),
            offset: self.offset(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Node<'a> {
    Null,
    Link(&'a Link),
    Meta(&'a LinkMeta),
    Process(&'a Process),
    Reference(&'a LinkReference),
    Signature(&'a Signature),
    List(Vec<Node<'a>>),
    Object(Vec<(String, Node<'a>)>),
    Json(Value),
}

fn eval<'a>(expr: &Expr, node: &Node<'a>) -> Node<'a> {
    match expr {
        Expr::Current => node.clone(),
        Expr::Field(name) => field(node, name),
        Expr::Index(i) => index(node, *i),
        Expr::Chain(steps) => {
            let mut current = node.clone();
            for step in steps {
                current = eval(step, &current);
            }
            current
        }
        Expr::MultiList(_) | Expr::MultiHash(_) if matches!(node, Node::Null) => Node::Null,
        Expr::MultiList(items) => Node::List(items.iter().map(|e| eval(e, node)).collect()),
        Expr::MultiHash(pairs) => Node::Object(
            pairs
                .iter()
                .map(|(k, e)| (k.clone(), eval(e, node)))
                .collect(),
        ),
    }
}

fn field<'a>(node: &Node<'a>, name: &str) -> Node<'a> {
    let key = schema_name(name);
    match node {
        Node::Link(l) => match key.as_str() {
            "version" => string(&l.version),
            "data" => bytes(&l.data),
            "meta" => l.meta.as_ref().map_or(Node::Null, Node::Meta),
            "signatures" => list(&l.signatures, Node::Signature),
            _ => Node::Null,
        },
        Node::Meta(m) => match key.as_str() {
            "clientId" => string(&m.client_id),
            "prevLinkHash" => bytes(&m.prev_link_hash),
            "priority" => Node::Json(Value::from(m.priority)),
            "refs" => list(&m.refs, Node::Reference),
            "process" => m.process.as_ref().map_or(Node::Null, Node::Process),
            "mapId" => string(&m.map_id),
            "action" => string(&m.action),
            "step" => string(&m.step),
            "tags" if m.tags.is_empty() => Node::Null,
            "tags" => Node::List(m.tags.iter().map(|t| string(t)).collect()),
            "data" => bytes(&m.data),
            _ => Node::Null,
        },
        Node::Process(p) => match key.as_str() {
            "name" => string(&p.name),
            "state" => string(&p.state),
            _ => Node::Null,
        },
        Node::Reference(r) => match key.as_str() {
            "linkHash" => bytes(&r.link_hash),
            "process" => string(&r.process),
            _ => Node::Null,
        },
        Node::Signature(s) => match key.as_str() {
            "version" => string(&s.version),
            "type" => string(&s.r#type),
            "payloadPath" => string(&s.payload_path),
            "publicKey" => bytes(&s.public_key),
            "signature" => bytes(&s.signature),
            _ => Node::Null,
        },
        // Keys produced by a multi-select hash are matched exactly.
        Node::Object(entries) => entries
            .iter()
            .find(|(k, _)| k == name)
            .map_or(Node::Null, |(_, v)| v.clone()),
        Node::Json(Value::Object(map)) => map.get(name).cloned().map_or(Node::Null, Node::Json),
        _ => Node::Null,
    }
}

fn index<'a>(node: &Node<'a>, i: i64) -> Node<'a> {
    let resolve = |len: usize| -> Option<usize> {
        let len = i64::try_from(len).ok()?;
        let idx = if i < 0 { len + i } else { i };
        (0..len).contains(&idx).then(|| idx as usize)
    };
    match node {
        Node::List(items) => resolve(items.len())
            .and_then(|idx| items.get(idx).cloned())
            .unwrap_or(Node::Null),
        Node::Json(Value::Array(items)) => resolve(items.len())
            .and_then(|idx| items.get(idx).cloned())
            .map_or(Node::Null, Node::Json),
        _ => Node::Null,
    }
}

/// `MapId` and `mapId` both name the `mapId` field.
fn schema_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn string<'a>(s: &str) -> Node<'a> {
    Node::Json(Value::String(s.to_string()))
}

fn bytes<'a>(b: &[u8]) -> Node<'a> {
    if b.is_empty() {
        Node::Null
    } else {
        Node::Json(Value::String(STANDARD.encode(b)))
    }
}

fn list<'a, T>(items: &'a [T], wrap: fn(&'a T) -> Node<'a>) -> Node<'a> {
    if items.is_empty() {
        Node::Null
    } else {
        Node::List(items.iter().map(wrap).collect())
    }
}

fn to_value(node: &Node<'_>) -> Result<Value, PathError> {
    match node {
        Node::Null => Ok(Value::Null),
        Node::Link(l) => json(l),
        Node::Meta(m) => json(m),
        Node::Process(p) => json(p),
        Node::Reference(r) => json(r),
        Node::Signature(s) => json(s),
        Node::List(items) => items
            .iter()
            .map(to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Node::Object(entries) => {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k.clone(), to_value(v)?);
            }
            Ok(Value::Object(map))
        }
        Node::Json(v) => Ok(v.clone()),
    }
}

fn json<T: Serialize>(value: &T) -> Result<Value, PathError> {
    serde_json::to_value(value).map_err(|e| PathError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Link {
        Link {
            version: "1.0.0".into(),
            data: b"{}".to_vec(),
            meta: Some(LinkMeta {
                client_id: "client".into(),
                map_id: "map".into(),
                priority: 0.5,
                process: Some(Process {
                    name: "p1".into(),
                    state: String::new(),
                }),
                refs: vec![
                    LinkReference::new(vec![1], "p1"),
                    LinkReference::new(vec![2], "p2"),
                ],
                tags: vec!["a".into(), "b".into()],
                ..Default::default()
            }),
            signatures: vec![],
        }
    }

    fn select(path: &str, link: &Link) -> Value {
        PayloadPath::parse(path).unwrap().select(link).unwrap()
    }

    #[test]
    fn dotted_fields_and_first_letter_case() {
        let link = sample();
        assert_eq!(select("meta.mapId", &link), json!("map"));
        assert_eq!(select("Meta.MapId", &link), json!("map"));
        assert_eq!(select("meta.process.name", &link), json!("p1"));
        assert_eq!(select("meta.\"mapId\"", &link), json!("map"));
        assert_eq!(select("meta.mapID", &link), Value::Null);
    }

    #[test]
    fn zero_values_and_missing_fields() {
        let link = sample();
        assert_eq!(select("meta.action", &link), json!(""));
        assert_eq!(select("meta.prevLinkHash", &link), Value::Null);
        assert_eq!(select("signatures", &link), Value::Null);
        assert_eq!(select("meta.nope.deeper", &link), Value::Null);
        assert_eq!(select("meta.process.state", &link), json!(""));
        assert_eq!(select("meta.[mapId]", &Link::default()), Value::Null);
    }

    #[test]
    fn multi_select_list_serializes_entities_through_json_view() {
        let link = sample();
        let v = select("[version, data, meta.process]", &link);
        assert_eq!(v, json!(["1.0.0", "e30=", {"name": "p1"}]));
    }

    #[test]
    fn multi_select_hash_and_indexes() {
        let link = sample();
        assert_eq!(
            select("{m: meta.mapId, first: meta.refs[0].process}", &link),
            json!({"m": "map", "first": "p1"})
        );
        assert_eq!(select("meta.refs[-1].linkHash", &link), json!("Ag=="));
        assert_eq!(select("meta.tags[1]", &link), json!("b"));
        assert_eq!(select("meta.tags[5]", &link), Value::Null);
        assert_eq!(select("meta.priority", &link), json!(0.5));
    }

    #[test]
    fn syntax_errors_are_reported() {
        for bad in ["", "not a JMESPATH", "[version", "meta.", "{k meta}", "a[1", "[]", "\"open"] {
            let err = PayloadPath::parse(bad).unwrap_err();
            assert!(matches!(err, PathError::Syntax { .. }), "{bad:?} -> {err:?}");
        }
    }

    #[test]
    fn long_dotted_chains_evaluate_iteratively() {
        let link = sample();
        let path = format!("meta{}", ".process".repeat(500));
        assert!(path.len() <= MAX_PATH_LEN);
        assert_eq!(select(&path, &link), Value::Null);
        assert_eq!(select("meta.refs[1].process", &link), json!("p2"));
    }

    #[test]
    fn oversized_paths_are_rejected() {
        let long = vec!["meta"; 500_000].join(".");
        let err = PayloadPath::parse(&long).unwrap_err();
        match err {
            PathError::Syntax { path, offset, .. } => {
                assert_eq!(offset, MAX_PATH_LEN);
                assert!(path.len() < 100);
            }
            other => panic!("unexpected {other:?}"),
        }
        let deep = format!("{}version{}", "[".repeat(200_000), "]".repeat(200_000));
        assert!(matches!(PayloadPath::parse(&deep), Err(PathError::Syntax { .. })));
    }

    #[test]
    fn nesting_is_bounded() {
        let ok = format!("{}version{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        let link = sample();
        let mut want = json!("1.0.0");
        for _ in 0..MAX_DEPTH {
            want = json!([want]);
        }
        assert_eq!(select(&ok, &link), want);

        let too_deep = format!("{}version{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        let err = PayloadPath::parse(&too_deep).unwrap_err();
        assert!(err.to_string().contains("nesting"), "{err}");

        let hashes = format!("{}version{}", "{k:".repeat(MAX_DEPTH + 1), "}".repeat(MAX_DEPTH + 1));
        assert!(matches!(PayloadPath::parse(&hashes), Err(PathError::Syntax { .. })));
    }

    #[test]
    fn source_is_preserved() {
        let p: PayloadPath = "[version,meta.mapId]".parse().unwrap();
        assert_eq!(p.as_str(), "[version,meta.mapId]");
        assert_eq!(p.to_string(), "[version,meta.mapId]");
    }
}
