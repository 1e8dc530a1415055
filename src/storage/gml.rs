//! GML graph store.
//!
//! Writes the layout networkx uses for an undirected graph whose nodes carry
//! a `pos` tuple and a `type` string:
//!
//! ```text
//! graph [
//!   node [
//!     id 17
//!     label "17"
//!     pos 103.25
//!     pos 88.5
//!     type "Killer T cell"
//!   ]
//!   edge [
//!     source 17
//!     target 18
//!   ]
//! ]
//! ```
//!
//! The reader accepts any GML of that shape: `#` comments, unknown keys and
//! integer-valued coordinates are fine; directed or multigraph files are not.

use std::io::{Read, Write};

use tracing::debug;

use super::GraphStore;
use crate::model::{CellId, CellNode, Phenotype, SpatialGraph};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct GmlStore;

impl GraphStore for GmlStore {
    fn save(&self, graph: &SpatialGraph, writer: &mut dyn Write) -> Result<()> {
        writeln!(writer, "graph [")?;
        for node in graph.nodes() {
            writeln!(writer, "  node [")?;
            writeln!(writer, "    id {}", node.id)?;
            writeln!(writer, "    label \"{}\"", node.id)?;
            writeln!(writer, "    pos {}", format_real(node.x))?;
            writeln!(writer, "    pos {}", format_real(node.y))?;
            writeln!(writer, "    type \"{}\"", node.phenotype)?;
            writeln!(writer, "  ]")?;
        }
        for (i, j) in graph.edges() {
            writeln!(writer, "  edge [")?;
            writeln!(writer, "    source {}", graph.node(i).id)?;
            writeln!(writer, "    target {}", graph.node(j).id)?;
            writeln!(writer, "  ]")?;
        }
        writeln!(writer, "]")?;

        debug!(nodes = graph.len(), edges = graph.edge_count(), "wrote GML graph");
        Ok(())
    }

    fn load(&self, reader: &mut dyn Read) -> Result<SpatialGraph> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let graph = parse_graph(&text)?;
        debug!(nodes = graph.len(), edges = graph.edge_count(), "read GML graph");
        Ok(graph)
    }
}

/// Shortest round-trip representation, always with a decimal point so
/// GML readers classify it as a real.
fn format_real(v: f64) -> String {
    let s = format!("{v:?}");
    if s.contains('.') || !s.contains('e') {
        s
    } else {
        s.replacen('e', ".0e", 1)
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Key(String),
    Int(i128),
    Real(f64),
    Str(String),
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    line: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while let Some(&ch) = chars.peek() {
        match ch {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while chars.peek().is_some_and(|&c| c != '\n') {
                    chars.next();
                }
            }
            '[' => {
                chars.next();
                tokens.push(Token { kind: TokenKind::Open, line });
            }
            ']' => {
                chars.next();
                tokens.push(Token { kind: TokenKind::Close, line });
            }
            '"' => {
                chars.next();
                let start = line;
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            s.push(c);
                        }
                        None => {
                            return Err(Error::Parse { line: start, message: "unterminated string".into() });
                        }
                    }
                }
                tokens.push(Token { kind: TokenKind::Str(unescape(&s)), line: start });
            }
            c if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => {
                let mut s = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E') {
                        s.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token { kind: number(&s, line)?, line });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut s = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        s.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token { kind: TokenKind::Key(s), line });
            }
            other => {
                return Err(Error::Parse { line, message: format!("unexpected character {other:?}") });
            }
        }
    }

    Ok(tokens)
}

fn number(s: &str, line: usize) -> Result<TokenKind> {
    let invalid = || Error::Parse { line, message: format!("invalid number {s:?}") };
    if s.contains(['.', 'e', 'E']) {
        s.parse::<f64>().map(TokenKind::Real).map_err(|_| invalid())
    } else {
        s.parse::<i128>().map(TokenKind::Int).map_err(|_| invalid())
    }
}

/// Decode XML character references. networkx writes `&`, `"` and every
/// non-ASCII character as numeric references (`&#34;`); the named forms are
/// accepted too. Anything that is not a valid reference is kept verbatim.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "quot" => Some('"'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum GmlValue {
    Int(i128),
    Real(f64),
    Str(String),
    List(Vec<Entry>),
}

impl GmlValue {
    fn as_real(&self) -> Option<f64> {
        match *self {
            GmlValue::Int(i) => Some(i as f64),
            GmlValue::Real(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: String,
    value: GmlValue,
    line: usize,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse_list(&mut self, open_line: Option<usize>) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        loop {
            let Some(tok) = self.tokens.get(self.pos) else {
                return match open_line {
                    Some(line) => Err(Error::Parse { line, message: "unclosed '['".into() }),
                    None => Ok(entries),
                };
            };
            let (kind, line) = (tok.kind.clone(), tok.line);
            self.pos += 1;
            match kind {
                TokenKind::Close if open_line.is_some() => return Ok(entries),
                TokenKind::Close => {
                    return Err(Error::Parse { line, message: "unbalanced ']'".into() });
                }
                TokenKind::Key(key) => {
                    let value = self.parse_value(line)?;
                    entries.push(Entry { key, value, line });
                }
                other => {
                    return Err(Error::Parse { line, message: format!("expected a key, found {other:?}") });
                }
            }
        }
    }

    fn parse_value(&mut self, key_line: usize) -> Result<GmlValue> {
        let Some(tok) = self.tokens.get(self.pos) else {
            return Err(Error::Parse { line: key_line, message: "key without a value".into() });
        };
        let (kind, line) = (tok.kind.clone(), tok.line);
        self.pos += 1;
        match kind {
            TokenKind::Int(i) => Ok(GmlValue::Int(i)),
            TokenKind::Real(r) => Ok(GmlValue::Real(r)),
            TokenKind::Str(s) => Ok(GmlValue::Str(s)),
            TokenKind::Open => Ok(GmlValue::List(self.parse_list(Some(line))?)),
            other => Err(Error::Parse { line, message: format!("expected a value, found {other:?}") }),
        }
    }
}

fn malformed(reason: String) -> Error {
    Error::MalformedGraph { reason }
}

fn parse_graph(text: &str) -> Result<SpatialGraph> {
    let mut parser = Parser { tokens: tokenize(text)?, pos: 0 };
    let document = parser.parse_list(None)?;

    let graph = document
        .into_iter()
        .find(|e| e.key == "graph")
        .ok_or_else(|| malformed("no top-level graph block".into()))?;
    let GmlValue::List(entries) = graph.value else {
        return Err(Error::Parse { line: graph.line, message: "graph must be a list".into() });
    };

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for entry in entries {
        let line = entry.line;
        match (entry.key.as_str(), entry.value) {
            ("node", GmlValue::List(attrs)) => nodes.push(node_from(attrs, line)?),
            ("edge", GmlValue::List(attrs)) => edges.push(edge_from(attrs, line)?),
            (key @ ("node" | "edge"), _) => {
                return Err(Error::Parse { line, message: format!("{key} must be a list") });
            }
            (key @ ("directed" | "multigraph"), GmlValue::Int(flag)) if flag != 0 => {
                return Err(malformed(format!("{key} graphs are not supported")));
            }
            _ => {}
        }
    }

    SpatialGraph::from_parts(nodes, edges)
}

fn cell_id(value: GmlValue, what: &str, line: usize) -> Result<CellId> {
    match value {
        GmlValue::Int(i) => u64::try_from(i)
            .map(CellId)
            .map_err(|_| malformed(format!("{what} at line {line} is out of range: {i}"))),
        other => Err(malformed(format!("{what} at line {line} must be an integer, found {other:?}"))),
    }
}

fn node_from(attrs: Vec<Entry>, line: usize) -> Result<CellNode> {
    let mut id = None;
    let mut pos = Vec::with_capacity(2);
    let mut phenotype = None;

    for attr in attrs {
        match attr.key.as_str() {
            "id" => id = Some(cell_id(attr.value, "node id", attr.line)?),
            "pos" => pos.push(attr.value.as_real().ok_or_else(|| {
                malformed(format!("node position at line {} must be numeric", attr.line))
            })?),
            "type" => {
                let GmlValue::Str(label) = attr.value else {
                    return Err(malformed(format!("node type at line {} must be a string", attr.line)));
                };
                let parsed = label.parse::<Phenotype>().map_err(|_| {
                    malformed(format!("node at line {line} has unknown phenotype {label:?}"))
                })?;
                phenotype = Some(parsed);
            }
            _ => {}
        }
    }

    let id = id.ok_or_else(|| malformed(format!("node at line {line} has no id")))?;
    let &[x, y] = pos.as_slice() else {
        return Err(malformed(format!("node {id} needs exactly two pos values, found {}", pos.len())));
    };
    let phenotype = phenotype.ok_or_else(|| malformed(format!("node {id} has no type")))?;
    Ok(CellNode { id, x, y, phenotype })
}

fn edge_from(attrs: Vec<Entry>, line: usize) -> Result<(CellId, CellId)> {
    let mut source = None;
    let mut target = None;
    for attr in attrs {
        match attr.key.as_str() {
            "source" => source = Some(cell_id(attr.value, "edge source", attr.line)?),
            "target" => target = Some(cell_id(attr.value, "edge target", attr.line)?),
            _ => {}
        }
    }
    match (source, target) {
        (Some(s), Some(t)) => Ok((s, t)),
        _ => Err(malformed(format!("edge at line {line} needs a source and a target"))),
    }
}

// ============================================================================
// Tests
// ============================================================================
