//! Graph dumps: one edge per line, `source\ttarget\t{props}`, where props is
//! a Python-literal dict such as `{'weight': 1.0, 'dependencies': ['A', 'B']}`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, instrument};

use conceptdb_core::errors::{ConceptDbResult, PropagationError};
use conceptdb_core::ReasonId;

use super::{BeliefGraph, EdgeSpec};

/// Write every edge of `graph` in edge order.
pub fn write_graph<W: Write>(graph: &BeliefGraph, out: &mut W) -> ConceptDbResult<()> {
    for spec in graph.to_edge_specs() {
        writeln!(out, "{}", format_edge(&spec)?)?;
    }
    Ok(())
}

/// Read a dump. Blank lines are skipped; a line without a props field is an
/// edge of weight 1.
pub fn read_graph<R: BufRead>(input: R) -> ConceptDbResult<BeliefGraph> {
    let mut specs = Vec::new();
    for (number, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        specs.push(parse_edge(&line, number + 1)?);
    }
    Ok(BeliefGraph::from_edges(specs))
}

#[instrument(skip(graph), fields(edges = graph.edge_count()))]
pub fn save_graph(graph: &BeliefGraph, path: &Path) -> ConceptDbResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_graph(graph, &mut out)?;
    out.flush()?;
    debug!("graph written");
    Ok(())
}

#[instrument]
pub fn load_graph(path: &Path) -> ConceptDbResult<BeliefGraph> {
    let graph = read_graph(BufReader::new(File::open(path)?))?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}

/// Render one edge line, without the newline. Node names are written bare,
/// so a source or target containing a tab or line break is refused.
pub fn format_edge(spec: &EdgeSpec) -> ConceptDbResult<String> {
    for node in [&spec.source, &spec.target] {
        let name = node.to_string();
        if name.contains(['\t', '\n', '\r']) {
            return Err(PropagationError::UnwritableNode { node: name }.into());
        }
    }
    let mut props = format!("{{'weight': {:?}", spec.weight);
    if let Some(deps) = &spec.dependencies {
        let items: Vec<String> = deps.iter().map(|d| quote(&d.to_string())).collect();
        props.push_str(&format!(", 'dependencies': [{}]", items.join(", ")));
    }
    props.push('}');
    Ok(format!("{}\t{}\t{}", spec.source, spec.target, props))
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Parse one non-blank line. `line` is the 1-based line number for errors.
pub fn parse_edge(text: &str, line: usize) -> ConceptDbResult<EdgeSpec> {
    let format_error = |reason: String| PropagationError::GraphFormat { line, reason };

    let text = text.trim_end_matches(['\r', '\n']);
    let mut fields = text.splitn(3, '\t');
    let source = fields.next().unwrap_or_default();
    let target = fields
        .next()
        .ok_or_else(|| format_error("expected source and target separated by a tab".into()))?;
    if source.is_empty() || target.is_empty() {
        return Err(format_error("empty node name".into()).into());
    }

    let mut spec = EdgeSpec::new(source, target, 1.0);
    let Some(props) = fields.next() else {
        return Ok(spec);
    };

    let value = LiteralParser::new(props)
        .parse_all()
        .map_err(format_error)?;
    let Literal::Dict(entries) = value else {
        return Err(format_error("edge properties must be a dict".into()).into());
    };
    for (key, value) in entries {
        match (key.as_str(), value) {
            ("weight", Literal::Number(w)) => spec.weight = w,
            ("weight", _) => return Err(format_error("weight must be a number".into()).into()),
            ("dependencies", Literal::Sequence(items)) => {
                let deps = items
                    .into_iter()
                    .map(|item| match item {
                        Literal::Str(s) => Ok(ReasonId::parse(&s)),
                        _ => Err(format_error("dependencies must be strings".into())),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                spec.dependencies = Some(deps);
            }
            ("dependencies", Literal::None) => spec.dependencies = None,
            ("dependencies", _) => {
                return Err(format_error("dependencies must be a list or tuple".into()).into())
            }
            _ => {}
        }
    }
    if !spec.weight.is_finite() {
        return Err(format_error("weight is not finite".into()).into());
    }
    Ok(spec)
}

/// The subset of Python literals that shows up in edge properties.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    Number(f64),
    Bool,
    None,
    Sequence(Vec<Literal>),
    Dict(Vec<(String, Literal)>),
}

struct LiteralParser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> LiteralParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn parse_all(mut self) -> Result<Literal, String> {
        let value = self.value()?;
        self.skip_ws();
        match self.chars.next() {
            None => Ok(value),
            Some(c) => Err(format!("unexpected '{c}' after value")),
        }
    }

    fn skip_ws(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), String> {
        self.skip_ws();
        match self.chars.next() {
            Some(c) if c == wanted => Ok(()),
            Some(c) => Err(format!("expected '{wanted}', found '{c}'")),
            None => Err(format!("expected '{wanted}', found end of line")),
        }
    }

    fn value(&mut self) -> Result<Literal, String> {
        self.skip_ws();
        match self.chars.peek().copied() {
            Some('{') => self.dict(),
            Some('[') => self.sequence('[', ']'),
            Some('(') => self.sequence('(', ')'),
            Some('\'') | Some('"') => self.string().map(Literal::Str),
            Some('u') | Some('U') => {
                self.chars.next();
                match self.chars.peek() {
                    Some('\'') | Some('"') => self.string().map(Literal::Str),
                    _ => Err("unexpected identifier".into()),
                }
            }
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            Some(c) => Err(format!("unexpected '{c}'")),
            None => Err("unexpected end of line".into()),
        }
    }

    fn dict(&mut self) -> Result<Literal, String> {
        self.expect('{')?;
        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            if self.chars.peek() == Some(&'}') {
                self.chars.next();
                return Ok(Literal::Dict(entries));
            }
            let key = match self.value()? {
                Literal::Str(s) => s,
                other => return Err(format!("dict keys must be strings, found {other:?}")),
            };
            self.expect(':')?;
            let value = self.value()?;
            entries.push((key, value));
            self.skip_ws();
            match self.chars.next() {
                Some(',') => {}
                Some('}') => return Ok(Literal::Dict(entries)),
                Some(c) => return Err(format!("expected ',' or '}}', found '{c}'")),
                None => return Err("unterminated dict".into()),
            }
        }
    }

    fn sequence(&mut self, open: char, close: char) -> Result<Literal, String> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.chars.peek() == Some(&close) {
                self.chars.next();
                return Ok(Literal::Sequence(items));
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.chars.next() {
                Some(',') => {}
                Some(c) if c == close => return Ok(Literal::Sequence(items)),
                Some(c) => return Err(format!("expected ',' or '{close}', found '{c}'")),
                None => return Err("unterminated sequence".into()),
            }
        }
    }

    fn string(&mut self) -> Result<String, String> {
        let quote = self.chars.next().ok_or("expected a string")?;
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err("unterminated string".into()),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('"') => out.push('"'),
                    Some('x') => out.push(self.code_point(2)?),
                    Some('u') => out.push(self.code_point(4)?),
                    Some('U') => out.push(self.code_point(8)?),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err("unterminated escape".into()),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn code_point(&mut self, digits: usize) -> Result<char, String> {
        let hex: String = (0..digits).filter_map(|_| self.chars.next()).collect();
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("bad escape '{hex}'"))
    }

    fn number(&mut self) -> Result<Literal, String> {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_') {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        text.parse::<f64>()
            .map(Literal::Number)
            .map_err(|_| format!("bad number '{text}'"))
    }

    fn keyword(&mut self) -> Result<Literal, String> {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match word.as_str() {
            "True" | "False" => Ok(Literal::Bool),
            "None" => Ok(Literal::None),
            other => Err(format!("unknown name '{other}'")),
        }
    }
}
