//! Loading source text into a [`Node`] tree.
//!
//! YAML goes through the marked-event parser so every node keeps its real
//! source position. JSON goes through serde_json; positions there default
//! to the start of the document, which is the best serde_json offers.

use crate::error::ParseError;
use crate::node::{Mark, Node, NodeKind};
use crate::scalar::Scalar;
use indexmap::IndexMap;
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// The serialization format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Guess the format from a file name. YAML is the superset, so it is
    /// the default for anything that is not clearly JSON.
    pub fn from_name(name: &str) -> Format {
        if name.rsplit('.').next().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            Format::Json
        } else {
            Format::Yaml
        }
    }
}

/// Parses document text into a [`Node`] tree.
pub fn parse(content: &str, format: Format) -> Result<Node, ParseError> {
    match format {
        Format::Yaml => parse_yaml(content),
        Format::Json => parse_json(content),
    }
}

// --- JSON ---

fn parse_json(content: &str) -> Result<Node, ParseError> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| ParseError::new(e.line().max(1), e.column().max(1), e.to_string()))?;
    Ok(from_json(&value))
}

fn from_json(value: &serde_json::Value) -> Node {
    let mark = Mark::default();
    match value {
        serde_json::Value::Null => Node::scalar(Scalar::Null, mark),
        serde_json::Value::Bool(b) => Node::scalar(Scalar::Bool(*b), mark),
        serde_json::Value::Number(n) => {
            let scalar = match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => Scalar::Float(n.as_f64().unwrap_or(f64::NAN)),
            };
            Node::scalar(scalar, mark)
        }
        serde_json::Value::String(s) => Node::scalar(Scalar::String(s.clone()), mark),
        serde_json::Value::Array(items) => {
            Node::sequence(items.iter().map(from_json).collect(), mark)
        }
        serde_json::Value::Object(map) => Node::mapping(
            map.iter().map(|(k, v)| (k.clone(), from_json(v))).collect(),
            mark,
        ),
    }
}

// --- YAML ---

fn parse_yaml(content: &str) -> Result<Node, ParseError> {
    let mut builder = TreeBuilder::default();
    let mut parser = Parser::new_from_str(content);
    parser.load(&mut builder, false).map_err(|e| {
        ParseError::new(e.marker().line(), e.marker().col() + 1, e.info().to_string())
    })?;
    if let Some(err) = builder.error {
        return Err(err);
    }
    builder
        .root
        .ok_or_else(|| ParseError::new(1, 1, "document is empty".to_string()))
}

enum Container {
    Mapping {
        map: IndexMap<String, Node>,
        mark: Mark,
        anchor: usize,
        pending_key: Option<String>,
    },
    Sequence {
        items: Vec<Node>,
        mark: Mark,
        anchor: usize,
    },
}

/// Builds the node tree from marked parser events. The first error wins;
/// later events are ignored once one is recorded.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Container>,
    root: Option<Node>,
    anchors: HashMap<usize, Node>,
    error: Option<ParseError>,
}

impl TreeBuilder {
    fn mark_of(marker: Marker) -> Mark {
        Mark {
            line: marker.line(),
            column: marker.col() + 1,
        }
    }

    fn fail(&mut self, mark: Mark, message: String) {
        if self.error.is_none() {
            self.error = Some(ParseError::new(mark.line, mark.column, message));
        }
    }

    /// True when the innermost container is a mapping waiting for a key.
    fn awaiting_key(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Container::Mapping {
                pending_key: None,
                ..
            })
        )
    }

    fn push_value(&mut self, node: Node) {
        let problem = match self.stack.last_mut() {
            None => {
                self.root = Some(node);
                None
            }
            Some(Container::Sequence { items, .. }) => {
                items.push(node);
                None
            }
            Some(Container::Mapping {
                map, pending_key, ..
            }) => match pending_key.take() {
                Some(key) => {
                    if map.contains_key(&key) {
                        Some((node.mark, format!("duplicate mapping key '{}'", key)))
                    } else {
                        map.insert(key, node);
                        None
                    }
                }
                // Key position: only scalar keys are supported.
                None => match &node.kind {
                    NodeKind::Scalar(s) => {
                        *pending_key = Some(scalar_key(s));
                        None
                    }
                    _ => Some((
                        node.mark,
                        "complex mapping keys are not supported".to_string(),
                    )),
                },
            },
        };
        if let Some((mark, message)) = problem {
            self.fail(mark, message);
        }
    }

    fn close_container(&mut self, container: Container) {
        let (node, anchor) = match container {
            Container::Mapping {
                map, mark, anchor, ..
            } => (Node::mapping(map, mark), anchor),
            Container::Sequence {
                items,
                mark,
                anchor,
            } => (Node::sequence(items, mark), anchor),
        };
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        self.push_value(node);
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        let mark = Self::mark_of(marker);
        match ev {
            Event::Scalar(value, style, anchor, tag) => {
                let scalar = typed_scalar(value, style, tag.as_ref());
                let node = Node::scalar(scalar, mark);
                if anchor > 0 {
                    self.anchors.insert(anchor, node.clone());
                }
                self.push_value(node);
            }
            Event::SequenceStart(anchor, _) => {
                if self.awaiting_key() {
                    self.fail(mark, "complex mapping keys are not supported".to_string());
                    return;
                }
                self.stack.push(Container::Sequence {
                    items: Vec::new(),
                    mark,
                    anchor,
                });
            }
            Event::MappingStart(anchor, _) => {
                if self.awaiting_key() {
                    self.fail(mark, "complex mapping keys are not supported".to_string());
                    return;
                }
                self.stack.push(Container::Mapping {
                    map: IndexMap::new(),
                    mark,
                    anchor,
                    pending_key: None,
                });
            }
            Event::SequenceEnd | Event::MappingEnd => {
                if let Some(container) = self.stack.pop() {
                    self.close_container(container);
                }
            }
            Event::Alias(anchor) => match self.anchors.get(&anchor).cloned() {
                Some(mut node) => {
                    node.mark = mark;
                    self.push_value(node);
                }
                None => self.fail(mark, "alias references an unknown anchor".to_string()),
            },
            Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd
            | Event::Nothing => {}
        }
    }
}

fn scalar_key(scalar: &Scalar) -> String {
    match scalar {
        Scalar::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolves a scalar event to a typed value. Quoted scalars are always
/// strings; plain scalars follow YAML core-schema resolution; explicit
/// `!!` tags override both.
fn typed_scalar(value: String, style: TScalarStyle, tag: Option<&Tag>) -> Scalar {
    if let Some(tag) = tag {
        match tag.suffix.as_str() {
            "str" => return Scalar::String(value),
            "null" => return Scalar::Null,
            "bool" => return value.parse().map(Scalar::Bool).unwrap_or(Scalar::String(value)),
            "int" => return value.parse().map(Scalar::Int).unwrap_or(Scalar::String(value)),
            "float" => {
                return value.parse().map(Scalar::Float).unwrap_or(Scalar::String(value));
            }
            _ => {}
        }
    }
    if style != TScalarStyle::Plain {
        return Scalar::String(value);
    }
    match value.as_str() {
        "~" | "null" | "Null" | "NULL" | "" => return Scalar::Null,
        "true" | "True" | "TRUE" => return Scalar::Bool(true),
        "false" | "False" | "FALSE" => return Scalar::Bool(false),
        _ => {}
    }
    if let Ok(i) = value.parse::<i64>() {
        return Scalar::Int(i);
    }
    if let Ok(f) = value.parse::<f64>() {
        return Scalar::Float(f);
    }
    Scalar::String(value)
}
