//! Dotted-path access to nested document fields.
//!
//! A field path is a dot-delimited sequence of segments, e.g.
//! `details.reviews.0.text`. A segment descends into a mapping by key; a
//! segment that parses as a non-negative integer descends into a sequence
//! by position. A top-level field whose literal name contains dots (a flat
//! legacy key) takes precedence over traversal.

use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::{QuiverError, Result};

/// What to do when a path does not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnMissing {
    /// Signal a missing-field error (the default).
    #[default]
    Raise,
    /// Resolve to JSON `null`.
    ReturnNull,
    /// Resolve to the empty string.
    ReturnEmptyString,
}

/// One step of a compiled field path.
///
/// Resolution is container-directed: against a mapping the raw key is used
/// even when it is numeric, against a sequence the parsed index is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    key: String,
    index: Option<usize>,
}

impl Segment {
    fn new(raw: &str) -> Self {
        Segment {
            key: raw.to_string(),
            index: raw.parse::<usize>().ok(),
        }
    }

    /// The raw segment text.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The segment as a sequence index, when it parses as one.
    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

/// A compiled dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    source: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Compile a dotted path string.
    pub fn parse(path: &str) -> Self {
        FieldPath {
            source: path.to_string(),
            segments: path.split('.').map(Segment::new).collect(),
        }
    }

    /// The original path string.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Resolve the path against a document, returning a reference.
    ///
    /// A direct top-level lookup of the literal path string takes precedence
    /// over segment traversal.
    pub fn resolve<'a>(&self, doc: &'a Document) -> Option<&'a Value> {
        if let Some(value) = doc.get(&self.source) {
            return Some(value);
        }
        let (first, rest) = self.segments.split_first()?;
        let mut current = doc.get(first.key())?;
        for segment in rest {
            current = descend(current, segment)?;
        }
        Some(current)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        FieldPath::parse(path)
    }
}

fn descend<'a>(value: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment.key()),
        Value::Array(items) => segment.index().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Get the value at `path` in `doc`.
///
/// On a non-resolving path the result is governed by `on_missing`; the
/// default policy raises [`QuiverError::MissingField`].
pub fn get_field(path: &str, doc: &Document, on_missing: OnMissing) -> Result<Value> {
    match FieldPath::parse(path).resolve(doc) {
        Some(value) => Ok(value.clone()),
        None => match on_missing {
            OnMissing::Raise => Err(QuiverError::missing_field(path)),
            OnMissing::ReturnNull => Ok(Value::Null),
            OnMissing::ReturnEmptyString => Ok(Value::String(String::new())),
        },
    }
}

/// Check whether `path` resolves in `doc`. All failures collapse to `false`.
pub fn field_exists(path: &str, doc: &Document) -> bool {
    FieldPath::parse(path).resolve(doc).is_some()
}

/// Set the value at `path` in `doc`, creating intermediate mappings.
///
/// Missing intermediate nodes are created as mappings; an intermediate
/// scalar in the way is replaced by a mapping. Sequence segments assign in
/// bounds (or append at the current length). The final segment is always
/// assigned, so setting the same path and value twice is idempotent.
pub fn set_field(path: &str, doc: &mut Document, value: Value) -> Result<()> {
    let compiled = FieldPath::parse(path);
    let segments = compiled.segments();
    // Top level of a document is always a mapping.
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| QuiverError::invalid_argument("empty field path"))?;
    if rest.is_empty() {
        doc.insert(first.key().to_string(), value);
        return Ok(());
    }
    let entry = doc
        .fields_mut()
        .entry(first.key().to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    set_in_value(entry, rest, value, path)
}

fn set_in_value(target: &mut Value, segments: &[Segment], value: Value, path: &str) -> Result<()> {
    let (segment, rest) = segments
        .split_first()
        .ok_or_else(|| QuiverError::internal(format!("exhausted segments for path '{path}'")))?;

    if rest.is_empty() {
        return assign(target, segment, value, path);
    }

    match target {
        Value::Array(items) if segment.index().is_some() => {
            let index = segment.index().unwrap_or_default();
            match items.get_mut(index) {
                Some(child) => set_in_value(child, rest, value, path),
                None => Err(QuiverError::missing_field(format!(
                    "{path}: index {index} out of bounds"
                ))),
            }
        }
        Value::Object(map) => {
            let child = map
                .entry(segment.key().to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() && !child.is_array() {
                *child = Value::Object(Map::new());
            }
            set_in_value(child, rest, value, path)
        }
        other => {
            *other = Value::Object(Map::new());
            set_in_value(other, segments, value, path)
        }
    }
}

fn assign(target: &mut Value, segment: &Segment, value: Value, path: &str) -> Result<()> {
    match target {
        Value::Array(items) if segment.index().is_some() => {
            let index = segment.index().unwrap_or_default();
            if index < items.len() {
                items[index] = value;
            } else if index == items.len() {
                items.push(value);
            } else {
                return Err(QuiverError::missing_field(format!(
                    "{path}: index {index} out of bounds"
                )));
            }
            Ok(())
        }
        Value::Object(map) => {
            map.insert(segment.key().to_string(), value);
            Ok(())
        }
        other => {
            let mut map = Map::new();
            map.insert(segment.key().to_string(), value);
            *other = Value::Object(map);
            Ok(())
        }
    }
}

/// Get `path` from every document in `docs`.
pub fn get_field_across(
    path: &str,
    docs: &[Document],
    on_missing: OnMissing,
) -> Result<Vec<Value>> {
    docs.iter()
        .map(|doc| get_field(path, doc, on_missing))
        .collect()
}

/// Set `path` in every document in `docs` from the parallel `values` list.
///
/// Fails fast when the lengths differ.
pub fn set_field_across(path: &str, docs: &mut [Document], values: Vec<Value>) -> Result<()> {
    if docs.len() != values.len() {
        return Err(QuiverError::invalid_argument(format!(
            "set_field_across: {} documents but {} values",
            docs.len(),
            values.len()
        )));
    }
    for (doc, value) in docs.iter_mut().zip(values) {
        set_field(path, doc, value)?;
    }
    Ok(())
}
