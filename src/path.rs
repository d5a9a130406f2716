//! Path-addressed reads and mutations over nested JSON values.
//!
//! A path is a sequence of keys; a field key selects a map entry, an index key
//! selects a list slot. Every operation either applies completely or returns a
//! [`PathError`] with the tree untouched. Nothing off the addressed path is
//! read-modified.
use std::fmt;

use serde_json::Value;

use crate::error::PathError;

pub type Path = Vec<PathKey>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    Field(String),
    Index(usize),
    /// One past the end of a list. Only meaningful as the last key of a
    /// [`write`]; hosts spell it `-1`.
    Append,
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        PathKey::Field(name.to_string())
    }
}

impl From<String> for PathKey {
    fn from(name: String) -> Self {
        PathKey::Field(name)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

impl TryFrom<&Value> for PathKey {
    type Error = PathError;

    /// Hosts hand paths over as loosely typed lists; only strings and
    /// non-negative integers are keys.
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::String(s) => Ok(PathKey::Field(s.clone())),
            Value::Number(n) if n.as_i64() == Some(-1) => Ok(PathKey::Append),
            Value::Number(n) => n
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .map(PathKey::Index)
                .ok_or_else(|| PathError::InvalidKeyType(n.to_string())),
            other => Err(PathError::InvalidKeyType(type_name(other).to_string())),
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Field(name) => write!(f, "{name}"),
            PathKey::Index(i) => write!(f, "{i}"),
            PathKey::Append => f.write_str("-"),
        }
    }
}

/// Parse a host-supplied list of keys.
pub fn parse_path(list: &Value) -> Result<Path, PathError> {
    match list {
        Value::Array(keys) => keys.iter().map(PathKey::try_from).collect(),
        other => Err(PathError::InvalidKeyType(type_name(other).to_string())),
    }
}

/// JSON-pointer-ish rendering, `/` for the root.
pub fn display_path(path: &[PathKey]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter().map(|k| format!("/{k}")).collect()
}

/// Where `insert_element` puts the new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    At(usize),
    End,
}

impl Position {
    /// Map the host's integer convention: `-1` appends, other negatives are
    /// rejected.
    pub fn from_sentinel(pos: i64) -> Result<Self, PathError> {
        match pos {
            -1 => Ok(Position::End),
            p if p >= 0 => usize::try_from(p)
                .map(Position::At)
                .map_err(|_| PathError::InvalidPosition(pos)),
            _ => Err(PathError::InvalidPosition(pos)),
        }
    }
}

// ------------------------------- Descent ---------------------------------- //

fn step<'a>(node: &'a Value, key: &PathKey, depth: usize) -> Result<&'a Value, PathError> {
    match key {
        PathKey::Field(name) => node
            .as_object()
            .ok_or(PathError::NotAMap { depth })?
            .get(name)
            .ok_or_else(|| PathError::MissingField { depth, name: name.clone() }),
        PathKey::Index(index) => {
            let list = node.as_array().ok_or(PathError::NotAList { depth })?;
            list.get(*index).ok_or(PathError::IndexOutOfRange {
                depth,
                index: *index,
                len: list.len(),
            })
        }
        PathKey::Append => Err(PathError::MisplacedAppend { depth }),
    }
}

fn step_mut<'a>(node: &'a mut Value, key: &PathKey, depth: usize) -> Result<&'a mut Value, PathError> {
    match key {
        PathKey::Field(name) => node
            .as_object_mut()
            .ok_or(PathError::NotAMap { depth })?
            .get_mut(name)
            .ok_or_else(|| PathError::MissingField { depth, name: name.clone() }),
        PathKey::Index(index) => {
            let list = node.as_array_mut().ok_or(PathError::NotAList { depth })?;
            let len = list.len();
            list.get_mut(*index)
                .ok_or(PathError::IndexOutOfRange { depth, index: *index, len })
        }
        PathKey::Append => Err(PathError::MisplacedAppend { depth }),
    }
}

pub fn read<'a>(root: &'a Value, path: &[PathKey]) -> Result<&'a Value, PathError> {
    let mut current = root;
    for (depth, key) in path.iter().enumerate() {
        current = step(current, key, depth)?;
    }
    Ok(current)
}

pub fn read_mut<'a>(root: &'a mut Value, path: &[PathKey]) -> Result<&'a mut Value, PathError> {
    let mut current = root;
    for (depth, key) in path.iter().enumerate() {
        current = step_mut(current, key, depth)?;
    }
    Ok(current)
}

// ------------------------------ Mutation ---------------------------------- //

/// Replace the value at `path`. The addressed slot must already exist,
/// except that a trailing [`PathKey::Append`] pushes onto the list. An empty
/// path replaces the root.
pub fn write(root: &mut Value, path: &[PathKey], value: Value) -> Result<(), PathError> {
    let Some((last, parent_path)) = path.split_last() else {
        *root = value;
        return Ok(());
    };
    let parent = read_mut(root, parent_path)?;
    if *last == PathKey::Append {
        let depth = parent_path.len();
        parent.as_array_mut().ok_or(PathError::NotAList { depth })?.push(value);
        return Ok(());
    }
    let slot = step_mut(parent, last, parent_path.len())?;
    *slot = value;
    Ok(())
}

/// Insert into the list at `path`.
pub fn insert_element(
    root: &mut Value,
    path: &[PathKey],
    value: Value,
    pos: Position,
) -> Result<(), PathError> {
    let depth = path.len();
    let list = read_mut(root, path)?
        .as_array_mut()
        .ok_or(PathError::NotAList { depth })?;
    match pos {
        Position::End => list.push(value),
        Position::At(index) if index <= list.len() => list.insert(index, value),
        Position::At(index) => {
            return Err(PathError::IndexOutOfRange { depth, index, len: list.len() });
        }
    }
    Ok(())
}

/// Remove and return the list entry at `index` of the list at `path`.
pub fn remove_element(root: &mut Value, path: &[PathKey], index: usize) -> Result<Value, PathError> {
    let depth = path.len();
    let list = read_mut(root, path)?
        .as_array_mut()
        .ok_or(PathError::NotAList { depth })?;
    if index >= list.len() {
        return Err(PathError::IndexOutOfRange { depth, index, len: list.len() });
    }
    Ok(list.remove(index))
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ------------------------------- Tests ------------------------------------ //
