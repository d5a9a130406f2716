use std::fmt;

use serde_json::Value;

use super::{Schema, SchemaKind};
use crate::path::{display_path, Path, PathKey};

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: Path,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    TypeMismatch { expected: SchemaKind },
    PatternMismatch { pattern: String },
    IntOutOfRange { value: i64, min: i64, max: i64 },
    FloatOutOfRange { value: f64, min: f64, max: f64 },
    TooFewElements { len: usize, min: u32 },
    TooManyElements { len: usize, max: u32 },
    MissingField(String),
    UnknownField(String),
    UnknownEnumId(i64),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = display_path(&self.path);
        match &self.kind {
            ViolationKind::TypeMismatch { expected } => write!(f, "{at}: expected {expected}"),
            ViolationKind::PatternMismatch { pattern } => write!(f, "{at}: does not match `{pattern}`"),
            ViolationKind::IntOutOfRange { value, min, max } => {
                write!(f, "{at}: {value} outside [{min}, {max}]")
            }
            ViolationKind::FloatOutOfRange { value, min, max } => {
                write!(f, "{at}: {value} outside [{min}, {max}]")
            }
            ViolationKind::TooFewElements { len, min } => write!(f, "{at}: {len} elements, need at least {min}"),
            ViolationKind::TooManyElements { len, max } => write!(f, "{at}: {len} elements, allows at most {max}"),
            ViolationKind::MissingField(name) => write!(f, "{at}: missing field `{name}`"),
            ViolationKind::UnknownField(name) => write!(f, "{at}: undeclared field `{name}`"),
            ViolationKind::UnknownEnumId(id) => write!(f, "{at}: {id} is not a declared enum id"),
        }
    }
}

/// Every way `value` fails to satisfy `schema`, in depth-first order.
/// An empty result means the value conforms.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut path = Path::new();
    walk(schema, value, &mut path, &mut out);
    out
}

fn walk(schema: &Schema, value: &Value, path: &mut Path, out: &mut Vec<Violation>) {
    let mut report = |kind: ViolationKind, path: &Path| {
        out.push(Violation { path: path.clone(), kind });
    };
    let mismatch = ViolationKind::TypeMismatch { expected: schema.kind() };

    match schema {
        Schema::Struct(s) => {
            let Some(map) = value.as_object() else { return report(mismatch, path) };
            for field in &s.fields {
                if !map.contains_key(&field.name) {
                    report(ViolationKind::MissingField(field.name.clone()), path);
                }
            }
            for key in map.keys() {
                if s.field(key).is_none() {
                    report(ViolationKind::UnknownField(key.clone()), path);
                }
            }
            for field in &s.fields {
                if let Some(child) = map.get(&field.name) {
                    path.push(PathKey::Field(field.name.clone()));
                    walk(&field.def, child, path, out);
                    path.pop();
                }
            }
        }
        Schema::Array(a) => {
            let Some(list) = value.as_array() else { return report(mismatch, path) };
            if list.len() < a.min_elements as usize {
                report(ViolationKind::TooFewElements { len: list.len(), min: a.min_elements }, path);
            }
            if list.len() > a.max_elements as usize {
                report(ViolationKind::TooManyElements { len: list.len(), max: a.max_elements }, path);
            }
            for (idx, elem) in list.iter().enumerate() {
                path.push(PathKey::Index(idx));
                walk(&a.element_type, elem, path, out);
                path.pop();
            }
        }
        Schema::String(s) => {
            let Some(text) = value.as_str() else { return report(mismatch, path) };
            // search, not full match: anchors belong in the pattern
            if let Some(rx) = &s.pattern
                && !rx.is_match(text)
            {
                report(ViolationKind::PatternMismatch { pattern: rx.as_str().to_string() }, path);
            }
        }
        Schema::Enum(e) => {
            let Some(id) = value.as_i64() else { return report(mismatch, path) };
            if !e.contains_id(id) {
                report(ViolationKind::UnknownEnumId(id), path);
            }
        }
        Schema::Int(i) => {
            let Some(n) = value.as_i64() else { return report(mismatch, path) };
            if n < i.min_value || n > i.max_value {
                report(ViolationKind::IntOutOfRange { value: n, min: i.min_value, max: i.max_value }, path);
            }
        }
        Schema::Float(f) => {
            let Some(x) = value.as_f64() else { return report(mismatch, path) };
            let (min, max) = (f.min_value.0, f.max_value.0);
            if x < min || x > max {
                report(ViolationKind::FloatOutOfRange { value: x, min, max }, path);
            }
        }
        Schema::Bool => {
            if !value.is_boolean() {
                report(mismatch, path);
            }
        }
    }
}
