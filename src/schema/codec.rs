//! Schema ⇄ persisted record.
//!
//! Records are flat JSON maps with a mandatory `type` discriminator:
//!
//! ```text
//! { "type": "struct", "fields": [ { "name": "hp", "type": "int", ... }, ... ] }
//! { "type": "array", "element_type": {..}, "min_elements": 0, "max_elements": 4 }
//! { "type": "string", "pattern": "^[a-z]+$" }
//! { "type": "enum", "values": [ { "name": "Red", "id": 0 }, ... ] }
//! { "type": "int", "min_value": 0, "max_value": 10 }
//! { "type": "float", "min_value": 0.0, "max_value": 1.0 }
//! { "type": "bool" }
//! ```
//!
//! `save_schema` is total. `parse_schema` fails per node; how a failed struct
//! field affects its parent is governed by [`FieldFailurePolicy`].
use ordered_float::OrderedFloat;
use regex::Regex;
use serde_json::{Map, Number, Value};

use super::{
    ArraySchema, EnumSchema, EnumValue, Field, FloatSchema, IntSchema, Schema, SchemaKind,
    StringSchema, StructSchema,
};
use crate::error::ParseError;

// ------------------------------- Options ---------------------------------- //

/// What to do when one struct field fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldFailurePolicy {
    /// Drop the field, log it, keep its well-formed siblings.
    #[default]
    Skip,
    /// Fail the whole enclosing struct.
    Abort,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodecOptions {
    pub field_failure: FieldFailurePolicy,
}

// -------------------------------- Parse ----------------------------------- //

pub fn parse_schema(record: &Value) -> Result<Schema, ParseError> {
    parse_schema_with(record, CodecOptions::default())
}

pub fn parse_schema_with(record: &Value, opts: CodecOptions) -> Result<Schema, ParseError> {
    let map = record.as_object().ok_or(ParseError::NotARecord)?;
    let tag = map
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingType)?;
    let kind = tag
        .parse::<SchemaKind>()
        .map_err(ParseError::UnknownType)?;

    match kind {
        SchemaKind::Struct => parse_struct(map, opts).map(Schema::Struct),
        SchemaKind::Array => parse_array(map, opts).map(Schema::Array),
        SchemaKind::String => parse_string(map).map(Schema::String),
        SchemaKind::Enum => parse_enum(map).map(Schema::Enum),
        SchemaKind::Int => parse_int(map).map(Schema::Int),
        SchemaKind::Float => parse_float(map).map(Schema::Float),
        SchemaKind::Bool => Ok(Schema::Bool),
    }
}

fn parse_struct(map: &Map<String, Value>, opts: CodecOptions) -> Result<StructSchema, ParseError> {
    const KIND: SchemaKind = SchemaKind::Struct;
    // older records call the list `properties`
    let list = map
        .get("fields")
        .or_else(|| map.get("properties"))
        .ok_or(ParseError::MissingField { kind: KIND, field: "fields" })?
        .as_array()
        .ok_or(ParseError::InvalidField { kind: KIND, field: "fields" })?;

    let mut fields = Vec::with_capacity(list.len());
    for (idx, entry) in list.iter().enumerate() {
        match parse_named(entry, opts) {
            Ok(field) => fields.push(field),
            Err(error) => match opts.field_failure {
                FieldFailurePolicy::Skip => {
                    tracing::warn!(index = idx, %error, "skipping malformed struct field");
                }
                FieldFailurePolicy::Abort => {
                    let name = entry
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("#{idx}"));
                    return Err(ParseError::Field { name, source: Box::new(error) });
                }
            },
        }
    }
    Ok(StructSchema { fields })
}

fn parse_array(map: &Map<String, Value>, opts: CodecOptions) -> Result<ArraySchema, ParseError> {
    const KIND: SchemaKind = SchemaKind::Array;
    let element = map
        .get("element_type")
        .ok_or(ParseError::MissingField { kind: KIND, field: "element_type" })?;
    let element_type = parse_schema_with(element, opts)
        .map_err(|e| ParseError::ElementType(Box::new(e)))?;

    let defaults = ArraySchema::default();
    let min_elements = opt_u32(map, KIND, "min_elements")?.unwrap_or(defaults.min_elements);
    if min_elements > ArraySchema::MAX_MIN_ELEMENTS {
        return Err(ParseError::InvalidField { kind: KIND, field: "min_elements" });
    }
    Ok(ArraySchema {
        element_type: Box::new(element_type),
        min_elements,
        max_elements: opt_u32(map, KIND, "max_elements")?.unwrap_or(defaults.max_elements),
    })
}

fn parse_string(map: &Map<String, Value>) -> Result<StringSchema, ParseError> {
    let pattern = match map.get("pattern") {
        None => None,
        Some(Value::String(src)) => {
            let rx = Regex::new(src).map_err(|source| ParseError::InvalidPattern {
                pattern: src.clone(),
                source,
            })?;
            Some(rx)
        }
        Some(_) => {
            return Err(ParseError::InvalidField { kind: SchemaKind::String, field: "pattern" });
        }
    };
    Ok(StringSchema { pattern })
}

fn parse_enum(map: &Map<String, Value>) -> Result<EnumSchema, ParseError> {
    const KIND: SchemaKind = SchemaKind::Enum;
    let list = map
        .get("values")
        .ok_or(ParseError::MissingField { kind: KIND, field: "values" })?
        .as_array()
        .ok_or(ParseError::InvalidField { kind: KIND, field: "values" })?;

    let mut values = Vec::with_capacity(list.len());
    for (idx, entry) in list.iter().enumerate() {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .ok_or(ParseError::InvalidField { kind: KIND, field: "values" })?;
        // id defaults to list position
        let id = match entry.get("id") {
            None => idx as i64,
            Some(v) => as_integer(v).ok_or(ParseError::InvalidField { kind: KIND, field: "values" })?,
        };
        values.push(EnumValue { name: name.to_string(), id });
    }
    Ok(EnumSchema { values })
}

fn parse_int(map: &Map<String, Value>) -> Result<IntSchema, ParseError> {
    const KIND: SchemaKind = SchemaKind::Int;
    let defaults = IntSchema::default();
    let bound = |field: &'static str| -> Result<Option<i64>, ParseError> {
        map.get(field)
            .map(|v| as_integer(v).ok_or(ParseError::InvalidField { kind: KIND, field }))
            .transpose()
    };
    Ok(IntSchema {
        min_value: bound("min_value")?.unwrap_or(defaults.min_value),
        max_value: bound("max_value")?.unwrap_or(defaults.max_value),
    })
}

fn parse_float(map: &Map<String, Value>) -> Result<FloatSchema, ParseError> {
    const KIND: SchemaKind = SchemaKind::Float;
    let defaults = FloatSchema::default();
    let bound = |field: &'static str| -> Result<Option<OrderedFloat<f64>>, ParseError> {
        map.get(field)
            .map(|v| {
                v.as_f64()
                    .map(OrderedFloat)
                    .ok_or(ParseError::InvalidField { kind: KIND, field })
            })
            .transpose()
    };
    Ok(FloatSchema {
        min_value: bound("min_value")?.unwrap_or(defaults.min_value),
        max_value: bound("max_value")?.unwrap_or(defaults.max_value),
    })
}

/// A record carrying its own `name` alongside the schema keys.
fn parse_named(record: &Value, opts: CodecOptions) -> Result<Field, ParseError> {
    let name = record
        .get("name")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingName)?;
    let def = parse_schema_with(record, opts)?;
    Ok(Field { name: name.to_string(), def })
}

// Integers may arrive as integral floats from hosts that only store reals.
fn as_integer(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| {
        let f = v.as_f64()?;
        (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
    })
}

fn opt_u32(
    map: &Map<String, Value>,
    kind: SchemaKind,
    field: &'static str,
) -> Result<Option<u32>, ParseError> {
    map.get(field)
        .map(|v| {
            as_integer(v)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or(ParseError::InvalidField { kind, field })
        })
        .transpose()
}

// --------------------------------- Save ----------------------------------- //

pub fn save_schema(schema: &Schema) -> Value {
    Value::Object(save_map(schema))
}

fn save_map(schema: &Schema) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("type".into(), Value::from(schema.kind().as_str()));
    match schema {
        Schema::Struct(s) => {
            let fields = s.fields.iter().map(save_named).collect::<Vec<_>>();
            out.insert("fields".into(), Value::Array(fields));
        }
        Schema::Array(a) => {
            out.insert("element_type".into(), save_schema(&a.element_type));
            out.insert("min_elements".into(), Value::from(a.min_elements));
            out.insert("max_elements".into(), Value::from(a.max_elements));
        }
        Schema::String(s) => {
            if let Some(p) = s.pattern_str() {
                out.insert("pattern".into(), Value::from(p));
            }
        }
        Schema::Enum(e) => {
            let values = e
                .values
                .iter()
                .map(|v| serde_json::json!({ "name": v.name, "id": v.id }))
                .collect::<Vec<_>>();
            out.insert("values".into(), Value::Array(values));
        }
        Schema::Int(i) => {
            out.insert("min_value".into(), Value::from(i.min_value));
            out.insert("max_value".into(), Value::from(i.max_value));
        }
        Schema::Float(f) => {
            // non-finite bounds have no JSON form; absent means unbounded
            if let Some(n) = Number::from_f64(f.min_value.0) {
                out.insert("min_value".into(), Value::Number(n));
            }
            if let Some(n) = Number::from_f64(f.max_value.0) {
                out.insert("max_value".into(), Value::Number(n));
            }
        }
        Schema::Bool => {}
    }
    out
}

/// `{ "name": .., ...record }` with the name first.
pub fn save_named(field: &Field) -> Value {
    let mut out = Map::new();
    out.insert("name".into(), Value::from(field.name.clone()));
    out.extend(save_map(&field.def));
    Value::Object(out)
}

// ------------------------------ Root lists -------------------------------- //

/// Outcome of loading a list of named root records.
#[derive(Debug, Default)]
pub struct ParsedRoots {
    pub roots: Vec<Field>,
    /// Entries that were dropped, by position in the input list.
    pub skipped: Vec<(usize, ParseError)>,
}

/// Parse every entry of a root list, dropping (and logging) the ones that fail.
/// A non-list input yields nothing.
pub fn parse_roots(list: &Value) -> ParsedRoots {
    parse_roots_with(list, CodecOptions::default())
}

pub fn parse_roots_with(list: &Value, opts: CodecOptions) -> ParsedRoots {
    let mut out = ParsedRoots::default();
    let Some(entries) = list.as_array() else {
        tracing::warn!("schema root list is not a list; ignoring it");
        return out;
    };
    for (idx, entry) in entries.iter().enumerate() {
        match parse_named(entry, opts) {
            Ok(field) => out.roots.push(field),
            Err(error) => {
                tracing::warn!(index = idx, %error, entry = %entry, "error while parsing schema entry");
                out.skipped.push((idx, error));
            }
        }
    }
    out
}

pub fn save_roots(roots: &[Field]) -> Value {
    Value::Array(roots.iter().map(save_named).collect())
}

// ------------------------------- Tests ------------------------------------ //
