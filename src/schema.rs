//! Typed schema tree.
//!
//! A `Schema` describes the shape of one value slot. The set of kinds is closed
//! (struct, array, string, enum, int, float, bool) and every dispatch site is an
//! exhaustive `match`, so adding a kind is a compile error everywhere it matters.
//!
//! Children are owned exclusively: struct fields and array element types are
//! never shared, and `Clone` is a deep, independent copy of the whole tree.
pub mod codec;
pub mod conform;
pub mod default;
pub mod validate;

use std::fmt;
use std::str::FromStr;

use ordered_float::OrderedFloat;
use regex::Regex;

use crate::path::PathKey;

pub use codec::{parse_schema, parse_schema_with, save_schema, CodecOptions, FieldFailurePolicy};
pub use conform::conform;
pub use default::default_value;
pub use validate::{validate, Violation, ViolationKind};

// --------------------------------- Kinds ---------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Struct,
    Array,
    String,
    Enum,
    Int,
    Float,
    Bool,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 7] = [
        SchemaKind::Struct,
        SchemaKind::Array,
        SchemaKind::String,
        SchemaKind::Enum,
        SchemaKind::Int,
        SchemaKind::Float,
        SchemaKind::Bool,
    ];

    /// The `type` discriminator used in persisted records.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Struct => "struct",
            SchemaKind::Array => "array",
            SchemaKind::String => "string",
            SchemaKind::Enum => "enum",
            SchemaKind::Int => "int",
            SchemaKind::Float => "float",
            SchemaKind::Bool => "bool",
        }
    }

    /// Kinds whose editor node keeps an add/remove child list.
    pub fn has_child_list(self) -> bool {
        matches!(self, SchemaKind::Struct | SchemaKind::Enum)
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemaKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

// --------------------------------- Nodes ---------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    Struct(StructSchema),
    Array(ArraySchema),
    String(StringSchema),
    Enum(EnumSchema),
    Int(IntSchema),
    Float(FloatSchema),
    Bool,
}

/// Ordered fields. Names are expected to be unique but only the editor UI
/// cares; order defines both display order and positional identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructSchema {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub def: Schema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArraySchema {
    pub element_type: Box<Schema>,
    /// Inclusive.
    pub min_elements: u32,
    /// Inclusive.
    pub max_elements: u32,
}

#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    /// `None` is "unconstrained", which is not the same as an empty pattern.
    pub pattern: Option<Regex>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumSchema {
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntSchema {
    pub min_value: i64,
    pub max_value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatSchema {
    pub min_value: OrderedFloat<f64>,
    pub max_value: OrderedFloat<f64>,
}

impl ArraySchema {
    /// Largest accepted `min_elements`; every default value materialises
    /// that many elements.
    pub const MAX_MIN_ELEMENTS: u32 = 1 << 16;
}

impl Default for ArraySchema {
    fn default() -> Self {
        Self {
            element_type: Box::new(Schema::Struct(StructSchema::default())),
            min_elements: 0,
            max_elements: u32::MAX,
        }
    }
}

impl Default for IntSchema {
    fn default() -> Self {
        Self { min_value: i64::MIN, max_value: i64::MAX }
    }
}

impl Default for FloatSchema {
    fn default() -> Self {
        Self { min_value: OrderedFloat(f64::MIN), max_value: OrderedFloat(f64::MAX) }
    }
}

impl PartialEq for StringSchema {
    fn eq(&self, other: &Self) -> bool {
        self.pattern_str() == other.pattern_str()
    }
}

impl Eq for StringSchema {}

impl StringSchema {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self { pattern: Some(Regex::new(pattern)?) })
    }

    pub fn pattern_str(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}

impl StructSchema {
    pub fn field(&self, name: &str) -> Option<&Schema> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.def)
    }
}

impl EnumSchema {
    pub fn contains_id(&self, id: i64) -> bool {
        self.values.iter().any(|v| v.id == id)
    }

    /// Append a value whose id is its list position.
    pub fn push_default(&mut self, name: impl Into<String>) -> usize {
        let idx = self.values.len();
        self.values.push(EnumValue { name: name.into(), id: idx as i64 });
        idx
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::Struct(StructSchema::default())
    }
}

impl Schema {
    /// A fresh node of `kind` with default constraints.
    pub fn empty(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::Struct => Schema::Struct(StructSchema::default()),
            SchemaKind::Array => Schema::Array(ArraySchema::default()),
            SchemaKind::String => Schema::String(StringSchema::default()),
            SchemaKind::Enum => Schema::Enum(EnumSchema::default()),
            SchemaKind::Int => Schema::Int(IntSchema::default()),
            SchemaKind::Float => Schema::Float(FloatSchema::default()),
            SchemaKind::Bool => Schema::Bool,
        }
    }

    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Struct(_) => SchemaKind::Struct,
            Schema::Array(_) => SchemaKind::Array,
            Schema::String(_) => SchemaKind::String,
            Schema::Enum(_) => SchemaKind::Enum,
            Schema::Int(_) => SchemaKind::Int,
            Schema::Float(_) => SchemaKind::Float,
            Schema::Bool => SchemaKind::Bool,
        }
    }

    /// Same variant, ignoring constraints and children.
    pub fn same_kind(&self, other: &Schema) -> bool {
        self.kind() == other.kind()
    }

    /// Resolve the schema governing the value at `path`. Field keys descend
    /// into struct fields; index and append keys descend into an array's
    /// element type.
    pub fn at_path(&self, path: &[PathKey]) -> Option<&Schema> {
        let mut current = self;
        for key in path {
            current = match (current, key) {
                (Schema::Struct(s), PathKey::Field(name)) => s.field(name)?,
                (Schema::Array(a), PathKey::Index(_) | PathKey::Append) => &a.element_type,
                _ => return None,
            };
        }
        Some(current)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::Struct(StructSchema {
            fields: vec![
                Field { name: "hp".into(), def: Schema::Int(IntSchema { min_value: 0, max_value: 100 }) },
                Field {
                    name: "tags".into(),
                    def: Schema::Array(ArraySchema {
                        element_type: Box::new(Schema::String(StringSchema::new("^[a-z]+$").unwrap())),
                        min_elements: 0,
                        max_elements: 8,
                    }),
                },
            ],
        })
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in SchemaKind::ALL {
            assert_eq!(kind.as_str().parse::<SchemaKind>(), Ok(kind));
            assert_eq!(Schema::empty(kind).kind(), kind);
        }
        assert!("object".parse::<SchemaKind>().is_err());
    }

    #[test]
    fn clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        if let Schema::Struct(s) = &mut copy {
            s.fields[0].name = "mana".into();
            s.fields.pop();
        }
        assert_ne!(copy, original);
        let Schema::Struct(s) = &original else { panic!("struct expected") };
        assert_eq!(s.fields.len(), 2);
        assert_eq!(s.fields[0].name, "hp");
    }

    #[test]
    fn string_equality_compares_pattern_text() {
        let a = StringSchema::new("^a$").unwrap();
        let b = StringSchema::new("^a$").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, StringSchema::default());
        assert_ne!(StringSchema::new("").unwrap(), StringSchema::default());
    }

    #[test]
    fn at_path_follows_fields_and_elements() {
        let schema = sample();
        let tags_elem = schema.at_path(&[PathKey::Field("tags".into()), PathKey::Index(3)]);
        assert_eq!(tags_elem.map(Schema::kind), Some(SchemaKind::String));
        assert!(schema.at_path(&[PathKey::Index(0)]).is_none());
        assert!(schema.at_path(&[PathKey::Field("missing".into())]).is_none());
        assert_eq!(schema.at_path(&[]), Some(&schema));
        let appended = schema.at_path(&[PathKey::Field("tags".into()), PathKey::Append]);
        assert_eq!(appended, tags_elem);
    }

    #[test]
    fn same_kind_ignores_constraints() {
        let bounded = Schema::Int(IntSchema { min_value: 0, max_value: 1 });
        assert!(bounded.same_kind(&Schema::empty(SchemaKind::Int)));
        assert!(!bounded.same_kind(&Schema::Bool));
        assert!(sample().same_kind(&Schema::empty(SchemaKind::Struct)));
    }

    #[test]
    fn default_array_element_is_struct() {
        let Schema::Array(arr) = Schema::empty(SchemaKind::Array) else { panic!() };
        assert_eq!(arr.element_type.kind(), SchemaKind::Struct);
        assert_eq!(arr.max_elements, u32::MAX);
    }
}
