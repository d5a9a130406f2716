use serde_json::{Map, Value};

use super::Schema;

/// Minimal value for `schema`.
///
/// Structs get every declared field, arrays get `min_elements` defaulted
/// elements, numbers get `0` pulled into `[min, max]`. Two documented gaps:
/// strings default to `""` even when a pattern rejects it, and enums default to
/// `0` even when no value carries that id.
pub fn default_value(schema: &Schema) -> Value {
    match schema {
        Schema::Struct(s) => {
            let mut out = Map::new();
            for field in &s.fields {
                out.insert(field.name.clone(), default_value(&field.def));
            }
            Value::Object(out)
        }
        Schema::Array(a) => {
            let elem = default_value(&a.element_type);
            Value::Array(vec![elem; a.min_elements as usize])
        }
        Schema::String(_) => Value::String(String::new()),
        Schema::Enum(_) => Value::from(0),
        Schema::Int(i) => Value::from(clamp_zero(i.min_value, i.max_value, 0)),
        Schema::Float(f) => Value::from(clamp_zero(f.min_value.0, f.max_value.0, 0.0)),
        Schema::Bool => Value::Bool(false),
    }
}

// min wins over max when the bounds are inverted
fn clamp_zero<T: PartialOrd + Copy>(min: T, max: T, zero: T) -> T {
    if zero < min {
        min
    } else if zero > max {
        max
    } else {
        zero
    }
}
