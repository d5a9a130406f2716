//! Bring a stored value back in line with a schema that changed under it.
//!
//! Used after schema edits: fields are matched by name, array elements by
//! position, and whatever cannot be kept is replaced by its default.
use serde_json::{Map, Value};

use super::{default_value, Schema};

pub fn conform(schema: &Schema, value: &Value) -> Value {
    match (schema, value) {
        (Schema::Struct(s), Value::Object(map)) => {
            let mut out = Map::new();
            for field in &s.fields {
                let kept = match map.get(&field.name) {
                    Some(child) => conform(&field.def, child),
                    None => default_value(&field.def),
                };
                out.insert(field.name.clone(), kept);
            }
            Value::Object(out)
        }
        (Schema::Array(a), Value::Array(list)) => {
            let max = a.max_elements as usize;
            let mut out = list
                .iter()
                .take(max)
                .map(|elem| conform(&a.element_type, elem))
                .collect::<Vec<_>>();
            let min = a.min_elements as usize;
            if out.len() < min {
                out.resize(min, default_value(&a.element_type));
            }
            Value::Array(out)
        }
        (Schema::String(_), Value::String(_)) => value.clone(),
        (Schema::Enum(e), _) if value.as_i64().is_some_and(|id| e.contains_id(id)) => value.clone(),
        (Schema::Int(i), Value::Number(n)) => match n.as_i64() {
            Some(x) => Value::from(clamp(x, i.min_value, i.max_value)),
            None => default_value(schema),
        },
        (Schema::Float(f), Value::Number(n)) => match n.as_f64() {
            Some(x) if x < f.min_value.0 || x > f.max_value.0 => {
                Value::from(clamp(x, f.min_value.0, f.max_value.0))
            }
            Some(_) => value.clone(),
            None => default_value(schema),
        },
        (Schema::Bool, Value::Bool(_)) => value.clone(),
        _ => default_value(schema),
    }
}

// min wins when bounds are inverted, same as `default_value`
fn clamp<T: PartialOrd>(x: T, min: T, max: T) -> T {
    if x < min {
        min
    } else if x > max {
        max
    } else {
        x
    }
}
