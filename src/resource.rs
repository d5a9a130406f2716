//! Host-side owners of persisted slots.
//!
//! [`ResourceSchema`] holds the persisted list of named root schemas and a parse
//! cache that every mutation invalidates. [`ValueSlot`] holds one edited value
//! together with its schema and forwards every accepted mutation to a
//! [`ChangeSink`].
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::PathError;
use crate::notify::ChangeSink;
use crate::path::{self, display_path, PathKey, Position};
use crate::schema::codec::{parse_roots, save_named};
use crate::schema::{conform, default_value, Field, Schema};

// ---------------------------- ResourceSchema ------------------------------ //

#[derive(Debug, Clone)]
pub struct ResourceSchema {
    properties: Value,
    cache: Option<IndexMap<String, Schema>>,
}

impl Default for ResourceSchema {
    fn default() -> Self {
        Self { properties: Value::Array(Vec::new()), cache: None }
    }
}

impl ResourceSchema {
    pub fn new(properties: Value) -> Self {
        Self { properties, cache: None }
    }

    /// The persisted record list, exactly as stored.
    pub fn properties(&self) -> &Value {
        &self.properties
    }

    pub fn set_properties(&mut self, properties: Value) {
        self.properties = properties;
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Parse every entry, in declaration order. Malformed entries are skipped;
    /// on a duplicate name the later entry wins.
    pub fn compute_info(&self) -> IndexMap<String, Schema> {
        let mut out = IndexMap::new();
        for Field { name, def } in parse_roots(&self.properties).roots {
            if out.insert(name.clone(), def).is_some() {
                tracing::warn!(%name, "duplicate root schema name; keeping the later one");
            }
        }
        out
    }

    /// Cached [`compute_info`](Self::compute_info).
    pub fn info(&mut self) -> &IndexMap<String, Schema> {
        let info = match self.cache.take() {
            Some(info) => info,
            None => {
                tracing::debug!("recomputing schema info");
                self.compute_info()
            }
        };
        self.cache.insert(info)
    }

    pub fn compute_info_for(&self, name: &str) -> Option<Schema> {
        self.compute_info().swap_remove(name)
    }

    /// Replace the stored list with `info`.
    pub fn set_info(&mut self, info: &IndexMap<String, Schema>) {
        let list = info
            .iter()
            .map(|(name, def)| save_named(&Field { name: name.clone(), def: def.clone() }))
            .collect();
        self.properties = Value::Array(list);
        self.invalidate();
    }

    /// Add or replace the entry named `name`, keeping its position if present.
    pub fn insert(&mut self, name: &str, schema: &Schema) {
        let record = save_named(&Field { name: name.to_string(), def: schema.clone() });
        self.edit_list(|list| {
            match list.iter().position(|r| record_name(r) == Some(name)) {
                Some(idx) => list[idx] = record,
                None => list.push(record),
            }
        });
    }

    /// Remove every entry named `name`; returns whether one existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.edit_list(|list| {
            let before = list.len();
            list.retain(|r| record_name(r) != Some(name));
            list.len() != before
        })
    }

    fn edit_list<R>(&mut self, edit: impl FnOnce(&mut Vec<Value>) -> R) -> R {
        let mut list = match std::mem::take(&mut self.properties) {
            Value::Array(list) => list,
            Value::Null => Vec::new(),
            _ => {
                tracing::warn!("schema properties were not a list; resetting");
                Vec::new()
            }
        };
        let out = edit(&mut list);
        self.properties = Value::Array(list);
        self.invalidate();
        out
    }
}

fn record_name(record: &Value) -> Option<&str> {
    record.get("name").and_then(Value::as_str)
}

impl ChangeSink for ResourceSchema {
    /// Accept a committed root list from a schema editor.
    fn changed(&mut self, current: &Value) {
        self.set_properties(current.clone());
    }
}

// ------------------------------- ValueSlot -------------------------------- //

/// The value editor's root: one value, its schema, and the commit point every
/// leaf edit reports to by path.
pub struct ValueSlot {
    schema: Schema,
    value: Value,
    sink: Box<dyn ChangeSink>,
}

impl ValueSlot {
    /// Starts at the schema's default value.
    pub fn new(schema: Schema, sink: impl ChangeSink + 'static) -> Self {
        let value = default_value(&schema);
        Self { schema, value, sink: Box::new(sink) }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Refresh from storage without notifying.
    pub fn load(&mut self, value: Value) {
        self.value = value;
    }

    pub fn read(&self, path: &[PathKey]) -> Option<&Value> {
        path::read(&self.value, path)
            .inspect_err(|error| {
                tracing::warn!(path = %display_path(path), %error, "value read failed");
            })
            .ok()
    }

    /// Replace the value at `path`; a trailing [`PathKey::Append`] adds to the
    /// list instead and is held to `max_elements`.
    pub fn update_value(&mut self, path: &[PathKey], value: Value) -> Result<(), PathError> {
        let capacity = match path.split_last() {
            Some((PathKey::Append, list_path)) => self.check_capacity(list_path),
            _ => Ok(()),
        };
        let result = capacity.and_then(|()| path::write(&mut self.value, path, value));
        self.finish("update", path, result)
    }

    /// Insert `value` into the list at `path`. Rejected once the list holds
    /// the schema's `max_elements`.
    pub fn add_array_element(
        &mut self,
        path: &[PathKey],
        pos: Position,
        value: Value,
    ) -> Result<(), PathError> {
        let result = self
            .check_capacity(path)
            .and_then(|()| path::insert_element(&mut self.value, path, value, pos));
        self.finish("insert", path, result)
    }

    /// Insert the element type's default value.
    pub fn add_default_element(&mut self, path: &[PathKey], pos: Position) -> Result<(), PathError> {
        let value = match self.schema.at_path(path) {
            Some(Schema::Array(a)) => default_value(&a.element_type),
            _ => return self.finish("insert", path, Err(PathError::NotAList { depth: path.len() })),
        };
        self.add_array_element(path, pos, value)
    }

    pub fn remove_array_element(&mut self, path: &[PathKey], index: usize) -> Result<Value, PathError> {
        let result = path::remove_element(&mut self.value, path, index);
        self.finish("remove", path, result)
    }

    /// Swap in a new schema and conform the stored value to it. Notifies only
    /// when the value actually changed.
    pub fn set_schema(&mut self, schema: Schema) {
        let conformed = conform(&schema, &self.value);
        self.schema = schema;
        if conformed != self.value {
            self.value = conformed;
            self.notify();
        }
    }

    pub fn reset(&mut self) {
        self.value = default_value(&self.schema);
        self.notify();
    }

    fn check_capacity(&self, path: &[PathKey]) -> Result<(), PathError> {
        let Some(Schema::Array(a)) = self.schema.at_path(path) else {
            return Ok(());
        };
        let len = path::read(&self.value, path)?.as_array().map_or(0, Vec::len);
        if len >= a.max_elements as usize {
            return Err(PathError::ArrayFull { max: a.max_elements });
        }
        Ok(())
    }

    fn finish<T>(&mut self, op: &str, path: &[PathKey], result: Result<T, PathError>) -> Result<T, PathError> {
        match &result {
            Ok(_) => {
                tracing::debug!(op, path = %display_path(path), "value changed");
                self.notify();
            }
            Err(error) => {
                tracing::warn!(op, path = %display_path(path), %error, "value edit rejected");
            }
        }
        result
    }

    fn notify(&mut self) {
        self.sink.changed(&self.value);
    }
}

// ------------------------------- Tests ------------------------------------ //
