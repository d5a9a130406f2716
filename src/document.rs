//! On-disk JSON dump of one resource: its schema records and the values
//! stored against them.
//!
//! ```json
//! {
//!   "properties": [{"name": "stats", "type": "struct", "fields": []}],
//!   "values": {"stats": {}}
//! }
//! ```
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DocumentError, ParseError};
use crate::path_de::from_str_with_path;
use crate::schema::codec::{parse_roots, parse_roots_with, save_schema};
use crate::schema::{conform, default_value, parse_schema_with, validate, CodecOptions, Field, Violation};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDocument {
    pub properties: Vec<Value>,
    #[serde(default)]
    pub values: IndexMap<String, Value>,
}

/// Everything `check` found wrong with a document.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Schema records dropped while parsing, by list position.
    pub skipped: Vec<(usize, ParseError)>,
    /// Roots whose save/parse round trip did not reproduce the schema.
    pub unstable: Vec<String>,
    /// Value violations, keyed by root name.
    pub violations: Vec<(String, Violation)>,
    /// Roots with no stored value.
    pub missing: Vec<String>,
    /// Stored values with no schema.
    pub orphaned: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.unstable.is_empty()
            && self.violations.is_empty()
            && self.missing.is_empty()
            && self.orphaned.is_empty()
    }
}

impl ResourceDocument {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let origin = path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: origin.clone(),
            source,
        })?;
        Self::from_json_str(&origin, &source)
    }

    pub fn from_json_str(origin: &str, source: &str) -> Result<Self, DocumentError> {
        from_str_with_path(origin, source)
    }

    pub fn to_pretty_string(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let io_error = |source| DocumentError::Io { path: path.to_string_lossy().to_string(), source };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(path, self.to_pretty_string()?).map_err(io_error)
    }

    /// Parsed roots in declaration order. Malformed records are dropped.
    pub fn roots(&self) -> Vec<Field> {
        parse_roots(&Value::Array(self.properties.clone())).roots
    }

    pub fn check(&self) -> CheckReport {
        self.check_with(CodecOptions::default())
    }

    pub fn check_with(&self, opts: CodecOptions) -> CheckReport {
        let parsed = parse_roots_with(&Value::Array(self.properties.clone()), opts);
        let mut report = CheckReport { skipped: parsed.skipped, ..CheckReport::default() };

        for Field { name, def } in &parsed.roots {
            match parse_schema_with(&save_schema(def), opts) {
                Ok(again) if &again == def => {}
                _ => report.unstable.push(name.clone()),
            }
            match self.values.get(name) {
                Some(value) => report
                    .violations
                    .extend(validate(def, value).into_iter().map(|v| (name.clone(), v))),
                None => report.missing.push(name.clone()),
            }
        }
        for name in self.values.keys() {
            if !parsed.roots.iter().any(|f| &f.name == name) {
                report.orphaned.push(name.clone());
            }
        }
        report
    }

    /// `{name: default}` for every root.
    pub fn defaults(&self) -> IndexMap<String, Value> {
        self.roots()
            .into_iter()
            .map(|Field { name, def }| {
                let value = default_value(&def);
                (name, value)
            })
            .collect()
    }

    /// Rewrite every stored value to fit its schema, filling missing roots
    /// with defaults. Values with no schema are left alone. Returns how many
    /// roots changed.
    pub fn conform_values(&mut self) -> usize {
        let mut changed = 0;
        for Field { name, def } in self.roots() {
            let next = match self.values.get(&name) {
                Some(current) => conform(&def, current),
                None => default_value(&def),
            };
            if self.values.get(&name) != Some(&next) {
                tracing::debug!(%name, "conformed stored value");
                self.values.insert(name, next);
                changed += 1;
            }
        }
        changed
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> ResourceDocument {
        ResourceDocument::from_json_str(
            "test",
            &json!({
                "properties": [
                    {"name": "hp", "type": "int", "min_value": 0, "max_value": 10},
                    {"name": "tags", "type": "array", "element_type": {"type": "string"}, "min_elements": 1},
                    {"type": "bool"}
                ],
                "values": {"hp": 12, "ghost": true}
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn check_finds_every_problem() {
        let report = document().check();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, 2);
        assert!(report.unstable.is_empty());
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].0, "hp");
        assert_eq!(report.missing, vec!["tags".to_string()]);
        assert_eq!(report.orphaned, vec!["ghost".to_string()]);
        assert!(!report.is_clean());
    }

    #[test]
    fn defaults_and_conform() {
        let mut doc = document();
        let defaults = doc.defaults();
        assert_eq!(defaults["hp"], json!(0));
        assert_eq!(defaults["tags"], json!([""]));

        assert_eq!(doc.conform_values(), 2);
        assert_eq!(doc.values["hp"], json!(10));
        assert_eq!(doc.values["tags"], json!([""]));
        assert_eq!(doc.values["ghost"], json!(true));
        assert_eq!(doc.conform_values(), 0);
    }

    #[test]
    fn decode_errors_carry_the_json_path() {
        let err = ResourceDocument::from_json_str("bad.json", r#"{"properties": {}}"#).unwrap_err();
        assert!(err.to_string().contains("properties"), "{err}");
    }

    #[test]
    fn abort_policy_drops_the_whole_root() {
        let doc = ResourceDocument::from_json_str(
            "x",
            &json!({
                "properties": [{"name": "s", "type": "struct", "fields": [{"name": "a", "type": "nope"}]}],
                "values": {"s": {}}
            })
            .to_string(),
        )
        .unwrap();
        assert!(doc.check().is_clean());
        let strict = doc.check_with(CodecOptions { field_failure: crate::schema::FieldFailurePolicy::Abort });
        assert_eq!(strict.skipped.len(), 1);
        assert_eq!(strict.orphaned, vec!["s".to_string()]);
    }

    #[test]
    fn values_default_to_empty() {
        let doc = ResourceDocument::from_json_str("x", r#"{"properties": []}"#).unwrap();
        assert!(doc.values.is_empty());
        assert!(doc.check().is_clean());
    }
}
