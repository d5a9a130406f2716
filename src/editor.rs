//! Schema-authoring state machine.
//!
//! The editor owns the working list of named root schemas and an arena of
//! editor nodes, one per schema slot the UI shows (root entries, struct fields
//! and array element types). A node never points into the schema tree; it holds
//! a [`DefinitionRef`] naming its slot as "root N", "field N of parent P" or
//! "element type of parent P", and the slot is resolved by walking down from
//! the roots on every access. Removing a field therefore only has to renumber
//! the later siblings' refs.
//!
//! Every successful edit ends in one synchronous notification carrying the
//! full persisted root list. Loading from storage does not notify.
use ordered_float::OrderedFloat;
use regex::Regex;
use serde_json::Value;

use crate::error::EditError;
use crate::notify::ChangeSink;
use crate::path::PathKey;
use crate::schema::codec::{parse_roots, save_roots};
use crate::schema::{ArraySchema, EnumValue, Field, Schema, SchemaKind};

// -------------------------------- Handles --------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Where an editor node's schema lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionRef {
    Root { index: usize },
    Field { parent: NodeId, index: usize },
    ElementType { parent: NodeId },
}

impl DefinitionRef {
    pub fn parent(&self) -> Option<NodeId> {
        match *self {
            DefinitionRef::Root { .. } => None,
            DefinitionRef::Field { parent, .. } | DefinitionRef::ElementType { parent } => Some(parent),
        }
    }

    /// Roots and struct fields carry a name; element types do not.
    pub fn has_name(&self) -> bool {
        !matches!(self, DefinitionRef::ElementType { .. })
    }
}

#[derive(Debug, Clone)]
struct EditNode {
    definition: DefinitionRef,
    /// Mirrors the variant in the slot.
    kind: SchemaKind,
    children: Vec<NodeId>,
    removing_child: bool,
}

/// A bound as typed into a min/max box. The variant has to match the node:
/// `Count` for arrays, `Int` for ints, `Float` for floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Count(u32),
    Int(i64),
    Float(f64),
}

impl Bound {
    /// Convert a host-supplied real for a node of `kind`. Counts and ints
    /// must be integral and in range; floats must be finite.
    pub fn checked(kind: SchemaKind, value: f64) -> Result<Self, EditError> {
        let invalid = || EditError::InvalidBound { kind, value: value.to_string() };
        match kind {
            SchemaKind::Array => {
                if value.fract() != 0.0 || !(0.0..=u32::MAX as f64).contains(&value) {
                    return Err(invalid());
                }
                Ok(Bound::Count(value as u32))
            }
            // 2^63 is the first float past i64::MAX
            SchemaKind::Int => {
                if value.fract() != 0.0 || !(value >= i64::MIN as f64 && value < i64::MAX as f64) {
                    return Err(invalid());
                }
                Ok(Bound::Int(value as i64))
            }
            SchemaKind::Float if value.is_finite() => Ok(Bound::Float(value)),
            SchemaKind::Float => Err(invalid()),
            other => Err(EditError::UnsupportedKind { op: "set bound", kind: other }),
        }
    }
}

/// Result of [`SchemaEditor::add_child`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddedChild {
    Field(NodeId),
    EnumValue(usize),
}

// -------------------------------- Editor ---------------------------------- //

pub struct SchemaEditor {
    roots: Vec<Field>,
    // slots are never reused, so a stale id can only miss
    nodes: Vec<Option<EditNode>>,
    root_nodes: Vec<NodeId>,
    selected_root: Option<usize>,
    updating: bool,
    sink: Box<dyn ChangeSink>,
}

impl SchemaEditor {
    pub fn new(sink: impl ChangeSink + 'static) -> Self {
        Self {
            roots: Vec::new(),
            nodes: Vec::new(),
            root_nodes: Vec::new(),
            selected_root: None,
            updating: false,
            sink: Box::new(sink),
        }
    }

    // ---- queries ----

    pub fn roots(&self) -> &[Field] {
        &self.roots
    }

    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    pub fn selected_root(&self) -> Option<usize> {
        self.selected_root
    }

    pub fn kind(&self, id: NodeId) -> Result<SchemaKind, EditError> {
        Ok(self.node(id)?.kind)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId], EditError> {
        Ok(&self.node(id)?.children)
    }

    pub fn definition(&self, id: NodeId) -> Result<DefinitionRef, EditError> {
        Ok(self.node(id)?.definition)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, EditError> {
        Ok(self.node(id)?.definition.parent())
    }

    pub fn is_removing(&self, id: NodeId) -> Result<bool, EditError> {
        Ok(self.node(id)?.removing_child)
    }

    pub fn schema(&self, id: NodeId) -> Result<&Schema, EditError> {
        let chain = self.chain(id)?;
        let mut steps = chain.iter().rev();
        let mut current = match steps.next() {
            Some(DefinitionRef::Root { index }) => &self.roots.get(*index).ok_or(EditError::Detached(id))?.def,
            _ => return Err(EditError::Detached(id)),
        };
        for step in steps {
            current = descend(current, step).ok_or(EditError::Detached(id))?;
        }
        Ok(current)
    }

    /// Field name for roots and struct fields, `None` for element types.
    pub fn field_name(&self, id: NodeId) -> Result<Option<&str>, EditError> {
        let definition = self.node(id)?.definition;
        if !definition.has_name() {
            return Ok(None);
        }
        match definition {
            DefinitionRef::Root { index } => Ok(self.roots.get(index).map(|f| f.name.as_str())),
            DefinitionRef::Field { parent, index } => match self.schema(parent)? {
                Schema::Struct(s) => Ok(s.fields.get(index).map(|f| f.name.as_str())),
                _ => Err(EditError::Detached(id)),
            },
            DefinitionRef::ElementType { .. } => Ok(None),
        }
    }

    /// The key this node's value sits under inside its parent's value.
    pub fn key(&self, id: NodeId) -> Result<PathKey, EditError> {
        let definition = self.node(id)?.definition;
        match definition {
            DefinitionRef::ElementType { .. } => Ok(PathKey::Index(0)),
            _ => self
                .field_name(id)?
                .map(|name| PathKey::Field(name.to_string()))
                .ok_or(EditError::Detached(id)),
        }
    }

    /// Persisted form of the whole root list.
    pub fn save(&self) -> Value {
        save_roots(&self.roots)
    }

    // ---- roots ----

    /// Replace every root from a persisted list without notifying.
    /// Returns how many entries were dropped as malformed.
    pub fn load(&mut self, list: &Value) -> usize {
        let parsed = parse_roots(list);
        self.load_roots(parsed.roots);
        parsed.skipped.len()
    }

    pub fn load_roots(&mut self, roots: Vec<Field>) {
        self.updating = true;
        for id in std::mem::take(&mut self.root_nodes) {
            self.free_subtree(id);
        }
        self.roots.clear();
        self.selected_root = None;
        for root in roots {
            if let Err(error) = self.push_root(root) {
                tracing::warn!(%error, "failed to attach loaded root");
            }
        }
        self.updating = false;
        tracing::debug!(roots = self.roots.len(), "schema editor loaded");
    }

    pub fn add_root(&mut self, name: impl Into<String>, schema: Schema) -> Result<NodeId, EditError> {
        let id = self.push_root(Field { name: name.into(), def: schema })?;
        self.something_changed();
        Ok(id)
    }

    /// New unnamed root holding an empty struct.
    pub fn add_default_root(&mut self) -> Result<NodeId, EditError> {
        self.add_root("", Schema::default())
    }

    pub fn select_root(&mut self, index: usize) -> Result<(), EditError> {
        if index >= self.roots.len() {
            return Err(EditError::IndexOutOfRange { index, len: self.roots.len() });
        }
        self.selected_root = Some(index);
        Ok(())
    }

    /// Remove the root at `index`, or the selected root when `None`.
    /// Returns `false` when nothing was addressed.
    pub fn remove_root(&mut self, index: Option<usize>) -> Result<bool, EditError> {
        let Some(index) = index.or(self.selected_root) else {
            return Ok(false);
        };
        if index >= self.roots.len() {
            return Err(EditError::IndexOutOfRange { index, len: self.roots.len() });
        }
        self.roots.remove(index);
        let id = self.root_nodes.remove(index);
        self.free_subtree(id);
        for (i, later) in self.root_nodes.clone().into_iter().enumerate().skip(index) {
            self.node_mut(later)?.definition = DefinitionRef::Root { index: i };
        }
        self.selected_root = None;
        self.something_changed();
        Ok(true)
    }

    // ---- node edits ----

    /// Switch `id` to a fresh schema of `kind`. Selecting the current kind
    /// again is a no-op and returns `false`.
    pub fn select_kind(&mut self, id: NodeId, kind: SchemaKind) -> Result<bool, EditError> {
        if self.node(id)?.kind == kind {
            return Ok(false);
        }
        self.swap_schema(id, Schema::empty(kind))?;
        Ok(true)
    }

    /// Put `schema` into the slot of `id`, dropping whatever was there and
    /// rebuilding the node's children to match.
    pub fn swap_schema(&mut self, id: NodeId, schema: Schema) -> Result<(), EditError> {
        let kind = schema.kind();
        let previous = self.node(id)?.kind;
        let same_kind = self.schema(id)?.same_kind(&schema);
        *self.schema_mut(id)? = schema;
        let node = self.node_mut(id)?;
        node.kind = kind;
        node.removing_child = false;
        self.rebuild_children(id)?;
        tracing::debug!(node = id.0, from = %previous, to = %kind, same_kind, "schema slot replaced");
        self.something_changed();
        Ok(())
    }

    /// Append a default entry to a struct (unnamed empty struct field) or an
    /// enum (unnamed value whose id is its position).
    pub fn add_child(&mut self, id: NodeId) -> Result<AddedChild, EditError> {
        let added = match self.schema_mut(id)? {
            Schema::Struct(s) => {
                s.fields.push(Field { name: String::new(), def: Schema::default() });
                let index = s.fields.len() - 1;
                let child = self.attach(DefinitionRef::Field { parent: id, index })?;
                self.node_mut(id)?.children.push(child);
                AddedChild::Field(child)
            }
            Schema::Enum(e) => AddedChild::EnumValue(e.push_default("")),
            other => {
                return Err(EditError::UnsupportedKind { op: "add child", kind: other.kind() });
            }
        };
        self.something_changed();
        Ok(added)
    }

    /// Arm or disarm removal mode; the next [`child_clicked`](Self::child_clicked)
    /// removes the clicked entry. Returns the new state.
    pub fn toggle_remove_mode(&mut self, id: NodeId) -> Result<bool, EditError> {
        let node = self.node_mut(id)?;
        if !node.kind.has_child_list() {
            return Err(EditError::UnsupportedKind { op: "remove child", kind: node.kind });
        }
        node.removing_child = !node.removing_child;
        Ok(node.removing_child)
    }

    /// A child entry at `index` was clicked. Removes it when removal mode is
    /// armed, then disarms. Later struct fields shift down one position.
    pub fn child_clicked(&mut self, id: NodeId, index: usize) -> Result<bool, EditError> {
        if !self.node(id)?.removing_child {
            return Ok(false);
        }
        match self.schema_mut(id)? {
            Schema::Struct(s) => {
                let len = s.fields.len();
                if index >= len {
                    return Err(EditError::IndexOutOfRange { index, len });
                }
                s.fields.remove(index);
                let removed = self.node_mut(id)?.children.remove(index);
                self.free_subtree(removed);
                let later = self.node(id)?.children[index..].to_vec();
                for (offset, child) in later.into_iter().enumerate() {
                    self.node_mut(child)?.definition =
                        DefinitionRef::Field { parent: id, index: index + offset };
                }
            }
            Schema::Enum(e) => {
                let len = e.values.len();
                if index >= len {
                    return Err(EditError::IndexOutOfRange { index, len });
                }
                e.values.remove(index);
            }
            other => {
                return Err(EditError::UnsupportedKind { op: "remove child", kind: other.kind() });
            }
        }
        self.node_mut(id)?.removing_child = false;
        self.something_changed();
        Ok(true)
    }

    /// Rename a root or struct field in place; position is unchanged.
    pub fn set_field_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), EditError> {
        let name = name.into();
        let definition = self.node(id)?.definition;
        if !definition.has_name() {
            return Err(EditError::Unnamed(id));
        }
        match definition {
            DefinitionRef::Root { index } => {
                let len = self.roots.len();
                self.roots
                    .get_mut(index)
                    .ok_or(EditError::IndexOutOfRange { index, len })?
                    .name = name;
            }
            DefinitionRef::Field { parent, index } => match self.schema_mut(parent)? {
                Schema::Struct(s) => {
                    let len = s.fields.len();
                    s.fields
                        .get_mut(index)
                        .ok_or(EditError::IndexOutOfRange { index, len })?
                        .name = name;
                }
                _ => return Err(EditError::Detached(id)),
            },
            DefinitionRef::ElementType { .. } => return Err(EditError::Unnamed(id)),
        }
        self.something_changed();
        Ok(())
    }

    /// Lower bound: element count for arrays, value for int and float. The
    /// slot is left untouched when the bound does not fit the node.
    pub fn set_min_value(&mut self, id: NodeId, bound: Bound) -> Result<(), EditError> {
        match (self.schema_mut(id)?, bound) {
            (Schema::Array(a), Bound::Count(n)) => a.min_elements = checked_min_elements(n)?,
            (Schema::Int(i), Bound::Int(n)) => i.min_value = n,
            (Schema::Float(f), Bound::Float(x)) => f.min_value = OrderedFloat(finite(x)?),
            (other, _) => return Err(EditError::UnsupportedKind { op: "set min", kind: other.kind() }),
        }
        self.something_changed();
        Ok(())
    }

    /// Upper bound: element count for arrays, value for int and float.
    pub fn set_max_value(&mut self, id: NodeId, bound: Bound) -> Result<(), EditError> {
        match (self.schema_mut(id)?, bound) {
            (Schema::Array(a), Bound::Count(n)) => a.max_elements = n,
            (Schema::Int(i), Bound::Int(n)) => i.max_value = n,
            (Schema::Float(f), Bound::Float(x)) => f.max_value = OrderedFloat(finite(x)?),
            (other, _) => return Err(EditError::UnsupportedKind { op: "set max", kind: other.kind() }),
        }
        self.something_changed();
        Ok(())
    }

    /// Empty text clears the constraint. An invalid pattern is rejected and
    /// the previous one kept.
    pub fn set_pattern(&mut self, id: NodeId, pattern: &str) -> Result<(), EditError> {
        let compiled = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(pattern).map_err(|_| EditError::InvalidPattern(pattern.to_string()))?)
        };
        match self.schema_mut(id)? {
            Schema::String(s) => s.pattern = compiled,
            other => return Err(EditError::UnsupportedKind { op: "set pattern", kind: other.kind() }),
        }
        self.something_changed();
        Ok(())
    }

    pub fn set_enum_name(&mut self, id: NodeId, index: usize, name: impl Into<String>) -> Result<(), EditError> {
        self.enum_value_mut(id, index)?.name = name.into();
        self.something_changed();
        Ok(())
    }

    pub fn set_enum_id(&mut self, id: NodeId, index: usize, value_id: i64) -> Result<(), EditError> {
        self.enum_value_mut(id, index)?.id = value_id;
        self.something_changed();
        Ok(())
    }

    // ---- internals ----

    fn node(&self, id: NodeId) -> Result<&EditNode, EditError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(EditError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut EditNode, EditError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(EditError::UnknownNode(id))
    }

    /// Definition refs from `id` up to its root, innermost first.
    fn chain(&self, id: NodeId) -> Result<Vec<DefinitionRef>, EditError> {
        let mut out = Vec::new();
        let mut current = id;
        loop {
            let definition = self.node(current)?.definition;
            out.push(definition);
            match definition.parent() {
                Some(parent) => current = parent,
                None => return Ok(out),
            }
        }
    }

    fn schema_mut(&mut self, id: NodeId) -> Result<&mut Schema, EditError> {
        let chain = self.chain(id)?;
        let mut steps = chain.iter().rev();
        let mut current = match steps.next() {
            Some(DefinitionRef::Root { index }) => {
                &mut self.roots.get_mut(*index).ok_or(EditError::Detached(id))?.def
            }
            _ => return Err(EditError::Detached(id)),
        };
        for step in steps {
            current = descend_mut(current, step).ok_or(EditError::Detached(id))?;
        }
        Ok(current)
    }

    fn enum_value_mut(&mut self, id: NodeId, index: usize) -> Result<&mut EnumValue, EditError> {
        match self.schema_mut(id)? {
            Schema::Enum(e) => {
                let len = e.values.len();
                e.values.get_mut(index).ok_or(EditError::IndexOutOfRange { index, len })
            }
            other => Err(EditError::UnsupportedKind { op: "edit enum value", kind: other.kind() }),
        }
    }

    fn push_root(&mut self, root: Field) -> Result<NodeId, EditError> {
        self.roots.push(root);
        let id = self.attach(DefinitionRef::Root { index: self.roots.len() - 1 })?;
        self.root_nodes.push(id);
        Ok(id)
    }

    /// Create a node for an existing slot and mirror its sub-structure.
    fn attach(&mut self, definition: DefinitionRef) -> Result<NodeId, EditError> {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(EditNode {
            definition,
            kind: SchemaKind::Struct,
            children: Vec::new(),
            removing_child: false,
        }));
        let kind = match self.schema(id).map(Schema::kind) {
            Ok(kind) => kind,
            Err(error) => {
                self.nodes[id.0] = None;
                return Err(error);
            }
        };
        self.node_mut(id)?.kind = kind;
        self.rebuild_children(id)?;
        Ok(id)
    }

    fn rebuild_children(&mut self, id: NodeId) -> Result<(), EditError> {
        let stale = std::mem::take(&mut self.node_mut(id)?.children);
        for child in stale {
            self.free_subtree(child);
        }
        let wanted: Vec<DefinitionRef> = match self.schema(id)? {
            Schema::Struct(s) => (0..s.fields.len())
                .map(|index| DefinitionRef::Field { parent: id, index })
                .collect(),
            Schema::Array(_) => vec![DefinitionRef::ElementType { parent: id }],
            _ => Vec::new(),
        };
        let mut children = Vec::with_capacity(wanted.len());
        for definition in wanted {
            children.push(self.attach(definition)?);
        }
        self.node_mut(id)?.children = children;
        Ok(())
    }

    fn free_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) {
            for child in node.children {
                self.free_subtree(child);
            }
        }
    }

    fn something_changed(&mut self) {
        if self.updating {
            return;
        }
        let saved = self.save();
        tracing::trace!(roots = self.roots.len(), "schema changed");
        self.sink.changed(&saved);
    }
}

// non-finite bounds have no persisted form
fn finite(x: f64) -> Result<f64, EditError> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(EditError::InvalidBound { kind: SchemaKind::Float, value: x.to_string() })
    }
}

fn checked_min_elements(n: u32) -> Result<u32, EditError> {
    if n > ArraySchema::MAX_MIN_ELEMENTS {
        return Err(EditError::InvalidBound { kind: SchemaKind::Array, value: n.to_string() });
    }
    Ok(n)
}

fn descend<'a>(schema: &'a Schema, step: &DefinitionRef) -> Option<&'a Schema> {
    match (schema, step) {
        (Schema::Struct(s), DefinitionRef::Field { index, .. }) => s.fields.get(*index).map(|f| &f.def),
        (Schema::Array(a), DefinitionRef::ElementType { .. }) => Some(&a.element_type),
        _ => None,
    }
}

fn descend_mut<'a>(schema: &'a mut Schema, step: &DefinitionRef) -> Option<&'a mut Schema> {
    match (schema, step) {
        (Schema::Struct(s), DefinitionRef::Field { index, .. }) => {
            s.fields.get_mut(*index).map(|f| &mut f.def)
        }
        (Schema::Array(a), DefinitionRef::ElementType { .. }) => Some(&mut *a.element_type),
        _ => None,
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_schema, save_schema, EnumValue};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording() -> (SchemaEditor, Rc<RefCell<Vec<Value>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let log = Rc::clone(&log);
            move |v: &Value| log.borrow_mut().push(v.clone())
        };
        (SchemaEditor::new(sink), log)
    }

    #[test]
    fn new_root_is_an_unnamed_struct() {
        let (mut ed, log) = recording();
        let root = ed.add_default_root().unwrap();
        assert_eq!(ed.kind(root).unwrap(), SchemaKind::Struct);
        assert_eq!(ed.field_name(root).unwrap(), Some(""));
        assert_eq!(log.borrow().last(), Some(&json!([{"name": "", "type": "struct", "fields": []}])));
    }

    #[test]
    fn selecting_same_kind_is_a_noop() {
        let (mut ed, log) = recording();
        let root = ed.add_default_root().unwrap();
        let before = log.borrow().len();
        assert_eq!(ed.select_kind(root, SchemaKind::Struct), Ok(false));
        assert_eq!(log.borrow().len(), before);
    }

    #[test]
    fn array_always_has_one_element_template() {
        let (mut ed, _log) = recording();
        let root = ed.add_default_root().unwrap();
        ed.select_kind(root, SchemaKind::Array).unwrap();
        let children = ed.children(root).unwrap().to_vec();
        assert_eq!(children.len(), 1);
        let elem = children[0];
        assert_eq!(ed.definition(elem).unwrap(), DefinitionRef::ElementType { parent: root });
        assert_eq!(ed.field_name(elem).unwrap(), None);
        assert_eq!(ed.key(elem).unwrap(), PathKey::Index(0));
        assert_eq!(ed.set_field_name(elem, "x"), Err(EditError::Unnamed(elem)));

        ed.select_kind(elem, SchemaKind::Int).unwrap();
        ed.set_min_value(root, Bound::Count(1)).unwrap();
        ed.set_max_value(root, Bound::Count(4)).unwrap();
        assert_eq!(
            save_schema(ed.schema(root).unwrap())["element_type"],
            json!({"type": "int", "min_value": i64::MIN, "max_value": i64::MAX})
        );
        assert_eq!(save_schema(ed.schema(root).unwrap())["max_elements"], json!(4));
        assert_eq!(
            ed.add_child(root),
            Err(EditError::UnsupportedKind { op: "add child", kind: SchemaKind::Array })
        );
    }

    #[test]
    fn kind_swap_tears_down_children() {
        let (mut ed, _log) = recording();
        let root = ed.add_default_root().unwrap();
        let AddedChild::Field(child) = ed.add_child(root).unwrap() else { panic!() };
        ed.select_kind(child, SchemaKind::Array).unwrap();
        let grandchild = ed.children(child).unwrap()[0];

        ed.select_kind(root, SchemaKind::Bool).unwrap();
        assert!(ed.children(root).unwrap().is_empty());
        assert_eq!(ed.kind(child), Err(EditError::UnknownNode(child)));
        assert_eq!(ed.kind(grandchild), Err(EditError::UnknownNode(grandchild)));
        assert_eq!(ed.save(), json!([{"name": "", "type": "bool"}]));
    }

    #[test]
    fn removing_a_field_renumbers_later_siblings() {
        let (mut ed, _log) = recording();
        let schema = parse_schema(&json!({
            "type": "struct",
            "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "bool"},
                {"name": "c", "type": "string"}
            ]
        }))
        .unwrap();
        let root = ed.add_root("stats", schema).unwrap();
        let kids = ed.children(root).unwrap().to_vec();

        assert_eq!(ed.child_clicked(root, 0), Ok(false));
        assert_eq!(ed.toggle_remove_mode(root), Ok(true));
        assert_eq!(ed.child_clicked(root, 0), Ok(true));
        assert_eq!(ed.is_removing(root), Ok(false));

        assert_eq!(ed.children(root).unwrap(), &kids[1..]);
        assert_eq!(ed.definition(kids[1]).unwrap(), DefinitionRef::Field { parent: root, index: 0 });
        assert_eq!(ed.field_name(kids[1]).unwrap(), Some("b"));
        assert_eq!(ed.kind(kids[1]).unwrap(), SchemaKind::Bool);
        assert_eq!(ed.field_name(kids[2]).unwrap(), Some("c"));

        ed.set_field_name(kids[2], "label").unwrap();
        let saved = ed.save();
        assert_eq!(saved[0]["fields"][1]["name"], "label");
        assert_eq!(saved[0]["fields"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn enum_values_add_edit_remove() {
        let (mut ed, _log) = recording();
        let root = ed.add_default_root().unwrap();
        ed.select_kind(root, SchemaKind::Enum).unwrap();
        assert_eq!(ed.add_child(root), Ok(AddedChild::EnumValue(0)));
        assert_eq!(ed.add_child(root), Ok(AddedChild::EnumValue(1)));
        ed.set_enum_name(root, 0, "red").unwrap();
        ed.set_enum_name(root, 1, "blue").unwrap();
        ed.set_enum_id(root, 1, 10).unwrap();

        ed.toggle_remove_mode(root).unwrap();
        ed.child_clicked(root, 0).unwrap();
        let Schema::Enum(e) = ed.schema(root).unwrap() else { panic!() };
        assert_eq!(e.values, vec![EnumValue { name: "blue".into(), id: 10 }]);
        assert!(ed.set_enum_id(root, 3, 1).is_err());
    }

    #[test]
    fn pattern_edits() {
        let (mut ed, _log) = recording();
        let root = ed.add_default_root().unwrap();
        ed.select_kind(root, SchemaKind::String).unwrap();
        ed.set_pattern(root, "^[a-z]+$").unwrap();
        assert_eq!(ed.save()[0]["pattern"], "^[a-z]+$");
        assert_eq!(ed.set_pattern(root, "(["), Err(EditError::InvalidPattern("([".into())));
        assert_eq!(ed.save()[0]["pattern"], "^[a-z]+$");
        ed.set_pattern(root, "").unwrap();
        assert!(ed.save()[0].get("pattern").is_none());
    }

    #[test]
    fn remove_mode_only_for_lists() {
        let (mut ed, _log) = recording();
        let root = ed.add_default_root().unwrap();
        ed.select_kind(root, SchemaKind::Int).unwrap();
        assert!(ed.toggle_remove_mode(root).is_err());
        assert!(ed.set_pattern(root, "x").is_err());
    }

    #[test]
    fn load_is_silent_and_skips_bad_entries() {
        let (mut ed, log) = recording();
        let skipped = ed.load(&json!([
            {"name": "a", "type": "struct", "fields": [{"name": "x", "type": "bool"}]},
            {"name": "b", "type": "wat"},
            {"name": "c", "type": "array", "element_type": {"type": "float"}}
        ]));
        assert_eq!(skipped, 1);
        assert!(log.borrow().is_empty());
        assert_eq!(ed.root_nodes().len(), 2);
        let a = ed.root_nodes()[0];
        assert_eq!(ed.children(a).unwrap().len(), 1);
        let c = ed.root_nodes()[1];
        assert_eq!(ed.kind(ed.children(c).unwrap()[0]).unwrap(), SchemaKind::Float);

        let stale = a;
        ed.load(&json!([]));
        assert_eq!(ed.kind(stale), Err(EditError::UnknownNode(stale)));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn remove_selected_root() {
        let (mut ed, log) = recording();
        ed.add_root("a", Schema::Bool).unwrap();
        ed.add_root("b", Schema::Bool).unwrap();
        let c = ed.add_root("c", Schema::Bool).unwrap();
        assert_eq!(ed.remove_root(None), Ok(false));

        ed.select_root(0).unwrap();
        assert_eq!(ed.remove_root(None), Ok(true));
        assert_eq!(ed.selected_root(), None);
        assert_eq!(ed.definition(c).unwrap(), DefinitionRef::Root { index: 1 });
        assert_eq!(ed.field_name(c).unwrap(), Some("c"));
        assert_eq!(
            log.borrow().last(),
            Some(&json!([{"name": "b", "type": "bool"}, {"name": "c", "type": "bool"}]))
        );
        assert!(ed.select_root(5).is_err());
    }

    #[test]
    fn float_bounds_from_the_editor_round_trip() {
        let (mut ed, log) = recording();
        let root = ed.add_default_root().unwrap();
        ed.select_kind(root, SchemaKind::Float).unwrap();
        let before = log.borrow().len();
        for bad in [f64::NEG_INFINITY, f64::INFINITY, f64::NAN] {
            assert!(matches!(ed.set_min_value(root, Bound::Float(bad)), Err(EditError::InvalidBound { .. })));
            assert!(matches!(ed.set_max_value(root, Bound::Float(bad)), Err(EditError::InvalidBound { .. })));
        }
        assert_eq!(log.borrow().len(), before);

        ed.set_min_value(root, Bound::Float(f64::MIN)).unwrap();
        ed.set_max_value(root, Bound::Float(0.25)).unwrap();
        let schema = ed.schema(root).unwrap().clone();
        assert_eq!(parse_schema(&save_schema(&schema)).unwrap(), schema);
    }

    #[test]
    fn bounds_must_match_the_node() {
        let (mut ed, _log) = recording();
        let root = ed.add_default_root().unwrap();
        ed.select_kind(root, SchemaKind::Int).unwrap();
        let big = 9_007_199_254_740_993;
        ed.set_max_value(root, Bound::Int(big)).unwrap();
        assert_eq!(ed.save()[0]["max_value"], json!(big));
        assert_eq!(
            ed.set_min_value(root, Bound::Count(1)),
            Err(EditError::UnsupportedKind { op: "set min", kind: SchemaKind::Int })
        );

        ed.select_kind(root, SchemaKind::Array).unwrap();
        let too_many = ArraySchema::MAX_MIN_ELEMENTS + 1;
        assert!(ed.set_min_value(root, Bound::Count(too_many)).is_err());
        assert_eq!(ed.save()[0]["min_elements"], json!(0));
        assert!(ed.set_min_value(root, Bound::Float(1.0)).is_err());
    }

    #[test]
    fn host_reals_are_checked_before_use() {
        let invalid = |kind, value| matches!(Bound::checked(kind, value), Err(EditError::InvalidBound { .. }));
        assert!(invalid(SchemaKind::Array, -1.0));
        assert!(invalid(SchemaKind::Array, 2.7));
        assert!(invalid(SchemaKind::Array, f64::NAN));
        assert!(invalid(SchemaKind::Int, 0.5));
        assert!(invalid(SchemaKind::Int, 9.3e18));
        assert!(invalid(SchemaKind::Float, f64::NEG_INFINITY));
        assert_eq!(Bound::checked(SchemaKind::Array, 3.0), Ok(Bound::Count(3)));
        assert_eq!(Bound::checked(SchemaKind::Int, -4.0), Ok(Bound::Int(-4)));
        assert_eq!(Bound::checked(SchemaKind::Float, 0.5), Ok(Bound::Float(0.5)));
        assert!(matches!(Bound::checked(SchemaKind::Bool, 1.0), Err(EditError::UnsupportedKind { .. })));
    }

    #[test]
    fn only_roots_and_fields_carry_names() {
        let root = NodeId(0);
        assert!(DefinitionRef::Root { index: 0 }.has_name());
        assert!(DefinitionRef::Field { parent: root, index: 2 }.has_name());
        assert!(!DefinitionRef::ElementType { parent: root }.has_name());
    }

    #[test]
    fn swap_reuses_supplied_schema() {
        let (mut ed, _log) = recording();
        let root = ed.add_default_root().unwrap();
        let supplied = parse_schema(&json!({
            "type": "struct",
            "fields": [{"name": "inner", "type": "array", "element_type": {"type": "bool"}}]
        }))
        .unwrap();
        ed.swap_schema(root, supplied.clone()).unwrap();
        assert_eq!(ed.schema(root).unwrap(), &supplied);
        let inner = ed.children(root).unwrap()[0];
        assert_eq!(ed.kind(inner).unwrap(), SchemaKind::Array);
        assert_eq!(ed.children(inner).unwrap().len(), 1);
    }
}
