//! End-to-end behaviour through the public API: codec, defaults, the schema
//! editor and the value slot working together.
use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};
use structural_inspector::path::{self, Position};
use structural_inspector::schema::{
    conform, parse_schema, validate, ArraySchema, IntSchema, StructSchema, ViolationKind,
};
use structural_inspector::{
    default_value, save_schema, Bound, Field, PathError, PathKey, ResourceSchema, Schema,
    SchemaEditor, SchemaKind, ValueSlot,
};

fn recorder() -> (Rc<RefCell<Vec<Value>>>, impl FnMut(&Value) + 'static) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = {
        let log = Rc::clone(&log);
        move |v: &Value| log.borrow_mut().push(v.clone())
    };
    (log, sink)
}

#[test]
fn int_with_bounds_parses_and_defaults_to_zero() {
    let schema = parse_schema(&json!({"type": "int", "min_value": 0, "max_value": 10})).unwrap();
    assert_eq!(schema, Schema::Int(IntSchema { min_value: 0, max_value: 10 }));
    assert_eq!(default_value(&schema), json!(0));
}

#[test]
fn string_default_ignores_the_pattern() {
    let schema = parse_schema(&json!({"type": "string", "pattern": "^[a-z]+$"})).unwrap();
    let value = default_value(&schema);
    assert_eq!(value, json!(""));
    let found = validate(&schema, &value);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, ViolationKind::PatternMismatch { pattern: "^[a-z]+$".into() });
}

#[test]
fn struct_defaults_and_saves_in_field_order() {
    let schema = Schema::Struct(StructSchema {
        fields: vec![
            Field { name: "a".into(), def: Schema::Int(IntSchema::default()) },
            Field { name: "b".into(), def: Schema::Bool },
        ],
    });
    assert_eq!(default_value(&schema), json!({"a": 0, "b": false}));

    let saved = save_schema(&schema);
    assert_eq!(
        saved,
        json!({
            "type": "struct",
            "fields": [
                {"name": "a", "type": "int", "min_value": i64::MIN, "max_value": i64::MAX},
                {"name": "b", "type": "bool"}
            ]
        })
    );
    let keys = saved["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn array_default_uses_min_elements() {
    let schema = Schema::Array(ArraySchema {
        element_type: Box::new(Schema::Bool),
        min_elements: 2,
        max_elements: 4,
    });
    assert_eq!(default_value(&schema), json!([false, false]));
}

#[test]
fn removing_first_field_moves_the_second_into_its_place() {
    let (_log, sink) = recorder();
    let mut editor = SchemaEditor::new(sink);
    let schema = parse_schema(&json!({
        "type": "struct",
        "fields": [
            {"name": "a", "type": "int"},
            {"name": "b", "type": "string"},
            {"name": "c", "type": "bool"}
        ]
    }))
    .unwrap();
    let root = editor.add_root("stats", schema.clone()).unwrap();
    let fields = editor.children(root).unwrap().to_vec();

    let mut slot = ValueSlot::new(schema, structural_inspector::Discard);
    slot.update_value(&["b".into()], json!("kept")).unwrap();

    editor.toggle_remove_mode(root).unwrap();
    assert!(editor.child_clicked(root, 0).unwrap());

    // the node that used to sit at index 1 now resolves through index 0
    let b = fields[1];
    assert_eq!(editor.children(root).unwrap()[0], b);
    assert_eq!(editor.definition(b).unwrap(), structural_inspector::DefinitionRef::Field { parent: root, index: 0 });
    assert_eq!(editor.kind(b).unwrap(), SchemaKind::String);

    slot.set_schema(editor.schema(root).unwrap().clone());
    let key = editor.key(b).unwrap();
    assert_eq!(key, PathKey::Field("b".into()));
    assert_eq!(slot.read(&[key]), Some(&json!("kept")));
    assert_eq!(slot.value(), &json!({"b": "kept", "c": false}));
}

#[test]
fn minus_one_position_appends() {
    let mut value = json!({"list": [1, 2]});
    let pos = Position::from_sentinel(-1).unwrap();
    path::insert_element(&mut value, &["list".into()], json!(3), pos).unwrap();
    assert_eq!(value["list"], json!([1, 2, 3]));
    assert_eq!(Position::from_sentinel(-2), Err(PathError::InvalidPosition(-2)));
}

#[test]
fn editor_commits_flow_into_the_resource() {
    let resource = Rc::new(RefCell::new(ResourceSchema::default()));
    let mut editor = {
        let resource = Rc::clone(&resource);
        SchemaEditor::new(move |v: &Value| {
            use structural_inspector::ChangeSink;
            resource.borrow_mut().changed(v);
        })
    };
    let root = editor.add_default_root().unwrap();
    editor.set_field_name(root, "loot").unwrap();
    editor.select_kind(root, SchemaKind::Array).unwrap();
    let elem = editor.children(root).unwrap()[0];
    editor.select_kind(elem, SchemaKind::Int).unwrap();
    editor.set_max_value(root, Bound::Count(3)).unwrap();

    let info = resource.borrow_mut().info().clone();
    let Some(Schema::Array(loot)) = info.get("loot") else { panic!("loot should be an array") };
    assert_eq!(loot.max_elements, 3);
    assert_eq!(loot.element_type.kind(), SchemaKind::Int);

    // a value slot built from the resource enforces the new bound
    let mut slot = ValueSlot::new(info["loot"].clone(), structural_inspector::Discard);
    for n in 0..3 {
        slot.add_array_element(&[], Position::End, json!(n)).unwrap();
    }
    assert_eq!(
        slot.add_array_element(&[], Position::End, json!(9)),
        Err(PathError::ArrayFull { max: 3 })
    );
    assert_eq!(slot.value(), &json!([0, 1, 2]));
}

#[test]
fn schema_change_conforms_stale_values() {
    let before = parse_schema(&json!({
        "type": "struct",
        "fields": [{"name": "hp", "type": "int"}, {"name": "old", "type": "bool"}]
    }))
    .unwrap();
    let after = parse_schema(&json!({
        "type": "struct",
        "fields": [{"name": "hp", "type": "int", "max_value": 50}, {"name": "new", "type": "string"}]
    }))
    .unwrap();
    let stale = json!({"hp": 80, "old": true});
    assert!(validate(&before, &stale).is_empty());
    let fixed = conform(&after, &stale);
    assert_eq!(fixed, json!({"hp": 50, "new": ""}));
    assert!(validate(&after, &fixed).is_empty());
}
