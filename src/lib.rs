//! Schema-driven structured-value editing core.
//!
//! A [`Schema`] tree describes one value slot; the codec persists it as plain
//! JSON records, [`default_value`] builds a fresh value for it, and the
//! [`path`] module reads and rewrites nested values by key path. On top of
//! that sit the two editors: [`SchemaEditor`] for authoring schemas and
//! [`ValueSlot`] for editing a value against one.
pub mod cli;
pub mod document;
pub mod editor;
pub mod error;
pub mod logging;
pub mod notify;
pub mod path;
pub mod path_de;
pub mod resource;
pub mod schema;

pub use editor::{AddedChild, Bound, DefinitionRef, NodeId, SchemaEditor};
pub use error::{DocumentError, EditError, ParseError, PathError};
pub use notify::{ChangeSink, Discard};
pub use path::{Path, PathKey, Position};
pub use resource::{ResourceSchema, ValueSlot};
pub use schema::{default_value, parse_schema, save_schema, Field, Schema, SchemaKind};
