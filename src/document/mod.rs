//! Documents and dotted-path field access.

pub mod document;
pub mod path;

pub use document::{Document, ID_FIELD, VECTOR_FIELD_MARKER};
pub use path::{
    FieldPath, OnMissing, field_exists, get_field, get_field_across, set_field, set_field_across,
};
