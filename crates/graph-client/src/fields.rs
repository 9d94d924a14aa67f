//! Field-selection query building
//!
//! The Graph API selects response fields with a nested expansion syntax:
//! siblings join with commas, sub-selections nest in braces, e.g.
//! `id,attachments{media_type,url}`. `Field` models that tree and
//! `render_fields` flattens it, preserving input order.

/// One node of a field-selection tree.
#[derive(Debug, Clone)]
pub enum Field {
    /// A plain field name, e.g. `id`
    Name(String),
    /// A named sub-selection, e.g. `attachments{media_type,url}`
    Nested(String, Vec<Field>),
}

impl Field {
    /// A plain field.
    pub fn name(name: impl Into<String>) -> Self {
        Field::Name(name.into())
    }

    /// A field with a nested sub-selection.
    pub fn nested(name: impl Into<String>, children: impl IntoIterator<Item = Field>) -> Self {
        Field::Nested(name.into(), children.into_iter().collect())
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::Name(name.to_owned())
    }
}

/// Render a field-selection tree into Graph field-expansion syntax.
///
/// Output order matches input order; nested selections render
/// recursively. An empty slice renders as an empty string.
pub fn render_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(render_one)
        .collect::<Vec<_>>()
        .join(",")
}

fn render_one(field: &Field) -> String {
    match field {
        Field::Name(name) => name.clone(),
        Field::Nested(name, children) => format!("{name}{{{}}}", render_fields(children)),
    }
}
