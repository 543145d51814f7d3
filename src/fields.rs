//! Field schemas
//!
//! An ordered list of named, optionally typed columns, plus three sentinels:
//! `None` (no fields), `All` and `Unknown`. `All` and `Unknown` are distinct
//! values but interchangeable for conflict detection, so every registry
//! stores schemas through [`FieldSchema::normalized`].

use std::fmt;

/// A single named column with an optional type name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    type_name: Option<String>,
}

impl Field {
    /// Untyped field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
        }
    }

    /// Field with a type name (e.g. "int", "long", "string")
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_name {
            Some(t) => write!(f, "'{}':{}", self.name, t),
            None => write!(f, "'{}'", self.name),
        }
    }
}

/// Ordered, typed column list or one of the sentinels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSchema {
    /// No fields
    None,
    /// Every field
    All,
    /// Fields not declared
    Unknown,
    /// Explicit ordered columns (never empty, see [`FieldSchema::declared`])
    Declared(Vec<Field>),
}

impl FieldSchema {
    /// Schema from explicit columns; an empty list is [`FieldSchema::None`]
    pub fn declared(fields: impl IntoIterator<Item = Field>) -> Self {
        let fields: Vec<Field> = fields.into_iter().collect();
        if fields.is_empty() {
            FieldSchema::None
        } else {
            FieldSchema::Declared(fields)
        }
    }

    /// Untyped schema from names
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::declared(names.into_iter().map(Field::new))
    }

    /// Typed schema from (name, type) pairs
    pub fn typed<I, N, T>(fields: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        Self::declared(fields.into_iter().map(|(n, t)| Field::typed(n, t)))
    }

    /// `All` becomes `Unknown`; everything else is unchanged
    pub fn normalized(self) -> Self {
        match self {
            FieldSchema::All => FieldSchema::Unknown,
            other => other,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, FieldSchema::Unknown)
    }

    /// Declared columns, empty for sentinels
    pub fn fields(&self) -> &[Field] {
        match self {
            FieldSchema::Declared(fields) => fields,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

impl fmt::Display for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSchema::None => f.write_str("NONE"),
            FieldSchema::All => f.write_str("ALL"),
            FieldSchema::Unknown => f.write_str("UNKNOWN"),
            FieldSchema::Declared(fields) => {
                f.write_str("[")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Normalize an optional schema (absent stays absent)
pub(crate) fn normalize(fields: Option<FieldSchema>) -> Option<FieldSchema> {
    fields.map(FieldSchema::normalized)
}

/// Render an optional schema for error messages
pub(crate) fn describe(fields: Option<&FieldSchema>) -> String {
    match fields {
        Some(f) => f.to_string(),
        None => "<unset>".to_string(),
    }
}
