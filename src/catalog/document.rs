//! Persisted catalog document model
//!
//! ```yaml
//! - name: events
//!   defaultProtocol: s3
//!   defaultFormat: json
//!   fields:
//!     names: [id, ts]
//!     types: [int, long]
//! - name: raw
//!   defaultProtocol: file
//!   fields:
//!     kind: UNKNOWN
//! ```
//!
//! Unknown keys are ignored on read. Codecs and handlers are not persisted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};
use crate::fields::{Field, FieldSchema};
use crate::resource::{Format, Protocol};
use crate::stereotype::Stereotype;

/// Ordered list of stereotype records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogDocument {
    pub stereotypes: Vec<StereotypeRecord>,
}

/// One stereotype as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StereotypeRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_format: Option<Format>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldsRecord>,
}

/// Sentinel kinds of a fields record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldsKind {
    None,
    All,
    Unknown,
}

/// `{kind: ...}` or `{names: [...], types: [...]?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldsRecord {
    Kind {
        kind: FieldsKind,
    },
    Declared {
        names: Vec<String>,
        /// `types[i]` missing or null means untyped
        #[serde(default, skip_serializing_if = "Option::is_none")]
        types: Option<Vec<Option<String>>>,
    },
}

impl From<&FieldSchema> for FieldsRecord {
    fn from(schema: &FieldSchema) -> Self {
        match schema {
            FieldSchema::None => FieldsRecord::Kind {
                kind: FieldsKind::None,
            },
            FieldSchema::All => FieldsRecord::Kind {
                kind: FieldsKind::All,
            },
            FieldSchema::Unknown => FieldsRecord::Kind {
                kind: FieldsKind::Unknown,
            },
            FieldSchema::Declared(fields) => {
                let names = fields.iter().map(|f| f.name().to_string()).collect();
                let types = fields
                    .iter()
                    .any(|f| f.type_name().is_some())
                    .then(|| {
                        fields
                            .iter()
                            .map(|f| f.type_name().map(str::to_string))
                            .collect()
                    });
                FieldsRecord::Declared { names, types }
            }
        }
    }
}

impl TryFrom<FieldsRecord> for FieldSchema {
    type Error = BindError;

    fn try_from(record: FieldsRecord) -> Result<Self> {
        match record {
            FieldsRecord::Kind { kind } => Ok(match kind {
                FieldsKind::None => FieldSchema::None,
                FieldsKind::All => FieldSchema::All,
                FieldsKind::Unknown => FieldSchema::Unknown,
            }),
            FieldsRecord::Declared { names, types } => {
                let types = types.unwrap_or_default();
                if types.len() > names.len() {
                    return Err(BindError::InvalidFields {
                        reason: format!(
                            "{} types given for {} names",
                            types.len(),
                            names.len()
                        ),
                    });
                }

                let mut types = types.into_iter();
                Ok(FieldSchema::declared(names.into_iter().map(|name| {
                    match types.next().flatten() {
                        Some(t) => Field::typed(name, t),
                        None => Field::new(name),
                    }
                })))
            }
        }
    }
}

impl From<&Stereotype> for StereotypeRecord {
    fn from(stereotype: &Stereotype) -> Self {
        Self {
            name: stereotype.name().to_string(),
            default_protocol: stereotype.default_protocol().cloned(),
            default_format: stereotype.default_format().cloned(),
            fields: stereotype.fields().as_ref().map(FieldsRecord::from),
        }
    }
}

impl StereotypeRecord {
    /// Build a stereotype with no codecs and no handlers
    pub fn into_stereotype(self) -> Result<Stereotype> {
        let mut builder = Stereotype::builder(self.name);

        if let Some(protocol) = self.default_protocol {
            builder = builder.default_protocol(protocol);
        }
        if let Some(format) = self.default_format {
            builder = builder.default_format(format);
        }
        if let Some(fields) = self.fields {
            builder = builder.fields(FieldSchema::try_from(fields)?);
        }

        builder.build()
    }
}

/// Serialization picked from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DocumentKind {
    Json,
    Yaml,
}

impl DocumentKind {
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(DocumentKind::Json),
            Some("yaml") | Some("yml") => Ok(DocumentKind::Yaml),
            _ => Err(BindError::UnsupportedDocument {
                path: path.display().to_string(),
            }),
        }
    }
}
