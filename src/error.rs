// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Error types with error codes and fix suggestions
//!
//! Error code ranges:
//! - BIND-010-019: Binding conflicts (catalog uniqueness, codec schemas)
//! - BIND-020-029: Unbound roles
//! - BIND-030-039: Handler lookup and construction
//! - BIND-040-049: Invalid arguments
//! - BIND-050-059: Documents, configuration and IO

use thiserror::Error;

use crate::codec::Role;

pub type Result<T> = std::result::Result<T, BindError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Coarse error taxonomy shared by every [`BindError`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Duplicate stereotype name/schema, or mismatched codec schema
    BindingConflict,
    /// Resolving a role with no stereotype or no resources bound
    UnboundRole,
    /// No format or protocol handler claims the request
    NoHandlerFound,
    /// Empty name, missing protocol, unknown reference
    InvalidArgument,
    /// Catalog documents and binding manifests
    Document,
}

#[derive(Error, Debug)]
pub enum BindError {
    // ─────────────────────────────────────────────────────────────
    // Binding conflicts (BIND-010 to BIND-012)
    // ─────────────────────────────────────────────────────────────

    #[error("BIND-010: Catalog already contains stereotype '{name}' (fields: {fields})")]
    DuplicateStereotype { name: String, fields: String },

    #[error("BIND-011: Catalog already contains fields {fields} (stereotype: '{existing}')")]
    DuplicateFields { fields: String, existing: String },

    #[error("BIND-012: All codecs in stereotype '{stereotype}' must have the same {role} fields, expected: {expected}, received: {received}")]
    FieldsMismatch {
        stereotype: String,
        role: Role,
        expected: String,
        received: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Unbound roles (BIND-020 to BIND-021)
    // ─────────────────────────────────────────────────────────────

    #[error("BIND-020: No stereotype bound for {role} '{name}'")]
    UnboundRole { role: Role, name: String },

    #[error("BIND-021: No resource bound for {role} '{name}'")]
    NoResourceBound { role: Role, name: String },

    // ─────────────────────────────────────────────────────────────
    // Handlers (BIND-030 to BIND-032)
    // ─────────────────────────────────────────────────────────────

    #[error("BIND-030: No format handler for protocol '{protocol}', format '{format}'")]
    NoFormatHandler { protocol: String, format: String },

    #[error("BIND-031: No protocol handler for protocol '{protocol}'")]
    NoProtocolHandler { protocol: String },

    #[error("BIND-032: Handler '{handler}' failed: {details}")]
    HandlerFailed { handler: String, details: String },

    // ─────────────────────────────────────────────────────────────
    // Invalid arguments (BIND-040 to BIND-042)
    // ─────────────────────────────────────────────────────────────

    #[error("BIND-040: {what} may not be empty")]
    EmptyName { what: &'static str },

    #[error("BIND-041: No protocol given for format '{format}' and stereotype '{stereotype}' has no default protocol")]
    MissingProtocol { stereotype: String, format: String },

    #[error("BIND-042: Unknown stereotype '{stereotype}' referenced by {role} '{name}'")]
    UnknownStereotype {
        stereotype: String,
        role: Role,
        name: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Documents and IO (BIND-050 to BIND-054)
    // ─────────────────────────────────────────────────────────────

    #[error("BIND-050: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BIND-051: YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("BIND-052: IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("BIND-053: Unsupported document extension for '{path}' (expected .json, .yaml or .yml)")]
    UnsupportedDocument { path: String },

    #[error("BIND-054: Invalid fields record: {reason}")]
    InvalidFields { reason: String },
}

impl BindError {
    /// Get the error code (e.g., "BIND-010")
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateStereotype { .. } => "BIND-010",
            Self::DuplicateFields { .. } => "BIND-011",
            Self::FieldsMismatch { .. } => "BIND-012",
            Self::UnboundRole { .. } => "BIND-020",
            Self::NoResourceBound { .. } => "BIND-021",
            Self::NoFormatHandler { .. } => "BIND-030",
            Self::NoProtocolHandler { .. } => "BIND-031",
            Self::HandlerFailed { .. } => "BIND-032",
            Self::EmptyName { .. } => "BIND-040",
            Self::MissingProtocol { .. } => "BIND-041",
            Self::UnknownStereotype { .. } => "BIND-042",
            Self::Json(_) => "BIND-050",
            Self::Yaml(_) => "BIND-051",
            Self::Io(_) => "BIND-052",
            Self::UnsupportedDocument { .. } => "BIND-053",
            Self::InvalidFields { .. } => "BIND-054",
        }
    }

    /// Map to the coarse taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateStereotype { .. }
            | Self::DuplicateFields { .. }
            | Self::FieldsMismatch { .. } => ErrorKind::BindingConflict,
            Self::UnboundRole { .. } | Self::NoResourceBound { .. } => ErrorKind::UnboundRole,
            // A handler that claimed the request but failed is still a handler-stage failure
            Self::NoFormatHandler { .. }
            | Self::NoProtocolHandler { .. }
            | Self::HandlerFailed { .. } => ErrorKind::NoHandlerFound,
            Self::EmptyName { .. }
            | Self::MissingProtocol { .. }
            | Self::UnknownStereotype { .. } => ErrorKind::InvalidArgument,
            Self::Json(_)
            | Self::Yaml(_)
            | Self::Io(_)
            | Self::UnsupportedDocument { .. }
            | Self::InvalidFields { .. } => ErrorKind::Document,
        }
    }
}

impl FixSuggestion for BindError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BindError::DuplicateStereotype { .. } => {
                Some("Stereotype names are case-insensitive; rename or remove the existing one")
            }
            BindError::DuplicateFields { .. } => {
                Some("Reuse the existing stereotype for this schema instead of registering a new one")
            }
            BindError::FieldsMismatch { .. } => {
                Some("Every codec of a stereotype must read and write the stereotype's fields")
            }
            BindError::UnboundRole { .. } => {
                Some("Call set_source_stereotype/set_sink_stereotype for this name first")
            }
            BindError::NoResourceBound { .. } => {
                Some("Call add_source_resources/add_sink_resources for this name first")
            }
            BindError::NoFormatHandler { .. } => {
                Some("Register a format handler for this format, or add a static codec to the stereotype")
            }
            BindError::NoProtocolHandler { .. } => Some("Register a protocol handler for this protocol"),
            BindError::HandlerFailed { .. } => Some("Check the handler's configuration for this resource"),
            BindError::EmptyName { .. } => Some("Provide a non-empty name"),
            BindError::MissingProtocol { .. } => {
                Some("Give the resource an explicit protocol or the stereotype a default protocol")
            }
            BindError::UnknownStereotype { .. } => {
                Some("Add the stereotype to the catalog before applying the configuration")
            }
            BindError::Json(_) => Some("Check JSON syntax"),
            BindError::Yaml(_) => Some("Check YAML syntax: indentation and quoting"),
            BindError::Io(_) => Some("Check file path and permissions"),
            BindError::UnsupportedDocument { .. } => Some("Use a .json, .yaml or .yml file"),
            BindError::InvalidFields { .. } => {
                Some("Use {kind: NONE|ALL|UNKNOWN} or {names: [...], types: [...]}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_code() {
        let err = BindError::UnboundRole {
            role: Role::Source,
            name: "missing".to_string(),
        };
        assert!(err.to_string().starts_with("BIND-020"));
        assert_eq!(err.code(), "BIND-020");
        assert_eq!(err.kind(), ErrorKind::UnboundRole);
    }

    #[test]
    fn every_variant_code_matches_message_prefix() {
        let errors = vec![
            BindError::DuplicateFields {
                fields: "UNKNOWN".into(),
                existing: "x".into(),
            },
            BindError::NoProtocolHandler {
                protocol: "s3".into(),
            },
            BindError::EmptyName { what: "role name" },
            BindError::UnsupportedDocument {
                path: "catalog.txt".into(),
            },
        ];
        for err in errors {
            assert!(err.to_string().starts_with(err.code()), "{err}");
            assert!(err.fix_suggestion().is_some());
        }
    }

    #[test]
    fn handler_failure_is_handler_stage() {
        let err = BindError::HandlerFailed {
            handler: "csv".into(),
            details: "boom".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NoHandlerFound);
    }
}
