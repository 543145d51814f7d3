//! Codec collaborator
//!
//! A codec is a format-specific reader/writer descriptor built by the
//! execution engine. This crate only asks which roles it plays and which
//! field schemas it exposes, and compares those schemas for equality.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fields::FieldSchema;

/// Side of a pipeline a role or codec sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Source,
    Sink,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => f.write_str("source"),
            Role::Sink => f.write_str("sink"),
        }
    }
}

/// Format-specific reader/writer descriptor (opaque to this crate)
pub trait Codec: fmt::Debug + Send + Sync {
    /// Can this codec read?
    fn is_source(&self) -> bool;

    /// Can this codec write?
    fn is_sink(&self) -> bool;

    /// Fields produced when reading
    fn source_fields(&self) -> Option<&FieldSchema>;

    /// Fields consumed when writing
    fn sink_fields(&self) -> Option<&FieldSchema>;

    /// Fields exposed for the given role, if the codec plays it
    fn fields_for(&self, role: Role) -> Option<Option<&FieldSchema>> {
        match role {
            Role::Source if self.is_source() => Some(self.source_fields()),
            Role::Sink if self.is_sink() => Some(self.sink_fields()),
            _ => None,
        }
    }
}
