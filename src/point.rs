//! Binding point: the (protocol, format) key of codec registries

use std::fmt;

use crate::resource::{Format, Protocol};

/// Immutable (protocol, format) pair used as a map key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingPoint {
    pub protocol: Protocol,
    pub format: Format,
}

impl BindingPoint {
    pub fn new(protocol: impl Into<Protocol>, format: impl Into<Format>) -> Self {
        Self {
            protocol: protocol.into(),
            format: format.into(),
        }
    }
}

impl fmt::Display for BindingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[protocol={}, format={}]", self.protocol, self.format)
    }
}
