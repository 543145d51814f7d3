//! Physical resource handles
//!
//! Protocol handlers build one [`ResourceHandle`] per resource. A role bound
//! to several resources resolves to a multiplexed [`Handle`]: fan-in for
//! sources, fan-out for sinks, members in resource-list order.

use std::fmt;
use std::slice;
use std::sync::Arc;

use crate::codec::Role;

/// Executable read/write endpoint for one concrete location (opaque)
pub trait ResourceHandle: fmt::Debug + Send + Sync {
    /// Identifier of the resource this handle was built for
    fn identifier(&self) -> &str;
}

/// Shared handle produced by a protocol handler
pub type SharedHandle = Arc<dyn ResourceHandle>;

/// Resolved handle for one logical role
#[derive(Debug, Clone)]
pub enum Handle {
    /// Exactly one resource bound
    Single(SharedHandle),
    /// Fan-in: reads from every member
    MultiSource(Vec<SharedHandle>),
    /// Fan-out: writes to every member
    MultiSink(Vec<SharedHandle>),
}

impl Handle {
    /// Wrap handles for a role: one stays single, more are multiplexed
    ///
    /// Returns `None` for an empty list.
    pub fn from_members(role: Role, mut members: Vec<SharedHandle>) -> Option<Self> {
        match members.len() {
            0 => None,
            1 => members.pop().map(Handle::Single),
            _ => Some(match role {
                Role::Source => Handle::MultiSource(members),
                Role::Sink => Handle::MultiSink(members),
            }),
        }
    }

    /// Member handles in resource order
    pub fn members(&self) -> &[SharedHandle] {
        match self {
            Handle::Single(handle) => slice::from_ref(handle),
            Handle::MultiSource(members) | Handle::MultiSink(members) => members,
        }
    }

    pub fn len(&self) -> usize {
        self.members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    pub fn is_multiplexed(&self) -> bool {
        !matches!(self, Handle::Single(_))
    }

    /// Identifiers of all members, in order
    pub fn identifiers(&self) -> Vec<&str> {
        self.members().iter().map(|h| h.identifier()).collect()
    }
}
