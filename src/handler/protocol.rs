//! Protocol handlers: protocol → physical resource handle

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::Properties;
use crate::codec::Codec;
use crate::handle::SharedHandle;
use crate::resource::{Protocol, Resource};

/// Builds physical handles for the protocols it claims
pub trait ProtocolHandler: fmt::Debug + Send + Sync {
    /// Handler name for diagnostics
    fn name(&self) -> &str;

    /// Protocols this handler advertises
    fn protocols(&self) -> Vec<Protocol>;

    /// Does this handler build handles for the protocol?
    fn handles(&self, protocol: &Protocol) -> bool;

    /// Build the handle the execution engine will read or write
    fn create_handle(
        &self,
        codec: Arc<dyn Codec>,
        resource: &Resource,
    ) -> anyhow::Result<SharedHandle>;

    /// Default properties for a protocol (empty when none)
    fn default_properties(&self, _protocol: &Protocol) -> Properties {
        Properties::new()
    }
}

/// Ordered chain of protocol handlers
#[derive(Debug, Clone, Default)]
pub struct ProtocolHandlers {
    handlers: Vec<Arc<dyn ProtocolHandler>>,
}

impl ProtocolHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_handlers(handlers: impl IntoIterator<Item = Arc<dyn ProtocolHandler>>) -> Self {
        Self {
            handlers: handlers.into_iter().collect(),
        }
    }

    /// Append a handler at the end of the chain
    pub fn add(&mut self, handler: Arc<dyn ProtocolHandler>) {
        self.handlers.push(handler);
    }

    /// Append every handler of another chain, keeping its order
    pub fn extend_from(&mut self, other: &ProtocolHandlers) {
        self.handlers.extend(other.handlers.iter().cloned());
    }

    /// First handler claiming the protocol
    pub fn find_handler_for(&self, protocol: &Protocol) -> Option<&Arc<dyn ProtocolHandler>> {
        self.handlers.iter().find(|h| h.handles(protocol))
    }

    /// Union of every advertised protocol
    ///
    /// Overlaps are reported with a warning; each protocol appears once.
    pub fn protocols(&self) -> BTreeSet<Protocol> {
        let mut protocols = BTreeSet::new();

        for handler in &self.handlers {
            let current = handler.protocols();

            if current.iter().any(|p| protocols.contains(p)) {
                warn!(
                    handler = handler.name(),
                    protocols = ?current,
                    "protocol handler provides one or more duplicate default protocols"
                );
            }

            protocols.extend(current);
        }

        protocols
    }

    /// First non-empty default property map, in chain order
    pub fn protocol_properties(&self, protocol: &Protocol) -> Properties {
        self.handlers
            .iter()
            .map(|h| h.default_properties(protocol))
            .find(|props| !props.is_empty())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ProtocolHandler>> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProtocolHandlers {
    type Item = &'a Arc<dyn ProtocolHandler>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn ProtocolHandler>>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.iter()
    }
}
