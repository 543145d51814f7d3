//! Format handlers: (protocol, format) → codec

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::Properties;
use crate::codec::Codec;
use crate::resource::{Format, Protocol};
use crate::stereotype::Stereotype;

/// Builds codecs for the (protocol, format) pairs it claims
pub trait FormatHandler: fmt::Debug + Send + Sync {
    /// Handler name for diagnostics
    fn name(&self) -> &str;

    /// Formats this handler advertises
    fn formats(&self) -> Vec<Format>;

    /// Does this handler build codecs for the pair?
    fn handles(&self, protocol: &Protocol, format: &Format) -> bool;

    /// Build a codec for the stereotype at the given pair
    fn create_codec(
        &self,
        stereotype: &Stereotype,
        protocol: &Protocol,
        format: &Format,
    ) -> anyhow::Result<Arc<dyn Codec>>;

    /// Default properties for a format (empty when none)
    fn default_properties(&self, _format: &Format) -> Properties {
        Properties::new()
    }
}

/// Ordered chain of format handlers
#[derive(Debug, Clone, Default)]
pub struct FormatHandlers {
    handlers: Vec<Arc<dyn FormatHandler>>,
}

impl FormatHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_handlers(handlers: impl IntoIterator<Item = Arc<dyn FormatHandler>>) -> Self {
        Self {
            handlers: handlers.into_iter().collect(),
        }
    }

    /// Append a handler at the end of the chain
    pub fn add(&mut self, handler: Arc<dyn FormatHandler>) {
        self.handlers.push(handler);
    }

    /// Append every handler of another chain, keeping its order
    pub fn extend_from(&mut self, other: &FormatHandlers) {
        self.handlers.extend(other.handlers.iter().cloned());
    }

    /// First handler claiming the pair
    pub fn find_handler_for(
        &self,
        protocol: &Protocol,
        format: &Format,
    ) -> Option<&Arc<dyn FormatHandler>> {
        self.handlers.iter().find(|h| h.handles(protocol, format))
    }

    /// Union of every advertised format
    ///
    /// Overlaps are reported with a warning; each format appears once.
    pub fn formats(&self) -> BTreeSet<Format> {
        let mut formats = BTreeSet::new();

        for handler in &self.handlers {
            let current = handler.formats();

            if current.iter().any(|f| formats.contains(f)) {
                warn!(
                    handler = handler.name(),
                    formats = ?current,
                    "format handler provides one or more duplicate default formats"
                );
            }

            formats.extend(current);
        }

        formats
    }

    /// First non-empty default property map, in chain order
    pub fn format_properties(&self, format: &Format) -> Properties {
        self.handlers
            .iter()
            .map(|h| h.default_properties(format))
            .find(|props| !props.is_empty())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn FormatHandler>> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<'a> IntoIterator for &'a FormatHandlers {
    type Item = &'a Arc<dyn FormatHandler>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn FormatHandler>>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.iter()
    }
}
