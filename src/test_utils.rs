//! Test utilities (only available in test builds or with `test-fixtures`)
//!
//! Mock collaborators standing in for the execution engine:
//!
//! - [`MockCodec`] - codec with configurable roles and fields
//! - [`MockFormatHandler`] - counts `create_codec` calls, can fail on demand
//! - [`MockProtocolHandler`] - builds [`MockHandle`]s, counts calls
//!
//! ```rust,ignore
//! use stereobind::test_utils::*;
//!
//! let handler = Arc::new(MockFormatHandler::new("csv", ["csv", "tsv"]));
//! let stereotype = Stereotype::builder("events")
//!     .default_protocol("file")
//!     .handlers(FormatHandlers::from_handlers([handler.clone() as Arc<dyn FormatHandler>]))
//!     .build()?;
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec::Codec;
use crate::fields::FieldSchema;
use crate::handle::{ResourceHandle, SharedHandle};
use crate::handler::{FormatHandler, Properties, ProtocolHandler};
use crate::resource::{Format, Protocol, Resource};
use crate::stereotype::Stereotype;

// ═══════════════════════════════════════════════════════════════════════════
// CODECS
// ═══════════════════════════════════════════════════════════════════════════

/// Codec with configurable roles and fields
#[derive(Debug, Clone)]
pub struct MockCodec {
    source: bool,
    sink: bool,
    source_fields: Option<FieldSchema>,
    sink_fields: Option<FieldSchema>,
    /// Who built it (handler name or "static")
    pub origin: String,
}

impl MockCodec {
    /// Source and sink codec exposing the same fields
    pub fn new(fields: FieldSchema) -> Self {
        Self {
            source: true,
            sink: true,
            source_fields: Some(fields.clone()),
            sink_fields: Some(fields),
            origin: "static".to_string(),
        }
    }

    pub fn source_only(fields: FieldSchema) -> Self {
        Self {
            sink: false,
            sink_fields: None,
            ..Self::new(fields)
        }
    }

    pub fn sink_only(fields: FieldSchema) -> Self {
        Self {
            source: false,
            source_fields: None,
            ..Self::new(fields)
        }
    }

    pub fn with_sink_fields(mut self, fields: FieldSchema) -> Self {
        self.sink_fields = Some(fields);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

impl Codec for MockCodec {
    fn is_source(&self) -> bool {
        self.source
    }

    fn is_sink(&self) -> bool {
        self.sink
    }

    fn source_fields(&self) -> Option<&FieldSchema> {
        self.source_fields.as_ref()
    }

    fn sink_fields(&self) -> Option<&FieldSchema> {
        self.sink_fields.as_ref()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// FORMAT HANDLERS
// ═══════════════════════════════════════════════════════════════════════════

/// Format handler claiming its advertised formats for any protocol
#[derive(Debug)]
pub struct MockFormatHandler {
    name: String,
    formats: Vec<Format>,
    properties: Properties,
    claims_all: bool,
    fail: bool,
    calls: AtomicUsize,
}

impl MockFormatHandler {
    pub fn new<I, S>(name: &str, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Format>,
    {
        Self {
            name: name.to_string(),
            formats: formats.into_iter().map(Into::into).collect(),
            properties: Properties::new(),
            claims_all: false,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Claim every (protocol, format) pair, advertised or not
    pub fn claiming_all(mut self) -> Self {
        self.claims_all = true;
        self
    }

    /// Fail every `create_codec` call
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_property<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties
            .insert(key.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Number of `create_codec` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FormatHandler for MockFormatHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn formats(&self) -> Vec<Format> {
        self.formats.clone()
    }

    fn handles(&self, _protocol: &Protocol, format: &Format) -> bool {
        self.claims_all || self.formats.contains(format)
    }

    fn create_codec(
        &self,
        stereotype: &Stereotype,
        _protocol: &Protocol,
        format: &Format,
    ) -> anyhow::Result<Arc<dyn Codec>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            anyhow::bail!("{} cannot build a codec for format '{}'", self.name, format);
        }

        let fields = stereotype.fields().unwrap_or(FieldSchema::Unknown);
        Ok(Arc::new(MockCodec::new(fields).with_origin(self.name.clone())))
    }

    fn default_properties(&self, format: &Format) -> Properties {
        if self.formats.contains(format) {
            self.properties.clone()
        } else {
            Properties::new()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PROTOCOL HANDLERS
// ═══════════════════════════════════════════════════════════════════════════

/// Handle recording what it was built from
#[derive(Debug)]
pub struct MockHandle {
    pub identifier: String,
    pub handler: String,
    pub codec: Arc<dyn Codec>,
    pub resource: Resource,
}

impl ResourceHandle for MockHandle {
    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Protocol handler claiming its advertised protocols
///
/// Records every codec it is handed, in call order.
#[derive(Debug)]
pub struct MockProtocolHandler {
    name: String,
    protocols: Vec<Protocol>,
    properties: Properties,
    fail: bool,
    calls: AtomicUsize,
    received: Mutex<Vec<Arc<dyn Codec>>>,
}

impl MockProtocolHandler {
    pub fn new<I, S>(name: &str, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Protocol>,
    {
        Self {
            name: name.to_string(),
            protocols: protocols.into_iter().map(Into::into).collect(),
            properties: Properties::new(),
            fail: false,
            calls: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Fail every `create_handle` call
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_property<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties
            .insert(key.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Number of `create_handle` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Codecs passed to `create_handle`, in call order
    pub fn received_codecs(&self) -> Vec<Arc<dyn Codec>> {
        self.received.lock().clone()
    }
}

impl ProtocolHandler for MockProtocolHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocols(&self) -> Vec<Protocol> {
        self.protocols.clone()
    }

    fn handles(&self, protocol: &Protocol) -> bool {
        self.protocols.contains(protocol)
    }

    fn create_handle(
        &self,
        codec: Arc<dyn Codec>,
        resource: &Resource,
    ) -> anyhow::Result<SharedHandle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().push(Arc::clone(&codec));

        if self.fail {
            anyhow::bail!("{} cannot open '{}'", self.name, resource.identifier());
        }

        Ok(Arc::new(MockHandle {
            identifier: resource.identifier().to_string(),
            handler: self.name.clone(),
            codec,
            resource: resource.clone(),
        }))
    }

    fn default_properties(&self, protocol: &Protocol) -> Properties {
        if self.protocols.contains(protocol) {
            self.properties.clone()
        } else {
            Properties::new()
        }
    }
}
