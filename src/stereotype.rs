//! Stereotypes: named schema bindings
//!
//! A [`Stereotype`] ties a name to a default protocol, a default format, a
//! canonical field schema and a set of codecs keyed by [`BindingPoint`].
//!
//! Two codec maps are kept apart:
//!
//! - **static** codecs, added with [`Stereotype::add_codec_for`] and
//!   validated against the stereotype's fields (behind one `RwLock` with the
//!   fields, so a failed add leaves both untouched)
//! - **resolved** codecs, built on demand by a [`FormatHandler`] and cached in
//!   a `DashMap` only while the stereotype has no declared schema
//!
//! A stereotype with a declared schema never caches resolved codecs; each
//! lookup asks the handler chain again.
//!
//! [`FormatHandler`]: crate::handler::FormatHandler

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::codec::{Codec, Role};
use crate::error::{BindError, Result};
use crate::fields::{describe, normalize, FieldSchema};
use crate::handler::FormatHandlers;
use crate::point::BindingPoint;
use crate::resource::{Format, Protocol};

/// Fields and static codecs, validated and committed together
#[derive(Debug, Clone, Default)]
struct CodecRegistry {
    fields: Option<FieldSchema>,
    codecs: FxHashMap<BindingPoint, Arc<dyn Codec>>,
}

/// Named, reusable schema binding
pub struct Stereotype {
    name: Arc<str>,
    default_protocol: Option<Protocol>,
    default_format: Option<Format>,
    handlers: FormatHandlers,
    registry: RwLock<CodecRegistry>,
    /// Codecs built by handlers (lock-free, first writer wins)
    resolved: DashMap<BindingPoint, Arc<dyn Codec>>,
}

impl Stereotype {
    pub fn builder(name: impl Into<String>) -> StereotypeBuilder {
        StereotypeBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_protocol(&self) -> Option<&Protocol> {
        self.default_protocol.as_ref()
    }

    pub fn default_format(&self) -> Option<&Format> {
        self.default_format.as_ref()
    }

    /// Canonical fields (normalized), `None` until fixed by construction or a first codec
    pub fn fields(&self) -> Option<FieldSchema> {
        self.registry.read().fields.clone()
    }

    /// Format handlers given at construction
    pub fn handlers(&self) -> &FormatHandlers {
        &self.handlers
    }

    /// True while no schema is declared (unset or `Unknown`)
    pub fn caches_resolved_codecs(&self) -> bool {
        self.registry
            .read()
            .fields
            .as_ref()
            .map_or(true, FieldSchema::is_unknown)
    }

    /// Binding point for a lookup, filling in the default protocol
    pub fn point_for(&self, protocol: Option<&Protocol>, format: &Format) -> Result<BindingPoint> {
        let protocol = protocol
            .or(self.default_protocol.as_ref())
            .ok_or_else(|| BindError::MissingProtocol {
                stereotype: self.name.to_string(),
                format: format.to_string(),
            })?;

        Ok(BindingPoint {
            protocol: protocol.clone(),
            format: format.clone(),
        })
    }

    /// Register a codec at (protocol, format)
    ///
    /// A missing protocol means the default protocol. The codec's source
    /// and sink fields must match the stereotype's fields; the first codec
    /// fixes them when none were given. Replaces any codec at the same point.
    /// On failure nothing changes.
    pub fn add_codec_for(
        &self,
        protocol: Option<&Protocol>,
        format: impl Into<Format>,
        codec: Arc<dyn Codec>,
    ) -> Result<()> {
        let format = format.into();
        let point = self.point_for(protocol, &format)?;

        let mut registry = self.registry.write();
        let mut fields = registry.fields.clone();

        for role in [Role::Source, Role::Sink] {
            let Some(received) = codec.fields_for(role) else {
                continue;
            };
            let received = normalize(received.cloned());

            match &fields {
                None => fields = received,
                Some(expected) if Some(expected) != received.as_ref() => {
                    return Err(BindError::FieldsMismatch {
                        stereotype: self.name.to_string(),
                        role,
                        expected: expected.to_string(),
                        received: describe(received.as_ref()),
                    });
                }
                Some(_) => {}
            }
        }

        debug!(stereotype = %self.name, %point, "adding static codec");
        registry.fields = fields;
        registry.codecs.insert(point.clone(), codec);
        drop(registry);

        // A static codec shadows any cached one at the same point
        self.resolved.remove(&point);
        Ok(())
    }

    /// Codec for (protocol, format), using the stereotype's own handlers
    ///
    /// See [`Stereotype::get_codec_with`].
    pub fn get_codec_for(
        &self,
        protocol: Option<&Protocol>,
        format: &Format,
    ) -> Result<Option<Arc<dyn Codec>>> {
        self.get_codec_with(protocol, format, &self.handlers)
    }

    /// Codec for (protocol, format), falling back to the given handler chain
    ///
    /// Static codecs win, then cached ones. Otherwise the first matching
    /// handler builds a codec, which is cached only while the stereotype has
    /// no declared schema. `Ok(None)` when no handler matches.
    pub fn get_codec_with(
        &self,
        protocol: Option<&Protocol>,
        format: &Format,
        handlers: &FormatHandlers,
    ) -> Result<Option<Arc<dyn Codec>>> {
        let point = self.point_for(protocol, format)?;

        if let Some(codec) = self.registry.read().codecs.get(&point) {
            debug!(stereotype = %self.name, %point, "static codec hit");
            return Ok(Some(Arc::clone(codec)));
        }

        if let Some(codec) = self.resolved.get(&point).map(|r| Arc::clone(r.value())) {
            debug!(stereotype = %self.name, %point, "cached codec hit");
            return Ok(Some(codec));
        }

        let Some(handler) = handlers.find_handler_for(&point.protocol, &point.format) else {
            debug!(stereotype = %self.name, %point, "no format handler");
            return Ok(None);
        };

        debug!(stereotype = %self.name, %point, handler = handler.name(), "building codec");
        let codec = handler
            .create_codec(self, &point.protocol, &point.format)
            .map_err(|e| BindError::HandlerFailed {
                handler: handler.name().to_string(),
                details: e.to_string(),
            })?;

        if !self.caches_resolved_codecs() {
            return Ok(Some(codec));
        }

        // Concurrent first access keeps whichever codec landed first
        let cached = match self.resolved.entry(point) {
            Entry::Occupied(e) => Arc::clone(e.get()),
            Entry::Vacant(e) => {
                e.insert(Arc::clone(&codec));
                codec
            }
        };
        Ok(Some(cached))
    }

    /// Codec for the default protocol and default format
    ///
    /// `Ok(None)` when the stereotype has no default format.
    pub fn get_default_codec(&self) -> Result<Option<Arc<dyn Codec>>> {
        match &self.default_format {
            Some(format) => self.get_codec_for(None, format),
            None => Ok(None),
        }
    }

    /// Every binding point with a static or cached codec
    pub fn binding_points(&self) -> BTreeSet<BindingPoint> {
        let mut points: BTreeSet<BindingPoint> =
            self.registry.read().codecs.keys().cloned().collect();
        points.extend(self.resolved.iter().map(|r| r.key().clone()));
        points
    }

    pub fn all_formats(&self) -> BTreeSet<Format> {
        self.binding_points().into_iter().map(|p| p.format).collect()
    }

    pub fn all_protocols(&self) -> BTreeSet<Protocol> {
        self.binding_points().into_iter().map(|p| p.protocol).collect()
    }

    pub fn contains_codec_for(&self, format: &Format) -> bool {
        self.all_formats().contains(format)
    }

    /// Copy under a new name, carrying defaults, fields, handlers and codecs
    pub fn renamed(&self, name: impl Into<String>) -> Result<Stereotype> {
        let name = name.into();
        if name.is_empty() {
            return Err(BindError::EmptyName {
                what: "stereotype name",
            });
        }

        let resolved = DashMap::new();
        for entry in self.resolved.iter() {
            resolved.insert(entry.key().clone(), Arc::clone(entry.value()));
        }

        Ok(Stereotype {
            name: Arc::from(name),
            default_protocol: self.default_protocol.clone(),
            default_format: self.default_format.clone(),
            handlers: self.handlers.clone(),
            registry: RwLock::new(self.registry.read().clone()),
            resolved,
        })
    }
}

impl PartialEq for Stereotype {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.default_protocol == other.default_protocol
            && self.default_format == other.default_format
            && self.fields() == other.fields()
    }
}

impl fmt::Debug for Stereotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stereotype")
            .field("name", &self.name)
            .field("default_protocol", &self.default_protocol)
            .field("default_format", &self.default_format)
            .field("fields", &self.fields())
            .field("binding_points", &self.binding_points())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Builder for [`Stereotype`]
#[derive(Debug)]
pub struct StereotypeBuilder {
    name: String,
    default_protocol: Option<Protocol>,
    default_format: Option<Format>,
    fields: Option<FieldSchema>,
    handlers: FormatHandlers,
    codecs: Vec<(Option<Protocol>, Format, Arc<dyn Codec>)>,
}

impl StereotypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_protocol: None,
            default_format: None,
            fields: None,
            handlers: FormatHandlers::new(),
            codecs: Vec::new(),
        }
    }

    pub fn default_protocol(mut self, protocol: impl Into<Protocol>) -> Self {
        self.default_protocol = Some(protocol.into());
        self
    }

    pub fn default_format(mut self, format: impl Into<Format>) -> Self {
        self.default_format = Some(format.into());
        self
    }

    pub fn fields(mut self, fields: FieldSchema) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Format handler chain consulted when no static codec matches
    pub fn handlers(mut self, handlers: FormatHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// Static codec, validated at [`StereotypeBuilder::build`]
    pub fn codec(
        mut self,
        protocol: Option<Protocol>,
        format: impl Into<Format>,
        codec: Arc<dyn Codec>,
    ) -> Self {
        self.codecs.push((protocol, format.into(), codec));
        self
    }

    pub fn build(self) -> Result<Stereotype> {
        if self.name.is_empty() {
            return Err(BindError::EmptyName {
                what: "stereotype name",
            });
        }

        let stereotype = Stereotype {
            name: Arc::from(self.name),
            default_protocol: self.default_protocol,
            default_format: self.default_format,
            handlers: self.handlers,
            registry: RwLock::new(CodecRegistry {
                fields: normalize(self.fields),
                codecs: FxHashMap::default(),
            }),
            resolved: DashMap::new(),
        };

        for (protocol, format, codec) in self.codecs {
            stereotype.add_codec_for(protocol.as_ref(), format, codec)?;
        }

        Ok(stereotype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::handler::FormatHandler;
    use crate::test_utils::{MockCodec, MockFormatHandler};

    fn events_fields() -> FieldSchema {
        FieldSchema::typed([("id", "int"), ("ts", "long")])
    }

    fn codec(fields: FieldSchema) -> Arc<dyn Codec> {
        Arc::new(MockCodec::new(fields))
    }

    fn chain(handler: Arc<MockFormatHandler>) -> FormatHandlers {
        FormatHandlers::from_handlers([handler as Arc<dyn FormatHandler>])
    }

    #[test]
    fn builder_rejects_empty_name() {
        let err = Stereotype::builder("").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn builder_normalizes_all_fields() {
        let s = Stereotype::builder("any")
            .default_protocol("file")
            .fields(FieldSchema::All)
            .build()
            .unwrap();
        assert_eq!(s.fields(), Some(FieldSchema::Unknown));
    }

    #[test]
    fn conflicting_sink_fields_leave_codecs_unchanged() {
        let s = Stereotype::builder("events")
            .default_protocol("s3")
            .fields(events_fields())
            .build()
            .unwrap();
        s.add_codec_for(None, "csv", codec(events_fields())).unwrap();

        let bad = MockCodec::sink_only(FieldSchema::typed([("id", "int"), ("ts", "string")]));
        let err = s
            .add_codec_for(Some(&Protocol::from("s3")), "json", Arc::new(bad))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BindingConflict);
        assert!(err.to_string().contains("sink fields"));
        assert_eq!(
            s.binding_points().into_iter().collect::<Vec<_>>(),
            vec![BindingPoint::new("s3", "csv")]
        );
        assert_eq!(s.fields(), Some(events_fields()));
    }

    #[test]
    fn first_codec_fixes_fields() {
        let s = Stereotype::builder("open").default_protocol("file").build().unwrap();
        assert_eq!(s.fields(), None);

        s.add_codec_for(None, "csv", codec(events_fields())).unwrap();
        assert_eq!(s.fields(), Some(events_fields()));

        let err = s
            .add_codec_for(None, "tsv", codec(FieldSchema::names(["other"])))
            .unwrap_err();
        assert_eq!(err.code(), "BIND-012");
    }

    #[test]
    fn all_and_unknown_do_not_conflict() {
        let s = Stereotype::builder("loose")
            .default_protocol("file")
            .fields(FieldSchema::Unknown)
            .build()
            .unwrap();
        s.add_codec_for(None, "csv", codec(FieldSchema::All)).unwrap();
        assert!(s.contains_codec_for(&Format::from("csv")));
    }

    #[test]
    fn source_and_sink_checked_independently() {
        let s = Stereotype::builder("split")
            .default_protocol("file")
            .fields(events_fields())
            .build()
            .unwrap();

        // Source side matches, sink side does not
        let mixed = MockCodec::new(events_fields()).with_sink_fields(FieldSchema::names(["x"]));
        let err = s.add_codec_for(None, "csv", Arc::new(mixed)).unwrap_err();
        assert!(matches!(err, BindError::FieldsMismatch { role: Role::Sink, .. }));

        // Source-only codec never looks at sink fields
        let source_only = MockCodec::source_only(events_fields());
        s.add_codec_for(None, "csv", Arc::new(source_only)).unwrap();
    }

    #[test]
    fn missing_protocol_uses_default_and_replaces() {
        let s = Stereotype::builder("events")
            .default_protocol("s3")
            .build()
            .unwrap();
        let first = codec(events_fields());
        let second = codec(events_fields());

        s.add_codec_for(None, "json", Arc::clone(&first)).unwrap();
        s.add_codec_for(Some(&Protocol::from("s3")), "json", Arc::clone(&second))
            .unwrap();

        let found = s
            .get_codec_for(None, &Format::from("json"))
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&found, &second));
        assert_eq!(s.binding_points().len(), 1);
    }

    #[test]
    fn missing_protocol_without_default_fails() {
        let s = Stereotype::builder("nodefault").build().unwrap();
        let err = s
            .add_codec_for(None, "csv", codec(FieldSchema::Unknown))
            .unwrap_err();
        assert_eq!(err.code(), "BIND-041");
    }

    #[test]
    fn resolved_codec_cached_for_unknown_fields() {
        let handler = Arc::new(MockFormatHandler::new("json", ["json"]));
        let s = Stereotype::builder("raw")
            .default_protocol("s3")
            .fields(FieldSchema::Unknown)
            .handlers(chain(Arc::clone(&handler)))
            .build()
            .unwrap();

        let json = Format::from("json");
        let first = s.get_codec_for(None, &json).unwrap().unwrap();
        let second = s.get_codec_for(None, &json).unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(handler.calls(), 1);
        assert!(s.contains_codec_for(&json));
    }

    #[test]
    fn resolved_codec_not_cached_for_declared_fields() {
        let handler = Arc::new(MockFormatHandler::new("json", ["json"]));
        let s = Stereotype::builder("events")
            .default_protocol("s3")
            .fields(events_fields())
            .handlers(chain(Arc::clone(&handler)))
            .build()
            .unwrap();

        let json = Format::from("json");
        s.get_codec_for(None, &json).unwrap().unwrap();
        s.get_codec_for(None, &json).unwrap().unwrap();

        assert_eq!(handler.calls(), 2);
        assert!(s.binding_points().is_empty());
    }

    #[test]
    fn no_matching_handler_is_none() {
        let s = Stereotype::builder("events")
            .default_protocol("s3")
            .build()
            .unwrap();
        assert!(s.get_codec_for(None, &Format::from("avro")).unwrap().is_none());
    }

    #[test]
    fn external_chain_is_consulted() {
        let handler = Arc::new(MockFormatHandler::new("csv", ["csv"]));
        let s = Stereotype::builder("plain")
            .default_protocol("file")
            .build()
            .unwrap();

        let external = chain(Arc::clone(&handler));
        let found = s
            .get_codec_with(None, &Format::from("csv"), &external)
            .unwrap();
        assert!(found.is_some());
        assert_eq!(handler.calls(), 1);
    }

    #[test]
    fn failing_handler_surfaces_error() {
        let handler = Arc::new(MockFormatHandler::new("broken", ["csv"]).failing());
        let s = Stereotype::builder("plain")
            .default_protocol("file")
            .handlers(chain(handler))
            .build()
            .unwrap();

        let err = s.get_codec_for(None, &Format::from("csv")).unwrap_err();
        assert_eq!(err.code(), "BIND-032");
    }

    #[test]
    fn static_codec_shadows_cached_one() {
        let handler = Arc::new(MockFormatHandler::new("json", ["json"]));
        let s = Stereotype::builder("raw")
            .default_protocol("s3")
            .handlers(chain(handler))
            .build()
            .unwrap();

        let json = Format::from("json");
        let cached = s.get_codec_for(None, &json).unwrap().unwrap();
        let explicit = codec(FieldSchema::Unknown);
        s.add_codec_for(None, "json", Arc::clone(&explicit)).unwrap();

        let found = s.get_codec_for(None, &json).unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &explicit));
        assert!(!Arc::ptr_eq(&found, &cached));
    }

    #[test]
    fn renamed_copies_state() {
        let s = Stereotype::builder("events")
            .default_protocol("s3")
            .default_format("json")
            .codec(None, "json", codec(events_fields()))
            .build()
            .unwrap();

        let copy = s.renamed("audit").unwrap();
        assert_eq!(copy.name(), "audit");
        assert_eq!(copy.fields(), s.fields());
        assert_eq!(copy.default_format(), s.default_format());
        assert_eq!(copy.binding_points(), s.binding_points());
        assert!(copy.get_default_codec().unwrap().is_some());
        assert!(s.renamed("").is_err());
    }

    #[test]
    fn formats_and_protocols_project_points() {
        let s = Stereotype::builder("multi")
            .default_protocol("file")
            .codec(None, "csv", codec(FieldSchema::Unknown))
            .codec(Some(Protocol::from("s3")), "json", codec(FieldSchema::Unknown))
            .build()
            .unwrap();

        let formats: Vec<String> = s.all_formats().iter().map(ToString::to_string).collect();
        let protocols: Vec<String> = s.all_protocols().iter().map(ToString::to_string).collect();
        assert_eq!(formats, vec!["csv", "json"]);
        assert_eq!(protocols, vec!["file", "s3"]);
    }
}
