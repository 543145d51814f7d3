//! Resource binding factory
//!
//! Binds logical role names (per side: source or sink) to one
//! [`Stereotype`] and to an ordered list of [`Resource`]s, and resolves a
//! role into a [`Handle`] on demand:
//!
//! 1. stereotype bound to the role, else `UnboundRole`
//! 2. resources bound to the role, else `NoResourceBound`
//! 3. per resource, in order: protocol (explicit, else stereotype default),
//!    codec from the stereotype, else from the factory's format handlers,
//!    then a handle from the factory's protocol handlers
//! 4. one handle is returned as is; several are multiplexed
//!
//! Nothing is cached here: every resolution walks the handler chains again,
//! so handlers added after binding are seen by the next call. Only the
//! stereotype's own codec cache persists.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use crate::codec::Role;
use crate::error::{BindError, Result};
use crate::handle::{Handle, SharedHandle};
use crate::handler::{FormatHandler, FormatHandlers, Properties, ProtocolHandler, ProtocolHandlers};
use crate::resource::Resource;
use crate::stereotype::Stereotype;

/// Role name → resolved handle, as handed to the execution engine
pub type HandleMap = BTreeMap<String, Handle>;

/// Bindings for one side of the pipeline
#[derive(Debug, Default)]
struct RoleBindings {
    stereotypes: FxHashMap<String, Arc<Stereotype>>,
    /// Ordered by name so reverse lookups are deterministic
    resources: BTreeMap<String, Vec<Resource>>,
}

/// Binds role names to stereotypes and resources, resolves them to handles
#[derive(Debug, Default)]
pub struct BindingFactory {
    sources: RoleBindings,
    sinks: RoleBindings,
    format_handlers: FormatHandlers,
    protocol_handlers: ProtocolHandlers,
}

impl BindingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handlers(format_handlers: FormatHandlers, protocol_handlers: ProtocolHandlers) -> Self {
        Self {
            format_handlers,
            protocol_handlers,
            ..Self::default()
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // HANDLER CHAINS
    // ═══════════════════════════════════════════════════════════════

    pub fn format_handlers(&self) -> &FormatHandlers {
        &self.format_handlers
    }

    pub fn format_handlers_mut(&mut self) -> &mut FormatHandlers {
        &mut self.format_handlers
    }

    pub fn protocol_handlers(&self) -> &ProtocolHandlers {
        &self.protocol_handlers
    }

    pub fn protocol_handlers_mut(&mut self) -> &mut ProtocolHandlers {
        &mut self.protocol_handlers
    }

    pub fn add_format_handler(&mut self, handler: Arc<dyn FormatHandler>) {
        self.format_handlers.add(handler);
    }

    pub fn add_protocol_handler(&mut self, handler: Arc<dyn ProtocolHandler>) {
        self.protocol_handlers.add(handler);
    }

    fn bindings(&self, role: Role) -> &RoleBindings {
        match role {
            Role::Source => &self.sources,
            Role::Sink => &self.sinks,
        }
    }

    fn bindings_mut(&mut self, role: Role) -> &mut RoleBindings {
        match role {
            Role::Source => &mut self.sources,
            Role::Sink => &mut self.sinks,
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // STEREOTYPE BINDINGS
    // ═══════════════════════════════════════════════════════════════

    /// Bind a stereotype to a role name, replacing any previous one
    pub fn bind_stereotype(
        &mut self,
        role: Role,
        name: &str,
        stereotype: impl Into<Arc<Stereotype>>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(BindError::EmptyName {
                what: match role {
                    Role::Source => "source name",
                    Role::Sink => "sink name",
                },
            });
        }

        let stereotype = stereotype.into();
        debug!(%role, name, stereotype = stereotype.name(), "binding stereotype");
        self.bindings_mut(role)
            .stereotypes
            .insert(name.to_string(), stereotype);
        Ok(())
    }

    pub fn stereotype(&self, role: Role, name: &str) -> Option<Arc<Stereotype>> {
        self.bindings(role).stereotypes.get(name).cloned()
    }

    pub fn set_source_stereotype(
        &mut self,
        name: &str,
        stereotype: impl Into<Arc<Stereotype>>,
    ) -> Result<()> {
        self.bind_stereotype(Role::Source, name, stereotype)
    }

    pub fn set_sink_stereotype(
        &mut self,
        name: &str,
        stereotype: impl Into<Arc<Stereotype>>,
    ) -> Result<()> {
        self.bind_stereotype(Role::Sink, name, stereotype)
    }

    pub fn source_stereotype(&self, name: &str) -> Option<Arc<Stereotype>> {
        self.stereotype(Role::Source, name)
    }

    pub fn sink_stereotype(&self, name: &str) -> Option<Arc<Stereotype>> {
        self.stereotype(Role::Sink, name)
    }

    // ═══════════════════════════════════════════════════════════════
    // RESOURCE LISTS
    // ═══════════════════════════════════════════════════════════════

    /// Append resources to a role's list, dropping `None` entries
    ///
    /// Accepts plain `Resource`s or `Option<Resource>`s. An empty input is
    /// a no-op; the list is created on first non-empty call.
    pub fn add_resources<I, R>(&mut self, role: Role, name: &str, resources: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<Option<Resource>>,
    {
        if name.is_empty() {
            return Err(BindError::EmptyName {
                what: match role {
                    Role::Source => "source name",
                    Role::Sink => "sink name",
                },
            });
        }

        let mut resources = resources.into_iter().peekable();
        if resources.peek().is_none() {
            return Ok(());
        }

        let list = self
            .bindings_mut(role)
            .resources
            .entry(name.to_string())
            .or_default();
        list.extend(resources.filter_map(Into::into));
        debug!(%role, name, count = list.len(), "bound resources");
        Ok(())
    }

    /// Ordered resources bound to a role (empty if none)
    pub fn resources(&self, role: Role, name: &str) -> &[Resource] {
        self.bindings(role)
            .resources
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every resource bound on a side, deduplicated
    pub fn all_resources(&self, role: Role) -> HashSet<Resource> {
        self.bindings(role)
            .resources
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    /// Replace the first occurrence of `from` in every list on a side
    ///
    /// Returns whether anything was replaced.
    pub fn replace_resource(&mut self, role: Role, from: &Resource, to: &Resource) -> bool {
        let mut found = false;

        for list in self.bindings_mut(role).resources.values_mut() {
            if let Some(index) = list.iter().position(|r| r == from) {
                list[index] = to.clone();
                found = true;
            }
        }

        if found {
            debug!(%role, %from, %to, "replaced resource");
        }
        found
    }

    /// Stereotype of the first role (by name) whose list contains the resource
    pub fn stereotype_for(&self, role: Role, resource: &Resource) -> Option<Arc<Stereotype>> {
        let bindings = self.bindings(role);
        let (name, _) = bindings
            .resources
            .iter()
            .find(|(_, list)| list.contains(resource))?;

        bindings.stereotypes.get(name).cloned()
    }

    /// Role names with a resource list on a side
    pub fn names(&self, role: Role) -> impl Iterator<Item = &str> {
        self.bindings(role).resources.keys().map(String::as_str)
    }

    /// Drop every resource list on a side (stereotype bindings stay)
    pub fn clear_resources(&mut self, role: Role) {
        self.bindings_mut(role).resources.clear();
    }

    pub fn add_source_resources<I, R>(&mut self, name: &str, resources: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<Option<Resource>>,
    {
        self.add_resources(Role::Source, name, resources)
    }

    pub fn add_sink_resources<I, R>(&mut self, name: &str, resources: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: Into<Option<Resource>>,
    {
        self.add_resources(Role::Sink, name, resources)
    }

    pub fn source_resources(&self, name: &str) -> &[Resource] {
        self.resources(Role::Source, name)
    }

    pub fn sink_resources(&self, name: &str) -> &[Resource] {
        self.resources(Role::Sink, name)
    }

    pub fn all_source_resources(&self) -> HashSet<Resource> {
        self.all_resources(Role::Source)
    }

    pub fn all_sink_resources(&self) -> HashSet<Resource> {
        self.all_resources(Role::Sink)
    }

    pub fn replace_source_resource(&mut self, from: &Resource, to: &Resource) -> bool {
        self.replace_resource(Role::Source, from, to)
    }

    pub fn replace_sink_resource(&mut self, from: &Resource, to: &Resource) -> bool {
        self.replace_resource(Role::Sink, from, to)
    }

    pub fn source_stereotype_for(&self, resource: &Resource) -> Option<Arc<Stereotype>> {
        self.stereotype_for(Role::Source, resource)
    }

    pub fn sink_stereotype_for(&self, resource: &Resource) -> Option<Arc<Stereotype>> {
        self.stereotype_for(Role::Sink, resource)
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.names(Role::Source)
    }

    pub fn sink_names(&self) -> impl Iterator<Item = &str> {
        self.names(Role::Sink)
    }

    pub fn clear_source_resources(&mut self) {
        self.clear_resources(Role::Source);
    }

    pub fn clear_sink_resources(&mut self) {
        self.clear_resources(Role::Sink);
    }

    // ═══════════════════════════════════════════════════════════════
    // RESOLUTION
    // ═══════════════════════════════════════════════════════════════

    /// Resolve a role into one handle (multiplexed when several resources)
    #[instrument(skip(self))]
    pub fn resolve_handle(&self, role: Role, name: &str) -> Result<Handle> {
        let bindings = self.bindings(role);

        let stereotype = bindings
            .stereotypes
            .get(name)
            .ok_or_else(|| BindError::UnboundRole {
                role,
                name: name.to_string(),
            })?;

        let resources = bindings
            .resources
            .get(name)
            .filter(|list| !list.is_empty())
            .ok_or_else(|| BindError::NoResourceBound {
                role,
                name: name.to_string(),
            })?;

        let members = resources
            .iter()
            .map(|resource| self.create_handle(stereotype, resource))
            .collect::<Result<Vec<_>>>()?;

        debug!(stereotype = stereotype.name(), members = members.len(), "resolved role");
        Handle::from_members(role, members).ok_or_else(|| BindError::NoResourceBound {
            role,
            name: name.to_string(),
        })
    }

    pub fn resolve_source_handle(&self, name: &str) -> Result<Handle> {
        self.resolve_handle(Role::Source, name)
    }

    pub fn resolve_sink_handle(&self, name: &str) -> Result<Handle> {
        self.resolve_handle(Role::Sink, name)
    }

    /// Resolve several roles; fails on the first that cannot be resolved
    pub fn resolve_handles<'a, I>(&self, role: Role, names: I) -> Result<HandleMap>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| Ok((name.to_string(), self.resolve_handle(role, name)?)))
            .collect()
    }

    pub fn resolve_source_handles<'a, I>(&self, names: I) -> Result<HandleMap>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.resolve_handles(Role::Source, names)
    }

    pub fn resolve_sink_handles<'a, I>(&self, names: I) -> Result<HandleMap>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.resolve_handles(Role::Sink, names)
    }

    /// Resolve every role with resources bound on the source side
    pub fn resolve_all_sources(&self) -> Result<HandleMap> {
        self.resolve_handles(Role::Source, self.names(Role::Source))
    }

    /// Resolve every role with resources bound on the sink side
    pub fn resolve_all_sinks(&self) -> Result<HandleMap> {
        self.resolve_handles(Role::Sink, self.names(Role::Sink))
    }

    fn create_handle(&self, stereotype: &Stereotype, resource: &Resource) -> Result<SharedHandle> {
        let point = stereotype.point_for(resource.protocol(), resource.format())?;

        let codec = match stereotype.get_codec_for(Some(&point.protocol), &point.format)? {
            Some(codec) => codec,
            None => {
                let handler = self
                    .format_handlers
                    .find_handler_for(&point.protocol, &point.format)
                    .ok_or_else(|| BindError::NoFormatHandler {
                        protocol: point.protocol.to_string(),
                        format: point.format.to_string(),
                    })?;

                handler
                    .create_codec(stereotype, &point.protocol, &point.format)
                    .map_err(|e| BindError::HandlerFailed {
                        handler: handler.name().to_string(),
                        details: e.to_string(),
                    })?
            }
        };

        let handler = self
            .protocol_handlers
            .find_handler_for(&point.protocol)
            .ok_or_else(|| BindError::NoProtocolHandler {
                protocol: point.protocol.to_string(),
            })?;

        let handle = handler
            .create_handle(codec, resource)
            .map_err(|e| BindError::HandlerFailed {
                handler: handler.name().to_string(),
                details: e.to_string(),
            })?;

        debug!(%point, handler = handler.name(), identifier = handle.identifier(), "created handle");
        Ok(handle)
    }

    // ═══════════════════════════════════════════════════════════════
    // PROPERTIES
    // ═══════════════════════════════════════════════════════════════

    /// Default properties for a resource: protocol properties overlaid by
    /// format properties
    ///
    /// A resource without a protocol uses the default protocol of the
    /// stereotype owning it on that side.
    pub fn properties_for(&self, role: Role, resource: &Resource) -> Result<Properties> {
        let protocol = match resource.protocol() {
            Some(protocol) => protocol.clone(),
            None => {
                let stereotype = self.stereotype_for(role, resource);
                stereotype
                    .as_ref()
                    .and_then(|s| s.default_protocol().cloned())
                    .ok_or_else(|| BindError::MissingProtocol {
                        stereotype: stereotype
                            .as_ref()
                            .map(|s| s.name().to_string())
                            .unwrap_or_else(|| "<unbound>".to_string()),
                        format: resource.format().to_string(),
                    })?
            }
        };

        let mut properties = self.protocol_handlers.protocol_properties(&protocol);
        properties.extend(self.format_handlers.format_properties(resource.format()));
        Ok(properties)
    }
}
