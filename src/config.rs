//! Binding manifest
//!
//! Declares, per side, which stereotype and which resources each logical
//! role uses. Stored as YAML or JSON:
//!
//! ```yaml
//! sources:
//!   customer-events:
//!     stereotype: events
//!     resources:
//!       - identifier: s3://bucket/events/
//!         protocol: s3
//!         format: json
//! sinks:
//!   audit-log:
//!     stereotype: audit
//!     resources:
//!       - identifier: /var/log/audit.tsv
//!         format: tsv
//!         mode: replace
//! ```
//!
//! Stereotypes are looked up by name in a [`Catalog`] when the manifest is
//! applied to a [`BindingFactory`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::document::DocumentKind;
use crate::catalog::Catalog;
use crate::codec::Role;
use crate::error::{BindError, Result};
use crate::factory::BindingFactory;
use crate::resource::Resource;
use crate::stereotype::Stereotype;

/// Binding manifest for both sides of a pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    #[serde(default)]
    pub sources: BTreeMap<String, RoleBinding>,

    #[serde(default)]
    pub sinks: BTreeMap<String, RoleBinding>,
}

/// Stereotype name and ordered resources for one role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBinding {
    /// Catalog name, matched case-insensitively
    pub stereotype: String,

    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl BindingConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load a manifest, choosing the parser by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let kind = DocumentKind::from_path(path)?;
        let content = fs::read_to_string(path)?;

        debug!(path = %path.display(), "loading binding manifest");
        match kind {
            DocumentKind::Json => Self::from_json(&content),
            DocumentKind::Yaml => Self::from_yaml(&content),
        }
    }

    fn roles(&self) -> impl Iterator<Item = (Role, &String, &RoleBinding)> {
        let sources = self.sources.iter().map(|(n, b)| (Role::Source, n, b));
        let sinks = self.sinks.iter().map(|(n, b)| (Role::Sink, n, b));
        sources.chain(sinks)
    }

    /// Bind every role of the manifest into the factory
    ///
    /// All stereotype names are checked first; on any error the factory is
    /// left untouched.
    pub fn apply(&self, catalog: &Catalog, factory: &mut BindingFactory) -> Result<()> {
        let mut resolved: Vec<(Role, &str, Arc<Stereotype>, &[Resource])> = Vec::new();

        for (role, name, binding) in self.roles() {
            if name.is_empty() {
                return Err(BindError::EmptyName { what: "role name" });
            }

            let stereotype = catalog
                .stereotype_named(&binding.stereotype)?
                .ok_or_else(|| BindError::UnknownStereotype {
                    stereotype: binding.stereotype.clone(),
                    role,
                    name: name.clone(),
                })?;

            resolved.push((role, name.as_str(), stereotype, binding.resources.as_slice()));
        }

        for (role, name, stereotype, resources) in resolved {
            factory.bind_stereotype(role, name, stereotype)?;
            factory.add_resources(role, name, resources.iter().cloned())?;
        }

        debug!(
            sources = self.sources.len(),
            sinks = self.sinks.len(),
            "applied binding manifest"
        );
        Ok(())
    }
}
