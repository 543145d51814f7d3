//! # Stereotype Catalog
//!
//! Dual-keyed registry of [`Stereotype`]s:
//!
//! - by name, case-insensitive (keys are lower-cased at the map boundary)
//! - by field schema, normalized (`All` is stored as `Unknown`)
//!
//! A name or a schema resolves to at most one stereotype. Every mutating
//! operation validates first and then updates both maps, so a failure
//! leaves the catalog unchanged. A stereotype registered without fields
//! is re-filed under the fields its first codec fixes.
//!
//! Catalogs persist to JSON or YAML as an ordered list of
//! [`StereotypeRecord`]s (see [`document`]).

pub mod document;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{BindError, Result};
use crate::fields::{describe, FieldSchema};
use crate::resource::{Format, Protocol};
use crate::stereotype::Stereotype;

pub use document::{CatalogDocument, FieldsKind, FieldsRecord, StereotypeRecord};
use document::DocumentKind;

#[derive(Debug, Clone)]
struct CatalogEntry {
    stereotype: Arc<Stereotype>,
    /// Schema key this entry is filed under in `by_fields`
    fields_key: Option<FieldSchema>,
}

impl CatalogEntry {
    /// Does `by_fields` point at this entry's stereotype?
    fn owns(&self, by_fields: &FxHashMap<Option<FieldSchema>, Arc<Stereotype>>) -> bool {
        by_fields
            .get(&self.fields_key)
            .is_some_and(|s| Arc::ptr_eq(s, &self.stereotype))
    }
}

/// Registry of stereotypes addressable by name and by field schema
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// lower-cased name → entry (ordered, so documents are stable)
    by_name: BTreeMap<String, CatalogEntry>,
    by_fields: FxHashMap<Option<FieldSchema>, Arc<Stereotype>>,
}

fn name_key(name: &str) -> String {
    name.to_lowercase()
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stereotype
    ///
    /// Fails if its name (ignoring case) or its fields are already taken.
    pub fn add_stereotype(
        &mut self,
        stereotype: impl Into<Arc<Stereotype>>,
    ) -> Result<Arc<Stereotype>> {
        let stereotype = stereotype.into();
        let key = name_key(stereotype.name());
        self.refresh_fields_keys();

        if let Some(existing) = self.by_name.get(&key) {
            return Err(BindError::DuplicateStereotype {
                name: stereotype.name().to_string(),
                fields: describe(existing.fields_key.as_ref()),
            });
        }

        let fields_key = stereotype.fields();
        if let Some(existing) = self.by_fields.get(&fields_key) {
            return Err(BindError::DuplicateFields {
                fields: describe(fields_key.as_ref()),
                existing: existing.name().to_string(),
            });
        }

        debug!(stereotype = stereotype.name(), fields = %describe(fields_key.as_ref()), "adding stereotype");
        self.by_fields
            .insert(fields_key.clone(), Arc::clone(&stereotype));
        self.by_name.insert(
            key,
            CatalogEntry {
                stereotype: Arc::clone(&stereotype),
                fields_key,
            },
        );

        Ok(stereotype)
    }

    /// Register every stereotype in order, stopping at the first conflict
    pub fn add_stereotypes<I, S>(&mut self, stereotypes: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<Stereotype>>,
    {
        for stereotype in stereotypes {
            self.add_stereotype(stereotype)?;
        }
        Ok(())
    }

    /// Lookup by name, ignoring case
    pub fn stereotype_named(&self, name: &str) -> Result<Option<Arc<Stereotype>>> {
        if name.is_empty() {
            return Err(BindError::EmptyName {
                what: "stereotype name",
            });
        }

        Ok(self
            .by_name
            .get(&name_key(name))
            .map(|e| Arc::clone(&e.stereotype)))
    }

    /// Reverse lookup by field schema (normalized first)
    ///
    /// Sees fields a stereotype fixed after registration even before the
    /// next mutation re-files it.
    pub fn stereotype_for_fields(&self, fields: &FieldSchema) -> Option<Arc<Stereotype>> {
        let key = Some(fields.clone().normalized());

        self.by_fields
            .get(&key)
            .filter(|s| s.fields() == key)
            .or_else(|| self.stereotypes().find(|s| s.fields() == key))
            .cloned()
    }

    /// Re-file entries whose stereotype fixed its fields after registration
    ///
    /// A stereotype added without fields takes them from its first codec.
    /// If another entry already holds the new schema it keeps it.
    fn refresh_fields_keys(&mut self) {
        for entry in self.by_name.values_mut() {
            let current = entry.stereotype.fields();
            if current == entry.fields_key {
                continue;
            }

            if entry.owns(&self.by_fields) {
                self.by_fields.remove(&entry.fields_key);
            }

            debug!(
                stereotype = entry.stereotype.name(),
                from = %describe(entry.fields_key.as_ref()),
                to = %describe(current.as_ref()),
                "re-filing stereotype under its current fields"
            );
            self.by_fields
                .entry(current.clone())
                .or_insert_with(|| Arc::clone(&entry.stereotype));
            entry.fields_key = current;
        }
    }

    /// Remove from both maps; `false` if the name was not registered
    pub fn remove_stereotype(&mut self, name: &str) -> bool {
        self.refresh_fields_keys();

        let Some(entry) = self.by_name.remove(&name_key(name)) else {
            return false;
        };

        if entry.owns(&self.by_fields) {
            self.by_fields.remove(&entry.fields_key);
        }
        debug!(stereotype = entry.stereotype.name(), "removed stereotype");
        true
    }

    /// Re-register a copy of `name` under `new_name`
    ///
    /// `Ok(false)` if `name` is not registered. Fails, leaving the catalog
    /// unchanged, if `new_name` is empty or names another stereotype.
    pub fn rename_stereotype(&mut self, name: &str, new_name: &str) -> Result<bool> {
        if new_name.is_empty() {
            return Err(BindError::EmptyName {
                what: "stereotype name",
            });
        }

        self.refresh_fields_keys();

        let old_key = name_key(name);
        let new_key = name_key(new_name);

        let Some(entry) = self.by_name.get(&old_key).cloned() else {
            return Ok(false);
        };

        if new_key != old_key {
            if let Some(existing) = self.by_name.get(&new_key) {
                return Err(BindError::DuplicateStereotype {
                    name: new_name.to_string(),
                    fields: describe(existing.fields_key.as_ref()),
                });
            }
        }

        let renamed = Arc::new(entry.stereotype.renamed(new_name)?);

        self.by_name.remove(&old_key);
        if entry.owns(&self.by_fields) {
            self.by_fields
                .insert(entry.fields_key.clone(), Arc::clone(&renamed));
        }
        self.by_name.insert(
            new_key,
            CatalogEntry {
                stereotype: renamed,
                fields_key: entry.fields_key,
            },
        );

        debug!(from = name, to = new_name, "renamed stereotype");
        Ok(true)
    }

    /// Stereotype names as registered, in catalog order
    pub fn stereotype_names(&self) -> Vec<String> {
        self.by_name
            .values()
            .map(|e| e.stereotype.name().to_string())
            .collect()
    }

    /// Stereotypes in catalog order (case-insensitive name order)
    pub fn stereotypes(&self) -> impl Iterator<Item = &Arc<Stereotype>> {
        self.by_name.values().map(|e| &e.stereotype)
    }

    pub fn all_formats(&self) -> BTreeSet<Format> {
        self.stereotypes().flat_map(|s| s.all_formats()).collect()
    }

    pub fn all_protocols(&self) -> BTreeSet<Protocol> {
        self.stereotypes().flat_map(|s| s.all_protocols()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    // ═══════════════════════════════════════════════════════════════
    // PERSISTENCE
    // ═══════════════════════════════════════════════════════════════

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            stereotypes: self
                .stereotypes()
                .map(|s| StereotypeRecord::from(s.as_ref()))
                .collect(),
        }
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let mut catalog = Self::new();
        for record in document.stereotypes {
            catalog.add_stereotype(record.into_stereotype()?)?;
        }
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_document())?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_document(serde_yaml::from_str(yaml)?)
    }

    /// Read a `.json`, `.yaml` or `.yml` catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let kind = DocumentKind::from_path(path)?;
        let content = fs::read_to_string(path)?;

        debug!(path = %path.display(), "loading catalog");
        match kind {
            DocumentKind::Json => Self::from_json(&content),
            DocumentKind::Yaml => Self::from_yaml(&content),
        }
    }

    /// Write a `.json`, `.yaml` or `.yml` catalog file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = match DocumentKind::from_path(path)? {
            DocumentKind::Json => self.to_json()?,
            DocumentKind::Yaml => self.to_yaml()?,
        };

        fs::write(path, content)?;
        Ok(())
    }
}

impl PartialEq for Catalog {
    fn eq(&self, other: &Self) -> bool {
        self.by_name.len() == other.by_name.len()
            && self.by_name.iter().all(|(key, entry)| {
                other
                    .by_name
                    .get(key)
                    .is_some_and(|o| *o.stereotype == *entry.stereotype)
            })
    }
}
