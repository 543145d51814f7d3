//! Stereobind - schema-aware resource binding for data pipelines (v0.1)
//!
//! Binds the logical roles of a pipeline (named sources and sinks) to
//! [`Stereotype`]s, reusable schema profiles, and resolves each role into a
//! [`Handle`] over one or more concrete [`Resource`]s.
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  resource   Resource, Protocol, Format, Mode                 │
//! │  point      BindingPoint (protocol, format)                  │
//! │  fields     FieldSchema (NONE / ALL / UNKNOWN / declared)    │
//! │  codec      Codec trait, Role                                │
//! │  handle     ResourceHandle trait, Handle (single / multi)    │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  handler/   Format + protocol handler chains                 │
//! │  stereotype Codec registry per schema profile                │
//! │  catalog/   Stereotypes by name and by schema                │
//! │  factory    Role bindings, handle resolution                 │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CROSS-CUTTING                           │
//! │  config     YAML/JSON binding manifests                      │
//! │  error      BindError with BIND-NNN codes and fix hints      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Resolution
//!
//! ```text
//! role name ──► Stereotype ──► (protocol, format) ──► Codec ──► Handle
//!                  │                                   ▲          ▲
//!                  └── static codecs, then cache ──────┘          │
//!                      then FormatHandlers                ProtocolHandlers
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut catalog = Catalog::new();
//! catalog.add_stereotype(
//!     Stereotype::builder("events")
//!         .default_protocol("file")
//!         .fields(FieldSchema::names(["id", "ts"]))
//!         .build()?,
//! )?;
//!
//! let mut factory = BindingFactory::new();
//! factory.add_format_handler(Arc::new(CsvHandler::default()));
//! factory.add_protocol_handler(Arc::new(LocalFiles::default()));
//!
//! BindingConfig::load("bindings.yaml")?.apply(&catalog, &mut factory)?;
//! let handle = factory.resolve_source_handle("customer-events")?;
//! ```

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod codec;
pub mod fields;
pub mod handle;
pub mod point;
pub mod resource;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER
// ═══════════════════════════════════════════════════════════════
pub mod catalog;
pub mod factory;
pub mod handler;
pub mod stereotype;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// Test utilities (mock codecs, handlers) - only with test-fixtures feature
#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_utils;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use error::{BindError, ErrorKind, FixSuggestion, Result};

pub use codec::{Codec, Role};
pub use fields::{Field, FieldSchema};
pub use handle::{Handle, ResourceHandle, SharedHandle};
pub use point::BindingPoint;
pub use resource::{Format, Mode, Protocol, Resource};

pub use catalog::{Catalog, CatalogDocument, StereotypeRecord};
pub use factory::{BindingFactory, HandleMap};
pub use handler::{FormatHandler, FormatHandlers, Properties, ProtocolHandler, ProtocolHandlers};
pub use stereotype::{Stereotype, StereotypeBuilder};

pub use config::{BindingConfig, RoleBinding};
