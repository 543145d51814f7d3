//! # Handler Chains
//!
//! Pluggable resolvers, tried in insertion order. The first handler whose
//! `handles(..)` predicate matches wins, even when a later handler could
//! also match.
//!
//! - [`FormatHandler`] / [`FormatHandlers`] - (protocol, format) → codec
//! - [`ProtocolHandler`] / [`ProtocolHandlers`] - protocol → resource handle
//!
//! Handlers are never removed. Overlapping advertised capabilities are only
//! noticed when the capability sets are aggregated (`formats()`,
//! `protocols()`), and only produce a `tracing` warning.
//!
//! ```rust,ignore
//! let mut formats = FormatHandlers::new();
//! formats.add(Arc::new(CsvHandler::default()));
//! formats.add(Arc::new(FallbackHandler::default()));
//!
//! let handler = formats.find_handler_for(&"file".into(), &"csv".into());
//! ```

mod format;
mod protocol;

use std::collections::BTreeMap;

pub use format::{FormatHandler, FormatHandlers};
pub use protocol::{ProtocolHandler, ProtocolHandlers};

/// Default properties advertised by a handler (key → values)
pub type Properties = BTreeMap<String, Vec<String>>;
