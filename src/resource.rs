//! Physical resource description
//!
//! A [`Resource`] names one concrete location: an identifier, an optional
//! protocol, a format and an optional access mode. Missing protocol/mode
//! means "use the owning stereotype's default".
//!
//! [`Protocol`] and [`Format`] are `Arc<str>` tags: zero-cost cloning, and
//! `Ord` so capability sets come out in a stable order.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

macro_rules! string_tag {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(Arc::from(value.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Arc::from(value))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_tag!(
    /// How a resource is accessed (e.g. "file", "s3", "jdbc")
    Protocol
);

string_tag!(
    /// Serialization layout of data at rest (e.g. "csv", "json", "parquet")
    Format
);

/// Access mode for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Keep existing data
    Keep,
    /// Replace existing data
    Replace,
    /// Update existing data in place
    Update,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Keep => f.write_str("keep"),
            Mode::Replace => f.write_str("replace"),
            Mode::Update => f.write_str("update"),
        }
    }
}

/// One physical location (immutable, structural equality)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    identifier: Arc<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    protocol: Option<Protocol>,
    format: Format,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<Mode>,
}

impl Resource {
    /// Resource with no explicit protocol or mode
    pub fn new(identifier: impl AsRef<str>, format: impl Into<Format>) -> Self {
        Self {
            identifier: Arc::from(identifier.as_ref()),
            protocol: None,
            format: format.into(),
            mode: None,
        }
    }

    /// Resource with every field given explicitly
    pub fn with_all(
        identifier: impl AsRef<str>,
        protocol: Option<Protocol>,
        format: impl Into<Format>,
        mode: Option<Mode>,
    ) -> Self {
        Self {
            identifier: Arc::from(identifier.as_ref()),
            protocol,
            format: format.into(),
            mode,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<Protocol>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn protocol(&self) -> Option<&Protocol> {
        self.protocol.as_ref()
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource{{identifier='{}'", self.identifier)?;
        match &self.protocol {
            Some(p) => write!(f, ", protocol={}", p)?,
            None => f.write_str(", protocol=<default>")?,
        }
        write!(f, ", format={}", self.format)?;
        match self.mode {
            Some(m) => write!(f, ", mode={}}}", m),
            None => f.write_str(", mode=<default>}"),
        }
    }
}
