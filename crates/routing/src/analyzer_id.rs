//! Analyzer identity
//!
//! Analyzers are identified by their TCP peer address. The id is cloned into
//! every tree node on every rebuild, so it wraps an `Arc<str>`.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Identity of a registered analyzer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalyzerId(Arc<str>);

impl AnalyzerId {
    /// Create an id from an arbitrary string (tests, tooling)
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().into())
    }

    /// Derive the id from the analyzer's remote socket address
    pub fn from_peer(addr: SocketAddr) -> Self {
        Self(format!("analyzer_{addr}").into())
    }

    /// The id as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnalyzerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AnalyzerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
