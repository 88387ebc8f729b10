//! Store Configuration
//!
//! TigerStyle: Explicit settings, validated once, no hidden globals.
//!
//! Everything comes from the environment by default (`StoreConfig::from_env`);
//! the `with_*` setters exist for programmatic use and tests.

use std::str::FromStr;

use crate::constants::{
    DOCUMENT_DATABASE_DEFAULT, ENV_BACKEND, ENV_DOCUMENT_DATABASE, ENV_DOCUMENT_URL,
    ENV_RELATIONAL_POOL_CONNECTIONS, ENV_RELATIONAL_TLS_MODE, ENV_RELATIONAL_URL,
    RELATIONAL_POOL_CONNECTIONS_COUNT_DEFAULT, RELATIONAL_POOL_CONNECTIONS_COUNT_MAX,
};

use super::error::{StorageError, StorageResult};

// =============================================================================
// Backend Kind
// =============================================================================

/// Which backend an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQL store with server-side joins
    Relational,
    /// Document store with pipeline joins
    Document,
}

impl BackendKind {
    /// Get string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::Document => "document",
        }
    }

    /// Parse a backend tag, case-insensitively.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "relational" | "postgres" | "postgresql" => Some(Self::Relational),
            "document" | "mongo" | "mongodb" => Some(Self::Document),
            _ => None,
        }
    }

    /// Resolve an optional tag; unset means relational.
    ///
    /// # Errors
    /// Returns `Configuration` for an unrecognized tag.
    pub fn resolve(tag: Option<&str>) -> StorageResult<Self> {
        match tag {
            None => Ok(Self::Relational),
            Some(tag) if tag.trim().is_empty() => Ok(Self::Relational),
            Some(tag) => Self::parse(tag).ok_or_else(|| {
                StorageError::configuration(format!("unsupported database type: {tag}"))
            }),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// TLS Mode
// =============================================================================

/// Transport security for the relational connection.
///
/// `Require` encrypts without validating the server certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Plaintext only
    Disable,
    /// TLS if the server offers it
    Prefer,
    /// TLS, certificate not validated
    #[default]
    Require,
    /// TLS, certificate chain validated
    VerifyCa,
    /// TLS, certificate chain and host name validated
    VerifyFull,
}

impl FromStr for TlsMode {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            other => Err(StorageError::configuration(format!(
                "invalid {ENV_RELATIONAL_TLS_MODE}: {other}"
            ))),
        }
    }
}

// =============================================================================
// StoreConfig
// =============================================================================

/// Connection settings for both backends.
///
/// Missing connection strings are not an error here; the adapter reports
/// them from `connect()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Raw backend tag; `None` resolves to relational
    pub backend: Option<String>,
    /// Relational connection string
    pub relational_url: Option<String>,
    /// Relational pool size
    pub relational_max_connections: u32,
    /// Relational transport security
    pub relational_tls: TlsMode,
    /// Document connection string
    pub document_url: Option<String>,
    /// Document database name
    pub document_database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: None,
            relational_url: None,
            relational_max_connections: RELATIONAL_POOL_CONNECTIONS_COUNT_DEFAULT,
            relational_tls: TlsMode::default(),
            document_url: None,
            document_database: DOCUMENT_DATABASE_DEFAULT.to_string(),
        }
    }
}

impl StoreConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    /// Returns `Configuration` if a numeric or enum setting is malformed.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    /// Returns `Configuration` if a numeric or enum setting is malformed.
    pub fn from_lookup<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.backend = get(ENV_BACKEND);
        config.relational_url = get(ENV_RELATIONAL_URL);
        config.document_url = get(ENV_DOCUMENT_URL);

        if let Some(db) = get(ENV_DOCUMENT_DATABASE) {
            config.document_database = db;
        }

        if let Some(raw) = get(ENV_RELATIONAL_POOL_CONNECTIONS) {
            let count: u32 = raw.trim().parse().map_err(|_| {
                StorageError::configuration(format!(
                    "invalid {ENV_RELATIONAL_POOL_CONNECTIONS}: {raw}"
                ))
            })?;
            config = config.with_relational_max_connections(count)?;
        }

        if let Some(raw) = get(ENV_RELATIONAL_TLS_MODE) {
            config.relational_tls = raw.parse()?;
        }

        Ok(config)
    }

    /// Set backend tag.
    #[must_use]
    pub fn with_backend(mut self, tag: impl Into<String>) -> Self {
        self.backend = Some(tag.into());
        self
    }

    /// Set relational connection string.
    #[must_use]
    pub fn with_relational_url(mut self, url: impl Into<String>) -> Self {
        self.relational_url = Some(url.into());
        self
    }

    /// Set relational transport security.
    #[must_use]
    pub fn with_relational_tls(mut self, tls: TlsMode) -> Self {
        self.relational_tls = tls;
        self
    }

    /// Set relational pool size.
    ///
    /// # Errors
    /// Returns `Configuration` if `count` is zero or above the maximum.
    pub fn with_relational_max_connections(mut self, count: u32) -> StorageResult<Self> {
        if count == 0 || count > RELATIONAL_POOL_CONNECTIONS_COUNT_MAX {
            return Err(StorageError::configuration(format!(
                "pool size {count} outside 1..={RELATIONAL_POOL_CONNECTIONS_COUNT_MAX}"
            )));
        }
        self.relational_max_connections = count;
        Ok(self)
    }

    /// Set document connection string.
    #[must_use]
    pub fn with_document_url(mut self, url: impl Into<String>) -> Self {
        self.document_url = Some(url.into());
        self
    }

    /// Set document database name.
    #[must_use]
    pub fn with_document_database(mut self, name: impl Into<String>) -> Self {
        self.document_database = name.into();
        self
    }

    /// Resolve the configured backend tag.
    ///
    /// # Errors
    /// Returns `Configuration` for an unrecognized tag.
    pub fn backend_kind(&self) -> StorageResult<BackendKind> {
        BackendKind::resolve(self.backend.as_deref())
    }
}

// =============================================================================
// Tests
// =============================================================================
