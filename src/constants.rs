//! TigerStyle Constants
//!
//! Big-endian naming with units in the name:
//! - _COUNT_DEFAULT/_MAX for quantities
//! - _DEFAULT for fallback values

// =============================================================================
// Application
// =============================================================================

/// Application name (also sent as the document driver's app name)
pub const APP_NAME: &str = "linkdir";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Relational Backend
// =============================================================================

/// Table holding categories
pub const CATEGORY_TABLE: &str = "categories";

/// Table holding links
pub const LINK_TABLE: &str = "links";

/// Default size of the relational connection pool
pub const RELATIONAL_POOL_CONNECTIONS_COUNT_DEFAULT: u32 = 10;

/// Upper bound accepted for the relational connection pool
pub const RELATIONAL_POOL_CONNECTIONS_COUNT_MAX: u32 = 100;

// =============================================================================
// Document Backend
// =============================================================================

/// Collection holding category documents
pub const CATEGORY_COLLECTION: &str = "categories";

/// Collection holding link documents
pub const LINK_COLLECTION: &str = "links";

/// Database used when none is configured
pub const DOCUMENT_DATABASE_DEFAULT: &str = "navigation";

// =============================================================================
// Environment
// =============================================================================

/// Backend selection tag (`relational` | `document`)
pub const ENV_BACKEND: &str = "DATABASE_TYPE";

/// Relational connection string
pub const ENV_RELATIONAL_URL: &str = "DATABASE_URL";

/// Relational pool size
pub const ENV_RELATIONAL_POOL_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";

/// Relational TLS mode
pub const ENV_RELATIONAL_TLS_MODE: &str = "DATABASE_SSL_MODE";

/// Document connection string
pub const ENV_DOCUMENT_URL: &str = "MONGODB_URL";

/// Document database name
pub const ENV_DOCUMENT_DATABASE: &str = "MONGODB_DB";
