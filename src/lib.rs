//! linkdir - Link Directory Storage
//!
//! Categories and links behind one storage contract, backed by either a
//! relational store (PostgreSQL) or a document store (MongoDB).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               linkdir                        │
//! ├─────────────────────────────────────────────┤
//! │  Navigation snapshot    │ grouped listing   │
//! ├─────────────────────────────────────────────┤
//! │  StorageAdapter         │ 9-operation CRUD  │
//! │  PostgresAdapter        │ SQL, server join  │
//! │  MongoAdapter           │ docs, $lookup     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use linkdir::storage::{create_adapter, NewCategory, StorageAdapter, StoreConfig};
//!
//! # async fn run() -> linkdir::storage::StorageResult<()> {
//! let config = StoreConfig::from_env()?;
//! let mut store = create_adapter(&config)?;
//! store.connect().await?;
//!
//! let tools = store.add_category(NewCategory::new("Tools", "tools")).await?;
//! assert!(!tools.id.is_empty());
//!
//! store.disconnect().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod navigation;
pub mod storage;

// Re-export common types
pub use constants::*;
pub use navigation::{load_navigation, Navigation, Section};
pub use storage::{
    create_adapter, Adapter, BackendKind, Category, CategoryPatch, LinkItem, LinkPatch,
    NewCategory, NewLink, StorageAdapter, StorageError, StorageResult, StoreConfig,
};
