//! Storage - Adapter Trait and Backends
//!
//! TigerStyle: One contract, two structurally different stores.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │             create_adapter(&StoreConfig) → Adapter           │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    StorageAdapter Trait                      │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑                                       ↑
//!          │                                       │
//! ┌────────┴────────┐                     ┌────────┴────────┐
//! │ PostgresAdapter │                     │  MongoAdapter   │
//! │ (server joins)  │                     │ (pipeline join) │
//! └─────────────────┘                     └─────────────────┘
//! ```
//!
//! Lifecycle: `create_adapter` → `connect` → CRUD calls → `disconnect`.
//! Hold one connected adapter for the life of the process; its pool (or
//! client) is shared by every call.

mod backend;
mod config;
mod entity;
mod error;
mod factory;
mod mongo;
mod postgres;

pub use backend::StorageAdapter;
pub use config::{BackendKind, StoreConfig, TlsMode};
pub use entity::{
    new_id, now_millis, Category, CategoryField, CategoryPatch, LinkField, LinkItem, LinkPatch,
    NewCategory, NewLink, PatchField,
};
pub use error::{StorageError, StorageResult};
pub use factory::{create_adapter, Adapter};
pub use mongo::MongoAdapter;
pub use postgres::PostgresAdapter;
