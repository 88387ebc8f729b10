//! Adapter Factory
//!
//! Picks a backend from the configured tag and hands back an unconnected
//! adapter. The factory itself holds no state.

use async_trait::async_trait;

use super::backend::StorageAdapter;
use super::config::{BackendKind, StoreConfig};
use super::entity::{Category, CategoryPatch, LinkItem, LinkPatch, NewCategory, NewLink};
use super::error::StorageResult;
use super::mongo::MongoAdapter;
use super::postgres::PostgresAdapter;

/// A storage adapter for one of the two supported backends.
///
/// Each variant owns its connection resource.
#[derive(Debug)]
pub enum Adapter {
    /// PostgreSQL
    Relational(PostgresAdapter),
    /// MongoDB
    Document(MongoAdapter),
}

/// Forward a call to whichever variant is active.
macro_rules! dispatch {
    ($self:ident, $adapter:ident => $call:expr) => {
        match $self {
            Adapter::Relational($adapter) => $call,
            Adapter::Document($adapter) => $call,
        }
    };
}

/// Construct an unconnected adapter for the configured backend.
///
/// # Errors
/// Returns `Configuration` if the backend tag is not recognized.
pub fn create_adapter(config: &StoreConfig) -> StorageResult<Adapter> {
    let kind = config.backend_kind()?;
    tracing::debug!(backend = %kind, "creating storage adapter");

    Ok(match kind {
        BackendKind::Relational => Adapter::Relational(PostgresAdapter::new(config.clone())),
        BackendKind::Document => Adapter::Document(MongoAdapter::new(config.clone())),
    })
}

#[async_trait]
impl StorageAdapter for Adapter {
    fn kind(&self) -> BackendKind {
        dispatch!(self, a => a.kind())
    }

    fn is_connected(&self) -> bool {
        dispatch!(self, a => a.is_connected())
    }

    async fn connect(&mut self) -> StorageResult<()> {
        dispatch!(self, a => a.connect().await)
    }

    async fn disconnect(&mut self) -> StorageResult<()> {
        dispatch!(self, a => a.disconnect().await)
    }

    async fn get_categories(&self) -> StorageResult<Vec<Category>> {
        dispatch!(self, a => a.get_categories().await)
    }

    async fn get_links(&self) -> StorageResult<Vec<LinkItem>> {
        dispatch!(self, a => a.get_links().await)
    }

    async fn add_category(&self, category: NewCategory) -> StorageResult<Category> {
        dispatch!(self, a => a.add_category(category).await)
    }

    async fn update_category(&self, id: &str, patch: &CategoryPatch) -> StorageResult<Category> {
        dispatch!(self, a => a.update_category(id, patch).await)
    }

    async fn delete_category(&self, id: &str) -> StorageResult<()> {
        dispatch!(self, a => a.delete_category(id).await)
    }

    async fn add_link(&self, link: NewLink) -> StorageResult<LinkItem> {
        dispatch!(self, a => a.add_link(link).await)
    }

    async fn update_link(&self, id: &str, patch: &LinkPatch) -> StorageResult<LinkItem> {
        dispatch!(self, a => a.update_link(id, patch).await)
    }

    async fn delete_link(&self, id: &str) -> StorageResult<()> {
        dispatch!(self, a => a.delete_link(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::error::StorageError;

    #[test]
    fn test_default_backend_is_relational() {
        let adapter = create_adapter(&StoreConfig::default()).unwrap();
        assert!(matches!(adapter, Adapter::Relational(_)));
        assert_eq!(adapter.kind(), BackendKind::Relational);
        assert!(!adapter.is_connected());
    }

    #[test]
    fn test_document_backend_selected_by_tag() {
        for tag in ["document", "mongodb", "MONGO"] {
            let adapter = create_adapter(&StoreConfig::default().with_backend(tag)).unwrap();
            assert_eq!(adapter.kind(), BackendKind::Document, "tag {tag}");
        }
    }

    #[test]
    fn test_unknown_backend_is_configuration_error() {
        let err = create_adapter(&StoreConfig::default().with_backend("redis")).unwrap_err();
        assert!(matches!(err, StorageError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_missing_connection_string_reported_on_connect() {
        for tag in ["relational", "document"] {
            let mut adapter = create_adapter(&StoreConfig::default().with_backend(tag)).unwrap();
            let err = adapter.connect().await.unwrap_err();
            assert!(matches!(err, StorageError::Configuration { .. }), "tag {tag}");

            // Still safe to release
            adapter.disconnect().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_variant() {
        let adapter = create_adapter(&StoreConfig::default().with_backend("document")).unwrap();
        assert!(matches!(
            adapter.get_categories().await,
            Err(StorageError::NotConnected)
        ));
    }
}
