//! Storage Adapter Trait
//!
//! TigerStyle: Abstract interface for link-directory storage.
//!
//! Every backend satisfies the same contract, so callers never branch on
//! which store sits underneath.

use async_trait::async_trait;

use super::config::BackendKind;
use super::entity::{Category, CategoryPatch, LinkItem, LinkPatch, NewCategory, NewLink};
use super::error::StorageResult;

/// Storage contract for categories and links.
///
/// TigerStyle: All operations are async, return explicit errors.
///
/// `connect` must succeed before any other call; CRUD calls on an
/// unconnected adapter fail with `StorageError::NotConnected`.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Which backend this adapter talks to.
    fn kind(&self) -> BackendKind;

    /// Whether `connect` has succeeded and `disconnect` has not been called.
    fn is_connected(&self) -> bool;

    /// Acquire backend resources.
    ///
    /// Calling it on an already connected adapter is a no-op.
    async fn connect(&mut self) -> StorageResult<()>;

    /// Release everything acquired by `connect`.
    ///
    /// Calling it on a disconnected adapter is a no-op.
    async fn disconnect(&mut self) -> StorageResult<()>;

    /// All categories.
    async fn get_categories(&self) -> StorageResult<Vec<Category>>;

    /// All links whose category exists, with `category_name` filled in.
    async fn get_links(&self) -> StorageResult<Vec<LinkItem>>;

    /// Persist a new category under a fresh id.
    async fn add_category(&self, category: NewCategory) -> StorageResult<Category>;

    /// Merge the present fields of `patch` into the stored category.
    ///
    /// Returns `NotFound` if no category has this id.
    async fn update_category(&self, id: &str, patch: &CategoryPatch) -> StorageResult<Category>;

    /// Delete a category. Deleting a missing id succeeds.
    async fn delete_category(&self, id: &str) -> StorageResult<()>;

    /// Persist a new link under a fresh id.
    async fn add_link(&self, link: NewLink) -> StorageResult<LinkItem>;

    /// Merge the present fields of `patch` into the stored link.
    ///
    /// Returns `NotFound` if no link has this id.
    async fn update_link(&self, id: &str, patch: &LinkPatch) -> StorageResult<LinkItem>;

    /// Delete a link. Deleting a missing id succeeds.
    async fn delete_link(&self, id: &str) -> StorageResult<()>;
}
