//! MongoAdapter - Document Backend
//!
//! TigerStyle: Schema-less documents, join emulated by an aggregation
//! pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       MongoAdapter                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Client: mongodb::Client (single shared handle)             │
//! │  Collections: categories, links (unique index on `id`)      │
//! │  get_links: $lookup → $unwind → $addFields → $project       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are addressed by the application-level `id` field, never by
//! the store's `_id`. `categoryId` is not checked on write; a link whose
//! category is missing produces no `$lookup` match and is dropped by
//! `$unwind`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, DateTime as BsonDateTime, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};

use crate::constants::{APP_NAME, CATEGORY_COLLECTION, ENV_DOCUMENT_URL, LINK_COLLECTION};

use super::backend::StorageAdapter;
use super::config::{BackendKind, StoreConfig};
use super::entity::{
    new_id, Category, CategoryPatch, LinkItem, LinkPatch, NewCategory, NewLink, PatchField,
};
use super::error::{StorageError, StorageResult};

// =============================================================================
// Documents
// =============================================================================

/// Stored shape of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryDocument {
    id: String,
    name: String,
    slug: String,
    created_date: BsonDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
}

/// Stored shape of a link. `category_name` only appears in pipeline output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkDocument {
    id: String,
    title: String,
    url: String,
    category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category_name: Option<String>,
    created_date: BsonDateTime,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    ai_hint: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    favicon_url: String,
}

fn to_bson_date(date: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(date.timestamp_millis())
}

fn from_bson_date(date: BsonDateTime) -> StorageResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(date.timestamp_millis())
        .ok_or_else(|| StorageError::internal(format!("timestamp out of range: {date}")))
}

impl From<&Category> for CategoryDocument {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            created_date: to_bson_date(category.created_date),
            icon: category.icon.clone(),
        }
    }
}

impl TryFrom<CategoryDocument> for Category {
    type Error = StorageError;

    fn try_from(doc: CategoryDocument) -> StorageResult<Self> {
        Ok(Self {
            id: doc.id,
            name: doc.name,
            slug: doc.slug,
            created_date: from_bson_date(doc.created_date)?,
            icon: doc.icon,
        })
    }
}

impl From<&LinkItem> for LinkDocument {
    fn from(link: &LinkItem) -> Self {
        Self {
            id: link.id.clone(),
            title: link.title.clone(),
            url: link.url.clone(),
            category_id: link.category_id.clone(),
            category_name: None,
            created_date: to_bson_date(link.created_date),
            image_url: link.image_url.clone(),
            ai_hint: link.ai_hint.clone(),
            description: link.description.clone(),
            favicon_url: link.favicon_url.clone(),
        }
    }
}

impl TryFrom<LinkDocument> for LinkItem {
    type Error = StorageError;

    fn try_from(doc: LinkDocument) -> StorageResult<Self> {
        Ok(Self {
            id: doc.id,
            title: doc.title,
            url: doc.url,
            category_id: doc.category_id,
            category_name: doc.category_name,
            created_date: from_bson_date(doc.created_date)?,
            image_url: doc.image_url,
            ai_hint: doc.ai_hint,
            description: doc.description,
            favicon_url: doc.favicon_url,
        })
    }
}

// =============================================================================
// Pipeline and Update Documents
// =============================================================================

/// Link/category join: lookup by application id, drop unmatched links,
/// copy the category name, strip the embedded category.
fn links_pipeline() -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": CATEGORY_COLLECTION,
                "localField": "categoryId",
                "foreignField": "id",
                "as": "category",
            }
        },
        doc! { "$unwind": "$category" },
        doc! { "$addFields": { "categoryName": "$category.name" } },
        doc! { "$project": { "_id": 0, "category": 0 } },
        doc! { "$sort": { "createdDate": 1, "id": 1 } },
    ]
}

/// `$set` body from allow-listed fields.
fn set_document<F: PatchField>(assignments: &[(F, &str)]) -> Document {
    let mut set = Document::new();
    for (field, value) in assignments {
        set.insert(field.document_key(), *value);
    }
    set
}

/// Map a driver error to the storage taxonomy.
fn map_mongo_error(context: &str, err: mongodb::error::Error) -> StorageError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. } => {
            StorageError::connection(format!("{context}: {err}"))
        }
        _ => StorageError::query(format!("{context}: {err}")),
    }
}

// =============================================================================
// MongoAdapter
// =============================================================================

/// MongoDB storage adapter.
#[derive(Debug)]
pub struct MongoAdapter {
    config: StoreConfig,
    client: Option<Client>,
}

impl MongoAdapter {
    /// Create an unconnected adapter.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    fn client(&self) -> StorageResult<&Client> {
        self.client.as_ref().ok_or(StorageError::NotConnected)
    }

    fn categories(&self) -> StorageResult<Collection<CategoryDocument>> {
        Ok(self
            .client()?
            .database(&self.config.document_database)
            .collection(CATEGORY_COLLECTION))
    }

    fn links(&self) -> StorageResult<Collection<LinkDocument>> {
        Ok(self
            .client()?
            .database(&self.config.document_database)
            .collection(LINK_COLLECTION))
    }

    /// Create unique `id` indexes and the `categoryId` lookup index.
    async fn init_indexes(&self) -> StorageResult<()> {
        let unique_id = || {
            IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };

        self.categories()?
            .create_index(unique_id())
            .await
            .map_err(|e| map_mongo_error("failed to create category index", e))?;

        let links = self.links()?;
        links
            .create_index(unique_id())
            .await
            .map_err(|e| map_mongo_error("failed to create link index", e))?;
        links
            .create_index(IndexModel::builder().keys(doc! { "categoryId": 1 }).build())
            .await
            .map_err(|e| map_mongo_error("failed to create link index", e))?;

        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MongoAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn connect(&mut self) -> StorageResult<()> {
        if self.client.is_some() {
            return Ok(());
        }

        let url = self.config.document_url.as_deref().ok_or_else(|| {
            StorageError::configuration(format!("{ENV_DOCUMENT_URL} is not configured"))
        })?;

        let mut options = ClientOptions::parse(url).await.map_err(|e| match e.kind.as_ref() {
            ErrorKind::InvalidArgument { .. } => {
                StorageError::configuration(format!("invalid {ENV_DOCUMENT_URL}: {e}"))
            }
            _ => StorageError::connection(format!("failed to resolve {ENV_DOCUMENT_URL}: {e}")),
        })?;
        options.app_name = Some(APP_NAME.to_string());

        let client = Client::with_options(options)
            .map_err(|e| StorageError::configuration(format!("invalid client options: {e}")))?;

        // The driver connects lazily; ping to surface an unreachable server here
        client
            .database(&self.config.document_database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StorageError::connection(format!("failed to connect: {e}")))?;

        self.client = Some(client);

        if let Err(e) = self.init_indexes().await {
            self.disconnect().await?;
            return Err(e);
        }

        tracing::info!(database = %self.config.document_database, "MongoDB connection established");
        Ok(())
    }

    async fn disconnect(&mut self) -> StorageResult<()> {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            tracing::info!("MongoDB connection closed");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_categories(&self) -> StorageResult<Vec<Category>> {
        let docs: Vec<CategoryDocument> = self
            .categories()?
            .find(doc! {})
            .sort(doc! { "createdDate": 1, "id": 1 })
            .await
            .map_err(|e| map_mongo_error("failed to list categories", e))?
            .try_collect()
            .await
            .map_err(|e| map_mongo_error("failed to read categories", e))?;

        let categories = docs
            .into_iter()
            .map(Category::try_from)
            .collect::<StorageResult<Vec<_>>>()?;
        tracing::debug!(count = categories.len(), "categories loaded");
        Ok(categories)
    }

    #[tracing::instrument(skip(self))]
    async fn get_links(&self) -> StorageResult<Vec<LinkItem>> {
        let docs: Vec<Document> = self
            .links()?
            .aggregate(links_pipeline())
            .await
            .map_err(|e| map_mongo_error("failed to run link pipeline", e))?
            .try_collect()
            .await
            .map_err(|e| map_mongo_error("failed to read links", e))?;

        let links = docs
            .into_iter()
            .map(|doc| {
                let doc: LinkDocument = bson::from_document(doc)
                    .map_err(|e| StorageError::internal(format!("malformed link document: {e}")))?;
                LinkItem::try_from(doc)
            })
            .collect::<StorageResult<Vec<_>>>()?;
        tracing::debug!(count = links.len(), "links loaded");
        Ok(links)
    }

    #[tracing::instrument(skip(self, category), fields(name = %category.name))]
    async fn add_category(&self, category: NewCategory) -> StorageResult<Category> {
        category.validate()?;
        let collection = self.categories()?;
        let category = category.into_category(new_id());

        collection
            .insert_one(CategoryDocument::from(&category))
            .await
            .map_err(|e| map_mongo_error("failed to insert category", e))?;

        Ok(category)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_category(&self, id: &str, patch: &CategoryPatch) -> StorageResult<Category> {
        patch.validate()?;
        let collection = self.categories()?;
        let assignments = patch.assignments();

        let updated = if assignments.is_empty() {
            collection.find_one(doc! { "id": id }).await
        } else {
            collection
                .find_one_and_update(doc! { "id": id }, doc! { "$set": set_document(&assignments) })
                .return_document(ReturnDocument::After)
                .await
        }
        .map_err(|e| map_mongo_error("failed to update category", e))?;

        match updated {
            Some(doc) => Category::try_from(doc),
            None => {
                tracing::warn!(id, "category not found");
                Err(StorageError::not_found("category", id))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_category(&self, id: &str) -> StorageResult<()> {
        let result = self
            .categories()?
            .delete_one(doc! { "id": id })
            .await
            .map_err(|e| map_mongo_error("failed to delete category", e))?;

        tracing::debug!(deleted = result.deleted_count, "category delete");
        Ok(())
    }

    #[tracing::instrument(skip(self, link), fields(category_id = %link.category_id))]
    async fn add_link(&self, link: NewLink) -> StorageResult<LinkItem> {
        link.validate()?;
        let collection = self.links()?;
        let link = link.into_link(new_id());

        collection
            .insert_one(LinkDocument::from(&link))
            .await
            .map_err(|e| map_mongo_error("failed to insert link", e))?;

        Ok(link)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_link(&self, id: &str, patch: &LinkPatch) -> StorageResult<LinkItem> {
        patch.validate()?;
        let collection = self.links()?;
        let assignments = patch.assignments();

        let updated = if assignments.is_empty() {
            collection.find_one(doc! { "id": id }).await
        } else {
            collection
                .find_one_and_update(doc! { "id": id }, doc! { "$set": set_document(&assignments) })
                .return_document(ReturnDocument::After)
                .await
        }
        .map_err(|e| map_mongo_error("failed to update link", e))?;

        match updated {
            Some(doc) => LinkItem::try_from(doc),
            None => {
                tracing::warn!(id, "link not found");
                Err(StorageError::not_found("link", id))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_link(&self, id: &str) -> StorageResult<()> {
        let result = self
            .links()?
            .delete_one(doc! { "id": id })
            .await
            .map_err(|e| map_mongo_error("failed to delete link", e))?;

        tracing::debug!(deleted = result.deleted_count, "link delete");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::entity::{now_millis, CategoryField, LinkField};
    use std::env;

    #[test]
    fn test_links_pipeline_joins_on_application_id() {
        let pipeline = links_pipeline();

        let lookup = pipeline[0].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), "categories");
        assert_eq!(lookup.get_str("localField").unwrap(), "categoryId");
        assert_eq!(lookup.get_str("foreignField").unwrap(), "id");

        assert_eq!(pipeline[1].get_str("$unwind").unwrap(), "$category");

        let add = pipeline[2].get_document("$addFields").unwrap();
        assert_eq!(add.get_str("categoryName").unwrap(), "$category.name");
    }

    #[test]
    fn test_set_document_uses_document_keys() {
        let set = set_document(&[(LinkField::CategoryId, "cat-2"), (LinkField::AiHint, "sun")]);
        assert_eq!(set, doc! { "categoryId": "cat-2", "aiHint": "sun" });

        let set = set_document(&[(CategoryField::Name, "B")]);
        assert_eq!(set, doc! { "name": "B" });
    }

    #[test]
    fn test_category_document_round_trip() {
        let category = NewCategory::new("Tools", "tools")
            .with_icon("wrench")
            .into_category(new_id());

        let stored = bson::to_document(&CategoryDocument::from(&category)).unwrap();
        assert!(stored.get_datetime("createdDate").is_ok());
        assert_eq!(stored.get_str("icon").unwrap(), "wrench");

        let back: CategoryDocument = bson::from_document(stored).unwrap();
        assert_eq!(Category::try_from(back).unwrap(), category);
    }

    #[test]
    fn test_sub_millisecond_created_date_round_trips() {
        let category = NewCategory::new("Tools", "tools")
            .with_created_date(Utc::now())
            .into_category(new_id());

        let stored = bson::to_document(&CategoryDocument::from(&category)).unwrap();
        let back: CategoryDocument = bson::from_document(stored).unwrap();
        assert_eq!(Category::try_from(back).unwrap(), category);
    }

    #[test]
    fn test_link_document_ignores_store_fields() {
        let created = now_millis();
        let doc = doc! {
            "_id": bson::oid::ObjectId::new(),
            "id": "l-1",
            "title": "Docs",
            "url": "https://docs.rs",
            "categoryId": "c-1",
            "categoryName": "Tools",
            "createdDate": to_bson_date(created),
        };

        let link = LinkItem::try_from(bson::from_document::<LinkDocument>(doc).unwrap()).unwrap();
        assert_eq!(link.category_name.as_deref(), Some("Tools"));
        assert_eq!(link.created_date, created);
        assert_eq!(link.description, "");
    }

    #[test]
    fn test_new_link_document_has_no_category_name() {
        let link = NewLink::new("Docs", "https://docs.rs", "c-1").into_link(new_id());
        let stored = bson::to_document(&LinkDocument::from(&link)).unwrap();
        assert!(!stored.contains_key("categoryName"));
    }

    #[tokio::test]
    async fn test_connect_without_url_is_configuration_error() {
        let mut adapter = MongoAdapter::new(StoreConfig::default());
        let err = adapter.connect().await.unwrap_err();
        assert!(matches!(err, StorageError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_operations_before_connect_fail() {
        let adapter = MongoAdapter::new(StoreConfig::default());
        assert!(matches!(adapter.get_links().await, Err(StorageError::NotConnected)));
        assert!(matches!(
            adapter.delete_category("x").await,
            Err(StorageError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected_is_noop() {
        let mut adapter = MongoAdapter::new(StoreConfig::default());
        adapter.disconnect().await.unwrap();
        assert_eq!(adapter.kind(), BackendKind::Document);
    }

    // =========================================================================
    // Tests (require running MongoDB)
    // =========================================================================

    /// Get test database URL from environment.
    fn test_db_url() -> Option<String> {
        env::var("TEST_MONGODB_URL").ok()
    }

    /// Skip test if no database available.
    macro_rules! require_db {
        () => {
            match test_db_url() {
                Some(url) => url,
                None => {
                    eprintln!("Skipping test: TEST_MONGODB_URL not set");
                    return;
                }
            }
        };
    }

    async fn connected(url: &str) -> MongoAdapter {
        let config = StoreConfig::default()
            .with_document_url(url)
            .with_document_database("linkdir_test");
        let mut adapter = MongoAdapter::new(config);
        adapter.connect().await.unwrap();
        adapter
    }

    #[tokio::test]
    async fn test_mongo_connection() {
        let url = require_db!();
        let mut adapter = connected(&url).await;
        assert!(adapter.is_connected());
        adapter.disconnect().await.unwrap();
        assert!(!adapter.is_connected());
    }

    #[tokio::test]
    async fn test_mongo_dangling_link_accepted_but_hidden() {
        let url = require_db!();
        let mut adapter = connected(&url).await;

        let orphan = adapter
            .add_link(NewLink::new("Orphan", "https://example.com", new_id()))
            .await
            .unwrap();

        let links = adapter.get_links().await.unwrap();
        assert!(links.iter().all(|l| l.id != orphan.id));

        adapter.delete_link(&orphan.id).await.unwrap();
        adapter.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_mongo_update_link_to_dangling_category_hidden() {
        let url = require_db!();
        let mut adapter = connected(&url).await;

        let category = adapter
            .add_category(NewCategory::new("Home", format!("home-{}", new_id())))
            .await
            .unwrap();
        let link = adapter
            .add_link(NewLink::new("Move", "https://example.com", &category.id))
            .await
            .unwrap();

        let missing = new_id();
        let moved = adapter
            .update_link(&link.id, &LinkPatch::default().category_id(&missing))
            .await
            .unwrap();
        assert_eq!(moved.category_id, missing);

        let links = adapter.get_links().await.unwrap();
        assert!(links.iter().all(|l| l.id != link.id));

        adapter.delete_link(&link.id).await.unwrap();
        adapter.delete_category(&category.id).await.unwrap();
        adapter.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_mongo_update_keyed_on_application_id() {
        let url = require_db!();
        let mut adapter = connected(&url).await;

        let category = adapter
            .add_category(NewCategory::new("A", format!("a-{}", new_id())).with_icon("x"))
            .await
            .unwrap();

        let updated = adapter
            .update_category(&category.id, &CategoryPatch::default().name("B"))
            .await
            .unwrap();
        assert_eq!(updated.id, category.id);
        assert_eq!(updated.name, "B");
        assert_eq!(updated.slug, category.slug);
        assert_eq!(updated.icon.as_deref(), Some("x"));
        assert_eq!(updated.created_date, category.created_date);

        adapter.delete_category(&category.id).await.unwrap();
        adapter.disconnect().await.unwrap();
    }
}
