//! PostgresAdapter - Relational Backend
//!
//! TigerStyle: Pooled SQL storage, joins done by the server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PostgresAdapter                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pool: sqlx::PgPool (one per connect, shared by all calls)  │
//! │  Tables: categories, links (FK links.category_id)           │
//! │  get_links: single JOIN projecting categories.name          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS categories (
//!     id TEXT PRIMARY KEY,
//!     name TEXT NOT NULL,
//!     slug TEXT NOT NULL,
//!     created_date TIMESTAMPTZ NOT NULL,
//!     icon TEXT
//! );
//! CREATE TABLE IF NOT EXISTS links (
//!     id TEXT PRIMARY KEY,
//!     title TEXT NOT NULL,
//!     url TEXT NOT NULL,
//!     category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
//!     created_date TIMESTAMPTZ NOT NULL,
//!     image_url TEXT NOT NULL DEFAULT '',
//!     ai_hint TEXT NOT NULL DEFAULT '',
//!     description TEXT NOT NULL DEFAULT '',
//!     favicon_url TEXT NOT NULL DEFAULT ''
//! );
//! CREATE INDEX IF NOT EXISTS idx_links_category_id ON links(category_id);
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use sqlx::{Postgres, QueryBuilder, Row};

use crate::constants::{CATEGORY_TABLE, ENV_RELATIONAL_URL, LINK_TABLE};

use super::backend::StorageAdapter;
use super::config::{BackendKind, StoreConfig, TlsMode};
use super::entity::{
    new_id, Category, CategoryPatch, LinkItem, LinkPatch, NewCategory, NewLink, PatchField,
};
use super::error::{StorageError, StorageResult};

/// SQLSTATE for a foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATE for a NOT NULL violation.
const NOT_NULL_VIOLATION: &str = "23502";

/// Schema statements, run one at a time on connect.
const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL,
        created_date TIMESTAMPTZ NOT NULL,
        icon TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS links (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        created_date TIMESTAMPTZ NOT NULL,
        image_url TEXT NOT NULL DEFAULT '',
        ai_hint TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        favicon_url TEXT NOT NULL DEFAULT ''
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_links_category_id ON links(category_id)",
];

// =============================================================================
// PostgresAdapter
// =============================================================================

/// PostgreSQL storage adapter.
///
/// TigerStyle: Connection pooling, explicit schema, proper error handling.
#[derive(Debug)]
pub struct PostgresAdapter {
    config: StoreConfig,
    pool: Option<PgPool>,
}

impl PostgresAdapter {
    /// Create an unconnected adapter.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self { config, pool: None }
    }

    /// Get the connection pool.
    ///
    /// # Errors
    /// Returns `NotConnected` before `connect()`.
    pub fn pool(&self) -> StorageResult<&PgPool> {
        self.pool.as_ref().ok_or(StorageError::NotConnected)
    }

    /// Initialize database schema.
    async fn init_schema(pool: &PgPool) -> StorageResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(|e| map_sqlx_error("failed to create schema", e))?;
        }
        Ok(())
    }

    /// Bootstrap the schema on a fresh pool, closing it if that fails.
    async fn prepare_pool(pool: PgPool) -> StorageResult<PgPool> {
        if let Err(e) = Self::init_schema(&pool).await {
            pool.close().await;
            return Err(e);
        }
        Ok(pool)
    }

    async fn fetch_by_id(
        &self,
        table: &'static str,
        kind: &'static str,
        id: &str,
    ) -> StorageResult<PgRow> {
        sqlx::query(&format!("SELECT * FROM {table} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool()?)
            .await
            .map_err(|e| map_sqlx_error("failed to fetch row", e))?
            .ok_or_else(|| StorageError::not_found(kind, id))
    }

    async fn update_row<F: PatchField>(
        &self,
        table: &'static str,
        kind: &'static str,
        id: &str,
        assignments: &[(F, &str)],
    ) -> StorageResult<PgRow> {
        let pool = self.pool()?;

        if assignments.is_empty() {
            return self.fetch_by_id(table, kind, id).await;
        }

        let mut statement = update_statement(table, id, assignments);
        let row = statement
            .build()
            .fetch_optional(pool)
            .await
            .map_err(|e| map_sqlx_error("failed to update row", e))?;

        row.ok_or_else(|| {
            tracing::warn!(kind, id, "update target not found");
            StorageError::not_found(kind, id)
        })
    }
}

fn ssl_mode(tls: TlsMode) -> PgSslMode {
    match tls {
        TlsMode::Disable => PgSslMode::Disable,
        TlsMode::Prefer => PgSslMode::Prefer,
        TlsMode::Require => PgSslMode::Require,
        TlsMode::VerifyCa => PgSslMode::VerifyCa,
        TlsMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

/// Build `UPDATE <table> SET <col> = $n, ... WHERE id = $m RETURNING *`.
///
/// Column names come from `PatchField::column` only; values are bound.
fn update_statement<'a, F: PatchField>(
    table: &str,
    id: &'a str,
    assignments: &[(F, &'a str)],
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!("UPDATE {table} SET "));

    let mut set = builder.separated(", ");
    for (field, value) in assignments {
        set.push(field.column());
        set.push_unseparated(" = ");
        set.push_bind_unseparated(*value);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    builder
}

/// Map a driver error to the storage taxonomy.
fn map_sqlx_error(context: &str, err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(FOREIGN_KEY_VIOLATION | NOT_NULL_VIOLATION) => {
                StorageError::validation(format!("{context}: {}", db.message()))
            }
            _ => StorageError::query(format!("{context}: {err}")),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StorageError::connection(format!("{context}: {err}")),
        _ => StorageError::query(format!("{context}: {err}")),
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Parse a database row into a Category.
fn row_to_category(row: &PgRow) -> StorageResult<Category> {
    let id: String = row.try_get("id").map_err(|e| StorageError::internal(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| StorageError::internal(e.to_string()))?;
    let slug: String = row.try_get("slug").map_err(|e| StorageError::internal(e.to_string()))?;

    let created_date: DateTime<Utc> = row
        .try_get("created_date")
        .map_err(|e| StorageError::internal(e.to_string()))?;

    let icon: Option<String> = row.try_get("icon").map_err(|e| StorageError::internal(e.to_string()))?;

    Ok(Category {
        id,
        name,
        slug,
        created_date,
        icon,
    })
}

/// Parse a database row into a LinkItem.
///
/// `category_name` is only present on joined reads.
fn row_to_link(row: &PgRow) -> StorageResult<LinkItem> {
    let get = |column: &str| -> StorageResult<String> {
        row.try_get(column).map_err(|e| StorageError::internal(e.to_string()))
    };

    let category_name = match row.try_get::<String, _>("category_name") {
        Ok(name) => Some(name),
        Err(sqlx::Error::ColumnNotFound(_)) => None,
        Err(e) => return Err(StorageError::internal(e.to_string())),
    };

    let created_date: DateTime<Utc> = row
        .try_get("created_date")
        .map_err(|e| StorageError::internal(e.to_string()))?;

    Ok(LinkItem {
        id: get("id")?,
        title: get("title")?,
        url: get("url")?,
        category_id: get("category_id")?,
        category_name,
        created_date,
        image_url: get("image_url")?,
        ai_hint: get("ai_hint")?,
        description: get("description")?,
        favicon_url: get("favicon_url")?,
    })
}

// =============================================================================
// StorageAdapter Implementation
// =============================================================================

#[async_trait]
impl StorageAdapter for PostgresAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    async fn connect(&mut self) -> StorageResult<()> {
        if self.pool.is_some() {
            return Ok(());
        }

        let url = self.config.relational_url.as_deref().ok_or_else(|| {
            StorageError::configuration(format!("{ENV_RELATIONAL_URL} is not configured"))
        })?;

        let options = PgConnectOptions::from_str(url)
            .map_err(|e| StorageError::configuration(format!("invalid {ENV_RELATIONAL_URL}: {e}")))?
            .ssl_mode(ssl_mode(self.config.relational_tls));

        let pool = PgPoolOptions::new()
            .max_connections(self.config.relational_max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::connection(format!("failed to connect: {e}")))?;

        let pool = Self::prepare_pool(pool).await?;

        tracing::info!(
            max_connections = self.config.relational_max_connections,
            tls = ?self.config.relational_tls,
            "PostgreSQL connection pool created"
        );

        self.pool = Some(pool);
        Ok(())
    }

    async fn disconnect(&mut self) -> StorageResult<()> {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::info!("PostgreSQL connection pool closed");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_categories(&self) -> StorageResult<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, name, slug, created_date, icon FROM categories ORDER BY created_date, id",
        )
        .fetch_all(self.pool()?)
        .await
        .map_err(|e| map_sqlx_error("failed to list categories", e))?;

        let categories = rows.iter().map(row_to_category).collect::<StorageResult<Vec<_>>>()?;
        tracing::debug!(count = categories.len(), "categories loaded");
        Ok(categories)
    }

    #[tracing::instrument(skip(self))]
    async fn get_links(&self) -> StorageResult<Vec<LinkItem>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.title, l.url, l.category_id, c.name AS category_name,
                   l.created_date, l.image_url, l.ai_hint, l.description, l.favicon_url
            FROM links l
            JOIN categories c ON l.category_id = c.id
            ORDER BY l.created_date, l.id
            "#,
        )
        .fetch_all(self.pool()?)
        .await
        .map_err(|e| map_sqlx_error("failed to list links", e))?;

        let links = rows.iter().map(row_to_link).collect::<StorageResult<Vec<_>>>()?;
        tracing::debug!(count = links.len(), "links loaded");
        Ok(links)
    }

    #[tracing::instrument(skip(self, category), fields(name = %category.name))]
    async fn add_category(&self, category: NewCategory) -> StorageResult<Category> {
        category.validate()?;
        let pool = self.pool()?;
        let category = category.into_category(new_id());

        let row = sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, created_date, icon)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.created_date)
        .bind(&category.icon)
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("failed to insert category", e))?;

        let stored = row_to_category(&row)?;

        // Postcondition
        assert_eq!(stored.id, category.id, "stored category must keep assigned id");

        Ok(stored)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_category(&self, id: &str, patch: &CategoryPatch) -> StorageResult<Category> {
        patch.validate()?;
        let row = self
            .update_row(CATEGORY_TABLE, "category", id, &patch.assignments())
            .await?;
        row_to_category(&row)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_category(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool()?)
            .await
            .map_err(|e| map_sqlx_error("failed to delete category", e))?;

        tracing::debug!(rows = result.rows_affected(), "category delete");
        Ok(())
    }

    #[tracing::instrument(skip(self, link), fields(category_id = %link.category_id))]
    async fn add_link(&self, link: NewLink) -> StorageResult<LinkItem> {
        link.validate()?;
        let pool = self.pool()?;
        let link = link.into_link(new_id());

        let row = sqlx::query(
            r#"
            INSERT INTO links
                (id, title, url, category_id, created_date, image_url, ai_hint, description, favicon_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&link.id)
        .bind(&link.title)
        .bind(&link.url)
        .bind(&link.category_id)
        .bind(link.created_date)
        .bind(&link.image_url)
        .bind(&link.ai_hint)
        .bind(&link.description)
        .bind(&link.favicon_url)
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx_error("failed to insert link", e))?;

        row_to_link(&row)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update_link(&self, id: &str, patch: &LinkPatch) -> StorageResult<LinkItem> {
        patch.validate()?;
        let row = self
            .update_row(LINK_TABLE, "link", id, &patch.assignments())
            .await?;
        row_to_link(&row)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_link(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(self.pool()?)
            .await
            .map_err(|e| map_sqlx_error("failed to delete link", e))?;

        tracing::debug!(rows = result.rows_affected(), "link delete");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
