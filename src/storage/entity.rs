//! Entity - Categories and Links
//!
//! TigerStyle: Explicit types, validation, builder pattern.
//!
//! Writes go through `NewCategory`/`NewLink` (no id, no derived fields) and
//! partial updates through `CategoryPatch`/`LinkPatch`. Patch fields are an
//! allow-list: `id`, `createdDate` and `categoryName` cannot be expressed,
//! and unknown keys in a deserialized patch are ignored.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::error::{StorageError, StorageResult};

/// Generate a record id (random 128-bit UUID v4).
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time at millisecond precision.
///
/// Both backends round-trip this losslessly (the document store keeps
/// milliseconds, the relational store microseconds).
#[must_use]
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn require(field: &str, value: &str) -> StorageResult<()> {
    if value.trim().is_empty() {
        return Err(StorageError::validation(format!("{field} is required")));
    }
    Ok(())
}

// =============================================================================
// Category
// =============================================================================

/// A category of links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Backend-assigned identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// URL-safe identifier
    pub slug: String,
    /// Creation timestamp, immutable
    pub created_date: DateTime<Utc>,
    /// Icon token; `None` means no icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Fields for creating a category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    /// Display name (required)
    #[serde(default)]
    pub name: String,
    /// URL-safe identifier
    #[serde(default)]
    pub slug: String,
    /// Optional icon token
    #[serde(default)]
    pub icon: Option<String>,
    /// Creation timestamp; filled with the current time when absent
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
}

impl NewCategory {
    /// Create with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            ..Self::default()
        }
    }

    /// Set icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set creation timestamp (stored at millisecond precision).
    #[must_use]
    pub fn with_created_date(mut self, created_date: DateTime<Utc>) -> Self {
        self.created_date = Some(created_date);
        self
    }

    /// Check required fields.
    ///
    /// # Errors
    /// Returns `Validation` if `name` is empty.
    pub fn validate(&self) -> StorageResult<()> {
        require("name", &self.name)
    }

    /// Build the record to persist under `id`.
    #[must_use]
    pub fn into_category(self, id: String) -> Category {
        Category {
            id,
            name: self.name,
            slug: self.slug,
            created_date: self.created_date.map_or_else(now_millis, |d| d.trunc_subsecs(3)),
            icon: self.icon,
        }
    }
}

// =============================================================================
// Link
// =============================================================================

/// A link inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkItem {
    /// Backend-assigned identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Target URL
    pub url: String,
    /// Referenced category
    pub category_id: String,
    /// Name of the referenced category, filled by `get_links` only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Creation timestamp, immutable
    pub created_date: DateTime<Utc>,
    /// Preview image
    #[serde(default)]
    pub image_url: String,
    /// Hint for image generation
    #[serde(default)]
    pub ai_hint: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Site favicon
    #[serde(default)]
    pub favicon_url: String,
}

/// Fields for creating a link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLink {
    /// Display title (required)
    #[serde(default)]
    pub title: String,
    /// Target URL (required)
    #[serde(default)]
    pub url: String,
    /// Referenced category (required)
    #[serde(default)]
    pub category_id: String,
    /// Creation timestamp; filled with the current time when absent
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    /// Preview image
    #[serde(default)]
    pub image_url: String,
    /// Hint for image generation
    #[serde(default)]
    pub ai_hint: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Site favicon
    #[serde(default)]
    pub favicon_url: String,
}

impl NewLink {
    /// Create with the required fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            category_id: category_id.into(),
            ..Self::default()
        }
    }

    /// Set preview image.
    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    /// Set image hint.
    #[must_use]
    pub fn with_ai_hint(mut self, ai_hint: impl Into<String>) -> Self {
        self.ai_hint = ai_hint.into();
        self
    }

    /// Set description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set favicon.
    #[must_use]
    pub fn with_favicon_url(mut self, favicon_url: impl Into<String>) -> Self {
        self.favicon_url = favicon_url.into();
        self
    }

    /// Set creation timestamp (stored at millisecond precision).
    #[must_use]
    pub fn with_created_date(mut self, created_date: DateTime<Utc>) -> Self {
        self.created_date = Some(created_date);
        self
    }

    /// Check required fields.
    ///
    /// # Errors
    /// Returns `Validation` if `title`, `url` or `categoryId` is empty.
    pub fn validate(&self) -> StorageResult<()> {
        require("title", &self.title)?;
        require("url", &self.url)?;
        require("categoryId", &self.category_id)
    }

    /// Build the record to persist under `id`.
    #[must_use]
    pub fn into_link(self, id: String) -> LinkItem {
        LinkItem {
            id,
            title: self.title,
            url: self.url,
            category_id: self.category_id,
            category_name: None,
            created_date: self.created_date.map_or_else(now_millis, |d| d.trunc_subsecs(3)),
            image_url: self.image_url,
            ai_hint: self.ai_hint,
            description: self.description,
            favicon_url: self.favicon_url,
        }
    }
}

// =============================================================================
// Partial Updates
// =============================================================================

/// A mutable field of a stored record.
///
/// Implementations are closed enums; backends only ever write names
/// returned from here.
pub trait PatchField: Copy + std::fmt::Debug + Send + Sync {
    /// Relational column name.
    fn column(self) -> &'static str;

    /// Document field name.
    fn document_key(self) -> &'static str;
}

/// Mutable category fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    /// `name`
    Name,
    /// `slug`
    Slug,
    /// `icon`
    Icon,
}

impl PatchField for CategoryField {
    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Slug => "slug",
            Self::Icon => "icon",
        }
    }

    fn document_key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Slug => "slug",
            Self::Icon => "icon",
        }
    }
}

/// Mutable link fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    /// `title`
    Title,
    /// `url`
    Url,
    /// `categoryId`
    CategoryId,
    /// `imageUrl`
    ImageUrl,
    /// `aiHint`
    AiHint,
    /// `description`
    Description,
    /// `faviconUrl`
    FaviconUrl,
}

impl PatchField for LinkField {
    fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Url => "url",
            Self::CategoryId => "category_id",
            Self::ImageUrl => "image_url",
            Self::AiHint => "ai_hint",
            Self::Description => "description",
            Self::FaviconUrl => "favicon_url",
        }
    }

    fn document_key(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Url => "url",
            Self::CategoryId => "categoryId",
            Self::ImageUrl => "imageUrl",
            Self::AiHint => "aiHint",
            Self::Description => "description",
            Self::FaviconUrl => "faviconUrl",
        }
    }
}

/// Partial category update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New slug
    #[serde(default)]
    pub slug: Option<String>,
    /// New icon
    #[serde(default)]
    pub icon: Option<String>,
}

impl CategoryPatch {
    /// Set name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set slug.
    #[must_use]
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Set icon.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Fields present in this patch, in declaration order.
    #[must_use]
    pub fn assignments(&self) -> Vec<(CategoryField, &str)> {
        [
            (CategoryField::Name, self.name.as_deref()),
            (CategoryField::Slug, self.slug.as_deref()),
            (CategoryField::Icon, self.icon.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }

    /// Reject present-but-empty required fields.
    ///
    /// # Errors
    /// Returns `Validation` if `name` is present and empty.
    pub fn validate(&self) -> StorageResult<()> {
        match &self.name {
            Some(name) => require("name", name),
            None => Ok(()),
        }
    }
}

/// Partial link update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPatch {
    /// New title
    #[serde(default)]
    pub title: Option<String>,
    /// New URL
    #[serde(default)]
    pub url: Option<String>,
    /// New category reference
    #[serde(default)]
    pub category_id: Option<String>,
    /// New preview image
    #[serde(default)]
    pub image_url: Option<String>,
    /// New image hint
    #[serde(default)]
    pub ai_hint: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New favicon
    #[serde(default)]
    pub favicon_url: Option<String>,
}

impl LinkPatch {
    /// Set title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set category reference.
    #[must_use]
    pub fn category_id(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Set preview image.
    #[must_use]
    pub fn image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Set image hint.
    #[must_use]
    pub fn ai_hint(mut self, ai_hint: impl Into<String>) -> Self {
        self.ai_hint = Some(ai_hint.into());
        self
    }

    /// Set description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set favicon.
    #[must_use]
    pub fn favicon_url(mut self, favicon_url: impl Into<String>) -> Self {
        self.favicon_url = Some(favicon_url.into());
        self
    }

    /// Fields present in this patch, in declaration order.
    #[must_use]
    pub fn assignments(&self) -> Vec<(LinkField, &str)> {
        [
            (LinkField::Title, self.title.as_deref()),
            (LinkField::Url, self.url.as_deref()),
            (LinkField::CategoryId, self.category_id.as_deref()),
            (LinkField::ImageUrl, self.image_url.as_deref()),
            (LinkField::AiHint, self.ai_hint.as_deref()),
            (LinkField::Description, self.description.as_deref()),
            (LinkField::FaviconUrl, self.favicon_url.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }

    /// Reject present-but-empty required fields.
    ///
    /// # Errors
    /// Returns `Validation` if `title`, `url` or `categoryId` is present and empty.
    pub fn validate(&self) -> StorageResult<()> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        if let Some(url) = &self.url {
            require("url", url)?;
        }
        if let Some(category_id) = &self.category_id {
            require("categoryId", category_id)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
