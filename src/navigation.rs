//! Navigation Snapshot
//!
//! TigerStyle: One read of both collections, grouped for the public listing.
//!
//! Categories and links are fetched concurrently; grouping happens in
//! memory and never touches the store again.

use serde::Serialize;

use crate::storage::{Category, LinkItem, StorageAdapter, StorageResult};

/// Everything the public listing renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// All categories
    pub categories: Vec<Category>,
    /// All links with a resolvable category
    pub links: Vec<LinkItem>,
}

/// A category and its links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section<'a> {
    /// The category
    pub category: &'a Category,
    /// Links in this category, in stored order
    pub links: Vec<&'a LinkItem>,
}

impl Navigation {
    /// Links belonging to one category.
    #[must_use]
    pub fn links_in(&self, category_id: &str) -> Vec<&LinkItem> {
        self.links
            .iter()
            .filter(|link| link.category_id == category_id)
            .collect()
    }

    /// Links grouped under their categories.
    ///
    /// Categories are ordered by creation date, then name. Empty categories
    /// are kept so the listing can show them.
    #[must_use]
    pub fn sections(&self) -> Vec<Section<'_>> {
        let mut categories: Vec<&Category> = self.categories.iter().collect();
        categories.sort_by(|a, b| {
            a.created_date
                .cmp(&b.created_date)
                .then_with(|| a.name.cmp(&b.name))
        });

        categories
            .into_iter()
            .map(|category| Section {
                category,
                links: self.links_in(&category.id),
            })
            .collect()
    }
}

/// Load categories and links concurrently.
///
/// # Errors
/// Returns the first storage error from either read.
pub async fn load_navigation<S>(store: &S) -> StorageResult<Navigation>
where
    S: StorageAdapter + ?Sized,
{
    let (categories, links) = futures::try_join!(store.get_categories(), store.get_links())?;

    tracing::debug!(
        categories = categories.len(),
        links = links.len(),
        "navigation loaded"
    );

    Ok(Navigation { categories, links })
}

// =============================================================================
// Tests
// =============================================================================
