//! Storage contract tests, run against every backend that is reachable.
//!
//! Set `TEST_POSTGRES_URL` and/or `TEST_MONGODB_URL` to enable a backend.
//! Every test scopes its records with a fresh tag so runs can share a
//! database without clearing it.

use linkdir::storage::{
    create_adapter, new_id, Adapter, BackendKind, CategoryPatch, LinkPatch, NewCategory, NewLink,
    StorageAdapter, StorageError, StoreConfig, TlsMode,
};
use linkdir::load_navigation;

/// Connected adapters for every configured test backend.
async fn backends() -> Vec<Adapter> {
    dotenvy::dotenv().ok();

    let _ = tracing_subscriber::fmt()
        .with_env_filter("linkdir=debug")
        .try_init();

    let mut configs = Vec::new();

    if let Ok(url) = std::env::var("TEST_POSTGRES_URL") {
        let tls = std::env::var("TEST_POSTGRES_SSL_MODE")
            .ok()
            .and_then(|mode| mode.parse().ok())
            .unwrap_or(TlsMode::Prefer);
        configs.push(
            StoreConfig::default()
                .with_backend("relational")
                .with_relational_url(url)
                .with_relational_tls(tls),
        );
    }

    if let Ok(url) = std::env::var("TEST_MONGODB_URL") {
        configs.push(
            StoreConfig::default()
                .with_backend("document")
                .with_document_url(url)
                .with_document_database("linkdir_test"),
        );
    }

    let mut adapters = Vec::new();
    for config in configs {
        let mut adapter = create_adapter(&config).expect("valid backend tag");
        adapter.connect().await.expect("test backend should be reachable");
        adapters.push(adapter);
    }

    if adapters.is_empty() {
        eprintln!("Skipping test: neither TEST_POSTGRES_URL nor TEST_MONGODB_URL set");
    }
    adapters
}

#[tokio::test]
async fn test_add_category_round_trip() {
    for mut store in backends().await {
        let slug = format!("tools-{}", new_id());

        let created = store
            .add_category(NewCategory::new("Tools", &slug))
            .await
            .unwrap();
        assert!(!created.id.is_empty());

        let categories = store.get_categories().await.unwrap();
        let matching: Vec<_> = categories.iter().filter(|c| c.slug == slug).collect();
        assert_eq!(matching.len(), 1, "backend {}", store.kind());
        assert_eq!(matching[0].name, "Tools");
        assert_eq!(matching[0].id, created.id);
        assert_eq!(matching[0].created_date, created.created_date);

        store.delete_category(&created.id).await.unwrap();
        store.disconnect().await.unwrap();
    }
}

#[tokio::test]
async fn test_add_category_requires_name() {
    for mut store in backends().await {
        let err = store
            .add_category(NewCategory::new("", "nameless"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation { .. }), "backend {}", store.kind());
        store.disconnect().await.unwrap();
    }
}

#[tokio::test]
async fn test_partial_update_leaves_other_fields() {
    for mut store in backends().await {
        let slug = format!("a-{}", new_id());
        let category = store
            .add_category(NewCategory::new("A", &slug).with_icon("x"))
            .await
            .unwrap();

        let updated = store
            .update_category(&category.id, &CategoryPatch::default().name("B"))
            .await
            .unwrap();

        assert_eq!(updated.id, category.id);
        assert_eq!(updated.name, "B");
        assert_eq!(updated.slug, slug);
        assert_eq!(updated.icon.as_deref(), Some("x"));
        assert_eq!(updated.created_date, category.created_date);

        store.delete_category(&category.id).await.unwrap();
        store.disconnect().await.unwrap();
    }
}

#[tokio::test]
async fn test_get_links_joins_category_name() {
    for mut store in backends().await {
        let category = store
            .add_category(NewCategory::new("Tools", format!("tools-{}", new_id())))
            .await
            .unwrap();
        let link = store
            .add_link(
                NewLink::new("rustup", "https://rustup.rs", &category.id)
                    .with_description("toolchain installer"),
            )
            .await
            .unwrap();

        let links = store.get_links().await.unwrap();
        let found = links.iter().find(|l| l.id == link.id).expect("link listed");
        assert_eq!(found.category_name.as_deref(), Some("Tools"));
        assert_eq!(found.description, "toolchain installer");
        assert_eq!(found.image_url, "");

        store.delete_link(&link.id).await.unwrap();
        store.delete_category(&category.id).await.unwrap();
        store.disconnect().await.unwrap();
    }
}

#[tokio::test]
async fn test_links_of_deleted_category_disappear() {
    for mut store in backends().await {
        let category = store
            .add_category(NewCategory::new("Gone", format!("gone-{}", new_id())))
            .await
            .unwrap();
        let link = store
            .add_link(NewLink::new("orphan", "https://example.com", &category.id))
            .await
            .unwrap();

        store.delete_category(&category.id).await.unwrap();

        let links = store.get_links().await.unwrap();
        assert!(
            links.iter().all(|l| l.id != link.id),
            "backend {} listed a link without a category",
            store.kind()
        );

        store.delete_link(&link.id).await.unwrap();
        store.disconnect().await.unwrap();
    }
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    for mut store in backends().await {
        let category = store
            .add_category(NewCategory::new("Twice", format!("twice-{}", new_id())))
            .await
            .unwrap();

        store.delete_category(&category.id).await.unwrap();
        store.delete_category(&category.id).await.unwrap();
        store.delete_link("nonexistent-id").await.unwrap();

        store.disconnect().await.unwrap();
        store.disconnect().await.unwrap();
    }
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    for mut store in backends().await {
        let err = store
            .update_link("nonexistent-id", &LinkPatch::default().title("x"))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, StorageError::NotFound { kind: "link", id } if id == "nonexistent-id"),
            "backend {}: {err:?}",
            store.kind()
        );

        let err = store
            .update_category("nonexistent-id", &CategoryPatch::default().name("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        store.disconnect().await.unwrap();
    }
}

#[tokio::test]
async fn test_navigation_snapshot() {
    for mut store in backends().await {
        let category = store
            .add_category(NewCategory::new("Nav", format!("nav-{}", new_id())))
            .await
            .unwrap();
        let link = store
            .add_link(NewLink::new("home", "https://example.com", &category.id))
            .await
            .unwrap();

        let nav = load_navigation(&store).await.unwrap();
        let section = nav
            .sections()
            .into_iter()
            .find(|s| s.category.id == category.id)
            .expect("section for new category");
        assert_eq!(section.links.len(), 1);
        assert_eq!(section.links[0].id, link.id);

        store.delete_category(&category.id).await.unwrap();
        store.delete_link(&link.id).await.unwrap();
        store.disconnect().await.unwrap();
    }
}

/// Observable state after a fixed sequence of writes, ids stripped.
type Observed = (Vec<(String, String, Option<String>)>, Vec<(String, String, Option<String>, String)>);

async fn run_scenario(store: &Adapter, tag: &str) -> Observed {
    let tools = store
        .add_category(NewCategory::new("Tools", format!("tools-{tag}")).with_icon("x"))
        .await
        .unwrap();
    let docs = store
        .add_category(NewCategory::new("Docs", format!("docs-{tag}")))
        .await
        .unwrap();
    let scratch = store
        .add_category(NewCategory::new("Scratch", format!("scratch-{tag}")))
        .await
        .unwrap();

    let url = |n: u32| format!("https://example.com/{tag}/{n}");
    let l1 = store.add_link(NewLink::new("one", url(1), &tools.id)).await.unwrap();
    let l2 = store.add_link(NewLink::new("two", url(2), &docs.id)).await.unwrap();
    let l3 = store.add_link(NewLink::new("three", url(3), &tools.id)).await.unwrap();
    let l4 = store.add_link(NewLink::new("four", url(4), &scratch.id)).await.unwrap();

    store
        .update_category(&tools.id, &CategoryPatch::default().name("Toolbox"))
        .await
        .unwrap();
    store
        .update_link(&l3.id, &LinkPatch::default().category_id(&docs.id).description("moved"))
        .await
        .unwrap();
    store.delete_link(&l2.id).await.unwrap();
    store.delete_category(&scratch.id).await.unwrap();

    let mut categories: Vec<_> = store
        .get_categories()
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.slug.ends_with(tag))
        .map(|c| (c.name, c.slug.replace(tag, ""), c.icon))
        .collect();
    categories.sort();

    let mut links: Vec<_> = store
        .get_links()
        .await
        .unwrap()
        .into_iter()
        .filter(|l| l.url.contains(tag))
        .map(|l| (l.title, l.url.replace(tag, ""), l.category_name, l.description))
        .collect();
    links.sort();

    for id in [&l1.id, &l3.id, &l4.id] {
        store.delete_link(id).await.unwrap();
    }
    for id in [&tools.id, &docs.id] {
        store.delete_category(id).await.unwrap();
    }

    (categories, links)
}

#[tokio::test]
async fn test_backend_parity() {
    let stores = backends().await;
    if stores.len() < 2 {
        eprintln!("Skipping parity test: needs both TEST_POSTGRES_URL and TEST_MONGODB_URL");
        return;
    }

    let mut observed = Vec::new();
    for mut store in stores {
        let tag = new_id();
        observed.push((store.kind(), run_scenario(&store, &tag).await));
        store.disconnect().await.unwrap();
    }

    let (first_kind, first) = &observed[0];
    let (second_kind, second) = &observed[1];
    assert_eq!(*first_kind, BackendKind::Relational);
    assert_eq!(*second_kind, BackendKind::Document);
    assert_eq!(first, second);

    let (categories, links) = first;
    assert_eq!(categories.len(), 2);
    assert_eq!(
        links,
        &vec![
            ("one".to_string(), "https://example.com//1".to_string(), Some("Toolbox".to_string()), String::new()),
            ("three".to_string(), "https://example.com//3".to_string(), Some("Docs".to_string()), "moved".to_string()),
        ]
    );
}
