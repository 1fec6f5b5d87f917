//! Test fixtures for store integration tests.
//!
//! Provides a shared sample corpus and store constructors so the document and
//! relational backends are exercised against the same data.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_db::test_fixtures::{sample_corpus, seeded_stores};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (document, relational) = seeded_stores().await;
//!     // Run the same filter against both...
//! }
//! ```

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use folio_core::{MetadataDocument, MetadataStore, Para, Priority, Status};

use crate::blob_storage::MemoryBlobs;
use crate::document_store::DocumentStore;
use crate::relational_store::RelationalStore;

/// Fresh in-memory document store.
pub fn document_store() -> Arc<DocumentStore<MemoryBlobs>> {
    Arc::new(DocumentStore::in_memory())
}

/// Fresh in-memory relational store.
pub async fn relational_store() -> Arc<RelationalStore> {
    Arc::new(
        RelationalStore::in_memory()
            .await
            .expect("in-memory relational store should open"),
    )
}

/// Both backends loaded with [`sample_corpus`].
pub async fn seeded_stores() -> (Arc<dyn MetadataStore>, Arc<dyn MetadataStore>) {
    let document = document_store();
    let relational = relational_store().await;
    document
        .bulk_set(sample_corpus())
        .await
        .expect("seeding document store");
    relational
        .bulk_set(sample_corpus())
        .await
        .expect("seeding relational store");
    (document, relational)
}

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Sample corpus covering every field type, absent values and non-ASCII text.
pub fn sample_corpus() -> Vec<MetadataDocument> {
    let day = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();

    vec![
        MetadataDocument {
            path: "projects/site/plan.md".into(),
            name: "plan".into(),
            title: "Site Relaunch Plan".into(),
            collection: "work".into(),
            file_type: "markdown".into(),
            status: Some(Status::Published),
            priority: Some(Priority::High),
            size: 4096,
            created_at: Some(day(2024, 1, 10)),
            last_edited: Some(Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 15).unwrap()),
            target_date: Some(day(2024, 6, 1)),
            folders: list(&["projects", "projects/site"]),
            tags: list(&["alpha-test", "web"]),
            boards: list(&["roadmap"]),
            parents: list(&["projects/site.md"]),
            used_links: list(&["areas/design.md", "resources/css.md"]),
            para: Para {
                projects: list(&["site"]),
                ..Default::default()
            },
            ..Default::default()
        },
        MetadataDocument {
            path: "projects/site/tasks.md".into(),
            name: "tasks".into(),
            title: "Tasks".into(),
            collection: "work".into(),
            file_type: "markdown".into(),
            status: Some(Status::Draft),
            priority: Some(Priority::Low),
            size: 512,
            created_at: Some(day(2024, 1, 10)),
            last_edited: Some(day(2024, 2, 1)),
            folders: list(&["projects", "projects/site"]),
            tags: list(&["beta-test", "Web"]),
            parents: list(&["projects/site/plan.md"]),
            para: Para {
                projects: list(&["site"]),
                ..Default::default()
            },
            ..Default::default()
        },
        MetadataDocument {
            path: "areas/design.md".into(),
            name: "design".into(),
            title: "Design Système".into(),
            collection: "Work".into(),
            file_type: "markdown".into(),
            status: Some(Status::Published),
            priority: Some(Priority::Low),
            size: 10_240,
            created_at: Some(day(2023, 11, 5)),
            folders: list(&["areas"]),
            tags: list(&["DESIGN", "écriture"]),
            kids: list(&["areas/design/colors.md"]),
            links_to_here: list(&["projects/site/plan.md"]),
            para: Para {
                areas: list(&["design"]),
                ..Default::default()
            },
            ..Default::default()
        },
        MetadataDocument {
            path: "resources/css.md".into(),
            name: "css".into(),
            title: "CSS Notes".into(),
            file_type: "markdown".into(),
            status: Some(Status::Archived),
            priority: Some(Priority::Medium),
            size: 2048,
            created_at: Some(day(2022, 5, 20)),
            last_edited: Some(day(2023, 1, 1)),
            tags: list(&["web", "reference"]),
            ancestor: list(&["resources"]),
            links_to_here: list(&["projects/site/plan.md"]),
            para: Para {
                resources: list(&["frontend"]),
                ..Default::default()
            },
            ..Default::default()
        },
        MetadataDocument {
            path: "archive/2021/retro.txt".into(),
            name: "retro".into(),
            title: "Retro".into(),
            collection: "personal".into(),
            file_type: "text".into(),
            size: 0,
            tags: list(&["ÉCRITURE"]),
            para: Para {
                archive: list(&["2021"]),
                ..Default::default()
            },
            ..Default::default()
        },
        // Bare document: only a path.
        MetadataDocument::new("inbox/untitled.md"),
    ]
}
