//! Both backends must return the same documents for every regex-free filter.
//!
//! Each case runs against the document backend (in-memory evaluation) and the
//! relational backend (compiled SQL) loaded with the same corpus. Where the
//! expected paths are listed they are checked too, so the two backends cannot
//! agree on a wrong answer.

use chrono::{DateTime, Utc};
use folio_db::test_fixtures::{document_store, relational_store, seeded_stores};
use folio_db::{Criterion, FieldRegistry, FilterConfig, Logic, MetadataDocument, MetadataStore};

const PLAN: &str = "projects/site/plan.md";
const TASKS: &str = "projects/site/tasks.md";
const DESIGN: &str = "areas/design.md";
const CSS: &str = "resources/css.md";
const RETRO: &str = "archive/2021/retro.txt";
const UNTITLED: &str = "inbox/untitled.md";

fn and(criteria: Vec<Criterion>) -> FilterConfig {
    criteria
        .into_iter()
        .fold(FilterConfig::new(Logic::And), FilterConfig::with_criterion)
}

fn or(criteria: Vec<Criterion>) -> FilterConfig {
    criteria
        .into_iter()
        .fold(FilterConfig::new(Logic::Or), FilterConfig::with_criterion)
}

fn inc(field: &str, op: &str, value: &str) -> Criterion {
    Criterion::include(field, op, value)
}

fn exc(field: &str, op: &str, value: &str) -> Criterion {
    Criterion::exclude(field, op, value)
}

/// Run a config and return result paths in store order.
async fn paths(store: &dyn MetadataStore, config: &FilterConfig) -> Vec<String> {
    let filter = config
        .validate(FieldRegistry::standard())
        .expect("Config should validate");
    store
        .query(&filter)
        .await
        .expect("Query should succeed")
        .into_iter()
        .map(|d| d.path)
        .collect()
}

fn sorted(mut paths: Vec<&str>) -> Vec<String> {
    paths.sort();
    paths.into_iter().map(String::from).collect()
}

fn cases() -> Vec<(&'static str, FilterConfig, Option<Vec<&'static str>>)> {
    vec![
        ("empty filter", FilterConfig::default(), Some(vec![PLAN, TASKS, DESIGN, CSS, RETRO, UNTITLED])),
        ("array contains substring", and(vec![inc("tags", "contains", "alpha")]), Some(vec![PLAN])),
        (
            "include with exclude under and",
            and(vec![inc("status", "equals", "published"), exc("priority", "equals", "low")]),
            Some(vec![PLAN]),
        ),
        ("array equals is case-sensitive", and(vec![inc("tags", "equals", "web")]), Some(vec![PLAN, CSS])),
        ("array equals is exact", and(vec![inc("tags", "equals", "alpha")]), Some(vec![])),
        ("array contains folds case", and(vec![inc("tags", "contains", "WEB")]), Some(vec![PLAN, TASKS, CSS])),
        ("unicode case folding", and(vec![inc("tags", "contains", "écriture")]), Some(vec![DESIGN, RETRO])),
        ("scalar contains unicode", and(vec![inc("title", "contains", "SYSTÈME")]), Some(vec![DESIGN])),
        ("scalar equals is case-sensitive", and(vec![inc("collection", "equals", "work")]), Some(vec![PLAN, TASKS])),
        ("scalar contains", and(vec![inc("collection", "contains", "work")]), Some(vec![PLAN, TASKS, DESIGN])),
        ("only excludes", and(vec![exc("status", "equals", "draft")]), Some(vec![PLAN, DESIGN, CSS, RETRO, UNTITLED])),
        ("only excludes under or", or(vec![exc("status", "equals", "draft")]), Some(vec![PLAN, DESIGN, CSS, RETRO, UNTITLED])),
        ("date gte skips absent dates", and(vec![inc("createdAt", "gte", "2024-01-10")]), Some(vec![PLAN, TASKS])),
        (
            "absent dates survive date excludes",
            and(vec![exc("createdAt", "less", "2024-01-01")]),
            Some(vec![PLAN, TASKS, RETRO, UNTITLED]),
        ),
        ("date less is strict", and(vec![inc("lastEdited", "less", "2024-02-01")]), Some(vec![CSS])),
        ("date lte includes equal", and(vec![inc("lastEdited", "lte", "2024-02-01")]), Some(vec![TASKS, CSS])),
        ("date equals", and(vec![inc("targetDate", "equals", "2024-06-01")]), Some(vec![PLAN])),
        (
            "rfc3339 literal",
            and(vec![inc("lastEdited", "equals", "2024-03-02T11:30:15+02:00")]),
            Some(vec![PLAN]),
        ),
        ("int greater", and(vec![inc("size", "greater", "2048")]), Some(vec![PLAN, DESIGN])),
        ("int lte", and(vec![inc("size", "lte", "2048")]), Some(vec![TASKS, CSS, RETRO, UNTITLED])),
        ("int equals zero", and(vec![inc("size", "equals", "0")]), Some(vec![RETRO, UNTITLED])),
        ("string in", and(vec![inc("status", "in", "draft, archived")]), Some(vec![TASKS, CSS])),
        ("name in", and(vec![inc("name", "in", "plan,css,missing")]), Some(vec![PLAN, CSS])),
        ("type equals", and(vec![inc("type", "equals", "text")]), Some(vec![RETRO])),
        ("para projects", and(vec![inc("projects", "equals", "site")]), Some(vec![PLAN, TASKS])),
        ("para archive contains", and(vec![inc("archive", "contains", "202")]), Some(vec![RETRO])),
        (
            "array in",
            and(vec![inc("linksToHere", "in", "projects/site/plan.md, nowhere.md")]),
            Some(vec![DESIGN, CSS]),
        ),
        (
            "or of includes",
            or(vec![inc("status", "equals", "archived"), inc("priority", "equals", "high")]),
            Some(vec![PLAN, CSS]),
        ),
        (
            "exclude wins under or",
            or(vec![
                inc("status", "equals", "published"),
                inc("priority", "equals", "low"),
                exc("priority", "equals", "low"),
            ]),
            Some(vec![PLAN]),
        ),
        ("absent status reads empty", and(vec![inc("status", "equals", "")]), Some(vec![RETRO, UNTITLED])),
        ("path contains", and(vec![inc("path", "contains", "SITE")]), Some(vec![PLAN, TASKS])),
        ("empty needle matches every string", and(vec![inc("title", "contains", "")]), None),
        ("empty needle over arrays", and(vec![inc("boards", "contains", "")]), Some(vec![PLAN])),
        (
            "mixed and",
            and(vec![
                inc("folders", "equals", "projects"),
                inc("size", "gte", "512"),
                exc("tags", "contains", "beta"),
            ]),
            Some(vec![PLAN]),
        ),
        (
            "several excludes",
            or(vec![
                inc("tags", "contains", "e"),
                exc("status", "in", "draft,archived"),
                exc("kids", "contains", "colors"),
            ]),
            None,
        ),
    ]
}

#[tokio::test]
async fn test_backends_agree_on_every_case() {
    let (document, relational) = seeded_stores().await;

    for (name, config, expected) in cases() {
        let from_documents = paths(document.as_ref(), &config).await;
        let from_relational = paths(relational.as_ref(), &config).await;

        assert_eq!(
            from_documents, from_relational,
            "Backends disagree on case '{}'",
            name
        );
        if let Some(expected) = expected {
            assert_eq!(from_documents, sorted(expected), "Wrong result for case '{}'", name);
        }
    }
}

#[tokio::test]
async fn test_both_backends_order_by_path() {
    let (document, relational) = seeded_stores().await;
    let config = FilterConfig::default();

    for store in [&document, &relational] {
        let result = paths(store.as_ref(), &config).await;
        let mut expected = result.clone();
        expected.sort();
        assert_eq!(result, expected, "{} backend is not path-ordered", store.kind());
    }
}

#[tokio::test]
async fn test_documents_reconstructed_identically() {
    let (document, relational) = seeded_stores().await;
    let config = and(vec![inc("tags", "contains", "web")]);
    let filter = config.validate(FieldRegistry::standard()).unwrap();

    let from_documents = document.query(&filter).await.unwrap();
    let from_relational = relational.query(&filter).await.unwrap();
    assert_eq!(from_documents, from_relational);
}

fn instant(raw: &str) -> Option<DateTime<Utc>> {
    Some(
        DateTime::parse_from_rfc3339(raw)
            .expect("Fixture timestamp should parse")
            .with_timezone(&Utc),
    )
}

#[tokio::test]
async fn test_backends_agree_on_dates_far_from_the_epoch() {
    let mut future = MetadataDocument::new("far/future.md");
    future.target_date = instant("2300-01-01T00:00:00Z");
    let mut past = MetadataDocument::new("far/past.md");
    past.created_at = instant("1500-06-15T12:00:00.5Z");
    // One nanosecond past the largest instant an i64 nanosecond count can hold.
    let mut edge = MetadataDocument::new("far/edge.md");
    edge.last_edited = instant("2262-04-11T23:47:16.854775808Z");
    let documents = vec![future, past, edge];

    let document: std::sync::Arc<dyn MetadataStore> = document_store();
    let relational: std::sync::Arc<dyn MetadataStore> = relational_store().await;
    document.bulk_set(documents.clone()).await.expect("Document backend stores far dates");
    relational.bulk_set(documents).await.expect("Relational backend stores far dates");

    let cases = vec![
        (and(vec![inc("targetDate", "greater", "2262-01-01")]), vec!["far/future.md"]),
        (and(vec![inc("targetDate", "equals", "2300-01-01")]), vec!["far/future.md"]),
        (and(vec![inc("createdAt", "less", "1677-01-01")]), vec!["far/past.md"]),
        (and(vec![inc("createdAt", "lte", "1500-06-15T12:00:00.5Z")]), vec!["far/past.md"]),
        (and(vec![inc("createdAt", "less", "1500-06-15T12:00:00.5Z")]), vec![]),
        (
            and(vec![inc("lastEdited", "equals", "2262-04-11T23:47:16.854775808Z")]),
            vec!["far/edge.md"],
        ),
        (
            and(vec![inc("lastEdited", "gte", "2262-04-11T23:47:16.854775807Z")]),
            vec!["far/edge.md"],
        ),
        (and(vec![inc("lastEdited", "lte", "2262-04-11T23:47:16.854775807Z")]), vec![]),
        (
            and(vec![exc("targetDate", "greater", "2000-01-01")]),
            vec!["far/edge.md", "far/past.md"],
        ),
    ];

    for (config, expected) in cases {
        let from_documents = paths(document.as_ref(), &config).await;
        let from_relational = paths(relational.as_ref(), &config).await;
        assert_eq!(from_documents, from_relational, "Backends disagree on {:?}", config);
        assert_eq!(from_documents, sorted(expected), "Wrong result for {:?}", config);
    }
}
