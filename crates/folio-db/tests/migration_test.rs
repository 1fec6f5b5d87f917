//! Migration round-trip: queries after a migration match queries before it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use folio_db::test_fixtures::{document_store, relational_store, sample_corpus};
use folio_db::{
    migrate, verify_migration, BackendKind, Criterion, Error, FieldRegistry, FilterConfig, Logic,
    MetadataDocument, MetadataStore, Result, Status, ValidatedFilter,
};

fn regex_free_configs() -> Vec<FilterConfig> {
    vec![
        FilterConfig::default(),
        FilterConfig::new(Logic::And).with_criterion(Criterion::include("tags", "contains", "web")),
        FilterConfig::new(Logic::Or)
            .with_criterion(Criterion::include("status", "equals", "archived"))
            .with_criterion(Criterion::include("size", "greater", "4000")),
        FilterConfig::new(Logic::And)
            .with_criterion(Criterion::exclude("createdAt", "less", "2024-01-01"))
            .with_criterion(Criterion::include("projects", "in", "site")),
        FilterConfig::new(Logic::And)
            .with_criterion(Criterion::include("lastEdited", "gte", "2024-02-01"))
            .with_criterion(Criterion::exclude("tags", "equals", "Web")),
    ]
}

async fn query_paths(store: &dyn MetadataStore, config: &FilterConfig) -> Vec<String> {
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

async fn assert_round_trip(source: Arc<dyn MetadataStore>, destination: Arc<dyn MetadataStore>) {
    source.bulk_set(sample_corpus()).await.expect("Failed to seed source");

    let mut before = Vec::new();
    for config in regex_free_configs() {
        before.push(query_paths(source.as_ref(), &config).await);
    }

    let report = migrate(source.as_ref(), destination.as_ref())
        .await
        .expect("Migration should succeed");
    assert_eq!(report.copied, sample_corpus().len());
    assert_eq!(report.source, source.kind());
    assert_eq!(report.destination, destination.kind());

    for (config, expected) in regex_free_configs().iter().zip(before) {
        let after = query_paths(destination.as_ref(), config).await;
        assert_eq!(after, expected, "Query result changed by migration: {:?}", config);
    }

    let verification = verify_migration(source.as_ref(), destination.as_ref())
        .await
        .expect("Verification should succeed");
    assert!(verification.is_complete(), "{:?}", verification);
}

#[tokio::test]
async fn test_document_to_relational_round_trip() {
    assert_round_trip(document_store(), relational_store().await).await;
}

#[tokio::test]
async fn test_relational_to_document_round_trip() {
    assert_round_trip(relational_store().await, document_store()).await;
}

#[tokio::test]
async fn test_migration_overwrites_stale_destination_documents() {
    let source = document_store();
    let destination = relational_store().await;
    source.bulk_set(sample_corpus()).await.unwrap();

    let mut stale = sample_corpus().remove(0);
    stale.title = "Stale".to_string();
    stale.tags.clear();
    destination.set(stale.clone()).await.unwrap();

    migrate(&*source, &*destination).await.unwrap();

    let migrated = destination.get(&stale.path).await.unwrap().unwrap();
    assert_eq!(migrated, sample_corpus().remove(0));
}

#[tokio::test]
async fn test_migration_deletes_destination_documents_missing_from_source() {
    let source = relational_store().await;
    let destination = document_store();
    source.bulk_set(sample_corpus()).await.unwrap();
    destination
        .set(MetadataDocument::new("inbox/deleted-since.md").with_status(Status::Published))
        .await
        .unwrap();

    let report = migrate(&*source, &*destination).await.unwrap();
    assert_eq!(report.removed, 1);
    assert!(destination.get("inbox/deleted-since.md").await.unwrap().is_none());

    let published = FilterConfig::new(Logic::And)
        .with_criterion(Criterion::include("status", "equals", "published"));
    assert_eq!(
        query_paths(&*destination, &published).await,
        query_paths(&*source, &published).await
    );
    assert!(verify_migration(&*source, &*destination)
        .await
        .unwrap()
        .is_complete());
}

/// Source whose listing holds a document no store accepts, as a corrupt
/// blob directory or hand-edited database would produce.
struct CorruptSource {
    documents: BTreeMap<String, MetadataDocument>,
}

#[async_trait]
impl MetadataStore for CorruptSource {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }
    async fn set(&self, _document: MetadataDocument) -> Result<()> {
        unimplemented!()
    }
    async fn bulk_set(&self, _documents: Vec<MetadataDocument>) -> Result<()> {
        unimplemented!()
    }
    async fn replace_all(&self, _documents: Vec<MetadataDocument>) -> Result<usize> {
        unimplemented!()
    }
    async fn delete(&self, _path: &str) -> Result<bool> {
        unimplemented!()
    }
    async fn get(&self, path: &str) -> Result<Option<MetadataDocument>> {
        Ok(self.documents.get(path).cloned())
    }
    async fn get_all(&self) -> Result<BTreeMap<String, MetadataDocument>> {
        Ok(self.documents.clone())
    }
    async fn query(&self, _filter: &ValidatedFilter) -> Result<Vec<MetadataDocument>> {
        unimplemented!()
    }
}

#[tokio::test]
async fn test_failed_migration_leaves_relational_destination_untouched() {
    let mut documents: BTreeMap<String, MetadataDocument> = sample_corpus()
        .into_iter()
        .map(|d| (d.path.clone(), d))
        .collect();
    // Sorts last, so the batch fails after every valid document was written.
    documents.insert("~invalid".to_string(), MetadataDocument::new(""));
    let source = CorruptSource { documents };

    let destination = relational_store().await;
    destination
        .set(MetadataDocument::new("existing.md"))
        .await
        .unwrap();

    let err = migrate(&source, &*destination).await.unwrap_err();
    assert!(matches!(err, Error::InvalidValue(_)));

    let remaining = destination.get_all().await.unwrap();
    assert_eq!(
        remaining.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["existing.md"]
    );
    assert_eq!(destination.kind(), BackendKind::Relational);
}
