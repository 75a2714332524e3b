//! Integration tests for the generic repository.
//!
//! Run with `cargo test -- --ignored` against a live PostgreSQL instance.

mod helpers;

use neowatch_core::types::{Filter, FilterSet, RecordData};
use neowatch_core::ErrorKind;
use neowatch_database::ConflictAction;
use neowatch_entity::Asteroid;

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn create_and_read_back() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    let created = repo.create(&helpers::asteroid("433", "Eros")).await.unwrap();
    assert_eq!(created.designation, "433");
    assert_eq!(created.name.as_deref(), Some("Eros"));

    let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.designation, created.designation);

    assert!(repo.get_by_id(created.id + 999).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn create_rejects_bad_data() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    let unknown = RecordData::new()
        .set("designation", "433")
        .set("is_neo", true)
        .set("is_pha", false)
        .set("spectral_class", "S");
    let err = repo.create(&unknown).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let missing = RecordData::new().set("name", "Nameless");
    let err = repo.create(&missing).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn filter_with_operator_suffixes() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    for (des, diameter) in [("a1", 0.3), ("a2", 1.4), ("a3", 5.0)] {
        repo.create(&helpers::sized_asteroid(des, diameter))
            .await
            .unwrap();
    }

    let filters = FilterSet::new()
        .with(Filter::parse("estimated_diameter_km__gte", 1.0).unwrap());
    let large = repo.filter(&filters, 0, None, None, false).await.unwrap();
    assert_eq!(large.len(), 2);

    let filters = FilterSet::new().with(Filter::parse("designation__in", vec!["a1", "a3"]).unwrap());
    let picked = repo.filter(&filters, 0, None, None, false).await.unwrap();
    assert_eq!(picked.len(), 2);

    // Descending order by a declared column.
    let all = repo
        .filter(&FilterSet::new(), 0, None, Some("estimated_diameter_km"), true)
        .await
        .unwrap();
    assert_eq!(all[0].designation, "a3");

    let err = repo
        .filter(&FilterSet::new(), 0, None, Some("no_such_column"), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFilter);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn unknown_filter_field_is_rejected() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    let filters = FilterSet::new().with(Filter::parse("spectral_class", "S").unwrap());
    let err = repo.filter(&filters, 0, None, None, false).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFilter);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn search_is_case_insensitive_and_text_only() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    repo.create(&helpers::asteroid("433", "Eros")).await.unwrap();
    repo.create(&helpers::asteroid("99942", "Apophis"))
        .await
        .unwrap();

    let hits = repo.search("ERO", &["name", "designation"], 0, None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].designation, "433");

    // Empty field list short-circuits.
    let none = repo.search("Eros", &[], 0, None).await.unwrap();
    assert!(none.is_empty());

    let err = repo
        .search("x", &["estimated_diameter_km"], 0, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidFilter);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn pagination_is_stable() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    for i in 0..5 {
        repo.create(&helpers::asteroid(&format!("p{i}"), "page"))
            .await
            .unwrap();
    }

    let first = repo.get_all(0, Some(2)).await.unwrap();
    let second = repo.get_all(2, Some(2)).await.unwrap();
    let third = repo.get_all(4, Some(2)).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(third.len(), 1);

    let mut seen: Vec<String> = Vec::new();
    for page in [first, second, third] {
        for row in page {
            assert!(!seen.contains(&row.designation));
            seen.push(row.designation);
        }
    }
    assert_eq!(repo.count().await.unwrap(), 5);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn ordered_pages_stay_disjoint_on_duplicate_keys() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    // All rows share the order key, so only the id tie-breaker keeps
    // consecutive pages from overlapping.
    for i in 0..6 {
        repo.create(&helpers::sized_asteroid(&format!("t{i}"), 2.0))
            .await
            .unwrap();
    }

    let mut seen: Vec<String> = Vec::new();
    for skip in [0, 2, 4] {
        let page = repo
            .filter(
                &FilterSet::new(),
                skip,
                Some(2),
                Some("estimated_diameter_km"),
                false,
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        for row in page {
            assert!(!seen.contains(&row.designation));
            seen.push(row.designation);
        }
    }
    assert_eq!(seen.len(), 6);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn update_and_delete() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    let created = repo.create(&helpers::asteroid("433", "Eros")).await.unwrap();

    let patch = RecordData::new().set("name", "Eros (renamed)");
    let updated = repo.update(created.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.name.as_deref(), Some("Eros (renamed)"));
    assert_eq!(updated.designation, "433");

    assert!(repo.update(created.id + 999, &patch).await.unwrap().is_none());

    assert!(repo.delete(created.id).await.unwrap());
    assert!(!repo.delete(created.id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn bulk_upsert_update_mode_merges() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    let (created, updated) = repo
        .bulk_create(
            &[helpers::asteroid("433", "Eros"), helpers::asteroid("99942", "Apophis")],
            ConflictAction::Update,
            None,
        )
        .await
        .unwrap();
    assert_eq!((created, updated), (2, 0));

    // Second pass: one existing record with new data, one new record.
    let second = vec![
        helpers::asteroid("433", "Eros revised"),
        helpers::asteroid("1950DA", "1950 DA"),
    ];
    let (created, updated) = repo
        .bulk_create(&second, ConflictAction::Update, None)
        .await
        .unwrap();
    assert_eq!((created, updated), (1, 1));

    let filters = FilterSet::new().with(Filter::parse("designation", "433").unwrap());
    let rows = repo.filter(&filters, 0, None, None, false).await.unwrap();
    assert_eq!(rows[0].name.as_deref(), Some("Eros revised"));
    assert_eq!(repo.count().await.unwrap(), 3);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn bulk_upsert_skip_mode_preserves_existing() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    repo.create(&helpers::asteroid("433", "Eros")).await.unwrap();

    let (created, updated) = repo
        .bulk_create(
            &[helpers::asteroid("433", "Imposter")],
            ConflictAction::Skip,
            None,
        )
        .await
        .unwrap();
    assert_eq!((created, updated), (0, 0));

    let rows = repo.get_all(0, None).await.unwrap();
    assert_eq!(rows[0].name.as_deref(), Some("Eros"));
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn bulk_upsert_dedupes_within_batch() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    let batch = vec![
        helpers::asteroid("433", "first"),
        helpers::asteroid("433", "last"),
    ];
    let (created, updated) = repo
        .bulk_create(&batch, ConflictAction::Update, None)
        .await
        .unwrap();
    assert_eq!((created, updated), (1, 0));

    let rows = repo.get_all(0, None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name.as_deref(), Some("last"));
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn bulk_upsert_rejects_invalid_row_and_persists_nothing() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    repo.create(&helpers::asteroid("433", "Eros")).await.unwrap();

    // A bad row anywhere in the batch fails the whole batch, including
    // rows that would have been fine on their own.
    let batch = vec![
        helpers::asteroid("99942", "Apophis"),
        helpers::asteroid("1950DA", "1950 DA").set("spectral_class", "S"),
    ];
    let err = repo
        .bulk_create(&batch, ConflictAction::Update, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn bulk_upsert_ambiguity_aborts_whole_batch() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    // Two physical rows sharing a designation make the key ambiguous.
    repo.create(&helpers::asteroid("433", "copy one")).await.unwrap();
    repo.create(&helpers::asteroid("433", "copy two")).await.unwrap();

    let batch = vec![
        helpers::asteroid("fresh", "should not survive"),
        helpers::asteroid("433", "ambiguous"),
    ];
    let err = repo
        .bulk_create(&batch, ConflictAction::Update, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConflictAmbiguity);

    // The savepoint rolled the earlier insert of the batch back too.
    let filters = FilterSet::new().with(Filter::parse("designation", "fresh").unwrap());
    assert!(repo.filter(&filters, 0, None, None, false).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a live PostgreSQL database"]
async fn bulk_delete_by_filter() {
    let db = helpers::TestDb::new().await;
    let mut uow = db.scope("test").await;
    let mut repo = uow.repository::<Asteroid>().unwrap();

    for (des, diameter) in [("d1", 0.2), ("d2", 3.0), ("d3", 4.1)] {
        repo.create(&helpers::sized_asteroid(des, diameter))
            .await
            .unwrap();
    }

    let filters = FilterSet::new()
        .with(Filter::parse("estimated_diameter_km__gt", 1.0).unwrap());
    assert_eq!(repo.bulk_delete(&filters).await.unwrap(), 2);
    assert_eq!(repo.count().await.unwrap(), 1);
}
