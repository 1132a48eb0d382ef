//! Query tests against a freshly provisioned store

use sqlx::SqlitePool;
use uhcsdb_common::db::{
    all_micrographs, init_database, micrograph_by_id, micrographs_by_ids, micrographs_in_order,
    micrographs_with_classes, user_by_id,
};

async fn seeded_pool(dir: &tempfile::TempDir) -> SqlitePool {
    let pool = init_database(&dir.path().join("store.sqlite")).await.unwrap();

    sqlx::query("INSERT INTO user (id, username, givenname, familyname) VALUES (1, 'bdecost', 'Brian', 'DeCost')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO sample (id, label, anneal_time, anneal_time_unit, anneal_temperature) \
         VALUES (1, 'S1', 2, 'H', 800), (2, 'S2', 90, 'M', 970)",
    )
    .execute(&pool)
    .await
    .unwrap();

    for (id, class, sample) in [
        (1, "pearlite", Some(1)),
        (2, "martensite", Some(2)),
        (3, "network", None),
        (4, "unknown", Some(1)),
    ] {
        sqlx::query(
            "INSERT INTO micrograph (id, path, mstructure_class, micron_bar, micron_bar_px, sample_id, user_id) \
             VALUES (?, ?, ?, 10, 100, ?, 1)",
        )
        .bind(id)
        .bind(format!("micrograph{}.tif", id))
        .bind(class)
        .bind(sample)
        .execute(&pool)
        .await
        .unwrap();
    }

    pool
}

#[tokio::test]
async fn test_all_micrographs_ordered_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir).await;

    let all = all_micrographs(&pool).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_sample_fields_joined_and_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir).await;

    let m1 = micrograph_by_id(&pool, 1).await.unwrap().unwrap();
    assert_eq!(m1.sample_label.as_deref(), Some("S1"));
    assert_eq!(m1.anneal_time, Some(120.0));
    assert_eq!(m1.anneal_temperature, Some(800.0));

    let m2 = micrograph_by_id(&pool, 2).await.unwrap().unwrap();
    assert_eq!(m2.anneal_time, Some(90.0));

    // No sample: sample fields are absent rather than the row being dropped
    let m3 = micrograph_by_id(&pool, 3).await.unwrap().unwrap();
    assert_eq!(m3.anneal_time, None);
    assert_eq!(m3.sample_label, None);

    assert!(micrograph_by_id(&pool, 99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_in_order_preserves_caller_ranking() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir).await;

    let ranked = micrographs_in_order(&pool, &[3, 99, 1, 2]).await.unwrap();
    let ids: Vec<i64> = ranked.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![3, 1, 2], "unknown ids skipped, order kept");

    let by_id = micrographs_by_ids(&pool, &[3, 1]).await.unwrap();
    let ids: Vec<i64> = by_id.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 3]);

    assert!(micrographs_in_order(&pool, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_class_filter() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir).await;

    let labelled = micrographs_with_classes(&pool, &["pearlite", "network"])
        .await
        .unwrap();
    let ids: Vec<i64> = labelled.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_user_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let pool = seeded_pool(&dir).await;

    let user = user_by_id(&pool, 1).await.unwrap().unwrap();
    assert_eq!(user.display_name(), "Brian DeCost");
    assert!(user_by_id(&pool, 2).await.unwrap().is_none());
}
