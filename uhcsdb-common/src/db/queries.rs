//! Micrograph store queries
//!
//! Every listing query returns rows ordered by micrograph id unless the
//! caller supplies its own order (see [`micrographs_in_order`]).

use crate::db::models::{MicrographInfo, MicrographRow, User};
use crate::{Error, Result};
use sqlx::SqlitePool;

const SELECT_INFO: &str = r#"
    SELECT m.id, m.path, m.mstructure_class, m.micron_bar, m.micron_bar_units,
           m.micron_bar_px, m.magnification, m.detector, m.sample_id, m.user_id,
           s.label AS sample_label, s.anneal_time, s.anneal_time_unit,
           s.anneal_temperature, s.cool_method
"#;

fn id_list_json(ids: &[i64]) -> Result<String> {
    serde_json::to_string(ids).map_err(|e| Error::Internal(e.to_string()))
}

/// All micrographs, ordered by id
pub async fn all_micrographs(pool: &SqlitePool) -> Result<Vec<MicrographInfo>> {
    let sql = format!(
        "{} FROM micrograph m LEFT JOIN sample s ON s.id = m.sample_id ORDER BY m.id",
        SELECT_INFO
    );
    let rows = sqlx::query_as::<_, MicrographRow>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(MicrographInfo::from).collect())
}

/// One micrograph by id
pub async fn micrograph_by_id(pool: &SqlitePool, id: i64) -> Result<Option<MicrographInfo>> {
    let sql = format!(
        "{} FROM micrograph m LEFT JOIN sample s ON s.id = m.sample_id WHERE m.id = ?",
        SELECT_INFO
    );
    let row = sqlx::query_as::<_, MicrographRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(MicrographInfo::from))
}

/// Micrographs whose id is in `ids`, ordered by id; unknown ids are skipped
pub async fn micrographs_by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<MicrographInfo>> {
    let sql = format!(
        "{} FROM micrograph m LEFT JOIN sample s ON s.id = m.sample_id \
         WHERE m.id IN (SELECT value FROM json_each(?)) ORDER BY m.id",
        SELECT_INFO
    );
    let rows = sqlx::query_as::<_, MicrographRow>(&sql)
        .bind(id_list_json(ids)?)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(MicrographInfo::from).collect())
}

/// Micrographs in exactly the order of `ids`, in one query
///
/// The id list is expanded with `json_each`, whose `key` column is the
/// position in the list; ordering by it preserves the caller's ranking.
/// Unknown ids are skipped, so the result may be shorter than `ids`.
pub async fn micrographs_in_order(
    pool: &SqlitePool,
    ids: &[i64],
) -> Result<Vec<MicrographInfo>> {
    let sql = format!(
        "{} FROM json_each(?) AS r \
         JOIN micrograph m ON m.id = r.value \
         LEFT JOIN sample s ON s.id = m.sample_id \
         ORDER BY r.key",
        SELECT_INFO
    );
    let rows = sqlx::query_as::<_, MicrographRow>(&sql)
        .bind(id_list_json(ids)?)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(MicrographInfo::from).collect())
}

/// Micrographs labelled with one of `classes`, ordered by id
pub async fn micrographs_with_classes(
    pool: &SqlitePool,
    classes: &[&str],
) -> Result<Vec<MicrographInfo>> {
    let sql = format!(
        "{} FROM micrograph m LEFT JOIN sample s ON s.id = m.sample_id \
         WHERE m.mstructure_class IN (SELECT value FROM json_each(?)) ORDER BY m.id",
        SELECT_INFO
    );
    let classes_json =
        serde_json::to_string(classes).map_err(|e| Error::Internal(e.to_string()))?;
    let rows = sqlx::query_as::<_, MicrographRow>(&sql)
        .bind(classes_json)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(MicrographInfo::from).collect())
}

/// One user by id
pub async fn user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, givenname, familyname, email, orcid FROM user WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}
