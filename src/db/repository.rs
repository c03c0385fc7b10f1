//! Database repository for dive records and their attributes.
//!
//! Every write runs in a single transaction so a dive and its attribute links
//! are committed together or not at all. Each write transaction opens with a
//! write statement, so concurrent writers wait on the busy timeout instead of
//! failing a lock upgrade.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveTime;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::errors::AppError;
use crate::models::{AttributeType, DiveRecord, ATTRIBUTE_NAME_MAX};
use crate::query::DiveFilter;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

const DIVE_COLUMNS: &str = "dive_number, dive_date, site_name, location, objective, time_down, \
     max_depth, avg_depth, dive_time, water_temp, air_temp, weather, sea_conditions, \
     visibility, buddy, boat_name, notes";

const TIME_FORMAT: &str = "%H:%M";

/// Most dives returned by one summaries lookup.
pub const MAX_SUMMARY_DIVES: usize = 50;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== ATTRIBUTE CATALOG ====================

    /// List all attribute types in id order.
    pub async fn list_attribute_types(&self) -> Result<Vec<AttributeType>, AppError> {
        let rows = sqlx::query("SELECT id, name FROM attribute_type ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(attribute_from_row).collect())
    }

    pub async fn list_attribute_ids(&self) -> Result<Vec<i64>, AppError> {
        Ok(self
            .list_attribute_types()
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect())
    }

    /// Names in the same order as [`Self::list_attribute_ids`].
    pub async fn list_attribute_names(&self) -> Result<Vec<String>, AppError> {
        Ok(self
            .list_attribute_types()
            .await?
            .into_iter()
            .map(|a| a.name)
            .collect())
    }

    pub async fn attribute_id_for_name(&self, name: &str) -> Result<Option<i64>, AppError> {
        let id = sqlx::query_scalar("SELECT id FROM attribute_type WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn attribute_name_for_id(&self, id: i64) -> Result<Option<String>, AppError> {
        let name = sqlx::query_scalar("SELECT name FROM attribute_type WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }

    /// Add a new attribute type with the next free id.
    pub async fn create_attribute_type(&self, name: &str) -> Result<AttributeType, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid("Attribute name is required"));
        }
        if name.chars().count() > ATTRIBUTE_NAME_MAX {
            return Err(AppError::invalid(format!(
                "Attribute name is too long ({}-character max)",
                ATTRIBUTE_NAME_MAX
            )));
        }

        // Single statement, so the next free id and the insert cannot interleave
        let result = sqlx::query(
            "INSERT INTO attribute_type (id, name) \
             SELECT COALESCE(MAX(id), -1) + 1, ? FROM attribute_type",
        )
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::invalid(format!("Attribute {} already exists", name))
            } else {
                e.into()
            }
        })?;
        let id = result.last_insert_rowid();

        tracing::info!("Added attribute type {} ({})", name, id);

        Ok(AttributeType {
            id,
            name: name.to_string(),
        })
    }

    // ==================== DIVE OPERATIONS ====================

    /// Insert a new dive and its attribute links.
    pub async fn create_dive(
        &self,
        record: &DiveRecord,
        attribute_ids: &[i64],
    ) -> Result<(), AppError> {
        let number = record.dive_number;
        // Write before any read: a deferred read lock cannot be upgraded under WAL
        let mut tx = self.pool.begin().await?;

        let insert = format!(
            "INSERT INTO dive ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            DIVE_COLUMNS
        );
        bind_fields(sqlx::query(&insert).bind(number), record)
            .execute(&mut *tx)
            .await
            .map_err(|e| duplicate_or_database(e, number))?;

        insert_links(&mut tx, number, attribute_ids).await?;

        tx.commit().await?;
        tracing::info!("Created dive {}", number);
        Ok(())
    }

    /// Overwrite an existing dive and replace its attribute links.
    ///
    /// The dive number itself cannot change.
    pub async fn update_dive(
        &self,
        dive_number: i64,
        record: &DiveRecord,
        attribute_ids: &[i64],
    ) -> Result<(), AppError> {
        if record.dive_number != dive_number {
            return Err(AppError::invalid("Dive numbers cannot be changed by an edit"));
        }

        let mut tx = self.pool.begin().await?;

        let result = bind_fields(
            sqlx::query(
                r#"UPDATE dive SET
                    dive_date = ?, site_name = ?, location = ?, objective = ?, time_down = ?,
                    max_depth = ?, avg_depth = ?, dive_time = ?, water_temp = ?, air_temp = ?,
                    weather = ?, sea_conditions = ?, visibility = ?, buddy = ?, boat_name = ?,
                    notes = ?
                WHERE dive_number = ?"#,
            ),
            record,
        )
        .bind(dive_number)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::dive_not_found(dive_number));
        }

        sqlx::query("DELETE FROM dive_attribute_link WHERE dive_number = ?")
            .bind(dive_number)
            .execute(&mut *tx)
            .await?;
        insert_links(&mut tx, dive_number, attribute_ids).await?;

        tx.commit().await?;
        tracing::info!("Updated dive {}", dive_number);
        Ok(())
    }

    /// Delete a dive and its links. Deleting a dive that does not exist is a no-op.
    pub async fn delete_dive(&self, dive_number: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM dive_attribute_link WHERE dive_number = ?")
            .bind(dive_number)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM dive WHERE dive_number = ?")
            .bind(dive_number)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() > 0 {
            tracing::info!("Deleted dive {}", dive_number);
        } else {
            tracing::debug!("Delete of dive {} matched nothing", dive_number);
        }
        Ok(())
    }

    /// Get a dive by number.
    pub async fn get_dive(&self, dive_number: i64) -> Result<DiveRecord, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM dive WHERE dive_number = ?",
            DIVE_COLUMNS
        ))
        .bind(dive_number)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(dive_from_row)
            .ok_or_else(|| AppError::dive_not_found(dive_number))
    }

    /// Fetch several dives in the order asked for, skipping unknown numbers.
    pub async fn get_dives(&self, dive_numbers: &[i64]) -> Result<Vec<DiveRecord>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut dives = Vec::new();

        for number in dive_numbers.iter().take(MAX_SUMMARY_DIVES) {
            let row = sqlx::query(&format!(
                "SELECT {} FROM dive WHERE dive_number = ?",
                DIVE_COLUMNS
            ))
            .bind(number)
            .fetch_optional(&mut *tx)
            .await?;
            if let Some(row) = row {
                dives.push(dive_from_row(&row));
            }
        }

        tx.commit().await?;
        Ok(dives)
    }

    /// All dive numbers, ascending.
    pub async fn list_dive_numbers(&self) -> Result<Vec<i64>, AppError> {
        let numbers = sqlx::query_scalar("SELECT dive_number FROM dive ORDER BY dive_number")
            .fetch_all(&self.pool)
            .await?;
        Ok(numbers)
    }

    pub async fn dive_exists(&self, dive_number: i64) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        let found: Option<i64> =
            sqlx::query_scalar("SELECT dive_number FROM dive WHERE dive_number = ?")
                .bind(dive_number)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(found.is_some())
    }

    /// Names of the attributes linked to a dive, in attribute id order.
    pub async fn dive_attributes(&self, dive_number: i64) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar(
            r#"SELECT t.name FROM dive_attribute_link l
               JOIN attribute_type t ON t.id = l.attribute_type_id
               WHERE l.dive_number = ?
               ORDER BY t.id"#,
        )
        .bind(dive_number)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// A dive and its attribute names, read from one snapshot.
    pub async fn get_dive_entry(
        &self,
        dive_number: i64,
    ) -> Result<(DiveRecord, Vec<String>), AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM dive WHERE dive_number = ?",
            DIVE_COLUMNS
        ))
        .bind(dive_number)
        .fetch_optional(&mut *tx)
        .await?;
        let record = row
            .as_ref()
            .map(dive_from_row)
            .ok_or_else(|| AppError::dive_not_found(dive_number))?;

        let names = sqlx::query_scalar(
            r#"SELECT t.name FROM dive_attribute_link l
               JOIN attribute_type t ON t.id = l.attribute_type_id
               WHERE l.dive_number = ?
               ORDER BY t.id"#,
        )
        .bind(dive_number)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((record, names))
    }

    pub async fn has_attribute(
        &self,
        dive_number: i64,
        attribute_id: i64,
    ) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT dive_number FROM dive_attribute_link WHERE dive_number = ? AND attribute_type_id = ?",
        )
        .bind(dive_number)
        .bind(attribute_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// Highest dive number in the log, or 0 when empty.
    pub async fn highest_dive_number(&self) -> Result<i64, AppError> {
        let max = sqlx::query_scalar("SELECT COALESCE(MAX(dive_number), 0) FROM dive")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    /// Number to suggest for the next dive entered.
    pub async fn next_dive_number(&self) -> Result<i64, AppError> {
        Ok(self.highest_dive_number().await? + 1)
    }

    /// Number of stored dives.
    pub async fn count_dives(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM dive")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sum of dive times in minutes, optionally only up to a dive number.
    ///
    /// Dives without a recorded time count as zero.
    pub async fn total_time_underwater(&self, max_dive_number: Option<i64>) -> Result<f64, AppError> {
        let times: Vec<Option<f64>> = match max_dive_number {
            Some(max) => {
                sqlx::query_scalar("SELECT dive_time FROM dive WHERE dive_number <= ?")
                    .bind(max)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT dive_time FROM dive")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(times.into_iter().flatten().sum())
    }

    // ==================== QUERY ====================

    /// Run a validated filter over the log, returning matches in dive number order.
    pub async fn query_dives(&self, filter: &DiveFilter) -> Result<Vec<DiveRecord>, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut builder = sqlx::QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM dive WHERE dive_number > 0",
            DIVE_COLUMNS
        ));
        if let Some(min) = filter.max_depth_min {
            builder.push(" AND max_depth >= ").push_bind(min);
        }
        if let Some(max) = filter.max_depth_max {
            builder.push(" AND max_depth <= ").push_bind(max);
        }
        if let Some(min) = &filter.date_min {
            builder.push(" AND dive_date >= ").push_bind(min.clone());
        }
        if let Some(max) = &filter.date_max {
            builder.push(" AND dive_date <= ").push_bind(max.clone());
        }
        builder.push(" ORDER BY dive_number");

        let rows = builder.build().fetch_all(&mut *tx).await?;
        let candidates: Vec<DiveRecord> = rows
            .iter()
            .map(dive_from_row)
            .filter(|record| filter.matches_text(record))
            .collect();

        if filter.required_attribute_ids.is_empty() {
            tx.commit().await?;
            return Ok(candidates);
        }

        let links: Vec<(i64, i64)> =
            sqlx::query_as("SELECT dive_number, attribute_type_id FROM dive_attribute_link")
                .fetch_all(&mut *tx)
                .await?;
        tx.commit().await?;

        let mut held: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
        for (number, attribute_id) in links {
            held.entry(number).or_default().insert(attribute_id);
        }

        let empty = BTreeSet::new();
        Ok(candidates
            .into_iter()
            .filter(|record| {
                filter.matches_attributes(held.get(&record.dive_number).unwrap_or(&empty))
            })
            .collect())
    }
}

// Helpers shared by the write paths

/// Insert one link per distinct id, rejecting ids the catalog does not know.
async fn insert_links(
    tx: &mut Transaction<'_, Sqlite>,
    dive_number: i64,
    attribute_ids: &[i64],
) -> Result<(), AppError> {
    let wanted: BTreeSet<i64> = attribute_ids.iter().copied().collect();
    if wanted.is_empty() {
        return Ok(());
    }

    let known: BTreeSet<i64> = sqlx::query_scalar::<_, i64>("SELECT id FROM attribute_type")
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .collect();
    let unknown: Vec<String> = wanted
        .difference(&known)
        .map(|id| format!("Unknown attribute id {}", id))
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::Validation(unknown));
    }

    for attribute_id in wanted {
        sqlx::query("INSERT INTO dive_attribute_link (dive_number, attribute_type_id) VALUES (?, ?)")
            .bind(dive_number)
            .bind(attribute_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Bind every column except the dive number, in `DIVE_COLUMNS` order.
fn bind_fields<'q>(query: SqliteQuery<'q>, record: &'q DiveRecord) -> SqliteQuery<'q> {
    query
        .bind(&record.date)
        .bind(&record.site_name)
        .bind(&record.location)
        .bind(&record.objective)
        .bind(record.time_down.map(|t| t.format(TIME_FORMAT).to_string()))
        .bind(record.max_depth)
        .bind(record.avg_depth)
        .bind(record.dive_time_minutes)
        .bind(record.water_temp)
        .bind(record.air_temp)
        .bind(&record.weather)
        .bind(&record.sea_conditions)
        .bind(record.visibility)
        .bind(&record.buddy)
        .bind(&record.boat_name)
        .bind(&record.notes)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn duplicate_or_database(err: sqlx::Error, dive_number: i64) -> AppError {
    if is_unique_violation(&err) {
        AppError::DuplicateKey(dive_number)
    } else {
        err.into()
    }
}

// Helper functions for row conversion

fn attribute_from_row(row: &SqliteRow) -> AttributeType {
    AttributeType {
        id: row.get("id"),
        name: row.get("name"),
    }
}

fn dive_from_row(row: &SqliteRow) -> DiveRecord {
    let time_down: Option<String> = row.get("time_down");
    DiveRecord {
        dive_number: row.get("dive_number"),
        date: row.get("dive_date"),
        site_name: row.get("site_name"),
        location: row.get("location"),
        objective: row.get("objective"),
        time_down: time_down.and_then(|t| NaiveTime::parse_from_str(&t, TIME_FORMAT).ok()),
        max_depth: row.get("max_depth"),
        avg_depth: row.get("avg_depth"),
        dive_time_minutes: row.get("dive_time"),
        water_temp: row.get("water_temp"),
        air_temp: row.get("air_temp"),
        weather: row.get("weather"),
        sea_conditions: row.get("sea_conditions"),
        visibility: row.get("visibility"),
        buddy: row.get("buddy"),
        boat_name: row.get("boat_name"),
        notes: row.get("notes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::query::DiveQuerySubmission;
    use tempfile::TempDir;

    async fn test_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .expect("Failed to init DB");
        (Repository::new(pool), temp_dir)
    }

    fn dive(number: i64, site: &str, minutes: f64) -> DiveRecord {
        DiveRecord {
            site_name: Some(site.to_string()),
            dive_time_minutes: Some(minutes),
            ..DiveRecord::new(number)
        }
    }

    #[tokio::test]
    async fn test_catalog_is_seeded_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.sqlite");

        let pool = init_database(&path).await.unwrap();
        let repo = Repository::new(pool.clone());
        assert_eq!(repo.list_attribute_ids().await.unwrap(), (0..10).collect::<Vec<_>>());
        pool.close().await;

        // A second start-up must not duplicate the seed rows
        let repo = Repository::new(init_database(&path).await.unwrap());
        let names = repo.list_attribute_names().await.unwrap();
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "Boat");
        assert_eq!(names[9], "Dive Course");
    }

    #[tokio::test]
    async fn test_catalog_lookups() {
        let (repo, _dir) = test_repo().await;

        assert_eq!(repo.attribute_id_for_name("Night").await.unwrap(), Some(3));
        assert_eq!(repo.attribute_id_for_name("Ice").await.unwrap(), None);
        assert_eq!(
            repo.attribute_name_for_id(5).await.unwrap().as_deref(),
            Some("Wreck")
        );
        assert_eq!(repo.attribute_name_for_id(99).await.unwrap(), None);

        let added = repo.create_attribute_type("Ice").await.unwrap();
        assert_eq!(added.id, 10);
        assert!(repo.create_attribute_type("Ice").await.is_err());
        assert!(repo.create_attribute_type("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let (repo, _dir) = test_repo().await;

        let record = DiveRecord {
            date: Some("2014-02-30".into()),
            time_down: NaiveTime::from_hms_opt(13, 5, 0),
            max_depth: Some(18.5),
            avg_depth: Some(9.25),
            water_temp: Some(-1.5),
            visibility: Some(12.0),
            buddy: Some("Jo".into()),
            notes: Some("Turtles".into()),
            ..dive(1, "Big Bommie", 42.0)
        };
        repo.create_dive(&record, &[0, 3, 3]).await.unwrap();

        assert_eq!(repo.get_dive(1).await.unwrap(), record);
        assert_eq!(
            repo.dive_attributes(1).await.unwrap(),
            vec!["Boat".to_string(), "Night".to_string()]
        );
        assert!(repo.has_attribute(1, 3).await.unwrap());
        assert!(!repo.has_attribute(1, 4).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_create_leaves_store_unchanged() {
        let (repo, _dir) = test_repo().await;

        let original = dive(3, "Shallow Reef", 30.0);
        repo.create_dive(&original, &[1]).await.unwrap();

        let err = repo
            .create_dive(&dive(3, "Other Site", 50.0), &[0, 2])
            .await
            .unwrap_err();
        assert_eq!(err, AppError::DuplicateKey(3));

        assert_eq!(repo.get_dive(3).await.unwrap(), original);
        assert_eq!(repo.dive_attributes(3).await.unwrap(), vec!["Shore"]);
        assert_eq!(repo.count_dives().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates() {
        let (repo, _dir) = test_repo().await;

        let mut distinct = Vec::new();
        for n in 1..=30 {
            let repo = repo.clone();
            distinct.push(tokio::spawn(async move {
                repo.create_dive(&DiveRecord::new(n), &[0]).await
            }));
        }
        let mut same = Vec::new();
        for _ in 0..10 {
            let repo = repo.clone();
            same.push(tokio::spawn(async move {
                repo.create_dive(&DiveRecord::new(500), &[1]).await
            }));
        }

        for handle in distinct {
            handle.await.unwrap().unwrap();
        }

        let mut created = 0;
        for handle in same {
            match handle.await.unwrap() {
                Ok(()) => created += 1,
                Err(err) => assert_eq!(err, AppError::DuplicateKey(500)),
            }
        }
        assert_eq!(created, 1);

        assert_eq!(repo.count_dives().await.unwrap(), 31);
        assert_eq!(repo.highest_dive_number().await.unwrap(), 500);
        assert_eq!(repo.dive_attributes(500).await.unwrap(), vec!["Shore"]);
        assert_eq!(repo.dive_attributes(17).await.unwrap(), vec!["Boat"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_attribute_types_get_distinct_ids() {
        let (repo, _dir) = test_repo().await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.create_attribute_type(&format!("Custom {}", i)).await
            }));
        }
        let mut ids = BTreeSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap().id);
        }

        assert_eq!(ids, (10..18).collect::<BTreeSet<i64>>());
    }

    #[tokio::test]
    async fn test_unknown_attribute_rolls_back_create() {
        let (repo, _dir) = test_repo().await;

        let err = repo.create_dive(&dive(4, "Reef", 10.0), &[0, 42]).await.unwrap_err();
        assert_eq!(
            err,
            AppError::Validation(vec!["Unknown attribute id 42".into()])
        );
        assert_eq!(repo.count_dives().await.unwrap(), 0);
        assert!(!repo.has_attribute(4, 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_links() {
        let (repo, _dir) = test_repo().await;

        repo.create_dive(&dive(2, "Reef", 30.0), &[0, 3]).await.unwrap();

        let edited = DiveRecord {
            buddy: Some("Sam".into()),
            ..dive(2, "Wreck Bay", 45.0)
        };
        repo.update_dive(2, &edited, &[5]).await.unwrap();

        assert_eq!(repo.get_dive(2).await.unwrap(), edited);
        assert_eq!(repo.dive_attributes(2).await.unwrap(), vec!["Wreck"]);
        assert!(!repo.has_attribute(2, 0).await.unwrap());

        // Same selection twice must not duplicate links
        repo.update_dive(2, &edited, &[5]).await.unwrap();
        assert_eq!(repo.dive_attributes(2).await.unwrap(), vec!["Wreck"]);
    }

    #[tokio::test]
    async fn test_update_missing_dive_is_not_found() {
        let (repo, _dir) = test_repo().await;

        let err = repo.update_dive(8, &dive(8, "Reef", 1.0), &[]).await.unwrap_err();
        assert_eq!(err, AppError::dive_not_found(8));

        let err = repo.get_dive(8).await.unwrap_err();
        assert_eq!(err, AppError::dive_not_found(8));
    }

    #[tokio::test]
    async fn test_update_cannot_renumber() {
        let (repo, _dir) = test_repo().await;
        repo.create_dive(&dive(2, "Reef", 30.0), &[]).await.unwrap();

        let err = repo.update_dive(2, &dive(9, "Reef", 30.0), &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!repo.dive_exists(9).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_cascades_and_tolerates_missing() {
        let (repo, _dir) = test_repo().await;

        repo.create_dive(&dive(1, "Reef", 30.0), &[0, 1]).await.unwrap();
        repo.delete_dive(1).await.unwrap();

        assert!(!repo.dive_exists(1).await.unwrap());
        assert!(repo.dive_attributes(1).await.unwrap().is_empty());

        // Deleting again is a no-op
        repo.delete_dive(1).await.unwrap();
        repo.delete_dive(777).await.unwrap();
    }

    #[tokio::test]
    async fn test_counts_and_highest_number() {
        let (repo, _dir) = test_repo().await;

        assert_eq!(repo.highest_dive_number().await.unwrap(), 0);
        assert_eq!(repo.next_dive_number().await.unwrap(), 1);

        for n in [1, 3, 6] {
            repo.create_dive(&dive(n, "Reef", 10.0), &[]).await.unwrap();
        }

        assert_eq!(repo.highest_dive_number().await.unwrap(), 6);
        assert_eq!(repo.next_dive_number().await.unwrap(), 7);
        assert_eq!(repo.count_dives().await.unwrap(), 3);
        assert_eq!(repo.list_dive_numbers().await.unwrap(), vec![1, 3, 6]);
    }

    #[tokio::test]
    async fn test_total_time_underwater() {
        let (repo, _dir) = test_repo().await;

        repo.create_dive(&dive(1, "Reef", 10.0), &[]).await.unwrap();
        repo.create_dive(&dive(3, "Reef", 20.0), &[]).await.unwrap();
        repo.create_dive(&dive(6, "Reef", 100.0), &[]).await.unwrap();
        repo.create_dive(&DiveRecord::new(7), &[]).await.unwrap();

        assert_eq!(repo.total_time_underwater(Some(5)).await.unwrap(), 30.0);
        assert_eq!(repo.total_time_underwater(None).await.unwrap(), 130.0);
    }

    #[tokio::test]
    async fn test_get_dives_keeps_requested_order() {
        let (repo, _dir) = test_repo().await;
        for n in [1, 2, 3] {
            repo.create_dive(&dive(n, "Reef", 10.0), &[]).await.unwrap();
        }

        let dives = repo.get_dives(&[3, 99, 1]).await.unwrap();
        let numbers: Vec<i64> = dives.iter().map(|d| d.dive_number).collect();
        assert_eq!(numbers, vec![3, 1]);
    }

    async fn run_query(repo: &Repository, submission: DiveQuerySubmission) -> Vec<i64> {
        let filter = DiveFilter::parse(&submission).unwrap();
        repo.query_dives(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.dive_number)
            .collect()
    }

    #[tokio::test]
    async fn test_query_combines_filters() {
        let (repo, _dir) = test_repo().await;

        let boat = repo.attribute_id_for_name("Boat").await.unwrap().unwrap();
        let night = repo.attribute_id_for_name("Night").await.unwrap().unwrap();

        let mut d1 = dive(1, "Big Bommie", 40.0);
        d1.max_depth = Some(18.0);
        d1.date = Some("2014-01-05".into());
        d1.buddy = Some("Alex".into());
        repo.create_dive(&d1, &[boat, night]).await.unwrap();

        let mut d2 = dive(2, "Shallow Reef", 50.0);
        d2.max_depth = Some(6.0);
        d2.date = Some("2014-02-10".into());
        repo.create_dive(&d2, &[boat]).await.unwrap();

        let mut d3 = dive(3, "Little Bommie", 35.0);
        d3.max_depth = Some(25.0);
        d3.date = Some("2014-03-01".into());
        repo.create_dive(&d3, &[night]).await.unwrap();

        assert_eq!(
            run_query(&repo, DiveQuerySubmission::default()).await,
            vec![1, 2, 3]
        );
        assert_eq!(
            run_query(
                &repo,
                DiveQuerySubmission {
                    site_contains: Some("BOMM".into()),
                    ..Default::default()
                }
            )
            .await,
            vec![1, 3]
        );
        assert_eq!(
            run_query(
                &repo,
                DiveQuerySubmission {
                    required_attribute_ids: vec![boat, night],
                    ..Default::default()
                }
            )
            .await,
            vec![1]
        );
        assert_eq!(
            run_query(
                &repo,
                DiveQuerySubmission {
                    max_depth_min: Some("6".into()),
                    max_depth_max: Some("18".into()),
                    ..Default::default()
                }
            )
            .await,
            vec![1, 2]
        );
        assert_eq!(
            run_query(
                &repo,
                DiveQuerySubmission {
                    date_min: Some("2014-02-01".into()),
                    date_max: Some("2014-03-01".into()),
                    ..Default::default()
                }
            )
            .await,
            vec![2, 3]
        );
        assert_eq!(
            run_query(
                &repo,
                DiveQuerySubmission {
                    buddy_contains: Some("alex".into()),
                    site_contains: Some("bommie".into()),
                    ..Default::default()
                }
            )
            .await,
            vec![1]
        );
    }
}
