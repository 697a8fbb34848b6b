//! Course and asset storage backed by `SQLite`.

use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use tokio_rusqlite::Connection;

use crate::matching::{CourseId, Slug};
use crate::scraping::types::{AssetKind, Category, CourseAsset, ScrapedCourse};
use crate::store::config::StoreConfig;
use crate::store::error::{StoreError, StoreResult};

/// Boxed future type for course store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Course store trait.
pub trait CourseStore: Send + Sync {
    /// Get a course and its assets by id.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn get_course(&self, id: CourseId) -> StoreFuture<'_, StoreResult<Option<ScrapedCourse>>>;

    /// All courses with their assets, ordered by id.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn list_courses(&self) -> StoreFuture<'_, StoreResult<Vec<ScrapedCourse>>>;

    /// Insert a course or update the row with the same id.
    ///
    /// Assets are left untouched; a missing description keeps the stored one.
    ///
    /// # Errors
    /// Returns an error if storage access fails or the slug belongs to
    /// another course.
    fn upsert_course(&self, course: &ScrapedCourse) -> StoreFuture<'_, StoreResult<()>>;

    /// Delete a course and its assets. Returns whether it existed.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn delete_course(&self, id: CourseId) -> StoreFuture<'_, StoreResult<bool>>;

    /// Replace every asset of a course.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn replace_assets(
        &self,
        id: CourseId,
        assets: &[CourseAsset],
    ) -> StoreFuture<'_, StoreResult<()>>;

    /// Assets of a course in insertion order.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn list_assets(&self, id: CourseId) -> StoreFuture<'_, StoreResult<Vec<CourseAsset>>>;

    /// Number of stored courses.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn count_courses(&self) -> StoreFuture<'_, StoreResult<usize>>;

    /// Set the description of an existing course. Returns false when the
    /// id is unknown.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn update_description(
        &self,
        id: CourseId,
        description: &str,
    ) -> StoreFuture<'_, StoreResult<bool>>;
}

/// `SQLite` implementation of the course store.
pub struct SqliteCourseStore {
    conn: Connection,
    courses_table: String,
    assets_table: String,
}

struct CourseRow {
    id: i64,
    title: String,
    slug: String,
    suite_id: Option<i64>,
    purchase_url: Option<String>,
    free_trial_url: Option<String>,
    icon_url: Option<String>,
    description: Option<String>,
}

struct AssetRow {
    course_id: i64,
    kind: String,
    url: String,
    label: String,
}

const COURSE_COLUMNS: &str =
    "id, title, slug, suite_id, purchase_url, free_trial_url, icon_url, description";

impl SqliteCourseStore {
    /// Open the database at the configured path and create the tables.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the database
    /// cannot be opened.
    pub async fn new(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let conn = Connection::open(&config.sqlite_path).await?;
        tracing::debug!("Opened course store at {}", config.sqlite_path.display());
        Self::init(conn, config).await
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the tables
    /// cannot be created.
    pub async fn open_in_memory(config: &StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let conn = Connection::open_in_memory().await?;
        Self::init(conn, config).await
    }

    async fn init(conn: Connection, config: &StoreConfig) -> StoreResult<Self> {
        let courses_table = config.courses_table.clone();
        let assets_table = config.assets_table.clone();
        let courses = courses_table.clone();
        let assets = assets_table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {courses} (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    slug TEXT NOT NULL UNIQUE,
                    suite_id INTEGER,
                    purchase_url TEXT,
                    free_trial_url TEXT,
                    icon_url TEXT,
                    description TEXT,
                    updated_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS {assets} (
                    course_id INTEGER NOT NULL,
                    position INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    url TEXT NOT NULL,
                    label TEXT NOT NULL,
                    PRIMARY KEY (course_id, position)
                );"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            courses_table,
            assets_table,
        })
    }

    async fn fetch_assets(&self, id: Option<CourseId>) -> StoreResult<Vec<AssetRow>> {
        let table = self.assets_table.clone();
        let filter = id.map(|id| i64::from(id.get()));

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT course_id, kind, url, label FROM {table}
                     WHERE ?1 IS NULL OR course_id = ?1
                     ORDER BY course_id, position"
                ))?;
                let rows = stmt
                    .query_map(rusqlite::params![filter], |row| {
                        Ok(AssetRow {
                            course_id: row.get(0)?,
                            kind: row.get(1)?,
                            url: row.get(2)?,
                            label: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        Ok(rows)
    }
}

fn course_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CourseRow> {
    Ok(CourseRow {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        suite_id: row.get(3)?,
        purchase_url: row.get(4)?,
        free_trial_url: row.get(5)?,
        icon_url: row.get(6)?,
        description: row.get(7)?,
    })
}

fn to_course_id(raw: i64) -> StoreResult<CourseId> {
    u32::try_from(raw)
        .map(CourseId)
        .map_err(|_| StoreError::InvalidData(format!("course id out of range: {raw}")))
}

fn to_asset(row: AssetRow) -> StoreResult<CourseAsset> {
    let kind = row.kind.parse::<AssetKind>().map_err(StoreError::InvalidData)?;
    Ok(CourseAsset {
        kind,
        url: row.url,
        label: row.label,
    })
}

fn to_course(row: CourseRow, assets: Vec<CourseAsset>) -> StoreResult<ScrapedCourse> {
    let category = match row.suite_id {
        None => None,
        Some(raw) => Some(
            u8::try_from(raw)
                .ok()
                .and_then(Category::from_suite_id)
                .ok_or_else(|| StoreError::InvalidData(format!("unknown suite id: {raw}")))?,
        ),
    };

    Ok(ScrapedCourse {
        id: to_course_id(row.id)?,
        title: row.title,
        slug: Slug::from(row.slug),
        category,
        purchase_url: row.purchase_url,
        free_trial_url: row.free_trial_url,
        icon_url: row.icon_url,
        description: row.description,
        assets,
    })
}

impl CourseStore for SqliteCourseStore {
    fn get_course(&self, id: CourseId) -> StoreFuture<'_, StoreResult<Option<ScrapedCourse>>> {
        Box::pin(async move {
            let table = self.courses_table.clone();
            let raw_id = i64::from(id.get());

            let row = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COURSE_COLUMNS} FROM {table} WHERE id = ?1"
                    ))?;
                    let mut rows = stmt.query_map(rusqlite::params![raw_id], course_row)?;
                    Ok(rows.next().transpose()?)
                })
                .await?;

            let Some(row) = row else {
                return Ok(None);
            };

            let assets = self
                .fetch_assets(Some(id))
                .await?
                .into_iter()
                .map(to_asset)
                .collect::<StoreResult<Vec<_>>>()?;

            to_course(row, assets).map(Some)
        })
    }

    fn list_courses(&self) -> StoreFuture<'_, StoreResult<Vec<ScrapedCourse>>> {
        Box::pin(async move {
            let table = self.courses_table.clone();

            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COURSE_COLUMNS} FROM {table} ORDER BY id"
                    ))?;
                    let rows = stmt
                        .query_map([], course_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(rows)
                })
                .await?;

            let mut assets = self.fetch_assets(None).await?.into_iter().peekable();
            let mut courses = Vec::with_capacity(rows.len());

            for row in rows {
                let mut own = Vec::new();
                while let Some(asset) = assets.next_if(|a| a.course_id <= row.id) {
                    if asset.course_id == row.id {
                        own.push(to_asset(asset)?);
                    }
                }
                courses.push(to_course(row, own)?);
            }

            Ok(courses)
        })
    }

    fn upsert_course(&self, course: &ScrapedCourse) -> StoreFuture<'_, StoreResult<()>> {
        let course = course.clone();
        Box::pin(async move {
            let table = self.courses_table.clone();
            let updated_at = Utc::now().timestamp_millis();

            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} ({COURSE_COLUMNS}, updated_at)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                             ON CONFLICT(id) DO UPDATE SET
                                title = excluded.title,
                                slug = excluded.slug,
                                suite_id = excluded.suite_id,
                                purchase_url = excluded.purchase_url,
                                free_trial_url = excluded.free_trial_url,
                                icon_url = excluded.icon_url,
                                description = COALESCE(excluded.description, {table}.description),
                                updated_at = excluded.updated_at"
                        ),
                        rusqlite::params![
                            i64::from(course.id.get()),
                            course.title,
                            course.slug.as_str(),
                            course.category.map(|c| i64::from(c.suite_id())),
                            course.purchase_url,
                            course.free_trial_url,
                            course.icon_url,
                            course.description,
                            updated_at
                        ],
                    )?;
                    Ok(())
                })
                .await?;

            Ok(())
        })
    }

    fn delete_course(&self, id: CourseId) -> StoreFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let courses = self.courses_table.clone();
            let assets = self.assets_table.clone();
            let raw_id = i64::from(id.get());

            let deleted = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute(
                        &format!("DELETE FROM {assets} WHERE course_id = ?1"),
                        rusqlite::params![raw_id],
                    )?;
                    let changed = tx.execute(
                        &format!("DELETE FROM {courses} WHERE id = ?1"),
                        rusqlite::params![raw_id],
                    )?;
                    tx.commit()?;
                    Ok(changed > 0)
                })
                .await?;

            Ok(deleted)
        })
    }

    fn replace_assets(
        &self,
        id: CourseId,
        assets: &[CourseAsset],
    ) -> StoreFuture<'_, StoreResult<()>> {
        let assets = assets.to_vec();
        Box::pin(async move {
            let table = self.assets_table.clone();
            let raw_id = i64::from(id.get());

            self.conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute(
                        &format!("DELETE FROM {table} WHERE course_id = ?1"),
                        rusqlite::params![raw_id],
                    )?;
                    {
                        let mut stmt = tx.prepare(&format!(
                            "INSERT INTO {table} (course_id, position, kind, url, label)
                             VALUES (?1, ?2, ?3, ?4, ?5)"
                        ))?;
                        for (position, asset) in (0_i64..).zip(&assets) {
                            stmt.execute(rusqlite::params![
                                raw_id,
                                position,
                                asset.kind.as_str(),
                                asset.url,
                                asset.label
                            ])?;
                        }
                    }
                    tx.commit()?;
                    Ok(())
                })
                .await?;

            tracing::debug!("Replaced assets for course {id}");
            Ok(())
        })
    }

    fn list_assets(&self, id: CourseId) -> StoreFuture<'_, StoreResult<Vec<CourseAsset>>> {
        Box::pin(async move {
            self.fetch_assets(Some(id))
                .await?
                .into_iter()
                .map(to_asset)
                .collect::<StoreResult<Vec<_>>>()
        })
    }

    fn count_courses(&self) -> StoreFuture<'_, StoreResult<usize>> {
        Box::pin(async move {
            let table = self.courses_table.clone();

            let count = self
                .conn
                .call(move |conn| {
                    let count: i64 =
                        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                            row.get(0)
                        })?;
                    Ok(count)
                })
                .await?;

            usize::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("negative row count: {count}")))
        })
    }

    fn update_description(
        &self,
        id: CourseId,
        description: &str,
    ) -> StoreFuture<'_, StoreResult<bool>> {
        let description = description.to_string();
        Box::pin(async move {
            let table = self.courses_table.clone();
            let raw_id = i64::from(id.get());
            let updated_at = Utc::now().timestamp_millis();

            let changed = self
                .conn
                .call(move |conn| {
                    let changed = conn.execute(
                        &format!(
                            "UPDATE {table} SET description = ?1, updated_at = ?2 WHERE id = ?3"
                        ),
                        rusqlite::params![description, updated_at, raw_id],
                    )?;
                    Ok(changed)
                })
                .await?;

            Ok(changed > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::slugify;
    use crate::scraping::assets::assets_for;

    const HOST: &str = "https://videotilehost.com";

    fn course(id: u32, title: &str) -> ScrapedCourse {
        ScrapedCourse {
            id: CourseId(id),
            title: title.to_string(),
            slug: slugify(title).with_suffix(id),
            category: Some(Category::HealthAndSafety),
            purchase_url: Some(format!("{HOST}/hamptonsafety/purchaseCourse.php?nid={id}")),
            free_trial_url: None,
            icon_url: None,
            description: None,
            assets: Vec::new(),
        }
    }

    async fn store() -> SqliteCourseStore {
        SqliteCourseStore::open_in_memory(&StoreConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = store().await;
        store.upsert_course(&course(3, "Fire Safety")).await.unwrap();

        let loaded = store.get_course(CourseId(3)).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Fire Safety");
        assert_eq!(loaded.slug.as_str(), "fire-safety-3");
        assert_eq!(loaded.category, Some(Category::HealthAndSafety));
        assert!(store.get_course(CourseId(4)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_updates_and_keeps_description() {
        let store = store().await;
        store.upsert_course(&course(3, "Fire Safety")).await.unwrap();
        assert!(
            store
                .update_description(CourseId(3), "Know what to do when the alarm sounds.")
                .await
                .unwrap()
        );

        let mut renamed = course(3, "Fire Safety Awareness");
        renamed.category = None;
        store.upsert_course(&renamed).await.unwrap();

        let loaded = store.get_course(CourseId(3)).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Fire Safety Awareness");
        assert_eq!(loaded.category, None);
        assert_eq!(
            loaded.description.as_deref(),
            Some("Know what to do when the alarm sounds.")
        );
        assert_eq!(store.count_courses().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_description_unknown_id() {
        let store = store().await;
        assert!(!store.update_description(CourseId(9), "text").await.unwrap());
    }

    #[tokio::test]
    async fn test_slug_conflict_is_an_error() {
        let store = store().await;
        let mut first = course(1, "Fire Safety");
        first.slug = slugify("fire safety");
        let mut second = course(2, "Fire Safety");
        second.slug = slugify("fire safety");

        store.upsert_course(&first).await.unwrap();
        assert!(store.upsert_course(&second).await.is_err());
        assert_eq!(store.count_courses().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_and_list_assets() {
        let store = store().await;
        store.upsert_course(&course(3, "Fire Safety")).await.unwrap();
        store.upsert_course(&course(7, "Manual Handling")).await.unwrap();

        let assets = assets_for(HOST, CourseId(3), "Fire Safety");
        store.replace_assets(CourseId(3), &assets).await.unwrap();
        store.replace_assets(CourseId(3), &assets).await.unwrap();
        store
            .replace_assets(CourseId(7), &assets_for(HOST, CourseId(7), "Manual Handling")[..1])
            .await
            .unwrap();

        assert_eq!(store.list_assets(CourseId(3)).await.unwrap(), assets);

        let courses = store.list_courses().await.unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].assets.len(), 2);
        assert_eq!(courses[1].assets.len(), 1);
        assert_eq!(courses[1].assets[0].kind, AssetKind::Video);
    }

    #[tokio::test]
    async fn test_delete_removes_assets() {
        let store = store().await;
        store.upsert_course(&course(3, "Fire Safety")).await.unwrap();
        store
            .replace_assets(CourseId(3), &assets_for(HOST, CourseId(3), "Fire Safety"))
            .await
            .unwrap();

        assert!(store.delete_course(CourseId(3)).await.unwrap());
        assert!(!store.delete_course(CourseId(3)).await.unwrap());
        assert!(store.list_assets(CourseId(3)).await.unwrap().is_empty());
        assert_eq!(store.count_courses().await.unwrap(), 0);
    }
}
