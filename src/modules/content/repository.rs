use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::error::ContentError;
use super::model::{CourseContentItem, CourseSection, NewContentItem};
use super::ordering;

pub type Result<T> = std::result::Result<T, ContentError>;

const ITEM_COLUMNS: &str = "id, section_id, title, item_type, file_url, transcoding_asset_id, \
     transcoding_playback_id, sort_order, created_at, updated_at";

pub struct ContentRepository;

impl ContentRepository {
    // --- SECTIONS ---

    pub async fn create_section(pool: &PgPool, course_id: Uuid, title: &str) -> Result<CourseSection> {
        let section = sqlx::query_as::<_, CourseSection>(
            r#"
            INSERT INTO course_sections (course_id, title)
            VALUES ($1, $2)
            RETURNING id, course_id, title, created_at, updated_at
            "#,
        )
        .bind(course_id)
        .bind(title)
        .fetch_one(pool)
        .await?;

        Ok(section)
    }

    pub async fn list_sections(pool: &PgPool, course_id: Uuid) -> Result<Vec<CourseSection>> {
        let sections = sqlx::query_as::<_, CourseSection>(
            r#"
            SELECT id, course_id, title, created_at, updated_at
            FROM course_sections
            WHERE course_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(pool)
        .await?;

        Ok(sections)
    }

    pub async fn get_section(pool: &PgPool, section_id: Uuid) -> Result<Option<CourseSection>> {
        let section = sqlx::query_as::<_, CourseSection>(
            "SELECT id, course_id, title, created_at, updated_at FROM course_sections WHERE id = $1",
        )
        .bind(section_id)
        .fetch_optional(pool)
        .await?;

        Ok(section)
    }

    /// Locks the section row so ordering writes from concurrent sessions serialize.
    async fn lock_section(tx: &mut Transaction<'_, Postgres>, section_id: Uuid) -> Result<()> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM course_sections WHERE id = $1 FOR UPDATE")
            .bind(section_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(ContentError::SectionNotFound(section_id))?;
        Ok(())
    }

    async fn section_item_ids(tx: &mut Transaction<'_, Postgres>, section_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM course_content_items WHERE section_id = $1 ORDER BY sort_order ASC",
        )
        .bind(section_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(ids)
    }

    async fn write_order(
        tx: &mut Transaction<'_, Postgres>,
        section_id: Uuid,
        assignments: &[(Uuid, i32)],
    ) -> Result<()> {
        let (ids, orders): (Vec<Uuid>, Vec<i32>) = assignments.iter().copied().unzip();

        sqlx::query(
            r#"
            UPDATE course_content_items AS i
            SET sort_order = o.sort_order, updated_at = NOW()
            FROM UNNEST($1::uuid[], $2::int4[]) AS o(id, sort_order)
            WHERE i.id = o.id AND i.section_id = $3 AND i.sort_order <> o.sort_order
            "#,
        )
        .bind(&ids)
        .bind(&orders)
        .bind(section_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    // --- ITEMS ---

    pub async fn create_item(pool: &PgPool, item: &NewContentItem) -> Result<CourseContentItem> {
        let mut tx = pool.begin().await?;
        Self::lock_section(&mut tx, item.section_id()).await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course_content_items WHERE section_id = $1")
            .bind(item.section_id())
            .fetch_one(&mut *tx)
            .await?;

        let created = sqlx::query_as::<_, CourseContentItem>(&format!(
            r#"
            INSERT INTO course_content_items
                (section_id, title, item_type, file_url, transcoding_asset_id, transcoding_playback_id, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item.section_id())
        .bind(item.title())
        .bind(item.item_type())
        .bind(item.file_url())
        .bind(item.transcoding().map(|refs| refs.asset_id.as_str()))
        .bind(item.transcoding().map(|refs| refs.playback_id.as_str()))
        .bind(ordering::next_sort_order(existing))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn get_item(pool: &PgPool, id: Uuid) -> Result<Option<CourseContentItem>> {
        let item = sqlx::query_as::<_, CourseContentItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM course_content_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(item)
    }

    pub async fn list_items(pool: &PgPool, section_id: Uuid) -> Result<Vec<CourseContentItem>> {
        let items = sqlx::query_as::<_, CourseContentItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM course_content_items WHERE section_id = $1 ORDER BY sort_order ASC"
        ))
        .bind(section_id)
        .fetch_all(pool)
        .await?;
        Ok(items)
    }

    pub async fn reorder_items(pool: &PgPool, section_id: Uuid, ordered_ids: &[Uuid]) -> Result<()> {
        let mut tx = pool.begin().await?;
        Self::lock_section(&mut tx, section_id).await?;

        let current = Self::section_item_ids(&mut tx, section_id).await?;
        let plan = ordering::plan_reorder(&current, ordered_ids)?;
        Self::write_order(&mut tx, section_id, &plan).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Removes an item and renumbers its former siblings in the same transaction.
    pub async fn delete_item(pool: &PgPool, id: Uuid) -> Result<()> {
        let mut tx = pool.begin().await?;

        let section_id = sqlx::query_scalar::<_, Uuid>("SELECT section_id FROM course_content_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ContentError::ItemNotFound(id))?;

        Self::lock_section(&mut tx, section_id).await?;

        let result = sqlx::query("DELETE FROM course_content_items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ContentError::ItemNotFound(id));
        }

        let remaining = Self::section_item_ids(&mut tx, section_id).await?;
        Self::write_order(&mut tx, section_id, &ordering::dense_assignments(&remaining)).await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Write side of the content repository used by the upload workflow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentItemStore: Send + Sync {
    async fn create_item(&self, item: NewContentItem) -> Result<CourseContentItem>;
}

#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentItemStore for PgContentStore {
    async fn create_item(&self, item: NewContentItem) -> Result<CourseContentItem> {
        ContentRepository::create_item(&self.pool, &item).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::content::model::{ItemType, TranscodingRefs};

    async fn section_with_items(pool: &PgPool, count: usize) -> (Uuid, Vec<Uuid>) {
        let section = ContentRepository::create_section(pool, Uuid::new_v4(), "Week 1")
            .await
            .unwrap();

        let mut ids = Vec::with_capacity(count);
        for n in 0..count {
            let item = NewContentItem::stored(
                section.id,
                format!("Worksheet {}", n),
                ItemType::Document,
                format!("https://files.example.com/{}.pdf", n),
            );
            ids.push(ContentRepository::create_item(pool, &item).await.unwrap().id);
        }
        (section.id, ids)
    }

    async fn stored_order(pool: &PgPool, section_id: Uuid) -> Vec<(Uuid, i32)> {
        ContentRepository::list_items(pool, section_id)
            .await
            .unwrap()
            .into_iter()
            .map(|item| (item.id, item.sort_order))
            .collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn appended_items_get_consecutive_orders(pool: PgPool) {
        let (section_id, ids) = section_with_items(&pool, 3).await;

        let order = stored_order(&pool, section_id).await;
        assert_eq!(order, vec![(ids[0], 0), (ids[1], 1), (ids[2], 2)]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn video_item_keeps_both_transcoding_ids(pool: PgPool) {
        let (section_id, _) = section_with_items(&pool, 1).await;
        let refs = TranscodingRefs {
            asset_id: "a1".to_string(),
            playback_id: "p1".to_string(),
        };

        let item = ContentRepository::create_item(
            &pool,
            &NewContentItem::transcoded(section_id, "Intro".to_string(), refs),
        )
        .await
        .unwrap();

        assert_eq!(item.sort_order, 1);
        assert_eq!(item.item_type, ItemType::Video);
        assert_eq!(item.transcoding_asset_id.as_deref(), Some("a1"));
        assert_eq!(item.transcoding_playback_id.as_deref(), Some("p1"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn delete_closes_the_gap_and_survivors_can_be_reordered(pool: PgPool) {
        let (section_id, ids) = section_with_items(&pool, 3).await;

        ContentRepository::delete_item(&pool, ids[1]).await.unwrap();
        assert_eq!(stored_order(&pool, section_id).await, vec![(ids[0], 0), (ids[2], 1)]);

        ContentRepository::reorder_items(&pool, section_id, &[ids[2], ids[0]])
            .await
            .unwrap();
        assert_eq!(stored_order(&pool, section_id).await, vec![(ids[2], 0), (ids[0], 1)]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn full_reverse_passes_through_transient_duplicates(pool: PgPool) {
        let (section_id, ids) = section_with_items(&pool, 4).await;
        let reversed: Vec<Uuid> = ids.iter().rev().copied().collect();

        ContentRepository::reorder_items(&pool, section_id, &reversed)
            .await
            .unwrap();

        let order = stored_order(&pool, section_id).await;
        let expected: Vec<(Uuid, i32)> = reversed.iter().copied().zip(0..).collect();
        assert_eq!(order, expected);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn rejected_reorder_leaves_rows_untouched(pool: PgPool) {
        let (section_id, ids) = section_with_items(&pool, 3).await;
        let before = stored_order(&pool, section_id).await;

        let err = ContentRepository::reorder_items(&pool, section_id, &[ids[2], ids[0]])
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidOrder(_)));

        let err = ContentRepository::reorder_items(&pool, section_id, &[ids[2], ids[0], Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidOrder(_)));

        assert_eq!(stored_order(&pool, section_id).await, before);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn emptied_section_accepts_an_empty_reorder(pool: PgPool) {
        let (section_id, ids) = section_with_items(&pool, 1).await;

        ContentRepository::delete_item(&pool, ids[0]).await.unwrap();
        ContentRepository::reorder_items(&pool, section_id, &[]).await.unwrap();

        assert!(stored_order(&pool, section_id).await.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn missing_section_and_item_are_reported(pool: PgPool) {
        let section_id = Uuid::new_v4();
        let err = ContentRepository::reorder_items(&pool, section_id, &[]).await.unwrap_err();
        assert!(matches!(err, ContentError::SectionNotFound(id) if id == section_id));

        let item_id = Uuid::new_v4();
        let err = ContentRepository::delete_item(&pool, item_id).await.unwrap_err();
        assert!(matches!(err, ContentError::ItemNotFound(id) if id == item_id));
    }
}
