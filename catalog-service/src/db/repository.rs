use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ImageStore, StoreResult};
use crate::models::{ImagePatch, ImageRecord, NewImage};

/// PostgreSQL-backed image store
#[derive(Debug, Clone)]
pub struct PgImageStore {
    pool: PgPool,
}

impl PgImageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageStore for PgImageStore {
    /// Insert a new image record
    async fn create(&self, image: NewImage) -> StoreResult<ImageRecord> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let record = sqlx::query_as::<_, ImageRecord>(
            r#"
            INSERT INTO images (
                id,
                name,
                price,
                is_outstock,
                img_url,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, FALSE, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(image.name)
        .bind(image.price)
        .bind(image.img_url)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created image record: id={}", record.id);
        Ok(record)
    }

    async fn list_all(&self) -> StoreResult<Vec<ImageRecord>> {
        let records = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT * FROM images
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<ImageRecord>> {
        let record = sqlx::query_as::<_, ImageRecord>(
            r#"
            SELECT * FROM images WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_by_id(&self, id: Uuid, patch: ImagePatch) -> StoreResult<Option<ImageRecord>> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, ImageRecord>(
            r#"
            UPDATE images
            SET
                name = COALESCE($2, name),
                price = COALESCE($3, price),
                is_outstock = COALESCE($4, is_outstock),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.price)
        .bind(patch.is_outstock)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(record) = &record {
            tracing::info!("Updated image {}: isOutstock={}", record.id, record.is_outstock);
        }
        Ok(record)
    }

    async fn delete_by_url(&self, img_url: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM images
            WHERE id = (
                SELECT id FROM images WHERE img_url = $1
                ORDER BY created_at ASC
                LIMIT 1
            )
            "#,
        )
        .bind(img_url)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_healthy(&self) -> bool {
        shared::database::health_check(&self.pool).await
    }
}

// Run with `--features postgres-tests` and DATABASE_URL pointing at a server
// where the test user may create databases.
#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn new_image(name: &str, url: &str) -> NewImage {
        NewImage {
            name: Some(name.to_string()),
            price: Some(12.5),
            img_url: url.to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_and_list_in_insertion_order(pool: PgPool) {
        let store = PgImageStore::new(pool);

        let first = store.create(new_image("Boot", "https://host/Akwara/a.jpg")).await.unwrap();
        let second = store.create(new_image("Sandal", "https://host/Akwara/b.jpg")).await.unwrap();

        assert!(!first.is_outstock);
        assert_eq!(first.created_at, first.updated_at);

        let ids: Vec<Uuid> = store.list_all().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(store.find_by_id(second.id).await.unwrap(), Some(second));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_merges_only_present_fields(pool: PgPool) {
        let store = PgImageStore::new(pool);
        let record = store.create(new_image("Boot", "https://host/Akwara/a.jpg")).await.unwrap();

        let updated = store
            .update_by_id(record.id, ImagePatch::stock(true))
            .await
            .unwrap()
            .unwrap();

        assert!(updated.is_outstock);
        assert_eq!(updated.name, record.name);
        assert_eq!(updated.price, record.price);
        assert_eq!(updated.img_url, record.img_url);
        assert!(updated.updated_at >= record.updated_at);

        let renamed = store
            .update_by_id(
                record.id,
                ImagePatch {
                    name: Some("Chelsea boot".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name.as_deref(), Some("Chelsea boot"));
        assert!(renamed.is_outstock);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_unknown_id(pool: PgPool) {
        let store = PgImageStore::new(pool);

        let result = store.update_by_id(Uuid::new_v4(), ImagePatch::stock(true)).await.unwrap();
        assert_eq!(result, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_by_url_removes_one_match_at_a_time(pool: PgPool) {
        let store = PgImageStore::new(pool);
        let url = "https://host/Akwara/dup.jpg";
        let older = store.create(new_image("One", url)).await.unwrap();
        let newer = store.create(new_image("Two", url)).await.unwrap();

        assert!(store.delete_by_url(url).await.unwrap());
        assert_eq!(store.find_by_id(older.id).await.unwrap(), None);
        assert!(store.find_by_id(newer.id).await.unwrap().is_some());

        assert!(store.delete_by_url(url).await.unwrap());
        assert!(!store.delete_by_url(url).await.unwrap());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_is_healthy(pool: PgPool) {
        assert!(PgImageStore::new(pool).is_healthy().await);
    }
}
