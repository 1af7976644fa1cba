use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Email collected from the public landing page. Created once, never
/// mutated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WaitlistEntry>(
            "SELECT id, email, created_at FROM waitlist_users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, email: &str) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query_as::<_, WaitlistEntry>(
            "INSERT INTO waitlist_users (id, email, created_at)
             VALUES ($1, $2, $3)
             RETURNING id, email, created_at",
        )
        .bind(id)
        .bind(email)
        .bind(now)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn create_then_find() {
        let pool = test_pool().await;
        assert!(
            WaitlistEntry::find_by_email(&pool, "a@b.co")
                .await
                .unwrap()
                .is_none()
        );

        WaitlistEntry::create(&pool, "a@b.co").await.unwrap();
        let found = WaitlistEntry::find_by_email(&pool, "a@b.co")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email, "a@b.co");
    }

    #[tokio::test]
    async fn duplicate_insert_violates_unique_email() {
        let pool = test_pool().await;
        WaitlistEntry::create(&pool, "a@b.co").await.unwrap();
        assert!(WaitlistEntry::create(&pool, "a@b.co").await.is_err());
    }
}
