use anyhow::{Context, Result};
use chrono::Utc;
use genstudio_core::models::Lineage;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[derive(Clone)]
pub struct LineageRepository {
    pool: PgPool,
}

impl LineageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a lineage rooted at `root_asset_id` (the asset later generations derive from).
    #[tracing::instrument(skip(self), fields(db.table = "lineages", db.operation = "insert"))]
    pub async fn create(
        &self,
        user_id: &str,
        project_id: Uuid,
        root_asset_id: Option<Uuid>,
    ) -> Result<Lineage> {
        let lineage = sqlx::query_as::<Postgres, Lineage>(
            r#"
            INSERT INTO lineages (id, user_id, project_id, root_asset_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, project_id, root_asset_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(project_id)
        .bind(root_asset_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to create lineage")?;

        Ok(lineage)
    }

    #[tracing::instrument(skip(self), fields(db.table = "lineages", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, user_id: &str, id: Uuid) -> Result<Option<Lineage>> {
        let lineage = sqlx::query_as::<Postgres, Lineage>(
            r#"
            SELECT id, user_id, project_id, root_asset_id, created_at
            FROM lineages
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lineage)
    }
}
