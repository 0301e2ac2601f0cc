//! Repository for the ownership side of the `farms` table.

use fieldmesh_core::types::DbId;
use sqlx::PgPool;

use crate::models::farm::{CreateFarm, Farm};

/// Column list for `farms` queries.
const COLUMNS: &str = "id, owner_id, name, source_photo_ref, model_status_id, created_at, updated_at";

/// Provides ownership lookups over the `farms` table.
pub struct FarmRepo;

impl FarmRepo {
    /// Insert a farm, returning the created row. The model projection
    /// starts out `unset`.
    pub async fn create(pool: &PgPool, input: &CreateFarm) -> Result<Farm, sqlx::Error> {
        let query = format!(
            "INSERT INTO farms (owner_id, name, source_photo_ref) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Farm>(&query)
            .bind(input.owner_id)
            .bind(&input.name)
            .bind(&input.source_photo_ref)
            .fetch_one(pool)
            .await
    }

    /// Find a farm by id, but only when it belongs to `owner_id`.
    pub async fn find_owned(
        pool: &PgPool,
        farm_id: DbId,
        owner_id: DbId,
    ) -> Result<Option<Farm>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM farms WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Farm>(&query)
            .bind(farm_id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }
}
