use async_trait::async_trait;
use civic_core::{CommitOutcome, StoreResult, UserStore};
use tracing::instrument;

use super::prelude::*;
use crate::{is_unique_violation, read_error, write_error};

pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    #[instrument(
        level = "debug",
        skip(self, user),
        fields(user_id = %user.id, db.system = "postgresql", db.operation = "INSERT", db.query = "users.create")
    )]
    pub async fn create(&self, user: &UserRecord) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO users (
                id,
                full_name,
                gender,
                custom_id,
                row_version,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            user.id,
            user.full_name.as_deref(),
            user.gender.as_deref(),
            user.custom_id.as_str(),
            user.row_version,
            user.created_at,
            user.updated_at
        )
        .execute(self.pool)
        .await
        .map(|_| ())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, sqlx_core::Error> {
        query_as!(
            UserRecord,
            r#"
            SELECT id, full_name, gender, custom_id, row_version, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
            id
        )
        .fetch_optional(self.pool)
        .await
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(db.system = "postgresql", db.operation = "SELECT", db.query = "users.get_by_custom_id")
    )]
    pub async fn get_by_custom_id(
        &self,
        custom_id: &str,
    ) -> Result<Option<UserRecord>, sqlx_core::Error> {
        query_as!(
            UserRecord,
            r#"
            SELECT id, full_name, gender, custom_id, row_version, created_at, updated_at
            FROM users
            WHERE custom_id = $1
            "#,
            custom_id
        )
        .fetch_optional(self.pool)
        .await
    }

    pub async fn count(&self) -> Result<i64, sqlx_core::Error> {
        let row = query!(r#"SELECT COUNT(*) AS count FROM users"#)
            .fetch_one(self.pool)
            .await?;
        row.try_get("count")
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(db.system = "postgresql", db.operation = "SELECT", db.query = "users.list_missing_gender_suffix")
    )]
    pub async fn list_missing_gender_suffix(&self) -> Result<Vec<UserRecord>, sqlx_core::Error> {
        query_as!(
            UserRecord,
            r#"
            SELECT id, full_name, gender, custom_id, row_version, created_at, updated_at
            FROM users
            WHERE gender IS NOT NULL
              AND UPPER(RIGHT(BTRIM(custom_id), 1)) NOT IN ('M', 'F')
            ORDER BY created_at, id
            "#
        )
        .fetch_all(self.pool)
        .await
    }

    pub async fn all_custom_ids(&self) -> Result<Vec<String>, sqlx_core::Error> {
        query!(r#"SELECT custom_id FROM users"#)
            .fetch_all(self.pool)
            .await?
            .iter()
            .map(|row| row.try_get("custom_id"))
            .collect()
    }

    /// Renames `id` from `expected` to `custom_id` unless another record
    /// already holds `custom_id`. Returns the number of rows changed.
    #[instrument(
        level = "debug",
        skip(self),
        fields(user_id = %id, db.system = "postgresql", db.operation = "UPDATE", db.query = "users.set_custom_id_if_free")
    )]
    pub async fn set_custom_id_if_free(
        &self,
        id: Uuid,
        expected: &str,
        custom_id: &str,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE users
            SET custom_id = $3,
                row_version = row_version + 1,
                updated_at = $4
            WHERE id = $1
              AND custom_id = $2
              AND NOT EXISTS (SELECT 1 FROM users AS other WHERE other.custom_id = $3)
            "#,
            id,
            expected,
            custom_id,
            Utc::now()
        )
        .execute(self.pool)
        .await
        .map(|result| result.rows_affected())
    }
}

#[async_trait]
impl UserStore for UserRepo<'_> {
    async fn count_users(&self) -> StoreResult<u64> {
        self.count()
            .await
            .map(|count| count.max(0) as u64)
            .map_err(read_error)
    }

    async fn list_suffix_candidates(&self) -> StoreResult<Vec<UserRecord>> {
        self.list_missing_gender_suffix().await.map_err(read_error)
    }

    async fn find_by_custom_id(&self, custom_id: &str) -> StoreResult<Option<UserRecord>> {
        self.get_by_custom_id(custom_id).await.map_err(read_error)
    }

    async fn list_custom_ids(&self) -> StoreResult<Vec<String>> {
        self.all_custom_ids().await.map_err(read_error)
    }

    async fn update_custom_id(
        &self,
        id: Uuid,
        expected: &str,
        custom_id: &str,
    ) -> StoreResult<CommitOutcome> {
        match self.set_custom_id_if_free(id, expected, custom_id).await {
            Ok(affected) if affected > 0 => Ok(CommitOutcome::Applied),
            Ok(_) => {
                let holder = self.get_by_custom_id(custom_id).await.map_err(read_error)?;
                Ok(if holder.is_some() {
                    CommitOutcome::Taken
                } else {
                    CommitOutcome::Stale
                })
            }
            Err(err) if is_unique_violation(&err) => Ok(CommitOutcome::Taken),
            Err(err) => Err(write_error(err)),
        }
    }
}
