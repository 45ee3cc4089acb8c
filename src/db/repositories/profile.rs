use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::{prelude::*, profiles};

/// Repository for the per-user edit key. Rows are created lazily by the gate
/// (`upsert` with the hashed default) rather than at user creation.
pub struct ProfileRepository {
    conn: DatabaseConnection,
}

impl ProfileRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_user(&self, user_id: i32) -> Result<Option<profiles::Model>> {
        let row = Profiles::find()
            .filter(profiles::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query edit-key profile")?;
        Ok(row)
    }

    /// Insert or replace the stored key hash for a user, refreshing
    /// `updated_at` on conflict.
    pub async fn upsert(&self, user_id: i32, clave_hash: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = profiles::ActiveModel {
            user_id: Set(user_id),
            clave_edicion: Set(clave_hash.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        Profiles::insert(active)
            .on_conflict(
                OnConflict::column(profiles::Column::UserId)
                    .update_columns([
                        profiles::Column::ClaveEdicion,
                        profiles::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("Failed to upsert edit-key profile")?;

        Ok(())
    }
}
