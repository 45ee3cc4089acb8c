use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::entities::{gallos, prelude::*};
use crate::models::gallo::GalloInput;

/// Repository for gallo records. Every operation is scoped to the owning
/// user; a record id alone never reaches the database unfiltered.
pub struct GalloRepository {
    conn: DatabaseConnection,
}

impl GalloRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new gallo for `user_id`. `fotos` maps photo slot names
    /// (`foto_gallo`, `foto_padre`, ...) to stored public URLs.
    pub async fn add(
        &self,
        user_id: i32,
        input: &GalloInput,
        fotos: &HashMap<String, String>,
    ) -> Result<gallos::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let id = uuid::Uuid::new_v4().to_string();

        let active = gallos::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            nombre: Set(input.nombre.clone().unwrap_or_default()),
            padre: Set(clean(&input.padre)),
            madre: Set(clean(&input.madre)),
            abuelo: Set(clean(&input.abuelo)),
            abuela: Set(clean(&input.abuela)),
            placa_gallo: Set(clean(&input.placa_gallo)),
            placa_padre: Set(clean(&input.placa_padre)),
            placa_madre: Set(clean(&input.placa_madre)),
            placa_abuelo: Set(clean(&input.placa_abuelo)),
            placa_abuela: Set(clean(&input.placa_abuela)),
            fecha_marcado: Set(clean(&input.fecha_marcado)),
            color_general: Set(clean(&input.color_general)),
            color_patas: Set(clean(&input.color_patas)),
            tipo_cresta: Set(clean(&input.tipo_cresta)),
            tipo_brida: Set(clean(&input.tipo_brida)),
            numero_brida: Set(clean(&input.numero_brida)),
            color_brida: Set(clean(&input.color_brida)),
            ubicacion_brida: Set(clean(&input.ubicacion_brida)),
            descripcion: Set(clean(&input.descripcion)),
            foto_gallo: Set(fotos.get("foto_gallo").cloned()),
            foto_padre: Set(fotos.get("foto_padre").cloned()),
            foto_madre: Set(fotos.get("foto_madre").cloned()),
            foto_abuelo: Set(fotos.get("foto_abuelo").cloned()),
            foto_abuela: Set(fotos.get("foto_abuela").cloned()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert gallo")?;
        info!("Registered gallo '{}' for user {}", model.nombre, user_id);
        Ok(model)
    }

    pub async fn get(&self, id: &str, user_id: i32) -> Result<Option<gallos::Model>> {
        let row = Gallos::find_by_id(id)
            .filter(gallos::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query gallo")?;
        Ok(row)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<gallos::Model>> {
        let rows = Gallos::find()
            .filter(gallos::Column::UserId.eq(user_id))
            .order_by_desc(gallos::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list gallos")?;
        Ok(rows)
    }

    /// Partial update: blank or omitted fields keep the stored value, photo
    /// slots are only replaced when a new URL was uploaded.
    pub async fn update(
        &self,
        existing: gallos::Model,
        input: &GalloInput,
        fotos: &HashMap<String, String>,
    ) -> Result<gallos::Model> {
        let mut active: gallos::ActiveModel = existing.into();

        if let Some(nombre) = clean(&input.nombre) {
            active.nombre = Set(nombre);
        }
        merge(&mut active.padre, &input.padre);
        merge(&mut active.madre, &input.madre);
        merge(&mut active.abuelo, &input.abuelo);
        merge(&mut active.abuela, &input.abuela);
        merge(&mut active.placa_gallo, &input.placa_gallo);
        merge(&mut active.placa_padre, &input.placa_padre);
        merge(&mut active.placa_madre, &input.placa_madre);
        merge(&mut active.placa_abuelo, &input.placa_abuelo);
        merge(&mut active.placa_abuela, &input.placa_abuela);
        merge(&mut active.fecha_marcado, &input.fecha_marcado);
        merge(&mut active.color_general, &input.color_general);
        merge(&mut active.color_patas, &input.color_patas);
        merge(&mut active.tipo_cresta, &input.tipo_cresta);
        merge(&mut active.tipo_brida, &input.tipo_brida);
        merge(&mut active.numero_brida, &input.numero_brida);
        merge(&mut active.color_brida, &input.color_brida);
        merge(&mut active.ubicacion_brida, &input.ubicacion_brida);
        merge(&mut active.descripcion, &input.descripcion);

        if let Some(url) = fotos.get("foto_gallo") {
            active.foto_gallo = Set(Some(url.clone()));
        }
        if let Some(url) = fotos.get("foto_padre") {
            active.foto_padre = Set(Some(url.clone()));
        }
        if let Some(url) = fotos.get("foto_madre") {
            active.foto_madre = Set(Some(url.clone()));
        }
        if let Some(url) = fotos.get("foto_abuelo") {
            active.foto_abuelo = Set(Some(url.clone()));
        }
        if let Some(url) = fotos.get("foto_abuela") {
            active.foto_abuela = Set(Some(url.clone()));
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update gallo")?;
        Ok(model)
    }

    pub async fn remove(&self, id: &str, user_id: i32) -> Result<bool> {
        let result = Gallos::delete_many()
            .filter(gallos::Column::Id.eq(id))
            .filter(gallos::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete gallo")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self, user_id: i32) -> Result<u64> {
        let count = Gallos::find()
            .filter(gallos::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    /// Count records created in `[desde, hasta)`; an open `hasta` counts up
    /// to now. Timestamps are RFC 3339 strings, so lexicographic comparison
    /// matches chronological order.
    pub async fn count_created_between(
        &self,
        user_id: i32,
        desde: &str,
        hasta: Option<&str>,
    ) -> Result<u64> {
        let mut query = Gallos::find()
            .filter(gallos::Column::UserId.eq(user_id))
            .filter(gallos::Column::CreatedAt.gte(desde));
        if let Some(hasta) = hasta {
            query = query.filter(gallos::Column::CreatedAt.lt(hasta));
        }
        let count = query.count(&self.conn).await?;
        Ok(count)
    }
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn merge(slot: &mut sea_orm::ActiveValue<Option<String>>, value: &Option<String>) {
    if let Some(v) = clean(value) {
        *slot = Set(Some(v));
    }
}
