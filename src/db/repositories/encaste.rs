use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::info;

use crate::entities::{encastes, prelude::*};
use crate::models::encaste::EncasteInput;

/// Owner-scoped aggregate figures backing the dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncasteTotals {
    pub total: u64,
    pub huevos: i64,
    pub pollos: i64,
    pub completados: u64,
}

/// Repository for encaste records, scoped to the owning user like
/// `GalloRepository`.
pub struct EncasteRepository {
    conn: DatabaseConnection,
}

impl EncasteRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new encaste. `imagenes` maps photo slot names
    /// (`imagen_padrote`, `imagen_gallina`, `imagen_nido`) to stored URLs.
    /// Required fields are validated by the caller.
    pub async fn add(
        &self,
        user_id: i32,
        input: &EncasteInput,
        imagenes: &HashMap<String, String>,
    ) -> Result<encastes::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let id = uuid::Uuid::new_v4().to_string();

        let active = encastes::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            fecha_encaste: Set(input.fecha_encaste.clone().unwrap_or_default()),
            hora_encaste: Set(clean(&input.hora_encaste)),
            placa_padrote: Set(input.placa_padrote.clone().unwrap_or_default()),
            placa_gallina: Set(input.placa_gallina.clone().unwrap_or_default()),
            descripcion_brida: Set(clean(&input.descripcion_brida)),
            imagen_padrote: Set(imagenes.get("imagen_padrote").cloned()),
            imagen_gallina: Set(imagenes.get("imagen_gallina").cloned()),
            imagen_nido: Set(imagenes.get("imagen_nido").cloned()),
            fecha_primer_huevo: Set(clean(&input.fecha_primer_huevo)),
            fecha_ultimo_huevo: Set(clean(&input.fecha_ultimo_huevo)),
            total_huevos: Set(input.total_huevos.unwrap_or(0)),
            fecha_inicio_incubacion: Set(clean(&input.fecha_inicio_incubacion)),
            cantidad_pollos_nacidos: Set(input.cantidad_pollos_nacidos.unwrap_or(0)),
            fecha_nacimiento: Set(clean(&input.fecha_nacimiento)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert encaste")?;
        info!(
            "Registered encaste {} x {} for user {}",
            model.placa_padrote, model.placa_gallina, user_id
        );
        Ok(model)
    }

    pub async fn get(&self, id: &str, user_id: i32) -> Result<Option<encastes::Model>> {
        let row = Encastes::find_by_id(id)
            .filter(encastes::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query encaste")?;
        Ok(row)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<encastes::Model>> {
        let rows = Encastes::find()
            .filter(encastes::Column::UserId.eq(user_id))
            .order_by_desc(encastes::Column::FechaEncaste)
            .all(&self.conn)
            .await
            .context("Failed to list encastes")?;
        Ok(rows)
    }

    /// Partial update with the same keep-on-blank semantics as the gallo
    /// repository. Numeric fields are replaced whenever the form sent them.
    pub async fn update(
        &self,
        existing: encastes::Model,
        input: &EncasteInput,
        imagenes: &HashMap<String, String>,
    ) -> Result<encastes::Model> {
        let mut active: encastes::ActiveModel = existing.into();

        if let Some(fecha) = clean(&input.fecha_encaste) {
            active.fecha_encaste = Set(fecha);
        }
        if let Some(placa) = clean(&input.placa_padrote) {
            active.placa_padrote = Set(placa);
        }
        if let Some(placa) = clean(&input.placa_gallina) {
            active.placa_gallina = Set(placa);
        }
        merge(&mut active.hora_encaste, &input.hora_encaste);
        merge(&mut active.descripcion_brida, &input.descripcion_brida);
        merge(&mut active.fecha_primer_huevo, &input.fecha_primer_huevo);
        merge(&mut active.fecha_ultimo_huevo, &input.fecha_ultimo_huevo);
        merge(
            &mut active.fecha_inicio_incubacion,
            &input.fecha_inicio_incubacion,
        );
        merge(&mut active.fecha_nacimiento, &input.fecha_nacimiento);

        if let Some(huevos) = input.total_huevos {
            active.total_huevos = Set(huevos);
        }
        if let Some(pollos) = input.cantidad_pollos_nacidos {
            active.cantidad_pollos_nacidos = Set(pollos);
        }

        if let Some(url) = imagenes.get("imagen_padrote") {
            active.imagen_padrote = Set(Some(url.clone()));
        }
        if let Some(url) = imagenes.get("imagen_gallina") {
            active.imagen_gallina = Set(Some(url.clone()));
        }
        if let Some(url) = imagenes.get("imagen_nido") {
            active.imagen_nido = Set(Some(url.clone()));
        }

        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update encaste")?;
        Ok(model)
    }

    pub async fn remove(&self, id: &str, user_id: i32) -> Result<bool> {
        let result = Encastes::delete_many()
            .filter(encastes::Column::Id.eq(id))
            .filter(encastes::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete encaste")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn totals(&self, user_id: i32) -> Result<EncasteTotals> {
        let total = Encastes::find()
            .filter(encastes::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await?;

        let completados = Encastes::find()
            .filter(encastes::Column::UserId.eq(user_id))
            .filter(encastes::Column::CantidadPollosNacidos.gt(0))
            .count(&self.conn)
            .await?;

        let sums: Option<(Option<i64>, Option<i64>)> = Encastes::find()
            .select_only()
            .column_as(Expr::col(encastes::Column::TotalHuevos).sum(), "huevos")
            .column_as(
                Expr::col(encastes::Column::CantidadPollosNacidos).sum(),
                "pollos",
            )
            .filter(encastes::Column::UserId.eq(user_id))
            .into_tuple()
            .one(&self.conn)
            .await
            .context("Failed to aggregate encaste totals")?;

        let (huevos, pollos) = sums.unwrap_or((None, None));

        Ok(EncasteTotals {
            total,
            huevos: huevos.unwrap_or(0),
            pollos: pollos.unwrap_or(0),
            completados,
        })
    }

    pub async fn count_created_between(
        &self,
        user_id: i32,
        desde: &str,
        hasta: Option<&str>,
    ) -> Result<u64> {
        let mut query = Encastes::find()
            .filter(encastes::Column::UserId.eq(user_id))
            .filter(encastes::Column::CreatedAt.gte(desde));
        if let Some(hasta) = hasta {
            query = query.filter(encastes::Column::CreatedAt.lt(hasta));
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
