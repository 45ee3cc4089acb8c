use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use chrono::{Duration, Utc};

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, DashboardDto};
use crate::constants::dashboard::TREND_WINDOW_DAYS;

/// GET /api/dashboard
///
/// Aggregated counters plus a 30-day trend for each record type: the last
/// window is compared against the window before it.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<DashboardDto>>, ApiError> {
    let store = state.store();

    let total_gallos = store.count_gallos(current.id).await?;
    let totals = store.encaste_totals(current.id).await?;

    let now = Utc::now();
    let window_start = (now - Duration::days(TREND_WINDOW_DAYS)).to_rfc3339();
    let previous_start = (now - Duration::days(TREND_WINDOW_DAYS * 2)).to_rfc3339();

    let gallos_recientes = store
        .count_gallos_created_between(current.id, &window_start, None)
        .await?;
    let gallos_previos = store
        .count_gallos_created_between(current.id, &previous_start, Some(&window_start))
        .await?;
    let encastes_recientes = store
        .count_encastes_created_between(current.id, &window_start, None)
        .await?;
    let encastes_previos = store
        .count_encastes_created_between(current.id, &previous_start, Some(&window_start))
        .await?;

    let tasa_exito = if totals.total == 0 {
        "0%".to_string()
    } else {
        let pct = (totals.completados as f64 / totals.total as f64) * 100.0;
        format!("{}%", pct.round() as i64)
    };

    Ok(Json(ApiResponse::success(DashboardDto {
        total_gallos,
        total_encastes: totals.total,
        total_huevos: totals.huevos,
        total_pollos: totals.pollos,
        // The "Encastes Activos" card shows the owner's full encaste count.
        encastes_activos: totals.total,
        encastes_completados: totals.completados,
        tasa_exito,
        tendencia_gallos: calcular_tendencia(gallos_recientes, gallos_previos),
        tendencia_encastes: calcular_tendencia(encastes_recientes, encastes_previos),
    })))
}

/// Percent change between the current and previous window. Any non-negative
/// change carries an explicit plus sign, so flat windows read "+0%". A window
/// appearing from nothing reads "+100%"; two empty windows read "0%".
fn calcular_tendencia(actual: u64, pasado: u64) -> String {
    if pasado == 0 {
        return if actual > 0 {
            "+100%".to_string()
        } else {
            "0%".to_string()
        };
    }

    let cambio = ((actual as f64 - pasado as f64) / pasado as f64) * 100.0;
    let redondeado = cambio.round() as i64;
    if redondeado >= 0 {
        format!("+{redondeado}%")
    } else {
        format!("{redondeado}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_from_nothing_reads_plus_100() {
        assert_eq!(calcular_tendencia(5, 0), "+100%");
    }

    #[test]
    fn two_empty_windows_read_zero() {
        assert_eq!(calcular_tendencia(0, 0), "0%");
    }

    #[test]
    fn growth_carries_a_plus_sign() {
        assert_eq!(calcular_tendencia(6, 4), "+50%");
    }

    #[test]
    fn decline_carries_a_minus_sign() {
        assert_eq!(calcular_tendencia(2, 4), "-50%");
    }

    #[test]
    fn flat_windows_keep_the_plus_sign() {
        assert_eq!(calcular_tendencia(4, 4), "+0%");
    }

    #[test]
    fn drop_to_nothing_reads_minus_100() {
        assert_eq!(calcular_tendencia(0, 8), "-100%");
    }
}
