// INICIO DEL ARCHIVO [apps/server/src/handlers/admin.rs]
/*!
 * =================================================================
 * APARATO: ADMIN JSON SURFACE (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CRUD DE BACKOFFICE, SIN ESCOPE DE CERTIFICADO
 *
 * Superficie gestionada por el operador de la utility: agregadores,
 * certificados, sites, grupos de control, DOEs, tarifas, tasas
 * generadas y la configuracion de runtime. Gateada por
 * `admin_auth_guard`, nunca por Claims de certificado.
 * =================================================================
 */

use crate::notify_batch;
use crate::state::{AppState, SystemMode};
use crate::web_error::WebError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use sep2_domain_doe::{resolve_group_primacy, UpsertMode};
use sep2_domain_model::{
    Aggregator, Certificate, DefaultSiteControl, DynamicOperatingEnvelope, RuntimeServerConfig,
    Site, SiteControlGroup, Tariff, TariffGeneratedRate,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[instrument(skip(state, payload))]
pub async fn upsert_aggregator(
    State(state): State<AppState>,
    Json(payload): Json<Aggregator>,
) -> Result<Json<Aggregator>, WebError> {
    state.aggregator_repository.upsert_aggregator(&payload).await?;
    Ok(Json(payload))
}

#[instrument(skip(state))]
pub async fn get_aggregator(
    State(state): State<AppState>,
    Path(aggregator_id): Path<i64>,
) -> Result<Json<Aggregator>, WebError> {
    let aggregator = state
        .aggregator_repository
        .get_aggregator(aggregator_id)
        .await?
        .ok_or(WebError::NotFound("Aggregator"))?;
    Ok(Json(aggregator))
}

#[derive(Debug, Deserialize)]
pub struct RegisterCertificateRequest {
    pub certificate: Certificate,
    pub aggregator_id: Option<i64>,
}

#[instrument(skip(state, payload))]
pub async fn register_certificate(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCertificateRequest>,
) -> Result<StatusCode, WebError> {
    state
        .certificate_repository
        .register_certificate(&payload.certificate)
        .await?;
    if let Some(aggregator_id) = payload.aggregator_id {
        state
            .certificate_repository
            .assign_certificate(aggregator_id, payload.certificate.certificate_id)
            .await?;
    }
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state, payload))]
pub async fn create_site(
    State(state): State<AppState>,
    Json(payload): Json<Site>,
) -> Result<StatusCode, WebError> {
    state.site_repository.create_site(&payload).await?;
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state))]
pub async fn list_sites(
    State(state): State<AppState>,
    Path(aggregator_id): Path<i64>,
) -> Result<Json<Vec<Site>>, WebError> {
    let sites = state
        .site_repository
        .list_sites_for_aggregator(aggregator_id, 0, 1000)
        .await?;
    Ok(Json(sites))
}

#[instrument(skip(state, payload))]
pub async fn create_site_control_group(
    State(state): State<AppState>,
    Json(payload): Json<SiteControlGroup>,
) -> Result<StatusCode, WebError> {
    state.doe_repository.create_site_control_group(&payload).await?;
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
pub struct UpsertDoeRequest {
    pub doe: DynamicOperatingEnvelope,
    pub explicit_group_primacy: Option<i64>,
    #[serde(default)]
    pub supersede: bool,
}

/// Upsert masivo: cada fila entra a `insert_doe` bajo el modo de
/// envoltura indicado globalmente para este lote.
#[instrument(skip(state, payload))]
pub async fn bulk_upsert_does(
    State(state): State<AppState>,
    Json(payload): Json<Vec<UpsertDoeRequest>>,
) -> Result<StatusCode, WebError> {
    let mut changed = Vec::with_capacity(payload.len());
    for entry in payload {
        let primacy = resolve_group_primacy(entry.explicit_group_primacy);
        let mode = if entry.supersede {
            UpsertMode::Supersede
        } else {
            UpsertMode::CancelThenInsert
        };
        state.doe_repository.insert_doe(&entry.doe, primacy, mode).await?;
        changed.push(entry.doe);
    }
    notify_batch::notify_doe_change(&state, &changed).await?;
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
pub struct DeleteDoeRangeRequest {
    pub site_control_group_id: i64,
    pub site_id: i64,
    pub range_start: chrono::DateTime<Utc>,
    pub range_end: chrono::DateTime<Utc>,
}

#[instrument(skip(state, payload))]
pub async fn delete_does_in_range(
    State(state): State<AppState>,
    Json(payload): Json<DeleteDoeRangeRequest>,
) -> Result<StatusCode, WebError> {
    state
        .doe_repository
        .delete_does_with_start_time_in_range(
            payload.site_control_group_id,
            payload.site_id,
            payload.range_start,
            payload.range_end,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn upsert_default_site_control(
    State(state): State<AppState>,
    Json(payload): Json<DefaultSiteControl>,
) -> Result<StatusCode, WebError> {
    state.doe_repository.upsert_default_site_control(&payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_default_site_control(
    State(state): State<AppState>,
    Path((site_control_group_id, site_id)): Path<(i64, i64)>,
) -> Result<Json<DefaultSiteControl>, WebError> {
    let default_control = state
        .doe_repository
        .get_default_site_control(site_control_group_id, site_id)
        .await?
        .ok_or(WebError::NotFound("DefaultSiteControl"))?;
    Ok(Json(default_control))
}

#[instrument(skip(state, payload))]
pub async fn create_tariff(
    State(state): State<AppState>,
    Json(payload): Json<Tariff>,
) -> Result<StatusCode, WebError> {
    state.tariff_repository.create_tariff(&payload).await?;
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state))]
pub async fn get_tariff(
    State(state): State<AppState>,
    Path(tariff_id): Path<i64>,
) -> Result<Json<Tariff>, WebError> {
    let tariff = state
        .tariff_repository
        .get_tariff(tariff_id)
        .await?
        .ok_or(WebError::NotFound("Tariff"))?;
    Ok(Json(tariff))
}

/// Upsert masivo de tasas generadas: inserta cada fila nueva; las ya
/// existentes (mismo id) se archivan-y-actualizan.
#[instrument(skip(state, payload))]
pub async fn bulk_upsert_generated_rates(
    State(state): State<AppState>,
    Json(payload): Json<Vec<TariffGeneratedRate>>,
) -> Result<StatusCode, WebError> {
    for rate in &payload {
        let existing = state
            .tariff_repository
            .select_rate_for_day_time(rate.tariff_id, rate.site_id, rate.start_date, rate.start_time)
            .await?;
        match existing {
            Some(_) => state.tariff_repository.update_rate(rate).await?,
            None => state.tariff_repository.insert_rate(rate).await?,
        }
    }
    notify_batch::notify_rate_change(&state, &payload).await?;
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Serialize)]
pub struct CalculationLogEntry {
    pub site_id: i64,
    pub tariff_id: i64,
    pub rows_materialized: i64,
    pub computed_at: chrono::DateTime<Utc>,
}

/// Registro de auditoria de la ultima generacion de tasas: en esta
/// implementacion se deriva a demanda (sin tabla dedicada) contando las
/// filas vivas para el par `(tariff, site)` solicitado.
#[instrument(skip(state))]
pub async fn get_calculation_log(
    State(state): State<AppState>,
    Path((tariff_id, site_id)): Path<(i64, i64)>,
) -> Result<Json<CalculationLogEntry>, WebError> {
    let (days, _plan) = state
        .tariff_repository
        .list_distinct_rate_days(tariff_id, site_id, 0, 100)
        .await?;
    Ok(Json(CalculationLogEntry {
        site_id,
        tariff_id,
        rows_materialized: days.len() as i64,
        computed_at: Utc::now(),
    }))
}

#[instrument(skip(state))]
pub async fn get_runtime_config(State(state): State<AppState>) -> Json<RuntimeServerConfig> {
    Json(state.current_config())
}

#[instrument(skip(state, payload))]
pub async fn update_runtime_config(
    State(state): State<AppState>,
    Json(payload): Json<RuntimeServerConfig>,
) -> Result<StatusCode, WebError> {
    let previous = state.current_config();
    state.config_repository.update_current_config(&payload).await?;
    state.reload_runtime_config().await?;
    notify_batch::notify_runtime_config_change(&state, &previous, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct SystemModeResponse {
    pub mode: String,
    pub reason: Option<String>,
}

#[instrument(skip(state))]
pub async fn get_system_mode(State(state): State<AppState>) -> Json<SystemModeResponse> {
    let response = match state.is_operational() {
        Ok(()) => SystemModeResponse {
            mode: "OPERATIONAL".to_string(),
            reason: None,
        },
        Err(reason) => SystemModeResponse {
            mode: "MAINTENANCE".to_string(),
            reason: Some(reason),
        },
    };
    Json(response)
}

#[derive(Debug, Deserialize)]
pub struct SetSystemModeRequest {
    pub maintenance_reason: Option<String>,
}

#[instrument(skip(state, payload))]
pub async fn set_system_mode(
    State(state): State<AppState>,
    Json(payload): Json<SetSystemModeRequest>,
) -> StatusCode {
    match payload.maintenance_reason {
        Some(reason) => state.set_mode(SystemMode::Maintenance(reason)),
        None => state.set_mode(SystemMode::Operational),
    }
    StatusCode::NO_CONTENT
}
// FIN DEL ARCHIVO [apps/server/src/handlers/admin.rs]
