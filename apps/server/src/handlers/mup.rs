// INICIO DEL ARCHIVO [apps/server/src/handlers/mup.rs]
/*!
 * =================================================================
 * APARATO: MIRRORUSAGEPOINT SURFACE HANDLERS (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CRUD DE MIRRORUSAGEPOINT Y LOTES DE MeterReading
 *
 * Un MirrorUsagePoint se modela 1:1 sobre un SiteReadingType; su id de
 * recurso ES el `site_reading_type_id`. Sin sombra de archivo: el
 * borrado es definitivo, como lo es el esquema subyacente.
 * =================================================================
 */

use crate::handlers::sep2::ListQuery;
use crate::handlers::xml::{MirrorUsagePointDto, MirrorUsagePointListDto, XmlResponse};
use crate::state::AppState;
use crate::web_error::WebError;
use axum::extract::{Extension, Path, Query, State};
use chrono::Utc;
use sep2_domain_model::{SiteReading, SiteReadingType};
use sep2_domain_mrid::{encode_mrid, encode_reading_type_id, MridType};
use sep2_domain_scope::{derive_mup_list_scope, derive_mup_scope, Claims};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

fn href_prefix_of(identity: &sep2_domain_scope::ScopeIdentity) -> String {
    identity.href_prefix.clone().unwrap_or_default()
}

fn mrid_for(site_reading_type_id: i64, iana_pen: u32) -> Result<String, WebError> {
    encode_mrid(
        MridType::MirrorUsagePoint,
        encode_reading_type_id(site_reading_type_id as u32),
        iana_pen,
    )
    .map_err(|fault| WebError::UnableToGenerateId(fault.to_string()))
}

#[instrument(skip(state, claims))]
pub async fn list_mirror_usage_points(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListQuery>,
) -> Result<XmlResponse<MirrorUsagePointListDto>, WebError> {
    let scope = derive_mup_list_scope(&claims);
    let href_prefix = href_prefix_of(&scope.identity);
    let reading_types = state
        .reading_repository
        .list_reading_types_for_aggregator(scope.aggregator_id, query.start(), query.limit())
        .await?;
    let mut points = Vec::with_capacity(reading_types.len());
    for reading_type in &reading_types {
        let mrid = mrid_for(reading_type.site_reading_type_id, scope.identity.iana_pen)?;
        points.push(MirrorUsagePointDto::from_model(&href_prefix, mrid, reading_type));
    }
    Ok(XmlResponse(MirrorUsagePointListDto {
        href: format!("{href_prefix}/mup"),
        all: points.len() as i64,
        results: points.len() as i64,
        points,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateMirrorUsagePointRequest {
    #[serde(rename = "deviceLFDI")]
    pub device_lfdi: Option<String>,
    #[serde(rename = "siteId")]
    pub site_id: i64,
    pub uom: i64,
    #[serde(rename = "dataQualifier")]
    pub data_qualifier: i64,
    #[serde(rename = "roleFlags")]
    pub role_flags: i64,
}

#[instrument(skip(state, claims, payload))]
pub async fn create_mirror_usage_point(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    axum::Json(payload): axum::Json<CreateMirrorUsagePointRequest>,
) -> Result<(axum::http::StatusCode, [(axum::http::HeaderName, String); 1]), WebError> {
    let scope = derive_mup_list_scope(&claims);
    let href_prefix = href_prefix_of(&scope.identity);
    state
        .site_repository
        .get_site(payload.site_id)
        .await?
        .ok_or(WebError::NotFound("EndDevice"))?;
    let site_reading_type_id = Uuid::new_v4().as_u128() as i64 & i64::MAX;
    let reading_type = SiteReadingType {
        site_reading_type_id,
        site_id: payload.site_id,
        uom: payload.uom,
        data_qualifier: payload.data_qualifier,
        flow_direction: payload.role_flags,
        changed_time: Utc::now(),
    };
    state.reading_repository.create_reading_type(&reading_type).await?;
    let href = format!("{href_prefix}/mup/{site_reading_type_id}");
    Ok((axum::http::StatusCode::CREATED, [(axum::http::header::LOCATION, href)]))
}

#[instrument(skip(state, claims))]
pub async fn get_mirror_usage_point(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_reading_type_id): Path<i64>,
) -> Result<XmlResponse<MirrorUsagePointDto>, WebError> {
    let scope = derive_mup_scope(&claims, site_reading_type_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let reading_type = state
        .reading_repository
        .get_reading_type(scope.site_reading_type_id)
        .await?
        .ok_or(WebError::NotFound("MirrorUsagePoint"))?;
    let mrid = mrid_for(reading_type.site_reading_type_id, scope.identity.iana_pen)?;
    Ok(XmlResponse(MirrorUsagePointDto::from_model(&href_prefix, mrid, &reading_type)))
}

#[instrument(skip(state, claims))]
pub async fn delete_mirror_usage_point(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_reading_type_id): Path<i64>,
) -> Result<axum::http::StatusCode, WebError> {
    let scope = derive_mup_scope(&claims, site_reading_type_id)?;
    state
        .reading_repository
        .get_reading_type(scope.site_reading_type_id)
        .await?
        .ok_or(WebError::NotFound("MirrorUsagePoint"))?;
    state.reading_repository.delete_reading_type(scope.site_reading_type_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct MeterReadingBatchEntry {
    #[serde(rename = "timePeriodStart")]
    pub time_period_start: i64,
    #[serde(rename = "timePeriodSeconds")]
    pub time_period_seconds: i64,
    pub value: i64,
}

#[derive(Debug, Deserialize)]
pub struct MeterReadingBatchRequest {
    pub readings: Vec<MeterReadingBatchEntry>,
}

/// `POST /mup/{mup_id}`: lote de lecturas (`MirrorMeterReading`) contra
/// un MirrorUsagePoint existente.
#[instrument(skip(state, claims, payload))]
pub async fn post_meter_readings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_reading_type_id): Path<i64>,
    axum::Json(payload): axum::Json<MeterReadingBatchRequest>,
) -> Result<axum::http::StatusCode, WebError> {
    let scope = derive_mup_scope(&claims, site_reading_type_id)?;
    state
        .reading_repository
        .get_reading_type(scope.site_reading_type_id)
        .await?
        .ok_or(WebError::NotFound("MirrorUsagePoint"))?;
    for entry in &payload.readings {
        let time_period_start = chrono::DateTime::from_timestamp(entry.time_period_start, 0)
            .ok_or_else(|| WebError::BadRequest(format!("invalid timePeriodStart: {}", entry.time_period_start)))?;
        let reading = SiteReading {
            site_reading_id: Uuid::new_v4().as_u128() as i64 & i64::MAX,
            site_reading_type_id: scope.site_reading_type_id,
            time_period_start,
            time_period_seconds: entry.time_period_seconds,
            value: entry.value,
            changed_time: Utc::now(),
        };
        state.reading_repository.insert_reading(&reading).await?;
    }
    Ok(axum::http::StatusCode::CREATED)
}
// FIN DEL ARCHIVO [apps/server/src/handlers/mup.rs]
