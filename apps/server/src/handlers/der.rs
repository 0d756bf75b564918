// INICIO DEL ARCHIVO [apps/server/src/handlers/der.rs]
/*!
 * =================================================================
 * APARATO: DER SUB-RESOURCE HANDLERS (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: RUTAS `/edev/{site_id}/der` Y SUS 4 SUB-RECURSOS
 *
 * Cada Site porta exactamente un recurso DER (1:1 con las tablas
 * `site_der_*`); el `der_id` de la URL es siempre `0`, preservado en
 * la ruta por fidelidad con el espacio de recursos 2030.5.
 * =================================================================
 */

use crate::handlers::xml::{
    DerAvailabilityDto, DerCapabilityDto, DerDto, DerListDto, DerSettingsDto, DerStatusDto,
    XmlResponse,
};
use crate::state::AppState;
use crate::web_error::WebError;
use axum::extract::{Extension, Path, State};
use sep2_domain_scope::{derive_site_scope, Claims};
use tracing::instrument;

const SINGLETON_DER_ID: i64 = 0;

fn href_prefix_of(identity: &sep2_domain_scope::ScopeIdentity) -> String {
    identity.href_prefix.clone().unwrap_or_default()
}

fn check_der_id(der_id: i64) -> Result<(), WebError> {
    if der_id != SINGLETON_DER_ID {
        return Err(WebError::NotFound("DER"));
    }
    Ok(())
}

#[instrument(skip(state, claims))]
pub async fn list_ders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
) -> Result<XmlResponse<DerListDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let _ = state.site_repository.get_site(scope.site_id).await?.ok_or(WebError::NotFound("EndDevice"))?;
    let der = DerDto::for_site(&href_prefix, scope.site_id, SINGLETON_DER_ID);
    Ok(XmlResponse(DerListDto {
        href: format!("{href_prefix}/edev/{}/der", scope.site_id),
        all: 1,
        results: 1,
        ders: vec![der],
    }))
}

#[instrument(skip(state, claims))]
pub async fn get_der_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, der_id)): Path<(i64, i64)>,
) -> Result<XmlResponse<DerAvailabilityDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    check_der_id(der_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let availability = state
        .site_repository
        .get_der_availability(scope.site_id)
        .await?
        .ok_or(WebError::NotFound("DERAvailability"))?;
    let href = format!("{href_prefix}/edev/{}/der/{der_id}/dera", scope.site_id);
    Ok(XmlResponse(DerAvailabilityDto::from_model(href, &availability)))
}

#[instrument(skip(state, claims))]
pub async fn get_der_capability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, der_id)): Path<(i64, i64)>,
) -> Result<XmlResponse<DerCapabilityDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    check_der_id(der_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let rating = state
        .site_repository
        .get_der_rating(scope.site_id)
        .await?
        .ok_or(WebError::NotFound("DERCapability"))?;
    let href = format!("{href_prefix}/edev/{}/der/{der_id}/dercap", scope.site_id);
    Ok(XmlResponse(DerCapabilityDto::from_model(href, &rating)))
}

#[instrument(skip(state, claims))]
pub async fn get_der_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, der_id)): Path<(i64, i64)>,
) -> Result<XmlResponse<DerSettingsDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    check_der_id(der_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let setting = state
        .site_repository
        .get_der_setting(scope.site_id)
        .await?
        .ok_or(WebError::NotFound("DERSettings"))?;
    let href = format!("{href_prefix}/edev/{}/der/{der_id}/ders", scope.site_id);
    Ok(XmlResponse(DerSettingsDto::from_model(href, &setting)))
}

#[instrument(skip(state, claims))]
pub async fn get_der_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, der_id)): Path<(i64, i64)>,
) -> Result<XmlResponse<DerStatusDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    check_der_id(der_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let status = state
        .site_repository
        .get_der_status(scope.site_id)
        .await?
        .ok_or(WebError::NotFound("DERStatus"))?;
    let href = format!("{href_prefix}/edev/{}/der/{der_id}/derg", scope.site_id);
    Ok(XmlResponse(DerStatusDto::from_model(href, &status)))
}
// FIN DEL ARCHIVO [apps/server/src/handlers/der.rs]
