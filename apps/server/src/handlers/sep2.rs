// INICIO DEL ARCHIVO [apps/server/src/handlers/sep2.rs]
/*!
 * =================================================================
 * APARATO: 2030.5 SURFACE HANDLERS (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: RUTAS XML CSIP-AUS ESCOPADAS POR CERTIFICADO CLIENTE
 *
 * Cada handler: extrae Claims, deriva un scope tipado de
 * sep2_domain_scope, resuelve entidades via repositorio, y serializa
 * con los DTOs de `handlers::xml`. Los errores se propagan con `?`
 * hacia `WebError`, unico punto consciente de StatusCode.
 * =================================================================
 */

use crate::handlers::xml::{
    ConnectionPointDto, DefaultDerControlDto, DerControlDto, DerControlListDto, DerProgramDto,
    DerProgramListDto, DeviceCapabilityDto, EndDeviceDto, EndDeviceListDto, RegistrationDto,
    SubscriptionDto, SubscriptionListDto, TariffProfileDto, TimeDto, XmlResponse,
};
use crate::state::AppState;
use crate::web_error::WebError;
use axum::extract::{Extension, Path, Query, State};
use chrono::{DateTime, Utc};
use sep2_domain_model::{Site, Subscription};
use sep2_domain_mrid::{encode_mrid, MridType};
use sep2_domain_scope::{derive_device_or_aggregator_scope, derive_site_scope, Claims};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

/// Parametros de paginacion compartidos por toda lista 2030.5.
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    #[serde(default)]
    pub s: Option<i64>,
    #[serde(default)]
    pub a: Option<i64>,
    #[serde(default)]
    pub l: Option<i64>,
}

impl ListQuery {
    pub(crate) fn start(&self) -> i64 {
        self.s.unwrap_or(0)
    }

    pub(crate) fn limit(&self) -> i64 {
        self.l.unwrap_or(25).clamp(1, 100)
    }

    pub(crate) fn after(&self) -> Option<DateTime<Utc>> {
        self.a.and_then(|epoch| DateTime::from_timestamp(epoch, 0))
    }
}

fn mrid_for(mrid_type: MridType, id: u128, iana_pen: u32) -> Result<String, WebError> {
    encode_mrid(mrid_type, id, iana_pen).map_err(|fault| WebError::UnableToGenerateId(fault.to_string()))
}

fn href_prefix_of(identity: &sep2_domain_scope::ScopeIdentity) -> String {
    identity.href_prefix.clone().unwrap_or_default()
}

#[instrument]
pub async fn get_current_time() -> XmlResponse<TimeDto> {
    XmlResponse(TimeDto::default())
}

#[instrument(skip(state))]
pub async fn get_device_capability(State(state): State<AppState>) -> XmlResponse<DeviceCapabilityDto> {
    let config = state.current_config();
    XmlResponse(DeviceCapabilityDto::build("", &config))
}

#[instrument(skip(state, claims))]
pub async fn list_end_devices(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListQuery>,
) -> Result<XmlResponse<EndDeviceListDto>, WebError> {
    let scope = derive_device_or_aggregator_scope(&claims, None)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let sites = state
        .site_repository
        .list_sites_for_aggregator(scope.aggregator_id, query.start(), query.limit())
        .await?;
    let end_devices: Vec<EndDeviceDto> = sites
        .iter()
        .map(|site| EndDeviceDto::from_site(&href_prefix, site))
        .collect();
    Ok(XmlResponse(EndDeviceListDto {
        href: format!("{href_prefix}/edev"),
        all: end_devices.len() as i64,
        results: end_devices.len() as i64,
        end_devices,
    }))
}

#[instrument(skip(state, claims))]
pub async fn create_end_device(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<axum::http::StatusCode, WebError> {
    let scope = derive_device_or_aggregator_scope(&claims, None)?;
    let config = state.current_config();
    if config.disable_edev_registration {
        return Err(WebError::ForbiddenScope(
            "end device self-registration is disabled by runtime configuration".into(),
        ));
    }
    let site_id = Uuid::new_v4().as_u128() as i64 & i64::MAX;
    let site = Site {
        site_id,
        aggregator_id: scope.aggregator_id,
        lfdi: claims.lfdi.clone(),
        sfdi: claims.sfdi,
        device_category: 0,
        nmi: None,
        timezone_id: "Australia/Brisbane".to_string(),
        changed_time: Utc::now(),
    };
    state.site_repository.create_site(&site).await?;
    Ok(axum::http::StatusCode::CREATED)
}

#[instrument(skip(state, claims))]
pub async fn get_end_device(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
) -> Result<XmlResponse<EndDeviceDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let site = state
        .site_repository
        .get_site(scope.site_id)
        .await?
        .ok_or(WebError::NotFound("EndDevice"))?;
    Ok(XmlResponse(EndDeviceDto::from_site(&href_prefix, &site)))
}

#[instrument(skip(state, claims))]
pub async fn delete_end_device(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
) -> Result<axum::http::StatusCode, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    state.site_repository.delete_site(scope.site_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// `GET /edev/{site_id}/derp/doe/derc`: controles activos derivados de
/// las DOEs vigentes en el instante de la consulta, o de la ventana
/// completa si se pide historico via `?a=`.
#[instrument(skip(state, claims))]
pub async fn list_der_controls(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<XmlResponse<DerControlListDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let rows = match query.after() {
        Some(at) => {
            state
                .doe_repository
                .select_does_at_timestamp(scope.site_id, None, at)
                .await?
        }
        None => {
            state
                .doe_repository
                .select_active_does_include_deleted(scope.site_id, None, Utc::now())
                .await?
        }
    };
    let start = query.start() as usize;
    let limit = query.limit() as usize;
    let page: Vec<_> = rows.iter().skip(start).take(limit).collect();
    let mut controls = Vec::with_capacity(page.len());
    for row in &page {
        let mrid = mrid_for(
            MridType::DynamicOperatingEnvelope,
            sep2_domain_mrid::encode_doe_id(row.doe.dynamic_operating_envelope_id as u64),
            scope.identity.iana_pen,
        )?;
        controls.push(DerControlDto::from_doe(
            mrid,
            &row.doe,
            row.origin == sep2_domain_model::archive::Origin::Archive,
        ));
    }
    Ok(XmlResponse(DerControlListDto {
        href: format!("{href_prefix}/edev/{}/derp/doe/derc", scope.site_id),
        all: rows.len() as i64,
        results: controls.len() as i64,
        controls,
    }))
}

#[instrument(skip(state, claims))]
pub async fn list_tariffs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(tariff_id): Path<i64>,
) -> Result<XmlResponse<TariffProfileDto>, WebError> {
    let scope = derive_device_or_aggregator_scope(&claims, None)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let tariff = state
        .tariff_repository
        .get_tariff(tariff_id)
        .await?
        .ok_or(WebError::NotFound("TariffProfile"))?;
    let mrid = mrid_for(
        MridType::Tariff,
        sep2_domain_mrid::encode_tariff_id(tariff_id as u32),
        scope.identity.iana_pen,
    )?;
    Ok(XmlResponse(TariffProfileDto::from_tariff(&href_prefix, mrid, &tariff)))
}

#[instrument(skip(state, claims, payload))]
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
    axum::Json(payload): axum::Json<CreateSubscriptionRequest>,
) -> Result<(axum::http::StatusCode, [(axum::http::HeaderName, String); 1]), WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let parsed = sep2_domain_href::parse_subscribed_resource_href(
        Some(&href_prefix),
        &payload.subscribed_resource,
    )?;
    let subscription_id = Uuid::new_v4().as_u128() as i64 & i64::MAX;
    let subscription = Subscription {
        subscription_id,
        aggregator_id: scope.aggregator_id,
        resource_type: parsed.resource_type,
        resource_id: parsed.resource_id,
        scoped_site_id: parsed.scoped_site_id,
        notification_uri: payload.notification_uri,
        entity_limit: payload.entity_limit.unwrap_or(1),
        changed_time: Utc::now(),
        condition: None,
    };
    state.subscription_repository.create_subscription(&subscription).await?;
    let href = sep2_domain_href::calculate_subscription_href(
        &href_prefix,
        parsed.scoped_site_id,
        subscription_id,
    );
    Ok((
        axum::http::StatusCode::CREATED,
        [(axum::http::header::LOCATION, href)],
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    #[serde(rename = "subscribedResource")]
    pub subscribed_resource: String,
    #[serde(rename = "notificationURI")]
    pub notification_uri: String,
    #[serde(rename = "limit")]
    pub entity_limit: Option<i64>,
}

#[instrument(skip(state, claims))]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
) -> Result<XmlResponse<SubscriptionListDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let subscriptions = state
        .subscription_repository
        .list_subscriptions_for_resource(scope.aggregator_id, sep2_domain_model::SubscriptionResource::EndDevice)
        .await?
        .into_iter()
        .filter(|sub| sub.scoped_site_id == Some(scope.site_id))
        .collect::<Vec<_>>();
    let mut dtos = Vec::with_capacity(subscriptions.len());
    for sub in &subscriptions {
        let mrid = format!("{:032x}", sub.subscription_id);
        let resource_href = sep2_domain_href::calculate_resource_href(
            &href_prefix,
            sub.resource_type,
            sub.scoped_site_id,
            sub.resource_id,
        );
        let href = sep2_domain_href::calculate_subscription_href(
            &href_prefix,
            sub.scoped_site_id,
            sub.subscription_id,
        );
        dtos.push(SubscriptionDto::from_subscription(href, mrid, resource_href, sub));
    }
    Ok(XmlResponse(SubscriptionListDto {
        href: format!("{href_prefix}/edev/{}/sub", scope.site_id),
        all: dtos.len() as i64,
        results: dtos.len() as i64,
        subscriptions: dtos,
    }))
}

#[instrument(skip(state, claims))]
pub async fn delete_subscription(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, subscription_id)): Path<(i64, i64)>,
) -> Result<axum::http::StatusCode, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let existing = state
        .subscription_repository
        .get_subscription(subscription_id)
        .await?
        .ok_or(WebError::NotFound("Subscription"))?;
    if existing.aggregator_id != scope.aggregator_id {
        return Err(WebError::ForbiddenScope(format!(
            "subscription {subscription_id} is not owned by this scope"
        )));
    }
    state.subscription_repository.delete_subscription(subscription_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// Deriva el PIN de registro de un Site: el valor fijo de pruebas si
/// `STATIC_REGISTRATION_PIN` esta definido, o el `sfdi` reducido al
/// rango `0..=99999` que exige el campo `Registration.pin`.
fn registration_pin_of(state: &AppState, sfdi: i64) -> i64 {
    state.registration_pin_override.unwrap_or_else(|| sfdi.rem_euclid(100_000))
}

#[instrument(skip(state, claims))]
pub async fn get_registration(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
) -> Result<XmlResponse<RegistrationDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let site = state
        .site_repository
        .get_site(scope.site_id)
        .await?
        .ok_or(WebError::NotFound("EndDevice"))?;
    Ok(XmlResponse(RegistrationDto {
        href: format!("{href_prefix}/edev/{}/reg", scope.site_id),
        pin: registration_pin_of(&state, site.sfdi),
    }))
}

#[instrument(skip(state, claims))]
pub async fn get_connection_point(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
) -> Result<XmlResponse<ConnectionPointDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let site = state
        .site_repository
        .get_site(scope.site_id)
        .await?
        .ok_or(WebError::NotFound("EndDevice"))?;
    Ok(XmlResponse(ConnectionPointDto {
        href: format!("{href_prefix}/edev/{}/cp", scope.site_id),
        connection_point_id: site.nmi,
    }))
}

/// `GET /edev/{site_id}/derp`: el unico DERProgram "doe" (primer grupo
/// de control por primacia, anterior a soportar multiples grupos).
#[instrument(skip(state, claims))]
pub async fn list_der_programs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
) -> Result<XmlResponse<DerProgramListDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let groups = state
        .doe_repository
        .list_site_control_groups(scope.aggregator_id, 0, 1)
        .await?;
    let programs = match groups.first() {
        Some(group) => {
            let mrid = mrid_for(
                MridType::DerProgram,
                sep2_domain_mrid::encode_der_program_id(scope.site_id as u32),
                scope.identity.iana_pen,
            )?;
            vec![DerProgramDto::doe_program(&href_prefix, scope.site_id, mrid, group.primacy)]
        }
        None => Vec::new(),
    };
    Ok(XmlResponse(DerProgramListDto {
        href: format!("{href_prefix}/edev/{}/derp", scope.site_id),
        all: programs.len() as i64,
        results: programs.len() as i64,
        programs,
    }))
}

#[instrument(skip(state, claims))]
pub async fn get_der_program(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, derp_id)): Path<(i64, String)>,
) -> Result<XmlResponse<DerProgramDto>, WebError> {
    if derp_id != "doe" {
        return Err(WebError::NotFound("DERProgram"));
    }
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let group = state
        .doe_repository
        .list_site_control_groups(scope.aggregator_id, 0, 1)
        .await?
        .into_iter()
        .next()
        .ok_or(WebError::NotFound("DERProgram"))?;
    let mrid = mrid_for(
        MridType::DerProgram,
        sep2_domain_mrid::encode_der_program_id(scope.site_id as u32),
        scope.identity.iana_pen,
    )?;
    Ok(XmlResponse(DerProgramDto::doe_program(&href_prefix, scope.site_id, mrid, group.primacy)))
}

/// `GET /edev/{site_id}/derp/doe/actderc`: igual que
/// [`list_der_controls`] restringida al instante presente, sin historico.
#[instrument(skip(state, claims))]
pub async fn list_active_der_controls(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<XmlResponse<DerControlListDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let rows = state
        .doe_repository
        .select_does_at_timestamp(scope.site_id, None, Utc::now())
        .await?;
    let start = query.start() as usize;
    let limit = query.limit() as usize;
    let page: Vec<_> = rows.iter().skip(start).take(limit).collect();
    let mut controls = Vec::with_capacity(page.len());
    for row in &page {
        let mrid = mrid_for(
            MridType::DynamicOperatingEnvelope,
            sep2_domain_mrid::encode_doe_id(row.doe.dynamic_operating_envelope_id as u64),
            scope.identity.iana_pen,
        )?;
        controls.push(DerControlDto::from_doe(
            mrid,
            &row.doe,
            row.origin == sep2_domain_model::archive::Origin::Archive,
        ));
    }
    Ok(XmlResponse(DerControlListDto {
        href: format!("{href_prefix}/edev/{}/derp/doe/actderc", scope.site_id),
        all: rows.len() as i64,
        results: controls.len() as i64,
        controls,
    }))
}

/// `GET /edev/{site_id}/derp/doe/dderc`: el DefaultDERControl del grupo
/// "doe" para este Site.
#[instrument(skip(state, claims))]
pub async fn get_default_der_control(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(site_id): Path<i64>,
) -> Result<XmlResponse<DefaultDerControlDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let group = state
        .doe_repository
        .list_site_control_groups(scope.aggregator_id, 0, 1)
        .await?
        .into_iter()
        .next()
        .ok_or(WebError::NotFound("DefaultDERControl"))?;
    let default_control = state
        .doe_repository
        .get_default_site_control(group.site_control_group_id, scope.site_id)
        .await?
        .ok_or(WebError::NotFound("DefaultDERControl"))?;
    let href = format!("{href_prefix}/edev/{}/derp/doe/dderc", scope.site_id);
    Ok(XmlResponse(DefaultDerControlDto::from_model(href, &default_control)))
}

/// `GET /edev/{site_id}/derp/doe/derc/{id}`: una sola DOE por id, viva
/// o archivada.
#[instrument(skip(state, claims))]
pub async fn get_der_control(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, dynamic_operating_envelope_id)): Path<(i64, i64)>,
) -> Result<XmlResponse<DerControlDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let (doe, superseded) = state
        .doe_repository
        .get_doe_by_id(dynamic_operating_envelope_id)
        .await?
        .ok_or(WebError::NotFound("DERControl"))?;
    if doe.site_id != scope.site_id {
        return Err(WebError::ForbiddenScope(format!(
            "DOE {dynamic_operating_envelope_id} does not belong to site {}",
            scope.site_id
        )));
    }
    let mrid = mrid_for(
        MridType::DynamicOperatingEnvelope,
        sep2_domain_mrid::encode_doe_id(dynamic_operating_envelope_id as u64),
        scope.identity.iana_pen,
    )?;
    Ok(XmlResponse(DerControlDto::from_doe(mrid, &doe, superseded)))
}
// FIN DEL ARCHIVO [apps/server/src/handlers/sep2.rs]
