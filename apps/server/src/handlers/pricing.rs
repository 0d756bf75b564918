// INICIO DEL ARCHIVO [apps/server/src/handlers/pricing.rs]
/*!
 * =================================================================
 * APARATO: PRICING SURFACE HANDLERS (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: `/tp` (LISTA), Y EL ARBOL VIRTUAL RateComponent /
 *                   TimeTariffInterval / ConsumptionTariffInterval
 *
 * RateComponent y ConsumptionTariffInterval no tienen fila propia: se
 * derivan en el momento de la respuesta a partir de
 * `tariff_generated_rates`, aplanando dia x PricingReadingType con las
 * primitivas de `sep2_domain_pricing`.
 * =================================================================
 */

use crate::handlers::sep2::ListQuery;
use crate::handlers::xml::{
    ConsumptionTariffIntervalDto, ConsumptionTariffIntervalListDto, RateComponentDto,
    RateComponentListDto, TariffProfileDto, TariffProfileListDto, TimeTariffIntervalDto,
    TimeTariffIntervalListDto, XmlResponse,
};
use crate::state::AppState;
use crate::web_error::WebError;
use axum::extract::{Extension, Path, Query, State};
use chrono::NaiveDate;
use sep2_domain_mrid::{encode_mrid, encode_rate_component_id, encode_time_tariff_interval_id, MridType};
use sep2_domain_pricing::{flatten_and_trim, plan_rate_component_trim, PricingReadingType, ALL_PRICING_READING_TYPES};
use sep2_domain_scope::{derive_device_or_aggregator_scope, derive_site_scope, Claims};
use tracing::instrument;

fn href_prefix_of(identity: &sep2_domain_scope::ScopeIdentity) -> String {
    identity.href_prefix.clone().unwrap_or_default()
}

fn minutes_since_2000(day: NaiveDate) -> u32 {
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 1).expect("2000-01-01 is a valid date");
    (day.signed_duration_since(epoch).num_days() * 1440) as u32
}

#[instrument(skip(state, claims))]
pub async fn list_tariff_profiles(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListQuery>,
) -> Result<XmlResponse<TariffProfileListDto>, WebError> {
    let scope = derive_device_or_aggregator_scope(&claims, None)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let tariffs = state
        .tariff_repository
        .list_tariffs(query.start(), query.limit())
        .await?;
    let mut dtos = Vec::with_capacity(tariffs.len());
    for tariff in &tariffs {
        let mrid = encode_mrid(
            MridType::Tariff,
            sep2_domain_mrid::encode_tariff_id(tariff.tariff_id as u32),
            scope.identity.iana_pen,
        )
        .map_err(|e| WebError::UnableToGenerateId(e.to_string()))?;
        dtos.push(TariffProfileDto::from_tariff(&href_prefix, mrid, tariff));
    }
    Ok(XmlResponse(TariffProfileListDto {
        href: format!("{href_prefix}/tp"),
        all: dtos.len() as i64,
        results: dtos.len() as i64,
        tariffs: dtos,
    }))
}

/// `GET /edev/{site_id}/tp/{tariff_id}/rc`: fanout virtual dia x PRT.
#[instrument(skip(state, claims))]
pub async fn list_rate_components(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, tariff_id)): Path<(i64, i64)>,
    Query(query): Query<ListQuery>,
) -> Result<XmlResponse<RateComponentListDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let (days, plan) = state
        .tariff_repository
        .list_distinct_rate_days(tariff_id, scope.site_id, query.start(), query.limit())
        .await?;
    let trim = plan_rate_component_trim(&plan, query.limit(), days.len() as i64);
    let flattened = flatten_and_trim(&days, &trim);
    let mut components = Vec::with_capacity(flattened.len());
    for (day, prt) in &flattened {
        let mrid = encode_mrid(
            MridType::RateComponent,
            encode_rate_component_id(tariff_id as u32, scope.site_id as u32, prt.ordinal(), minutes_since_2000(*day))
                .map_err(|e| WebError::UnableToGenerateId(e.to_string()))?,
            scope.identity.iana_pen,
        )
        .map_err(|e| WebError::UnableToGenerateId(e.to_string()))?;
        components.push(RateComponentDto::build(&href_prefix, scope.site_id, tariff_id, mrid, *day, *prt));
    }
    Ok(XmlResponse(RateComponentListDto {
        href: format!("{href_prefix}/edev/{}/tp/{tariff_id}/rc", scope.site_id),
        all: (days.len() as i64) * (ALL_PRICING_READING_TYPES.len() as i64),
        results: components.len() as i64,
        components,
    }))
}

/// `GET /edev/{site_id}/tp/{tariff_id}/rc/{day}/{prt}/tti`: las tasas
/// generadas de ese dia para ese PricingReadingType.
#[instrument(skip(state, claims))]
pub async fn list_time_tariff_intervals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, tariff_id, day, prt_ordinal)): Path<(i64, i64, String, u8)>,
) -> Result<XmlResponse<TimeTariffIntervalListDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
        .map_err(|_| WebError::BadRequest(format!("malformed RateComponent day: {day}")))?;
    let pricing_reading_type =
        PricingReadingType::from_ordinal(prt_ordinal).map_err(|e| WebError::BadRequest(e.to_string()))?;
    let rates = state
        .tariff_repository
        .list_rates_for_day(tariff_id, scope.site_id, day)
        .await?;
    let mut intervals = Vec::with_capacity(rates.len());
    for rate in &rates {
        let mrid = encode_mrid(
            MridType::TimeTariffInterval,
            encode_time_tariff_interval_id(rate.tariff_generated_rate_id as u64, pricing_reading_type.ordinal())
                .map_err(|e| WebError::UnableToGenerateId(e.to_string()))?,
            scope.identity.iana_pen,
        )
        .map_err(|e| WebError::UnableToGenerateId(e.to_string()))?;
        intervals.push(TimeTariffIntervalDto::from_rate(
            &href_prefix,
            mrid,
            tariff_id,
            scope.site_id,
            rate,
            pricing_reading_type,
        ));
    }
    Ok(XmlResponse(TimeTariffIntervalListDto {
        href: format!("{href_prefix}/edev/{}/tp/{tariff_id}/rc/{day}/{prt_ordinal}/tti", scope.site_id),
        all: intervals.len() as i64,
        results: intervals.len() as i64,
        intervals,
    }))
}

/// `GET /edev/{site_id}/tp/{tariff_id}/rc/{day}/tti/{tti_id}/cti`: el
/// unico ConsumptionTariffInterval vigente (escalon de precio unico).
#[instrument(skip(state, claims))]
pub async fn list_consumption_tariff_intervals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((site_id, tariff_id, day, tti_id)): Path<(i64, i64, String, String)>,
) -> Result<XmlResponse<ConsumptionTariffIntervalListDto>, WebError> {
    let scope = derive_site_scope(&claims, site_id)?;
    let href_prefix = href_prefix_of(&scope.identity);
    let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
        .map_err(|_| WebError::BadRequest(format!("malformed RateComponent day: {day}")))?;
    let time = sep2_domain_pricing::parse_time_tariff_interval_id(&tti_id)
        .map_err(|e| WebError::BadRequest(e.to_string()))?;
    let rate = state
        .tariff_repository
        .select_rate_for_day_time(tariff_id, scope.site_id, day, time)
        .await?
        .ok_or(WebError::NotFound("TimeTariffInterval"))?;
    let mut intervals = Vec::new();
    for prt in ALL_PRICING_READING_TYPES {
        if let Some(price) = sep2_domain_pricing::extract_price(prt, &rate) {
            let mrid = encode_mrid(
                MridType::TimeTariffInterval,
                encode_time_tariff_interval_id(rate.tariff_generated_rate_id as u64, prt.ordinal())
                    .map_err(|e| WebError::UnableToGenerateId(e.to_string()))?,
                scope.identity.iana_pen,
            )
            .map_err(|e| WebError::UnableToGenerateId(e.to_string()))?;
            intervals.push(ConsumptionTariffIntervalDto::build(
                &href_prefix,
                scope.site_id,
                tariff_id,
                day,
                &tti_id,
                mrid,
                price,
            ));
        }
    }
    Ok(XmlResponse(ConsumptionTariffIntervalListDto {
        href: format!("{href_prefix}/edev/{}/tp/{tariff_id}/rc/{day}/tti/{tti_id}/cti", scope.site_id),
        all: intervals.len() as i64,
        results: intervals.len() as i64,
        intervals,
    }))
}
// FIN DEL ARCHIVO [apps/server/src/handlers/pricing.rs]
