// INICIO DEL ARCHIVO [apps/server/src/notify_batch.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION BATCHER (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L1-APP)
 * RESPONSABILIDAD: AGRUPAR ENTIDADES CAMBIADAS POR BATCH KEY, FILTRAR
 *                  CONTRA SUSCRIPCIONES ACTIVAS Y ENCOLAR XML SALIENTE
 *
 * Punto de entrada conceptual `check_db_change_or_delete(resource, ts)`:
 * aqui se materializa como una funcion por familia de recurso
 * (`notify_doe_change`, `notify_rate_change`,
 * `notify_runtime_config_change`), cada una invocada por el handler de
 * escritura correspondiente tras el commit. La logica de agrupacion,
 * paginacion y fanout vive en `sep2_domain_subscription`; este modulo
 * solo resuelve el `aggregator_id` propietario, serializa a XML, y
 * encola el `NotificationJob`.
 * =================================================================
 */

use std::collections::HashMap;

use chrono::NaiveDate;
use sep2_domain_model::{DynamicOperatingEnvelope, RuntimeServerConfig, Subscription, SubscriptionResource, TariffGeneratedRate};
use sep2_domain_mrid::{encode_doe_id, encode_mrid, encode_time_tariff_interval_id, MridType};
use sep2_domain_pricing::PricingReadingType;
use sep2_domain_subscription::{
    clamp_page_size, emits_empty_payload_notification, fan_out_tariff_generated_rate_pages,
    get_entity_pages, matches_subscription, NotifiableEntity, ResourceType,
};
use tracing::{instrument, warn};

use crate::handlers::xml::{
    DerControlDto, DerControlListDto, EndDeviceListDto, NotificationDto, TimeTariffIntervalDto,
    TimeTariffIntervalListDto,
};
use crate::state::{AppState, NotificationJob};

struct DoeEntity<'a>(&'a DynamicOperatingEnvelope);

impl NotifiableEntity for DoeEntity<'_> {
    fn subscription_filter_id(&self) -> Option<i64> {
        // DerControlList no lleva resource_id en su plantilla de href: una
        // suscripcion a este recurso siempre observa el grupo completo.
        None
    }

    fn site_id(&self) -> Option<i64> {
        Some(self.0.site_id)
    }
}

struct RateEntity<'a>(&'a TariffGeneratedRate);

impl NotifiableEntity for RateEntity<'_> {
    fn subscription_filter_id(&self) -> Option<i64> {
        Some(self.0.tariff_id)
    }

    fn site_id(&self) -> Option<i64> {
        Some(self.0.site_id)
    }
}

fn enqueue(state: &AppState, sub: &Subscription, xml_body: Option<String>) {
    let job = NotificationJob {
        notification_uri: sub.notification_uri.clone(),
        xml_body,
    };
    if let Err(fault) = state.notification_queue.try_send(job) {
        warn!(
            "⚠️ [NOTIFY_ENQUEUE_DROPPED]: subscription {} notification dropped: {}",
            sub.subscription_id, fault
        );
    }
}

/// `check_db_change_or_delete(DYNAMIC_OPERATING_ENVELOPE, T)`: agrupa las
/// DOE recien escritas por `(aggregator_id, site_id, site_control_group_id)`
/// y notifica cada suscripcion `DerControlList` que las observa.
#[instrument(skip(state, changed_does))]
pub async fn notify_doe_change(
    state: &AppState,
    changed_does: &[DynamicOperatingEnvelope],
) -> Result<(), sep2_infra_db::DbError> {
    if changed_does.is_empty() {
        return Ok(());
    }

    let mut batches: HashMap<(i64, i64, i64), Vec<DynamicOperatingEnvelope>> = HashMap::new();
    for doe in changed_does {
        let Some(site) = state.site_repository.get_site(doe.site_id).await? else {
            continue;
        };
        batches
            .entry((site.aggregator_id, doe.site_id, doe.site_control_group_id))
            .or_default()
            .push(doe.clone());
    }

    for ((aggregator_id, site_id, _site_control_group_id), entities) in batches {
        let subs = state
            .subscription_repository
            .list_subscriptions_for_resource(aggregator_id, SubscriptionResource::DerControlList)
            .await?;
        for sub in &subs {
            dispatch_doe_pages(state, sub, site_id, &entities);
        }
    }
    Ok(())
}

fn dispatch_doe_pages(state: &AppState, sub: &Subscription, site_id: i64, entities: &[DynamicOperatingEnvelope]) {
    let matched: Vec<DynamicOperatingEnvelope> = entities
        .iter()
        .filter(|doe| matches_subscription(sub, &DoeEntity(doe)))
        .cloned()
        .collect();

    if matched.is_empty() {
        if emits_empty_payload_notification(ResourceType::DynamicOperatingEnvelope, sub) {
            enqueue_doe_page(state, sub, site_id, &[]);
        }
        return;
    }

    let page_size = clamp_page_size(sub.entity_limit);
    for page in get_entity_pages(ResourceType::DynamicOperatingEnvelope, &matched, page_size) {
        enqueue_doe_page(state, sub, site_id, &page);
    }
}

fn enqueue_doe_page(state: &AppState, sub: &Subscription, site_id: i64, page: &[DynamicOperatingEnvelope]) {
    let href_prefix = state.href_prefix().unwrap_or_default();
    let mut controls = Vec::with_capacity(page.len());
    for doe in page {
        let mrid = match encode_mrid(
            MridType::DynamicOperatingEnvelope,
            encode_doe_id(doe.dynamic_operating_envelope_id as u64),
            state.iana_pen(),
        ) {
            Ok(mrid) => mrid,
            Err(fault) => {
                warn!("⚠️ [NOTIFY_MRID_FAULT]: {}", fault);
                continue;
            }
        };
        controls.push(DerControlDto::from_doe(mrid, doe, false));
    }
    let subscribed_resource = format!("{href_prefix}/edev/{site_id}/derp/doe/derc");
    let resource = DerControlListDto {
        href: subscribed_resource.clone(),
        all: controls.len() as i64,
        results: controls.len() as i64,
        controls,
    };
    let subscription_uri =
        sep2_domain_href::calculate_subscription_href(&href_prefix, sub.scoped_site_id, sub.subscription_id);
    let notification = NotificationDto {
        subscribed_resource,
        subscription_uri,
        status: 1,
        resource,
    };
    enqueue(state, sub, quick_xml::se::to_string(&notification).ok());
}

/// `check_db_change_or_delete(TARIFF_GENERATED_RATE, T)`: agrupa las
/// tasas recien escritas por `(aggregator_id, tariff_id, site_id, day)` y
/// abanica cada pagina una vez por cada uno de los cuatro
/// `PricingReadingType` (ver escenario S3).
#[instrument(skip(state, changed_rates))]
pub async fn notify_rate_change(
    state: &AppState,
    changed_rates: &[TariffGeneratedRate],
) -> Result<(), sep2_infra_db::DbError> {
    if changed_rates.is_empty() {
        return Ok(());
    }

    let mut aggregator_cache: HashMap<i64, i64> = HashMap::new();
    let mut batches: HashMap<(i64, i64, i64, NaiveDate), Vec<TariffGeneratedRate>> = HashMap::new();
    for rate in changed_rates {
        let aggregator_id = match aggregator_cache.get(&rate.tariff_id) {
            Some(id) => *id,
            None => {
                let Some(tariff) = state.tariff_repository.get_tariff(rate.tariff_id).await? else {
                    continue;
                };
                aggregator_cache.insert(rate.tariff_id, tariff.aggregator_id);
                tariff.aggregator_id
            }
        };
        batches
            .entry((aggregator_id, rate.tariff_id, rate.site_id, rate.start_date))
            .or_default()
            .push(rate.clone());
    }

    for ((aggregator_id, tariff_id, site_id, day), entities) in batches {
        let subs = state
            .subscription_repository
            .list_subscriptions_for_resource(aggregator_id, SubscriptionResource::RateComponentList)
            .await?;
        for sub in &subs {
            dispatch_rate_pages(state, sub, tariff_id, site_id, day, &entities);
        }
    }
    Ok(())
}

fn dispatch_rate_pages(
    state: &AppState,
    sub: &Subscription,
    tariff_id: i64,
    site_id: i64,
    day: NaiveDate,
    entities: &[TariffGeneratedRate],
) {
    let matched: Vec<TariffGeneratedRate> = entities
        .iter()
        .filter(|rate| matches_subscription(sub, &RateEntity(rate)))
        .cloned()
        .collect();
    if matched.is_empty() {
        // RateComponentList no tiene caso de notificacion vacia en esta
        // implementacion: una suscripcion siempre observa un tariff_id
        // concreto, nunca el listado global de tarifas.
        return;
    }

    let page_size = clamp_page_size(sub.entity_limit);
    let pages = get_entity_pages(ResourceType::TariffGeneratedRate, &matched, page_size);
    for (prt, page) in fan_out_tariff_generated_rate_pages(&pages) {
        enqueue_rate_page(state, sub, tariff_id, site_id, day, prt, &page);
    }
}

fn enqueue_rate_page(
    state: &AppState,
    sub: &Subscription,
    tariff_id: i64,
    site_id: i64,
    day: NaiveDate,
    prt: PricingReadingType,
    page: &[TariffGeneratedRate],
) {
    let href_prefix = state.href_prefix().unwrap_or_default();
    let mut intervals = Vec::with_capacity(page.len());
    for rate in page {
        let id = match encode_time_tariff_interval_id(rate.tariff_generated_rate_id as u64, prt.ordinal()) {
            Ok(id) => id,
            Err(fault) => {
                warn!("⚠️ [NOTIFY_MRID_FAULT]: {}", fault);
                continue;
            }
        };
        let mrid = match encode_mrid(MridType::TimeTariffInterval, id, state.iana_pen()) {
            Ok(mrid) => mrid,
            Err(fault) => {
                warn!("⚠️ [NOTIFY_MRID_FAULT]: {}", fault);
                continue;
            }
        };
        intervals.push(TimeTariffIntervalDto::from_rate(&href_prefix, mrid, tariff_id, site_id, rate, prt));
    }
    let subscribed_resource = format!(
        "{href_prefix}/edev/{site_id}/tp/{tariff_id}/rc/{day}/{}/tti",
        prt.ordinal()
    );
    let resource = TimeTariffIntervalListDto {
        href: subscribed_resource.clone(),
        all: intervals.len() as i64,
        results: intervals.len() as i64,
        intervals,
    };
    let subscription_uri =
        sep2_domain_href::calculate_subscription_href(&href_prefix, sub.scoped_site_id, sub.subscription_id);
    let notification = NotificationDto {
        subscribed_resource,
        subscription_uri,
        status: 1,
        resource,
    };
    enqueue(state, sub, quick_xml::se::to_string(&notification).ok());
}

/// `check_db_change_or_delete(SITE, T)` restringido al disparo que
/// `ConfigManager.update_current_config` produce: un cambio en
/// `edevl_pollrate_seconds` no afecta ninguna fila de `sites`, pero si
/// cambia la metadata de la lista `EndDeviceList` que observan las
/// suscripciones sin `resource_id`/`scoped_site_id`. `fsal_pollrate_seconds`
/// no tiene contraparte: esta implementacion no reconoce una plantilla de
/// suscripcion para `FunctionSetAssignments` (ver `sep2_domain_href`), asi
/// que ese cambio nunca tiene un suscriptor que notificar.
#[instrument(skip(state, previous, current))]
pub async fn notify_runtime_config_change(
    state: &AppState,
    previous: &RuntimeServerConfig,
    current: &RuntimeServerConfig,
) -> Result<(), sep2_infra_db::DbError> {
    if previous.edevl_pollrate_seconds == current.edevl_pollrate_seconds {
        return Ok(());
    }
    let href_prefix = state.href_prefix().unwrap_or_default();
    for aggregator_id in state.aggregator_repository.list_all_aggregator_ids().await? {
        let subs = state
            .subscription_repository
            .list_subscriptions_for_resource(aggregator_id, SubscriptionResource::EndDeviceList)
            .await?;
        for sub in &subs {
            let subscribed_resource = format!("{href_prefix}/edev");
            let resource = EndDeviceListDto {
                href: subscribed_resource.clone(),
                all: 0,
                results: 0,
                end_devices: Vec::new(),
            };
            let subscription_uri = sep2_domain_href::calculate_subscription_href(
                &href_prefix,
                sub.scoped_site_id,
                sub.subscription_id,
            );
            let notification = NotificationDto {
                subscribed_resource,
                subscription_uri,
                status: 1,
                resource,
            };
            enqueue(state, sub, quick_xml::se::to_string(&notification).ok());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sep2_domain_pricing::ALL_PRICING_READING_TYPES;

    #[test]
    fn all_pricing_reading_types_are_covered_by_the_fanout() {
        // Regresion contra el escenario S3: dos tasas en un dia deben
        // producir 2 * 4 = 8 tareas, nunca menos.
        assert_eq!(ALL_PRICING_READING_TYPES.len(), 4);
    }
}
// FIN DEL ARCHIVO [apps/server/src/notify_batch.rs]
