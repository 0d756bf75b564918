// INICIO DEL ARCHIVO [libs/domain/subscription/src/lib.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION BATCHER (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: AGRUPAR CAMBIOS POR BATCH KEY Y FILTRARLOS CONTRA
 *                  SUSCRIPCIONES ACTIVAS
 *
 * Punto de entrada conceptual: `check_db_change_or_delete(resource, ts)`.
 * Esta caja implementa el paso 2-3 (agrupar, cachear suscripciones,
 * filtrar y paginar); la serializacion XML y el envio viven en capas
 * superiores (infra/notify, apps/server).
 * =================================================================
 */

use chrono::NaiveDate;
use sep2_domain_model::{ConditionAttribute, Subscription, SubscriptionResource};
use sep2_domain_pricing::{PricingReadingType, ALL_PRICING_READING_TYPES};

pub const MAX_NOTIFICATION_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Site,
    DynamicOperatingEnvelope,
    TariffGeneratedRate,
    Reading,
    SiteDerAvailability,
    SiteDerRating,
    SiteDerSetting,
    SiteDerStatus,
    FunctionSetAssignments,
    DefaultSiteControl,
    SiteControlGroup,
}

/// Recursos que en 2030.5 no son listas: cada entidad es su propia
/// notificacion singleton en lugar de una pagina de una lista.
pub fn is_non_list_resource(resource_type: ResourceType) -> bool {
    matches!(
        resource_type,
        ResourceType::SiteDerAvailability
            | ResourceType::SiteDerRating
            | ResourceType::SiteDerSetting
            | ResourceType::SiteDerStatus
            | ResourceType::DefaultSiteControl
    )
}

/// El recurso de lista que observa una suscripcion sobre `resource_type`,
/// si existe uno (usado para la notificacion de metadata vacia).
fn subscribed_list_resource(resource_type: ResourceType) -> Option<SubscriptionResource> {
    match resource_type {
        ResourceType::Site => Some(SubscriptionResource::EndDeviceList),
        ResourceType::DynamicOperatingEnvelope => Some(SubscriptionResource::DerControlList),
        ResourceType::Reading => Some(SubscriptionResource::ReadingList),
        ResourceType::TariffGeneratedRate => Some(SubscriptionResource::RateComponentList),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Changed,
    Deleted,
}

/// Batch key resource-especifica. Siempre comienza con `aggregator_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BatchKey {
    Site {
        aggregator_id: i64,
    },
    DynamicOperatingEnvelope {
        aggregator_id: i64,
        site_id: i64,
        site_control_group_id: i64,
    },
    TariffGeneratedRate {
        aggregator_id: i64,
        tariff_id: i64,
        site_id: i64,
        day: NaiveDate,
    },
    Reading {
        aggregator_id: i64,
        site_id: i64,
        site_reading_type_id: i64,
    },
    SiteDer {
        aggregator_id: i64,
        site_id: i64,
        site_der_id: i64,
    },
    FunctionSetAssignments {
        aggregator_id: i64,
        site_id: i64,
    },
    DefaultSiteControl {
        aggregator_id: i64,
        site_id: i64,
        site_control_group_id: i64,
    },
    SiteControlGroup {
        aggregator_id: i64,
        site_control_group_id: i64,
    },
}

impl BatchKey {
    pub fn aggregator_id(&self) -> i64 {
        match self {
            BatchKey::Site { aggregator_id }
            | BatchKey::DynamicOperatingEnvelope { aggregator_id, .. }
            | BatchKey::TariffGeneratedRate { aggregator_id, .. }
            | BatchKey::Reading { aggregator_id, .. }
            | BatchKey::SiteDer { aggregator_id, .. }
            | BatchKey::FunctionSetAssignments { aggregator_id, .. }
            | BatchKey::DefaultSiteControl { aggregator_id, .. }
            | BatchKey::SiteControlGroup { aggregator_id, .. } => *aggregator_id,
        }
    }
}

/// `page_size = clamp(sub.entity_limit, 1, MAX_NOTIFICATION_PAGE_SIZE)`.
pub fn clamp_page_size(entity_limit: i64) -> i64 {
    entity_limit.clamp(1, MAX_NOTIFICATION_PAGE_SIZE)
}

/// Descripcion minima que una entidad debe exponer para ser evaluada
/// contra una suscripcion, independiente de su tipo concreto.
pub trait NotifiableEntity {
    fn subscription_filter_id(&self) -> Option<i64>;
    fn site_id(&self) -> Option<i64>;
    /// Solo `Some` para entidades READING; usado por la condicion
    /// `READING_VALUE`.
    fn reading_value(&self) -> Option<i64> {
        None
    }
}

fn is_outside_threshold(value: i64, lower: Option<i64>, upper: Option<i64>) -> bool {
    match (lower, upper) {
        (Some(lower), Some(upper)) => value < lower || value > upper,
        (Some(lower), None) => value < lower,
        (None, Some(upper)) => value > upper,
        (None, None) => true,
    }
}

/// `entities_serviced_by_subscription`: filtra una entidad contra una
/// suscripcion ya confirmada de mismo `resource_type`.
pub fn matches_subscription<E: NotifiableEntity>(sub: &Subscription, entity: &E) -> bool {
    if let Some(resource_id) = sub.resource_id {
        if entity.subscription_filter_id() != Some(resource_id) {
            return false;
        }
    }
    if let Some(scoped_site_id) = sub.scoped_site_id {
        if entity.site_id() != Some(scoped_site_id) {
            return false;
        }
    }
    if let Some(condition) = &sub.condition {
        if condition.attribute == ConditionAttribute::ReadingValue {
            if let Some(value) = entity.reading_value() {
                if !is_outside_threshold(value, condition.lower_threshold, condition.upper_threshold)
                {
                    return false;
                }
            }
        }
    }
    true
}

/// Verdadero cuando la lista filtrada esta vacia pero la suscripcion
/// observa directamente el recurso de lista cuya metadata cambio.
pub fn emits_empty_payload_notification(resource_type: ResourceType, sub: &Subscription) -> bool {
    subscribed_list_resource(resource_type) == Some(sub.resource_type)
}

fn chunk_entities<T: Clone>(entities: &[T], page_size: i64) -> Vec<Vec<T>> {
    if entities.is_empty() {
        return Vec::new();
    }
    entities
        .chunks(page_size.max(1) as usize)
        .map(<[T]>::to_vec)
        .collect()
}

/// `get_entity_pages`: recursos no-lista se vuelven notificaciones
/// singleton; el resto se fragmenta en paginas de `page_size`.
pub fn get_entity_pages<T: Clone>(
    resource_type: ResourceType,
    entities: &[T],
    page_size: i64,
) -> Vec<Vec<T>> {
    if is_non_list_resource(resource_type) {
        entities.iter().cloned().map(|entity| vec![entity]).collect()
    } else {
        chunk_entities(entities, page_size)
    }
}

/// Abanico especial de TARIFF_GENERATED_RATE: cada pagina se replica una
/// vez por cada uno de los cuatro PricingReadingType.
pub fn fan_out_tariff_generated_rate_pages<T: Clone>(
    pages: &[Vec<T>],
) -> Vec<(PricingReadingType, Vec<T>)> {
    let mut fanned = Vec::with_capacity(pages.len() * ALL_PRICING_READING_TYPES.len());
    for page in pages {
        for prt in ALL_PRICING_READING_TYPES {
            fanned.push((prt, page.clone()));
        }
    }
    fanned
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sep2_domain_model::SubscriptionCondition;

    struct FakeReading {
        filter_id: i64,
        site_id: i64,
        value: i64,
    }

    impl NotifiableEntity for FakeReading {
        fn subscription_filter_id(&self) -> Option<i64> {
            Some(self.filter_id)
        }
        fn site_id(&self) -> Option<i64> {
            Some(self.site_id)
        }
        fn reading_value(&self) -> Option<i64> {
            Some(self.value)
        }
    }

    fn base_subscription() -> Subscription {
        Subscription {
            subscription_id: 1,
            aggregator_id: 1,
            resource_type: SubscriptionResource::ReadingList,
            resource_id: None,
            scoped_site_id: None,
            notification_uri: "https://example.test/cb".into(),
            entity_limit: 50,
            changed_time: Utc::now(),
            condition: None,
        }
    }

    #[test]
    fn clamps_to_the_notification_ceiling() {
        assert_eq!(clamp_page_size(0), 1);
        assert_eq!(clamp_page_size(1_000), MAX_NOTIFICATION_PAGE_SIZE);
        assert_eq!(clamp_page_size(40), 40);
    }

    #[test]
    fn scoped_site_filters_out_other_sites() {
        let mut sub = base_subscription();
        sub.scoped_site_id = Some(7);
        let in_scope = FakeReading {
            filter_id: 1,
            site_id: 7,
            value: 10,
        };
        let out_of_scope = FakeReading {
            filter_id: 1,
            site_id: 8,
            value: 10,
        };
        assert!(matches_subscription(&sub, &in_scope));
        assert!(!matches_subscription(&sub, &out_of_scope));
    }

    #[test]
    fn reading_value_condition_keeps_only_out_of_range() {
        let mut sub = base_subscription();
        sub.condition = Some(SubscriptionCondition {
            attribute: ConditionAttribute::ReadingValue,
            lower_threshold: Some(10),
            upper_threshold: Some(20),
        });
        let low = FakeReading {
            filter_id: 1,
            site_id: 1,
            value: 5,
        };
        let inside = FakeReading {
            filter_id: 1,
            site_id: 1,
            value: 15,
        };
        let high = FakeReading {
            filter_id: 1,
            site_id: 1,
            value: 25,
        };
        assert!(matches_subscription(&sub, &low));
        assert!(!matches_subscription(&sub, &inside));
        assert!(matches_subscription(&sub, &high));
    }

    #[test]
    fn non_list_resources_become_singleton_pages() {
        let entities = vec![1, 2, 3];
        let pages = get_entity_pages(ResourceType::SiteDerStatus, &entities, 50);
        assert_eq!(pages, vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn list_resources_are_chunked_by_page_size() {
        let entities = vec![1, 2, 3, 4, 5];
        let pages = get_entity_pages(ResourceType::Reading, &entities, 2);
        assert_eq!(pages, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn tariff_generated_rate_fans_out_four_times() {
        let pages = vec![vec![1, 2]];
        let fanned = fan_out_tariff_generated_rate_pages(&pages);
        assert_eq!(fanned.len(), 4);
    }

    #[test]
    fn empty_match_on_subscribed_list_emits_metadata_notification() {
        let sub = base_subscription();
        assert!(emits_empty_payload_notification(
            ResourceType::Reading,
            &sub
        ));
        assert!(!emits_empty_payload_notification(ResourceType::Site, &sub));
    }
}
// FIN DEL ARCHIVO [libs/domain/subscription/src/lib.rs]
