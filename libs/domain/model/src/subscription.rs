// INICIO DEL ARCHIVO [libs/domain/model/src/subscription.rs]
//! Suscripciones de notificacion y sus condiciones de filtrado.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tipo de recurso que una suscripcion observa. Determina la plantilla
/// de href usada para componer `subscribedResource` en las respuestas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionResource {
    EndDeviceList,
    EndDevice,
    DerControlList,
    ReadingList,
    RateComponentList,
}

/// Atributo de entidad sobre el cual se aplica un umbral de condicion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionAttribute {
    ReadingValue,
}

/// `{attribute, lower_threshold, upper_threshold}`. Para `ReadingValue`
/// una lectura coincide si su valor cae **fuera** de `[lower, upper]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionCondition {
    pub attribute: ConditionAttribute,
    pub lower_threshold: Option<i64>,
    pub upper_threshold: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: i64,
    pub aggregator_id: i64,
    pub resource_type: SubscriptionResource,
    pub resource_id: Option<i64>,
    pub scoped_site_id: Option<i64>,
    pub notification_uri: String,
    pub entity_limit: i64,
    pub changed_time: DateTime<Utc>,
    /// El esquema solo permite una condicion por suscripcion.
    pub condition: Option<SubscriptionCondition>,
}
// FIN DEL ARCHIVO [libs/domain/model/src/subscription.rs]
