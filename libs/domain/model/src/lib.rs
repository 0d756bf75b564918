// INICIO DEL ARCHIVO [libs/domain/model/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODEL ROOT (V1.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DE LAS ENTIDADES RELACIONALES SEP2
 *
 * Toda entidad mutable aqui declarada tiene una sombra de archivo
 * equivalente en el modulo `archive` (mismas columnas mas
 * archive_id/archive_time/deleted_time, sin claves foraneas).
 * =================================================================
 */

pub mod aggregator;
pub mod archive;
pub mod config;
pub mod der;
pub mod reading;
pub mod site;
pub mod site_control;
pub mod subscription;
pub mod tariff;

pub use aggregator::{Aggregator, Certificate, NULL_AGGREGATOR_ID};
pub use config::RuntimeServerConfig;
pub use der::{SiteDERAvailability, SiteDERRating, SiteDERSetting, SiteDERStatus};
pub use reading::{SiteReading, SiteReadingType};
pub use site::{Site, VIRTUAL_END_DEVICE_SITE_ID};
pub use site_control::{DefaultSiteControl, DynamicOperatingEnvelope, SiteControlGroup};
pub use subscription::{ConditionAttribute, Subscription, SubscriptionCondition, SubscriptionResource};
pub use tariff::{Tariff, TariffGeneratedRate};
// FIN DEL ARCHIVO [libs/domain/model/src/lib.rs]
