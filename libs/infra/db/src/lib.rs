// INICIO DEL ARCHIVO [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PERSISTENCE ROOT (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PUNTO DE ENTRADA UNICO DEL ADAPTADOR LIBSQL
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;
pub(crate) mod time;

pub use client::DbClient;
pub use errors::DbError;
pub use repositories::{
    AggregatorRepository, CertificateRepository, ConfigRepository, DoeRepository,
    ReadingRepository, SiteRepository, SubscriptionRepository, TariffRepository,
};
// FIN DEL ARCHIVO [libs/infra/db/src/lib.rs]
