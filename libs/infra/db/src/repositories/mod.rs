// INICIO DEL ARCHIVO [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 * =================================================================
 */

// --- ESTRATO 1: IDENTIDAD Y CREDENCIALES ---

/// Resolucion de certificados LFDI y allowlist de dominios del agregador.
pub mod certificate;

// --- ESTRATO 2: RECURSOS DEL DISPOSITIVO ---

/// CRUD de sitios (end devices) y sus sub-recursos DER.
pub mod site;
/// CRUD de MirrorUsagePoint y sus lecturas por lote.
pub mod reading;

// --- ESTRATO 3: CONTROL Y TARIFICACIÓN ---

/// Envolturas/supersesion de DOE y paginacion de grupos de control.
pub mod doe;
/// Arboles de tarifa y lectura de tasas generadas.
pub mod tariff;

// --- ESTRATO 4: NOTIFICACIÓN ---

/// Suscripciones y lotes de entidades notificables.
pub mod subscription;

// --- ESTRATO 5: GOBERNANZA ---

/// Configuracion runtime singleton.
pub mod config;
/// Escritor de archivo generico (copia/borrado parametrizado por tabla).
pub mod archival;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS API) ---

pub use certificate::{AggregatorRepository, CertificateRepository};
pub use config::ConfigRepository;
pub use doe::DoeRepository;
pub use reading::ReadingRepository;
pub use site::SiteRepository;
pub use subscription::SubscriptionRepository;
pub use tariff::TariffRepository;
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/mod.rs]
