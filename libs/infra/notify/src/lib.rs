// INICIO DEL ARCHIVO [libs/infra/notify/src/lib.rs]
/*!
 * =================================================================
 * APARATO: NOTIFY LIBRARY BARREL (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LIB (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN PÚBLICA DEL CLIENTE DE NOTIFICACIÓN
 * =================================================================
 */

pub mod client;
pub mod errors;

pub use client::NotifyClient;
pub use errors::NotifyError;
// FIN DEL ARCHIVO [libs/infra/notify/src/lib.rs]
