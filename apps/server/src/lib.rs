// INICIO DEL ARCHIVO [apps/server/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SERVER LIBRARY ROOT (V1.0)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DEL SERVIDOR
 * =================================================================
 */

/// Motor de validación de integridad post-despliegue.
pub mod bootstrap;
/// Adaptadores de entrada para ráfagas HTTP (2030.5 y admin).
pub mod handlers;
/// Núcleo de mando y control para la ignición de servicios.
pub mod kernel;
/// Guardianes perimetrales de salud y autenticación.
pub mod middleware;
/// Agrupador y despachador de notificaciones de suscripción.
pub mod notify_batch;
/// El túnel de mando: definición de rutas y topología de red.
pub mod routes;
/// Gestor del estado compartido del servidor.
pub mod state;
/// Catálogo de errores HTTP y su traducción a códigos de estado.
pub mod web_error;

pub mod prelude {
    pub use crate::kernel::ServerKernel;
    pub use crate::state::{AppState, SystemMode};
}
// FIN DEL ARCHIVO [apps/server/src/lib.rs]
