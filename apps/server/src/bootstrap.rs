// INICIO DEL ARCHIVO [apps/server/src/bootstrap.rs]
/*!
 * =================================================================
 * APARATO: ASYNC SYSTEM BOOTSTRAP (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CERTIFICACIÓN DE INTEGRIDAD PRE-OPERATIVA
 *
 * A diferencia del bootstrap original (que auditaba fragmentos binarios
 * del censo UTXO), este servidor no tiene activos binarios que verificar:
 * la unica precondicion de arranque es que la configuracion de runtime
 * sea legible desde la base de datos. Se mantiene el patron asincrono
 * de "levantar en background, flip a Operational al terminar" porque
 * la carga de configuracion no debe bloquear el bind del socket TCP.
 * =================================================================
 */

use crate::state::{AppState, SystemMode};
use tracing::{error, info, instrument};

pub struct Bootstrap;

impl Bootstrap {
    /// Lanza la secuencia de certificación de integridad asíncrona.
    #[instrument(skip(application_shared_state))]
    pub fn spawn_diagnostics(application_shared_state: AppState) {
        tokio::spawn(async move {
            info!("🩺 [BOOTSTRAP]: Verifying runtime configuration readiness...");

            match application_shared_state.reload_runtime_config().await {
                Ok(()) => {
                    info!("✅ [BOOTSTRAP]: Runtime configuration loaded. Operational mode authorized.");
                    application_shared_state.set_mode(SystemMode::Operational);
                }
                Err(fault) => {
                    let diagnostic = format!("CONFIG_LOAD_FAULT: {fault}");
                    error!("❌ {}", diagnostic);
                    application_shared_state.set_mode(SystemMode::Maintenance(diagnostic));
                }
            }
        });
    }
}
// FIN DEL ARCHIVO [apps/server/src/bootstrap.rs]
