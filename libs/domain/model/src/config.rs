// INICIO DEL ARCHIVO [libs/domain/model/src/config.rs]
//! Configuracion en tiempo de ejecucion, fila unica opcional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fila unica de configuracion. Su ausencia en la base de datos equivale
/// a usar todos los valores por omision de compilacion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeServerConfig {
    pub id: i64,
    pub dcap_pollrate_seconds: i64,
    pub edevl_pollrate_seconds: i64,
    pub fsal_pollrate_seconds: i64,
    pub derpl_pollrate_seconds: i64,
    pub site_control_pow10_encoding: i64,
    pub disable_edev_registration: bool,
    pub changed_time: DateTime<Utc>,
}

impl Default for RuntimeServerConfig {
    fn default() -> Self {
        Self {
            id: 1,
            dcap_pollrate_seconds: 300,
            edevl_pollrate_seconds: 300,
            fsal_pollrate_seconds: 300,
            derpl_pollrate_seconds: 300,
            site_control_pow10_encoding: -4,
            disable_edev_registration: false,
            changed_time: Utc::now(),
        }
    }
}
// FIN DEL ARCHIVO [libs/domain/model/src/config.rs]
