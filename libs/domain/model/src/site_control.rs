// INICIO DEL ARCHIVO [libs/domain/model/src/site_control.rs]
//! Grupos de control, envolventes dinamicas de operacion (DOE) y el
//! control por omision aplicado cuando ninguna DOE esta activa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agrupa un conjunto de DOE bajo una primacia comun. El Grupo 1 es
/// implicito y nunca se materializa como fila: su primacia es siempre 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteControlGroup {
    pub site_control_group_id: i64,
    pub aggregator_id: i64,
    pub description: String,
    pub primacy: i64,
    pub changed_time: DateTime<Utc>,
}

/// Una envolvente dinamica de operacion: limites de exportacion/
/// importacion vigentes en una ventana temporal para un Site, dentro de
/// un SiteControlGroup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicOperatingEnvelope {
    pub dynamic_operating_envelope_id: i64,
    pub site_control_group_id: i64,
    pub site_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub import_limit_active_watts: Option<f64>,
    pub export_limit_watts: Option<f64>,
    pub changed_time: DateTime<Utc>,
}

/// Limites por omision aplicados a un Site cuando ninguna DOE cubre el
/// instante de consulta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultSiteControl {
    pub default_site_control_id: i64,
    pub site_control_group_id: i64,
    pub site_id: i64,
    pub import_limit_active_watts: Option<f64>,
    pub export_limit_watts: Option<f64>,
    pub changed_time: DateTime<Utc>,
}
// FIN DEL ARCHIVO [libs/domain/model/src/site_control.rs]
