// INICIO DEL ARCHIVO [libs/domain/model/src/der.rs]
//! Sub-registros DER del EndDevice: capacidad nominal, disponibilidad en
//! tiempo real, ajustes de configuracion y estado operativo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Capacidad nominal placa-de-fabrica del recurso DER de un Site (1:1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDERRating {
    pub site_der_rating_id: i64,
    pub site_id: i64,
    pub modes_supported: i64,
    pub max_w: i64,
    pub max_var: i64,
    pub changed_time: DateTime<Utc>,
}

/// Disponibilidad de corto plazo reportada por el recurso (1:1, mutable
/// con alta frecuencia de escritura).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDERAvailability {
    pub site_der_availability_id: i64,
    pub site_id: i64,
    pub available_w: Option<i64>,
    pub reading_time: DateTime<Utc>,
    pub changed_time: DateTime<Utc>,
}

/// Ajustes de configuracion locales del recurso (1:1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDERSetting {
    pub site_der_setting_id: i64,
    pub site_id: i64,
    pub modes_enabled: i64,
    pub grad_w: Option<i64>,
    pub changed_time: DateTime<Utc>,
}

/// Estado operativo instantaneo del recurso (1:1, mutable con alta
/// frecuencia de escritura).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDERStatus {
    pub site_der_status_id: i64,
    pub site_id: i64,
    pub operational_mode_status: Option<i64>,
    pub generator_connect_status: Option<i64>,
    pub changed_time: DateTime<Utc>,
}
// FIN DEL ARCHIVO [libs/domain/model/src/der.rs]
