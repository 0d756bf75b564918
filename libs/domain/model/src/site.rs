// INICIO DEL ARCHIVO [libs/domain/model/src/site.rs]
//! EndDevice facturable: un sitio fisico con recursos DER asociados.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Site id virtual reservado para el EndDevice sintetico que representa
/// al propio agregador quien presenta el certificado de dispositivo.
pub const VIRTUAL_END_DEVICE_SITE_ID: i64 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub site_id: i64,
    pub aggregator_id: i64,
    pub lfdi: String,
    pub sfdi: i64,
    pub device_category: i64,
    pub nmi: Option<String>,
    pub timezone_id: String,
    pub changed_time: DateTime<Utc>,
}
// FIN DEL ARCHIVO [libs/domain/model/src/site.rs]
