// INICIO DEL ARCHIVO [libs/domain/model/src/reading.rs]
//! Tipos y lecturas de medicion expuestos bajo `/upt` (MirrorUsagePoint).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteReadingType {
    pub site_reading_type_id: i64,
    pub site_id: i64,
    pub uom: i64,
    pub data_qualifier: i64,
    pub flow_direction: i64,
    pub changed_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteReading {
    pub site_reading_id: i64,
    pub site_reading_type_id: i64,
    pub time_period_start: DateTime<Utc>,
    pub time_period_seconds: i64,
    pub value: i64,
    pub changed_time: DateTime<Utc>,
}
// FIN DEL ARCHIVO [libs/domain/model/src/reading.rs]
