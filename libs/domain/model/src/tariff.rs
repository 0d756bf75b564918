// INICIO DEL ARCHIVO [libs/domain/model/src/tariff.rs]
//! Tarifas y sus tasas generadas (la hoja del arbol virtual de 4 niveles
//! TariffProfile -> RateComponent -> TimeTariffInterval -> ConsumptionTariffInterval).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tariff {
    pub tariff_id: i64,
    pub aggregator_id: i64,
    pub dnsp_code: String,
    pub currency_code: i64,
    pub changed_time: DateTime<Utc>,
}

/// Una tasa de energia concreta para un `(tariff, site, day, time)`.
/// El multiplicador de precio es siempre `-4` (`pricePowerOfTenMultiplier`).
/// Las cuatro columnas de precio respaldan los cuatro `PricingReadingType`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffGeneratedRate {
    pub tariff_generated_rate_id: i64,
    pub tariff_id: i64,
    pub site_id: i64,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_seconds: i64,
    pub import_active_price: Option<i64>,
    pub export_active_price: Option<i64>,
    pub import_reactive_price: Option<i64>,
    pub export_reactive_price: Option<i64>,
    pub changed_time: DateTime<Utc>,
}
// FIN DEL ARCHIVO [libs/domain/model/src/tariff.rs]
