// INICIO DEL ARCHIVO [libs/domain/pricing/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TARIFF / RATE ENGINE (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ARBOL VIRTUAL DE TARIFAS, PAGINACION Y LOCALIZACIÓN
 *
 * 2030.5 expone un arbol de 4 niveles (TariffProfile -> RateComponent ->
 * TimeTariffInterval -> ConsumptionTariffInterval) sobre un almacen plano
 * de filas TariffGeneratedRate. RateComponent y ConsumptionTariffInterval
 * son enteramente virtuales.
 * =================================================================
 */

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use sep2_domain_model::TariffGeneratedRate;
use thiserror::Error;

pub const TOTAL_PRICING_READING_TYPES: i64 = 4;
pub const PRICE_DECIMAL_PLACES: i32 = 4;
pub const PRICE_POWER_OF_TEN_MULTIPLIER: i32 = -PRICE_DECIMAL_PLACES;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("[PRICING_INVALID_PRT]: ordinal must be in 1..=4, got {0}")]
    InvalidPricingReadingType(u8),
    #[error("[PRICING_UNKNOWN_TIMEZONE]: '{0}' is not a recognised IANA timezone")]
    UnknownTimezone(String),
    #[error("[PRICING_INVALID_TTI_ID]: '{0}' is not a strict HH:MM time")]
    InvalidTimeTariffIntervalId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingReadingType {
    ImportActiveKwh = 1,
    ExportActiveKwh = 2,
    ImportReactiveKvarh = 3,
    ExportReactiveKvarh = 4,
}

pub const ALL_PRICING_READING_TYPES: [PricingReadingType; 4] = [
    PricingReadingType::ImportActiveKwh,
    PricingReadingType::ExportActiveKwh,
    PricingReadingType::ImportReactiveKvarh,
    PricingReadingType::ExportReactiveKvarh,
];

impl PricingReadingType {
    pub fn from_ordinal(ordinal: u8) -> Result<Self, PricingError> {
        Ok(match ordinal {
            1 => PricingReadingType::ImportActiveKwh,
            2 => PricingReadingType::ExportActiveKwh,
            3 => PricingReadingType::ImportReactiveKvarh,
            4 => PricingReadingType::ExportReactiveKvarh,
            other => return Err(PricingError::InvalidPricingReadingType(other)),
        })
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// Selecciona la columna decimal apropiada de una tasa para el tipo de
/// lectura de precio dado.
pub fn extract_price(prt: PricingReadingType, rate: &TariffGeneratedRate) -> Option<i64> {
    match prt {
        PricingReadingType::ImportActiveKwh => rate.import_active_price,
        PricingReadingType::ExportActiveKwh => rate.export_active_price,
        PricingReadingType::ImportReactiveKvarh => rate.import_reactive_price,
        PricingReadingType::ExportReactiveKvarh => rate.export_reactive_price,
    }
}

/// El precio entero de un ConsumptionTariffInterval, codificable en su
/// href sin necesidad de consultar la base de datos.
pub fn consumption_tariff_interval_price(price: i64) -> i64 {
    price * 10_000
}

/// Primera fase de la paginacion del fanout RateComponent: convierte un
/// `(start, limit)` sobre RateComponents en un `(start, limit)` sobre dias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateComponentFetchPlan {
    pub db_adjusted_start: i64,
    pub db_adjusted_start_remainder: i64,
    pub db_adjusted_limit: i64,
    pub db_adjusted_limit_remainder: i64,
}

pub fn plan_rate_component_fetch(start: i64, limit: i64) -> RateComponentFetchPlan {
    let db_adjusted_start = start.div_euclid(TOTAL_PRICING_READING_TYPES);
    let db_adjusted_start_remainder = start.rem_euclid(TOTAL_PRICING_READING_TYPES);

    let sum = db_adjusted_start_remainder + limit;
    let mut db_adjusted_limit = sum.div_euclid(TOTAL_PRICING_READING_TYPES);
    let db_adjusted_limit_remainder = sum.rem_euclid(TOTAL_PRICING_READING_TYPES);
    if db_adjusted_limit_remainder > 0 {
        db_adjusted_limit += 1;
    }

    RateComponentFetchPlan {
        db_adjusted_start,
        db_adjusted_start_remainder,
        db_adjusted_limit,
        db_adjusted_limit_remainder,
    }
}

/// Segunda fase: una vez obtenidos `fetched_day_count` dias reales,
/// calcula cuantos elementos recortar del producto `(dia x prt)` aplanado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateComponentTrimPlan {
    pub leading_items_to_remove: i64,
    pub trailing_items_to_remove: i64,
}

pub fn plan_rate_component_trim(
    plan: &RateComponentFetchPlan,
    limit: i64,
    fetched_day_count: i64,
) -> RateComponentTrimPlan {
    let leading_items_to_remove = plan.db_adjusted_start_remainder;
    let mut trailing_items_to_remove = 0;
    if (limit + leading_items_to_remove) < (fetched_day_count * TOTAL_PRICING_READING_TYPES) {
        trailing_items_to_remove =
            (TOTAL_PRICING_READING_TYPES - plan.db_adjusted_limit_remainder)
                % TOTAL_PRICING_READING_TYPES;
    }
    RateComponentTrimPlan {
        leading_items_to_remove,
        trailing_items_to_remove,
    }
}

/// Aplana el producto `dia x prt` (dias afuera, prt adentro, en ese
/// orden de anidamiento) y recorta cabeza/cola segun el plan de trim.
pub fn flatten_and_trim<D: Clone>(
    days: &[D],
    trim: &RateComponentTrimPlan,
) -> Vec<(D, PricingReadingType)> {
    let mut flattened: Vec<(D, PricingReadingType)> = Vec::with_capacity(days.len() * 4);
    for day in days {
        for prt in ALL_PRICING_READING_TYPES {
            flattened.push((day.clone(), prt));
        }
    }
    let lead = trim.leading_items_to_remove.max(0) as usize;
    let trail = trim.trailing_items_to_remove.max(0) as usize;
    let end = flattened.len().saturating_sub(trail);
    if lead >= end {
        return Vec::new();
    }
    flattened[lead..end].to_vec()
}

/// El dia calendario de `start_time` en la zona local del Site, calculado
/// aqui como conversion post-fetch (el driver relacional usado no expone
/// una funcion `timezone()` del lado del servidor).
pub fn localize_rate_start(
    utc_start: DateTime<Utc>,
    timezone_id: &str,
) -> Result<(NaiveDate, NaiveTime), PricingError> {
    let tz = Tz::from_str(timezone_id)
        .map_err(|_| PricingError::UnknownTimezone(timezone_id.to_string()))?;
    let local = utc_start.with_timezone(&tz);
    Ok((local.date_naive(), local.time()))
}

/// Valida y parsea estrictamente un id de TimeTariffInterval: exactamente
/// dos digitos, dos puntos, dos digitos, `00<=HH<=23`, `00<=MM<=59`.
pub fn parse_time_tariff_interval_id(id: &str) -> Result<NaiveTime, PricingError> {
    let bytes = id.as_bytes();
    let malformed = || PricingError::InvalidTimeTariffIntervalId(id.to_string());

    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(malformed());
    }
    if !bytes[0].is_ascii_digit()
        || !bytes[1].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
        || !bytes[4].is_ascii_digit()
    {
        return Err(malformed());
    }

    let hour: u32 = id[0..2].parse().map_err(|_| malformed())?;
    let minute: u32 = id[3..5].parse().map_err(|_| malformed())?;
    if hour > 23 || minute > 59 {
        return Err(malformed());
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_matching_price_column() {
        let rate = TariffGeneratedRate {
            tariff_generated_rate_id: 1,
            tariff_id: 1,
            site_id: 1,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            duration_seconds: 1800,
            import_active_price: Some(123),
            export_active_price: Some(456),
            import_reactive_price: Some(789),
            export_reactive_price: Some(1011),
            changed_time: Utc::now(),
        };
        assert_eq!(
            extract_price(PricingReadingType::ImportActiveKwh, &rate),
            Some(123)
        );
        assert_eq!(
            extract_price(PricingReadingType::ExportReactiveKvarh, &rate),
            Some(1011)
        );
    }

    #[test]
    fn aligned_page_needs_no_trim() {
        let plan = plan_rate_component_fetch(0, 8);
        assert_eq!(plan.db_adjusted_start, 0);
        assert_eq!(plan.db_adjusted_limit, 2);
        let trim = plan_rate_component_trim(&plan, 8, 2);
        assert_eq!(trim.leading_items_to_remove, 0);
        assert_eq!(trim.trailing_items_to_remove, 0);
    }

    #[test]
    fn misaligned_page_trims_head_and_tail() {
        // start=2 asks for the 3rd RateComponent onward; limit=5 spans a
        // partial day on both ends.
        let plan = plan_rate_component_fetch(2, 5);
        assert_eq!(plan.db_adjusted_start, 0);
        assert_eq!(plan.db_adjusted_start_remainder, 2);
        assert_eq!(plan.db_adjusted_limit, 2);
        let trim = plan_rate_component_trim(&plan, 5, 2);
        assert_eq!(trim.leading_items_to_remove, 2);
        assert_eq!(trim.trailing_items_to_remove, 1);

        let days = vec!["2023-01-01", "2023-01-02"];
        let page = flatten_and_trim(&days, &trim);
        assert_eq!(page.len(), 5);
        assert_eq!(page[0], ("2023-01-01", PricingReadingType::ImportReactiveKvarh));
    }

    #[test]
    fn trailing_page_at_end_of_data_is_not_over_trimmed() {
        let plan = plan_rate_component_fetch(6, 100);
        let trim = plan_rate_component_trim(&plan, 100, 1);
        assert_eq!(trim.trailing_items_to_remove, 0);
    }

    #[test]
    fn strict_hhmm_validation() {
        assert!(parse_time_tariff_interval_id("00:00").is_ok());
        assert!(parse_time_tariff_interval_id("23:59").is_ok());
        assert!(parse_time_tariff_interval_id("24:00").is_err());
        assert!(parse_time_tariff_interval_id("9:00").is_err());
        assert!(parse_time_tariff_interval_id("09-00").is_err());
        assert!(parse_time_tariff_interval_id("09:60").is_err());
    }
}
// FIN DEL ARCHIVO [libs/domain/pricing/src/lib.rs]
