// INICIO DEL ARCHIVO [libs/domain/doe/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOE ENGINE (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: PRIMACIA, SUPERSESION, VENTANAS Y ORDEN DE DOE
 *
 * Logica pura desacoplada de SQL: los repositorios en infra/db traducen
 * estas decisiones a UPDATE/INSERT concretos dentro de una transaccion
 * archive-then-modify.
 * =================================================================
 */

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use sep2_domain_model::archive::Origin;
use sep2_domain_model::DynamicOperatingEnvelope;
use thiserror::Error;

/// Primacia implicita del Grupo 1, que nunca se materializa como fila.
pub const IMPLICIT_GROUP_1_PRIMACY: i64 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DoeError {
    #[error("[DOE_END_TIME_MISMATCH]: expected end_time {expected}, got {actual}")]
    EndTimeMismatch {
        expected: DateTime<Utc>,
        actual: DateTime<Utc>,
    },
    #[error("[DOE_UNKNOWN_TIMEZONE]: '{0}' is not a recognised IANA timezone")]
    UnknownTimezone(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    CancelThenInsert,
    Supersede,
}

/// Una ventana temporal semiabierta `[start_time, end_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoeWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl DoeWindow {
    pub fn overlaps(&self, other: &DoeWindow) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

/// Resuelve la primacia efectiva de un grupo: el Grupo 1 implicito vale 0.
pub fn resolve_group_primacy(explicit_primacy: Option<i64>) -> i64 {
    explicit_primacy.unwrap_or(IMPLICIT_GROUP_1_PRIMACY)
}

/// `true` si una DOE nueva en un grupo de primacia `new_primacy` supera a
/// una DOE existente en un grupo de primacia `existing_primacy`: la
/// existente es de prioridad igual o menor (valor de primacia mayor o igual).
pub fn supersedes(new_group_primacy: i64, existing_group_primacy: i64) -> bool {
    existing_group_primacy >= new_group_primacy
}

/// Verdadero si, dada la regla de primacia y solapamiento de ventana, una
/// DOE existente debe marcarse `superseded = true` por la DOE enviada.
pub fn should_supersede(
    existing_site_id: i64,
    existing_window: DoeWindow,
    existing_group_primacy: i64,
    submitted_site_id: i64,
    submitted_window: DoeWindow,
    submitted_group_primacy: i64,
) -> bool {
    existing_site_id == submitted_site_id
        && existing_window.overlaps(&submitted_window)
        && supersedes(submitted_group_primacy, existing_group_primacy)
}

/// Verdadero si una DOE existente comparte `(site_control_group_id,
/// start_time, site_id)` con la DOE enviada bajo el modo cancel-then-insert.
pub fn cancel_then_insert_matches(
    existing_site_control_group_id: i64,
    existing_start_time: DateTime<Utc>,
    existing_site_id: i64,
    submitted_site_control_group_id: i64,
    submitted_start_time: DateTime<Utc>,
    submitted_site_id: i64,
) -> bool {
    existing_site_control_group_id == submitted_site_control_group_id
        && existing_start_time == submitted_start_time
        && existing_site_id == submitted_site_id
}

/// Asegura `end_time == start_time + duration_seconds` en cada insercion.
pub fn validate_end_time_materialization(
    start_time: DateTime<Utc>,
    duration_seconds: i64,
    end_time: DateTime<Utc>,
) -> Result<(), DoeError> {
    let expected = start_time + Duration::seconds(duration_seconds);
    if expected != end_time {
        return Err(DoeError::EndTimeMismatch {
            expected,
            actual: end_time,
        });
    }
    Ok(())
}

/// Una fila re-hidratada desde la union viva+archivo, con su procedencia
/// y la marca temporal efectiva para ordenamiento (el `deleted_time` hace
/// las veces de `changed_time` en el lado de archivo).
#[derive(Debug, Clone)]
pub struct ActiveDoeRow {
    pub doe: DynamicOperatingEnvelope,
    pub origin: Origin,
    pub effective_changed_time: DateTime<Utc>,
}

/// Ordena in-place segun el mandato 2030.5: `start_time ASC, changed_time
/// DESC, id DESC`.
pub fn sort_active_does(rows: &mut [ActiveDoeRow]) {
    rows.sort_by(|a, b| {
        a.doe
            .start_time
            .cmp(&b.doe.start_time)
            .then_with(|| b.effective_changed_time.cmp(&a.effective_changed_time))
            .then_with(|| {
                b.doe
                    .dynamic_operating_envelope_id
                    .cmp(&a.doe.dynamic_operating_envelope_id)
            })
    });
}

/// Convierte un instante UTC a la hora local de la zona IANA del Site que
/// posee la DOE. La base de datos siempre almacena UTC.
pub fn localize_to_site_timezone(
    instant: DateTime<Utc>,
    timezone_id: &str,
) -> Result<DateTime<Tz>, DoeError> {
    let tz = Tz::from_str(timezone_id)
        .map_err(|_| DoeError::UnknownTimezone(timezone_id.to_string()))?;
    Ok(instant.with_timezone(&tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, minute, 0).unwrap()
    }

    #[test]
    fn group_1_defaults_to_primacy_zero() {
        assert_eq!(resolve_group_primacy(None), 0);
        assert_eq!(resolve_group_primacy(Some(5)), 5);
    }

    #[test]
    fn equal_or_lower_priority_existing_is_superseded() {
        assert!(supersedes(0, 0));
        assert!(supersedes(0, 5));
        assert!(!supersedes(5, 0));
    }

    #[test]
    fn scenario_s2_higher_primacy_value_does_not_supersede() {
        let existing = DoeWindow {
            start_time: ts(0),
            end_time: ts(10),
        };
        let submitted = DoeWindow {
            start_time: ts(2),
            end_time: ts(3),
        };
        assert!(!should_supersede(1, existing, 0, 1, submitted, 1));
        assert!(should_supersede(1, existing, 0, 1, submitted, 0));
    }

    #[test]
    fn non_overlapping_windows_never_supersede() {
        let existing = DoeWindow {
            start_time: ts(0),
            end_time: ts(10),
        };
        let submitted = DoeWindow {
            start_time: ts(10),
            end_time: ts(20),
        };
        assert!(!existing.overlaps(&submitted));
        assert!(!should_supersede(1, existing, 5, 1, submitted, 0));
    }

    #[test]
    fn end_time_materialization_is_enforced() {
        let start = ts(0);
        assert!(validate_end_time_materialization(start, 600, ts(10)).is_ok());
        assert!(validate_end_time_materialization(start, 600, ts(9)).is_err());
    }

    #[test]
    fn unknown_timezone_is_reported() {
        assert!(localize_to_site_timezone(ts(0), "Not/AZone").is_err());
        assert!(localize_to_site_timezone(ts(0), "Australia/Brisbane").is_ok());
    }
}
// FIN DEL ARCHIVO [libs/domain/doe/src/lib.rs]
