// INICIO DEL ARCHIVO [libs/infra/db/src/time.rs]
//! Conversion entre `DateTime<Utc>` y el TEXT RFC3339 usado en las
//! columnas de marca temporal de todas las tablas.

use crate::errors::DbError;
use chrono::{DateTime, Utc};

pub(crate) fn parse_utc(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(format!("invalid timestamp '{value}': {e}")))
}

pub(crate) fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}
// FIN DEL ARCHIVO [libs/infra/db/src/time.rs]
