// INICIO DEL ARCHIVO [libs/domain/model/src/archive.rs]
//! Sombra de archivo generica: cada entidad mutable tiene una tabla
//! espejo con las mismas columnas mas `archive_id`/`archive_time`/
//! `deleted_time`, sin claves foraneas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envoltorio comun para una fila archivada de cualquier tipo `T`.
/// `deleted_time` es `None` cuando la fila fue archivada por un update
/// (pre-imagen) y `Some` cuando fue archivada por un delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archived<T> {
    pub archive_id: i64,
    pub archive_time: DateTime<Utc>,
    pub deleted_time: Option<DateTime<Utc>>,
    pub row: T,
}

/// Procedencia de una fila re-hidratada desde una consulta `UNION ALL`
/// contra la tabla viva y su sombra de archivo. Reemplaza el despacho
/// dinamico sobre dos tipos distintos del original con un unico registro
/// etiquetado, segun lo documentado para el motor DOE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    Live,
    Archive,
}
// FIN DEL ARCHIVO [libs/domain/model/src/archive.rs]
