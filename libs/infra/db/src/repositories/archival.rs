// INICIO DEL ARCHIVO [libs/infra/db/src/repositories/archival.rs]
/*!
 * =================================================================
 * APARATO: ARCHIVE WRITER (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: COPIA/BORRADO GENERICO HACIA TABLAS DE ARCHIVO
 *
 * Dos operaciones parametrizadas por tabla fuente `T`, tabla de archivo
 * `A` y un predicado `P`, usadas por cada repositorio de entidad mutable
 * antes de aplicar un update o delete.
 * =================================================================
 */

use crate::errors::DbError;
use libsql::{Connection, Value};

/// `copy_rows_into_archive(T, A, P)`: inserta en `A` la proyeccion de
/// filas de `T` que matchean `P`, dejando `A.deleted_time = NULL`.
/// Se invoca antes de cada update.
pub async fn copy_rows_into_archive(
    connection: &Connection,
    source_table: &str,
    archive_table: &str,
    columns: &[&str],
    predicate_sql: &str,
    predicate_params: Vec<Value>,
) -> Result<(), DbError> {
    let column_list = columns.join(", ");
    let sql = format!(
        "INSERT INTO {archive_table} ({column_list}, archive_time, deleted_time) \
         SELECT {column_list}, CURRENT_TIMESTAMP, NULL FROM {source_table} WHERE {predicate_sql}"
    );
    connection.execute(&sql, predicate_params).await?;
    Ok(())
}

/// `delete_rows_into_archive(T, A, deleted_time, P)`: copia las filas que
/// matchean `P` a `A` con `A.deleted_time = deleted_time`, luego las
/// elimina de `T`. Ambos pasos corren sobre la misma conexion; el
/// llamador es responsable de envolverlos en una transaccion cuando la
/// atomicidad importa.
pub async fn delete_rows_into_archive(
    connection: &Connection,
    source_table: &str,
    archive_table: &str,
    columns: &[&str],
    predicate_sql: &str,
    predicate_params: Vec<Value>,
) -> Result<(), DbError> {
    let column_list = columns.join(", ");
    let insert_sql = format!(
        "INSERT INTO {archive_table} ({column_list}, archive_time, deleted_time) \
         SELECT {column_list}, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP FROM {source_table} WHERE {predicate_sql}"
    );
    connection
        .execute(&insert_sql, predicate_params.clone())
        .await?;

    let delete_sql = format!("DELETE FROM {source_table} WHERE {predicate_sql}");
    connection.execute(&delete_sql, predicate_params).await?;
    Ok(())
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/archival.rs]
