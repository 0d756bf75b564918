// INICIO DEL ARCHIVO [libs/infra/db/src/repositories/reading.rs]
/*!
 * =================================================================
 * APARATO: READING REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CRUD DE MIRRORUSAGEPOINT Y SUS LECTURAS
 *
 * Un MirrorUsagePoint se modela 1:1 sobre un SiteReadingType; sus
 * MeterReading llegan como lotes de SiteReading referenciando ese tipo.
 * Sin sombra de archivo: estas filas no participan del protocolo de
 * notificacion de cambio/borrado con historial.
 * =================================================================
 */

use crate::errors::DbError;
use crate::time::{parse_utc, to_rfc3339};
use crate::DbClient;
use libsql::{params, Row};
use sep2_domain_model::{SiteReading, SiteReadingType};
use tracing::instrument;

pub struct ReadingRepository {
    client: DbClient,
}

impl ReadingRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    fn map_type_row(row: &Row) -> Result<SiteReadingType, DbError> {
        Ok(SiteReadingType {
            site_reading_type_id: row.get::<i64>(0)?,
            site_id: row.get::<i64>(1)?,
            uom: row.get::<i64>(2)?,
            data_qualifier: row.get::<i64>(3)?,
            flow_direction: row.get::<i64>(4)?,
            changed_time: parse_utc(&row.get::<String>(5)?)?,
        })
    }

    #[instrument(skip(self, reading_type))]
    pub async fn create_reading_type(&self, reading_type: &SiteReadingType) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO site_reading_types \
                 (site_reading_type_id, site_id, uom, data_qualifier, flow_direction, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    reading_type.site_reading_type_id,
                    reading_type.site_id,
                    reading_type.uom,
                    reading_type.data_qualifier,
                    reading_type.flow_direction,
                    to_rfc3339(reading_type.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_reading_type(&self, site_reading_type_id: i64) -> Result<Option<SiteReadingType>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_reading_type_id, site_id, uom, data_qualifier, flow_direction, changed_time \
                 FROM site_reading_types WHERE site_reading_type_id = ?1",
                params![site_reading_type_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_type_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Lista MirrorUsagePoints visibles para un agregador, resolviendo la
    /// propiedad transitivamente via el Site dueño de cada tipo.
    #[instrument(skip(self))]
    pub async fn list_reading_types_for_aggregator(
        &self,
        aggregator_id: i64,
        start: i64,
        limit: i64,
    ) -> Result<Vec<SiteReadingType>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT t.site_reading_type_id, t.site_id, t.uom, t.data_qualifier, t.flow_direction, t.changed_time \
                 FROM site_reading_types t JOIN sites s ON s.site_id = t.site_id \
                 WHERE s.aggregator_id = ?1 ORDER BY t.site_reading_type_id ASC LIMIT ?2 OFFSET ?3",
                params![aggregator_id, limit, start],
            )
            .await?;
        let mut types = Vec::new();
        while let Some(row) = rows.next().await? {
            types.push(Self::map_type_row(&row)?);
        }
        Ok(types)
    }

    #[instrument(skip(self, reading_type))]
    pub async fn update_reading_type(&self, reading_type: &SiteReadingType) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "UPDATE site_reading_types SET site_id=?2, uom=?3, data_qualifier=?4, flow_direction=?5, changed_time=?6 \
                 WHERE site_reading_type_id = ?1",
                params![
                    reading_type.site_reading_type_id,
                    reading_type.site_id,
                    reading_type.uom,
                    reading_type.data_qualifier,
                    reading_type.flow_direction,
                    to_rfc3339(reading_type.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    /// Borra el MirrorUsagePoint y todas sus lecturas asociadas.
    #[instrument(skip(self))]
    pub async fn delete_reading_type(&self, site_reading_type_id: i64) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "DELETE FROM site_readings WHERE site_reading_type_id = ?1",
                params![site_reading_type_id],
            )
            .await?;
        connection
            .execute(
                "DELETE FROM site_reading_types WHERE site_reading_type_id = ?1",
                params![site_reading_type_id],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, reading))]
    pub async fn insert_reading(&self, reading: &SiteReading) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO site_readings \
                 (site_reading_id, site_reading_type_id, time_period_start, time_period_seconds, value, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    reading.site_reading_id,
                    reading.site_reading_type_id,
                    to_rfc3339(reading.time_period_start),
                    reading.time_period_seconds,
                    reading.value,
                    to_rfc3339(reading.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_readings_for_type(
        &self,
        site_reading_type_id: i64,
        start: i64,
        limit: i64,
    ) -> Result<Vec<SiteReading>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_reading_id, site_reading_type_id, time_period_start, time_period_seconds, value, changed_time \
                 FROM site_readings WHERE site_reading_type_id = ?1 \
                 ORDER BY time_period_start DESC LIMIT ?2 OFFSET ?3",
                params![site_reading_type_id, limit, start],
            )
            .await?;
        let mut readings = Vec::new();
        while let Some(row) = rows.next().await? {
            readings.push(SiteReading {
                site_reading_id: row.get::<i64>(0)?,
                site_reading_type_id: row.get::<i64>(1)?,
                time_period_start: parse_utc(&row.get::<String>(2)?)?,
                time_period_seconds: row.get::<i64>(3)?,
                value: row.get::<i64>(4)?,
                changed_time: parse_utc(&row.get::<String>(5)?)?,
            });
        }
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sep2_domain_model::Site;

    async fn memory_client() -> DbClient {
        DbClient::connect("file::memory:?cache=shared", None)
            .await
            .expect("in-memory db connects")
    }

    fn sample_site() -> Site {
        Site {
            site_id: 1,
            aggregator_id: 1,
            lfdi: "0xabc".into(),
            sfdi: 1,
            device_category: 0,
            nmi: None,
            timezone_id: "Australia/Brisbane".into(),
            changed_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_then_list_and_batch_insert_readings() {
        let client = memory_client().await;
        crate::repositories::site::SiteRepository::new(client.clone())
            .create_site(&sample_site())
            .await
            .unwrap();
        let repo = ReadingRepository::new(client);

        let reading_type = SiteReadingType {
            site_reading_type_id: 1,
            site_id: 1,
            uom: 72,
            data_qualifier: 12,
            flow_direction: 1,
            changed_time: Utc::now(),
        };
        repo.create_reading_type(&reading_type).await.unwrap();

        let listed = repo.list_reading_types_for_aggregator(1, 0, 10).await.unwrap();
        assert_eq!(listed.len(), 1);

        repo.insert_reading(&SiteReading {
            site_reading_id: 1,
            site_reading_type_id: 1,
            time_period_start: Utc::now(),
            time_period_seconds: 300,
            value: 1500,
            changed_time: Utc::now(),
        })
        .await
        .unwrap();

        let readings = repo.list_readings_for_type(1, 0, 10).await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, 1500);

        repo.delete_reading_type(1).await.unwrap();
        assert!(repo.get_reading_type(1).await.unwrap().is_none());
        assert!(repo.list_readings_for_type(1, 0, 10).await.unwrap().is_empty());
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/reading.rs]
