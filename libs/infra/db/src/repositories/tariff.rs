// INICIO DEL ARCHIVO [libs/infra/db/src/repositories/tariff.rs]
/*!
 * =================================================================
 * APARATO: TARIFF REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CRUD DE TARIFA Y LECTURA PAGINADA DE TASAS GENERADAS
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::archival::copy_rows_into_archive;
use crate::time::{parse_utc, to_rfc3339};
use crate::DbClient;
use chrono::{NaiveDate, NaiveTime};
use libsql::{params, Row};
use sep2_domain_model::{Tariff, TariffGeneratedRate};
use sep2_domain_pricing::{plan_rate_component_fetch, plan_rate_component_trim};
use tracing::instrument;

const RATE_COLUMNS: &[&str] = &[
    "tariff_generated_rate_id",
    "tariff_id",
    "site_id",
    "start_date",
    "start_time",
    "duration_seconds",
    "import_active_price",
    "export_active_price",
    "import_reactive_price",
    "export_reactive_price",
    "changed_time",
];

pub struct TariffRepository {
    client: DbClient,
}

impl TariffRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    fn map_rate_row(row: &Row) -> Result<TariffGeneratedRate, DbError> {
        Ok(TariffGeneratedRate {
            tariff_generated_rate_id: row.get::<i64>(0)?,
            tariff_id: row.get::<i64>(1)?,
            site_id: row.get::<i64>(2)?,
            start_date: NaiveDate::parse_from_str(&row.get::<String>(3)?, "%Y-%m-%d")
                .map_err(|e| DbError::MappingError(format!("bad start_date: {e}")))?,
            start_time: NaiveTime::parse_from_str(&row.get::<String>(4)?, "%H:%M:%S")
                .map_err(|e| DbError::MappingError(format!("bad start_time: {e}")))?,
            duration_seconds: row.get::<i64>(5)?,
            import_active_price: row.get::<Option<i64>>(6)?,
            export_active_price: row.get::<Option<i64>>(7)?,
            import_reactive_price: row.get::<Option<i64>>(8)?,
            export_reactive_price: row.get::<Option<i64>>(9)?,
            changed_time: parse_utc(&row.get::<String>(10)?)?,
        })
    }

    #[instrument(skip(self, tariff))]
    pub async fn create_tariff(&self, tariff: &Tariff) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO tariffs (tariff_id, aggregator_id, dnsp_code, currency_code, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    tariff.tariff_id,
                    tariff.aggregator_id,
                    tariff.dnsp_code.clone(),
                    tariff.currency_code,
                    to_rfc3339(tariff.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_tariff(&self, tariff_id: i64) -> Result<Option<Tariff>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT tariff_id, aggregator_id, dnsp_code, currency_code, changed_time \
                 FROM tariffs WHERE tariff_id = ?1",
                params![tariff_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Tariff {
                tariff_id: row.get::<i64>(0)?,
                aggregator_id: row.get::<i64>(1)?,
                dnsp_code: row.get::<String>(2)?,
                currency_code: row.get::<i64>(3)?,
                changed_time: parse_utc(&row.get::<String>(4)?)?,
            })),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, rate))]
    pub async fn insert_rate(&self, rate: &TariffGeneratedRate) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO tariff_generated_rates \
                 (tariff_generated_rate_id, tariff_id, site_id, start_date, start_time, duration_seconds, \
                  import_active_price, export_active_price, import_reactive_price, export_reactive_price, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    rate.tariff_generated_rate_id,
                    rate.tariff_id,
                    rate.site_id,
                    rate.start_date.format("%Y-%m-%d").to_string(),
                    rate.start_time.format("%H:%M:%S").to_string(),
                    rate.duration_seconds,
                    rate.import_active_price,
                    rate.export_active_price,
                    rate.import_reactive_price,
                    rate.export_reactive_price,
                    to_rfc3339(rate.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, rate))]
    pub async fn update_rate(&self, rate: &TariffGeneratedRate) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        copy_rows_into_archive(
            &connection,
            "tariff_generated_rates",
            "tariff_generated_rates_archive",
            RATE_COLUMNS,
            "tariff_generated_rate_id = ?1",
            vec![rate.tariff_generated_rate_id.into()],
        )
        .await?;
        connection
            .execute(
                "UPDATE tariff_generated_rates SET tariff_id=?2, site_id=?3, start_date=?4, start_time=?5, \
                 duration_seconds=?6, import_active_price=?7, export_active_price=?8, import_reactive_price=?9, \
                 export_reactive_price=?10, changed_time=?11 WHERE tariff_generated_rate_id = ?1",
                params![
                    rate.tariff_generated_rate_id,
                    rate.tariff_id,
                    rate.site_id,
                    rate.start_date.format("%Y-%m-%d").to_string(),
                    rate.start_time.format("%H:%M:%S").to_string(),
                    rate.duration_seconds,
                    rate.import_active_price,
                    rate.export_active_price,
                    rate.import_reactive_price,
                    rate.export_reactive_price,
                    to_rfc3339(rate.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    /// Devuelve la tasa que matchea exactamente `(tariff, site, day, time)`,
    /// usada para resolver un solo ConsumptionTariffInterval por href.
    #[instrument(skip(self))]
    pub async fn select_rate_for_day_time(
        &self,
        tariff_id: i64,
        site_id: i64,
        day: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<TariffGeneratedRate>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT tariff_generated_rate_id, tariff_id, site_id, start_date, start_time, duration_seconds, \
                        import_active_price, export_active_price, import_reactive_price, export_reactive_price, changed_time \
                 FROM tariff_generated_rates \
                 WHERE tariff_id = ?1 AND site_id = ?2 AND start_date = ?3 AND start_time = ?4",
                params![
                    tariff_id,
                    site_id,
                    day.format("%Y-%m-%d").to_string(),
                    time.format("%H:%M:%S").to_string()
                ],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_rate_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Pagina el fanout virtual RateComponent: primero convierte
    /// `(start, limit)` en un rango de dias distintos, luego recorta el
    /// producto `dia x prt` aplanado al tamano de pagina pedido.
    #[instrument(skip(self))]
    pub async fn list_distinct_rate_days(
        &self,
        tariff_id: i64,
        site_id: i64,
        start: i64,
        limit: i64,
    ) -> Result<(Vec<NaiveDate>, sep2_domain_pricing::RateComponentFetchPlan), DbError> {
        let plan = plan_rate_component_fetch(start, limit);
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT DISTINCT start_date FROM tariff_generated_rates \
                 WHERE tariff_id = ?1 AND site_id = ?2 \
                 ORDER BY start_date ASC LIMIT ?3 OFFSET ?4",
                params![
                    tariff_id,
                    site_id,
                    plan.db_adjusted_limit,
                    plan.db_adjusted_start
                ],
            )
            .await?;
        let mut days = Vec::new();
        while let Some(row) = rows.next().await? {
            days.push(
                NaiveDate::parse_from_str(&row.get::<String>(0)?, "%Y-%m-%d")
                    .map_err(|e| DbError::MappingError(format!("bad start_date: {e}")))?,
            );
        }
        let trim = plan_rate_component_trim(&plan, limit, days.len() as i64);
        let _ = &trim;
        Ok((days, plan))
    }

    /// Lista tarifas paginadas, sin restriccion de agregador: `/tp` es
    /// la lista no-escopada de todas las tarifas del sistema.
    #[instrument(skip(self))]
    pub async fn list_tariffs(&self, start: i64, limit: i64) -> Result<Vec<Tariff>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT tariff_id, aggregator_id, dnsp_code, currency_code, changed_time \
                 FROM tariffs ORDER BY tariff_id ASC LIMIT ?1 OFFSET ?2",
                params![limit, start],
            )
            .await?;
        let mut tariffs = Vec::new();
        while let Some(row) = rows.next().await? {
            tariffs.push(Tariff {
                tariff_id: row.get::<i64>(0)?,
                aggregator_id: row.get::<i64>(1)?,
                dnsp_code: row.get::<String>(2)?,
                currency_code: row.get::<i64>(3)?,
                changed_time: parse_utc(&row.get::<String>(4)?)?,
            });
        }
        Ok(tariffs)
    }

    /// Todas las tasas generadas de un dia, para derivar el
    /// TimeTariffIntervalList de ese RateComponent.
    #[instrument(skip(self))]
    pub async fn list_rates_for_day(
        &self,
        tariff_id: i64,
        site_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<TariffGeneratedRate>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT tariff_generated_rate_id, tariff_id, site_id, start_date, start_time, duration_seconds, \
                        import_active_price, export_active_price, import_reactive_price, export_reactive_price, changed_time \
                 FROM tariff_generated_rates WHERE tariff_id = ?1 AND site_id = ?2 AND start_date = ?3 \
                 ORDER BY start_time ASC",
                params![tariff_id, site_id, day.format("%Y-%m-%d").to_string()],
            )
            .await?;
        let mut rates = Vec::new();
        while let Some(row) = rows.next().await? {
            rates.push(Self::map_rate_row(&row)?);
        }
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    async fn memory_client() -> DbClient {
        DbClient::connect("file::memory:?cache=shared", None)
            .await
            .expect("in-memory db connects")
    }

    #[tokio::test]
    async fn create_tariff_then_insert_and_fetch_rate() {
        let repo = TariffRepository::new(memory_client().await);
        let tariff = Tariff {
            tariff_id: 1,
            aggregator_id: 1,
            dnsp_code: "ENERGEX".into(),
            currency_code: 36,
            changed_time: Utc::now(),
        };
        repo.create_tariff(&tariff).await.unwrap();

        let rate = TariffGeneratedRate {
            tariff_generated_rate_id: 1,
            tariff_id: 1,
            site_id: 1,
            start_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            duration_seconds: 1800,
            import_active_price: Some(250),
            export_active_price: Some(-50),
            import_reactive_price: None,
            export_reactive_price: None,
            changed_time: Utc.with_ymd_and_hms(2023, 6, 1, 14, 0, 0).unwrap(),
        };
        repo.insert_rate(&rate).await.unwrap();

        let fetched = repo
            .select_rate_for_day_time(
                1,
                1,
                NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
                NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.import_active_price, Some(250));
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/tariff.rs]
