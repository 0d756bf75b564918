// INICIO DEL ARCHIVO [libs/infra/db/src/repositories/site.rs]
/*!
 * =================================================================
 * APARATO: SITE REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CRUD DE SITE Y SUS CUATRO SUB-REGISTROS DER
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::archival::{copy_rows_into_archive, delete_rows_into_archive};
use crate::time::{parse_utc, to_rfc3339};
use crate::DbClient;
use libsql::{params, Row};
use sep2_domain_model::{
    Site, SiteDERAvailability, SiteDERRating, SiteDERSetting, SiteDERStatus,
};
use tracing::instrument;

const SITE_COLUMNS: &[&str] = &[
    "site_id",
    "aggregator_id",
    "lfdi",
    "sfdi",
    "device_category",
    "nmi",
    "timezone_id",
    "changed_time",
];

pub struct SiteRepository {
    client: DbClient,
}

impl SiteRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    fn map_row(row: &Row) -> Result<Site, DbError> {
        Ok(Site {
            site_id: row.get::<i64>(0)?,
            aggregator_id: row.get::<i64>(1)?,
            lfdi: row.get::<String>(2)?,
            sfdi: row.get::<i64>(3)?,
            device_category: row.get::<i64>(4)?,
            nmi: row.get::<Option<String>>(5)?,
            timezone_id: row.get::<String>(6)?,
            changed_time: parse_utc(&row.get::<String>(7)?)?,
        })
    }

    #[instrument(skip(self))]
    pub async fn create_site(&self, site: &Site) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO sites (site_id, aggregator_id, lfdi, sfdi, device_category, nmi, timezone_id, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    site.site_id,
                    site.aggregator_id,
                    site.lfdi.clone(),
                    site.sfdi,
                    site.device_category,
                    site.nmi.clone(),
                    site.timezone_id.clone(),
                    to_rfc3339(site.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_site(&self, site_id: i64) -> Result<Option<Site>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_id, aggregator_id, lfdi, sfdi, device_category, nmi, timezone_id, changed_time \
                 FROM sites WHERE site_id = ?1",
                params![site_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_site_by_lfdi(&self, lfdi: &str) -> Result<Option<Site>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_id, aggregator_id, lfdi, sfdi, device_category, nmi, timezone_id, changed_time \
                 FROM sites WHERE lfdi = ?1",
                params![lfdi.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_sites_for_aggregator(
        &self,
        aggregator_id: i64,
        start: i64,
        limit: i64,
    ) -> Result<Vec<Site>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_id, aggregator_id, lfdi, sfdi, device_category, nmi, timezone_id, changed_time \
                 FROM sites WHERE aggregator_id = ?1 ORDER BY site_id ASC LIMIT ?2 OFFSET ?3",
                params![aggregator_id, limit, start],
            )
            .await?;
        let mut sites = Vec::new();
        while let Some(row) = rows.next().await? {
            sites.push(Self::map_row(&row)?);
        }
        Ok(sites)
    }

    /// Archiva la pre-imagen y aplica la actualizacion.
    #[instrument(skip(self, site))]
    pub async fn update_site(&self, site: &Site) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        copy_rows_into_archive(
            &connection,
            "sites",
            "sites_archive",
            SITE_COLUMNS,
            "site_id = ?1",
            vec![site.site_id.into()],
        )
        .await?;
        connection
            .execute(
                "UPDATE sites SET aggregator_id=?2, lfdi=?3, sfdi=?4, device_category=?5, nmi=?6, timezone_id=?7, changed_time=?8 \
                 WHERE site_id = ?1",
                params![
                    site.site_id,
                    site.aggregator_id,
                    site.lfdi.clone(),
                    site.sfdi,
                    site.device_category,
                    site.nmi.clone(),
                    site.timezone_id.clone(),
                    to_rfc3339(site.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    /// Archiva con `deleted_time` y elimina el Site. Las cuatro sombras
    /// de los sub-registros DER del Site deben purgarse por el llamador
    /// (el cascade completo vive en la capa de manager, no aqui).
    #[instrument(skip(self))]
    pub async fn delete_site(&self, site_id: i64) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        delete_rows_into_archive(
            &connection,
            "sites",
            "sites_archive",
            SITE_COLUMNS,
            "site_id = ?1",
            vec![site_id.into()],
        )
        .await
    }

    #[instrument(skip(self, rating))]
    pub async fn upsert_der_rating(&self, rating: &SiteDERRating) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let columns: &[&str] = &[
            "site_der_rating_id",
            "site_id",
            "modes_supported",
            "max_w",
            "max_var",
            "changed_time",
        ];
        copy_rows_into_archive(
            &connection,
            "site_der_ratings",
            "site_der_ratings_archive",
            columns,
            "site_id = ?1",
            vec![rating.site_id.into()],
        )
        .await?;
        connection
            .execute(
                "INSERT INTO site_der_ratings (site_der_rating_id, site_id, modes_supported, max_w, max_var, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT(site_der_rating_id) DO UPDATE SET modes_supported=excluded.modes_supported, max_w=excluded.max_w, max_var=excluded.max_var, changed_time=excluded.changed_time",
                params![
                    rating.site_der_rating_id,
                    rating.site_id,
                    rating.modes_supported,
                    rating.max_w,
                    rating.max_var,
                    to_rfc3339(rating.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, availability))]
    pub async fn upsert_der_availability(
        &self,
        availability: &SiteDERAvailability,
    ) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let columns: &[&str] = &[
            "site_der_availability_id",
            "site_id",
            "available_w",
            "reading_time",
            "changed_time",
        ];
        copy_rows_into_archive(
            &connection,
            "site_der_availabilities",
            "site_der_availabilities_archive",
            columns,
            "site_id = ?1",
            vec![availability.site_id.into()],
        )
        .await?;
        connection
            .execute(
                "INSERT INTO site_der_availabilities (site_der_availability_id, site_id, available_w, reading_time, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(site_der_availability_id) DO UPDATE SET available_w=excluded.available_w, reading_time=excluded.reading_time, changed_time=excluded.changed_time",
                params![
                    availability.site_der_availability_id,
                    availability.site_id,
                    availability.available_w,
                    to_rfc3339(availability.reading_time),
                    to_rfc3339(availability.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, setting))]
    pub async fn upsert_der_setting(&self, setting: &SiteDERSetting) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let columns: &[&str] = &[
            "site_der_setting_id",
            "site_id",
            "modes_enabled",
            "grad_w",
            "changed_time",
        ];
        copy_rows_into_archive(
            &connection,
            "site_der_settings",
            "site_der_settings_archive",
            columns,
            "site_id = ?1",
            vec![setting.site_id.into()],
        )
        .await?;
        connection
            .execute(
                "INSERT INTO site_der_settings (site_der_setting_id, site_id, modes_enabled, grad_w, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(site_der_setting_id) DO UPDATE SET modes_enabled=excluded.modes_enabled, grad_w=excluded.grad_w, changed_time=excluded.changed_time",
                params![
                    setting.site_der_setting_id,
                    setting.site_id,
                    setting.modes_enabled,
                    setting.grad_w,
                    to_rfc3339(setting.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_der_rating(&self, site_id: i64) -> Result<Option<SiteDERRating>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_der_rating_id, site_id, modes_supported, max_w, max_var, changed_time \
                 FROM site_der_ratings WHERE site_id = ?1",
                params![site_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(SiteDERRating {
                site_der_rating_id: row.get::<i64>(0)?,
                site_id: row.get::<i64>(1)?,
                modes_supported: row.get::<i64>(2)?,
                max_w: row.get::<i64>(3)?,
                max_var: row.get::<i64>(4)?,
                changed_time: parse_utc(&row.get::<String>(5)?)?,
            })),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_der_availability(&self, site_id: i64) -> Result<Option<SiteDERAvailability>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_der_availability_id, site_id, available_w, reading_time, changed_time \
                 FROM site_der_availabilities WHERE site_id = ?1",
                params![site_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(SiteDERAvailability {
                site_der_availability_id: row.get::<i64>(0)?,
                site_id: row.get::<i64>(1)?,
                available_w: row.get::<Option<i64>>(2)?,
                reading_time: parse_utc(&row.get::<String>(3)?)?,
                changed_time: parse_utc(&row.get::<String>(4)?)?,
            })),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_der_setting(&self, site_id: i64) -> Result<Option<SiteDERSetting>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_der_setting_id, site_id, modes_enabled, grad_w, changed_time \
                 FROM site_der_settings WHERE site_id = ?1",
                params![site_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(SiteDERSetting {
                site_der_setting_id: row.get::<i64>(0)?,
                site_id: row.get::<i64>(1)?,
                modes_enabled: row.get::<i64>(2)?,
                grad_w: row.get::<Option<i64>>(3)?,
                changed_time: parse_utc(&row.get::<String>(4)?)?,
            })),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_der_status(&self, site_id: i64) -> Result<Option<SiteDERStatus>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_der_status_id, site_id, operational_mode_status, generator_connect_status, changed_time \
                 FROM site_der_statuses WHERE site_id = ?1",
                params![site_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(SiteDERStatus {
                site_der_status_id: row.get::<i64>(0)?,
                site_id: row.get::<i64>(1)?,
                operational_mode_status: row.get::<Option<i64>>(2)?,
                generator_connect_status: row.get::<Option<i64>>(3)?,
                changed_time: parse_utc(&row.get::<String>(4)?)?,
            })),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, status))]
    pub async fn upsert_der_status(&self, status: &SiteDERStatus) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let columns: &[&str] = &[
            "site_der_status_id",
            "site_id",
            "operational_mode_status",
            "generator_connect_status",
            "changed_time",
        ];
        copy_rows_into_archive(
            &connection,
            "site_der_statuses",
            "site_der_statuses_archive",
            columns,
            "site_id = ?1",
            vec![status.site_id.into()],
        )
        .await?;
        connection
            .execute(
                "INSERT INTO site_der_statuses (site_der_status_id, site_id, operational_mode_status, generator_connect_status, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(site_der_status_id) DO UPDATE SET operational_mode_status=excluded.operational_mode_status, generator_connect_status=excluded.generator_connect_status, changed_time=excluded.changed_time",
                params![
                    status.site_der_status_id,
                    status.site_id,
                    status.operational_mode_status,
                    status.generator_connect_status,
                    to_rfc3339(status.changed_time)
                ],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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
    async fn create_then_get_round_trips() {
        let repo = SiteRepository::new(memory_client().await);
        let site = sample_site();
        repo.create_site(&site).await.unwrap();
        let fetched = repo.get_site(1).await.unwrap().unwrap();
        assert_eq!(fetched.lfdi, "0xabc");
        assert_eq!(fetched.timezone_id, "Australia/Brisbane");
    }

    #[tokio::test]
    async fn update_archives_the_pre_image() {
        let repo = SiteRepository::new(memory_client().await);
        let mut site = sample_site();
        repo.create_site(&site).await.unwrap();
        site.nmi = Some("NMI123".into());
        repo.update_site(&site).await.unwrap();

        let connection = repo.client.get_connection().unwrap();
        let mut rows = connection
            .query("SELECT COUNT(*) FROM sites_archive WHERE site_id = 1", ())
            .await
            .unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, 1);

        let fetched = repo.get_site(1).await.unwrap().unwrap();
        assert_eq!(fetched.nmi, Some("NMI123".into()));
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/site.rs]
