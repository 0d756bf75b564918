// INICIO DEL ARCHIVO [libs/infra/db/src/repositories/config.rs]
/*!
 * =================================================================
 * APARATO: RUNTIME CONFIG REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LECTURA/ESCRITURA DEL SINGLETON DE CONFIGURACIÓN
 * =================================================================
 */

use crate::errors::DbError;
use crate::time::{parse_utc, to_rfc3339};
use crate::DbClient;
use libsql::{params, Row};
use sep2_domain_model::RuntimeServerConfig;
use tracing::instrument;

pub struct ConfigRepository {
    client: DbClient,
}

impl ConfigRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    fn map_row(row: &Row) -> Result<RuntimeServerConfig, DbError> {
        Ok(RuntimeServerConfig {
            id: row.get::<i64>(0)?,
            dcap_pollrate_seconds: row.get::<i64>(1)?,
            edevl_pollrate_seconds: row.get::<i64>(2)?,
            fsal_pollrate_seconds: row.get::<i64>(3)?,
            derpl_pollrate_seconds: row.get::<i64>(4)?,
            site_control_pow10_encoding: row.get::<i64>(5)?,
            disable_edev_registration: row.get::<i64>(6)? != 0,
            changed_time: parse_utc(&row.get::<String>(7)?)?,
        })
    }

    /// Devuelve la fila unica de configuracion, o el default estructural
    /// si la tabla aun no fue sembrada.
    #[instrument(skip(self))]
    pub async fn get_current_config(&self) -> Result<RuntimeServerConfig, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, dcap_pollrate_seconds, edevl_pollrate_seconds, fsal_pollrate_seconds, \
                 derpl_pollrate_seconds, site_control_pow10_encoding, disable_edev_registration, changed_time \
                 FROM runtime_server_config WHERE id = 1",
                (),
            )
            .await?;
        match rows.next().await? {
            Some(row) => Self::map_row(&row),
            None => Ok(RuntimeServerConfig::default()),
        }
    }

    #[instrument(skip(self, config))]
    pub async fn update_current_config(
        &self,
        config: &RuntimeServerConfig,
    ) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO runtime_server_config \
                 (id, dcap_pollrate_seconds, edevl_pollrate_seconds, fsal_pollrate_seconds, \
                  derpl_pollrate_seconds, site_control_pow10_encoding, disable_edev_registration, changed_time) \
                 VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                 ON CONFLICT(id) DO UPDATE SET \
                  dcap_pollrate_seconds=excluded.dcap_pollrate_seconds, \
                  edevl_pollrate_seconds=excluded.edevl_pollrate_seconds, \
                  fsal_pollrate_seconds=excluded.fsal_pollrate_seconds, \
                  derpl_pollrate_seconds=excluded.derpl_pollrate_seconds, \
                  site_control_pow10_encoding=excluded.site_control_pow10_encoding, \
                  disable_edev_registration=excluded.disable_edev_registration, \
                  changed_time=excluded.changed_time",
                params![
                    config.dcap_pollrate_seconds,
                    config.edevl_pollrate_seconds,
                    config.fsal_pollrate_seconds,
                    config.derpl_pollrate_seconds,
                    config.site_control_pow10_encoding,
                    config.disable_edev_registration as i64,
                    to_rfc3339(config.changed_time)
                ],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_client() -> DbClient {
        DbClient::connect("file::memory:?cache=shared", None)
            .await
            .expect("in-memory db connects")
    }

    #[tokio::test]
    async fn falls_back_to_default_when_unseeded() {
        let repo = ConfigRepository::new(memory_client().await);
        let config = repo.get_current_config().await.unwrap();
        assert_eq!(config.dcap_pollrate_seconds, 300);
        assert_eq!(config.site_control_pow10_encoding, -4);
    }

    #[tokio::test]
    async fn update_then_get_round_trips() {
        let repo = ConfigRepository::new(memory_client().await);
        let mut config = RuntimeServerConfig::default();
        config.dcap_pollrate_seconds = 60;
        repo.update_current_config(&config).await.unwrap();
        let fetched = repo.get_current_config().await.unwrap();
        assert_eq!(fetched.dcap_pollrate_seconds, 60);
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/config.rs]
