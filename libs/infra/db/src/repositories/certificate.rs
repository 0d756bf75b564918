// INICIO DEL ARCHIVO [libs/infra/db/src/repositories/certificate.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICATE & AGGREGATOR REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: RESOLUCIÓN DE CLAIMS DE CERTIFICADO Y ALLOWLIST DE
 *                  DOMINIOS DEL AGREGADOR
 * =================================================================
 */

use crate::errors::DbError;
use crate::time::{parse_utc, to_rfc3339};
use crate::DbClient;
use libsql::{params, Row};
use sep2_domain_model::{Aggregator, Certificate};
use tracing::instrument;

pub struct CertificateRepository {
    client: DbClient,
}

impl CertificateRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn find_by_lfdi(&self, lfdi: &str) -> Result<Option<Certificate>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT certificate_id, lfdi, sfdi, expiry FROM certificates WHERE lfdi = ?1",
                params![lfdi.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Certificate {
                certificate_id: row.get::<i64>(0)?,
                lfdi: row.get::<String>(1)?,
                sfdi: row.get::<i64>(2)?,
                expiry: parse_utc(&row.get::<String>(3)?)?,
            })),
            None => Ok(None),
        }
    }

    /// Resuelve `(certificate_id, aggregator_id)` para un LFDI presentado
    /// en el handshake TLS, exigiendo `expiry > now()`. Ausencia o
    /// expiracion se modelan como `Ok(None)`; el llamador HTTP los
    /// traduce a 403.
    #[instrument(skip(self))]
    pub async fn resolve_aggregator_for_lfdi(
        &self,
        lfdi: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<(i64, i64)>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT c.certificate_id, a.aggregator_id \
                 FROM certificates c \
                 JOIN aggregator_certificate_assignments a USING(certificate_id) \
                 WHERE c.lfdi = ?1 AND c.expiry > ?2 LIMIT 1",
                params![lfdi.to_string(), to_rfc3339(now)],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some((row.get::<i64>(0)?, row.get::<i64>(1)?))),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, certificate))]
    pub async fn register_certificate(&self, certificate: &Certificate) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO certificates (certificate_id, lfdi, sfdi, expiry) VALUES (?1, ?2, ?3, ?4)",
                params![
                    certificate.certificate_id,
                    certificate.lfdi.clone(),
                    certificate.sfdi,
                    to_rfc3339(certificate.expiry)
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn assign_certificate(
        &self,
        aggregator_id: i64,
        certificate_id: i64,
    ) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT OR IGNORE INTO aggregator_certificate_assignments (aggregator_id, certificate_id) \
                 VALUES (?1, ?2)",
                params![aggregator_id, certificate_id],
            )
            .await?;
        Ok(())
    }
}

pub struct AggregatorRepository {
    client: DbClient,
}

impl AggregatorRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    fn map_row(row: &Row) -> Result<Aggregator, DbError> {
        let domains_json = row.get::<String>(2)?;
        let domains: Vec<String> = serde_json::from_str(&domains_json)
            .map_err(|e| DbError::MappingError(format!("malformed domains JSON: {e}")))?;
        Ok(Aggregator {
            aggregator_id: row.get::<i64>(0)?,
            name: row.get::<String>(1)?,
            domains,
            changed_time: parse_utc(&row.get::<String>(3)?)?,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_aggregator(&self, aggregator_id: i64) -> Result<Option<Aggregator>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT aggregator_id, name, domains, changed_time FROM aggregators WHERE aggregator_id = ?1",
                params![aggregator_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::map_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, aggregator))]
    pub async fn upsert_aggregator(&self, aggregator: &Aggregator) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let domains_json = serde_json::to_string(&aggregator.domains)
            .map_err(|e| DbError::MappingError(format!("cannot serialise domains: {e}")))?;
        connection
            .execute(
                "INSERT INTO aggregators (aggregator_id, name, domains, changed_time) VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(aggregator_id) DO UPDATE SET name=excluded.name, domains=excluded.domains, changed_time=excluded.changed_time",
                params![
                    aggregator.aggregator_id,
                    aggregator.name.clone(),
                    domains_json,
                    to_rfc3339(aggregator.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    /// Enumera todos los aggregator_id conocidos: usado por el batcher de
    /// notificaciones cuando el cambio no tiene un agregador propietario
    /// unico (p.ej. un cambio de poll-rate en `RuntimeServerConfig`).
    #[instrument(skip(self))]
    pub async fn list_all_aggregator_ids(&self) -> Result<Vec<i64>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query("SELECT aggregator_id FROM aggregators", ())
            .await?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<i64>(0)?);
        }
        Ok(ids)
    }

    /// Valida que el host de `notification_uri` este en el allowlist del
    /// agregador propietario de la suscripcion.
    pub fn domain_is_allowed(aggregator: &Aggregator, notification_host: &str) -> bool {
        aggregator
            .domains
            .iter()
            .any(|domain| domain.eq_ignore_ascii_case(notification_host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn domain_allowlist_is_case_insensitive() {
        let aggregator = Aggregator {
            aggregator_id: 1,
            name: "acme".into(),
            domains: vec!["Utility.example.com".into()],
            changed_time: Utc::now(),
        };
        assert!(AggregatorRepository::domain_is_allowed(
            &aggregator,
            "utility.example.com"
        ));
        assert!(!AggregatorRepository::domain_is_allowed(
            &aggregator,
            "evil.example.com"
        ));
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/certificate.rs]
