// INICIO DEL ARCHIVO [libs/infra/db/src/repositories/doe.rs]
/*!
 * =================================================================
 * APARATO: DOE REPOSITORY (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ENVOLTURA/SUPERSESION DE DOE Y PAGINACION DE GRUPOS
 *
 * La decision de que fila se archiva o se marca `superseded` vive en
 * `sep2_domain_doe`; este repositorio solo traduce esa decision a SQL
 * dentro de una conexion compartida.
 * =================================================================
 */

use crate::errors::DbError;
use crate::repositories::archival::{copy_rows_into_archive, delete_rows_into_archive};
use crate::time::{parse_utc, to_rfc3339};
use crate::DbClient;
use chrono::{DateTime, Utc};
use libsql::{params, Row};
use sep2_domain_doe::{
    cancel_then_insert_matches, should_supersede, sort_active_does, ActiveDoeRow, DoeWindow,
    UpsertMode,
};
use sep2_domain_model::archive::Origin;
use sep2_domain_model::{DefaultSiteControl, DynamicOperatingEnvelope, SiteControlGroup};
use tracing::instrument;

const DOE_COLUMNS: &[&str] = &[
    "dynamic_operating_envelope_id",
    "site_control_group_id",
    "site_id",
    "start_time",
    "end_time",
    "duration_seconds",
    "import_limit_active_watts",
    "export_limit_watts",
    "superseded",
    "changed_time",
];

pub struct DoeRepository {
    client: DbClient,
}

impl DoeRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    fn map_live_row(row: &Row) -> Result<(DynamicOperatingEnvelope, bool), DbError> {
        let doe = DynamicOperatingEnvelope {
            dynamic_operating_envelope_id: row.get::<i64>(0)?,
            site_control_group_id: row.get::<i64>(1)?,
            site_id: row.get::<i64>(2)?,
            start_time: parse_utc(&row.get::<String>(3)?)?,
            end_time: row
                .get::<Option<String>>(4)?
                .map(|v| parse_utc(&v))
                .transpose()?,
            duration_seconds: row.get::<i64>(5)?,
            import_limit_active_watts: row.get::<Option<f64>>(6)?,
            export_limit_watts: row.get::<Option<f64>>(7)?,
            changed_time: parse_utc(&row.get::<String>(9)?)?,
        };
        let superseded = row.get::<i64>(8)? != 0;
        Ok((doe, superseded))
    }

    /// Inserta una DOE aplicando el modo de envoltura indicado. En modo
    /// `CancelThenInsert` archiva y elimina cualquier fila existente con
    /// el mismo `(group, start_time, site)`. En modo `Supersede` marca
    /// `superseded = 1` sobre cada fila viva que la nueva DOE supera.
    #[instrument(skip(self, doe))]
    pub async fn insert_doe(
        &self,
        doe: &DynamicOperatingEnvelope,
        submitted_group_primacy: i64,
        mode: UpsertMode,
    ) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;

        match mode {
            UpsertMode::CancelThenInsert => {
                let mut rows = connection
                    .query(
                        "SELECT dynamic_operating_envelope_id, site_control_group_id, site_id, start_time \
                         FROM dynamic_operating_envelopes WHERE site_id = ?1 AND superseded = 0",
                        params![doe.site_id],
                    )
                    .await?;
                let mut matches = Vec::new();
                while let Some(row) = rows.next().await? {
                    let existing_group = row.get::<i64>(1)?;
                    let existing_start = parse_utc(&row.get::<String>(3)?)?;
                    let existing_site = row.get::<i64>(2)?;
                    if cancel_then_insert_matches(
                        existing_group,
                        existing_start,
                        existing_site,
                        doe.site_control_group_id,
                        doe.start_time,
                        doe.site_id,
                    ) {
                        matches.push(row.get::<i64>(0)?);
                    }
                }
                for matched_id in matches {
                    delete_rows_into_archive(
                        &connection,
                        "dynamic_operating_envelopes",
                        "dynamic_operating_envelopes_archive",
                        DOE_COLUMNS,
                        "dynamic_operating_envelope_id = ?1",
                        vec![matched_id.into()],
                    )
                    .await?;
                }
            }
            UpsertMode::Supersede => {
                let end_time = doe.end_time.unwrap_or(
                    doe.start_time + chrono::Duration::seconds(doe.duration_seconds),
                );
                let submitted_window = DoeWindow {
                    start_time: doe.start_time,
                    end_time,
                };
                let mut rows = connection
                    .query(
                        "SELECT d.dynamic_operating_envelope_id, d.site_id, d.start_time, d.end_time, \
                                d.duration_seconds, g.primacy \
                         FROM dynamic_operating_envelopes d \
                         JOIN site_control_groups g ON g.site_control_group_id = d.site_control_group_id \
                         WHERE d.site_id = ?1 AND d.superseded = 0",
                        params![doe.site_id],
                    )
                    .await?;
                let mut to_supersede = Vec::new();
                while let Some(row) = rows.next().await? {
                    let existing_id = row.get::<i64>(0)?;
                    let existing_site = row.get::<i64>(1)?;
                    let existing_start = parse_utc(&row.get::<String>(2)?)?;
                    let existing_end = match row.get::<Option<String>>(3)? {
                        Some(v) => parse_utc(&v)?,
                        None => {
                            existing_start + chrono::Duration::seconds(row.get::<i64>(4)?)
                        }
                    };
                    let existing_primacy = row.get::<i64>(5)?;
                    let existing_window = DoeWindow {
                        start_time: existing_start,
                        end_time: existing_end,
                    };
                    if should_supersede(
                        existing_site,
                        existing_window,
                        existing_primacy,
                        doe.site_id,
                        submitted_window,
                        submitted_group_primacy,
                    ) {
                        to_supersede.push(existing_id);
                    }
                }
                for superseded_id in to_supersede {
                    copy_rows_into_archive(
                        &connection,
                        "dynamic_operating_envelopes",
                        "dynamic_operating_envelopes_archive",
                        DOE_COLUMNS,
                        "dynamic_operating_envelope_id = ?1",
                        vec![superseded_id.into()],
                    )
                    .await?;
                    connection
                        .execute(
                            "UPDATE dynamic_operating_envelopes SET superseded = 1 WHERE dynamic_operating_envelope_id = ?1",
                            params![superseded_id],
                        )
                        .await?;
                }
            }
        }

        connection
            .execute(
                "INSERT INTO dynamic_operating_envelopes \
                 (dynamic_operating_envelope_id, site_control_group_id, site_id, start_time, end_time, \
                  duration_seconds, import_limit_active_watts, export_limit_watts, superseded, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
                params![
                    doe.dynamic_operating_envelope_id,
                    doe.site_control_group_id,
                    doe.site_id,
                    to_rfc3339(doe.start_time),
                    doe.end_time.map(to_rfc3339),
                    doe.duration_seconds,
                    doe.import_limit_active_watts,
                    doe.export_limit_watts,
                    to_rfc3339(doe.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    /// Archiva y elimina toda DOE viva de `(group, site)` cuyo `start_time`
    /// caiga dentro del rango `[range_start, range_end)`.
    #[instrument(skip(self))]
    pub async fn delete_does_with_start_time_in_range(
        &self,
        site_control_group_id: i64,
        site_id: i64,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        delete_rows_into_archive(
            &connection,
            "dynamic_operating_envelopes",
            "dynamic_operating_envelopes_archive",
            DOE_COLUMNS,
            "site_control_group_id = ?1 AND site_id = ?2 AND start_time >= ?3 AND start_time < ?4",
            vec![
                site_control_group_id.into(),
                site_id.into(),
                to_rfc3339(range_start).into(),
                to_rfc3339(range_end).into(),
            ],
        )
        .await
    }

    /// `UNION ALL` de filas vivas y de archivo para un Site, filtradas por
    /// `end_time > now` (y opcionalmente por grupo de control), ordenadas
    /// por el mandato `(start_time ASC, changed_time DESC, id DESC)`.
    #[instrument(skip(self))]
    pub async fn select_active_does_include_deleted(
        &self,
        site_id: i64,
        site_control_group_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveDoeRow>, DbError> {
        let connection = self.client.get_connection()?;
        let now = to_rfc3339(now);
        let group_clause = if site_control_group_id.is_some() {
            " AND site_control_group_id = ?3"
        } else {
            ""
        };

        let live_sql = format!(
            "SELECT dynamic_operating_envelope_id, site_control_group_id, site_id, start_time, \
                    end_time, duration_seconds, import_limit_active_watts, export_limit_watts, \
                    superseded, changed_time \
             FROM dynamic_operating_envelopes \
             WHERE site_id = ?1 AND end_time > ?2{group_clause}"
        );
        let mut live_rows = match site_control_group_id {
            Some(group) => connection.query(&live_sql, params![site_id, now.clone(), group]).await?,
            None => connection.query(&live_sql, params![site_id, now.clone()]).await?,
        };
        let mut results = Vec::new();
        while let Some(row) = live_rows.next().await? {
            let (doe, _superseded) = Self::map_live_row(&row)?;
            results.push(ActiveDoeRow {
                effective_changed_time: doe.changed_time,
                doe,
                origin: Origin::Live,
            });
        }

        let archive_sql = format!(
            "SELECT dynamic_operating_envelope_id, site_control_group_id, site_id, start_time, \
                    end_time, duration_seconds, import_limit_active_watts, export_limit_watts, \
                    superseded, changed_time, deleted_time \
             FROM dynamic_operating_envelopes_archive \
             WHERE site_id = ?1 AND end_time > ?2 AND deleted_time IS NOT NULL{group_clause}"
        );
        let mut archive_rows = match site_control_group_id {
            Some(group) => connection.query(&archive_sql, params![site_id, now, group]).await?,
            None => connection.query(&archive_sql, params![site_id, now]).await?,
        };
        while let Some(row) = archive_rows.next().await? {
            let (doe, _superseded) = Self::map_live_row(&row)?;
            let effective_changed_time = match row.get::<Option<String>>(10)? {
                Some(v) => parse_utc(&v)?,
                None => doe.changed_time,
            };
            results.push(ActiveDoeRow {
                doe,
                origin: Origin::Archive,
                effective_changed_time,
            });
        }

        sort_active_does(&mut results);
        Ok(results)
    }

    /// Filtra el resultado de [`Self::select_active_does_include_deleted`]
    /// a la(s) fila(s) vigentes en un instante puntual.
    #[instrument(skip(self))]
    pub async fn select_does_at_timestamp(
        &self,
        site_id: i64,
        site_control_group_id: Option<i64>,
        at: DateTime<Utc>,
    ) -> Result<Vec<ActiveDoeRow>, DbError> {
        let all = self
            .select_active_does_include_deleted(site_id, site_control_group_id, at)
            .await?;
        Ok(all
            .into_iter()
            .filter(|row| {
                let end = row
                    .doe
                    .end_time
                    .unwrap_or(row.doe.start_time + chrono::Duration::seconds(row.doe.duration_seconds));
                row.doe.start_time <= at && at < end
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list_site_control_groups(
        &self,
        aggregator_id: i64,
        start: i64,
        limit: i64,
    ) -> Result<Vec<SiteControlGroup>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT site_control_group_id, aggregator_id, description, primacy, changed_time \
                 FROM site_control_groups WHERE aggregator_id = ?1 \
                 ORDER BY primacy ASC, site_control_group_id DESC LIMIT ?2 OFFSET ?3",
                params![aggregator_id, limit, start],
            )
            .await?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next().await? {
            groups.push(SiteControlGroup {
                site_control_group_id: row.get::<i64>(0)?,
                aggregator_id: row.get::<i64>(1)?,
                description: row.get::<String>(2)?,
                primacy: row.get::<i64>(3)?,
                changed_time: parse_utc(&row.get::<String>(4)?)?,
            });
        }
        Ok(groups)
    }

    /// Busca una DOE puntual (viva o archivada) por id, para resolver
    /// `GET /derc/{id}` sin depender de la ventana temporal activa.
    #[instrument(skip(self))]
    pub async fn get_doe_by_id(
        &self,
        dynamic_operating_envelope_id: i64,
    ) -> Result<Option<(DynamicOperatingEnvelope, bool)>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT dynamic_operating_envelope_id, site_control_group_id, site_id, start_time, \
                        end_time, duration_seconds, import_limit_active_watts, export_limit_watts, \
                        superseded, changed_time \
                 FROM dynamic_operating_envelopes WHERE dynamic_operating_envelope_id = ?1",
                params![dynamic_operating_envelope_id],
            )
            .await?;
        if let Some(row) = rows.next().await? {
            return Ok(Some(Self::map_live_row(&row)?));
        }
        let mut archived = connection
            .query(
                "SELECT dynamic_operating_envelope_id, site_control_group_id, site_id, start_time, \
                        end_time, duration_seconds, import_limit_active_watts, export_limit_watts, \
                        superseded, changed_time \
                 FROM dynamic_operating_envelopes_archive WHERE dynamic_operating_envelope_id = ?1 \
                 ORDER BY archive_id DESC LIMIT 1",
                params![dynamic_operating_envelope_id],
            )
            .await?;
        match archived.next().await? {
            Some(row) => Ok(Some(Self::map_live_row(&row)?)),
            None => Ok(None),
        }
    }

    /// El unico DefaultDERControl vigente de un `(group, site)`: sin
    /// historial, sombra de archivo solo para pre-imagen de update.
    #[instrument(skip(self))]
    pub async fn get_default_site_control(
        &self,
        site_control_group_id: i64,
        site_id: i64,
    ) -> Result<Option<DefaultSiteControl>, DbError> {
        let connection = self.client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT default_site_control_id, site_control_group_id, site_id, \
                        import_limit_active_watts, export_limit_watts, changed_time \
                 FROM default_site_controls WHERE site_control_group_id = ?1 AND site_id = ?2",
                params![site_control_group_id, site_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(DefaultSiteControl {
                default_site_control_id: row.get::<i64>(0)?,
                site_control_group_id: row.get::<i64>(1)?,
                site_id: row.get::<i64>(2)?,
                import_limit_active_watts: row.get::<Option<f64>>(3)?,
                export_limit_watts: row.get::<Option<f64>>(4)?,
                changed_time: parse_utc(&row.get::<String>(5)?)?,
            })),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, group))]
    pub async fn create_site_control_group(&self, group: &SiteControlGroup) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        connection
            .execute(
                "INSERT INTO site_control_groups (site_control_group_id, aggregator_id, description, primacy, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    group.site_control_group_id,
                    group.aggregator_id,
                    group.description.clone(),
                    group.primacy,
                    to_rfc3339(group.changed_time)
                ],
            )
            .await?;
        Ok(())
    }

    /// Crea o reemplaza el DefaultDERControl de un `(group, site)`,
    /// archivando la pre-imagen antes de pisarla.
    #[instrument(skip(self, default_control))]
    pub async fn upsert_default_site_control(
        &self,
        default_control: &DefaultSiteControl,
    ) -> Result<(), DbError> {
        let connection = self.client.get_connection()?;
        let columns: &[&str] = &[
            "default_site_control_id",
            "site_control_group_id",
            "site_id",
            "import_limit_active_watts",
            "export_limit_watts",
            "changed_time",
        ];
        copy_rows_into_archive(
            &connection,
            "default_site_controls",
            "default_site_controls_archive",
            columns,
            "site_control_group_id = ?1 AND site_id = ?2",
            vec![
                default_control.site_control_group_id.into(),
                default_control.site_id.into(),
            ],
        )
        .await?;
        connection
            .execute(
                "INSERT INTO default_site_controls \
                 (default_site_control_id, site_control_group_id, site_id, import_limit_active_watts, export_limit_watts, changed_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT(default_site_control_id) DO UPDATE SET site_control_group_id=excluded.site_control_group_id, \
                 site_id=excluded.site_id, import_limit_active_watts=excluded.import_limit_active_watts, \
                 export_limit_watts=excluded.export_limit_watts, changed_time=excluded.changed_time",
                params![
                    default_control.default_site_control_id,
                    default_control.site_control_group_id,
                    default_control.site_id,
                    default_control.import_limit_active_watts,
                    default_control.export_limit_watts,
                    to_rfc3339(default_control.changed_time)
                ],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn memory_client() -> DbClient {
        DbClient::connect("file::memory:?cache=shared", None)
            .await
            .expect("in-memory db connects")
    }

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, minute, 0).unwrap()
    }

    fn sample_doe(id: i64, group: i64, start_minute: u32) -> DynamicOperatingEnvelope {
        DynamicOperatingEnvelope {
            dynamic_operating_envelope_id: id,
            site_control_group_id: group,
            site_id: 1,
            start_time: ts(start_minute),
            end_time: Some(ts(start_minute + 10)),
            duration_seconds: 600,
            import_limit_active_watts: Some(1000.0),
            export_limit_watts: Some(1000.0),
            changed_time: ts(start_minute),
        }
    }

    #[tokio::test]
    async fn cancel_then_insert_replaces_same_slot() {
        let repo = DoeRepository::new(memory_client().await);
        let group = SiteControlGroup {
            site_control_group_id: 1,
            aggregator_id: 1,
            description: "default".into(),
            primacy: 0,
            changed_time: ts(0),
        };
        repo.create_site_control_group(&group).await.unwrap();

        let first = sample_doe(1, 1, 0);
        repo.insert_doe(&first, 0, UpsertMode::CancelThenInsert)
            .await
            .unwrap();

        let replacement = sample_doe(2, 1, 0);
        repo.insert_doe(&replacement, 0, UpsertMode::CancelThenInsert)
            .await
            .unwrap();

        let rows = repo
            .select_active_does_include_deleted(1, None, ts(5))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].doe.dynamic_operating_envelope_id, 2);
    }

    #[tokio::test]
    async fn expired_does_are_excluded_from_the_active_list() {
        let repo = DoeRepository::new(memory_client().await);
        let group = SiteControlGroup {
            site_control_group_id: 1,
            aggregator_id: 1,
            description: "default".into(),
            primacy: 0,
            changed_time: ts(0),
        };
        repo.create_site_control_group(&group).await.unwrap();

        let doe = sample_doe(1, 1, 0);
        repo.insert_doe(&doe, 0, UpsertMode::CancelThenInsert)
            .await
            .unwrap();

        let still_active = repo
            .select_active_does_include_deleted(1, None, ts(5))
            .await
            .unwrap();
        assert_eq!(still_active.len(), 1);

        let expired = repo
            .select_active_does_include_deleted(1, None, ts(11))
            .await
            .unwrap();
        assert!(expired.is_empty());

        let wrong_group = repo
            .select_active_does_include_deleted(1, Some(2), ts(5))
            .await
            .unwrap();
        assert!(wrong_group.is_empty());
    }

    #[tokio::test]
    async fn supersede_flags_lower_priority_overlap() {
        let repo = DoeRepository::new(memory_client().await);
        let low = SiteControlGroup {
            site_control_group_id: 1,
            aggregator_id: 1,
            description: "low".into(),
            primacy: 10,
            changed_time: ts(0),
        };
        let high = SiteControlGroup {
            site_control_group_id: 2,
            aggregator_id: 1,
            description: "high".into(),
            primacy: 0,
            changed_time: ts(0),
        };
        repo.create_site_control_group(&low).await.unwrap();
        repo.create_site_control_group(&high).await.unwrap();

        let base = sample_doe(1, 1, 0);
        repo.insert_doe(&base, 10, UpsertMode::Supersede)
            .await
            .unwrap();

        let overriding = sample_doe(2, 2, 2);
        repo.insert_doe(&overriding, 0, UpsertMode::Supersede)
            .await
            .unwrap();

        let connection = repo.client.get_connection().unwrap();
        let mut rows = connection
            .query(
                "SELECT superseded FROM dynamic_operating_envelopes WHERE dynamic_operating_envelope_id = 1",
                (),
            )
            .await
            .unwrap();
        let superseded: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(superseded, 1);

        let mut archived = connection
            .query(
                "SELECT superseded FROM dynamic_operating_envelopes_archive WHERE dynamic_operating_envelope_id = 1",
                (),
            )
            .await
            .unwrap();
        let archived_row = archived.next().await.unwrap();
        assert!(
            archived_row.is_some(),
            "superseding must archive the pre-image, not just flip the live row"
        );
    }
}
// FIN DEL ARCHIVO [libs/infra/db/src/repositories/doe.rs]
