// INICIO DEL ARCHIVO [libs/infra/db/src/schema.rs]
/*!
 * =================================================================
 * APARATO: SEP2 DATABASE SCHEMA (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Cada entidad mutable tiene una sombra de archivo con las mismas
 * columnas mas archive_id/archive_time/deleted_time, sin claves foraneas.
 * Aggregators, Tariffs, SiteControlGroups y Certificates son creados por
 * el administrador y son efectivamente permanentes: no llevan sombra.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, instrument};

const SOVEREIGN_TABLES: &[(&str, &str)] = &[
    ("TABLE_AGGREGATORS", r#"
        CREATE TABLE IF NOT EXISTS aggregators (
            aggregator_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            domains TEXT NOT NULL DEFAULT '[]',
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_CERTIFICATES", r#"
        CREATE TABLE IF NOT EXISTS certificates (
            certificate_id INTEGER PRIMARY KEY,
            lfdi TEXT NOT NULL UNIQUE,
            sfdi INTEGER NOT NULL,
            expiry TEXT NOT NULL
        );
    "#),
    ("TABLE_AGGREGATOR_CERTIFICATE_ASSIGNMENTS", r#"
        CREATE TABLE IF NOT EXISTS aggregator_certificate_assignments (
            aggregator_id INTEGER NOT NULL,
            certificate_id INTEGER NOT NULL,
            PRIMARY KEY (aggregator_id, certificate_id)
        );
    "#),
    ("TABLE_SITES", r#"
        CREATE TABLE IF NOT EXISTS sites (
            site_id INTEGER PRIMARY KEY,
            aggregator_id INTEGER NOT NULL,
            lfdi TEXT NOT NULL,
            sfdi INTEGER NOT NULL,
            device_category INTEGER NOT NULL DEFAULT 0,
            nmi TEXT,
            timezone_id TEXT NOT NULL DEFAULT 'UTC',
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_SITES_ARCHIVE", r#"
        CREATE TABLE IF NOT EXISTS sites_archive (
            archive_id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id INTEGER NOT NULL,
            aggregator_id INTEGER NOT NULL,
            lfdi TEXT NOT NULL,
            sfdi INTEGER NOT NULL,
            device_category INTEGER NOT NULL,
            nmi TEXT,
            timezone_id TEXT NOT NULL,
            changed_time TEXT NOT NULL,
            archive_time TEXT NOT NULL,
            deleted_time TEXT
        );
    "#),
    ("TABLE_SITE_DER_RATINGS", r#"
        CREATE TABLE IF NOT EXISTS site_der_ratings (
            site_der_rating_id INTEGER PRIMARY KEY,
            site_id INTEGER NOT NULL,
            modes_supported INTEGER NOT NULL DEFAULT 0,
            max_w INTEGER NOT NULL DEFAULT 0,
            max_var INTEGER NOT NULL DEFAULT 0,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_SITE_DER_RATINGS_ARCHIVE", r#"
        CREATE TABLE IF NOT EXISTS site_der_ratings_archive (
            archive_id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_der_rating_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            modes_supported INTEGER NOT NULL,
            max_w INTEGER NOT NULL,
            max_var INTEGER NOT NULL,
            changed_time TEXT NOT NULL,
            archive_time TEXT NOT NULL,
            deleted_time TEXT
        );
    "#),
    ("TABLE_SITE_DER_AVAILABILITIES", r#"
        CREATE TABLE IF NOT EXISTS site_der_availabilities (
            site_der_availability_id INTEGER PRIMARY KEY,
            site_id INTEGER NOT NULL,
            available_w INTEGER,
            reading_time TEXT NOT NULL,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_SITE_DER_AVAILABILITIES_ARCHIVE", r#"
        CREATE TABLE IF NOT EXISTS site_der_availabilities_archive (
            archive_id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_der_availability_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            available_w INTEGER,
            reading_time TEXT NOT NULL,
            changed_time TEXT NOT NULL,
            archive_time TEXT NOT NULL,
            deleted_time TEXT
        );
    "#),
    ("TABLE_SITE_DER_SETTINGS", r#"
        CREATE TABLE IF NOT EXISTS site_der_settings (
            site_der_setting_id INTEGER PRIMARY KEY,
            site_id INTEGER NOT NULL,
            modes_enabled INTEGER NOT NULL DEFAULT 0,
            grad_w INTEGER,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_SITE_DER_SETTINGS_ARCHIVE", r#"
        CREATE TABLE IF NOT EXISTS site_der_settings_archive (
            archive_id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_der_setting_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            modes_enabled INTEGER NOT NULL,
            grad_w INTEGER,
            changed_time TEXT NOT NULL,
            archive_time TEXT NOT NULL,
            deleted_time TEXT
        );
    "#),
    ("TABLE_SITE_DER_STATUSES", r#"
        CREATE TABLE IF NOT EXISTS site_der_statuses (
            site_der_status_id INTEGER PRIMARY KEY,
            site_id INTEGER NOT NULL,
            operational_mode_status INTEGER,
            generator_connect_status INTEGER,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_SITE_DER_STATUSES_ARCHIVE", r#"
        CREATE TABLE IF NOT EXISTS site_der_statuses_archive (
            archive_id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_der_status_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            operational_mode_status INTEGER,
            generator_connect_status INTEGER,
            changed_time TEXT NOT NULL,
            archive_time TEXT NOT NULL,
            deleted_time TEXT
        );
    "#),
    ("TABLE_SITE_CONTROL_GROUPS", r#"
        CREATE TABLE IF NOT EXISTS site_control_groups (
            site_control_group_id INTEGER PRIMARY KEY,
            aggregator_id INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            primacy INTEGER NOT NULL DEFAULT 0,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_DYNAMIC_OPERATING_ENVELOPES", r#"
        CREATE TABLE IF NOT EXISTS dynamic_operating_envelopes (
            dynamic_operating_envelope_id INTEGER PRIMARY KEY,
            site_control_group_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT,
            duration_seconds INTEGER NOT NULL,
            import_limit_active_watts REAL,
            export_limit_watts REAL,
            superseded INTEGER NOT NULL DEFAULT 0,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_DYNAMIC_OPERATING_ENVELOPES_ARCHIVE", r#"
        CREATE TABLE IF NOT EXISTS dynamic_operating_envelopes_archive (
            archive_id INTEGER PRIMARY KEY AUTOINCREMENT,
            dynamic_operating_envelope_id INTEGER NOT NULL,
            site_control_group_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT,
            duration_seconds INTEGER NOT NULL,
            import_limit_active_watts REAL,
            export_limit_watts REAL,
            superseded INTEGER NOT NULL,
            changed_time TEXT NOT NULL,
            archive_time TEXT NOT NULL,
            deleted_time TEXT
        );
    "#),
    ("TABLE_DEFAULT_SITE_CONTROLS", r#"
        CREATE TABLE IF NOT EXISTS default_site_controls (
            default_site_control_id INTEGER PRIMARY KEY,
            site_control_group_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            import_limit_active_watts REAL,
            export_limit_watts REAL,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_DEFAULT_SITE_CONTROLS_ARCHIVE", r#"
        CREATE TABLE IF NOT EXISTS default_site_controls_archive (
            archive_id INTEGER PRIMARY KEY AUTOINCREMENT,
            default_site_control_id INTEGER NOT NULL,
            site_control_group_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            import_limit_active_watts REAL,
            export_limit_watts REAL,
            changed_time TEXT NOT NULL,
            archive_time TEXT NOT NULL,
            deleted_time TEXT
        );
    "#),
    ("TABLE_TARIFFS", r#"
        CREATE TABLE IF NOT EXISTS tariffs (
            tariff_id INTEGER PRIMARY KEY,
            aggregator_id INTEGER NOT NULL,
            dnsp_code TEXT NOT NULL DEFAULT '',
            currency_code INTEGER NOT NULL DEFAULT 36,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_TARIFF_GENERATED_RATES", r#"
        CREATE TABLE IF NOT EXISTS tariff_generated_rates (
            tariff_generated_rate_id INTEGER PRIMARY KEY,
            tariff_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            duration_seconds INTEGER NOT NULL,
            import_active_price INTEGER,
            export_active_price INTEGER,
            import_reactive_price INTEGER,
            export_reactive_price INTEGER,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_TARIFF_GENERATED_RATES_ARCHIVE", r#"
        CREATE TABLE IF NOT EXISTS tariff_generated_rates_archive (
            archive_id INTEGER PRIMARY KEY AUTOINCREMENT,
            tariff_generated_rate_id INTEGER NOT NULL,
            tariff_id INTEGER NOT NULL,
            site_id INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            duration_seconds INTEGER NOT NULL,
            import_active_price INTEGER,
            export_active_price INTEGER,
            import_reactive_price INTEGER,
            export_reactive_price INTEGER,
            changed_time TEXT NOT NULL,
            archive_time TEXT NOT NULL,
            deleted_time TEXT
        );
    "#),
    ("TABLE_SITE_READING_TYPES", r#"
        CREATE TABLE IF NOT EXISTS site_reading_types (
            site_reading_type_id INTEGER PRIMARY KEY,
            site_id INTEGER NOT NULL,
            uom INTEGER NOT NULL,
            data_qualifier INTEGER NOT NULL,
            flow_direction INTEGER NOT NULL,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_SITE_READINGS", r#"
        CREATE TABLE IF NOT EXISTS site_readings (
            site_reading_id INTEGER PRIMARY KEY,
            site_reading_type_id INTEGER NOT NULL,
            time_period_start TEXT NOT NULL,
            time_period_seconds INTEGER NOT NULL,
            value INTEGER NOT NULL,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_SUBSCRIPTIONS", r#"
        CREATE TABLE IF NOT EXISTS subscriptions (
            subscription_id INTEGER PRIMARY KEY,
            aggregator_id INTEGER NOT NULL,
            resource_type TEXT NOT NULL,
            resource_id INTEGER,
            scoped_site_id INTEGER,
            notification_uri TEXT NOT NULL,
            entity_limit INTEGER NOT NULL DEFAULT 1,
            condition_attribute TEXT,
            condition_lower_threshold INTEGER,
            condition_upper_threshold INTEGER,
            changed_time TEXT NOT NULL
        );
    "#),
    ("TABLE_SUBSCRIPTIONS_ARCHIVE", r#"
        CREATE TABLE IF NOT EXISTS subscriptions_archive (
            archive_id INTEGER PRIMARY KEY AUTOINCREMENT,
            subscription_id INTEGER NOT NULL,
            aggregator_id INTEGER NOT NULL,
            resource_type TEXT NOT NULL,
            resource_id INTEGER,
            scoped_site_id INTEGER,
            notification_uri TEXT NOT NULL,
            entity_limit INTEGER NOT NULL,
            condition_attribute TEXT,
            condition_lower_threshold INTEGER,
            condition_upper_threshold INTEGER,
            changed_time TEXT NOT NULL,
            archive_time TEXT NOT NULL,
            deleted_time TEXT
        );
    "#),
    ("TABLE_RUNTIME_SERVER_CONFIG", r#"
        CREATE TABLE IF NOT EXISTS runtime_server_config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            dcap_pollrate_seconds INTEGER NOT NULL DEFAULT 300,
            edevl_pollrate_seconds INTEGER NOT NULL DEFAULT 300,
            fsal_pollrate_seconds INTEGER NOT NULL DEFAULT 300,
            derpl_pollrate_seconds INTEGER NOT NULL DEFAULT 300,
            site_control_pow10_encoding INTEGER NOT NULL DEFAULT -4,
            disable_edev_registration INTEGER NOT NULL DEFAULT 0,
            changed_time TEXT NOT NULL
        );
    "#),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_SITES_AGGREGATOR", "CREATE INDEX IF NOT EXISTS idx_sites_aggregator ON sites(aggregator_id);"),
    ("IDX_DOE_GROUP_SITE_END", "CREATE INDEX IF NOT EXISTS idx_doe_group_site_end ON dynamic_operating_envelopes(site_control_group_id, site_id, end_time);"),
    ("IDX_DOE_ARCHIVE_GROUP_SITE_DELETED", "CREATE INDEX IF NOT EXISTS idx_doe_archive_group_site_deleted ON dynamic_operating_envelopes_archive(site_control_group_id, site_id, deleted_time);"),
    ("IDX_RATES_TARIFF_SITE_DATE", "CREATE INDEX IF NOT EXISTS idx_rates_tariff_site_date ON tariff_generated_rates(tariff_id, site_id, start_date);"),
    ("IDX_SUBSCRIPTIONS_AGGREGATOR", "CREATE INDEX IF NOT EXISTS idx_subscriptions_aggregator ON subscriptions(aggregator_id);"),
];

/// Ejecuta la secuencia maestra de sincronizacion del esquema estructural.
#[instrument(skip(database_connection))]
pub async fn apply_sep2_schema(database_connection: &Connection) -> Result<()> {
    for (identifier, sql) in SOVEREIGN_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        database_connection
            .execute(sql, ())
            .await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {identifier}"))?;
    }
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        database_connection
            .execute(sql, ())
            .await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {identifier}"))?;
    }
    Ok(())
}
// FIN DEL ARCHIVO [libs/infra/db/src/schema.rs]
