// INICIO DEL ARCHIVO [apps/server/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE (V1.0)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: CONTENEDOR DE ESTADO COMPARTIDO DEL SERVIDOR
 *
 * Centraliza el cliente de base de datos, los siete repositorios, el
 * cliente de notificacion saliente y la configuracion de runtime
 * cacheada. Analogo al `AppState` del orquestador original, reducido al
 * dominio 2030.5.
 * =================================================================
 */

use sep2_infra_db::{
    AggregatorRepository, CertificateRepository, ConfigRepository, DbClient, DoeRepository,
    ReadingRepository, SiteRepository, SubscriptionRepository, TariffRepository,
};
use sep2_infra_notify::NotifyClient;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::Sender;
use tracing::{error, info, instrument, warn};

use sep2_domain_model::RuntimeServerConfig;

/// Modos de salud del sistema para la interceptación de middleware perimetral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMode {
    /// El sistema procesa ráfagas HTTP de forma nominal.
    Operational,
    /// El sistema ha suspendido el despacho por mantenimiento o fallo de arranque.
    Maintenance(String),
}

/// Tarea de notificación saliente encolada por el batcher hacia el broker.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub notification_uri: String,
    pub xml_body: Option<String>,
}

/// Contenedor de estado compartido (Thread-Safe) del servidor.
#[derive(Clone)]
pub struct AppState {
    pub database_client: DbClient,
    pub notify_client: Arc<NotifyClient>,
    pub notification_queue: Sender<NotificationJob>,
    pub current_system_mode: Arc<RwLock<SystemMode>>,
    pub runtime_config: Arc<RwLock<RuntimeServerConfig>>,
    pub admin_auth_token: Arc<String>,
    pub cert_pem_header: Arc<String>,
    pub iana_pen: u32,
    pub href_prefix: Option<Arc<String>>,
    /// Valor fijo de `STATIC_REGISTRATION_PIN` (gancho de pruebas); si es
    /// `None`, el PIN de registro se deriva del `sfdi` del Site.
    pub registration_pin_override: Option<i64>,

    pub aggregator_repository: Arc<AggregatorRepository>,
    pub certificate_repository: Arc<CertificateRepository>,
    pub config_repository: Arc<ConfigRepository>,
    pub doe_repository: Arc<DoeRepository>,
    pub reading_repository: Arc<ReadingRepository>,
    pub site_repository: Arc<SiteRepository>,
    pub subscription_repository: Arc<SubscriptionRepository>,
    pub tariff_repository: Arc<TariffRepository>,
}

impl AppState {
    /// Forja el estado compartido inyectando todos los repositorios y clientes.
    pub fn new(
        database_client: DbClient,
        notify_client: NotifyClient,
        notification_queue: Sender<NotificationJob>,
        admin_auth_token: String,
        cert_pem_header: String,
        iana_pen: u32,
        href_prefix: Option<String>,
        registration_pin_override: Option<i64>,
    ) -> Self {
        Self {
            aggregator_repository: Arc::new(AggregatorRepository::new(database_client.clone())),
            certificate_repository: Arc::new(CertificateRepository::new(database_client.clone())),
            config_repository: Arc::new(ConfigRepository::new(database_client.clone())),
            doe_repository: Arc::new(DoeRepository::new(database_client.clone())),
            reading_repository: Arc::new(ReadingRepository::new(database_client.clone())),
            site_repository: Arc::new(SiteRepository::new(database_client.clone())),
            subscription_repository: Arc::new(SubscriptionRepository::new(database_client.clone())),
            tariff_repository: Arc::new(TariffRepository::new(database_client.clone())),
            database_client,
            notify_client: Arc::new(notify_client),
            notification_queue,
            current_system_mode: Arc::new(RwLock::new(SystemMode::Maintenance(
                "BOOTING".to_string(),
            ))),
            runtime_config: Arc::new(RwLock::new(RuntimeServerConfig::default())),
            admin_auth_token: Arc::new(admin_auth_token),
            cert_pem_header: Arc::new(cert_pem_header),
            iana_pen,
            href_prefix: href_prefix.map(Arc::new),
            registration_pin_override,
        }
    }

    pub fn iana_pen(&self) -> u32 {
        self.iana_pen
    }

    pub fn href_prefix(&self) -> Option<String> {
        self.href_prefix.as_ref().map(|s| s.as_str().to_string())
    }

    /// Sincroniza el modo operativo del servidor para el control de acceso.
    #[instrument(skip(self))]
    pub fn set_mode(&self, target_mode: SystemMode) {
        match self.current_system_mode.write() {
            Ok(mut guard) => {
                info!("🔄 [STATE_SHIFT]: System transitioning to mode: {:?}", target_mode);
                *guard = target_mode;
            }
            Err(poison) => error!("💀 [KERNEL_FAULT]: System mode lock poisoned: {}", poison),
        }
    }

    #[instrument(skip(self), level = "debug")]
    pub fn is_operational(&self) -> Result<(), String> {
        let guard = self
            .current_system_mode
            .read()
            .map_err(|e| format!("LOCK_POISON_FAULT: {e}"))?;
        match &*guard {
            SystemMode::Operational => Ok(()),
            SystemMode::Maintenance(reason) => {
                warn!("⛔ [ACCESS_DENIED]: Server under maintenance: {}", reason);
                Err(reason.clone())
            }
        }
    }

    /// Recarga la configuracion en caché desde la base de datos; se invoca
    /// tras cada commit del admin endpoint de configuración.
    #[instrument(skip(self))]
    pub async fn reload_runtime_config(&self) -> Result<(), sep2_infra_db::DbError> {
        let fresh = self.config_repository.get_current_config().await?;
        match self.runtime_config.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poison) => error!("💀 [KERNEL_FAULT]: Runtime config lock poisoned: {}", poison),
        }
        Ok(())
    }

    pub fn current_config(&self) -> RuntimeServerConfig {
        self.runtime_config
            .read()
            .expect("runtime config lock poisoned")
            .clone()
    }
}
// FIN DEL ARCHIVO [apps/server/src/state/mod.rs]
