// INICIO DEL ARCHIVO [apps/server/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: SERVER KERNEL (V1.0)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: IGNICIÓN DE INFRAESTRUCTURA Y SUPERFICIE HTTP
 * =================================================================
 */

use crate::bootstrap::Bootstrap;
use crate::routes::create_sovereign_router;
use crate::state::{AppState, NotificationJob};
use sep2_infra_db::DbClient;
use sep2_infra_notify::NotifyClient;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Capacidad del canal en memoria que hace las veces de broker de
/// notificaciones: el batcher encola, un daemon de fondo drena.
const NOTIFICATION_QUEUE_CAPACITY: usize = 1024;

pub struct ServerKernel {
    pub server_network_port: u16,
    pub application_state: AppState,
    notification_receiver: Option<tokio::sync::mpsc::Receiver<NotificationJob>>,
}

impl ServerKernel {
    /// Conecta la base de datos y construye el estado compartido.
    #[instrument(skip(database_access_token, admin_auth_token))]
    pub async fn ignite(
        database_connection_url: &str,
        database_access_token: Option<String>,
        listening_port: u16,
        admin_auth_token: String,
        cert_pem_header: String,
        iana_pen: u32,
        href_prefix: Option<String>,
        registration_pin_override: Option<i64>,
    ) -> Self {
        let database_client = DbClient::connect(database_connection_url, database_access_token)
            .await
            .expect("FATAL: Database link collapse. Ignition aborted.");

        let notify_client = NotifyClient::new(
            Duration::from_secs(10),
            5,
            Duration::from_millis(250),
        );

        let (sender, receiver) = tokio::sync::mpsc::channel(NOTIFICATION_QUEUE_CAPACITY);

        let application_state = AppState::new(
            database_client,
            notify_client,
            sender,
            admin_auth_token,
            cert_pem_header,
            iana_pen,
            href_prefix,
            registration_pin_override,
        );

        Self {
            server_network_port: listening_port,
            application_state,
            notification_receiver: Some(receiver),
        }
    }

    /// Lanza el daemon de despacho de notificaciones y el servidor HTTP.
    pub async fn launch(mut self) {
        let shared_state = self.application_state.clone();

        // 1. DIAGNÓSTICO DE ARRANQUE (Carga de configuracion, flip a Operational)
        Bootstrap::spawn_diagnostics(shared_state.clone());

        // 2. DAEMON DE DESPACHO DE NOTIFICACIONES (broker en proceso)
        let mut receiver = self
            .notification_receiver
            .take()
            .expect("notification receiver consumed exactly once");
        let notify_client = shared_state.notify_client.clone();
        tokio::spawn(async move {
            info!("📡 [NOTIFY_DAEMON]: Notification dispatch loop online.");
            while let Some(job) = receiver.recv().await {
                let uri = job.notification_uri.clone();
                if let Err(fault) = notify_client
                    .transmit_notification(&job.notification_uri, job.xml_body)
                    .await
                {
                    warn!(
                        "⚠️ [NOTIFY_DROPPED]: Delivery to {} exhausted retries: {}",
                        uri, fault
                    );
                }
            }
        });

        // 3. IGNICIÓN DEL TRANSPORTE HTTP (AXUM)
        let router = create_sovereign_router(shared_state);

        let bind_address = SocketAddr::new(
            "0.0.0.0".parse::<IpAddr>().unwrap(),
            self.server_network_port,
        );

        info!("🚀 [KERNEL_ONLINE]: sep2 server listening at {}", bind_address);

        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("CRITICAL_FAULT: Failed to bind network port.");

        if let Err(server_error) = axum::serve(listener, router).await {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_error);
            std::process::exit(1);
        }
    }
}
// FIN DEL ARCHIVO [apps/server/src/kernel.rs]
