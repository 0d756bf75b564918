// INICIO DEL ARCHIVO [apps/server/src/main.rs]
/*!
 * =================================================================
 * APARATO: SERVER MAIN ENTRY POINT (V1.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO E IGNICIÓN DEL KERNEL
 * =================================================================
 */

use dotenvy::dotenv;
use sep2_server::prelude::*;
use sep2_shared_telemetry::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("sep2_server");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        info!("🛰️  [SEP2_SERVER]: Ignition sequence starting...");

        let database_connection_url = std::env::var("DATABASE_URL")
            .expect("CRITICAL_FAULT: DATABASE_URL not defined in runtime environment.");
        let database_access_token = std::env::var("TURSO_AUTH_TOKEN").ok();
        let listening_port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let admin_auth_token = std::env::var("ADMIN_AUTH_TOKEN")
            .expect("CRITICAL_FAULT: ADMIN_AUTH_TOKEN not defined in runtime environment.");
        let cert_pem_header =
            std::env::var("CERT_PEM_HEADER").unwrap_or_else(|_| "x-forwarded-client-cert".to_string());
        let iana_pen: u32 = std::env::var("IANA_PEN")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(37244);
        let href_prefix = std::env::var("HREF_PREFIX").ok();
        let registration_pin_override = std::env::var("STATIC_REGISTRATION_PIN")
            .ok()
            .and_then(|v| v.parse().ok());

        let kernel = ServerKernel::ignite(
            &database_connection_url,
            database_access_token,
            listening_port,
            admin_auth_token,
            cert_pem_header,
            iana_pen,
            href_prefix,
            registration_pin_override,
        )
        .await;

        info!("🚀 [SEP2_SERVER_ONLINE]: Operational on port {}.", listening_port);
        kernel.launch().await;

        Ok(())
    })
}
// FIN DEL ARCHIVO [apps/server/src/main.rs]
