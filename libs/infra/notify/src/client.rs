// INICIO DEL ARCHIVO [libs/infra/notify/src/client.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION TRANSMISSION CLIENT (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ENTREGA HTTP DE NOTIFICACIONES A notification_uri
 *
 * Cada intento corre bajo su propio timeout; entre intentos se aplica
 * backoff exponencial. El cuerpo XML ya viene serializado por la capa
 * de orquestacion (apps/server); este cliente solo lo transporta.
 * =================================================================
 */

use crate::errors::NotifyError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

const NOTIFICATION_CONTENT_TYPE: &str = "application/sep2+xml";

pub struct NotifyClient {
    http: Client,
    max_attempts: u32,
    base_backoff: Duration,
}

impl NotifyClient {
    /// `per_attempt_timeout` limita cuanto espera un solo intento;
    /// `max_attempts` y `base_backoff` gobiernan el reintento exponencial
    /// entre intentos fallidos (`base_backoff * 2^(attempt-1)`).
    pub fn new(per_attempt_timeout: Duration, max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            http: Client::builder()
                .user_agent("sep2-server-notify/1.0")
                .timeout(per_attempt_timeout)
                .build()
                .expect("FATAL: notify client initialization failed"),
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// Envia `xml_body` (o un cuerpo vacio para notificaciones de
    /// metadata) a `notification_uri`, reintentando hasta `max_attempts`
    /// veces con backoff exponencial entre intentos.
    #[instrument(skip(self, xml_body), fields(notification_uri = %notification_uri))]
    pub async fn transmit_notification(
        &self,
        notification_uri: &str,
        xml_body: Option<String>,
    ) -> Result<(), NotifyError> {
        let body = xml_body.unwrap_or_default();

        for attempt in 1..=self.max_attempts {
            let request = self
                .http
                .post(notification_uri)
                .header(reqwest::header::CONTENT_TYPE, NOTIFICATION_CONTENT_TYPE)
                .body(body.clone());

            match request.send().await {
                Ok(response) if response.status() == StatusCode::OK
                    || response.status() == StatusCode::NO_CONTENT
                    || response.status() == StatusCode::CREATED =>
                {
                    info!("📨 [NOTIFY_SENT]: attempt {} delivered", attempt);
                    return Ok(());
                }
                Ok(response) => {
                    warn!(
                        "⚠️ [NOTIFY_REJECTED]: attempt {} got status {}",
                        attempt,
                        response.status()
                    );
                    if attempt == self.max_attempts {
                        return Err(NotifyError::SubscriberRejection(
                            response.status().as_u16(),
                        ));
                    }
                }
                Err(fault) => {
                    error!("❌ [NOTIFY_NET_FAULT]: attempt {} failed: {}", attempt, fault);
                    if attempt == self.max_attempts {
                        return Err(NotifyError::NetworkFault(fault));
                    }
                }
            }

            let backoff = self.base_backoff * 2u32.pow(attempt - 1);
            tokio::time::sleep(backoff).await;
        }

        Err(NotifyError::AttemptsExhausted(self.max_attempts))
    }
}
// FIN DEL ARCHIVO [libs/infra/notify/src/client.rs]
