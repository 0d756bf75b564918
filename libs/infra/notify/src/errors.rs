// INICIO DEL ARCHIVO [libs/infra/notify/src/errors.rs]
/*!
 * =================================================================
 * APARATO: NOTIFY CLIENT ERRORS (V1.0)
 * RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE ENTREGA DE NOTIFICACIONES
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("[L3_NOTIFY_NET_FAULT]: NOTIFICATION_UPLINK_SEVERED -> {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("[L3_NOTIFY_REJECTION]: subscriber returned status {0}")]
    SubscriberRejection(u16),

    #[error("[L3_NOTIFY_EXHAUSTED]: all {0} delivery attempts failed")]
    AttemptsExhausted(u32),

    #[error("[L3_NOTIFY_CONFIG_FAULT]: {0}")]
    ConfigurationError(String),
}
// FIN DEL ARCHIVO [libs/infra/notify/src/errors.rs]
