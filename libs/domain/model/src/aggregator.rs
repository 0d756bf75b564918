// INICIO DEL ARCHIVO [libs/domain/model/src/aggregator.rs]
//! Tenant y material de certificado cliente.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregator id reservado para sitios registrados via certificado de
/// dispositivo (sin agregador intermediario).
pub const NULL_AGGREGATOR_ID: i64 = 0;

/// Un tenant que posee un conjunto de Sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregator {
    pub aggregator_id: i64,
    pub name: String,
    /// Lista de FQDNs permitidos como destino de `notificationURI` para
    /// las suscripciones creadas bajo este agregador.
    pub domains: Vec<String>,
    pub changed_time: DateTime<Utc>,
}

/// Material de certificado cliente X.509, identificado por su LFDI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate_id: i64,
    /// 42 caracteres hex en minuscula, prefijados con "0x".
    pub lfdi: String,
    /// Entero sin signo de 63 bits.
    pub sfdi: i64,
    pub expiry: DateTime<Utc>,
}
// FIN DEL ARCHIVO [libs/domain/model/src/aggregator.rs]
