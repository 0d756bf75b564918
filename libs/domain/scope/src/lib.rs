// INICIO DEL ARCHIVO [libs/domain/scope/src/lib.rs]
/*!
 * =================================================================
 * APARATO: REQUEST SCOPE DERIVATION (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: TRADUCIR CLAIMS DE CERTIFICADO EN SCOPES TIPADOS
 * =================================================================
 */

use sep2_domain_model::{NULL_AGGREGATOR_ID, VIRTUAL_END_DEVICE_SITE_ID};
use thiserror::Error;

pub mod lfdi;
pub use lfdi::{compute_lfdi_from_url_encoded_pem, LfdiError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("[SCOPE_FORBIDDEN]: {0}")]
    Forbidden(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertSource {
    AggregatorCert,
    DeviceCert,
}

/// Afirmaciones extraidas del certificado cliente presentado en el
/// handshake TLS, ya resueltas contra la tabla `Certificate`/`Site`.
#[derive(Debug, Clone)]
pub struct Claims {
    pub source: CertSource,
    pub lfdi: String,
    pub sfdi: i64,
    pub iana_pen: u32,
    pub href_prefix: Option<String>,
    pub aggregator_id_scope: Option<i64>,
    pub site_id_scope: Option<i64>,
}

/// Campos comunes a todo scope derivado, usados por mrid y href aguas abajo.
#[derive(Debug, Clone)]
pub struct ScopeIdentity {
    pub lfdi: String,
    pub sfdi: i64,
    pub href_prefix: Option<String>,
    pub iana_pen: u32,
}

impl ScopeIdentity {
    fn from_claims(claims: &Claims) -> Self {
        Self {
            lfdi: claims.lfdi.clone(),
            sfdi: claims.sfdi,
            href_prefix: claims.href_prefix.clone(),
            iana_pen: claims.iana_pen,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnregisteredRequestScope {
    pub identity: ScopeIdentity,
    pub aggregator_id: i64,
}

#[derive(Debug, Clone)]
pub struct DeviceOrAggregatorRequestScope {
    pub identity: ScopeIdentity,
    pub aggregator_id: i64,
    pub site_id: i64,
}

#[derive(Debug, Clone)]
pub struct AggregatorRequestScope {
    pub identity: ScopeIdentity,
    pub aggregator_id: i64,
    pub site_id: i64,
}

#[derive(Debug, Clone)]
pub struct SiteRequestScope {
    pub identity: ScopeIdentity,
    pub aggregator_id: i64,
    pub site_id: i64,
}

#[derive(Debug, Clone)]
pub struct MUPListRequestScope {
    pub identity: ScopeIdentity,
    pub aggregator_id: i64,
}

#[derive(Debug, Clone)]
pub struct MUPRequestScope {
    pub identity: ScopeIdentity,
    pub aggregator_id: i64,
    pub site_reading_type_id: i64,
}

/// `UnregisteredRequestScope` acepta cualquier claim; no hay fallo posible.
pub fn derive_unregistered_scope(claims: &Claims) -> UnregisteredRequestScope {
    UnregisteredRequestScope {
        identity: ScopeIdentity::from_claims(claims),
        aggregator_id: claims.aggregator_id_scope.unwrap_or(NULL_AGGREGATOR_ID),
    }
}

/// Resuelve `aggregator_id`/`site_id` efectivos para los scopes que eligen
/// entre un site concreto y el end-device virtual del agregador.
fn resolve_aggregator_or_device(
    claims: &Claims,
    requested_site_id: Option<i64>,
) -> Result<(i64, i64), ScopeError> {
    match (claims.aggregator_id_scope, claims.site_id_scope) {
        (Some(_), Some(_)) => Err(ScopeError::Forbidden(
            "aggregator_id_scope and site_id_scope both set is not a supported claim shape"
                .to_string(),
        )),
        (Some(aggregator_id), None) => {
            let site_id = requested_site_id.unwrap_or(VIRTUAL_END_DEVICE_SITE_ID);
            Ok((aggregator_id, site_id))
        }
        (None, Some(scoped_site_id)) => {
            if let Some(requested) = requested_site_id {
                if requested != scoped_site_id {
                    return Err(ScopeError::Forbidden(format!(
                        "Client {} is scoped to EndDevice {scoped_site_id}",
                        claims.lfdi
                    )));
                }
            }
            Ok((NULL_AGGREGATOR_ID, scoped_site_id))
        }
        (None, None) => Err(ScopeError::Forbidden(
            "device certificate has no registered site".to_string(),
        )),
    }
}

pub fn derive_device_or_aggregator_scope(
    claims: &Claims,
    requested_site_id: Option<i64>,
) -> Result<DeviceOrAggregatorRequestScope, ScopeError> {
    let (aggregator_id, site_id) = resolve_aggregator_or_device(claims, requested_site_id)?;
    Ok(DeviceOrAggregatorRequestScope {
        identity: ScopeIdentity::from_claims(claims),
        aggregator_id,
        site_id,
    })
}

pub fn derive_aggregator_scope(
    claims: &Claims,
    requested_site_id: Option<i64>,
) -> Result<AggregatorRequestScope, ScopeError> {
    let (aggregator_id, site_id) = resolve_aggregator_or_device(claims, requested_site_id)?;
    if aggregator_id == NULL_AGGREGATOR_ID {
        return Err(ScopeError::Forbidden(
            "the null aggregator cannot hold an AggregatorRequestScope".to_string(),
        ));
    }
    Ok(AggregatorRequestScope {
        identity: ScopeIdentity::from_claims(claims),
        aggregator_id,
        site_id,
    })
}

pub fn derive_site_scope(
    claims: &Claims,
    requested_site_id: i64,
) -> Result<SiteRequestScope, ScopeError> {
    if requested_site_id == VIRTUAL_END_DEVICE_SITE_ID {
        return Err(ScopeError::Forbidden(
            "the virtual end-device id cannot be used as a concrete site scope".to_string(),
        ));
    }
    let (aggregator_id, site_id) = resolve_aggregator_or_device(claims, Some(requested_site_id))?;
    Ok(SiteRequestScope {
        identity: ScopeIdentity::from_claims(claims),
        aggregator_id,
        site_id,
    })
}

pub fn derive_mup_list_scope(claims: &Claims) -> MUPListRequestScope {
    MUPListRequestScope {
        identity: ScopeIdentity::from_claims(claims),
        aggregator_id: claims.aggregator_id_scope.unwrap_or(NULL_AGGREGATOR_ID),
    }
}

pub fn derive_mup_scope(
    claims: &Claims,
    site_reading_type_id: i64,
) -> Result<MUPRequestScope, ScopeError> {
    let aggregator_id = claims.aggregator_id_scope.unwrap_or(NULL_AGGREGATOR_ID);
    Ok(MUPRequestScope {
        identity: ScopeIdentity::from_claims(claims),
        aggregator_id,
        site_reading_type_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator_claims() -> Claims {
        Claims {
            source: CertSource::AggregatorCert,
            lfdi: "0xabc".into(),
            sfdi: 1,
            iana_pen: 1,
            href_prefix: None,
            aggregator_id_scope: Some(7),
            site_id_scope: None,
        }
    }

    fn device_claims(site_id_scope: Option<i64>) -> Claims {
        Claims {
            source: CertSource::DeviceCert,
            lfdi: "0xdef".into(),
            sfdi: 2,
            iana_pen: 1,
            href_prefix: None,
            aggregator_id_scope: None,
            site_id_scope,
        }
    }

    #[test]
    fn aggregator_with_no_requested_site_resolves_to_virtual_device() {
        let claims = aggregator_claims();
        let scope = derive_device_or_aggregator_scope(&claims, None).unwrap();
        assert_eq!(scope.aggregator_id, 7);
        assert_eq!(scope.site_id, VIRTUAL_END_DEVICE_SITE_ID);
    }

    #[test]
    fn aggregator_with_requested_site_uses_it() {
        let claims = aggregator_claims();
        let scope = derive_device_or_aggregator_scope(&claims, Some(42)).unwrap();
        assert_eq!(scope.site_id, 42);
    }

    #[test]
    fn unregistered_device_cert_is_forbidden() {
        let claims = device_claims(None);
        assert!(derive_device_or_aggregator_scope(&claims, None).is_err());
    }

    #[test]
    fn registered_device_cert_mismatch_is_forbidden() {
        let claims = device_claims(Some(5));
        let err = derive_device_or_aggregator_scope(&claims, Some(6)).unwrap_err();
        assert_eq!(
            err,
            ScopeError::Forbidden("Client 0xdef is scoped to EndDevice 5".to_string())
        );
        assert!(derive_device_or_aggregator_scope(&claims, Some(5)).is_ok());
    }

    #[test]
    fn null_aggregator_cannot_be_an_aggregator_scope() {
        let claims = device_claims(Some(5));
        assert_eq!(
            derive_aggregator_scope(&claims, Some(5)),
            Err(ScopeError::Forbidden(
                "the null aggregator cannot hold an AggregatorRequestScope".to_string()
            ))
        );
    }

    #[test]
    fn site_scope_rejects_virtual_id() {
        let claims = aggregator_claims();
        assert!(derive_site_scope(&claims, VIRTUAL_END_DEVICE_SITE_ID).is_err());
        assert!(derive_site_scope(&claims, 11).is_ok());
    }
}
// FIN DEL ARCHIVO [libs/domain/scope/src/lib.rs]
