// INICIO DEL ARCHIVO [apps/server/src/middleware.rs]
/*!
 * =================================================================
 * APARATO: PERIMETER GUARDS (V1.0)
 * CLASIFICACIÓN: SECURITY STRATUM (ESTRATO L4)
 * RESPONSABILIDAD: VALIDACIÓN DUAL DE CREDENCIALES E INYECCIÓN DE CLAIMS
 *
 * DUAL CITIZENSHIP: la superficie 2030.5 autentica via LFDI derivado del
 * certificado cliente reenviado en una cabecera HTTP; la superficie admin
 * autentica via un bearer token compartido. Cada guardia inyecta su propia
 * extension de request para consumo en los handlers.
 * =================================================================
 */

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sep2_domain_scope::{compute_lfdi_from_url_encoded_pem, CertSource, Claims};
use serde_json::json;
use tracing::{debug, warn};

/// Guardia de Salud: bloquea el acceso si el sistema está en mantenimiento.
pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(reason) = state.is_operational() {
        warn!("⛔ [ACCESS_DENIED]: Server under maintenance: {}", reason);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "SERVER_MAINTENANCE_ACTIVE", "reason": reason })),
        )
            .into_response();
    }
    next.run(req).await
}

/// Guardia de Autenticación 2030.5: deriva el LFDI de la cabecera de
/// certificado reenviada, lo resuelve contra `Certificate`/`Site`, e
/// inyecta `Claims` en la petición. Ausencia de la cabecera es un 500
/// (fallo de la puerta de enlace, no del cliente); ausencia o expiracion
/// del certificado es un 403.
pub async fn sep2_auth_guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let header_name = state.cert_pem_header.as_str();
    let pem_header_value = req
        .headers()
        .get(header_name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let Some(url_encoded_pem) = pem_header_value else {
        warn!("❌ [AUTH_MISSING]: Forwarded certificate header '{}' absent.", header_name);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    };

    let lfdi = compute_lfdi_from_url_encoded_pem(&url_encoded_pem).map_err(|fault| {
        warn!("❌ [AUTH_MALFORMED]: {}", fault);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let now = chrono::Utc::now();

    if let Some((_, aggregator_id)) = state
        .certificate_repository
        .resolve_aggregator_for_lfdi(&lfdi, now)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    {
        debug!("🤝 [AUTH]: Aggregator cert recognised for lfdi={}", lfdi);
        req.extensions_mut().insert(Claims {
            source: CertSource::AggregatorCert,
            lfdi,
            sfdi: 0,
            iana_pen: state.iana_pen(),
            href_prefix: state.href_prefix(),
            aggregator_id_scope: Some(aggregator_id),
            site_id_scope: None,
        });
        return Ok(next.run(req).await);
    }

    if let Ok(Some(site)) = state.site_repository.get_site_by_lfdi(&lfdi).await {
        debug!("🔌 [AUTH]: Device cert recognised for lfdi={}", lfdi);
        req.extensions_mut().insert(Claims {
            source: CertSource::DeviceCert,
            lfdi,
            sfdi: site.sfdi,
            iana_pen: state.iana_pen(),
            href_prefix: state.href_prefix(),
            aggregator_id_scope: None,
            site_id_scope: Some(site.site_id),
        });
        return Ok(next.run(req).await);
    }

    warn!("⛔ [AUTH_REJECTED]: No certificate or site registered for lfdi={}", lfdi);
    Err(StatusCode::FORBIDDEN)
}

/// Guardia de Autenticación Admin: compara un bearer token contra el
/// secreto compartido `ADMIN_AUTH_TOKEN`.
pub async fn admin_auth_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == state.admin_auth_token.as_str() => Ok(next.run(req).await),
        _ => {
            warn!("❌ [ADMIN_AUTH_REJECTED]: Invalid or missing bearer token.");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
// FIN DEL ARCHIVO [apps/server/src/middleware.rs]
