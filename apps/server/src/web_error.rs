// INICIO DEL ARCHIVO [apps/server/src/web_error.rs]
/*!
 * =================================================================
 * APARATO: HTTP ERROR TAXONOMY (V1.0)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: TRADUCCIÓN DE ERRORES DE DOMINIO/DB A CÓDIGOS HTTP
 *
 * Unico punto de la capa HTTP que conoce StatusCode. Las capas inferiores
 * (domain, infra) nunca importan axum.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sep2_domain_href::HrefError;
use sep2_domain_scope::{LfdiError, ScopeError};
use sep2_infra_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("[AUTH_HEADER_MISSING]: {0}")]
    AuthHeaderMissing(&'static str),
    #[error("[FORBIDDEN_SCOPE]: {0}")]
    ForbiddenScope(String),
    #[error("[NOT_FOUND]: {0}")]
    NotFound(&'static str),
    #[error("[BAD_REQUEST]: {0}")]
    BadRequest(String),
    #[error("[INVALID_MAPPING]: {0}")]
    InvalidMapping(String),
    #[error("[UNABLE_TO_GENERATE_ID]: {0}")]
    UnableToGenerateId(String),
    #[error("[INTERNAL_FAULT]: {0}")]
    Internal(String),
}

impl From<DbError> for WebError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(entity) => WebError::NotFound(entity),
            other => WebError::Internal(other.to_string()),
        }
    }
}

impl From<ScopeError> for WebError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::Forbidden(reason) => WebError::ForbiddenScope(reason.to_string()),
        }
    }
}

impl From<LfdiError> for WebError {
    fn from(err: LfdiError) -> Self {
        WebError::AuthHeaderMissing(match err {
            LfdiError::MalformedPem => "malformed PEM in forwarded certificate header",
            LfdiError::Base64Fault(_) => "malformed base64 in forwarded certificate header",
        })
    }
}

impl From<HrefError> for WebError {
    fn from(err: HrefError) -> Self {
        WebError::BadRequest(err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::AuthHeaderMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::ForbiddenScope(_) => StatusCode::FORBIDDEN,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::InvalidMapping(_) => StatusCode::BAD_REQUEST,
            WebError::UnableToGenerateId(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
// FIN DEL ARCHIVO [apps/server/src/web_error.rs]
