// INICIO DEL ARCHIVO [libs/domain/scope/src/lfdi.rs]
/*!
 * =================================================================
 * APARATO: LFDI DERIVATION (V1.0)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CALCULO DEL LFDI A PARTIR DEL CERTIFICADO PEM
 *
 * El certificado cliente llega URL-percent-encoded en una cabecera HTTP
 * reenviada por el proxy TLS-terminating. El LFDI es el SHA-256 del DER
 * truncado a los primeros 40 caracteres hex, prefijado con "0x".
 * =================================================================
 */

use base64::Engine;
use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use thiserror::Error;

const LFDI_HEX_LENGTH: usize = 40;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LfdiError {
    #[error("[LFDI_MALFORMED_PEM]: missing header/footer lines")]
    MalformedPem,
    #[error("[LFDI_BASE64_FAULT]: {0}")]
    Base64Fault(String),
}

/// Deriva el LFDI de 42 caracteres de un certificado PEM URL-encoded:
/// decodifica la URL, descarta la primera y ultima linea (las cabeceras
/// `-----BEGIN/END CERTIFICATE-----`), decodifica el resto como base64
/// a DER, aplica SHA-256 y trunca los primeros 40 caracteres hex con
/// prefijo `0x`.
pub fn compute_lfdi_from_url_encoded_pem(url_encoded_pem: &str) -> Result<String, LfdiError> {
    let pem = percent_decode_str(url_encoded_pem)
        .decode_utf8()
        .map_err(|_| LfdiError::MalformedPem)?;

    let lines: Vec<&str> = pem.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.len() < 3 {
        return Err(LfdiError::MalformedPem);
    }
    let der_base64: String = lines[1..lines.len() - 1].concat();

    let der_bytes = base64::engine::general_purpose::STANDARD
        .decode(der_base64.trim())
        .map_err(|e| LfdiError::Base64Fault(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&der_bytes);
    let digest_hex = hex::encode(hasher.finalize());

    Ok(format!("0x{}", &digest_hex[..LFDI_HEX_LENGTH]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pem_produces_the_expected_lfdi() {
        let pem = "-----BEGIN CERTIFICATE-----\nYQ==\n-----END CERTIFICATE-----\n";
        let url_encoded = percent_encoding::utf8_percent_encode(
            pem,
            percent_encoding::NON_ALPHANUMERIC,
        )
        .to_string();

        let lfdi = compute_lfdi_from_url_encoded_pem(&url_encoded).unwrap();
        assert_eq!(lfdi.len(), 42);
        assert!(lfdi.starts_with("0x"));

        let mut hasher = Sha256::new();
        hasher.update(b"a");
        let expected_hex = hex::encode(hasher.finalize());
        assert_eq!(lfdi, format!("0x{}", &expected_hex[..40]));
    }

    #[test]
    fn malformed_pem_is_rejected() {
        let url_encoded =
            percent_encoding::utf8_percent_encode("not-a-pem", percent_encoding::NON_ALPHANUMERIC)
                .to_string();
        assert_eq!(
            compute_lfdi_from_url_encoded_pem(&url_encoded),
            Err(LfdiError::MalformedPem)
        );
    }
}
// FIN DEL ARCHIVO [libs/domain/scope/src/lfdi.rs]
